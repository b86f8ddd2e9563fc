// Provision module - fetch the simulator binary when it is missing locally

use crate::cli::output;
use crate::config::FleetConfig;
use crate::error::{Result, SimherdError};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

/// Connect timeout for the download client
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Make sure the simulator binary exists, downloading it if necessary.
///
/// Returns the binary path once it is present on disk. When the binary is
/// missing and a URL is configured, the download is retried indefinitely on
/// the configured fixed interval; without a URL a missing binary is fatal.
pub async fn ensure_binary(config: &FleetConfig) -> Result<PathBuf> {
    let path = &config.binary_path;

    if path.exists() {
        return Ok(path.clone());
    }

    let url = match config.binary_url.as_deref() {
        Some(url) => url,
        None => return Err(SimherdError::BinaryMissing(path.display().to_string())),
    };

    let retry = config.fetch_retry();

    loop {
        info!("Fetching simulator binary from {}", url);

        match download(url, path).await {
            Ok(()) => {
                info!("Simulator binary installed at {}", path.display());
                return Ok(path.clone());
            }
            Err(e) => {
                warn!(
                    "Download failed: {}. Retrying in {}s",
                    e,
                    retry.as_secs()
                );
                tokio::time::sleep(retry).await;
            }
        }
    }
}

/// Staging path used while a download is in flight
fn partial_path(dest: &Path) -> PathBuf {
    let mut name = dest.as_os_str().to_os_string();
    name.push(".partial");
    PathBuf::from(name)
}

/// Download `url` into `dest`, staging through `<dest>.partial`.
///
/// The rename happens only after the full body has been written and the
/// executable bit is set, so the destination never holds a truncated binary.
async fn download(url: &str, dest: &Path) -> Result<()> {
    let client = reqwest::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .build()
        .map_err(|e| SimherdError::DownloadError(format!("failed to build HTTP client: {}", e)))?;

    let mut response = client
        .get(url)
        .send()
        .await
        .map_err(|e| SimherdError::DownloadError(format!("request to {} failed: {}", url, e)))?;

    let status = response.status();
    if !status.is_success() {
        return Err(SimherdError::DownloadError(format!(
            "{} returned status {}",
            url, status
        )));
    }

    if let Some(parent) = dest.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    let staging = partial_path(dest);
    let mut file = tokio::fs::File::create(&staging).await.map_err(|e| {
        SimherdError::DownloadError(format!("failed to create {}: {}", staging.display(), e))
    })?;

    let pb = output::download_progress_bar(response.content_length());
    let mut downloaded: u64 = 0;

    let result = loop {
        match response.chunk().await {
            Ok(Some(chunk)) => {
                if let Err(e) = file.write_all(&chunk).await {
                    break Err(SimherdError::DownloadError(format!(
                        "failed to write {}: {}",
                        staging.display(),
                        e
                    )));
                }
                downloaded += chunk.len() as u64;
                pb.set_position(downloaded);
            }
            Ok(None) => break Ok(()),
            Err(e) => {
                break Err(SimherdError::DownloadError(format!(
                    "transfer from {} failed: {}",
                    url, e
                )))
            }
        }
    };

    if let Err(e) = result {
        output::finish_progress_error(pb, "download failed");
        let _ = tokio::fs::remove_file(&staging).await;
        return Err(e);
    }

    file.flush().await?;
    drop(file);

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tokio::fs::set_permissions(&staging, std::fs::Permissions::from_mode(0o755)).await?;
    }

    tokio::fs::rename(&staging, dest).await?;

    output::finish_progress_success(
        pb,
        &format!("downloaded {} ({} bytes)", dest.display(), downloaded),
    );

    Ok(())
}
