// CLI module - User-facing command-line interface

pub mod output;

use crate::capacity;
use crate::config::FleetConfig;
use crate::error::{Result, SimherdError};
use crate::fleet::Fleet;
use crate::provision;
use clap::error::ErrorKind;
use clap::Parser;
use std::path::PathBuf;
use tracing::warn;

/// Simherd - launch and supervise a fleet of parallel simulator instances
#[derive(Parser, Debug)]
#[command(name = "simherd")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Directory for per-run log files (default: logs)
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Path to the simulator binary
    #[arg(long)]
    binary_path: Option<PathBuf>,

    /// Wall-clock limit for a single run, in hours (default: 24)
    #[arg(long)]
    timeout_hours: Option<u64>,

    /// URL to fetch the simulator binary from when it is missing
    #[arg(long)]
    binary_url: Option<String>,

    /// Cap on the number of slots (never raises computed capacity)
    #[arg(long)]
    slots: Option<usize>,

    /// Logical cores reserved per slot (default: 2)
    #[arg(long)]
    cores_per_slot: Option<usize>,

    /// Delay between run attempts, in seconds (default: 5)
    #[arg(long)]
    restart_delay_secs: Option<u64>,

    /// Interval between download retries, in seconds (default: 30)
    #[arg(long)]
    fetch_retry_secs: Option<u64>,

    /// Configuration file (TOML or JSON); explicit flags override it
    #[arg(long)]
    config: Option<PathBuf>,
}

impl Cli {
    /// Run the CLI application
    pub fn run() -> Result<()> {
        let cli = match Cli::try_parse() {
            Ok(cli) => cli,
            Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
                let _ = e.print();
                return Ok(());
            }
            Err(e) => return Err(SimherdError::InvalidArgument(e.to_string())),
        };

        init_tracing();

        let config = cli.resolve_config()?;
        config.validate()?;

        let runtime = tokio::runtime::Runtime::new()?;
        runtime.block_on(Self::execute(config))
    }

    /// Merge the optional config file with explicit flags (flags win)
    fn resolve_config(&self) -> Result<FleetConfig> {
        let mut config = match &self.config {
            Some(path) => FleetConfig::from_file(path)?,
            None => FleetConfig::default(),
        };

        if let Some(ref log_dir) = self.log_dir {
            config.log_dir = log_dir.clone();
        }
        if let Some(ref binary_path) = self.binary_path {
            config.binary_path = binary_path.clone();
        }
        if let Some(timeout_hours) = self.timeout_hours {
            config.timeout_hours = timeout_hours;
        }
        if let Some(ref binary_url) = self.binary_url {
            config.binary_url = Some(binary_url.clone());
        }
        if let Some(slots) = self.slots {
            config.slots = Some(slots);
        }
        if let Some(cores_per_slot) = self.cores_per_slot {
            config.cores_per_slot = cores_per_slot;
        }
        if let Some(restart_delay_secs) = self.restart_delay_secs {
            config.restart_delay_secs = restart_delay_secs;
        }
        if let Some(fetch_retry_secs) = self.fetch_retry_secs {
            config.fetch_retry_secs = fetch_retry_secs;
        }

        config.expand_env_vars();

        Ok(config)
    }

    /// Provision the binary, size the fleet, and supervise until Ctrl-C
    async fn execute(config: FleetConfig) -> Result<()> {
        provision::ensure_binary(&config).await?;

        tokio::fs::create_dir_all(&config.log_dir).await.map_err(|e| {
            SimherdError::LogError(format!(
                "Failed to create log directory {}: {}",
                config.log_dir.display(),
                e
            ))
        })?;

        let cores = capacity::available_cores();
        let capacity = capacity::slot_count(cores, config.cores_per_slot)?;

        let slots = match config.slots {
            Some(requested) if requested <= capacity => requested,
            Some(requested) => {
                warn!(
                    "requested {} slots exceeds capacity, clamping to {}",
                    requested, capacity
                );
                capacity
            }
            None => capacity,
        };

        output::print_info(&format!(
            "launching {} slot(s) ({} cores, {} per slot)",
            slots, cores, config.cores_per_slot
        ));

        let fleet = Fleet::new(config, slots);
        fleet.run().await
    }
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_core_flags() {
        let cli = Cli::try_parse_from([
            "simherd",
            "--log-dir",
            "/var/log/simherd",
            "--binary-path",
            "/opt/sim/simulator",
            "--timeout-hours",
            "12",
        ])
        .unwrap();

        let config = cli.resolve_config().unwrap();
        assert_eq!(config.log_dir, PathBuf::from("/var/log/simherd"));
        assert_eq!(config.binary_path, PathBuf::from("/opt/sim/simulator"));
        assert_eq!(config.timeout_hours, 12);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_defaults() {
        let cli =
            Cli::try_parse_from(["simherd", "--binary-path", "/opt/sim/simulator"]).unwrap();

        let config = cli.resolve_config().unwrap();
        assert_eq!(config.log_dir, PathBuf::from("logs"));
        assert_eq!(config.timeout_hours, 24);
        assert_eq!(config.cores_per_slot, 2);
        assert_eq!(config.slots, None);
    }

    #[test]
    fn test_parse_rejects_unknown_flag() {
        let result = Cli::try_parse_from(["simherd", "--bogus"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_rejects_non_numeric_timeout() {
        let result = Cli::try_parse_from([
            "simherd",
            "--binary-path",
            "/opt/sim/simulator",
            "--timeout-hours",
            "soon",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_flags_override_config_file() {
        use std::fs;
        use tempfile::TempDir;

        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("fleet.toml");
        fs::write(
            &config_path,
            r#"
                binary_path = "/opt/sim/simulator"
                timeout_hours = 6
                cores_per_slot = 8
            "#,
        )
        .unwrap();

        let cli = Cli::try_parse_from([
            "simherd",
            "--config",
            config_path.to_str().unwrap(),
            "--timeout-hours",
            "48",
        ])
        .unwrap();

        let config = cli.resolve_config().unwrap();
        // Flag wins over the file
        assert_eq!(config.timeout_hours, 48);
        // File value survives where no flag was given
        assert_eq!(config.cores_per_slot, 8);
        assert_eq!(config.binary_path, PathBuf::from("/opt/sim/simulator"));
    }

    #[test]
    fn test_missing_binary_path_fails_validation() {
        let cli = Cli::try_parse_from(["simherd"]).unwrap();
        let config = cli.resolve_config().unwrap();

        assert!(matches!(
            config.validate(),
            Err(SimherdError::MissingConfigField(_))
        ));
    }
}
