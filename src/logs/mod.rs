// Logs module - per-run log file management

use crate::error::{Result, SimherdError};
use chrono::{DateTime, Local};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;

/// Build the log file name for a run attempt.
///
/// Format: `simulator_<timestamp>_run<slot>.log`, one file per attempt.
pub fn run_log_file_name(slot: usize, started_at: DateTime<Local>) -> String {
    format!(
        "simulator_{}_run{}.log",
        started_at.format("%Y%m%d_%H%M%S"),
        slot
    )
}

/// RunLog owns the log file for a single run attempt.
///
/// The file receives the simulator's combined stdout and stderr via
/// duplicated append-mode handles, and the supervisor appends a final
/// exit-status line once the child has been reaped.
pub struct RunLog {
    /// Path to the log file
    path: PathBuf,
    /// Append-mode handle, shared with the child's stdio
    file: File,
}

impl RunLog {
    /// Create the log file for a new run attempt
    ///
    /// # Arguments
    /// * `log_dir` - Directory where log files are stored (created if absent)
    /// * `slot` - Slot id, used in the file name
    pub fn create(log_dir: &Path, slot: usize) -> Result<Self> {
        std::fs::create_dir_all(log_dir).map_err(|e| {
            SimherdError::LogError(format!(
                "Failed to create log directory {}: {}",
                log_dir.display(),
                e
            ))
        })?;

        let path = log_dir.join(run_log_file_name(slot, Local::now()));

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| {
                SimherdError::LogFileError(format!("Failed to open {}: {}", path.display(), e))
            })?;

        Ok(Self { path, file })
    }

    /// Get the path to the log file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Duplicate the log handle for use as the child's stdout or stderr
    ///
    /// Both streams share the same append-mode file, so the log carries the
    /// simulator's combined output in OS write order.
    pub fn stdio(&self) -> Result<Stdio> {
        let handle = self.file.try_clone().map_err(|e| {
            SimherdError::LogFileError(format!(
                "Failed to duplicate log handle for {}: {}",
                self.path.display(),
                e
            ))
        })?;

        Ok(Stdio::from(handle))
    }

    /// Append the exit-status line after the run has finished
    pub fn append_status_line(&mut self, line: &str) -> Result<()> {
        writeln!(self.file, "{}", line)
            .map_err(|e| SimherdError::LogError(format!("Failed to append status line: {}", e)))?;

        self.file
            .flush()
            .map_err(|e| SimherdError::LogError(format!("Failed to flush log: {}", e)))?;

        Ok(())
    }

    /// Consume the log and return the file path
    pub fn into_path(self) -> PathBuf {
        self.path
    }
}
