use crate::error::{Result, SimherdError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Fleet configuration with all settings for launching and supervising
/// simulator instances
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FleetConfig {
    /// Path to the simulator binary
    #[serde(default)]
    pub binary_path: PathBuf,

    /// Directory where per-run log files are written
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,

    /// Wall-clock limit for a single run, in hours
    #[serde(default = "default_timeout_hours")]
    pub timeout_hours: u64,

    /// URL to fetch the simulator binary from when it is missing
    #[serde(default)]
    pub binary_url: Option<String>,

    /// Logical cores reserved per slot
    #[serde(default = "default_cores_per_slot")]
    pub cores_per_slot: usize,

    /// Explicit cap on the number of slots (never raises computed capacity)
    #[serde(default)]
    pub slots: Option<usize>,

    /// Delay between run attempts, in seconds
    #[serde(default = "default_restart_delay")]
    pub restart_delay_secs: u64,

    /// Fixed interval between download retries, in seconds
    #[serde(default = "default_fetch_retry")]
    pub fetch_retry_secs: u64,
}

// Default value functions for serde
fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}

fn default_timeout_hours() -> u64 {
    24
}

fn default_cores_per_slot() -> usize {
    2
}

fn default_restart_delay() -> u64 {
    5
}

fn default_fetch_retry() -> u64 {
    30
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            binary_path: PathBuf::new(),
            log_dir: default_log_dir(),
            timeout_hours: default_timeout_hours(),
            binary_url: None,
            cores_per_slot: default_cores_per_slot(),
            slots: None,
            restart_delay_secs: default_restart_delay(),
            fetch_retry_secs: default_fetch_retry(),
        }
    }
}

impl FleetConfig {
    /// Load a fleet configuration from a file (supports TOML and JSON)
    pub fn from_file(path: &Path) -> Result<FleetConfig> {
        // Read file contents
        let contents = std::fs::read_to_string(path)
            .map_err(|e| SimherdError::ConfigError(format!("Failed to read config file: {}", e)))?;

        // Determine format based on file extension
        let extension = path.extension().and_then(|s| s.to_str()).unwrap_or("");

        let mut config: FleetConfig = match extension {
            "toml" => toml::from_str(&contents)
                .map_err(|e| SimherdError::InvalidConfig(format!("Failed to parse TOML: {}", e)))?,
            "json" => serde_json::from_str(&contents)
                .map_err(|e| SimherdError::InvalidConfig(format!("Failed to parse JSON: {}", e)))?,
            _ => {
                return Err(SimherdError::InvalidConfig(format!(
                    "Unsupported file format: {}. Use .toml or .json",
                    extension
                )))
            }
        };

        config.expand_env_vars();

        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        // Validate binary path
        if self.binary_path.as_os_str().is_empty() {
            return Err(SimherdError::MissingConfigField("binary_path".to_string()));
        }

        // Validate log directory
        if self.log_dir.as_os_str().is_empty() {
            return Err(SimherdError::MissingConfigField("log_dir".to_string()));
        }

        // Validate timeout
        if self.timeout_hours == 0 {
            return Err(SimherdError::ConfigValidationError(
                "timeout_hours must be at least 1".to_string(),
            ));
        }

        // Validate cores per slot
        if self.cores_per_slot == 0 {
            return Err(SimherdError::ConfigValidationError(
                "cores_per_slot must be at least 1".to_string(),
            ));
        }

        // Validate slot override
        if let Some(slots) = self.slots {
            if slots == 0 {
                return Err(SimherdError::ConfigValidationError(
                    "slots must be at least 1".to_string(),
                ));
            }
        }

        // Validate intervals
        if self.restart_delay_secs == 0 {
            return Err(SimherdError::ConfigValidationError(
                "restart_delay_secs must be at least 1".to_string(),
            ));
        }

        if self.fetch_retry_secs == 0 {
            return Err(SimherdError::ConfigValidationError(
                "fetch_retry_secs must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    /// Expand environment variables in configuration fields
    pub fn expand_env_vars(&mut self) {
        self.binary_path = Self::expand_env_in_path(&self.binary_path);
        self.log_dir = Self::expand_env_in_path(&self.log_dir);

        if let Some(ref url) = self.binary_url {
            self.binary_url = Some(Self::expand_env_in_string(url));
        }
    }

    /// Expand environment variables in a string
    fn expand_env_in_string(s: &str) -> String {
        let mut result = s.to_string();

        // Handle $VAR and ${VAR} syntax
        for (key, value) in std::env::vars() {
            result = result.replace(&format!("${{{}}}", key), &value);
            result = result.replace(&format!("${}", key), &value);
        }

        result
    }

    /// Expand environment variables in a path
    fn expand_env_in_path(path: &Path) -> PathBuf {
        let path_str = path.to_string_lossy();
        let expanded = Self::expand_env_in_string(&path_str);
        PathBuf::from(expanded)
    }

    /// Get the per-run timeout as Duration
    pub fn run_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_hours * 3600)
    }

    /// Get restart delay as Duration
    pub fn restart_delay(&self) -> Duration {
        Duration::from_secs(self.restart_delay_secs)
    }

    /// Get download retry interval as Duration
    pub fn fetch_retry(&self) -> Duration {
        Duration::from_secs(self.fetch_retry_secs)
    }
}
