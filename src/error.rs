use thiserror::Error;

/// Main error type for the Simherd fleet supervisor
#[derive(Debug, Error)]
pub enum SimherdError {
    // Argument errors
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid configuration file: {0}")]
    InvalidConfig(String),

    #[error("Missing required configuration field: {0}")]
    MissingConfigField(String),

    #[error("Configuration validation failed: {0}")]
    ConfigValidationError(String),

    // Capacity errors
    #[error("Insufficient cores: {available} available, at least {required} required per slot")]
    InsufficientCores { available: usize, required: usize },

    // Provisioning errors
    #[error("Simulator binary not found and no --binary-url configured: {0}")]
    BinaryMissing(String),

    #[error("Failed to download simulator binary: {0}")]
    DownloadError(String),

    // Process-related errors
    #[error("Failed to spawn simulator: {0}")]
    SpawnError(String),

    #[error("Signal error: {0}")]
    SignalError(String),

    // Log-related errors
    #[error("Log error: {0}")]
    LogError(String),

    #[error("Failed to open log file: {0}")]
    LogFileError(String),

    // IO errors (automatically converted from std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Generic errors
    #[error("{0}")]
    Other(String),
}

/// Result type alias for Simherd operations
pub type Result<T> = std::result::Result<T, SimherdError>;
