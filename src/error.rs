//! Error types for the lead agent.

/// Top-level error type for the agent.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Assessment error: {0}")]
    Assess(#[from] AssessError),

    #[error("Dispatch error: {0}")]
    Dispatch(#[from] DispatchError),
}

/// Configuration-related errors. All of these are fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Lead store errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Lead not found: {0}")]
    NotFound(String),
}

/// Assessment client errors.
///
/// These never escape the client's public contract - every variant is
/// recovered into the fallback assessment. They exist so the fallback
/// reason carries a diagnosable cause.
#[derive(Debug, thiserror::Error)]
pub enum AssessError {
    #[error("Request failed: {0}")]
    Request(String),

    #[error("Provider returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("No assessment JSON in model output")]
    NoJson,

    #[error("Failed to parse assessment: {0}")]
    Parse(String),
}

/// Notification dispatch errors.
///
/// The HTTP dispatcher traps transport faults into a `false` outcome; this
/// type covers faults outside that contract (reserved for implementations
/// that cannot reduce a failure to a boolean).
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("Dispatch failed: {0}")]
    Failed(String),
}

/// Result type alias for the agent.
pub type Result<T> = std::result::Result<T, Error>;
