//! Error types for the homesync service

/// Errors that can occur in the homesync service
#[derive(Debug, thiserror::Error)]
pub enum HomeSyncError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Unknown actuator: {0}")]
    UnknownActuator(String),

    #[error("Sync session already started")]
    AlreadyStarted,

    #[error("Sync session stopped")]
    SessionStopped,
}

/// Result type alias for homesync operations
pub type Result<T> = std::result::Result<T, HomeSyncError>;
