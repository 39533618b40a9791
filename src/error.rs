//! Error types for lecture-graph operations

/// Result type for lecture-graph operations
pub type Result<T> = std::result::Result<T, LectureGraphError>;

/// Error types for lecture-graph operations
#[derive(thiserror::Error, Debug)]
pub enum LectureGraphError {
    /// Request rejected before any network call was made
    #[error("Validation error: {0}")]
    Validation(String),

    /// Byte transfer to the upload target failed or was interrupted
    #[error("Transfer error: {0}")]
    Transfer(String),

    /// Metadata registration or lecture persistence failed
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Processing backend trigger failed (logged, never surfaced to users)
    #[error("Notification error: {0}")]
    Notification(String),

    #[error("Lecture not found: {0}")]
    NotFound(String),

    #[error("Invalid playback transition: {0}")]
    InvalidTransition(String),

    /// Upload target could not be signed
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}
