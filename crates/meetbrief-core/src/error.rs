use thiserror::Error;

/// Top-level error type for the Meetbrief backend.
///
/// Subsystem crates define their own error types and implement
/// `From<SubsystemError> for MeetbriefError` so that `?` works across crate
/// boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MeetbriefError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Calendar error: {0}")]
    Calendar(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for MeetbriefError {
    fn from(err: toml::de::Error) -> Self {
        MeetbriefError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for MeetbriefError {
    fn from(err: toml::ser::Error) -> Self {
        MeetbriefError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for MeetbriefError {
    fn from(err: serde_json::Error) -> Self {
        MeetbriefError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Meetbrief operations.
pub type Result<T> = std::result::Result<T, MeetbriefError>;
