//! Error types for the assessment result model.
//!
//! Validation errors carry a stable numeric code so that upload tooling can
//! group failures without parsing messages.

use thiserror::Error;

/// Result type alias for model operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while validating or decoding assessment results.
#[derive(Error, Debug)]
pub enum Error {
    /// Identifier is empty or contains characters that cannot appear in an
    /// archive name.
    #[error("invalid identifier '{0}'")]
    InvalidIdentifier(String),

    /// Schedule reference is missing required fields.
    #[error("invalid schedule: {0}")]
    InvalidSchedule(String),

    /// Data group tag is empty or malformed.
    #[error("invalid data group '{0}'")]
    InvalidDataGroup(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Stable error code for structured reporting.
    pub fn code(&self) -> u32 {
        match self {
            Error::InvalidIdentifier(_) => 10,
            Error::InvalidSchedule(_) => 11,
            Error::InvalidDataGroup(_) => 12,
            Error::Json(_) => 20,
        }
    }

    /// Whether the error stems from caller-supplied input rather than the
    /// environment.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::InvalidIdentifier(_) | Error::InvalidSchedule(_) | Error::InvalidDataGroup(_)
        )
    }
}
