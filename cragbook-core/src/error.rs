//! Error types for cragbook-core

use thiserror::Error;

/// Main error type for the cragbook-core library
#[derive(Error, Debug)]
pub enum Error {
    /// User input rejected before any network call
    #[error("validation error: {0}")]
    Validation(String),

    /// Configuration error (bad config file, no grade scale for a gym)
    #[error("configuration error: {0}")]
    Config(String),

    /// Grade label not present in the active scale
    #[error("unknown grade {grade:?} for scale {scale}")]
    UnknownGrade { grade: String, scale: String },

    /// Finishing a session failed; local climbs are kept for retry
    #[error("could not save session: {0}")]
    Save(String),

    /// A finish is already in flight for this session
    #[error("session save already in progress")]
    SaveInProgress,

    /// Read-side backend failure (stats, history, pyramid)
    #[error("fetch error: {0}")]
    Fetch(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// True for failures the user can fix by retrying later
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Save(_) | Error::Fetch(_) | Error::SaveInProgress)
    }
}

/// Result type alias for cragbook-core
pub type Result<T> = std::result::Result<T, Error>;
