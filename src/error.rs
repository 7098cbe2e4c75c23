//! Learnlog error types

use thiserror::Error;

/// Learnlog error type
#[derive(Error, Debug)]
pub enum Error {
    /// A required field is missing or empty
    #[error("Validation error: {0}")]
    Validation(String),

    /// The backend rejected or could not perform an operation
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Diary file store error
    #[error("Diary error: {0}")]
    Diary(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether the failure came from the storage backend or the link to it.
    pub fn is_persistence(&self) -> bool {
        matches!(self, Self::Persistence(_) | Self::Http(_))
    }

    /// Short machine-readable classification used at the tool boundary.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Persistence(_) | Self::Http(_) => "persistence",
            Self::Config(_) => "config",
            Self::Diary(_) | Self::Io(_) => "diary",
            Self::Serialization(_) | Self::Internal(_) => "internal",
        }
    }
}

/// Result type alias for Learnlog operations
pub type Result<T> = std::result::Result<T, Error>;
