// Central Error Type for the Application

use thiserror::Error;

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Domain error: {0}")]
    Domain(#[from] crate::domain::DomainError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Storage(String),

    /// Persisted queue could not be parsed. Only surfaced by `QueueStore::try_load`.
    #[error("Corrupted queue data: {0}")]
    Corruption(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Announcement error: {0}")]
    Announcement(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// True for incomplete user input (shown to the user as a blocking notice)
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            AppError::Validation(_) | AppError::Domain(crate::domain::DomainError::Validation(_))
        )
    }
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

// Note: sqlx::Error conversion is handled in infra-sqlite crate
// by converting to AppError::Storage(String)
