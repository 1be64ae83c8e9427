// Central Error Type for the Application

use std::path::PathBuf;
use thiserror::Error;

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Domain error: {0}")]
    Domain(#[from] crate::domain::DomainError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    /// On-disk state diverged from memory after a save. Callers must stop
    /// processing: the dedup ledger can no longer be trusted.
    #[error("Integrity fault at {}: expected {expected} records, found {found}", path.display())]
    Integrity {
        path: PathBuf,
        expected: usize,
        found: usize,
    },
}

impl AppError {
    /// True for faults the caller must treat as fatal for the current run
    pub fn is_fatal(&self) -> bool {
        matches!(self, AppError::Integrity { .. })
    }
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
