// Domain Error Types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Invalid job id: {0}")]
    InvalidJobId(String),

    #[error("Malformed store document: {0}")]
    MalformedDocument(String),

    #[error("Unsupported schema version: {0}")]
    UnsupportedSchema(u64),

    #[error("Invalid archive month: {0}")]
    InvalidArchiveMonth(String),
}

pub type Result<T> = std::result::Result<T, DomainError>;
