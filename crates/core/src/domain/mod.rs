// Domain Layer - Pure business logic and entities

pub mod archive;
pub mod document;
pub mod error;
pub mod instance;
pub mod job_data;
pub mod store;

// Re-exports
pub use archive::ArchiveMonth;
pub use document::{migrate_legacy, StoreDocument};
pub use error::DomainError;
pub use instance::{instance_id, InstanceId, JobId, JobInstance, UNKNOWN};
pub use job_data::{JobData, SourceMetadata};
pub use store::{build_index, ArchiveSummary, JobHistory, JobIndex, Store, StoreMetadata, CURRENT_SCHEMA_VERSION};
