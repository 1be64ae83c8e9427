// Application Layer - Use Cases and Business Logic

pub mod archiver;
pub mod config;
pub mod constants;
pub mod dedup;
pub mod ledger;
pub mod schema;
pub mod stats;

// Re-exports
pub use archiver::{ArchiveOutcome, Archiver};
pub use config::LedgerConfig;
pub use dedup::{Decision, PostReason, SkipReason};
pub use ledger::{AuditReport, BucketSummary, PostingLedger};
pub use schema::LoadSource;
pub use stats::LedgerStats;
