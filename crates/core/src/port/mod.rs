// Port Layer - Interfaces for external dependencies

pub mod archive_repository;
pub mod ledger_repository;
pub mod time_provider; // For deterministic testing

// Re-exports
pub use archive_repository::ArchiveRepository;
pub use ledger_repository::{LedgerRepository, LoadOutcome};
pub use time_provider::{ManualTimeProvider, SystemTimeProvider, TimeProvider};
