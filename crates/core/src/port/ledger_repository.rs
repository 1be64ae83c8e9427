// Ledger Repository Port (Interface)

use crate::domain::{Store, StoreDocument};
use crate::error::Result;
use async_trait::async_trait;

/// Result of reading the persisted active store
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    /// Nothing persisted yet
    Missing,
    /// A recognized document (legacy or current)
    Found(StoreDocument),
    /// Content exists but could not be classified
    Unreadable { reason: String },
}

/// Repository interface for the active store
#[async_trait]
pub trait LedgerRepository: Send + Sync {
    /// Read and classify the persisted store
    async fn load(&self) -> Result<LoadOutcome>;

    /// Atomically replace the persisted store, then verify what landed on disk.
    ///
    /// Returns `AppError::Integrity` when the re-read record count differs
    /// from `store.instances.len()`.
    async fn save(&self, store: &Store) -> Result<()>;
}
