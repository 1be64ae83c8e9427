// Archive Repository Port (Interface)

use crate::domain::{ArchiveMonth, JobInstance};
use crate::error::Result;
use async_trait::async_trait;

/// Repository interface for monthly archive buckets
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ArchiveRepository: Send + Sync {
    /// Load a bucket for rewriting. Missing buckets yield an empty list;
    /// unreadable ones are moved aside and also yield an empty list.
    async fn load_bucket(&self, month: ArchiveMonth) -> Result<Vec<JobInstance>>;

    /// Read a bucket without touching the filesystem.
    ///
    /// `None` when the bucket exists but cannot be parsed; missing buckets
    /// read as empty.
    async fn read_bucket(&self, month: ArchiveMonth) -> Result<Option<Vec<JobInstance>>>;

    /// Atomically replace a bucket with `instances`
    async fn save_bucket(&self, month: ArchiveMonth, instances: &[JobInstance]) -> Result<()>;

    /// All buckets present, oldest first
    async fn list_months(&self) -> Result<Vec<ArchiveMonth>>;
}
