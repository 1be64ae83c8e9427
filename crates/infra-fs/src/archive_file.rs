// JSON file ArchiveRepository Implementation

use crate::atomic::{persist_atomic, quarantine, storage_error, verify_count};
use async_trait::async_trait;
use posting_ledger_core::domain::{ArchiveMonth, JobInstance};
use posting_ledger_core::error::Result;
use posting_ledger_core::port::{ArchiveRepository, TimeProvider};
use serde::de::IgnoredAny;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tracing::{debug, warn};

/// One `<YYYY-MM>.json` file per month under a directory
pub struct JsonArchiveRepository {
    dir: PathBuf,
    time_provider: Arc<dyn TimeProvider>,
}

impl JsonArchiveRepository {
    pub fn new(dir: impl Into<PathBuf>, time_provider: Arc<dyn TimeProvider>) -> Self {
        Self {
            dir: dir.into(),
            time_provider,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn bucket_path(&self, month: ArchiveMonth) -> PathBuf {
        self.dir.join(month.file_name())
    }
}

/// Raw bucket bytes; `None` when the file does not exist
async fn read_bytes(path: &Path) -> Result<Option<Vec<u8>>> {
    match fs::read(path).await {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(storage_error("read", path, e)),
    }
}

/// Number of entries in a serialized bucket
fn count_entries(bytes: &[u8]) -> serde_json::Result<usize> {
    serde_json::from_slice::<Vec<IgnoredAny>>(bytes).map(|items| items.len())
}

#[async_trait]
impl ArchiveRepository for JsonArchiveRepository {
    async fn load_bucket(&self, month: ArchiveMonth) -> Result<Vec<JobInstance>> {
        let path = self.bucket_path(month);
        let Some(bytes) = read_bytes(&path).await? else {
            return Ok(Vec::new());
        };

        match serde_json::from_slice::<Vec<JobInstance>>(&bytes) {
            Ok(instances) => Ok(instances),
            Err(e) => {
                // Bucket content is lost for merging; the original bytes are kept aside
                warn!(
                    month = %month,
                    path = %path.display(),
                    error = %e,
                    "Archive bucket unreadable, treating as empty"
                );
                quarantine(&path, self.time_provider.now_millis()).await?;
                Ok(Vec::new())
            }
        }
    }

    async fn read_bucket(&self, month: ArchiveMonth) -> Result<Option<Vec<JobInstance>>> {
        let path = self.bucket_path(month);
        let Some(bytes) = read_bytes(&path).await? else {
            return Ok(Some(Vec::new()));
        };

        match serde_json::from_slice::<Vec<JobInstance>>(&bytes) {
            Ok(instances) => Ok(Some(instances)),
            Err(e) => {
                warn!(
                    month = %month,
                    path = %path.display(),
                    error = %e,
                    "Archive bucket unreadable"
                );
                Ok(None)
            }
        }
    }

    async fn save_bucket(&self, month: ArchiveMonth, instances: &[JobInstance]) -> Result<()> {
        let path = self.bucket_path(month);
        persist_atomic(&path, instances).await?;
        verify_count(&path, instances.len(), count_entries).await?;
        debug!(month = %month, count = instances.len(), "Archive bucket saved");
        Ok(())
    }

    async fn list_months(&self) -> Result<Vec<ArchiveMonth>> {
        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(storage_error("list", &self.dir, e)),
        };

        let mut months = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| storage_error("list", &self.dir, e))?
        {
            let name = entry.file_name();
            let Some(stem) = name.to_str().and_then(|n| n.strip_suffix(".json")) else {
                continue;
            };
            match stem.parse::<ArchiveMonth>() {
                Ok(month) => months.push(month),
                Err(_) => debug!(file = %stem, "Ignoring non-bucket file in archive directory"),
            }
        }

        months.sort();
        Ok(months)
    }
}
