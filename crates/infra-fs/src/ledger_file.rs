// JSON file LedgerRepository Implementation

use crate::atomic::{persist_atomic, quarantine, storage_error, verify_count};
use async_trait::async_trait;
use posting_ledger_core::domain::{Store, StoreDocument};
use posting_ledger_core::error::Result;
use posting_ledger_core::port::{LedgerRepository, LoadOutcome, TimeProvider};
use serde::de::IgnoredAny;
use serde::Deserialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tracing::{info, warn};

/// Just enough of a store document to count its records
#[derive(Deserialize)]
struct InstanceCount {
    instances: Vec<IgnoredAny>,
}

/// Active store kept as one JSON document
pub struct JsonLedgerRepository {
    path: PathBuf,
    time_provider: Arc<dyn TimeProvider>,
}

impl JsonLedgerRepository {
    pub fn new(path: impl Into<PathBuf>, time_provider: Arc<dyn TimeProvider>) -> Self {
        Self {
            path: path.into(),
            time_provider,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Number of instances in a serialized store
fn count_instances(bytes: &[u8]) -> serde_json::Result<usize> {
    serde_json::from_slice::<InstanceCount>(bytes).map(|doc| doc.instances.len())
}

#[async_trait]
impl LedgerRepository for JsonLedgerRepository {
    async fn load(&self) -> Result<LoadOutcome> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(LoadOutcome::Missing),
            Err(e) => return Err(storage_error("read", &self.path, e)),
        };

        match StoreDocument::from_slice(&bytes) {
            Ok(doc) => {
                info!(
                    path = %self.path.display(),
                    legacy = matches!(doc, StoreDocument::Legacy(_)),
                    "Loaded ledger file"
                );
                Ok(LoadOutcome::Found(doc))
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Ledger file unreadable");
                quarantine(&self.path, self.time_provider.now_millis()).await?;
                Ok(LoadOutcome::Unreadable {
                    reason: e.to_string(),
                })
            }
        }
    }

    async fn save(&self, store: &Store) -> Result<()> {
        persist_atomic(&self.path, store).await?;
        verify_count(&self.path, store.instances.len(), count_instances).await
    }
}
