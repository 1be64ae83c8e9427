// Schema resolution: turns whatever was on disk into a current Store

use crate::application::config::LedgerConfig;
use crate::domain::{Store, StoreDocument};
use crate::port::LoadOutcome;
use chrono::{DateTime, Utc};
use tracing::{info, warn};

/// Where the opened store came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadSource {
    /// No file existed
    Fresh,
    /// Legacy flat list upgraded in memory
    Migrated { count: usize },
    /// Current-schema document
    Current,
    /// Unreadable content was discarded
    Reset { reason: String },
}

/// Resolve a load outcome into a current-schema store.
///
/// Unreadable content resets to an empty store. This is deliberate: the
/// adapter has already quarantined the file, and a dedup ledger that refuses
/// to start blocks the whole pipeline.
pub fn resolve(outcome: LoadOutcome, now: DateTime<Utc>, config: &LedgerConfig) -> (Store, LoadSource) {
    match outcome {
        LoadOutcome::Missing => {
            info!("No ledger file found, starting with an empty store");
            (Store::empty(now, config.active_window_days), LoadSource::Fresh)
        }
        LoadOutcome::Found(doc @ StoreDocument::Legacy(_)) => {
            let store = doc.into_store(now, config.active_window_days);
            let count = store.instances.len();
            info!(
                migrated = count,
                "Migrated legacy job id list; instances will be archived on next save"
            );
            (store, LoadSource::Migrated { count })
        }
        LoadOutcome::Found(doc) => (doc.into_store(now, config.active_window_days), LoadSource::Current),
        LoadOutcome::Unreadable { reason } => {
            warn!(reason = %reason, "Ledger file unreadable, starting with an empty store");
            (
                Store::empty(now, config.active_window_days),
                LoadSource::Reset { reason },
            )
        }
    }
}
