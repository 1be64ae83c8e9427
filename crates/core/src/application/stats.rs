// Store statistics (read-only)

use crate::domain::Store;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerStats {
    pub total: usize,
    pub unique_jobs: usize,
    pub active: usize,
    pub to_archive: usize,
    pub max_instances: u32,
    pub active_window_days: i64,
    pub last_updated: DateTime<Utc>,
}

/// Aggregate counts over the in-memory store
pub fn compute(store: &Store, now: DateTime<Utc>, active_window_days: i64) -> LedgerStats {
    let cutoff = now - Duration::days(active_window_days);
    let active = store.instances.iter().filter(|i| i.posted_at > cutoff).count();

    LedgerStats {
        total: store.instances.len(),
        unique_jobs: store
            .instances
            .iter()
            .map(|i| i.job_id.as_str())
            .collect::<HashSet<_>>()
            .len(),
        active,
        to_archive: store.instances.len() - active,
        max_instances: store
            .instances
            .iter()
            .map(|i| i.instance_number)
            .max()
            .unwrap_or(0),
        active_window_days,
        last_updated: store.last_updated,
    }
}
