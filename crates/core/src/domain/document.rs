// On-disk Store Representations
//
// Two shapes exist on disk: the legacy flat list of job ids (v1) and the
// structured v2 document. Classification is explicit; migration is pure.

use crate::domain::error::{DomainError, Result};
use crate::domain::instance::{JobId, JobInstance};
use crate::domain::job_data::JobData;
use crate::domain::store::{Store, CURRENT_SCHEMA_VERSION};
use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use std::collections::HashSet;

/// A parsed store file
#[derive(Debug, Clone, PartialEq)]
pub enum StoreDocument {
    /// v1: JSON array of bare job ids
    Legacy(Vec<JobId>),
    /// v2: structured store
    Current(Store),
}

impl StoreDocument {
    /// Classify and parse raw file contents
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let value: Value = serde_json::from_slice(bytes)
            .map_err(|e| DomainError::MalformedDocument(e.to_string()))?;

        match value {
            Value::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    Value::String(id) => Ok(id),
                    other => Err(DomainError::MalformedDocument(format!(
                        "legacy list contains non-string entry: {}",
                        other
                    ))),
                })
                .collect::<Result<Vec<_>>>()
                .map(StoreDocument::Legacy),
            Value::Object(map) => match schema_version(&map) {
                Some(v) if v == u64::from(CURRENT_SCHEMA_VERSION) => {
                    serde_json::from_value(Value::Object(map))
                        .map(StoreDocument::Current)
                        .map_err(|e| DomainError::MalformedDocument(e.to_string()))
                }
                Some(v) => Err(DomainError::UnsupportedSchema(v)),
                None => Err(DomainError::MalformedDocument(
                    "object without schemaVersion".to_string(),
                )),
            },
            other => Err(DomainError::MalformedDocument(format!(
                "unexpected top-level value: {}",
                other
            ))),
        }
    }

    /// Bring any representation up to the current schema
    pub fn into_store(self, now: DateTime<Utc>, active_window_days: i64) -> Store {
        match self {
            StoreDocument::Legacy(ids) => migrate_legacy(&ids, now, active_window_days),
            StoreDocument::Current(store) => store,
        }
    }
}

fn schema_version(map: &serde_json::Map<String, Value>) -> Option<u64> {
    map.get("schemaVersion").and_then(Value::as_u64)
}

/// Wrap legacy job ids into first instances.
///
/// `postedAt` is backdated one day past the active window so the next save
/// moves every migrated instance into its archive bucket. Blank and repeated
/// ids are dropped.
pub fn migrate_legacy(job_ids: &[JobId], now: DateTime<Utc>, active_window_days: i64) -> Store {
    let posted_at = now - Duration::days(active_window_days + 1);
    let mut seen = HashSet::new();
    let mut store = Store::empty(now, active_window_days);

    store.instances = job_ids
        .iter()
        .map(|id| id.trim())
        .filter(|id| !id.is_empty() && seen.insert(*id))
        .map(|id| JobInstance::new(id, JobData::default(), posted_at, 1, None))
        .collect();
    store.metadata.total_jobs = store.instances.len();
    store.metadata.migrated_from_v1 = true;
    store
}
