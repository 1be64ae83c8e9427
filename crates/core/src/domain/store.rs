// Active Store Domain Model

use crate::domain::instance::{JobId, JobInstance};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Schema version written by this crate
pub const CURRENT_SCHEMA_VERSION: u32 = 2;

/// Per-job summary of every instance ever recorded (active and archived)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobHistory {
    /// Highest instance number recorded for the job
    pub instances: u32,
    pub first_posted_at: DateTime<Utc>,
    pub last_posted_at: DateTime<Utc>,
}

impl JobHistory {
    fn from_instance(instance: &JobInstance) -> Self {
        Self {
            instances: instance.instance_number,
            first_posted_at: instance.posted_at,
            last_posted_at: instance.posted_at,
        }
    }

    fn observe(&mut self, instance: &JobInstance) {
        self.instances = self.instances.max(instance.instance_number);
        self.first_posted_at = self.first_posted_at.min(instance.posted_at);
        self.last_posted_at = self.last_posted_at.max(instance.posted_at);
    }
}

pub type JobIndex = BTreeMap<JobId, JobHistory>;

/// Build a job index from any collection of instances
pub fn build_index<'a>(instances: impl IntoIterator<Item = &'a JobInstance>) -> JobIndex {
    let mut index = JobIndex::new();
    for instance in instances {
        index
            .entry(instance.job_id.clone())
            .and_modify(|h| h.observe(instance))
            .or_insert_with(|| JobHistory::from_instance(instance));
    }
    index
}

/// Summary of the most recent archive pass that moved anything
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveSummary {
    pub at: DateTime<Utc>,
    pub archived_count: usize,
    pub months: Vec<String>,
}

/// Bookkeeping stored next to the instances.
///
/// Every field is optional on read so documents written by other tools still
/// load; keys this crate does not know are carried through unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreMetadata {
    #[serde(default)]
    pub total_jobs: usize,
    #[serde(default)]
    pub active_window_days: i64,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub last_archive: Option<ArchiveSummary>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub migrated_from_v1: bool,
    /// Absent or unreadable in some documents; rebuilt on open
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub job_index: Option<JobIndex>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Optional field that degrades to `None` instead of failing the document
fn lenient<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| serde_json::from_value(v).ok()))
}

/// The active dedup database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Store {
    pub schema_version: u32,
    #[serde(default)]
    pub last_updated: DateTime<Utc>,
    pub instances: Vec<JobInstance>,
    #[serde(default)]
    pub metadata: StoreMetadata,
}

impl Store {
    /// Fresh empty store. The job index is left unset so the ledger
    /// rebuilds it from whatever archives already exist.
    pub fn empty(now: DateTime<Utc>, active_window_days: i64) -> Self {
        Self {
            schema_version: CURRENT_SCHEMA_VERSION,
            last_updated: now,
            instances: Vec::new(),
            metadata: StoreMetadata {
                active_window_days,
                ..Default::default()
            },
        }
    }

    /// Active instances of a job, in insertion order
    pub fn instances_for<'a>(&'a self, job_id: &'a str) -> impl Iterator<Item = &'a JobInstance> {
        self.instances.iter().filter(move |i| i.job_id == job_id)
    }

    pub fn job_history(&self, job_id: &str) -> Option<&JobHistory> {
        self.metadata.job_index.as_ref()?.get(job_id)
    }

    /// Number the next announcement of `job_id` will carry
    pub fn next_instance_number(&self, job_id: &str) -> u32 {
        let indexed = self.job_history(job_id).map_or(0, |h| h.instances);
        let active = self
            .instances_for(job_id)
            .map(|i| i.instance_number)
            .max()
            .unwrap_or(0);
        indexed.max(active) + 1
    }

    /// Append a new instance and fold it into the job index
    pub fn record(&mut self, instance: JobInstance) {
        self.index_instance(&instance);
        self.instances.push(instance);
        self.metadata.total_jobs = self.instances.len();
    }

    fn index_instance(&mut self, instance: &JobInstance) {
        self.metadata
            .job_index
            .get_or_insert_with(JobIndex::new)
            .entry(instance.job_id.clone())
            .and_modify(|h| h.observe(instance))
            .or_insert_with(|| JobHistory::from_instance(instance));
    }
}
