// Job Instance Domain Model

use crate::domain::archive::ArchiveMonth;
use crate::domain::job_data::JobData;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stable identifier of a job posting (opaque, produced upstream)
pub type JobId = String;

/// Identifier of one announcement event
pub type InstanceId = String;

/// Placeholder for display fields the source did not provide
pub const UNKNOWN: &str = "Unknown";

fn unknown() -> String {
    UNKNOWN.to_string()
}

/// One concrete announcement of a job.
///
/// Instances are created by the ledger's append path and never mutated
/// afterwards; the archiver only relocates them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobInstance {
    pub id: InstanceId,
    pub job_id: JobId,
    #[serde(default = "unknown")]
    pub company: String,
    #[serde(default = "unknown")]
    pub title: String,
    pub posted_at: DateTime<Utc>,
    pub source_date: Option<DateTime<Utc>>,
    pub source_url: Option<String>,
    pub external_ref: Option<String>,
    pub instance_number: u32,
}

/// Build the instance id for `(job_id, calendar date, instance_number)`
pub fn instance_id(job_id: &str, posted_at: DateTime<Utc>, instance_number: u32) -> InstanceId {
    format!("{}-{}-{}", job_id, posted_at.format("%Y%m%d"), instance_number)
}

impl JobInstance {
    /// Create a new instance with injected timestamp
    ///
    /// # Arguments
    ///
    /// * `job_id` - Stable job identifier
    /// * `data` - Display and freshness fields extracted from the source record
    /// * `posted_at` - Announcement time (injected, not system time)
    /// * `instance_number` - 1-based announcement counter for this job
    /// * `external_ref` - Downstream announcement reference, if known
    pub fn new(
        job_id: impl Into<String>,
        data: JobData,
        posted_at: DateTime<Utc>,
        instance_number: u32,
        external_ref: Option<String>,
    ) -> Self {
        let job_id = job_id.into();
        Self {
            id: instance_id(&job_id, posted_at, instance_number),
            job_id,
            company: data.company,
            title: data.title,
            posted_at,
            source_date: data.source_date,
            source_url: data.source_url,
            external_ref,
            instance_number,
        }
    }

    /// Archive bucket this instance belongs to once aged out
    pub fn archive_month(&self) -> ArchiveMonth {
        ArchiveMonth::from_datetime(self.posted_at)
    }
}
