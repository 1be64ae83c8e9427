// Conservation audit across active store and archive buckets

use crate::domain::{ArchiveMonth, Store};
use crate::error::Result;
use crate::port::ArchiveRepository;
use serde::Serialize;
use std::collections::HashMap;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketSummary {
    pub month: String,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditReport {
    pub active_count: usize,
    pub archived_count: usize,
    pub buckets: Vec<BucketSummary>,
    /// Ids stored more than once (across or within files)
    pub duplicate_ids: Vec<String>,
    /// Archived ids whose `postedAt` does not belong to their bucket's month
    pub misfiled_ids: Vec<String>,
    /// Buckets that exist but cannot be parsed
    pub unreadable_buckets: Vec<String>,
}

impl AuditReport {
    pub fn is_consistent(&self) -> bool {
        self.duplicate_ids.is_empty()
            && self.misfiled_ids.is_empty()
            && self.unreadable_buckets.is_empty()
    }
}

/// Read every bucket and count ids. Nothing on disk is modified.
///
/// An id present in both the active store and a bucket is reported as a
/// duplicate; this is expected after a crash between a bucket write and the
/// active-store save, and clears on the next archive pass.
pub async fn run(store: &Store, archive_repo: &dyn ArchiveRepository) -> Result<AuditReport> {
    let mut report = AuditReport {
        active_count: store.instances.len(),
        ..Default::default()
    };
    let mut seen: HashMap<String, usize> = HashMap::new();

    for month in archive_repo.list_months().await? {
        let Some(bucket) = archive_repo.read_bucket(month).await? else {
            report.unreadable_buckets.push(month.to_string());
            continue;
        };
        report.archived_count += bucket.len();
        report.buckets.push(BucketSummary {
            month: month.to_string(),
            count: bucket.len(),
        });

        for instance in bucket {
            if ArchiveMonth::from_datetime(instance.posted_at) != month {
                report.misfiled_ids.push(instance.id.clone());
            }
            *seen.entry(instance.id).or_default() += 1;
        }
    }

    for instance in &store.instances {
        *seen.entry(instance.id.clone()).or_default() += 1;
    }

    report.duplicate_ids = seen
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(id, _)| id)
        .collect();
    report.duplicate_ids.sort();

    if report.is_consistent() {
        info!(
            active = report.active_count,
            archived = report.archived_count,
            buckets = report.buckets.len(),
            "Ledger audit passed"
        );
    } else {
        warn!(
            duplicates = report.duplicate_ids.len(),
            misfiled = report.misfiled_ids.len(),
            unreadable = report.unreadable_buckets.len(),
            "Ledger audit found inconsistencies"
        );
    }

    Ok(report)
}
