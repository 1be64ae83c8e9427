// Archiver: moves aged instances into monthly buckets

use crate::application::config::LedgerConfig;
use crate::domain::{ArchiveMonth, ArchiveSummary, JobInstance, Store};
use crate::error::Result;
use crate::port::ArchiveRepository;
use chrono::{DateTime, Duration, Utc};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info};

/// Result of one archive pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArchiveOutcome {
    pub active_remaining: usize,
    pub archived_count: usize,
    pub months_touched: Vec<ArchiveMonth>,
}

/// Archiver
///
/// Partitions the active store at `now - active_window` and merges everything
/// at or before the cutoff into its `YYYY-MM` bucket.
pub struct Archiver {
    archive_repo: Arc<dyn ArchiveRepository>,
    active_window: Duration,
}

impl Archiver {
    pub fn new(archive_repo: Arc<dyn ArchiveRepository>, config: &LedgerConfig) -> Self {
        Self {
            archive_repo,
            active_window: config.active_window(),
        }
    }

    /// Split instances into `(active, aged)` around `cutoff`.
    ///
    /// Active means strictly newer than the cutoff. Order is preserved on both sides.
    pub fn partition(
        instances: &[JobInstance],
        cutoff: DateTime<Utc>,
    ) -> (Vec<&JobInstance>, Vec<&JobInstance>) {
        instances.iter().partition(|i| i.posted_at > cutoff)
    }

    /// Archive aged instances of `store`.
    ///
    /// Every bucket is written before `store.instances` is trimmed, so a failed
    /// write leaves the store untouched and a later pass merges the same
    /// instances again (merge is keyed by id, so no duplicates).
    pub async fn archive(&self, store: &mut Store, now: DateTime<Utc>) -> Result<ArchiveOutcome> {
        let cutoff = now - self.active_window;
        let (active, aged) = Self::partition(&store.instances, cutoff);

        if aged.is_empty() {
            debug!(active = active.len(), "Nothing to archive");
            return Ok(ArchiveOutcome {
                active_remaining: active.len(),
                ..Default::default()
            });
        }

        let mut by_month: BTreeMap<ArchiveMonth, Vec<JobInstance>> = BTreeMap::new();
        for instance in aged {
            by_month
                .entry(instance.archive_month())
                .or_default()
                .push(instance.clone());
        }

        let archived_count: usize = by_month.values().map(Vec::len).sum();
        let mut months_touched = Vec::with_capacity(by_month.len());

        for (month, incoming) in by_month {
            let inserted = self.merge_bucket(month, incoming).await?;
            debug!(month = %month, inserted, "Archive bucket merged");
            months_touched.push(month);
        }

        store.instances.retain(|i| i.posted_at > cutoff);
        store.metadata.total_jobs = store.instances.len();
        store.metadata.last_archive = Some(ArchiveSummary {
            at: now,
            archived_count,
            months: months_touched.iter().map(ToString::to_string).collect(),
        });

        info!(
            archived_count,
            active_remaining = store.instances.len(),
            months = ?store.metadata.last_archive.as_ref().map(|s| &s.months),
            "Archived aged instances"
        );

        Ok(ArchiveOutcome {
            active_remaining: store.instances.len(),
            archived_count,
            months_touched,
        })
    }

    /// Merge `incoming` into a bucket; returns how many were new.
    ///
    /// Skips the write entirely when every instance is already present.
    async fn merge_bucket(&self, month: ArchiveMonth, incoming: Vec<JobInstance>) -> Result<usize> {
        let mut merged = self.archive_repo.load_bucket(month).await?;
        let mut known: HashSet<String> = merged.iter().map(|i| i.id.clone()).collect();

        let before = merged.len();
        merged.extend(incoming.into_iter().filter(|i| known.insert(i.id.clone())));
        let inserted = merged.len() - before;

        if inserted == 0 {
            return Ok(0);
        }

        merged.sort_by_key(|i| i.posted_at);
        self.archive_repo.save_bucket(month, &merged).await?;
        Ok(inserted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::JobData;
    use crate::error::AppError;
    use crate::port::archive_repository::MockArchiveRepository;
    use chrono::TimeZone;
    use std::sync::Mutex;

    /// In-memory archive repository
    #[derive(Default)]
    struct MemoryArchive {
        buckets: Mutex<BTreeMap<ArchiveMonth, Vec<JobInstance>>>,
        writes: Mutex<usize>,
    }

    #[async_trait::async_trait]
    impl ArchiveRepository for MemoryArchive {
        async fn load_bucket(&self, month: ArchiveMonth) -> Result<Vec<JobInstance>> {
            Ok(self.buckets.lock().unwrap().get(&month).cloned().unwrap_or_default())
        }

        async fn read_bucket(&self, month: ArchiveMonth) -> Result<Option<Vec<JobInstance>>> {
            self.load_bucket(month).await.map(Some)
        }

        async fn save_bucket(&self, month: ArchiveMonth, instances: &[JobInstance]) -> Result<()> {
            *self.writes.lock().unwrap() += 1;
            self.buckets.lock().unwrap().insert(month, instances.to_vec());
            Ok(())
        }

        async fn list_months(&self) -> Result<Vec<ArchiveMonth>> {
            Ok(self.buckets.lock().unwrap().keys().copied().collect())
        }
    }

    fn day(n: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 20, 12, 0, 0).unwrap() + Duration::days(n)
    }

    fn instance(job: &str, at: DateTime<Utc>, n: u32) -> JobInstance {
        JobInstance::new(job, JobData::default(), at, n, None)
    }

    fn store_with(instances: Vec<JobInstance>) -> Store {
        let mut store = Store::empty(day(0), 7);
        for i in instances {
            store.record(i);
        }
        store
    }

    #[test]
    fn test_partition_boundary() {
        let instances = vec![instance("a", day(0), 1), instance("b", day(1), 1)];
        let (active, aged) = Archiver::partition(&instances, day(0));

        assert_eq!(active.len(), 1);
        assert_eq!(active[0].job_id, "b");
        assert_eq!(aged.len(), 1);
        assert_eq!(aged[0].job_id, "a");
    }

    #[tokio::test]
    async fn test_archive_groups_by_month_and_trims_store() {
        let repo = Arc::new(MemoryArchive::default());
        let archiver = Archiver::new(repo.clone(), &LedgerConfig::default());

        // day(0) = Jan 20, day(15) = Feb 4, day(30) = Feb 19
        let mut store = store_with(vec![
            instance("a", day(0), 1),
            instance("b", day(15), 1),
            instance("c", day(30), 1),
        ]);

        let outcome = archiver.archive(&mut store, day(31)).await.unwrap();

        assert_eq!(outcome.archived_count, 2);
        assert_eq!(outcome.active_remaining, 1);
        assert_eq!(
            outcome
                .months_touched
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>(),
            vec!["2024-01", "2024-02"]
        );
        assert_eq!(store.instances.len(), 1);
        assert_eq!(store.instances[0].job_id, "c");
        assert_eq!(store.metadata.total_jobs, 1);
        assert_eq!(store.metadata.last_archive.as_ref().unwrap().archived_count, 2);

        // Index still knows about archived jobs
        assert!(store.job_history("a").is_some());

        let buckets = repo.buckets.lock().unwrap();
        assert_eq!(buckets.len(), 2);
    }

    #[tokio::test]
    async fn test_archive_is_idempotent() {
        let repo = Arc::new(MemoryArchive::default());
        let archiver = Archiver::new(repo.clone(), &LedgerConfig::default());
        let mut store = store_with(vec![instance("a", day(0), 1), instance("b", day(9), 1)]);

        archiver.archive(&mut store, day(10)).await.unwrap();
        let snapshot = repo.buckets.lock().unwrap().clone();
        let writes = *repo.writes.lock().unwrap();

        let outcome = archiver.archive(&mut store, day(10)).await.unwrap();
        assert_eq!(outcome.archived_count, 0);
        assert_eq!(outcome.active_remaining, 1);
        assert_eq!(*repo.buckets.lock().unwrap(), snapshot);
        assert_eq!(*repo.writes.lock().unwrap(), writes);
    }

    #[tokio::test]
    async fn test_rearchiving_same_instances_inserts_no_duplicates() {
        let repo = Arc::new(MemoryArchive::default());
        let archiver = Archiver::new(repo.clone(), &LedgerConfig::default());
        let aged = instance("a", day(0), 1);

        let mut first = store_with(vec![aged.clone()]);
        archiver.archive(&mut first, day(10)).await.unwrap();

        // Same instance still in a stale copy of the store (crash before save)
        let mut stale = store_with(vec![aged.clone()]);
        let outcome = archiver.archive(&mut stale, day(10)).await.unwrap();
        assert_eq!(outcome.archived_count, 1);
        assert!(stale.instances.is_empty());

        let buckets = repo.buckets.lock().unwrap();
        let bucket = buckets.get(&aged.archive_month()).unwrap();
        assert_eq!(bucket.len(), 1);
        assert_eq!(*repo.writes.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_bucket_is_sorted_by_posted_at() {
        let repo = Arc::new(MemoryArchive::default());
        let month = ArchiveMonth::from_datetime(day(5));
        repo.buckets
            .lock()
            .unwrap()
            .insert(month, vec![instance("late", day(8), 1)]);

        let archiver = Archiver::new(repo.clone(), &LedgerConfig::default());
        let mut store = store_with(vec![instance("early", day(2), 1), instance("mid", day(5), 1)]);
        archiver.archive(&mut store, day(20)).await.unwrap();

        let buckets = repo.buckets.lock().unwrap();
        let ids: Vec<&str> = buckets[&month].iter().map(|i| i.job_id.as_str()).collect();
        assert_eq!(ids, vec!["early", "mid", "late"]);
    }

    #[tokio::test]
    async fn test_failed_bucket_write_leaves_store_untouched() {
        let mut repo = MockArchiveRepository::new();
        repo.expect_load_bucket().returning(|_| Ok(Vec::new()));
        repo.expect_save_bucket()
            .times(1)
            .returning(|_, _| Err(AppError::Storage("disk full".to_string())));

        let archiver = Archiver::new(Arc::new(repo), &LedgerConfig::default());
        let mut store = store_with(vec![instance("a", day(0), 1)]);
        let before = store.clone();

        let result = archiver.archive(&mut store, day(30)).await;
        assert!(matches!(result, Err(AppError::Storage(_))));
        assert_eq!(store, before);
    }

    #[tokio::test]
    async fn test_empty_store_does_not_touch_repository() {
        let repo = MockArchiveRepository::new();
        let archiver = Archiver::new(Arc::new(repo), &LedgerConfig::default());
        let mut store = Store::empty(day(0), 7);

        let outcome = archiver.archive(&mut store, day(100)).await.unwrap();
        assert_eq!(outcome, ArchiveOutcome::default());
        assert!(store.metadata.last_archive.is_none());
    }
}
