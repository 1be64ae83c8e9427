// Posting Ledger Service - dedup queries, append, archive, persistence

pub mod audit;

pub use audit::{AuditReport, BucketSummary};

use crate::application::archiver::{ArchiveOutcome, Archiver};
use crate::application::config::LedgerConfig;
use crate::application::dedup::{self, Decision};
use crate::application::schema::{self, LoadSource};
use crate::application::stats::{self, LedgerStats};
use crate::domain::{
    build_index, ArchiveMonth, DomainError, JobData, JobInstance, SourceMetadata, Store,
};
use crate::error::Result;
use crate::port::{ArchiveRepository, LedgerRepository, TimeProvider};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Posting Ledger
///
/// Owns the active store for the duration of one pipeline run. Mutating
/// operations take `&mut self`; the single-writer assumption is enforced by
/// ownership, not by locks.
pub struct PostingLedger {
    ledger_repo: Arc<dyn LedgerRepository>,
    archive_repo: Arc<dyn ArchiveRepository>,
    time_provider: Arc<dyn TimeProvider>,
    archiver: Archiver,
    config: LedgerConfig,
    store: Store,
    load_source: LoadSource,
}

impl PostingLedger {
    /// Open the ledger
    ///
    /// Loads (and if needed migrates) the active store. When the loaded store
    /// carries no job index, one is rebuilt from every archive bucket plus the
    /// active instances.
    ///
    /// # Arguments
    /// * `ledger_repo` - Active store persistence
    /// * `archive_repo` - Monthly archive persistence
    /// * `time_provider` - Clock (injected for determinism)
    /// * `config` - Window configuration
    pub async fn open(
        ledger_repo: Arc<dyn LedgerRepository>,
        archive_repo: Arc<dyn ArchiveRepository>,
        time_provider: Arc<dyn TimeProvider>,
        config: LedgerConfig,
    ) -> Result<Self> {
        config.validate()?;

        let now = time_provider.now();
        let outcome = ledger_repo.load().await?;
        let (mut store, load_source) = schema::resolve(outcome, now, &config);
        store.metadata.active_window_days = config.active_window_days;

        if store.metadata.job_index.is_none() {
            let archived = load_all_buckets(archive_repo.as_ref()).await?;
            let index = build_index(archived.iter().chain(store.instances.iter()));
            info!(
                jobs = index.len(),
                archived = archived.len(),
                active = store.instances.len(),
                "Rebuilt job index"
            );
            store.metadata.job_index = Some(index);
        }

        info!(
            instances = store.instances.len(),
            source = ?load_source,
            active_window_days = config.active_window_days,
            reopening_window_days = config.reopening_window_days,
            "Posting ledger opened"
        );

        Ok(Self {
            archiver: Archiver::new(archive_repo.clone(), &config),
            ledger_repo,
            archive_repo,
            time_provider,
            config,
            store,
            load_source,
        })
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn load_source(&self) -> &LoadSource {
        &self.load_source
    }

    /// Decide whether `job_id` should be announced, with the reason
    pub fn evaluate(&self, job_id: &str, source: Option<&SourceMetadata>) -> Decision {
        let now = self.time_provider.now();
        let decision = dedup::decide(self.store.job_history(job_id), source, now, &self.config);
        debug!(job_id = %job_id, decision = ?decision, "Dedup decision");
        decision
    }

    /// True when `job_id` must not be announced now
    pub fn should_skip(&self, job_id: &str, source: Option<&SourceMetadata>) -> bool {
        self.evaluate(job_id, source).should_skip()
    }

    /// Record an announcement from a loosely-typed source record
    ///
    /// See [`JobData::from_value`] for the fields that are read.
    pub async fn mark_as_posted(
        &mut self,
        job_id: &str,
        job_data: &serde_json::Value,
        external_ref: Option<String>,
    ) -> Result<JobInstance> {
        self.append(job_id, JobData::from_value(job_data), external_ref)
            .await
    }

    /// Record an announcement and durably save the ledger.
    ///
    /// The new instance stays in memory even if the save fails, so later
    /// queries in the same run keep skipping the job.
    pub async fn append(
        &mut self,
        job_id: &str,
        data: JobData,
        external_ref: Option<String>,
    ) -> Result<JobInstance> {
        if job_id.trim().is_empty() {
            return Err(DomainError::InvalidJobId("job id must not be empty".to_string()).into());
        }

        let now = self.time_provider.now();
        let instance_number = self.store.next_instance_number(job_id);
        let instance = JobInstance::new(job_id, data, now, instance_number, external_ref);
        self.store.record(instance.clone());

        info!(
            job_id = %instance.job_id,
            instance_id = %instance.id,
            instance_number,
            company = %instance.company,
            title = %instance.title,
            "Recorded announcement"
        );

        self.save().await?;
        Ok(instance)
    }

    /// Archive aged instances and durably persist the active store
    pub async fn save(&mut self) -> Result<ArchiveOutcome> {
        let now = self.time_provider.now();
        let outcome = self.archiver.archive(&mut self.store, now).await?;

        self.store.last_updated = now;
        self.store.metadata.total_jobs = self.store.instances.len();

        if let Err(e) = self.ledger_repo.save(&self.store).await {
            if e.is_fatal() {
                error!(error = %e, "Ledger integrity fault after save; stop processing");
            } else {
                error!(error = %e, instances = self.store.instances.len(), "Failed to save ledger");
            }
            return Err(e);
        }

        info!(
            instances = self.store.instances.len(),
            archived = outcome.archived_count,
            "Ledger saved"
        );
        Ok(outcome)
    }

    /// Statistics over the in-memory store
    pub fn stats(&self) -> LedgerStats {
        stats::compute(
            &self.store,
            self.time_provider.now(),
            self.config.active_window_days,
        )
    }

    /// Every recorded instance of `job_id`, archived and active, oldest first
    pub async fn history(&self, job_id: &str) -> Result<Vec<JobInstance>> {
        let mut seen = HashSet::new();
        let mut instances = Vec::new();

        if let Some(history) = self.store.job_history(job_id) {
            let first = ArchiveMonth::from_datetime(history.first_posted_at);
            let last = ArchiveMonth::from_datetime(history.last_posted_at);

            for month in self.archive_repo.list_months().await? {
                if month < first || month > last {
                    continue;
                }
                let bucket = self.archive_repo.read_bucket(month).await?;
                for instance in bucket.unwrap_or_default() {
                    if instance.job_id == job_id && seen.insert(instance.id.clone()) {
                        instances.push(instance);
                    }
                }
            }
        }

        for instance in self.store.instances_for(job_id) {
            if seen.insert(instance.id.clone()) {
                instances.push(instance.clone());
            }
        }

        instances.sort_by_key(|i| i.posted_at);
        Ok(instances)
    }

    /// Conservation check across the active store and every bucket
    pub async fn audit(&self) -> Result<AuditReport> {
        audit::run(&self.store, self.archive_repo.as_ref()).await
    }
}

async fn load_all_buckets(archive_repo: &dyn ArchiveRepository) -> Result<Vec<JobInstance>> {
    let mut all = Vec::new();
    for month in archive_repo.list_months().await? {
        all.extend(archive_repo.read_bucket(month).await?.unwrap_or_default());
    }
    Ok(all)
}
