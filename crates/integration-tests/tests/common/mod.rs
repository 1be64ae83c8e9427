//! Shared fixture: a ledger on a temp directory driven by a manual clock

#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use posting_ledger_core::application::{LedgerConfig, PostingLedger};
use posting_ledger_core::domain::SourceMetadata;
use posting_ledger_core::port::ManualTimeProvider;
use posting_ledger_infra_fs::{open_ledger, DataLayout};
use std::sync::Arc;
use tempfile::TempDir;

pub struct Harness {
    pub dir: TempDir,
    pub layout: DataLayout,
    pub clock: Arc<ManualTimeProvider>,
    pub config: LedgerConfig,
}

/// Day 0 of every scenario
pub fn origin() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap()
}

pub fn day(n: i64) -> DateTime<Utc> {
    origin() + Duration::days(n)
}

pub fn source(at: DateTime<Utc>) -> SourceMetadata {
    SourceMetadata::new(Some(at))
}

impl Harness {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let layout = DataLayout::new(dir.path());
        Self {
            dir,
            layout,
            clock: Arc::new(ManualTimeProvider::new(origin())),
            config: LedgerConfig::default(),
        }
    }

    pub fn at_day(&self, n: i64) -> &Self {
        self.clock.set(day(n));
        self
    }

    /// Open the ledger as a new pipeline run would
    pub async fn open(&self) -> PostingLedger {
        open_ledger(&self.layout, self.clock.clone(), self.config)
            .await
            .unwrap()
    }

    pub fn read_store_json(&self) -> serde_json::Value {
        serde_json::from_slice(&std::fs::read(&self.layout.store_path).unwrap()).unwrap()
    }

    pub fn bucket_files(&self) -> Vec<String> {
        let mut names: Vec<String> = match std::fs::read_dir(&self.layout.archive_dir) {
            Ok(entries) => entries
                .filter_map(|e| e.ok())
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect(),
            Err(_) => Vec::new(),
        };
        names.sort();
        names
    }
}
