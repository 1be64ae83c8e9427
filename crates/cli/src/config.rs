//! Runtime settings resolved from flags and environment

use anyhow::{Context, Result};
use clap::ValueEnum;
use posting_ledger_core::application::LedgerConfig;
use posting_ledger_infra_fs::DataLayout;
use std::path::PathBuf;

pub const DEFAULT_DATA_DIR: &str = "~/.posting-ledger";

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable, colored
    Pretty,
    /// One JSON object per line
    Json,
}

/// Everything the composition root needs to wire the ledger
#[derive(Debug, Clone)]
pub struct Settings {
    pub data_dir: PathBuf,
    pub ledger: LedgerConfig,
}

impl Settings {
    pub fn new(data_dir: &str, active_window_days: i64, reopening_window_days: i64) -> Result<Self> {
        let ledger = LedgerConfig {
            active_window_days,
            reopening_window_days,
        };
        ledger.validate().context("Invalid ledger configuration")?;

        let expanded = shellexpand::full(data_dir)
            .with_context(|| format!("Cannot expand data directory {:?}", data_dir))?;

        Ok(Self {
            data_dir: PathBuf::from(expanded.into_owned()),
            ledger,
        })
    }

    pub fn layout(&self) -> DataLayout {
        DataLayout::new(&self.data_dir)
    }
}
