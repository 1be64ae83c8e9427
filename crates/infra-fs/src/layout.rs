// Data directory layout

use posting_ledger_core::domain::ArchiveMonth;
use std::path::{Path, PathBuf};

/// Active store file name inside the data directory
pub const STORE_FILE_NAME: &str = "posted_jobs.json";

/// Archive bucket directory inside the data directory
pub const ARCHIVE_DIR_NAME: &str = "archive";

/// Where the ledger keeps its files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataLayout {
    pub store_path: PathBuf,
    pub archive_dir: PathBuf,
}

impl DataLayout {
    /// Standard layout rooted at `data_dir`
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        let data_dir = data_dir.as_ref();
        Self {
            store_path: data_dir.join(STORE_FILE_NAME),
            archive_dir: data_dir.join(ARCHIVE_DIR_NAME),
        }
    }

    pub fn bucket_path(&self, month: ArchiveMonth) -> PathBuf {
        self.archive_dir.join(month.file_name())
    }
}
