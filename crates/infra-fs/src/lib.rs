// Posting Ledger Infrastructure - Filesystem Adapter
// Implements: LedgerRepository, ArchiveRepository

mod archive_file;
mod atomic;
mod layout;
mod ledger_file;

pub use archive_file::JsonArchiveRepository;
pub use atomic::{persist_atomic, quarantine};
pub use layout::{DataLayout, ARCHIVE_DIR_NAME, STORE_FILE_NAME};
pub use ledger_file::JsonLedgerRepository;

use posting_ledger_core::application::{LedgerConfig, PostingLedger};
use posting_ledger_core::error::Result;
use posting_ledger_core::port::TimeProvider;
use std::sync::Arc;

/// Wire filesystem repositories for `layout` and open the ledger
pub async fn open_ledger(
    layout: &DataLayout,
    time_provider: Arc<dyn TimeProvider>,
    config: LedgerConfig,
) -> Result<PostingLedger> {
    let ledger_repo = Arc::new(JsonLedgerRepository::new(
        layout.store_path.clone(),
        time_provider.clone(),
    ));
    let archive_repo = Arc::new(JsonArchiveRepository::new(
        layout.archive_dir.clone(),
        time_provider.clone(),
    ));

    PostingLedger::open(ledger_repo, archive_repo, time_provider, config).await
}
