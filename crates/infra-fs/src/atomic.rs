// Crash-safe JSON writes (temp file + fsync + rename)

use posting_ledger_core::error::{AppError, Result};
use serde::Serialize;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, warn};

pub(crate) fn storage_error(action: &str, path: &Path, err: std::io::Error) -> AppError {
    AppError::Storage(format!("Failed to {} {}: {}", action, path.display(), err))
}

/// Sibling path with `suffix` appended to the file name
fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name: OsString = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(suffix);
    path.with_file_name(name)
}

/// Serialize `payload` and atomically replace `path` with it.
///
/// The JSON is written to `<path>.tmp`, flushed and fsynced, then renamed over
/// the target. Readers see either the old or the new file, never a torn one.
/// Missing parent directories are created.
pub async fn persist_atomic<T>(path: &Path, payload: &T) -> Result<()>
where
    T: Serialize + ?Sized,
{
    let bytes = serde_json::to_vec_pretty(payload)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| storage_error("create directory", parent, e))?;
    }

    let tmp_path = sibling(path, ".tmp");
    if let Err(e) = write_synced(&tmp_path, &bytes).await {
        let _ = fs::remove_file(&tmp_path).await;
        return Err(storage_error("write temp file", &tmp_path, e));
    }

    if let Err(e) = fs::rename(&tmp_path, path).await {
        let _ = fs::remove_file(&tmp_path).await;
        return Err(storage_error("replace", path, e));
    }

    sync_parent_dir(path).await;

    debug!(path = %path.display(), bytes = bytes.len(), "Persisted file atomically");
    Ok(())
}

async fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(path).await?;
    file.write_all(bytes).await?;
    file.flush().await?;
    file.sync_all().await
}

/// Make the rename itself durable
#[cfg(unix)]
async fn sync_parent_dir(path: &Path) {
    let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) else {
        return;
    };
    let result = match fs::File::open(parent).await {
        Ok(dir) => dir.sync_all().await,
        Err(e) => Err(e),
    };
    if let Err(e) = result {
        warn!(path = %parent.display(), error = %e, "Failed to fsync directory");
    }
}

#[cfg(not(unix))]
async fn sync_parent_dir(_path: &Path) {}

/// Re-read `path` and compare its record count with `expected`.
///
/// A file `count` cannot parse counts as zero records.
pub(crate) async fn verify_count(
    path: &Path,
    expected: usize,
    count: fn(&[u8]) -> serde_json::Result<usize>,
) -> Result<()> {
    let bytes = fs::read(path)
        .await
        .map_err(|e| storage_error("re-read", path, e))?;

    let found = match count(&bytes) {
        Ok(found) => found,
        Err(e) => {
            error!(path = %path.display(), error = %e, "Saved file is not parseable");
            0
        }
    };

    if found != expected {
        error!(
            path = %path.display(),
            expected,
            found,
            "Verification failed after save"
        );
        return Err(AppError::Integrity {
            path: path.to_path_buf(),
            expected,
            found,
        });
    }
    Ok(())
}

/// Move an unreadable file aside as `<path>.corrupt-<millis>`.
///
/// An existing quarantine file is never replaced; a `-<n>` counter is
/// appended instead. Returns the new location.
pub async fn quarantine(path: &Path, now_millis: i64) -> Result<PathBuf> {
    let base = format!(".corrupt-{}", now_millis);
    let mut target = sibling(path, &base);
    let mut attempt = 0u32;
    while fs::try_exists(&target)
        .await
        .map_err(|e| storage_error("inspect", &target, e))?
    {
        attempt += 1;
        target = sibling(path, &format!("{}-{}", base, attempt));
    }

    fs::rename(path, &target)
        .await
        .map_err(|e| storage_error("quarantine", path, e))?;
    warn!(
        path = %path.display(),
        quarantined_to = %target.display(),
        "Quarantined unreadable file"
    );
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_persist_creates_parents_and_leaves_no_tmp() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/deeper/data.json");

        persist_atomic(&path, &json!({"a": 1})).await.unwrap();

        let written: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(written, json!({"a": 1}));
        assert!(!dir.path().join("nested/deeper/data.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_persist_replaces_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.json");

        persist_atomic(&path, &json!([1, 2, 3])).await.unwrap();
        persist_atomic(&path, &json!([4])).await.unwrap();

        let written: Vec<i32> = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(written, vec![4]);
    }

    #[tokio::test]
    async fn test_quarantine_moves_file_aside() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("posted_jobs.json");
        std::fs::write(&path, b"{garbage").unwrap();

        let moved = quarantine(&path, 1234).await.unwrap();

        assert!(!path.exists());
        assert_eq!(moved, dir.path().join("posted_jobs.json.corrupt-1234"));
        assert_eq!(std::fs::read(&moved).unwrap(), b"{garbage");
    }

    #[tokio::test]
    async fn test_quarantine_never_overwrites() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("2024-01.json");

        std::fs::write(&path, b"first").unwrap();
        let first = quarantine(&path, 77).await.unwrap();
        std::fs::write(&path, b"second").unwrap();
        let second = quarantine(&path, 77).await.unwrap();

        assert_ne!(first, second);
        assert_eq!(second, dir.path().join("2024-01.json.corrupt-77-1"));
        assert_eq!(std::fs::read(&first).unwrap(), b"first");
        assert_eq!(std::fs::read(&second).unwrap(), b"second");
    }

    fn count_array(bytes: &[u8]) -> serde_json::Result<usize> {
        serde_json::from_slice::<Vec<serde_json::Value>>(bytes).map(|items| items.len())
    }

    #[tokio::test]
    async fn test_verify_count_detects_mismatch() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.json");
        std::fs::write(&path, b"[1]").unwrap();

        verify_count(&path, 1, count_array).await.unwrap();
        match verify_count(&path, 3, count_array).await {
            Err(AppError::Integrity { expected, found, .. }) => {
                assert_eq!((expected, found), (3, 1));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_verify_count_unparseable_counts_zero() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.json");
        std::fs::write(&path, b"[1, 2").unwrap();

        let err = verify_count(&path, 2, count_array).await.unwrap_err();
        assert!(err.is_fatal());
        assert!(matches!(err, AppError::Integrity { expected: 2, found: 0, .. }));
    }

    #[test]
    fn test_sibling_appends_suffix() {
        let path = Path::new("/data/archive/2024-01.json");
        assert_eq!(
            sibling(path, ".tmp"),
            Path::new("/data/archive/2024-01.json.tmp")
        );
    }
}
