//! Recovery - legacy migration, corrupt files and index rebuild

mod common;

use common::{day, source, Harness};
use posting_ledger_core::application::LoadSource;
use posting_ledger_core::domain::ArchiveMonth;
use serde_json::json;

fn quarantined(dir: &std::path::Path, prefix: &str) -> usize {
    std::fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().starts_with(prefix))
        .count()
}

/// Recovery 1: a legacy id list is migrated, archived and still deduplicated
#[tokio::test]
async fn test_legacy_list_migration_end_to_end() {
    let h = Harness::new();
    std::fs::write(&h.layout.store_path, br#"["L1", "L2", "L1"]"#).unwrap();

    let mut ledger = h.at_day(0).open().await;
    assert_eq!(ledger.load_source(), &LoadSource::Migrated { count: 2 });

    // Backdated past the active window: only a fresh source date reopens
    assert!(ledger.should_skip("L1", None));
    assert!(!ledger.should_skip("L1", Some(&source(day(-2)))));

    let outcome = ledger.save().await.unwrap();
    assert_eq!(outcome.archived_count, 2);

    let store = h.read_store_json();
    assert_eq!(store["schemaVersion"], 2);
    assert_eq!(store["metadata"]["migratedFromV1"], true);
    assert_eq!(store["instances"], json!([]));

    let mut ledger = h.at_day(1).open().await;
    assert_eq!(ledger.load_source(), &LoadSource::Current);
    assert!(ledger.should_skip("L2", None));

    let again = ledger
        .mark_as_posted("L2", &json!({}), None)
        .await
        .unwrap();
    assert_eq!(again.instance_number, 2);

    let history = ledger.history("L2").await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].company, "Unknown");

    println!("✅ Recovery 1: legacy migration");
}

/// Recovery 2: a corrupt active store is quarantined and history comes back from archives
#[tokio::test]
async fn test_corrupt_store_rebuilds_from_archives() {
    let h = Harness::new();
    let mut ledger = h.at_day(0).open().await;
    ledger.mark_as_posted("A", &json!({}), None).await.unwrap();

    let mut ledger = h.at_day(10).open().await;
    ledger.save().await.unwrap();

    std::fs::write(&h.layout.store_path, b"{\"schemaVersion\": 2, \"inst").unwrap();

    let mut ledger = h.at_day(12).open().await;
    assert!(matches!(ledger.load_source(), LoadSource::Reset { .. }));
    assert_eq!(quarantined(h.dir.path(), "posted_jobs.json.corrupt-"), 1);

    // Archived history still suppresses and numbers the job
    assert!(ledger.should_skip("A", None));
    let next = ledger
        .mark_as_posted("A", &json!({}), None)
        .await
        .unwrap();
    assert_eq!(next.instance_number, 2);

    println!("✅ Recovery 2: corrupt store");
}

/// Recovery 3: a corrupt bucket is only set aside when an archive pass rewrites it
#[tokio::test]
async fn test_corrupt_bucket_is_quarantined_on_merge() {
    let h = Harness::new();
    let month = ArchiveMonth::from_datetime(day(0));
    std::fs::create_dir_all(&h.layout.archive_dir).unwrap();
    std::fs::write(h.layout.bucket_path(month), b"not json").unwrap();

    let mut ledger = h.at_day(0).open().await;
    ledger.mark_as_posted("A", &json!({}), None).await.unwrap();

    // Read-only views report the bucket and leave it alone
    let report = ledger.audit().await.unwrap();
    assert_eq!(report.unreadable_buckets, vec!["2024-01".to_string()]);
    assert_eq!(ledger.history("A").await.unwrap().len(), 1);
    assert_eq!(h.bucket_files(), vec!["2024-01.json"]);

    let mut ledger = h.at_day(9).open().await;
    ledger.save().await.unwrap();
    assert_eq!(quarantined(&h.layout.archive_dir, "2024-01.json.corrupt-"), 1);

    let report = ledger.audit().await.unwrap();
    assert!(report.is_consistent());
    assert_eq!(report.archived_count, 1);
    assert_eq!(h.bucket_files().len(), 2);

    println!("✅ Recovery 3: corrupt bucket");
}

/// Recovery 4: a current document without a job index gets one on open
#[tokio::test]
async fn test_missing_index_is_rebuilt() {
    let h = Harness::new();
    let mut ledger = h.at_day(0).open().await;
    ledger.mark_as_posted("A", &json!({}), None).await.unwrap();
    ledger.mark_as_posted("B", &json!({}), None).await.unwrap();

    let mut ledger = h.at_day(8).open().await;
    ledger.save().await.unwrap();
    let mut ledger = h.at_day(9).open().await;
    ledger.mark_as_posted("A", &json!({}), None).await.unwrap();

    let mut store = h.read_store_json();
    store["metadata"]
        .as_object_mut()
        .unwrap()
        .remove("jobIndex");
    std::fs::write(&h.layout.store_path, serde_json::to_vec(&store).unwrap()).unwrap();

    let ledger = h.at_day(9).open().await;
    let index = ledger.store().metadata.job_index.as_ref().unwrap();
    assert_eq!(index["A"].instances, 2);
    assert_eq!(index["A"].first_posted_at, day(0));
    assert_eq!(index["A"].last_posted_at, day(9));
    assert_eq!(index["B"].instances, 1);

    println!("✅ Recovery 4: index rebuild");
}

/// Recovery 5: a current document with sparse metadata is kept, not reset
#[tokio::test]
async fn test_sparse_current_document_is_kept() {
    let h = Harness::new();
    let document = json!({
        "schemaVersion": 2,
        "instances": [{
            "id": format!("A-{}-1", day(0).format("%Y%m%d")),
            "jobId": "A",
            "company": "Acme",
            "title": "Engineer",
            "postedAt": day(0).to_rfc3339(),
            "instanceNumber": 1
        }],
        "metadata": {"totalJobs": 1, "exportedBy": "sheet-sync"}
    });
    std::fs::write(&h.layout.store_path, serde_json::to_vec(&document).unwrap()).unwrap();

    let mut ledger = h.at_day(1).open().await;
    assert_eq!(ledger.load_source(), &LoadSource::Current);
    assert!(ledger.should_skip("A", None));
    assert!(h.layout.store_path.exists());

    let next = ledger.mark_as_posted("A", &json!({}), None).await.unwrap();
    assert_eq!(next.instance_number, 2);

    let store = h.read_store_json();
    assert_eq!(store["metadata"]["activeWindowDays"], 7);
    assert_eq!(store["metadata"]["exportedBy"], "sheet-sync");

    println!("✅ Recovery 5: sparse current document");
}
