mod helpers;

use chrono::NaiveDate;
use encore_core::models::{ProgressStage, QuotaMode, VersionType};
use encore_core::IngestError;
use encore_ingest::NoopProgress;
use helpers::{recorder, Harness};
use std::sync::atomic::Ordering;

#[tokio::test]
async fn successful_upload_stores_persists_and_counts() {
    let h = Harness::new(100, 10_000, QuotaMode::Check);

    let outcome = h
        .orchestrator
        .upload_one(h.request("take.mp3", 1_234).with_title("Take One"), &NoopProgress)
        .await
        .unwrap();

    assert_eq!(outcome.record.file_size_bytes, 1_234);
    assert_eq!(outcome.record.title, "Take One");
    assert_eq!(outcome.original_size_bytes, 1_234);
    assert_eq!(h.storage.puts().len(), 1);
    assert!(h.storage.contains(&h.storage.puts()[0]));
    assert_eq!(h.catalog.len(), 1);
    assert_eq!(h.ledger.used(h.owner_id), Some(1_334));

    // Signed by default; the key is recoverable from the stored URL.
    assert!(outcome.record.storage_url.contains("/object/sign/audio-files/"));
    assert!(outcome.record.storage_url.contains(&h.storage.puts()[0]));
}

#[tokio::test]
async fn quota_rejection_happens_before_any_write() {
    let h = Harness::new(900, 1_000, QuotaMode::Check);

    let err = h
        .orchestrator
        .upload_one(h.request("big.mp3", 200), &NoopProgress)
        .await
        .unwrap_err();

    match err {
        IngestError::QuotaExceeded {
            used_bytes,
            limit_bytes,
            delta_bytes,
        } => {
            assert_eq!((used_bytes, limit_bytes, delta_bytes), (900, 1_000, 200));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(h.storage.puts().is_empty());
    assert_eq!(h.catalog.insert_calls(), 0);
    assert_eq!(h.ledger.mutations(), 0);
    assert_eq!(h.ledger.used(h.owner_id), Some(900));
}

#[tokio::test]
async fn reserve_mode_rejection_happens_before_any_write() {
    let h = Harness::new(900, 1_000, QuotaMode::Reserve);

    let err = h
        .orchestrator
        .upload_one(h.request("big.mp3", 200), &NoopProgress)
        .await
        .unwrap_err();

    assert!(matches!(err, IngestError::QuotaExceeded { used_bytes: 900, .. }));
    assert!(h.storage.puts().is_empty());
    assert_eq!(h.ledger.mutations(), 0);
}

#[tokio::test]
async fn exact_fit_is_accepted() {
    let h = Harness::new(900, 1_000, QuotaMode::Check);
    h.orchestrator
        .upload_one(h.request("fits.mp3", 100), &NoopProgress)
        .await
        .unwrap();
    assert_eq!(h.ledger.used(h.owner_id), Some(1_000));
}

#[tokio::test]
async fn catalog_failure_deletes_the_exact_stored_object() {
    let h = Harness::new(0, 10_000, QuotaMode::Check);
    h.catalog.fail_insert.store(true, Ordering::SeqCst);

    let err = h
        .orchestrator
        .upload_one(h.request("take.wav", 500), &NoopProgress)
        .await
        .unwrap_err();

    assert!(matches!(err, IngestError::Catalog(_)));
    let puts = h.storage.puts();
    assert_eq!(puts.len(), 1);
    assert_eq!(h.storage.deletes(), puts);
    assert_eq!(h.storage.object_count(), 0);
    assert_eq!(h.ledger.used(h.owner_id), Some(0));
    assert_eq!(h.ledger.mutations(), 0);
}

#[tokio::test]
async fn reserve_mode_releases_reservation_on_catalog_failure() {
    let h = Harness::new(0, 10_000, QuotaMode::Reserve);
    h.catalog.fail_insert.store(true, Ordering::SeqCst);

    h.orchestrator
        .upload_one(h.request("take.wav", 500), &NoopProgress)
        .await
        .unwrap_err();

    assert_eq!(h.storage.deletes(), h.storage.puts());
    // reserve + release
    assert_eq!(h.ledger.mutations(), 2);
    assert_eq!(h.ledger.used(h.owner_id), Some(0));
}

#[tokio::test]
async fn reserve_mode_counts_once() {
    let h = Harness::new(0, 10_000, QuotaMode::Reserve);
    h.orchestrator
        .upload_one(h.request("take.wav", 500), &NoopProgress)
        .await
        .unwrap();
    assert_eq!(h.ledger.mutations(), 1);
    assert_eq!(h.ledger.used(h.owner_id), Some(500));
}

#[tokio::test]
async fn signing_failure_deletes_the_stored_object() {
    let h = Harness::new(0, 10_000, QuotaMode::Check);
    h.storage.fail_signed_url.store(true, Ordering::SeqCst);

    let err = h
        .orchestrator
        .upload_one(h.request("take.mp3", 10), &NoopProgress)
        .await
        .unwrap_err();

    assert!(matches!(err, IngestError::Storage(_)));
    assert_eq!(h.storage.deletes(), h.storage.puts());
    assert_eq!(h.catalog.insert_calls(), 0);
}

#[tokio::test]
async fn storage_put_failure_writes_nothing_else() {
    let h = Harness::new(0, 10_000, QuotaMode::Check);
    h.storage.fail_put.store(true, Ordering::SeqCst);

    let err = h
        .orchestrator
        .upload_one(h.request("take.mp3", 10), &NoopProgress)
        .await
        .unwrap_err();

    assert!(matches!(err, IngestError::Storage(_)));
    assert_eq!(h.catalog.insert_calls(), 0);
    assert_eq!(h.ledger.mutations(), 0);
}

#[tokio::test]
async fn ledger_failure_after_persist_is_swallowed() {
    let h = Harness::new(0, 10_000, QuotaMode::Check);
    h.ledger.fail_updates.store(true, Ordering::SeqCst);

    let outcome = h
        .orchestrator
        .upload_one(h.request("take.mp3", 10), &NoopProgress)
        .await
        .unwrap();

    assert!(h.catalog.record(outcome.record.id).is_some());
    assert!(h.storage.deletes().is_empty());
    assert_eq!(h.ledger.used(h.owner_id), Some(0));
}

#[tokio::test]
async fn invalid_format_is_rejected_before_processing() {
    let h = Harness::new(0, 10_000, QuotaMode::Check);
    let mut request = h.request("notes.txt", 10);
    request.content_type = "text/plain".to_string();

    let err = h
        .orchestrator
        .upload_one(request, &NoopProgress)
        .await
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "Validation error: Unsupported audio format. Please use MP3, WAV, AAC, M4A, FLAC, or OGG."
    );
    assert_eq!(h.processor.calls(), 0);
    assert!(h.storage.puts().is_empty());
}

#[tokio::test]
async fn decode_failure_is_surfaced_without_writes() {
    let h = Harness::new(0, 10_000, QuotaMode::Check);
    h.processor.fail_decode.store(true, Ordering::SeqCst);

    let err = h
        .orchestrator
        .upload_one(h.request("take.mp3", 10), &NoopProgress)
        .await
        .unwrap_err();

    assert!(matches!(err, IngestError::Decode(_)));
    assert!(err.is_pre_write());
    assert!(h.storage.puts().is_empty());
}

#[tokio::test]
async fn missing_quota_account_is_not_found() {
    let h = Harness::new(0, 10_000, QuotaMode::Check);
    let mut request = h.request("take.mp3", 10);
    request.owner_id = uuid::Uuid::new_v4();

    let err = h
        .orchestrator
        .upload_one(request, &NoopProgress)
        .await
        .unwrap_err();
    assert!(matches!(err, IngestError::NotFound(_)));
    assert!(h.storage.puts().is_empty());
}

#[tokio::test]
async fn progress_walks_every_stage_in_order() {
    let h = Harness::new(0, 10_000, QuotaMode::Check);
    let (events, observer) = recorder();

    h.orchestrator
        .upload_one(h.request("take.mp3", 10), &observer)
        .await
        .unwrap();

    let events = events.lock().unwrap();
    let messages: Vec<&str> = events.iter().map(|e| e.message.as_str()).collect();
    assert_eq!(
        messages,
        vec![
            "Validating file...",
            "Processing audio...",
            "Audio processing complete",
            "Checking storage quota...",
            "Quota check passed",
            "Uploading to cloud storage...",
            "Upload complete",
            "Saving metadata...",
            "Updating storage quota...",
            "Upload successful!",
        ]
    );
    assert!(events
        .windows(2)
        .all(|w| w[0].progress_percent <= w[1].progress_percent));
    assert_eq!(events.last().unwrap().stage, ProgressStage::Complete);
    assert!(events.iter().all(|e| !e.is_failure()));
}

#[tokio::test]
async fn failure_is_reported_to_observer() {
    let h = Harness::new(900, 1_000, QuotaMode::Check);
    let (events, observer) = recorder();

    let _ = h
        .orchestrator
        .upload_one(h.request("big.mp3", 200), &observer)
        .await;

    let events = events.lock().unwrap();
    let last = events.last().unwrap();
    assert!(last.is_failure());
    assert_eq!(last.message, "Upload failed");
    assert!(last
        .error
        .as_deref()
        .unwrap()
        .starts_with("Storage quota exceeded."));
}

#[tokio::test]
async fn stats_and_listing_reflect_uploads() {
    let h = Harness::new(0, 10_000, QuotaMode::Check);
    for (name, size) in [("a.mp3", 100), ("b.mp3", 250)] {
        h.orchestrator
            .upload_one(h.request(name, size), &NoopProgress)
            .await
            .unwrap();
    }

    let stats = h.orchestrator.upload_stats(h.owner_id).await.unwrap();
    assert_eq!(stats.total_files, 2);
    assert_eq!(stats.total_size_bytes, 350);
    // 350 encoded bytes at an assumed 70% of the original.
    assert_eq!(stats.estimated_compression_savings_bytes, 150);

    assert_eq!(h.orchestrator.list(h.owner_id, 10, 0).await.unwrap().len(), 2);
    assert_eq!(h.orchestrator.list(h.owner_id, 1, 0).await.unwrap().len(), 1);
    assert!(matches!(
        h.orchestrator.list(h.owner_id, 0, 0).await,
        Err(IngestError::Validation(_))
    ));
}

#[tokio::test]
async fn empty_owner_stats_report_no_savings() {
    let h = Harness::new(0, 10_000, QuotaMode::Check);
    let stats = h.orchestrator.upload_stats(h.owner_id).await.unwrap();
    assert_eq!(stats.total_files, 0);
    assert_eq!(stats.estimated_compression_savings_bytes, 0);
}

#[tokio::test]
async fn version_type_and_recording_date_are_persisted() {
    let h = Harness::new(0, 10_000, QuotaMode::Check);
    let date = NaiveDate::from_ymd_opt(2024, 11, 3).unwrap();

    let outcome = h
        .orchestrator
        .upload_one(
            h.request("rehearsal.mp3", 64)
                .with_version_type(VersionType::Rehearsal)
                .with_recording_date(date),
            &NoopProgress,
        )
        .await
        .unwrap();

    let stored = h.catalog.record(outcome.record.id).unwrap();
    assert_eq!(stored.version_type, VersionType::Rehearsal);
    assert_eq!(stored.recording_date, Some(date));

    let plain = h
        .orchestrator
        .upload_one(h.request("plain.mp3", 64), &NoopProgress)
        .await
        .unwrap();
    assert_eq!(plain.record.version_type, VersionType::Other);
    assert_eq!(plain.record.recording_date, None);
}

#[tokio::test]
async fn titles_with_dot_runs_produce_storable_keys() {
    let h = Harness::new(0, 10_000, QuotaMode::Check);

    for name in ["Wait....mp3", "v1..2.mp3"] {
        let outcome = h
            .orchestrator
            .upload_one(h.request(name, 32), &NoopProgress)
            .await
            .unwrap();
        assert!(outcome.record.title.contains(".."));
    }

    assert_eq!(h.storage.object_count(), 2);
    for key in h.storage.puts() {
        assert!(!key.contains(".."), "unstorable key {}", key);
    }
}
