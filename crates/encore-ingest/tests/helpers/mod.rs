//! In-memory recording doubles for the upload workflow.
#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use encore_core::models::{
    AudioMetadata, LedgerUpdate, NewUploadRecord, QuotaAccount, QuotaMode, UploadProgress,
    UploadRecord, UploadStats,
};
use encore_core::{IngestError, IngestResult, StorageBackend};
use encore_db::{CatalogStore, LedgerStore};
use encore_ingest::{FnProgress, QuotaLedger, UploadOrchestrator, UploadRequest};
use encore_processing::{
    AudioAsset, AudioBuffer, AudioProcessing, ProcessingError, ProcessingOptions,
};
use encore_storage::keys::{key_after_bucket, validate_key};
use encore_storage::{Storage, StorageError, StorageResult};
use hound::{SampleFormat, WavSpec, WavWriter};
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

pub const BUCKET: &str = "audio-files";
pub const MB: i64 = 1024 * 1024;

// ---------------------------------------------------------------------------
// Storage
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct FakeStorage {
    objects: Mutex<HashMap<String, Bytes>>,
    puts: Mutex<Vec<String>>,
    deletes: Mutex<Vec<String>>,
    pub fail_put: AtomicBool,
    pub fail_delete: AtomicBool,
    pub fail_signed_url: AtomicBool,
}

impl FakeStorage {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn puts(&self) -> Vec<String> {
        self.puts.lock().unwrap().clone()
    }

    pub fn deletes(&self) -> Vec<String> {
        self.deletes.lock().unwrap().clone()
    }

    pub fn object_count(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.objects.lock().unwrap().contains_key(key)
    }
}

#[async_trait]
impl Storage for FakeStorage {
    async fn put(&self, storage_key: &str, data: Bytes, _content_type: &str) -> StorageResult<String> {
        self.puts.lock().unwrap().push(storage_key.to_string());
        validate_key(storage_key)?;
        if self.fail_put.load(Ordering::SeqCst) {
            return Err(StorageError::UploadFailed("injected put failure".to_string()));
        }
        self.objects
            .lock()
            .unwrap()
            .insert(storage_key.to_string(), data);
        Ok(storage_key.to_string())
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<()> {
        self.deletes.lock().unwrap().push(storage_key.to_string());
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(StorageError::DeleteFailed("injected delete failure".to_string()));
        }
        self.objects.lock().unwrap().remove(storage_key);
        Ok(())
    }

    fn public_url(&self, storage_key: &str) -> String {
        format!("https://storage.test/object/public/{}/{}", BUCKET, storage_key)
    }

    async fn signed_url(&self, storage_key: &str, expires_in: Duration) -> StorageResult<String> {
        if self.fail_signed_url.load(Ordering::SeqCst) {
            return Err(StorageError::BackendError("injected signing failure".to_string()));
        }
        Ok(format!(
            "https://storage.test/object/sign/{}/{}?token=t0k3n&expires={}",
            BUCKET,
            storage_key,
            expires_in.as_secs()
        ))
    }

    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        Ok(self.contains(storage_key))
    }

    fn key_from_url(&self, url: &str) -> StorageResult<String> {
        key_after_bucket(url, BUCKET)
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct FakeCatalog {
    records: Mutex<HashMap<Uuid, UploadRecord>>,
    insert_calls: AtomicUsize,
    pub fail_insert: AtomicBool,
    pub fail_delete: AtomicBool,
}

impl FakeCatalog {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn insert_calls(&self) -> usize {
        self.insert_calls.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn record(&self, id: Uuid) -> Option<UploadRecord> {
        self.records.lock().unwrap().get(&id).cloned()
    }
}

#[async_trait]
impl CatalogStore for FakeCatalog {
    async fn insert(&self, record: NewUploadRecord) -> IngestResult<UploadRecord> {
        self.insert_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_insert.load(Ordering::SeqCst) {
            return Err(IngestError::Catalog("injected insert failure".to_string()));
        }
        let stored = UploadRecord {
            id: Uuid::new_v4(),
            owner_id: record.owner_id,
            title: record.title,
            storage_url: record.storage_url,
            file_size_bytes: record.file_size_bytes,
            duration_seconds: record.duration_seconds,
            version_type: record.version_type,
            recording_date: record.recording_date,
            metadata: Some(record.metadata),
            created_at: Utc::now(),
        };
        self.records
            .lock()
            .unwrap()
            .insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn get_by_id(&self, id: Uuid) -> IngestResult<Option<UploadRecord>> {
        Ok(self.record(id))
    }

    async fn delete(&self, id: Uuid) -> IngestResult<bool> {
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(IngestError::Catalog("injected delete failure".to_string()));
        }
        Ok(self.records.lock().unwrap().remove(&id).is_some())
    }

    async fn list_by_owner(
        &self,
        owner_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> IngestResult<Vec<UploadRecord>> {
        let mut records: Vec<UploadRecord> = self
            .records
            .lock()
            .unwrap()
            .values()
            .filter(|r| r.owner_id == owner_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn stats_for_owner(&self, owner_id: Uuid) -> IngestResult<UploadStats> {
        let records = self.records.lock().unwrap();
        let owned = records.values().filter(|r| r.owner_id == owner_id);
        let mut stats = UploadStats::default();
        for record in owned {
            stats.total_files += 1;
            stats.total_size_bytes += record.file_size_bytes;
            stats.total_duration_seconds += record.duration_seconds;
        }
        Ok(stats)
    }
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// `used` is `None` to model a NULL column.
#[derive(Default)]
pub struct FakeLedger {
    accounts: Mutex<HashMap<Uuid, (Option<i64>, i64)>>,
    mutations: AtomicUsize,
    pub fail_updates: AtomicBool,
}

impl FakeLedger {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_account(self: Arc<Self>, account_id: Uuid, used: Option<i64>, limit: i64) -> Arc<Self> {
        self.accounts
            .lock()
            .unwrap()
            .insert(account_id, (used, limit));
        self
    }

    pub fn used(&self, account_id: Uuid) -> Option<i64> {
        self.accounts
            .lock()
            .unwrap()
            .get(&account_id)
            .map(|(used, _)| used.unwrap_or(0))
    }

    pub fn mutations(&self) -> usize {
        self.mutations.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LedgerStore for FakeLedger {
    async fn get_account(&self, account_id: Uuid) -> IngestResult<Option<QuotaAccount>> {
        Ok(self
            .accounts
            .lock()
            .unwrap()
            .get(&account_id)
            .map(|(used, limit)| QuotaAccount {
                account_id,
                used_bytes: used.unwrap_or(0),
                limit_bytes: *limit,
            }))
    }

    async fn apply_update(
        &self,
        account_id: Uuid,
        update: LedgerUpdate,
    ) -> IngestResult<Option<QuotaAccount>> {
        update.validate()?;
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(IngestError::Catalog("injected ledger failure".to_string()));
        }

        let mut accounts = self.accounts.lock().unwrap();
        let Some((used, limit)) = accounts.get_mut(&account_id) else {
            return Ok(None);
        };
        let Some(next) = update.apply(*used, *limit) else {
            return Ok(None);
        };
        *used = Some(next);
        self.mutations.fetch_add(1, Ordering::SeqCst);

        Ok(Some(QuotaAccount {
            account_id,
            used_bytes: next,
            limit_bytes: *limit,
        }))
    }

    async fn open_account(&self, account_id: Uuid, limit_bytes: i64) -> IngestResult<QuotaAccount> {
        let mut accounts = self.accounts.lock().unwrap();
        let (used, limit) = *accounts
            .entry(account_id)
            .or_insert((Some(0), limit_bytes));
        Ok(QuotaAccount {
            account_id,
            used_bytes: used.unwrap_or(0),
            limit_bytes: limit,
        })
    }
}

// ---------------------------------------------------------------------------
// Processor
// ---------------------------------------------------------------------------

/// Skips DSP: the "encoded" asset is the input bytes, so tests control sizes exactly.
#[derive(Default)]
pub struct PassthroughProcessor {
    calls: AtomicUsize,
    pub fail_decode: AtomicBool,
}

impl PassthroughProcessor {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl AudioProcessing for PassthroughProcessor {
    fn process(
        &self,
        original: Bytes,
        _extension_hint: Option<&str>,
        options: &ProcessingOptions,
    ) -> Result<AudioAsset, ProcessingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_decode.load(Ordering::SeqCst) {
            return Err(ProcessingError::Decode("injected decode failure".to_string()));
        }

        let buffer = AudioBuffer::new(vec![vec![0.0; 441]], 44_100);
        Ok(AudioAsset {
            original: original.clone(),
            resampled: buffer.clone(),
            processed: buffer,
            encoded: original.clone(),
            encoded_bitrate_kbps: options.max_bitrate_kbps,
            metadata: AudioMetadata {
                duration_seconds: 0.01,
                sample_rate_hz: 44_100,
                channel_count: 1,
                bitrate_kbps: options.max_bitrate_kbps,
                file_size_bytes: original.len() as i64,
                rms_level: 0.0,
                peak_level: 0.0,
                format: "mp3".to_string(),
            },
        })
    }
}

// ---------------------------------------------------------------------------
// Wiring
// ---------------------------------------------------------------------------

pub struct Harness {
    pub owner_id: Uuid,
    pub storage: Arc<FakeStorage>,
    pub catalog: Arc<FakeCatalog>,
    pub ledger: Arc<FakeLedger>,
    pub processor: Arc<PassthroughProcessor>,
    pub orchestrator: Arc<UploadOrchestrator>,
}

impl Harness {
    pub fn new(used: i64, limit: i64, mode: QuotaMode) -> Self {
        let owner_id = Uuid::new_v4();
        let storage = FakeStorage::new();
        let catalog = FakeCatalog::new();
        let ledger = FakeLedger::new().with_account(owner_id, Some(used), limit);
        let processor = PassthroughProcessor::new();

        let orchestrator = UploadOrchestrator::new(
            processor.clone(),
            storage.clone(),
            catalog.clone(),
            QuotaLedger::new(ledger.clone(), mode),
        );

        Self {
            owner_id,
            storage,
            catalog,
            ledger,
            processor,
            orchestrator: Arc::new(orchestrator),
        }
    }

    /// A request whose encoded size is exactly `size` bytes.
    pub fn request(&self, filename: &str, size: usize) -> UploadRequest {
        UploadRequest::new(self.owner_id, filename, "audio/mpeg", vec![7u8; size])
    }
}

/// Observer that records every notification.
pub fn recorder() -> (Arc<Mutex<Vec<UploadProgress>>>, FnProgress<impl Fn(UploadProgress) + Send + Sync>) {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    let observer = FnProgress(move |p: UploadProgress| sink.lock().unwrap().push(p));
    (events, observer)
}

/// 16-bit PCM WAV containing a sine tone.
pub fn sine_wav(channels: u16, sample_rate: u32, seconds: f32, amplitude: f32) -> Vec<u8> {
    let spec = WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let frames = (sample_rate as f32 * seconds) as usize;

    let mut out = Vec::new();
    {
        let mut writer = WavWriter::new(Cursor::new(&mut out), spec).unwrap();
        for i in 0..frames {
            let t = i as f32 / sample_rate as f32;
            let value = amplitude * (2.0 * std::f32::consts::PI * 440.0 * t).sin();
            for _ in 0..channels {
                writer.write_sample((value * i16::MAX as f32) as i16).unwrap();
            }
        }
        writer.finalize().unwrap();
    }
    out
}
