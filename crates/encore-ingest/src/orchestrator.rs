//! Upload workflow
//!
//! validate → process → quota check → store → persist → quota update,
//! with compensation when a step after the store fails.

use crate::progress::ProgressObserver;
use crate::quota::QuotaLedger;
use bytes::Bytes;
use chrono::NaiveDate;
use encore_core::constants::{DEFAULT_SIGNED_URL_TTL_SECS, ENCODED_CONTENT_TYPE};
use encore_core::models::{
    NewUploadRecord, ProgressStage, UploadOutcome, UploadProgress, UploadRecord, UploadStats,
    VersionType,
};
use encore_core::{IngestError, IngestResult, RecordUrlMode};
use encore_db::CatalogStore;
use encore_processing::{AudioAsset, AudioProcessing, AudioValidator, ProcessingOptions};
use encore_storage::keys::new_object_key;
use encore_storage::Storage;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// One file to ingest.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub owner_id: Uuid,
    pub filename: String,
    pub content_type: String,
    /// Defaults to the filename without its extension.
    pub title: Option<String>,
    pub version_type: VersionType,
    pub recording_date: Option<NaiveDate>,
    pub data: Bytes,
    /// Overrides the orchestrator defaults for this file.
    pub options: Option<ProcessingOptions>,
}

impl UploadRequest {
    pub fn new(
        owner_id: Uuid,
        filename: impl Into<String>,
        content_type: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        Self {
            owner_id,
            filename: filename.into(),
            content_type: content_type.into(),
            title: None,
            version_type: VersionType::default(),
            recording_date: None,
            data: data.into(),
            options: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_version_type(mut self, version_type: VersionType) -> Self {
        self.version_type = version_type;
        self
    }

    pub fn with_recording_date(mut self, date: NaiveDate) -> Self {
        self.recording_date = Some(date);
        self
    }

    pub fn with_options(mut self, options: ProcessingOptions) -> Self {
        self.options = Some(options);
        self
    }

    pub fn size_bytes(&self) -> i64 {
        self.data.len() as i64
    }

    fn resolved_title(&self) -> String {
        match self.title.as_deref().map(str::trim) {
            Some(title) if !title.is_empty() => title.to_string(),
            _ => Path::new(&self.filename)
                .file_stem()
                .and_then(|s| s.to_str())
                .filter(|s| !s.is_empty())
                .unwrap_or("untitled")
                .to_string(),
        }
    }
}

/// What a deletion actually removed. Only the catalog removal is guaranteed.
#[derive(Debug, Clone, Serialize)]
pub struct DeletionReport {
    pub record: UploadRecord,
    pub storage_deleted: bool,
    pub quota_updated: bool,
}

pub struct UploadOrchestrator {
    validator: AudioValidator,
    processor: Arc<dyn AudioProcessing>,
    storage: Arc<dyn Storage>,
    catalog: Arc<dyn CatalogStore>,
    ledger: QuotaLedger,
    defaults: ProcessingOptions,
    url_mode: RecordUrlMode,
    signed_url_ttl: Duration,
}

impl UploadOrchestrator {
    pub fn new(
        processor: Arc<dyn AudioProcessing>,
        storage: Arc<dyn Storage>,
        catalog: Arc<dyn CatalogStore>,
        ledger: QuotaLedger,
    ) -> Self {
        Self {
            validator: AudioValidator::default(),
            processor,
            storage,
            catalog,
            ledger,
            defaults: ProcessingOptions::default(),
            url_mode: RecordUrlMode::default(),
            signed_url_ttl: Duration::from_secs(DEFAULT_SIGNED_URL_TTL_SECS),
        }
    }

    pub fn with_validator(mut self, validator: AudioValidator) -> Self {
        self.validator = validator;
        self
    }

    pub fn with_processing_defaults(mut self, options: ProcessingOptions) -> Self {
        self.defaults = options;
        self
    }

    pub fn with_url_mode(mut self, mode: RecordUrlMode, signed_url_ttl: Duration) -> Self {
        self.url_mode = mode;
        self.signed_url_ttl = signed_url_ttl;
        self
    }

    pub fn ledger(&self) -> &QuotaLedger {
        &self.ledger
    }

    /// Run the full workflow for one file.
    ///
    /// Validation, processing and quota failures happen before anything is
    /// written. Later failures delete the stored object (and release a quota
    /// reservation) before the error is returned. A failed quota update after
    /// the record is saved is logged and does not fail the upload.
    #[tracing::instrument(skip(self, request, observer), fields(owner_id = %request.owner_id, filename = %request.filename))]
    pub async fn upload_one(
        &self,
        request: UploadRequest,
        observer: &dyn ProgressObserver,
    ) -> IngestResult<UploadOutcome> {
        let result = self.run_upload(request, observer).await;
        if let Err(ref e) = result {
            tracing::warn!(error = %e, error_type = e.error_type(), "Upload failed");
            observer.on_progress(UploadProgress::failed(e.to_string()));
        }
        result
    }

    async fn run_upload(
        &self,
        request: UploadRequest,
        observer: &dyn ProgressObserver,
    ) -> IngestResult<UploadOutcome> {
        let notify = |stage, percent, message: &str| {
            observer.on_progress(UploadProgress::new(stage, percent, message));
        };

        notify(ProgressStage::Processing, 0, "Validating file...");
        self.validator.validate_all(
            &request.filename,
            &request.content_type,
            request.data.len(),
        )?;

        notify(ProgressStage::Processing, 10, "Processing audio...");
        let asset = self.process(&request).await?;
        notify(ProgressStage::Processing, 30, "Audio processing complete");

        let owner_id = request.owner_id;
        let size_bytes = asset.encoded_size_bytes();

        notify(ProgressStage::Processing, 35, "Checking storage quota...");
        self.ledger.check_and_reserve(owner_id, size_bytes).await?;
        notify(ProgressStage::Processing, 40, "Quota check passed");

        notify(ProgressStage::Uploading, 50, "Uploading to cloud storage...");
        let title = request.resolved_title();
        let storage_key = new_object_key(owner_id, &title);

        if let Err(e) = self
            .storage
            .put(&storage_key, asset.encoded.clone(), ENCODED_CONTENT_TYPE)
            .await
        {
            self.release_quota(owner_id, size_bytes).await;
            return Err(e.into());
        }

        let storage_url = match self.record_url(&storage_key).await {
            Ok(url) => url,
            Err(e) => {
                self.compensate(owner_id, &storage_key, size_bytes).await;
                return Err(e);
            }
        };
        notify(ProgressStage::Uploading, 70, "Upload complete");

        notify(ProgressStage::Saving, 80, "Saving metadata...");
        let new_record = NewUploadRecord {
            owner_id,
            title,
            storage_url,
            file_size_bytes: size_bytes,
            duration_seconds: asset.metadata.duration_seconds,
            version_type: request.version_type,
            recording_date: request.recording_date,
            metadata: asset.metadata.clone(),
        };
        let record = match self.catalog.insert(new_record).await {
            Ok(record) => record,
            Err(e) => {
                self.compensate(owner_id, &storage_key, size_bytes).await;
                return Err(e);
            }
        };

        notify(ProgressStage::Saving, 90, "Updating storage quota...");
        if let Err(e) = self.ledger.commit(owner_id, size_bytes).await {
            tracing::warn!(
                error = %e,
                owner_id = %owner_id,
                size_bytes,
                "Quota update failed"
            );
        }

        notify(ProgressStage::Complete, 100, "Upload successful!");
        tracing::info!(
            record_id = %record.id,
            key = %storage_key,
            original_bytes = asset.original_size_bytes(),
            size_bytes,
            "Upload complete"
        );

        Ok(UploadOutcome {
            record,
            original_size_bytes: asset.original_size_bytes(),
            metadata: asset.metadata,
        })
    }

    /// CPU-bound; runs on the blocking pool.
    async fn process(&self, request: &UploadRequest) -> IngestResult<AudioAsset> {
        let processor = Arc::clone(&self.processor);
        let data = request.data.clone();
        let extension = AudioValidator::extension_of(&request.filename);
        let options = request
            .options
            .clone()
            .unwrap_or_else(|| self.defaults.clone());

        let asset = tokio::task::spawn_blocking(move || {
            processor.process(data, extension.as_deref(), &options)
        })
        .await
        .map_err(|e| IngestError::Internal(format!("Processing task failed: {}", e)))??;

        Ok(asset)
    }

    async fn record_url(&self, storage_key: &str) -> IngestResult<String> {
        match self.url_mode {
            RecordUrlMode::Public => Ok(self.storage.public_url(storage_key)),
            RecordUrlMode::Signed => Ok(self
                .storage
                .signed_url(storage_key, self.signed_url_ttl)
                .await?),
        }
    }

    /// Remove a stored object whose upload did not complete.
    async fn compensate(&self, owner_id: Uuid, storage_key: &str, size_bytes: i64) {
        tracing::warn!(key = %storage_key, "Rolling back stored object");
        if let Err(e) = self.storage.delete(storage_key).await {
            tracing::error!(error = %e, key = %storage_key, "Failed to delete orphaned object");
        }
        self.release_quota(owner_id, size_bytes).await;
    }

    async fn release_quota(&self, owner_id: Uuid, size_bytes: i64) {
        if let Err(e) = self.ledger.release(owner_id, size_bytes).await {
            tracing::warn!(error = %e, owner_id = %owner_id, size_bytes, "Failed to release quota reservation");
        }
    }

    /// Delete a record, its stored object and its quota usage.
    ///
    /// A storage failure does not block removal of the record. The ledger is
    /// decremented by the size recorded at upload time.
    #[tracing::instrument(skip(self), fields(record_id = %record_id))]
    pub async fn delete_one(&self, record_id: Uuid) -> IngestResult<DeletionReport> {
        let record = self
            .catalog
            .get_by_id(record_id)
            .await?
            .ok_or_else(|| IngestError::NotFound("Audio file not found".to_string()))?;

        let storage_deleted = match self.storage.key_from_url(&record.storage_url) {
            Ok(key) => match self.storage.delete(&key).await {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!(error = %e, key = %key, "Storage delete failed, removing record anyway");
                    false
                }
            },
            Err(e) => {
                tracing::warn!(error = %e, url = %record.storage_url, "Could not derive storage key from URL");
                false
            }
        };

        if !self.catalog.delete(record_id).await? {
            return Err(IngestError::NotFound("Audio file not found".to_string()));
        }

        let quota_updated = match self
            .ledger
            .decrement(record.owner_id, record.file_size_bytes)
            .await
        {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    owner_id = %record.owner_id,
                    size_bytes = record.file_size_bytes,
                    "Quota update failed"
                );
                false
            }
        };

        tracing::info!(storage_deleted, quota_updated, "Audio file deleted");

        Ok(DeletionReport {
            record,
            storage_deleted,
            quota_updated,
        })
    }

    /// Catalog totals plus an estimate of the bytes saved by re-encoding.
    pub async fn upload_stats(&self, owner_id: Uuid) -> IngestResult<UploadStats> {
        let stats = self.catalog.stats_for_owner(owner_id).await?;
        Ok(stats.with_estimated_savings())
    }

    pub async fn list(&self, owner_id: Uuid, limit: i64, offset: i64) -> IngestResult<Vec<UploadRecord>> {
        if limit <= 0 || offset < 0 {
            return Err(IngestError::Validation(
                "Limit must be positive and offset non-negative".to_string(),
            ));
        }
        self.catalog.list_by_owner(owner_id, limit, offset).await
    }
}
