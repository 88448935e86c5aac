use crate::orchestrator::UploadOrchestrator;
use crate::quota::QuotaLedger;
use anyhow::{Context, Result};
use encore_core::Config;
use encore_db::{QuotaRepository, TrackRepository};
use encore_processing::{AudioValidator, ProcessingOptions, SignalProcessor};
use encore_storage::create_storage;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;

/// Build the production orchestrator: configured storage backend, PostgreSQL
/// catalog and ledger, and the LAME-backed signal processor.
pub async fn build_orchestrator(config: &Config, pool: PgPool) -> Result<UploadOrchestrator> {
    let storage = create_storage(config)
        .await
        .context("Failed to initialize storage backend")?;

    let catalog = Arc::new(TrackRepository::new(pool.clone()));
    let ledger = QuotaLedger::new(Arc::new(QuotaRepository::new(pool)), config.quota_mode());

    tracing::info!(
        backend = %storage.backend_type(),
        quota_mode = %config.quota_mode(),
        url_mode = %config.record_url_mode(),
        "Upload orchestrator ready"
    );

    Ok(UploadOrchestrator::new(
        Arc::new(SignalProcessor::new()),
        storage,
        catalog,
        ledger,
    )
    .with_validator(AudioValidator::from_config(config))
    .with_processing_defaults(ProcessingOptions::from_config(config))
    .with_url_mode(
        config.record_url_mode(),
        Duration::from_secs(config.signed_url_ttl_secs()),
    ))
}
