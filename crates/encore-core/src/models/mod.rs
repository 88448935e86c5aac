//! Data models for the ingestion pipeline
//!
//! Each sub-module covers one concern: derived audio metadata, catalog records,
//! quota accounting, batch aggregation and progress notifications.

mod audio;
mod batch;
mod progress;
mod quota;
mod track;

// Re-export all models for convenient imports
pub use audio::AudioMetadata;
pub use batch::{BatchFailure, BatchResult, UploadOutcome};
pub use progress::{ProgressStage, UploadProgress};
pub use quota::{LedgerUpdate, QuotaAccount, QuotaMode};
pub use track::{estimate_compression_savings, NewUploadRecord, UploadRecord, UploadStats, VersionType};
