//! Encore Core Library
//!
//! This crate provides the domain models, error taxonomy, configuration and
//! formatting helpers shared by every stage of the audio ingestion pipeline.

pub mod config;
pub mod constants;
pub mod error;
pub mod format;
pub mod models;
pub mod storage_types;

// Re-export commonly used types
pub use config::{Config, IngestConfig, RecordUrlMode};
pub use error::{ErrorMetadata, IngestError, IngestResult, LogLevel};
pub use format::{format_duration, format_file_size};
pub use storage_types::StorageBackend;
