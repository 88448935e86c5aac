//! Error types module
//!
//! Every stage of the ingestion pipeline reports failures through [`IngestError`].
//! Lower layers (storage backends, the signal processor, repositories) have their
//! own error enums and convert into it at the crate boundary.
//!
//! `From<sqlx::Error>` is gated behind the `sqlx` feature.

use std::io;

use crate::format::{format_size_in, SizeUnit};

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues like quota limits
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented
/// by whatever surface sits in front of the pipeline.
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "QUOTA_EXCEEDED")
    fn error_code(&self) -> &'static str;

    /// Whether this error is recoverable (can be retried)
    fn is_recoverable(&self) -> bool;

    /// Suggested action for the client
    fn suggested_action(&self) -> Option<&'static str>;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Whether details should be hidden in production
    fn is_sensitive(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Encode error: {0}")]
    Encode(String),

    #[error("{}", quota_exceeded_message(.used_bytes, .delta_bytes, .limit_bytes))]
    QuotaExceeded {
        used_bytes: i64,
        limit_bytes: i64,
        delta_bytes: i64,
    },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type IngestResult<T> = Result<T, IngestError>;

/// Renders current usage, the file's size, the would-be total and the limit in one unit.
///
/// The unit is the largest one in which the smaller non-zero of usage and file size
/// is still at least 1, so neither figure collapses to `0`.
fn quota_exceeded_message(used_bytes: &i64, delta_bytes: &i64, limit_bytes: &i64) -> String {
    let total = used_bytes.saturating_add(*delta_bytes);
    let reference = [*used_bytes, *delta_bytes]
        .into_iter()
        .filter(|b| *b > 0)
        .min()
        .unwrap_or(0);
    let unit = SizeUnit::for_bytes(reference);

    format!(
        "Storage quota exceeded. Current usage: {}, This file: {}, Would total: {}, Limit: {}",
        format_size_in(*used_bytes, unit),
        format_size_in(*delta_bytes, unit),
        format_size_in(total, unit),
        format_size_in(*limit_bytes, unit),
    )
}

impl IngestError {
    pub fn quota_exceeded(used_bytes: i64, limit_bytes: i64, delta_bytes: i64) -> Self {
        IngestError::QuotaExceeded {
            used_bytes,
            limit_bytes,
            delta_bytes,
        }
    }

    /// Get the error type name for detailed error responses
    pub fn error_type(&self) -> &'static str {
        match self {
            IngestError::Validation(_) => "ValidationError",
            IngestError::Decode(_) => "DecodeError",
            IngestError::Encode(_) => "EncodeError",
            IngestError::QuotaExceeded { .. } => "QuotaExceeded",
            IngestError::Storage(_) => "StorageError",
            IngestError::Catalog(_) => "CatalogError",
            IngestError::NotFound(_) => "NotFoundError",
            IngestError::Config(_) => "ConfigError",
            IngestError::Internal(_) => "InternalError",
        }
    }

    /// True when nothing durable was written before the failure.
    pub fn is_pre_write(&self) -> bool {
        matches!(
            self,
            IngestError::Validation(_)
                | IngestError::Decode(_)
                | IngestError::Encode(_)
                | IngestError::QuotaExceeded { .. }
        )
    }
}

#[cfg(feature = "sqlx")]
impl From<sqlx::Error> for IngestError {
    fn from(err: sqlx::Error) -> Self {
        IngestError::Catalog(err.to_string())
    }
}

impl From<anyhow::Error> for IngestError {
    fn from(err: anyhow::Error) -> Self {
        IngestError::Internal(format!("{:#}", err))
    }
}

impl From<io::Error> for IngestError {
    fn from(err: io::Error) -> Self {
        IngestError::Internal(format!("IO error: {}", err))
    }
}

impl From<serde_json::Error> for IngestError {
    fn from(err: serde_json::Error) -> Self {
        IngestError::Internal(format!("JSON error: {}", err))
    }
}

/// Static metadata for each variant: (http_status, error_code, recoverable, suggested_action, sensitive, log_level).
fn ingest_error_static_metadata(
    err: &IngestError,
) -> (
    u16,
    &'static str,
    bool,
    Option<&'static str>,
    bool,
    LogLevel,
) {
    match err {
        IngestError::Validation(_) => (
            400,
            "VALIDATION_ERROR",
            false,
            Some("Use an MP3, WAV, AAC, M4A, FLAC, or OGG file under 100MB"),
            false,
            LogLevel::Debug,
        ),
        IngestError::Decode(_) => (
            422,
            "DECODE_ERROR",
            false,
            Some("Check that the file is a valid, uncorrupted audio file"),
            false,
            LogLevel::Warn,
        ),
        IngestError::Encode(_) => (
            500,
            "ENCODE_ERROR",
            false,
            Some("Contact support if this error persists"),
            true,
            LogLevel::Error,
        ),
        IngestError::QuotaExceeded { .. } => (
            413,
            "QUOTA_EXCEEDED",
            false,
            Some("Delete some files or request a larger storage limit"),
            false,
            LogLevel::Warn,
        ),
        IngestError::Storage(_) => (
            502,
            "STORAGE_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        IngestError::Catalog(_) => (
            500,
            "CATALOG_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        IngestError::NotFound(_) => (
            404,
            "NOT_FOUND",
            false,
            Some("Verify the record ID exists"),
            false,
            LogLevel::Debug,
        ),
        IngestError::Config(_) => (
            500,
            "CONFIG_ERROR",
            false,
            None,
            true,
            LogLevel::Error,
        ),
        IngestError::Internal(_) => (
            500,
            "INTERNAL_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
    }
}

impl ErrorMetadata for IngestError {
    fn http_status_code(&self) -> u16 {
        ingest_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        ingest_error_static_metadata(self).1
    }

    fn is_recoverable(&self) -> bool {
        ingest_error_static_metadata(self).2
    }

    fn suggested_action(&self) -> Option<&'static str> {
        ingest_error_static_metadata(self).3
    }

    fn is_sensitive(&self) -> bool {
        ingest_error_static_metadata(self).4
    }

    fn log_level(&self) -> LogLevel {
        ingest_error_static_metadata(self).5
    }

    fn client_message(&self) -> String {
        match self {
            IngestError::Validation(ref msg) => msg.clone(),
            IngestError::Decode(_) => "Could not read the audio file".to_string(),
            IngestError::Encode(_) => "Failed to compress the audio file".to_string(),
            IngestError::QuotaExceeded { .. } => self.to_string(),
            IngestError::Storage(_) => "Failed to access storage".to_string(),
            IngestError::Catalog(_) => "Failed to save track details".to_string(),
            IngestError::NotFound(ref msg) => msg.clone(),
            IngestError::Config(_) => "Service is misconfigured".to_string(),
            IngestError::Internal(_) => "Internal server error".to_string(),
        }
    }
}
