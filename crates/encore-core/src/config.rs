//! Configuration module
//!
//! Settings are read from the process environment (after loading `.env` if present)
//! and cover the catalog database, object storage, signal processing defaults and
//! quota enforcement.

use std::env;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use crate::constants::{
    ALLOWED_AUDIO_CONTENT_TYPES, ALLOWED_AUDIO_EXTENSIONS, DEFAULT_BUCKET,
    DEFAULT_MAX_BITRATE_KBPS, DEFAULT_QUOTA_LIMIT_BYTES, DEFAULT_SIGNED_URL_TTL_SECS,
    DEFAULT_TARGET_SAMPLE_RATE_HZ, DEFAULT_TARGET_VOLUME, MAX_AUDIO_SIZE_BYTES,
};
use crate::models::QuotaMode;
use crate::storage_types::StorageBackend;

const MAX_CONNECTIONS: u32 = 20;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const LOCAL_STORAGE_PATH: &str = "./data/audio-files";
const LOCAL_STORAGE_BASE_URL: &str = "http://localhost:3000/storage/v1/object/public/audio-files";

/// Which URL shape is written into `UploadRecord::storage_url`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecordUrlMode {
    #[default]
    Signed,
    Public,
}

impl FromStr for RecordUrlMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "signed" => Ok(RecordUrlMode::Signed),
            "public" => Ok(RecordUrlMode::Public),
            _ => Err(anyhow::anyhow!("Invalid record URL mode: {}", s)),
        }
    }
}

impl Display for RecordUrlMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            RecordUrlMode::Signed => write!(f, "signed"),
            RecordUrlMode::Public => write!(f, "public"),
        }
    }
}

/// Ingestion pipeline configuration
#[derive(Clone, Debug)]
pub struct IngestConfig {
    pub environment: String,
    // Catalog database
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    // Storage configuration
    pub storage_backend: StorageBackend,
    pub storage_bucket: String,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers (MinIO, etc.)
    pub aws_region: Option<String>,
    pub local_storage_path: String,
    pub local_storage_base_url: String,
    // Validation
    pub max_audio_size_bytes: usize,
    pub audio_allowed_extensions: Vec<String>,
    pub audio_allowed_content_types: Vec<String>,
    // Signal processing
    pub target_volume: f32,
    pub max_bitrate_kbps: u32,
    pub target_sample_rate_hz: Option<u32>,
    pub normalize_audio: bool,
    // Records and quota
    pub record_url_mode: RecordUrlMode,
    pub signed_url_ttl_secs: u64,
    pub quota_mode: QuotaMode,
    pub default_quota_limit_bytes: i64,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            database_url: None,
            db_max_connections: MAX_CONNECTIONS,
            db_timeout_seconds: CONNECTION_TIMEOUT_SECS,
            storage_backend: StorageBackend::Local,
            storage_bucket: DEFAULT_BUCKET.to_string(),
            s3_region: None,
            s3_endpoint: None,
            aws_region: None,
            local_storage_path: LOCAL_STORAGE_PATH.to_string(),
            local_storage_base_url: LOCAL_STORAGE_BASE_URL.to_string(),
            max_audio_size_bytes: MAX_AUDIO_SIZE_BYTES,
            audio_allowed_extensions: ALLOWED_AUDIO_EXTENSIONS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            audio_allowed_content_types: ALLOWED_AUDIO_CONTENT_TYPES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            target_volume: DEFAULT_TARGET_VOLUME,
            max_bitrate_kbps: DEFAULT_MAX_BITRATE_KBPS,
            target_sample_rate_hz: Some(DEFAULT_TARGET_SAMPLE_RATE_HZ),
            normalize_audio: true,
            record_url_mode: RecordUrlMode::Signed,
            signed_url_ttl_secs: DEFAULT_SIGNED_URL_TTL_SECS,
            quota_mode: QuotaMode::Check,
            default_quota_limit_bytes: DEFAULT_QUOTA_LIMIT_BYTES,
        }
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().trim_start_matches('.').to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

impl IngestConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary variable source. Unparseable numbers fall back to defaults;
    /// unparseable enums are errors.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let storage_backend = match lookup("STORAGE_BACKEND") {
            Some(raw) => raw.parse::<StorageBackend>()?,
            None => defaults.storage_backend,
        };

        let record_url_mode = match lookup("RECORD_URL_MODE") {
            Some(raw) => raw.parse::<RecordUrlMode>()?,
            None => defaults.record_url_mode,
        };

        let quota_mode = match lookup("QUOTA_MODE") {
            Some(raw) => raw.parse::<QuotaMode>()?,
            None => defaults.quota_mode,
        };

        let max_audio_size_bytes = lookup("MAX_AUDIO_SIZE_MB")
            .and_then(|v| v.parse::<usize>().ok())
            .map(|mb| mb * 1024 * 1024)
            .unwrap_or(defaults.max_audio_size_bytes);

        // 0 disables resampling.
        let target_sample_rate_hz = match lookup("AUDIO_TARGET_SAMPLE_RATE")
            .and_then(|v| v.parse::<u32>().ok())
        {
            Some(0) => None,
            Some(rate) => Some(rate),
            None => defaults.target_sample_rate_hz,
        };

        Ok(Self {
            environment: lookup("ENVIRONMENT")
                .or_else(|| lookup("APP_ENV"))
                .unwrap_or(defaults.environment),
            database_url: lookup("DATABASE_URL"),
            db_max_connections: lookup("DB_MAX_CONNECTIONS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.db_max_connections),
            db_timeout_seconds: lookup("DB_TIMEOUT_SECONDS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.db_timeout_seconds),
            storage_backend,
            storage_bucket: lookup("STORAGE_BUCKET")
                .or_else(|| lookup("S3_BUCKET"))
                .unwrap_or(defaults.storage_bucket),
            s3_region: lookup("S3_REGION"),
            s3_endpoint: lookup("S3_ENDPOINT"),
            aws_region: lookup("AWS_REGION"),
            local_storage_path: lookup("LOCAL_STORAGE_PATH").unwrap_or(defaults.local_storage_path),
            local_storage_base_url: lookup("LOCAL_STORAGE_BASE_URL")
                .unwrap_or(defaults.local_storage_base_url),
            max_audio_size_bytes,
            audio_allowed_extensions: lookup("AUDIO_ALLOWED_EXTENSIONS")
                .map(|v| split_list(&v))
                .unwrap_or(defaults.audio_allowed_extensions),
            audio_allowed_content_types: lookup("AUDIO_ALLOWED_CONTENT_TYPES")
                .map(|v| split_list(&v))
                .unwrap_or(defaults.audio_allowed_content_types),
            target_volume: lookup("AUDIO_TARGET_VOLUME")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.target_volume),
            max_bitrate_kbps: lookup("AUDIO_MAX_BITRATE_KBPS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_bitrate_kbps),
            target_sample_rate_hz,
            normalize_audio: lookup("AUDIO_NORMALIZE")
                .map(|v| v.to_lowercase())
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.normalize_audio),
            record_url_mode,
            signed_url_ttl_secs: lookup("SIGNED_URL_TTL_SECS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.signed_url_ttl_secs),
            quota_mode,
            default_quota_limit_bytes: lookup("DEFAULT_QUOTA_LIMIT_BYTES")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.default_quota_limit_bytes),
        })
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if let Some(ref url) = self.database_url {
            if !url.starts_with("postgres://") && !url.starts_with("postgresql://") {
                return Err(anyhow::anyhow!(
                    "DATABASE_URL must be a valid PostgreSQL connection string"
                ));
            }
        }

        if !(self.target_volume > 0.0 && self.target_volume <= 1.0) {
            return Err(anyhow::anyhow!(
                "AUDIO_TARGET_VOLUME must be in (0, 1], got {}",
                self.target_volume
            ));
        }

        if !(8..=320).contains(&self.max_bitrate_kbps) {
            return Err(anyhow::anyhow!(
                "AUDIO_MAX_BITRATE_KBPS must be between 8 and 320, got {}",
                self.max_bitrate_kbps
            ));
        }

        if self.max_audio_size_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_AUDIO_SIZE_MB must be greater than zero"));
        }

        if self.default_quota_limit_bytes < 0 {
            return Err(anyhow::anyhow!(
                "DEFAULT_QUOTA_LIMIT_BYTES must not be negative"
            ));
        }

        if self.signed_url_ttl_secs == 0 {
            return Err(anyhow::anyhow!("SIGNED_URL_TTL_SECS must be greater than zero"));
        }

        match self.storage_backend {
            StorageBackend::S3 => {
                if self.storage_bucket.is_empty() {
                    return Err(anyhow::anyhow!(
                        "STORAGE_BUCKET must be set when using S3 storage backend"
                    ));
                }
                if self.s3_region.is_none() && self.aws_region.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_REGION or AWS_REGION must be set when using S3 storage backend"
                    ));
                }
                if self.signed_url_ttl_secs > DEFAULT_SIGNED_URL_TTL_SECS {
                    return Err(anyhow::anyhow!(
                        "SIGNED_URL_TTL_SECS cannot exceed {} for S3 presigned URLs",
                        DEFAULT_SIGNED_URL_TTL_SECS
                    ));
                }
            }
            StorageBackend::Local => {
                if self.local_storage_path.is_empty() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH must be set when using local storage backend"
                    ));
                }
            }
        }

        Ok(())
    }
}

/// Shared handle to the loaded configuration.
#[derive(Clone, Debug)]
pub struct Config(Box<IngestConfig>);

impl Config {
    pub fn new(config: IngestConfig) -> Self {
        Config(Box::new(config))
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        let config = IngestConfig::from_env()?;
        Ok(Config(Box::new(config)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.0.validate()
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.0.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn database_url(&self) -> Option<&str> {
        self.0.database_url.as_deref()
    }

    /// Database URL, or an error naming the missing variable.
    pub fn require_database_url(&self) -> Result<&str, anyhow::Error> {
        self.database_url()
            .ok_or_else(|| anyhow::anyhow!("DATABASE_URL must be set"))
    }

    pub fn db_max_connections(&self) -> u32 {
        self.0.db_max_connections
    }

    pub fn db_timeout_seconds(&self) -> u64 {
        self.0.db_timeout_seconds
    }

    pub fn storage_backend(&self) -> StorageBackend {
        self.0.storage_backend
    }

    pub fn storage_bucket(&self) -> &str {
        &self.0.storage_bucket
    }

    pub fn s3_region(&self) -> Option<&str> {
        self.0.s3_region.as_deref()
    }

    pub fn s3_endpoint(&self) -> Option<&str> {
        self.0.s3_endpoint.as_deref()
    }

    pub fn aws_region(&self) -> Option<&str> {
        self.0.aws_region.as_deref()
    }

    pub fn local_storage_path(&self) -> &str {
        &self.0.local_storage_path
    }

    pub fn local_storage_base_url(&self) -> &str {
        &self.0.local_storage_base_url
    }

    pub fn max_audio_size_bytes(&self) -> usize {
        self.0.max_audio_size_bytes
    }

    pub fn audio_allowed_extensions(&self) -> &[String] {
        &self.0.audio_allowed_extensions
    }

    pub fn audio_allowed_content_types(&self) -> &[String] {
        &self.0.audio_allowed_content_types
    }

    pub fn target_volume(&self) -> f32 {
        self.0.target_volume
    }

    pub fn max_bitrate_kbps(&self) -> u32 {
        self.0.max_bitrate_kbps
    }

    pub fn target_sample_rate_hz(&self) -> Option<u32> {
        self.0.target_sample_rate_hz
    }

    pub fn normalize_audio(&self) -> bool {
        self.0.normalize_audio
    }

    pub fn record_url_mode(&self) -> RecordUrlMode {
        self.0.record_url_mode
    }

    pub fn signed_url_ttl_secs(&self) -> u64 {
        self.0.signed_url_ttl_secs
    }

    pub fn quota_mode(&self) -> QuotaMode {
        self.0.quota_mode
    }

    pub fn default_quota_limit_bytes(&self) -> i64 {
        self.0.default_quota_limit_bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> anyhow::Result<IngestConfig> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        IngestConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_match_pipeline_constants() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.max_audio_size_bytes, 100 * 1024 * 1024);
        assert_eq!(config.target_volume, 0.7);
        assert_eq!(config.max_bitrate_kbps, 192);
        assert_eq!(config.target_sample_rate_hz, Some(44_100));
        assert_eq!(config.storage_bucket, "audio-files");
        assert_eq!(config.quota_mode, QuotaMode::Check);
        assert_eq!(config.default_quota_limit_bytes, 1_073_741_824);
        assert_eq!(config.audio_allowed_extensions.len(), 6);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn reads_overrides() {
        let config = config_from(&[
            ("STORAGE_BACKEND", "s3"),
            ("S3_REGION", "eu-west-1"),
            ("QUOTA_MODE", "reserve"),
            ("RECORD_URL_MODE", "public"),
            ("MAX_AUDIO_SIZE_MB", "50"),
            ("AUDIO_TARGET_SAMPLE_RATE", "0"),
            ("AUDIO_NORMALIZE", "FALSE"),
            ("AUDIO_ALLOWED_EXTENSIONS", ".MP3, wav"),
        ])
        .unwrap();
        assert_eq!(config.storage_backend, StorageBackend::S3);
        assert_eq!(config.quota_mode, QuotaMode::Reserve);
        assert_eq!(config.record_url_mode, RecordUrlMode::Public);
        assert_eq!(config.max_audio_size_bytes, 50 * 1024 * 1024);
        assert_eq!(config.target_sample_rate_hz, None);
        assert!(!config.normalize_audio);
        assert_eq!(config.audio_allowed_extensions, vec!["mp3", "wav"]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn invalid_enum_is_an_error() {
        assert!(config_from(&[("QUOTA_MODE", "optimistic")]).is_err());
        assert!(config_from(&[("STORAGE_BACKEND", "ftp")]).is_err());
    }

    #[test]
    fn validate_rejects_bad_values() {
        let mut config = IngestConfig::default();
        config.target_volume = 1.5;
        assert!(config.validate().is_err());

        let mut config = IngestConfig::default();
        config.max_bitrate_kbps = 512;
        assert!(config.validate().is_err());

        let mut config = IngestConfig::default();
        config.storage_backend = StorageBackend::S3;
        assert!(config.validate().is_err());

        let mut config = IngestConfig::default();
        config.database_url = Some("mysql://localhost/db".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn require_database_url_reports_missing() {
        let config = Config::new(IngestConfig::default());
        assert!(config.require_database_url().is_err());
        assert!(!config.is_production());
    }
}
