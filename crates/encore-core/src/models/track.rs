use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::AudioMetadata;
use crate::constants::ESTIMATED_ENCODED_FRACTION;

/// What kind of take a recording is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionType {
    VoiceMemo,
    RoughDemo,
    Rehearsal,
    WorkingMix,
    Final,
    Live,
    #[default]
    Other,
}

impl VersionType {
    pub const ALL: [VersionType; 7] = [
        VersionType::VoiceMemo,
        VersionType::RoughDemo,
        VersionType::Rehearsal,
        VersionType::WorkingMix,
        VersionType::Final,
        VersionType::Live,
        VersionType::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VersionType::VoiceMemo => "voice_memo",
            VersionType::RoughDemo => "rough_demo",
            VersionType::Rehearsal => "rehearsal",
            VersionType::WorkingMix => "working_mix",
            VersionType::Final => "final",
            VersionType::Live => "live",
            VersionType::Other => "other",
        }
    }
}

impl fmt::Display for VersionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VersionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        VersionType::ALL
            .into_iter()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| format!("Unknown version type: {}", s))
    }
}

/// Catalog row for a stored, processed upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadRecord {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub storage_url: String,
    /// Sole source of truth for ledger decrements on delete.
    pub file_size_bytes: i64,
    pub duration_seconds: f64,
    #[serde(default)]
    pub version_type: VersionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recording_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<AudioMetadata>,
    pub created_at: DateTime<Utc>,
}

/// Insert payload; the catalog assigns `id` and `created_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewUploadRecord {
    pub owner_id: Uuid,
    pub title: String,
    pub storage_url: String,
    pub file_size_bytes: i64,
    pub duration_seconds: f64,
    pub version_type: VersionType,
    pub recording_date: Option<NaiveDate>,
    pub metadata: AudioMetadata,
}

/// Aggregate over an owner's records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct UploadStats {
    pub total_files: i64,
    pub total_size_bytes: i64,
    pub total_duration_seconds: f64,
    /// Estimated bytes saved by re-encoding, from the assumed encoded fraction.
    #[serde(default)]
    pub estimated_compression_savings_bytes: i64,
}

impl UploadStats {
    /// Fill in the savings estimate from `total_size_bytes`.
    pub fn with_estimated_savings(mut self) -> Self {
        self.estimated_compression_savings_bytes =
            estimate_compression_savings(self.total_size_bytes);
        self
    }
}

/// Bytes an encoded total of `encoded_bytes` is estimated to have saved.
pub fn estimate_compression_savings(encoded_bytes: i64) -> i64 {
    if encoded_bytes <= 0 {
        return 0;
    }
    let encoded = encoded_bytes as f64;
    (encoded / ESTIMATED_ENCODED_FRACTION - encoded).round() as i64
}
