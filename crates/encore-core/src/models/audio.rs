use serde::{Deserialize, Serialize};

/// Metadata derived while processing an upload.
///
/// `file_size_bytes` is the length of the encoded buffer handed to storage and is
/// the unit the quota ledger accounts in. `rms_level` and `peak_level` describe the
/// decoded input before any gain was applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioMetadata {
    pub duration_seconds: f64,
    pub sample_rate_hz: u32,
    pub channel_count: u16,
    pub bitrate_kbps: u32,
    pub file_size_bytes: i64,
    pub rms_level: f32,
    pub peak_level: f32,
    pub format: String,
}
