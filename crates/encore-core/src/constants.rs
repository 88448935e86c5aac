//! Validation and processing constants.
//!
//! These values are shared with the rest of the system and must match exactly.

/// Upload size ceiling (100 MB).
pub const MAX_AUDIO_SIZE_BYTES: usize = 100 * 1024 * 1024;

/// Accepted input extensions, without the leading dot.
pub const ALLOWED_AUDIO_EXTENSIONS: [&str; 6] = ["mp3", "wav", "aac", "m4a", "flac", "ogg"];

/// Accepted input MIME types. Some browsers report m4a as `audio/mp4`.
pub const ALLOWED_AUDIO_CONTENT_TYPES: [&str; 10] = [
    "audio/mpeg",
    "audio/mp3",
    "audio/wav",
    "audio/wave",
    "audio/aac",
    "audio/m4a",
    "audio/x-m4a",
    "audio/flac",
    "audio/ogg",
    "audio/mp4",
];

pub const DEFAULT_TARGET_VOLUME: f32 = 0.7;
pub const DEFAULT_MAX_BITRATE_KBPS: u32 = 192;
pub const DEFAULT_TARGET_SAMPLE_RATE_HZ: u32 = 44_100;

/// Samples per channel handed to the encoder per call.
pub const ENCODER_FRAME_SIZE: usize = 1152;

/// Fraction of full scale normalization may never exceed.
pub const NORMALIZATION_CEILING: f32 = 0.95;

/// Floor applied to RMS and peak before dividing, so silence never divides by zero.
pub const LEVEL_EPSILON: f32 = 0.001;

/// Default per-account quota (1 GiB).
pub const DEFAULT_QUOTA_LIMIT_BYTES: i64 = 1024 * 1024 * 1024;

/// Maximum lifetime of a SigV4 presigned URL (7 days).
pub const DEFAULT_SIGNED_URL_TTL_SECS: u64 = 7 * 24 * 60 * 60;

pub const DEFAULT_BUCKET: &str = "audio-files";

/// Tag written into [`crate::models::AudioMetadata::format`] for encoded assets.
pub const ENCODED_FORMAT: &str = "mp3";
pub const ENCODED_CONTENT_TYPE: &str = "audio/mpeg";

/// Encoded size as a fraction of the original, used to estimate savings for
/// records that do not carry their original size.
pub const ESTIMATED_ENCODED_FRACTION: f64 = 0.7;
