//! End-to-end transform from uploaded bytes to an encoded MP3 asset.

use crate::analysis::{apply_fades, normalize, overall_levels};
use crate::buffer::AudioBuffer;
use crate::decode::decode;
use crate::encode::encode_mp3;
use crate::error::{ProcessingError, ProcessingResult};
use crate::resample::resample;
use bytes::Bytes;
use encore_core::constants::{
    DEFAULT_MAX_BITRATE_KBPS, DEFAULT_TARGET_SAMPLE_RATE_HZ, DEFAULT_TARGET_VOLUME,
    ENCODED_FORMAT,
};
use encore_core::models::AudioMetadata;
use encore_core::Config;

/// Tunables for a single processing run.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessingOptions {
    /// Target RMS level in (0, 1].
    pub target_volume: f32,
    pub max_bitrate_kbps: u32,
    pub normalize: bool,
    pub fade_in_seconds: f32,
    pub fade_out_seconds: f32,
    /// `None` keeps the source rate.
    pub target_sample_rate_hz: Option<u32>,
}

impl Default for ProcessingOptions {
    fn default() -> Self {
        Self {
            target_volume: DEFAULT_TARGET_VOLUME,
            max_bitrate_kbps: DEFAULT_MAX_BITRATE_KBPS,
            normalize: true,
            fade_in_seconds: 0.0,
            fade_out_seconds: 0.0,
            target_sample_rate_hz: Some(DEFAULT_TARGET_SAMPLE_RATE_HZ),
        }
    }
}

impl ProcessingOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            target_volume: config.target_volume(),
            max_bitrate_kbps: config.max_bitrate_kbps(),
            normalize: config.normalize_audio(),
            fade_in_seconds: 0.0,
            fade_out_seconds: 0.0,
            target_sample_rate_hz: config.target_sample_rate_hz(),
        }
    }

    pub fn with_fades(mut self, fade_in_seconds: f32, fade_out_seconds: f32) -> Self {
        self.fade_in_seconds = fade_in_seconds;
        self.fade_out_seconds = fade_out_seconds;
        self
    }

    pub fn validate(&self) -> ProcessingResult<()> {
        if !(self.target_volume.is_finite() && self.target_volume > 0.0 && self.target_volume <= 1.0)
        {
            return Err(ProcessingError::InvalidOptions(format!(
                "Target volume must be in (0, 1], got {}",
                self.target_volume
            )));
        }
        if self.max_bitrate_kbps == 0 {
            return Err(ProcessingError::InvalidOptions(
                "Maximum bitrate must be positive".to_string(),
            ));
        }
        for (name, value) in [
            ("Fade-in", self.fade_in_seconds),
            ("Fade-out", self.fade_out_seconds),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ProcessingError::InvalidOptions(format!(
                    "{} duration must be a non-negative number of seconds",
                    name
                )));
            }
        }
        if self.target_sample_rate_hz == Some(0) {
            return Err(ProcessingError::InvalidOptions(
                "Target sample rate must be positive".to_string(),
            ));
        }
        Ok(())
    }

    fn has_fades(&self) -> bool {
        self.fade_in_seconds > 0.0 || self.fade_out_seconds > 0.0
    }
}

/// Output of one processing run.
///
/// `resampled` is the decoded signal at the target rate (the decode itself when
/// no conversion ran); `processed` is the same shape after gain and fades.
#[derive(Debug, Clone)]
pub struct AudioAsset {
    pub original: Bytes,
    pub resampled: AudioBuffer,
    pub processed: AudioBuffer,
    pub encoded: Bytes,
    /// Bitrate the encoder actually ran at.
    pub encoded_bitrate_kbps: u32,
    pub metadata: AudioMetadata,
}

impl AudioAsset {
    pub fn original_size_bytes(&self) -> i64 {
        self.original.len() as i64
    }

    pub fn encoded_size_bytes(&self) -> i64 {
        self.encoded.len() as i64
    }
}

/// Synchronous, CPU-bound audio transform.
///
/// Callers on an async runtime should run this on a blocking thread.
pub trait AudioProcessing: Send + Sync {
    fn process(
        &self,
        original: Bytes,
        extension_hint: Option<&str>,
        options: &ProcessingOptions,
    ) -> ProcessingResult<AudioAsset>;
}

/// Default [`AudioProcessing`] implementation:
/// decode, resample, normalize, fade, then encode to MP3.
#[derive(Debug, Clone, Default)]
pub struct SignalProcessor;

impl SignalProcessor {
    pub fn new() -> Self {
        Self
    }
}

impl AudioProcessing for SignalProcessor {
    fn process(
        &self,
        original: Bytes,
        extension_hint: Option<&str>,
        options: &ProcessingOptions,
    ) -> ProcessingResult<AudioAsset> {
        options.validate()?;
        let start = std::time::Instant::now();

        let decoded = decode(original.clone(), extension_hint)?;
        let resampled = match options.target_sample_rate_hz {
            Some(rate) if rate != decoded.sample_rate_hz() => resample(&decoded, rate)?,
            _ => decoded,
        };

        let levels = overall_levels(&resampled);

        let mut processed = if options.normalize {
            normalize(&resampled, options.target_volume)
        } else {
            resampled.clone()
        };
        if options.has_fades() {
            processed = apply_fades(
                &processed,
                options.fade_in_seconds,
                options.fade_out_seconds,
            );
        }

        let (encoded, encoded_bitrate_kbps) = encode_mp3(&processed, options.max_bitrate_kbps)?;
        let encoded = Bytes::from(encoded);

        let metadata = AudioMetadata {
            duration_seconds: resampled.duration_seconds(),
            sample_rate_hz: resampled.sample_rate_hz(),
            channel_count: resampled.channel_count() as u16,
            bitrate_kbps: options.max_bitrate_kbps,
            file_size_bytes: encoded.len() as i64,
            rms_level: levels.rms,
            peak_level: levels.peak,
            format: ENCODED_FORMAT.to_string(),
        };

        tracing::info!(
            original_bytes = original.len(),
            encoded_bytes = encoded.len(),
            duration_seconds = metadata.duration_seconds,
            sample_rate_hz = metadata.sample_rate_hz,
            channels = metadata.channel_count,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Audio processing complete"
        );

        Ok(AudioAsset {
            original,
            resampled,
            processed,
            encoded,
            encoded_bitrate_kbps,
            metadata,
        })
    }
}
