//! Level measurement, loudness normalization and fades.

use crate::buffer::AudioBuffer;
use encore_core::constants::{LEVEL_EPSILON, NORMALIZATION_CEILING};

/// Root mean square of `samples`; 0 for an empty slice.
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: f64 = samples.iter().map(|&s| (s as f64) * (s as f64)).sum();
    (sum / samples.len() as f64).sqrt() as f32
}

/// Largest absolute sample value; 0 for an empty slice.
pub fn peak(samples: &[f32]) -> f32 {
    samples.iter().fold(0.0f32, |acc, &s| acc.max(s.abs()))
}

/// Levels across every channel, as reported in asset metadata.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Levels {
    pub rms: f32,
    pub peak: f32,
}

pub fn overall_levels(buffer: &AudioBuffer) -> Levels {
    let mut sum = 0.0f64;
    let mut count = 0usize;
    let mut max = 0.0f32;

    for channel in buffer.channels() {
        for &s in channel {
            sum += (s as f64) * (s as f64);
            max = max.max(s.abs());
        }
        count += channel.len();
    }

    let rms = if count == 0 {
        0.0
    } else {
        (sum / count as f64).sqrt() as f32
    };

    Levels {
        rms: rms.clamp(0.0, 1.0),
        peak: max.clamp(0.0, 1.0),
    }
}

/// Gain that brings `rms` to `target_volume` without pushing `peak` above the ceiling.
///
/// Both levels are floored at [`LEVEL_EPSILON`], so silence yields a finite gain.
pub fn normalization_gain(rms: f32, peak: f32, target_volume: f32) -> f32 {
    let loudness_gain = target_volume / rms.max(LEVEL_EPSILON);
    let ceiling_gain = NORMALIZATION_CEILING / peak.max(LEVEL_EPSILON);
    loudness_gain.min(ceiling_gain)
}

/// Per-channel loudness normalization into a new buffer.
pub fn normalize(buffer: &AudioBuffer, target_volume: f32) -> AudioBuffer {
    let gains: Vec<f32> = buffer
        .channels()
        .iter()
        .map(|samples| normalization_gain(rms(samples), peak(samples), target_volume))
        .collect();

    for (ch, gain) in gains.iter().enumerate() {
        tracing::trace!(channel = ch, gain, "Normalization gain");
    }

    buffer.map_samples(|ch, _, s| s * gains[ch])
}

/// Linear fade-in/out envelope value at `frame`.
pub fn fade_factor(frame: usize, frame_count: usize, fade_in_frames: usize, fade_out_frames: usize) -> f32 {
    let mut factor = 1.0f32;
    if fade_in_frames > 0 && frame < fade_in_frames {
        factor *= frame as f32 / fade_in_frames as f32;
    }
    if fade_out_frames > 0 {
        let remaining = frame_count.saturating_sub(frame);
        if remaining < fade_out_frames {
            factor *= remaining as f32 / fade_out_frames as f32;
        }
    }
    factor
}

/// Apply linear fades into a new buffer. Durations are in seconds; zero disables a fade.
pub fn apply_fades(buffer: &AudioBuffer, fade_in_seconds: f32, fade_out_seconds: f32) -> AudioBuffer {
    let rate = buffer.sample_rate_hz() as f32;
    let to_frames = |seconds: f32| -> usize {
        if seconds.is_finite() && seconds > 0.0 {
            (seconds * rate).floor() as usize
        } else {
            0
        }
    };
    let fade_in_frames = to_frames(fade_in_seconds);
    let fade_out_frames = to_frames(fade_out_seconds);
    let frame_count = buffer.frame_count();

    buffer.map_samples(|_, i, s| s * fade_factor(i, frame_count, fade_in_frames, fade_out_frames))
}
