//! Sample-rate conversion (rubato).

use crate::buffer::AudioBuffer;
use crate::error::{ProcessingError, ProcessingResult};
use rubato::{FastFixedIn, PolynomialDegree, Resampler as RubatoResampler};

/// Convert `buffer` to `target_rate_hz`.
///
/// Returns a copy when the rate already matches. The whole signal is
/// processed as a single chunk.
pub fn resample(buffer: &AudioBuffer, target_rate_hz: u32) -> ProcessingResult<AudioBuffer> {
    let source_rate_hz = buffer.sample_rate_hz();

    if target_rate_hz == 0 {
        return Err(ProcessingError::Resample(
            "Target sample rate must be positive".to_string(),
        ));
    }

    if source_rate_hz == target_rate_hz || buffer.is_empty() {
        return Ok(AudioBuffer::new(buffer.channels().to_vec(), target_rate_hz));
    }

    let channel_count = buffer.channel_count();
    let input_frames = buffer.frame_count();

    let mut resampler = FastFixedIn::<f32>::new(
        target_rate_hz as f64 / source_rate_hz as f64,
        1.0,
        PolynomialDegree::Septic,
        input_frames,
        channel_count,
    )
    .map_err(|e| ProcessingError::Resample(format!("Failed to create resampler: {}", e)))?;

    let output = resampler
        .process(buffer.channels(), None)
        .map_err(|e| ProcessingError::Resample(format!("Resampling failed: {}", e)))?;

    tracing::debug!(
        from_hz = source_rate_hz,
        to_hz = target_rate_hz,
        input_frames,
        output_frames = output.first().map(Vec::len).unwrap_or(0),
        "Resampled audio"
    );

    Ok(AudioBuffer::new(output, target_rate_hz))
}
