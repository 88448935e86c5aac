//! Float to signed 16-bit PCM conversion.

/// Clamp to [-1, 1], scale asymmetrically (negative by 32768, positive by 32767) and round.
pub fn sample_to_i16(sample: f32) -> i16 {
    let clamped = sample.clamp(-1.0, 1.0);
    let scaled = if clamped < 0.0 {
        clamped * 32768.0
    } else {
        clamped * 32767.0
    };
    // NaN saturates to 0
    scaled.round() as i16
}

pub fn to_i16(samples: &[f32]) -> Vec<i16> {
    samples.iter().copied().map(sample_to_i16).collect()
}
