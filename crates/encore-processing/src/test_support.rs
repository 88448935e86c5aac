//! In-memory WAV fixtures for unit tests.

use hound::{SampleFormat, WavSpec, WavWriter};
use std::io::Cursor;

/// 16-bit PCM WAV where `sample(channel, frame)` yields values in [-1, 1].
pub fn wav_bytes<F>(channels: u16, sample_rate: u32, frames: usize, sample: F) -> Vec<u8>
where
    F: Fn(usize, usize) -> f32,
{
    let spec = WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut out = Vec::new();
    {
        let mut writer = WavWriter::new(Cursor::new(&mut out), spec).unwrap();
        for i in 0..frames {
            for ch in 0..channels as usize {
                let value = (sample(ch, i).clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
                writer.write_sample(value).unwrap();
            }
        }
        writer.finalize().unwrap();
    }
    out
}

pub fn sine(frequency_hz: f32, sample_rate: u32, amplitude: f32) -> impl Fn(usize, usize) -> f32 {
    move |_, i| {
        amplitude * (2.0 * std::f32::consts::PI * frequency_hz * i as f32 / sample_rate as f32).sin()
    }
}
