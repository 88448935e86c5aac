//! MP3 encoding through LAME.

use crate::buffer::AudioBuffer;
use crate::error::{ProcessingError, ProcessingResult};
use crate::pcm::to_i16;
use encore_core::constants::ENCODER_FRAME_SIZE;
use mp3lame_encoder::{Bitrate, Builder, DualPcm, FlushNoGap, Quality};

/// Constant bitrates LAME accepts, ascending.
pub const SUPPORTED_BITRATES_KBPS: [u32; 16] = [
    8, 16, 24, 32, 40, 48, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320,
];

/// Largest supported bitrate not above `max_kbps`; requests below 8 get 8.
pub fn select_bitrate(max_kbps: u32) -> u32 {
    SUPPORTED_BITRATES_KBPS
        .iter()
        .rev()
        .find(|kbps| **kbps <= max_kbps)
        .copied()
        .unwrap_or(SUPPORTED_BITRATES_KBPS[0])
}

fn lame_bitrate(kbps: u32) -> Bitrate {
    match kbps {
        8 => Bitrate::Kbps8,
        16 => Bitrate::Kbps16,
        24 => Bitrate::Kbps24,
        32 => Bitrate::Kbps32,
        40 => Bitrate::Kbps40,
        48 => Bitrate::Kbps48,
        64 => Bitrate::Kbps64,
        80 => Bitrate::Kbps80,
        96 => Bitrate::Kbps96,
        112 => Bitrate::Kbps112,
        128 => Bitrate::Kbps128,
        160 => Bitrate::Kbps160,
        192 => Bitrate::Kbps192,
        224 => Bitrate::Kbps224,
        256 => Bitrate::Kbps256,
        _ => Bitrate::Kbps320,
    }
}

fn encode_err(context: &str, detail: impl std::fmt::Debug) -> ProcessingError {
    ProcessingError::Encode(format!("{}: {:?}", context, detail))
}

/// Encode to MP3 at the bitrate chosen by [`select_bitrate`].
///
/// The encoder always runs in stereo: mono input is duplicated into both
/// channels, and only the first two channels of wider input are used.
/// Returns the encoded bytes and the bitrate actually used.
pub fn encode_mp3(buffer: &AudioBuffer, max_bitrate_kbps: u32) -> ProcessingResult<(Vec<u8>, u32)> {
    let left_samples = buffer
        .channel(0)
        .ok_or_else(|| ProcessingError::Encode("No channels to encode".to_string()))?;
    let right_samples = buffer.channel(1).unwrap_or(left_samples);

    let left = to_i16(left_samples);
    let right = to_i16(right_samples);

    let kbps = select_bitrate(max_bitrate_kbps);

    let mut builder =
        Builder::new().ok_or_else(|| ProcessingError::Encode("Failed to create LAME encoder".to_string()))?;
    builder
        .set_num_channels(2)
        .map_err(|e| encode_err("Failed to set channel count", e))?;
    builder
        .set_sample_rate(buffer.sample_rate_hz())
        .map_err(|e| encode_err("Unsupported sample rate", e))?;
    builder
        .set_brate(lame_bitrate(kbps))
        .map_err(|e| encode_err("Failed to set bitrate", e))?;
    builder
        .set_quality(Quality::Good)
        .map_err(|e| encode_err("Failed to set quality", e))?;
    let mut encoder = builder
        .build()
        .map_err(|e| encode_err("Failed to initialize encoder", e))?;

    let mut out: Vec<u8> = Vec::new();

    for (l, r) in left
        .chunks(ENCODER_FRAME_SIZE)
        .zip(right.chunks(ENCODER_FRAME_SIZE))
    {
        out.reserve(mp3lame_encoder::max_required_buffer_size(l.len()));
        encoder
            .encode_to_vec(DualPcm { left: l, right: r }, &mut out)
            .map_err(|e| encode_err("Encoding failed", e))?;
    }

    // Room for the last frames LAME holds back.
    out.reserve(7200);
    encoder
        .flush_to_vec::<FlushNoGap>(&mut out)
        .map_err(|e| encode_err("Flush failed", e))?;

    tracing::debug!(
        frames = buffer.frame_count(),
        bitrate_kbps = kbps,
        encoded_bytes = out.len(),
        "Encoded MP3"
    );

    Ok((out, kbps))
}
