//! Container/codec decoding into planar f32 samples.

use crate::buffer::AudioBuffer;
use crate::error::{ProcessingError, ProcessingResult};
use bytes::Bytes;
use std::io::{Cursor, ErrorKind};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// Decode an in-memory audio file.
///
/// `extension` (without the dot) is only a hint; the container is probed
/// from its contents. Corrupt packets are skipped.
pub fn decode(data: Bytes, extension: Option<&str>) -> ProcessingResult<AudioBuffer> {
    if data.is_empty() {
        return Err(ProcessingError::Decode("Empty input".to_string()));
    }

    let mss = MediaSourceStream::new(Box::new(Cursor::new(data)), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = extension {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| ProcessingError::Decode(format!("Unrecognized audio container: {}", e)))?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| ProcessingError::Decode("No audio track found".to_string()))?;

    let track_id = track.id;
    let mut sample_rate_hz = track.codec_params.sample_rate.unwrap_or(0);

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| ProcessingError::Decode(format!("Unsupported codec: {}", e)))?;

    let mut channels: Vec<Vec<f32>> = Vec::new();
    let mut skipped_packets = 0usize;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == ErrorKind::UnexpectedEof => break,
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(ProcessingError::Decode(e.to_string())),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(e)) => {
                skipped_packets += 1;
                tracing::debug!(error = %e, "Skipping corrupt packet");
                continue;
            }
            Err(SymphoniaError::IoError(e)) if e.kind() == ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(ProcessingError::Decode(e.to_string())),
        };

        let spec = *decoded.spec();
        let frames = decoded.frames();
        if frames == 0 {
            continue;
        }

        let channel_count = spec.channels.count();
        if channels.is_empty() {
            channels = vec![Vec::new(); channel_count];
        }
        if sample_rate_hz == 0 {
            sample_rate_hz = spec.rate;
        }

        let mut sample_buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
        sample_buf.copy_planar_ref(decoded);
        let samples = sample_buf.samples();

        for (ch, out) in channels.iter_mut().enumerate().take(channel_count) {
            out.extend_from_slice(&samples[ch * frames..(ch + 1) * frames]);
        }
    }

    if skipped_packets > 0 {
        tracing::warn!(skipped_packets, "Some packets could not be decoded");
    }

    let buffer = AudioBuffer::new(channels, sample_rate_hz);
    if buffer.is_empty() || sample_rate_hz == 0 {
        return Err(ProcessingError::Decode(
            "No audio samples could be decoded".to_string(),
        ));
    }

    tracing::debug!(
        channels = buffer.channel_count(),
        frames = buffer.frame_count(),
        sample_rate_hz,
        "Decoded audio"
    );

    Ok(buffer)
}
