//! Encore signal processing
//!
//! Pure, stateless audio transform used by the ingestion pipeline:
//! decode → resample → normalize → fade → 16-bit PCM → MP3.
//! Nothing here performs I/O beyond reading the input buffer.

pub mod analysis;
pub mod buffer;
pub mod decode;
pub mod encode;
pub mod error;
pub mod pcm;
pub mod processor;
pub mod resample;
pub mod validator;

pub use buffer::AudioBuffer;
pub use error::{ProcessingError, ProcessingResult};
pub use processor::{AudioAsset, AudioProcessing, ProcessingOptions, SignalProcessor};
pub use validator::{AudioValidator, ValidationError};

#[cfg(test)]
pub(crate) mod test_support;
