use encore_core::constants::{
    ALLOWED_AUDIO_CONTENT_TYPES, ALLOWED_AUDIO_EXTENSIONS, MAX_AUDIO_SIZE_BYTES,
};
use encore_core::{format_file_size, Config, IngestError};
use std::path::Path;

const MIB: usize = 1024 * 1024;

/// `100MB` for whole-megabyte limits, otherwise the formatted size (`512 KB`, `1.5 MB`).
fn size_limit_label(max: &usize) -> String {
    if *max >= MIB && *max % MIB == 0 {
        format!("{}MB", max / MIB)
    } else {
        format_file_size(*max as i64)
    }
}

/// Validation errors for incoming audio files
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("File size must be less than {}", size_limit_label(.max))]
    FileTooLarge { size: usize, max: usize },

    #[error("Unsupported audio format. Please use MP3, WAV, AAC, M4A, FLAC, or OGG.")]
    UnsupportedFormat {
        extension: Option<String>,
        content_type: String,
    },

    #[error("Empty file")]
    EmptyFile,
}

impl From<ValidationError> for IngestError {
    fn from(err: ValidationError) -> Self {
        IngestError::Validation(err.to_string())
    }
}

/// Audio upload validator
///
/// A file is accepted when either its content type or its extension is on the
/// allow list; browsers disagree on MIME types for m4a and aac.
#[derive(Debug, Clone)]
pub struct AudioValidator {
    max_file_size: usize,
    allowed_extensions: Vec<String>,
    allowed_content_types: Vec<String>,
}

impl Default for AudioValidator {
    fn default() -> Self {
        Self::new(
            MAX_AUDIO_SIZE_BYTES,
            ALLOWED_AUDIO_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            ALLOWED_AUDIO_CONTENT_TYPES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        )
    }
}

impl AudioValidator {
    pub fn new(
        max_file_size: usize,
        allowed_extensions: Vec<String>,
        allowed_content_types: Vec<String>,
    ) -> Self {
        Self {
            max_file_size,
            allowed_extensions: allowed_extensions
                .into_iter()
                .map(|e| e.trim_start_matches('.').to_lowercase())
                .collect(),
            allowed_content_types: allowed_content_types
                .into_iter()
                .map(|ct| ct.to_lowercase())
                .collect(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.max_audio_size_bytes(),
            config.audio_allowed_extensions().to_vec(),
            config.audio_allowed_content_types().to_vec(),
        )
    }

    pub fn max_file_size(&self) -> usize {
        self.max_file_size
    }

    /// Validate file size
    pub fn validate_file_size(&self, size: usize) -> Result<(), ValidationError> {
        if size == 0 {
            return Err(ValidationError::EmptyFile);
        }

        if size > self.max_file_size {
            return Err(ValidationError::FileTooLarge {
                size,
                max: self.max_file_size,
            });
        }

        Ok(())
    }

    /// Lowercased extension of `filename`, if any.
    pub fn extension_of(filename: &str) -> Option<String> {
        Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
    }

    pub fn is_allowed_extension(&self, filename: &str) -> bool {
        Self::extension_of(filename)
            .map(|ext| self.allowed_extensions.contains(&ext))
            .unwrap_or(false)
    }

    /// Parameters such as `; codecs=...` are ignored.
    pub fn is_allowed_content_type(&self, content_type: &str) -> bool {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_lowercase();
        self.allowed_content_types.iter().any(|ct| ct == &essence)
    }

    /// Rejects only when neither the content type nor the extension is recognized.
    pub fn validate_format(&self, filename: &str, content_type: &str) -> Result<(), ValidationError> {
        if self.is_allowed_content_type(content_type) || self.is_allowed_extension(filename) {
            return Ok(());
        }

        Err(ValidationError::UnsupportedFormat {
            extension: Self::extension_of(filename),
            content_type: content_type.to_string(),
        })
    }

    /// Size first, then format.
    pub fn validate_all(
        &self,
        filename: &str,
        content_type: &str,
        file_size: usize,
    ) -> Result<(), ValidationError> {
        self.validate_file_size(file_size)?;
        self.validate_format(filename, content_type)?;
        Ok(())
    }
}
