use encore_core::IngestError;

/// Signal processing errors
#[derive(Debug, thiserror::Error)]
pub enum ProcessingError {
    #[error("Failed to decode audio: {0}")]
    Decode(String),

    #[error("Failed to resample audio: {0}")]
    Resample(String),

    #[error("Failed to encode audio: {0}")]
    Encode(String),

    #[error("Invalid processing options: {0}")]
    InvalidOptions(String),
}

pub type ProcessingResult<T> = Result<T, ProcessingError>;

impl From<ProcessingError> for IngestError {
    fn from(err: ProcessingError) -> Self {
        match err {
            ProcessingError::Decode(_) | ProcessingError::Resample(_) => {
                IngestError::Decode(err.to_string())
            }
            ProcessingError::Encode(_) => IngestError::Encode(err.to_string()),
            ProcessingError::InvalidOptions(msg) => IngestError::Validation(msg),
        }
    }
}
