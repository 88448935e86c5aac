use serde::{Deserialize, Serialize};

use super::{AudioMetadata, UploadRecord};

/// Result of one successful upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadOutcome {
    pub record: UploadRecord,
    pub metadata: AudioMetadata,
    /// Size of the raw input before processing.
    pub original_size_bytes: i64,
}

impl UploadOutcome {
    /// Bytes saved by re-encoding; zero when the encoded file is larger.
    pub fn compression_savings_bytes(&self) -> i64 {
        self.original_size_bytes
            .saturating_sub(self.metadata.file_size_bytes)
            .max(0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchFailure {
    pub filename: String,
    pub error: String,
    pub size_bytes: i64,
}

/// Per-file outcomes of a batch, in input order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchResult {
    pub successful: Vec<UploadOutcome>,
    pub failed: Vec<BatchFailure>,
}

impl BatchResult {
    pub fn total(&self) -> usize {
        self.successful.len() + self.failed.len()
    }

    pub fn is_complete_success(&self) -> bool {
        self.failed.is_empty()
    }

    /// e.g. `Uploaded 2 of 3 files (1 failed)`.
    pub fn summary(&self) -> String {
        if self.failed.is_empty() {
            format!("Uploaded {} of {} files", self.successful.len(), self.total())
        } else {
            format!(
                "Uploaded {} of {} files ({} failed)",
                self.successful.len(),
                self.total(),
                self.failed.len()
            )
        }
    }
}
