use serde::{Deserialize, Serialize};

/// Coarse stage reported to progress observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressStage {
    Processing,
    Uploading,
    Saving,
    Complete,
}

/// Progress notification for UI consumption. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadProgress {
    pub stage: ProgressStage,
    /// 0-100.
    pub progress_percent: u8,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl UploadProgress {
    pub fn new(stage: ProgressStage, progress_percent: u8, message: impl Into<String>) -> Self {
        Self {
            stage,
            progress_percent: progress_percent.min(100),
            message: message.into(),
            error: None,
        }
    }

    /// Failure notification: stage `processing` at 0%.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            stage: ProgressStage::Processing,
            progress_percent: 0,
            message: "Upload failed".to_string(),
            error: Some(error.into()),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.error.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_stage_in_lowercase() {
        let event = UploadProgress::new(ProgressStage::Uploading, 60, "Uploading to cloud storage...");
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["stage"], "uploading");
        assert_eq!(json["progress_percent"], 60);
        assert!(json.get("error").is_none());
    }

    #[test]
    fn percent_is_clamped() {
        assert_eq!(UploadProgress::new(ProgressStage::Complete, 250, "done").progress_percent, 100);
    }
}
