use crate::orchestrator::{UploadOrchestrator, UploadRequest};
use crate::progress::ProgressObserver;
use encore_core::models::{BatchFailure, BatchResult, ProgressStage, UploadProgress};
use std::sync::Arc;

/// Sequential multi-file upload. One failure never stops the batch.
#[derive(Clone)]
pub struct BatchCoordinator {
    orchestrator: Arc<UploadOrchestrator>,
}

impl BatchCoordinator {
    pub fn new(orchestrator: Arc<UploadOrchestrator>) -> Self {
        Self { orchestrator }
    }

    /// Files are uploaded strictly in input order, one at a time.
    #[tracing::instrument(skip(self, requests, observer), fields(files = requests.len()))]
    pub async fn upload_many(
        &self,
        requests: Vec<UploadRequest>,
        observer: &dyn ProgressObserver,
    ) -> BatchResult {
        let total = requests.len();
        let mut result = BatchResult::default();

        for (index, request) in requests.into_iter().enumerate() {
            let position = index + 1;
            let filename = request.filename.clone();
            let size_bytes = request.size_bytes();

            observer.on_progress(UploadProgress::new(
                ProgressStage::Uploading,
                (index * 100 / total) as u8,
                format!("Uploading {} of {}: {}", position, total, filename),
            ));

            match self.orchestrator.upload_one(request, observer).await {
                Ok(outcome) => result.successful.push(outcome),
                Err(e) => result.failed.push(BatchFailure {
                    filename,
                    error: e.to_string(),
                    size_bytes,
                }),
            }
        }

        let summary = result.summary();
        tracing::info!(
            successful = result.successful.len(),
            failed = result.failed.len(),
            "{}",
            summary
        );
        observer.on_progress(UploadProgress::new(ProgressStage::Complete, 100, summary));

        result
    }
}
