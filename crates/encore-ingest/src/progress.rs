//! Progress observers. Notifications are a side channel; they never affect
//! the outcome of an upload.

use encore_core::models::UploadProgress;
use tokio::sync::mpsc::UnboundedSender;

pub trait ProgressObserver: Send + Sync {
    fn on_progress(&self, progress: UploadProgress);
}

/// Discards every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProgress;

impl ProgressObserver for NoopProgress {
    fn on_progress(&self, _progress: UploadProgress) {}
}

/// Adapts a closure.
pub struct FnProgress<F>(pub F);

impl<F> ProgressObserver for FnProgress<F>
where
    F: Fn(UploadProgress) + Send + Sync,
{
    fn on_progress(&self, progress: UploadProgress) {
        (self.0)(progress)
    }
}

/// Forwards notifications into an unbounded channel. A closed receiver is ignored.
#[derive(Debug, Clone)]
pub struct ChannelProgress(UnboundedSender<UploadProgress>);

impl ChannelProgress {
    pub fn new(sender: UnboundedSender<UploadProgress>) -> Self {
        Self(sender)
    }
}

impl ProgressObserver for ChannelProgress {
    fn on_progress(&self, progress: UploadProgress) {
        if self.0.send(progress).is_err() {
            tracing::trace!("Progress receiver dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use encore_core::models::ProgressStage;
    use std::sync::Mutex;

    #[test]
    fn closure_observer_receives_events() {
        let seen = Mutex::new(Vec::new());
        let observer = FnProgress(|p: UploadProgress| seen.lock().unwrap().push(p.message));
        observer.on_progress(UploadProgress::new(ProgressStage::Saving, 80, "Saving metadata..."));
        drop(observer);
        assert_eq!(seen.into_inner().unwrap(), vec!["Saving metadata..."]);
    }

    #[tokio::test]
    async fn channel_observer_forwards_and_tolerates_closed_receiver() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let observer = ChannelProgress::new(tx);
        observer.on_progress(UploadProgress::failed("boom"));
        let received = rx.recv().await.unwrap();
        assert!(received.is_failure());

        drop(rx);
        observer.on_progress(UploadProgress::new(ProgressStage::Complete, 100, "done"));
    }
}
