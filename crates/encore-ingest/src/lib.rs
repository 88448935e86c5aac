//! Encore ingestion services
//!
//! Wires validation, signal processing, object storage, the catalog and the
//! quota ledger into a single upload workflow with compensation on failure.

pub mod batch;
pub mod orchestrator;
pub mod progress;
pub mod quota;
pub mod setup;

pub use batch::BatchCoordinator;
pub use orchestrator::{DeletionReport, UploadOrchestrator, UploadRequest};
pub use progress::{ChannelProgress, FnProgress, NoopProgress, ProgressObserver};
pub use quota::QuotaLedger;
pub use setup::build_orchestrator;
