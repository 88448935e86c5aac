//! Database repositories
//!
//! `track` owns the catalog table, `quota` owns the per-account ledger.

pub mod quota;
pub mod track;

pub use quota::{LedgerStore, QuotaRepository};
pub use track::{CatalogStore, TrackRepository};
