//! Encore Database Layer
//!
//! Catalog and quota-ledger persistence on PostgreSQL. The pipeline depends only on
//! the [`CatalogStore`] and [`LedgerStore`] traits; the repositories here are their
//! production implementations.

pub mod db;
pub mod setup;

pub use db::{CatalogStore, LedgerStore, QuotaRepository, TrackRepository};
pub use setup::{connect_pool, run_migrations, setup_database};
