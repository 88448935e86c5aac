//! Encore Storage Library
//!
//! Object storage for encoded audio. The [`Storage`] trait is the only surface the
//! ingestion pipeline sees; S3-compatible and local filesystem backends implement it.
//!
//! # Object key format
//!
//! `{owner_id}/{YYYY-MM-DD}_{title}_{disambiguator}.mp3`, where `title` is sanitized
//! to `[A-Za-z0-9._-]` and the disambiguator is eight hex characters. Keys never
//! contain `..` or a leading `/`. Key generation and URL-to-key derivation live in
//! the `keys` module so all backends stay consistent.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use encore_core::StorageBackend;
pub use factory::create_storage;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{Storage, StorageError, StorageResult};
