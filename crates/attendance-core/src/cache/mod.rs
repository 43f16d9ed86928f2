//! Dataset caching module.
//!
//! This module provides the `DatasetCache`, which keeps the attendance sheet
//! in memory, mirrors it to a local file, and refreshes it from a remote
//! `DatasetSource` once the last fetch is older than the configured age.
//!
//! Unchanged downloads are detected by comparing SHA-256 hashes of the
//! content, so only real changes advance the "last updated" timestamp.

pub mod error;
pub mod manager;
pub mod source;

pub use error::FetchError;
pub use manager::{DatasetCache, RefreshOutcome};
pub use source::{DatasetSource, HttpSource};
