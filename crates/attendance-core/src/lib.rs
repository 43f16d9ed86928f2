//! Attendance lookup core.
//!
//! Everything the bot does apart from talking to the chat service:
//!
//! - [`cache`]: in-memory copy of the attendance CSV, refreshed from a remote
//!   URL and mirrored to disk
//! - [`search`]: row scan by name or group with attendance counting
//! - [`history`]: per-user last successful query
//! - [`commands`]: command parsing, dispatching and reply rendering
//! - [`config`] and [`store`]: JSON-file backed settings and key-value store

pub mod cache;
pub mod commands;
pub mod config;
pub mod history;
pub mod models;
pub mod search;
pub mod store;
pub mod utils;

pub use cache::{DatasetCache, DatasetSource, FetchError, HttpSource, RefreshOutcome};
pub use commands::{Command, Dispatcher, Reply, ReplyFormat};
pub use config::Settings;
pub use history::{ChatId, HistoryEntry, QueryHistory};
pub use models::{Dataset, Record, SearchMode};
pub use search::{Match, SearchEngine, SearchError};
pub use store::SectionStore;
