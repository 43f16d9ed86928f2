//! Per-user memory of the last successful search.
//!
//! Each user gets one section in the history store, keyed by their chat id,
//! holding the search mode token and the raw query. Every change is flushed
//! to disk right away; a failed flush is logged and the in-memory change
//! stands.

use std::fmt;

use tracing::{error, warn};

use crate::models::SearchMode;
use crate::store::{Section, SectionStore};

const MODE_KEY: &str = "mode";
const QUERY_KEY: &str = "query";

/// Opaque identity of the chat a command came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChatId(pub i64);

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A remembered query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub mode: SearchMode,
    pub query: String,
}

pub struct QueryHistory {
    store: SectionStore,
}

impl QueryHistory {
    pub fn new(store: SectionStore) -> Self {
        Self { store }
    }

    /// Store (or overwrite) the last query of a user
    pub fn remember(&mut self, user: ChatId, mode: SearchMode, query: &str) {
        let mut entry = Section::new();
        entry.insert(MODE_KEY.to_string(), mode.token().to_string());
        entry.insert(QUERY_KEY.to_string(), query.to_string());
        self.store.set_section(&user.to_string(), entry);
        self.persist();
    }

    /// Look up the last query of a user
    pub fn recall(&self, user: ChatId) -> Option<HistoryEntry> {
        let section = self.store.section(&user.to_string())?;
        let mode = section.get(MODE_KEY)?;
        let query = section.get(QUERY_KEY)?;

        match mode.parse::<SearchMode>() {
            Ok(mode) => Some(HistoryEntry {
                mode,
                query: query.clone(),
            }),
            Err(e) => {
                warn!(user = %user, error = %e, "Ignoring history entry with unknown mode");
                None
            }
        }
    }

    /// Drop the last query of a user, returning whether there was one
    pub fn forget(&mut self, user: ChatId) -> bool {
        let existed = self.store.remove_section(&user.to_string());
        if existed {
            self.persist();
        }
        existed
    }

    fn persist(&self) {
        if let Err(e) = self.store.flush() {
            error!(
                path = %self.store.path().display(),
                error = %e,
                "Failed to save query history, changes stay in memory"
            );
        }
    }
}
