use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use tracing::{debug, error, info, warn};

use super::DatasetSource;
use crate::config::GENERAL_SECTION;
use crate::models::dataset::content_hash;
use crate::models::Dataset;
use crate::store::SectionStore;

/// Config key holding the unix time of the last successful fetch
pub const LOADED_AT_KEY: &str = "csv_loaded_at";

/// Config key holding the unix time of the last fetch that changed the content
pub const UPDATED_AT_KEY: &str = "csv_updated_at";

/// What a call to `ensure_fresh` ended up doing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The last fetch is recent enough; nothing was requested
    Fresh,
    /// The remote fetch failed; the cached data is kept as-is
    FetchFailed,
    /// The fetched bytes hash the same as the cached ones
    Unchanged,
    /// New content was swapped in
    Changed,
}

/// Owns the in-memory dataset and everything needed to refresh it.
///
/// The config store is shared with the operational settings: refresh
/// timestamps live in its `general` section and are written back on every
/// successful fetch. Mirroring the CSV to disk and flushing the timestamps
/// are independent steps; one failing does not undo the other.
pub struct DatasetCache<S> {
    source: S,
    dataset: Dataset,
    csv_path: PathBuf,
    state: SectionStore,
    max_age: Duration,
}

fn read_timestamp(state: &SectionStore, key: &str) -> Option<DateTime<Utc>> {
    let raw = state.get(GENERAL_SECTION, key)?;
    match raw.trim().parse::<i64>() {
        Ok(secs) => DateTime::from_timestamp(secs, 0),
        Err(e) => {
            warn!(key = key, value = raw, error = %e, "Ignoring unreadable timestamp");
            None
        }
    }
}

impl<S: DatasetSource> DatasetCache<S> {
    /// Build the cache, loading the local mirror of the dataset if present.
    ///
    /// A missing or unreadable mirror is not an error: the cache starts empty
    /// and the first `ensure_fresh` performs the initial load.
    pub fn open(
        source: S,
        csv_path: impl Into<PathBuf>,
        state: SectionStore,
        max_age: Duration,
    ) -> Self {
        let csv_path = csv_path.into();

        let mirror = if csv_path.exists() {
            match std::fs::read(&csv_path) {
                Ok(bytes) => {
                    info!(path = %csv_path.display(), bytes = bytes.len(), "Loaded CSV from disk");
                    Some(bytes)
                }
                Err(e) => {
                    error!(path = %csv_path.display(), error = %e, "Failed to read CSV from disk");
                    None
                }
            }
        } else {
            warn!(path = %csv_path.display(), "CSV file does not exist, it will be fetched on first refresh");
            None
        };

        // Without a mirror the stored fetch time describes data we no longer
        // have, so the first refresh must go out regardless of its age
        let fetched_at = mirror
            .as_ref()
            .and_then(|_| read_timestamp(&state, LOADED_AT_KEY));
        let dataset = Dataset::new(mirror.unwrap_or_default())
            .with_timestamps(fetched_at, read_timestamp(&state, UPDATED_AT_KEY));

        Self {
            source,
            dataset,
            csv_path,
            state,
            max_age,
        }
    }

    /// Read-only view of the cached dataset
    pub fn current(&self) -> &Dataset {
        &self.dataset
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }

    /// Whether the last fetch is at least `max_age` old (or never happened)
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        match self.dataset.fetched_at {
            Some(fetched_at) => now - fetched_at >= self.max_age,
            None => true,
        }
    }

    /// Refresh from the remote source if the cache is due. Never fails:
    /// every error is logged and the previous data stays in place.
    pub async fn ensure_fresh(&mut self) -> RefreshOutcome {
        self.ensure_fresh_at(Utc::now()).await
    }

    /// `ensure_fresh` with an explicit clock
    pub async fn ensure_fresh_at(&mut self, now: DateTime<Utc>) -> RefreshOutcome {
        if !self.is_due(now) {
            return RefreshOutcome::Fresh;
        }

        let age = self
            .dataset
            .fetched_at
            .map(|at| (now - at).num_seconds().to_string())
            .unwrap_or_else(|| "never".to_string());
        info!(last_fetch_secs_ago = %age, "Starting dataset refresh");

        let fetched = match self.source.fetch().await {
            Ok(bytes) => bytes,
            Err(e) => {
                error!(error = %e, "Failed to refresh CSV");
                return RefreshOutcome::FetchFailed;
            }
        };

        self.dataset.fetched_at = Some(now);

        let outcome = if content_hash(&fetched) == self.dataset.content_hash() {
            info!("Fetched CSV has no changes");
            RefreshOutcome::Unchanged
        } else {
            self.dataset.replace_content(fetched);
            self.dataset.changed_at = Some(now);
            match self.persist_content() {
                Ok(()) => info!(path = %self.csv_path.display(), "Updated CSV saved"),
                Err(e) => error!(error = %e, "Failed to save updated CSV, keeping it in memory"),
            }
            RefreshOutcome::Changed
        };

        if let Err(e) = self.persist_timestamps() {
            error!(error = %e, "Failed to save refresh timestamps, keeping them in memory");
        }

        outcome
    }

    fn persist_content(&self) -> Result<()> {
        if let Some(parent) = self.csv_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(&self.csv_path, self.dataset.content())
            .with_context(|| format!("Failed to write CSV file: {}", self.csv_path.display()))
    }

    fn persist_timestamps(&mut self) -> Result<()> {
        if let Some(at) = self.dataset.fetched_at {
            self.state
                .set(GENERAL_SECTION, LOADED_AT_KEY, at.timestamp().to_string());
        }
        if let Some(at) = self.dataset.changed_at {
            self.state
                .set(GENERAL_SECTION, UPDATED_AT_KEY, at.timestamp().to_string());
        }
        debug!(path = %self.state.path().display(), "Saving refresh timestamps");
        self.state.flush()
    }
}

// ============================================================================
// Tests
// ============================================================================
