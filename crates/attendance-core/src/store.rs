//! Section-based key-value store backed by a JSON file.
//!
//! Both durable stores of the bot (operational config with refresh
//! timestamps, and per-user query history) use this type. The whole file is
//! read on `load` and rewritten on every `flush`; there are no incremental
//! writes.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub type Section = BTreeMap<String, String>;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
struct Sections(BTreeMap<String, Section>);

#[derive(Debug, Clone)]
pub struct SectionStore {
    path: PathBuf,
    sections: Sections,
}

impl SectionStore {
    /// Create an empty store that will be written to `path` on flush.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            sections: Sections::default(),
        }
    }

    /// Load the store from disk. A missing file yields an empty store.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if !path.exists() {
            debug!(path = %path.display(), "Store file does not exist, starting empty");
            return Ok(Self::new(path));
        }

        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read store file: {}", path.display()))?;
        let sections: Sections = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse store file: {}", path.display()))?;

        Ok(Self { path, sections })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.sections
            .0
            .get(section)
            .and_then(|s| s.get(key))
            .map(String::as_str)
    }

    pub fn section(&self, section: &str) -> Option<&Section> {
        self.sections.0.get(section)
    }

    pub fn set(&mut self, section: &str, key: &str, value: impl Into<String>) {
        self.sections
            .0
            .entry(section.to_string())
            .or_default()
            .insert(key.to_string(), value.into());
    }

    /// Replace a whole section with the given entries.
    pub fn set_section(&mut self, section: &str, entries: Section) {
        self.sections.0.insert(section.to_string(), entries);
    }

    /// Remove a section, returning whether it existed.
    pub fn remove_section(&mut self, section: &str) -> bool {
        self.sections.0.remove(section).is_some()
    }

    /// Rewrite the whole file with the current in-memory contents.
    pub fn flush(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let contents = serde_json::to_string_pretty(&self.sections)?;
        std::fs::write(&self.path, contents)
            .with_context(|| format!("Failed to write store file: {}", self.path.display()))?;
        Ok(())
    }
}
