//! Bot configuration.
//!
//! Configuration lives in the `general` section of a JSON [`SectionStore`],
//! by default at `~/.config/attendance-bot/config.json`. The same store also
//! carries the refresh timestamps written by the dataset cache, so it is
//! handed over to the cache after the settings are read.
//!
//! Settings are read once at startup and never change while running.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};

use crate::store::SectionStore;
use crate::utils::clean_doc;

/// Application name used for the default config directory
pub const APP_NAME: &str = "attendance-bot";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Default history file name, resolved next to the config file
const HISTORY_FILE: &str = "user_history.json";

/// Section holding all options and the refresh timestamps
pub const GENERAL_SECTION: &str = "general";

/// Leading columns skipped when counting attendance:
/// name, group, year, faculty, curator, summer credit, health group,
/// attendance points, essay points, attendance total.
const DEFAULT_SKIP_COLUMNS: usize = 10;

/// Maximum number of students listed in one reply
const DEFAULT_MAX_STUDENTS: usize = 30;

/// Query length bounds, both exclusive
const DEFAULT_MIN_QUERY_LENGTH: usize = 3;
const DEFAULT_MAX_QUERY_LENGTH: usize = 100;

/// Refresh the sheet when the last fetch is at least this old (2 hours)
const DEFAULT_MAX_CACHE_SECS: u64 = 2 * 60 * 60;

/// Pause before restarting a crashed receive loop
const DEFAULT_RESTART_PAUSE_SECS: u64 = 5;

/// Static settings of the bot
#[derive(Debug, Clone)]
pub struct Settings {
    pub csv_url: String,
    pub csv_path: PathBuf,
    pub history_path: PathBuf,
    /// Token from the config file; the binary may also find it elsewhere
    pub telegram_bot_token: Option<String>,
    pub help_message: String,
    pub skip_columns: usize,
    pub max_students: usize,
    pub min_query_length: usize,
    pub max_query_length: usize,
    pub max_cache_age: Duration,
    pub restart_pause: Duration,
}

impl Settings {
    /// Default config location in the user's config directory
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Load the config store and extract the settings from it.
    /// The store is returned as well so its timestamps can be maintained.
    pub fn load(path: &Path) -> Result<(Self, SectionStore)> {
        let store = SectionStore::load(path)?;
        let settings = Self::from_store(&store)?;
        Ok((settings, store))
    }

    pub fn from_store(store: &SectionStore) -> Result<Self> {
        let required = |key: &str| -> Result<String> {
            store
                .get(GENERAL_SECTION, key)
                .map(str::to_string)
                .ok_or_else(|| anyhow!("Missing required option '{}' in {}", key, store.path().display()))
        };
        let number = |key: &str, default: u64| -> Result<u64> {
            match store.get(GENERAL_SECTION, key) {
                Some(raw) => raw
                    .trim()
                    .parse()
                    .with_context(|| format!("Option '{}' is not a number: {}", key, raw)),
                None => Ok(default),
            }
        };

        let base_dir = store
            .path()
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let resolve = |p: &str| {
            let p = PathBuf::from(p);
            if p.is_relative() {
                base_dir.join(p)
            } else {
                p
            }
        };

        let settings = Self {
            csv_url: required("csv_url")?,
            csv_path: resolve(&required("csv_path")?),
            history_path: resolve(
                store
                    .get(GENERAL_SECTION, "history_path")
                    .unwrap_or(HISTORY_FILE),
            ),
            telegram_bot_token: store
                .get(GENERAL_SECTION, "telegram_bot_token")
                .filter(|t| !t.trim().is_empty())
                .map(str::to_string),
            help_message: clean_doc(&required("help_message")?),
            skip_columns: number("skip_columns", DEFAULT_SKIP_COLUMNS as u64)? as usize,
            max_students: number("max_students", DEFAULT_MAX_STUDENTS as u64)? as usize,
            min_query_length: number("min_query_length", DEFAULT_MIN_QUERY_LENGTH as u64)? as usize,
            max_query_length: number("max_query_length", DEFAULT_MAX_QUERY_LENGTH as u64)? as usize,
            max_cache_age: Duration::from_secs(number("max_cache_seconds", DEFAULT_MAX_CACHE_SECS)?),
            restart_pause: Duration::from_secs(number(
                "restart_pause_seconds",
                DEFAULT_RESTART_PAUSE_SECS,
            )?),
        };

        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        if self.skip_columns < 2 {
            bail!(
                "skip_columns must be at least 2 (name and group precede attendance), got {}",
                self.skip_columns
            );
        }
        if self.max_students == 0 {
            bail!("max_students must be greater than 0");
        }
        if self.min_query_length >= self.max_query_length {
            bail!(
                "min_query_length ({}) must be below max_query_length ({})",
                self.min_query_length,
                self.max_query_length
            );
        }
        Ok(())
    }

    /// Cache age as a chrono duration for timestamp arithmetic
    pub fn max_cache_age_chrono(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.max_cache_age).unwrap_or(chrono::Duration::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_store() -> SectionStore {
        let mut store = SectionStore::new("/srv/bot/config.json");
        store.set(GENERAL_SECTION, "csv_url", "https://example.com/export?format=csv");
        store.set(GENERAL_SECTION, "csv_path", "data/sheet.csv");
        store.set(GENERAL_SECTION, "help_message", "\n    Hello\n    /name Ivanov\n");
        store
    }

    #[test]
    fn test_defaults_apply() {
        let settings = Settings::from_store(&base_store()).unwrap();
        assert_eq!(settings.skip_columns, 10);
        assert_eq!(settings.max_students, 30);
        assert_eq!(settings.min_query_length, 3);
        assert_eq!(settings.max_query_length, 100);
        assert_eq!(settings.max_cache_age, Duration::from_secs(7200));
        assert_eq!(settings.restart_pause, Duration::from_secs(5));
        assert_eq!(settings.telegram_bot_token, None);
    }

    #[test]
    fn test_paths_resolve_against_config_dir() {
        let settings = Settings::from_store(&base_store()).unwrap();
        assert_eq!(settings.csv_path, PathBuf::from("/srv/bot/data/sheet.csv"));
        assert_eq!(settings.history_path, PathBuf::from("/srv/bot/user_history.json"));
    }

    #[test]
    fn test_help_message_is_cleaned() {
        let settings = Settings::from_store(&base_store()).unwrap();
        assert_eq!(settings.help_message, "Hello\n/name Ivanov");
    }

    #[test]
    fn test_overrides_are_read() {
        let mut store = base_store();
        store.set(GENERAL_SECTION, "skip_columns", "7");
        store.set(GENERAL_SECTION, "max_cache_seconds", "60");
        store.set(GENERAL_SECTION, "telegram_bot_token", "123:abc");
        let settings = Settings::from_store(&store).unwrap();
        assert_eq!(settings.skip_columns, 7);
        assert_eq!(settings.max_cache_age, Duration::from_secs(60));
        assert_eq!(settings.telegram_bot_token.as_deref(), Some("123:abc"));
    }

    #[test]
    fn test_missing_required_option() {
        let mut store = base_store();
        store.remove_section(GENERAL_SECTION);
        store.set(GENERAL_SECTION, "csv_url", "https://example.com");
        let err = Settings::from_store(&store).unwrap_err();
        assert!(err.to_string().contains("csv_path"));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut store = base_store();
        store.set(GENERAL_SECTION, "max_students", "many");
        assert!(Settings::from_store(&store).is_err());

        let mut store = base_store();
        store.set(GENERAL_SECTION, "skip_columns", "1");
        assert!(Settings::from_store(&store).is_err());

        let mut store = base_store();
        store.set(GENERAL_SECTION, "min_query_length", "100");
        assert!(Settings::from_store(&store).is_err());
    }
}
