use thiserror::Error;
use tracing::{debug, info};

use super::messages::{self, render_results, Reply};
use super::Command;
use crate::cache::{DatasetCache, DatasetSource};
use crate::config::Settings;
use crate::history::{ChatId, QueryHistory};
use crate::models::{ParseSearchModeError, SearchMode};
use crate::search::SearchEngine;

/// Search input rejected before touching the dataset.
/// The display text is what the user gets back.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum InvalidQuery {
    #[error("{}", messages::MISSING_QUERY)]
    MissingQuery,

    #[error("{}", messages::UNKNOWN_MODE)]
    UnknownMode(#[source] ParseSearchModeError),

    #[error("{}", messages::BAD_QUERY_LENGTH)]
    BadLength(usize),
}

/// Routes commands to the cache, search engine and history.
///
/// Commands are handled one at a time; a search may refresh the dataset
/// from the remote source before scanning it.
pub struct Dispatcher<S> {
    cache: DatasetCache<S>,
    history: QueryHistory,
    engine: SearchEngine,
    help_message: String,
    min_query_length: usize,
    max_query_length: usize,
}

impl<S: DatasetSource> Dispatcher<S> {
    pub fn new(settings: &Settings, cache: DatasetCache<S>, history: QueryHistory) -> Self {
        Self {
            cache,
            history,
            engine: SearchEngine::new(settings.skip_columns, settings.max_students),
            help_message: settings.help_message.clone(),
            min_query_length: settings.min_query_length,
            max_query_length: settings.max_query_length,
        }
    }

    pub fn cache(&self) -> &DatasetCache<S> {
        &self.cache
    }

    pub fn history(&self) -> &QueryHistory {
        &self.history
    }

    pub async fn handle(&mut self, chat: ChatId, command: Command) -> Reply {
        debug!(chat = %chat, command = ?command, "Handling command");
        match command {
            Command::Start | Command::Help => self.help(),
            Command::Search { mode, query } => self.search(chat, &mode, query.as_deref()).await,
            Command::Forget => self.forget(chat),
            Command::Check => self.replay_last(chat).await,
        }
    }

    pub fn help(&self) -> Reply {
        Reply::markdown(self.help_message.clone())
    }

    /// Check a raw search request: the query must be present, the mode
    /// token known, and the length strictly between the configured bounds.
    pub fn validate<'q>(
        &self,
        mode: &str,
        query: Option<&'q str>,
    ) -> Result<(SearchMode, &'q str), InvalidQuery> {
        let query = query.ok_or(InvalidQuery::MissingQuery)?;
        let mode = mode.parse::<SearchMode>().map_err(InvalidQuery::UnknownMode)?;

        let length = query.chars().count();
        if length <= self.min_query_length || length >= self.max_query_length {
            return Err(InvalidQuery::BadLength(length));
        }
        Ok((mode, query))
    }

    pub async fn search(&mut self, chat: ChatId, mode: &str, query: Option<&str>) -> Reply {
        match self.validate(mode, query) {
            Ok((mode, query)) => self.run_search(chat, mode, query).await,
            Err(rejected) => Reply::plain(rejected.to_string()),
        }
    }

    pub fn forget(&mut self, chat: ChatId) -> Reply {
        if self.history.forget(chat) {
            info!(chat = %chat, "Forgot last query");
            Reply::plain(messages::FORGOTTEN)
        } else {
            Reply::plain(messages::NO_HISTORY)
        }
    }

    /// Re-run the last successful search of this chat
    pub async fn replay_last(&mut self, chat: ChatId) -> Reply {
        match self.history.recall(chat) {
            Some(entry) => self.run_search(chat, entry.mode, &entry.query).await,
            None => Reply::plain(messages::NO_HISTORY),
        }
    }

    async fn run_search(&mut self, chat: ChatId, mode: SearchMode, query: &str) -> Reply {
        self.cache.ensure_fresh().await;

        let dataset = self.cache.current();
        let found = self.engine.search_or_empty(dataset, mode, query);
        let text = render_results(&found, dataset.changed_at());

        if !found.is_empty() {
            self.history.remember(chat, mode, query);
        }
        Reply::plain(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::path::PathBuf;
    use std::time::Duration;

    use crate::cache::FetchError;
    use crate::commands::ReplyFormat;
    use crate::history::HistoryEntry;
    use crate::store::SectionStore;

    const SHEET: &str = "\
Anna Ivanova,M01,1,f,cur,pas,hea,x,,x
Ivan Petrov,221,1,f,cur,pas,hea,x,x,
Olga Smirnova,M01-2,2,f,cur,pas,hea,,,
";

    struct StaticSource {
        body: Vec<u8>,
        calls: Cell<usize>,
    }

    impl DatasetSource for StaticSource {
        async fn fetch(&self) -> Result<Vec<u8>, FetchError> {
            self.calls.set(self.calls.get() + 1);
            Ok(self.body.clone())
        }
    }

    fn settings(dir: &tempfile::TempDir) -> Settings {
        Settings {
            csv_url: "http://localhost/sheet.csv".to_string(),
            csv_path: dir.path().join("sheet.csv"),
            history_path: dir.path().join("history.json"),
            telegram_bot_token: None,
            help_message: "*Help*".to_string(),
            skip_columns: 7,
            max_students: 30,
            min_query_length: 2,
            max_query_length: 10,
            max_cache_age: Duration::from_secs(7200),
            restart_pause: Duration::from_secs(5),
        }
    }

    fn dispatcher(dir: &tempfile::TempDir, body: &str) -> Dispatcher<StaticSource> {
        let settings = settings(dir);
        let cache = DatasetCache::open(
            StaticSource {
                body: body.as_bytes().to_vec(),
                calls: Cell::new(0),
            },
            settings.csv_path.clone(),
            SectionStore::new(dir.path().join("config.json")),
            settings.max_cache_age_chrono(),
        );
        let history = QueryHistory::new(SectionStore::new(settings.history_path.clone()));
        Dispatcher::new(&settings, cache, history)
    }

    fn footer(d: &Dispatcher<StaticSource>) -> String {
        let at = d.cache().current().changed_at().unwrap();
        format!(
            "\n\nПоследнее обновление:\n{} UTC",
            crate::utils::format_timestamp(&at)
        )
    }

    #[tokio::test]
    async fn test_help_and_start_return_markdown_help() {
        let dir = tempfile::tempdir().unwrap();
        let mut d = dispatcher(&dir, SHEET);
        for command in [Command::Help, Command::Start] {
            let reply = d.handle(ChatId(1), command).await;
            assert_eq!(reply.text, "*Help*");
            assert_eq!(reply.format, ReplyFormat::Markdown);
        }
    }

    #[tokio::test]
    async fn test_group_search_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let mut d = dispatcher(&dir, SHEET);

        let reply = d
            .handle(ChatId(7), Command::parse("/group 221").unwrap())
            .await;

        let expected = format!("Ivan Petrov (группа 221)\nПосещений: 2{}", footer(&d));
        assert_eq!(reply.text, expected);
        assert_eq!(reply.format, ReplyFormat::Plain);
        assert_eq!(
            d.history().recall(ChatId(7)),
            Some(HistoryEntry {
                mode: SearchMode::Group,
                query: "221".to_string(),
            })
        );
    }

    #[tokio::test]
    async fn test_empty_result_is_not_remembered() {
        let dir = tempfile::tempdir().unwrap();
        let mut d = dispatcher(&dir, SHEET);

        let reply = d.search(ChatId(7), "group", Some("999")).await;
        assert!(reply.text.starts_with(messages::NOTHING_FOUND));
        assert!(reply.text.ends_with(" UTC"));
        assert_eq!(d.history().recall(ChatId(7)), None);
    }

    #[tokio::test]
    async fn test_malformed_sheet_renders_nothing_found() {
        let dir = tempfile::tempdir().unwrap();
        let mut d = dispatcher(&dir, "Ivan Petrov,221,1,f,cur,pas,hea,x\nshort,221\n");

        let reply = d.search(ChatId(7), "group", Some("221")).await;
        assert!(reply.text.starts_with(messages::NOTHING_FOUND));
        assert_eq!(d.history().recall(ChatId(7)), None);
    }

    #[tokio::test]
    async fn test_validation_rejects_before_dataset_access() {
        let dir = tempfile::tempdir().unwrap();
        let mut d = dispatcher(&dir, SHEET);

        let reply = d.search(ChatId(1), "surname", Some("Petrov")).await;
        assert_eq!(reply.text, messages::UNKNOWN_MODE);

        let reply = d.search(ChatId(1), "group", None).await;
        assert_eq!(reply.text, messages::MISSING_QUERY);

        let reply = d.search(ChatId(1), "name", Some("ab")).await;
        assert_eq!(reply.text, messages::BAD_QUERY_LENGTH);

        assert_eq!(d.cache().current().fetched_at(), None);
        assert_eq!(d.cache().source().calls.get(), 0);
        assert_eq!(d.history().recall(ChatId(1)), None);
    }

    #[test]
    fn test_query_length_bounds_are_exclusive() {
        let dir = tempfile::tempdir().unwrap();
        let d = dispatcher(&dir, SHEET);

        // Bounds are 2 and 10
        assert_eq!(
            d.validate("name", Some("ab")),
            Err(InvalidQuery::BadLength(2))
        );
        assert_eq!(
            d.validate("name", Some("abcdefghij")),
            Err(InvalidQuery::BadLength(10))
        );
        assert_eq!(d.validate("name", Some("abc")), Ok((SearchMode::Name, "abc")));
        assert_eq!(
            d.validate("group", Some("abcdefghi")),
            Ok((SearchMode::Group, "abcdefghi"))
        );
        // Length counts characters, not bytes
        assert!(d.validate("name", Some("Иван")).is_ok());
        assert!(d.validate("name", Some("Я")).is_err());
    }

    #[test]
    fn test_mode_is_checked_before_length() {
        let dir = tempfile::tempdir().unwrap();
        let d = dispatcher(&dir, SHEET);
        assert!(matches!(
            d.validate("surname", Some("x")),
            Err(InvalidQuery::UnknownMode(_))
        ));
    }

    #[tokio::test]
    async fn test_check_replays_last_query() {
        let dir = tempfile::tempdir().unwrap();
        let mut d = dispatcher(&dir, SHEET);

        let reply = d.handle(ChatId(3), Command::Check).await;
        assert_eq!(reply.text, messages::NO_HISTORY);

        let first = d.search(ChatId(3), "name", Some("ivan")).await;
        let replay = d.handle(ChatId(3), Command::Check).await;
        assert_eq!(first, replay);
        assert!(replay.text.starts_with("Anna Ivanova (группа M01)\nПосещений: 2\n\nIvan Petrov"));
    }

    #[tokio::test]
    async fn test_forget_reports_whether_anything_was_deleted() {
        let dir = tempfile::tempdir().unwrap();
        let mut d = dispatcher(&dir, SHEET);

        d.search(ChatId(4), "group", Some("M01-2")).await;
        let reply = d.handle(ChatId(4), Command::Forget).await;
        assert_eq!(reply.text, messages::FORGOTTEN);

        let reply = d.handle(ChatId(4), Command::Forget).await;
        assert_eq!(reply.text, messages::NO_HISTORY);

        let reply = d.handle(ChatId(4), Command::Check).await;
        assert_eq!(reply.text, messages::NO_HISTORY);
    }

    #[tokio::test]
    async fn test_dataset_is_fetched_once_within_cache_age() {
        let dir = tempfile::tempdir().unwrap();
        let mut d = dispatcher(&dir, SHEET);

        d.search(ChatId(1), "group", Some("221")).await;
        d.search(ChatId(2), "name", Some("olga")).await;
        assert_eq!(d.cache().source().calls.get(), 1);
        assert!(PathBuf::from(d.cache().csv_path()).exists());
    }
}
