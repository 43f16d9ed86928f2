//! User-visible reply texts.

use chrono::{DateTime, Utc};

use crate::search::Match;
use crate::utils::format_timestamp;

pub const MISSING_QUERY: &str = "Не указан поисковый запрос";
pub const BAD_QUERY_LENGTH: &str = "Некорректная длина поискового запроса";
pub const UNKNOWN_MODE: &str = "Неизвестный режим поиска";
pub const FORGOTTEN: &str = "Ваш последний поисковый запрос успешно забыт";
pub const NO_HISTORY: &str = "Вы раньше ничего не искали";
pub const NOTHING_FOUND: &str = "По вашему запросу ничего не найдено";

/// Shown instead of a timestamp when the dataset never changed
const NEVER_UPDATED: &str = "неизвестно";

/// How the transport should interpret the reply text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyFormat {
    Plain,
    /// Markdown markup, link previews disabled
    Markdown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub format: ReplyFormat,
}

impl Reply {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            format: ReplyFormat::Plain,
        }
    }

    pub fn markdown(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            format: ReplyFormat::Markdown,
        }
    }
}

fn render_match(m: &Match) -> String {
    format!("{} (группа {})\nПосещений: {}", m.name, m.group, m.attendance)
}

/// Build the search reply: one block per match separated by blank lines,
/// or the "nothing found" text, followed by the last-update footer.
pub fn render_results(matches: &[Match], changed_at: Option<DateTime<Utc>>) -> String {
    let mut text = if matches.is_empty() {
        NOTHING_FOUND.to_string()
    } else {
        matches
            .iter()
            .map(render_match)
            .collect::<Vec<_>>()
            .join("\n\n")
    };

    let updated = match changed_at {
        Some(at) => format!("{} UTC", format_timestamp(&at)),
        None => NEVER_UPDATED.to_string(),
    };
    text.push_str("\n\nПоследнее обновление:\n");
    text.push_str(&updated);
    text
}
