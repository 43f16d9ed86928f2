use thiserror::Error;

#[derive(Error, Debug)]
pub enum TelegramError {
    /// Transport failure; the request URL is stripped since it embeds the token
    #[error("Network error: {0}")]
    Network(reqwest::Error),

    #[error("Telegram API error {}: {description}", display_code(.code))]
    Api {
        code: Option<i64>,
        description: String,
    },

    #[error("Telegram API returned ok without a result")]
    MissingResult,
}

fn display_code(code: &Option<i64>) -> String {
    code.map_or_else(|| "?".to_string(), |c| c.to_string())
}

impl From<reqwest::Error> for TelegramError {
    fn from(e: reqwest::Error) -> Self {
        TelegramError::Network(e.without_url())
    }
}
