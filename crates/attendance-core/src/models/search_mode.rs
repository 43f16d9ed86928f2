use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Field a search query is matched against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    /// Case-insensitive substring match on the full name
    Name,
    /// Exact match on the group identifier
    Group,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown search mode: {0}")]
pub struct ParseSearchModeError(pub String);

impl SearchMode {
    /// Command token for this mode, also used when persisting history
    pub fn token(&self) -> &'static str {
        match self {
            SearchMode::Name => "name",
            SearchMode::Group => "group",
        }
    }
}

impl FromStr for SearchMode {
    type Err = ParseSearchModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(SearchMode::Name),
            "group" => Ok(SearchMode::Group),
            other => Err(ParseSearchModeError(other.to_string())),
        }
    }
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}
