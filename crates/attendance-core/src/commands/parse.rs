/// A recognized bot command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    /// `/name <query>` or `/group <query>`; `query` is `None` when the
    /// command had no argument at all
    Search {
        mode: String,
        query: Option<String>,
    },
    Forget,
    Check,
}

impl Command {
    /// Parse a chat message such as `/group 221` or `/help@SomeBot`.
    ///
    /// The command word ends at the first space; everything after that
    /// space is the raw query, kept verbatim. Returns `None` for plain text
    /// and commands this bot does not handle.
    pub fn parse(text: &str) -> Option<Self> {
        let rest = text.strip_prefix('/')?;
        let (head, query) = match rest.split_once(' ') {
            Some((head, query)) => (head, Some(query)),
            None => (rest, None),
        };
        let word = head.split('@').next().unwrap_or(head);

        let command = match word {
            "start" => Command::Start,
            "help" => Command::Help,
            "name" | "group" => Command::Search {
                mode: word.to_string(),
                query: query.map(str::to_string),
            },
            "forget" => Command::Forget,
            "check" => Command::Check,
            _ => return None,
        };
        Some(command)
    }
}
