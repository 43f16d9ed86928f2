use anyhow::{anyhow, Context, Result};
use keyring::Entry;

const SERVICE_NAME: &str = "attendance-bot";

/// Keychain account name the bot token is stored under
const TOKEN_ACCOUNT: &str = "telegram";

pub struct CredentialStore;

impl CredentialStore {
    fn entry() -> Result<Entry> {
        Entry::new(SERVICE_NAME, TOKEN_ACCOUNT).context("Failed to create keyring entry")
    }

    /// Store the bot token in the OS keychain
    pub fn store_token(token: &str) -> Result<()> {
        Self::entry()?
            .set_password(token)
            .context("Failed to store bot token in keychain")
    }

    /// Retrieve the bot token from the OS keychain
    pub fn get_token() -> Result<String> {
        Self::entry()?
            .get_password()
            .context("Failed to retrieve bot token from keychain")
    }

    /// Delete the stored bot token
    pub fn delete_token() -> Result<()> {
        Self::entry()?
            .delete_credential()
            .context("Failed to delete bot token from keychain")
    }
}

/// Pick the bot token: environment first, then the config file, then the
/// keychain. Blank values count as unset.
pub fn resolve_token(
    from_env: Option<String>,
    from_config: Option<&str>,
    from_keychain: impl FnOnce() -> Result<String>,
) -> Result<String> {
    let usable = |t: &str| !t.trim().is_empty();

    if let Some(token) = from_env.filter(|t| usable(t)) {
        return Ok(token.trim().to_string());
    }
    if let Some(token) = from_config.filter(|t| usable(t)) {
        return Ok(token.trim().to_string());
    }
    from_keychain()
        .ok()
        .filter(|t| usable(t))
        .map(|t| t.trim().to_string())
        .ok_or_else(|| {
            anyhow!(
                "No Telegram bot token: set ATTENDANCE_BOT_TOKEN, add telegram_bot_token \
                 to the config, or run with --store-token"
            )
        })
}
