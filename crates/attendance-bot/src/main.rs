//! Attendance bot - answers "how many sessions did I attend" over Telegram.
//!
//! The bot looks students up by name or group in a published CSV sheet,
//! caches the sheet locally, and remembers each user's last query so it can
//! be re-run with `/check`.

mod bot;
mod credentials;
mod supervisor;
mod telegram;

use std::io;
use std::path::PathBuf;

use anyhow::{bail, Result};
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use attendance_core::{DatasetCache, Dispatcher, HttpSource, QueryHistory, SectionStore, Settings};

use bot::Bot;
use credentials::CredentialStore;
use telegram::TelegramClient;

// ============================================================================
// Constants
// ============================================================================

/// Overrides the config file location
const CONFIG_ENV: &str = "ATTENDANCE_BOT_CONFIG";

/// Overrides the bot token from config and keychain
const TOKEN_ENV: &str = "ATTENDANCE_BOT_TOKEN";

/// When set, logs go to a daily rolling file in this directory
const LOG_DIR_ENV: &str = "ATTENDANCE_BOT_LOG_DIR";

/// Log file name prefix inside the log directory
const LOG_FILE_PREFIX: &str = "attendance-bot.log";

/// Initialize the tracing subscriber for logging.
/// The returned guard flushes buffered log lines when dropped.
fn init_tracing() -> WorkerGuard {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let log_dir = std::env::var_os(LOG_DIR_ENV);
    let to_file = log_dir.is_some();
    let (writer, guard) = match log_dir {
        Some(dir) => {
            tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX))
        }
        None => tracing_appender::non_blocking(io::stderr()),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(writer).with_ansi(!to_file))
        .with(filter)
        .init();

    guard
}

/// Config path: env var, then the first non-flag argument, then the user
/// config directory
fn config_path(args: &[String]) -> Result<PathBuf> {
    if let Some(path) = std::env::var_os(CONFIG_ENV) {
        return Ok(PathBuf::from(path));
    }
    if let Some(arg) = args.iter().skip(1).find(|a| !a.starts_with("--")) {
        return Ok(PathBuf::from(arg));
    }
    Settings::default_config_path()
}

/// Prompt for the bot token and keep it in the OS keychain
fn store_token() -> Result<()> {
    let token = rpassword::prompt_password("Telegram bot token: ")?;
    let token = token.trim();
    if token.is_empty() {
        bail!("Empty token, nothing stored");
    }
    CredentialStore::store_token(token)?;
    eprintln!("Token stored in the system keychain.");
    Ok(())
}

/// Resolves on Ctrl-C. If the handler cannot be installed the bot keeps
/// running and has to be stopped externally.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    // Check for CLI commands
    let args: Vec<String> = std::env::args().collect();
    if args.len() > 1 && args[1] == "--store-token" {
        return store_token();
    }
    if args.len() > 1 && args[1] == "--forget-token" {
        CredentialStore::delete_token()?;
        eprintln!("Token removed from the system keychain.");
        return Ok(());
    }

    let _log_guard = init_tracing();

    let config_path = config_path(&args)?;
    info!(config = %config_path.display(), "Attendance bot starting");

    let (settings, config_store) = Settings::load(&config_path)?;
    let token = credentials::resolve_token(
        std::env::var(TOKEN_ENV).ok(),
        settings.telegram_bot_token.as_deref(),
        CredentialStore::get_token,
    )?;

    let history = QueryHistory::new(SectionStore::load(&settings.history_path)?);
    let cache = DatasetCache::open(
        HttpSource::new(settings.csv_url.clone())?,
        settings.csv_path.clone(),
        config_store,
        settings.max_cache_age_chrono(),
    );
    let dispatcher = Dispatcher::new(&settings, cache, history);

    let mut bot = Bot::new(TelegramClient::new(&token)?, dispatcher);
    let restarts = supervisor::supervise(&mut bot, settings.restart_pause, shutdown_signal()).await;

    info!(restarts = restarts, "Attendance bot shutting down");
    Ok(())
}
