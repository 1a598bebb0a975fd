//! Application configuration loading and validation.
//!
//! Configuration is loaded from a TOML file with environment variable
//! overrides for secrets (`TELEGRAM_BOT_TOKEN`, `TON_API_KEY`).

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use tracing_subscriber::{fmt, EnvFilter};

use crate::error::{ConfigError, Result};

/// Main application configuration.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub indexer: IndexerConfig,
    #[serde(default)]
    pub locator: LocatorConfig,
    #[serde(default)]
    pub resolver: ResolverConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub backup: BackupConfig,
    #[serde(default)]
    pub contest: ContestConfig,
    #[serde(default)]
    pub promo: PromoConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Telegram surface configuration.
/// The bot token is loaded from `TELEGRAM_BOT_TOKEN` at runtime (never from
/// the config file).
#[derive(Debug, Clone, Deserialize)]
pub struct TelegramConfig {
    /// Enable the Telegram surface (commands and alerts).
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Bot token loaded from `TELEGRAM_BOT_TOKEN` env var at runtime.
    #[serde(skip)]
    pub bot_token: String,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            bot_token: String::new(),
        }
    }
}

/// Swap-event indexer configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct IndexerConfig {
    /// Base URL of the tonapi-compatible event API.
    #[serde(default = "default_indexer_base_url")]
    pub base_url: String,
    /// API key loaded from `TON_API_KEY` env var at runtime.
    #[serde(skip)]
    pub api_key: String,
    /// Seconds between poll passes over a group's pools.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// Request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Connect timeout in milliseconds.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    /// Maximum number of attempts for transient failures.
    #[serde(default = "default_retry_max_attempts")]
    pub retry_max_attempts: u32,
    /// Backoff between retries in milliseconds.
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

impl IndexerConfig {
    /// Poll interval as a [`Duration`].
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            base_url: default_indexer_base_url(),
            api_key: String::new(),
            poll_interval_secs: default_poll_interval_secs(),
            timeout_ms: default_timeout_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
            retry_max_attempts: default_retry_max_attempts(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

/// Pool locator configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LocatorConfig {
    /// Base URL of the GeckoTerminal-compatible search API.
    #[serde(default = "default_locator_base_url")]
    pub base_url: String,
    /// Request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Connect timeout in milliseconds.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            base_url: default_locator_base_url(),
            timeout_ms: default_timeout_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
        }
    }
}

/// Address resolver configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ResolverConfig {
    /// Base URL of the toncenter-compatible address API.
    #[serde(default = "default_resolver_base_url")]
    pub base_url: String,
    /// Request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Connect timeout in milliseconds.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            base_url: default_resolver_base_url(),
            timeout_ms: default_timeout_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
        }
    }
}

/// SQLite persistence configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
        }
    }
}

/// Periodic state snapshot configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct BackupConfig {
    /// Minutes between snapshots of groups and live contests.
    #[serde(default = "default_backup_interval_minutes")]
    pub interval_minutes: u64,
}

impl BackupConfig {
    /// Snapshot interval as a [`Duration`].
    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_minutes * 60)
    }
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            interval_minutes: default_backup_interval_minutes(),
        }
    }
}

/// Contest behavior configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ContestConfig {
    /// Rows in the /list standings table.
    #[serde(default = "default_leaderboard_size")]
    pub leaderboard_size: usize,
    /// Contest durations operators may pick, in hours.
    #[serde(default = "default_allowed_hours")]
    pub allowed_hours: Vec<u64>,
    /// Duration of the hidden short test contest, in seconds. 0 disables it.
    #[serde(default = "default_test_duration_secs")]
    pub test_duration_secs: u64,
}

impl Default for ContestConfig {
    fn default() -> Self {
        Self {
            leaderboard_size: default_leaderboard_size(),
            allowed_hours: default_allowed_hours(),
            test_duration_secs: default_test_duration_secs(),
        }
    }
}

/// Promotional content appended to buy alerts.
#[derive(Debug, Clone, Deserialize)]
pub struct PromoConfig {
    /// Trailer text appended below the alert body.
    #[serde(default = "default_promo_trailer")]
    pub trailer: String,
    /// Video attached to alerts: a Telegram file id or URL. Empty sends
    /// plain text instead.
    #[serde(default)]
    pub video: String,
    /// Inline button label.
    #[serde(default = "default_promo_button_text")]
    pub button_text: String,
    /// Inline button target URL. Empty disables the button.
    #[serde(default)]
    pub button_url: String,
}

impl Default for PromoConfig {
    fn default() -> Self {
        Self {
            trailer: default_promo_trailer(),
            video: String::new(),
            button_text: default_promo_button_text(),
            button_url: String::new(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

const fn default_true() -> bool {
    true
}

fn default_indexer_base_url() -> String {
    "https://tonapi.io".to_string()
}

fn default_locator_base_url() -> String {
    "https://api.geckoterminal.com".to_string()
}

fn default_resolver_base_url() -> String {
    "https://toncenter.com/api/v2".to_string()
}

fn default_database_path() -> String {
    "tonrally.db".to_string()
}

const fn default_poll_interval_secs() -> u64 {
    7
}

const fn default_timeout_ms() -> u64 {
    10_000
}

const fn default_connect_timeout_ms() -> u64 {
    3_000
}

const fn default_retry_max_attempts() -> u32 {
    3
}

const fn default_retry_backoff_ms() -> u64 {
    500
}

const fn default_backup_interval_minutes() -> u64 {
    20
}

const fn default_leaderboard_size() -> usize {
    10
}

fn default_allowed_hours() -> Vec<u64> {
    vec![24, 48, 72]
}

const fn default_test_duration_secs() -> u64 {
    300
}

fn default_promo_trailer() -> String {
    "***AD SPACE***".to_string()
}

fn default_promo_button_text() -> String {
    "ADVERTISE HERE".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Config {
    #[allow(clippy::result_large_err)]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;

        let mut config: Self = toml::from_str(&content).map_err(ConfigError::Parse)?;
        config.apply_env();
        config.validate()?;

        Ok(config)
    }

    /// Defaults plus environment secrets, for running without a config file.
    #[allow(clippy::result_large_err)]
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    fn apply_env(&mut self) {
        // Secrets come from the environment, never from the config file.
        if let Ok(token) = std::env::var("TELEGRAM_BOT_TOKEN") {
            self.telegram.bot_token = token;
        }
        if let Ok(key) = std::env::var("TON_API_KEY") {
            self.indexer.api_key = key;
        }
    }

    #[allow(clippy::result_large_err)]
    fn validate(&self) -> Result<()> {
        if self.indexer.base_url.is_empty() {
            return Err(ConfigError::MissingField {
                field: "indexer.base_url",
            }
            .into());
        }
        if self.indexer.api_key.is_empty() {
            return Err(ConfigError::MissingField {
                field: "TON_API_KEY",
            }
            .into());
        }
        if self.telegram.enabled && self.telegram.bot_token.is_empty() {
            return Err(ConfigError::MissingField {
                field: "TELEGRAM_BOT_TOKEN",
            }
            .into());
        }
        if self.locator.base_url.is_empty() {
            return Err(ConfigError::MissingField {
                field: "locator.base_url",
            }
            .into());
        }
        if self.resolver.base_url.is_empty() {
            return Err(ConfigError::MissingField {
                field: "resolver.base_url",
            }
            .into());
        }
        if self.database.path.is_empty() {
            return Err(ConfigError::MissingField {
                field: "database.path",
            }
            .into());
        }
        if self.indexer.poll_interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "indexer.poll_interval_secs",
                reason: "must be at least 1 second".to_string(),
            }
            .into());
        }
        if self.backup.interval_minutes == 0 {
            return Err(ConfigError::InvalidValue {
                field: "backup.interval_minutes",
                reason: "must be at least 1 minute".to_string(),
            }
            .into());
        }
        if self.contest.leaderboard_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "contest.leaderboard_size",
                reason: "must list at least one row".to_string(),
            }
            .into());
        }
        if self.contest.allowed_hours.is_empty() || self.contest.allowed_hours.contains(&0) {
            return Err(ConfigError::InvalidValue {
                field: "contest.allowed_hours",
                reason: "must list at least one non-zero duration".to_string(),
            }
            .into());
        }
        Ok(())
    }

    pub fn init_logging(&self) {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&self.logging.level));

        match self.logging.format.as_str() {
            "json" => {
                fmt().json().with_env_filter(filter).init();
            }
            _ => {
                fmt().with_env_filter(filter).init();
            }
        }
    }
}
