use std::time::Duration;
use thiserror::Error;
use crate::api::exchangerate::ExchangeRateClient;
use crate::i18n::Locale;

const DEFAULT_DATABASE_URL: &str = "sqlite://currency_rates.db";
const DEFAULT_BASE_CURRENCY: &str = "USD";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} not set")]
    Missing(&'static str),
    #[error("Invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

/// Process configuration, loaded once at startup
#[derive(Debug, Clone)]
pub struct Config {
    pub discord_token: String,
    pub exchange_api_key: String,
    pub exchange_api_url: String,
    pub database_url: String,
    pub base_currency: String,
    pub locale: Locale,
    pub admin_ids: Vec<i64>,
    pub http_timeout: Duration,
}

impl Config {
    /// Load from `.env` and the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key lookup (the environment in production)
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let discord_token = non_empty("DISCORD_TOKEN").ok_or(ConfigError::Missing("DISCORD_TOKEN"))?;
        let exchange_api_key = non_empty("EXCHANGE_API_KEY").ok_or(ConfigError::Missing("EXCHANGE_API_KEY"))?;

        let exchange_api_url = non_empty("EXCHANGE_API_URL")
            .unwrap_or_else(|| ExchangeRateClient::DEFAULT_BASE_URL.to_string());
        let database_url = non_empty("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());

        let base_currency = non_empty("BASE_CURRENCY")
            .unwrap_or_else(|| DEFAULT_BASE_CURRENCY.to_string())
            .to_uppercase();
        if !base_currency.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(ConfigError::Invalid { key: "BASE_CURRENCY", value: base_currency });
        }

        let locale = match non_empty("BOT_LOCALE") {
            Some(value) => value
                .parse::<Locale>()
                .map_err(|_| ConfigError::Invalid { key: "BOT_LOCALE", value })?,
            None => Locale::default(),
        };

        let admin_ids = match non_empty("ADMIN_IDS") {
            Some(value) => value
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| s.parse::<i64>())
                .collect::<Result<Vec<_>, _>>()
                .map_err(|_| ConfigError::Invalid { key: "ADMIN_IDS", value: value.clone() })?,
            None => Vec::new(),
        };

        let http_timeout = match non_empty("HTTP_TIMEOUT_SECS") {
            Some(value) => value
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| ConfigError::Invalid { key: "HTTP_TIMEOUT_SECS", value })?,
            None => Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        };

        Ok(Config {
            discord_token,
            exchange_api_key,
            exchange_api_url,
            database_url,
            base_currency,
            locale,
            admin_ids,
            http_timeout,
        })
    }

    /// True when `user_id` may run admin commands. An empty admin list leaves them open.
    pub fn is_admin(&self, user_id: i64) -> bool {
        self.admin_ids.is_empty() || self.admin_ids.contains(&user_id)
    }
}
