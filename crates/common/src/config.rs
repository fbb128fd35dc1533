use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

/// Default Practicum homework status endpoint.
pub const DEFAULT_PRACTICUM_ENDPOINT: &str =
    "https://practicum.yandex.ru/api/user_api/homework_statuses/";

/// Default Telegram Bot API base URL.
pub const DEFAULT_TELEGRAM_API_URL: &str = "https://api.telegram.org";

/// Default pause between poll cycles, in seconds.
pub const DEFAULT_RETRY_INTERVAL_SECS: u64 = 600;

/// Longest accepted pause between poll cycles (one week).
pub const MAX_RETRY_INTERVAL_SECS: u64 = 7 * 24 * 60 * 60;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// OAuth token presented to the Practicum API
    pub practicum_token: String,

    /// Telegram bot token used for delivery
    pub telegram_token: String,

    /// Telegram chat that receives every notification
    pub telegram_chat_id: String,

    /// Homework status endpoint
    pub practicum_endpoint: String,

    /// Telegram Bot API base URL (overridable for local testing)
    pub telegram_api_url: String,

    /// Pause between poll cycles in seconds (default: 600)
    pub retry_interval_secs: u64,
}

impl AppConfig {
    /// Load configuration from the process environment, reading `.env` first if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    ///
    /// Required tokens are checked in a fixed order and the first one that is
    /// absent or empty is reported.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |var: &'static str| {
            lookup(var)
                .filter(|value| !value.trim().is_empty())
                .ok_or(ConfigError::Missing(var))
        };

        let practicum_token = required("PRACTICUM_TOKEN")?;
        let telegram_token = required("TELEGRAM_TOKEN")?;
        let telegram_chat_id = required("TELEGRAM_CHAT_ID")?;

        let retry_interval_secs = match lookup("RETRY_INTERVAL_SECS") {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(0) => {
                    return Err(ConfigError::Invalid {
                        var: "RETRY_INTERVAL_SECS",
                        reason: "must be greater than zero".to_string(),
                    });
                }
                Ok(secs) if secs > MAX_RETRY_INTERVAL_SECS => {
                    return Err(ConfigError::Invalid {
                        var: "RETRY_INTERVAL_SECS",
                        reason: format!("must be at most {MAX_RETRY_INTERVAL_SECS}"),
                    });
                }
                Ok(secs) => secs,
                Err(e) => {
                    return Err(ConfigError::Invalid {
                        var: "RETRY_INTERVAL_SECS",
                        reason: e.to_string(),
                    });
                }
            },
            None => DEFAULT_RETRY_INTERVAL_SECS,
        };

        Ok(Self {
            practicum_token,
            telegram_token,
            telegram_chat_id,
            practicum_endpoint: lookup("PRACTICUM_ENDPOINT")
                .unwrap_or_else(|| DEFAULT_PRACTICUM_ENDPOINT.to_string()),
            telegram_api_url: lookup("TELEGRAM_API_URL")
                .unwrap_or_else(|| DEFAULT_TELEGRAM_API_URL.to_string()),
            retry_interval_secs,
        })
    }

    pub fn retry_interval(&self) -> Duration {
        Duration::from_secs(self.retry_interval_secs)
    }
}
