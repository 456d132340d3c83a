//! Process configuration, read once from the environment at start-up.
//!
//! A missing required value is fatal and terminates the run; it is never a
//! per-item skip.

use anyhow::Context;
use tracing::info;

#[derive(Debug, Clone)]
pub struct Config {
    pub chatbase: ChatbaseConfig,
    pub database: DatabaseConfig,
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Clone)]
pub struct ChatbaseConfig {
    pub api_key: String,
    pub bot_id: String,
    /// Base URL override for the provider API.
    pub base_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Postgres DSN; carries the service credential.
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Tag written on every interaction record.
    pub interaction_type: String,
    /// Trailing window size when no explicit bounds are given.
    pub window_hours: i64,
    /// Provider page size; only the first page is ever fetched.
    pub page_size: u32,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let config = Self {
            chatbase: ChatbaseConfig {
                api_key: require("CHATBASE_API_KEY")?,
                bot_id: require("CHATBASE_BOT_ID")?,
                base_url: optional("CHATBASE_API_URL"),
            },
            database: DatabaseConfig {
                url: require("DATABASE_URL")?,
            },
            pipeline: PipelineConfig {
                interaction_type: optional("INTERACTION_TYPE")
                    .unwrap_or_else(|| "chatbase_summary".to_string()),
                window_hours: parse_or("WINDOW_HOURS", 1)?,
                page_size: parse_or("PAGE_SIZE", 50)?,
            },
        };

        info!("Loaded configuration from environment");
        Ok(config)
    }
}

fn require(name: &str) -> anyhow::Result<String> {
    optional(name).ok_or_else(|| anyhow::anyhow!("Missing required environment variable: {name}"))
}

fn optional(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
}

fn parse_or<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    optional(name).map_or(Ok(default), |raw| {
        raw.parse::<T>()
            .with_context(|| format!("Invalid value for {name}: {raw}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_required_variable_is_an_error() {
        let result = require("CHATSINK_TEST_SURELY_UNSET");
        assert!(result.is_err());
    }

    #[test]
    fn unset_optional_falls_back_to_default() {
        let hours: i64 = parse_or("CHATSINK_TEST_SURELY_UNSET", 1).unwrap_or(0);
        assert_eq!(hours, 1);
    }
}
