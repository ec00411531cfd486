//! Configuration loading
//!
//! Resolution priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! Timing values keep their original environment names (STATS_CACHE_TTL,
//! STATS_HISTORY_RETENTION, ...) so existing deployments carry over.

use clap::Parser;
use serde::Deserialize;
use std::path::PathBuf;
use tracing::warn;

use crate::error::{Error, Result};

/// Command-line arguments
#[derive(Debug, Parser)]
#[command(name = "fanpulse", version, about = "Follower-count milestone tracker")]
pub struct Args {
    /// Path to TOML config file
    #[arg(long, env = "FANPULSE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Bind address for the HTTP API
    #[arg(long, env = "FANPULSE_BIND")]
    pub bind: Option<String>,

    /// Path to the SQLite database file
    #[arg(long, env = "FANPULSE_DB")]
    pub database: Option<PathBuf>,
}

/// Service configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP bind address
    pub bind: String,
    /// SQLite database path
    pub database: PathBuf,

    /// TTL of the current-stats cache, seconds
    pub stats_cache_ttl_secs: i64,
    /// Retention window for the stats history log, days
    pub stats_history_retention_days: i64,
    /// Minimum interval between history appends per platform, seconds.
    /// Caps chart resolution independent of fetch frequency.
    pub history_min_interval_secs: i64,
    /// Retention window for the milestone audit log, days
    pub milestone_history_retention_days: i64,
    /// TTL of the milestone cursor, days (refreshed on every advance)
    pub milestone_cursor_ttl_days: i64,
    /// Per-request timeout for outbound HTTP calls, seconds
    pub api_timeout_secs: i64,

    /// Dashboard link appended to broadcast messages
    pub dashboard_url: Option<String>,

    /// YouTube Data API key
    pub youtube_api_key: Option<String>,
    /// YouTube channel id
    pub youtube_channel_id: Option<String>,
    /// Public Telegram channel username (with or without leading '@')
    pub telegram_channel: Option<String>,
    /// JSON endpoint returning `{"followersCount": N}` for Instagram
    pub instagram_stats_url: Option<String>,
    /// Telegram bot token used for broadcast sends
    pub telegram_bot_token: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:5730".to_string(),
            database: PathBuf::from("fanpulse.db"),
            stats_cache_ttl_secs: 86_400,         // 24 hours
            stats_history_retention_days: 90,
            history_min_interval_secs: 7_200,     // 2 hours
            milestone_history_retention_days: 30,
            milestone_cursor_ttl_days: 365,
            api_timeout_secs: 30,
            dashboard_url: None,
            youtube_api_key: None,
            youtube_channel_id: None,
            telegram_channel: None,
            instagram_stats_url: None,
            telegram_bot_token: None,
        }
    }
}

/// TTL/retention/throttle parameters for the stats store, in milliseconds
#[derive(Debug, Clone, Copy)]
pub struct StatsPolicy {
    pub cache_ttl_ms: i64,
    pub history_retention_ms: i64,
    pub history_min_interval_ms: i64,
}

/// TTL/retention parameters for the milestone cursor store, in milliseconds
#[derive(Debug, Clone, Copy)]
pub struct MilestonePolicy {
    pub cursor_ttl_ms: i64,
    pub history_retention_ms: i64,
}

impl Config {
    /// Load configuration following the cli > env > file > default order
    pub fn load(args: &Args) -> Result<Config> {
        let mut config = match &args.config {
            Some(path) => {
                let content = std::fs::read_to_string(path).map_err(|e| {
                    Error::Config(format!("cannot read {}: {}", path.display(), e))
                })?;
                toml::from_str(&content)
                    .map_err(|e| Error::Config(format!("invalid config file: {}", e)))?
            }
            None => Config::default(),
        };

        config.apply_env();

        if let Some(bind) = &args.bind {
            config.bind = bind.clone();
        }
        if let Some(database) = &args.database {
            config.database = database.clone();
        }

        Ok(config)
    }

    /// Overlay environment variables onto the loaded configuration
    fn apply_env(&mut self) {
        if let Some(v) = env_i64("STATS_CACHE_TTL") {
            self.stats_cache_ttl_secs = v;
        }
        if let Some(v) = env_i64("STATS_HISTORY_RETENTION") {
            self.stats_history_retention_days = v;
        }
        if let Some(v) = env_i64("MILESTONE_CHECK_THROTTLE") {
            self.history_min_interval_secs = v;
        }
        if let Some(v) = env_i64("MILESTONE_HISTORY_RETENTION") {
            self.milestone_history_retention_days = v;
        }
        if let Some(v) = env_i64("API_TIMEOUT") {
            self.api_timeout_secs = v;
        }
        if let Ok(v) = std::env::var("DASHBOARD_URL") {
            self.dashboard_url = Some(v);
        }
        if let Ok(v) = std::env::var("YOUTUBE_API_KEY") {
            self.youtube_api_key = Some(v);
        }
        if let Ok(v) = std::env::var("YOUTUBE_CHANNEL_ID") {
            self.youtube_channel_id = Some(v);
        }
        if let Ok(v) = std::env::var("TELEGRAM_CHANNEL_USERNAME") {
            self.telegram_channel = Some(v);
        }
        if let Ok(v) = std::env::var("INSTAGRAM_STATS_URL") {
            self.instagram_stats_url = Some(v);
        }
        if let Ok(v) = std::env::var("TELEGRAM_BOT_TOKEN") {
            self.telegram_bot_token = Some(v);
        }
    }

    pub fn api_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.api_timeout_secs.max(1) as u64)
    }

    pub fn stats_policy(&self) -> StatsPolicy {
        StatsPolicy {
            cache_ttl_ms: self.stats_cache_ttl_secs * 1_000,
            history_retention_ms: self.stats_history_retention_days * 86_400_000,
            history_min_interval_ms: self.history_min_interval_secs * 1_000,
        }
    }

    pub fn milestone_policy(&self) -> MilestonePolicy {
        MilestonePolicy {
            cursor_ttl_ms: self.milestone_cursor_ttl_days * 86_400_000,
            history_retention_ms: self.milestone_history_retention_days * 86_400_000,
        }
    }
}

fn env_i64(name: &str) -> Option<i64> {
    match std::env::var(name) {
        Ok(raw) => match raw.parse::<i64>() {
            Ok(v) => Some(v),
            Err(_) => {
                warn!("Ignoring {}: not a number ({:?})", name, raw);
                None
            }
        },
        Err(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.stats_cache_ttl_secs, 86_400);
        assert_eq!(config.stats_history_retention_days, 90);
        assert_eq!(config.history_min_interval_secs, 7_200);
        assert_eq!(config.milestone_history_retention_days, 30);
        assert_eq!(config.api_timeout_secs, 30);
    }

    #[test]
    fn test_toml_overrides_defaults() {
        let config: Config = toml::from_str(
            r#"
            bind = "0.0.0.0:8080"
            stats_cache_ttl_secs = 600
            telegram_channel = "@example"
            "#,
        )
        .unwrap();
        assert_eq!(config.bind, "0.0.0.0:8080");
        assert_eq!(config.stats_cache_ttl_secs, 600);
        assert_eq!(config.telegram_channel.as_deref(), Some("@example"));
        // Untouched fields keep defaults
        assert_eq!(config.stats_history_retention_days, 90);
    }

    #[test]
    fn test_policy_conversion() {
        let config = Config::default();
        let policy = config.stats_policy();
        assert_eq!(policy.cache_ttl_ms, 86_400_000);
        assert_eq!(policy.history_retention_ms, 90 * 86_400_000);
        assert_eq!(policy.history_min_interval_ms, 7_200_000);
    }
}
