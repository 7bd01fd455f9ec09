//! Configuration module for the sales race backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::{AddrParseError, SocketAddr};
use std::time::Duration;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Pre-shared key for API authentication (required in production)
    pub api_psk: Option<String>,
    /// Supabase project URL; without it the in-memory store is used
    pub supabase_url: Option<String>,
    /// Supabase API key, sent both as `apikey` and bearer token
    pub supabase_api_key: Option<String>,
    /// Remote table holding team members
    pub members_table: String,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// How long a checkpoint celebration stays visible
    pub celebration_window: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, AddrParseError> {
        dotenvy::dotenv().ok();

        let bind_addr = env::var("RACE_BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8080".to_string())
            .parse()?;

        let celebration_ms = env::var("RACE_CELEBRATION_MS")
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
            .unwrap_or(2000);

        Ok(Self {
            api_psk: non_empty_var("RACE_API_PSK"),
            supabase_url: non_empty_var("SUPABASE_URL"),
            supabase_api_key: non_empty_var("SUPABASE_API_KEY"),
            members_table: env::var("RACE_MEMBERS_TABLE")
                .unwrap_or_else(|_| "team_members".to_string()),
            bind_addr,
            log_level: env::var("RACE_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            celebration_window: Duration::from_millis(celebration_ms),
        })
    }

    /// Supabase credentials, if both URL and key are configured.
    pub fn supabase(&self) -> Option<(&str, &str)> {
        match (&self.supabase_url, &self.supabase_api_key) {
            (Some(url), Some(key)) => Some((url.as_str(), key.as_str())),
            _ => None,
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}
