// src/config.rs
// =============================================================================
// Explicit configuration values, built once in main and passed down.
//
// - CrawlConfig: where to start, how far to go, where to save
// - MailConfig: relay, login and the message to send
// - UsageConfig: notifications API credentials (from the environment)
//
// Environment lookups go through a `lookup` closure so tests can feed in
// their own values without touching the process environment.
// =============================================================================

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_MAX_PAGES: usize = 100;
pub const DEFAULT_SMTP_RELAY: &str = "smtp.gmail.com";
pub const DEFAULT_SMTP_PORT: u16 = 587;
pub const DEFAULT_USAGE_ENDPOINT: &str = "https://onesignal.com/api/v1/notifications";

#[derive(Debug, Clone)]
pub struct CrawlConfig {
    pub start_url: String,
    pub max_pages: usize,
    pub output: PathBuf,
}

#[derive(Debug, Clone)]
pub struct MailConfig {
    pub relay: String,
    pub port: u16,
    /// Login name; also used as the From address
    pub username: String,
    pub password: String,
    pub subject: String,
    pub body: String,
}

impl MailConfig {
    // SMTP_RELAY / SMTP_PORT override the default relay
    pub fn from_lookup<F>(
        username: String,
        password: String,
        subject: String,
        body: String,
        lookup: F,
    ) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let relay = lookup("SMTP_RELAY").unwrap_or_else(|| DEFAULT_SMTP_RELAY.to_string());
        let port = match lookup("SMTP_PORT") {
            Some(port) => port.parse().context("SMTP_PORT must be a valid port number")?,
            None => DEFAULT_SMTP_PORT,
        };

        Ok(Self {
            relay,
            port,
            username,
            password,
            subject,
            body,
        })
    }
}

#[derive(Debug, Clone)]
pub struct UsageConfig {
    pub app_id: String,
    pub api_key: String,
    pub endpoint: String,
    /// Notifications requested per page
    pub page_limit: u32,
    /// Pause between page requests
    pub page_delay: Duration,
}

impl UsageConfig {
    /// Load configuration from environment variables (and `.env` if present).
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            app_id: lookup("ONESIGNAL_APP_ID").context("ONESIGNAL_APP_ID must be set")?,
            api_key: lookup("ONESIGNAL_API_KEY").context("ONESIGNAL_API_KEY must be set")?,
            endpoint: lookup("ONESIGNAL_API_URL")
                .unwrap_or_else(|| DEFAULT_USAGE_ENDPOINT.to_string()),
            page_limit: 50,
            page_delay: Duration::from_millis(200),
        })
    }
}
