// src/usage/fetch.rs
// =============================================================================
// This module tallies this month's notification deliveries by channel.
//
// Strategy:
// - Page through the notifications API, newest first, `limit` at a time
// - Add up platform_delivery_stats for every notification
// - Stop at the first notification completed before the start of the
//   current UTC month (everything after it is older still), or at an
//   empty page
//
// Auth is a plain "Authorization: Basic <api key>" header; the key is sent
// as-is, not base64-encoded user:password.
// =============================================================================

use crate::config::UsageConfig;
use chrono::{DateTime, Datelike, TimeZone, Utc};
use reqwest::header::AUTHORIZATION;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum UsageError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("notifications API returned HTTP {0}")]
    Status(u16),
}

/// Delivery totals per channel.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UsageTally {
    pub mobile_push: u64,
    pub web_push: u64,
    pub email: u64,
    pub sms: u64,
}

impl UsageTally {
    pub fn total(&self) -> u64 {
        self.mobile_push + self.web_push + self.email + self.sms
    }

    fn add(&mut self, stats: &HashMap<String, Value>) {
        let count = |key: &str| stats.get(key).and_then(Value::as_u64).unwrap_or(0);

        self.mobile_push += count("push");
        self.web_push += count("web_push");
        self.email += count("email");
        self.sms += count("sms");
    }
}

#[derive(Debug, Deserialize)]
struct NotificationPage {
    #[serde(default)]
    notifications: Vec<Notification>,
}

#[derive(Debug, Deserialize)]
struct Notification {
    // Unix seconds, possibly fractional; missing or null counts as the epoch
    #[serde(default)]
    completed_at: Option<f64>,
    #[serde(default)]
    platform_delivery_stats: Option<HashMap<String, Value>>,
}

// 00:00:00 UTC on the first day of `now`'s month
pub fn month_start(now: DateTime<Utc>) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(now.year(), now.month(), 1, 0, 0, 0)
        .single()
        .unwrap_or(now)
}

pub struct UsageClient {
    client: Client,
    config: UsageConfig,
}

impl UsageClient {
    pub fn new(config: UsageConfig) -> Result<Self, UsageError> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self { client, config })
    }

    // Sums deliveries from the start of `now`'s month up to the newest notification
    pub async fn fetch_usage(&self, now: DateTime<Utc>) -> Result<UsageTally, UsageError> {
        let cutoff = month_start(now).timestamp() as f64;
        let mut tally = UsageTally::default();
        let mut offset: u64 = 0;

        loop {
            let page = self.fetch_page(offset).await?;
            if page.notifications.is_empty() {
                debug!("Empty page at offset {}, done", offset);
                break;
            }

            for notification in &page.notifications {
                if notification.completed_at.unwrap_or(0.0) < cutoff {
                    info!("Reached notifications from before {}", month_start(now));
                    return Ok(tally);
                }
                if let Some(stats) = &notification.platform_delivery_stats {
                    tally.add(stats);
                }
            }

            offset += u64::from(self.config.page_limit);
            tokio::time::sleep(self.config.page_delay).await;
        }

        Ok(tally)
    }

    async fn fetch_page(&self, offset: u64) -> Result<NotificationPage, UsageError> {
        debug!("Fetching notifications at offset {}", offset);

        let response = self
            .client
            .get(&self.config.endpoint)
            .query(&[
                ("app_id", self.config.app_id.clone()),
                ("limit", self.config.page_limit.to_string()),
                ("offset", offset.to_string()),
            ])
            .header(AUTHORIZATION, format!("Basic {}", self.config.api_key))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(UsageError::Status(response.status().as_u16()));
        }

        Ok(response.json().await?)
    }
}
