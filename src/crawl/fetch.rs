// src/crawl/fetch.rs
// =============================================================================
// This module fetches pages for the crawler.
//
// The crawler only needs one capability: "give me the body of this address,
// or tell me it failed". That's the Fetcher trait. The real implementation
// wraps a reqwest Client; tests swap in an in-memory fake.
//
// Failure handling is intentionally flat: a timeout, a DNS error and a 404
// all become a FetchError, and the crawler skips the address either way.
// =============================================================================

use reqwest::Client;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

// Seconds before a single page request is abandoned
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// A successfully fetched page.
#[derive(Debug, Clone)]
pub struct Page {
    pub status: u16,
    pub body: String,
}

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP {0}")]
    Status(u16),
}

/// Fetches one address. Non-success statuses are errors.
pub trait Fetcher {
    fn fetch(&self, address: &str) -> impl Future<Output = Result<Page, FetchError>> + Send;
}

/// Fetcher backed by a shared reqwest client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;

        Ok(Self { client })
    }
}

impl Fetcher for HttpFetcher {
    async fn fetch(&self, address: &str) -> Result<Page, FetchError> {
        let response = self.client.get(address).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        Ok(Page {
            status: status.as_u16(),
            body,
        })
    }
}
