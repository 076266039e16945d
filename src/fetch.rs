//! Remote quote fetching
//!
//! `QuoteFetcher` is the seam between the cache engine and the network.
//! `HttpFetcher` is the production implementation on top of `reqwest`.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Errors that can occur when fetching quotes
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP request failed (connection, timeout, body read)
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// The API answered with a non-success status
    #[error("Unexpected HTTP status: {0}")]
    Status(u16),
}

/// Retrieves the raw quote document body from a URL
#[async_trait]
pub trait QuoteFetcher: Send + Sync {
    /// Issues one GET request and returns the response body
    ///
    /// Non-success statuses are reported as `FetchError::Status`.
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// Fetches quotes over HTTP with a bounded request time
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Creates a fetcher whose requests give up after `timeout`
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    /// Creates a fetcher around an existing client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl QuoteFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        debug!(status = status.as_u16(), "Quote API responded");

        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        Ok(response.text().await?)
    }
}
