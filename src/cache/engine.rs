//! Refresh gate and quote lookup
//!
//! `QuoteCache` owns one quote document, refreshes it from the remote API at
//! most once per configured interval and answers lookups from it.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::{FileStore, MemoryStore, QuoteStore};
use crate::config::QuotesConfig;
use crate::document::{quote_key, QuoteDocument, SOURCE_CURRENCY};
use crate::fetch::{FetchError, HttpFetcher, QuoteFetcher};
use crate::quotes::CurrencyQuotes;

/// Returned instead of a quote when the currency is missing or the refresh failed
pub const NO_QUOTE: f64 = -1.0;

/// USD amount converted when the caller does not give one
pub const DEFAULT_AMOUNT: f64 = 1.0;

/// Unrecoverable errors: the cached or fetched data is unusable
#[derive(Debug, Error)]
pub enum QuoteError {
    /// The document timestamp is missing or cannot be parsed
    #[error("Failed to parse quote document timestamp: {0}")]
    InvalidTimestamp(String),

    /// The document has no content
    #[error("Quote document is empty")]
    EmptyDocument,

    /// The document has no quotes
    #[error("Quote document has no quotes")]
    MissingQuotes,

    /// The requested pair is not part of the document
    #[error("Exchange quote '{0}' does not exist")]
    UnknownQuote(String),

    /// The requested pair has a zero or negative rate
    #[error("Exchange quote '{0}' is not positive")]
    NonPositiveQuote(String),

    /// A fetched quote is not based on the source currency
    #[error("Exchange quote '{0}' is not a USD quote")]
    ForeignQuote(String),

    /// The document is not valid JSON of the expected shape
    #[error("Malformed quote document: {0}")]
    MalformedDocument(#[from] serde_json::Error),

    /// The cache file could not be read or written
    #[error("Quote cache I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The HTTP client could not be built
    #[error("Failed to create HTTP client: {0}")]
    Client(#[from] FetchError),
}

/// Quote cache persisted to a JSON file
pub type FileQuotes = QuoteCache<FileStore, HttpFetcher>;

/// Quote cache kept in process memory
pub type MemoryQuotes = QuoteCache<MemoryStore, HttpFetcher>;

/// Caching quote service over a persistence strategy and a fetcher
#[derive(Debug)]
pub struct QuoteCache<S, F = HttpFetcher> {
    /// Fully assembled request URL
    url: String,
    /// Minimum time between two fetches
    refresh_interval: Duration,
    store: S,
    fetcher: F,
    /// Document seen by the last refresh
    document: Option<QuoteDocument>,
}

impl QuoteCache<FileStore, HttpFetcher> {
    /// Creates a file-backed cache using the default `currencies.json`
    pub fn file_backed(config: &QuotesConfig) -> Result<Self, QuoteError> {
        Self::file_backed_at(config, FileStore::default())
    }

    /// Creates a file-backed cache on a specific store
    pub fn file_backed_at(config: &QuotesConfig, store: FileStore) -> Result<Self, QuoteError> {
        let fetcher = HttpFetcher::new(config.request_timeout())?;
        Ok(Self::with_parts(config, store, fetcher))
    }
}

impl QuoteCache<MemoryStore, HttpFetcher> {
    /// Creates a cache that never touches the filesystem
    pub fn in_memory(config: &QuotesConfig) -> Result<Self, QuoteError> {
        let fetcher = HttpFetcher::new(config.request_timeout())?;
        Ok(Self::with_parts(config, MemoryStore::new(), fetcher))
    }
}

impl<S: QuoteStore, F: QuoteFetcher> QuoteCache<S, F> {
    /// Wires a cache from arbitrary store and fetcher implementations
    pub fn with_parts(config: &QuotesConfig, store: S, fetcher: F) -> Self {
        // Minutes beyond i64::MAX effectively mean "never refresh"
        let minutes = i64::try_from(config.refresh_interval()).unwrap_or(i64::MAX);
        let refresh_interval = Duration::try_minutes(minutes).unwrap_or(Duration::MAX);

        Self {
            url: config.live_url(),
            refresh_interval,
            store,
            fetcher,
            document: None,
        }
    }

    /// The document seen by the last refresh, if any
    pub fn document(&self) -> Option<&QuoteDocument> {
        self.document.as_ref()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Runs the refresh gate as of `now`
    ///
    /// # Returns
    /// * `Ok(true)` - the cache is fresh or was refreshed
    /// * `Ok(false)` - a fetch was needed and failed; the stale document is kept
    /// * `Err(QuoteError)` - the cached or fetched document is unusable
    pub async fn refresh_at(&mut self, now: DateTime<Utc>) -> Result<bool, QuoteError> {
        let document = self.store.load()?;
        let refreshed_at = document.refreshed_at().ok_or_else(|| {
            QuoteError::InvalidTimestamp(
                document
                    .timestamp
                    .as_ref()
                    .map_or_else(|| "missing".to_string(), ToString::to_string),
            )
        })?;
        self.document = Some(document);

        if now.signed_duration_since(refreshed_at) <= self.refresh_interval {
            debug!(%refreshed_at, "Quote cache is fresh");
            return Ok(true);
        }

        info!(%refreshed_at, "Quote cache is stale, fetching quotes");
        let body = match self.fetcher.fetch(&self.url).await {
            Ok(body) => body,
            Err(e) => {
                warn!(error = %e, "Quote fetch failed, keeping cached quotes");
                return Ok(false);
            }
        };

        let mut fresh: QuoteDocument = serde_json::from_str(&body)?;
        // API error payloads arrive with a success status and must not replace cached quotes
        if let Err(e) = check_fetched(&fresh) {
            warn!(error = %e, "Rejecting fetched quote document");
            return Err(e);
        }
        fresh.stamp(now);
        self.store.save(&fresh)?;
        self.document = Some(fresh);

        Ok(true)
    }

    /// Looks up the USD rate for `currency` in the cached document
    fn lookup(&self, currency: &str) -> Result<f64, QuoteError> {
        let document = self.document.as_ref().ok_or(QuoteError::EmptyDocument)?;
        if document.is_empty() {
            return Err(QuoteError::EmptyDocument);
        }

        let quotes = document
            .quotes
            .as_ref()
            .filter(|quotes| !quotes.is_empty())
            .ok_or(QuoteError::MissingQuotes)?;

        let key = quote_key(currency);
        match quotes.get(&key) {
            None => Err(QuoteError::UnknownQuote(key)),
            Some(&quote) if quote <= f64::EPSILON => Err(QuoteError::NonPositiveQuote(key)),
            Some(&quote) => Ok(quote),
        }
    }
}

/// Verifies a fetched document before it may replace the cached one
fn check_fetched(document: &QuoteDocument) -> Result<(), QuoteError> {
    if document.is_empty() {
        return Err(QuoteError::EmptyDocument);
    }

    let quotes = document
        .quotes
        .as_ref()
        .filter(|quotes| !quotes.is_empty())
        .ok_or(QuoteError::MissingQuotes)?;

    match quotes.keys().find(|key| !key.starts_with(SOURCE_CURRENCY)) {
        Some(key) => Err(QuoteError::ForeignQuote(key.clone())),
        None => Ok(()),
    }
}

#[async_trait]
impl<S: QuoteStore, F: QuoteFetcher> CurrencyQuotes for QuoteCache<S, F> {
    async fn refresh(&mut self) -> Result<bool, QuoteError> {
        self.refresh_at(Utc::now()).await
    }

    async fn conversion_quote(&mut self, currency: &str) -> Result<f64, QuoteError> {
        if currency.is_empty() || !self.refresh().await? {
            return Ok(NO_QUOTE);
        }

        self.lookup(currency)
    }

    async fn convert_from_usd(&mut self, currency: &str, amount: f64) -> Result<f64, QuoteError> {
        if currency.is_empty() {
            return Ok(NO_QUOTE);
        }

        let amount = amount.abs();
        let quote = self.conversion_quote(currency).await?;
        if quote < 0.0 {
            return Ok(NO_QUOTE);
        }

        Ok(quote * amount)
    }
}
