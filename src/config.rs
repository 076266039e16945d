//! Quote service configuration
//!
//! `QuotesConfig` is validated once at construction and is immutable after
//! that. The request URL is assembled here so that every store variant queries
//! the exact same endpoint.

use std::time::Duration;
use thiserror::Error;

use crate::document::SOURCE_CURRENCY;

/// Host of the currencylayer API
pub const DEFAULT_BASE_URL: &str = "http://apilayer.net";

/// Default refresh interval in minutes
pub const DEFAULT_REFRESH_MINUTES: u64 = 60;

/// Default upper bound for a single quote request
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors raised while validating configuration
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The API key is empty or whitespace
    #[error("An API key is required")]
    MissingApiKey,

    /// No currencies were requested
    #[error("At least one currency ISO code is required")]
    NoCurrencies,

    /// One of the requested currencies is empty or whitespace
    #[error("Currency at position {0} is blank")]
    BlankCurrency(usize),
}

/// Settings shared by every quote store
#[derive(Debug, Clone)]
pub struct QuotesConfig {
    api_key: String,
    refresh_interval: u64,
    currencies: Vec<String>,
    base_url: String,
    request_timeout: Duration,
}

impl QuotesConfig {
    /// Creates a validated configuration
    ///
    /// # Arguments
    /// * `api_key` - The currencylayer access key
    /// * `refresh_minutes` - Minimum minutes between two fetches; the sign is ignored
    /// * `currencies` - ISO codes to request (e.g. "CHF", "eur")
    ///
    /// # Returns
    /// * `Ok(QuotesConfig)` if the key and currency list are usable
    /// * `Err(ConfigError)` otherwise
    pub fn new<I, S>(
        api_key: impl Into<String>,
        refresh_minutes: i64,
        currencies: I,
    ) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey);
        }

        let currencies = currencies
            .into_iter()
            .enumerate()
            .map(|(index, currency)| {
                let currency = currency.as_ref().trim();
                if currency.is_empty() {
                    Err(ConfigError::BlankCurrency(index))
                } else {
                    Ok(currency.to_uppercase())
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        if currencies.is_empty() {
            return Err(ConfigError::NoCurrencies);
        }

        Ok(Self {
            api_key,
            refresh_interval: refresh_minutes.unsigned_abs(),
            currencies,
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        })
    }

    /// Overrides the API host (tests, proxies)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Overrides the per-request timeout
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Minimum minutes between two fetches
    pub fn refresh_interval(&self) -> u64 {
        self.refresh_interval
    }

    /// Requested ISO codes, upper-cased
    pub fn currencies(&self) -> &[String] {
        &self.currencies
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// The `live` endpoint URL for the configured key and currencies
    pub fn live_url(&self) -> String {
        format!(
            "{}/api/live?access_key={}&currencies={}&source={}&format=1",
            self.base_url,
            self.api_key,
            self.currencies.join(","),
            SOURCE_CURRENCY
        )
    }
}
