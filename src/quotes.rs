//! Currency quote capability

use async_trait::async_trait;

use crate::cache::QuoteError;

/// Live USD exchange rates with a refresh cache
///
/// Two kinds of failure are reported separately. Expected problems (an empty
/// currency code, a failed fetch) produce the `NO_QUOTE` sentinel (`-1.0`)
/// inside `Ok`. Broken data produces `Err(QuoteError)`, which callers should
/// treat as unrecoverable.
///
/// Free API plans have hard request limits, so implementations only query the
/// remote API once the refresh interval has passed.
#[async_trait]
pub trait CurrencyQuotes: Send {
    /// Refreshes the cached quotes if the refresh interval has elapsed
    ///
    /// Returns `Ok(false)` if a fetch was attempted and failed.
    async fn refresh(&mut self) -> Result<bool, QuoteError>;

    /// Gets the USD-to-`currency` quote
    async fn conversion_quote(&mut self, currency: &str) -> Result<f64, QuoteError>;

    /// Converts `amount` USD into `currency`; the sign of `amount` is ignored
    async fn convert_from_usd(&mut self, currency: &str, amount: f64) -> Result<f64, QuoteError>;
}
