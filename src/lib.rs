//! USD exchange rate quotes
//!
//! Fetches USD-based quotes from the currencylayer API, caches them in a file
//! or in memory for a configurable refresh interval and converts USD amounts.

pub mod cache;
pub mod cli;
pub mod config;
pub mod document;
pub mod fetch;
pub mod quotes;
pub mod shell;

pub use cache::{FileQuotes, MemoryQuotes, QuoteCache, QuoteError, NO_QUOTE};
pub use config::{ConfigError, QuotesConfig};
pub use quotes::CurrencyQuotes;
