//! Quote document model
//!
//! The document is the unit that gets cached: it mirrors the JSON body of the
//! currencylayer `live` endpoint and is persisted in the same shape.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Base currency of every quote. The free API plan does not allow another one.
pub const SOURCE_CURRENCY: &str = "USD";

/// Timestamp of the built-in default document
pub const DEFAULT_TIMESTAMP: &str = "07/07/2018 01:00:00";

/// Quotes of the built-in default document (an excerpt from 2018-07-07)
const DEFAULT_QUOTES: [(&str, f64); 6] = [
    ("USDCHF", 0.989304),
    ("USDGBP", 0.75252),
    ("USDCAD", 1.307904),
    ("USDAUD", 1.345204),
    ("USDCZK", 22.01804),
    ("USDRUB", 62.925201),
];

/// Naive layouts accepted for string timestamps, read as UTC
const NAIVE_FORMATS: [&str; 4] = [
    "%m/%d/%Y %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
];

/// Refresh time of a document
///
/// Cached documents carry a formatted date-time string, while the remote API
/// reports a UNIX epoch. Both are accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Timestamp {
    Epoch(i64),
    Text(String),
}

impl Timestamp {
    /// Formats `at` as an RFC 3339 string
    pub fn at(at: DateTime<Utc>) -> Self {
        Timestamp::Text(at.to_rfc3339_opts(SecondsFormat::Micros, true))
    }

    /// Parses the timestamp into a UTC date-time
    ///
    /// Returns `None` if the value matches none of the supported layouts.
    pub fn parse(&self) -> Option<DateTime<Utc>> {
        match self {
            Timestamp::Epoch(secs) => Utc.timestamp_opt(*secs, 0).single(),
            Timestamp::Text(text) => parse_text(text.trim()),
        }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Timestamp::Epoch(secs) => write!(f, "{}", secs),
            Timestamp::Text(text) => write!(f, "{}", text),
        }
    }
}

fn parse_text(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.with_timezone(&Utc));
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .map(|naive| naive.and_utc())
}

/// Cached exchange rate document
///
/// All fields are optional so that a structurally broken payload still parses
/// and can be reported precisely by the quote lookup. Unknown top-level
/// fields (`success`, `terms`, `error`, ...) are preserved as received.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuoteDocument {
    /// When the document was last refreshed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Timestamp>,
    /// Base currency, always "USD"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Rates keyed by concatenated pair code, e.g. "USDCHF"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quotes: Option<BTreeMap<String, f64>>,
    /// Remaining fields of the API payload
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl QuoteDocument {
    /// The document used before the first successful fetch
    pub fn fallback() -> Self {
        let quotes = DEFAULT_QUOTES
            .iter()
            .map(|(pair, rate)| (pair.to_string(), *rate))
            .collect();

        Self {
            timestamp: Some(Timestamp::Text(DEFAULT_TIMESTAMP.to_string())),
            source: Some(SOURCE_CURRENCY.to_string()),
            quotes: Some(quotes),
            extra: Map::new(),
        }
    }

    /// Parsed refresh time, if present and well-formed
    pub fn refreshed_at(&self) -> Option<DateTime<Utc>> {
        self.timestamp.as_ref().and_then(Timestamp::parse)
    }

    /// Rewrites the refresh time
    pub fn stamp(&mut self, at: DateTime<Utc>) {
        self.timestamp = Some(Timestamp::at(at));
    }

    /// True when the document carries nothing besides a timestamp
    pub fn is_empty(&self) -> bool {
        self.source.is_none() && self.quotes.is_none() && self.extra.is_empty()
    }
}

/// Builds the quote key for a currency, e.g. "chf" -> "USDCHF"
pub fn quote_key(currency: &str) -> String {
    format!("{}{}", SOURCE_CURRENCY, currency.to_uppercase())
}
