//! Command-line interface for usdquotes
//!
//! Parses arguments with clap, turns them into a validated `QuotesConfig` and
//! a quote store, and runs one command against the `CurrencyQuotes`
//! capability.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::cache::{FileStore, QuoteError, DEFAULT_AMOUNT, NO_QUOTE};
use crate::config::{ConfigError, QuotesConfig, DEFAULT_REFRESH_MINUTES};
use crate::quotes::CurrencyQuotes;

/// Error types for CLI argument handling
#[derive(Debug, Error)]
pub enum CliError {
    /// The arguments do not form a valid configuration
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// `--user-cache` was given but no home directory exists
    #[error("Could not determine a user cache directory")]
    NoUserCache,
}

/// Where the quote document is kept between lookups
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StoreKind {
    /// JSON file on disk
    File,
    /// Process memory only (always fetches on first use)
    Memory,
}

/// usdquotes - USD exchange rates from currencylayer
#[derive(Parser, Debug)]
#[command(name = "usdquotes")]
#[command(about = "USD exchange rate quotes and conversions")]
#[command(version)]
pub struct Cli {
    /// currencylayer access key
    #[arg(long, env = "USDQUOTES_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Minutes before cached quotes are fetched again (sign is ignored)
    #[arg(long, default_value_t = DEFAULT_REFRESH_MINUTES as i64, allow_negative_numbers = true)]
    pub refresh_minutes: i64,

    /// Currency ISO codes to request, comma separated (e.g. CHF,EUR,CZK)
    #[arg(long, value_delimiter = ',', required = true)]
    pub currencies: Vec<String>,

    /// Quote store to use
    #[arg(long, value_enum, default_value_t = StoreKind::File)]
    pub store: StoreKind,

    /// Cache file for the file store [default: currencies.json]
    #[arg(long, value_name = "PATH", conflicts_with = "user_cache")]
    pub cache_file: Option<PathBuf>,

    /// Keep the cache file in the user cache directory
    #[arg(long)]
    pub user_cache: bool,

    /// Seconds before a quote request is abandoned
    #[arg(long, default_value_t = 30)]
    pub timeout_secs: u64,

    /// Override the API host
    #[arg(long, value_name = "URL")]
    pub base_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// Operations offered on the command line
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Refresh the cached quotes if they are stale
    Refresh,
    /// Print the USD quote for a currency
    Quote {
        /// Currency ISO code
        currency: String,
    },
    /// Convert a USD amount into a currency
    Convert {
        /// Currency ISO code
        currency: String,
        /// USD amount (sign is ignored)
        #[arg(default_value_t = DEFAULT_AMOUNT, allow_negative_numbers = true)]
        amount: f64,
    },
}

/// Text printed for a command and whether it counts as success
#[derive(Debug, Clone, PartialEq)]
pub struct CommandOutput {
    pub message: String,
    pub success: bool,
}

impl Cli {
    /// Builds the validated quote configuration from the arguments
    pub fn quotes_config(&self) -> Result<QuotesConfig, CliError> {
        let api_key = self.api_key.clone().unwrap_or_default();
        let mut config = QuotesConfig::new(api_key, self.refresh_minutes, &self.currencies)?
            .with_request_timeout(Duration::from_secs(self.timeout_secs));

        if let Some(base_url) = &self.base_url {
            config = config.with_base_url(base_url.clone());
        }

        Ok(config)
    }

    /// Resolves the file store location from the arguments
    pub fn file_store(&self) -> Result<FileStore, CliError> {
        if self.user_cache {
            return FileStore::in_user_cache().ok_or(CliError::NoUserCache);
        }

        Ok(match &self.cache_file {
            Some(path) => FileStore::new(path.clone()),
            None => FileStore::default(),
        })
    }
}

/// Runs `command` against any quote service
pub async fn execute(
    quotes: &mut dyn CurrencyQuotes,
    command: &Command,
) -> Result<CommandOutput, QuoteError> {
    let output = match command {
        Command::Refresh => {
            let refreshed = quotes.refresh().await?;
            CommandOutput {
                message: if refreshed {
                    "Quotes are up to date".to_string()
                } else {
                    "Quote refresh failed".to_string()
                },
                success: refreshed,
            }
        }
        Command::Quote { currency } => {
            let quote = quotes.conversion_quote(currency).await?;
            sentinel_aware(quote, currency)
        }
        Command::Convert { currency, amount } => {
            let converted = quotes.convert_from_usd(currency, *amount).await?;
            sentinel_aware(converted, currency)
        }
    };

    Ok(output)
}

fn sentinel_aware(value: f64, currency: &str) -> CommandOutput {
    if value == NO_QUOTE {
        CommandOutput {
            message: format!("No quote available for '{}'", currency),
            success: false,
        }
    } else {
        CommandOutput {
            message: value.to_string(),
            success: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    /// Answers every lookup with a fixed quote
    struct FixedQuotes {
        quote: f64,
        refreshed: bool,
    }

    #[async_trait]
    impl CurrencyQuotes for FixedQuotes {
        async fn refresh(&mut self) -> Result<bool, QuoteError> {
            Ok(self.refreshed)
        }

        async fn conversion_quote(&mut self, currency: &str) -> Result<f64, QuoteError> {
            if currency.is_empty() || !self.refreshed {
                return Ok(NO_QUOTE);
            }
            Ok(self.quote)
        }

        async fn convert_from_usd(
            &mut self,
            currency: &str,
            amount: f64,
        ) -> Result<f64, QuoteError> {
            let quote = self.conversion_quote(currency).await?;
            if quote < 0.0 {
                return Ok(NO_QUOTE);
            }
            Ok(quote * amount.abs())
        }
    }

    #[test]
    fn test_cli_parse_quote() {
        let cli = Cli::parse_from([
            "usdquotes", "--api-key", "k", "--currencies", "chf,eur", "quote", "chf",
        ]);
        assert_eq!(cli.currencies, vec!["chf", "eur"]);
        assert_eq!(cli.refresh_minutes, 60);
        assert_eq!(cli.store, StoreKind::File);
        assert_eq!(
            cli.command,
            Command::Quote {
                currency: "chf".to_string()
            }
        );
    }

    #[test]
    fn test_cli_parse_convert_default_amount() {
        let cli = Cli::parse_from(["usdquotes", "--currencies", "chf", "convert", "chf"]);
        assert_eq!(
            cli.command,
            Command::Convert {
                currency: "chf".to_string(),
                amount: 1.0
            }
        );
    }

    #[test]
    fn test_cli_parse_negative_values() {
        let cli = Cli::parse_from([
            "usdquotes",
            "--refresh-minutes",
            "-20",
            "--currencies",
            "chf",
            "convert",
            "chf",
            "-5",
        ]);
        assert_eq!(cli.refresh_minutes, -20);
        assert_eq!(
            cli.command,
            Command::Convert {
                currency: "chf".to_string(),
                amount: -5.0
            }
        );
    }

    #[test]
    fn test_cli_rejects_cache_file_with_user_cache() {
        let result = Cli::try_parse_from([
            "usdquotes",
            "--currencies",
            "chf",
            "--cache-file",
            "x.json",
            "--user-cache",
            "refresh",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_quotes_config_requires_api_key() {
        let cli = Cli::parse_from(["usdquotes", "--currencies", "chf", "refresh"]);
        let cli = Cli { api_key: None, ..cli };

        let result = cli.quotes_config();

        assert!(matches!(
            result,
            Err(CliError::Config(ConfigError::MissingApiKey))
        ));
    }

    #[test]
    fn test_quotes_config_from_args() {
        let cli = Cli::parse_from([
            "usdquotes",
            "--api-key",
            "secret",
            "--currencies",
            "chf,czk",
            "--timeout-secs",
            "5",
            "--base-url",
            "http://localhost:8080",
            "refresh",
        ]);

        let config = cli.quotes_config().unwrap();

        assert_eq!(config.request_timeout(), Duration::from_secs(5));
        assert_eq!(
            config.live_url(),
            "http://localhost:8080/api/live?access_key=secret&currencies=CHF,CZK&source=USD&format=1"
        );
    }

    #[test]
    fn test_file_store_uses_given_path() {
        let cli = Cli::parse_from([
            "usdquotes",
            "--currencies",
            "chf",
            "--cache-file",
            "/tmp/quotes.json",
            "refresh",
        ]);
        let store = cli.file_store().unwrap();
        assert_eq!(store.path(), std::path::Path::new("/tmp/quotes.json"));
    }

    #[test]
    fn test_file_store_defaults_to_currencies_json() {
        let cli = Cli::parse_from(["usdquotes", "--currencies", "chf", "refresh"]);
        let store = cli.file_store().unwrap();
        assert_eq!(store.path(), std::path::Path::new("currencies.json"));
    }

    #[tokio::test]
    async fn test_execute_convert() {
        let mut quotes = FixedQuotes {
            quote: 2.0,
            refreshed: true,
        };
        let command = Command::Convert {
            currency: "chf".to_string(),
            amount: -3.0,
        };

        let output = execute(&mut quotes, &command).await.unwrap();

        assert_eq!(output.message, "6");
        assert!(output.success);
    }

    #[tokio::test]
    async fn test_execute_quote_sentinel_is_failure() {
        let mut quotes = FixedQuotes {
            quote: 2.0,
            refreshed: false,
        };
        let command = Command::Quote {
            currency: "chf".to_string(),
        };

        let output = execute(&mut quotes, &command).await.unwrap();

        assert!(!output.success);
        assert!(output.message.contains("chf"));
    }

    #[tokio::test]
    async fn test_execute_refresh() {
        let mut quotes = FixedQuotes {
            quote: 1.0,
            refreshed: false,
        };

        let output = execute(&mut quotes, &Command::Refresh).await.unwrap();

        assert_eq!(output.message, "Quote refresh failed");
        assert!(!output.success);
    }
}
