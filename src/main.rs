//! usdquotes - USD exchange rate quotes on the command line
//!
//! Looks up and converts USD amounts using quotes cached from the
//! currencylayer API.

use std::error::Error;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use usdquotes::cli::{execute, Cli, CommandOutput, StoreKind};
use usdquotes::QuoteCache;

/// Sends log output to stderr so that stdout only carries results
fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "usdquotes=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn run(cli: &Cli) -> Result<CommandOutput, Box<dyn Error>> {
    let config = cli.quotes_config()?;

    let output = match cli.store {
        StoreKind::File => {
            let mut quotes = QuoteCache::file_backed_at(&config, cli.file_store()?)?;
            execute(&mut quotes, &cli.command).await?
        }
        StoreKind::Memory => {
            let mut quotes = QuoteCache::in_memory(&config)?;
            execute(&mut quotes, &cli.command).await?
        }
    };

    Ok(output)
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(&cli).await {
        Ok(output) if output.success => {
            println!("{}", output.message);
            ExitCode::SUCCESS
        }
        Ok(output) => {
            eprintln!("{}", output.message);
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
