use anyhow::{bail, Result};
use clap::Args;
use stockknock_lib::{QuoteConfig, QuoteResolver};

use crate::output::{build_quote_rows, print_rows, OutputFormat};

#[derive(Args)]
pub struct PriceArgs {
    /// Symbols to resolve (e.g. AAPL, 005930)
    pub symbols: Vec<String>,

    /// Print resolver counters to stderr when done
    #[arg(long)]
    pub stats: bool,
}

pub async fn run(args: &PriceArgs, config: &QuoteConfig, format: &OutputFormat) -> Result<()> {
    if args.symbols.is_empty() {
        bail!("at least one symbol is required");
    }

    let resolver = QuoteResolver::from_config(config)?;
    if resolver.is_market_open() {
        eprintln!("Market is open; live prices are not fetched until the close");
    }

    let mut results = Vec::with_capacity(args.symbols.len());
    for symbol in &args.symbols {
        let resolution = resolver.resolve_detailed(symbol).await;
        results.push((symbol.trim().to_string(), resolution));
    }

    print_rows(&build_quote_rows(&results), format)?;

    if args.stats {
        let stats = resolver.stats();
        eprintln!(
            "requests={} resolved={} market_hours={} suppressed={} exhausted={} provider_errors={}",
            stats.requests,
            stats.resolved,
            stats.blackout,
            stats.suppressed,
            stats.exhausted,
            stats.provider_errors
        );
    }
    Ok(())
}
