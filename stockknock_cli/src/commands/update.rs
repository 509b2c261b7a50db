use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use stockknock_lib::{PriceDb, PriceUpdater, QuoteConfig, QuoteResolver};

use crate::output::{build_update_rows, print_rows, OutputFormat};

#[derive(Args)]
pub struct UpdateArgs {
    /// SQLite database path (required)
    #[arg(long)]
    pub db: PathBuf,

    /// Symbols to update (default: all tracked symbols)
    pub symbols: Vec<String>,

    /// Pause between symbols in milliseconds (overrides config)
    #[arg(long)]
    pub delay_ms: Option<u64>,
}

pub async fn run(args: &UpdateArgs, config: &QuoteConfig, format: &OutputFormat) -> Result<()> {
    let db = PriceDb::open(&args.db)?;
    db.init()?;

    let symbols: Vec<String> = if args.symbols.is_empty() {
        db.list_stocks()?.into_iter().map(|s| s.symbol).collect()
    } else {
        args.symbols.clone()
    };

    if symbols.is_empty() {
        eprintln!("No symbols to update; add some with `stockknock track`");
        return Ok(());
    }

    let resolver = QuoteResolver::from_config(config)?;
    if resolver.is_market_open() {
        eprintln!("Market is open; every symbol will be skipped");
    }

    let delay = args
        .delay_ms
        .map(Duration::from_millis)
        .unwrap_or_else(|| config.update_delay());
    let updater = PriceUpdater::new(resolver, &db).with_delay(delay);

    eprintln!("Updating {} symbols", symbols.len());
    let pb = ProgressBar::new(symbols.len() as u64);
    pb.set_style(ProgressStyle::with_template(
        "[{elapsed_precise}] {bar:40.cyan/blue} {pos:>7}/{len:7} ({eta}) {msg}",
    )?);

    let summary = updater
        .update_all(&symbols, |result| {
            pb.set_message(result.symbol.clone());
            pb.inc(1);
        })
        .await;
    pb.finish_and_clear();

    print_rows(&build_update_rows(&summary.results), format)?;
    eprintln!(
        "{} updated, {} skipped, {} failed",
        summary.updated, summary.skipped, summary.failed
    );
    Ok(())
}
