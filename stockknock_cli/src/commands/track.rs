use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Args;
use stockknock_lib::symbol::canonical_symbol;
use stockknock_lib::PriceDb;

use crate::output::{build_tracked_rows, print_rows, OutputFormat};

#[derive(Args)]
pub struct TrackArgs {
    /// SQLite database path (required)
    #[arg(long)]
    pub db: PathBuf,

    /// Symbols to start (or, with --remove, stop) tracking
    pub symbols: Vec<String>,

    /// Display name; only valid with a single symbol
    #[arg(long)]
    pub name: Option<String>,

    /// Stop tracking the given symbols instead
    #[arg(long)]
    pub remove: bool,
}

pub fn run(args: &TrackArgs, format: &OutputFormat) -> Result<()> {
    if args.name.is_some() && args.symbols.len() != 1 {
        bail!("--name requires exactly one symbol");
    }

    let db = PriceDb::open(&args.db)?;
    db.init()?;

    let now = chrono::Utc::now();
    for raw in &args.symbols {
        let Some(symbol) = canonical_symbol(raw) else {
            bail!("symbol must not be empty");
        };
        if args.remove {
            if !db.remove_stock(symbol)? {
                eprintln!("{} was not tracked", symbol);
            }
        } else {
            db.add_stock(symbol, args.name.as_deref(), now)?;
        }
    }

    let stocks = db.list_stocks()?;
    let symbols: Vec<String> = stocks.iter().map(|s| s.symbol.clone()).collect();
    let latest = db.latest_prices(&symbols)?;
    print_rows(&build_tracked_rows(&stocks, &latest), format)
}
