use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Args;
use stockknock_lib::symbol::canonical_symbol;
use stockknock_lib::PriceDb;

use crate::output::{build_history_rows, print_rows, OutputFormat};

#[derive(Args)]
pub struct HistoryArgs {
    /// SQLite database path (required)
    #[arg(long)]
    pub db: PathBuf,

    /// Symbol to show
    pub symbol: String,

    /// Maximum rows, newest first
    #[arg(long, default_value = "20")]
    pub limit: usize,
}

pub fn run(args: &HistoryArgs, format: &OutputFormat) -> Result<()> {
    let Some(symbol) = canonical_symbol(&args.symbol) else {
        bail!("symbol must not be empty");
    };

    let db = PriceDb::open(&args.db)?;
    db.init()?;

    let history = db.price_history(symbol, args.limit)?;
    if history.is_empty() {
        eprintln!("No stored prices for {}", symbol);
    }
    print_rows(&build_history_rows(&history), format)
}
