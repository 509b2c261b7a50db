mod commands;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use stockknock_lib::QuoteConfig;

use crate::output::OutputFormat;

#[derive(Parser)]
#[command(name = "stockknock")]
#[command(about = "Resolve and record latest stock prices across quote providers")]
struct Cli {
    /// Output format: table, json, csv, or markdown
    #[arg(long, default_value = "table", global = true)]
    output: String,

    /// YAML config file (falls back to $STOCKKNOCK_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve latest prices live
    Price(commands::price::PriceArgs),
    /// Register symbols for bulk updates
    Track(commands::track::TrackArgs),
    /// Resolve and store prices for tracked or given symbols
    Update(commands::update::UpdateArgs),
    /// Show stored price history for a symbol
    History(commands::history::HistoryArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("stockknock=info".parse()?),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let format = match cli.output.as_str() {
        "json" => OutputFormat::Json,
        "csv" => OutputFormat::Csv,
        "md" | "markdown" => OutputFormat::Markdown,
        _ => OutputFormat::Table,
    };

    match &cli.command {
        Commands::Price(args) => {
            let config = QuoteConfig::load(cli.config.as_deref())?;
            commands::price::run(args, &config, &format).await?
        }
        Commands::Track(args) => commands::track::run(args, &format)?,
        Commands::Update(args) => {
            let config = QuoteConfig::load(cli.config.as_deref())?;
            commands::update::run(args, &config, &format).await?
        }
        Commands::History(args) => commands::history::run(args, &format)?,
    }

    Ok(())
}
