use std::collections::HashMap;

use anyhow::Result;
use serde::Serialize;
use stockknock_lib::{
    AttemptOutcome, PriceSnapshot, ProviderAttempt, Resolution, SkipReason, StockRow, UpdateResult,
};
use tabled::settings::Style;
use tabled::{Table, Tabled};

#[derive(Clone, Debug)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
    Markdown,
}

#[derive(Tabled, Serialize)]
pub struct QuoteRow {
    #[tabled(rename = "Symbol")]
    #[serde(rename = "Symbol")]
    symbol: String,
    #[tabled(rename = "Price")]
    #[serde(rename = "Price")]
    price: String,
    #[tabled(rename = "Provider")]
    #[serde(rename = "Provider")]
    provider: String,
    #[tabled(rename = "Outcome")]
    #[serde(rename = "Outcome")]
    outcome: String,
    #[tabled(rename = "Detail")]
    #[serde(rename = "Detail")]
    detail: String,
}

#[derive(Tabled, Serialize)]
pub struct HistoryRow {
    #[tabled(rename = "Recorded At")]
    #[serde(rename = "Recorded At")]
    recorded_at: String,
    #[tabled(rename = "Symbol")]
    #[serde(rename = "Symbol")]
    symbol: String,
    #[tabled(rename = "Price")]
    #[serde(rename = "Price")]
    price: String,
    #[tabled(rename = "Provider")]
    #[serde(rename = "Provider")]
    provider: String,
    #[tabled(rename = "Open")]
    #[serde(rename = "Open")]
    open: String,
    #[tabled(rename = "High")]
    #[serde(rename = "High")]
    high: String,
    #[tabled(rename = "Low")]
    #[serde(rename = "Low")]
    low: String,
    #[tabled(rename = "Volume")]
    #[serde(rename = "Volume")]
    volume: String,
}

#[derive(Tabled, Serialize)]
pub struct UpdateRow {
    #[tabled(rename = "Symbol")]
    #[serde(rename = "Symbol")]
    symbol: String,
    #[tabled(rename = "Outcome")]
    #[serde(rename = "Outcome")]
    outcome: String,
    #[tabled(rename = "Price")]
    #[serde(rename = "Price")]
    price: String,
    #[tabled(rename = "Provider")]
    #[serde(rename = "Provider")]
    provider: String,
}

#[derive(Tabled, Serialize)]
pub struct TrackedRow {
    #[tabled(rename = "Symbol")]
    #[serde(rename = "Symbol")]
    symbol: String,
    #[tabled(rename = "Name")]
    #[serde(rename = "Name")]
    name: String,
    #[tabled(rename = "Added")]
    #[serde(rename = "Added")]
    added_at: String,
    #[tabled(rename = "Last Price")]
    #[serde(rename = "Last Price")]
    last_price: String,
    #[tabled(rename = "Last Updated")]
    #[serde(rename = "Last Updated")]
    last_updated: String,
}

// -- Row builders --

pub fn build_quote_rows(results: &[(String, Resolution)]) -> Vec<QuoteRow> {
    results
        .iter()
        .map(|(symbol, resolution)| QuoteRow {
            symbol: symbol.clone(),
            price: resolution.price().map(|p| p.to_string()).unwrap_or_default(),
            provider: resolution
                .provider()
                .map(|p| p.to_string())
                .unwrap_or_default(),
            outcome: resolution.label().to_string(),
            detail: describe(resolution),
        })
        .collect()
}

pub fn build_history_rows(history: &[PriceSnapshot]) -> Vec<HistoryRow> {
    history
        .iter()
        .map(|s| HistoryRow {
            recorded_at: s.recorded_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            symbol: s.symbol.clone(),
            price: s.price.to_string(),
            provider: s.provider.map(|p| p.to_string()).unwrap_or_default(),
            open: display_opt(s.open),
            high: display_opt(s.high),
            low: display_opt(s.low),
            volume: display_opt(s.volume),
        })
        .collect()
}

pub fn build_update_rows(results: &[UpdateResult]) -> Vec<UpdateRow> {
    results
        .iter()
        .map(|r| UpdateRow {
            symbol: r.symbol.clone(),
            outcome: match &r.error {
                Some(e) => format!("{}: {}", r.outcome, e),
                None => r.outcome.to_string(),
            },
            price: r.price.map(|p| p.to_string()).unwrap_or_default(),
            provider: r.provider.map(|p| p.to_string()).unwrap_or_default(),
        })
        .collect()
}

pub fn build_tracked_rows(
    stocks: &[StockRow],
    latest: &HashMap<String, PriceSnapshot>,
) -> Vec<TrackedRow> {
    stocks
        .iter()
        .map(|s| {
            let last = latest.get(&s.symbol);
            TrackedRow {
                symbol: s.symbol.clone(),
                name: s.name.clone().unwrap_or_default(),
                added_at: s.added_at.format("%Y-%m-%d").to_string(),
                last_price: display_opt(last.map(|l| l.price)),
                last_updated: last
                    .map(|l| l.recorded_at.format("%Y-%m-%d %H:%M:%S").to_string())
                    .unwrap_or_default(),
            }
        })
        .collect()
}

fn display_opt<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn describe(resolution: &Resolution) -> String {
    match resolution {
        Resolution::Resolved { .. } => String::new(),
        Resolution::Blackout => "market is open".to_string(),
        Resolution::Suppressed { retry_after } => {
            format!("failed recently, retry in {}s", retry_after.as_secs())
        }
        Resolution::Exhausted { attempts } if attempts.is_empty() => {
            "no providers enabled".to_string()
        }
        Resolution::Exhausted { attempts } => attempts
            .iter()
            .map(describe_attempt)
            .collect::<Vec<_>>()
            .join("; "),
        Resolution::InvalidSymbol => "empty symbol".to_string(),
    }
}

fn describe_attempt(attempt: &ProviderAttempt) -> String {
    let what = match &attempt.outcome {
        AttemptOutcome::NoPrice => "no price".to_string(),
        AttemptOutcome::InvalidPrice(p) => format!("invalid price {}", p),
        AttemptOutcome::Failed(e) => e.clone(),
        AttemptOutcome::Skipped(SkipReason::MissingCredentials) => "no API key".to_string(),
    };
    format!("{}: {}", attempt.provider, what)
}

// -- Printing --

pub fn print_rows<T: Tabled + Serialize>(rows: &[T], format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => println!("{}", Table::new(rows)),
        OutputFormat::Markdown => {
            let mut table = Table::new(rows);
            table.with(Style::markdown());
            println!("{}", table);
        }
        OutputFormat::Csv => {
            let mut wtr = csv::Writer::from_writer(std::io::stdout());
            for row in rows {
                wtr.serialize(row)?;
            }
            wtr.flush()?;
        }
        OutputFormat::Json => print_json(&rows),
    }
    Ok(())
}

pub fn print_json<T: serde::Serialize>(data: &T) {
    match serde_json::to_string_pretty(data) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to serialize to JSON: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;
    use std::time::Duration;
    use stockknock_lib::{ProviderId, Quote};

    fn csv_from_rows<T: Serialize>(rows: &[T]) -> String {
        let mut wtr = csv::Writer::from_writer(Vec::new());
        for row in rows {
            wtr.serialize(row).unwrap();
        }
        wtr.flush().unwrap();
        String::from_utf8(wtr.into_inner().unwrap()).unwrap()
    }

    fn sample_results() -> Vec<(String, Resolution)> {
        vec![
            (
                "005930".to_string(),
                Resolution::Resolved {
                    quote: Quote::from_price(dec!(71800)),
                    provider: ProviderId::Yahoo,
                },
            ),
            (
                "ZZZZ".to_string(),
                Resolution::Exhausted {
                    attempts: vec![
                        ProviderAttempt {
                            provider: ProviderId::Yahoo,
                            outcome: AttemptOutcome::Failed("Request failed with status 404".to_string()),
                        },
                        ProviderAttempt {
                            provider: ProviderId::AlphaVantage,
                            outcome: AttemptOutcome::Skipped(SkipReason::MissingCredentials),
                        },
                    ],
                },
            ),
            (
                "AAPL".to_string(),
                Resolution::Suppressed {
                    retry_after: Duration::from_secs(120),
                },
            ),
        ]
    }

    #[test]
    fn test_build_quote_rows() {
        let rows = build_quote_rows(&sample_results());
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].price, "71800");
        assert_eq!(rows[0].provider, "yahoo");
        assert_eq!(rows[0].outcome, "resolved");
        assert_eq!(rows[1].price, "");
        assert_eq!(
            rows[1].detail,
            "yahoo: Request failed with status 404; alpha_vantage: no API key"
        );
        assert_eq!(rows[2].detail, "failed recently, retry in 120s");
    }

    #[test]
    fn test_describe_blackout_and_empty_chain() {
        assert_eq!(describe(&Resolution::Blackout), "market is open");
        assert_eq!(
            describe(&Resolution::Exhausted { attempts: vec![] }),
            "no providers enabled"
        );
    }

    #[test]
    fn test_build_history_rows() {
        let quote = Quote {
            volume: Some(51990534),
            ..Quote::from_price(dec!(189.84))
        };
        let snapshot = PriceSnapshot::from_quote(
            "AAPL",
            &quote,
            None,
            Utc.with_ymd_and_hms(2024, 3, 4, 7, 0, 0).unwrap(),
        );
        let rows = build_history_rows(&[snapshot]);
        assert_eq!(rows[0].recorded_at, "2024-03-04 07:00:00");
        assert_eq!(rows[0].price, "189.84");
        assert_eq!(rows[0].provider, "");
        assert_eq!(rows[0].high, "");
        assert_eq!(rows[0].volume, "51990534");
    }

    #[test]
    fn test_build_update_rows_includes_error() {
        let results = vec![UpdateResult {
            symbol: "AAPL".to_string(),
            outcome: "error",
            price: Some(dec!(1)),
            provider: Some(ProviderId::TwelveData),
            error: Some("Database error: disk full".to_string()),
        }];
        let rows = build_update_rows(&results);
        assert_eq!(rows[0].outcome, "error: Database error: disk full");
        assert_eq!(rows[0].provider, "twelve_data");
    }

    #[test]
    fn test_csv_quote_headers() {
        let csv = csv_from_rows(&build_quote_rows(&sample_results()));
        let header = csv.lines().next().unwrap();
        assert_eq!(header, "Symbol,Price,Provider,Outcome,Detail");
    }

    #[test]
    fn test_csv_history_headers() {
        let csv = csv_from_rows(&build_history_rows(&[]));
        // csv writes headers lazily, with the first record
        assert!(csv.is_empty());
    }

    #[test]
    fn test_csv_tracked_headers() {
        let added = Utc.with_ymd_and_hms(2024, 3, 4, 7, 0, 0).unwrap();
        let stocks = vec![
            StockRow {
                symbol: "005930".to_string(),
                name: Some("Samsung Electronics".to_string()),
                added_at: added,
            },
            StockRow {
                symbol: "AAPL".to_string(),
                name: None,
                added_at: added,
            },
        ];
        let mut latest = HashMap::new();
        latest.insert(
            "005930".to_string(),
            PriceSnapshot::from_quote(
                "005930",
                &Quote::from_price(dec!(71800)),
                Some(ProviderId::Yahoo),
                added + chrono::Duration::hours(1),
            ),
        );
        let csv = csv_from_rows(&build_tracked_rows(&stocks, &latest));
        let mut lines = csv.lines();
        assert_eq!(lines.next().unwrap(), "Symbol,Name,Added,Last Price,Last Updated");
        assert_eq!(
            lines.next().unwrap(),
            "005930,Samsung Electronics,2024-03-04,71800,2024-03-04 08:00:00"
        );
        assert_eq!(lines.next().unwrap(), "AAPL,,2024-03-04,,");
    }

    #[test]
    fn test_json_quote_rows_serializable() {
        let val = serde_json::to_value(build_quote_rows(&sample_results())).unwrap();
        assert_eq!(val.as_array().unwrap().len(), 3);
        assert_eq!(val[0]["Symbol"], "005930");
    }

    #[test]
    fn test_markdown_quote_structure() {
        let rows = build_quote_rows(&sample_results());
        let mut table = Table::new(&rows);
        table.with(Style::markdown());
        let md = table.to_string();
        assert!(md.contains('|'));
        assert!(md.contains("---"));
        assert!(md.contains("Outcome"));
    }
}
