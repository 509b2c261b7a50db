//! SQLite storage for tracked symbols and their price history.

use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::providers::{ProviderId, Quote};

const SCHEMA_VERSION: i32 = 2;

const SNAPSHOT_COLUMNS: &str = "symbol, price, provider, recorded_at, open, high, low, volume";

#[derive(thiserror::Error, Debug)]
pub enum DbError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("date parse error: {0}")]
    Date(#[from] chrono::ParseError),
    #[error("stored price is not a decimal: {0}")]
    Decimal(#[from] rust_decimal::Error),
}

/// A tracked symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StockRow {
    pub symbol: String,
    pub name: Option<String>,
    pub added_at: DateTime<Utc>,
}

/// One stored price observation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PriceSnapshot {
    pub symbol: String,
    pub price: Decimal,
    /// Provider that supplied the price; `None` for rows written before
    /// providers were recorded or by an unknown source.
    pub provider: Option<ProviderId>,
    pub recorded_at: DateTime<Utc>,
    pub open: Option<Decimal>,
    pub high: Option<Decimal>,
    pub low: Option<Decimal>,
    pub volume: Option<u64>,
}

impl PriceSnapshot {
    /// Snapshot of `quote` as it would be stored.
    pub fn from_quote(
        symbol: &str,
        quote: &Quote,
        provider: Option<ProviderId>,
        recorded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            symbol: symbol.to_string(),
            price: quote.price,
            provider,
            recorded_at,
            open: quote.open,
            high: quote.high,
            low: quote.low,
            volume: quote.volume,
        }
    }
}

pub struct PriceDb {
    conn: Connection,
}

impl PriceDb {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn })
    }

    pub fn init(&self) -> Result<(), DbError> {
        let version: i32 = self
            .conn
            .pragma_query_value(None, "user_version", |row| row.get(0))?;

        if version < 1 {
            self.migrate_v1()?;
        }
        if version < 2 {
            self.migrate_v2()?;
        }
        if version < SCHEMA_VERSION {
            self.conn
                .pragma_update(None, "user_version", SCHEMA_VERSION)?;
        }

        let schema = include_str!("../../schema/sqlite.sql");
        self.conn.execute_batch(schema)?;

        Ok(())
    }

    fn migrate_v1(&self) -> Result<(), DbError> {
        self.add_history_column("provider TEXT")
    }

    /// Session figures next to each price.
    fn migrate_v2(&self) -> Result<(), DbError> {
        for column in ["open TEXT", "high TEXT", "low TEXT", "volume INTEGER"] {
            self.add_history_column(column)?;
        }
        Ok(())
    }

    /// Adds a column to an existing history table. A fresh database has no
    /// table yet; the schema file creates it with every column.
    fn add_history_column(&self, column: &str) -> Result<(), DbError> {
        let sql = format!("ALTER TABLE stock_price_history ADD COLUMN {}", column);
        match self.conn.execute(&sql, []) {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(_, Some(ref msg)))
                if msg.contains("duplicate column name") || msg.contains("no such table") =>
            {
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Registers `symbol` for bulk updates. Re-adding keeps the original
    /// `added_at` and only replaces the name when one is given.
    pub fn add_stock(
        &self,
        symbol: &str,
        name: Option<&str>,
        at: DateTime<Utc>,
    ) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT INTO stocks (symbol, name, added_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(symbol) DO UPDATE SET name = COALESCE(excluded.name, stocks.name)",
            params![symbol, name, format_ts(at)],
        )?;
        Ok(())
    }

    /// Stops tracking `symbol`. History rows are kept.
    pub fn remove_stock(&self, symbol: &str) -> Result<bool, DbError> {
        let n = self
            .conn
            .execute("DELETE FROM stocks WHERE symbol = ?1", params![symbol])?;
        Ok(n > 0)
    }

    pub fn list_stocks(&self) -> Result<Vec<StockRow>, DbError> {
        let mut stmt = self
            .conn
            .prepare("SELECT symbol, name, added_at FROM stocks ORDER BY symbol")?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, Option<String>>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;

        let mut out = Vec::new();
        for row in rows {
            let (symbol, name, added_at) = row?;
            out.push(StockRow {
                symbol,
                name,
                added_at: parse_ts(&added_at)?,
            });
        }
        Ok(out)
    }

    /// Appends a bare price observation. Returns the new row id.
    pub fn insert_price(
        &self,
        symbol: &str,
        price: Decimal,
        provider: Option<ProviderId>,
        at: DateTime<Utc>,
    ) -> Result<i64, DbError> {
        self.insert_quote(symbol, &Quote::from_price(price), provider, at)
    }

    /// Appends a quote with its session figures. Returns the new row id.
    pub fn insert_quote(
        &self,
        symbol: &str,
        quote: &Quote,
        provider: Option<ProviderId>,
        at: DateTime<Utc>,
    ) -> Result<i64, DbError> {
        self.conn.execute(
            "INSERT INTO stock_price_history
                (symbol, price, provider, recorded_at, open, high, low, volume)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                symbol,
                quote.price.to_string(),
                provider.map(|p| p.as_str()),
                format_ts(at),
                quote.open.map(|d| d.to_string()),
                quote.high.map(|d| d.to_string()),
                quote.low.map(|d| d.to_string()),
                quote.volume.and_then(|v| i64::try_from(v).ok()),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Most recent stored observation for `symbol`.
    pub fn latest_price(&self, symbol: &str) -> Result<Option<PriceSnapshot>, DbError> {
        let sql = format!(
            "SELECT {} FROM stock_price_history
             WHERE symbol = ?1
             ORDER BY recorded_at DESC, id DESC
             LIMIT 1",
            SNAPSHOT_COLUMNS
        );
        let raw = self
            .conn
            .query_row(&sql, params![symbol], raw_snapshot)
            .optional()?;
        raw.map(RawSnapshot::into_snapshot).transpose()
    }

    /// Latest observation per symbol. Symbols with no history are absent
    /// from the map.
    pub fn latest_prices(
        &self,
        symbols: &[String],
    ) -> Result<HashMap<String, PriceSnapshot>, DbError> {
        let mut stmt = self.conn.prepare_cached(&format!(
            "SELECT {} FROM stock_price_history
             WHERE symbol = ?1
             ORDER BY recorded_at DESC, id DESC
             LIMIT 1",
            SNAPSHOT_COLUMNS
        ))?;

        let mut out = HashMap::with_capacity(symbols.len());
        for symbol in symbols {
            if out.contains_key(symbol) {
                continue;
            }
            if let Some(raw) = stmt.query_row(params![symbol], raw_snapshot).optional()? {
                out.insert(symbol.clone(), raw.into_snapshot()?);
            }
        }
        Ok(out)
    }

    /// Up to `limit` observations for `symbol`, newest first.
    pub fn price_history(&self, symbol: &str, limit: usize) -> Result<Vec<PriceSnapshot>, DbError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM stock_price_history
             WHERE symbol = ?1
             ORDER BY recorded_at DESC, id DESC
             LIMIT ?2",
            SNAPSHOT_COLUMNS
        ))?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = stmt.query_map(params![symbol, limit], raw_snapshot)?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?.into_snapshot()?);
        }
        Ok(out)
    }
}

struct RawSnapshot {
    symbol: String,
    price: String,
    provider: Option<String>,
    recorded_at: String,
    open: Option<String>,
    high: Option<String>,
    low: Option<String>,
    volume: Option<i64>,
}

impl RawSnapshot {
    fn into_snapshot(self) -> Result<PriceSnapshot, DbError> {
        Ok(PriceSnapshot {
            symbol: self.symbol,
            price: Decimal::from_str(&self.price)?,
            provider: self.provider.and_then(|p| p.parse().ok()),
            recorded_at: parse_ts(&self.recorded_at)?,
            open: parse_optional(self.open)?,
            high: parse_optional(self.high)?,
            low: parse_optional(self.low)?,
            volume: self.volume.and_then(|v| u64::try_from(v).ok()),
        })
    }
}

fn parse_optional(raw: Option<String>) -> Result<Option<Decimal>, DbError> {
    Ok(raw.as_deref().map(Decimal::from_str).transpose()?)
}

fn raw_snapshot(row: &Row<'_>) -> rusqlite::Result<RawSnapshot> {
    Ok(RawSnapshot {
        symbol: row.get(0)?,
        price: row.get(1)?,
        provider: row.get(2)?,
        recorded_at: row.get(3)?,
        open: row.get(4)?,
        high: row.get(5)?,
        low: row.get(6)?,
        volume: row.get(7)?,
    })
}

/// Fixed-width RFC 3339 so that text ordering matches time ordering.
fn format_ts(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_ts(raw: &str) -> Result<DateTime<Utc>, DbError> {
    Ok(DateTime::parse_from_rfc3339(raw)?.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rust_decimal_macros::dec;

    fn open_test_db() -> PriceDb {
        let db = PriceDb::open_in_memory().expect("open in-memory db");
        db.init().expect("init schema");
        db
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 4, 7, 0, 0).unwrap()
    }

    fn get_user_version(db: &PriceDb) -> i32 {
        db.conn
            .pragma_query_value(None, "user_version", |row| row.get(0))
            .expect("read user_version")
    }

    #[test]
    fn init_is_idempotent() {
        let db = open_test_db();
        db.init().expect("second init");
        assert_eq!(get_user_version(&db), SCHEMA_VERSION);
    }

    #[test]
    fn migrates_history_without_provider_column() {
        let db = PriceDb::open_in_memory().unwrap();
        db.conn
            .execute_batch(
                "CREATE TABLE stock_price_history (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    symbol TEXT NOT NULL,
                    price TEXT NOT NULL,
                    recorded_at TEXT NOT NULL
                );
                INSERT INTO stock_price_history (symbol, price, recorded_at)
                VALUES ('AAPL', '180.5', '2024-03-01T07:00:00.000000Z');",
            )
            .unwrap();

        db.init().expect("migrate");
        let latest = db.latest_price("AAPL").unwrap().unwrap();
        assert_eq!(latest.price, dec!(180.5));
        assert_eq!(latest.provider, None);
    }

    #[test]
    fn migrates_v1_history_to_session_columns() {
        let db = PriceDb::open_in_memory().unwrap();
        db.conn
            .execute_batch(
                "CREATE TABLE stock_price_history (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    symbol TEXT NOT NULL,
                    price TEXT NOT NULL,
                    provider TEXT,
                    recorded_at TEXT NOT NULL
                );
                INSERT INTO stock_price_history (symbol, price, provider, recorded_at)
                VALUES ('005930', '71800', 'yahoo', '2024-03-01T07:00:00.000000Z');
                PRAGMA user_version = 1;",
            )
            .unwrap();

        db.init().expect("migrate");
        assert_eq!(get_user_version(&db), SCHEMA_VERSION);

        let old = db.latest_price("005930").unwrap().unwrap();
        assert_eq!(old.provider, Some(ProviderId::Yahoo));
        assert_eq!((old.open, old.high, old.low, old.volume), (None, None, None, None));

        let quote = Quote {
            price: dec!(72000),
            open: Some(dec!(71800)),
            high: Some(dec!(72500)),
            low: Some(dec!(71500)),
            volume: Some(9_000_000),
        };
        db.insert_quote("005930", &quote, Some(ProviderId::Yahoo), t0())
            .unwrap();
        let latest = db.latest_price("005930").unwrap().unwrap();
        assert_eq!(latest.high, Some(dec!(72500)));
        assert_eq!(latest.volume, Some(9_000_000));
    }

    #[test]
    fn quote_round_trips_session_figures() {
        let db = open_test_db();
        let quote = Quote {
            price: dec!(48250),
            open: Some(dec!(47900)),
            high: Some(dec!(48600)),
            low: Some(dec!(47750)),
            volume: Some(912044),
        };
        db.insert_quote("035720", &quote, Some(ProviderId::Yahoo), t0())
            .unwrap();

        let stored = db.latest_price("035720").unwrap().unwrap();
        assert_eq!(
            stored,
            PriceSnapshot::from_quote("035720", &quote, Some(ProviderId::Yahoo), t0())
        );
    }

    #[test]
    fn track_and_list() {
        let db = open_test_db();
        db.add_stock("005930", Some("Samsung Electronics"), t0()).unwrap();
        db.add_stock("AAPL", None, t0()).unwrap();
        db.add_stock("AAPL", Some("Apple"), t0() + Duration::days(1)).unwrap();
        db.add_stock("005930", None, t0()).unwrap();

        let stocks = db.list_stocks().unwrap();
        assert_eq!(stocks.len(), 2);
        assert_eq!(stocks[0].symbol, "005930");
        assert_eq!(stocks[0].name.as_deref(), Some("Samsung Electronics"));
        assert_eq!(stocks[1].name.as_deref(), Some("Apple"));
        assert_eq!(stocks[1].added_at, t0());

        assert!(db.remove_stock("AAPL").unwrap());
        assert!(!db.remove_stock("AAPL").unwrap());
        assert_eq!(db.list_stocks().unwrap().len(), 1);
    }

    #[test]
    fn latest_price_picks_newest() {
        let db = open_test_db();
        db.insert_price("AAPL", dec!(180.00), Some(ProviderId::Yahoo), t0())
            .unwrap();
        db.insert_price("AAPL", dec!(189.84), Some(ProviderId::TwelveData), t0() + Duration::hours(1))
            .unwrap();
        db.insert_price("AAPL", dec!(170.00), None, t0() - Duration::hours(1))
            .unwrap();

        let latest = db.latest_price("AAPL").unwrap().unwrap();
        assert_eq!(latest.price, dec!(189.84));
        assert_eq!(latest.provider, Some(ProviderId::TwelveData));
        assert_eq!(latest.recorded_at, t0() + Duration::hours(1));
        assert!(db.latest_price("MSFT").unwrap().is_none());
    }

    #[test]
    fn decimal_precision_survives() {
        let db = open_test_db();
        db.insert_price("IBM", dec!(169.1200), None, t0()).unwrap();
        let latest = db.latest_price("IBM").unwrap().unwrap();
        assert_eq!(latest.price.to_string(), "169.1200");
    }

    #[test]
    fn latest_prices_omits_missing() {
        let db = open_test_db();
        db.insert_price("AAPL", dec!(189.84), None, t0()).unwrap();
        db.insert_price("005930", dec!(71800), Some(ProviderId::Yahoo), t0())
            .unwrap();

        let symbols = vec!["AAPL".to_string(), "005930".to_string(), "MSFT".to_string()];
        let latest = db.latest_prices(&symbols).unwrap();
        assert_eq!(latest.len(), 2);
        assert_eq!(latest["005930"].price, dec!(71800));
        assert!(!latest.contains_key("MSFT"));
    }

    #[test]
    fn history_is_newest_first_and_limited() {
        let db = open_test_db();
        for i in 0..5 {
            db.insert_price("AAPL", Decimal::from(100 + i), None, t0() + Duration::minutes(i))
                .unwrap();
        }
        db.insert_price("MSFT", dec!(400), None, t0()).unwrap();

        let history = db.price_history("AAPL", 3).unwrap();
        let prices: Vec<Decimal> = history.iter().map(|s| s.price).collect();
        assert_eq!(prices, vec![dec!(104), dec!(103), dec!(102)]);
        assert!(history.iter().all(|s| s.symbol == "AAPL"));
    }

    #[test]
    fn same_instant_ties_break_by_insert_order() {
        let db = open_test_db();
        db.insert_price("AAPL", dec!(1), None, t0()).unwrap();
        db.insert_price("AAPL", dec!(2), None, t0()).unwrap();
        assert_eq!(db.latest_price("AAPL").unwrap().unwrap().price, dec!(2));
    }
}
