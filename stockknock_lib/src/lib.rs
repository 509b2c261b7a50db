//! Library layer for stockknock: quote resolution, configuration and price history.
//!
//! Wraps the `stockknock_quotes` provider clients in a fallback chain guarded
//! by a trading-hours gate and a per-symbol failure cache, and persists
//! resolved prices to SQLite.

pub mod clock;
pub mod config;
pub mod db;
pub mod error;
pub mod failure_cache;
pub mod market_hours;
pub mod providers;
pub mod resolver;
pub mod stats;
pub mod symbol;
pub mod updater;

pub use stockknock_quotes;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ConfigError, ProviderConfig, QuoteConfig};
pub use db::{DbError, PriceDb, PriceSnapshot, StockRow};
pub use error::StockknockError;
pub use failure_cache::{FailureCache, DEFAULT_FAILURE_TTL};
pub use market_hours::TradingWindow;
pub use providers::{ProviderError, ProviderId, Quote, QuoteProvider};
pub use resolver::{AttemptOutcome, ProviderAttempt, QuoteResolver, Resolution, SkipReason};
pub use stats::{ResolveStats, StatsSummary};
pub use updater::{PriceUpdater, UpdateResult, UpdateSummary};
