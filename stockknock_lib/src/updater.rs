//! Persisting resolved prices: DB-first reads and paced bulk updates.

use std::time::Duration;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::db::{PriceDb, PriceSnapshot};
use crate::error::StockknockError;
use crate::providers::ProviderId;
use crate::resolver::{QuoteResolver, Resolution};
use crate::symbol::canonical_symbol;

/// Default pause between symbols in [`PriceUpdater::update_all`].
pub const DEFAULT_UPDATE_DELAY: Duration = Duration::from_millis(500);

/// Result of updating one symbol during a bulk run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpdateResult {
    pub symbol: String,
    /// `resolved`, `market_hours`, `suppressed`, `exhausted`,
    /// `invalid_symbol` or `error`.
    pub outcome: &'static str,
    pub price: Option<Decimal>,
    pub provider: Option<ProviderId>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateSummary {
    pub updated: usize,
    pub skipped: usize,
    pub failed: usize,
    pub results: Vec<UpdateResult>,
}

/// Couples a resolver with the price history store.
pub struct PriceUpdater<'a> {
    resolver: QuoteResolver,
    db: &'a PriceDb,
    delay: Duration,
}

impl<'a> PriceUpdater<'a> {
    pub fn new(resolver: QuoteResolver, db: &'a PriceDb) -> Self {
        Self {
            resolver,
            db,
            delay: DEFAULT_UPDATE_DELAY,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn resolver(&self) -> &QuoteResolver {
        &self.resolver
    }

    /// Latest stored price for `symbol`, falling back to a live resolve
    /// whose result is persisted.
    pub async fn current_price(
        &self,
        symbol: &str,
    ) -> Result<Option<PriceSnapshot>, StockknockError> {
        let symbol = require_symbol(symbol)?;
        if let Some(stored) = self.db.latest_price(symbol)? {
            return Ok(Some(stored));
        }
        tracing::debug!("No stored price for {}, resolving live", symbol);
        let resolution = self.resolver.resolve_detailed(symbol).await;
        self.persist(symbol, &resolution)
    }

    /// Resolves `symbol` live and stores the price. Returns whether a price
    /// was stored.
    ///
    /// The symbol does not have to be tracked; `update_all` callers choose
    /// the list, usually from [`PriceDb::list_stocks`].
    pub async fn update_symbol(&self, symbol: &str) -> Result<bool, StockknockError> {
        let symbol = require_symbol(symbol)?;
        let resolution = self.resolver.resolve_detailed(symbol).await;
        Ok(self.persist(symbol, &resolution)?.is_some())
    }

    /// Updates each symbol in turn, sleeping between symbols.
    ///
    /// Store errors are logged and counted; the run continues.
    pub async fn update_all<F>(&self, symbols: &[String], mut on_progress: F) -> UpdateSummary
    where
        F: FnMut(&UpdateResult),
    {
        let mut summary = UpdateSummary::default();

        for (i, raw) in symbols.iter().enumerate() {
            if i > 0 && !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            let result = self.update_one(raw).await;
            match result.outcome {
                "resolved" => summary.updated += 1,
                "error" => summary.failed += 1,
                _ => summary.skipped += 1,
            }
            on_progress(&result);
            summary.results.push(result);
        }

        tracing::info!(
            "Price update finished: {} updated, {} skipped, {} failed",
            summary.updated,
            summary.skipped,
            summary.failed
        );
        summary
    }

    async fn update_one(&self, raw: &str) -> UpdateResult {
        let Some(symbol) = canonical_symbol(raw) else {
            return UpdateResult {
                symbol: raw.to_string(),
                outcome: Resolution::InvalidSymbol.label(),
                price: None,
                provider: None,
                error: None,
            };
        };

        let resolution = self.resolver.resolve_detailed(symbol).await;
        let mut result = UpdateResult {
            symbol: symbol.to_string(),
            outcome: resolution.label(),
            price: resolution.price(),
            provider: resolution.provider(),
            error: None,
        };
        if let Err(e) = self.persist(symbol, &resolution) {
            tracing::warn!("Failed to store price for {}: {}", symbol, e);
            result.outcome = "error";
            result.error = Some(e.to_string());
        }
        result
    }

    fn persist(
        &self,
        symbol: &str,
        resolution: &Resolution,
    ) -> Result<Option<PriceSnapshot>, StockknockError> {
        let Resolution::Resolved { quote, provider } = resolution else {
            return Ok(None);
        };
        let recorded_at = self.resolver.now();
        self.db
            .insert_quote(symbol, quote, Some(*provider), recorded_at)?;
        Ok(Some(PriceSnapshot::from_quote(
            symbol,
            quote,
            Some(*provider),
            recorded_at,
        )))
    }
}

fn require_symbol(raw: &str) -> Result<&str, StockknockError> {
    canonical_symbol(raw).ok_or_else(|| StockknockError::InvalidInput("empty symbol".to_string()))
}
