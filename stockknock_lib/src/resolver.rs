//! Quote resolution: trading-hours gate, failure suppression and the
//! provider fallback chain.
//!
//! `resolve` never returns an error. Every failure mode collapses to `None`;
//! [`QuoteResolver::resolve_detailed`] says which one it was.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::clock::{Clock, SystemClock};
use crate::config::{ConfigError, QuoteConfig};
use crate::failure_cache::FailureCache;
use crate::market_hours::TradingWindow;
use crate::providers::{ProviderError, ProviderId, Quote, QuoteProvider};
use crate::stats::{ResolveStats, StatsSummary};
use crate::symbol::canonical_symbol;

/// Outcome of a single resolution.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// A provider returned a usable price.
    Resolved { quote: Quote, provider: ProviderId },
    /// The reference market is trading; no outbound call was made.
    Blackout,
    /// The symbol failed recently; no outbound call was made.
    Suppressed { retry_after: Duration },
    /// Every provider was tried and none produced a price.
    Exhausted { attempts: Vec<ProviderAttempt> },
    /// The symbol was empty after trimming.
    InvalidSymbol,
}

impl Resolution {
    pub fn price(&self) -> Option<Decimal> {
        match self {
            Self::Resolved { quote, .. } => Some(quote.price),
            _ => None,
        }
    }

    /// The full quote, with whatever session figures the provider reported.
    pub fn quote(&self) -> Option<&Quote> {
        match self {
            Self::Resolved { quote, .. } => Some(quote),
            _ => None,
        }
    }

    pub fn provider(&self) -> Option<ProviderId> {
        match self {
            Self::Resolved { provider, .. } => Some(*provider),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Resolved { .. } => "resolved",
            Self::Blackout => "market_hours",
            Self::Suppressed { .. } => "suppressed",
            Self::Exhausted { .. } => "exhausted",
            Self::InvalidSymbol => "invalid_symbol",
        }
    }
}

/// What happened when one provider was consulted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderAttempt {
    pub provider: ProviderId,
    pub outcome: AttemptOutcome,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum AttemptOutcome {
    /// The provider answered without a price.
    NoPrice,
    /// The provider returned zero or a negative number.
    InvalidPrice(Decimal),
    /// The call failed; holds the rendered error.
    Failed(String),
    Skipped(SkipReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    MissingCredentials,
}

/// Resolves symbols to latest prices.
///
/// Cheap to clone; clones share the failure cache and counters, so one
/// resolver can be handed to many tasks.
#[derive(Clone)]
pub struct QuoteResolver {
    providers: Arc<Vec<Arc<dyn QuoteProvider>>>,
    failures: Arc<FailureCache>,
    window: Option<TradingWindow>,
    clock: Arc<dyn Clock>,
    stats: Arc<ResolveStats>,
}

impl QuoteResolver {
    /// Creates a resolver over `providers` (in priority order) with the KRX
    /// trading window and the system clock.
    pub fn new(providers: Vec<Arc<dyn QuoteProvider>>, failure_ttl: Duration) -> Self {
        Self {
            providers: Arc::new(providers),
            failures: Arc::new(FailureCache::new(failure_ttl)),
            window: Some(TradingWindow::krx()),
            clock: Arc::new(SystemClock),
            stats: Arc::new(ResolveStats::new()),
        }
    }

    pub fn from_config(config: &QuoteConfig) -> Result<Self, ConfigError> {
        let providers = config.build_providers()?;
        let window = config.window()?;
        Ok(Self::new(providers, config.failure_ttl()).with_trading_window(window))
    }

    /// Replaces the trading window. `None` disables the market-hours gate.
    pub fn with_trading_window(mut self, window: Option<TradingWindow>) -> Self {
        self.window = window;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Shares an existing failure cache instead of the resolver's own.
    pub fn with_failure_cache(mut self, failures: Arc<FailureCache>) -> Self {
        self.failures = failures;
        self
    }

    /// Latest price for `symbol`, or `None`.
    pub async fn resolve(&self, symbol: &str) -> Option<Decimal> {
        self.resolve_detailed(symbol).await.price()
    }

    pub async fn resolve_detailed(&self, symbol: &str) -> Resolution {
        self.stats.record_request();

        let Some(symbol) = canonical_symbol(symbol) else {
            self.stats.record_invalid();
            return Resolution::InvalidSymbol;
        };

        let now = self.clock.now();
        if self.window.is_some_and(|w| w.contains(now)) {
            tracing::debug!("Market is open, not fetching {}", symbol);
            self.stats.record_blackout();
            return Resolution::Blackout;
        }

        if let Some(retry_after) = self.failures.suppressed_for(symbol, now) {
            tracing::debug!(
                "Skipping {}: failed recently, retry in {}s",
                symbol,
                retry_after.as_secs()
            );
            self.stats.record_suppressed();
            return Resolution::Suppressed { retry_after };
        }

        let mut attempts = Vec::with_capacity(self.providers.len());
        for provider in self.providers.iter() {
            let id = provider.id();
            if !provider.is_available() {
                tracing::debug!("Skipping {} for {}: no API key", id, symbol);
                attempts.push(ProviderAttempt {
                    provider: id,
                    outcome: AttemptOutcome::Skipped(SkipReason::MissingCredentials),
                });
                continue;
            }

            tracing::debug!("Requesting {} from {}", symbol, id);
            let outcome = match provider.try_fetch(symbol).await {
                Ok(Some(quote)) if quote.price > Decimal::ZERO => {
                    tracing::info!("Resolved {} = {} via {}", symbol, quote.price, id);
                    self.stats.record_resolved();
                    return Resolution::Resolved { quote, provider: id };
                }
                Ok(Some(quote)) => {
                    tracing::warn!(
                        "{} returned non-positive price {} for {}",
                        id,
                        quote.price,
                        symbol
                    );
                    AttemptOutcome::InvalidPrice(quote.price)
                }
                Ok(None) => {
                    tracing::debug!("{} has no price for {}", id, symbol);
                    AttemptOutcome::NoPrice
                }
                Err(ProviderError::MissingCredentials(_)) => {
                    AttemptOutcome::Skipped(SkipReason::MissingCredentials)
                }
                Err(e) => {
                    tracing::warn!("{} failed for {}: {}", id, symbol, e);
                    self.stats.record_provider_error();
                    AttemptOutcome::Failed(e.to_string())
                }
            };
            attempts.push(ProviderAttempt { provider: id, outcome });
        }

        self.failures.record_failure(symbol, self.clock.now());
        self.stats.record_exhausted();
        tracing::warn!(
            "No provider could price {} ({} tried), suppressing for {}s",
            symbol,
            attempts.len(),
            self.failures.ttl().as_secs()
        );
        Resolution::Exhausted { attempts }
    }

    /// Current instant according to the resolver's clock.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// True when the market-hours gate would block outbound calls right now.
    pub fn is_market_open(&self) -> bool {
        self.window.is_some_and(|w| w.contains(self.clock.now()))
    }

    /// Forgets a recorded failure so the next resolve goes to the providers.
    pub fn clear_failure(&self, symbol: &str) -> bool {
        canonical_symbol(symbol).is_some_and(|s| self.failures.clear(s))
    }

    /// Drops all expired failure entries. Returns how many were removed.
    pub fn sweep_expired(&self) -> usize {
        let removed = self.failures.sweep_expired(self.clock.now());
        if removed > 0 {
            tracing::debug!("Swept {} expired failure entries", removed);
        }
        removed
    }

    pub fn stats(&self) -> StatsSummary {
        self.stats.summary()
    }

    pub fn failure_cache(&self) -> &FailureCache {
        &self.failures
    }

    pub fn trading_window(&self) -> Option<&TradingWindow> {
        self.window.as_ref()
    }

    /// Provider ids in chain order.
    pub fn provider_ids(&self) -> Vec<ProviderId> {
        self.providers.iter().map(|p| p.id()).collect()
    }
}
