//! The quote provider capability and its concrete adapters.

mod adapters;
mod error;
#[cfg(test)]
pub(crate) mod stub;

pub use adapters::{AlphaVantageProvider, TwelveDataProvider, YahooProvider};
pub use error::ProviderError;
pub use stockknock_quotes::Quote;

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Identifies a quote source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderId {
    Yahoo,
    AlphaVantage,
    TwelveData,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Yahoo => "yahoo",
            Self::AlphaVantage => "alpha_vantage",
            Self::TwelveData => "twelve_data",
        }
    }

    /// Whether the provider refuses to work without an API key.
    pub fn requires_api_key(&self) -> bool {
        !matches!(self, Self::Yahoo)
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "yahoo" | "yahoo_finance" => Ok(Self::Yahoo),
            "alpha_vantage" | "alphavantage" => Ok(Self::AlphaVantage),
            "twelve_data" | "twelvedata" => Ok(Self::TwelveData),
            other => Err(other.to_string()),
        }
    }
}

/// A source of latest prices.
///
/// Implementations translate their provider's request and response shapes
/// into a uniform "price or nothing" answer. They never see the failure cache
/// or the trading window.
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    fn id(&self) -> ProviderId;

    /// False when the provider lacks credentials it needs. Unavailable
    /// providers are skipped without a call.
    fn is_available(&self) -> bool {
        true
    }

    /// Fetches the latest quote for the canonical `symbol`.
    ///
    /// `Ok(None)` means the provider answered but had no price. Only
    /// [`Quote::price`] is guaranteed; providers fill the session figures
    /// they have.
    async fn try_fetch(&self, symbol: &str) -> Result<Option<Quote>, ProviderError>;
}
