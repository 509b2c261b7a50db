mod alpha_vantage;
pub use self::alpha_vantage::{GlobalQuote, GlobalQuoteResponse};

mod twelve_data;
pub use self::twelve_data::PriceResponse;

mod yahoo;
pub use self::yahoo::{ChartError, ChartMeta, ChartResponse, ChartResult, ChartResultItem};

use std::str::FromStr;

use rust_decimal::Decimal;

use crate::Error;

/// Latest price plus whatever session figures the provider reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quote {
    pub price: Decimal,
    /// Yahoo's chart meta carries no session open; `previousClose` fills it.
    pub open: Option<Decimal>,
    pub high: Option<Decimal>,
    pub low: Option<Decimal>,
    pub volume: Option<u64>,
}

impl Quote {
    /// A quote with only a price, for providers that report nothing else.
    pub fn from_price(price: Decimal) -> Self {
        Self {
            price,
            open: None,
            high: None,
            low: None,
            volume: None,
        }
    }
}

/// Parses a provider price string. Blank strings mean "no price".
pub(crate) fn parse_price(provider: &'static str, raw: &str) -> Result<Option<Decimal>, Error> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .map(Some)
        .map_err(|e| Error::Parse {
            provider,
            message: format!("invalid price {:?}: {}", trimmed, e),
        })
}
