//! Yahoo Finance v8 chart client.

use std::time::Duration;

use rust_decimal::Decimal;

use crate::client::{JsonClient, DEFAULT_TIMEOUT};
use crate::types::{parse_price, ChartResponse, Quote};
use crate::Error;

const PROVIDER: &str = "Yahoo Finance";

/// Client for `query1.finance.yahoo.com/v8/finance/chart`. No credentials.
pub struct YahooClient {
    http: JsonClient,
    base_url: String,
}

impl YahooClient {
    /// Creates a client pointing at the production Yahoo Finance host.
    pub fn new() -> Result<Self, Error> {
        Self::with_base_url("https://query1.finance.yahoo.com", DEFAULT_TIMEOUT)
    }

    /// Creates a client with a custom base URL. Used for testing with wiremock.
    pub fn with_base_url(base_url: &str, timeout: Duration) -> Result<Self, Error> {
        Ok(Self {
            http: JsonClient::new(PROVIDER, timeout)?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetches the raw daily chart envelope for `symbol`.
    pub async fn get_chart(&self, symbol: &str) -> Result<ChartResponse, Error> {
        let mut url = self
            .http
            .parse_url(&format!("{}/v8/finance/chart/", self.base_url))?;
        url.path_segments_mut()
            .map_err(|_| Error::RequestFailed)?
            .pop_if_empty()
            .push(symbol);
        url.query_pairs_mut()
            .append_pair("interval", "1d")
            .append_pair("range", "1d");
        self.http.get(url).await
    }

    /// Returns `regularMarketPrice` for `symbol`.
    ///
    /// `Ok(None)` when the chart has no result or no price. A populated
    /// `chart.error` (unknown or delisted symbol) is [`Error::Rejected`].
    pub async fn latest_price(&self, symbol: &str) -> Result<Option<Decimal>, Error> {
        Ok(self.latest_quote(symbol).await?.map(|q| q.price))
    }

    /// Like [`latest_price`](Self::latest_price), with the day's previous
    /// close, high, low and volume from the same chart meta.
    ///
    /// Only the price is required; an unreadable auxiliary figure is dropped.
    pub async fn latest_quote(&self, symbol: &str) -> Result<Option<Quote>, Error> {
        let chart = self.get_chart(symbol).await?.chart;

        if let Some(err) = chart.error {
            return Err(Error::Rejected {
                provider: PROVIDER,
                message: format!(
                    "{}: {}",
                    err.code,
                    err.description.unwrap_or_default()
                ),
            });
        }

        let Some(meta) = chart
            .result
            .and_then(|items| items.into_iter().next())
            .map(|item| item.meta)
        else {
            return Ok(None);
        };

        let price = match meta.regular_market_price {
            Some(number) => parse_price(PROVIDER, &number.to_string())?,
            None => None,
        };

        Ok(price.map(|price| Quote {
            price,
            open: auxiliary(meta.previous_close),
            high: auxiliary(meta.regular_market_day_high),
            low: auxiliary(meta.regular_market_day_low),
            volume: meta.regular_market_volume,
        }))
    }
}

fn auxiliary(number: Option<serde_json::Number>) -> Option<Decimal> {
    number.and_then(|n| parse_price(PROVIDER, &n.to_string()).ok().flatten())
}
