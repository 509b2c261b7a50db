//! Twelve Data `/price` client.

use std::time::Duration;

use rust_decimal::Decimal;

use crate::client::{JsonClient, DEFAULT_TIMEOUT};
use crate::types::{parse_price, PriceResponse};
use crate::Error;

const PROVIDER: &str = "Twelve Data";

pub struct TwelveDataClient {
    http: JsonClient,
    api_key: String,
    base_url: String,
}

impl TwelveDataClient {
    /// Creates a client pointing at `api.twelvedata.com`.
    pub fn new(api_key: String) -> Result<Self, Error> {
        Self::with_base_url("https://api.twelvedata.com", api_key, DEFAULT_TIMEOUT)
    }

    /// Creates a client with a custom base URL. Used for testing with wiremock.
    pub fn with_base_url(base_url: &str, api_key: String, timeout: Duration) -> Result<Self, Error> {
        Ok(Self {
            http: JsonClient::new(PROVIDER, timeout)?,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Returns the real-time price for `symbol`.
    ///
    /// Twelve Data reports errors in the body, usually with HTTP 200. Code 429
    /// is throttling; any other code is a rejection of the symbol or key.
    pub async fn latest_price(&self, symbol: &str) -> Result<Option<Decimal>, Error> {
        let mut url = self.http.parse_url(&format!("{}/price", self.base_url))?;
        url.query_pairs_mut()
            .append_pair("symbol", symbol)
            .append_pair("apikey", &self.api_key);
        let resp: PriceResponse = self.http.get(url).await?;

        if resp.is_error() {
            if resp.code == Some(429) {
                return Err(Error::RateLimited { provider: PROVIDER });
            }
            return Err(Error::Rejected {
                provider: PROVIDER,
                message: resp
                    .message
                    .unwrap_or_else(|| format!("error code {}", resp.code.unwrap_or_default())),
            });
        }

        match resp.price {
            Some(raw) => parse_price(PROVIDER, &raw),
            None => Ok(None),
        }
    }
}
