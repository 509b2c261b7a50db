//! Alpha Vantage `GLOBAL_QUOTE` client.
//!
//! Free tier is 25 requests/day and 5/minute, so throttling is common and is
//! reported in the body of an HTTP 200 response.

use std::time::Duration;

use rust_decimal::Decimal;

use crate::client::{JsonClient, DEFAULT_TIMEOUT};
use crate::types::{parse_price, GlobalQuoteResponse};
use crate::Error;

const PROVIDER: &str = "Alpha Vantage";

pub struct AlphaVantageClient {
    http: JsonClient,
    api_key: String,
    base_url: String,
}

impl AlphaVantageClient {
    /// Creates a client pointing at `www.alphavantage.co`.
    pub fn new(api_key: String) -> Result<Self, Error> {
        Self::with_base_url("https://www.alphavantage.co", api_key, DEFAULT_TIMEOUT)
    }

    /// Creates a client with a custom base URL. Used for testing with wiremock.
    pub fn with_base_url(base_url: &str, api_key: String, timeout: Duration) -> Result<Self, Error> {
        Ok(Self {
            http: JsonClient::new(PROVIDER, timeout)?,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub async fn get_global_quote(&self, symbol: &str) -> Result<GlobalQuoteResponse, Error> {
        let mut url = self.http.parse_url(&format!("{}/query", self.base_url))?;
        url.query_pairs_mut()
            .append_pair("function", "GLOBAL_QUOTE")
            .append_pair("symbol", symbol)
            .append_pair("apikey", &self.api_key);
        self.http.get(url).await
    }

    /// Returns the `05. price` field for `symbol`.
    ///
    /// `Note`/`Information` bodies are throttling notices and map to
    /// [`Error::RateLimited`]; `Error Message` maps to [`Error::Rejected`].
    /// An empty `Global Quote` object means the symbol is unknown: `Ok(None)`.
    pub async fn latest_price(&self, symbol: &str) -> Result<Option<Decimal>, Error> {
        let resp = self.get_global_quote(symbol).await?;

        if resp.note.is_some() || resp.information.is_some() {
            return Err(Error::RateLimited { provider: PROVIDER });
        }

        if let Some(message) = resp.error_message {
            return Err(Error::Rejected {
                provider: PROVIDER,
                message,
            });
        }

        match resp.global_quote.and_then(|q| q.price) {
            Some(raw) => parse_price(PROVIDER, &raw),
            None => Ok(None),
        }
    }
}
