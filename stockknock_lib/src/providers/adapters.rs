//! Adapters from the raw `stockknock_quotes` clients to [`QuoteProvider`].

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use stockknock_quotes::{AlphaVantageClient, Quote, TwelveDataClient, YahooClient};

use super::{ProviderError, ProviderId, QuoteProvider};
use crate::symbol::MarketSuffixes;

/// Yahoo Finance chart API. Needs no key and applies KRX suffixes by default.
pub struct YahooProvider {
    client: YahooClient,
    suffixes: Option<MarketSuffixes>,
}

impl YahooProvider {
    pub fn new(client: YahooClient, suffixes: Option<MarketSuffixes>) -> Self {
        Self { client, suffixes }
    }

    pub fn from_parts(
        base_url: Option<&str>,
        timeout: Duration,
        suffixes: Option<MarketSuffixes>,
    ) -> Result<Self, ProviderError> {
        let client = match base_url {
            Some(url) => YahooClient::with_base_url(url, timeout)?,
            None => YahooClient::with_base_url("https://query1.finance.yahoo.com", timeout)?,
        };
        Ok(Self::new(client, suffixes))
    }
}

#[async_trait]
impl QuoteProvider for YahooProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Yahoo
    }

    async fn try_fetch(&self, symbol: &str) -> Result<Option<Quote>, ProviderError> {
        let client = &self.client;
        fetch_with_suffixes(ProviderId::Yahoo, self.suffixes.as_ref(), symbol, |s| async move {
            client.latest_quote(&s).await
        })
        .await
    }
}

/// Alpha Vantage GLOBAL_QUOTE. Unavailable without an API key.
pub struct AlphaVantageProvider {
    client: Option<AlphaVantageClient>,
    suffixes: Option<MarketSuffixes>,
}

impl AlphaVantageProvider {
    pub fn from_parts(
        api_key: Option<String>,
        base_url: Option<&str>,
        timeout: Duration,
        suffixes: Option<MarketSuffixes>,
    ) -> Result<Self, ProviderError> {
        let client = match api_key.filter(|k| !k.trim().is_empty()) {
            Some(key) => Some(AlphaVantageClient::with_base_url(
                base_url.unwrap_or("https://www.alphavantage.co"),
                key,
                timeout,
            )?),
            None => None,
        };
        Ok(Self { client, suffixes })
    }
}

#[async_trait]
impl QuoteProvider for AlphaVantageProvider {
    fn id(&self) -> ProviderId {
        ProviderId::AlphaVantage
    }

    fn is_available(&self) -> bool {
        self.client.is_some()
    }

    async fn try_fetch(&self, symbol: &str) -> Result<Option<Quote>, ProviderError> {
        let client = self
            .client
            .as_ref()
            .ok_or(ProviderError::MissingCredentials(ProviderId::AlphaVantage))?;
        fetch_with_suffixes(
            ProviderId::AlphaVantage,
            self.suffixes.as_ref(),
            symbol,
            |s| async move {
                client
                    .latest_price(&s)
                    .await
                    .map(|price| price.map(Quote::from_price))
            },
        )
        .await
    }
}

/// Twelve Data `/price`. Unavailable without an API key.
pub struct TwelveDataProvider {
    client: Option<TwelveDataClient>,
    suffixes: Option<MarketSuffixes>,
}

impl TwelveDataProvider {
    pub fn from_parts(
        api_key: Option<String>,
        base_url: Option<&str>,
        timeout: Duration,
        suffixes: Option<MarketSuffixes>,
    ) -> Result<Self, ProviderError> {
        let client = match api_key.filter(|k| !k.trim().is_empty()) {
            Some(key) => Some(TwelveDataClient::with_base_url(
                base_url.unwrap_or("https://api.twelvedata.com"),
                key,
                timeout,
            )?),
            None => None,
        };
        Ok(Self { client, suffixes })
    }
}

#[async_trait]
impl QuoteProvider for TwelveDataProvider {
    fn id(&self) -> ProviderId {
        ProviderId::TwelveData
    }

    fn is_available(&self) -> bool {
        self.client.is_some()
    }

    async fn try_fetch(&self, symbol: &str) -> Result<Option<Quote>, ProviderError> {
        let client = self
            .client
            .as_ref()
            .ok_or(ProviderError::MissingCredentials(ProviderId::TwelveData))?;
        fetch_with_suffixes(
            ProviderId::TwelveData,
            self.suffixes.as_ref(),
            symbol,
            |s| async move {
                client
                    .latest_price(&s)
                    .await
                    .map(|price| price.map(Quote::from_price))
            },
        )
        .await
    }
}

/// Runs `fetch` for each provider-side form of `symbol` until one yields a
/// positive price.
///
/// Without suffixes, or for symbols that are not numeric market codes, this
/// is a single call. For a market code the secondary suffix is tried only
/// when the primary was rejected, had no price or priced at zero or below;
/// a transient error stops the attempt. Returns the outcome of the last form
/// tried.
pub(crate) async fn fetch_with_suffixes<F, Fut>(
    provider: ProviderId,
    suffixes: Option<&MarketSuffixes>,
    symbol: &str,
    fetch: F,
) -> Result<Option<Quote>, ProviderError>
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = Result<Option<Quote>, stockknock_quotes::Error>>,
{
    let candidates = match suffixes {
        Some(sfx) => sfx.candidates(symbol),
        None => vec![symbol.to_string()],
    };

    let mut last = Ok(None);
    for candidate in candidates {
        match fetch(candidate.clone()).await {
            Ok(Some(quote)) if quote.price > Decimal::ZERO => return Ok(Some(quote)),
            Ok(Some(quote)) => {
                tracing::debug!(
                    "{} returned non-positive price {} for {}",
                    provider,
                    quote.price,
                    candidate
                );
                last = Ok(Some(quote));
            }
            Ok(None) => {
                tracing::debug!("{} has no price for {}", provider, candidate);
                last = Ok(None);
            }
            Err(e) => {
                let err = ProviderError::from(e);
                tracing::debug!("{} failed for {}: {}", provider, candidate, err);
                if err.is_transient() {
                    return Err(err);
                }
                last = Err(err);
            }
        }
    }
    last
}
