//! Shared HTTP plumbing for the provider clients.

use std::time::Duration;

use serde::de::DeserializeOwned;
use url::Url;

use crate::{user_agent::get_user_agent, Error};

/// Per-call network timeout applied to every provider request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Thin wrapper around `reqwest::Client` that fetches and decodes JSON.
///
/// Non-success statuses become [`Error::HttpStatus`] with a truncated body;
/// bodies that do not decode become [`Error::Parse`].
pub(crate) struct JsonClient {
    http: reqwest::Client,
    provider: &'static str,
}

impl JsonClient {
    pub(crate) fn new(provider: &'static str, timeout: Duration) -> Result<Self, Error> {
        let http = reqwest::Client::builder()
            .user_agent(get_user_agent())
            .timeout(timeout)
            .build()
            .map_err(|e| {
                tracing::error!("Failed to build HTTP client for {}: {}", provider, e);
                Error::RequestFailed
            })?;
        Ok(Self { http, provider })
    }

    pub(crate) fn parse_url(&self, raw: &str) -> Result<Url, Error> {
        Url::parse(raw).map_err(|e| {
            tracing::error!("Invalid {} URL {}: {}", self.provider, raw, e);
            Error::RequestFailed
        })
    }

    /// GET `url` and decode the body as `T`.
    ///
    /// `url` may carry an API key in its query string, so only the path is logged.
    pub(crate) async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        tracing::debug!("{} GET {}", self.provider, url.path());
        let resp = self
            .http
            .get(url)
            .header("accept", "application/json, text/plain, */*")
            .send()
            .await
            .map_err(|e| {
                tracing::warn!("{} request failed: {}", self.provider, e.without_url());
                Error::RequestFailed
            })?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| {
            tracing::warn!("{} response body unreadable: {}", self.provider, e.without_url());
            Error::RequestFailed
        })?;

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(Error::RateLimited {
                provider: self.provider,
            });
        }

        if !status.is_success() {
            let snippet = truncate_body(&body);
            tracing::warn!("{} returned status {}: {}", self.provider, status, snippet);
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                body: snippet,
            });
        }

        serde_json::from_str::<T>(&body).map_err(|e| Error::Parse {
            provider: self.provider,
            message: format!("{} | body: {}", e, truncate_body(&body)),
        })
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 500;
    if body.len() <= MAX {
        return body.to_string();
    }
    let mut end = MAX;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...[truncated]", &body[..end])
}
