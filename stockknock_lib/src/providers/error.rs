//! Error types for quote provider adapters.

use thiserror::Error;

use super::ProviderId;

/// Why a single provider could not produce a price.
///
/// Always recovered inside the resolver by moving on to the next provider.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("{0} has no API key configured")]
    MissingCredentials(ProviderId),
    #[error(transparent)]
    Upstream(#[from] stockknock_quotes::Error),
}

impl ProviderError {
    /// Throttling and transport failures say nothing about the symbol, so a
    /// second market suffix is not worth trying after one.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Upstream(stockknock_quotes::Error::RateLimited { .. })
                | Self::Upstream(stockknock_quotes::Error::RequestFailed)
        )
    }
}
