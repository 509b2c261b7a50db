//! Error types for the provider clients.

/// Errors that can occur when requesting a quote from a provider.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// An HTTP request failed (network error, timeout, or client construction).
    #[error("Request failed")]
    RequestFailed,
    /// The provider returned a non-success status with a body snippet.
    #[error("Request failed with status {status}")]
    HttpStatus { status: u16, body: String },
    /// The provider answered with its rate-limit message.
    #[error("Rate limited by {provider}")]
    RateLimited { provider: &'static str },
    /// The provider reported an error for this symbol in the response body.
    #[error("{provider} rejected the request: {message}")]
    Rejected {
        provider: &'static str,
        message: String,
    },
    /// The response body or price field could not be parsed.
    #[error("Failed to parse {provider} response: {message}")]
    Parse {
        provider: &'static str,
        message: String,
    },
}
