//! HTTP clients for the external quote providers used by stockknock.
//!
//! Each client knows one provider's request and response shape and reduces it
//! to "latest price or nothing". Fallback ordering, caching and market-hours
//! rules live in `stockknock_lib`.

pub mod alpha_vantage;
mod client;
mod errors;
pub mod twelve_data;
pub mod types;
mod user_agent;
pub mod yahoo;

pub use self::alpha_vantage::AlphaVantageClient;
pub use self::client::DEFAULT_TIMEOUT;
pub use self::errors::Error;
pub use self::twelve_data::TwelveDataClient;
pub use self::types::Quote;
pub use self::yahoo::YahooClient;
