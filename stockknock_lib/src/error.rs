//! Error types for the library layer.

use std::fmt;

use crate::config::ConfigError;
use crate::db::DbError;

/// Errors surfaced by library operations that are not part of quote
/// resolution itself. `QuoteResolver::resolve` never produces one.
#[derive(Debug)]
pub enum StockknockError {
    /// Configuration could not be loaded or validated.
    Config(ConfigError),
    /// The price history store failed.
    Db(DbError),
    /// User-provided input failed validation.
    InvalidInput(String),
}

impl fmt::Display for StockknockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "Config error: {}", e),
            Self::Db(e) => write!(f, "Database error: {}", e),
            Self::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
        }
    }
}

impl std::error::Error for StockknockError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Db(e) => Some(e),
            Self::InvalidInput(_) => None,
        }
    }
}

impl From<ConfigError> for StockknockError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<DbError> for StockknockError {
    fn from(e: DbError) -> Self {
        Self::Db(e)
    }
}
