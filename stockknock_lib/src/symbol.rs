//! Symbol canonicalization and per-provider market suffixes.
//!
//! Korean listings are commonly referred to by their 6-digit KRX code
//! (`005930`), but most quote APIs want an exchange-qualified form
//! (`005930.KS` for KOSPI, `005930.KQ` for KOSDAQ). The suffix is applied
//! inside the provider adapter only; the resolver and the failure cache always
//! see the canonical symbol.

use crate::config::ConfigError;

/// Trims surrounding whitespace. Returns `None` for a blank symbol.
pub fn canonical_symbol(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

/// True for a purely numeric 6-digit market code such as `005930`.
pub fn is_numeric_market_code(symbol: &str) -> bool {
    symbol.len() == 6 && symbol.bytes().all(|b| b.is_ascii_digit())
}

/// Suffixes to try, in order, for numeric market codes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketSuffixes {
    primary: String,
    secondary: Option<String>,
}

impl MarketSuffixes {
    pub fn new(primary: impl Into<String>, secondary: Option<String>) -> Self {
        Self {
            primary: primary.into(),
            secondary,
        }
    }

    /// KOSPI first, then KOSDAQ.
    pub fn krx() -> Self {
        Self::new(".KS", Some(".KQ".to_string()))
    }

    /// Builds suffixes from a configured list of one or two entries.
    pub fn from_list(list: &[String]) -> Result<Self, ConfigError> {
        match list {
            [primary] => Ok(Self::new(primary.clone(), None)),
            [primary, secondary] => Ok(Self::new(primary.clone(), Some(secondary.clone()))),
            _ => Err(ConfigError::InvalidSuffixes(list.join(","))),
        }
    }

    pub fn primary(&self) -> &str {
        &self.primary
    }

    pub fn secondary(&self) -> Option<&str> {
        self.secondary.as_deref()
    }

    /// Provider-side symbols to try for `symbol`, in order.
    ///
    /// Numeric market codes get the primary then the secondary suffix; any
    /// other symbol is passed through unchanged.
    pub fn candidates(&self, symbol: &str) -> Vec<String> {
        if !is_numeric_market_code(symbol) {
            return vec![symbol.to_string()];
        }
        let mut out = vec![format!("{}{}", symbol, self.primary)];
        if let Some(secondary) = &self.secondary {
            out.push(format!("{}{}", symbol, secondary));
        }
        out
    }
}
