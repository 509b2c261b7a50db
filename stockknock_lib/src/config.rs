//! Quote resolution configuration.
//!
//! Loaded once at startup from defaults, an optional YAML file and the
//! environment, in that order of precedence. The resolver only ever reads it.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::failure_cache::DEFAULT_FAILURE_TTL;
use crate::market_hours::TradingWindow;
use crate::providers::{
    AlphaVantageProvider, ProviderError, ProviderId, QuoteProvider, TwelveDataProvider,
    YahooProvider,
};
use crate::symbol::MarketSuffixes;

/// Environment variable naming the YAML config file.
pub const CONFIG_PATH_ENV: &str = "STOCKKNOCK_CONFIG";

/// Error types for configuration loading and validation.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse config YAML: {0}")]
    Yaml(#[from] serde_yml::Error),
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Unknown quote provider: {0}")]
    UnknownProvider(String),
    #[error("Invalid {field} time: {value}")]
    InvalidTime { field: &'static str, value: String },
    #[error("Unknown time zone: {0}")]
    UnknownTimeZone(String),
    #[error("Trading window opens at {open} but closes at {close}")]
    InvalidWindow { open: String, close: String },
    #[error("Market suffixes must list one or two entries, got [{0}]")]
    InvalidSuffixes(String),
    #[error("Failed to build {provider} client: {source}")]
    Provider {
        provider: ProviderId,
        source: ProviderError,
    },
}

/// One entry in the provider chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub id: ProviderId,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
    /// `[primary, secondary]` suffixes for 6-digit market codes. `None` means
    /// the provider default (KRX suffixes for Yahoo, none otherwise); an
    /// empty list disables suffixing.
    #[serde(default)]
    pub market_suffixes: Option<Vec<String>>,
}

impl ProviderConfig {
    pub fn new(id: ProviderId) -> Self {
        Self {
            id,
            enabled: true,
            api_key: None,
            base_url: None,
            market_suffixes: None,
        }
    }

    fn suffixes(&self) -> Result<Option<MarketSuffixes>, ConfigError> {
        match self.market_suffixes.as_deref() {
            None if self.id == ProviderId::Yahoo => Ok(Some(MarketSuffixes::krx())),
            None | Some([]) => Ok(None),
            Some(list) => MarketSuffixes::from_list(list).map(Some),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TradingWindowConfig {
    pub enabled: bool,
    pub timezone: String,
    pub open: String,
    pub close: String,
}

impl Default for TradingWindowConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            timezone: "Asia/Seoul".to_string(),
            open: "09:00".to_string(),
            close: "15:30".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuoteConfig {
    /// Provider chain in priority order.
    pub providers: Vec<ProviderConfig>,
    pub trading_window: TradingWindowConfig,
    pub failure_ttl_secs: u64,
    pub request_timeout_secs: u64,
    pub update_delay_ms: u64,
}

impl Default for QuoteConfig {
    fn default() -> Self {
        Self {
            providers: vec![
                ProviderConfig::new(ProviderId::Yahoo),
                ProviderConfig::new(ProviderId::AlphaVantage),
                ProviderConfig::new(ProviderId::TwelveData),
            ],
            trading_window: TradingWindowConfig::default(),
            failure_ttl_secs: DEFAULT_FAILURE_TTL.as_secs(),
            request_timeout_secs: stockknock_quotes::DEFAULT_TIMEOUT.as_secs(),
            update_delay_ms: 500,
        }
    }
}

impl QuoteConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Builds the effective config: defaults, then the YAML file at `path`
    /// (or `STOCKKNOCK_CONFIG`), then environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let env_path = std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from);
        let path = path.map(Path::to_path_buf).or(env_path);

        let mut config = match path {
            Some(path) => {
                let yaml = std::fs::read_to_string(&path)
                    .map_err(|source| ConfigError::Io { path: path.clone(), source })?;
                tracing::debug!("Loaded quote config from {}", path.display());
                Self::from_yaml_str(&yaml)?
            }
            None => Self::default(),
        };
        config.apply_env()?;
        Ok(config)
    }

    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Applies variable overrides read through `lookup`.
    ///
    /// `QUOTE_PROVIDER_ORDER` replaces the chain with exactly the listed
    /// providers; per-provider variables then apply to whatever is in it.
    /// Unparseable numbers are ignored with a warning.
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(order) = lookup("QUOTE_PROVIDER_ORDER") {
            self.reorder(&order)?;
        }

        if let Some(flag) = lookup("YAHOO_FINANCE_ENABLED") {
            match parse_bool(&flag) {
                Some(enabled) => {
                    if let Some(p) = self.provider_mut(ProviderId::Yahoo) {
                        p.enabled = enabled;
                    }
                }
                None => tracing::warn!("Ignoring YAHOO_FINANCE_ENABLED={:?}", flag),
            }
        }
        if let Some(key) = lookup("ALPHA_VANTAGE_API_KEY") {
            if let Some(p) = self.provider_mut(ProviderId::AlphaVantage) {
                p.api_key = Some(key);
            }
        }
        if let Some(key) = lookup("TWELVE_DATA_API_KEY") {
            if let Some(p) = self.provider_mut(ProviderId::TwelveData) {
                p.api_key = Some(key);
            }
        }

        if let Some(flag) = lookup("QUOTE_MARKET_HOURS_ENABLED") {
            match parse_bool(&flag) {
                Some(enabled) => self.trading_window.enabled = enabled,
                None => tracing::warn!("Ignoring QUOTE_MARKET_HOURS_ENABLED={:?}", flag),
            }
        }
        if let Some(tz) = lookup("QUOTE_MARKET_TZ") {
            self.trading_window.timezone = tz;
        }
        if let Some(open) = lookup("QUOTE_MARKET_OPEN") {
            self.trading_window.open = open;
        }
        if let Some(close) = lookup("QUOTE_MARKET_CLOSE") {
            self.trading_window.close = close;
        }

        override_u64(&lookup, "QUOTE_FAILURE_TTL_SECS", &mut self.failure_ttl_secs);
        override_u64(&lookup, "QUOTE_REQUEST_TIMEOUT_SECS", &mut self.request_timeout_secs);
        override_u64(&lookup, "QUOTE_UPDATE_DELAY_MS", &mut self.update_delay_ms);

        self.validate()
    }

    fn reorder(&mut self, order: &str) -> Result<(), ConfigError> {
        let mut chain = Vec::new();
        for name in order.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let id: ProviderId = name
                .parse()
                .map_err(|_| ConfigError::UnknownProvider(name.to_string()))?;
            if chain.iter().any(|p: &ProviderConfig| p.id == id) {
                continue;
            }
            let entry = self
                .providers
                .iter()
                .find(|p| p.id == id)
                .cloned()
                .unwrap_or_else(|| ProviderConfig::new(id));
            chain.push(entry);
        }
        self.providers = chain;
        Ok(())
    }

    fn provider_mut(&mut self, id: ProviderId) -> Option<&mut ProviderConfig> {
        self.providers.iter_mut().find(|p| p.id == id)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.window()?;
        for provider in &self.providers {
            provider.suffixes()?;
        }
        Ok(())
    }

    /// The trading window, or `None` when the market-hours gate is disabled.
    pub fn window(&self) -> Result<Option<TradingWindow>, ConfigError> {
        if !self.trading_window.enabled {
            return Ok(None);
        }
        TradingWindow::parse(
            &self.trading_window.timezone,
            &self.trading_window.open,
            &self.trading_window.close,
        )
        .map(Some)
    }

    pub fn failure_ttl(&self) -> Duration {
        Duration::from_secs(self.failure_ttl_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn update_delay(&self) -> Duration {
        Duration::from_millis(self.update_delay_ms)
    }

    /// Instantiates the enabled providers in chain order.
    pub fn build_providers(&self) -> Result<Vec<Arc<dyn QuoteProvider>>, ConfigError> {
        let timeout = self.request_timeout();
        let mut providers: Vec<Arc<dyn QuoteProvider>> = Vec::new();

        for cfg in self.providers.iter().filter(|p| p.enabled) {
            let suffixes = cfg.suffixes()?;
            let base_url = cfg.base_url.as_deref();
            let wrap = |source| ConfigError::Provider {
                provider: cfg.id,
                source,
            };
            let provider: Arc<dyn QuoteProvider> = match cfg.id {
                ProviderId::Yahoo => {
                    Arc::new(YahooProvider::from_parts(base_url, timeout, suffixes).map_err(wrap)?)
                }
                ProviderId::AlphaVantage => Arc::new(
                    AlphaVantageProvider::from_parts(cfg.api_key.clone(), base_url, timeout, suffixes)
                        .map_err(wrap)?,
                ),
                ProviderId::TwelveData => Arc::new(
                    TwelveDataProvider::from_parts(cfg.api_key.clone(), base_url, timeout, suffixes)
                        .map_err(wrap)?,
                ),
            };
            if !provider.is_available() {
                tracing::debug!("{} is enabled but has no API key", cfg.id);
            }
            providers.push(provider);
        }

        Ok(providers)
    }
}

fn default_true() -> bool {
    true
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn override_u64(lookup: &impl Fn(&str) -> Option<String>, key: &str, slot: &mut u64) {
    let Some(raw) = lookup(key) else { return };
    match raw.trim().parse::<u64>() {
        Ok(value) => *slot = value,
        Err(_) => tracing::warn!("Ignoring {}={:?}: not a non-negative integer", key, raw),
    }
}
