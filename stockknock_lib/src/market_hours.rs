//! Trading-hours blackout window.
//!
//! While the reference exchange is trading, callers read persisted history
//! and the resolver makes no outbound calls.

use chrono::{DateTime, NaiveTime, Utc};
use chrono_tz::Tz;

use crate::config::ConfigError;

/// A daily local-time interval, inclusive at both ends, in a fixed time zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TradingWindow {
    tz: Tz,
    open: NaiveTime,
    close: NaiveTime,
}

impl TradingWindow {
    /// Creates a window. `open` must not be later than `close`.
    pub fn new(tz: Tz, open: NaiveTime, close: NaiveTime) -> Result<Self, ConfigError> {
        if open > close {
            return Err(ConfigError::InvalidWindow {
                open: open.to_string(),
                close: close.to_string(),
            });
        }
        Ok(Self { tz, open, close })
    }

    /// Korea Exchange regular session: 09:00-15:30 Asia/Seoul.
    pub fn krx() -> Self {
        Self {
            tz: chrono_tz::Asia::Seoul,
            open: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or_default(),
            close: NaiveTime::from_hms_opt(15, 30, 0).unwrap_or_default(),
        }
    }

    /// Builds a window from `HH:MM` strings and an IANA zone name.
    pub fn parse(timezone: &str, open: &str, close: &str) -> Result<Self, ConfigError> {
        let tz: Tz = timezone
            .parse()
            .map_err(|_| ConfigError::UnknownTimeZone(timezone.to_string()))?;
        Self::new(tz, parse_time("open", open)?, parse_time("close", close)?)
    }

    /// True when `instant`, seen in the window's zone, falls within `[open, close]`.
    ///
    /// Sub-second precision counts: 15:30:00.5 is already past a 15:30 close.
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        let local = instant.with_timezone(&self.tz).time();
        local >= self.open && local <= self.close
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    pub fn open(&self) -> NaiveTime {
        self.open
    }

    pub fn close(&self) -> NaiveTime {
        self.close
    }
}

fn parse_time(field: &'static str, value: &str) -> Result<NaiveTime, ConfigError> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .map_err(|_| ConfigError::InvalidTime {
            field,
            value: value.to_string(),
        })
}
