//! Trading-session calendar in the exchange's local time.
//!
//! Timestamps arrive in UTC and are converted with `chrono-tz`, so daylight
//! saving transitions move the session with the exchange clock.

use chrono::{DateTime, Datelike, NaiveTime, Utc, Weekday};
use chrono_tz::Tz;
use serde::Serialize;

use crate::config::StrategyConfig;

/// Where a timestamp falls relative to the trading day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// Inside `[session_start, session_end)` on a weekday.
    Open,
    /// Inside `[session_end, market_close)`: open positions are liquidated.
    ForceClose,
    Closed,
}

#[derive(Debug, Clone)]
pub struct SessionGate {
    timezone: Tz,
    start: NaiveTime,
    end: NaiveTime,
    market_close: NaiveTime,
}

impl SessionGate {
    pub fn new(timezone: Tz, start: NaiveTime, end: NaiveTime, market_close: NaiveTime) -> Self {
        Self {
            timezone,
            start,
            end,
            market_close,
        }
    }

    pub fn from_config(config: &StrategyConfig) -> Self {
        Self::new(
            config.timezone,
            config.session_start,
            config.session_end,
            config.market_close,
        )
    }

    fn local_time(&self, ts: DateTime<Utc>) -> DateTime<Tz> {
        ts.with_timezone(&self.timezone)
    }

    /// Weekday and `start <= local time < end`.
    pub fn is_trading_session(&self, ts: DateTime<Utc>) -> bool {
        let local = self.local_time(ts);
        if matches!(local.weekday(), Weekday::Sat | Weekday::Sun) {
            return false;
        }
        let time = local.time();
        self.start <= time && time < self.end
    }

    /// `end <= local time < market_close`, on any day.
    pub fn should_force_close(&self, ts: DateTime<Utc>) -> bool {
        let time = self.local_time(ts).time();
        self.end <= time && time < self.market_close
    }

    pub fn phase(&self, ts: DateTime<Utc>) -> SessionPhase {
        if self.is_trading_session(ts) {
            SessionPhase::Open
        } else if self.should_force_close(ts) {
            SessionPhase::ForceClose
        } else {
            SessionPhase::Closed
        }
    }
}
