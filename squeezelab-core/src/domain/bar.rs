//! Bar: fixed-interval OHLCV aggregation of ticks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// OHLCV bar for a single instrument over one interval.
///
/// Immutable once sealed into history; the in-progress bar is updated in
/// place by the aggregator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub start_time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl Bar {
    /// Open a new bar from its first tick.
    pub fn open_at(start_time: DateTime<Utc>, price: f64, volume: u64) -> Self {
        Self {
            start_time,
            open: price,
            high: price,
            low: price,
            close: price,
            volume,
        }
    }

    /// Fold another tick into this bar.
    pub fn update(&mut self, price: f64, volume: u64) {
        self.high = self.high.max(price);
        self.low = self.low.min(price);
        self.close = price;
        self.volume = self.volume.saturating_add(volume);
    }

    /// Returns true if any OHLC field is NaN (void bar).
    pub fn is_void(&self) -> bool {
        self.open.is_nan() || self.high.is_nan() || self.low.is_nan() || self.close.is_nan()
    }

    /// Basic OHLC sanity check: high bounds everything from above, low from below.
    pub fn is_sane(&self) -> bool {
        if self.is_void() {
            return false;
        }
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
    }
}

/// A warmup record as delivered by the historical backfill feed.
///
/// Any OHLC field may be missing; such records are skipped during warmup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalBar {
    pub timestamp: DateTime<Utc>,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub volume: Option<u64>,
}

impl HistoricalBar {
    /// A fully populated record.
    pub fn complete(timestamp: DateTime<Utc>, open: f64, high: f64, low: f64, close: f64, volume: u64) -> Self {
        Self {
            timestamp,
            open: Some(open),
            high: Some(high),
            low: Some(low),
            close: Some(close),
            volume: Some(volume),
        }
    }

    /// Convert into a closed [`Bar`], rejecting records with missing or
    /// non-finite OHLC values. Missing volume counts as zero.
    pub fn to_bar(&self, instrument: &str) -> Result<Bar, EngineError> {
        let field = |name: &str, value: Option<f64>| -> Result<f64, EngineError> {
            match value {
                Some(v) if v.is_finite() => Ok(v),
                Some(v) => Err(self.malformed(instrument, format!("non-finite {name} {v}"))),
                None => Err(self.malformed(instrument, format!("missing {name}"))),
            }
        };
        let bar = Bar {
            start_time: self.timestamp,
            open: field("open", self.open)?,
            high: field("high", self.high)?,
            low: field("low", self.low)?,
            close: field("close", self.close)?,
            volume: self.volume.unwrap_or(0),
        };
        if !bar.is_sane() {
            return Err(self.malformed(instrument, "high/low do not bound open/close".into()));
        }
        Ok(bar)
    }

    fn malformed(&self, instrument: &str, reason: String) -> EngineError {
        EngineError::MalformedBar {
            instrument: instrument.to_string(),
            timestamp: self.timestamp.to_rfc3339(),
            reason,
        }
    }
}
