//! Tick: a single trade print for one instrument.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// A trade tick. The timestamp is always normalized to UTC on construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tick {
    pub instrument: String,
    pub price: f64,
    pub volume: u64,
    pub timestamp: DateTime<Utc>,
}

impl Tick {
    pub fn new(instrument: impl Into<String>, price: f64, volume: u64, timestamp: DateTime<Utc>) -> Self {
        Self {
            instrument: instrument.into(),
            price,
            volume,
            timestamp,
        }
    }

    /// Build a tick from a naive timestamp, which is taken to be UTC.
    pub fn from_naive(
        instrument: impl Into<String>,
        price: f64,
        volume: u64,
        timestamp: NaiveDateTime,
    ) -> Self {
        Self::new(instrument, price, volume, Utc.from_utc_datetime(&timestamp))
    }

    /// Build a tick from a timestamp in any zone.
    pub fn from_zoned<Tz: TimeZone>(
        instrument: impl Into<String>,
        price: f64,
        volume: u64,
        timestamp: DateTime<Tz>,
    ) -> Self {
        Self::new(instrument, price, volume, timestamp.with_timezone(&Utc))
    }

    /// Boundary check: rejects prices the aggregator cannot fold.
    pub fn validate(&self) -> Result<(), EngineError> {
        if !self.price.is_finite() {
            return Err(self.malformed(format!("non-finite price {}", self.price)));
        }
        if self.price <= 0.0 {
            return Err(self.malformed(format!("non-positive price {}", self.price)));
        }
        Ok(())
    }

    fn malformed(&self, reason: String) -> EngineError {
        EngineError::MalformedTick {
            instrument: self.instrument.clone(),
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, NaiveDate};

    #[test]
    fn naive_and_zoned_normalize_to_same_instant() {
        let naive = NaiveDate::from_ymd_opt(2024, 10, 21)
            .unwrap()
            .and_hms_opt(14, 30, 0)
            .unwrap();
        let a = Tick::from_naive("ES", 5800.0, 1, naive);

        let eastern = FixedOffset::west_opt(4 * 3600).unwrap();
        let zoned = eastern.with_ymd_and_hms(2024, 10, 21, 10, 30, 0).unwrap();
        let b = Tick::from_zoned("ES", 5800.0, 1, zoned);

        assert_eq!(a.timestamp, b.timestamp);
    }

    #[test]
    fn validate_rejects_nan_and_negative() {
        let ts = Utc.with_ymd_and_hms(2024, 10, 21, 14, 30, 0).unwrap();
        assert!(Tick::new("ES", 5800.0, 1, ts).validate().is_ok());
        assert!(matches!(
            Tick::new("ES", f64::NAN, 1, ts).validate(),
            Err(EngineError::MalformedTick { .. })
        ));
        assert!(Tick::new("ES", f64::INFINITY, 1, ts).validate().is_err());
        assert!(Tick::new("ES", -1.0, 1, ts).validate().is_err());
    }
}
