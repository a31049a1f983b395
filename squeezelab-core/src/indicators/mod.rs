//! Indicator implementations.
//!
//! Window indicators are pure: an ordered bar slice in, the value at the
//! newest bar out. The slice handed in by the engine ends with the
//! in-progress bar, so every value is a live estimate that never looks past
//! the latest tick. Parabolic SAR is the exception: it is recursive and
//! carries its own state between closed bars.

pub mod atr;
pub mod bollinger;
pub mod ema;
pub mod keltner;
pub mod lowest_low;
pub mod momentum;
pub mod parabolic_sar;
pub mod snapshot;

pub use atr::Atr;
pub use bollinger::Bollinger;
pub use ema::MacdHistogram;
pub use keltner::Keltner;
pub use lowest_low::LowestLow;
pub use momentum::TtmMomentum;
pub use parabolic_sar::{ParabolicSar, Trend};
pub use snapshot::{IndicatorSet, IndicatorSnapshot};

use serde::{Deserialize, Serialize};

use crate::domain::Bar;

/// Trait for window indicators.
///
/// # Look-ahead guard
/// `compute` sees only the slice it is given; the value for the newest bar
/// must not change when bars are appended after it.
pub trait Indicator: Send + Sync {
    type Output;

    /// Human-readable name (e.g., "bollinger_18_2").
    fn name(&self) -> &str;

    /// Number of bars needed for a full-window value.
    fn lookback(&self) -> usize;

    /// Value at the newest bar of `bars`, or `None` when there is not enough data.
    fn compute(&self, bars: &[Bar]) -> Option<Self::Output>;
}

/// Upper/middle/lower envelope produced by Bollinger and Keltner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bands {
    pub middle: f64,
    pub upper: f64,
    pub lower: f64,
}

impl Bands {
    pub fn around(middle: f64, half_width: f64) -> Self {
        Self {
            middle,
            upper: middle + half_width,
            lower: middle - half_width,
        }
    }

    /// True when `self` lies strictly inside `outer` on both sides.
    pub fn strictly_inside(&self, outer: &Bands) -> bool {
        self.upper < outer.upper && self.lower > outer.lower
    }
}

/// Mean of the closes of the last `period` bars (all bars if fewer).
pub(crate) fn mean_close(bars: &[Bar], period: usize) -> f64 {
    let window = &bars[bars.len().saturating_sub(period)..];
    if window.is_empty() {
        return f64::NAN;
    }
    window.iter().map(|b| b.close).sum::<f64>() / window.len() as f64
}

/// Create synthetic bars from close prices for testing.
///
/// open = prev_close (or close for the first bar), high = max(open,close) + 1.0,
/// low = min(open,close) - 1.0, five-minute spacing.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<Bar> {
    let data: Vec<(f64, f64, f64, f64)> = closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            (open, open.max(close) + 1.0, open.min(close) - 1.0, close)
        })
        .collect();
    make_ohlc_bars(&data)
}

/// Create bars from explicit (open, high, low, close) tuples for testing.
#[cfg(test)]
pub fn make_ohlc_bars(data: &[(f64, f64, f64, f64)]) -> Vec<Bar> {
    use chrono::TimeZone;
    let base = chrono::Utc.with_ymd_and_hms(2024, 10, 21, 13, 30, 0).unwrap();
    data.iter()
        .enumerate()
        .map(|(i, &(open, high, low, close))| Bar {
            start_time: base + chrono::Duration::minutes(5 * i as i64),
            open,
            high,
            low,
            close,
            volume: 1000,
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strict_containment() {
        let inner = Bands::around(100.0, 1.0);
        let outer = Bands::around(100.0, 2.0);
        assert!(inner.strictly_inside(&outer));
        assert!(!outer.strictly_inside(&inner));
        // Touching on one side is not a squeeze.
        let touching = Bands {
            middle: 100.0,
            upper: 102.0,
            lower: 99.0,
        };
        assert!(!touching.strictly_inside(&outer));
    }

    #[test]
    fn mean_close_uses_tail() {
        let bars = make_bars(&[1.0, 2.0, 3.0, 4.0]);
        assert_approx(mean_close(&bars, 2), 3.5, DEFAULT_EPSILON);
        assert_approx(mean_close(&bars, 10), 2.5, DEFAULT_EPSILON);
    }
}
