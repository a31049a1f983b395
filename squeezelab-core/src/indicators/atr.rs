//! Average True Range (ATR) over a fixed window.
//!
//! True Range: max(high-low, |high-prev_close|, |low-prev_close|).
//! ATR here is the arithmetic mean of the true ranges inside the window; the
//! first bar of the window only supplies the previous close.

use crate::domain::Bar;
use crate::indicators::Indicator;

#[derive(Debug, Clone)]
pub struct Atr {
    period: usize,
    name: String,
}

impl Atr {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "ATR period must be >= 1");
        Self {
            period,
            name: format!("atr_{period}"),
        }
    }
}

/// True range of `bar` given the previous bar's close.
pub fn true_range(bar: &Bar, prev_close: f64) -> f64 {
    (bar.high - bar.low)
        .max((bar.high - prev_close).abs())
        .max((bar.low - prev_close).abs())
}

impl Indicator for Atr {
    type Output = f64;

    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    /// Mean true range over the last `period` bars; `None` with fewer than 2.
    fn compute(&self, bars: &[Bar]) -> Option<f64> {
        let window = &bars[bars.len().saturating_sub(self.period)..];
        if window.len() < 2 {
            return None;
        }
        let sum: f64 = window
            .windows(2)
            .map(|pair| true_range(&pair[1], pair[0].close))
            .sum();
        Some(sum / (window.len() - 1) as f64)
    }
}
