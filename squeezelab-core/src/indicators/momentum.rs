//! TTM squeeze momentum: a linear-regression-smoothed deviation series.
//!
//! For each of the last `length` bars that has a full `length`-bar window
//! ending at it:
//!
//! deviation = close − ((highest high + lowest low) / 2 + SMA(close)) / 2
//!
//! The deviations are fitted with ordinary least squares against their
//! index and the fitted value at the last index is returned.

use crate::domain::Bar;
use crate::indicators::{mean_close, Indicator};

#[derive(Debug, Clone)]
pub struct TtmMomentum {
    length: usize,
    name: String,
}

impl TtmMomentum {
    pub fn new(length: usize) -> Self {
        assert!(length >= 1, "momentum length must be >= 1");
        Self {
            length,
            name: format!("ttm_momentum_{length}"),
        }
    }
}

/// Deviation of the close of the last bar in `window` from the midpoint of
/// its range midpoint and mean close.
fn deviation(window: &[Bar]) -> Option<f64> {
    let last = window.last()?;
    let highest = window.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max);
    let lowest = window.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
    let sma = mean_close(window, window.len());
    Some(last.close - ((highest + lowest) / 2.0 + sma) / 2.0)
}

/// Fitted value at the final index of an OLS line through `values`.
///
/// Empty input gives 0.0 and a single point is returned unchanged.
pub fn linreg_last(values: &[f64]) -> f64 {
    match values {
        [] => 0.0,
        [only] => *only,
        _ => {
            let n = values.len() as f64;
            let x_mean = (n - 1.0) / 2.0;
            let y_mean = values.iter().sum::<f64>() / n;
            let (num, den) = values
                .iter()
                .enumerate()
                .fold((0.0, 0.0), |(num, den), (i, &y)| {
                    let dx = i as f64 - x_mean;
                    (num + dx * (y - y_mean), den + dx * dx)
                });
            if den == 0.0 {
                return y_mean;
            }
            let slope = num / den;
            slope * (n - 1.0) + (y_mean - slope * x_mean)
        }
    }
}

impl Indicator for TtmMomentum {
    type Output = f64;

    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.length
    }

    /// Always `Some` for a non-empty slice; 0.0 until a full window exists.
    fn compute(&self, bars: &[Bar]) -> Option<f64> {
        if bars.is_empty() {
            return None;
        }
        let n = bars.len();
        let deviations: Vec<f64> = (n.saturating_sub(self.length)..n)
            .filter(|&i| i + 1 >= self.length)
            .filter_map(|i| deviation(&bars[i + 1 - self.length..=i]))
            .collect();
        Some(linreg_last(&deviations))
    }
}
