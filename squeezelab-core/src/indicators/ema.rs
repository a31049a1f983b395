//! Exponential moving averages and the MACD histogram built on them.
//!
//! Recursive: EMA[t] = alpha * x[t] + (1 - alpha) * EMA[t-1], alpha = 2/(period+1).
//! Seed: EMA[period-1] = SMA of the first `period` values.

use crate::domain::Bar;
use crate::indicators::Indicator;

/// EMA series of an arbitrary f64 slice. Positions before the seed are NaN,
/// and a NaN input taints every later value.
pub fn ema_of_series(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];

    if n < period || period == 0 {
        return result;
    }

    let alpha = 2.0 / (period as f64 + 1.0);

    let seed_window = &values[..period];
    if seed_window.iter().any(|v| v.is_nan()) {
        return result;
    }
    let seed = seed_window.iter().sum::<f64>() / period as f64;
    result[period - 1] = seed;

    let mut prev = seed;
    for i in period..n {
        if values[i].is_nan() {
            return result;
        }
        prev = alpha * values[i] + (1.0 - alpha) * prev;
        result[i] = prev;
    }

    result
}

/// MACD histogram: (fast EMA − slow EMA) minus its own signal-period EMA.
///
/// Evaluates to 0.0 (not `None`) while there are fewer than `slow` bars or
/// fewer than `signal` MACD values, so callers always get a number once the
/// window is non-empty.
#[derive(Debug, Clone)]
pub struct MacdHistogram {
    fast: usize,
    slow: usize,
    signal: usize,
    name: String,
}

impl MacdHistogram {
    pub fn new(fast: usize, slow: usize, signal: usize) -> Self {
        assert!(fast >= 1 && signal >= 1, "MACD periods must be >= 1");
        assert!(fast < slow, "MACD fast period must be shorter than slow period");
        Self {
            fast,
            slow,
            signal,
            name: format!("macd_hist_{fast}_{slow}_{signal}"),
        }
    }
}

impl Indicator for MacdHistogram {
    type Output = f64;

    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.slow + self.signal - 1
    }

    fn compute(&self, bars: &[Bar]) -> Option<f64> {
        if bars.is_empty() {
            return None;
        }
        if bars.len() < self.slow {
            return Some(0.0);
        }

        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let fast = ema_of_series(&closes, self.fast);
        let slow = ema_of_series(&closes, self.slow);
        let macd: Vec<f64> = (self.slow - 1..closes.len())
            .map(|i| fast[i] - slow[i])
            .collect();

        if macd.len() < self.signal {
            return Some(0.0);
        }
        let signal = ema_of_series(&macd, self.signal);
        let (Some(&line), Some(&sig)) = (macd.last(), signal.last()) else {
            return Some(0.0);
        };
        Some(line - sig)
    }
}
