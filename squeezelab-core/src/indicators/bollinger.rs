//! Bollinger Bands: mean of closes +/- standard deviation multiplier.
//!
//! Uses population stddev (divide by N) over the last `period` closes.
//! Lookback: period.

use crate::domain::Bar;
use crate::indicators::{mean_close, Bands, Indicator};

#[derive(Debug, Clone)]
pub struct Bollinger {
    period: usize,
    multiplier: f64,
    name: String,
}

impl Bollinger {
    pub fn new(period: usize, multiplier: f64) -> Self {
        assert!(period >= 1, "Bollinger period must be >= 1");
        Self {
            period,
            multiplier,
            name: format!("bollinger_{period}_{multiplier}"),
        }
    }
}

impl Indicator for Bollinger {
    type Output = Bands;

    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, bars: &[Bar]) -> Option<Bands> {
        if bars.len() < self.period {
            return None;
        }
        let window = &bars[bars.len() - self.period..];
        let mean = mean_close(window, self.period);
        let variance = window
            .iter()
            .map(|bar| {
                let diff = bar.close - mean;
                diff * diff
            })
            .sum::<f64>()
            / self.period as f64;

        Some(Bands::around(mean, self.multiplier * variance.sqrt()))
    }
}
