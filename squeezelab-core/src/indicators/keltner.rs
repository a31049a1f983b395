//! Keltner Channel: mean of closes +/- ATR multiplier.
//!
//! The middle line is the simple mean over `period` closes and the width is
//! `multiplier * ATR(period)` computed over the same window. With fewer than
//! two bars there is no true range and the channel collapses onto the mean.

use crate::domain::Bar;
use crate::indicators::atr::Atr;
use crate::indicators::{mean_close, Bands, Indicator};

#[derive(Debug, Clone)]
pub struct Keltner {
    period: usize,
    multiplier: f64,
    atr: Atr,
    name: String,
}

impl Keltner {
    pub fn new(period: usize, multiplier: f64) -> Self {
        assert!(period >= 1, "Keltner period must be >= 1");
        Self {
            period,
            multiplier,
            atr: Atr::new(period),
            name: format!("keltner_{period}_{multiplier}"),
        }
    }
}

impl Indicator for Keltner {
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
        let mean = mean_close(bars, self.period);
        let half_width = self
            .atr
            .compute(bars)
            .map_or(0.0, |atr| self.multiplier * atr);
        Some(Bands::around(mean, half_width))
    }
}
