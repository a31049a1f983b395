//! Rolling lowest low: the initial stop level for new entries.

use crate::domain::Bar;
use crate::indicators::Indicator;

#[derive(Debug, Clone)]
pub struct LowestLow {
    period: usize,
    name: String,
}

impl LowestLow {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "lowest-low period must be >= 1");
        Self {
            period,
            name: format!("lowest_low_{period}"),
        }
    }
}

impl Indicator for LowestLow {
    type Output = f64;

    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        1
    }

    /// Minimum low over the last `period` bars, or over all bars if fewer.
    fn compute(&self, bars: &[Bar]) -> Option<f64> {
        bars[bars.len().saturating_sub(self.period)..]
            .iter()
            .map(|b| b.low)
            .reduce(f64::min)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_ohlc_bars;

    #[test]
    fn trailing_window_only() {
        let bars = make_ohlc_bars(&[
            (10.0, 11.0, 5.0, 10.0),
            (10.0, 11.0, 8.0, 10.0),
            (10.0, 11.0, 9.0, 10.0),
            (10.0, 11.0, 7.0, 10.0),
        ]);
        assert_eq!(LowestLow::new(3).compute(&bars), Some(7.0));
        assert_eq!(LowestLow::new(2).compute(&bars), Some(7.0));
        assert_eq!(LowestLow::new(10).compute(&bars), Some(5.0));
    }

    #[test]
    fn empty_has_no_value() {
        assert_eq!(LowestLow::new(3).compute(&[]), None);
    }
}
