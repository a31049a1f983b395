//! The full indicator snapshot recomputed on every in-session tick.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::StrategyConfig;
use crate::domain::Bar;
use crate::indicators::{
    Bands, Bollinger, Indicator, Keltner, LowestLow, MacdHistogram, TtmMomentum,
};

/// Everything the signal state machine reads for one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    /// Start time of the newest bar in the window.
    pub bar_time: DateTime<Utc>,
    /// Number of bars in the window, including the in-progress bar.
    pub bars_used: usize,
    pub bollinger: Bands,
    pub keltner: Bands,
    /// Bollinger bands strictly inside the Keltner channel.
    pub squeeze: bool,
    pub momentum: f64,
    /// Momentum of the previous two snapshots, newest first.
    pub momentum_prev: [f64; 2],
    pub histogram: f64,
    /// Histogram of the previous two snapshots, newest first.
    pub histogram_prev: [f64; 2],
    pub lowest_low: Option<f64>,
    pub psar: Option<f64>,
}

/// The configured window indicators, built once per instrument.
#[derive(Debug, Clone)]
pub struct IndicatorSet {
    bollinger: Bollinger,
    keltner: Keltner,
    momentum: TtmMomentum,
    histogram: MacdHistogram,
    lowest_low: LowestLow,
    required_bars: usize,
}

impl IndicatorSet {
    pub fn from_config(config: &StrategyConfig) -> Self {
        Self {
            bollinger: Bollinger::new(config.bb_length, config.bb_mult),
            keltner: Keltner::new(config.kc_length, config.kc_mult),
            momentum: TtmMomentum::new(config.kc_mom_length),
            histogram: MacdHistogram::new(config.macd_fast, config.macd_slow, config.macd_signal),
            lowest_low: LowestLow::new(config.stop_loss_length),
            required_bars: config.required_bars(),
        }
    }

    pub fn required_bars(&self) -> usize {
        self.required_bars
    }

    /// Compute a snapshot over `bars` (closed history followed by the
    /// in-progress bar). `previous` supplies the oscillator history and
    /// `psar` the carried trend-reversal value.
    ///
    /// Returns `None` while fewer than [`required_bars`](Self::required_bars)
    /// bars are available.
    pub fn compute(
        &self,
        bars: &[Bar],
        previous: Option<&IndicatorSnapshot>,
        psar: Option<f64>,
    ) -> Option<IndicatorSnapshot> {
        if bars.len() < self.required_bars {
            return None;
        }
        let newest = bars.last()?;
        let bollinger = self.bollinger.compute(bars)?;
        let keltner = self.keltner.compute(bars)?;
        let momentum = self.momentum.compute(bars)?;
        let histogram = self.histogram.compute(bars)?;

        let (momentum_prev, histogram_prev) = match previous {
            Some(prev) => (
                [prev.momentum, prev.momentum_prev[0]],
                [prev.histogram, prev.histogram_prev[0]],
            ),
            None => ([0.0; 2], [0.0; 2]),
        };

        Some(IndicatorSnapshot {
            bar_time: newest.start_time,
            bars_used: bars.len(),
            squeeze: bollinger.strictly_inside(&keltner),
            bollinger,
            keltner,
            momentum,
            momentum_prev,
            histogram,
            histogram_prev,
            lowest_low: self.lowest_low.compute(bars),
            psar,
        })
    }
}
