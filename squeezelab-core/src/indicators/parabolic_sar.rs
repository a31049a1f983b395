//! Parabolic SAR: Wilder's acceleration factor system, carried bar by bar.
//!
//! Inherently sequential/stateful: maintains direction, extreme point (EP),
//! and acceleration factor (AF). The state advances exactly once per closed
//! bar; the in-progress bar never touches it.
//!
//! Parameters: af_start (default 0.02), af_step (default 0.02), af_max (default 0.20).
//! Needs at least 2 closed bars to start.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::Bar;
use crate::indicators::Indicator;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Unset,
    Up,
    Down,
}

#[derive(Debug, Clone)]
pub struct ParabolicSar {
    af_start: f64,
    af_step: f64,
    af_max: f64,
    name: String,

    value: Option<f64>,
    trend: Trend,
    extreme_point: f64,
    acceleration: f64,
    last_bar_time: Option<DateTime<Utc>>,
}

impl ParabolicSar {
    pub fn new(af_start: f64, af_step: f64, af_max: f64) -> Self {
        assert!(af_start > 0.0, "AF start must be > 0");
        assert!(af_step > 0.0, "AF step must be > 0");
        assert!(af_max >= af_start, "AF max must be >= AF start");
        Self {
            af_start,
            af_step,
            af_max,
            name: format!("psar_{af_start}_{af_step}_{af_max}"),
            value: None,
            trend: Trend::Unset,
            extreme_point: f64::NAN,
            acceleration: af_start,
            last_bar_time: None,
        }
    }

    /// Default parameters: 0.02, 0.02, 0.20
    pub fn default_params() -> Self {
        Self::new(0.02, 0.02, 0.20)
    }

    /// Same parameters, state cleared.
    pub fn reset(&self) -> Self {
        Self::new(self.af_start, self.af_step, self.af_max)
    }

    pub fn value(&self) -> Option<f64> {
        self.value
    }

    pub fn trend(&self) -> Trend {
        self.trend
    }

    pub fn extreme_point(&self) -> f64 {
        self.extreme_point
    }

    pub fn acceleration(&self) -> f64 {
        self.acceleration
    }

    /// Start time of the last closed bar folded into the state.
    pub fn last_bar_time(&self) -> Option<DateTime<Utc>> {
        self.last_bar_time
    }

    /// Advance the state with a newly closed bar.
    ///
    /// `prev` and `prev2` are the closed bars before `newest`. A bar whose
    /// start time is not newer than the last one applied is ignored, so
    /// calling twice for the same bar is harmless. Returns the current value.
    pub fn on_bar_close(&mut self, newest: &Bar, prev: Option<&Bar>, prev2: Option<&Bar>) -> Option<f64> {
        if self
            .last_bar_time
            .is_some_and(|applied| newest.start_time <= applied)
        {
            return self.value;
        }
        let Some(prev) = prev else {
            return self.value;
        };
        self.last_bar_time = Some(newest.start_time);

        let Some(value) = self.value else {
            if newest.close > prev.close {
                self.trend = Trend::Up;
                self.value = Some(prev.low);
                self.extreme_point = newest.high;
            } else {
                self.trend = Trend::Down;
                self.value = Some(prev.high);
                self.extreme_point = newest.low;
            }
            self.acceleration = self.af_start;
            return self.value;
        };

        let projected = value + self.acceleration * (self.extreme_point - value);
        let older = prev2.unwrap_or(prev);

        match self.trend {
            Trend::Up => {
                if newest.low <= projected {
                    self.reverse(Trend::Down, newest.low);
                } else {
                    self.value = Some(projected.min(prev.low).min(older.low));
                    if newest.high > self.extreme_point {
                        self.extreme_point = newest.high;
                        self.accelerate();
                    }
                }
            }
            Trend::Down | Trend::Unset => {
                if newest.high >= projected {
                    self.reverse(Trend::Up, newest.high);
                } else {
                    self.value = Some(projected.max(prev.high).max(older.high));
                    if newest.low < self.extreme_point {
                        self.extreme_point = newest.low;
                        self.accelerate();
                    }
                }
            }
        }
        self.value
    }

    fn reverse(&mut self, trend: Trend, new_extreme: f64) {
        self.trend = trend;
        self.value = Some(self.extreme_point);
        self.extreme_point = new_extreme;
        self.acceleration = self.af_start;
    }

    fn accelerate(&mut self) {
        self.acceleration = (self.acceleration + self.af_step).min(self.af_max);
    }
}

/// Replays a fresh state over every bar in the slice (all treated as
/// closed) and returns the final value. The incremental state must agree
/// with this for the same closed bars.
impl Indicator for ParabolicSar {
    type Output = f64;

    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        1
    }

    fn compute(&self, bars: &[Bar]) -> Option<f64> {
        let mut state = self.reset();
        for i in 1..bars.len() {
            let prev2 = i.checked_sub(2).map(|j| &bars[j]);
            state.on_bar_close(&bars[i], Some(&bars[i - 1]), prev2);
        }
        state.value
    }
}
