//! Long position state and stop ratchet.
//!
//! **Core rule:** once the stop trails the Parabolic SAR it may rise, never
//! fall. Every exit resets everything except the last entry bar time.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::EngineError;

/// Which stop is protecting the position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StopKind {
    /// Lowest-low stop set at entry.
    Initial,
    /// Trailing the Parabolic SAR.
    Psar,
}

impl StopKind {
    pub fn label(self) -> &'static str {
        match self {
            StopKind::Initial => "Initial",
            StopKind::Psar => "PSAR",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionState {
    is_open: bool,
    entry_price: f64,
    stop_price: f64,
    stop_is_trailing: bool,
    /// PSAR was below price at the last trailing check.
    psar_was_below: bool,
    /// Bar time of the most recent entry (anti-repaint marker).
    last_signal_bar_time: Option<DateTime<Utc>>,
}

impl Default for PositionState {
    fn default() -> Self {
        Self::flat()
    }
}

impl PositionState {
    pub fn flat() -> Self {
        Self {
            is_open: false,
            entry_price: 0.0,
            stop_price: 0.0,
            stop_is_trailing: false,
            psar_was_below: false,
            last_signal_bar_time: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }

    pub fn entry_price(&self) -> Option<f64> {
        self.is_open.then_some(self.entry_price)
    }

    pub fn stop_price(&self) -> Option<f64> {
        self.is_open.then_some(self.stop_price)
    }

    pub fn stop_kind(&self) -> StopKind {
        if self.stop_is_trailing {
            StopKind::Psar
        } else {
            StopKind::Initial
        }
    }

    pub fn is_trailing(&self) -> bool {
        self.stop_is_trailing
    }

    pub fn psar_was_below(&self) -> bool {
        self.psar_was_below
    }

    pub fn last_signal_bar_time(&self) -> Option<DateTime<Utc>> {
        self.last_signal_bar_time
    }

    /// True when a new entry may be taken on `bar_time`.
    pub fn can_enter_on(&self, bar_time: DateTime<Utc>) -> bool {
        !self.is_open && self.last_signal_bar_time.map_or(true, |last| bar_time > last)
    }

    /// Open a long position. Opening twice, or with a non-finite level, is an
    /// invariant violation.
    pub fn open(
        &mut self,
        instrument: &str,
        price: f64,
        stop: f64,
        bar_time: DateTime<Utc>,
    ) -> Result<(), EngineError> {
        if self.is_open {
            return Err(EngineError::InvariantViolation {
                instrument: instrument.to_string(),
                reason: format!(
                    "entry at {price:.2} while a position opened at {:.2} is still open",
                    self.entry_price
                ),
            });
        }
        if !price.is_finite() || !stop.is_finite() {
            return Err(EngineError::InvariantViolation {
                instrument: instrument.to_string(),
                reason: format!("non-finite entry {price} or stop {stop}"),
            });
        }
        self.is_open = true;
        self.entry_price = price;
        self.stop_price = stop;
        self.stop_is_trailing = false;
        self.psar_was_below = false;
        self.last_signal_bar_time = Some(bar_time);
        Ok(())
    }

    /// Promote the stop to trail `psar` when it sits between entry and price.
    ///
    /// Returns true on the tick the stop first becomes trailing.
    pub fn trail(&mut self, psar: f64, price: f64) -> bool {
        if !self.is_open || !(psar < price && psar > self.entry_price) {
            return false;
        }
        let promoted = !self.stop_is_trailing;
        self.stop_price = self.stop_price.max(psar);
        self.stop_is_trailing = true;
        self.psar_was_below = true;
        promoted
    }

    /// Trailing-stop crossover: PSAR was below price and is now at or above
    /// it. Records the current side for the next check.
    pub fn crossed_above(&mut self, psar: f64, price: f64) -> bool {
        if !self.stop_is_trailing {
            return false;
        }
        let below_now = psar < price;
        let crossed = self.psar_was_below && !below_now;
        self.psar_was_below = below_now;
        crossed
    }

    pub fn stop_hit(&self, price: f64) -> bool {
        self.is_open && price <= self.stop_price
    }

    /// Return to flat. The anti-repaint marker is left as is.
    pub fn close(&mut self) {
        *self = Self {
            last_signal_bar_time: self.last_signal_bar_time,
            ..Self::flat()
        };
    }
}
