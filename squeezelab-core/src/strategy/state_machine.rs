//! Squeeze entry and prioritized exit logic for one instrument.
//!
//! Long only. Exits are checked before entries on every in-session tick, in
//! this order: forced end-of-session close, PSAR crossover while trailing,
//! stop touched.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::config::{SignalSource, StrategyConfig};
use crate::domain::{Signal, SignalAction, Tick};
use crate::error::EngineError;
use crate::indicators::IndicatorSnapshot;
use crate::strategy::position::PositionState;

#[derive(Debug, Clone)]
pub struct SignalStateMachine {
    instrument: String,
    strategy: String,
    source: SignalSource,
    fallback_stop_offset: f64,
    position: PositionState,
}

impl SignalStateMachine {
    pub fn new(instrument: impl Into<String>, config: &StrategyConfig) -> Self {
        Self {
            instrument: instrument.into(),
            strategy: config.strategy_name.clone(),
            source: config.signal_source,
            fallback_stop_offset: config.fallback_stop_offset,
            position: PositionState::flat(),
        }
    }

    pub fn position(&self) -> &PositionState {
        &self.position
    }

    fn signal(&self, action: SignalAction, tick: &Tick, bar_time: DateTime<Utc>, reason: String) -> Signal {
        Signal {
            action,
            instrument: self.instrument.clone(),
            strategy: self.strategy.clone(),
            price: tick.price,
            reason,
            bar_time,
            timestamp: tick.timestamp,
        }
    }

    fn exit(&mut self, tick: &Tick, bar_time: DateTime<Utc>, reason: String) -> Signal {
        self.position.close();
        self.signal(SignalAction::Sell, tick, bar_time, reason)
    }

    /// End-of-session liquidation. Flat positions produce nothing.
    pub fn force_close(&mut self, tick: &Tick, bar_time: DateTime<Utc>) -> Option<Signal> {
        if !self.position.is_open() {
            return None;
        }
        Some(self.exit(tick, bar_time, "EOD Exit".to_string()))
    }

    /// Update the stop, then check the PSAR crossover and the stop level.
    pub fn check_exit(
        &mut self,
        tick: &Tick,
        bar_time: DateTime<Utc>,
        snapshot: Option<&IndicatorSnapshot>,
    ) -> Option<Signal> {
        if !self.position.is_open() {
            return None;
        }
        let price = tick.price;

        if let Some(psar) = snapshot.and_then(|s| s.psar) {
            if self.position.trail(psar, price) {
                debug!(
                    instrument = %self.instrument,
                    psar,
                    entry = ?self.position.entry_price(),
                    "stop promoted to trailing PSAR"
                );
            }
            if self.position.crossed_above(psar, price) {
                return Some(self.exit(tick, bar_time, format!("Exit: PSAR crossover at {psar:.2}")));
            }
        }

        if self.position.stop_hit(price) {
            let reason = format!(
                "Exit: {} stop hit at {:.2}",
                self.position.stop_kind().label(),
                self.position.stop_price().unwrap_or(price)
            );
            return Some(self.exit(tick, bar_time, reason));
        }

        None
    }

    /// Squeeze entry on a fresh snapshot.
    ///
    /// Gated on: flat, bar time newer than the last entry, squeeze on, and
    /// the selected oscillator positive and above one of its two prior values.
    pub fn check_entry(
        &mut self,
        tick: &Tick,
        snapshot: &IndicatorSnapshot,
    ) -> Result<Option<Signal>, EngineError> {
        let bar_time = snapshot.bar_time;
        if !self.position.can_enter_on(bar_time) || !snapshot.squeeze {
            return Ok(None);
        }

        let (label, value, prev) = match self.source {
            SignalSource::Histogram => ("MACD", snapshot.histogram, snapshot.histogram_prev),
            SignalSource::Momentum => ("TTM", snapshot.momentum, snapshot.momentum_prev),
        };
        if !(value > 0.0 && (value > prev[0] || value > prev[1])) {
            return Ok(None);
        }

        let stop = snapshot
            .lowest_low
            .unwrap_or(tick.price - self.fallback_stop_offset);
        self.position.open(&self.instrument, tick.price, stop, bar_time)?;

        let reason = format!(
            "Entry: TTM Squeeze active, {label}={value:.2}>{:.2}, Stop={stop:.2}",
            prev[0]
        );
        Ok(Some(self.signal(SignalAction::Buy, tick, bar_time, reason)))
    }
}
