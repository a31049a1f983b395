//! One instrument's complete state: bars, trend state, snapshot cache and
//! position, owned by a single worker.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::bars::BarAggregator;
use crate::config::StrategyConfig;
use crate::domain::{Bar, HistoricalBar, Signal, Tick};
use crate::engine::warmup::WarmupReport;
use crate::error::{ConfigError, EngineError};
use crate::indicators::{IndicatorSet, IndicatorSnapshot, ParabolicSar, Trend};
use crate::session::{SessionGate, SessionPhase};
use crate::strategy::{SignalStateMachine, StopKind};

/// Point-in-time view of an instrument for logs and tooling.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstrumentStatus {
    pub instrument: String,
    pub ticks_processed: u64,
    pub bars_collected: usize,
    pub current_bar_time: Option<DateTime<Utc>>,
    pub snapshot_fresh: bool,
    pub squeeze: Option<bool>,
    pub position_open: bool,
    pub entry_price: Option<f64>,
    pub stop_price: Option<f64>,
    pub stop_kind: Option<StopKind>,
    pub psar: Option<f64>,
    pub psar_trend: Trend,
    pub halted: bool,
}

#[derive(Debug, Clone)]
pub struct InstrumentEngine {
    instrument: String,
    status_log_every: u64,
    session: SessionGate,
    indicators: IndicatorSet,
    aggregator: BarAggregator,
    psar: ParabolicSar,
    machine: SignalStateMachine,
    snapshot: Option<IndicatorSnapshot>,
    snapshot_fresh: bool,
    ticks: u64,
    live: bool,
    halted: bool,
}

impl InstrumentEngine {
    pub fn new(instrument: impl Into<String>, config: &StrategyConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let instrument = instrument.into();
        Ok(Self {
            status_log_every: config.status_log_every,
            session: SessionGate::from_config(config),
            indicators: IndicatorSet::from_config(config),
            aggregator: BarAggregator::new(
                instrument.clone(),
                config.bar_interval_secs(),
                config.history_capacity,
            ),
            psar: ParabolicSar::new(config.psar_start, config.psar_increment, config.psar_maximum),
            machine: SignalStateMachine::new(instrument.clone(), config),
            snapshot: None,
            snapshot_fresh: false,
            ticks: 0,
            live: false,
            halted: false,
            instrument,
        })
    }

    pub fn instrument(&self) -> &str {
        &self.instrument
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    pub fn aggregator(&self) -> &BarAggregator {
        &self.aggregator
    }

    pub fn psar(&self) -> &ParabolicSar {
        &self.psar
    }

    /// The last successfully computed snapshot, fresh or not.
    pub fn snapshot(&self) -> Option<&IndicatorSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn machine(&self) -> &SignalStateMachine {
        &self.machine
    }

    /// Prefill history and the trend state from closed historical bars.
    ///
    /// Must run before the first live tick. Records are taken in order;
    /// malformed or non-increasing ones are skipped and reported.
    pub fn warmup<I>(&mut self, records: I) -> Result<WarmupReport, EngineError>
    where
        I: IntoIterator<Item = HistoricalBar>,
    {
        if self.live {
            return Err(EngineError::WarmupAfterLive(self.instrument.clone()));
        }
        if self.halted {
            return Err(EngineError::InstrumentHalted(self.instrument.clone()));
        }

        let mut report = WarmupReport::default();
        for record in records {
            let pushed = record
                .to_bar(&self.instrument)
                .and_then(|bar| self.aggregator.push_closed(bar));
            match pushed {
                Ok(()) => {
                    report.loaded += 1;
                    self.step_psar();
                }
                Err(err) => {
                    warn!(instrument = %self.instrument, error = %err, "skipping warmup record");
                    report.skip(err);
                }
            }
        }

        info!(
            instrument = %self.instrument,
            loaded = report.loaded,
            skipped = report.skipped,
            bars = self.aggregator.history().len(),
            psar = ?self.psar.value(),
            trend = ?self.psar.trend(),
            "warmup complete"
        );
        Ok(report)
    }

    /// Process one tick and return at most one signal.
    ///
    /// Malformed and out-of-order ticks are rejected without touching state.
    /// An invariant violation halts the instrument; every later call returns
    /// [`EngineError::InstrumentHalted`].
    pub fn on_tick(&mut self, tick: &Tick) -> Result<Option<Signal>, EngineError> {
        if self.halted {
            return Err(EngineError::InstrumentHalted(self.instrument.clone()));
        }
        if tick.instrument != self.instrument {
            return Err(EngineError::MalformedTick {
                instrument: self.instrument.clone(),
                reason: format!("tick for '{}' routed here", tick.instrument),
            });
        }
        tick.validate()?;

        match self.process(tick) {
            Err(err) if err.is_fatal() => {
                self.halted = true;
                error!(instrument = %self.instrument, error = %err, "instrument halted");
                Err(err)
            }
            other => other,
        }
    }

    fn process(&mut self, tick: &Tick) -> Result<Option<Signal>, EngineError> {
        if let Some(sealed) = self.aggregator.on_tick(tick)? {
            self.on_bar_sealed(&sealed);
        }
        self.live = true;
        self.ticks += 1;
        if self.status_log_every > 0 && self.ticks % self.status_log_every == 0 {
            let status = self.status();
            debug!(
                instrument = %status.instrument,
                ticks = status.ticks_processed,
                bars = status.bars_collected,
                squeeze = ?status.squeeze,
                position_open = status.position_open,
                stop = ?status.stop_price,
                psar = ?status.psar,
                "status"
            );
        }

        let bar_time = self.aggregator.boundary(tick.timestamp);
        match self.session.phase(tick.timestamp) {
            SessionPhase::Open => {}
            SessionPhase::ForceClose => {
                let signal = self.machine.force_close(tick, bar_time);
                if let Some(signal) = &signal {
                    self.log_signal(signal);
                }
                return Ok(signal);
            }
            SessionPhase::Closed => return Ok(None),
        }

        self.refresh_snapshot();

        if let Some(signal) = self
            .machine
            .check_exit(tick, bar_time, self.snapshot.as_ref())
        {
            self.log_signal(&signal);
            return Ok(Some(signal));
        }

        if !self.snapshot_fresh {
            return Ok(None);
        }
        let Some(snapshot) = self.snapshot.as_ref() else {
            return Ok(None);
        };
        let signal = self.machine.check_entry(tick, snapshot)?;
        if let Some(signal) = &signal {
            self.log_signal(signal);
        }
        Ok(signal)
    }

    fn on_bar_sealed(&mut self, bar: &Bar) {
        self.snapshot_fresh = false;
        debug!(
            instrument = %self.instrument,
            bar_time = %bar.start_time,
            open = bar.open,
            high = bar.high,
            low = bar.low,
            close = bar.close,
            volume = bar.volume,
            "bar closed"
        );
        self.step_psar();
    }

    /// Fold the newest closed bar into the PSAR state.
    fn step_psar(&mut self) {
        let history = self.aggregator.history();
        let Some(newest) = history.from_newest(0) else {
            return;
        };
        let before = self.psar.trend();
        self.psar
            .on_bar_close(newest, history.from_newest(1), history.from_newest(2));
        let after = self.psar.trend();
        if before != Trend::Unset && before != after {
            debug!(
                instrument = %self.instrument,
                bar_time = %newest.start_time,
                trend = ?after,
                psar = ?self.psar.value(),
                "psar reversal"
            );
        }
    }

    fn refresh_snapshot(&mut self) {
        let window = self.aggregator.window();
        match self
            .indicators
            .compute(&window, self.snapshot.as_ref(), self.psar.value())
        {
            Some(snapshot) => {
                self.snapshot = Some(snapshot);
                self.snapshot_fresh = true;
            }
            None => self.snapshot_fresh = false,
        }
    }

    fn log_signal(&self, signal: &Signal) {
        info!(
            instrument = %signal.instrument,
            action = %signal.action,
            price = signal.price,
            bar_time = %signal.bar_time,
            reason = %signal.reason,
            "signal"
        );
    }

    pub fn status(&self) -> InstrumentStatus {
        let position = self.machine.position();
        InstrumentStatus {
            instrument: self.instrument.clone(),
            ticks_processed: self.ticks,
            bars_collected: self.aggregator.history().len(),
            current_bar_time: self.aggregator.current().map(|bar| bar.start_time),
            snapshot_fresh: self.snapshot_fresh,
            squeeze: self.snapshot.as_ref().map(|s| s.squeeze),
            position_open: position.is_open(),
            entry_price: position.entry_price(),
            stop_price: position.stop_price(),
            stop_kind: position.is_open().then(|| position.stop_kind()),
            psar: self.psar.value(),
            psar_trend: self.psar.trend(),
            halted: self.halted,
        }
    }
}
