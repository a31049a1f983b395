//! Tick → bar aggregation for a single instrument.
//!
//! A tick's bar boundary is its timestamp floored to the interval. A newer
//! boundary seals the in-progress bar into history and opens a new one;
//! the same boundary updates the in-progress bar in place. Bars are never
//! appended mid-interval.

use chrono::{DateTime, Utc};
use tracing::trace;

use crate::bars::history::BarHistory;
use crate::domain::{floor_to_interval, Bar, Tick};
use crate::error::EngineError;

#[derive(Debug, Clone)]
pub struct BarAggregator {
    instrument: String,
    interval_secs: i64,
    history: BarHistory,
    current: Option<Bar>,
    last_boundary: Option<DateTime<Utc>>,
}

impl BarAggregator {
    pub fn new(instrument: impl Into<String>, interval_secs: i64, capacity: usize) -> Self {
        assert!(interval_secs > 0, "bar interval must be > 0");
        Self {
            instrument: instrument.into(),
            interval_secs,
            history: BarHistory::new(capacity),
            current: None,
            last_boundary: None,
        }
    }

    /// Bar boundary (start time) for a timestamp.
    pub fn boundary(&self, ts: DateTime<Utc>) -> DateTime<Utc> {
        floor_to_interval(ts, self.interval_secs)
    }

    /// Append an already-closed bar (warmup). Its start time is floored to the
    /// interval and must be strictly newer than every bar seen so far.
    pub fn push_closed(&mut self, mut bar: Bar) -> Result<(), EngineError> {
        let boundary = self.boundary(bar.start_time);
        if self.current.is_some() || self.last_boundary.is_some_and(|last| boundary <= last) {
            return Err(EngineError::MalformedBar {
                instrument: self.instrument.clone(),
                timestamp: bar.start_time.to_rfc3339(),
                reason: "bar is not newer than the previous bar".to_string(),
            });
        }
        bar.start_time = boundary;
        self.history.push(bar);
        self.last_boundary = Some(boundary);
        Ok(())
    }

    /// Fold a tick into the current bar.
    ///
    /// Returns the bar sealed by this tick, if the tick crossed a boundary.
    pub fn on_tick(&mut self, tick: &Tick) -> Result<Option<Bar>, EngineError> {
        let boundary = self.boundary(tick.timestamp);

        match self.last_boundary {
            Some(last) if boundary < last => Err(EngineError::OutOfOrderTick {
                instrument: self.instrument.clone(),
                bar_time: boundary,
                current: last,
            }),
            Some(last) if boundary == last => {
                match self.current.as_mut() {
                    Some(bar) => bar.update(tick.price, tick.volume),
                    None => {
                        // The newest warmup bar is still forming: continue it
                        // instead of sealing a duplicate.
                        let mut bar = self
                            .history
                            .pop_newest()
                            .unwrap_or_else(|| Bar::open_at(boundary, tick.price, 0));
                        bar.update(tick.price, tick.volume);
                        trace!(instrument = %self.instrument, bar_time = %boundary, "reopened warmup bar");
                        self.current = Some(bar);
                    }
                }
                Ok(None)
            }
            _ => {
                let sealed = self.current.take().map(|mut bar| {
                    if let Some(last) = self.last_boundary {
                        bar.start_time = last;
                    }
                    self.history.push(bar.clone());
                    bar
                });
                self.current = Some(Bar::open_at(boundary, tick.price, tick.volume));
                self.last_boundary = Some(boundary);
                Ok(sealed)
            }
        }
    }

    pub fn history(&self) -> &BarHistory {
        &self.history
    }

    /// The in-progress bar, if any tick has arrived since the last seal.
    pub fn current(&self) -> Option<&Bar> {
        self.current.as_ref()
    }

    pub fn last_boundary(&self) -> Option<DateTime<Utc>> {
        self.last_boundary
    }

    /// The ordered indicator window: closed history followed by the partial
    /// bar (when one exists). Never contains a bar newer than the last tick.
    pub fn window(&self) -> Vec<Bar> {
        let mut bars = Vec::with_capacity(self.history.len() + 1);
        bars.extend(self.history.iter().cloned());
        if let Some(current) = &self.current {
            bars.push(current.clone());
        }
        bars
    }

    /// Number of bars an indicator window would contain right now.
    pub fn window_len(&self) -> usize {
        self.history.len() + usize::from(self.current.is_some())
    }
}
