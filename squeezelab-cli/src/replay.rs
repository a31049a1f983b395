//! CSV loading and per-instrument replay for the `replay` command.

use std::collections::{BTreeMap, HashMap};
use std::io::Read;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use squeezelab_core::{HistoricalBar, InstrumentEngine, InstrumentStatus, Signal, Tick};
use tracing::{error, warn};

/// One row of the tick CSV: `instrument,price,volume,timestamp`.
#[derive(Debug, Deserialize)]
struct TickRow {
    instrument: String,
    price: f64,
    #[serde(default)]
    volume: u64,
    #[serde(deserialize_with = "squeezelab_core::domain::timestamp::deserialize")]
    timestamp: DateTime<Utc>,
}

/// One row of the warmup CSV: `instrument,timestamp,open,high,low,close,volume`.
/// Empty OHLC cells are kept as missing so the engine can skip the record.
#[derive(Debug, Deserialize)]
struct BarRow {
    instrument: String,
    #[serde(deserialize_with = "squeezelab_core::domain::timestamp::deserialize")]
    timestamp: DateTime<Utc>,
    open: Option<f64>,
    high: Option<f64>,
    low: Option<f64>,
    close: Option<f64>,
    volume: Option<u64>,
}

/// Rows grouped by instrument, each group in file order.
#[derive(Debug)]
pub struct Loaded<T> {
    pub by_instrument: BTreeMap<String, Vec<T>>,
    pub unreadable: usize,
}

fn read_grouped<R, Row, T>(reader: R, what: &str, convert: impl Fn(Row) -> (String, T)) -> Result<Loaded<T>>
where
    R: Read,
    Row: for<'de> Deserialize<'de>,
{
    let mut csv = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut by_instrument: BTreeMap<String, Vec<T>> = BTreeMap::new();
    let mut unreadable = 0;
    for (line, row) in csv.deserialize::<Row>().enumerate() {
        match row {
            Ok(row) => {
                let (instrument, item) = convert(row);
                by_instrument.entry(instrument).or_default().push(item);
            }
            Err(err) => {
                unreadable += 1;
                warn!(row = line + 1, error = %err, "skipping unreadable {what} row");
            }
        }
    }
    Ok(Loaded {
        by_instrument,
        unreadable,
    })
}

pub fn read_ticks<R: Read>(reader: R) -> Result<Loaded<Tick>> {
    read_grouped(reader, "tick", |row: TickRow| {
        let tick = Tick::new(row.instrument.clone(), row.price, row.volume, row.timestamp);
        (row.instrument, tick)
    })
    .context("read tick CSV")
}

pub fn read_warmup<R: Read>(reader: R) -> Result<Loaded<HistoricalBar>> {
    read_grouped(reader, "warmup", |row: BarRow| {
        let bar = HistoricalBar {
            timestamp: row.timestamp,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            volume: row.volume,
        };
        (row.instrument, bar)
    })
    .context("read warmup CSV")
}

/// What one instrument worker produced.
#[derive(Debug, Serialize)]
pub struct ReplayOutcome {
    pub signals: Vec<Signal>,
    pub rejected: usize,
    pub status: InstrumentStatus,
}

/// Feed one instrument its ticks in order. Rejected ticks are logged and
/// counted; a fatal error stops the instrument.
pub fn replay_instrument(mut engine: InstrumentEngine, ticks: &[Tick]) -> ReplayOutcome {
    let mut signals = Vec::new();
    let mut rejected = 0;
    for tick in ticks {
        match engine.on_tick(tick) {
            Ok(Some(signal)) => signals.push(signal),
            Ok(None) => {}
            Err(err) if err.is_fatal() => {
                error!(instrument = engine.instrument(), error = %err, "stopping replay");
                break;
            }
            Err(err) => {
                rejected += 1;
                warn!(instrument = engine.instrument(), error = %err, "tick rejected");
            }
        }
    }
    ReplayOutcome {
        signals,
        rejected,
        status: engine.status(),
    }
}

/// Replay every instrument on its own worker and merge the signals in
/// timestamp order.
pub fn replay_all(
    engines: Vec<InstrumentEngine>,
    ticks: &HashMap<String, Vec<Tick>>,
    parallel: bool,
) -> Vec<ReplayOutcome> {
    let run = |engine: InstrumentEngine| {
        let feed = ticks.get(engine.instrument()).map(Vec::as_slice).unwrap_or(&[]);
        replay_instrument(engine, feed)
    };
    if parallel {
        engines.into_par_iter().map(run).collect()
    } else {
        engines.into_iter().map(run).collect()
    }
}

pub fn merge_signals(outcomes: &[ReplayOutcome]) -> Vec<&Signal> {
    let mut merged: Vec<&Signal> = outcomes.iter().flat_map(|o| o.signals.iter()).collect();
    merged.sort_by_key(|s| s.timestamp);
    merged
}
