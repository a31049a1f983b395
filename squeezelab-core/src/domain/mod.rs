//! Domain types for the signal engine: ticks in, bars in between, signals out.

pub mod bar;
pub mod signal;
pub mod tick;
pub mod timestamp;

pub use bar::{Bar, HistoricalBar};
pub use signal::{Signal, SignalAction};
pub use tick::Tick;
pub use timestamp::{floor_to_interval, parse_timestamp};

/// Instrument identifier (e.g. "NQ", "MES").
pub type InstrumentId = String;
