//! SqueezeLab Core: real-time squeeze/PSAR signal engine.
//!
//! This crate turns a stream of trade ticks into discrete entry/exit signals:
//! - Domain types (ticks, bars, historical warmup records, signals)
//! - Tick-to-bar aggregation with a bounded bar history
//! - Window indicators (Bollinger, Keltner, TTM momentum, MACD histogram)
//! - Recursive Parabolic SAR state carried across closed bars
//! - Session gate in the exchange's time zone
//! - Long-only signal state machine with a ratcheting PSAR stop
//! - Per-instrument engines and a multi-instrument router

pub mod bars;
pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod indicators;
pub mod session;
pub mod strategy;

pub use config::{SignalSource, StrategyConfig};
pub use domain::{Bar, HistoricalBar, Signal, SignalAction, Tick};
pub use engine::{InstrumentEngine, InstrumentStatus, SignalEngine, WarmupReport};
pub use error::{ConfigError, EngineError};
