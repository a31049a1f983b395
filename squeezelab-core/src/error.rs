//! Error types for the signal engine.
//!
//! Insufficient data is not an error: indicator computation returns `None`
//! and the tick simply produces no signal. Everything here is either a
//! malformed record (skipped, processing continues) or an invariant
//! violation (fatal for the instrument that raised it).

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors surfaced by tick processing and warmup.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("malformed tick for '{instrument}': {reason}")]
    MalformedTick { instrument: String, reason: String },

    #[error("malformed historical bar for '{instrument}' at {timestamp}: {reason}")]
    MalformedBar {
        instrument: String,
        timestamp: String,
        reason: String,
    },

    #[error("out-of-order tick for '{instrument}': bar {bar_time} precedes current bar {current}")]
    OutOfOrderTick {
        instrument: String,
        bar_time: DateTime<Utc>,
        current: DateTime<Utc>,
    },

    #[error("invariant violation for '{instrument}': {reason}")]
    InvariantViolation { instrument: String, reason: String },

    #[error("instrument '{0}' halted after an invariant violation")]
    InstrumentHalted(String),

    #[error("warmup for '{0}' requested after live ticks were processed")]
    WarmupAfterLive(String),
}

impl EngineError {
    /// True for errors that stop all further processing of the instrument.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            EngineError::InvariantViolation { .. } | EngineError::InstrumentHalted(_)
        )
    }
}

/// Errors from loading or validating a [`StrategyConfig`](crate::config::StrategyConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config field '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}
