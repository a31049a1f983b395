//! Strategy configuration. Fixed at construction and never mutated at runtime.
//!
//! Loaded from TOML. Every field has a default matching the reference squeeze
//! strategy parameters, so a config file only needs to list overrides.

use std::path::Path;

use chrono::NaiveTime;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Which oscillator drives entries once the squeeze is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalSource {
    /// MACD histogram (fast EMA − slow EMA − signal EMA).
    #[serde(alias = "macd")]
    Histogram,
    /// TTM linear-regression momentum.
    #[serde(alias = "ttm")]
    Momentum,
}

/// Complete configuration for the signal engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyConfig {
    pub strategy_name: String,
    pub symbols: Vec<String>,

    // ── Bars ──
    pub bar_interval_minutes: u32,
    pub history_capacity: usize,

    // ── Session (local times in `timezone`) ──
    pub timezone: Tz,
    pub session_start: NaiveTime,
    pub session_end: NaiveTime,
    pub market_close: NaiveTime,

    // ── Bollinger bands ──
    pub bb_length: usize,
    pub bb_mult: f64,

    // ── Keltner channel + TTM momentum ──
    pub kc_length: usize,
    pub kc_mult: f64,
    pub kc_mom_length: usize,

    // ── MACD ──
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,

    // ── Parabolic SAR ──
    pub psar_start: f64,
    pub psar_increment: f64,
    pub psar_maximum: f64,

    // ── Signals and stops ──
    pub signal_source: SignalSource,
    pub stop_loss_length: usize,
    /// Distance below the entry price used when no lowest-low is available.
    pub fallback_stop_offset: f64,

    /// Emit a status event every N ticks per instrument (0 disables).
    pub status_log_every: u64,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            strategy_name: "Purple Reign".to_string(),
            symbols: ["NQ", "MNQ", "ES", "MES"].iter().map(|s| s.to_string()).collect(),
            bar_interval_minutes: 5,
            history_capacity: 100,
            timezone: chrono_tz::America::New_York,
            session_start: hms(9, 30),
            session_end: hms(15, 59),
            market_close: hms(16, 0),
            bb_length: 18,
            bb_mult: 2.0,
            kc_length: 18,
            kc_mult: 1.5,
            kc_mom_length: 18,
            macd_fast: 8,
            macd_slow: 17,
            macd_signal: 9,
            psar_start: 0.02,
            psar_increment: 0.02,
            psar_maximum: 0.2,
            signal_source: SignalSource::Histogram,
            stop_loss_length: 18,
            fallback_stop_offset: 50.0,
            status_log_every: 100,
        }
    }
}

fn hms(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap_or(NaiveTime::MIN)
}

impl StrategyConfig {
    /// Load and validate a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate a config from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty TOML.
    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Minimum number of bars (closed history plus the partial bar) before a
    /// snapshot can be produced.
    pub fn required_bars(&self) -> usize {
        self.bb_length.max(self.kc_length).max(self.macd_slow)
    }

    /// Bar interval in seconds.
    pub fn bar_interval_secs(&self) -> i64 {
        i64::from(self.bar_interval_minutes) * 60
    }

    /// BLAKE3 hash of the canonical JSON serialization.
    ///
    /// Two configs with identical parameters always produce the same hash.
    pub fn fingerprint(&self) -> String {
        let json = serde_json::to_string(self).expect("StrategyConfig must serialize");
        blake3::hash(json.as_bytes()).to_hex().to_string()
    }

    /// Reject configurations that could only produce wrong results.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.symbols.is_empty() {
            return Err(invalid("symbols", "at least one symbol is required"));
        }
        if self.symbols.iter().any(|s| s.trim().is_empty()) {
            return Err(invalid("symbols", "symbol ids must be non-empty"));
        }
        if !(1..=1440).contains(&self.bar_interval_minutes) {
            return Err(invalid(
                "bar_interval_minutes",
                format!("must be in 1..=1440, got {}", self.bar_interval_minutes),
            ));
        }

        for (field, value) in [
            ("bb_length", self.bb_length),
            ("kc_length", self.kc_length),
            ("kc_mom_length", self.kc_mom_length),
            ("macd_fast", self.macd_fast),
            ("macd_slow", self.macd_slow),
            ("macd_signal", self.macd_signal),
            ("stop_loss_length", self.stop_loss_length),
        ] {
            if value == 0 {
                return Err(invalid(field, "window length must be >= 1"));
            }
        }
        if self.macd_fast >= self.macd_slow {
            return Err(invalid(
                "macd_fast",
                format!(
                    "fast period {} must be shorter than slow period {}",
                    self.macd_fast, self.macd_slow
                ),
            ));
        }

        for (field, value) in [("bb_mult", self.bb_mult), ("kc_mult", self.kc_mult)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(invalid(field, format!("multiplier must be > 0, got {value}")));
            }
        }

        if !self.psar_start.is_finite() || self.psar_start <= 0.0 {
            return Err(invalid("psar_start", "acceleration start must be > 0"));
        }
        if !self.psar_increment.is_finite() || self.psar_increment <= 0.0 {
            return Err(invalid("psar_increment", "acceleration step must be > 0"));
        }
        if !self.psar_maximum.is_finite() || self.psar_maximum < self.psar_start {
            return Err(invalid(
                "psar_maximum",
                "acceleration ceiling must be >= acceleration start",
            ));
        }

        if self.session_start >= self.session_end {
            return Err(invalid("session_start", "session must start before it ends"));
        }
        if self.session_end > self.market_close {
            return Err(invalid(
                "market_close",
                "forced-close window must end at or after session end",
            ));
        }

        if self.history_capacity < self.required_bars() {
            return Err(invalid(
                "history_capacity",
                format!(
                    "capacity {} cannot hold the {} bars the indicators need",
                    self.history_capacity,
                    self.required_bars()
                ),
            ));
        }
        if !self.fallback_stop_offset.is_finite() || self.fallback_stop_offset < 0.0 {
            return Err(invalid("fallback_stop_offset", "offset must be >= 0"));
        }

        Ok(())
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = StrategyConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.required_bars(), 18);
        assert_eq!(config.bar_interval_secs(), 300);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = StrategyConfig::from_toml_str(
            r#"
            symbols = ["ES"]
            signal_source = "momentum"
            bar_interval_minutes = 1
            "#,
        )
        .unwrap();
        assert_eq!(config.symbols, vec!["ES".to_string()]);
        assert_eq!(config.signal_source, SignalSource::Momentum);
        assert_eq!(config.bar_interval_minutes, 1);
        assert_eq!(config.macd_slow, 17);
        assert_eq!(config.timezone, chrono_tz::America::New_York);
    }

    #[test]
    fn legacy_source_names_accepted() {
        let config = StrategyConfig::from_toml_str(r#"signal_source = "macd""#).unwrap();
        assert_eq!(config.signal_source, SignalSource::Histogram);
        let config = StrategyConfig::from_toml_str(r#"signal_source = "ttm""#).unwrap();
        assert_eq!(config.signal_source, SignalSource::Momentum);
    }

    #[test]
    fn session_times_and_timezone_parse() {
        let config = StrategyConfig::from_toml_str(
            r#"
            timezone = "Europe/London"
            session_start = "08:00:00"
            session_end = "16:25:00"
            market_close = "16:30:00"
            "#,
        )
        .unwrap();
        assert_eq!(config.timezone, chrono_tz::Europe::London);
        assert_eq!(config.session_start, NaiveTime::from_hms_opt(8, 0, 0).unwrap());
    }

    #[test]
    fn toml_roundtrip() {
        let config = StrategyConfig::default();
        let text = config.to_toml_string().unwrap();
        let parsed = StrategyConfig::from_toml_str(&text).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn zero_window_rejected() {
        let config = StrategyConfig {
            bb_length: 0,
            ..StrategyConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "bb_length", .. })
        ));
    }

    #[test]
    fn capacity_below_requirement_rejected() {
        let config = StrategyConfig {
            history_capacity: 10,
            ..StrategyConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "history_capacity", .. })
        ));
    }

    #[test]
    fn inverted_session_rejected() {
        let config = StrategyConfig {
            session_start: hms(16, 0),
            session_end: hms(9, 30),
            ..StrategyConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn psar_ceiling_below_start_rejected() {
        let config = StrategyConfig {
            psar_maximum: 0.01,
            ..StrategyConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "psar_maximum", .. })
        ));
    }

    #[test]
    fn unknown_timezone_is_parse_error() {
        let result = StrategyConfig::from_toml_str(r#"timezone = "Mars/Olympus""#);
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn fingerprint_deterministic_and_param_sensitive() {
        let a = StrategyConfig::default();
        let b = StrategyConfig::default();
        assert_eq!(a.fingerprint(), b.fingerprint());

        let c = StrategyConfig {
            bb_mult: 2.5,
            ..StrategyConfig::default()
        };
        assert_ne!(a.fingerprint(), c.fingerprint());
    }
}
