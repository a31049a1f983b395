//! Multi-instrument front door: routes ticks and warmup data to the owning
//! [`InstrumentEngine`].

use std::collections::BTreeMap;

use tracing::{info, trace};

use crate::config::StrategyConfig;
use crate::domain::{HistoricalBar, InstrumentId, Signal, Tick};
use crate::engine::instrument::{InstrumentEngine, InstrumentStatus};
use crate::engine::warmup::WarmupReport;
use crate::error::{ConfigError, EngineError};

#[derive(Debug, Clone)]
pub struct SignalEngine {
    config: StrategyConfig,
    instruments: BTreeMap<InstrumentId, InstrumentEngine>,
}

impl SignalEngine {
    /// Validate the config and create one engine per configured symbol.
    pub fn new(config: StrategyConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let instruments = config
            .symbols
            .iter()
            .map(|symbol| -> Result<_, ConfigError> {
                Ok((symbol.clone(), InstrumentEngine::new(symbol.clone(), &config)?))
            })
            .collect::<Result<BTreeMap<_, _>, _>>()?;

        info!(
            strategy = %config.strategy_name,
            fingerprint = %config.fingerprint(),
            symbols = ?config.symbols,
            interval_minutes = config.bar_interval_minutes,
            source = ?config.signal_source,
            "signal engine initialized"
        );
        Ok(Self {
            config,
            instruments,
        })
    }

    pub fn config(&self) -> &StrategyConfig {
        &self.config
    }

    /// Route a tick. Ticks for unconfigured instruments are ignored.
    pub fn on_tick(&mut self, tick: &Tick) -> Result<Option<Signal>, EngineError> {
        match self.instruments.get_mut(&tick.instrument) {
            Some(engine) => engine.on_tick(tick),
            None => {
                trace!(instrument = %tick.instrument, "ignoring tick for unknown instrument");
                Ok(None)
            }
        }
    }

    /// Warm up one instrument. Unknown instruments load nothing.
    pub fn warmup<I>(&mut self, instrument: &str, records: I) -> Result<WarmupReport, EngineError>
    where
        I: IntoIterator<Item = HistoricalBar>,
    {
        match self.instruments.get_mut(instrument) {
            Some(engine) => engine.warmup(records),
            None => {
                trace!(instrument, "ignoring warmup for unknown instrument");
                Ok(WarmupReport::default())
            }
        }
    }

    pub fn instrument(&self, instrument: &str) -> Option<&InstrumentEngine> {
        self.instruments.get(instrument)
    }

    pub fn statuses(&self) -> Vec<InstrumentStatus> {
        self.instruments.values().map(InstrumentEngine::status).collect()
    }

    /// Split into independent per-instrument engines, e.g. one per worker thread.
    pub fn into_instruments(self) -> Vec<InstrumentEngine> {
        self.instruments.into_values().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn one_engine_per_symbol() {
        let engine = SignalEngine::new(StrategyConfig::default()).unwrap();
        assert_eq!(engine.statuses().len(), 4);
        assert!(engine.instrument("MNQ").is_some());
        assert!(engine.instrument("CL").is_none());
    }

    #[test]
    fn unknown_instrument_ignored() {
        let mut engine = SignalEngine::new(StrategyConfig::default()).unwrap();
        let ts = Utc.with_ymd_and_hms(2024, 10, 21, 14, 0, 0).unwrap();
        assert_eq!(engine.on_tick(&Tick::new("CL", 70.0, 1, ts)), Ok(None));
        assert_eq!(engine.warmup("CL", Vec::new()).unwrap(), WarmupReport::default());
        assert!(engine.statuses().iter().all(|s| s.ticks_processed == 0));
    }

    #[test]
    fn invalid_config_rejected() {
        let config = StrategyConfig {
            symbols: Vec::new(),
            ..StrategyConfig::default()
        };
        assert!(SignalEngine::new(config).is_err());
    }

    #[test]
    fn split_preserves_instruments() {
        let engine = SignalEngine::new(StrategyConfig::default()).unwrap();
        let names: Vec<String> = engine
            .into_instruments()
            .iter()
            .map(|e| e.instrument().to_string())
            .collect();
        assert_eq!(names, vec!["ES", "MES", "MNQ", "NQ"]);
    }
}
