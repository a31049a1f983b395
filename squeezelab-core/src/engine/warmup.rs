//! Outcome of loading historical bars before live ticks.

use serde::Serialize;

use crate::error::EngineError;

/// Summary of one warmup load.
///
/// Malformed or out-of-order records are skipped and their errors kept so the
/// caller can report them; they never abort the load.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WarmupReport {
    pub loaded: usize,
    pub skipped: usize,
    #[serde(skip)]
    pub errors: Vec<EngineError>,
}

impl WarmupReport {
    pub fn total(&self) -> usize {
        self.loaded + self.skipped
    }

    pub(crate) fn skip(&mut self, err: EngineError) {
        self.skipped += 1;
        self.errors.push(err);
    }
}
