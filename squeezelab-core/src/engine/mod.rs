//! Live signal engine: per-instrument tick pipeline and the multi-instrument
//! router on top of it.
//!
//! Each tick runs to completion through four steps:
//!
//! 1. Aggregate: fold the tick into the current bar, seal on a boundary
//! 2. Trend state: step the Parabolic SAR once for every sealed bar
//! 3. Session gate: outside the session only the forced close may fire
//! 4. Decide: recompute the snapshot, check exits, then entries

pub mod instrument;
pub mod router;
pub mod warmup;

pub use instrument::{InstrumentEngine, InstrumentStatus};
pub use router::SignalEngine;
pub use warmup::WarmupReport;
