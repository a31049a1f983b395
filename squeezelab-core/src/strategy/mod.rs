//! Position bookkeeping and the entry/exit decision logic.
//!
//! - `position`: per-instrument long position with a one-way stop ratchet
//! - `state_machine`: squeeze entries and the prioritized exit checks

pub mod position;
pub mod state_machine;

pub use position::{PositionState, StopKind};
pub use state_machine::SignalStateMachine;
