//! Signal: the engine's only output.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SignalAction {
    Buy,
    Sell,
}

impl fmt::Display for SignalAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalAction::Buy => write!(f, "BUY"),
            SignalAction::Sell => write!(f, "SELL"),
        }
    }
}

/// An entry or exit decision for one instrument, emitted synchronously from
/// tick processing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub action: SignalAction,
    pub instrument: String,
    pub strategy: String,
    pub price: f64,
    /// Human-readable reason, e.g. `"Exit: Initial stop hit at 100.00"`.
    pub reason: String,
    /// Start of the bar the deciding tick belongs to.
    pub bar_time: DateTime<Utc>,
    /// Timestamp of the deciding tick.
    pub timestamp: DateTime<Utc>,
}

impl Signal {
    pub fn is_entry(&self) -> bool {
        self.action == SignalAction::Buy
    }

    pub fn is_exit(&self) -> bool {
        self.action == SignalAction::Sell
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn action_serializes_uppercase() {
        let ts = Utc.with_ymd_and_hms(2024, 10, 21, 14, 30, 0).unwrap();
        let signal = Signal {
            action: SignalAction::Sell,
            instrument: "NQ".into(),
            strategy: "Purple Reign".into(),
            price: 20_100.25,
            reason: "EOD Exit".into(),
            bar_time: ts,
            timestamp: ts,
        };
        let json = serde_json::to_string(&signal).unwrap();
        assert!(json.contains("\"action\":\"SELL\""));
        assert!(signal.is_exit());
        assert_eq!(SignalAction::Buy.to_string(), "BUY");
    }
}
