//! Bar aggregation: ticks are folded into fixed-interval bars, closed bars
//! land in a bounded history.

pub mod aggregator;
pub mod history;

pub use aggregator::BarAggregator;
pub use history::BarHistory;
