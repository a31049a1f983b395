//! Bounded FIFO of closed bars.

use std::collections::VecDeque;

use crate::domain::Bar;

/// Ring buffer of closed bars, oldest first. Capacity is fixed at
/// construction; pushing into a full history evicts the oldest bar.
#[derive(Debug, Clone)]
pub struct BarHistory {
    bars: VecDeque<Bar>,
    capacity: usize,
}

impl BarHistory {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity >= 1, "history capacity must be >= 1");
        Self {
            bars: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a closed bar, returning the evicted bar if the history was full.
    pub fn push(&mut self, bar: Bar) -> Option<Bar> {
        let evicted = if self.bars.len() == self.capacity {
            self.bars.pop_front()
        } else {
            None
        };
        self.bars.push_back(bar);
        evicted
    }

    /// Remove and return the newest bar.
    pub(crate) fn pop_newest(&mut self) -> Option<Bar> {
        self.bars.pop_back()
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Newest closed bar.
    pub fn last(&self) -> Option<&Bar> {
        self.bars.back()
    }

    /// The `n`-th bar counting back from the newest (0 = newest).
    pub fn from_newest(&self, n: usize) -> Option<&Bar> {
        self.bars.len().checked_sub(n + 1).and_then(|i| self.bars.get(i))
    }

    pub fn iter(&self) -> std::collections::vec_deque::Iter<'_, Bar> {
        self.bars.iter()
    }
}
