use std::collections::VecDeque;

use crate::pixels::PixelBuffer;

pub const DEFAULT_HISTORY_CAPACITY: usize = 20;

/// Bounded undo log of whole-buffer snapshots. Pushing past capacity evicts
/// the oldest entry.
#[derive(Debug, Clone)]
pub struct HistoryStack {
    entries: VecDeque<PixelBuffer>,
    capacity: usize,
}

impl Default for HistoryStack {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

impl HistoryStack {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn push(&mut self, snapshot: PixelBuffer) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
            tracing::debug!(capacity = self.capacity, "history full; evicted oldest snapshot");
        }
        self.entries.push_back(snapshot);
    }

    pub fn pop(&mut self) -> Option<PixelBuffer> {
        self.entries.pop_back()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
