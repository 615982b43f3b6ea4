use std::collections::VecDeque;

use crate::OutcomeEvent;

pub const HISTORY_CAPACITY: usize = 100;

/// Bounded, oldest-first record of claim outcomes.
#[derive(Debug, Clone, PartialEq)]
pub struct History {
    capacity: usize,
    entries: VecDeque<OutcomeEvent>,
}

impl Default for History {
    fn default() -> Self {
        Self::with_capacity(HISTORY_CAPACITY)
    }
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, event: OutcomeEvent) {
        if self.capacity == 0 {
            return;
        }
        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(event);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn snapshot(&self) -> Vec<OutcomeEvent> {
        self.entries.iter().cloned().collect()
    }
}
