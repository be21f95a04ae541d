// src/memory.rs
//
// Working memory: bounded FIFO log of recent (state, action, reward)
// observations. Single writer (the agent controller); eviction is strict
// oldest-first once the configured capacity is exceeded.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::evaluator::SituationState;
use crate::types::{Action, Timestamp};

/// One recorded observation tuple.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryEntry {
    pub state: SituationState,
    pub action: Action,
    pub reward: f32,
    pub timestamp: Timestamp,
}

/// Fixed-capacity rolling observation buffer.
#[derive(Debug, Clone)]
pub struct WorkingMemory {
    capacity: usize,
    entries: VecDeque<MemoryEntry>,
}

impl WorkingMemory {
    /// Capacity is clamped to 4..=128 at construction.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.clamp(4, 128);
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity + 1),
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

    /// Timestamp and append an observation, evicting oldest entries until
    /// the log fits the capacity again. Returns the recorded entry.
    pub fn push(
        &mut self,
        state: SituationState,
        action: Action,
        reward: f32,
        now: Timestamp,
    ) -> MemoryEntry {
        let entry = MemoryEntry {
            state,
            action,
            reward,
            timestamp: now,
        };
        self.entries.push_back(entry);
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
        entry
    }

    /// Copy up to `out.len()` most-recent entries into `out` in
    /// chronological order; returns the count copied. Never allocates and
    /// never writes past the returned count.
    pub fn sequence(&self, out: &mut [MemoryEntry]) -> usize {
        let count = out.len().min(self.entries.len());
        if count == 0 {
            return 0;
        }
        let skip = self.entries.len() - count;
        for (dst, src) in out.iter_mut().zip(self.entries.iter().skip(skip)) {
            *dst = *src;
        }
        count
    }

    /// Most recently recorded entry, if any.
    pub fn last(&self) -> Option<&MemoryEntry> {
        self.entries.back()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Iterate oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &MemoryEntry> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry_at(t: Timestamp) -> (SituationState, Action, f32) {
        let state = SituationState {
            timestamp: t,
            ..SituationState::default()
        };
        (state, Action::idle(), 0.0)
    }

    #[test]
    fn fifo_eviction_keeps_newest() {
        let mut memory = WorkingMemory::new(32);
        for i in 0..40 {
            let (state, action, reward) = entry_at(i as f64);
            memory.push(state, action, reward, i as f64);
        }
        assert_eq!(memory.len(), 32);
        // Oldest 8 evicted: first surviving timestamp is 8.
        assert_eq!(memory.iter().next().map(|e| e.timestamp), Some(8.0));
        assert_eq!(memory.last().map(|e| e.timestamp), Some(39.0));
    }

    #[test]
    fn sequence_returns_chronological_tail() {
        let mut memory = WorkingMemory::new(16);
        for i in 0..10 {
            let (state, action, reward) = entry_at(i as f64);
            memory.push(state, action, reward, i as f64);
        }

        let mut buffer = [MemoryEntry::default(); 4];
        let count = memory.sequence(&mut buffer);
        assert_eq!(count, 4);
        let timestamps: Vec<f64> = buffer.iter().map(|e| e.timestamp).collect();
        assert_eq!(timestamps, vec![6.0, 7.0, 8.0, 9.0]);

        // Buffer longer than the log: only the stored count is written.
        let mut wide = [MemoryEntry::default(); 16];
        let count = memory.sequence(&mut wide);
        assert_eq!(count, 10);
        assert_eq!(wide[0].timestamp, 0.0);
        assert_eq!(wide[9].timestamp, 9.0);
    }

    #[test]
    fn capacity_is_clamped() {
        assert_eq!(WorkingMemory::new(0).capacity(), 4);
        assert_eq!(WorkingMemory::new(1000).capacity(), 128);
        assert_eq!(WorkingMemory::new(32).capacity(), 32);
    }

    #[test]
    fn clear_empties_log() {
        let mut memory = WorkingMemory::new(8);
        let (state, action, reward) = entry_at(1.0);
        memory.push(state, action, reward, 1.0);
        assert!(!memory.is_empty());
        memory.clear();
        assert!(memory.is_empty());
        assert!(memory.last().is_none());
    }
}
