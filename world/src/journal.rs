use std::collections::VecDeque;

use droidworks_core::JournalEntry;

/// Bounded audit trail of resolved movement intents. Oldest entries go first.
#[derive(Clone, Debug)]
pub struct MovementJournal {
    entries: VecDeque<JournalEntry>,
    capacity: usize,
}

impl MovementJournal {
    /// Creates an empty journal holding at most `capacity` entries.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Maximum number of retained entries.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of retained entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Reports whether nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates entries oldest first.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &JournalEntry> {
        self.entries.iter()
    }

    /// Entries recorded during one tick.
    pub fn for_tick(&self, tick: u64) -> impl Iterator<Item = &JournalEntry> {
        self.entries.iter().filter(move |entry| entry.tick == tick)
    }

    /// Most recent entry.
    #[must_use]
    pub fn last(&self) -> Option<&JournalEntry> {
        self.entries.back()
    }

    pub(crate) fn push(&mut self, entry: JournalEntry) {
        while self.entries.len() >= self.capacity {
            let _ = self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use droidworks_core::{EntityId, Location, MoveOutcome};

    fn entry(tick: u64) -> JournalEntry {
        JournalEntry {
            tick,
            entity: EntityId::new("Probe_1"),
            from: Location::new(1, 1),
            to: Location::new(2, 1),
            outcome: MoveOutcome::Applied,
            blocker: None,
        }
    }

    #[test]
    fn oldest_entries_are_evicted_first() {
        let mut journal = MovementJournal::new(3);
        for tick in 1..=5 {
            journal.push(entry(tick));
        }
        assert_eq!(journal.len(), 3);
        let ticks: Vec<u64> = journal.iter().map(|e| e.tick).collect();
        assert_eq!(ticks, [3, 4, 5]);
        assert_eq!(journal.last().map(|e| e.tick), Some(5));
        assert_eq!(journal.for_tick(4).count(), 1);
    }

    #[test]
    fn zero_capacity_still_keeps_latest_entry() {
        let mut journal = MovementJournal::new(0);
        journal.push(entry(1));
        journal.push(entry(2));
        assert_eq!(journal.capacity(), 1);
        assert_eq!(journal.last().map(|e| e.tick), Some(2));
    }
}
