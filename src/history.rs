use std::collections::VecDeque;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub sequence: usize,
    pub text: String,
}

/// Append-only log of executed command lines.
///
/// Entries are kept in sequence order. Sequence numbers are handed out by
/// the caller and must be strictly increasing; the log never renumbers
/// them. With a capacity set, the oldest entries are evicted first and
/// their numbers simply stop resolving.
#[derive(Debug, Default)]
pub struct History {
    entries: VecDeque<HistoryEntry>,
    capacity: Option<usize>,
}

impl History {
    #[cfg(test)]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: Option<usize>) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity,
        }
    }

    pub fn append(&mut self, sequence: usize, text: impl Into<String>) {
        debug_assert!(
            self.last_sequence().map_or(sequence > 0, |last| sequence > last),
            "history sequence numbers must increase"
        );
        if let Some(capacity) = self.capacity {
            if capacity == 0 {
                return;
            }
            while self.entries.len() >= capacity {
                self.entries.pop_front();
            }
        }
        self.entries.push_back(HistoryEntry {
            sequence,
            text: text.into(),
        });
    }

    pub fn lookup(&self, sequence: usize) -> Option<&str> {
        self.entries
            .binary_search_by_key(&sequence, |entry| entry.sequence)
            .ok()
            .map(|idx| self.entries[idx].text.as_str())
    }

    /// Entries whose sequence number is at least `min`, oldest first.
    pub fn list_from(&self, min: usize) -> impl Iterator<Item = &HistoryEntry> {
        let start = self.entries.partition_point(|entry| entry.sequence < min);
        self.entries.range(start..)
    }

    pub fn last_sequence(&self) -> Option<usize> {
        self.entries.back().map(|entry| entry.sequence)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
