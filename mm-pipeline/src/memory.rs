//! In-process history of solved problems
//!
//! Newest entry first. Entries are never edited; they leave the store only
//! through `clear` or capacity eviction.

use uuid::Uuid;

use crate::models::MemoryEntry;

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Vec<MemoryEntry>,
    capacity: Option<usize>,
}

impl MemoryStore {
    /// Unbounded store
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that keeps at most `capacity` entries (None = unbounded)
    pub fn with_capacity(capacity: Option<usize>) -> Self {
        Self {
            entries: Vec::new(),
            capacity,
        }
    }

    /// Prepend an entry, evicting the oldest entries past capacity
    ///
    /// Returns the number of evicted entries.
    pub fn append(&mut self, entry: MemoryEntry) -> usize {
        self.entries.insert(0, entry);

        match self.capacity {
            Some(cap) if self.entries.len() > cap => {
                let evicted = self.entries.len() - cap;
                self.entries.truncate(cap);
                evicted
            }
            _ => 0,
        }
    }

    pub fn select(&self, id: Uuid) -> Option<&MemoryEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn entries(&self) -> &[MemoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }
}
