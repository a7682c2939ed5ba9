//! MemTable implementation
//!
//! BTreeMap + tombstone set behind a parking_lot Mutex.

use std::collections::{BTreeMap, HashSet};

use parking_lot::{Mutex, MutexGuard};

use super::MemTableEntry;

/// Unflushed writes and deletes
///
/// ## Concurrency:
/// - One Mutex guards both the value map and the tombstone set, so a
///   `put` clearing a tombstone and installing a value is a single step
/// - Flush holds the guard (via [`MemTable::lock`]) for its whole duration
pub struct MemTable {
    state: Mutex<MemTableState>,
}

/// The lock-protected contents of a [`MemTable`]
#[derive(Debug, Default)]
pub struct MemTableState {
    /// key → latest value
    entries: BTreeMap<Vec<u8>, Vec<u8>>,
    /// keys deleted since the last flush
    tombstones: HashSet<Vec<u8>>,
}

impl MemTable {
    /// Create a new empty MemTable
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MemTableState::default()),
        }
    }

    /// Look up a key
    ///
    /// Returns:
    /// - `Some(Tombstone)`: key was deleted (checked before the value map)
    /// - `Some(Value(v))`: key was written
    /// - `None`: memtable knows nothing about the key
    pub fn get(&self, key: &[u8]) -> Option<MemTableEntry> {
        self.state.lock().lookup(key)
    }

    /// Put a key-value pair, clearing any tombstone for the key first
    pub fn put(&self, key: Vec<u8>, value: Vec<u8>) {
        let mut state = self.state.lock();
        state.tombstones.remove(&key);
        state.entries.insert(key, value);
    }

    /// Mark a key deleted
    ///
    /// The value map is left alone; the tombstone masks it.
    pub fn delete(&self, key: Vec<u8>) {
        self.state.lock().tombstones.insert(key);
    }

    /// Take the lock for the duration of a flush
    pub fn lock(&self) -> MutexGuard<'_, MemTableState> {
        self.state.lock()
    }

    /// Number of buffered values (including ones masked by tombstones)
    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    /// Number of tombstones
    pub fn tombstone_count(&self) -> usize {
        self.state.lock().tombstones.len()
    }

    /// True when there is nothing to flush
    pub fn is_empty(&self) -> bool {
        self.state.lock().is_empty()
    }
}

impl Default for MemTable {
    fn default() -> Self {
        Self::new()
    }
}

impl MemTableState {
    /// Same lookup order as [`MemTable::get`]
    pub fn lookup(&self, key: &[u8]) -> Option<MemTableEntry> {
        if self.tombstones.contains(key) {
            return Some(MemTableEntry::Tombstone);
        }
        self.entries
            .get(key)
            .map(|value| MemTableEntry::Value(value.clone()))
    }

    /// Buffered values in sorted key order
    pub fn entries(&self) -> &BTreeMap<Vec<u8>, Vec<u8>> {
        &self.entries
    }

    pub fn is_tombstoned(&self, key: &[u8]) -> bool {
        self.tombstones.contains(key)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.tombstones.is_empty()
    }

    /// Drop everything (after the flushed files are installed)
    pub fn clear(&mut self) {
        self.entries.clear();
        self.tombstones.clear();
    }
}
