//! MemTable Module
//!
//! In-memory buffer for writes that have not been flushed yet.
//!
//! ## Responsibilities
//! - Hold the latest value for every key written since the last flush
//! - Track tombstones for keys deleted since the last flush
//! - Hand both to the compactor, under one lock, during flush
//!
//! ## Data Structure Choice
//! A BTreeMap of live values plus a HashSet of tombstones, both behind a
//! single Mutex:
//! - Sorted iteration keeps flush output deterministic
//! - A tombstone masks any value still sitting in the map, so `delete`
//!   never has to touch the map itself

mod table;

pub use table::{MemTable, MemTableState};

/// Result of a memtable lookup
#[derive(Debug, Clone, PartialEq)]
pub enum MemTableEntry {
    /// A live value
    Value(Vec<u8>),

    /// A tombstone (deleted key)
    Tombstone,
}
