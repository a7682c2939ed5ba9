//! # FlatKV
//!
//! A flat sorted-string-table key-value store with:
//! - An in-memory memtable plus tombstone set for recent writes
//! - A single immutable on-disk segment with a key → offset index
//! - Merge-on-flush compaction that rewrites the segment as a whole
//! - Shared reads / exclusive flush concurrency model
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          Store                               │
//! │              get / set / delete / flush                      │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────────┐
//!   │  MemTable   │          │  Segment+Index  │
//!   │  (Mutex)    │          │    (RwLock)     │
//!   └──────┬──────┘          └────────┬────────┘
//!          │        flush             │
//!          └──────────┬───────────────┘
//!                     ▼
//!              ┌─────────────┐
//!              │  Compactor  │ ──▶ table + index (renamed into place)
//!              └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod memtable;
pub mod storage;
pub mod store;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{FlatError, Result};
pub use config::Config;
pub use store::{FlushStats, Store};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of FlatKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
