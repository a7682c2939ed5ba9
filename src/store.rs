//! Store Module
//!
//! The facade that ties the memtable to the on-disk segment.
//!
//! ## Responsibilities
//! - Validate keys and values before any state is touched
//! - Route reads: tombstones → memtable → index → segment
//! - Route writes and deletes into the memtable
//! - Flush: compact, install the new files, reload from disk

use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;

use crate::config::Config;
use crate::error::{FlatError, Result};
use crate::memtable::{MemTable, MemTableEntry};
use crate::storage::{self, DiskTable};

pub use crate::storage::FlushStats;

/// A key-value store over one directory
///
/// ## Concurrency Model
///
/// - **memtable** (Mutex inside [`MemTable`]): values and tombstones.
///   `set`/`delete` hold it only for the map update; `get` holds it only
///   while consulting the memtable.
/// - **disk** (RwLock): the segment/index pair. `get` takes it shared
///   when it falls through to disk; `flush` takes it exclusive.
///
/// Lock order is always disk → memtable. `get` never holds both, so the
/// order can only matter to `flush`, which takes them in that order and
/// keeps both until the new files are installed and reloaded.
pub struct Store {
    /// Store configuration
    config: Config,

    /// Directory holding `table` and `index`
    dir: PathBuf,

    /// Current segment + index
    disk: RwLock<DiskTable>,

    /// Unflushed writes and tombstones
    memtable: MemTable,
}

impl Store {
    /// Open or create a store with the given config
    ///
    /// On startup:
    /// 1. Validate the config and create the data directory if needed
    /// 2. Clean up after any interrupted flush
    /// 3. Load (and optionally verify) segment and index
    pub fn open(config: Config) -> Result<Self> {
        if config.data_dir.as_os_str().is_empty() {
            return Err(FlatError::Config("data_dir must not be empty".to_string()));
        }
        if config.data_dir.is_file() {
            return Err(FlatError::Config(format!(
                "data_dir {} is a file",
                config.data_dir.display()
            )));
        }

        fs::create_dir_all(&config.data_dir)?;
        let dir = config.data_dir.clone();

        let disk = DiskTable::recover(&dir, config.verify_on_open, config.sync_on_flush)?;

        tracing::info!(
            dir = %dir.display(),
            keys = disk.index().len(),
            segment_bytes = disk.segment().len_bytes(),
            "store opened"
        );

        Ok(Self {
            config,
            dir,
            disk: RwLock::new(disk),
            memtable: MemTable::new(),
        })
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified data directory
    pub fn open_path(path: impl AsRef<Path>) -> Result<Self> {
        let config = Config::builder().data_dir(path.as_ref()).build();
        Self::open(config)
    }

    /// Get a value by key
    ///
    /// Search order:
    /// 1. Tombstones (deleted since last flush → absent)
    /// 2. MemTable
    /// 3. Index + segment
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        validate_key(key)?;

        match self.memtable.get(key) {
            Some(MemTableEntry::Tombstone) => return Ok(None),
            Some(MemTableEntry::Value(value)) => return Ok(Some(value)),
            None => {}
        }

        self.disk.read().get(key)
    }

    /// Set a key-value pair
    pub fn set(&self, key: &[u8], value: &[u8]) -> Result<()> {
        validate_key(key)?;
        validate_value(value)?;

        self.memtable.put(key.to_vec(), value.to_vec());
        Ok(())
    }

    /// Delete a key
    ///
    /// The key does not need to exist.
    pub fn delete(&self, key: &[u8]) -> Result<()> {
        validate_key(key)?;

        self.memtable.delete(key.to_vec());
        Ok(())
    }

    /// Merge the memtable into a new segment and install it
    ///
    /// Steps (with disk and memtable locks held throughout):
    /// 1. Compact old segment + memtable into temporary files
    /// 2. Rename them over `table` and `index`
    /// 3. Reload segment and index from disk
    /// 4. Clear the memtable
    ///
    /// On failure before the renames nothing changes, on disk or in memory.
    /// A failure after them leaves the in-memory state as it was (old
    /// segment handle, old index, unflushed memtable), which still answers
    /// reads correctly; retrying the flush rewrites both files.
    pub fn flush(&self) -> Result<FlushStats> {
        let mut disk = self.disk.write();
        let mut memtable = self.memtable.lock();

        if memtable.is_empty() {
            tracing::debug!("flush skipped, memtable is empty");
            return Ok(FlushStats::default());
        }

        let sync = self.config.sync_on_flush;
        let output = storage::compact(disk.segment(), &memtable, &self.dir, sync)?;
        let stats = output.install(&self.dir, sync)?;

        *disk = DiskTable::open(&self.dir)?;
        memtable.clear();

        tracing::info!(
            records_written = stats.records_written,
            records_dropped = stats.records_dropped,
            bytes_written = stats.bytes_written,
            "flush complete"
        );

        Ok(stats)
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Get the data directory path
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Buffered values, including ones masked by tombstones
    pub fn memtable_len(&self) -> usize {
        self.memtable.len()
    }

    /// Tombstones waiting for the next flush
    pub fn tombstone_count(&self) -> usize {
        self.memtable.tombstone_count()
    }

    /// Keys in the current index
    pub fn indexed_len(&self) -> usize {
        self.disk.read().index().len()
    }

    /// Size of the current segment in bytes
    pub fn segment_size(&self) -> u64 {
        self.disk.read().segment().len_bytes()
    }
}

// =============================================================================
// Argument Validation
// =============================================================================

fn validate_key(key: &[u8]) -> Result<()> {
    if key.contains(&0) {
        return Err(FlatError::InvalidArgument(
            "key contains a NUL byte".to_string(),
        ));
    }
    if u32::try_from(key.len()).is_err() {
        return Err(FlatError::InvalidArgument(format!(
            "key of {} bytes exceeds u32 length",
            key.len()
        )));
    }
    Ok(())
}

fn validate_value(value: &[u8]) -> Result<()> {
    if u32::try_from(value.len()).is_err() {
        return Err(FlatError::InvalidArgument(format!(
            "value of {} bytes exceeds u32 length",
            value.len()
        )));
    }
    Ok(())
}
