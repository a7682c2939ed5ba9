//! Storage Module
//!
//! Persistent storage: one segment file plus its index.
//!
//! ## Responsibilities
//! - Encode and decode length-prefixed records
//! - Random-access fetch and full sequential scans of the segment
//! - Load, verify and rebuild the key → offset index
//! - Merge the memtable into a fresh segment on flush
//!
//! ## Directory Layout
//! ```text
//! {data_dir}/
//!   ├── table                 segment: records back to back
//!   ├── index                 key\0offset\0key\0offset\0...
//!   └── .flatkv-tmp*          in-flight flush outputs (removed on open)
//! ```
//!
//! ## Record Format
//! ```text
//! ┌────────────┬────────────┬───────────┬─────────────┐
//! │KeyLen u32LE│ValLen u32LE│ Key bytes │ Value bytes │
//! └────────────┴────────────┴───────────┴─────────────┘
//! ```

mod compactor;
mod disk;
mod index;
mod segment;

use std::fs;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::error::Result;

pub use compactor::{compact, CompactionOutput, FlushStats};
pub use disk::DiskTable;
pub use index::Index;
pub use segment::{Record, Segment, SegmentBuilder, SegmentIterator, SegmentReader};

// =============================================================================
// Shared Constants
// =============================================================================

/// File name of the segment inside the data directory
pub const TABLE_FILENAME: &str = "table";

/// File name of the index inside the data directory
pub const INDEX_FILENAME: &str = "index";

/// Prefix of temporary files written during flush
pub const TEMP_PREFIX: &str = ".flatkv-tmp";

/// Record header: KeyLen (4) + ValLen (4) = 8 bytes
pub const RECORD_HEADER_SIZE: u64 = 8;

// =============================================================================
// Shared Helpers
// =============================================================================

/// Create a temporary file next to the live files so it can be renamed
/// over them on the same filesystem
pub(crate) fn temp_file_in(dir: &Path) -> Result<NamedTempFile> {
    Ok(tempfile::Builder::new().prefix(TEMP_PREFIX).tempfile_in(dir)?)
}

/// Make completed renames inside `dir` durable
#[cfg(unix)]
pub(crate) fn sync_dir(dir: &Path) -> Result<()> {
    fs::File::open(dir)?.sync_all()?;
    Ok(())
}

#[cfg(not(unix))]
pub(crate) fn sync_dir(_dir: &Path) -> Result<()> {
    Ok(())
}

/// Remove flush outputs left behind by a crash; returns how many were removed
pub(crate) fn remove_stale_temp_files(dir: &Path) -> Result<usize> {
    let mut removed = 0;
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let is_temp = entry
            .file_name()
            .to_str()
            .map(|name| name.starts_with(TEMP_PREFIX))
            .unwrap_or(false);

        if is_temp && entry.file_type()?.is_file() {
            tracing::debug!(path = %entry.path().display(), "removing stale flush output");
            fs::remove_file(entry.path())?;
            removed += 1;
        }
    }
    Ok(removed)
}
