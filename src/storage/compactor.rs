//! Compactor
//!
//! Merges the current segment with the memtable into a fresh segment and
//! index.
//!
//! ## Merge Rules
//! - A tombstoned key is dropped, wherever its value came from
//! - A memtable value replaces the on-disk value for the same key
//! - Output order: old segment order first, then memtable keys that were
//!   never on disk, in memtable (sorted) order

use std::collections::BTreeMap;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::error::Result;
use crate::memtable::MemTableState;

use super::{sync_dir, Segment, SegmentBuilder, INDEX_FILENAME, TABLE_FILENAME};

/// Summary of one flush
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushStats {
    /// Records in the new segment
    pub records_written: u64,
    /// Disk records and buffered values suppressed by tombstones
    pub records_dropped: u64,
    /// Size of the new segment
    pub bytes_written: u64,
}

/// A merged segment + index waiting to be renamed into place
///
/// Dropping it without calling [`install`](Self::install) deletes both
/// temporary files.
pub struct CompactionOutput {
    segment: NamedTempFile,
    index: NamedTempFile,
    stats: FlushStats,
}

/// Merge `segment` with `memtable` into temporary files inside `dir`
pub fn compact(
    segment: &Segment,
    memtable: &MemTableState,
    dir: &Path,
    sync: bool,
) -> Result<CompactionOutput> {
    let mut builder = SegmentBuilder::new_in(dir)?;
    let mut records_dropped = 0u64;

    // Working copy: buffered values not yet written
    let mut pending: BTreeMap<&[u8], &[u8]> = memtable
        .entries()
        .iter()
        .map(|(key, value)| (key.as_slice(), value.as_slice()))
        .collect();

    // Pass 1: old segment, in file order
    for item in segment.iter()? {
        let (_, record) = item?;

        if memtable.is_tombstoned(&record.key) {
            pending.remove(record.key.as_slice());
            records_dropped += 1;
            continue;
        }

        match pending.remove(record.key.as_slice()) {
            Some(buffered) => builder.add(&record.key, buffered)?,
            None => builder.add(&record.key, &record.value)?,
        }
    }

    // Pass 2: keys that were only in the memtable
    for (key, value) in pending {
        if memtable.is_tombstoned(key) {
            records_dropped += 1;
            continue;
        }
        builder.add(key, value)?;
    }

    let stats = FlushStats {
        records_written: builder.record_count(),
        records_dropped,
        bytes_written: builder.bytes_written(),
    };

    tracing::debug!(
        records_written = stats.records_written,
        records_dropped = stats.records_dropped,
        bytes_written = stats.bytes_written,
        "compaction finished"
    );

    let (segment, index) = builder.finish(sync)?;
    Ok(CompactionOutput {
        segment,
        index,
        stats,
    })
}

impl CompactionOutput {
    pub fn stats(&self) -> FlushStats {
        self.stats
    }

    /// Rename the new files over `dir/table` and `dir/index`
    ///
    /// The segment goes first. If the index rename then fails, the
    /// directory holds a new segment with a stale index, which open-time
    /// verification detects and repairs.
    pub fn install(self, dir: &Path, sync: bool) -> Result<FlushStats> {
        self.segment.persist(dir.join(TABLE_FILENAME))?;
        self.index.persist(dir.join(INDEX_FILENAME))?;

        if sync {
            sync_dir(dir)?;
        }

        Ok(self.stats)
    }
}
