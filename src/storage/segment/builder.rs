//! Segment Builder
//!
//! Writes records to a new segment and the matching index entries to a
//! new index, both as temporary files in the data directory.

use std::io::{BufWriter, Write};
use std::path::Path;

use tempfile::NamedTempFile;

use crate::error::{FlatError, Result};
use crate::storage::index::write_entry;
use crate::storage::{temp_file_in, RECORD_HEADER_SIZE};

use super::encode_header;

/// Builder for a segment + index pair
///
/// Records land in the order `add` is called; every record gets an index
/// entry pointing at its header, so index order mirrors segment order.
pub struct SegmentBuilder {
    /// Segment output
    segment: BufWriter<NamedTempFile>,
    /// Index output
    index: BufWriter<NamedTempFile>,
    /// Offset the next record will start at
    current_offset: u64,
    /// Records written so far
    record_count: u64,
}

impl SegmentBuilder {
    /// Create both temporary outputs inside `dir`
    pub fn new_in(dir: &Path) -> Result<Self> {
        Ok(Self {
            segment: BufWriter::new(temp_file_in(dir)?),
            index: BufWriter::new(temp_file_in(dir)?),
            current_offset: 0,
            record_count: 0,
        })
    }

    /// Append a record and its index entry
    pub fn add(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        let key_len = u32::try_from(key.len()).map_err(|_| {
            FlatError::InvalidArgument(format!("key of {} bytes exceeds u32 length", key.len()))
        })?;
        let value_len = u32::try_from(value.len()).map_err(|_| {
            FlatError::InvalidArgument(format!(
                "value of {} bytes exceeds u32 length",
                value.len()
            ))
        })?;

        let offset = self.current_offset;

        self.segment.write_all(&encode_header(key_len, value_len))?;
        self.segment.write_all(key)?;
        self.segment.write_all(value)?;

        write_entry(&mut self.index, key, offset)?;

        self.current_offset += RECORD_HEADER_SIZE + key.len() as u64 + value.len() as u64;
        self.record_count += 1;

        Ok(())
    }

    /// Records written so far
    pub fn record_count(&self) -> u64 {
        self.record_count
    }

    /// Bytes of segment written so far
    pub fn bytes_written(&self) -> u64 {
        self.current_offset
    }

    /// Flush both outputs (and fsync them when `sync` is set)
    ///
    /// Returns `(segment, index)`. Dropping either without persisting it
    /// deletes the file.
    pub fn finish(self, sync: bool) -> Result<(NamedTempFile, NamedTempFile)> {
        let segment = self.segment.into_inner().map_err(|e| e.into_error())?;
        let index = self.index.into_inner().map_err(|e| e.into_error())?;

        if sync {
            segment.as_file().sync_all()?;
            index.as_file().sync_all()?;
        }

        Ok((segment, index))
    }
}
