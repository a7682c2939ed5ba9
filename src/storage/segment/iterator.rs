//! Segment Iterator
//!
//! Sequential iteration over every record in a segment.

use std::fs::File;
use std::io::{BufReader, Seek, SeekFrom};

use parking_lot::MutexGuard;

use crate::error::Result;

use super::{read_record, Record};

/// Iterator over segment records in file order
///
/// Yields `(offset, record)`. Stops after the first error.
pub struct SegmentIterator<'a> {
    /// `None` for the empty segment
    file: Option<MutexGuard<'a, BufReader<File>>>,
    /// Start of the next record
    current_offset: u64,
    /// Segment size
    end_offset: u64,
    failed: bool,
}

impl<'a> SegmentIterator<'a> {
    /// Start a scan at offset 0
    pub(super) fn new(mut file: MutexGuard<'a, BufReader<File>>, end_offset: u64) -> Result<Self> {
        file.seek(SeekFrom::Start(0))?;
        Ok(Self {
            file: Some(file),
            current_offset: 0,
            end_offset,
            failed: false,
        })
    }

    /// Iterator over nothing
    pub(super) fn empty() -> Self {
        Self {
            file: None,
            current_offset: 0,
            end_offset: 0,
            failed: false,
        }
    }
}

impl<'a> Iterator for SegmentIterator<'a> {
    type Item = Result<(u64, Record)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.current_offset >= self.end_offset {
            return None;
        }
        let file = self.file.as_mut()?;

        let offset = self.current_offset;
        match read_record(&mut **file, offset, self.end_offset) {
            Ok(record) => {
                self.current_offset += record.encoded_len();
                Some(Ok((offset, record)))
            }
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}
