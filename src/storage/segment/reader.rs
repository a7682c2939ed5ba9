//! Segment Reader
//!
//! Random-access reads from a persisted segment file.

use std::fs::File;
use std::io::{BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::error::Result;

use super::iterator::SegmentIterator;
use super::{read_record, Record};

/// Reader for a persisted segment
///
/// The file handle sits behind a Mutex so lookups work through `&self`,
/// letting many `get` calls share the store's read lock.
pub struct SegmentReader {
    path: PathBuf,
    file: Mutex<BufReader<File>>,
    /// File size at open time (the file is never appended to afterwards)
    len: u64,
}

impl SegmentReader {
    /// Open a segment file for reading
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let len = file.metadata()?.len();

        Ok(Self {
            path: path.to_path_buf(),
            file: Mutex::new(BufReader::new(file)),
            len,
        })
    }

    /// Seek to `offset` and decode the record there
    pub fn fetch_offset(&self, offset: u64) -> Result<Record> {
        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(offset))?;
        read_record(&mut *file, offset, self.len)
    }

    /// Sequential scan of the whole file
    ///
    /// Holds the file lock until the iterator is dropped.
    pub fn iter(&self) -> Result<SegmentIterator<'_>> {
        SegmentIterator::new(self.file.lock(), self.len)
    }

    pub fn len_bytes(&self) -> u64 {
        self.len
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
