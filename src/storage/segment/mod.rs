//! Segment Module
//!
//! The immutable on-disk table of records.
//!
//! ## File Format
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ Record 0 @ offset 0                                     │
//! │   [KeyLen: u32][ValLen: u32][Key][Value]                │
//! ├─────────────────────────────────────────────────────────┤
//! │ Record 1 @ offset 8 + KeyLen0 + ValLen0                 │
//! │   ... repeated until end of file ...                    │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! No header or footer: a record's offset plus its header gives the
//! next record's start, so the file can be scanned without the index.

mod builder;
mod iterator;
mod reader;

use std::io::Read;
use std::path::Path;

use crate::error::{FlatError, Result};

use super::RECORD_HEADER_SIZE;

pub use builder::SegmentBuilder;
pub use iterator::SegmentIterator;
pub use reader::SegmentReader;

// =============================================================================
// Record
// =============================================================================

/// A key/value pair as stored in the segment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub key: Vec<u8>,
    pub value: Vec<u8>,
}

impl Record {
    /// Bytes this record occupies on disk, header included
    pub fn encoded_len(&self) -> u64 {
        RECORD_HEADER_SIZE + self.key.len() as u64 + self.value.len() as u64
    }
}

/// Encode a record header: [key_len(4)][value_len(4)], little-endian
pub(crate) fn encode_header(key_len: u32, value_len: u32) -> [u8; RECORD_HEADER_SIZE as usize] {
    let mut header = [0u8; RECORD_HEADER_SIZE as usize];
    header[0..4].copy_from_slice(&key_len.to_le_bytes());
    header[4..8].copy_from_slice(&value_len.to_le_bytes());
    header
}

fn decode_header(header: &[u8; RECORD_HEADER_SIZE as usize]) -> (u32, u32) {
    let key_len = u32::from_le_bytes([header[0], header[1], header[2], header[3]]);
    let value_len = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);
    (key_len, value_len)
}

/// Read one record from the current position of `reader`
///
/// `offset` is where the reader is positioned and `file_len` the segment
/// size; declared lengths running past the end are reported as corruption
/// before anything is allocated.
pub(crate) fn read_record<R: Read>(reader: &mut R, offset: u64, file_len: u64) -> Result<Record> {
    if offset.saturating_add(RECORD_HEADER_SIZE) > file_len {
        return Err(FlatError::Corruption(format!(
            "record header at offset {} runs past end of segment ({} bytes)",
            offset, file_len
        )));
    }

    let mut header = [0u8; RECORD_HEADER_SIZE as usize];
    read_exact_or_corrupt(reader, &mut header, offset)?;
    let (key_len, value_len) = decode_header(&header);

    let end = offset + RECORD_HEADER_SIZE + key_len as u64 + value_len as u64;
    if end > file_len {
        return Err(FlatError::Corruption(format!(
            "record at offset {} declares {} key bytes and {} value bytes, segment is only {} bytes",
            offset, key_len, value_len, file_len
        )));
    }

    let mut key = vec![0u8; key_len as usize];
    read_exact_or_corrupt(reader, &mut key, offset)?;

    let mut value = vec![0u8; value_len as usize];
    read_exact_or_corrupt(reader, &mut value, offset)?;

    Ok(Record { key, value })
}

fn read_exact_or_corrupt<R: Read>(reader: &mut R, buf: &mut [u8], offset: u64) -> Result<()> {
    reader.read_exact(buf).map_err(|e| match e.kind() {
        std::io::ErrorKind::UnexpectedEof => {
            FlatError::Corruption(format!("short read in record at offset {}", offset))
        }
        _ => FlatError::Io(e),
    })
}

// =============================================================================
// Segment
// =============================================================================

/// The current segment of a store
pub enum Segment {
    /// No segment file has been written yet
    Empty,

    /// Backed by an open `table` file
    Persisted(SegmentReader),
}

impl Segment {
    /// Open the segment at `path`, or `Empty` if there is no such file
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Segment::Empty);
        }
        Ok(Segment::Persisted(SegmentReader::open(path)?))
    }

    /// Fetch the record starting at `offset`
    ///
    /// On `Empty` this is always an error: the matching index is empty, so
    /// no caller should ever have an offset to ask for.
    pub fn fetch_offset(&self, offset: u64) -> Result<Record> {
        match self {
            Segment::Empty => Err(FlatError::EmptySegment),
            Segment::Persisted(reader) => reader.fetch_offset(offset),
        }
    }

    /// Scan every record from offset 0 to end of file
    pub fn iter(&self) -> Result<SegmentIterator<'_>> {
        match self {
            Segment::Empty => Ok(SegmentIterator::empty()),
            Segment::Persisted(reader) => reader.iter(),
        }
    }

    /// Size of the segment file in bytes (0 for `Empty`)
    pub fn len_bytes(&self) -> u64 {
        match self {
            Segment::Empty => 0,
            Segment::Persisted(reader) => reader.len_bytes(),
        }
    }

    /// True for the `Empty` variant
    pub fn is_empty(&self) -> bool {
        matches!(self, Segment::Empty)
    }
}
