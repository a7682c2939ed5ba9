//! Segment Index
//!
//! In-memory key → offset map for the current segment, persisted as a flat
//! list of NUL-terminated fields:
//!
//! ```text
//! key\0offset\0key\0offset\0 ...
//! ```
//!
//! Offsets are decimal text. Keys may not contain NUL (there is no escape),
//! which the store enforces on every write.

use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::Path;

use crate::error::{FlatError, Result};

use super::{temp_file_in, Segment, INDEX_FILENAME};

const DELIMITER: u8 = 0;

/// Append one `key\0offset\0` entry to `w`
pub(crate) fn write_entry<W: Write>(w: &mut W, key: &[u8], offset: u64) -> io::Result<()> {
    w.write_all(key)?;
    w.write_all(&[DELIMITER])?;
    w.write_all(offset.to_string().as_bytes())?;
    w.write_all(&[DELIMITER])
}

/// Key → segment offset map
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Index {
    offsets: HashMap<Vec<u8>, u64>,
}

impl Index {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the persisted layout
    pub fn from_persisted(bytes: &[u8]) -> Result<Self> {
        let mut index = Index::new();
        if bytes.is_empty() {
            return Ok(index);
        }

        let body = bytes.strip_suffix(&[DELIMITER]).ok_or_else(|| {
            FlatError::Corruption("index does not end with a field delimiter".to_string())
        })?;

        let fields: Vec<&[u8]> = body.split(|b| *b == DELIMITER).collect();
        if fields.len() % 2 != 0 {
            return Err(FlatError::Corruption(format!(
                "index has an odd number of fields ({})",
                fields.len()
            )));
        }

        for pair in fields.chunks_exact(2) {
            let offset = std::str::from_utf8(pair[1])
                .ok()
                .and_then(|text| text.parse::<u64>().ok())
                .ok_or_else(|| {
                    FlatError::Corruption(format!(
                        "index offset {:?} is not a decimal number",
                        String::from_utf8_lossy(pair[1])
                    ))
                })?;
            index.insert_unique(pair[0].to_vec(), offset)?;
        }

        Ok(index)
    }

    /// Serialize in segment order (ascending offset)
    pub fn to_persisted(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        for (key, offset) in self.iter() {
            buf.extend_from_slice(key);
            buf.push(DELIMITER);
            buf.extend_from_slice(offset.to_string().as_bytes());
            buf.push(DELIMITER);
        }
        buf
    }

    /// Load the index file at `path`, or an empty index if there is none
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Index::new());
        }
        Self::from_persisted(&fs::read(path)?)
    }

    /// Derive the index from a full scan of `segment`
    pub fn rebuild(segment: &Segment) -> Result<Self> {
        let mut index = Index::new();
        for item in segment.iter()? {
            let (offset, record) = item?;
            index.insert_unique(record.key, offset)?;
        }
        Ok(index)
    }

    /// Write this index over `dir/index` via a temporary file and rename
    pub fn persist_to(&self, dir: &Path, sync: bool) -> Result<()> {
        let mut tmp = temp_file_in(dir)?;
        tmp.write_all(&self.to_persisted())?;
        if sync {
            tmp.as_file().sync_all()?;
        }
        tmp.persist(dir.join(INDEX_FILENAME))?;
        Ok(())
    }

    /// Offset of `key`'s record
    pub fn offset(&self, key: &[u8]) -> Result<u64> {
        self.offsets.get(key).copied().ok_or(FlatError::KeyNotFound)
    }

    pub fn contains(&self, key: &[u8]) -> bool {
        self.offsets.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Entries in segment order
    pub fn iter(&self) -> impl Iterator<Item = (&[u8], u64)> {
        let mut entries: Vec<(&[u8], u64)> = self
            .offsets
            .iter()
            .map(|(key, offset)| (key.as_slice(), *offset))
            .collect();
        entries.sort_by_key(|(_, offset)| *offset);
        entries.into_iter()
    }

    fn insert_unique(&mut self, key: Vec<u8>, offset: u64) -> Result<()> {
        if let Some(previous) = self.offsets.insert(key, offset) {
            return Err(FlatError::Corruption(format!(
                "key indexed twice (offsets {} and {})",
                previous, offset
            )));
        }
        Ok(())
    }
}
