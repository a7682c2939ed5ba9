//! Disk Table
//!
//! The segment and index that are live on disk, loaded and swapped as one
//! unit.

use std::path::Path;

use crate::error::{FlatError, Result};

use super::{remove_stale_temp_files, Index, Segment, INDEX_FILENAME, TABLE_FILENAME};

/// The current segment plus the index describing it
pub struct DiskTable {
    segment: Segment,
    index: Index,
}

impl DiskTable {
    /// Load `table` and `index` from `dir` as they are
    ///
    /// Missing files give the `Empty` segment and an empty index.
    pub fn open(dir: &Path) -> Result<Self> {
        let segment = Segment::open(&dir.join(TABLE_FILENAME))?;
        let index = Index::load(&dir.join(INDEX_FILENAME))?;

        if segment.is_empty() && !index.is_empty() {
            return Err(FlatError::Corruption(format!(
                "index lists {} keys but there is no segment file",
                index.len()
            )));
        }

        Ok(Self { segment, index })
    }

    /// Load with crash recovery
    ///
    /// 1. Remove temporary files left by an interrupted flush
    /// 2. Open the segment
    /// 3. With `verify`, rebuild the index from a segment scan and rewrite
    ///    it if the stored one is missing, unreadable or different
    pub fn recover(dir: &Path, verify: bool, sync: bool) -> Result<Self> {
        let removed = remove_stale_temp_files(dir)?;
        if removed > 0 {
            tracing::warn!(removed, "removed temporary files from an interrupted flush");
        }

        if !verify {
            return Self::open(dir);
        }

        let segment = Segment::open(&dir.join(TABLE_FILENAME))?;
        let index_path = dir.join(INDEX_FILENAME);

        let stored = match Index::load(&index_path) {
            Ok(index) => Some(index),
            Err(FlatError::Corruption(reason)) => {
                tracing::warn!(%reason, "stored index is unreadable");
                None
            }
            Err(e) => return Err(e),
        };

        if segment.is_empty() {
            return match stored {
                Some(index) if index.is_empty() => Ok(Self { segment, index }),
                Some(index) => Err(FlatError::Corruption(format!(
                    "index lists {} keys but there is no segment file",
                    index.len()
                ))),
                None => Err(FlatError::Corruption(
                    "unreadable index without a segment file".to_string(),
                )),
            };
        }

        let rebuilt = Index::rebuild(&segment)?;
        if stored.as_ref() != Some(&rebuilt) || !index_path.exists() {
            tracing::warn!(
                keys = rebuilt.len(),
                "index does not match segment, rewriting it from a segment scan"
            );
            rebuilt.persist_to(dir, sync)?;
        }

        Ok(Self {
            segment,
            index: rebuilt,
        })
    }

    /// Read `key` from disk
    ///
    /// An indexed key whose record is missing or belongs to another key is
    /// corruption, never "absent".
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        if !self.index.contains(key) {
            return Ok(None);
        }

        let offset = self.index.offset(key)?;
        let record = self.segment.fetch_offset(offset)?;

        if record.key != key {
            return Err(FlatError::Corruption(format!(
                "index points {:?} at offset {}, which holds {:?}",
                String::from_utf8_lossy(key),
                offset,
                String::from_utf8_lossy(&record.key)
            )));
        }

        Ok(Some(record.value))
    }

    pub fn segment(&self) -> &Segment {
        &self.segment
    }

    pub fn index(&self) -> &Index {
        &self.index
    }
}
