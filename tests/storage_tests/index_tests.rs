//! Tests for the segment index
//!
//! These tests verify:
//! - Parsing and serializing the NUL-delimited layout
//! - Lookups (`offset`, `contains`)
//! - Malformed index detection
//! - Rebuilding from a segment scan and atomic persistence

use std::fs;

use flatkv::storage::{Index, Segment, SegmentBuilder, INDEX_FILENAME, TABLE_FILENAME};
use flatkv::FlatError;
use tempfile::TempDir;

// =============================================================================
// Parse Tests
// =============================================================================

#[test]
fn test_from_persisted_empty() {
    let index = Index::from_persisted(b"").unwrap();

    assert!(index.is_empty());
    assert_eq!(index.len(), 0);
}

#[test]
fn test_from_persisted_pairs() {
    let index = Index::from_persisted(b"foo\x000\x00bar\x0014\x00").unwrap();

    assert_eq!(index.len(), 2);
    assert_eq!(index.offset(b"foo").unwrap(), 0);
    assert_eq!(index.offset(b"bar").unwrap(), 14);
    assert!(index.contains(b"foo"));
    assert!(!index.contains(b"baz"));
}

#[test]
fn test_from_persisted_empty_key() {
    let index = Index::from_persisted(b"\x000\x00").unwrap();

    assert_eq!(index.offset(b"").unwrap(), 0);
}

#[test]
fn test_offset_missing_key() {
    let index = Index::from_persisted(b"foo\x000\x00").unwrap();

    assert!(matches!(index.offset(b"nope"), Err(FlatError::KeyNotFound)));
}

#[test]
fn test_from_persisted_rejects_odd_field_count() {
    let result = Index::from_persisted(b"foo\x000\x00bar\x00");

    assert!(matches!(result, Err(FlatError::Corruption(_))));
}

#[test]
fn test_from_persisted_rejects_non_numeric_offset() {
    let result = Index::from_persisted(b"foo\x00twelve\x00");

    assert!(matches!(result, Err(FlatError::Corruption(_))));
}

#[test]
fn test_from_persisted_rejects_missing_terminator() {
    let result = Index::from_persisted(b"foo\x000");

    assert!(matches!(result, Err(FlatError::Corruption(_))));
}

#[test]
fn test_from_persisted_rejects_duplicate_key() {
    let result = Index::from_persisted(b"foo\x000\x00foo\x0011\x00");

    assert!(matches!(result, Err(FlatError::Corruption(_))));
}

// =============================================================================
// Serialize Tests
// =============================================================================

#[test]
fn test_to_persisted_is_in_offset_order() {
    // Parsed out of order, written back in segment order
    let index = Index::from_persisted(b"late\x0040\x00early\x000\x00middle\x0017\x00").unwrap();

    assert_eq!(
        index.to_persisted(),
        b"early\x000\x00middle\x0017\x00late\x0040\x00".to_vec()
    );

    let keys: Vec<&[u8]> = index.iter().map(|(key, _)| key).collect();
    assert_eq!(keys, vec![&b"early"[..], &b"middle"[..], &b"late"[..]]);
}

#[test]
fn test_to_persisted_empty() {
    assert!(Index::new().to_persisted().is_empty());
}

// =============================================================================
// Load / Rebuild / Persist Tests
// =============================================================================

#[test]
fn test_load_missing_file_is_empty() {
    let temp = TempDir::new().unwrap();

    let index = Index::load(&temp.path().join(INDEX_FILENAME)).unwrap();

    assert!(index.is_empty());
}

#[test]
fn test_builder_index_matches_rebuild() {
    let temp = TempDir::new().unwrap();

    let mut builder = SegmentBuilder::new_in(temp.path()).unwrap();
    builder.add(b"one", b"1").unwrap();
    builder.add(b"two", b"22").unwrap();
    builder.add(b"three", b"333").unwrap();
    let (segment_file, index_file) = builder.finish(false).unwrap();

    segment_file.persist(temp.path().join(TABLE_FILENAME)).unwrap();
    index_file.persist(temp.path().join(INDEX_FILENAME)).unwrap();

    let loaded = Index::load(&temp.path().join(INDEX_FILENAME)).unwrap();
    let segment = Segment::open(&temp.path().join(TABLE_FILENAME)).unwrap();
    let rebuilt = Index::rebuild(&segment).unwrap();

    assert_eq!(loaded, rebuilt);
    assert_eq!(loaded.offset(b"one").unwrap(), 0);
    assert_eq!(loaded.offset(b"two").unwrap(), 12);
    assert_eq!(loaded.offset(b"three").unwrap(), 25);
}

#[test]
fn test_rebuild_empty_segment() {
    let index = Index::rebuild(&Segment::Empty).unwrap();

    assert!(index.is_empty());
}

#[test]
fn test_persist_to_replaces_index_file() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join(INDEX_FILENAME);
    fs::write(&path, b"stale\x0099\x00").unwrap();

    let index = Index::from_persisted(b"fresh\x000\x00").unwrap();
    index.persist_to(temp.path(), false).unwrap();

    assert_eq!(fs::read(&path).unwrap(), b"fresh\x000\x00".to_vec());

    // Only the index is left behind, no temporary files
    let names: Vec<_> = fs::read_dir(temp.path())
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert_eq!(names, vec![std::ffi::OsString::from(INDEX_FILENAME)]);
}
