//! Tests for Store
//!
//! These tests verify:
//! - Basic get/set/delete operations
//! - Argument validation
//! - Flush merging and reclaiming deletes
//! - Persistence across reopen
//! - Concurrent access patterns
//! - Accessors

use std::sync::Arc;
use std::thread;

use flatkv::config::Config;
use flatkv::store::Store;
use flatkv::FlatError;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_store() -> (TempDir, Store) {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder()
        .data_dir(temp_dir.path())
        .sync_on_flush(false)
        .build();
    let store = Store::open(config).unwrap();
    (temp_dir, store)
}

fn reopen(temp_dir: &TempDir) -> Store {
    Store::open_path(temp_dir.path()).unwrap()
}

// =============================================================================
// Basic Operations Tests
// =============================================================================

#[test]
fn test_store_open_creates_directory() {
    let temp_dir = TempDir::new().unwrap();
    let data_dir = temp_dir.path().join("mydb");

    let _store = Store::open_path(&data_dir).unwrap();

    assert!(data_dir.is_dir());
    // Nothing is written until the first flush
    assert!(!data_dir.join("table").exists());
    assert!(!data_dir.join("index").exists());
}

#[test]
fn test_store_open_rejects_bad_data_dir() {
    let temp_dir = TempDir::new().unwrap();
    let file = temp_dir.path().join("not-a-dir");
    std::fs::write(&file, b"").unwrap();

    let empty = Config::builder().data_dir("").build();
    assert!(matches!(Store::open(empty), Err(FlatError::Config(_))));
    assert!(matches!(Store::open_path(&file), Err(FlatError::Config(_))));
}

#[test]
fn test_store_set_get() {
    let (_temp, store) = setup_temp_store();

    store.set(b"key-1", b"value-1").unwrap();

    assert_eq!(store.get(b"key-1").unwrap(), Some(b"value-1".to_vec()));
}

#[test]
fn test_store_get_nonexistent_key() {
    let (_temp, store) = setup_temp_store();

    assert_eq!(store.get(b"key-1").unwrap(), None);
}

#[test]
fn test_store_set_overwrite() {
    let (_temp, store) = setup_temp_store();

    store.set(b"key-1", b"value-1").unwrap();
    assert_eq!(store.get(b"key-1").unwrap(), Some(b"value-1".to_vec()));

    store.set(b"key-1", b"value-2").unwrap();
    assert_eq!(store.get(b"key-1").unwrap(), Some(b"value-2".to_vec()));
}

#[test]
fn test_store_delete() {
    let (_temp, store) = setup_temp_store();

    store.set(b"foo", b"bar").unwrap();
    store.delete(b"foo").unwrap();

    assert_eq!(store.get(b"foo").unwrap(), None);
    // The buffered value is still there, masked by the tombstone
    assert_eq!(store.memtable_len(), 1);
    assert_eq!(store.tombstone_count(), 1);
}

#[test]
fn test_store_delete_nonexistent_key() {
    let (_temp, store) = setup_temp_store();

    store.delete(b"nonexistent").unwrap();
    assert_eq!(store.get(b"nonexistent").unwrap(), None);
}

#[test]
fn test_store_set_after_delete() {
    let (_temp, store) = setup_temp_store();

    store.set(b"key", b"v1").unwrap();
    store.delete(b"key").unwrap();
    store.set(b"key", b"v2").unwrap();

    assert_eq!(store.get(b"key").unwrap(), Some(b"v2".to_vec()));
    assert_eq!(store.tombstone_count(), 0);
}

// =============================================================================
// Validation Tests
// =============================================================================

#[test]
fn test_store_rejects_nul_in_key() {
    let (_temp, store) = setup_temp_store();

    assert!(matches!(
        store.set(b"bad\x00key", b"v"),
        Err(FlatError::InvalidArgument(_))
    ));
    assert!(matches!(
        store.get(b"bad\x00key"),
        Err(FlatError::InvalidArgument(_))
    ));
    assert!(matches!(
        store.delete(b"bad\x00key"),
        Err(FlatError::InvalidArgument(_))
    ));

    // Nothing was buffered
    assert_eq!(store.memtable_len(), 0);
    assert_eq!(store.tombstone_count(), 0);
}

#[test]
fn test_store_value_may_contain_nul() {
    let (temp, store) = setup_temp_store();

    store.set(b"key", b"\x00\x01\x00").unwrap();
    store.flush().unwrap();
    drop(store);

    let store = reopen(&temp);
    assert_eq!(store.get(b"key").unwrap(), Some(b"\x00\x01\x00".to_vec()));
}

// =============================================================================
// Flush Tests
// =============================================================================

#[test]
fn test_store_flush_preserves_values() {
    let (_temp, store) = setup_temp_store();

    store.set(b"foo", b"bar").unwrap();
    store.set(b"bar", b"baz").unwrap();
    store.flush().unwrap();

    assert_eq!(store.get(b"foo").unwrap(), Some(b"bar".to_vec()));
    assert_eq!(store.get(b"bar").unwrap(), Some(b"baz".to_vec()));
    assert_eq!(store.memtable_len(), 0);
    assert_eq!(store.indexed_len(), 2);
}

#[test]
fn test_store_flush_reclaims_deletes() {
    let (_temp, store) = setup_temp_store();

    store.set(b"foo", b"bar").unwrap();
    assert_eq!(store.get(b"foo").unwrap(), Some(b"bar".to_vec()));
    store.flush().unwrap();

    store.delete(b"foo").unwrap();
    assert_eq!(store.get(b"foo").unwrap(), None);

    store.flush().unwrap();
    assert_eq!(store.get(b"foo").unwrap(), None);
    assert_eq!(store.indexed_len(), 0);
    assert_eq!(store.tombstone_count(), 0);
}

#[test]
fn test_store_flush_stats() {
    let (_temp, store) = setup_temp_store();

    store.set(b"a", b"1").unwrap();
    store.set(b"b", b"2").unwrap();
    let stats = store.flush().unwrap();
    assert_eq!(stats.records_written, 2);
    assert_eq!(stats.bytes_written, store.segment_size());

    store.delete(b"a").unwrap();
    let stats = store.flush().unwrap();
    assert_eq!(stats.records_written, 1);
    assert_eq!(stats.records_dropped, 1);
}

#[test]
fn test_store_flush_empty_memtable_is_noop() {
    let (temp, store) = setup_temp_store();

    let stats = store.flush().unwrap();

    assert_eq!(stats.records_written, 0);
    assert!(!temp.path().join("table").exists());
}

#[test]
fn test_store_memtable_shadows_disk() {
    let (_temp, store) = setup_temp_store();

    store.set(b"key", b"disk").unwrap();
    store.flush().unwrap();
    store.set(b"key", b"memory").unwrap();

    assert_eq!(store.get(b"key").unwrap(), Some(b"memory".to_vec()));

    store.flush().unwrap();
    assert_eq!(store.get(b"key").unwrap(), Some(b"memory".to_vec()));
    assert_eq!(store.indexed_len(), 1);
}

#[test]
fn test_store_many_flush_cycles() {
    let (_temp, store) = setup_temp_store();

    for round in 0..10 {
        for i in 0..50 {
            let key = format!("key{}", i);
            let value = format!("round{}_value{}", round, i);
            store.set(key.as_bytes(), value.as_bytes()).unwrap();
        }
        // Delete a rotating slice each round
        for i in (round..50).step_by(10) {
            store.delete(format!("key{}", i).as_bytes()).unwrap();
        }
        store.flush().unwrap();
    }

    for i in 0..50 {
        let key = format!("key{}", i);
        let expected = if (9..50).step_by(10).any(|d| d == i) {
            None
        } else {
            Some(format!("round9_value{}", i).into_bytes())
        };
        assert_eq!(store.get(key.as_bytes()).unwrap(), expected, "key{}", i);
    }
}

// =============================================================================
// Persistence Tests
// =============================================================================

#[test]
fn test_store_persists_values_once_flushed() {
    let temp = TempDir::new().unwrap();

    let table = reopen(&temp);
    table.set(b"foo", b"bar").unwrap();
    table.set(b"bar", b"baz").unwrap();
    table.flush().unwrap();

    let table2 = reopen(&temp);
    assert_eq!(table2.get(b"foo").unwrap(), Some(b"bar".to_vec()));
    table2.set(b"baz", b"bonkers").unwrap();
    table2.flush().unwrap();

    let table3 = reopen(&temp);
    assert_eq!(table3.get(b"baz").unwrap(), Some(b"bonkers".to_vec()));
    assert_eq!(table3.get(b"foo").unwrap(), Some(b"bar".to_vec()));
}

#[test]
fn test_store_deletes_values_when_flushed() {
    let temp = TempDir::new().unwrap();

    let table = reopen(&temp);
    table.set(b"foo", b"bar").unwrap();
    table.flush().unwrap();

    let table2 = reopen(&temp);
    assert_eq!(table2.get(b"foo").unwrap(), Some(b"bar".to_vec()));
    table2.delete(b"foo").unwrap();
    table2.flush().unwrap();

    let table3 = reopen(&temp);
    assert_eq!(table3.get(b"foo").unwrap(), None);
}

#[test]
fn test_store_unflushed_writes_are_not_persisted() {
    let temp = TempDir::new().unwrap();

    {
        let store = reopen(&temp);
        store.set(b"durable", b"1").unwrap();
        store.flush().unwrap();
        store.set(b"volatile", b"2").unwrap();
    }

    let store = reopen(&temp);
    assert_eq!(store.get(b"durable").unwrap(), Some(b"1".to_vec()));
    assert_eq!(store.get(b"volatile").unwrap(), None);
}

#[test]
fn test_store_reopen_empty_directory() {
    let temp = TempDir::new().unwrap();

    for _ in 0..3 {
        let store = reopen(&temp);
        assert_eq!(store.get(b"anything").unwrap(), None);
        assert_eq!(store.indexed_len(), 0);
        assert_eq!(store.segment_size(), 0);
    }
}

// =============================================================================
// Concurrent Access Tests
// =============================================================================

#[test]
fn test_store_concurrent_reads_during_flush() {
    let (_temp, store) = setup_temp_store();
    let store = Arc::new(store);

    for i in 0..200 {
        store
            .set(format!("key{}", i).as_bytes(), format!("value{}", i).as_bytes())
            .unwrap();
    }
    store.flush().unwrap();

    let mut handles = vec![];
    for _ in 0..4 {
        let store = Arc::clone(&store);
        handles.push(thread::spawn(move || {
            for _ in 0..5 {
                for i in 0..200 {
                    let key = format!("key{}", i);
                    let expected = format!("value{}", i);
                    assert_eq!(store.get(key.as_bytes()).unwrap(), Some(expected.into_bytes()));
                }
            }
        }));
    }

    // Rewrite the segment repeatedly under the readers
    for i in 0..10 {
        store.set(format!("extra{}", i).as_bytes(), b"x").unwrap();
        store.flush().unwrap();
    }

    for handle in handles {
        handle.join().unwrap();
    }
}

#[test]
fn test_store_concurrent_writes() {
    let (_temp, store) = setup_temp_store();
    let store = Arc::new(store);

    let mut handles = vec![];
    for t in 0..4 {
        let store = Arc::clone(&store);
        handles.push(thread::spawn(move || {
            for i in 0..25 {
                let key = format!("thread{}_key{}", t, i);
                let value = format!("thread{}_value{}", t, i);
                store.set(key.as_bytes(), value.as_bytes()).unwrap();
            }
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }
    store.flush().unwrap();

    for t in 0..4 {
        for i in 0..25 {
            let key = format!("thread{}_key{}", t, i);
            let expected = format!("thread{}_value{}", t, i);
            assert_eq!(store.get(key.as_bytes()).unwrap(), Some(expected.into_bytes()));
        }
    }
    assert_eq!(store.indexed_len(), 100);
}

// =============================================================================
// Accessor Tests
// =============================================================================

#[test]
fn test_store_accessors() {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder()
        .data_dir(temp_dir.path())
        .sync_on_flush(false)
        .verify_on_open(false)
        .build();
    let store = Store::open(config).unwrap();

    assert_eq!(store.dir(), temp_dir.path());
    assert!(!store.config().sync_on_flush);
    assert!(!store.config().verify_on_open);
    assert_eq!(store.memtable_len(), 0);
    assert_eq!(store.tombstone_count(), 0);
    assert_eq!(store.indexed_len(), 0);
    assert_eq!(store.segment_size(), 0);
}

// =============================================================================
// Edge Cases
// =============================================================================

#[test]
fn test_store_empty_key_and_value() {
    let (temp, store) = setup_temp_store();

    store.set(b"", b"empty_key_value").unwrap();
    store.set(b"key", b"").unwrap();
    store.flush().unwrap();
    drop(store);

    let store = reopen(&temp);
    assert_eq!(store.get(b"").unwrap(), Some(b"empty_key_value".to_vec()));
    assert_eq!(store.get(b"key").unwrap(), Some(Vec::new()));
}

#[test]
fn test_store_large_value() {
    let (_temp, store) = setup_temp_store();

    let large_value = vec![0xAB; 100_000];
    store.set(b"large_key", &large_value).unwrap();
    store.flush().unwrap();

    assert_eq!(store.get(b"large_key").unwrap(), Some(large_value));
}

#[test]
fn test_store_binary_key() {
    let (_temp, store) = setup_temp_store();

    let key = b"\x01\x02\xFF\xFE";
    let value = b"\xFF\x00\xAB\xCD\x00";

    store.set(key, value).unwrap();
    store.flush().unwrap();
    assert_eq!(store.get(key).unwrap(), Some(value.to_vec()));
}
