//! Tests for CubeStore with the indexed layout
//!
//! These tests verify:
//! - Slots are independent (no truncation or shifting)
//! - Delete clears exactly one slot
//! - Header validation on reopen
//! - Compaction reclaims dead records and keeps live ones

use std::fs;
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use cubestore::config::{Config, Layout};
use cubestore::layout::{HEADER_SIZE, SLOT_ENTRY_SIZE};
use cubestore::{Coord, CubeError, CubeStore, Document, Value};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn at(x: i64, y: i64, z: i64) -> Coord {
    Coord::new(x, y, z)
}

fn indexed_config(path: &Path, dimension: u32) -> Config {
    Config::builder()
        .path(path)
        .dimension(dimension)
        .layout(Layout::Indexed)
        .build()
}

fn setup_temp_store(dimension: u32) -> (TempDir, PathBuf, CubeStore) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("cube.idx");
    let store = CubeStore::open(indexed_config(&path, dimension)).unwrap();
    (temp_dir, path, store)
}

fn named(name: &str) -> Document {
    Document::from([("name".to_string(), Value::from(name))])
}

/// A document much larger than any strided slot
fn bulky(tag: i64) -> Document {
    let mut doc = Document::new();
    for i in 0..50 {
        doc.insert(format!("field_{:02}", i), Value::from(tag * 100 + i));
    }
    doc
}

// =============================================================================
// Open Tests
// =============================================================================

#[test]
fn test_open_initializes_slot_table() {
    let (_temp, _path, store) = setup_temp_store(3);

    assert_eq!(store.file_len().unwrap(), HEADER_SIZE + 27 * SLOT_ENTRY_SIZE);
}

#[test]
fn test_open_rejects_dimension_mismatch() {
    let (_temp, path, store) = setup_temp_store(3);
    store.close().unwrap();

    let result = CubeStore::open(indexed_config(&path, 4));

    assert!(matches!(result, Err(CubeError::Config(_))));
}

#[test]
fn test_open_rejects_foreign_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("cube.bin");

    {
        let mut strided = CubeStore::open_path(&path, 3).unwrap();
        strided.put(at(0, 0, 0), &named("John")).unwrap();
    }

    let result = CubeStore::open(indexed_config(&path, 3));

    assert!(matches!(result, Err(CubeError::Config(_))));
}

#[test]
fn test_open_rejects_truncated_table() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("cube.idx");

    CubeStore::open(indexed_config(&path, 3))
        .unwrap()
        .close()
        .unwrap();

    let bytes = fs::read(&path).unwrap();
    fs::write(&path, &bytes[..100]).unwrap();

    let result = CubeStore::open(indexed_config(&path, 3));

    assert!(matches!(result, Err(CubeError::Config(_))));
}

// =============================================================================
// Basic Operations Tests
// =============================================================================

#[test]
fn test_put_get() {
    let (_temp, _path, mut store) = setup_temp_store(3);

    store.put(at(1, 2, 0), &named("Jane")).unwrap();

    assert_eq!(store.get(at(1, 2, 0)).unwrap(), named("Jane"));
}

#[test]
fn test_get_never_written() {
    let (_temp, _path, mut store) = setup_temp_store(3);

    assert!(matches!(store.get(at(2, 2, 2)), Err(CubeError::NotFound { .. })));
}

#[test]
fn test_out_of_bounds() {
    let (_temp, _path, mut store) = setup_temp_store(2);

    assert!(matches!(store.put(at(2, 0, 0), &named("x")), Err(CubeError::OutOfBounds { .. })));
    assert!(matches!(store.get(at(0, -1, 0)), Err(CubeError::OutOfBounds { .. })));
    assert!(matches!(store.delete(at(0, 0, 9)), Err(CubeError::OutOfBounds { .. })));
}

#[test]
fn test_put_lower_slot_keeps_higher_slot() {
    let (_temp, _path, mut store) = setup_temp_store(3);

    store.put(at(1, 1, 1), &named("Jane")).unwrap();
    store.put(at(0, 0, 0), &named("John")).unwrap();

    assert_eq!(store.get(at(0, 0, 0)).unwrap(), named("John"));
    assert_eq!(store.get(at(1, 1, 1)).unwrap(), named("Jane"));
}

#[test]
fn test_large_documents_do_not_collide() {
    let (_temp, _path, mut store) = setup_temp_store(2);

    for (i, coord) in Coord::iter_cube(2).enumerate() {
        store.put(coord, &bulky(i as i64)).unwrap();
    }

    for (i, coord) in Coord::iter_cube(2).enumerate() {
        assert_eq!(store.get(coord).unwrap(), bulky(i as i64));
    }
}

#[test]
fn test_overwrite() {
    let (_temp, _path, mut store) = setup_temp_store(3);

    store.put(at(2, 0, 1), &named("old")).unwrap();
    store.put(at(2, 0, 1), &named("new")).unwrap();

    assert_eq!(store.get(at(2, 0, 1)).unwrap(), named("new"));
}

// =============================================================================
// Delete Tests
// =============================================================================

#[test]
fn test_delete_clears_only_target() {
    let (_temp, _path, mut store) = setup_temp_store(3);

    store.put(at(0, 0, 0), &named("John")).unwrap();
    store.put(at(1, 1, 1), &named("Jane")).unwrap();
    store.put(at(2, 2, 2), &named("Bob")).unwrap();

    let moved = store.delete(at(1, 1, 1)).unwrap();

    assert_eq!(moved, 0);
    assert_eq!(store.get(at(0, 0, 0)).unwrap(), named("John"));
    assert!(matches!(store.get(at(1, 1, 1)), Err(CubeError::NotFound { .. })));
    assert_eq!(store.get(at(2, 2, 2)).unwrap(), named("Bob"));

    assert_eq!(
        store.scan().unwrap(),
        vec![(at(0, 0, 0), named("John")), (at(2, 2, 2), named("Bob"))]
    );
}

#[test]
fn test_delete_twice_is_not_found() {
    let (_temp, _path, mut store) = setup_temp_store(3);

    store.put(at(1, 0, 0), &named("once")).unwrap();
    store.delete(at(1, 0, 0)).unwrap();

    assert!(matches!(store.delete(at(1, 0, 0)), Err(CubeError::NotFound { .. })));
}

#[test]
fn test_put_after_delete() {
    let (_temp, _path, mut store) = setup_temp_store(3);

    store.put(at(1, 0, 0), &named("first")).unwrap();
    store.delete(at(1, 0, 0)).unwrap();
    store.put(at(1, 0, 0), &named("second")).unwrap();

    assert_eq!(store.get(at(1, 0, 0)).unwrap(), named("second"));
}

// =============================================================================
// Persistence Tests
// =============================================================================

#[test]
fn test_reopen_preserves_documents() {
    let (_temp, path, mut store) = setup_temp_store(3);

    store.put(at(0, 0, 0), &named("John")).unwrap();
    store.put(at(2, 2, 2), &bulky(7)).unwrap();
    store.delete(at(0, 0, 0)).unwrap();
    store.close().unwrap();

    let mut store = CubeStore::open(indexed_config(&path, 3)).unwrap();

    assert!(matches!(store.get(at(0, 0, 0)), Err(CubeError::NotFound { .. })));
    assert_eq!(store.get(at(2, 2, 2)).unwrap(), bulky(7));
}

// =============================================================================
// Compaction Tests
// =============================================================================

#[test]
fn test_compact_reclaims_space() {
    let (_temp, _path, mut store) = setup_temp_store(3);

    store.put(at(0, 0, 0), &bulky(1)).unwrap();
    store.put(at(1, 1, 1), &bulky(2)).unwrap();
    store.put(at(1, 1, 1), &bulky(3)).unwrap();
    store.put(at(2, 2, 2), &bulky(4)).unwrap();
    store.delete(at(0, 0, 0)).unwrap();

    let before = store.file_len().unwrap();
    store.compact().unwrap();
    let after = store.file_len().unwrap();

    assert!(after < before, "expected {} < {}", after, before);
    assert!(matches!(store.get(at(0, 0, 0)), Err(CubeError::NotFound { .. })));
    assert_eq!(store.get(at(1, 1, 1)).unwrap(), bulky(3));
    assert_eq!(store.get(at(2, 2, 2)).unwrap(), bulky(4));
}

#[test]
fn test_compact_then_write_and_reopen() {
    let (_temp, path, mut store) = setup_temp_store(2);

    store.put(at(0, 0, 0), &named("a")).unwrap();
    store.put(at(1, 0, 0), &named("b")).unwrap();
    store.delete(at(0, 0, 0)).unwrap();
    store.compact().unwrap();

    store.put(at(0, 1, 1), &named("c")).unwrap();
    store.close().unwrap();

    assert!(!path.with_extension("idx.compact").exists());

    let mut store = CubeStore::open(indexed_config(&path, 2)).unwrap();
    assert_eq!(
        store.scan().unwrap(),
        vec![(at(1, 0, 0), named("b")), (at(0, 1, 1), named("c"))]
    );
}

#[test]
fn test_compact_empty_store() {
    let (_temp, _path, mut store) = setup_temp_store(2);

    store.compact().unwrap();

    assert_eq!(store.file_len().unwrap(), HEADER_SIZE + 8 * SLOT_ENTRY_SIZE);
    assert!(store.scan().unwrap().is_empty());
}

#[test]
fn test_failed_compact_cleans_up_and_keeps_store_usable() {
    let (_temp, path, mut store) = setup_temp_store(2);

    store.put(at(0, 0, 0), &named("a")).unwrap();
    store.put(at(1, 1, 1), &named("b")).unwrap();
    let len = store.file_len().unwrap();

    // Point (0, 0, 0) far past the end of the data region
    {
        let mut file = fs::OpenOptions::new().write(true).open(&path).unwrap();
        let mut entry = Vec::new();
        entry.extend_from_slice(&(1u64 << 40).to_le_bytes());
        entry.extend_from_slice(&100u32.to_le_bytes());
        file.seek(SeekFrom::Start(HEADER_SIZE)).unwrap();
        file.write_all(&entry).unwrap();
    }

    let result = store.compact();

    assert!(matches!(result, Err(CubeError::Io(_))));
    assert!(!path.with_extension("idx.compact").exists());
    assert_eq!(store.file_len().unwrap(), len);
    assert_eq!(store.get(at(1, 1, 1)).unwrap(), named("b"));

    store.put(at(0, 1, 0), &named("c")).unwrap();
    assert_eq!(store.get(at(0, 1, 0)).unwrap(), named("c"));
}

// =============================================================================
// Address Space Tests
// =============================================================================

#[test]
fn test_open_rejects_dimension_past_address_space() {
    let temp_dir = TempDir::new().unwrap();

    for dimension in [2_000_000, 5_000_000] {
        let path = temp_dir.path().join(format!("cube_{}.idx", dimension));

        let result = CubeStore::open(indexed_config(&path, dimension));

        assert!(matches!(result, Err(CubeError::Config(_))), "dimension {}", dimension);
        assert!(!path.exists());
    }
}
