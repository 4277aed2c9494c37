//! Tests for the engine
//!
//! These tests verify:
//! - put/get/remove/sync lifecycle and status codes
//! - Persistence across reopen and crash recovery
//! - Range visits and their boundary semantics
//! - Compaction behavior and idempotence

use std::fs;

use emberkv::{Config, EmberError, Engine, SyncPolicy};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_engine() -> (TempDir, Engine) {
    let temp_dir = TempDir::new().unwrap();
    let engine = Engine::open_path(temp_dir.path()).unwrap();
    (temp_dir, engine)
}

fn collect_visit(engine: &Engine, lower: &[u8], upper: &[u8]) -> Vec<(Vec<u8>, Vec<u8>)> {
    let mut out = Vec::new();
    engine
        .visit(lower, upper, |k, v| out.push((k.to_vec(), v.to_vec())))
        .unwrap();
    out
}

// =============================================================================
// Basic Operations Tests
// =============================================================================

#[test]
fn test_engine_open_creates_directories() {
    let temp_dir = TempDir::new().unwrap();
    let data_dir = temp_dir.path().join("mydb");

    let engine = Engine::open_path(&data_dir).unwrap();
    engine.put(b"k", b"v").unwrap();
    engine.sync().unwrap();

    assert!(data_dir.exists());
    assert!(data_dir.join("log").exists());
}

#[test]
fn test_engine_put_get() {
    let (_temp, engine) = setup_temp_engine();

    engine.put(b"hello", b"world").unwrap();
    assert_eq!(engine.get(b"hello").unwrap(), Some(b"world".to_vec()));
}

#[test]
fn test_engine_get_nonexistent_key() {
    let (_temp, engine) = setup_temp_engine();
    assert_eq!(engine.get(b"nonexistent").unwrap(), None);
}

#[test]
fn test_engine_last_write_wins() {
    let (_temp, engine) = setup_temp_engine();

    engine.put(b"k", b"v1").unwrap();
    engine.put(b"k", b"v2").unwrap();
    engine.put(b"k", b"v3").unwrap();

    assert_eq!(engine.get(b"k").unwrap(), Some(b"v3".to_vec()));
    assert_eq!(engine.len(), 1);
}

#[test]
fn test_engine_remove() {
    let (_temp, engine) = setup_temp_engine();

    engine.put(b"k", b"v").unwrap();
    engine.remove(b"k").unwrap();

    assert_eq!(engine.get(b"k").unwrap(), None);
    assert!(engine.is_empty());
}

#[test]
fn test_engine_remove_missing_key_is_not_found() {
    let (_temp, engine) = setup_temp_engine();

    let err = engine.remove(b"never-written").unwrap_err();
    assert!(matches!(err, EmberError::KeyNotFound));
    assert!(err.is_not_found());
}

#[test]
fn test_engine_remove_missing_key_appends_no_tombstone() {
    let (_temp, engine) = setup_temp_engine();
    engine.put(b"k", b"v").unwrap();
    engine.sync().unwrap();
    let len_before = fs::metadata(engine.log_path()).unwrap().len();

    let _ = engine.remove(b"other");
    engine.sync().unwrap();
    assert_eq!(fs::metadata(engine.log_path()).unwrap().len(), len_before);
}

#[test]
fn test_engine_empty_key_and_empty_value() {
    let (_temp, engine) = setup_temp_engine();

    engine.put(b"", b"empty-key").unwrap();
    engine.put(b"empty-value", b"").unwrap();

    assert_eq!(engine.get(b"").unwrap(), Some(b"empty-key".to_vec()));
    assert_eq!(engine.get(b"empty-value").unwrap(), Some(b"".to_vec()));
}

#[test]
fn test_engine_rejects_oversized_inputs() {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder()
        .data_dir(temp_dir.path())
        .max_key_size(16)
        .max_value_size(32)
        .build();
    let engine = Engine::open(config).unwrap();

    let err = engine.put(&[b'k'; 17], b"v").unwrap_err();
    assert!(matches!(err, EmberError::KeyTooLarge(17, 16)));

    let err = engine.put(b"k", &[b'v'; 33]).unwrap_err();
    assert!(matches!(err, EmberError::ValueTooLarge(33, 32)));

    // a rejected put must leave no trace
    assert_eq!(engine.len(), 0);
    engine.put(&[b'k'; 16], &[b'v'; 32]).unwrap();
    assert_eq!(engine.len(), 1);
}

#[test]
fn test_engine_sync_every_put_policy() {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder()
        .data_dir(temp_dir.path())
        .sync_policy(SyncPolicy::EveryPut)
        .build();
    let engine = Engine::open(config).unwrap();

    engine.put(b"k", b"v").unwrap();
    // the record is on disk without an explicit sync
    let log_len = fs::metadata(engine.log_path()).unwrap().len();
    assert_eq!(log_len, 16 + 1 + 1);
}

// =============================================================================
// Persistence and Recovery Tests
// =============================================================================

#[test]
fn test_engine_reopen_restores_state() {
    let temp_dir = TempDir::new().unwrap();
    {
        let engine = Engine::open_path(temp_dir.path()).unwrap();
        engine.put(b"a", b"1").unwrap();
        engine.put(b"b", b"2").unwrap();
        engine.put(b"a", b"1-new").unwrap();
        engine.remove(b"b").unwrap();
        engine.put(b"c", b"3").unwrap();
        engine.sync().unwrap();
    }

    let engine = Engine::open_path(temp_dir.path()).unwrap();
    assert_eq!(engine.get(b"a").unwrap(), Some(b"1-new".to_vec()));
    assert_eq!(engine.get(b"b").unwrap(), None);
    assert_eq!(engine.get(b"c").unwrap(), Some(b"3".to_vec()));
    assert_eq!(engine.len(), 2);
}

#[test]
fn test_engine_recovery_ignores_torn_tail() {
    let temp_dir = TempDir::new().unwrap();
    let log_path;
    {
        let engine = Engine::open_path(temp_dir.path()).unwrap();
        engine.put(b"a", b"1").unwrap();
        engine.put(b"b", b"2").unwrap();
        engine.sync().unwrap();
        log_path = engine.log_path().to_path_buf();
    }

    // crash mid-append: chop bytes off the last record
    let full_len = fs::metadata(&log_path).unwrap().len();
    let file = fs::OpenOptions::new().write(true).open(&log_path).unwrap();
    file.set_len(full_len - 3).unwrap();
    drop(file);

    let engine = Engine::open_path(temp_dir.path()).unwrap();
    assert_eq!(engine.get(b"a").unwrap(), Some(b"1".to_vec()));
    assert_eq!(engine.get(b"b").unwrap(), None);
    assert_eq!(engine.len(), 1);

    // appends resume at the valid prefix and survive another reopen
    engine.put(b"c", b"3").unwrap();
    engine.sync().unwrap();
    drop(engine);

    let engine = Engine::open_path(temp_dir.path()).unwrap();
    assert_eq!(engine.get(b"a").unwrap(), Some(b"1".to_vec()));
    assert_eq!(engine.get(b"c").unwrap(), Some(b"3".to_vec()));
}

#[test]
fn test_engine_reopen_of_empty_database() {
    let temp_dir = TempDir::new().unwrap();
    {
        let engine = Engine::open_path(temp_dir.path()).unwrap();
        engine.put(b"k", b"v").unwrap();
        engine.remove(b"k").unwrap();
        engine.sync().unwrap();
    }
    let engine = Engine::open_path(temp_dir.path()).unwrap();
    assert!(engine.is_empty());
    assert_eq!(engine.get(b"k").unwrap(), None);
}

// =============================================================================
// Visit Tests
// =============================================================================

#[test]
fn test_visit_full_range_in_order() {
    let (_temp, engine) = setup_temp_engine();
    for key in [b"m", b"c", b"x", b"a", b"t"] {
        engine.put(key, key).unwrap();
    }
    engine.remove(b"t").unwrap();

    let visited = collect_visit(&engine, b"", b"");
    let keys: Vec<&[u8]> = visited.iter().map(|(k, _)| k.as_slice()).collect();
    assert_eq!(keys, vec![b"a".as_slice(), b"c", b"m", b"x"]);
    for (k, v) in &visited {
        assert_eq!(k, v);
    }
}

#[test]
fn test_visit_single_key_range() {
    let (_temp, engine) = setup_temp_engine();
    for key in [b"l", b"m", b"n"] {
        engine.put(key, b"v").unwrap();
    }

    let visited = collect_visit(&engine, b"m", b"m");
    assert_eq!(visited.len(), 1);
    assert_eq!(visited[0].0, b"m".to_vec());

    engine.remove(b"m").unwrap();
    assert!(collect_visit(&engine, b"m", b"m").is_empty());
}

#[test]
fn test_visit_bounds_are_inclusive() {
    let (_temp, engine) = setup_temp_engine();
    for i in 0..10u32 {
        engine.put(format!("k{}", i).as_bytes(), b"v").unwrap();
    }

    let visited = collect_visit(&engine, b"k2", b"k5");
    let keys: Vec<Vec<u8>> = visited.into_iter().map(|(k, _)| k).collect();
    assert_eq!(
        keys,
        vec![b"k2".to_vec(), b"k3".to_vec(), b"k4".to_vec(), b"k5".to_vec()]
    );
}

#[test]
fn test_visit_lower_bound_between_keys() {
    let (_temp, engine) = setup_temp_engine();
    engine.put(b"a", b"1").unwrap();
    engine.put(b"c", b"3").unwrap();
    engine.put(b"e", b"5").unwrap();

    // "b" does not exist: the scan starts at its successor
    let visited = collect_visit(&engine, b"b", b"d");
    assert_eq!(visited, vec![(b"c".to_vec(), b"3".to_vec())]);
}

#[test]
fn test_visit_empty_engine() {
    let (_temp, engine) = setup_temp_engine();
    assert!(collect_visit(&engine, b"", b"").is_empty());
}

#[test]
fn test_visit_many_keys_crosses_leaves() {
    let (_temp, engine) = setup_temp_engine();
    // enough keys for a tree several levels deep
    for i in 0..500u32 {
        engine
            .put(format!("key{:04}", i).as_bytes(), format!("val{}", i).as_bytes())
            .unwrap();
    }
    let visited = collect_visit(&engine, b"", b"");
    assert_eq!(visited.len(), 500);
    for (i, (k, v)) in visited.iter().enumerate() {
        assert_eq!(k, format!("key{:04}", i).as_bytes());
        assert_eq!(v, format!("val{}", i).as_bytes());
    }
}

// =============================================================================
// Compaction Tests
// =============================================================================

#[test]
fn test_gc_shrinks_log_and_preserves_content() {
    let (_temp, engine) = setup_temp_engine();

    for i in 0..100u32 {
        engine.put(format!("key{:03}", i).as_bytes(), b"first").unwrap();
    }
    for i in 0..100u32 {
        engine.put(format!("key{:03}", i).as_bytes(), b"second").unwrap();
    }
    for i in 50..100u32 {
        engine.remove(format!("key{:03}", i).as_bytes()).unwrap();
    }
    engine.sync().unwrap();
    let before = fs::metadata(engine.log_path()).unwrap().len();

    engine.garbage_collect().unwrap();
    engine.wait_for_gc().unwrap();

    let after = fs::metadata(engine.log_path()).unwrap().len();
    assert!(after < before, "log did not shrink: {} -> {}", after, before);

    assert_eq!(engine.len(), 50);
    for i in 0..50u32 {
        assert_eq!(
            engine.get(format!("key{:03}", i).as_bytes()).unwrap(),
            Some(b"second".to_vec())
        );
    }
    for i in 50..100u32 {
        assert_eq!(engine.get(format!("key{:03}", i).as_bytes()).unwrap(), None);
    }
}

#[test]
fn test_gc_is_idempotent() {
    let (_temp, engine) = setup_temp_engine();
    for i in 0..50u32 {
        engine.put(format!("k{:02}", i).as_bytes(), b"v1").unwrap();
        engine.put(format!("k{:02}", i).as_bytes(), b"v2").unwrap();
    }

    engine.garbage_collect().unwrap();
    engine.wait_for_gc().unwrap();
    let first = fs::read(engine.log_path()).unwrap();

    engine.garbage_collect().unwrap();
    engine.wait_for_gc().unwrap();
    let second = fs::read(engine.log_path()).unwrap();

    // no intervening writes: the compacted log is already fully dense
    assert_eq!(first, second);
}

#[test]
fn test_gc_orders_log_by_key() {
    let (_temp, engine) = setup_temp_engine();
    for key in [b"z", b"a", b"m", b"b"] {
        engine.put(key, key).unwrap();
    }
    engine.garbage_collect().unwrap();
    engine.wait_for_gc().unwrap();

    // after compaction the log holds exactly the live records, ascending
    let mut index = emberkv::index::BPlusTree::new();
    let stats = emberkv::log::replay(engine.log_path(), &mut index).unwrap();
    assert_eq!(stats.records_replayed, 4);
    let keys: Vec<Vec<u8>> = index.iter().map(|(k, _)| k.to_vec()).collect();
    assert_eq!(keys, vec![b"a".to_vec(), b"b".to_vec(), b"m".to_vec(), b"z".to_vec()]);
    // a freshly compacted log is laid out in scan order: offsets ascend
    let offsets: Vec<u64> = index.iter().map(|(_, o)| o).collect();
    let mut sorted = offsets.clone();
    sorted.sort_unstable();
    assert_eq!(offsets, sorted);
}

#[test]
fn test_reopen_after_gc() {
    let temp_dir = TempDir::new().unwrap();
    {
        let engine = Engine::open_path(temp_dir.path()).unwrap();
        for i in 0..30u32 {
            engine.put(format!("k{:02}", i).as_bytes(), b"old").unwrap();
            engine.put(format!("k{:02}", i).as_bytes(), b"new").unwrap();
        }
        engine.remove(b"k00").unwrap();
        engine.garbage_collect().unwrap();
        engine.wait_for_gc().unwrap();
        engine.put(b"post-gc", b"appended").unwrap();
        engine.sync().unwrap();
    }

    let engine = Engine::open_path(temp_dir.path()).unwrap();
    assert_eq!(engine.len(), 30);
    assert_eq!(engine.get(b"k00").unwrap(), None);
    assert_eq!(engine.get(b"k01").unwrap(), Some(b"new".to_vec()));
    assert_eq!(engine.get(b"post-gc").unwrap(), Some(b"appended".to_vec()));
}

#[test]
fn test_gc_on_empty_engine() {
    let (_temp, engine) = setup_temp_engine();
    engine.garbage_collect().unwrap();
    engine.wait_for_gc().unwrap();
    assert_eq!(fs::metadata(engine.log_path()).unwrap().len(), 0);
}
