//! Tests for log replay and crash recovery
//!
//! These tests verify:
//! - Reopening rebuilds the index from the log
//! - Logs written byte-by-byte in the documented format replay
//! - Torn tails under Strict (fail) and Truncate (trim and continue)
//! - Complete-but-invalid records fail regardless of policy

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use driftkv::config::{Config, TailPolicy};
use driftkv::engine::Engine;
use driftkv::record;
use driftkv::DriftError;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_log() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("replay.db");
    (temp_dir, path)
}

fn open_with_policy(path: &Path, policy: TailPolicy) -> driftkv::Result<Engine> {
    let config = Config::builder().path(path).tail_policy(policy).build();
    Engine::open_with_config(config)
}

/// Append raw bytes to the log (for crafting torn tails)
fn append_raw(path: &Path, bytes: &[u8]) {
    let mut file = OpenOptions::new().append(true).open(path).unwrap();
    file.write_all(bytes).unwrap();
    file.sync_all().unwrap();
}

fn write_pairs(path: &Path, pairs: &[(&str, &str)]) {
    let engine = Engine::open(path).unwrap();
    for (key, value) in pairs {
        engine.set(key.as_bytes(), value.as_bytes()).unwrap();
    }
    engine.close().unwrap();
}

// =============================================================================
// Reopen Tests
// =============================================================================

#[test]
fn test_reopen_empty_log() {
    let (_temp, path) = setup_temp_log();
    File::create(&path).unwrap();

    let engine = Engine::open(&path).unwrap();

    assert!(engine.is_empty());
    assert_eq!(engine.replay_stats().records, 0);
}

#[test]
fn test_reopen_restores_all_keys() {
    let (_temp, path) = setup_temp_log();
    {
        let engine = Engine::open(&path).unwrap();
        for i in 0..100 {
            engine
                .set(format!("key{}", i).as_bytes(), format!("value{}", i).as_bytes())
                .unwrap();
        }
        engine.close().unwrap();
    }

    let engine = Engine::open(&path).unwrap();

    assert_eq!(engine.len(), 100);
    for i in 0..100 {
        assert_eq!(
            engine.get(format!("key{}", i).as_bytes()).unwrap(),
            Some(format!("value{}", i).into_bytes())
        );
    }
}

#[test]
fn test_reopen_keeps_newest_value() {
    let (_temp, path) = setup_temp_log();
    write_pairs(
        &path,
        &[("day", "monday"), ("day", "tuesday"), ("time", "now"), ("day", "wednesday")],
    );

    let engine = Engine::open(&path).unwrap();

    assert_eq!(engine.get(b"day").unwrap(), Some(b"wednesday".to_vec()));
    assert_eq!(engine.get(b"time").unwrap(), Some(b"now".to_vec()));
    assert_eq!(engine.len(), 2);

    let stats = engine.replay_stats();
    assert_eq!(stats.records, 4);
    assert_eq!(stats.keys, 2);
    assert_eq!(stats.superseded, 2);
    assert_eq!(stats.truncated_bytes, 0);
}

#[test]
fn test_reopen_is_idempotent() {
    let (_temp, path) = setup_temp_log();
    write_pairs(&path, &[("a", "1"), ("b", "2"), ("a", "3")]);

    let first = Engine::open(&path).unwrap();
    let mut first_keys = first.keys();
    first_keys.sort();
    let first_size = first.log_size();
    first.close().unwrap();

    let second = Engine::open(&path).unwrap();
    let mut second_keys = second.keys();
    second_keys.sort();

    assert_eq!(first_keys, second_keys);
    assert_eq!(first_size, second.log_size());
    assert_eq!(second.get(b"a").unwrap(), Some(b"3".to_vec()));
}

#[test]
fn test_writes_after_reopen_land_at_end() {
    let (_temp, path) = setup_temp_log();
    write_pairs(&path, &[("a", "1")]);

    {
        let engine = Engine::open(&path).unwrap();
        engine.set(b"b", b"2").unwrap();
        engine.set(b"a", b"updated").unwrap();
        engine.close().unwrap();
    }

    let engine = Engine::open(&path).unwrap();
    assert_eq!(engine.get(b"a").unwrap(), Some(b"updated".to_vec()));
    assert_eq!(engine.get(b"b").unwrap(), Some(b"2".to_vec()));
    assert!(engine.verify_index().unwrap().is_consistent());
}

#[test]
fn test_drop_without_close_persists() {
    let (_temp, path) = setup_temp_log();
    {
        let engine = Engine::open(&path).unwrap();
        engine.set(b"k", b"v").unwrap();
    }

    let engine = Engine::open(&path).unwrap();
    assert_eq!(engine.get(b"k").unwrap(), Some(b"v".to_vec()));
}

// =============================================================================
// On-Disk Format Tests
// =============================================================================

#[test]
fn test_replay_hand_written_log() {
    let (_temp, path) = setup_temp_log();

    let mut bytes = Vec::new();
    for (key, value) in [("color", "blue"), ("size", ""), ("color", "red,\n")] {
        bytes.extend_from_slice(&(key.len() as u64).to_le_bytes());
        bytes.extend_from_slice(&(value.len() as u64).to_le_bytes());
        bytes.extend_from_slice(key.as_bytes());
        bytes.extend_from_slice(value.as_bytes());
    }
    fs::write(&path, &bytes).unwrap();

    let engine = Engine::open(&path).unwrap();

    assert_eq!(engine.get(b"color").unwrap(), Some(b"red,\n".to_vec()));
    assert_eq!(engine.get(b"size").unwrap(), Some(Vec::new()));
    assert_eq!(engine.log_size(), bytes.len() as u64);
}

#[test]
fn test_engine_output_is_plain_concatenated_records() {
    let (_temp, path) = setup_temp_log();
    write_pairs(&path, &[("a", "1"), ("bb", "22")]);

    let mut expected = record::encode(b"a", b"1").to_vec();
    expected.extend_from_slice(&record::encode(b"bb", b"22"));

    assert_eq!(fs::read(&path).unwrap(), expected);
}

// =============================================================================
// Torn Tail Tests
// =============================================================================

#[test]
fn test_strict_rejects_partial_header() {
    let (_temp, path) = setup_temp_log();
    write_pairs(&path, &[("a", "1")]);
    let valid_len = fs::metadata(&path).unwrap().len();
    append_raw(&path, &[0x03, 0x00, 0x00]);

    let err = open_with_policy(&path, TailPolicy::Strict).err().unwrap();

    match err {
        DriftError::CorruptLog { offset, .. } => assert_eq!(offset, valid_len),
        other => panic!("expected CorruptLog, got {:?}", other),
    }
}

#[test]
fn test_strict_rejects_partial_body() {
    let (_temp, path) = setup_temp_log();
    write_pairs(&path, &[("a", "1")]);
    let valid_len = fs::metadata(&path).unwrap().len();

    let torn = record::encode(b"second", b"incomplete value");
    append_raw(&path, &torn[..torn.len() - 4]);

    let err = Engine::open(&path).err().unwrap();

    match err {
        DriftError::CorruptLog { offset, .. } => assert_eq!(offset, valid_len),
        other => panic!("expected CorruptLog, got {:?}", other),
    }
    // Strict never modifies the file
    assert_eq!(
        fs::metadata(&path).unwrap().len(),
        valid_len + torn.len() as u64 - 4
    );
}

#[test]
fn test_truncate_trims_torn_tail_and_continues() {
    let (_temp, path) = setup_temp_log();
    write_pairs(&path, &[("a", "1"), ("b", "2")]);
    let valid_len = fs::metadata(&path).unwrap().len();

    let torn = record::encode(b"c", b"never finished");
    append_raw(&path, &torn[..torn.len() / 2]);

    let engine = open_with_policy(&path, TailPolicy::Truncate).unwrap();

    assert_eq!(engine.replay_stats().truncated_bytes, (torn.len() / 2) as u64);
    assert_eq!(engine.log_size(), valid_len);
    assert_eq!(fs::metadata(&path).unwrap().len(), valid_len);
    assert_eq!(engine.get(b"a").unwrap(), Some(b"1".to_vec()));
    assert_eq!(engine.get(b"c").unwrap(), None);

    engine.set(b"c", b"finished").unwrap();
    engine.close().unwrap();

    let engine = Engine::open(&path).unwrap();
    assert_eq!(engine.get(b"c").unwrap(), Some(b"finished".to_vec()));
    assert_eq!(engine.len(), 3);
}

#[test]
fn test_truncate_handles_absurd_declared_length() {
    let (_temp, path) = setup_temp_log();
    write_pairs(&path, &[("a", "1")]);
    let valid_len = fs::metadata(&path).unwrap().len();

    let mut garbage = Vec::new();
    garbage.extend_from_slice(&u64::MAX.to_le_bytes());
    garbage.extend_from_slice(&u64::MAX.to_le_bytes());
    garbage.extend_from_slice(b"xyz");
    append_raw(&path, &garbage);

    let engine = open_with_policy(&path, TailPolicy::Truncate).unwrap();

    assert_eq!(engine.log_size(), valid_len);
    assert_eq!(engine.len(), 1);
}

#[test]
fn test_empty_key_record_is_fatal_under_any_policy() {
    let (_temp, path) = setup_temp_log();
    write_pairs(&path, &[("a", "1")]);
    let valid_len = fs::metadata(&path).unwrap().len();
    append_raw(&path, &record::encode(b"", b"orphan"));
    append_raw(&path, &record::encode(b"b", b"2"));

    for policy in [TailPolicy::Strict, TailPolicy::Truncate] {
        let err = open_with_policy(&path, policy).err().unwrap();
        match err {
            DriftError::CorruptLog { offset, .. } => assert_eq!(offset, valid_len),
            other => panic!("expected CorruptLog, got {:?}", other),
        }
    }
}
