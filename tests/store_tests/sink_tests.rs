//! Sink Tests
//!
//! Tests verify:
//! - FileSink writes a snapshot that loads back
//! - Missing snapshot loads as None
//! - Corruption (magic, checksum, truncation) is detected
//! - Each flush replaces the previous snapshot

use std::fs;
use std::sync::Arc;

use bytes::Bytes;
use minikv::store::{FileSink, Sink, Snapshot, Store};
use minikv::KvError;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_sink() -> (TempDir, FileSink) {
    let temp_dir = TempDir::new().unwrap();
    let sink = FileSink::new(temp_dir.path().join("snapshot.db"));
    (temp_dir, sink)
}

fn sample_snapshot() -> Snapshot<Bytes> {
    let mut snapshot = Snapshot::new();
    snapshot.insert("foo".to_string(), Bytes::from_static(&[0x01, 0x02]));
    snapshot.insert("crlf".to_string(), Bytes::from_static(b"a\r\nb"));
    snapshot.insert("empty".to_string(), Bytes::new());
    snapshot
}

// =============================================================================
// FileSink Tests
// =============================================================================

#[test]
fn test_load_missing_snapshot() {
    let (_temp, sink) = setup_temp_sink();
    assert!(sink.load::<Bytes>().unwrap().is_none());
}

#[test]
fn test_flush_then_load() {
    let (_temp, sink) = setup_temp_sink();
    let snapshot = sample_snapshot();

    sink.flush(&snapshot).unwrap();
    let loaded = sink.load::<Bytes>().unwrap().unwrap();

    assert_eq!(loaded, snapshot);
}

#[test]
fn test_flush_creates_parent_directories() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("nested").join("dir").join("snap.db");
    let sink = FileSink::new(&path);

    sink.flush(&sample_snapshot()).unwrap();
    assert!(path.exists());
}

#[test]
fn test_flush_replaces_previous_snapshot() {
    let (temp, sink) = setup_temp_sink();

    sink.flush(&sample_snapshot()).unwrap();

    let mut smaller = Snapshot::new();
    smaller.insert("only".to_string(), Bytes::from_static(b"one"));
    sink.flush(&smaller).unwrap();

    assert_eq!(sink.load::<Bytes>().unwrap().unwrap(), smaller);

    // No temp file left behind
    let files: Vec<_> = fs::read_dir(temp.path()).unwrap().collect();
    assert_eq!(files.len(), 1);
}

#[test]
fn test_generic_values_round_trip() {
    let (_temp, sink) = setup_temp_sink();

    let mut counters: Snapshot<u64> = Snapshot::new();
    counters.insert("hits".to_string(), 42);
    sink.flush(&counters).unwrap();

    assert_eq!(sink.load::<u64>().unwrap().unwrap(), counters);
}

#[test]
fn test_bad_magic_detected() {
    let (_temp, sink) = setup_temp_sink();
    sink.flush(&sample_snapshot()).unwrap();

    let mut bytes = fs::read(sink.path()).unwrap();
    bytes[0] = b'X';
    fs::write(sink.path(), &bytes).unwrap();

    assert!(matches!(sink.load::<Bytes>(), Err(KvError::Corruption(_))));
}

#[test]
fn test_checksum_mismatch_detected() {
    let (_temp, sink) = setup_temp_sink();
    sink.flush(&sample_snapshot()).unwrap();

    let mut bytes = fs::read(sink.path()).unwrap();
    let last = bytes.len() - 1;
    bytes[last] ^= 0xFF;
    fs::write(sink.path(), &bytes).unwrap();

    let err = sink.load::<Bytes>().unwrap_err();
    assert!(err.to_string().contains("checksum"));
}

#[test]
fn test_truncated_snapshot_detected() {
    let (_temp, sink) = setup_temp_sink();
    sink.flush(&sample_snapshot()).unwrap();

    let bytes = fs::read(sink.path()).unwrap();
    fs::write(sink.path(), &bytes[..bytes.len() - 3]).unwrap();
    assert!(matches!(sink.load::<Bytes>(), Err(KvError::Corruption(_))));

    fs::write(sink.path(), &bytes[..5]).unwrap();
    assert!(matches!(sink.load::<Bytes>(), Err(KvError::Corruption(_))));
}

// =============================================================================
// Store + FileSink
// =============================================================================

#[test]
fn test_store_flush_through_file_sink() {
    let (_temp, sink) = setup_temp_sink();
    let store: Store<Bytes> = Store::new(Some(Arc::new(sink.clone())));

    store.set("foo", Bytes::from_static(&[0x01, 0x02]));
    store.flush().unwrap();

    let loaded = sink.load::<Bytes>().unwrap().unwrap();
    assert_eq!(loaded["foo"], Bytes::from_static(&[0x01, 0x02]));

    // Restore into a fresh store
    let restored: Store<Bytes> = Store::with_entries(None, loaded);
    assert_eq!(restored.get("foo"), store.get("foo"));
}

#[test]
fn test_store_flush_to_unwritable_path_reports_sink_error() {
    let temp_dir = TempDir::new().unwrap();
    // A regular file where the parent directory should be
    let blocker = temp_dir.path().join("blocker");
    fs::write(&blocker, b"not a dir").unwrap();

    let store: Store<Bytes> = Store::new(Some(Arc::new(FileSink::new(blocker.join("snap.db")))));
    store.set("k", Bytes::from_static(b"v"));

    assert!(matches!(store.flush(), Err(KvError::Sink(_))));
    assert_eq!(store.get("k"), Bytes::from_static(b"v"));
}
