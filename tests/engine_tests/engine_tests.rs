//! Tests for Engine
//!
//! These tests verify:
//! - GET/SET dispatch and the responses they build
//! - Write-through flush into a snapshot file
//! - Snapshot restore on open
//! - Concurrent dispatch from many threads

use std::sync::Arc;
use std::thread;

use bytes::Bytes;
use minikv::config::Config;
use minikv::engine::Engine;
use minikv::protocol::{RequestPayload, ResponseKind, ResponsePayload};
use minikv::store::{FileSink, MemorySink, Store};
use minikv::KvError;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_memory_engine() -> Engine {
    Engine::open(Config::default()).unwrap()
}

fn setup_temp_engine() -> (TempDir, Engine) {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder()
        .snapshot_path(temp_dir.path().join("snapshot.db"))
        .build();
    let engine = Engine::open(config).unwrap();
    (temp_dir, engine)
}

// =============================================================================
// Dispatch Tests
// =============================================================================

#[test]
fn test_get_missing_key() {
    let engine = setup_memory_engine();

    let response = engine.dispatch(RequestPayload::get("missing"));

    assert_eq!(response.kind, ResponseKind::GetSuccess);
    assert!(response.body.is_empty());
}

#[test]
fn test_set_then_get() {
    let engine = setup_memory_engine();

    let response = engine.dispatch(RequestPayload::set("foo", vec![0x01, 0x02]));
    assert_eq!(response, ResponsePayload::set_success());
    assert_eq!(&response.body[..], b"OK");

    let response = engine.dispatch(RequestPayload::get("foo"));
    assert_eq!(response, ResponsePayload::get_success(vec![0x01, 0x02]));
}

#[test]
fn test_set_overwrites() {
    let engine = setup_memory_engine();

    engine.dispatch(RequestPayload::set("k", Bytes::from_static(b"v1")));
    engine.dispatch(RequestPayload::set("k", Bytes::from_static(b"v2")));

    let response = engine.dispatch(RequestPayload::get("k"));
    assert_eq!(&response.body[..], b"v2");
}

#[test]
fn test_with_store_shares_state() {
    let store = Arc::new(Store::new(None));
    let engine = Engine::with_store(Arc::clone(&store));

    engine.dispatch(RequestPayload::set("k", Bytes::from_static(b"v")));
    assert_eq!(store.get("k"), Bytes::from_static(b"v"));
}

#[test]
fn test_memory_engine_flush_is_noop() {
    let engine = setup_memory_engine();
    engine.dispatch(RequestPayload::set("k", Bytes::from_static(b"v")));

    assert!(!engine.store().has_sink());
    assert!(engine.flush().is_ok());
}

// =============================================================================
// Persistence Tests
// =============================================================================

#[test]
fn test_flush_writes_snapshot() {
    let (temp, engine) = setup_temp_engine();

    engine.dispatch(RequestPayload::set("foo", vec![0x01, 0x02]));
    engine.flush().unwrap();

    let snapshot = FileSink::new(temp.path().join("snapshot.db"))
        .load::<Bytes>()
        .unwrap()
        .unwrap();
    assert_eq!(snapshot["foo"], Bytes::from_static(&[0x01, 0x02]));
}

#[test]
fn test_reopen_restores_snapshot() {
    let (temp, engine) = setup_temp_engine();

    engine.dispatch(RequestPayload::set("a", Bytes::from_static(b"1")));
    engine.dispatch(RequestPayload::set("b", Bytes::from_static(b"2")));
    engine.flush().unwrap();
    drop(engine);

    let config = Config::builder()
        .snapshot_path(temp.path().join("snapshot.db"))
        .build();
    let reopened = Engine::open(config).unwrap();

    assert_eq!(reopened.store().len(), 2);
    let response = reopened.dispatch(RequestPayload::get("b"));
    assert_eq!(&response.body[..], b"2");
}

#[test]
fn test_open_with_corrupt_snapshot_fails() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("snapshot.db");
    std::fs::write(&path, b"garbage that is not a snapshot").unwrap();

    let result = Engine::open(Config::builder().snapshot_path(&path).build());
    assert!(matches!(result, Err(KvError::Corruption(_))));
}

#[test]
fn test_flush_after_each_set_tracks_latest_state() {
    let sink = Arc::new(MemorySink::<Bytes>::new());
    let store: Arc<Store<Bytes>> = Arc::new(Store::new(Some(sink.clone())));
    let engine = Engine::with_store(store);

    for i in 0..5u8 {
        engine.dispatch(RequestPayload::set(format!("k{}", i), vec![i]));
        engine.flush().unwrap();
        assert_eq!(sink.last_snapshot().unwrap().len(), i as usize + 1);
    }
    assert_eq!(sink.flush_count(), 5);
}

// =============================================================================
// Concurrency Tests
// =============================================================================

#[test]
fn test_concurrent_dispatch() {
    let (_temp, engine) = setup_temp_engine();
    let engine = Arc::new(engine);

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                for i in 0..50 {
                    let key = format!("t{}-k{}", t, i);
                    let value = format!("v{}", i).into_bytes();

                    engine.dispatch(RequestPayload::set(key.clone(), value.clone()));
                    engine.flush().unwrap();

                    let response = engine.dispatch(RequestPayload::get(key));
                    assert_eq!(response.body, value);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(engine.store().len(), 8 * 50);
}
