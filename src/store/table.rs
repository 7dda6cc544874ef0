//! Store implementation
//!
//! HashMap-based store with RwLock for concurrency and a replaceable sink.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use super::{SharedSink, Snapshot, StoreValue};
use crate::error::{KvError, Result};

/// In-memory key-value store with an attached persistence sink
///
/// ## Concurrency:
/// - `entries`: RwLock, so `get`/`set` are individually atomic
/// - `flush_lock`: serializes flushes so snapshots reach the sink in order
/// - The sink runs outside the entries lock; a slow sink never stalls `get`/`set`
pub struct Store<V: StoreValue> {
    /// Key → value
    entries: RwLock<HashMap<String, V>>,

    /// Persistence target; `None` makes `flush` a no-op
    sink: RwLock<Option<SharedSink<V>>>,

    /// Held for the duration of a flush
    flush_lock: Mutex<()>,
}

impl<V: StoreValue> Store<V> {
    /// Create an empty store
    pub fn new(sink: Option<SharedSink<V>>) -> Self {
        Self::with_entries(sink, HashMap::new())
    }

    /// Create a store pre-loaded with entries (e.g. a restored snapshot)
    pub fn with_entries(sink: Option<SharedSink<V>>, entries: Snapshot<V>) -> Self {
        Self {
            entries: RwLock::new(entries),
            sink: RwLock::new(sink),
            flush_lock: Mutex::new(()),
        }
    }

    /// Get the value for `key`, or `V::default()` when absent
    pub fn get(&self, key: &str) -> V {
        self.entries.read().get(key).cloned().unwrap_or_default()
    }

    /// Insert or replace the value for `key`
    pub fn set(&self, key: impl Into<String>, value: V) {
        self.entries.write().insert(key.into(), value);
    }

    /// Check whether `key` has an entry
    pub fn contains(&self, key: &str) -> bool {
        self.entries.read().contains_key(key)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Copy of every entry, taken atomically with respect to `set`
    pub fn snapshot(&self) -> Snapshot<V> {
        self.entries.read().clone()
    }

    /// Forward the current snapshot to the sink
    ///
    /// A sink failure is returned as `KvError::Sink`; the in-memory entries
    /// are left exactly as they were.
    pub fn flush(&self) -> Result<()> {
        let sink = match self.sink.read().clone() {
            Some(sink) => sink,
            None => return Ok(()),
        };

        let _flush_guard = self.flush_lock.lock();
        let snapshot = self.snapshot();

        sink.flush(&snapshot).map_err(|e| match e {
            KvError::Sink(_) => e,
            other => KvError::Sink(other.to_string()),
        })
    }

    /// Replace the sink (or detach it with `None`)
    pub fn set_sink(&self, sink: Option<SharedSink<V>>) {
        *self.sink.write() = sink;
    }

    /// Check whether a sink is attached
    pub fn has_sink(&self) -> bool {
        self.sink.read().is_some()
    }
}

impl<V: StoreValue> Default for Store<V> {
    fn default() -> Self {
        Self::new(None)
    }
}

impl<V: StoreValue> std::fmt::Debug for Store<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("entries", &self.len())
            .field("has_sink", &self.has_sink())
            .finish()
    }
}

/// Convenience for wiring a concrete sink into `Store::new`
pub fn shared<V, S>(sink: S) -> Option<SharedSink<V>>
where
    V: StoreValue,
    S: super::Sink<V> + 'static,
{
    let sink: SharedSink<V> = Arc::new(sink);
    Some(sink)
}
