//! Store Module
//!
//! In-memory key-value state shared by every connection.
//!
//! ## Responsibilities
//! - Atomic `get`/`set` from many connection threads
//! - Absent keys read as the value type's default (empty for bytes)
//! - Hand consistent snapshots to a pluggable sink on `flush`
//!
//! ## Data Structure Choice
//! HashMap wrapped in RwLock: no ordering is needed across keys, and reads
//! vastly outnumber writes in a cache-style workload.

mod sink;
mod table;

use std::collections::HashMap;
use std::sync::Arc;

pub use sink::{FileSink, MemorySink, Sink};
pub use table::{shared, Store};

/// A full copy of the store's entries
pub type Snapshot<V> = HashMap<String, V>;

/// Sink handle as held by the store
pub type SharedSink<V> = Arc<dyn Sink<V>>;

/// Bound for anything the store can hold
pub trait StoreValue: Clone + Default + Send + Sync + 'static {}

impl<T: Clone + Default + Send + Sync + 'static> StoreValue for T {}
