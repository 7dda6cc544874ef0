//! Engine Module
//!
//! Dispatches decoded requests against the shared store.
//!
//! ## Responsibilities
//! - Build the store (and restore its snapshot) on startup
//! - Map GET/SET requests to store operations and build responses
//! - Expose the write-through flush the connection handler calls after
//!   every request

use std::sync::Arc;

use bytes::Bytes;

use crate::config::Config;
use crate::error::Result;
use crate::protocol::{Command, RequestPayload, ResponsePayload};
use crate::store::{shared, FileSink, Store};

/// Request dispatcher over a byte-valued store
///
/// `Engine` is shared by every connection thread behind an `Arc`; all
/// synchronization lives inside `Store`.
pub struct Engine {
    /// Engine configuration
    config: Config,

    /// Shared key-value state
    store: Arc<Store<Bytes>>,
}

impl Engine {
    /// Open an engine with the given config
    ///
    /// With a snapshot path configured:
    /// 1. Attach a `FileSink` for write-through flushes
    /// 2. Restore the last snapshot if one exists
    pub fn open(config: Config) -> Result<Self> {
        let store = match &config.snapshot_path {
            Some(path) => {
                let sink = FileSink::new(path);
                let entries = sink.load::<Bytes>()?.unwrap_or_default();

                if !entries.is_empty() {
                    tracing::info!(
                        "Restored {} entries from snapshot {}",
                        entries.len(),
                        path.display()
                    );
                }

                Store::with_entries(shared(sink), entries)
            }
            None => Store::new(None),
        };

        Ok(Self {
            config,
            store: Arc::new(store),
        })
    }

    /// Wrap an existing store (default config)
    pub fn with_store(store: Arc<Store<Bytes>>) -> Self {
        Self {
            config: Config::default(),
            store,
        }
    }

    /// Execute a request and build its response
    pub fn dispatch(&self, request: RequestPayload) -> ResponsePayload {
        match request.command {
            Command::Get => {
                tracing::trace!("GET {}", request.key);
                ResponsePayload::get_success(self.store.get(&request.key))
            }
            Command::Set => {
                tracing::trace!("SET {} ({} bytes)", request.key, request.value.len());
                self.store.set(request.key, request.value);
                ResponsePayload::set_success()
            }
        }
    }

    /// Push the current state to the sink (no-op without one)
    pub fn flush(&self) -> Result<()> {
        self.store.flush()
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Get the shared store
    pub fn store(&self) -> &Arc<Store<Bytes>> {
        &self.store
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }
}
