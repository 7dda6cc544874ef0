//! Connection Registry
//!
//! Tracks live connections so the server can close them on shutdown.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::net::{Shutdown, TcpStream};

use parking_lot::Mutex;

use crate::error::Result;

/// Outcome of `ConnectionRegistry::register`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Tracked under this id
    Accepted(u64),
    /// `max_connections` already reached
    Full,
    /// Registry closed by shutdown
    Closed,
}

/// Lock-guarded set of live connections
///
/// Ids are handed out monotonically, so a connection is never tracked twice.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    state: Mutex<RegistryState>,
}

#[derive(Debug, Default)]
struct RegistryState {
    next_id: u64,
    connections: HashMap<u64, TcpStream>,
    closed: bool,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a handle to an accepted socket
    pub fn register(&self, stream: TcpStream, limit: usize) -> Admission {
        let mut state = self.state.lock();

        if state.closed {
            return Admission::Closed;
        }
        if state.connections.len() >= limit {
            return Admission::Full;
        }

        state.next_id += 1;
        let id = state.next_id;
        state.connections.insert(id, stream);
        Admission::Accepted(id)
    }

    /// Stop tracking a connection (called when its handler exits)
    pub fn deregister(&self, id: u64) {
        self.state.lock().connections.remove(&id);
    }

    /// Number of live connections
    pub fn len(&self) -> usize {
        self.state.lock().connections.len()
    }

    /// Check if no connections are live
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `close_all` has run
    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Refuse new registrations and shut down every tracked socket
    ///
    /// Every socket is attempted; the first failure is returned.
    pub fn close_all(&self) -> Result<()> {
        let connections: Vec<(u64, TcpStream)> = {
            let mut state = self.state.lock();
            state.closed = true;
            state.connections.drain().collect()
        };

        let mut first_error = None;
        for (id, stream) in connections {
            match stream.shutdown(Shutdown::Both) {
                Ok(()) => tracing::debug!("Closed connection {}", id),
                // Peer already gone
                Err(e) if e.kind() == ErrorKind::NotConnected => {}
                Err(e) => {
                    tracing::warn!("Failed to close connection {}: {}", id, e);
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        }

        match first_error {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }
}
