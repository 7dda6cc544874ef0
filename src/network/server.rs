//! TCP Server
//!
//! Accepts connections and serves each on its own thread.

use std::io::ErrorKind;
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::thread;

use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use parking_lot::Mutex;

use super::registry::{Admission, ConnectionRegistry};
use super::Connection;
use crate::config::Config;
use crate::engine::Engine;
use crate::error::{KvError, Result};

/// TCP server for minikv
pub struct Server {
    config: Config,
    engine: Arc<Engine>,
    local_addr: SocketAddr,
    listener: SharedListener,
    registry: Arc<ConnectionRegistry>,
    shutdown_tx: Sender<()>,
    shutdown_rx: Receiver<()>,
}

/// Listener slot shared with `ServerHandle`; `None` once stopped
type SharedListener = Arc<Mutex<Option<TcpListener>>>;

/// Cloneable control handle for a running server
#[derive(Clone)]
pub struct ServerHandle {
    listener: SharedListener,
    registry: Arc<ConnectionRegistry>,
    shutdown_tx: Sender<()>,
}

impl Server {
    /// Bind the listening socket
    pub fn bind(config: Config, engine: Arc<Engine>) -> Result<Self> {
        if config.max_connections == 0 {
            return Err(KvError::Config(
                "max_connections must be at least 1".to_string(),
            ));
        }

        let addrs: Vec<SocketAddr> = config
            .listen_addr
            .to_socket_addrs()
            .map_err(|e| {
                KvError::Config(format!(
                    "invalid listen address {:?}: {}",
                    config.listen_addr, e
                ))
            })?
            .collect();
        if addrs.is_empty() {
            return Err(KvError::Config(format!(
                "listen address {:?} resolved to nothing",
                config.listen_addr
            )));
        }

        let listener = TcpListener::bind(&addrs[..])?;
        let local_addr = listener.local_addr()?;

        // Non-blocking so the accept loop can notice shutdown
        listener.set_nonblocking(true)?;

        let (shutdown_tx, shutdown_rx) = channel::bounded(1);

        Ok(Self {
            config,
            engine,
            local_addr,
            listener: Arc::new(Mutex::new(Some(listener))),
            registry: Arc::new(ConnectionRegistry::new()),
            shutdown_tx,
            shutdown_rx,
        })
    }

    /// Address the listener is bound to
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.local_addr)
    }

    /// Get a handle for stopping the server from another thread
    pub fn handle(&self) -> ServerHandle {
        ServerHandle {
            listener: Arc::clone(&self.listener),
            registry: Arc::clone(&self.registry),
            shutdown_tx: self.shutdown_tx.clone(),
        }
    }

    /// Run the accept loop (blocking until `ServerHandle::stop`)
    ///
    /// The listener is closed when this returns.
    pub fn run(self) -> Result<()> {
        tracing::info!("Listening on {}", self.local_addr);
        let poll_interval = self.config.accept_poll_interval();

        loop {
            match self.shutdown_rx.try_recv() {
                Ok(()) | Err(TryRecvError::Disconnected) => break,
                Err(TryRecvError::Empty) => {}
            }

            // Never blocks: the listener is non-blocking
            let accepted = match self.listener.lock().as_ref() {
                Some(listener) => listener.accept(),
                None => break,
            };

            match accepted {
                Ok((stream, peer)) => self.spawn_connection(stream, peer),
                Err(e) if e.kind() == ErrorKind::WouldBlock => {
                    match self.shutdown_rx.recv_timeout(poll_interval) {
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                        Err(RecvTimeoutError::Timeout) => {}
                    }
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    tracing::error!("Accept failed: {}", e);
                    self.listener.lock().take();
                    let _ = self.registry.close_all();
                    return Err(e.into());
                }
            }
        }

        self.listener.lock().take();

        // Catch anything registered between stop() and loop exit
        self.registry.close_all()?;
        tracing::info!("Server stopped");
        Ok(())
    }

    /// Register an accepted socket and start its handler thread
    fn spawn_connection(&self, stream: TcpStream, peer: SocketAddr) {
        tracing::debug!("New connection from {}", peer);

        // Accepted sockets inherit non-blocking mode on some platforms
        if let Err(e) = stream.set_nonblocking(false) {
            tracing::warn!("Dropping connection from {}: {}", peer, e);
            return;
        }

        let tracked = match stream.try_clone() {
            Ok(tracked) => tracked,
            Err(e) => {
                tracing::warn!("Dropping connection from {}: {}", peer, e);
                return;
            }
        };

        let id = match self.registry.register(tracked, self.config.max_connections) {
            Admission::Accepted(id) => id,
            Admission::Full => {
                tracing::warn!(
                    "Refusing connection from {}: {} connections already open",
                    peer,
                    self.config.max_connections
                );
                let _ = stream.shutdown(Shutdown::Both);
                return;
            }
            Admission::Closed => {
                tracing::debug!("Refusing connection from {}: server stopping", peer);
                let _ = stream.shutdown(Shutdown::Both);
                return;
            }
        };

        let engine = Arc::clone(&self.engine);
        let registry = Arc::clone(&self.registry);
        let read_ms = self.config.read_timeout_ms;
        let write_ms = self.config.write_timeout_ms;

        let spawned = thread::Builder::new()
            .name(format!("minikv-conn-{}", id))
            .spawn(move || {
                let served = Connection::new(stream, engine).and_then(|mut conn| {
                    conn.set_timeouts(read_ms, write_ms)?;
                    conn.handle()
                });

                match served {
                    Ok(()) => tracing::debug!("Connection {} from {} closed", id, peer),
                    Err(e) => tracing::warn!("Connection {} from {} failed: {}", id, peer, e),
                }

                registry.deregister(id);
            });

        if let Err(e) = spawned {
            tracing::error!("Failed to spawn handler for {}: {}", peer, e);
            self.registry.deregister(id);
        }
    }
}

impl ServerHandle {
    /// Close every tracked connection, then the listening socket
    ///
    /// The listener is closed before this returns, so new connects are
    /// refused at once. All connections are attempted even if one fails;
    /// the first failure is returned after the accept loop has been
    /// signalled.
    pub fn stop(&self) -> Result<()> {
        tracing::info!("Stopping server ({} live connections)", self.registry.len());
        let closed = self.registry.close_all();

        if self.listener.lock().take().is_some() {
            tracing::debug!("Listener closed");
        }

        // Full means a stop is already pending
        let _ = self.shutdown_tx.try_send(());

        closed
    }

    /// Number of live connections
    pub fn connection_count(&self) -> usize {
        self.registry.len()
    }

    /// Whether `stop` has been called
    pub fn is_stopped(&self) -> bool {
        self.registry.is_closed()
    }
}
