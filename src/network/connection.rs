//! Connection Handler
//!
//! Handles individual client connections.

use std::io::{BufReader, BufWriter, ErrorKind, Read, Write};
use std::net::TcpStream;
use std::sync::Arc;
use std::time::Duration;

use crate::engine::Engine;
use crate::error::{KvError, Result};
use crate::protocol::{read_request, write_response, ResponsePayload};

/// Handles a single client connection
///
/// Generic over the two halves of the transport; the server uses two
/// handles of one `TcpStream`.
pub struct Connection<R = TcpStream, W: Write = TcpStream> {
    /// Stream reader (buffered for efficiency)
    reader: BufReader<R>,

    /// Stream writer (buffered for efficiency)
    writer: BufWriter<W>,

    /// Reference to the dispatcher
    engine: Arc<Engine>,

    /// Peer address for logging
    peer_addr: String,
}

impl Connection<TcpStream, TcpStream> {
    /// Create a new connection handler
    ///
    /// Sets up buffered I/O on two handles of the same socket
    pub fn new(stream: TcpStream, engine: Arc<Engine>) -> Result<Self> {
        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        // Disable Nagle's algorithm for low latency
        stream.set_nodelay(true)?;

        let read_stream = stream.try_clone()?;
        Ok(Connection::from_parts(read_stream, stream, engine, peer_addr))
    }

    /// Configure connection timeouts (0 leaves that direction blocking)
    pub fn set_timeouts(&mut self, read_ms: u64, write_ms: u64) -> Result<()> {
        let read_stream = self.reader.get_ref();
        let write_stream = self.writer.get_ref();

        if read_ms > 0 {
            read_stream.set_read_timeout(Some(Duration::from_millis(read_ms)))?;
        }
        if write_ms > 0 {
            write_stream.set_write_timeout(Some(Duration::from_millis(write_ms)))?;
        }

        Ok(())
    }
}

impl<R: Read, W: Write> Connection<R, W> {
    /// Build a handler over arbitrary reader/writer halves
    pub fn from_parts(
        reader: R,
        writer: W,
        engine: Arc<Engine>,
        peer_addr: impl Into<String>,
    ) -> Self {
        Self {
            reader: BufReader::new(reader),
            writer: BufWriter::new(writer),
            engine,
            peer_addr: peer_addr.into(),
        }
    }

    /// Handle the connection (blocking until closed)
    ///
    /// One request in flight at a time: read, dispatch, flush the store,
    /// respond, repeat. Returns `Ok` when the client goes away and `Err` on
    /// I/O or decode failures.
    pub fn handle(&mut self) -> Result<()> {
        tracing::debug!("Connection established from {}", self.peer_addr);

        loop {
            let request = match read_request(&mut self.reader) {
                Ok(request) => request,
                Err(KvError::Disconnected { pending: 0 }) => {
                    tracing::debug!("Client {} disconnected", self.peer_addr);
                    return Ok(());
                }
                Err(KvError::Disconnected { pending }) => {
                    tracing::debug!(
                        "Client {} disconnected mid-frame, dropped {} bytes",
                        self.peer_addr,
                        pending
                    );
                    return Ok(());
                }
                Err(ref e) if e.is_disconnect() => {
                    tracing::debug!("Connection to {} lost: {}", self.peer_addr, e);
                    return Ok(());
                }
                Err(KvError::Io(ref e))
                    if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) =>
                {
                    // WouldBlock on Unix, TimedOut on Windows
                    tracing::debug!("Read timeout for client {}", self.peer_addr);
                    return Ok(());
                }
                Err(e @ KvError::MalformedFrame(_)) => {
                    tracing::warn!("Malformed request from {}: {}", self.peer_addr, e);
                    // Answer before closing so the client is not left waiting
                    let _ = self.send_response(&ResponsePayload::error(&e.to_string()));
                    return Err(e);
                }
                Err(e) => {
                    tracing::warn!("Error reading from {}: {}", self.peer_addr, e);
                    return Err(e);
                }
            };

            tracing::trace!("Received request from {}: {:?}", self.peer_addr, request);

            let response = self.engine.dispatch(request);

            // Write-through; a sink failure never changes the response
            if let Err(e) = self.engine.flush() {
                tracing::warn!("Flush after request from {} failed: {}", self.peer_addr, e);
            }

            if let Err(e) = self.send_response(&response) {
                if e.is_disconnect() {
                    tracing::debug!(
                        "Client {} disconnected before response could be sent: {}",
                        self.peer_addr,
                        e
                    );
                    return Ok(());
                }
                tracing::warn!("Error writing to {}: {}", self.peer_addr, e);
                return Err(e);
            }
        }
    }

    /// Send a response to the client
    fn send_response(&mut self, response: &ResponsePayload) -> Result<()> {
        write_response(&mut self.writer, response)
    }

    /// Get the peer address string
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }
}
