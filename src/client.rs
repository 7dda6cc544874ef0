//! Client
//!
//! Blocking TCP client speaking the same framing and codec as the server.

use std::io::{self, BufReader, BufWriter};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use bytes::Bytes;

use crate::error::{KvError, Result};
use crate::protocol::{
    decode_response, encode_request, read_frame, write_frame, RequestPayload, ResponseKind,
    ResponsePayload,
};

/// A connection to a minikv server
///
/// The protocol has no request ids, so exchanges must not overlap;
/// every call takes `&mut self`. Once an exchange fails part way the
/// stream position is unknown, so the client is marked broken and every
/// later call fails without touching the socket.
pub struct Client {
    reader: BufReader<TcpStream>,
    writer: BufWriter<TcpStream>,
    peer_addr: SocketAddr,
    broken: bool,
}

impl Client {
    /// Dial a server
    pub fn connect(addr: impl ToSocketAddrs) -> Result<Self> {
        let stream = TcpStream::connect(addr)?;
        stream.set_nodelay(true)?;
        let peer_addr = stream.peer_addr()?;

        Ok(Self {
            reader: BufReader::new(stream.try_clone()?),
            writer: BufWriter::new(stream),
            peer_addr,
            broken: false,
        })
    }

    /// Configure socket timeouts (0 leaves that direction blocking)
    pub fn set_timeouts(&self, read_ms: u64, write_ms: u64) -> Result<()> {
        let stream = self.writer.get_ref();
        let to_timeout = |ms: u64| (ms > 0).then(|| Duration::from_millis(ms));

        stream.set_read_timeout(to_timeout(read_ms))?;
        stream.set_write_timeout(to_timeout(write_ms))?;
        Ok(())
    }

    /// Send one frame body and wait for the reply frame body
    ///
    /// Any failure here leaves the client broken.
    pub fn send(&mut self, body: &[u8]) -> Result<Vec<u8>> {
        if self.broken {
            return Err(KvError::Io(io::Error::new(
                io::ErrorKind::NotConnected,
                "client is broken by an earlier failed exchange",
            )));
        }

        let reply = write_frame(&mut self.writer, body)
            .and_then(|()| read_frame(&mut self.reader));
        if let Err(ref e) = reply {
            tracing::debug!("Exchange with {} failed, closing: {}", self.peer_addr, e);
            self.poison();
        }
        reply
    }

    /// Whether an earlier exchange failed and the client can no longer be used
    pub fn is_broken(&self) -> bool {
        self.broken
    }

    /// Mark broken and shut the socket so no late reply is ever read
    fn poison(&mut self) {
        self.broken = true;
        let _ = self.writer.get_ref().shutdown(Shutdown::Both);
    }

    /// Fetch the value stored under `key` (empty body if absent)
    pub fn get(&mut self, key: &str) -> Result<ResponsePayload> {
        self.request(&RequestPayload::get(key))
    }

    /// Store already-encoded value bytes under `key`
    pub fn set(&mut self, key: &str, value: impl Into<Bytes>) -> Result<ResponsePayload> {
        self.request(&RequestPayload::set(key, value))
    }

    /// Encode, exchange and decode one request
    ///
    /// An `Error` response from the server is returned as `KvError::Server`.
    pub fn request(&mut self, request: &RequestPayload) -> Result<ResponsePayload> {
        let body = encode_request(request)?;
        let reply = self.send(&body)?;
        let response = match decode_response(&reply) {
            Ok(response) => response,
            Err(e) => {
                self.poison();
                return Err(e);
            }
        };

        if response.kind == ResponseKind::Error {
            return Err(KvError::Server(
                String::from_utf8_lossy(&response.body).into_owned(),
            ));
        }

        tracing::trace!("{:?} {} -> {:?}", request.command, request.key, response.kind);
        Ok(response)
    }

    /// Address of the server
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    /// Close the connection
    pub fn close(self) -> Result<()> {
        match self.writer.get_ref().shutdown(Shutdown::Both) {
            Ok(()) => Ok(()),
            // Server already closed it
            Err(e) if e.kind() == io::ErrorKind::NotConnected => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
