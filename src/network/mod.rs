//! Network Module
//!
//! TCP server and connection handling.
//!
//! ## Architecture
//! - Single non-blocking accept loop
//! - One thread per connection, all sharing one `Engine`
//! - Live connections tracked in a registry for shutdown

mod connection;
mod registry;
mod server;

pub use connection::Connection;
pub use registry::{Admission, ConnectionRegistry};
pub use server::{Server, ServerHandle};
