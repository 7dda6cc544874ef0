//! # minikv
//!
//! A minimal single-node key-value server with:
//! - A CRLF-framed binary request/response protocol (GET / SET)
//! - A generic in-memory store with a pluggable persistence sink
//! - Write-through snapshots after every request
//! - A blocking TCP client speaking the same protocol
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 TCP Server (thread per client)               │
//! │          Framing (CRLF) → Codec → Connection loop            │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                   Engine (dispatcher)                        │
//! │              GET → store.get   SET → store.set               │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │    Store    │  flush   │    Sink     │
//!   │  (RwLock)   │ ───────▶ │ (snapshot)  │
//!   └─────────────┘          └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod protocol;
pub mod store;
pub mod engine;
pub mod network;
pub mod client;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{KvError, Result};
pub use config::Config;
pub use engine::Engine;
pub use client::Client;
pub use store::{Sink, Store};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of minikv
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
