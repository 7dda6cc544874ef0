//! Request definitions
//!
//! Represents requests from clients.

use bytes::Bytes;

/// Command tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Command {
    Get = 0x01,
    Set = 0x02,
}

impl Command {
    /// Look up a command by its wire tag
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0x01 => Some(Command::Get),
            0x02 => Some(Command::Set),
            _ => None,
        }
    }

    /// Wire tag for this command
    pub fn tag(self) -> u8 {
        self as u8
    }
}

/// A decoded request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestPayload {
    /// What the client wants done
    pub command: Command,

    /// Target key
    pub key: String,

    /// Encoded value for SET, empty for GET
    pub value: Bytes,
}

impl RequestPayload {
    /// Build a GET request
    pub fn get(key: impl Into<String>) -> Self {
        Self {
            command: Command::Get,
            key: key.into(),
            value: Bytes::new(),
        }
    }

    /// Build a SET request carrying already-encoded value bytes
    pub fn set(key: impl Into<String>, value: impl Into<Bytes>) -> Self {
        Self {
            command: Command::Set,
            key: key.into(),
            value: value.into(),
        }
    }
}
