//! Response definitions
//!
//! Represents responses to clients.

use bytes::Bytes;

/// Acknowledgement body for a successful SET
pub const SET_ACK: &[u8] = b"OK";

/// Response kind tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ResponseKind {
    GetSuccess = 0x01,
    SetSuccess = 0x02,
    Error = 0x7F,
}

impl ResponseKind {
    /// Look up a response kind by its wire tag
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0x01 => Some(ResponseKind::GetSuccess),
            0x02 => Some(ResponseKind::SetSuccess),
            0x7F => Some(ResponseKind::Error),
            _ => None,
        }
    }

    /// Wire tag for this kind
    pub fn tag(self) -> u8 {
        self as u8
    }
}

/// A response to send to client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponsePayload {
    /// Kind of response
    pub kind: ResponseKind,

    /// Stored value for GET, acknowledgement for SET, message for ERROR
    pub body: Bytes,
}

impl ResponsePayload {
    /// Create a GET success response
    pub fn get_success(body: impl Into<Bytes>) -> Self {
        Self {
            kind: ResponseKind::GetSuccess,
            body: body.into(),
        }
    }

    /// Create a SET success response
    pub fn set_success() -> Self {
        Self {
            kind: ResponseKind::SetSuccess,
            body: Bytes::from_static(SET_ACK),
        }
    }

    /// Create an ERROR response
    pub fn error(message: &str) -> Self {
        Self {
            kind: ResponseKind::Error,
            body: Bytes::copy_from_slice(message.as_bytes()),
        }
    }

    /// True for GET/SET success kinds
    pub fn is_success(&self) -> bool {
        self.kind != ResponseKind::Error
    }
}
