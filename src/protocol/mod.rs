//! Protocol Module
//!
//! Defines the wire protocol for client-server communication.
//!
//! ## Layers
//! - `frame`: CRLF-terminated frames over a byte stream
//! - `codec`: frame body ⇄ request/response payloads
//! - `tlv`:   optional typed encoding for SET values (opaque to the codec)
//!
//! ### Command Tags
//! - 0x01: GET  - key
//! - 0x02: SET  - key + value
//!
//! ### Response Kinds
//! - 0x01: GET_SUCCESS - stored value (empty if absent)
//! - 0x02: SET_SUCCESS - "OK"
//! - 0x7F: ERROR       - UTF-8 message

mod command;
mod response;
pub mod codec;
pub mod frame;
pub mod tlv;

pub use command::{Command, RequestPayload};
pub use response::{ResponseKind, ResponsePayload, SET_ACK};
pub use codec::{
    decode_request, decode_response, encode_request, encode_response, read_request,
    read_response, write_request, write_response,
};
pub use frame::{read_frame, write_frame};
pub use tlv::Tlv;
