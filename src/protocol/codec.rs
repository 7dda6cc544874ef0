//! Payload codec
//!
//! Encoding and decoding of frame bodies. Pure byte shuffling, no I/O;
//! the stream helpers at the bottom compose it with the framing layer.
//!
//! ## Body Format
//!
//! ### Request
//! ```text
//! ┌─────────┬─────────────┬─────────┬───────────────┬───────────┐
//! │ Tag (1) │ KeyLen (4)  │   Key   │ ValueLen (4)  │   Value   │
//! └─────────┴─────────────┴─────────┴───────────────┴───────────┘
//!                                   └──── SET only ─────────────┘
//! ```
//!
//! ### Response
//! ```text
//! ┌─────────┬─────────────┬─────────────────────────┐
//! │ Tag (1) │ BodyLen (4) │          Body           │
//! └─────────┴─────────────┴─────────────────────────┘
//! ```
//!
//! Lengths are big-endian u32. SET values are carried verbatim.

use std::io::{BufRead, Write};

use bytes::{Buf, BufMut, Bytes, BytesMut};

use super::frame::{read_frame, write_frame};
use super::{Command, RequestPayload, ResponseKind, ResponsePayload};
use crate::error::{KvError, Result};

/// Size of the tag byte
pub const TAG_SIZE: usize = 1;

/// Size of a length prefix
pub const LEN_PREFIX_SIZE: usize = 4;

/// Maximum size of a single field (16 MB)
pub const MAX_FIELD_SIZE: usize = 16 * 1024 * 1024;

// =============================================================================
// Request Encoding/Decoding
// =============================================================================

/// Encode a request body
pub fn encode_request(request: &RequestPayload) -> Result<Bytes> {
    if request.command == Command::Get && !request.value.is_empty() {
        return Err(KvError::Encode(format!(
            "GET request carries a {} byte value",
            request.value.len()
        )));
    }

    let mut buf = BytesMut::with_capacity(
        TAG_SIZE + 2 * LEN_PREFIX_SIZE + request.key.len() + request.value.len(),
    );
    buf.put_u8(request.command.tag());
    put_field(&mut buf, request.key.as_bytes(), "key")?;

    if request.command == Command::Set {
        put_field(&mut buf, &request.value, "value")?;
    }

    Ok(buf.freeze())
}

/// Decode a request body
pub fn decode_request(body: &[u8]) -> Result<RequestPayload> {
    let mut buf = body;

    let tag = take_tag(&mut buf, "request")?;
    let command = Command::from_tag(tag).ok_or_else(|| {
        KvError::MalformedFrame(format!("Unknown command tag: 0x{:02x}", tag))
    })?;

    let key = take_field(&mut buf, "key")?;
    let key = std::str::from_utf8(key)
        .map_err(|e| KvError::MalformedFrame(format!("key is not valid UTF-8: {}", e)))?
        .to_string();

    let value = match command {
        Command::Get => Bytes::new(),
        Command::Set => Bytes::copy_from_slice(take_field(&mut buf, "value")?),
    };

    ensure_consumed(buf)?;

    Ok(RequestPayload {
        command,
        key,
        value,
    })
}

// =============================================================================
// Response Encoding/Decoding
// =============================================================================

/// Encode a response body
pub fn encode_response(response: &ResponsePayload) -> Result<Bytes> {
    let mut buf = BytesMut::with_capacity(TAG_SIZE + LEN_PREFIX_SIZE + response.body.len());
    buf.put_u8(response.kind.tag());
    put_field(&mut buf, &response.body, "body")?;
    Ok(buf.freeze())
}

/// Decode a response body
pub fn decode_response(body: &[u8]) -> Result<ResponsePayload> {
    let mut buf = body;

    let tag = take_tag(&mut buf, "response")?;
    let kind = ResponseKind::from_tag(tag).ok_or_else(|| {
        KvError::MalformedFrame(format!("Unknown response kind: 0x{:02x}", tag))
    })?;

    let body = Bytes::copy_from_slice(take_field(&mut buf, "body")?);
    ensure_consumed(buf)?;

    Ok(ResponsePayload { kind, body })
}

// =============================================================================
// Field helpers
// =============================================================================

fn put_field(buf: &mut BytesMut, field: &[u8], name: &str) -> Result<()> {
    if field.len() > MAX_FIELD_SIZE {
        return Err(KvError::Encode(format!(
            "{} too large: {} bytes (max {})",
            name,
            field.len(),
            MAX_FIELD_SIZE
        )));
    }
    buf.put_u32(field.len() as u32);
    buf.put_slice(field);
    Ok(())
}

fn take_tag(buf: &mut &[u8], what: &str) -> Result<u8> {
    if !buf.has_remaining() {
        return Err(KvError::MalformedFrame(format!("empty {} body", what)));
    }
    Ok(buf.get_u8())
}

fn take_field<'a>(buf: &mut &'a [u8], name: &str) -> Result<&'a [u8]> {
    if buf.remaining() < LEN_PREFIX_SIZE {
        return Err(KvError::MalformedFrame(format!(
            "{} length truncated: {} of {} bytes",
            name,
            buf.remaining(),
            LEN_PREFIX_SIZE
        )));
    }

    let len = buf.get_u32() as usize;
    if len > MAX_FIELD_SIZE {
        return Err(KvError::MalformedFrame(format!(
            "{} too large: {} bytes (max {})",
            name, len, MAX_FIELD_SIZE
        )));
    }
    if len > buf.remaining() {
        return Err(KvError::MalformedFrame(format!(
            "{} length {} exceeds remaining {} bytes",
            name,
            len,
            buf.remaining()
        )));
    }

    let remaining: &'a [u8] = *buf;
    let (field, rest) = remaining.split_at(len);
    *buf = rest;
    Ok(field)
}

fn ensure_consumed(buf: &[u8]) -> Result<()> {
    if !buf.is_empty() {
        return Err(KvError::MalformedFrame(format!(
            "{} trailing bytes after last field",
            buf.len()
        )));
    }
    Ok(())
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Read one framed request from a stream
pub fn read_request<R: BufRead>(reader: &mut R) -> Result<RequestPayload> {
    let body = read_frame(reader)?;
    decode_request(&body)
}

/// Write one framed request to a stream
pub fn write_request<W: Write>(writer: &mut W, request: &RequestPayload) -> Result<()> {
    let body = encode_request(request)?;
    write_frame(writer, &body)
}

/// Read one framed response from a stream
pub fn read_response<R: BufRead>(reader: &mut R) -> Result<ResponsePayload> {
    let body = read_frame(reader)?;
    decode_response(&body)
}

/// Write one framed response to a stream
pub fn write_response<W: Write>(writer: &mut W, response: &ResponsePayload) -> Result<()> {
    let body = encode_response(response)?;
    write_frame(writer, &body)
}
