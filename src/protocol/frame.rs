//! Framing layer
//!
//! Splits a byte stream into CRLF-terminated frames and assembles them again.
//! Frame bodies are opaque here; the codec gives them meaning.
//!
//! ## Wire Format
//! ```text
//! ┌───────────────────────────────┬──────┬──────┐
//! │   escaped body (any length)   │  CR  │  LF  │
//! └───────────────────────────────┴──────┴──────┘
//! ```
//!
//! Inside the body every CR and ESC byte is escaped, so the only CR on the
//! wire is the one starting the terminator:
//!
//! | body byte | on the wire   |
//! |-----------|---------------|
//! | `0x0D`    | `0x1B 0x01`   |
//! | `0x1B`    | `0x1B 0x02`   |
//!
//! A bare LF is ordinary data.

use std::io::{BufRead, Write};

use crate::error::{KvError, Result};

/// Frame terminator
pub const DELIMITER: &[u8; 2] = b"\r\n";

const CR: u8 = b'\r';
const LF: u8 = b'\n';
const ESC: u8 = 0x1B;
const ESCAPED_CR: u8 = 0x01;
const ESCAPED_ESC: u8 = 0x02;

/// Read one frame, returning the body without its terminator
///
/// Blocks until a full frame arrives. End of stream before the terminator
/// yields `KvError::Disconnected` carrying the number of partial bytes dropped.
pub fn read_frame<R: BufRead>(reader: &mut R) -> Result<Vec<u8>> {
    let mut raw = Vec::new();

    loop {
        let read = reader.read_until(LF, &mut raw)?;

        if read == 0 || raw.last() != Some(&LF) {
            // EOF, with or without a partial frame buffered
            return Err(KvError::Disconnected { pending: raw.len() });
        }

        if raw.ends_with(DELIMITER) {
            raw.truncate(raw.len() - DELIMITER.len());
            return unescape(&raw);
        }

        // bare LF inside the body, keep reading
    }
}

/// Write one frame: the escaped body followed by CRLF, then flush
pub fn write_frame<W: Write>(writer: &mut W, body: &[u8]) -> Result<()> {
    let mut wire = escape(body);
    wire.extend_from_slice(DELIMITER);

    writer.write_all(&wire)?;
    writer.flush()?;
    Ok(())
}

/// Escape CR and ESC bytes in a frame body
pub fn escape(body: &[u8]) -> Vec<u8> {
    let extra = body.iter().filter(|&&b| b == CR || b == ESC).count();
    let mut out = Vec::with_capacity(body.len() + extra + DELIMITER.len());

    for &byte in body {
        match byte {
            CR => out.extend_from_slice(&[ESC, ESCAPED_CR]),
            ESC => out.extend_from_slice(&[ESC, ESCAPED_ESC]),
            other => out.push(other),
        }
    }

    out
}

/// Reverse `escape`
pub fn unescape(wire: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(wire.len());
    let mut bytes = wire.iter().copied().enumerate();

    while let Some((pos, byte)) = bytes.next() {
        match byte {
            ESC => match bytes.next() {
                Some((_, ESCAPED_CR)) => out.push(CR),
                Some((_, ESCAPED_ESC)) => out.push(ESC),
                Some((_, other)) => {
                    return Err(KvError::MalformedFrame(format!(
                        "invalid escape 0x{:02x} at offset {}",
                        other,
                        pos + 1
                    )))
                }
                None => {
                    return Err(KvError::MalformedFrame(
                        "frame ends inside an escape sequence".to_string(),
                    ))
                }
            },
            CR => {
                return Err(KvError::MalformedFrame(format!(
                    "unescaped CR at offset {}",
                    pos
                )))
            }
            other => out.push(other),
        }
    }

    Ok(out)
}
