//! Type-length-value encoding for stored values
//!
//! Clients encode SET values with this before handing them to the codec,
//! which carries them as opaque bytes.
//!
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │ Type (1) │ Len (4)  │            Value            │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```

use std::fmt;

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{KvError, Result};

/// Header size: 1 byte type + 4 bytes length
pub const HEADER_SIZE: usize = 5;

/// TLV type tags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TlvType {
    Bytes = 0x00,
    String = 0x01,
    Integer = 0x02,
}

/// A typed value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tlv {
    Bytes(Bytes),
    String(String),
    Integer(i64),
}

impl Tlv {
    /// Type tag of this value
    pub fn tlv_type(&self) -> TlvType {
        match self {
            Tlv::Bytes(_) => TlvType::Bytes,
            Tlv::String(_) => TlvType::String,
            Tlv::Integer(_) => TlvType::Integer,
        }
    }

    /// Encode to `type | len | value`
    pub fn encode(&self) -> Bytes {
        let integer;
        let value: &[u8] = match self {
            Tlv::Bytes(b) => &b[..],
            Tlv::String(s) => s.as_bytes(),
            Tlv::Integer(i) => {
                integer = i.to_be_bytes();
                &integer
            }
        };

        let mut buf = BytesMut::with_capacity(HEADER_SIZE + value.len());
        buf.put_u8(self.tlv_type() as u8);
        buf.put_u32(value.len() as u32);
        buf.put_slice(value);
        buf.freeze()
    }

    /// Decode a single value; the input must hold exactly one TLV
    pub fn decode(bytes: &[u8]) -> Result<Tlv> {
        let mut buf = bytes;
        if buf.remaining() < HEADER_SIZE {
            return Err(KvError::MalformedFrame(format!(
                "TLV header truncated: {} of {} bytes",
                buf.remaining(),
                HEADER_SIZE
            )));
        }

        let tag = buf.get_u8();
        let len = buf.get_u32() as usize;
        if len != buf.remaining() {
            return Err(KvError::MalformedFrame(format!(
                "TLV length {} does not match {} value bytes",
                len,
                buf.remaining()
            )));
        }

        match tag {
            0x00 => Ok(Tlv::Bytes(Bytes::copy_from_slice(buf))),
            0x01 => String::from_utf8(buf.to_vec())
                .map(Tlv::String)
                .map_err(|e| KvError::MalformedFrame(format!("TLV string: {}", e))),
            0x02 => {
                if len != 8 {
                    return Err(KvError::MalformedFrame(format!(
                        "TLV integer must be 8 bytes, got {}",
                        len
                    )));
                }
                Ok(Tlv::Integer(buf.get_i64()))
            }
            _ => Err(KvError::MalformedFrame(format!(
                "Unknown TLV type: 0x{:02x}",
                tag
            ))),
        }
    }
}

impl fmt::Display for Tlv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tlv::Bytes(b) => {
                for byte in b.iter() {
                    write!(f, "{:02x}", byte)?;
                }
                Ok(())
            }
            Tlv::String(s) => write!(f, "{}", s),
            Tlv::Integer(i) => write!(f, "{}", i),
        }
    }
}

impl From<&str> for Tlv {
    fn from(s: &str) -> Self {
        Tlv::String(s.to_string())
    }
}

impl From<i64> for Tlv {
    fn from(i: i64) -> Self {
        Tlv::Integer(i)
    }
}
