//! TLV Tests

use bytes::Bytes;
use minikv::protocol::tlv::{TlvType, HEADER_SIZE};
use minikv::protocol::Tlv;
use minikv::KvError;

#[test]
fn test_string_layout() {
    let encoded = Tlv::from("hi").encode();
    assert_eq!(&encoded[..], &[0x01, 0x00, 0x00, 0x00, 0x02, b'h', b'i']);
}

#[test]
fn test_integer_layout() {
    let encoded = Tlv::Integer(-2).encode();
    assert_eq!(encoded.len(), HEADER_SIZE + 8);
    assert_eq!(encoded[0], TlvType::Integer as u8);
    assert_eq!(Tlv::decode(&encoded).unwrap(), Tlv::Integer(-2));
}

#[test]
fn test_decode_each_type() {
    for value in [
        Tlv::Bytes(Bytes::from_static(&[0x00, 0x0D, 0x0A, 0xFF])),
        Tlv::String("hello world".to_string()),
        Tlv::Integer(i64::MAX),
    ] {
        assert_eq!(Tlv::decode(&value.encode()).unwrap(), value);
    }
}

#[test]
fn test_display() {
    assert_eq!(Tlv::from("abc").to_string(), "abc");
    assert_eq!(Tlv::Integer(42).to_string(), "42");
    assert_eq!(Tlv::Bytes(Bytes::from_static(&[0x01, 0xAB])).to_string(), "01ab");
}

#[test]
fn test_truncated_header() {
    assert!(matches!(Tlv::decode(&[0x01, 0x00]), Err(KvError::MalformedFrame(_))));
}

#[test]
fn test_length_mismatch() {
    // Declares 5 bytes, carries 2
    let bytes = [0x01, 0x00, 0x00, 0x00, 0x05, b'h', b'i'];
    assert!(matches!(Tlv::decode(&bytes), Err(KvError::MalformedFrame(_))));
}

#[test]
fn test_unknown_type() {
    let bytes = [0x09, 0x00, 0x00, 0x00, 0x00];
    assert!(matches!(Tlv::decode(&bytes), Err(KvError::MalformedFrame(_))));
}

#[test]
fn test_integer_wrong_width() {
    let bytes = [0x02, 0x00, 0x00, 0x00, 0x02, 0x00, 0x01];
    assert!(matches!(Tlv::decode(&bytes), Err(KvError::MalformedFrame(_))));
}
