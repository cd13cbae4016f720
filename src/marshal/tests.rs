use crate::error::ErrorKind;
use crate::proto::Endianness;
use crate::value::Array;
use crate::{ObjectPath, Signature, Value};

use super::{decode, encode};

fn round_trip(signature: &str, values: Vec<Value>) {
    let signature = Signature::new(signature).unwrap();

    for endianness in [Endianness::LITTLE, Endianness::BIG] {
        let mut fds = Vec::new();
        let bytes = encode(&signature, &values, endianness, &mut fds).unwrap();
        let (consumed, decoded) = decode(&signature, &bytes, 0, endianness, &fds).unwrap();
        assert_eq!(consumed, bytes.len(), "{signature} {endianness:?}");
        assert_eq!(decoded, values, "{signature} {endianness:?}");
    }
}

fn decode_le(signature: &str, bytes: &[u8]) -> crate::Result<Vec<Value>> {
    let signature = Signature::new(signature).unwrap();
    let (_, values) = decode(&signature, bytes, 0, Endianness::LITTLE, &[])?;
    Ok(values)
}

fn encode_le(signature: &str, values: &[Value]) -> crate::Result<Vec<u8>> {
    let signature = Signature::new(signature).unwrap();
    encode(&signature, values, Endianness::LITTLE, &mut Vec::new())
}

#[test]
fn basic_types() {
    round_trip(
        "ybnqiuxtdsog",
        vec![
            Value::from(0xffu8),
            Value::from(true),
            Value::from(-2i16),
            Value::from(3u16),
            Value::from(-4i32),
            Value::from(5u32),
            Value::from(-6i64),
            Value::from(7u64),
            Value::from(1.5f64),
            Value::from("hello"),
            Value::from(ObjectPath::new("/org/freedesktop/DBus").unwrap()),
            Value::from(Signature::new("a{sv}").unwrap()),
        ],
    );
}

#[test]
fn nested_containers() {
    let inner = Array::from_items(
        "(iv)",
        vec![
            Value::Struct(vec![Value::from(1i32), Value::variant("one")]),
            Value::Struct(vec![
                Value::from(2i32),
                Value::variant(Value::Struct(vec![Value::from(2u8), Value::from(2.0f64)])),
            ]),
        ],
    )
    .unwrap();

    let dict = Value::dict(
        "s",
        "a(iv)",
        [
            (Value::from("first"), Value::from(inner)),
            (
                Value::from("empty"),
                Value::from(Array::new(Signature::new("(iv)").unwrap()).unwrap()),
            ),
        ],
    )
    .unwrap();

    round_trip("a{sa(iv)}u", vec![dict, Value::from(42u32)]);
}

#[test]
fn empty_values() {
    round_trip("", vec![]);
    round_trip("s", vec![Value::from("")]);
    round_trip(
        "aay",
        vec![Value::from(Array::new(Signature::new("ay").unwrap()).unwrap())],
    );
}

#[test]
fn layout() {
    assert_eq!(
        encode_le("ys", &[Value::from(7u8), Value::from("hi")]).unwrap(),
        b"\x07\0\0\0\x02\0\0\0hi\0"
    );

    assert_eq!(
        encode_le("v", &[Value::variant(5u32)]).unwrap(),
        [1, b'u', 0, 0, 5, 0, 0, 0]
    );

    let signature = Signature::new("u").unwrap();
    let bytes = encode(
        &signature,
        &[Value::from(0x01020304u32)],
        Endianness::BIG,
        &mut Vec::new(),
    )
    .unwrap();
    assert_eq!(bytes, [1, 2, 3, 4]);
}

#[test]
fn array_padding_is_not_counted() {
    let array = Array::from_items("t", vec![Value::from(1u64)]).unwrap();

    assert_eq!(
        encode_le("at", &[Value::from(array)]).unwrap(),
        [8, 0, 0, 0, 0, 0, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0]
    );

    // Padding to the element alignment is present even when empty.
    let empty = Array::new(Signature::new("(i)").unwrap()).unwrap();
    let bytes = encode_le("a(i)", &[Value::from(empty.clone())]).unwrap();
    assert_eq!(bytes, [0; 8]);
    assert_eq!(decode_le("a(i)", &bytes).unwrap(), [Value::from(empty)]);
}

#[test]
fn alignment_is_relative_to_slice() {
    let signature = Signature::new("u").unwrap();
    let bytes = [0xff, 0, 0, 0, 5, 0, 0, 0];

    let (consumed, values) = decode(&signature, &bytes, 1, Endianness::LITTLE, &[]).unwrap();
    assert_eq!(consumed, 7);
    assert_eq!(values, [Value::from(5u32)]);

    let signature = Signature::new("yt").unwrap();
    let bytes = encode_le("yt", &[Value::from(1u8), Value::from(2u64)]).unwrap();
    assert_eq!(bytes.len(), 16);
    assert_eq!(&bytes[1..8], &[0; 7]);

    let (consumed, _) = decode(&signature, &bytes, 0, Endianness::LITTLE, &[]).unwrap();
    assert_eq!(consumed, 16);
}

#[test]
fn truncated_input() {
    let error = decode_le("s", &[5, 0, 0, 0, b'a', b'b']).unwrap_err();
    assert!(matches!(error.kind(), ErrorKind::BufferUnderflow));

    let error = decode_le("t", &[1, 0, 0, 0]).unwrap_err();
    assert!(matches!(error.kind(), ErrorKind::BufferUnderflow));

    let error = decode_le("ai", &[8, 0, 0, 0, 1, 0, 0, 0]).unwrap_err();
    assert!(matches!(error.kind(), ErrorKind::BufferUnderflow));
}

#[test]
fn invalid_boolean() {
    let error = decode_le("b", &[2, 0, 0, 0]).unwrap_err();
    assert!(matches!(error.kind(), ErrorKind::InvalidBoolean(2)));
    assert!(error.is_marshalling());
}

#[test]
fn strings_must_be_terminated() {
    let error = decode_le("s", &[2, 0, 0, 0, b'h', b'i', b'x']).unwrap_err();
    assert!(matches!(error.kind(), ErrorKind::NotNullTerminated));

    let error = decode_le("s", &[2, 0, 0, 0, b'h', 0, 0]).unwrap_err();
    assert!(matches!(error.kind(), ErrorKind::NotNullTerminated));

    let error = encode_le("s", &[Value::from("h\0i")]).unwrap_err();
    assert!(matches!(error.kind(), ErrorKind::ValueMismatch { .. }));
}

#[test]
fn invalid_utf8() {
    let error = decode_le("s", &[1, 0, 0, 0, 0xff, 0]).unwrap_err();
    assert!(matches!(error.kind(), ErrorKind::Utf8Error(..)));
}

#[test]
fn array_limits() {
    let error = decode_le("ay", &[0, 0, 0, 0x08]).unwrap_err();
    assert!(matches!(error.kind(), ErrorKind::ArrayTooLong(0x0800_0000)));

    let error = decode_le("ai", &[2, 0, 0, 0, 1, 0, 0, 0]).unwrap_err();
    assert!(matches!(error.kind(), ErrorKind::ArrayLengthMismatch));
}

#[test]
fn value_mismatch() {
    let error = encode_le("u", &[Value::from("nope")]).unwrap_err();
    assert!(matches!(error.kind(), ErrorKind::ValueMismatch { expected } if &**expected == "u"));

    let error = encode_le("uu", &[Value::from(1u32)]).unwrap_err();
    assert!(matches!(error.kind(), ErrorKind::ValueMismatch { expected } if &**expected == "uu"));

    let array = Array::from_items("i", vec![Value::from(1i32)]).unwrap();
    let error = encode_le("au", &[Value::from(array)]).unwrap_err();
    assert!(matches!(error.kind(), ErrorKind::ValueMismatch { expected } if &**expected == "au"));

    let error = encode_le("(us)", &[Value::Struct(vec![Value::from(1u32)])]).unwrap_err();
    assert!(matches!(error.kind(), ErrorKind::ValueMismatch { .. }));
}

#[test]
fn unix_fds_are_indexes() {
    let signature = Signature::new("hhh").unwrap();
    let values = [Value::UnixFd(10), Value::UnixFd(11), Value::UnixFd(10)];

    let mut fds = Vec::new();
    let bytes = encode(&signature, &values, Endianness::LITTLE, &mut fds).unwrap();
    assert_eq!(fds, [10, 11]);
    assert_eq!(bytes, [0, 0, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0]);

    let (_, decoded) = decode(&signature, &bytes, 0, Endianness::LITTLE, &[20, 21]).unwrap();
    assert_eq!(
        decoded,
        [Value::UnixFd(20), Value::UnixFd(21), Value::UnixFd(20)]
    );

    let error = decode(&signature, &bytes, 0, Endianness::LITTLE, &[20]).unwrap_err();
    assert!(matches!(error.kind(), ErrorKind::InvalidUnixFd(1)));
}

#[test]
fn depth_is_limited() {
    let mut value = Value::from(1u8);

    for _ in 0..70 {
        value = Value::variant(value);
    }

    let error = encode_le("v", &[value]).unwrap_err();
    assert!(matches!(error.kind(), ErrorKind::DepthExceeded));

    let bytes = [1, b'v', 0].repeat(70);
    let error = decode_le("v", &bytes).unwrap_err();
    assert!(matches!(error.kind(), ErrorKind::DepthExceeded));
}

#[test]
fn variant_signature_must_be_single() {
    let error = decode_le("v", &[2, b'u', b'u', 0]).unwrap_err();
    assert!(matches!(error.kind(), ErrorKind::Signature(..)));
}
