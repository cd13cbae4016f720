use std::num::NonZeroU32;

use crate::error::ErrorKind;
use crate::proto::{Endianness, Flags, MessageType};
use crate::{Message, MessageKind, Value};

use super::frame_length;

/// A method return replying to serial 1 with the single string `"abc"`.
const RETURN_FRAME: [u8; 40] = [
    b'l', 2, 0, 1, 8, 0, 0, 0, 2, 0, 0, 0, 15, 0, 0, 0, // primary header
    5, 1, b'u', 0, 1, 0, 0, 0, // reply serial
    8, 1, b'g', 0, 1, b's', 0, 0, // signature and padding
    3, 0, 0, 0, b'a', b'b', b'c', 0, // body
];

fn serial(n: u32) -> NonZeroU32 {
    NonZeroU32::new(n).unwrap()
}

fn return_message() -> Message {
    Message::method_call("/org/freedesktop/DBus", "Hello")
        .unwrap()
        .with_serial(serial(1))
        .method_return()
        .unwrap()
        .with_body("s", vec![Value::from("abc")])
        .unwrap()
        .with_serial(serial(2))
        .with_endianness(Endianness::LITTLE)
}

#[test]
fn encode_return_frame() {
    assert_eq!(return_message().encode().unwrap(), RETURN_FRAME);
    assert_eq!(frame_length(&RETURN_FRAME).unwrap(), RETURN_FRAME.len());
}

#[test]
fn parse_return_frame() {
    let message = Message::parse(&RETURN_FRAME).unwrap();

    assert_eq!(message.message_type(), MessageType::METHOD_RETURN);
    assert_eq!(message.serial(), Some(serial(2)));
    assert_eq!(message.reply_serial(), Some(serial(1)));
    assert_eq!(message.signature(), "s");
    assert_eq!(message.body(), [Value::from("abc")]);
    assert_eq!(message, return_message());
}

#[test]
fn method_call_round_trip() {
    for endianness in [Endianness::LITTLE, Endianness::BIG] {
        let message = Message::method_call("/org/freedesktop/DBus", "RequestName")
            .unwrap()
            .with_interface("org.freedesktop.DBus")
            .unwrap()
            .with_destination("org.freedesktop.DBus")
            .unwrap()
            .with_flags(Flags::NO_AUTO_START)
            .with_body(
                "sua{sv}",
                vec![
                    Value::from("se.tedro.Example"),
                    Value::from(4u32),
                    Value::dict("s", "v", [(Value::from("k"), Value::variant(1.5f64))]).unwrap(),
                ],
            )
            .unwrap()
            .with_serial(serial(77))
            .with_endianness(endianness);

        let frame = message.encode().unwrap();
        assert_eq!(frame[0], endianness.get());
        assert_eq!(frame_length(&frame).unwrap(), frame.len());
        assert_eq!(Message::parse(&frame).unwrap(), message);
    }
}

#[test]
fn signal_round_trip() {
    let message = Message::signal("/se/tedro/Example", "se.tedro.Example", "Changed")
        .unwrap()
        .with_serial(serial(3));

    let parsed = Message::parse(&message.encode().unwrap()).unwrap();
    assert_eq!(parsed.interface(), Some("se.tedro.Example"));
    assert_eq!(parsed.path().map(|p| p.as_str()), Some("/se/tedro/Example"));
    assert_eq!(parsed.member(), Some("Changed"));
    assert_eq!(parsed, message);
}

#[test]
fn error_round_trip() {
    let call = Message::method_call("/", "Frobnicate")
        .unwrap()
        .with_sender(":1.7")
        .unwrap()
        .with_serial(serial(9));

    let error = call
        .error("org.freedesktop.DBus.Error.UnknownMethod")
        .unwrap()
        .with_body("s", vec![Value::from("no such method")])
        .unwrap()
        .with_serial(serial(10));

    assert_eq!(error.destination(), Some(":1.7"));

    let parsed = Message::parse(&error.encode().unwrap()).unwrap();

    assert_eq!(
        parsed.kind(),
        &MessageKind::Error {
            error_name: "org.freedesktop.DBus.Error.UnknownMethod".into(),
            reply_serial: serial(9),
        }
    );
    assert_eq!(parsed.error_name(), Some("org.freedesktop.DBus.Error.UnknownMethod"));
}

#[test]
fn construction_is_validated() {
    let error = Message::method_call("/org/freedesktop/DBus/Local", "Hello").unwrap_err();
    assert!(matches!(error.kind(), ErrorKind::ReservedPath));

    let error = Message::signal("/a", "org.freedesktop.DBus.Local", "Disconnected").unwrap_err();
    assert!(matches!(error.kind(), ErrorKind::ReservedInterface));

    assert!(Message::method_call("a/b", "Hello").is_err());
    assert!(Message::method_call("/a", "").is_err());
    assert!(Message::signal("/a", "nodots", "Changed").is_err());

    let call = Message::method_call("/a", "Hello").unwrap();
    assert!(call.clone().with_destination("not a name").is_err());
    assert!(call.clone().with_interface("a..b").is_err());
    assert!(call.clone().with_body("u", vec![Value::from("x")]).is_err());
    assert!(call.clone().with_body("(", vec![]).is_err());

    let error = call.method_return().unwrap_err();
    assert!(matches!(error.kind(), ErrorKind::ZeroSerial));

    let error = call.encode().unwrap_err();
    assert!(matches!(error.kind(), ErrorKind::ZeroSerial));
}

#[test]
fn unknown_header_fields_are_ignored() {
    let frame = [
        b'l', 2, 0, 1, 0, 0, 0, 0, 3, 0, 0, 0, 16, 0, 0, 0, // primary header
        5, 1, b'u', 0, 1, 0, 0, 0, // reply serial
        42, 1, b'u', 0, 7, 0, 0, 0, // unknown
    ];

    let message = Message::parse(&frame).unwrap();
    assert_eq!(message.reply_serial(), Some(serial(1)));
    assert!(message.body().is_empty());
}

#[test]
fn parse_failures() {
    let mut frame = RETURN_FRAME;
    frame[1] = 9;
    let error = Message::parse(&frame).unwrap_err();
    assert!(matches!(error.kind(), ErrorKind::InvalidProtocol(9)));

    let mut frame = RETURN_FRAME;
    frame[0] = b'x';
    let error = Message::parse(&frame).unwrap_err();
    assert!(matches!(error.kind(), ErrorKind::InvalidEndianness(b'x')));

    let mut frame = RETURN_FRAME;
    frame[3] = 2;
    let error = Message::parse(&frame).unwrap_err();
    assert!(matches!(error.kind(), ErrorKind::InvalidVersion(2)));

    let mut frame = RETURN_FRAME;
    frame[8] = 0;
    let error = Message::parse(&frame).unwrap_err();
    assert!(matches!(error.kind(), ErrorKind::ZeroSerial));

    // Return without a reply serial field.
    let mut frame = RETURN_FRAME;
    frame[16] = 42;
    let error = Message::parse(&frame).unwrap_err();
    assert!(matches!(error.kind(), ErrorKind::MissingReplySerial));

    // Signal without path, member or interface.
    let mut frame = RETURN_FRAME;
    frame[1] = 4;
    let error = Message::parse(&frame).unwrap_err();
    assert!(matches!(error.kind(), ErrorKind::MissingInterface));

    let error = Message::parse(&RETURN_FRAME[..38]).unwrap_err();
    assert!(matches!(error.kind(), ErrorKind::BufferUnderflow));

    let mut frame = RETURN_FRAME.to_vec();
    frame[4] = 12;
    frame.extend_from_slice(&[0; 4]);
    let error = Message::parse(&frame).unwrap_err();
    assert!(matches!(error.kind(), ErrorKind::BodyLengthMismatch));
}

#[test]
fn retyped_signal_parses_as_call() {
    let message = Message::signal("/a", "se.tedro.Example", "Changed")
        .unwrap()
        .with_serial(serial(1));

    let mut frame = message.encode().unwrap();
    // Retype the signal as a call, which doesn't need an interface.
    frame[1] = 1;

    let parsed = Message::parse(&frame).unwrap();
    assert!(matches!(parsed.kind(), MessageKind::MethodCall { .. }));
    assert_eq!(parsed.interface(), Some("se.tedro.Example"));
}

#[test]
fn frame_length_limits() {
    let mut header = RETURN_FRAME;
    header[4..8].copy_from_slice(&(1u32 << 27).to_le_bytes());
    header[12..16].copy_from_slice(&8u32.to_le_bytes());
    let error = frame_length(&header).unwrap_err();
    assert!(matches!(error.kind(), ErrorKind::MessageTooLong(..)));

    let mut header = RETURN_FRAME;
    header[4..8].copy_from_slice(&((1u32 << 27) + 1).to_le_bytes());
    let error = frame_length(&header).unwrap_err();
    assert!(matches!(error.kind(), ErrorKind::BodyTooLong(..)));
}
