//! Marshalling of complete messages: primary header, header fields and body.

use std::num::NonZeroU32;

use crate::buf::{padding_to, ReadBuf, WriteBuf, MAX_ARRAY_LENGTH, MAX_BODY_LENGTH, MAX_MESSAGE_LENGTH};
use crate::error::{Error, ErrorKind, Result};
use crate::marshal;
use crate::proto::{Endianness, Flags, HeaderField, MessageType, HEADER_LENGTH, PROTOCOL_VERSION};
use crate::value::{Array, RawFd};
use crate::{Message, MessageKind, ObjectPath, Signature, Value};

/// The signature of the header field array.
const HEADER_FIELDS: &str = "a(yv)";

/// The signature of a single header field.
const HEADER_FIELD: &str = "(yv)";

impl Message {
    /// Marshal the message into a complete frame.
    ///
    /// The message must have a serial assigned. Messages carrying unix fds
    /// can't be marshalled this way, since the descriptors would be lost.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::num::NonZeroU32;
    ///
    /// use dbus_engine::Message;
    ///
    /// let m = Message::method_call("/org/freedesktop/DBus", "Hello")?
    ///     .with_serial(NonZeroU32::new(1).unwrap());
    ///
    /// let frame = m.encode()?;
    /// assert_eq!(frame.len() % 8, 0);
    /// assert_eq!(Message::parse(&frame)?, m);
    /// # Ok::<_, dbus_engine::Error>(())
    /// ```
    pub fn encode(&self) -> Result<Vec<u8>> {
        let serial = self
            .serial
            .ok_or_else(|| Error::new(ErrorKind::ZeroSerial))?;

        let mut fds = Vec::new();
        let frame = self.encode_with(serial, &mut fds)?;

        if !fds.is_empty() {
            return Err(Error::new(ErrorKind::UnixFdsUnsupported));
        }

        Ok(frame)
    }

    /// Marshal the message with the given serial, collecting any unix fds in
    /// the body into `fds`.
    pub(crate) fn encode_with(&self, serial: NonZeroU32, fds: &mut Vec<RawFd>) -> Result<Vec<u8>> {
        let endianness = self.endianness;
        let body = marshal::encode(&self.signature, &self.body, endianness, fds)?;

        let body_length = match u32::try_from(body.len()) {
            Ok(length) if length <= MAX_BODY_LENGTH => length,
            _ => {
                return Err(Error::new(ErrorKind::BodyTooLong(
                    u32::try_from(body.len()).unwrap_or(u32::MAX),
                )))
            }
        };

        let (path, member, error_name, reply_serial) = match &self.kind {
            MessageKind::MethodCall { path, member } | MessageKind::Signal { path, member } => {
                (Some(path), Some(member), None, None)
            }
            MessageKind::MethodReturn { reply_serial } => (None, None, None, Some(*reply_serial)),
            MessageKind::Error {
                error_name,
                reply_serial,
            } => (None, None, Some(error_name), Some(*reply_serial)),
        };

        let mut fields = Vec::new();

        if let Some(path) = path {
            fields.push(field(HeaderField::PATH, Value::ObjectPath(path.clone())));
        }

        if let Some(interface) = &self.interface {
            fields.push(field(HeaderField::INTERFACE, Value::from(&**interface)));
        }

        if let Some(member) = member {
            fields.push(field(HeaderField::MEMBER, Value::from(&**member)));
        }

        if let Some(error_name) = error_name {
            fields.push(field(HeaderField::ERROR_NAME, Value::from(&**error_name)));
        }

        if let Some(reply_serial) = reply_serial {
            fields.push(field(HeaderField::REPLY_SERIAL, Value::from(reply_serial.get())));
        }

        if let Some(destination) = &self.destination {
            fields.push(field(HeaderField::DESTINATION, Value::from(&**destination)));
        }

        if let Some(sender) = &self.sender {
            fields.push(field(HeaderField::SENDER, Value::from(&**sender)));
        }

        if !self.signature.is_empty() {
            fields.push(field(
                HeaderField::SIGNATURE,
                Value::Signature(self.signature.clone()),
            ));
        }

        if !fds.is_empty() {
            fields.push(field(HeaderField::UNIX_FDS, Value::from(fds.len() as u32)));
        }

        let fields = Array::from_raw(Signature::new_unchecked(HEADER_FIELD.into()), fields);

        let mut buf = WriteBuf::new(endianness);
        buf.store(endianness.get());
        buf.store(self.kind.message_type().get());
        buf.store(self.flags.0);
        buf.store(PROTOCOL_VERSION);
        buf.store(body_length);
        buf.store(serial.get());

        marshal::encode_into(
            &mut buf,
            &Signature::new_unchecked(HEADER_FIELDS.into()),
            &[Value::Array(fields)],
            &mut Vec::new(),
        )?;

        buf.align(8);
        buf.extend_from_slice(&body);

        if buf.len() > MAX_MESSAGE_LENGTH {
            return Err(Error::new(ErrorKind::MessageTooLong(buf.len())));
        }

        Ok(buf.into_vec())
    }

    /// Parse a single complete frame.
    ///
    /// Unknown header fields are ignored, while an unknown message type is
    /// an error.
    pub fn parse(frame: &[u8]) -> Result<Message> {
        Self::parse_with_fds(frame, &[])
    }

    /// Parse a single complete frame, resolving unix fd indexes in the body
    /// against `fds`.
    pub(crate) fn parse_with_fds(frame: &[u8], fds: &[RawFd]) -> Result<Message> {
        let endianness = endianness(frame)?;
        let mut buf = ReadBuf::new(frame, 1, endianness);

        let message_type = MessageType::new(buf.load::<u8>()?);

        if !matches!(
            message_type,
            MessageType::METHOD_CALL
                | MessageType::METHOD_RETURN
                | MessageType::ERROR
                | MessageType::SIGNAL
        ) {
            return Err(Error::new(ErrorKind::InvalidProtocol(message_type.get())));
        }

        let flags = Flags(buf.load::<u8>()?);
        let version = buf.load::<u8>()?;

        if version != PROTOCOL_VERSION {
            return Err(Error::new(ErrorKind::InvalidVersion(version)));
        }

        let body_length = buf.load::<u32>()?;

        if body_length > MAX_BODY_LENGTH {
            return Err(Error::new(ErrorKind::BodyTooLong(body_length)));
        }

        let serial =
            NonZeroU32::new(buf.load::<u32>()?).ok_or_else(|| Error::new(ErrorKind::ZeroSerial))?;

        let fields = marshal::decode_from(
            &mut buf,
            &Signature::new_unchecked(HEADER_FIELDS.into()),
            &[],
        )?;

        let mut headers = Headers::default();

        for fields in fields {
            let Value::Array(fields) = fields else {
                continue;
            };

            for field in fields.into_items() {
                let Value::Struct(pair) = field else {
                    continue;
                };

                let [Value::Byte(code), Value::Variant(value)] = &pair[..] else {
                    continue;
                };

                headers.insert(HeaderField::new(*code), value)?;
            }
        }

        buf.align(8)?;
        let start = buf.position();
        let end = start + body_length as usize;

        if end > frame.len() {
            return Err(Error::new(ErrorKind::BufferUnderflow));
        }

        let (consumed, body) =
            marshal::decode(&headers.signature, &frame[..end], start, endianness, fds)?;

        if consumed != body_length as usize {
            return Err(Error::new(ErrorKind::BodyLengthMismatch));
        }

        let kind = match message_type {
            MessageType::METHOD_CALL => MessageKind::MethodCall {
                path: headers.path.ok_or(ErrorKind::MissingPath)?,
                member: headers.member.ok_or(ErrorKind::MissingMember)?,
            },
            MessageType::METHOD_RETURN => MessageKind::MethodReturn {
                reply_serial: headers.reply_serial.ok_or(ErrorKind::MissingReplySerial)?,
            },
            MessageType::ERROR => MessageKind::Error {
                error_name: headers.error_name.ok_or(ErrorKind::MissingErrorName)?,
                reply_serial: headers.reply_serial.ok_or(ErrorKind::MissingReplySerial)?,
            },
            _ => {
                if headers.interface.is_none() {
                    return Err(Error::new(ErrorKind::MissingInterface));
                }

                MessageKind::Signal {
                    path: headers.path.ok_or(ErrorKind::MissingPath)?,
                    member: headers.member.ok_or(ErrorKind::MissingMember)?,
                }
            }
        };

        Ok(Message {
            kind,
            serial: Some(serial),
            flags,
            interface: headers.interface,
            destination: headers.destination,
            sender: headers.sender,
            signature: headers.signature,
            body,
            unix_fds: headers.unix_fds,
            endianness,
        })
    }
}

/// Compute the total length of the frame starting with `header`, which must
/// hold at least the fixed part of the primary header.
pub(crate) fn frame_length(header: &[u8]) -> Result<usize> {
    let endianness = endianness(header)?;
    let mut buf = ReadBuf::new(header, 4, endianness);

    let body_length = buf.load::<u32>()?;
    let _serial = buf.load::<u32>()?;
    let fields_length = buf.load::<u32>()?;

    if body_length > MAX_BODY_LENGTH {
        return Err(Error::new(ErrorKind::BodyTooLong(body_length)));
    }

    if fields_length > MAX_ARRAY_LENGTH {
        return Err(Error::new(ErrorKind::ArrayTooLong(fields_length)));
    }

    let fields_length = fields_length as usize;
    let length = HEADER_LENGTH + fields_length + padding_to(8, fields_length) + body_length as usize;

    if length > MAX_MESSAGE_LENGTH {
        return Err(Error::new(ErrorKind::MessageTooLong(length)));
    }

    Ok(length)
}

fn endianness(frame: &[u8]) -> Result<Endianness> {
    let Some(&tag) = frame.first() else {
        return Err(Error::new(ErrorKind::BufferUnderflow));
    };

    Endianness::from_tag(tag).ok_or_else(|| Error::new(ErrorKind::InvalidEndianness(tag)))
}

#[inline]
fn field(code: HeaderField, value: Value) -> Value {
    Value::Struct(vec![Value::Byte(code.get()), Value::variant(value)])
}

/// Header fields collected while parsing.
#[derive(Default)]
struct Headers {
    path: Option<ObjectPath>,
    interface: Option<Box<str>>,
    member: Option<Box<str>>,
    error_name: Option<Box<str>>,
    reply_serial: Option<NonZeroU32>,
    destination: Option<Box<str>>,
    sender: Option<Box<str>>,
    signature: Signature,
    unix_fds: u32,
}

impl Headers {
    fn insert(&mut self, code: HeaderField, value: &Value) -> Result<()> {
        match (code, value) {
            (HeaderField::PATH, Value::ObjectPath(path)) => {
                self.path = Some(path.clone());
            }
            (HeaderField::INTERFACE, Value::Str(interface)) => {
                self.interface = Some(interface.as_str().into());
            }
            (HeaderField::MEMBER, Value::Str(member)) => {
                self.member = Some(member.as_str().into());
            }
            (HeaderField::ERROR_NAME, Value::Str(error_name)) => {
                self.error_name = Some(error_name.as_str().into());
            }
            (HeaderField::REPLY_SERIAL, Value::UInt32(serial)) => {
                let serial = NonZeroU32::new(*serial).ok_or(ErrorKind::ZeroSerial)?;
                self.reply_serial = Some(serial);
            }
            (HeaderField::DESTINATION, Value::Str(destination)) => {
                self.destination = Some(destination.as_str().into());
            }
            (HeaderField::SENDER, Value::Str(sender)) => {
                self.sender = Some(sender.as_str().into());
            }
            (HeaderField::SIGNATURE, Value::Signature(signature)) => {
                self.signature = signature.clone();
            }
            (HeaderField::UNIX_FDS, Value::UInt32(count)) => {
                self.unix_fds = *count;
            }
            (code, _) => {
                let expected = match code {
                    HeaderField::PATH => "o",
                    HeaderField::REPLY_SERIAL | HeaderField::UNIX_FDS => "u",
                    HeaderField::SIGNATURE => "g",
                    HeaderField::INTERFACE
                    | HeaderField::MEMBER
                    | HeaderField::ERROR_NAME
                    | HeaderField::DESTINATION
                    | HeaderField::SENDER => "s",
                    // Unknown header fields are ignored.
                    _ => return Ok(()),
                };

                return Err(Error::new(ErrorKind::ValueMismatch {
                    expected: expected.into(),
                }));
            }
        }

        Ok(())
    }
}
