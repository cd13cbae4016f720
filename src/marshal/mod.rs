//! Signature-driven marshalling of [`Value`]s to and from the wire format.
//!
//! Alignment is always computed relative to the start of the byte slice
//! being produced or consumed, which must correspond to an 8-byte boundary
//! in the enclosing message.

#[cfg(test)]
mod tests;

use crate::buf::{ReadBuf, WriteBuf, MAX_ARRAY_LENGTH};
use crate::error::{Error, ErrorKind, Result};
use crate::proto::{Endianness, Type};
use crate::signature::Iter;
use crate::value::{Array, RawFd};
use crate::{ObjectPath, Signature, Value};

/// The maximum nesting of values, counting every container.
pub const MAX_DEPTH: usize = 64;

/// Marshal `values` according to `signature`.
///
/// Unix file descriptors are appended to `fds`, and marshalled as their
/// index into it.
///
/// # Examples
///
/// ```
/// use dbus_engine::proto::Endianness;
/// use dbus_engine::{marshal, Signature, Value};
///
/// let signature = Signature::new("ys")?;
/// let values = [Value::from(7u8), Value::from("hi")];
///
/// let bytes = marshal::encode(&signature, &values, Endianness::LITTLE, &mut Vec::new())?;
/// assert_eq!(bytes, b"\x07\0\0\0\x02\0\0\0hi\0");
/// # Ok::<_, dbus_engine::Error>(())
/// ```
pub fn encode(
    signature: &Signature,
    values: &[Value],
    endianness: Endianness,
    fds: &mut Vec<RawFd>,
) -> Result<Vec<u8>> {
    let mut buf = WriteBuf::new(endianness);
    encode_into(&mut buf, signature, values, fds)?;
    Ok(buf.into_vec())
}

/// Unmarshal values described by `signature` from `bytes`, starting at
/// `offset`.
///
/// Returns the number of bytes consumed together with the values.
///
/// # Examples
///
/// ```
/// use dbus_engine::proto::Endianness;
/// use dbus_engine::{marshal, Signature, Value};
///
/// let signature = Signature::new("ys")?;
/// let bytes = b"\x07\0\0\0\x02\0\0\0hi\0";
///
/// let (consumed, values) = marshal::decode(&signature, bytes, 0, Endianness::LITTLE, &[])?;
/// assert_eq!(consumed, bytes.len());
/// assert_eq!(values, [Value::from(7u8), Value::from("hi")]);
/// # Ok::<_, dbus_engine::Error>(())
/// ```
pub fn decode(
    signature: &Signature,
    bytes: &[u8],
    offset: usize,
    endianness: Endianness,
    fds: &[RawFd],
) -> Result<(usize, Vec<Value>)> {
    let mut buf = ReadBuf::new(bytes, offset, endianness);
    let values = decode_from(&mut buf, signature, fds)?;
    Ok((buf.position() - offset, values))
}

/// Marshal values into an existing buffer.
pub(crate) fn encode_into(
    buf: &mut WriteBuf,
    signature: &Signature,
    values: &[Value],
    fds: &mut Vec<RawFd>,
) -> Result<()> {
    let mut encoder = Encoder { buf, fds };
    let mut types = signature.iter();
    let mut values = values.iter();

    loop {
        match (types.next(), values.next()) {
            (Some(ty), Some(value)) => encoder.value(ty, value, 0)?,
            (None, None) => return Ok(()),
            _ => return Err(mismatch(signature.as_str())),
        }
    }
}

/// Unmarshal values from an existing buffer.
pub(crate) fn decode_from(
    buf: &mut ReadBuf<'_>,
    signature: &Signature,
    fds: &[RawFd],
) -> Result<Vec<Value>> {
    let mut decoder = Decoder { buf, fds };
    let mut values = Vec::new();

    for ty in signature.iter() {
        values.push(decoder.value(ty, 0)?);
    }

    Ok(values)
}

struct Encoder<'a> {
    buf: &'a mut WriteBuf,
    fds: &'a mut Vec<RawFd>,
}

impl Encoder<'_> {
    /// Encode a value of the single complete type `ty`.
    fn value(&mut self, ty: &str, value: &Value, depth: usize) -> Result<()> {
        if depth > MAX_DEPTH {
            return Err(Error::new(ErrorKind::DepthExceeded));
        }

        let code = Type::new(ty.as_bytes()[0]);

        match (code, value) {
            (Type::BYTE, Value::Byte(v)) => self.buf.store(*v),
            (Type::BOOLEAN, Value::Bool(v)) => self.buf.store(u32::from(*v)),
            (Type::INT16, Value::Int16(v)) => self.buf.store(*v),
            (Type::UINT16, Value::UInt16(v)) => self.buf.store(*v),
            (Type::INT32, Value::Int32(v)) => self.buf.store(*v),
            (Type::UINT32, Value::UInt32(v)) => self.buf.store(*v),
            (Type::INT64, Value::Int64(v)) => self.buf.store(*v),
            (Type::UINT64, Value::UInt64(v)) => self.buf.store(*v),
            (Type::DOUBLE, Value::Double(v)) => self.buf.store(*v),
            (Type::STRING, Value::Str(v)) => self.string(ty, v)?,
            (Type::OBJECT_PATH, Value::ObjectPath(v)) => self.string(ty, v.as_str())?,
            (Type::SIGNATURE, Value::Signature(v)) => self.signature(v.as_str()),
            (Type::UNIX_FD, Value::UnixFd(fd)) => {
                let index = match self.fds.iter().position(|existing| existing == fd) {
                    Some(index) => index,
                    None => {
                        self.fds.push(*fd);
                        self.fds.len() - 1
                    }
                };

                self.buf.store(index as u32);
            }
            (Type::ARRAY, Value::Array(array)) => self.array(ty, array, depth)?,
            (Type::OPEN_PAREN, Value::Struct(fields)) => {
                self.buf.align(8);

                let mut types = Iter::new(&ty[1..ty.len() - 1]);
                let mut fields = fields.iter();

                loop {
                    match (types.next(), fields.next()) {
                        (Some(field_ty), Some(field)) => self.value(field_ty, field, depth + 1)?,
                        (None, None) => break,
                        _ => return Err(mismatch(ty)),
                    }
                }
            }
            (Type::OPEN_BRACE, Value::DictEntry(entry)) => {
                self.buf.align(8);

                let mut types = Iter::new(&ty[1..ty.len() - 1]);

                let (Some(key_ty), Some(value_ty)) = (types.next(), types.next()) else {
                    return Err(mismatch(ty));
                };

                self.value(key_ty, &entry.0, depth + 1)?;
                self.value(value_ty, &entry.1, depth + 1)?;
            }
            (Type::VARIANT, Value::Variant(inner)) => {
                let signature = Signature::new_single(inner.signature().as_str())?;
                self.signature(signature.as_str());
                self.value(signature.as_str(), inner, depth + 1)?;
            }
            _ => return Err(mismatch(ty)),
        }

        Ok(())
    }

    fn string(&mut self, ty: &str, string: &str) -> Result<()> {
        if string.as_bytes().contains(&0) {
            return Err(mismatch(ty));
        }

        self.buf.store(string.len() as u32);
        self.buf.extend_from_slice(string.as_bytes());
        self.buf.extend_from_slice(&[0]);
        Ok(())
    }

    fn signature(&mut self, signature: &str) {
        // Validated signatures never exceed 255 bytes.
        self.buf.store(signature.len() as u8);
        self.buf.extend_from_slice(signature.as_bytes());
        self.buf.extend_from_slice(&[0]);
    }

    fn array(&mut self, ty: &str, array: &Array, depth: usize) -> Result<()> {
        let element = &ty[1..];

        if array.element().as_str() != element {
            return Err(mismatch(ty));
        }

        self.buf.store(0u32);
        let length_at = self.buf.len() - 4;

        // Padding to the first element is not part of the array length.
        self.buf.align(Type::new(element.as_bytes()[0]).alignment());
        let start = self.buf.len();

        for item in array.items() {
            self.value(element, item, depth + 1)?;
        }

        let length = self.buf.len() - start;

        let length = match u32::try_from(length) {
            Ok(length) if length <= MAX_ARRAY_LENGTH => length,
            _ => {
                return Err(Error::new(ErrorKind::ArrayTooLong(
                    u32::try_from(length).unwrap_or(u32::MAX),
                )))
            }
        };

        self.buf.patch_u32(length_at, length);
        Ok(())
    }
}

struct Decoder<'a, 'de> {
    buf: &'a mut ReadBuf<'de>,
    fds: &'a [RawFd],
}

impl Decoder<'_, '_> {
    /// Decode a value of the single complete type `ty`.
    fn value(&mut self, ty: &str, depth: usize) -> Result<Value> {
        if depth > MAX_DEPTH {
            return Err(Error::new(ErrorKind::DepthExceeded));
        }

        let value = match Type::new(ty.as_bytes()[0]) {
            Type::BYTE => Value::Byte(self.buf.load()?),
            Type::BOOLEAN => match self.buf.load::<u32>()? {
                0 => Value::Bool(false),
                1 => Value::Bool(true),
                other => return Err(Error::new(ErrorKind::InvalidBoolean(other))),
            },
            Type::INT16 => Value::Int16(self.buf.load()?),
            Type::UINT16 => Value::UInt16(self.buf.load()?),
            Type::INT32 => Value::Int32(self.buf.load()?),
            Type::UINT32 => Value::UInt32(self.buf.load()?),
            Type::INT64 => Value::Int64(self.buf.load()?),
            Type::UINT64 => Value::UInt64(self.buf.load()?),
            Type::DOUBLE => Value::Double(self.buf.load()?),
            Type::STRING => Value::Str(self.string()?.to_owned()),
            Type::OBJECT_PATH => Value::ObjectPath(ObjectPath::new(self.string()?)?),
            Type::SIGNATURE => Value::Signature(Signature::new(self.signature()?)?),
            Type::UNIX_FD => {
                let index = self.buf.load::<u32>()?;

                let Some(fd) = self.fds.get(index as usize) else {
                    return Err(Error::new(ErrorKind::InvalidUnixFd(index)));
                };

                Value::UnixFd(*fd)
            }
            Type::ARRAY => self.array(ty, depth)?,
            Type::OPEN_PAREN => {
                self.buf.align(8)?;

                let mut fields = Vec::new();

                for field_ty in Iter::new(&ty[1..ty.len() - 1]) {
                    fields.push(self.value(field_ty, depth + 1)?);
                }

                Value::Struct(fields)
            }
            Type::OPEN_BRACE => {
                self.buf.align(8)?;

                let mut types = Iter::new(&ty[1..ty.len() - 1]);

                let (Some(key_ty), Some(value_ty)) = (types.next(), types.next()) else {
                    return Err(mismatch(ty));
                };

                let key = self.value(key_ty, depth + 1)?;
                let value = self.value(value_ty, depth + 1)?;
                Value::DictEntry(Box::new((key, value)))
            }
            Type::VARIANT => {
                let signature = Signature::new_single(self.signature()?)?;
                let inner = self.value(signature.as_str(), depth + 1)?;
                Value::Variant(Box::new(inner))
            }
            _ => return Err(mismatch(ty)),
        };

        Ok(value)
    }

    fn string(&mut self) -> Result<&str> {
        let len = self.buf.load::<u32>()?;
        let bytes = self.buf.take_nul_terminated(len as usize)?;
        Ok(std::str::from_utf8(bytes)?)
    }

    fn signature(&mut self) -> Result<&[u8]> {
        let len = self.buf.load::<u8>()?;
        self.buf.take_nul_terminated(usize::from(len))
    }

    fn array(&mut self, ty: &str, depth: usize) -> Result<Value> {
        let element = &ty[1..];
        let length = self.buf.load::<u32>()?;

        if length > MAX_ARRAY_LENGTH {
            return Err(Error::new(ErrorKind::ArrayTooLong(length)));
        }

        self.buf
            .align(Type::new(element.as_bytes()[0]).alignment())?;

        let end = self.buf.position() + length as usize;

        if end > self.buf.len() {
            return Err(Error::new(ErrorKind::BufferUnderflow));
        }

        let mut items = Vec::new();

        while self.buf.position() < end {
            items.push(self.value(element, depth + 1)?);
        }

        if self.buf.position() != end {
            return Err(Error::new(ErrorKind::ArrayLengthMismatch));
        }

        let element = Signature::new_unchecked(element.to_owned());
        Ok(Value::Array(Array::from_raw(element, items)))
    }
}

#[inline]
fn mismatch(expected: &str) -> Error {
    Error::new(ErrorKind::ValueMismatch {
        expected: expected.into(),
    })
}
