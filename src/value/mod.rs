//! Dynamically typed D-Bus values.

#[cfg(test)]
mod tests;

use crate::error::{Error, ErrorKind, Result};
use crate::{ObjectPath, Signature, SignatureError};

/// A raw file descriptor as referenced from the out-of-band list of a message.
pub type RawFd = i32;

/// A single D-Bus value.
///
/// Every variant corresponds to one type code. Containers carry enough type
/// information to compute their own signature, so an empty [`Array`] still
/// knows its element type.
///
/// # Examples
///
/// ```
/// use dbus_engine::{Signature, Value};
///
/// let value = Value::Struct(vec![Value::from(42u32), Value::from("hello")]);
/// assert_eq!(value.signature(), Signature::new("(us)")?);
/// # Ok::<_, dbus_engine::SignatureError>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// `y`: 8-bit unsigned integer.
    Byte(u8),
    /// `b`: boolean, marshalled as a 32-bit 0 or 1.
    Bool(bool),
    /// `n`: 16-bit signed integer.
    Int16(i16),
    /// `q`: 16-bit unsigned integer.
    UInt16(u16),
    /// `i`: 32-bit signed integer.
    Int32(i32),
    /// `u`: 32-bit unsigned integer.
    UInt32(u32),
    /// `x`: 64-bit signed integer.
    Int64(i64),
    /// `t`: 64-bit unsigned integer.
    UInt64(u64),
    /// `d`: IEEE 754 double.
    Double(f64),
    /// `s`: UTF-8 string.
    Str(String),
    /// `o`: object path.
    ObjectPath(ObjectPath),
    /// `g`: type signature.
    Signature(Signature),
    /// `h`: unix file descriptor, marshalled as an index into the
    /// out-of-band descriptor list of the message.
    UnixFd(RawFd),
    /// `a`: array of values sharing one element type.
    Array(Array),
    /// `(...)`: struct.
    Struct(Vec<Value>),
    /// `{..}`: dict entry, only valid as the element of an array.
    DictEntry(Box<(Value, Value)>),
    /// `v`: variant, a value carrying its own signature.
    Variant(Box<Value>),
}

impl Value {
    /// Construct a variant wrapping `value`.
    #[inline]
    pub fn variant(value: impl Into<Value>) -> Self {
        Value::Variant(Box::new(value.into()))
    }

    /// Construct a dict, an array of dict entries, from key-value pairs.
    ///
    /// # Examples
    ///
    /// ```
    /// use dbus_engine::Value;
    ///
    /// let dict = Value::dict("s", "v", [
    ///     (Value::from("answer"), Value::variant(42u32)),
    /// ])?;
    ///
    /// assert_eq!(dict.signature().as_str(), "a{sv}");
    /// # Ok::<_, dbus_engine::Error>(())
    /// ```
    pub fn dict<I>(key: &str, value: &str, entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (Value, Value)>,
    {
        let mut array = Array::new(element_signature(&format!("{{{key}{value}}}"))?)?;

        for (k, v) in entries {
            array.push(Value::DictEntry(Box::new((k, v))))?;
        }

        Ok(Value::Array(array))
    }

    /// Compute the single complete type signature of this value.
    pub fn signature(&self) -> Signature {
        let mut out = String::new();
        self.write_signature(&mut out);
        Signature::new_unchecked(out)
    }

    pub(crate) fn write_signature(&self, out: &mut String) {
        let code = match self {
            Value::Byte(..) => 'y',
            Value::Bool(..) => 'b',
            Value::Int16(..) => 'n',
            Value::UInt16(..) => 'q',
            Value::Int32(..) => 'i',
            Value::UInt32(..) => 'u',
            Value::Int64(..) => 'x',
            Value::UInt64(..) => 't',
            Value::Double(..) => 'd',
            Value::Str(..) => 's',
            Value::ObjectPath(..) => 'o',
            Value::Signature(..) => 'g',
            Value::UnixFd(..) => 'h',
            Value::Variant(..) => 'v',
            Value::Array(array) => {
                out.push('a');
                out.push_str(array.element.as_str());
                return;
            }
            Value::Struct(fields) => {
                out.push('(');

                for field in fields {
                    field.write_signature(out);
                }

                out.push(')');
                return;
            }
            Value::DictEntry(entry) => {
                out.push('{');
                entry.0.write_signature(out);
                entry.1.write_signature(out);
                out.push('}');
                return;
            }
        };

        out.push(code);
    }

    /// Get the value as a string slice, if it's a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(string) => Some(string),
            _ => None,
        }
    }

    /// Get the value as a `u32`, if it's one.
    pub fn as_u32(&self) -> Option<u32> {
        match *self {
            Value::UInt32(value) => Some(value),
            _ => None,
        }
    }

    /// Get the value as a `bool`, if it's one.
    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Value::Bool(value) => Some(value),
            _ => None,
        }
    }

    /// Get the value as an array, if it's one.
    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Value::Array(array) => Some(array),
            _ => None,
        }
    }

    /// Get the inner value of a variant, if it's one.
    pub fn as_variant(&self) -> Option<&Value> {
        match self {
            Value::Variant(value) => Some(value),
            _ => None,
        }
    }
}

/// Validate the element type of an array, which unlike a standalone
/// signature may be a dict entry.
fn element_signature(element: &str) -> Result<Signature, SignatureError> {
    let array = Signature::new(format!("a{element}"))?;

    if !array.is_single_complete_type() {
        return Err(SignatureError::NotSingleCompleteType);
    }

    Ok(Signature::new_unchecked(element.to_owned()))
}

/// An array of values of one element type.
#[derive(Debug, Clone, PartialEq)]
pub struct Array {
    element: Signature,
    items: Vec<Value>,
}

impl Array {
    /// Construct a new empty array whose elements have the given type.
    ///
    /// The element signature must be a single complete type. To construct
    /// an array of dict entries, use [`Array::from_items`] or
    /// [`Value::dict`].
    pub fn new(element: Signature) -> Result<Self, SignatureError> {
        let element = element_signature(element.as_str())?;

        Ok(Self {
            element,
            items: Vec::new(),
        })
    }

    /// Construct an array from an element signature and items.
    ///
    /// # Examples
    ///
    /// ```
    /// use dbus_engine::value::Array;
    /// use dbus_engine::Value;
    ///
    /// let array = Array::from_items("s", vec![Value::from("a"), Value::from("b")])?;
    /// assert_eq!(array.len(), 2);
    ///
    /// assert!(Array::from_items("s", vec![Value::from(1u32)]).is_err());
    /// # Ok::<_, dbus_engine::Error>(())
    /// ```
    pub fn from_items(element: &str, items: Vec<Value>) -> Result<Self> {
        let mut array = Self::new(element_signature(element)?)?;

        for item in items {
            array.push(item)?;
        }

        Ok(array)
    }

    /// Push an item, checking that it has the element type of the array.
    pub fn push(&mut self, item: Value) -> Result<()> {
        let mut signature = String::new();
        item.write_signature(&mut signature);

        if signature != self.element.as_str() {
            return Err(Error::new(ErrorKind::ValueMismatch {
                expected: self.element.as_str().into(),
            }));
        }

        self.items.push(item);
        Ok(())
    }

    /// Construct an array from parts which are known to be consistent.
    #[inline]
    pub(crate) fn from_raw(element: Signature, items: Vec<Value>) -> Self {
        Self { element, items }
    }

    /// The signature of each element.
    #[inline]
    pub fn element(&self) -> &Signature {
        &self.element
    }

    /// The items in the array.
    #[inline]
    pub fn items(&self) -> &[Value] {
        &self.items
    }

    /// Convert into the items of the array.
    #[inline]
    pub fn into_items(self) -> Vec<Value> {
        self.items
    }

    /// The number of items in the array.
    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Test if the array is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl From<Array> for Value {
    #[inline]
    fn from(value: Array) -> Self {
        Value::Array(value)
    }
}

macro_rules! impl_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                #[inline]
                fn from(value: $ty) -> Self {
                    Value::$variant(value)
                }
            }
        )*
    }
}

impl_from! {
    u8 => Byte,
    bool => Bool,
    i16 => Int16,
    u16 => UInt16,
    i32 => Int32,
    u32 => UInt32,
    i64 => Int64,
    u64 => UInt64,
    f64 => Double,
    String => Str,
    ObjectPath => ObjectPath,
    Signature => Signature,
}

impl From<&str> for Value {
    #[inline]
    fn from(value: &str) -> Self {
        Value::Str(value.to_owned())
    }
}
