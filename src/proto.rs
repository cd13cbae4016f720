//! Low level details for the D-Bus protocol implementation.

use std::fmt;
use std::ops::{BitAnd, BitOr, BitXor};

pub use crate::buf::{MAX_ARRAY_LENGTH, MAX_BODY_LENGTH, MAX_MESSAGE_LENGTH};

/// Size of the fixed part of the primary header, including the length prefix
/// of the header field array.
pub const HEADER_LENGTH: usize = 16;

/// The protocol version spoken by this implementation.
pub const PROTOCOL_VERSION: u8 = 1;

macro_rules! raw_enum {
    (
        $(#[doc = $doc:literal])*
        #[repr($repr:ty)]
        $vis:vis enum $name:ident {
            $(
                $(#[$($variant_meta:meta)*])*
                $variant:ident = $value:expr
            ),* $(,)?
        }
    ) => {
        $(#[doc = $doc])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(transparent)]
        $vis struct $name(pub(crate) $repr);

        impl $name {
            $(
                $(#[$($variant_meta)*])*
                $vis const $variant: Self = Self($value);
            )*

            /// Construct from a raw value.
            #[inline]
            #[allow(unused)]
            pub(crate) const fn new(value: $repr) -> Self {
                Self(value)
            }

            /// Get the raw value.
            #[inline]
            #[allow(unused)]
            pub const fn get(self) -> $repr {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match *self {
                    $(Self::$variant => f.write_str(stringify!($variant)),)*
                    _ => write!(f, "INVALID({})", self.0),
                }
            }
        }
    }
}

macro_rules! raw_set {
    (
        $(#[doc = $doc:literal])*
        #[repr($repr:ty)]
        $vis:vis enum $name:ident {
            $(
                $(#[$($variant_meta:meta)*])*
                $variant:ident = $value:expr
            ),* $(,)?
        }
    ) => {
        $(#[doc = $doc])*
        #[derive(Default, Clone, Copy, PartialEq, Eq)]
        #[repr(transparent)]
        $vis struct $name(pub(crate) $repr);

        impl $name {
            $(
                $(#[$($variant_meta)*])*
                $vis const $variant: Self = Self($value);
            )*
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                struct Raw(&'static str);

                impl fmt::Debug for Raw {
                    #[inline]
                    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                        write!(f, "{}", self.0)
                    }
                }

                struct Bits($repr);

                impl fmt::Debug for Bits {
                    #[inline]
                    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                        write!(f, "{:b}", self.0)
                    }
                }

                let mut f = f.debug_set();

                let mut this = *self;

                $(
                    if this & Self::$variant {
                        f.entry(&Raw(stringify!($variant)));
                        this = this ^ Self::$variant;
                    }
                )*

                if this.0 != 0 {
                    f.entry(&Bits(this.0));
                }

                f.finish()
            }
        }
    }
}

raw_enum! {
    /// The endianness of a message.
    #[repr(u8)]
    pub enum Endianness {
        /// Little endian.
        LITTLE = b'l',
        /// Big endian.
        BIG = b'B',
    }
}

impl Endianness {
    /// Native endian.
    #[cfg(target_endian = "little")]
    pub const NATIVE: Self = Self::LITTLE;
    /// Native endian.
    #[cfg(target_endian = "big")]
    pub const NATIVE: Self = Self::BIG;

    /// Interpret an endianness tag, returning `None` if it's not one of the
    /// two valid markers.
    #[inline]
    pub(crate) fn from_tag(tag: u8) -> Option<Self> {
        match Self(tag) {
            Self::LITTLE => Some(Self::LITTLE),
            Self::BIG => Some(Self::BIG),
            _ => None,
        }
    }
}

impl Default for Endianness {
    #[inline]
    fn default() -> Self {
        Self::NATIVE
    }
}

raw_enum! {
    /// The type of a message.
    #[repr(u8)]
    pub enum MessageType {
        /// Method call. This message type may prompt a reply.
        METHOD_CALL = 1,
        /// Method reply with returned data.
        METHOD_RETURN = 2,
        /// Error reply. If the first argument exists and is a string, it is an
        /// error message.
        ERROR = 3,
        /// Signal emission.
        SIGNAL = 4,
    }
}

raw_set! {
    /// Flags inside of a D-Bus message.
    ///
    /// # Examples
    ///
    /// ```
    /// use dbus_engine::proto::Flags;
    /// let flags = Flags::EMPTY;
    /// assert!(!(flags & Flags::NO_REPLY_EXPECTED));
    ///
    /// let flags = Flags::EMPTY | Flags::NO_REPLY_EXPECTED;
    /// assert!(flags & Flags::NO_REPLY_EXPECTED);
    /// assert!(!(flags & Flags::NO_AUTO_START));
    /// ```
    #[repr(u8)]
    pub enum Flags {
        /// An empty set of flags.
        EMPTY = 0,
        /// This message does not expect method return replies or error replies,
        /// even if it is of a type that can have a reply; the reply should be
        /// omitted.
        NO_REPLY_EXPECTED = 1,
        /// The bus must not launch an owner for the destination name in response to
        /// this message.
        NO_AUTO_START = 2,
    }
}

impl Flags {
    /// Remove the given flags from the set.
    #[inline]
    #[must_use]
    pub fn without(self, other: Flags) -> Self {
        Self(self.0 & !other.0)
    }
}

impl BitOr<Flags> for Flags {
    type Output = Self;

    #[inline]
    fn bitor(self, rhs: Flags) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl BitAnd<Flags> for Flags {
    type Output = bool;

    #[inline]
    fn bitand(self, rhs: Flags) -> Self::Output {
        self.0 & rhs.0 != 0
    }
}

impl BitXor<Flags> for Flags {
    type Output = Self;

    #[inline]
    fn bitxor(self, rhs: Flags) -> Self::Output {
        Self(self.0 ^ rhs.0)
    }
}

raw_enum! {
    /// Codes used in the header field array.
    #[repr(u8)]
    pub enum HeaderField {
        /// The object to send a call to, or the object a signal is emitted
        /// from.
        PATH = 1,
        /// The interface to invoke a method call on, or that a signal is
        /// emitted from. Optional for method calls, required for signals.
        INTERFACE = 2,
        /// The member, either the method name or signal name.
        MEMBER = 3,
        /// The name of the error that occurred, for errors.
        ERROR_NAME = 4,
        /// The serial number of the message this message is a reply to.
        REPLY_SERIAL = 5,
        /// The name of the connection this message is intended for.
        DESTINATION = 6,
        /// Unique name of the sending connection. On a message bus this is
        /// filled in by the bus itself.
        SENDER = 7,
        /// The signature of the message body. If omitted, it is assumed to be
        /// the empty signature "" (i.e. the body must be 0-length).
        SIGNATURE = 8,
        /// The number of Unix file descriptors that accompany the message.
        UNIX_FDS = 9,
    }
}

raw_enum! {
    /// The type inside of a signature.
    #[repr(u8)]
    pub enum Type {
        /// 8-bit unsigned integer
        BYTE = b'y',
        /// Boolean value, 0 is FALSE and 1 is TRUE. Everything else is invalid.
        BOOLEAN = b'b',
        /// 16-bit signed integer
        INT16 = b'n',
        /// 16-bit unsigned integer
        UINT16 = b'q',
        /// 32-bit signed integer
        INT32 = b'i',
        /// 32-bit unsigned integer
        UINT32 = b'u',
        /// 64-bit signed integer
        INT64 = b'x',
        /// 64-bit unsigned integer
        UINT64 = b't',
        /// IEEE 754 double
        DOUBLE = b'd',
        /// UTF-8 string (must be valid UTF-8). Must be nul terminated and contain
        /// no other nul bytes.
        STRING = b's',
        /// Name of an object instance
        OBJECT_PATH = b'o',
        /// A type signature
        SIGNATURE = b'g',
        /// Array.
        ARRAY = b'a',
        /// Start of a struct.
        OPEN_PAREN = b'(',
        /// End of a struct.
        CLOSE_PAREN = b')',
        /// Variant type (the type of the value is part of the value itself).
        VARIANT = b'v',
        /// Start of a dict entry.
        OPEN_BRACE = b'{',
        /// End of a dict entry.
        CLOSE_BRACE = b'}',
        /// Unix file descriptor.
        UNIX_FD = b'h',
    }
}

impl Type {
    /// Alignment in bytes of values starting with this type code.
    pub(crate) const fn alignment(self) -> usize {
        match self {
            Type::INT16 | Type::UINT16 => 2,
            Type::BOOLEAN
            | Type::INT32
            | Type::UINT32
            | Type::STRING
            | Type::OBJECT_PATH
            | Type::ARRAY
            | Type::UNIX_FD => 4,
            Type::INT64 | Type::UINT64 | Type::DOUBLE | Type::OPEN_PAREN | Type::OPEN_BRACE => 8,
            _ => 1,
        }
    }

    /// Test if the type is a basic type, usable as a dict entry key.
    pub(crate) const fn is_basic(self) -> bool {
        matches!(
            self,
            Type::BYTE
                | Type::BOOLEAN
                | Type::INT16
                | Type::UINT16
                | Type::INT32
                | Type::UINT32
                | Type::INT64
                | Type::UINT64
                | Type::DOUBLE
                | Type::STRING
                | Type::OBJECT_PATH
                | Type::SIGNATURE
                | Type::UNIX_FD
        )
    }
}
