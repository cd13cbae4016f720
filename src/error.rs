use std::error;
use std::fmt;
use std::io;
use std::str::Utf8Error;

use crate::names::NameKind;
use crate::{ObjectPathError, SignatureError, Value};

/// Result alias using an [`Error`] as the error type by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// An error raised by this crate.
#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
}

impl Error {
    #[inline]
    pub(crate) fn new(kind: ErrorKind) -> Error {
        Self { kind }
    }

    /// Access the kind of the error.
    #[inline]
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// Test if this error was raised while authenticating with the bus.
    pub fn is_authentication_failed(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::AuthenticationFailed(..)
                | ErrorKind::AuthLineTooLong(..)
                | ErrorKind::InvalidAuthCommand(..)
                | ErrorKind::UnexpectedAgreeUnixFd
                | ErrorKind::MissingGuid
                | ErrorKind::InvalidGuid
                | ErrorKind::GuidMismatch
        )
    }

    /// Test if this error was raised while marshalling or unmarshalling a
    /// message, or while validating the names that go into one.
    pub fn is_marshalling(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::Signature(..)
                | ErrorKind::ObjectPath(..)
                | ErrorKind::InvalidName(..)
                | ErrorKind::ReservedPath
                | ErrorKind::ReservedInterface
                | ErrorKind::ValueMismatch { .. }
                | ErrorKind::Utf8Error(..)
                | ErrorKind::BufferUnderflow
                | ErrorKind::NotNullTerminated
                | ErrorKind::InvalidBoolean(..)
                | ErrorKind::InvalidUnixFd(..)
                | ErrorKind::InvalidEndianness(..)
                | ErrorKind::InvalidProtocol(..)
                | ErrorKind::InvalidVersion(..)
                | ErrorKind::MissingPath
                | ErrorKind::MissingMember
                | ErrorKind::MissingInterface
                | ErrorKind::MissingErrorName
                | ErrorKind::MissingReplySerial
                | ErrorKind::ZeroSerial
                | ErrorKind::ArrayTooLong(..)
                | ErrorKind::BodyTooLong(..)
                | ErrorKind::MessageTooLong(..)
                | ErrorKind::ArrayLengthMismatch
                | ErrorKind::BodyLengthMismatch
                | ErrorKind::DepthExceeded
        )
    }

    /// Test if the connection was closed.
    pub fn is_connection_closed(&self) -> bool {
        matches!(self.kind, ErrorKind::ConnectionClosed)
    }

    /// Test if a call timed out waiting for its reply.
    pub fn is_timeout(&self) -> bool {
        matches!(self.kind, ErrorKind::Timeout)
    }

    /// Access the error reported by the remote end, if this is a remote
    /// error.
    pub fn as_remote(&self) -> Option<&RemoteError> {
        match &self.kind {
            ErrorKind::Remote(error) => Some(error),
            _ => None,
        }
    }
}

impl From<SignatureError> for Error {
    #[inline]
    fn from(error: SignatureError) -> Self {
        Self::new(ErrorKind::Signature(error))
    }
}

impl From<ObjectPathError> for Error {
    #[inline]
    fn from(error: ObjectPathError) -> Self {
        Self::new(ErrorKind::ObjectPath(error))
    }
}

impl From<io::Error> for Error {
    #[inline]
    fn from(error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::UnexpectedEof
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted => Self::new(ErrorKind::ConnectionClosed),
            _ => Self::new(ErrorKind::Io(error)),
        }
    }
}

impl From<Utf8Error> for Error {
    #[inline]
    fn from(error: Utf8Error) -> Self {
        Self::new(ErrorKind::Utf8Error(error))
    }
}

impl From<ErrorKind> for Error {
    #[inline]
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind)
    }
}

impl fmt::Display for Error {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.kind {
            ErrorKind::Io(error) => error.fmt(f),
            ErrorKind::Signature(error) => error.fmt(f),
            ErrorKind::ObjectPath(error) => error.fmt(f),
            ErrorKind::Utf8Error(error) => error.fmt(f),
            ErrorKind::AuthenticationFailed(reason) => {
                write!(f, "Authentication failed: {reason}")
            }
            ErrorKind::AuthLineTooLong(length) => {
                write!(
                    f,
                    "Authentication line of length {length} is too long (max is 16384)"
                )
            }
            ErrorKind::InvalidAuthCommand(line) => {
                write!(f, "Invalid authentication command `{line}`")
            }
            ErrorKind::UnexpectedAgreeUnixFd => {
                write!(f, "AGREE_UNIX_FD received without NEGOTIATE_UNIX_FD")
            }
            ErrorKind::MissingGuid => write!(f, "Missing GUID in OK message"),
            ErrorKind::InvalidGuid => write!(f, "Invalid GUID in OK message"),
            ErrorKind::GuidMismatch => write!(f, "Server GUID does not match address"),
            ErrorKind::InvalidName(kind, name) => write!(f, "Invalid {kind} `{name}`"),
            ErrorKind::ReservedPath => {
                write!(f, "The path /org/freedesktop/DBus/Local is reserved")
            }
            ErrorKind::ReservedInterface => {
                write!(f, "The interface org.freedesktop.DBus.Local is reserved")
            }
            ErrorKind::ValueMismatch { expected } => {
                write!(f, "Value does not match signature `{expected}`")
            }
            ErrorKind::BufferUnderflow => write!(f, "Buffer underflow"),
            ErrorKind::NotNullTerminated => write!(f, "String is not null terminated"),
            ErrorKind::InvalidBoolean(value) => write!(f, "Invalid boolean value {value}"),
            ErrorKind::InvalidUnixFd(index) => {
                write!(f, "Unix fd index {index} is out of bounds")
            }
            ErrorKind::InvalidEndianness(tag) => write!(f, "Invalid endianness tag {tag:#04x}"),
            ErrorKind::InvalidProtocol(ty) => write!(f, "Unknown message type {ty}"),
            ErrorKind::InvalidVersion(version) => {
                write!(f, "Unsupported protocol version {version}")
            }
            ErrorKind::MissingPath => write!(f, "Missing required PATH header"),
            ErrorKind::MissingMember => write!(f, "Missing required MEMBER header"),
            ErrorKind::MissingInterface => write!(f, "Missing required INTERFACE header"),
            ErrorKind::MissingErrorName => write!(f, "Missing required ERROR_NAME header"),
            ErrorKind::MissingReplySerial => write!(f, "Missing required REPLY_SERIAL header"),
            ErrorKind::ZeroSerial => write!(f, "Zero in header serial"),
            ErrorKind::ArrayTooLong(length) => {
                write!(f, "Array of length {length} is too long (max is 67108864)")
            }
            ErrorKind::BodyTooLong(length) => {
                write!(f, "Body of length {length} is too long (max is 134217728)")
            }
            ErrorKind::MessageTooLong(length) => {
                write!(
                    f,
                    "Message of length {length} is too long (max is 134217728)"
                )
            }
            ErrorKind::ArrayLengthMismatch => {
                write!(f, "Array elements overran the declared array length")
            }
            ErrorKind::BodyLengthMismatch => {
                write!(f, "Body values didn't match the declared body length")
            }
            ErrorKind::DepthExceeded => write!(f, "Exceeded maximum value nesting depth"),
            ErrorKind::Remote(error) => error.fmt(f),
            ErrorKind::ConnectionClosed => write!(f, "Connection closed"),
            ErrorKind::Timeout => write!(f, "Timed out waiting for reply"),
            ErrorKind::MissingBus => write!(f, "Missing session bus"),
            ErrorKind::InvalidAddress => write!(f, "Invalid d-bus address"),
            ErrorKind::UnixFdsUnsupported => {
                write!(f, "Unix file descriptors cannot be sent on this connection")
            }
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match &self.kind {
            ErrorKind::Io(error) => Some(error),
            ErrorKind::Signature(error) => Some(error),
            ErrorKind::ObjectPath(error) => Some(error),
            ErrorKind::Utf8Error(error) => Some(error),
            _ => None,
        }
    }
}

/// The kind of an [`Error`].
#[derive(Debug)]
#[non_exhaustive]
pub enum ErrorKind {
    /// An I/O error from the underlying transport.
    Io(io::Error),
    /// A malformed type signature.
    Signature(SignatureError),
    /// A malformed object path.
    ObjectPath(ObjectPathError),
    /// A string was not valid UTF-8.
    Utf8Error(Utf8Error),
    /// Authentication failed, all mechanisms were exhausted or the
    /// connection closed mid-handshake.
    AuthenticationFailed(Box<str>),
    /// The server sent an authentication line exceeding the maximum length.
    AuthLineTooLong(usize),
    /// The server sent an unrecognized authentication command.
    InvalidAuthCommand(Box<str>),
    /// `AGREE_UNIX_FD` arrived without us having asked for it.
    UnexpectedAgreeUnixFd,
    /// `OK` arrived without a GUID.
    MissingGuid,
    /// `OK` arrived with a GUID which isn't valid hex.
    InvalidGuid,
    /// The server GUID doesn't match the one in the bus address.
    GuidMismatch,
    /// A bus, interface, member or error name failed validation.
    InvalidName(NameKind, Box<str>),
    /// The reserved local path was used in an outgoing message.
    ReservedPath,
    /// The reserved local interface was used in an outgoing message.
    ReservedInterface,
    /// A value doesn't match the signature it's being marshalled as.
    ValueMismatch {
        /// The single complete type the value was expected to have.
        expected: Box<str>,
    },
    /// Tried to read past the end of a buffer.
    BufferUnderflow,
    /// A string was missing its trailing nul byte.
    NotNullTerminated,
    /// A boolean was neither 0 nor 1.
    InvalidBoolean(u32),
    /// A unix fd index referenced a descriptor which wasn't received.
    InvalidUnixFd(u32),
    /// The message endianness tag was neither `l` nor `B`.
    InvalidEndianness(u8),
    /// The message type is not known.
    InvalidProtocol(u8),
    /// The protocol version is not supported.
    InvalidVersion(u8),
    /// Missing required PATH header.
    MissingPath,
    /// Missing required MEMBER header.
    MissingMember,
    /// Missing required INTERFACE header.
    MissingInterface,
    /// Missing required ERROR_NAME header.
    MissingErrorName,
    /// Missing required REPLY_SERIAL header.
    MissingReplySerial,
    /// A serial was zero.
    ZeroSerial,
    /// An array exceeded the maximum array length.
    ArrayTooLong(u32),
    /// A body exceeded the maximum body length.
    BodyTooLong(u32),
    /// A marshalled message exceeded the maximum message length.
    MessageTooLong(usize),
    /// Array elements didn't end exactly at the declared array length.
    ArrayLengthMismatch,
    /// Body values didn't end exactly at the declared body length.
    BodyLengthMismatch,
    /// Values were nested too deeply.
    DepthExceeded,
    /// The remote end replied with an error.
    Remote(RemoteError),
    /// The connection was closed.
    ConnectionClosed,
    /// No reply arrived before the deadline.
    Timeout,
    /// No session bus address is configured.
    MissingBus,
    /// The bus address is malformed or uses an unsupported transport.
    InvalidAddress,
    /// A message carried unix fds over a connection which can't pass them.
    UnixFdsUnsupported,
}

/// An error reply received from the remote end of a method call.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteError {
    pub(crate) name: Box<str>,
    pub(crate) message: Box<str>,
    pub(crate) values: Vec<Value>,
}

impl RemoteError {
    /// Construct a remote error from the name and body of an error reply.
    ///
    /// The message is taken from the first body value if it's a string.
    pub(crate) fn new(name: &str, values: Vec<Value>) -> Self {
        let message = match values.first() {
            Some(Value::Str(message)) => message.as_str().into(),
            _ => "".into(),
        };

        Self {
            name: name.into(),
            message,
            values,
        }
    }

    /// The name of the error, like `org.freedesktop.DBus.Error.ServiceUnknown`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// A human readable message, empty if the error carried none.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Every value in the body of the error reply.
    pub fn values(&self) -> &[Value] {
        &self.values
    }
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "Remote error: {}", self.name)
        } else {
            write!(f, "Remote error: {}: {}", self.name, self.message)
        }
    }
}
