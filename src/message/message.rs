use std::num::NonZeroU32;

use crate::error::{Error, ErrorKind, Result};
use crate::names::{self, LOCAL_INTERFACE};
use crate::proto::{Endianness, Flags, MessageType};
use crate::{MessageKind, ObjectPath, Signature, Value};

/// A D-Bus message.
///
/// Outgoing messages are validated as they are built, so a message which
/// has been constructed can always be marshalled unless its body doesn't
/// fit the size limits of the protocol.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    /// The type of the message.
    pub(crate) kind: MessageKind,
    /// Serial of the message, assigned when it is sent.
    pub(crate) serial: Option<NonZeroU32>,
    /// Flags in the message.
    pub(crate) flags: Flags,
    /// The interface of the message.
    pub(crate) interface: Option<Box<str>>,
    /// The destination of the message.
    pub(crate) destination: Option<Box<str>>,
    /// The sender of the message.
    pub(crate) sender: Option<Box<str>>,
    /// The signature of the body.
    pub(crate) signature: Signature,
    /// The values in the body.
    pub(crate) body: Vec<Value>,
    /// The number of unix fds which accompanied the message.
    pub(crate) unix_fds: u32,
    /// The byte order the message is written in.
    pub(crate) endianness: Endianness,
}

impl Message {
    fn new(kind: MessageKind) -> Self {
        Self {
            kind,
            serial: None,
            flags: Flags::EMPTY,
            interface: None,
            destination: None,
            sender: None,
            signature: Signature::empty(),
            body: Vec::new(),
            unix_fds: 0,
            endianness: Endianness::NATIVE,
        }
    }

    /// Construct a method call.
    ///
    /// # Examples
    ///
    /// ```
    /// use dbus_engine::{Message, MessageKind};
    ///
    /// let m = Message::method_call("/org/freedesktop/DBus", "Hello")?
    ///     .with_interface("org.freedesktop.DBus")?
    ///     .with_destination("org.freedesktop.DBus")?;
    ///
    /// assert!(matches!(m.kind(), MessageKind::MethodCall { .. }));
    /// assert_eq!(m.interface(), Some("org.freedesktop.DBus"));
    ///
    /// assert!(Message::method_call("/org/freedesktop/DBus/Local", "Hello").is_err());
    /// assert!(Message::method_call("/org/freedesktop/DBus", "Hello.World").is_err());
    /// # Ok::<_, dbus_engine::Error>(())
    /// ```
    pub fn method_call(path: &str, member: &str) -> Result<Self> {
        let path = outgoing_path(path)?;
        names::validate_member(member)?;

        Ok(Self::new(MessageKind::MethodCall {
            path,
            member: member.into(),
        }))
    }

    /// Construct a signal emitted from `path` on `interface`.
    ///
    /// # Examples
    ///
    /// ```
    /// use dbus_engine::Message;
    ///
    /// let m = Message::signal("/se/tedro/Example", "se.tedro.Example", "Changed")?;
    /// assert_eq!(m.interface(), Some("se.tedro.Example"));
    /// assert_eq!(m.member(), Some("Changed"));
    /// # Ok::<_, dbus_engine::Error>(())
    /// ```
    pub fn signal(path: &str, interface: &str, member: &str) -> Result<Self> {
        let path = outgoing_path(path)?;
        outgoing_interface(interface)?;
        names::validate_member(member)?;

        let mut message = Self::new(MessageKind::Signal {
            path,
            member: member.into(),
        });

        message.interface = Some(interface.into());
        Ok(message)
    }

    /// Construct a [`MessageKind::MethodReturn`] replying to this message,
    /// with an empty body.
    ///
    /// The sender and destination of this message are swapped in the reply.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::num::NonZeroU32;
    ///
    /// use dbus_engine::{Message, MessageKind};
    ///
    /// let serial = NonZeroU32::new(7).unwrap();
    ///
    /// let call = Message::method_call("/org/freedesktop/DBus", "Hello")?
    ///     .with_sender(":1.131")?
    ///     .with_destination("org.freedesktop.DBus")?
    ///     .with_serial(serial);
    ///
    /// let reply = call.method_return()?;
    /// assert_eq!(reply.kind(), &MessageKind::MethodReturn { reply_serial: serial });
    /// assert_eq!(reply.destination(), call.sender());
    /// assert_eq!(reply.sender(), call.destination());
    /// # Ok::<_, dbus_engine::Error>(())
    /// ```
    pub fn method_return(&self) -> Result<Self> {
        let reply_serial = self.require_serial()?;
        Ok(self.reply(MessageKind::MethodReturn { reply_serial }))
    }

    /// Construct a [`MessageKind::Error`] replying to this message, with an
    /// empty body.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::num::NonZeroU32;
    ///
    /// use dbus_engine::{Message, MessageKind, Value};
    ///
    /// let call = Message::method_call("/org/freedesktop/DBus", "Hello")?
    ///     .with_serial(NonZeroU32::new(7).unwrap());
    ///
    /// let error = call
    ///     .error("org.freedesktop.DBus.Error.UnknownMethod")?
    ///     .with_body("s", vec![Value::from("no such method")])?;
    ///
    /// assert!(matches!(error.kind(), MessageKind::Error { .. }));
    /// assert_eq!(error.signature(), "s");
    /// # Ok::<_, dbus_engine::Error>(())
    /// ```
    pub fn error(&self, error_name: &str) -> Result<Self> {
        names::validate_error_name(error_name)?;
        let reply_serial = self.require_serial()?;

        Ok(self.reply(MessageKind::Error {
            error_name: error_name.into(),
            reply_serial,
        }))
    }

    fn reply(&self, kind: MessageKind) -> Self {
        let mut message = Self::new(kind);
        message.destination = self.sender.clone();
        message.sender = self.destination.clone();
        message.endianness = self.endianness;
        message
    }

    fn require_serial(&self) -> Result<NonZeroU32> {
        self.serial.ok_or_else(|| Error::new(ErrorKind::ZeroSerial))
    }

    /// Get the kind of the message.
    #[inline]
    pub fn kind(&self) -> &MessageKind {
        &self.kind
    }

    /// The wire type of the message.
    #[inline]
    pub fn message_type(&self) -> MessageType {
        self.kind.message_type()
    }

    /// Get the serial of the message, if one has been assigned.
    #[inline]
    pub fn serial(&self) -> Option<NonZeroU32> {
        self.serial
    }

    /// Modify the serial of the message.
    ///
    /// Serials are normally assigned by the connection sending the message.
    #[must_use]
    pub fn with_serial(self, serial: NonZeroU32) -> Self {
        Self {
            serial: Some(serial),
            ..self
        }
    }

    /// Get the serial this message is a reply to, if any.
    #[inline]
    pub fn reply_serial(&self) -> Option<NonZeroU32> {
        self.kind.reply_serial()
    }

    /// Get the flags of the message.
    #[inline]
    pub fn flags(&self) -> Flags {
        self.flags
    }

    /// Modify the flags of the message.
    ///
    /// # Examples
    ///
    /// ```
    /// use dbus_engine::proto::Flags;
    /// use dbus_engine::Message;
    ///
    /// let m = Message::method_call("/org/freedesktop/DBus", "Hello")?;
    /// assert_eq!(m.flags(), Flags::EMPTY);
    ///
    /// let m = m.with_flags(Flags::NO_REPLY_EXPECTED);
    /// assert!(m.flags() & Flags::NO_REPLY_EXPECTED);
    /// # Ok::<_, dbus_engine::Error>(())
    /// ```
    #[must_use]
    pub fn with_flags(self, flags: Flags) -> Self {
        Self { flags, ..self }
    }

    /// The path of a method call or signal.
    pub fn path(&self) -> Option<&ObjectPath> {
        match &self.kind {
            MessageKind::MethodCall { path, .. } | MessageKind::Signal { path, .. } => Some(path),
            _ => None,
        }
    }

    /// The member of a method call or signal.
    pub fn member(&self) -> Option<&str> {
        match &self.kind {
            MessageKind::MethodCall { member, .. } | MessageKind::Signal { member, .. } => {
                Some(member)
            }
            _ => None,
        }
    }

    /// The error name of an error.
    pub fn error_name(&self) -> Option<&str> {
        match &self.kind {
            MessageKind::Error { error_name, .. } => Some(error_name),
            _ => None,
        }
    }

    /// Get the interface of the message.
    #[inline]
    pub fn interface(&self) -> Option<&str> {
        self.interface.as_deref()
    }

    /// Modify the interface of the message.
    pub fn with_interface(self, interface: &str) -> Result<Self> {
        outgoing_interface(interface)?;

        Ok(Self {
            interface: Some(interface.into()),
            ..self
        })
    }

    /// Get the destination of the message.
    #[inline]
    pub fn destination(&self) -> Option<&str> {
        self.destination.as_deref()
    }

    /// Modify the destination of the message.
    pub fn with_destination(self, destination: &str) -> Result<Self> {
        names::validate_bus_name(destination)?;

        Ok(Self {
            destination: Some(destination.into()),
            ..self
        })
    }

    /// Get the sender of the message.
    ///
    /// On a message bus this is filled in by the bus.
    #[inline]
    pub fn sender(&self) -> Option<&str> {
        self.sender.as_deref()
    }

    /// Modify the sender of the message.
    pub fn with_sender(self, sender: &str) -> Result<Self> {
        names::validate_bus_name(sender)?;

        Ok(Self {
            sender: Some(sender.into()),
            ..self
        })
    }

    /// Get the signature of the body.
    #[inline]
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Get the values in the body.
    #[inline]
    pub fn body(&self) -> &[Value] {
        &self.body
    }

    /// Convert into the values in the body.
    #[inline]
    pub fn into_body(self) -> Vec<Value> {
        self.body
    }

    /// Modify the body of the message.
    ///
    /// Every value must have the type of the corresponding complete type in
    /// `signature`.
    ///
    /// # Examples
    ///
    /// ```
    /// use dbus_engine::{Message, Value};
    ///
    /// let m = Message::method_call("/org/freedesktop/DBus", "RequestName")?
    ///     .with_body("su", vec![Value::from("se.tedro.Example"), Value::from(4u32)])?;
    ///
    /// assert_eq!(m.signature(), "su");
    /// assert_eq!(m.body().len(), 2);
    ///
    /// let m = Message::method_call("/org/freedesktop/DBus", "RequestName")?;
    /// assert!(m.with_body("su", vec![Value::from("se.tedro.Example")]).is_err());
    /// # Ok::<_, dbus_engine::Error>(())
    /// ```
    pub fn with_body(self, signature: &str, body: Vec<Value>) -> Result<Self> {
        let signature = Signature::new(signature)?;

        let mut types = signature.iter();
        let mut values = body.iter();

        loop {
            match (types.next(), values.next()) {
                (Some(ty), Some(value)) if value.signature() == ty => {}
                (None, None) => break,
                _ => {
                    return Err(Error::new(ErrorKind::ValueMismatch {
                        expected: signature.as_str().into(),
                    }))
                }
            }
        }

        Ok(Self {
            signature,
            body,
            ..self
        })
    }

    /// The number of unix fds which accompanied a received message.
    #[inline]
    pub fn unix_fds(&self) -> u32 {
        self.unix_fds
    }

    /// The byte order of the message.
    #[inline]
    pub fn endianness(&self) -> Endianness {
        self.endianness
    }

    /// Modify the byte order the message is written in.
    #[must_use]
    pub fn with_endianness(self, endianness: Endianness) -> Self {
        Self { endianness, ..self }
    }
}

fn outgoing_path(path: &str) -> Result<ObjectPath> {
    let path = ObjectPath::new(path)?;

    if path.is_local() {
        return Err(Error::new(ErrorKind::ReservedPath));
    }

    Ok(path)
}

fn outgoing_interface(interface: &str) -> Result<()> {
    names::validate_interface(interface)?;

    if interface == LOCAL_INTERFACE {
        return Err(Error::new(ErrorKind::ReservedInterface));
    }

    Ok(())
}
