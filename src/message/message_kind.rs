use std::num::NonZeroU32;

use crate::proto::MessageType;
use crate::ObjectPath;

/// The kind of a D-Bus message, carrying the header fields which are
/// required for it.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum MessageKind {
    /// Method call. This message type may prompt a reply.
    MethodCall {
        /// The path being called.
        path: ObjectPath,
        /// The member being called.
        member: Box<str>,
    },
    /// Method reply with returned data.
    MethodReturn {
        /// The serial this is a reply to.
        reply_serial: NonZeroU32,
    },
    /// Error reply. If the first argument exists and is a string, it is an
    /// error message.
    Error {
        /// The name of the error.
        error_name: Box<str>,
        /// The serial this is a reply to.
        reply_serial: NonZeroU32,
    },
    /// Signal emission. Signals also require an interface, which is stored
    /// on the message.
    Signal {
        /// The object the signal is emitted from.
        path: ObjectPath,
        /// The member being signalled.
        member: Box<str>,
    },
}

impl MessageKind {
    /// The wire type of the message.
    pub fn message_type(&self) -> MessageType {
        match self {
            MessageKind::MethodCall { .. } => MessageType::METHOD_CALL,
            MessageKind::MethodReturn { .. } => MessageType::METHOD_RETURN,
            MessageKind::Error { .. } => MessageType::ERROR,
            MessageKind::Signal { .. } => MessageType::SIGNAL,
        }
    }

    /// The serial this message replies to, if it's a reply.
    pub fn reply_serial(&self) -> Option<NonZeroU32> {
        match *self {
            MessageKind::MethodReturn { reply_serial }
            | MessageKind::Error { reply_serial, .. } => Some(reply_serial),
            _ => None,
        }
    }
}
