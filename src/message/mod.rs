//! The message envelope: typed message kinds, header fields and bodies.

#[cfg(test)]
mod tests;

pub use self::message_kind::MessageKind;
mod message_kind;

pub use self::message::Message;
mod message;

pub(crate) use self::wire::frame_length;
mod wire;
