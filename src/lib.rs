//! A client-side D-Bus protocol engine for Tokio.
//!
//! This crate implements the parts of D-Bus a client needs to talk to a bus:
//! * The SASL handshake in [`sasl`], supporting `EXTERNAL`,
//!   `DBUS_COOKIE_SHA1` and `ANONYMOUS`.
//! * The signature driven wire codec in [`marshal`] over dynamically typed
//!   [`Value`]s.
//! * The message envelope [`Message`].
//! * Framing and call correlation in [`Connection`].
//!
//! # Examples
//!
//! ```no_run
//! use dbus_engine::{Connection, Message};
//!
//! # #[tokio::main] async fn main() -> dbus_engine::Result<()> {
//! let c = Connection::session_bus().await?;
//!
//! let call = Message::method_call("/org/freedesktop/DBus", "GetId")?
//!     .with_interface("org.freedesktop.DBus")?
//!     .with_destination("org.freedesktop.DBus")?;
//!
//! let reply = c.call(&call).await?;
//! println!("Bus id: {:?}", reply.as_str());
//! # Ok(()) }
//! ```

#[doc(inline)]
pub use self::error::{Error, ErrorKind, RemoteError, Result};
mod error;

pub mod proto;

mod buf;

mod frame;

#[doc(inline)]
pub use self::signature::{Signature, SignatureError};
pub mod signature;

#[doc(inline)]
pub use self::object_path::{ObjectPath, ObjectPathError};
pub mod object_path;

pub mod names;

#[doc(inline)]
pub use self::value::{Array, Value};
pub mod value;

pub mod marshal;

#[doc(inline)]
pub use self::message::{Message, MessageKind};
mod message;

pub mod sasl;

mod sys;

#[doc(inline)]
pub use self::connection::{Address, Connection, ConnectionBuilder, RecvBuf, Reply, SendBuf};
mod connection;

pub mod org_freedesktop_dbus;
