//! The connection: authentication, framing and dispatch over a byte stream.


pub use self::address::Address;
mod address;

pub use self::builder::ConnectionBuilder;
mod builder;

pub use self::connection::Connection;
mod connection;

mod handshake;

pub use self::recv_buf::RecvBuf;
mod recv_buf;

pub use self::reply::Reply;
mod reply;

pub use self::send_buf::SendBuf;
mod send_buf;
