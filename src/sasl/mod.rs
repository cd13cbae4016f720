//! Types related to SASL authentication which D-Bus performs.
//!
//! The handshake is implemented by the sans-IO [`Authenticator`], which is
//! fed the bytes received from the server and produces the bytes to send
//! back.

#[cfg(test)]
mod tests;

pub use self::authenticator::{Authenticated, Authenticator};
mod authenticator;

mod cookie;

use std::fmt;

use crate::error::{Error, ErrorKind, Result};

/// The maximum length of a single line sent by the server during
/// authentication.
pub const MAX_LINE_LENGTH: usize = 16384;

/// A server GUID received in the `OK` command.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Guid(Box<str>);

impl Guid {
    /// Parse a hex-encoded GUID.
    ///
    /// # Examples
    ///
    /// ```
    /// use dbus_engine::sasl::Guid;
    ///
    /// let guid = Guid::new("ae2f9b29b0e1e4c5dc8d5cbd65a5b5a0")?;
    /// assert_eq!(guid.as_str(), "ae2f9b29b0e1e4c5dc8d5cbd65a5b5a0");
    ///
    /// assert!(Guid::new("").is_err());
    /// assert!(Guid::new("not hex").is_err());
    /// # Ok::<_, dbus_engine::Error>(())
    /// ```
    pub fn new(guid: &str) -> Result<Self> {
        if guid.is_empty() {
            return Err(Error::new(ErrorKind::MissingGuid));
        }

        if hex::decode(guid).is_err() {
            return Err(Error::new(ErrorKind::InvalidGuid));
        }

        Ok(Self(guid.into()))
    }

    /// Get the GUID as a hex string.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Guid {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// An authentication mechanism.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Mechanism {
    /// Authenticate with the credentials of the connecting process.
    External,
    /// Challenge-response using a cookie shared through the home directory.
    CookieSha1,
    /// No authentication.
    Anonymous,
}

impl Mechanism {
    /// Mechanisms in the default order of preference.
    pub const DEFAULT: [Mechanism; 3] = [
        Mechanism::External,
        Mechanism::CookieSha1,
        Mechanism::Anonymous,
    ];

    /// The name of the mechanism as sent in `AUTH`.
    pub fn name(self) -> &'static str {
        match self {
            Mechanism::External => "EXTERNAL",
            Mechanism::CookieSha1 => "DBUS_COOKIE_SHA1",
            Mechanism::Anonymous => "ANONYMOUS",
        }
    }
}

impl fmt::Display for Mechanism {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A command sent by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Command<'a> {
    /// `OK <guid>`.
    Ok(&'a str),
    /// `REJECTED <mechanisms>`.
    Rejected(&'a str),
    /// `DATA <hex>`.
    Data(&'a str),
    /// `AGREE_UNIX_FD`.
    AgreeUnixFd,
    /// `ERROR <reason>`.
    Error(&'a str),
}

impl<'a> Command<'a> {
    /// Parse a line with its line terminator already removed.
    pub(crate) fn parse(line: &'a [u8]) -> Result<Self> {
        let Ok(line) = std::str::from_utf8(line) else {
            return Err(invalid_command(line));
        };

        let (command, rest) = match line.split_once(' ') {
            Some((command, rest)) => (command, rest.trim()),
            None => (line, ""),
        };

        match command {
            "OK" => Ok(Command::Ok(rest)),
            "REJECTED" => Ok(Command::Rejected(rest)),
            "DATA" => Ok(Command::Data(rest)),
            "AGREE_UNIX_FD" => Ok(Command::AgreeUnixFd),
            "ERROR" => Ok(Command::Error(rest)),
            _ => Err(invalid_command(line.as_bytes())),
        }
    }
}

fn invalid_command(line: &[u8]) -> Error {
    Error::new(ErrorKind::InvalidAuthCommand(
        String::from_utf8_lossy(line).into(),
    ))
}

/// The initial response for `EXTERNAL`: the user id as hex-encoded ASCII
/// decimal digits.
pub(crate) fn external_initial_response(uid: u32) -> String {
    hex::encode(uid.to_string())
}
