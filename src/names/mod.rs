//! Validation of bus, interface, member and error names.
//!
//! These are checked when a message is constructed, so an invalid name never
//! reaches the wire.

use std::fmt;

use crate::error::{Error, ErrorKind, Result};

#[cfg(test)]
mod tests;

/// The maximum length of any name.
const MAX_NAME: usize = 255;

/// The reserved local interface. Messages must never be sent with it.
pub const LOCAL_INTERFACE: &str = "org.freedesktop.DBus.Local";

/// The kind of name which failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum NameKind {
    /// A unique or well-known bus name.
    Bus,
    /// An interface name.
    Interface,
    /// A method or signal name.
    Member,
    /// An error name.
    Error,
}

impl fmt::Display for NameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NameKind::Bus => write!(f, "bus name"),
            NameKind::Interface => write!(f, "interface name"),
            NameKind::Member => write!(f, "member name"),
            NameKind::Error => write!(f, "error name"),
        }
    }
}

/// Validate an interface name like `org.freedesktop.DBus`.
pub fn validate_interface(name: &str) -> Result<()> {
    check(NameKind::Interface, name, is_dotted(name, false))
}

/// Validate an error name, which follows the interface name grammar.
pub fn validate_error_name(name: &str) -> Result<()> {
    check(NameKind::Error, name, is_dotted(name, false))
}

/// Validate a member name like `Hello`.
pub fn validate_member(name: &str) -> Result<()> {
    check(NameKind::Member, name, is_element(name.as_bytes(), false))
}

/// Validate a unique (`:1.42`) or well-known (`org.freedesktop.DBus`) bus
/// name.
pub fn validate_bus_name(name: &str) -> Result<()> {
    let valid = match name.strip_prefix(':') {
        Some(unique) => unique
            .split('.')
            .all(|element| is_bus_element(element.as_bytes(), true))
            && unique.contains('.'),
        None => is_dotted(name, true),
    };

    check(NameKind::Bus, name, valid)
}

fn check(kind: NameKind, name: &str, valid: bool) -> Result<()> {
    if !valid || name.len() > MAX_NAME {
        return Err(Error::new(ErrorKind::InvalidName(kind, name.into())));
    }

    Ok(())
}

/// At least two non-empty elements separated by `.`.
fn is_dotted(name: &str, bus: bool) -> bool {
    let mut count = 0;

    for element in name.split('.') {
        let valid = if bus {
            is_bus_element(element.as_bytes(), false)
        } else {
            is_element(element.as_bytes(), false)
        };

        if !valid {
            return false;
        }

        count += 1;
    }

    count >= 2
}

/// An element made of `[A-Za-z0-9_]` not starting with a digit unless
/// `digits` is set.
fn is_element(bytes: &[u8], digits: bool) -> bool {
    let [first, rest @ ..] = bytes else {
        return false;
    };

    (first.is_ascii_alphabetic() || *first == b'_' || digits && first.is_ascii_digit())
        && rest.iter().all(|b| b.is_ascii_alphanumeric() || *b == b'_')
}

/// Bus name elements additionally permit `-`.
fn is_bus_element(bytes: &[u8], digits: bool) -> bool {
    let [first, rest @ ..] = bytes else {
        return false;
    };

    (first.is_ascii_alphabetic()
        || matches!(first, b'_' | b'-')
        || digits && first.is_ascii_digit())
        && rest
            .iter()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-'))
}
