use std::env;
use std::path::{Path, PathBuf};

use crate::error::{Error, ErrorKind, Result};

pub(crate) const ENV_SESSION_BUS: &str = "DBUS_SESSION_BUS_ADDRESS";
pub(crate) const ENV_SYSTEM_BUS: &str = "DBUS_SYSTEM_BUS_ADDRESS";
pub(crate) const DEFAULT_SYSTEM_BUS: &str = "unix:path=/var/run/dbus/system_bus_socket";

/// A parsed bus address.
///
/// Only the `unix:path=<socket>` transport is supported. If the address lists
/// several entries separated by `;`, the first supported one is used.
///
/// # Examples
///
/// ```
/// use dbus_engine::Address;
///
/// let address = Address::parse("unix:path=/run/user/1000/bus,guid=1234abcd")?;
/// assert_eq!(address.path(), std::path::Path::new("/run/user/1000/bus"));
/// assert_eq!(address.guid(), Some("1234abcd"));
///
/// assert!(Address::parse("tcp:host=localhost,port=1234").is_err());
/// # Ok::<_, dbus_engine::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    path: PathBuf,
    guid: Option<Box<str>>,
}

impl Address {
    /// Parse an address string.
    pub fn parse(address: &str) -> Result<Self> {
        for entry in address.split(';') {
            let Some((transport, rest)) = entry.split_once(':') else {
                continue;
            };

            if transport != "unix" {
                continue;
            }

            let mut path = None;
            let mut guid = None;

            for pair in rest.split(',').filter(|pair| !pair.is_empty()) {
                let Some((key, value)) = pair.split_once('=') else {
                    return Err(Error::new(ErrorKind::InvalidAddress));
                };

                let value = unescape(value)?;

                match key {
                    "path" => path = Some(PathBuf::from(value)),
                    "guid" => guid = Some(value.into_boxed_str()),
                    _ => {}
                }
            }

            if let Some(path) = path {
                return Ok(Self { path, guid });
            }
        }

        Err(Error::new(ErrorKind::InvalidAddress))
    }

    /// The address of the session bus, taken from the environment.
    pub fn session_bus() -> Result<Self> {
        Self::from_env(ENV_SESSION_BUS, None)
    }

    /// The address of the system bus, taken from the environment or the
    /// well-known default.
    pub fn system_bus() -> Result<Self> {
        Self::from_env(ENV_SYSTEM_BUS, Some(DEFAULT_SYSTEM_BUS))
    }

    fn from_env(key: &str, default: Option<&str>) -> Result<Self> {
        match env::var(key) {
            Ok(address) => Self::parse(&address),
            Err(..) => match default {
                Some(default) => Self::parse(default),
                None => Err(Error::new(ErrorKind::MissingBus)),
            },
        }
    }

    /// The path of the unix socket.
    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The GUID the server is expected to report, if the address names one.
    #[inline]
    pub fn guid(&self) -> Option<&str> {
        self.guid.as_deref()
    }
}

/// Decode `%xx` escapes in an address value.
fn unescape(value: &str) -> Result<String> {
    let mut out = Vec::with_capacity(value.len());
    let mut bytes = value.bytes();

    while let Some(b) = bytes.next() {
        if b != b'%' {
            out.push(b);
            continue;
        }

        let (Some(hi), Some(lo)) = (bytes.next(), bytes.next()) else {
            return Err(Error::new(ErrorKind::InvalidAddress));
        };

        let mut decoded = [0u8; 1];
        hex::decode_to_slice([hi, lo], &mut decoded)
            .map_err(|_| Error::new(ErrorKind::InvalidAddress))?;
        out.push(decoded[0]);
    }

    String::from_utf8(out).map_err(|_| Error::new(ErrorKind::InvalidAddress))
}
