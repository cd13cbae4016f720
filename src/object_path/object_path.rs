use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

use super::{validate, Iter, ObjectPathError, LOCAL_PATH};

/// A validated object path.
///
/// The following rules define a [valid object path]. Implementations must not
/// send or accept messages with invalid object paths.
///
/// [valid object path]: https://dbus.freedesktop.org/doc/dbus-specification.html#message-protocol-marshaling-object-path
///
/// * The path may be of any length.
/// * The path must begin with an ASCII '/' (integer 47) character, and must
///   consist of elements separated by slash characters.
/// * Each element must only contain the ASCII characters "[A-Z][a-z][0-9]_"
/// * No element may be the empty string.
/// * Multiple '/' characters cannot occur in sequence.
/// * A trailing '/' character is not allowed unless the path is the root path
///   (a single '/' character).
///
/// # Examples
///
/// ```
/// use dbus_engine::ObjectPath;
///
/// let path = ObjectPath::new("/org/freedesktop/DBus")?;
/// assert_eq!(path.iter().collect::<Vec<_>>(), ["org", "freedesktop", "DBus"]);
///
/// assert!(ObjectPath::new("/org//freedesktop").is_err());
/// assert!(ObjectPath::new("/org/").is_err());
/// # Ok::<_, dbus_engine::ObjectPathError>(())
/// ```
#[derive(Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct ObjectPath(Box<str>);

impl ObjectPath {
    /// Construct a new validated object path.
    pub fn new(path: impl AsRef<str>) -> Result<Self, ObjectPathError> {
        let path = path.as_ref();

        if !validate(path.as_bytes()) {
            return Err(ObjectPathError);
        }

        Ok(Self(path.into()))
    }

    /// The root path `/`.
    #[inline]
    pub fn root() -> Self {
        Self("/".into())
    }

    /// Get the path as a string.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Test if this is the reserved `/org/freedesktop/DBus/Local` path.
    #[inline]
    pub fn is_local(&self) -> bool {
        *self.0 == *LOCAL_PATH
    }

    /// Iterate over the elements of the path.
    #[inline]
    pub fn iter(&self) -> Iter<'_> {
        Iter::new(&self.0)
    }
}

impl fmt::Display for ObjectPath {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl fmt::Debug for ObjectPath {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ObjectPath").field(&self.0).finish()
    }
}

impl FromStr for ObjectPath {
    type Err = ObjectPathError;

    #[inline]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<&str> for ObjectPath {
    type Error = ObjectPathError;

    #[inline]
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl AsRef<str> for ObjectPath {
    #[inline]
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ObjectPath {
    #[inline]
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for ObjectPath {
    #[inline]
    fn eq(&self, other: &str) -> bool {
        *self.0 == *other
    }
}

impl PartialEq<&str> for ObjectPath {
    #[inline]
    fn eq(&self, other: &&str) -> bool {
        *self.0 == **other
    }
}
