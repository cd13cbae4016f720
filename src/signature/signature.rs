use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

use super::validation::{complete_type_len, validate};
use super::{Iter, SignatureError};

/// A validated D-Bus signature.
///
/// # Examples
///
/// ```
/// use dbus_engine::Signature;
///
/// let sig = Signature::new("a{sv}i")?;
/// assert_eq!(sig.iter().collect::<Vec<_>>(), ["a{sv}", "i"]);
///
/// assert!(Signature::new("a{vs}").is_err());
/// # Ok::<_, dbus_engine::SignatureError>(())
/// ```
#[derive(Default, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct Signature(Box<str>);

impl Signature {
    /// Construct a new signature, validating it against the type grammar.
    pub fn new(signature: impl AsRef<[u8]>) -> Result<Self, SignatureError> {
        let bytes = signature.as_ref();
        validate(bytes)?;
        // Every valid type code is ASCII.
        Ok(Self(String::from_utf8_lossy(bytes).into()))
    }

    /// Construct a signature which must hold exactly one complete type, as
    /// required for the signature of a variant.
    pub fn new_single(signature: impl AsRef<[u8]>) -> Result<Self, SignatureError> {
        let signature = Self::new(signature)?;

        if !signature.is_single_complete_type() {
            return Err(SignatureError::NotSingleCompleteType);
        }

        Ok(signature)
    }

    /// Construct a signature from a string that is known to be valid.
    #[inline]
    pub(crate) fn new_unchecked(signature: String) -> Self {
        Self(signature.into())
    }

    /// The empty signature.
    #[inline]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Test if the signature is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The length of the signature in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Get the signature as a string.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Get the signature as bytes.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// Test if the signature holds exactly one complete type.
    pub fn is_single_complete_type(&self) -> bool {
        complete_type_len(self.as_bytes()) == Some(self.len())
    }

    /// Iterate over each single complete type in the signature.
    #[inline]
    pub fn iter(&self) -> Iter<'_> {
        Iter::new(&self.0)
    }
}

impl fmt::Display for Signature {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl fmt::Debug for Signature {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Signature").field(&self.0).finish()
    }
}

impl FromStr for Signature {
    type Err = SignatureError;

    #[inline]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<&str> for Signature {
    type Error = SignatureError;

    #[inline]
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl AsRef<str> for Signature {
    #[inline]
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Signature {
    #[inline]
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for Signature {
    #[inline]
    fn eq(&self, other: &str) -> bool {
        *self.0 == *other
    }
}

impl PartialEq<&str> for Signature {
    #[inline]
    fn eq(&self, other: &&str) -> bool {
        *self.0 == **other
    }
}
