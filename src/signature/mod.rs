//! Validated D-Bus type signatures.


pub use self::signature::Signature;
mod signature;

pub use self::signature_error::SignatureError;
mod signature_error;

pub use self::iter::Iter;
mod iter;

mod validation;

/// The maximum length of a signature plus one.
pub(crate) const MAX_SIGNATURE: usize = 256;

/// The maximum nesting of arrays, and separately of structs and dict
/// entries, inside of a signature.
pub(crate) const MAX_CONTAINER_DEPTH: usize = 32;
