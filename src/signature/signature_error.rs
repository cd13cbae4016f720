use std::error;
use std::fmt;

/// Detailed errors raised when validation of a [`Signature`] fails.
///
/// [`Signature`]: crate::Signature
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SignatureError {
    /// A byte which isn't a known type code.
    UnknownTypeCode(u8),
    /// The signature is longer than 255 bytes.
    SignatureTooLong,
    /// An array code without an element type.
    MissingArrayElementType,
    /// A `)` without a matching `(`.
    StructEndedButNotStarted,
    /// A `}` without a matching `{`.
    DictEndedButNotStarted,
    /// A `(` without a matching `)`.
    StructStartedButNotEnded,
    /// A `{` without a matching `}`.
    DictStartedButNotEnded,
    /// A struct with no fields, like `()`.
    StructHasNoFields,
    /// A dict entry whose key is a container or a variant.
    DictKeyMustBeBasicType,
    /// A dict entry with no fields, like `a{}`.
    DictEntryHasNoFields,
    /// A dict entry with only a key.
    DictEntryHasOnlyOneField,
    /// A dict entry with more than a key and a value.
    DictEntryHasTooManyFields,
    /// A dict entry which isn't the element type of an array.
    DictEntryNotInsideArray,
    /// Arrays nested more than 32 levels deep.
    ExceededMaximumArrayRecursion,
    /// Structs nested more than 32 levels deep.
    ExceededMaximumStructRecursion,
    /// Dict entries nested more than 32 levels deep.
    ExceededMaximumDictRecursion,
    /// A signature expected to hold exactly one complete type held none or
    /// several.
    NotSingleCompleteType,
}

impl fmt::Display for SignatureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            SignatureError::UnknownTypeCode(code) => {
                write!(f, "Unknown type code: {:?}", char::from(code))
            }
            SignatureError::SignatureTooLong => write!(f, "Signature too long"),
            SignatureError::MissingArrayElementType => write!(f, "Missing array element type"),
            SignatureError::StructEndedButNotStarted => write!(f, "Struct ended but not started"),
            SignatureError::DictEndedButNotStarted => write!(f, "Dict ended but not started"),
            SignatureError::StructStartedButNotEnded => write!(f, "Struct started but not ended"),
            SignatureError::DictStartedButNotEnded => write!(f, "Dict started but not ended"),
            SignatureError::StructHasNoFields => write!(f, "Struct has no fields"),
            SignatureError::DictKeyMustBeBasicType => write!(f, "Dict key must be basic type"),
            SignatureError::DictEntryHasNoFields => write!(f, "Dict entry has no fields"),
            SignatureError::DictEntryHasOnlyOneField => {
                write!(f, "Dict entry has only one field")
            }
            SignatureError::DictEntryHasTooManyFields => {
                write!(f, "Dict entry has too many fields")
            }
            SignatureError::DictEntryNotInsideArray => write!(f, "Dict entry not inside array"),
            SignatureError::ExceededMaximumArrayRecursion => {
                write!(f, "Exceeded maximum array recursion")
            }
            SignatureError::ExceededMaximumStructRecursion => {
                write!(f, "Exceeded maximum struct recursion")
            }
            SignatureError::ExceededMaximumDictRecursion => {
                write!(f, "Exceeded maximum dict recursion")
            }
            SignatureError::NotSingleCompleteType => {
                write!(f, "Expected a single complete type")
            }
        }
    }
}

impl error::Error for SignatureError {}
