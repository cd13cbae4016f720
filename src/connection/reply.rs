use crate::{Signature, Value};

/// The result of a method call.
///
/// A reply with no body is [`Reply::Empty`]. A reply carrying exactly one
/// value which isn't a struct is unwrapped into [`Reply::Single`]. Everything
/// else is returned as the ordered sequence of values in [`Reply::Multiple`].
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// The reply had no body.
    Empty,
    /// The reply carried a single non-struct value.
    Single(Value),
    /// The reply carried several values, or a single struct.
    Multiple(Vec<Value>),
}

impl Reply {
    pub(crate) fn from_body(signature: &Signature, mut body: Vec<Value>) -> Self {
        if body.is_empty() {
            return Reply::Empty;
        }

        if body.len() == 1 && !signature.as_str().starts_with('(') {
            if let Some(value) = body.pop() {
                return Reply::Single(value);
            }
        }

        Reply::Multiple(body)
    }

    /// Test if the reply had no body.
    #[inline]
    pub fn is_empty(&self) -> bool {
        matches!(self, Reply::Empty)
    }

    /// Access the single value of the reply.
    pub fn as_single(&self) -> Option<&Value> {
        match self {
            Reply::Single(value) => Some(value),
            _ => None,
        }
    }

    /// Access the reply as a string, if it's a single string value.
    pub fn as_str(&self) -> Option<&str> {
        self.as_single()?.as_str()
    }

    /// Convert into the full sequence of returned values.
    pub fn into_values(self) -> Vec<Value> {
        match self {
            Reply::Empty => Vec::new(),
            Reply::Single(value) => vec![value],
            Reply::Multiple(values) => values,
        }
    }
}
