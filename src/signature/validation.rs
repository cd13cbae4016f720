use crate::proto::Type;

use super::{SignatureError, MAX_CONTAINER_DEPTH, MAX_SIGNATURE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Array,
    Struct,
    Dict,
}

/// Validate a signature against the D-Bus type grammar.
pub(super) fn validate(bytes: &[u8]) -> Result<(), SignatureError> {
    use SignatureError::*;

    if bytes.len() >= MAX_SIGNATURE {
        return Err(SignatureTooLong);
    }

    // Open containers along with the number of complete types seen inside.
    let mut stack = Vec::<(Kind, usize)>::new();
    let mut arrays = 0;
    let mut structs = 0;
    let mut dicts = 0;

    for &b in bytes {
        let t = Type::new(b);

        let is_basic = match t {
            Type::VARIANT => false,
            Type::ARRAY => {
                if arrays == MAX_CONTAINER_DEPTH {
                    return Err(ExceededMaximumArrayRecursion);
                }

                arrays += 1;
                stack.push((Kind::Array, 0));
                continue;
            }
            Type::OPEN_PAREN => {
                if structs == MAX_CONTAINER_DEPTH {
                    return Err(ExceededMaximumStructRecursion);
                }

                structs += 1;
                stack.push((Kind::Struct, 0));
                continue;
            }
            Type::CLOSE_PAREN => {
                match stack.pop() {
                    Some((Kind::Struct, 0)) => return Err(StructHasNoFields),
                    Some((Kind::Struct, _)) => {}
                    Some((Kind::Array, _)) => return Err(MissingArrayElementType),
                    _ => return Err(StructEndedButNotStarted),
                }

                structs -= 1;
                false
            }
            Type::OPEN_BRACE => {
                if !matches!(stack.last(), Some((Kind::Array, _))) {
                    return Err(DictEntryNotInsideArray);
                }

                if dicts == MAX_CONTAINER_DEPTH {
                    return Err(ExceededMaximumDictRecursion);
                }

                dicts += 1;
                stack.push((Kind::Dict, 0));
                continue;
            }
            Type::CLOSE_BRACE => {
                match stack.pop() {
                    Some((Kind::Dict, 0)) => return Err(DictEntryHasNoFields),
                    Some((Kind::Dict, 1)) => return Err(DictEntryHasOnlyOneField),
                    Some((Kind::Dict, _)) => {}
                    Some((Kind::Array, _)) => return Err(MissingArrayElementType),
                    _ => return Err(DictEndedButNotStarted),
                }

                dicts -= 1;
                false
            }
            t if t.is_basic() => true,
            t => return Err(UnknownTypeCode(t.get())),
        };

        // A complete type closes every array waiting for an element.
        let mut is_basic = is_basic;

        while let Some((Kind::Array, _)) = stack.last() {
            stack.pop();
            arrays -= 1;
            is_basic = false;
        }

        if let Some((kind, n)) = stack.last_mut() {
            if *kind == Kind::Dict {
                match *n {
                    0 if !is_basic => return Err(DictKeyMustBeBasicType),
                    2 => return Err(DictEntryHasTooManyFields),
                    _ => {}
                }
            }

            *n += 1;
        }
    }

    match stack.pop() {
        Some((Kind::Array, _)) => Err(MissingArrayElementType),
        Some((Kind::Struct, _)) => Err(StructStartedButNotEnded),
        Some((Kind::Dict, _)) => Err(DictStartedButNotEnded),
        None => Ok(()),
    }
}

/// Length in bytes of the first complete type in an already validated
/// signature, or `None` if it's empty.
pub(crate) fn complete_type_len(bytes: &[u8]) -> Option<usize> {
    let mut depth = 0usize;

    for (n, &b) in bytes.iter().enumerate() {
        match b {
            b'a' => continue,
            b'(' | b'{' => depth += 1,
            b')' | b'}' => depth = depth.checked_sub(1)?,
            _ => {}
        }

        if depth == 0 {
            return Some(n + 1);
        }
    }

    None
}
