//! Aligned buffers used when marshalling the D-Bus wire format.

#[cfg(test)]
mod tests;

pub(crate) use self::read_buf::ReadBuf;
mod read_buf;

pub(crate) use self::write_buf::WriteBuf;
mod write_buf;

/// The maximum length of an array in bytes.
pub const MAX_ARRAY_LENGTH: u32 = 1u32 << 26;

/// The maximum length of a body in bytes.
pub const MAX_BODY_LENGTH: u32 = 1u32 << 27;

/// The maximum length of a complete marshalled message in bytes.
pub const MAX_MESSAGE_LENGTH: usize = 1usize << 27;

/// Calculate padding with the assumption that alignment is a power of two.
#[inline(always)]
pub(crate) fn padding_to(align: usize, len: usize) -> usize {
    let mask = align - 1;
    (align - (len & mask)) & mask
}
