use crate::frame::Frame;
use crate::proto::Endianness;

use super::padding_to;

/// An append-only buffer which keeps track of wire alignment.
///
/// Offsets are measured from the start of the buffer, which must itself sit
/// on an 8-byte boundary in the final message. Both the primary header and a
/// message body satisfy that.
pub(crate) struct WriteBuf {
    data: Vec<u8>,
    endianness: Endianness,
}

impl WriteBuf {
    /// Construct a new empty buffer writing in the given byte order.
    pub(crate) fn new(endianness: Endianness) -> Self {
        Self {
            data: Vec::new(),
            endianness,
        }
    }

    /// The byte order of the buffer.
    #[inline]
    pub(crate) fn endianness(&self) -> Endianness {
        self.endianness
    }

    /// The number of bytes written so far.
    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.data.len()
    }

    /// Pad with zeros up to the given alignment.
    #[inline]
    pub(crate) fn align(&mut self, align: usize) {
        let padding = padding_to(align, self.data.len());
        self.data.resize(self.data.len() + padding, 0);
    }

    /// Align and store a number.
    #[inline]
    pub(crate) fn store<T>(&mut self, value: T)
    where
        T: Frame,
    {
        self.align(T::SIZE);
        value.store(self.endianness, &mut self.data);
    }

    /// Append raw bytes without alignment.
    #[inline]
    pub(crate) fn extend_from_slice(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }

    /// Overwrite a previously stored `u32` at `at`.
    pub(crate) fn patch_u32(&mut self, at: usize, value: u32) {
        let mut bytes = Vec::with_capacity(4);
        value.store(self.endianness, &mut bytes);
        self.data[at..at + 4].copy_from_slice(&bytes);
    }

    /// Get the written bytes.
    #[inline]
    pub(crate) fn get(&self) -> &[u8] {
        &self.data
    }

    /// Convert into the written bytes.
    #[inline]
    pub(crate) fn into_vec(self) -> Vec<u8> {
        self.data
    }
}
