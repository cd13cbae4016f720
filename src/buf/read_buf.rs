use crate::error::{Error, ErrorKind, Result};
use crate::frame::Frame;
use crate::proto::Endianness;

use super::padding_to;

/// A read cursor over a byte slice which keeps track of wire alignment.
///
/// Alignment is computed relative to the start of the slice, while reading
/// may start at any offset into it.
pub(crate) struct ReadBuf<'a> {
    data: &'a [u8],
    read: usize,
    endianness: Endianness,
}

impl<'a> ReadBuf<'a> {
    /// Construct a read buffer positioned at `offset` into `data`.
    pub(crate) fn new(data: &'a [u8], offset: usize, endianness: Endianness) -> Self {
        Self {
            data,
            read: offset,
            endianness,
        }
    }

    /// The byte order of the buffer.
    #[inline]
    pub(crate) fn endianness(&self) -> Endianness {
        self.endianness
    }

    /// The current read position.
    #[inline]
    pub(crate) fn position(&self) -> usize {
        self.read
    }

    /// The total length of the underlying slice.
    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.data.len()
    }

    /// Test if everything has been read.
    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.read >= self.data.len()
    }

    /// Skip padding up to the given alignment.
    ///
    /// Padding must be present in the buffer, but its content is not checked.
    pub(crate) fn align(&mut self, align: usize) -> Result<()> {
        let padding = padding_to(align, self.read);

        if self.read + padding > self.data.len() {
            return Err(Error::new(ErrorKind::BufferUnderflow));
        }

        self.read += padding;
        Ok(())
    }

    /// Align and load a number.
    pub(crate) fn load<T>(&mut self) -> Result<T>
    where
        T: Frame,
    {
        self.align(T::SIZE)?;
        let bytes = self.take(T::SIZE)?;
        Ok(T::load(bytes, self.endianness))
    }

    /// Take `len` unaligned bytes.
    pub(crate) fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let Some(end) = self.read.checked_add(len) else {
            return Err(Error::new(ErrorKind::BufferUnderflow));
        };

        let Some(bytes) = self.data.get(self.read..end) else {
            return Err(Error::new(ErrorKind::BufferUnderflow));
        };

        self.read = end;
        Ok(bytes)
    }

    /// Take `len` bytes followed by a mandatory nul terminator which is not
    /// included in the returned slice.
    pub(crate) fn take_nul_terminated(&mut self, len: usize) -> Result<&'a [u8]> {
        let bytes = self.take(len)?;

        match self.take(1)? {
            [0] => {}
            _ => return Err(Error::new(ErrorKind::NotNullTerminated)),
        }

        if bytes.contains(&0) {
            return Err(Error::new(ErrorKind::NotNullTerminated));
        }

        Ok(bytes)
    }
}
