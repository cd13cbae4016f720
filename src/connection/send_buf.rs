use std::num::NonZeroU32;

use crate::error::{Error, ErrorKind, Result};
use crate::Message;

/// Buffer used for sending messages through D-Bus.
///
/// Owns the serial counter of a connection. Every message written through it
/// is assigned the next serial, skipping zero when the counter wraps.
pub struct SendBuf {
    buf: Vec<u8>,
    serial: u32,
}

impl SendBuf {
    /// Construct a new send buffer.
    pub fn new() -> Self {
        Self {
            buf: Vec::new(),
            serial: 0,
        }
    }

    /// Allocate the next serial.
    pub fn next_serial(&mut self) -> NonZeroU32 {
        self.serial = self.serial.wrapping_add(1);

        if self.serial == 0 {
            self.serial = 1;
        }

        NonZeroU32::new(self.serial).unwrap_or(NonZeroU32::MIN)
    }

    /// Write a `message` to the internal buffer and return the serial number
    /// assigned to it.
    ///
    /// Nothing is written if the message fails to encode. The buffered bytes
    /// are available through [`SendBuf::get`] until [`SendBuf::clear`] is
    /// called.
    pub fn write_message(&mut self, message: &Message) -> Result<NonZeroU32> {
        let serial = self.next_serial();
        let mut fds = Vec::new();
        let frame = message.encode_with(serial, &mut fds)?;

        if !fds.is_empty() {
            return Err(Error::new(ErrorKind::UnixFdsUnsupported));
        }

        self.buf.extend_from_slice(&frame);
        Ok(serial)
    }

    /// Get the bytes waiting to be sent.
    #[inline]
    pub fn get(&self) -> &[u8] {
        &self.buf
    }

    /// Test if the buffer is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Clear the buffer after its contents have been sent.
    #[inline]
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    #[cfg(test)]
    pub(crate) fn set_serial(&mut self, serial: u32) {
        self.serial = serial;
    }
}

impl Default for SendBuf {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}
