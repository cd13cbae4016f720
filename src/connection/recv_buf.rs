use std::mem;
use std::num::NonZeroUsize;

use crate::error::Result;
use crate::message::frame_length;
use crate::proto::HEADER_LENGTH;
use crate::value::RawFd;
use crate::Message;

/// Buffer used for receiving messages through D-Bus.
///
/// Bytes are appended as they arrive and complete frames are sliced off one
/// at a time through [`RecvBuf::next_message`], so frames may be split across
/// reads arbitrarily.
///
/// # Examples
///
/// ```
/// use dbus_engine::{Message, RecvBuf};
///
/// let call = Message::method_call("/org/freedesktop/DBus", "Hello")?
///     .with_serial(std::num::NonZeroU32::MIN);
/// let frame = call.encode()?;
///
/// let mut recv = RecvBuf::new();
/// let (head, tail) = frame.split_at(10);
///
/// recv.extend_from_slice(head);
/// assert!(recv.next_message()?.is_none());
///
/// recv.extend_from_slice(tail);
/// assert_eq!(recv.next_message()?, Some(call));
/// assert!(recv.next_message()?.is_none());
/// # Ok::<_, dbus_engine::Error>(())
/// ```
pub struct RecvBuf {
    buf: Vec<u8>,
    /// Length of the frame at the head of the buffer, once its header has
    /// been received.
    frame: Option<NonZeroUsize>,
    /// Descriptors received alongside the bytes of the next frame.
    unix_fds: Vec<RawFd>,
}

impl RecvBuf {
    /// Construct a new receive buffer.
    pub fn new() -> Self {
        Self {
            buf: Vec::new(),
            frame: None,
            unix_fds: Vec::new(),
        }
    }

    /// Append received bytes.
    #[inline]
    pub fn extend_from_slice(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Queue descriptors received out of band. They're attached to the next
    /// frame which completes.
    pub fn push_unix_fds(&mut self, fds: &[RawFd]) {
        self.unix_fds.extend_from_slice(fds);
    }

    /// The number of buffered bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Test if no bytes are buffered.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Decode the next complete message, if one has been buffered.
    ///
    /// Errors are fatal: the stream can't be resynchronized after a frame
    /// failed to decode.
    pub fn next_message(&mut self) -> Result<Option<Message>> {
        let length = match self.frame {
            Some(length) => length.get(),
            None => {
                if self.buf.len() < HEADER_LENGTH {
                    return Ok(None);
                }

                let length = frame_length(&self.buf[..HEADER_LENGTH])?;
                self.frame = NonZeroUsize::new(length);
                length
            }
        };

        if self.buf.len() < length {
            return Ok(None);
        }

        self.frame = None;
        let fds = mem::take(&mut self.unix_fds);
        let frame = self.buf.drain(..length).collect::<Vec<u8>>();
        Message::parse_with_fds(&frame, &fds).map(Some)
    }
}

impl Default for RecvBuf {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}
