use crate::proto::Endianness;

/// A fixed-size number which can be stored in the protocol in either byte
/// order.
pub(crate) trait Frame: Copy {
    /// Alignment and size of the frame in bytes.
    const SIZE: usize;

    /// Append the frame to `out` in the given byte order.
    fn store(self, endianness: Endianness, out: &mut Vec<u8>);

    /// Load the frame from exactly [`Frame::SIZE`] bytes.
    fn load(bytes: &[u8], endianness: Endianness) -> Self;
}

macro_rules! impl_number {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Frame for $ty {
                const SIZE: usize = std::mem::size_of::<$ty>();

                #[inline]
                fn store(self, endianness: Endianness, out: &mut Vec<u8>) {
                    if endianness == Endianness::LITTLE {
                        out.extend_from_slice(&self.to_le_bytes());
                    } else {
                        out.extend_from_slice(&self.to_be_bytes());
                    }
                }

                #[inline]
                fn load(bytes: &[u8], endianness: Endianness) -> Self {
                    let mut array = [0; std::mem::size_of::<$ty>()];
                    array.copy_from_slice(bytes);

                    if endianness == Endianness::LITTLE {
                        <$ty>::from_le_bytes(array)
                    } else {
                        <$ty>::from_be_bytes(array)
                    }
                }
            }
        )*
    }
}

impl_number!(u8, u16, u32, u64);
impl_number!(i16, i32, i64);
impl_number!(f64);
