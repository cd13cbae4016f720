use crate::error::ErrorKind;
use crate::proto::Endianness;

use super::{padding_to, ReadBuf, WriteBuf};

#[test]
fn padding() {
    assert_eq!(padding_to(8, 0), 0);
    assert_eq!(padding_to(8, 1), 7);
    assert_eq!(padding_to(8, 8), 0);
    assert_eq!(padding_to(4, 5), 3);
    assert_eq!(padding_to(2, 3), 1);
    assert_eq!(padding_to(1, 3), 0);
}

#[test]
fn store_aligns_numbers() {
    let mut buf = WriteBuf::new(Endianness::LITTLE);
    buf.store(1u8);
    buf.store(2u16);
    buf.store(3u32);
    buf.store(4u64);

    assert_eq!(
        buf.get(),
        &[1, 0, 2, 0, 3, 0, 0, 0, 4, 0, 0, 0, 0, 0, 0, 0]
    );
}

#[test]
fn big_endian_numbers() {
    let mut buf = WriteBuf::new(Endianness::BIG);
    buf.store(0x01020304u32);
    assert_eq!(buf.get(), &[1, 2, 3, 4]);

    let mut read = ReadBuf::new(buf.get(), 0, Endianness::BIG);
    assert_eq!(read.load::<u32>().unwrap(), 0x01020304);
    assert!(read.is_empty());
}

#[test]
fn patch_u32() {
    let mut buf = WriteBuf::new(Endianness::LITTLE);
    buf.store(0u32);
    buf.store(7u8);
    buf.patch_u32(0, 42);
    assert_eq!(buf.get(), &[42, 0, 0, 0, 7]);
}

#[test]
fn underflow() {
    let mut read = ReadBuf::new(&[1, 2, 3], 0, Endianness::LITTLE);
    assert!(matches!(
        read.load::<u32>().unwrap_err().kind(),
        ErrorKind::BufferUnderflow
    ));
}

#[test]
fn nul_terminated() {
    let mut read = ReadBuf::new(b"abc\0", 0, Endianness::LITTLE);
    assert_eq!(read.take_nul_terminated(3).unwrap(), b"abc");

    let mut read = ReadBuf::new(b"abcd", 0, Endianness::LITTLE);
    assert!(matches!(
        read.take_nul_terminated(3).unwrap_err().kind(),
        ErrorKind::NotNullTerminated
    ));

    let mut read = ReadBuf::new(b"a\0c\0", 0, Endianness::LITTLE);
    assert!(matches!(
        read.take_nul_terminated(3).unwrap_err().kind(),
        ErrorKind::NotNullTerminated
    ));
}

#[test]
fn alignment_is_relative_to_slice_start() {
    let data = [0xff, 0, 0, 0, 9, 0, 0, 0];
    let mut read = ReadBuf::new(&data, 1, Endianness::LITTLE);
    assert_eq!(read.load::<u32>().unwrap(), 9);
    assert_eq!(read.position(), 8);
}
