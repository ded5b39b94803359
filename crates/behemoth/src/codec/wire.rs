//! Primitive encoders: big-endian fixed ints, zero-compressed varints and
//! length-prefixed UTF-8 strings.
//!
//! The varint layout is the zero-compressed one used by Hadoop writables:
//! values in `-112..=127` take one byte, anything else a marker byte that
//! carries sign and width followed by 1-8 big-endian magnitude bytes.

use std::io::{self, Read, Write};

use super::CodecError;

pub fn write_u8<W: Write>(out: &mut W, value: u8) -> io::Result<()> {
    out.write_all(&[value])
}

pub fn read_u8<R: Read>(input: &mut R) -> io::Result<u8> {
    let mut buf = [0u8; 1];
    input.read_exact(&mut buf)?;
    Ok(buf[0])
}

pub fn write_bool<W: Write>(out: &mut W, value: bool) -> io::Result<()> {
    write_u8(out, u8::from(value))
}

pub fn read_bool<R: Read>(input: &mut R) -> io::Result<bool> {
    Ok(read_u8(input)? != 0)
}

pub fn write_i32<W: Write>(out: &mut W, value: i32) -> io::Result<()> {
    out.write_all(&value.to_be_bytes())
}

pub fn read_i32<R: Read>(input: &mut R) -> io::Result<i32> {
    let mut buf = [0u8; 4];
    input.read_exact(&mut buf)?;
    Ok(i32::from_be_bytes(buf))
}

/// Read an `i32` that must not be negative (a count or a length).
pub fn read_len<R: Read>(input: &mut R) -> Result<usize, CodecError> {
    let value = read_i32(input)?;
    usize::try_from(value).map_err(|_| CodecError::NegativeLength(i64::from(value)))
}

/// Convert an in-memory length to its `i32` wire form.
pub fn len_to_i32(len: usize) -> Result<i32, CodecError> {
    i32::try_from(len).map_err(|_| CodecError::TooLarge(len))
}

pub fn write_vlong<W: Write>(out: &mut W, value: i64) -> io::Result<()> {
    if (-112..=127).contains(&value) {
        return write_u8(out, value as i8 as u8);
    }

    let (magnitude, mut marker) = if value < 0 {
        (!value, -120i32)
    } else {
        (value, -112i32)
    };

    let mut tmp = magnitude;
    while tmp != 0 {
        tmp >>= 8;
        marker -= 1;
    }
    write_u8(out, marker as i8 as u8)?;

    let width = if marker < -120 {
        -(marker + 120)
    } else {
        -(marker + 112)
    };
    for idx in (1..=width).rev() {
        let shift = (idx - 1) * 8;
        write_u8(out, ((magnitude >> shift) & 0xff) as u8)?;
    }
    Ok(())
}

pub fn read_vlong<R: Read>(input: &mut R) -> io::Result<i64> {
    let first = read_u8(input)? as i8;
    let size = encoded_size(first);
    if size == 1 {
        return Ok(i64::from(first));
    }

    let mut value: i64 = 0;
    for _ in 0..size - 1 {
        value = (value << 8) | i64::from(read_u8(input)?);
    }

    if is_negative(first) {
        Ok(!value)
    } else {
        Ok(value)
    }
}

fn encoded_size(first: i8) -> usize {
    if first >= -112 {
        1
    } else if first < -120 {
        (-119 - i32::from(first)) as usize
    } else {
        (-111 - i32::from(first)) as usize
    }
}

fn is_negative(first: i8) -> bool {
    first < -120 || (-112..0).contains(&first)
}

/// Varint byte length followed by the UTF-8 bytes.
pub fn write_string<W: Write>(out: &mut W, value: &str) -> Result<(), CodecError> {
    write_vlong(out, i64::from(len_to_i32(value.len())?))?;
    out.write_all(value.as_bytes())?;
    Ok(())
}

pub fn read_string<R: Read>(input: &mut R) -> Result<String, CodecError> {
    let len = read_vlong(input)?;
    if len < 0 || len > i64::from(i32::MAX) {
        return Err(CodecError::NegativeLength(len));
    }
    let bytes = read_bytes(input, len as usize)?;
    Ok(String::from_utf8(bytes)?)
}

/// Read exactly `len` bytes without trusting `len` for the allocation size.
pub fn read_bytes<R: Read>(input: &mut R, len: usize) -> Result<Vec<u8>, CodecError> {
    let mut buf = Vec::with_capacity(len.min(64 * 1024));
    input.take(len as u64).read_to_end(&mut buf)?;
    if buf.len() != len {
        return Err(CodecError::Io(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("expected {} bytes, stream ended after {}", len, buf.len()),
        )));
    }
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vlong_bytes(value: i64) -> Vec<u8> {
        let mut out = Vec::new();
        write_vlong(&mut out, value).unwrap();
        out
    }

    #[test]
    fn test_vlong_single_byte_range() {
        assert_eq!(vlong_bytes(0), vec![0x00]);
        assert_eq!(vlong_bytes(127), vec![0x7f]);
        assert_eq!(vlong_bytes(-1), vec![0xff]);
        assert_eq!(vlong_bytes(-112), vec![0x90]);
    }

    #[test]
    fn test_vlong_multi_byte_layout() {
        assert_eq!(vlong_bytes(128), vec![0x8f, 0x80]);
        assert_eq!(vlong_bytes(-113), vec![0x87, 0x70]);
        assert_eq!(vlong_bytes(65_536), vec![0x8d, 0x01, 0x00, 0x00]);
        assert_eq!(vlong_bytes(i64::MAX).len(), 9);
    }

    #[test]
    fn test_vlong_decodes_boundaries() {
        for value in [
            0,
            1,
            -1,
            127,
            128,
            -112,
            -113,
            255,
            256,
            1 << 31,
            -(1 << 40),
            i64::MAX,
            i64::MIN,
        ] {
            let bytes = vlong_bytes(value);
            assert_eq!(read_vlong(&mut bytes.as_slice()).unwrap(), value, "{}", value);
        }
    }

    #[test]
    fn test_string_prefix_counts_bytes() {
        let mut out = Vec::new();
        write_string(&mut out, "né").unwrap();
        assert_eq!(out, vec![0x03, b'n', 0xc3, 0xa9]);
        assert_eq!(read_string(&mut out.as_slice()).unwrap(), "né");
    }

    #[test]
    fn test_read_string_rejects_truncation_and_bad_utf8() {
        let truncated = [0x05, b'a', b'b'];
        assert!(matches!(
            read_string(&mut truncated.as_slice()),
            Err(CodecError::Io(_))
        ));

        let invalid = [0x02, 0xc3, 0x28];
        assert!(matches!(
            read_string(&mut invalid.as_slice()),
            Err(CodecError::InvalidUtf8(_))
        ));
    }

    #[test]
    fn test_read_len_rejects_negative() {
        let bytes = (-4i32).to_be_bytes();
        assert!(matches!(
            read_len(&mut bytes.as_slice()),
            Err(CodecError::NegativeLength(-4))
        ));
    }
}
