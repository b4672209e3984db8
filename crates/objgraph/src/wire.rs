//! Scalar wire layer.
//!
//! This module provides the [`Encoder`] and [`Decoder`] traits that every
//! object record is ultimately written through, and the postcard-style
//! [`PostcardEncoder`] / [`PostcardDecoder`] that implement them over any
//! [`Write`] / [`Read`] byte sink or source.
//!
//! # Format Overview
//!
//! - **Variable-length integers**: LEB128 varints; small values take one byte.
//! - **Signed integers**: zigzag-mapped before the varint step so small
//!   negative numbers stay small.
//! - **Fixed-size primitives**: `u8`, `i8` and `bool` use a single byte.
//! - **Floating-point**: `f32` and `f64` are little-endian IEEE 754.
//! - **Strings/bytes**: varint length prefix followed by the raw bytes.
//!
//! The object layer above ([`crate::output`] and [`crate::input`]) never
//! touches the byte sink directly; it only goes through these traits.

use std::io::{self, Read, Write};


/// A trait for types that can write primitive values to a binary format.
///
/// Only the integer and raw-byte methods are required; the rest are provided
/// in terms of them and may be overridden for format-specific layouts.
pub trait Encoder {
    // =========================================================================
    // Required methods
    // =========================================================================

    /// Emits a single unsigned byte.
    fn emit_u8(&mut self, v: u8) -> io::Result<()>;

    /// Emits a 16-bit unsigned integer.
    fn emit_u16(&mut self, v: u16) -> io::Result<()>;

    /// Emits a 32-bit unsigned integer.
    fn emit_u32(&mut self, v: u32) -> io::Result<()>;

    /// Emits a 64-bit unsigned integer.
    fn emit_u64(&mut self, v: u64) -> io::Result<()>;

    /// Emits a 128-bit unsigned integer.
    fn emit_u128(&mut self, v: u128) -> io::Result<()>;

    /// Emits a single signed byte.
    fn emit_i8(&mut self, v: i8) -> io::Result<()>;

    /// Emits a 16-bit signed integer.
    fn emit_i16(&mut self, v: i16) -> io::Result<()>;

    /// Emits a 32-bit signed integer.
    fn emit_i32(&mut self, v: i32) -> io::Result<()>;

    /// Emits a 64-bit signed integer.
    fn emit_i64(&mut self, v: i64) -> io::Result<()>;

    /// Emits a 128-bit signed integer.
    fn emit_i128(&mut self, v: i128) -> io::Result<()>;

    /// Emits raw bytes directly to the output.
    fn emit_raw_bytes(&mut self, s: &[u8]) -> io::Result<()>;

    // =========================================================================
    // Provided methods
    // =========================================================================

    /// Emits a platform-sized unsigned integer, widened to 64 bits.
    fn emit_usize(&mut self, v: usize) -> io::Result<()> {
        self.emit_u64(v as u64)
    }

    /// Emits a platform-sized signed integer, widened to 64 bits.
    fn emit_isize(&mut self, v: isize) -> io::Result<()> {
        self.emit_i64(v as i64)
    }

    /// Emits a boolean as `1u8` or `0u8`.
    fn emit_bool(&mut self, v: bool) -> io::Result<()> {
        self.emit_u8(u8::from(v))
    }

    /// Emits a Unicode scalar value.
    fn emit_char(&mut self, v: char) -> io::Result<()> {
        self.emit_u32(v as u32)
    }

    /// Emits a 32-bit float.
    fn emit_f32(&mut self, v: f32) -> io::Result<()> {
        self.emit_raw_bytes(&v.to_le_bytes())
    }

    /// Emits a 64-bit float.
    fn emit_f64(&mut self, v: f64) -> io::Result<()> {
        self.emit_raw_bytes(&v.to_le_bytes())
    }

    /// Emits a length-prefixed UTF-8 string.
    fn emit_str(&mut self, v: &str) -> io::Result<()> {
        self.emit_usize(v.len())?;
        self.emit_raw_bytes(v.as_bytes())
    }

    /// Emits a length-prefixed byte slice.
    fn emit_bytes(&mut self, v: &[u8]) -> io::Result<()> {
        self.emit_usize(v.len())?;
        self.emit_raw_bytes(v)
    }
}

/// A trait for types that can read primitive values from a binary format.
///
/// Mirrors [`Encoder`]. Malformed input is reported as
/// [`io::ErrorKind::InvalidData`] and truncated input as
/// [`io::ErrorKind::UnexpectedEof`].
pub trait Decoder {
    // =========================================================================
    // Required methods
    // =========================================================================

    /// Reads a single unsigned byte.
    fn read_u8(&mut self) -> io::Result<u8>;

    /// Reads a 16-bit unsigned integer.
    fn read_u16(&mut self) -> io::Result<u16>;

    /// Reads a 32-bit unsigned integer.
    fn read_u32(&mut self) -> io::Result<u32>;

    /// Reads a 64-bit unsigned integer.
    fn read_u64(&mut self) -> io::Result<u64>;

    /// Reads a 128-bit unsigned integer.
    fn read_u128(&mut self) -> io::Result<u128>;

    /// Reads a single signed byte.
    fn read_i8(&mut self) -> io::Result<i8>;

    /// Reads a 16-bit signed integer.
    fn read_i16(&mut self) -> io::Result<i16>;

    /// Reads a 32-bit signed integer.
    fn read_i32(&mut self) -> io::Result<i32>;

    /// Reads a 64-bit signed integer.
    fn read_i64(&mut self) -> io::Result<i64>;

    /// Reads a 128-bit signed integer.
    fn read_i128(&mut self) -> io::Result<i128>;

    /// Reads exactly `len` raw bytes.
    fn read_raw_bytes(&mut self, len: usize) -> io::Result<Vec<u8>>;

    /// Reads a length or element count and checks it against the decoder's
    /// allocation limit.
    fn read_length(&mut self) -> io::Result<usize>;

    // =========================================================================
    // Provided methods
    // =========================================================================

    /// Reads a platform-sized unsigned integer stored as 64 bits.
    fn read_usize(&mut self) -> io::Result<usize> {
        let value = self.read_u64()?;
        usize::try_from(value).map_err(|_| {
            invalid_data("usize value out of range for this platform")
        })
    }

    /// Reads a platform-sized signed integer stored as 64 bits.
    fn read_isize(&mut self) -> io::Result<isize> {
        let value = self.read_i64()?;
        isize::try_from(value).map_err(|_| {
            invalid_data("isize value out of range for this platform")
        })
    }

    /// Reads a boolean. Only `0` and `1` are accepted.
    fn read_bool(&mut self) -> io::Result<bool> {
        match self.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(invalid_data(format!("invalid bool byte {other:#04x}"))),
        }
    }

    /// Reads a Unicode scalar value.
    fn read_char(&mut self) -> io::Result<char> {
        let code = self.read_u32()?;
        char::from_u32(code).ok_or_else(|| {
            invalid_data(format!("invalid Unicode scalar value: {code}"))
        })
    }

    /// Reads a 32-bit float.
    fn read_f32(&mut self) -> io::Result<f32> {
        let bytes = self.read_raw_bytes(4)?;
        let mut buf = [0u8; 4];
        buf.copy_from_slice(&bytes);
        Ok(f32::from_le_bytes(buf))
    }

    /// Reads a 64-bit float.
    fn read_f64(&mut self) -> io::Result<f64> {
        let bytes = self.read_raw_bytes(8)?;
        let mut buf = [0u8; 8];
        buf.copy_from_slice(&bytes);
        Ok(f64::from_le_bytes(buf))
    }

    /// Reads a length-prefixed UTF-8 string.
    fn read_str(&mut self) -> io::Result<String> {
        let len = self.read_length()?;
        let bytes = self.read_raw_bytes(len)?;
        String::from_utf8(bytes)
            .map_err(|e| invalid_data(format!("invalid UTF-8: {e}")))
    }

    /// Reads a length-prefixed byte vector.
    fn read_bytes(&mut self) -> io::Result<Vec<u8>> {
        let len = self.read_length()?;
        self.read_raw_bytes(len)
    }
}

pub(crate) fn invalid_data(message: impl Into<String>) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, message.into())
}

// =============================================================================
// Varint and zigzag helpers
// =============================================================================

macro_rules! varint_codec {
    ($write:ident, $read:ident, $ty:ty, $max:expr) => {
        #[allow(clippy::cast_possible_truncation)]
        fn $write<W: Write + ?Sized>(writer: &mut W, mut value: $ty)
            -> io::Result<()>
        {
            let mut buf = [0u8; $max];
            let mut i = 0;
            while value >= 0x80 {
                buf[i] = (value as u8) | 0x80;
                value >>= 7;
                i += 1;
            }
            buf[i] = value as u8;
            writer.write_all(&buf[..=i])
        }

        fn $read<R: Read + ?Sized>(
            reader: &mut R,
            consumed: &mut u64,
        ) -> io::Result<$ty> {
            let mut result: $ty = 0;
            let mut shift = 0u32;

            loop {
                let mut byte = [0u8; 1];
                reader.read_exact(&mut byte)?;
                *consumed += 1;

                let payload = u32::from(byte[0] & 0x7F);
                let room = <$ty>::BITS.saturating_sub(shift);

                if room == 0 || (room < 7 && payload >> room != 0) {
                    return Err(invalid_data(concat!(
                        "varint too long for ",
                        stringify!($ty)
                    )));
                }

                result |= <$ty>::from(byte[0] & 0x7F) << shift;

                if byte[0] & 0x80 == 0 {
                    return Ok(result);
                }

                shift += 7;
            }
        }
    };
}

varint_codec!(write_varint_u16, read_varint_u16, u16, 3);
varint_codec!(write_varint_u32, read_varint_u32, u32, 5);
varint_codec!(write_varint_u64, read_varint_u64, u64, 10);
varint_codec!(write_varint_u128, read_varint_u128, u128, 19);

macro_rules! zigzag {
    ($encode:ident, $decode:ident, $signed:ty, $unsigned:ty) => {
        #[allow(clippy::cast_sign_loss)]
        const fn $encode(value: $signed) -> $unsigned {
            ((value << 1) ^ (value >> (<$signed>::BITS - 1))) as $unsigned
        }

        #[allow(clippy::cast_possible_wrap)]
        const fn $decode(value: $unsigned) -> $signed {
            ((value >> 1) as $signed) ^ (-((value & 1) as $signed))
        }
    };
}

zigzag!(zigzag_encode_i16, zigzag_decode_i16, i16, u16);
zigzag!(zigzag_encode_i32, zigzag_decode_i32, i32, u32);
zigzag!(zigzag_encode_i64, zigzag_decode_i64, i64, u64);
zigzag!(zigzag_encode_i128, zigzag_decode_i128, i128, u128);

// =============================================================================
// PostcardEncoder
// =============================================================================

/// A postcard-style encoder that writes to any [`Write`] implementation.
///
/// Counts the bytes it has written so callers can report stream sizes
/// without wrapping the sink.
#[derive(Debug)]
pub struct PostcardEncoder<W> {
    writer: W,
    written: u64,
}

impl<W> PostcardEncoder<W> {
    /// Creates a new encoder wrapping the given writer.
    #[must_use]
    pub const fn new(writer: W) -> Self { Self { writer, written: 0 } }

    /// Returns the number of bytes written so far.
    #[must_use]
    pub const fn written(&self) -> u64 { self.written }

    /// Consumes the encoder and returns the underlying writer.
    #[must_use]
    pub fn into_inner(self) -> W { self.writer }
}

impl<W: Write> PostcardEncoder<W> {
    fn put(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.writer.write_all(bytes)?;
        self.written += bytes.len() as u64;
        Ok(())
    }
}

/// Counts what a varint helper writes.
struct Counted<'a, W> {
    writer: &'a mut W,
    written: &'a mut u64,
}

impl<W: Write> Write for Counted<'_, W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.writer.write(buf)?;
        *self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> { self.writer.flush() }
}

impl<W: Write> PostcardEncoder<W> {
    fn counted(&mut self) -> Counted<'_, W> {
        Counted { writer: &mut self.writer, written: &mut self.written }
    }
}

impl<W: Write> Encoder for PostcardEncoder<W> {
    fn emit_u8(&mut self, v: u8) -> io::Result<()> { self.put(&[v]) }

    fn emit_u16(&mut self, v: u16) -> io::Result<()> {
        write_varint_u16(&mut self.counted(), v)
    }

    fn emit_u32(&mut self, v: u32) -> io::Result<()> {
        write_varint_u32(&mut self.counted(), v)
    }

    fn emit_u64(&mut self, v: u64) -> io::Result<()> {
        write_varint_u64(&mut self.counted(), v)
    }

    fn emit_u128(&mut self, v: u128) -> io::Result<()> {
        write_varint_u128(&mut self.counted(), v)
    }

    #[allow(clippy::cast_sign_loss)]
    fn emit_i8(&mut self, v: i8) -> io::Result<()> { self.put(&[v as u8]) }

    fn emit_i16(&mut self, v: i16) -> io::Result<()> {
        self.emit_u16(zigzag_encode_i16(v))
    }

    fn emit_i32(&mut self, v: i32) -> io::Result<()> {
        self.emit_u32(zigzag_encode_i32(v))
    }

    fn emit_i64(&mut self, v: i64) -> io::Result<()> {
        self.emit_u64(zigzag_encode_i64(v))
    }

    fn emit_i128(&mut self, v: i128) -> io::Result<()> {
        self.emit_u128(zigzag_encode_i128(v))
    }

    fn emit_raw_bytes(&mut self, s: &[u8]) -> io::Result<()> { self.put(s) }
}

// =============================================================================
// PostcardDecoder
// =============================================================================

/// A postcard-style decoder that reads from any [`Read`] implementation.
///
/// Every length prefix is checked against `max_length` before anything is
/// allocated, so a corrupted prefix cannot request a huge buffer.
#[derive(Debug)]
pub struct PostcardDecoder<R> {
    reader: R,
    consumed: u64,
    max_length: usize,
}

impl<R> PostcardDecoder<R> {
    /// Creates a new decoder wrapping the given reader.
    #[must_use]
    pub const fn new(reader: R, max_length: usize) -> Self {
        Self { reader, consumed: 0, max_length }
    }

    /// Returns the number of bytes consumed so far.
    #[must_use]
    pub const fn consumed(&self) -> u64 { self.consumed }

    /// Consumes the decoder and returns the underlying reader.
    #[must_use]
    pub fn into_inner(self) -> R { self.reader }
}

impl<R: Read> Decoder for PostcardDecoder<R> {
    fn read_u8(&mut self) -> io::Result<u8> {
        let mut buf = [0u8; 1];
        self.reader.read_exact(&mut buf)?;
        self.consumed += 1;
        Ok(buf[0])
    }

    fn read_u16(&mut self) -> io::Result<u16> {
        read_varint_u16(&mut self.reader, &mut self.consumed)
    }

    fn read_u32(&mut self) -> io::Result<u32> {
        read_varint_u32(&mut self.reader, &mut self.consumed)
    }

    fn read_u64(&mut self) -> io::Result<u64> {
        read_varint_u64(&mut self.reader, &mut self.consumed)
    }

    fn read_u128(&mut self) -> io::Result<u128> {
        read_varint_u128(&mut self.reader, &mut self.consumed)
    }

    #[allow(clippy::cast_possible_wrap)]
    fn read_i8(&mut self) -> io::Result<i8> { Ok(self.read_u8()? as i8) }

    fn read_i16(&mut self) -> io::Result<i16> {
        Ok(zigzag_decode_i16(self.read_u16()?))
    }

    fn read_i32(&mut self) -> io::Result<i32> {
        Ok(zigzag_decode_i32(self.read_u32()?))
    }

    fn read_i64(&mut self) -> io::Result<i64> {
        Ok(zigzag_decode_i64(self.read_u64()?))
    }

    fn read_i128(&mut self) -> io::Result<i128> {
        Ok(zigzag_decode_i128(self.read_u128()?))
    }

    fn read_raw_bytes(&mut self, len: usize) -> io::Result<Vec<u8>> {
        let mut buf = vec![0u8; len];
        self.reader.read_exact(&mut buf)?;
        self.consumed += len as u64;
        Ok(buf)
    }

    fn read_length(&mut self) -> io::Result<usize> {
        let len = self.read_usize()?;
        if len > self.max_length {
            return Err(invalid_data(format!(
                "length prefix {len} exceeds the limit of {}",
                self.max_length
            )));
        }
        Ok(len)
    }
}
