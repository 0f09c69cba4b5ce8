//! Little-endian binary primitives.
//!
//! Strings, byte strings and arrays carry an `i32` length prefix. A prefix of
//! `-1` marks a null value, which decodes as empty.

use bytes::{Buf, BufMut, Bytes};

use crate::error::{EncodingError, Result};

/// Length prefix value marking a null string, byte string or array.
pub const NULL_LENGTH: i32 = -1;

/// A value with a fixed binary wire form.
pub trait BinaryEncode {
    /// Exact number of bytes [`encode`](Self::encode) writes.
    fn byte_len(&self) -> usize;

    /// Write the value to `buf`.
    fn encode<B: BufMut>(&self, buf: &mut B) -> Result<()>;
}

/// A value that can be read back from its binary wire form.
pub trait BinaryDecode: Sized {
    /// Read one value from the front of `buf`, consuming its bytes.
    fn decode<B: Buf>(buf: &mut B) -> Result<Self>;
}

/// Fail with [`EncodingError::UnexpectedEof`] unless `buf` holds `needed` bytes.
pub fn ensure_remaining<B: Buf>(buf: &B, needed: usize) -> Result<()> {
    if buf.remaining() < needed {
        return Err(EncodingError::UnexpectedEof {
            needed,
            remaining: buf.remaining(),
        });
    }
    Ok(())
}

/// Write an `i32` length prefix.
pub fn write_length<B: BufMut>(len: usize, buf: &mut B) -> Result<()> {
    let len = i32::try_from(len).map_err(|_| EncodingError::LengthOverflow(len))?;
    buf.put_i32_le(len);
    Ok(())
}

/// Read an `i32` length prefix, mapping the null marker to zero.
pub fn read_length<B: Buf>(buf: &mut B) -> Result<usize> {
    match i32::decode(buf)? {
        NULL_LENGTH => Ok(0),
        len if len < 0 => Err(EncodingError::InvalidLength(len)),
        len => Ok(len as usize),
    }
}

macro_rules! impl_fixed_width {
    ($($ty:ty => $put:ident, $get:ident;)*) => {
        $(
            impl BinaryEncode for $ty {
                fn byte_len(&self) -> usize {
                    std::mem::size_of::<$ty>()
                }

                fn encode<B: BufMut>(&self, buf: &mut B) -> Result<()> {
                    buf.$put(*self);
                    Ok(())
                }
            }

            impl BinaryDecode for $ty {
                fn decode<B: Buf>(buf: &mut B) -> Result<Self> {
                    ensure_remaining(buf, std::mem::size_of::<$ty>())?;
                    Ok(buf.$get())
                }
            }
        )*
    };
}

impl_fixed_width! {
    u8 => put_u8, get_u8;
    u16 => put_u16_le, get_u16_le;
    u32 => put_u32_le, get_u32_le;
    i32 => put_i32_le, get_i32_le;
    i64 => put_i64_le, get_i64_le;
}

impl BinaryEncode for bool {
    fn byte_len(&self) -> usize {
        1
    }

    fn encode<B: BufMut>(&self, buf: &mut B) -> Result<()> {
        buf.put_u8(u8::from(*self));
        Ok(())
    }
}

impl BinaryDecode for bool {
    fn decode<B: Buf>(buf: &mut B) -> Result<Self> {
        Ok(u8::decode(buf)? != 0)
    }
}

impl BinaryEncode for String {
    fn byte_len(&self) -> usize {
        4 + self.len()
    }

    fn encode<B: BufMut>(&self, buf: &mut B) -> Result<()> {
        write_length(self.len(), buf)?;
        buf.put_slice(self.as_bytes());
        Ok(())
    }
}

impl BinaryDecode for String {
    fn decode<B: Buf>(buf: &mut B) -> Result<Self> {
        let len = read_length(buf)?;
        ensure_remaining(buf, len)?;
        let raw = buf.copy_to_bytes(len);
        String::from_utf8(raw.to_vec()).map_err(|_| EncodingError::InvalidUtf8)
    }
}

impl BinaryEncode for Bytes {
    fn byte_len(&self) -> usize {
        4 + self.len()
    }

    fn encode<B: BufMut>(&self, buf: &mut B) -> Result<()> {
        write_length(self.len(), buf)?;
        buf.put_slice(self);
        Ok(())
    }
}

impl BinaryDecode for Bytes {
    fn decode<B: Buf>(buf: &mut B) -> Result<Self> {
        let len = read_length(buf)?;
        ensure_remaining(buf, len)?;
        Ok(buf.copy_to_bytes(len))
    }
}

impl<T: BinaryEncode> BinaryEncode for Vec<T> {
    fn byte_len(&self) -> usize {
        4 + self.iter().map(BinaryEncode::byte_len).sum::<usize>()
    }

    fn encode<B: BufMut>(&self, buf: &mut B) -> Result<()> {
        write_length(self.len(), buf)?;
        for item in self {
            item.encode(buf)?;
        }
        Ok(())
    }
}

impl<T: BinaryDecode> BinaryDecode for Vec<T> {
    fn decode<B: Buf>(buf: &mut B) -> Result<Self> {
        let count = read_length(buf)?;
        // Every element occupies at least one byte.
        let mut out = Vec::with_capacity(count.min(buf.remaining()));
        for _ in 0..count {
            out.push(T::decode(buf)?);
        }
        Ok(out)
    }
}
