//! Wire primitives shared by every encoder and decoder.
use bytes::{Buf, BufMut};

use crate::postgres::{EncodeError, ProtocolError};

/// Integer signess in postgres docs is awful.
pub trait UsizeExt {
    /// Length is `usize` in rust, while postgres want `u32`,
    /// this will error when overflow instead of wrapping.
    fn to_u32(self) -> Result<u32, EncodeError>;
    /// Element count is `usize` in rust, while postgres want a 16 bit count,
    /// this will error when `self` exceeds `max` instead of wrapping.
    fn to_count(self, max: u16) -> Result<u16, EncodeError>;
}

/// Nul string operation.
pub trait StrExt {
    /// String length plus nul (1).
    ///
    /// Errors if the string itself contains nul, which would end it early on the wire.
    fn nul_string_len(&self) -> Result<u32, EncodeError>;
}

/// Write operation in [`BufMut`].
pub trait BufMutExt {
    /// Write string and nul termination.
    fn put_nul_string(&mut self, string: &str);

    /// Write `Int32` length followed by the bytes, or `-1` for `None`.
    fn put_len_bytes(&mut self, bytes: Option<&[u8]>);
}

/// Borrowing read operation on a frame body.
///
/// All reads are bounds checked, running out of bytes returns
/// [`ProtocolError::UnexpectedEof`] instead of panicking.
pub trait SliceExt<'a> {
    /// Read nul terminated bytes, the nul itself is consumed but not returned.
    fn get_nul_bytes(&mut self) -> Result<&'a [u8], ProtocolError>;

    /// Read nul terminated utf8 string.
    fn get_nul_str(&mut self) -> Result<&'a str, ProtocolError>;

    /// Read `Int32` length prefixed bytes, negative length means `NULL`.
    fn get_len_bytes(&mut self) -> Result<Option<&'a [u8]>, ProtocolError>;

    /// Read exactly `len` bytes.
    fn get_bytes(&mut self, len: usize) -> Result<&'a [u8], ProtocolError>;

    /// Errors with [`ProtocolError::TrailingBytes`] if any byte is left unread.
    fn ensure_empty(&self) -> Result<(), ProtocolError>;
}

/// Helper trait to [`Display`][std::fmt::Display] bytes.
pub trait FmtExt {
    /// Lossy [`Display`][std::fmt::Display] bytes.
    fn lossy(&self) -> LossyFmt<'_>;
}

/// Lossy [`Display`][std::fmt::Display] implementation for bytes.
pub struct LossyFmt<'a>(pub &'a [u8]);

impl UsizeExt for usize {
    fn to_u32(self) -> Result<u32, EncodeError> {
        u32::try_from(self).map_err(|_| EncodeError::MessageTooLarge(self))
    }

    fn to_count(self, max: u16) -> Result<u16, EncodeError> {
        match u16::try_from(self) {
            Ok(count) if count <= max => Ok(count),
            _ => Err(EncodeError::TooManyEntries { count: self, max: max as usize }),
        }
    }
}

impl StrExt for str {
    fn nul_string_len(&self) -> Result<u32, EncodeError> {
        nul_bytes_len(self.as_bytes())
    }
}

/// Size of bytes written with nul terminator, see [`StrExt::nul_string_len`].
pub(crate) fn nul_bytes_len(bytes: &[u8]) -> Result<u32, EncodeError> {
    if let Some(offset) = memchr::memchr(b'\0', bytes) {
        return Err(EncodeError::InteriorNul(offset));
    }
    bytes.len().to_u32()?.checked_add(1/* nul */).ok_or(EncodeError::MessageTooLarge(bytes.len()))
}

impl<B: BufMut> BufMutExt for B {
    fn put_nul_string(&mut self, string: &str) {
        self.put(string.as_bytes());
        self.put_u8(b'\0');
    }

    fn put_len_bytes(&mut self, bytes: Option<&[u8]>) {
        match bytes {
            Some(bytes) => {
                // size already validated by the message `size_hint`
                self.put_i32(bytes.len() as i32);
                self.put(bytes);
            }
            None => self.put_i32(-1),
        }
    }
}

impl<'a> SliceExt<'a> for &'a [u8] {
    fn get_nul_bytes(&mut self) -> Result<&'a [u8], ProtocolError> {
        let Some(end) = memchr::memchr(b'\0', self) else {
            return Err(ProtocolError::MissingNul);
        };
        let me = &self[..end];
        *self = &self[end + 1..];
        Ok(me)
    }

    fn get_nul_str(&mut self) -> Result<&'a str, ProtocolError> {
        Ok(std::str::from_utf8(self.get_nul_bytes()?)?)
    }

    fn get_len_bytes(&mut self) -> Result<Option<&'a [u8]>, ProtocolError> {
        let len = self.try_get_i32()?;
        if len < 0 {
            return Ok(None);
        }
        self.get_bytes(len as usize).map(Some)
    }

    fn get_bytes(&mut self, len: usize) -> Result<&'a [u8], ProtocolError> {
        if self.len() < len {
            return Err(ProtocolError::UnexpectedEof);
        }
        let (me, rest) = self.split_at(len);
        *self = rest;
        Ok(me)
    }

    fn ensure_empty(&self) -> Result<(), ProtocolError> {
        match self.len() {
            0 => Ok(()),
            n => Err(ProtocolError::TrailingBytes(n)),
        }
    }
}

/// Size of `Int32` length prefixed bytes.
pub(crate) fn len_bytes_size(bytes: Option<&[u8]>) -> Result<u32, EncodeError> {
    let len = bytes.map_or(0, <[u8]>::len);
    if len > i32::MAX as usize {
        return Err(EncodeError::MessageTooLarge(len));
    }
    Ok(4 + len.to_u32()?)
}

impl FmtExt for [u8] {
    fn lossy(&self) -> LossyFmt<'_> {
        LossyFmt(self)
    }
}

impl std::fmt::Display for LossyFmt<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for &b in self.0 {
            if b.is_ascii_graphic() || b.is_ascii_whitespace() {
                write!(f, "{}", b as char)?;
            } else {
                write!(f, "\\x{b:x}")?;
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for LossyFmt<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "b\"{self}\"")
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn nul_bytes() {
        let mut buf: &[u8] = b"hello\0world";
        assert_eq!(buf.get_nul_bytes().unwrap(), b"hello");
        assert_eq!(buf, b"world");
        assert!(matches!(buf.get_nul_str(), Err(ProtocolError::MissingNul)));
        assert!(matches!(buf.ensure_empty(), Err(ProtocolError::TrailingBytes(5))));

        let mut buf: &[u8] = b"end\0";
        assert_eq!(buf.get_nul_str().unwrap(), "end");
        assert!(buf.ensure_empty().is_ok());
    }

    #[test]
    fn interior_nul() {
        assert_eq!("SELECT 1".nul_string_len().unwrap(), 9);
        assert_eq!("".nul_string_len().unwrap(), 1);
        assert!(matches!("SELECT 1\0; DROP".nul_string_len(), Err(EncodeError::InteriorNul(8))));
        assert!(matches!(nul_bytes_len(b"\0"), Err(EncodeError::InteriorNul(0))));
    }

    #[test]
    fn len_bytes() {
        let mut buf: &[u8] = &[0xFF, 0xFF, 0xFF, 0xFF, 0, 0, 0, 2, b'h', b'i', 0, 0, 0, 9, b'x'];
        assert_eq!(buf.get_len_bytes().unwrap(), None);
        assert_eq!(buf.get_len_bytes().unwrap(), Some(&b"hi"[..]));
        assert!(matches!(buf.get_len_bytes(), Err(ProtocolError::UnexpectedEof)));
    }

    #[test]
    fn put_len_bytes() {
        let mut buf = Vec::new();
        buf.put_len_bytes(None);
        buf.put_len_bytes(Some(&b""[..]));
        buf.put_len_bytes(Some(&b"ab"[..]));
        assert_eq!(buf, [0xFF, 0xFF, 0xFF, 0xFF, 0, 0, 0, 0, 0, 0, 0, 2, b'a', b'b']);
    }

    #[test]
    fn count_limit() {
        assert_eq!(3usize.to_count(i16::MAX as u16).unwrap(), 3);
        assert!(matches!(
            70_000usize.to_count(u16::MAX),
            Err(EncodeError::TooManyEntries { count: 70_000, max: 65_535 })
        ));
    }

    #[test]
    fn lossy() {
        assert_eq!(format!("{}", b"ab\x01".lossy()), "ab\\x1");
    }
}
