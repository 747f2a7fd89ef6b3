//! Message encoding.
//!
//! Every tagged message is written in a single pass: the body size is computed
//! first, the buffer is reserved for tag, length and body, then written.
//!
//! Messages without tag (the startup phase messages) and `RowDescription`
//! provide their own `write` instead.
use bytes::{BufMut, BytesMut};

use super::EncodeError;
use crate::{common::verbose, ext::UsizeExt};

/// A type which can be encoded into a tagged postgres message.
pub trait Encode {
    /// Message type.
    const MSGTYPE: u8;

    /// Size of the main body.
    ///
    /// Note that this is **only** the size of main body as oppose of actual postgres message length which
    /// include the length itself.
    fn size_hint(&self) -> Result<u32, EncodeError>;

    /// Write the main body of the message.
    ///
    /// The length of body written must be equal to the
    /// length returned by [`size_hint`][Encode::size_hint].
    fn encode(&self, buf: impl BufMut);
}

/// A message sent by the frontend.
pub trait FrontendProtocol: Encode { }

/// A message sent by the backend.
pub trait BackendProtocol: Encode { }

/// Write a tagged message to `buf`.
///
/// On error nothing is written.
pub fn write<M: Encode>(msg: &M, buf: &mut BytesMut) -> Result<(), EncodeError> {
    // msgtype + length
    const PREFIX: usize = 1 + 4;

    let size_hint = msg.size_hint()?;
    let len = checked_len(size_hint as usize + 4)?;

    buf.reserve(1 + len as usize);

    let offset = buf.len();
    buf.put_u8(M::MSGTYPE);
    buf.put_u32(len);

    msg.encode(&mut *buf);

    debug_assert_eq!(
        buf.len() - offset,
        PREFIX + size_hint as usize,
        "message body size not equal to size hint"
    );

    verbose!(msgtype = %(M::MSGTYPE as char), len, "write");

    Ok(())
}

/// Validate that message length fits in the `Int32` length field.
pub(crate) fn checked_len(len: usize) -> Result<u32, EncodeError> {
    if len > i32::MAX as usize {
        return Err(EncodeError::MessageTooLarge(len));
    }
    len.to_u32()
}

/// Add body part size, errors instead of overflowing.
pub(crate) fn add_size(size: u32, more: u32) -> Result<u32, EncodeError> {
    size.checked_add(more)
        .ok_or(EncodeError::MessageTooLarge((size as usize).saturating_add(more as usize)))
}

/// Sum of body part sizes, see [`add_size`].
pub(crate) fn sum_size<const N: usize>(sizes: [u32; N]) -> Result<u32, EncodeError> {
    sizes.into_iter().try_fold(0, add_size)
}

/// Size of a list of `Int16` values with its `Int16` count.
pub(crate) fn u16_list_size(len: usize) -> Result<u32, EncodeError> {
    let count = len.to_count(u16::MAX)?;
    Ok(2 + 2 * count as u32)
}

/// Declare a message without body.
macro_rules! empty_message {
    ($(
        $(#[$doc:meta])*
        $name:ident = $msgtype:literal $(: $($proto:ident),*)?;
    )*) => {
        $(
            $(#[$doc])*
            #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
            pub struct $name;

            impl $crate::postgres::encode::Encode for $name {
                const MSGTYPE: u8 = $msgtype;

                fn size_hint(&self) -> ::core::result::Result<u32, $crate::postgres::EncodeError> {
                    Ok(0)
                }

                fn encode(&self, _: impl bytes::BufMut) { }
            }

            $($(impl $crate::postgres::encode::$proto for $name { })*)?
        )*
    };
}

pub(crate) use empty_message;

#[cfg(test)]
mod test {
    use super::*;

    struct Huge;

    impl Encode for Huge {
        const MSGTYPE: u8 = b'x';

        fn size_hint(&self) -> Result<u32, EncodeError> {
            Ok(i32::MAX as u32)
        }

        fn encode(&self, _: impl BufMut) {
            unreachable!()
        }
    }

    #[test]
    fn reject_oversized() {
        let mut buf = BytesMut::new();
        assert!(matches!(write(&Huge, &mut buf), Err(EncodeError::MessageTooLarge(_))));
        assert!(buf.is_empty());
    }

    #[test]
    fn overflowing_size() {
        assert_eq!(sum_size([4, 1, 2]).unwrap(), 7);
        assert_eq!(add_size(u32::MAX - 1, 1).unwrap(), u32::MAX);
        assert!(matches!(add_size(u32::MAX, 1), Err(EncodeError::MessageTooLarge(_))));
        assert!(matches!(sum_size([u32::MAX / 2, u32::MAX / 2, 2]), Err(EncodeError::MessageTooLarge(_))));
    }

    #[test]
    fn list_size() {
        assert_eq!(u16_list_size(3).unwrap(), 8);
        assert!(u16_list_size(65_536).is_err());
    }
}
