//! COPY sub-protocol messages.
//!
//! `CopyData` and `CopyDone` can be sent by both frontend and backend.
//!
//! <https://www.postgresql.org/docs/current/protocol-flow.html#PROTOCOL-COPY>
use bytes::{Buf, BufMut};

use super::{
    EncodeError, PgFormat, ProtocolError,
    encode::{self, BackendProtocol, Encode, FrontendProtocol, empty_message},
};
use crate::ext::{BufMutExt, SliceExt, StrExt, UsizeExt};

/// Identifies the message as COPY data.
///
/// Messages sent from the backend will always correspond to single data rows,
/// but messages sent by frontends might divide the data stream arbitrarily.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CopyData<'a> {
    /// Data that forms part of a COPY data stream.
    pub data: &'a [u8],
}

impl<'a> CopyData<'a> {
    pub fn decode(body: &'a [u8]) -> Result<Self, ProtocolError> {
        Ok(Self { data: body })
    }
}

impl Encode for CopyData<'_> {
    const MSGTYPE: u8 = b'd';

    fn size_hint(&self) -> Result<u32, EncodeError> {
        self.data.len().to_u32()
    }

    fn encode(&self, mut buf: impl BufMut) {
        buf.put_slice(self.data);
    }
}

impl FrontendProtocol for CopyData<'_> { }
impl BackendProtocol for CopyData<'_> { }

empty_message! {
    /// Identifies the message as a COPY-complete indicator.
    CopyDone = b'c': FrontendProtocol, BackendProtocol;
}

/// Identifies the message as a COPY-failure indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CopyFail<'a> {
    /// An error message to report as the cause of failure.
    pub message: &'a str,
}

impl<'a> CopyFail<'a> {
    pub fn decode(mut body: &'a [u8]) -> Result<Self, ProtocolError> {
        let message = body.get_nul_str()?;
        body.ensure_empty()?;
        Ok(Self { message })
    }
}

impl Encode for CopyFail<'_> {
    const MSGTYPE: u8 = b'f';

    fn size_hint(&self) -> Result<u32, EncodeError> {
        self.message.nul_string_len()
    }

    fn encode(&self, mut buf: impl BufMut) {
        buf.put_nul_string(self.message);
    }
}

impl FrontendProtocol for CopyFail<'_> { }

macro_rules! copy_response {
    ($(
        $(#[$doc:meta])*
        $name:ident = $msgtype:literal;
    )*) => {
        $(
            $(#[$doc])*
            #[derive(Debug, Clone, PartialEq, Eq)]
            pub struct $name {
                /// Overall COPY format, [`Text`][PgFormat::Text] or [`Binary`][PgFormat::Binary].
                pub format: PgFormat,
                /// The format codes to be used for each column.
                ///
                /// Each must presently be zero (text) if the overall copy format is textual.
                pub column_formats: Vec<PgFormat>,
            }

            impl $name {
                pub fn decode(body: &[u8]) -> Result<Self, ProtocolError> {
                    let (format, column_formats) = decode_copy_response(body)?;
                    Ok(Self { format, column_formats })
                }
            }

            impl Encode for $name {
                const MSGTYPE: u8 = $msgtype;

                fn size_hint(&self) -> Result<u32, EncodeError> {
                    Ok(1 + encode::u16_list_size(self.column_formats.len())?)
                }

                fn encode(&self, mut buf: impl BufMut) {
                    buf.put_u8(self.format.format_code() as u8);
                    buf.put_u16(self.column_formats.len() as u16);
                    for format in &self.column_formats {
                        buf.put_u16(format.format_code());
                    }
                }
            }

            impl BackendProtocol for $name { }
        )*
    };
}

copy_response! {
    /// Identifies the message as a Start Copy In response.
    ///
    /// The frontend must now send copy-in data (if not prepared to do so, send a `CopyFail` message).
    CopyInResponse = b'G';
    /// Identifies the message as a Start Copy Out response.
    ///
    /// This message will be followed by copy-out data.
    CopyOutResponse = b'H';
    /// Identifies the message as a Start Copy Both response.
    ///
    /// This message is used only for Streaming Replication.
    CopyBothResponse = b'W';
}

fn decode_copy_response(mut body: &[u8]) -> Result<(PgFormat, Vec<PgFormat>), ProtocolError> {
    let format = PgFormat::from_code(body.try_get_u8()? as u16)?;
    let len = body.try_get_u16()?;
    let mut column_formats = Vec::with_capacity(len as usize);
    for _ in 0..len {
        column_formats.push(PgFormat::from_code(body.try_get_u16()?)?);
    }
    body.ensure_empty()?;
    Ok((format, column_formats))
}
