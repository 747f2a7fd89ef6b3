//! Postgres Backend Messages
//!
//! Every backend message can be encoded. Decoding is limited to the
//! messages needed to observe a backend, see [`BackendMessage`].
//!
//! <https://www.postgresql.org/docs/current/protocol-message-formats.html>
use bytes::{Buf, BufMut, BytesMut};

use super::{
    CommandType, EncodeError, ErrorField, Field, Frame, Oid, PgFormat, PgType, ProtocolError,
    TransactionStatus, TypeLookup, command,
    encode::{self, BackendProtocol, Encode, empty_message},
};
use crate::{
    common::verbose,
    ext::{BufMutExt, SliceExt, StrExt, UsizeExt, len_bytes_size},
};

/// Maximum number of parameter in a prepared statement.
pub const MAX_PARAMETERS: u16 = i16::MAX as u16;

/// Identifies the message as an authentication request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Authentication<'a> {
    /// Specifies that the authentication was successful.
    Ok,
    /// Specifies that Kerberos V5 authentication is required.
    KerberosV5,
    /// Specifies that a clear-text password is required.
    CleartextPassword,
    /// Specifies that an MD5-encrypted password is required.
    MD5Password {
        /// The salt to use when encrypting the password.
        salt: [u8; 4],
    },
    /// Specifies that GSSAPI authentication is required.
    GSS,
    /// GSSAPI or SSPI authentication data.
    GSSContinue {
        data: &'a [u8],
    },
    /// Specifies that SSPI authentication is required.
    SSPI,
    /// Specifies that SASL authentication is required.
    SASL {
        /// List of SASL authentication mechanisms, in the server's order of preference.
        mechanisms: Vec<&'a str>,
    },
    /// Specifies that this message contains a SASL challenge.
    SASLContinue {
        /// SASL data, specific to the SASL mechanism being used.
        data: &'a [u8],
    },
    /// Specifies that SASL authentication has completed.
    SASLFinal {
        /// SASL outcome "additional data", specific to the SASL mechanism being used.
        data: &'a [u8],
    },
}

impl Authentication<'_> {
    /// Authentication request code.
    pub const fn code(&self) -> u32 {
        match self {
            Self::Ok => 0,
            Self::KerberosV5 => 2,
            Self::CleartextPassword => 3,
            Self::MD5Password { .. } => 5,
            Self::GSS => 7,
            Self::GSSContinue { .. } => 8,
            Self::SSPI => 9,
            Self::SASL { .. } => 10,
            Self::SASLContinue { .. } => 11,
            Self::SASLFinal { .. } => 12,
        }
    }
}

impl Encode for Authentication<'_> {
    const MSGTYPE: u8 = b'R';

    fn size_hint(&self) -> Result<u32, EncodeError> {
        let body = match self {
            Self::Ok | Self::KerberosV5 | Self::CleartextPassword | Self::GSS | Self::SSPI => 0,
            Self::MD5Password { .. } => 4,
            Self::GSSContinue { data } | Self::SASLContinue { data } | Self::SASLFinal { data } => {
                data.len().to_u32()?
            }
            Self::SASL { mechanisms } => {
                let mut size = 1;
                for name in mechanisms {
                    size = encode::add_size(size, name.nul_string_len()?)?;
                }
                size
            }
        };
        encode::add_size(4, body)
    }

    fn encode(&self, mut buf: impl BufMut) {
        buf.put_u32(self.code());
        match self {
            Self::Ok | Self::KerberosV5 | Self::CleartextPassword | Self::GSS | Self::SSPI => {}
            Self::MD5Password { salt } => buf.put_slice(salt),
            Self::GSSContinue { data } | Self::SASLContinue { data } | Self::SASLFinal { data } => {
                buf.put_slice(data)
            }
            Self::SASL { mechanisms } => {
                for name in mechanisms {
                    buf.put_nul_string(name);
                }
                // A zero byte is required as terminator after the last authentication mechanism name.
                buf.put_u8(b'\0');
            }
        }
    }
}

/// Identifies the message as cancellation key data.
///
/// The frontend must save these values if it wishes to be able to issue CancelRequest messages later.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackendKeyData {
    /// The process ID of this backend.
    pub process_id: u32,
    /// The secret key of this backend.
    pub secret_key: u32,
}

impl Encode for BackendKeyData {
    const MSGTYPE: u8 = b'K';

    fn size_hint(&self) -> Result<u32, EncodeError> {
        Ok(8)
    }

    fn encode(&self, mut buf: impl BufMut) {
        buf.put_u32(self.process_id);
        buf.put_u32(self.secret_key);
    }
}

empty_message! {
    /// Identifies the message as a Bind-complete indicator.
    BindComplete = b'2': BackendProtocol;
    /// Identifies the message as a Close-complete indicator.
    CloseComplete = b'3': BackendProtocol;
    /// Identifies the message as a response to an empty query string.
    ///
    /// This substitutes for `CommandComplete`.
    EmptyQueryResponse = b'I': BackendProtocol;
    /// Identifies the message as a no-data indicator.
    NoData = b'n': BackendProtocol;
    /// Identifies the message as a Parse-complete indicator.
    ParseComplete = b'1': BackendProtocol;
    /// Identifies the message as a portal-suspended indicator.
    ///
    /// Note this only appears if an Execute message's row-count limit was reached.
    PortalSuspended = b's': BackendProtocol;
}

/// Identifies the message as a command-completed response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandComplete {
    pub command: CommandType,
    /// Number of rows affected, retrieved, moved, fetched or copied.
    pub rows: u64,
}

impl CommandComplete {
    pub fn decode(mut body: &[u8]) -> Result<Self, ProtocolError> {
        let (command, rows) = command::parse_tag(body.get_nul_str()?)?;
        body.ensure_empty()?;
        Ok(Self { command, rows })
    }
}

impl Encode for CommandComplete {
    const MSGTYPE: u8 = b'C';

    fn size_hint(&self) -> Result<u32, EncodeError> {
        encode::add_size(command::tag_len(self.command, self.rows).to_u32()?, 1)
    }

    fn encode(&self, mut buf: impl BufMut) {
        command::put_tag(&mut buf, self.command, self.rows);
        buf.put_u8(b'\0');
    }
}

/// Identifies the message as a data row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataRow<'a> {
    /// Column values, `None` is SQL `NULL`.
    pub columns: Vec<Option<&'a [u8]>>,
}

impl<'a> DataRow<'a> {
    pub fn decode(mut body: &'a [u8]) -> Result<Self, ProtocolError> {
        let len = body.try_get_u16()?;
        let mut columns = Vec::with_capacity(len as usize);
        for _ in 0..len {
            columns.push(body.get_len_bytes()?);
        }
        body.ensure_empty()?;
        Ok(Self { columns })
    }
}

impl Encode for DataRow<'_> {
    const MSGTYPE: u8 = b'D';

    fn size_hint(&self) -> Result<u32, EncodeError> {
        self.columns.len().to_count(u16::MAX)?;
        let mut size = 2u32;
        for column in &self.columns {
            size = encode::add_size(size, len_bytes_size(*column)?)?;
        }
        Ok(size)
    }

    fn encode(&self, mut buf: impl BufMut) {
        buf.put_u16(self.columns.len() as u16);
        for column in &self.columns {
            buf.put_len_bytes(*column);
        }
    }
}

macro_rules! error_fields {
    ($(
        $(#[$doc:meta])*
        $name:ident = $msgtype:literal;
    )*) => {
        $(
            $(#[$doc])*
            ///
            /// The message body consists of one or more identified fields, followed by a zero byte as a terminator.
            /// Fields can appear in any order.
            ///
            /// Since more field types might be added in future,
            /// frontends should silently ignore fields of unrecognized type.
            #[derive(Debug, Clone, Default, PartialEq, Eq)]
            pub struct $name<'a> {
                pub fields: Vec<ErrorField<'a>>,
            }

            impl<'a> $name<'a> {
                pub fn decode(body: &'a [u8]) -> Result<Self, ProtocolError> {
                    Ok(Self { fields: decode_fields(body)? })
                }

                /// Find field value by code.
                pub fn get(&self, code: u8) -> Option<&'a str> {
                    super::field::error_field(&self.fields, code)
                }
            }

            impl Encode for $name<'_> {
                const MSGTYPE: u8 = $msgtype;

                fn size_hint(&self) -> Result<u32, EncodeError> {
                    let mut size = 1;
                    for field in &self.fields {
                        size = encode::sum_size([size, 1, field.value.nul_string_len()?])?;
                    }
                    Ok(size)
                }

                fn encode(&self, mut buf: impl BufMut) {
                    for field in &self.fields {
                        buf.put_u8(field.code);
                        buf.put_nul_string(field.value);
                    }
                    buf.put_u8(b'\0');
                }
            }

            impl BackendProtocol for $name<'_> { }
        )*
    };
}

error_fields! {
    /// Identifies the message as an error.
    ErrorResponse = b'E';
    /// A warning message. The frontend should display the message.
    NoticeResponse = b'N';
}

fn decode_fields(mut body: &[u8]) -> Result<Vec<ErrorField<'_>>, ProtocolError> {
    let mut fields = vec![];
    loop {
        let code = body.try_get_u8()?;
        if code == b'\0' {
            break;
        }
        fields.push(ErrorField { code, value: body.get_nul_str()? });
    }
    body.ensure_empty()?;
    Ok(fields)
}

/// Identifies the message as a function call result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FunctionCallResponse<'a> {
    /// The value of the function result, `None` is SQL `NULL`.
    pub value: Option<&'a [u8]>,
}

impl Encode for FunctionCallResponse<'_> {
    const MSGTYPE: u8 = b'V';

    fn size_hint(&self) -> Result<u32, EncodeError> {
        len_bytes_size(self.value)
    }

    fn encode(&self, mut buf: impl BufMut) {
        buf.put_len_bytes(self.value);
    }
}

/// Identifies the message as a protocol version negotiation message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NegotiateProtocolVersion<'a> {
    /// Newest minor protocol version supported by the server for the major protocol version requested by the client.
    pub minor: u32,
    /// Protocol options not recognized by the server.
    pub unrecognized: Vec<&'a str>,
}

impl Encode for NegotiateProtocolVersion<'_> {
    const MSGTYPE: u8 = b'v';

    fn size_hint(&self) -> Result<u32, EncodeError> {
        let mut size = 4 + 4;
        for option in &self.unrecognized {
            size = encode::add_size(size, option.nul_string_len()?)?;
        }
        Ok(size)
    }

    fn encode(&self, mut buf: impl BufMut) {
        buf.put_u32(self.minor);
        buf.put_u32(self.unrecognized.len() as u32);
        for option in &self.unrecognized {
            buf.put_nul_string(option);
        }
    }
}

/// Identifies the message as a notification response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotificationResponse<'a> {
    /// The process ID of the notifying backend process.
    pub process_id: u32,
    /// The name of the channel that the notify has been raised on.
    pub channel: &'a str,
    /// The “payload” string passed from the notifying process.
    pub payload: &'a str,
}

impl Encode for NotificationResponse<'_> {
    const MSGTYPE: u8 = b'A';

    fn size_hint(&self) -> Result<u32, EncodeError> {
        encode::sum_size([4, self.channel.nul_string_len()?, self.payload.nul_string_len()?])
    }

    fn encode(&self, mut buf: impl BufMut) {
        buf.put_u32(self.process_id);
        buf.put_nul_string(self.channel);
        buf.put_nul_string(self.payload);
    }
}

/// Identifies the message as a parameter description.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterDescription {
    /// Object ID of each parameter data type.
    ///
    /// Encoding fails with more than [`MAX_PARAMETERS`] entries.
    pub types: Vec<Oid>,
}

impl Encode for ParameterDescription {
    const MSGTYPE: u8 = b't';

    fn size_hint(&self) -> Result<u32, EncodeError> {
        let len = self.types.len().to_count(MAX_PARAMETERS)? as u32;
        Ok(2 + 4 * len)
    }

    fn encode(&self, mut buf: impl BufMut) {
        buf.put_u16(self.types.len() as u16);
        for oid in &self.types {
            buf.put_u32(*oid);
        }
    }
}

/// Identifies the message as a run-time parameter status report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParameterStatus<'a> {
    /// The name of the run-time parameter being reported
    pub name: &'a str,
    /// The current value of the parameter
    pub value: &'a str,
}

impl<'a> ParameterStatus<'a> {
    pub fn decode(mut body: &'a [u8]) -> Result<Self, ProtocolError> {
        let name = body.get_nul_str()?;
        let value = body.get_nul_str()?;
        body.ensure_empty()?;
        Ok(Self { name, value })
    }
}

impl Encode for ParameterStatus<'_> {
    const MSGTYPE: u8 = b'S';

    fn size_hint(&self) -> Result<u32, EncodeError> {
        encode::add_size(self.name.nul_string_len()?, self.value.nul_string_len()?)
    }

    fn encode(&self, mut buf: impl BufMut) {
        buf.put_nul_string(self.name);
        buf.put_nul_string(self.value);
    }
}

/// Identifies the message type, ReadyForQuery is sent whenever the backend is ready for a new query cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadyForQuery {
    pub status: TransactionStatus,
}

impl ReadyForQuery {
    pub fn decode(mut body: &[u8]) -> Result<Self, ProtocolError> {
        let status = TransactionStatus::from_byte(body.try_get_u8()?)?;
        body.ensure_empty()?;
        Ok(Self { status })
    }
}

impl Encode for ReadyForQuery {
    const MSGTYPE: u8 = b'Z';

    fn size_hint(&self) -> Result<u32, EncodeError> {
        Ok(1)
    }

    fn encode(&self, mut buf: impl BufMut) {
        buf.put_u8(self.status.as_byte());
    }
}

/// Identifies the message as a row description
///
/// Field names are not measured upfront, to write this message use [`RowDescription::write`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowDescription<'a> {
    pub fields: Vec<Field<'a>>,
}

impl<'a> RowDescription<'a> {
    pub const MSGTYPE: u8 = b'T';

    /// Decode body, each type oid is resolved with `types`.
    ///
    /// Unknown oid yields [`PgType::unresolved`].
    pub fn decode(mut body: &'a [u8], types: &impl TypeLookup) -> Result<Self, ProtocolError> {
        let len = body.try_get_u16()?;
        let mut fields = Vec::with_capacity(len as usize);
        for _ in 0..len {
            let name = body.get_nul_str()?;
            let table_oid = body.try_get_u32()?;
            let column_idx = body.try_get_u16()?;
            let oid = body.try_get_u32()?;
            let byte_len = body.try_get_i16()?;
            let type_modifier = body.try_get_i32()?;
            let format = PgFormat::from_code(body.try_get_u16()?)?;
            let pg_type = types.lookup(oid).unwrap_or(PgType::unresolved(oid, byte_len));
            fields.push(Field { name, table_oid, column_idx, pg_type, type_modifier, format });
        }
        body.ensure_empty()?;
        Ok(Self { fields })
    }

    /// Write message to `buf`.
    ///
    /// The length is written as `-1` first, then patched once the body is written.
    /// On error nothing is written.
    pub fn write(&self, buf: &mut BytesMut) -> Result<(), EncodeError> {
        let count = self.fields.len().to_count(u16::MAX)?;
        for field in &self.fields {
            field.name.nul_string_len()?;
        }

        let offset = buf.len();
        buf.put_u8(Self::MSGTYPE);
        buf.put_i32(-1);
        buf.put_u16(count);

        for field in &self.fields {
            buf.put_nul_string(field.name);
            buf.put_u32(field.table_oid);
            buf.put_u16(field.column_idx);
            buf.put_u32(field.pg_type.oid);
            buf.put_i16(field.pg_type.byte_len);
            buf.put_i32(field.type_modifier);
            buf.put_u16(field.format.format_code());
        }

        let len = match encode::checked_len(buf.len() - offset - 1) {
            Ok(ok) => ok,
            Err(err) => {
                buf.truncate(offset);
                return Err(err);
            }
        };
        let mut written_buf = &mut buf[offset + 1..];
        written_buf.put_u32(len);

        verbose!(fields = self.fields.len(), len, "write RowDescription");

        Ok(())
    }
}

impl BackendProtocol for Authentication<'_> { }
impl BackendProtocol for BackendKeyData { }
impl BackendProtocol for CommandComplete { }
impl BackendProtocol for DataRow<'_> { }
impl BackendProtocol for FunctionCallResponse<'_> { }
impl BackendProtocol for NegotiateProtocolVersion<'_> { }
impl BackendProtocol for NotificationResponse<'_> { }
impl BackendProtocol for ParameterDescription { }
impl BackendProtocol for ParameterStatus<'_> { }
impl BackendProtocol for ReadyForQuery { }

/// Backend messages that can be decoded.
///
/// The set is what a proxy or an observer need to follow query results,
/// any other message type is rejected as unknown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendMessage<'a> {
    CommandComplete(CommandComplete),
    DataRow(DataRow<'a>),
    ErrorResponse(ErrorResponse<'a>),
    ParameterStatus(ParameterStatus<'a>),
    ReadyForQuery(ReadyForQuery),
    RowDescription(RowDescription<'a>),
}

impl<'a> BackendMessage<'a> {
    /// Decode one frame received by the frontend.
    ///
    /// Any error is a protocol violation, the connection should be closed.
    pub fn decode(frame: &'a Frame, types: &impl TypeLookup) -> Result<Self, ProtocolError> {
        let body = frame.payload();
        // backend never sends startup phase message
        let Some(msgtype) = frame.tag() else {
            return Err(ProtocolError::UnknownMessage { msgtype: 0, direction: "backend" });
        };

        verbose!(msgtype = %(msgtype as char), len = body.len(), "backend frame");

        let message = match msgtype {
            b'C' => Self::CommandComplete(CommandComplete::decode(body)?),
            b'D' => Self::DataRow(DataRow::decode(body)?),
            b'E' => Self::ErrorResponse(ErrorResponse::decode(body)?),
            b'S' => Self::ParameterStatus(ParameterStatus::decode(body)?),
            b'Z' => Self::ReadyForQuery(ReadyForQuery::decode(body)?),
            b'T' => Self::RowDescription(RowDescription::decode(body, types)?),
            msgtype => {
                #[cfg(feature = "log")]
                log::warn!("unknown backend message type {:?}", msgtype as char);
                return Err(ProtocolError::UnknownMessage { msgtype, direction: "backend" });
            }
        };

        Ok(message)
    }

    pub fn msgtype(&self) -> u8 {
        match self {
            Self::CommandComplete(_) => CommandComplete::MSGTYPE,
            Self::DataRow(_) => DataRow::MSGTYPE,
            Self::ErrorResponse(_) => ErrorResponse::MSGTYPE,
            Self::ParameterStatus(_) => ParameterStatus::MSGTYPE,
            Self::ReadyForQuery(_) => ReadyForQuery::MSGTYPE,
            Self::RowDescription(_) => RowDescription::MSGTYPE,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::postgres::{Phase, TypeLibrary};

    fn write<M: Encode>(msg: &M) -> BytesMut {
        let mut buf = BytesMut::new();
        encode::write(msg, &mut buf).unwrap();
        buf
    }

    fn to_frame(buf: BytesMut) -> Frame {
        Frame::new(Phase::Regular, buf.freeze())
    }

    fn decode(frame: &Frame) -> Result<BackendMessage<'_>, ProtocolError> {
        BackendMessage::decode(frame, TypeLibrary::standard())
    }

    #[test]
    fn fixed_layouts() {
        assert_eq!(&write(&ReadyForQuery { status: TransactionStatus::Idle })[..], b"Z\0\0\0\x05I");
        assert_eq!(&write(&Authentication::Ok)[..], b"R\0\0\0\x08\0\0\0\0");
        assert_eq!(&write(&Authentication::CleartextPassword)[..], b"R\0\0\0\x08\0\0\0\x03");
        assert_eq!(
            &write(&Authentication::MD5Password { salt: [1, 2, 3, 4] })[..],
            b"R\0\0\0\x0c\0\0\0\x05\x01\x02\x03\x04"
        );
        assert_eq!(
            &write(&BackendKeyData { process_id: 123, secret_key: 123 })[..],
            b"K\0\0\0\x0c\0\0\0\x7b\0\0\0\x7b"
        );
        assert_eq!(&write(&ParseComplete)[..], b"1\0\0\0\x04");
        assert_eq!(&write(&EmptyQueryResponse)[..], b"I\0\0\0\x04");
        assert_eq!(&write(&BindComplete)[..], b"2\0\0\0\x04");
        assert_eq!(&write(&CloseComplete)[..], b"3\0\0\0\x04");
        assert_eq!(&write(&NoData)[..], b"n\0\0\0\x04");
        assert_eq!(&write(&PortalSuspended)[..], b"s\0\0\0\x04");
    }

    #[test]
    fn authentication_layouts() {
        assert_eq!(&write(&Authentication::KerberosV5)[..], b"R\0\0\0\x08\0\0\0\x02");
        assert_eq!(&write(&Authentication::GSS)[..], b"R\0\0\0\x08\0\0\0\x07");
        assert_eq!(&write(&Authentication::SSPI)[..], b"R\0\0\0\x08\0\0\0\x09");
        assert_eq!(
            &write(&Authentication::GSSContinue { data: b"ab" })[..],
            b"R\0\0\0\x0a\0\0\0\x08ab"
        );
        assert_eq!(
            &write(&Authentication::SASLContinue { data: b"r=abc" })[..],
            b"R\0\0\0\x0d\0\0\0\x0br=abc"
        );
        assert_eq!(
            &write(&Authentication::SASLFinal { data: b"v=x" })[..],
            b"R\0\0\0\x0b\0\0\0\x0cv=x"
        );
    }

    #[test]
    fn notification_response() {
        let msg = NotificationResponse { process_id: 1, channel: "c", payload: "p" };
        assert_eq!(&write(&msg)[..], b"A\0\0\0\x0c\0\0\0\x01c\0p\0");
    }

    #[test]
    fn function_call_response() {
        let msg = FunctionCallResponse { value: Some(&b"x"[..]) };
        assert_eq!(&write(&msg)[..], b"V\0\0\0\x09\0\0\0\x01x");
        let msg = FunctionCallResponse { value: None };
        assert_eq!(&write(&msg)[..], b"V\0\0\0\x08\xff\xff\xff\xff");
    }

    #[test]
    fn notice_response() {
        let msg = NoticeResponse { fields: vec![ErrorField::new(ErrorField::MESSAGE, "hi")] };
        assert_eq!(&write(&msg)[..], b"N\0\0\0\x09Mhi\0\0");
        assert_eq!(NoticeResponse::decode(b"Mhi\0\0").unwrap(), msg);
        assert!(matches!(NoticeResponse::decode(b"Mhi\0\0M"), Err(ProtocolError::TrailingBytes(1))));
    }

    #[test]
    fn sasl_mechanisms() {
        let msg = Authentication::SASL { mechanisms: vec!["SCRAM-SHA-256"] };
        assert_eq!(&write(&msg)[..], b"R\0\0\0\x17\0\0\0\x0aSCRAM-SHA-256\0\0");
    }

    #[test]
    fn command_complete() {
        let buf = write(&CommandComplete { command: CommandType::Insert, rows: 1 });
        assert_eq!(&buf[..], b"C\0\0\0\x0fINSERT 0 1\0");

        let frame = to_frame(write(&CommandComplete { command: CommandType::Select, rows: 3 }));
        assert_eq!(
            decode(&frame).unwrap(),
            BackendMessage::CommandComplete(CommandComplete { command: CommandType::Select, rows: 3 })
        );

        let frame = to_frame(BytesMut::from(&b"C\0\0\0\x0bSELECT\0"[..]));
        assert!(matches!(decode(&frame), Err(ProtocolError::InvalidCommandTag(tag)) if tag == "SELECT"));
    }

    #[test]
    fn row_description() {
        let msg = RowDescription {
            fields: vec![Field::new("col1", PgType::VARCHAR), Field::new("col2", PgType::INT4)],
        };
        let mut buf = BytesMut::new();
        msg.write(&mut buf).unwrap();

        let len = u32::from_be_bytes([buf[1], buf[2], buf[3], buf[4]]);
        assert_eq!(len as usize, buf.len() - 1);

        let frame = to_frame(buf);
        let BackendMessage::RowDescription(decoded) = decode(&frame).unwrap() else {
            panic!("expected RowDescription")
        };
        assert_eq!(decoded, msg);

        // oid missing from lookup keeps the wire size
        let decoded = RowDescription::decode(frame.payload(), &|_: Oid| None::<PgType>).unwrap();
        assert_eq!(decoded.fields[1].pg_type, PgType::unresolved(23, 4));
        assert_eq!(decoded.fields[0].name, "col1");

        let mut buf = BytesMut::from(&b"Z\0\0\0\x05I"[..]);
        let msg = RowDescription { fields: vec![Field::new("a\0b", PgType::TEXT)] };
        assert!(matches!(msg.write(&mut buf), Err(EncodeError::InteriorNul(1))));
        assert_eq!(&buf[..], b"Z\0\0\0\x05I");
    }

    #[test]
    fn data_row() {
        let msg = DataRow { columns: vec![Some(&b"foo"[..]), None, Some(&b""[..])] };
        let buf = write(&msg);
        assert_eq!(&buf[..], b"D\0\0\0\x15\0\x03\0\0\0\x03foo\xff\xff\xff\xff\0\0\0\0");
        assert_eq!(decode(&to_frame(buf)).unwrap(), BackendMessage::DataRow(msg));
    }

    #[test]
    fn error_response() {
        let msg = ErrorResponse {
            fields: vec![
                ErrorField::new(ErrorField::SEVERITY, "ERROR"),
                ErrorField::new(ErrorField::CODE, "42P01"),
                ErrorField::new(ErrorField::MESSAGE, "relation does not exist"),
            ],
        };
        let frame = to_frame(write(&msg));
        let BackendMessage::ErrorResponse(decoded) = decode(&frame).unwrap() else {
            panic!("expected ErrorResponse")
        };
        assert_eq!(decoded.get(ErrorField::CODE), Some("42P01"));
        assert_eq!(decoded, msg);
    }

    #[test]
    fn parameter_status() {
        let msg = ParameterStatus { name: "client_encoding", value: "UTF8" };
        let frame = to_frame(write(&msg));
        assert_eq!(decode(&frame).unwrap(), BackendMessage::ParameterStatus(msg));

        let frame = Frame::new(Phase::Regular, bytes::Bytes::from_static(b"S\0\0\0\x0aa\0b\0xx"));
        assert!(matches!(decode(&frame), Err(ProtocolError::TrailingBytes(2))));

        let mut buf = BytesMut::new();
        let msg = ParameterStatus { name: "application_name", value: "psql\0admin" };
        assert!(matches!(encode::write(&msg, &mut buf), Err(EncodeError::InteriorNul(4))));
        assert!(buf.is_empty());
    }

    #[test]
    fn ready_for_query() {
        let frame = to_frame(write(&ReadyForQuery { status: TransactionStatus::Failed }));
        assert_eq!(
            decode(&frame).unwrap(),
            BackendMessage::ReadyForQuery(ReadyForQuery { status: TransactionStatus::Failed })
        );
        let frame = Frame::new(Phase::Regular, bytes::Bytes::from_static(b"Z\0\0\0\x05Q"));
        assert!(matches!(decode(&frame), Err(ProtocolError::InvalidTransactionStatus(b'Q'))));
    }

    #[test]
    fn parameter_description_capacity() {
        let mut buf = BytesMut::new();
        let msg = ParameterDescription { types: vec![23; 32_768] };
        assert!(matches!(
            encode::write(&msg, &mut buf),
            Err(EncodeError::TooManyEntries { count: 32_768, max: 32_767 })
        ));
        assert!(buf.is_empty());

        let msg = ParameterDescription { types: vec![23; 32_767] };
        encode::write(&msg, &mut buf).unwrap();
        assert_eq!(buf.len(), 1 + 4 + 2 + 4 * 32_767);
    }

    #[test]
    fn negotiate_protocol_version() {
        let msg = NegotiateProtocolVersion { minor: 0, unrecognized: vec!["_pq_.foo"] };
        assert_eq!(&write(&msg)[..], b"v\0\0\0\x15\0\0\0\0\0\0\0\x01_pq_.foo\0");
    }

    #[test]
    fn unknown_tag() {
        let frame = to_frame(write(&BindComplete));
        assert!(matches!(
            decode(&frame),
            Err(ProtocolError::UnknownMessage { msgtype: b'2', direction: "backend" })
        ));
    }
}
