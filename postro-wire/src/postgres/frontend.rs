//! Postgres Frontend Messages
//!
//! Every message here can be decoded from a [`Frame`] received by a server,
//! and encoded by a client or a proxy.
//!
//! <https://www.postgresql.org/docs/current/protocol-message-formats.html>
use bytes::{Buf, BufMut, BytesMut};

use super::{
    CANCEL_REQUEST_CODE, EncodeError, Frame, GSSENC_REQUEST_CODE, Oid, PROTOCOL_VERSION_3, ParameterBound,
    PgFormat, Phase, ProtocolError, SSL_REQUEST_CODE, TargetType,
    auth::PasswordLike,
    copy::{CopyData, CopyDone, CopyFail},
    encode::{self, Encode, FrontendProtocol, empty_message},
};
use crate::{
    common::{span, verbose},
    ext::{BufMutExt, SliceExt, StrExt, UsizeExt, len_bytes_size},
};

/// Postgres Startup frontend message
///
/// For historical reasons, the very first message sent by the client (the [`Startup`] message)
/// has no initial message-type byte, thus [`Startup`] does not implement [`Encode`].
///
/// To write startup message, use [`Startup::write`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Startup<'a> {
    /// Parameter name and value pairs, in the order they were sent.
    ///
    /// `user` is required, `database` defaults to the user name. Parameter names beginning
    /// with `_pq_.` are reserved for use as protocol extensions, while others are
    /// treated as run-time parameters to be set at backend start time.
    pub parameters: Vec<(&'a str, &'a str)>,
}

impl<'a> Startup<'a> {
    /// Decode the body following the protocol version.
    ///
    /// Pairs are read until the body is exhausted, a single trailing zero terminator is accepted.
    pub fn decode(mut body: &'a [u8]) -> Result<Self, ProtocolError> {
        let mut parameters = vec![];
        loop {
            if let [] | [b'\0'] = body {
                break;
            }
            let name = body.get_nul_str()?;
            if body.is_empty() {
                return Err(ProtocolError::MalformedStartup);
            }
            let value = body.get_nul_str().map_err(|err| match err {
                ProtocolError::MissingNul => ProtocolError::MalformedStartup,
                err => err,
            })?;
            parameters.push((name, value));
        }
        Ok(Self { parameters })
    }

    /// Get the first parameter value with given name.
    pub fn get(&self, name: &str) -> Option<&'a str> {
        self.parameters.iter().find(|(k, _)| *k == name).map(|(_, v)| *v)
    }

    /// The database user name to connect as.
    pub fn user(&self) -> Option<&'a str> {
        self.get("user")
    }

    /// The database to connect to, defaults to the user name.
    pub fn database(&self) -> Option<&'a str> {
        self.get("database").or_else(|| self.user())
    }

    /// Write startup message to `buf`, on error nothing is written.
    pub fn write(&self, buf: &mut BytesMut) -> Result<(), EncodeError> {
        for (name, value) in &self.parameters {
            name.nul_string_len()?;
            value.nul_string_len()?;
        }

        let offset = buf.len();

        // Length of message contents in bytes, including self.
        // reserve 4 bytes for length
        buf.put_u32(0);

        // The most significant 16 bits are the major version number (3 for the protocol described here).
        // The least significant 16 bits are the minor version number (0 for the protocol described here).
        buf.put_i32(PROTOCOL_VERSION_3);

        for (name, value) in &self.parameters {
            buf.put_nul_string(name);
            buf.put_nul_string(value);
        }

        // A zero byte is required as a terminator after the last name/value pair.
        buf.put_u8(b'\0');

        // write the length
        let len = match encode::checked_len(buf.len() - offset) {
            Ok(ok) => ok,
            Err(err) => {
                buf.truncate(offset);
                return Err(err);
            }
        };
        let mut written_buf = &mut buf[offset..];
        written_buf.put_u32(len);

        Ok(())
    }
}

macro_rules! request_code {
    ($(
        $(#[$doc:meta])*
        $name:ident = $code:ident;
    )*) => {
        $(
            $(#[$doc])*
            #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
            pub struct $name;

            impl $name {
                /// Write request to `buf`, it has no message type.
                pub fn write(&self, buf: &mut BytesMut) {
                    buf.reserve(8);
                    buf.put_u32(8);
                    buf.put_i32($code);
                }
            }
        )*
    };
}

request_code! {
    /// Request the connection to be encrypted with SSL.
    ///
    /// The server then responds with a single byte containing `S` or `N`,
    /// indicating that it is willing or unwilling to perform SSL, respectively.
    SslRequest = SSL_REQUEST_CODE;
    /// Request the connection to be encrypted with GSSAPI.
    ///
    /// The server then responds with a single byte containing `G` or `N`.
    GssEncRequest = GSSENC_REQUEST_CODE;
}

/// Request to cancel a query in progress, sent on a new connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CancelRequest {
    /// The process ID of the target backend.
    pub process_id: u32,
    /// The secret key for the target backend.
    pub secret_key: u32,
}

impl CancelRequest {
    pub fn decode(mut body: &[u8]) -> Result<Self, ProtocolError> {
        let process_id = body.try_get_u32()?;
        let secret_key = body.try_get_u32()?;
        body.ensure_empty()?;
        Ok(Self { process_id, secret_key })
    }

    /// Write request to `buf`, it has no message type.
    pub fn write(&self, buf: &mut BytesMut) {
        buf.reserve(16);
        buf.put_u32(16);
        buf.put_i32(CANCEL_REQUEST_CODE);
        buf.put_u32(self.process_id);
        buf.put_u32(self.secret_key);
    }
}

/// Identifies the message as a Bind command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bind<'a> {
    /// The name of the destination portal (an empty string selects the unnamed portal).
    pub portal: &'a str,
    /// The name of the source prepared statement (an empty string selects the unnamed prepared statement).
    pub statement: &'a str,
    /// Parameter values, with the format of each already resolved.
    ///
    /// When encoding, the format codes are sent in the most compact form.
    pub params: Vec<ParameterBound<'a>>,
    /// The result-columns [`PgFormat`].
    ///
    /// This can be empty to indicate that there are no result columns or that the result
    /// columns should all use the default format (text); or one, in which case the
    /// specified format code is applied to all result columns (if any); or it can equal
    /// the actual number of result columns of the query.
    pub result_formats: Vec<PgFormat>,
}

impl<'a> Bind<'a> {
    pub fn decode(mut body: &'a [u8]) -> Result<Self, ProtocolError> {
        let portal = body.get_nul_str()?;
        let statement = body.get_nul_str()?;
        let params = get_params(&mut body)?;
        let result_formats = get_formats(&mut body)?;
        body.ensure_empty()?;
        Ok(Self { portal, statement, params, result_formats })
    }
}

impl Encode for Bind<'_> {
    const MSGTYPE: u8 = b'B';

    fn size_hint(&self) -> Result<u32, EncodeError> {
        encode::sum_size([
            self.portal.nul_string_len()?,
            self.statement.nul_string_len()?,
            params_size(&self.params)?,
            encode::u16_list_size(self.result_formats.len())?,
        ])
    }

    fn encode(&self, mut buf: impl BufMut) {
        buf.put_nul_string(self.portal);
        buf.put_nul_string(self.statement);
        put_params(&mut buf, &self.params);
        buf.put_u16(self.result_formats.len() as u16);
        for format in &self.result_formats {
            buf.put_u16(format.format_code());
        }
    }
}

/// Identifies the message as a Parse command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parse<'a> {
    /// Prepared statement name (an empty string selects the unnamed prepared statement).
    pub name: &'a str,
    /// The query string to be parsed.
    pub query: &'a str,
    /// Specifies the object ID of the parameter data type.
    ///
    /// Note that this is not an indication of the number of parameters that might appear in the query string,
    /// only the number that the frontend wants to prespecify types for.
    ///
    /// Placing a zero here is equivalent to leaving the type unspecified.
    pub param_types: Vec<Oid>,
}

impl<'a> Parse<'a> {
    pub fn decode(mut body: &'a [u8]) -> Result<Self, ProtocolError> {
        let name = body.get_nul_str()?;
        let query = body.get_nul_str()?;
        let len = body.try_get_u16()?;
        let mut param_types = Vec::with_capacity(len as usize);
        for _ in 0..len {
            param_types.push(body.try_get_u32()?);
        }
        body.ensure_empty()?;
        Ok(Self { name, query, param_types })
    }
}

impl Encode for Parse<'_> {
    const MSGTYPE: u8 = b'P';

    fn size_hint(&self) -> Result<u32, EncodeError> {
        let len = self.param_types.len().to_count(u16::MAX)? as u32;
        encode::sum_size([self.name.nul_string_len()?, self.query.nul_string_len()?, 2 + 4 * len])
    }

    fn encode(&self, mut buf: impl BufMut) {
        buf.put_nul_string(self.name);
        buf.put_nul_string(self.query);
        buf.put_u16(self.param_types.len() as u16);
        for oid in &self.param_types {
            buf.put_u32(*oid);
        }
    }
}

/// Identifies the message as a simple query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Query<'a> {
    /// The query string itself, it may contain several queries separated by semicolon.
    pub sql: &'a str,
}

impl<'a> Query<'a> {
    pub fn decode(mut body: &'a [u8]) -> Result<Self, ProtocolError> {
        let sql = body.get_nul_str()?;
        body.ensure_empty()?;
        Ok(Self { sql })
    }
}

impl Encode for Query<'_> {
    const MSGTYPE: u8 = b'Q';

    fn size_hint(&self) -> Result<u32, EncodeError> {
        self.sql.nul_string_len()
    }

    fn encode(&self, mut buf: impl BufMut) {
        buf.put_nul_string(self.sql);
    }
}

macro_rules! target_message {
    ($(
        $(#[$doc:meta])*
        $name:ident = $msgtype:literal;
    )*) => {
        $(
            $(#[$doc])*
            #[derive(Debug, Clone, Copy, PartialEq, Eq)]
            pub struct $name<'a> {
                pub target: TargetType,
                /// The name of the prepared statement or portal
                /// (an empty string selects the unnamed prepared statement or portal).
                pub name: &'a str,
            }

            impl<'a> $name<'a> {
                pub fn decode(mut body: &'a [u8]) -> Result<Self, ProtocolError> {
                    let target = TargetType::from_byte(body.try_get_u8()?)?;
                    let name = body.get_nul_str()?;
                    body.ensure_empty()?;
                    Ok(Self { target, name })
                }
            }

            impl Encode for $name<'_> {
                const MSGTYPE: u8 = $msgtype;

                fn size_hint(&self) -> Result<u32, EncodeError> {
                    encode::add_size(1, self.name.nul_string_len()?)
                }

                fn encode(&self, mut buf: impl BufMut) {
                    buf.put_u8(self.target.as_byte());
                    buf.put_nul_string(self.name);
                }
            }

            impl FrontendProtocol for $name<'_> { }
        )*
    };
}

target_message! {
    /// Identifies the message as a Describe command.
    Describe = b'D';
    /// Identifies the message as a Close command.
    Close = b'C';
}

/// Identifies the message as a Execute command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Execute<'a> {
    /// The name of the portal to execute (an empty string selects the unnamed portal).
    pub portal: &'a str,
    /// Maximum number of rows to return, if portal contains a query that returns rows
    /// (ignored otherwise). Zero denotes “no limit”.
    pub max_rows: u32,
}

impl<'a> Execute<'a> {
    pub fn decode(mut body: &'a [u8]) -> Result<Self, ProtocolError> {
        let portal = body.get_nul_str()?;
        let max_rows = body.try_get_u32()?;
        body.ensure_empty()?;
        Ok(Self { portal, max_rows })
    }
}

impl Encode for Execute<'_> {
    const MSGTYPE: u8 = b'E';

    fn size_hint(&self) -> Result<u32, EncodeError> {
        encode::add_size(self.portal.nul_string_len()?, 4)
    }

    fn encode(&self, mut buf: impl BufMut) {
        buf.put_nul_string(self.portal);
        buf.put_u32(self.max_rows);
    }
}

/// Identifies the message as a function call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionCall<'a> {
    /// Specifies the object ID of the function to call.
    pub function: Oid,
    /// Arguments, with the format of each already resolved.
    pub arguments: Vec<ParameterBound<'a>>,
    /// The format code for the function result.
    pub result_format: PgFormat,
}

impl<'a> FunctionCall<'a> {
    pub fn decode(mut body: &'a [u8]) -> Result<Self, ProtocolError> {
        let function = body.try_get_u32()?;
        let arguments = get_params(&mut body)?;
        let result_format = PgFormat::from_code(body.try_get_u16()?)?;
        body.ensure_empty()?;
        Ok(Self { function, arguments, result_format })
    }
}

impl Encode for FunctionCall<'_> {
    const MSGTYPE: u8 = b'F';

    fn size_hint(&self) -> Result<u32, EncodeError> {
        encode::sum_size([4, params_size(&self.arguments)?, 2])
    }

    fn encode(&self, mut buf: impl BufMut) {
        buf.put_u32(self.function);
        put_params(&mut buf, &self.arguments);
        buf.put_u16(self.result_format.format_code());
    }
}

empty_message! {
    /// Identifies the message as a Flush command
    Flush = b'H': FrontendProtocol;
    /// Identifies the message as a Sync command
    Sync = b'S': FrontendProtocol;
    /// Identifies the message as a termination
    Terminate = b'X': FrontendProtocol;
}

impl FrontendProtocol for Bind<'_> { }
impl FrontendProtocol for Parse<'_> { }
impl FrontendProtocol for Query<'_> { }
impl FrontendProtocol for Execute<'_> { }
impl FrontendProtocol for FunctionCall<'_> { }

/// Read `Int16` count followed by that many format codes.
fn get_formats(body: &mut &[u8]) -> Result<Vec<PgFormat>, ProtocolError> {
    let len = body.try_get_u16()?;
    let mut formats = Vec::with_capacity(len as usize);
    for _ in 0..len {
        formats.push(PgFormat::from_code(body.try_get_u16()?)?);
    }
    Ok(formats)
}

/// Read format codes, then the parameter values.
///
/// Zero format code means every parameter is text, one means every parameter
/// use that format, otherwise there is one format code per parameter.
fn get_params<'a>(body: &mut &'a [u8]) -> Result<Vec<ParameterBound<'a>>, ProtocolError> {
    let formats = get_formats(body)?;
    let len = body.try_get_u16()?;

    let format_of = |i: usize| match formats.as_slice() {
        [] => Ok(PgFormat::Text),
        [format] => Ok(*format),
        formats if formats.len() == len as usize => Ok(formats[i]),
        formats => Err(ProtocolError::FormatCountMismatch { formats: formats.len() as u16, params: len }),
    };

    // validate even when there is no parameter
    if len == 0 {
        format_of(0)?;
    }

    let mut params = Vec::with_capacity(len as usize);
    for i in 0..len as usize {
        let format = format_of(i)?;
        let value = body.get_len_bytes()?;
        params.push(ParameterBound { format, value });
    }
    Ok(params)
}

/// Number of format codes sent for the parameters, in the most compact form.
fn format_count(params: &[ParameterBound]) -> usize {
    match params.first() {
        None => 0,
        Some(first) if params.iter().all(|p| p.format == first.format) => match first.format {
            PgFormat::Text => 0,
            PgFormat::Binary => 1,
        },
        Some(_) => params.len(),
    }
}

fn params_size(params: &[ParameterBound]) -> Result<u32, EncodeError> {
    let mut size = encode::u16_list_size(format_count(params))?;
    size += 2;
    params.len().to_count(u16::MAX)?;
    for param in params {
        size = encode::add_size(size, len_bytes_size(param.value)?)?;
    }
    Ok(size)
}

fn put_params(mut buf: impl BufMut, params: &[ParameterBound]) {
    let count = format_count(params);
    buf.put_u16(count as u16);
    for param in params.iter().take(count) {
        buf.put_u16(param.format.format_code());
    }
    buf.put_u16(params.len() as u16);
    for param in params {
        buf.put_len_bytes(param.value);
    }
}

/// Postgres frontend messages
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrontendMessage<'a> {
    Startup(Startup<'a>),
    SslRequest(SslRequest),
    GssEncRequest(GssEncRequest),
    CancelRequest(CancelRequest),
    Bind(Bind<'a>),
    Parse(Parse<'a>),
    Query(Query<'a>),
    PasswordLike(PasswordLike<'a>),
    Describe(Describe<'a>),
    Execute(Execute<'a>),
    Flush(Flush),
    Sync(Sync),
    Close(Close<'a>),
    Terminate(Terminate),
    CopyData(CopyData<'a>),
    CopyDone(CopyDone),
    CopyFail(CopyFail<'a>),
    FunctionCall(FunctionCall<'a>),
}

impl<'a> FrontendMessage<'a> {
    /// Decode one frame received by the backend.
    ///
    /// Any error is a protocol violation, the connection should be closed.
    pub fn decode(frame: &'a Frame) -> Result<Self, ProtocolError> {
        let mut body = frame.payload();

        let Some(msgtype) = frame.tag() else {
            debug_assert_eq!(frame.phase(), Phase::Startup);
            span!("startup");
            let version = body.try_get_i32()?;
            verbose!(version, "startup frame");
            let message = match version {
                SSL_REQUEST_CODE => Self::SslRequest(SslRequest),
                CANCEL_REQUEST_CODE => Self::CancelRequest(CancelRequest::decode(body)?),
                GSSENC_REQUEST_CODE => Self::GssEncRequest(GssEncRequest),
                PROTOCOL_VERSION_3 => Self::Startup(Startup::decode(body)?),
                version => return Err(ProtocolError::UnsupportedVersion(version)),
            };
            return Ok(message);
        };

        verbose!(msgtype = %(msgtype as char), len = body.len(), "frontend frame");

        let message = match msgtype {
            b'B' => Self::Bind(Bind::decode(body)?),
            b'P' => Self::Parse(Parse::decode(body)?),
            b'Q' => Self::Query(Query::decode(body)?),
            b'p' => Self::PasswordLike(PasswordLike::decode(body)),
            b'D' => Self::Describe(Describe::decode(body)?),
            b'E' => Self::Execute(Execute::decode(body)?),
            b'H' => Self::Flush(Flush),
            b'S' => Self::Sync(Sync),
            b'C' => Self::Close(Close::decode(body)?),
            b'X' => Self::Terminate(Terminate),
            b'd' => Self::CopyData(CopyData::decode(body)?),
            b'c' => Self::CopyDone(CopyDone),
            b'f' => Self::CopyFail(CopyFail::decode(body)?),
            b'F' => Self::FunctionCall(FunctionCall::decode(body)?),
            msgtype => {
                #[cfg(feature = "log")]
                log::warn!("unknown frontend message type {:?}", msgtype as char);
                return Err(ProtocolError::UnknownMessage { msgtype, direction: "frontend" });
            }
        };

        Ok(message)
    }

    /// Message type, `None` for startup phase messages.
    pub fn msgtype(&self) -> Option<u8> {
        Some(match self {
            Self::Startup(_) | Self::SslRequest(_) | Self::GssEncRequest(_) | Self::CancelRequest(_) => {
                return None;
            }
            Self::Bind(_) => Bind::MSGTYPE,
            Self::Parse(_) => Parse::MSGTYPE,
            Self::Query(_) => Query::MSGTYPE,
            Self::PasswordLike(_) => b'p',
            Self::Describe(_) => Describe::MSGTYPE,
            Self::Execute(_) => Execute::MSGTYPE,
            Self::Flush(_) => Flush::MSGTYPE,
            Self::Sync(_) => Sync::MSGTYPE,
            Self::Close(_) => Close::MSGTYPE,
            Self::Terminate(_) => Terminate::MSGTYPE,
            Self::CopyData(_) => CopyData::MSGTYPE,
            Self::CopyDone(_) => CopyDone::MSGTYPE,
            Self::CopyFail(_) => CopyFail::MSGTYPE,
            Self::FunctionCall(_) => FunctionCall::MSGTYPE,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::postgres::FrameDecoder;

    fn regular<M: Encode>(msg: &M) -> Frame {
        let mut buf = BytesMut::new();
        encode::write(msg, &mut buf).unwrap();
        Frame::new(Phase::Regular, buf.freeze())
    }

    fn startup(bytes: &[u8]) -> Frame {
        let mut buf = BytesMut::from(bytes);
        FrameDecoder::new().try_extract_frame(&mut buf).unwrap().unwrap()
    }

    #[test]
    fn cancel_request() {
        let mut buf = BytesMut::new();
        CancelRequest { process_id: 42, secret_key: 7 }.write(&mut buf);
        assert_eq!(buf.len(), 16);

        let frame = startup(&buf);
        assert_eq!(
            FrontendMessage::decode(&frame).unwrap(),
            FrontendMessage::CancelRequest(CancelRequest { process_id: 42, secret_key: 7 })
        );
    }

    #[test]
    fn startup_message() {
        let mut buf = BytesMut::new();
        buf.put_u32(34);
        buf.put_i32(196608);
        buf.put_slice(b"user\0alice\0database\0test\0\0");
        assert_eq!(buf.len(), 34);

        let frame = startup(&buf);
        let FrontendMessage::Startup(msg) = FrontendMessage::decode(&frame).unwrap() else {
            panic!("expected startup")
        };
        assert_eq!(msg.parameters, [("user", "alice"), ("database", "test")]);
        assert_eq!(msg.database(), Some("test"));

        let mut written = BytesMut::new();
        msg.write(&mut written).unwrap();
        assert_eq!(written, buf);
    }

    #[test]
    fn malformed_startup() {
        assert!(matches!(Startup::decode(b"user\0"), Err(ProtocolError::MalformedStartup)));
        assert!(matches!(Startup::decode(b"user\0alice"), Err(ProtocolError::MalformedStartup)));
        assert!(Startup::decode(b"").unwrap().parameters.is_empty());

        let mut buf = BytesMut::new();
        buf.put_u32(8);
        buf.put_i32(131072);
        assert!(matches!(
            FrontendMessage::decode(&startup(&buf)),
            Err(ProtocolError::UnsupportedVersion(131072))
        ));
    }

    #[test]
    fn ssl_request() {
        let mut buf = BytesMut::new();
        SslRequest.write(&mut buf);
        GssEncRequest.write(&mut buf);
        assert_eq!(&buf[..8], &[0, 0, 0, 8, 0x04, 0xd2, 0x16, 0x2f]);

        let mut decoder = FrameDecoder::new();
        let ssl = decoder.try_extract_frame(&mut buf).unwrap().unwrap();
        let gss = decoder.try_extract_frame(&mut buf).unwrap().unwrap();
        assert_eq!(FrontendMessage::decode(&ssl).unwrap(), FrontendMessage::SslRequest(SslRequest));
        assert_eq!(FrontendMessage::decode(&gss).unwrap(), FrontendMessage::GssEncRequest(GssEncRequest));
        assert!(decoder.is_expecting_startup());
    }

    fn bind_body(formats: &[u16], params: &[&[u8]]) -> Vec<u8> {
        let mut body = Vec::new();
        body.put_nul_string("portal");
        body.put_nul_string("stmt");
        body.put_u16(formats.len() as u16);
        for format in formats {
            body.put_u16(*format);
        }
        body.put_u16(params.len() as u16);
        for param in params {
            body.put_len_bytes(Some(*param));
        }
        body.put_u16(0);
        body
    }

    #[test]
    fn format_rule() {
        let params: &[&[u8]] = &[b"1", b"2", b"3"];

        let body = bind_body(&[], params);
        let bind = Bind::decode(&body).unwrap();
        assert_eq!((bind.portal, bind.statement), ("portal", "stmt"));
        assert!(bind.params.iter().all(|p| p.format == PgFormat::Text));

        let body = bind_body(&[1], params);
        let bind = Bind::decode(&body).unwrap();
        assert!(bind.params.iter().all(|p| p.format == PgFormat::Binary));

        let body = bind_body(&[1, 0, 1], params);
        let bind = Bind::decode(&body).unwrap();
        let formats: Vec<_> = bind.params.iter().map(|p| p.format).collect();
        assert_eq!(formats, [PgFormat::Binary, PgFormat::Text, PgFormat::Binary]);
        assert_eq!(bind.params[2].value, Some(&b"3"[..]));

        let body = bind_body(&[1, 0], params);
        assert!(matches!(
            Bind::decode(&body),
            Err(ProtocolError::FormatCountMismatch { formats: 2, params: 3 })
        ));

        let body = bind_body(&[2], params);
        assert!(matches!(Bind::decode(&body), Err(ProtocolError::InvalidFormat(2))));
    }

    #[test]
    fn bind_round_trip() {
        let bind = Bind {
            portal: "",
            statement: "s1",
            params: vec![
                ParameterBound::binary(&[0, 0, 0, 1]),
                ParameterBound::null(PgFormat::Text),
                ParameterBound::text(b""),
            ],
            result_formats: vec![PgFormat::Binary],
        };
        let frame = regular(&bind);
        assert_eq!(FrontendMessage::decode(&frame).unwrap(), FrontendMessage::Bind(bind));

        // uniform text parameters are sent without format codes
        let bind = Bind {
            portal: "",
            statement: "",
            params: vec![ParameterBound::text(b"a"), ParameterBound::text(b"b")],
            result_formats: vec![],
        };
        let frame = regular(&bind);
        assert_eq!(&frame.payload()[2..4], &[0, 0]);
        assert_eq!(FrontendMessage::decode(&frame).unwrap(), FrontendMessage::Bind(bind));
    }

    #[test]
    fn extended_query_round_trip() {
        let parse = Parse { name: "s1", query: "SELECT $1", param_types: vec![23, 0] };
        assert_eq!(FrontendMessage::decode(&regular(&parse)).unwrap(), FrontendMessage::Parse(parse));

        let describe = Describe { target: TargetType::Portal, name: "p1" };
        assert_eq!(
            FrontendMessage::decode(&regular(&describe)).unwrap(),
            FrontendMessage::Describe(describe)
        );

        let close = Close { target: TargetType::Statement, name: "s1" };
        assert_eq!(FrontendMessage::decode(&regular(&close)).unwrap(), FrontendMessage::Close(close));

        let execute = Execute { portal: "p1", max_rows: 0 };
        assert_eq!(FrontendMessage::decode(&regular(&execute)).unwrap(), FrontendMessage::Execute(execute));

        let call = FunctionCall {
            function: 1598,
            arguments: vec![ParameterBound::binary(b"xy")],
            result_format: PgFormat::Binary,
        };
        assert_eq!(
            FrontendMessage::decode(&regular(&call)).unwrap(),
            FrontendMessage::FunctionCall(call)
        );

        assert_eq!(FrontendMessage::decode(&regular(&Sync)).unwrap(), FrontendMessage::Sync(Sync));
        assert_eq!(regular(&Terminate).as_bytes(), b"X\0\0\0\x04");
    }

    #[test]
    fn copy_and_flush_round_trip() {
        let frame = regular(&Flush);
        assert_eq!(frame.as_bytes(), b"H\0\0\0\x04");
        assert_eq!(FrontendMessage::decode(&frame).unwrap(), FrontendMessage::Flush(Flush));

        let data = CopyData { data: b"1\tfoo\n" };
        let frame = regular(&data);
        assert_eq!(frame.as_bytes(), b"d\0\0\0\x0a1\tfoo\n");
        assert_eq!(FrontendMessage::decode(&frame).unwrap(), FrontendMessage::CopyData(data));

        let fail = CopyFail { message: "missing data" };
        let frame = regular(&fail);
        assert_eq!(frame.as_bytes(), b"f\0\0\0\x11missing data\0");
        assert_eq!(FrontendMessage::decode(&frame).unwrap(), FrontendMessage::CopyFail(fail));

        let frame = regular(&CopyDone);
        assert_eq!(FrontendMessage::decode(&frame).unwrap(), FrontendMessage::CopyDone(CopyDone));
    }

    #[test]
    fn interior_nul() {
        let mut buf = BytesMut::new();
        let query = Query { sql: "SELECT 1\0; DROP" };
        assert!(matches!(encode::write(&query, &mut buf), Err(EncodeError::InteriorNul(8))));
        assert!(buf.is_empty());

        let startup = Startup { parameters: vec![("user", "alice\0")] };
        assert!(matches!(startup.write(&mut buf), Err(EncodeError::InteriorNul(5))));
        assert!(buf.is_empty());
    }

    #[test]
    fn trailing_bytes() {
        let frame = Frame::new(Phase::Regular, bytes::Bytes::from_static(b"Q\0\0\0\x14SELECT 1\0; DROP\0"));
        assert!(matches!(FrontendMessage::decode(&frame), Err(ProtocolError::TrailingBytes(7))));

        let frame = Frame::new(Phase::Regular, bytes::Bytes::from_static(b"E\0\0\0\x0bp\0\0\0\0\0\0"));
        assert!(matches!(FrontendMessage::decode(&frame), Err(ProtocolError::TrailingBytes(1))));

        let frame = Frame::new(Phase::Regular, bytes::Bytes::from_static(b"f\0\0\0\x07x\0y"));
        assert!(matches!(FrontendMessage::decode(&frame), Err(ProtocolError::TrailingBytes(1))));

        let mut buf = BytesMut::new();
        buf.put_u32(20);
        buf.put_i32(CANCEL_REQUEST_CODE);
        buf.put_slice(&[0; 12]);
        assert!(matches!(FrontendMessage::decode(&startup(&buf)), Err(ProtocolError::TrailingBytes(4))));
    }

    #[test]
    fn invalid_target() {
        let frame = Frame::new(Phase::Regular, bytes::Bytes::from_static(b"D\0\0\0\x06Z\0"));
        assert!(matches!(FrontendMessage::decode(&frame), Err(ProtocolError::InvalidTargetType(b'Z'))));
    }

    #[test]
    fn unknown_tag() {
        let frame = Frame::new(Phase::Regular, bytes::Bytes::from_static(b"Z\0\0\0\x05I"));
        assert!(matches!(
            FrontendMessage::decode(&frame),
            Err(ProtocolError::UnknownMessage { msgtype: b'Z', direction: "frontend" })
        ));
    }

    #[test]
    fn too_many_parameters() {
        let parse = Parse { name: "", query: "", param_types: vec![0; 65_536] };
        let mut buf = BytesMut::new();
        assert!(matches!(encode::write(&parse, &mut buf), Err(EncodeError::TooManyEntries { .. })));
        assert!(buf.is_empty());
    }
}
