//! Protocol error
use std::{fmt, str::Utf8Error};

use bytes::TryGetError;

use super::message_name;

/// An error when translating buffer from or to postgres.
///
/// Every variant is fatal for the connection that produced it,
/// the caller is responsible to close it.
pub enum ProtocolError {
    /// Message type is unknown for the direction it was received from.
    UnknownMessage {
        msgtype: u8,
        /// `"frontend"` or `"backend"`.
        direction: &'static str,
    },
    /// Startup packet carries unknown protocol version or request code.
    UnsupportedVersion(i32),
    /// Format code other than text (0) or binary (1).
    InvalidFormat(u16),
    /// Transaction status other than `I`, `T` or `E`.
    InvalidTransactionStatus(u8),
    /// Describe or Close target other than `S` or `P`.
    InvalidTargetType(u8),
    /// Command tag that is not `<VERB> [<oid> ]<rows>`.
    InvalidCommandTag(String),
    /// Length field smaller than its own size.
    InvalidLength(i32),
    /// Frame length exceed configured limit.
    FrameTooLarge {
        len: usize,
        max: usize,
    },
    /// Message body ended before all of its fields are read.
    UnexpectedEof,
    /// String did not nul terminated.
    MissingNul,
    /// String is not valid utf8.
    Utf8(Utf8Error),
    /// Format code count is neither 0, 1, or the parameter count.
    FormatCountMismatch {
        formats: u16,
        params: u16,
    },
    /// Startup parameter name without value.
    MalformedStartup,
    /// Message body have bytes left after its last field.
    TrailingBytes(usize),
}

/// An error when encoding message, nothing is written to the buffer.
pub enum EncodeError {
    /// List exceed the capacity of its count field.
    TooManyEntries {
        count: usize,
        max: usize,
    },
    /// Message length does not fit in the `Int32` length field.
    MessageTooLarge(usize),
    /// String contains nul at given offset, it cannot be nul terminated.
    InteriorNul(usize),
}

impl std::error::Error for ProtocolError { }

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownMessage { msgtype, direction } => write!(
                f,
                "unknown {direction} message `{}` ({:?})",
                message_name(*msgtype, direction),
                *msgtype as char,
            ),
            Self::UnsupportedVersion(v) => write!(f, "unsupported protocol version: {v}"),
            Self::InvalidFormat(id) => write!(f, "id {id} is not a valid format code"),
            Self::InvalidTransactionStatus(id) => write!(f, "value {:?} is not a valid transaction status", *id as char),
            Self::InvalidTargetType(id) => write!(f, "id {:?} is not a valid target type", *id as char),
            Self::InvalidCommandTag(tag) => write!(f, "unexpected command tag {tag:?}"),
            Self::InvalidLength(len) => write!(f, "invalid message length: {len}"),
            Self::FrameTooLarge { len, max } => write!(f, "message too large: {len} > {max}"),
            Self::UnexpectedEof => f.write_str("unexpected end of message"),
            Self::MissingNul => f.write_str("string did not nul terminated"),
            Self::Utf8(e) => write!(f, "invalid utf8 string: {e}"),
            Self::FormatCountMismatch { formats, params } => {
                write!(f, "{formats} format codes given for {params} parameters")
            }
            Self::MalformedStartup => f.write_str("startup parameter without value"),
            Self::TrailingBytes(n) => write!(f, "{n} unexpected bytes after message body"),
        }
    }
}

impl fmt::Debug for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{self}\"")
    }
}

impl From<Utf8Error> for ProtocolError {
    fn from(e: Utf8Error) -> Self {
        Self::Utf8(e)
    }
}

impl From<TryGetError> for ProtocolError {
    fn from(_: TryGetError) -> Self {
        Self::UnexpectedEof
    }
}

impl std::error::Error for EncodeError { }

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooManyEntries { count, max } => {
                write!(f, "too many entries, trying to send {count} when max is {max}")
            }
            Self::MessageTooLarge(len) => write!(f, "message size too large for protocol: {len}"),
            Self::InteriorNul(offset) => write!(f, "string contains nul at offset {offset}"),
        }
    }
}

impl fmt::Debug for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{self}\"")
    }
}
