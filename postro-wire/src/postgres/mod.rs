//! Postgres Frontend and Backend Protocol
//!
//! Docs here mostly quoted from the official postgres documentation.
//!
//! ## Messaging Overview
//!
//! All communication is through a stream of messages. The first byte of a message identifies the message type,
//! and the next four bytes specify the length of the rest of the message (this length count includes itself,
//! but not the message-type byte). The remaining contents of the message are determined by the message type.
//!
//! ```text
//! ┏━━━━┳━━━━━━━━━━━━━━━━━━━┳━━━━━━┓
//! ┃ Ty ┃       Length      ┃ Body ┃
//! ┣━━━━╋━━━━━━━━━━━━━━━━━━━╋━━━━━━┫
//! ┃ u8 ┃        u32        ┃ [u8] ┃
//! ┣━━━━╋━━━━━━━━━━━━━━━━━━━╋━━━━━━┫
//! ┃ 43 ┃ 00 | 00 | 00 | 32 ┃  ..  ┃
//! ┗━━━━┻━━━━━━━━━━━━━━━━━━━┻━━━━━━┛
//! ```
//!
//! For historical reasons, the very first message sent by the client (the startup message)
//! has no initial message-type byte. [`FrameDecoder`] handle both framing.
//!
//! ## Decoding
//!
//! A complete [`Frame`] is decoded into [`FrontendMessage`] or [`BackendMessage`], or
//! dispatched directly to a [`FrontendListener`] or [`BackendListener`]. Decoded messages
//! borrow from the frame.
//!
//! ## Encoding
//!
//! Tagged messages implement [`Encode`][encode::Encode] and are written with [`encode::write`].
//! Untagged startup phase messages and [`RowDescription`][backend::RowDescription] provide
//! their own `write`.
//!
//! ## [`Format`][PgFormat] and Format Codes
//!
//! Data of a particular data type might be transmitted in any of several different formats.
//! As of PostgreSQL 7.4 the only supported formats are “text” and “binary”. Text has format
//! code zero, and Binary has format code one.
//!
//! Clients can specify a format code for each transmitted parameter value and for each column of a query result.
//!
//! See [`PgFormat`] for details.
//!
//! <https://www.postgresql.org/docs/17/protocol-overview.html>

mod pg_type;
mod pg_format;
mod status;
mod command;
mod field;
mod frame;

pub mod encode;
pub mod frontend;
pub mod backend;
pub mod copy;
pub mod auth;

mod listener;
mod sender;

mod error;

pub use pg_type::{Oid, PgType, TypeCategory, TypeKind, TypeLibrary, TypeLookup};
pub use pg_format::PgFormat;
pub use status::{TargetType, TransactionStatus};
pub use command::{CommandType, parse_tag};
pub use field::{ErrorField, Field, ParameterBound, error_field};
pub use frame::{Frame, FrameDecoder, Phase};

pub use encode::{BackendProtocol, Encode, FrontendProtocol};
pub use frontend::FrontendMessage;
pub use backend::{BackendMessage, MAX_PARAMETERS};
pub use auth::{AuthResponse, AuthStage, PasswordLike, dispatch_auth_response};

pub use listener::{BackendListener, FrontendListener, dispatch_backend, dispatch_frontend};
pub use sender::{BackendSender, FrontendSender};

pub use error::{EncodeError, ProtocolError};

/// Protocol version 3.0, the only supported version.
pub const PROTOCOL_VERSION_3: i32 = 196608;

/// Code sent in place of protocol version by [`CancelRequest`][frontend::CancelRequest].
pub const CANCEL_REQUEST_CODE: i32 = 80877102;

/// Code sent in place of protocol version by [`SslRequest`][frontend::SslRequest].
pub const SSL_REQUEST_CODE: i32 = 80877103;

/// Code sent in place of protocol version by [`GssEncRequest`][frontend::GssEncRequest].
pub const GSSENC_REQUEST_CODE: i32 = 80877104;

/// Human readable message name, used in diagnostics.
pub(crate) fn message_name(msgtype: u8, direction: &str) -> &'static str {
    if direction == "frontend" {
        match msgtype {
            b'B' => "Bind",
            b'P' => "Parse",
            b'Q' => "Query",
            b'p' => "PasswordMessage",
            b'D' => "Describe",
            b'E' => "Execute",
            b'H' => "Flush",
            b'S' => "Sync",
            b'C' => "Close",
            b'X' => "Terminate",
            b'd' => "CopyData",
            b'c' => "CopyDone",
            b'f' => "CopyFail",
            b'F' => "FunctionCall",
            _ => "Unknown",
        }
    } else {
        match msgtype {
            b'R' => "Authentication",
            b'K' => "BackendKeyData",
            b'2' => "BindComplete",
            b'3' => "CloseComplete",
            b'C' => "CommandComplete",
            b'd' => "CopyData",
            b'c' => "CopyDone",
            b'G' => "CopyInResponse",
            b'H' => "CopyOutResponse",
            b'W' => "CopyBothResponse",
            b'D' => "DataRow",
            b'I' => "EmptyQueryResponse",
            b'E' => "ErrorResponse",
            b'V' => "FunctionCallResponse",
            b'v' => "NegotiateProtocolVersion",
            b'n' => "NoData",
            b'N' => "NoticeResponse",
            b'A' => "NotificationResponse",
            b't' => "ParameterDescription",
            b'S' => "ParameterStatus",
            b'1' => "ParseComplete",
            b's' => "PortalSuspended",
            b'Z' => "ReadyForQuery",
            b'T' => "RowDescription",
            _ => "Unknown",
        }
    }
}
