//! `postro-wire` error types.
use std::{backtrace::Backtrace, fmt, io};

use crate::postgres::{EncodeError, ProtocolError};

/// A specialized [`Result`] type for `postro-wire` operation.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Boxed error returned by listener implementation.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// All possible error from `postro-wire` library.
pub struct Error {
    backtrace: Backtrace,
    kind: ErrorKind,
}

impl Error {
    /// Listener method that is not implemented.
    pub fn unsupported(method: &'static str) -> Error {
        ErrorKind::Unsupported(method).into()
    }

    /// Wrap error from listener implementation.
    pub fn listener(err: impl Into<BoxError>) -> Error {
        ErrorKind::Listener(err.into()).into()
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn into_kind(self) -> ErrorKind {
        self.kind
    }

    pub fn backtrace(&self) -> &Backtrace {
        &self.backtrace
    }

    /// Returns `true` if the connection that produced this error must be closed.
    pub fn is_fatal(&self) -> bool {
        matches!(self.kind, ErrorKind::Protocol(_) | ErrorKind::Io(_))
    }
}

/// All possible error kind from `postro-wire` library.
pub enum ErrorKind {
    /// Peer violated the protocol.
    Protocol(ProtocolError),
    /// Message cannot be represented on the wire.
    Encode(EncodeError),
    Io(io::Error),
    /// Received message that the listener does not handle.
    Unsupported(&'static str),
    Listener(BoxError),
}

macro_rules! from {
    (<$ty:ty>$pat:pat => $body:expr) => {
        impl From<$ty> for Error {
            fn from($pat: $ty) -> Self {
                let backtrace = std::backtrace::Backtrace::capture();
                Self { backtrace, kind: $body }
            }
        }
    };
}

from!(<ErrorKind>e => e);
from!(<ProtocolError>e => ErrorKind::Protocol(e));
from!(<EncodeError>e => ErrorKind::Encode(e));
from!(<io::Error>e => ErrorKind::Io(e));

impl std::error::Error for Error { }

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.kind, f)?;

        if let std::backtrace::BacktraceStatus::Captured = self.backtrace.status() {
            let mut backtrace = self.backtrace.to_string();
            write!(f, "\n\n")?;
            writeln!(f, "Stack backtrace:")?;
            backtrace.truncate(backtrace.trim_end().len());
            write!(f, "{}", backtrace)?;
        }

        Ok(())
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{self}\"")
    }
}

impl std::error::Error for ErrorKind { }

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Protocol(e) => e.fmt(f),
            Self::Encode(e) => e.fmt(f),
            Self::Io(e) => e.fmt(f),
            Self::Unsupported(method) => write!(f, "unsupported operation: `{method}` is not implemented"),
            Self::Listener(e) => e.fmt(f),
        }
    }
}

impl fmt::Debug for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{self}\"")
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn error_kind() {
        let err = Error::unsupported("on_query");
        assert!(matches!(err.kind(), ErrorKind::Unsupported("on_query")));
        assert!(!err.is_fatal());
        assert!(err.to_string().starts_with("unsupported operation: `on_query`"));

        let err = Error::from(ProtocolError::UnexpectedEof);
        assert!(err.is_fatal());

        let err = Error::listener("no such table");
        assert!(err.to_string().starts_with("no such table"));
    }
}
