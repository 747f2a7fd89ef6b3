//! Authentication responses sent by the frontend.
//!
//! `PasswordMessage`, `GSSResponse`, `SASLInitialResponse` and `SASLResponse`
//! share the `p` message type and can only be distinguished by the
//! authentication request that preceded them. The decoder never guess,
//! it yields a [`PasswordLike`] that the caller interpret according to the
//! authentication state it is tracking.
use bytes::BufMut;

use super::{
    EncodeError, ProtocolError,
    encode::{self, Encode, FrontendProtocol},
};
use crate::{
    Result,
    ext::{BufMutExt, SliceExt, StrExt, UsizeExt, len_bytes_size, nul_bytes_len},
    postgres::listener::FrontendListener,
};

/// Undecoded body of a `p` message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordLike<'a> {
    body: &'a [u8],
}

/// Authentication step that the backend last requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthStage {
    /// After `AuthenticationCleartextPassword` or `AuthenticationMD5Password`.
    Password,
    /// After `AuthenticationGSS`, `AuthenticationSSPI` or `AuthenticationGSSContinue`.
    Gss,
    /// After `AuthenticationSASL`.
    SaslInitial,
    /// After `AuthenticationSASLContinue`.
    SaslContinue,
}

/// Interpreted `p` message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthResponse<'a> {
    Password(PasswordMessage<'a>),
    Gss(GssResponse<'a>),
    SaslInitial(SaslInitialResponse<'a>),
    Sasl(SaslResponse<'a>),
}

impl<'a> PasswordLike<'a> {
    pub fn decode(body: &'a [u8]) -> Self {
        Self { body }
    }

    /// Raw message body.
    pub fn as_bytes(&self) -> &'a [u8] {
        self.body
    }

    /// Treat as GSSAPI or SSPI specific message data.
    pub fn as_gss_response(&self) -> GssResponse<'a> {
        GssResponse { data: self.body }
    }

    /// Treat as password (encrypted, if requested).
    ///
    /// The string terminator is not included.
    pub fn as_password(&self) -> PasswordMessage<'a> {
        let password = match self.body.split_last() {
            Some((b'\0', password)) => password,
            _ => self.body,
        };
        PasswordMessage { password }
    }

    /// Treat as SASL mechanism specific message data.
    pub fn as_sasl_response(&self) -> SaslResponse<'a> {
        SaslResponse { data: self.body }
    }

    /// Treat as the first SASL message, carrying selected mechanism name and optional initial response.
    pub fn as_sasl_initial_response(&self) -> Result<SaslInitialResponse<'a>, ProtocolError> {
        let mut body = self.body;
        let mechanism = body.get_nul_str()?;
        let data = body.get_len_bytes()?;
        Ok(SaslInitialResponse { mechanism, data })
    }

    /// Interpret body according to the authentication stage.
    pub fn interpret(&self, stage: AuthStage) -> Result<AuthResponse<'a>, ProtocolError> {
        Ok(match stage {
            AuthStage::Password => AuthResponse::Password(self.as_password()),
            AuthStage::Gss => AuthResponse::Gss(self.as_gss_response()),
            AuthStage::SaslInitial => AuthResponse::SaslInitial(self.as_sasl_initial_response()?),
            AuthStage::SaslContinue => AuthResponse::Sasl(self.as_sasl_response()),
        })
    }
}

/// Route an interpreted `p` message to the matching listener method.
pub fn dispatch_auth_response<L: FrontendListener + ?Sized>(
    response: &AuthResponse<'_>,
    listener: &mut L,
) -> Result<()> {
    match response {
        AuthResponse::Password(msg) => listener.on_password(msg),
        AuthResponse::Gss(msg) => listener.on_gss_response(msg),
        AuthResponse::SaslInitial(msg) => listener.on_sasl_initial_response(msg),
        AuthResponse::Sasl(msg) => listener.on_sasl_response(msg),
    }
}

/// Identifies the message as a password response.
///
/// Password is kept as bytes, since MD5 or cleartext password is not required to be utf8.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordMessage<'a> {
    /// The password (encrypted, if requested), without nul terminator.
    pub password: &'a [u8],
}

impl Encode for PasswordMessage<'_> {
    const MSGTYPE: u8 = b'p';

    fn size_hint(&self) -> Result<u32, EncodeError> {
        nul_bytes_len(self.password)
    }

    fn encode(&self, mut buf: impl BufMut) {
        buf.put_slice(self.password);
        buf.put_u8(b'\0');
    }
}

/// Identifies the message as a GSSAPI or SSPI response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GssResponse<'a> {
    /// GSSAPI/SSPI specific message data.
    pub data: &'a [u8],
}

impl Encode for GssResponse<'_> {
    const MSGTYPE: u8 = b'p';

    fn size_hint(&self) -> Result<u32, EncodeError> {
        self.data.len().to_u32()
    }

    fn encode(&self, mut buf: impl BufMut) {
        buf.put_slice(self.data);
    }
}

/// Identifies the message as an initial SASL response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaslInitialResponse<'a> {
    /// Name of the SASL authentication mechanism that the client selected.
    pub mechanism: &'a str,
    /// SASL mechanism specific "Initial Response", `None` if there is no initial response.
    pub data: Option<&'a [u8]>,
}

impl Encode for SaslInitialResponse<'_> {
    const MSGTYPE: u8 = b'p';

    fn size_hint(&self) -> Result<u32, EncodeError> {
        encode::add_size(self.mechanism.nul_string_len()?, len_bytes_size(self.data)?)
    }

    fn encode(&self, mut buf: impl BufMut) {
        buf.put_nul_string(self.mechanism);
        buf.put_len_bytes(self.data);
    }
}

/// Identifies the message as a SASL response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaslResponse<'a> {
    /// SASL mechanism specific message data.
    pub data: &'a [u8],
}

impl Encode for SaslResponse<'_> {
    const MSGTYPE: u8 = b'p';

    fn size_hint(&self) -> Result<u32, EncodeError> {
        self.data.len().to_u32()
    }

    fn encode(&self, mut buf: impl BufMut) {
        buf.put_slice(self.data);
    }
}

impl FrontendProtocol for PasswordMessage<'_> { }
impl FrontendProtocol for GssResponse<'_> { }
impl FrontendProtocol for SaslInitialResponse<'_> { }
impl FrontendProtocol for SaslResponse<'_> { }
