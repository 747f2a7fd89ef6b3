//! Message listeners.
//!
//! Decoded messages can be consumed either by matching [`FrontendMessage`] and
//! [`BackendMessage`] directly, or by dispatching them to a listener.
//!
//! Every listener method has a default implementation that returns
//! [`ErrorKind::Unsupported`][crate::error::ErrorKind::Unsupported], so an
//! implementor only override the messages it expects to receive.
//!
//! Arguments are borrowed from the frame for the duration of the call only,
//! a listener that need the data afterwards must copy it.
use super::{
    BackendMessage, Frame, FrontendMessage, TypeLookup,
    auth::{GssResponse, PasswordLike, PasswordMessage, SaslInitialResponse, SaslResponse},
    backend::{
        Authentication, BackendKeyData, CommandComplete, DataRow, ErrorResponse, FunctionCallResponse,
        NegotiateProtocolVersion, NoticeResponse, NotificationResponse, ParameterDescription, ParameterStatus,
        ReadyForQuery, RowDescription,
    },
    copy::{CopyBothResponse, CopyData, CopyFail, CopyInResponse, CopyOutResponse},
    frontend::{Bind, CancelRequest, Close, Describe, Execute, FunctionCall, Parse, Query, Startup},
};
use crate::{Error, Result, common::span};

macro_rules! listener {
    (
        $(#[$doc:meta])*
        pub trait $name:ident {
            $(
                $(#[$mdoc:meta])*
                fn $method:ident(&mut self $(, $arg:ident: $ty:ty)?);
            )*
        }
    ) => {
        $(#[$doc])*
        pub trait $name {
            $(
                $(#[$mdoc])*
                fn $method(&mut self $(, $arg: $ty)?) -> Result<()> {
                    $(let _ = $arg;)?
                    Err(Error::unsupported(stringify!($method)))
                }
            )*
        }
    };
}

listener! {
    /// Receiver of frontend messages, implemented by a server.
    pub trait FrontendListener {
        /// Startup message with protocol version 3.0.
        fn on_startup(&mut self, msg: &Startup<'_>);
        /// The client ask for SSL, respond with a single `S` or `N` byte.
        fn on_ssl_request(&mut self);
        /// The client ask for GSSAPI encryption, respond with a single `G` or `N` byte.
        fn on_gss_enc_request(&mut self);
        /// Sent on a fresh connection, the connection is closed afterwards.
        fn on_cancel_request(&mut self, msg: &CancelRequest);
        fn on_bind(&mut self, msg: &Bind<'_>);
        /// Request to create a prepared statement.
        ///
        /// Contrary to [`on_query`][FrontendListener::on_query], the query must be a single
        /// statement and it may contain parameters (named as $1, $2, $3, etc).
        fn on_parse(&mut self, msg: &Parse<'_>);
        /// Simple query, it may contain several statements separated by semicolon.
        fn on_query(&mut self, msg: &Query<'_>);
        /// `p` message, interpret it with the current authentication state,
        /// see [`PasswordLike::interpret`] and [`dispatch_auth_response`][super::dispatch_auth_response].
        fn on_password_like(&mut self, msg: PasswordLike<'_>);
        fn on_describe(&mut self, msg: &Describe<'_>);
        fn on_execute(&mut self, msg: &Execute<'_>);
        fn on_flush(&mut self);
        fn on_sync(&mut self);
        fn on_close(&mut self, msg: &Close<'_>);
        fn on_terminate(&mut self);
        /// Contrary to messages sent from the backend, messages sent by frontends
        /// might divide the data stream arbitrarily.
        fn on_copy_data(&mut self, msg: &CopyData<'_>);
        fn on_copy_done(&mut self);
        fn on_copy_fail(&mut self, msg: &CopyFail<'_>);
        fn on_function_call(&mut self, msg: &FunctionCall<'_>);
        /// `p` message interpreted as password.
        fn on_password(&mut self, msg: &PasswordMessage<'_>);
        /// `p` message interpreted as GSSAPI or SSPI data.
        fn on_gss_response(&mut self, msg: &GssResponse<'_>);
        /// `p` message interpreted as the first SASL message.
        fn on_sasl_initial_response(&mut self, msg: &SaslInitialResponse<'_>);
        /// `p` message interpreted as SASL continuation.
        fn on_sasl_response(&mut self, msg: &SaslResponse<'_>);
    }
}

listener! {
    /// Receiver of backend messages, implemented by a client or a proxy.
    pub trait BackendListener {
        fn on_authentication(&mut self, msg: &Authentication<'_>);
        fn on_backend_key_data(&mut self, msg: &BackendKeyData);
        fn on_bind_complete(&mut self);
        fn on_close_complete(&mut self);
        fn on_command_complete(&mut self, msg: &CommandComplete);
        fn on_copy_data(&mut self, msg: &CopyData<'_>);
        fn on_copy_done(&mut self);
        fn on_copy_in_response(&mut self, msg: &CopyInResponse);
        fn on_copy_out_response(&mut self, msg: &CopyOutResponse);
        fn on_copy_both_response(&mut self, msg: &CopyBothResponse);
        fn on_data_row(&mut self, msg: &DataRow<'_>);
        fn on_empty_query_response(&mut self);
        /// Error reported by the backend, this is data, not a failure of the connection.
        fn on_error_response(&mut self, msg: &ErrorResponse<'_>);
        fn on_function_call_response(&mut self, msg: &FunctionCallResponse<'_>);
        fn on_negotiate_protocol_version(&mut self, msg: &NegotiateProtocolVersion<'_>);
        fn on_no_data(&mut self);
        fn on_notice_response(&mut self, msg: &NoticeResponse<'_>);
        fn on_notification_response(&mut self, msg: &NotificationResponse<'_>);
        fn on_parameter_description(&mut self, msg: &ParameterDescription);
        fn on_parameter_status(&mut self, msg: &ParameterStatus<'_>);
        fn on_parse_complete(&mut self);
        fn on_portal_suspended(&mut self);
        fn on_ready_for_query(&mut self, msg: &ReadyForQuery);
        fn on_row_description(&mut self, msg: &RowDescription<'_>);
    }
}

impl FrontendMessage<'_> {
    /// Invoke the listener method matching this message.
    pub fn dispatch<L: FrontendListener + ?Sized>(&self, listener: &mut L) -> Result<()> {
        match self {
            Self::Startup(msg) => listener.on_startup(msg),
            Self::SslRequest(_) => listener.on_ssl_request(),
            Self::GssEncRequest(_) => listener.on_gss_enc_request(),
            Self::CancelRequest(msg) => listener.on_cancel_request(msg),
            Self::Bind(msg) => listener.on_bind(msg),
            Self::Parse(msg) => listener.on_parse(msg),
            Self::Query(msg) => listener.on_query(msg),
            Self::PasswordLike(msg) => listener.on_password_like(*msg),
            Self::Describe(msg) => listener.on_describe(msg),
            Self::Execute(msg) => listener.on_execute(msg),
            Self::Flush(_) => listener.on_flush(),
            Self::Sync(_) => listener.on_sync(),
            Self::Close(msg) => listener.on_close(msg),
            Self::Terminate(_) => listener.on_terminate(),
            Self::CopyData(msg) => listener.on_copy_data(msg),
            Self::CopyDone(_) => listener.on_copy_done(),
            Self::CopyFail(msg) => listener.on_copy_fail(msg),
            Self::FunctionCall(msg) => listener.on_function_call(msg),
        }
    }
}

impl BackendMessage<'_> {
    /// Invoke the listener method matching this message.
    pub fn dispatch<L: BackendListener + ?Sized>(&self, listener: &mut L) -> Result<()> {
        match self {
            Self::CommandComplete(msg) => listener.on_command_complete(msg),
            Self::DataRow(msg) => listener.on_data_row(msg),
            Self::ErrorResponse(msg) => listener.on_error_response(msg),
            Self::ParameterStatus(msg) => listener.on_parameter_status(msg),
            Self::ReadyForQuery(msg) => listener.on_ready_for_query(msg),
            Self::RowDescription(msg) => listener.on_row_description(msg),
        }
    }
}

/// Decode a frame received by the backend and invoke exactly one listener method.
pub fn dispatch_frontend<L: FrontendListener + ?Sized>(frame: &Frame, listener: &mut L) -> Result<()> {
    span!("dispatch_frontend");
    FrontendMessage::decode(frame)?.dispatch(listener)
}

/// Decode a frame received by the frontend and invoke exactly one listener method.
pub fn dispatch_backend<L: BackendListener + ?Sized>(
    frame: &Frame,
    types: &impl TypeLookup,
    listener: &mut L,
) -> Result<()> {
    span!("dispatch_backend");
    BackendMessage::decode(frame, types)?.dispatch(listener)
}
