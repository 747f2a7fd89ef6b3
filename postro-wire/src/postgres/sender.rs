//! Listeners that encode every message they receive.
//!
//! A [`BackendSender`] is what a server write its responses into, and a
//! [`FrontendSender`] is what a client write its requests into. The encoded
//! bytes are buffered until taken with `take`.
//!
//! Because senders implement the listener traits, forwarding decoded messages
//! from one peer to another is a matter of dispatching into a sender.
use bytes::{BufMut, BytesMut};

use super::{
    BackendListener, FrontendListener, PasswordLike,
    auth::{GssResponse, PasswordMessage, SaslInitialResponse, SaslResponse},
    backend::{
        Authentication, BackendKeyData, BindComplete, CloseComplete, CommandComplete, DataRow,
        EmptyQueryResponse, ErrorResponse, FunctionCallResponse, NegotiateProtocolVersion, NoData,
        NoticeResponse, NotificationResponse, ParameterDescription, ParameterStatus, ParseComplete,
        PortalSuspended, ReadyForQuery, RowDescription,
    },
    copy::{CopyBothResponse, CopyData, CopyDone, CopyFail, CopyInResponse, CopyOutResponse},
    encode,
    frontend::{
        Bind, CancelRequest, Close, Describe, Execute, Flush, FunctionCall, GssEncRequest, Parse, Query,
        SslRequest, Startup, Sync, Terminate,
    },
};
use crate::Result;

/// Generate listener methods that encode the message as is.
macro_rules! encode_with {
    ($($method:ident($ty:ty);)*) => {
        $(
            fn $method(&mut self, msg: &$ty) -> Result<()> {
                Ok(encode::write(msg, &mut self.buf)?)
            }
        )*
    };
}

/// Generate listener methods for messages without body.
macro_rules! encode_empty {
    ($($method:ident($ty:ident);)*) => {
        $(
            fn $method(&mut self) -> Result<()> {
                Ok(encode::write(&$ty, &mut self.buf)?)
            }
        )*
    };
}

macro_rules! sender {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Default)]
        pub struct $name {
            buf: BytesMut,
        }

        impl $name {
            pub fn new() -> Self {
                Self::default()
            }

            /// Use `buf` as the write buffer, written bytes are appended to it.
            pub fn with_buffer(buf: BytesMut) -> Self {
                Self { buf }
            }

            /// Bytes written but not yet taken.
            pub fn buffer(&self) -> &[u8] {
                &self.buf
            }

            /// Take written bytes, leaving the buffer empty.
            pub fn take(&mut self) -> BytesMut {
                self.buf.split()
            }

            /// Consume the sender, returning the buffer.
            pub fn into_inner(self) -> BytesMut {
                self.buf
            }
        }
    };
}

sender! {
    /// Encode backend messages, used by a server.
    BackendSender
}

sender! {
    /// Encode frontend messages, used by a client.
    FrontendSender
}

impl BackendSender {
    /// Write a single byte response to [`SslRequest`] or [`GssEncRequest`].
    ///
    /// `S` or `G` to accept, `N` to refuse.
    pub fn write_byte(&mut self, byte: u8) {
        self.buf.put_u8(byte);
    }
}

impl BackendListener for BackendSender {
    encode_with! {
        on_authentication(Authentication<'_>);
        on_backend_key_data(BackendKeyData);
        on_command_complete(CommandComplete);
        on_copy_data(CopyData<'_>);
        on_copy_in_response(CopyInResponse);
        on_copy_out_response(CopyOutResponse);
        on_copy_both_response(CopyBothResponse);
        on_data_row(DataRow<'_>);
        on_error_response(ErrorResponse<'_>);
        on_function_call_response(FunctionCallResponse<'_>);
        on_negotiate_protocol_version(NegotiateProtocolVersion<'_>);
        on_notice_response(NoticeResponse<'_>);
        on_notification_response(NotificationResponse<'_>);
        on_parameter_description(ParameterDescription);
        on_parameter_status(ParameterStatus<'_>);
        on_ready_for_query(ReadyForQuery);
    }

    encode_empty! {
        on_bind_complete(BindComplete);
        on_close_complete(CloseComplete);
        on_copy_done(CopyDone);
        on_empty_query_response(EmptyQueryResponse);
        on_no_data(NoData);
        on_parse_complete(ParseComplete);
        on_portal_suspended(PortalSuspended);
    }

    fn on_row_description(&mut self, msg: &RowDescription<'_>) -> Result<()> {
        Ok(msg.write(&mut self.buf)?)
    }
}

impl FrontendListener for FrontendSender {
    encode_with! {
        on_bind(Bind<'_>);
        on_parse(Parse<'_>);
        on_query(Query<'_>);
        on_describe(Describe<'_>);
        on_execute(Execute<'_>);
        on_close(Close<'_>);
        on_copy_data(CopyData<'_>);
        on_copy_fail(CopyFail<'_>);
        on_function_call(FunctionCall<'_>);
        on_password(PasswordMessage<'_>);
        on_gss_response(GssResponse<'_>);
        on_sasl_initial_response(SaslInitialResponse<'_>);
        on_sasl_response(SaslResponse<'_>);
    }

    encode_empty! {
        on_flush(Flush);
        on_sync(Sync);
        on_terminate(Terminate);
        on_copy_done(CopyDone);
    }

    fn on_startup(&mut self, msg: &Startup<'_>) -> Result<()> {
        Ok(msg.write(&mut self.buf)?)
    }

    fn on_ssl_request(&mut self) -> Result<()> {
        SslRequest.write(&mut self.buf);
        Ok(())
    }

    fn on_gss_enc_request(&mut self) -> Result<()> {
        GssEncRequest.write(&mut self.buf);
        Ok(())
    }

    fn on_cancel_request(&mut self, msg: &CancelRequest) -> Result<()> {
        msg.write(&mut self.buf);
        Ok(())
    }

    // uninterpreted body is forwarded verbatim
    fn on_password_like(&mut self, msg: PasswordLike<'_>) -> Result<()> {
        Ok(encode::write(&GssResponse { data: msg.as_bytes() }, &mut self.buf)?)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::postgres::{
        FrameDecoder, FrontendMessage, PgType, TargetType, TransactionStatus, TypeLibrary, dispatch_backend,
        dispatch_frontend,
    };

    #[test]
    fn server_responses() {
        let mut sender = BackendSender::new();
        sender.write_byte(b'N');
        sender.on_authentication(&Authentication::Ok).unwrap();
        sender.on_backend_key_data(&BackendKeyData { process_id: 123, secret_key: 123 }).unwrap();
        sender.on_ready_for_query(&ReadyForQuery { status: TransactionStatus::Idle }).unwrap();

        assert_eq!(
            sender.buffer(),
            b"NR\0\0\0\x08\0\0\0\0K\0\0\0\x0c\0\0\0\x7b\0\0\0\x7bZ\0\0\0\x05I"
        );
        let taken = sender.take();
        assert_eq!(taken.len(), 1 + 9 + 13 + 6);
        assert!(sender.buffer().is_empty());
    }

    #[test]
    fn forward_frontend_messages() {
        let mut client = FrontendSender::new();
        client.on_ssl_request().unwrap();
        client.on_startup(&Startup { parameters: vec![("user", "alice"), ("database", "test")] }).unwrap();
        client.on_password_like(PasswordLike::decode(b"secret\0")).unwrap();
        client.on_parse(&Parse { name: "s1", query: "SELECT $1", param_types: vec![PgType::INT4.oid] }).unwrap();
        client.on_describe(&Describe { target: TargetType::Statement, name: "s1" }).unwrap();
        client.on_sync().unwrap();
        client.on_terminate().unwrap();
        let mut buf = client.take();

        // a proxy decode and re-encode everything it receives
        let mut proxy = FrontendSender::new();
        let mut decoder = FrameDecoder::new();
        let mut received = vec![];
        while let Some(frame) = decoder.try_extract_frame(&mut buf).unwrap() {
            dispatch_frontend(&frame, &mut proxy).unwrap();
            received.push(frame);
        }
        assert_eq!(received.len(), 7);

        let mut replay = proxy.take();
        let mut decoder = FrameDecoder::new();
        let mut index = 0;
        while let Some(frame) = decoder.try_extract_frame(&mut replay).unwrap() {
            assert_eq!(frame.as_bytes(), received[index].as_bytes());
            index += 1;
        }
        assert_eq!(index, 7);

        let password = FrontendMessage::decode(&received[2]).unwrap();
        let FrontendMessage::PasswordLike(password) = password else {
            panic!("expected password message");
        };
        assert_eq!(password.as_password().password, b"secret");
    }

    #[test]
    fn forward_backend_messages() {
        let mut server = BackendSender::new();
        server.on_parse_complete().unwrap();
        server.on_ready_for_query(&ReadyForQuery { status: TransactionStatus::Failed }).unwrap();
        let mut buf = server.take();

        #[derive(Default)]
        struct Observer(Vec<TransactionStatus>);

        impl BackendListener for Observer {
            fn on_ready_for_query(&mut self, msg: &ReadyForQuery) -> Result<()> {
                self.0.push(msg.status);
                Ok(())
            }
        }

        let mut decoder = FrameDecoder::regular();
        let frame = decoder.try_extract_frame(&mut buf).unwrap().unwrap();
        // ParseComplete is not decoded on the frontend side
        assert!(dispatch_backend(&frame, TypeLibrary::standard(), &mut Observer::default()).is_err());

        let frame = decoder.try_extract_frame(&mut buf).unwrap().unwrap();
        let mut observer = Observer::default();
        dispatch_backend(&frame, TypeLibrary::standard(), &mut observer).unwrap();
        assert_eq!(observer.0, [TransactionStatus::Failed]);
    }
}
