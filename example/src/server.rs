//! Sample server that answer every query with the same rows.
//!
//! ```bash
//! RUST_LOG=trace cargo run -p example
//! psql -h 127.0.0.1 -p 5433 -U alice -c "SELECT 1"
//! ```
use std::env::var;

use bytes::BytesMut;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
};
use tracing::{Instrument, debug, info, trace, trace_span, warn};

use postro_wire::{
    DecoderConfig, Error, Result,
    postgres::{
        BackendListener, BackendSender, CommandType, Encode, ErrorField, Field, Frame, FrameDecoder,
        FrontendListener, PgFormat, PgType, TransactionStatus, backend::*, dispatch_frontend,
        frontend::{Bind, CancelRequest, Close, Describe, Execute, Flush, Parse, Query, Startup, Sync},
    },
};

/// Messages of the extended query protocol, an error in one of them is answered on Sync.
const EXTENDED_QUERY: [u8; 6] = [
    Parse::MSGTYPE,
    Bind::MSGTYPE,
    Describe::MSGTYPE,
    Execute::MSGTYPE,
    Close::MSGTYPE,
    Flush::MSGTYPE,
];

pub async fn main() -> Result<()> {
    let addr = var("PGWIRE_ADDR").unwrap_or_else(|_| "127.0.0.1:5433".into());
    let listener = TcpListener::bind(&addr).await?;
    info!("listening on {addr}");

    loop {
        let (stream, peer) = listener.accept().await?;
        tokio::spawn(
            async move {
                if let Err(err) = connection(stream).await {
                    warn!("{}", err.kind());
                }
            }
            .instrument(trace_span!("connection", %peer)),
        );
    }
}

async fn connection(mut stream: TcpStream) -> Result<()> {
    let mut decoder = FrameDecoder::new().with_config(DecoderConfig::from_env());
    let mut read_buf = BytesMut::with_capacity(1024);
    let mut session = Session::default();

    loop {
        while let Some(frame) = decoder.try_extract_frame(&mut read_buf)? {
            session.handle(&frame)?;
        }

        let response = session.sender.take();
        if !response.is_empty() {
            stream.write_all(&response).await?;
        }

        if session.closed {
            debug!("connection closed by client");
            return Ok(());
        }

        if stream.read_buf(&mut read_buf).await? == 0 {
            debug!("connection reset");
            return Ok(());
        }
    }
}

#[derive(Default)]
struct Session {
    sender: BackendSender,
    closed: bool,
    /// Extended query failed, messages are discarded until Sync.
    skip_until_sync: bool,
}

impl Session {
    /// Dispatch one frame, only fatal error is returned.
    fn handle(&mut self, frame: &Frame) -> Result<()> {
        if self.skip_until_sync && frame.tag() != Some(Sync::MSGTYPE) {
            trace!(msgtype = ?frame.tag().map(char::from), "discarded until Sync");
            return Ok(());
        }
        match dispatch_frontend(frame, self) {
            Err(err) if !err.is_fatal() => self.report(frame.tag(), &err),
            result => result,
        }
    }

    /// Non fatal error is reported to the client, the connection stay open.
    fn report(&mut self, msgtype: Option<u8>, err: &Error) -> Result<()> {
        let message = err.kind().to_string();
        self.sender.on_error_response(&ErrorResponse {
            fields: vec![
                ErrorField::new(ErrorField::SEVERITY, "ERROR"),
                ErrorField::new(ErrorField::CODE, "0A000"),
                ErrorField::new(ErrorField::MESSAGE, &message),
            ],
        })?;
        match msgtype {
            Some(msgtype) if EXTENDED_QUERY.contains(&msgtype) => {
                self.skip_until_sync = true;
                Ok(())
            }
            _ => self.ready(),
        }
    }

    fn ready(&mut self) -> Result<()> {
        self.sender.on_ready_for_query(&ReadyForQuery { status: TransactionStatus::Idle })
    }
}

impl FrontendListener for Session {
    fn on_ssl_request(&mut self) -> Result<()> {
        self.sender.write_byte(b'N');
        Ok(())
    }

    fn on_gss_enc_request(&mut self) -> Result<()> {
        self.sender.write_byte(b'N');
        Ok(())
    }

    fn on_startup(&mut self, msg: &Startup<'_>) -> Result<()> {
        info!(user = ?msg.user(), database = ?msg.database(), "startup");
        self.sender.on_authentication(&Authentication::Ok)?;
        self.sender.on_parameter_status(&ParameterStatus { name: "server_version", value: "17.0" })?;
        self.sender.on_parameter_status(&ParameterStatus { name: "client_encoding", value: "UTF8" })?;
        self.sender.on_backend_key_data(&BackendKeyData { process_id: 123, secret_key: 123 })?;
        self.ready()
    }

    fn on_cancel_request(&mut self, msg: &CancelRequest) -> Result<()> {
        info!(process_id = msg.process_id, "cancel request");
        self.closed = true;
        Ok(())
    }

    fn on_query(&mut self, msg: &Query<'_>) -> Result<()> {
        info!(sql = msg.sql, "query");

        if msg.sql.trim().is_empty() {
            self.sender.on_empty_query_response()?;
            return self.ready();
        }

        self.sender.on_row_description(&RowDescription {
            fields: vec![
                Field::new("col1", PgType::VARCHAR),
                Field::new("col2", PgType::INT4).with_format(PgFormat::Text),
            ],
        })?;

        for (name, id) in [("Tom", "1"), ("Jerry", "2"), ("Spike", "3")] {
            self.sender.on_data_row(&DataRow {
                columns: vec![Some(name.as_bytes()), Some(id.as_bytes())],
            })?;
        }

        self.sender.on_command_complete(&CommandComplete { command: CommandType::Select, rows: 3 })?;
        self.ready()
    }

    fn on_sync(&mut self) -> Result<()> {
        self.skip_until_sync = false;
        self.ready()
    }

    fn on_terminate(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use bytes::BytesMut;
    use postro_wire::postgres::encode;

    use super::*;

    /// Feed client bytes, returns the message types of the response.
    fn respond(session: &mut Session, mut buf: BytesMut) -> Vec<u8> {
        let mut decoder = FrameDecoder::regular();
        while let Some(frame) = decoder.try_extract_frame(&mut buf).unwrap() {
            session.handle(&frame).unwrap();
        }
        let mut response = session.sender.take();
        let mut msgtypes = vec![];
        while let Some(frame) = decoder.try_extract_frame(&mut response).unwrap() {
            msgtypes.extend(frame.tag());
        }
        msgtypes
    }

    #[test]
    fn extended_query_error_waits_for_sync() {
        let mut session = Session::default();
        let mut buf = BytesMut::new();
        encode::write(&Parse { name: "", query: "SELECT 1", param_types: vec![] }, &mut buf).unwrap();
        encode::write(&Bind { portal: "", statement: "", params: vec![], result_formats: vec![] }, &mut buf).unwrap();
        encode::write(&Execute { portal: "", max_rows: 0 }, &mut buf).unwrap();
        assert_eq!(respond(&mut session, buf), [b'E']);
        assert!(session.skip_until_sync);

        let mut buf = BytesMut::new();
        encode::write(&Sync, &mut buf).unwrap();
        assert_eq!(respond(&mut session, buf), [b'Z']);
        assert!(!session.skip_until_sync);

        let mut buf = BytesMut::new();
        encode::write(&Query { sql: "SELECT 1" }, &mut buf).unwrap();
        assert_eq!(respond(&mut session, buf), [b'T', b'D', b'D', b'D', b'C', b'Z']);
    }

    #[test]
    fn simple_query_error_is_ready() {
        let mut session = Session::default();
        session.report(Some(Query::MSGTYPE), &Error::unsupported("on_query")).unwrap();
        assert!(!session.skip_until_sync);

        let mut response = session.sender.take();
        let mut decoder = FrameDecoder::regular();
        assert_eq!(decoder.try_extract_frame(&mut response).unwrap().unwrap().tag(), Some(b'E'));
        assert_eq!(decoder.try_extract_frame(&mut response).unwrap().unwrap().tag(), Some(b'Z'));
    }
}
