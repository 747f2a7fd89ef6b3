//! Postgres Wire Protocol Codec
//!
//! Turns a raw byte stream into postgres protocol messages, and messages into
//! the exact bytes a client or a server expects. Network io is left to the caller.
//!
//! # Examples
//!
//! Server side, respond to a simple query:
//!
//! ```
//! use bytes::BytesMut;
//! use postro_wire::postgres::{
//!     BackendListener, BackendSender, CommandType, Field, FrameDecoder, FrontendMessage, PgType,
//!     TransactionStatus, backend::*, encode, frontend::Query,
//! };
//!
//! # fn app() -> postro_wire::Result<()> {
//! // bytes received from the client
//! let mut read_buf = BytesMut::new();
//! encode::write(&Query { sql: "SELECT 420" }, &mut read_buf)?;
//!
//! let mut decoder = FrameDecoder::regular();
//! let mut sender = BackendSender::new();
//!
//! while let Some(frame) = decoder.try_extract_frame(&mut read_buf)? {
//!     let FrontendMessage::Query(query) = FrontendMessage::decode(&frame)? else {
//!         continue;
//!     };
//!     assert_eq!(query.sql, "SELECT 420");
//!
//!     sender.on_row_description(&RowDescription {
//!         fields: vec![Field::new("?column?", PgType::INT4)],
//!     })?;
//!     sender.on_data_row(&DataRow { columns: vec![Some(&b"420"[..])] })?;
//!     sender.on_command_complete(&CommandComplete { command: CommandType::Select, rows: 1 })?;
//!     sender.on_ready_for_query(&ReadyForQuery { status: TransactionStatus::Idle })?;
//! }
//!
//! // bytes to be written to the client
//! let write_buf = sender.take();
//! assert_eq!(write_buf[0], b'T');
//! # Ok(())
//! # }
//! # app().unwrap();
//! ```

mod common;
mod ext;

// Protocol
pub mod postgres;

// Configuration
mod config;

mod error;

pub use config::DecoderConfig;
pub use error::{BoxError, Error, ErrorKind, Result};
