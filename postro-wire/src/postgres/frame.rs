//! Message framing.
//!
//! Regular messages are delimited by the length following their tag:
//!
//! ```text
//! ┏━━━━┳━━━━━━━━━━━━━━━━━━━┳━━━━━━┓
//! ┃ Ty ┃       Length      ┃ Body ┃
//! ┣━━━━╋━━━━━━━━━━━━━━━━━━━╋━━━━━━┫
//! ┃ u8 ┃        u32        ┃ [u8] ┃
//! ┗━━━━┻━━━━━━━━━━━━━━━━━━━┻━━━━━━┛
//! ```
//!
//! Startup phase messages has no tag, the length is the first 4 bytes:
//!
//! ```text
//! ┏━━━━━━━━━━━━━━━━━━━┳━━━━━━━━━━━━━━━━━━━┳━━━━━━┓
//! ┃       Length      ┃   Version / Code  ┃ Body ┃
//! ┣━━━━━━━━━━━━━━━━━━━╋━━━━━━━━━━━━━━━━━━━╋━━━━━━┫
//! ┃        u32        ┃        u32        ┃ [u8] ┃
//! ┗━━━━━━━━━━━━━━━━━━━┻━━━━━━━━━━━━━━━━━━━┻━━━━━━┛
//! ```
use bytes::{Bytes, BytesMut};

use super::{PROTOCOL_VERSION_3, ProtocolError};
use crate::{common::verbose, config::DecoderConfig};

/// Upper bound of buffer growth while waiting for the rest of a frame.
///
/// The announced length is untrusted, the buffer grows as bytes actually arrive.
const MAX_RESERVE: usize = 8 * 1024;

/// Framing rule a frame was extracted with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Untagged, self delimited frame sent before the protocol handshake.
    Startup,
    /// Tagged frame.
    Regular,
}

/// One complete protocol message.
#[derive(Clone, PartialEq, Eq)]
pub struct Frame {
    phase: Phase,
    bytes: Bytes,
}

impl Frame {
    /// Create frame from complete message bytes.
    ///
    /// The caller is responsible that `bytes` is exactly one message of given phase.
    pub fn new(phase: Phase, bytes: Bytes) -> Frame {
        Self { phase, bytes }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Message type, `None` for startup phase frame.
    pub fn tag(&self) -> Option<u8> {
        match self.phase {
            Phase::Startup => None,
            Phase::Regular => self.bytes.first().copied(),
        }
    }

    /// Bytes after the length field.
    ///
    /// For startup phase frame, this starts with the protocol version or request code.
    pub fn payload(&self) -> &[u8] {
        let offset = match self.phase {
            Phase::Startup => 4,
            Phase::Regular => 5,
        };
        self.bytes.get(offset..).unwrap_or_default()
    }

    /// Whole frame, including tag and length.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Bytes {
        self.bytes
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use crate::ext::FmtExt;
        f.debug_struct("Frame")
            .field("phase", &self.phase)
            .field("bytes", &self.bytes.lossy())
            .finish()
    }
}

/// Find message boundaries in a byte stream.
///
/// The decoder track whether the next frame is a startup phase frame. Once a
/// startup message with protocol version 3.0 is extracted, every following
/// frame use regular framing. There is no way back to startup framing.
///
/// One decoder belongs to exactly one connection.
#[derive(Debug, Clone)]
pub struct FrameDecoder {
    expecting_startup: bool,
    config: DecoderConfig,
}

impl FrameDecoder {
    /// Decoder for a newly accepted connection, server side.
    pub fn new() -> FrameDecoder {
        Self { expecting_startup: true, config: DecoderConfig::default() }
    }

    /// Decoder for backend traffic, which never sends startup phase messages.
    pub fn regular() -> FrameDecoder {
        Self { expecting_startup: false, config: DecoderConfig::default() }
    }

    /// Replace decoder limits.
    pub fn with_config(mut self, config: DecoderConfig) -> Self {
        self.config = config;
        self
    }

    pub fn is_expecting_startup(&self) -> bool {
        self.expecting_startup
    }

    /// Split one complete frame from the front of `buf`.
    ///
    /// Returns `Ok(None)` if more bytes are required, in which case `buf` is
    /// untouched and the call can be repeated once more bytes arrive.
    ///
    /// Any error is a protocol violation, the connection should be closed.
    pub fn try_extract_frame(&mut self, buf: &mut BytesMut) -> Result<Option<Frame>, ProtocolError> {
        let Some(len) = buf.get(..4) else {
            verbose!(available = buf.len(), "waiting frame length");
            return Ok(None);
        };

        let (phase, frame_len) = if self.expecting_startup {
            let len = i32::from_be_bytes([len[0], len[1], len[2], len[3]]);
            // length + version
            if len < 8 {
                return Err(violation(ProtocolError::InvalidLength(len)));
            }
            let len = len as usize;
            if len > self.config.max_startup_len {
                return Err(violation(ProtocolError::FrameTooLarge { len, max: self.config.max_startup_len }));
            }
            (Phase::Startup, len)
        } else {
            let Some(len) = buf.get(1..5) else {
                verbose!(available = buf.len(), "waiting frame length");
                return Ok(None);
            };
            let len = i32::from_be_bytes([len[0], len[1], len[2], len[3]]);
            if len < 4 {
                return Err(violation(ProtocolError::InvalidLength(len)));
            }
            // tag
            let len = len as usize + 1;
            if len > self.config.max_frame_len {
                return Err(violation(ProtocolError::FrameTooLarge { len, max: self.config.max_frame_len }));
            }
            (Phase::Regular, len)
        };

        if buf.len() < frame_len {
            #[cfg(feature = "log")]
            log::debug!("required {frame_len} bytes, but only {} available", buf.len());
            buf.reserve((frame_len - buf.len()).min(MAX_RESERVE));
            return Ok(None);
        }

        let bytes = buf.split_to(frame_len).freeze();

        if self.expecting_startup && bytes.get(4..8) == Some(&PROTOCOL_VERSION_3.to_be_bytes()[..]) {
            verbose!("startup complete, switching to regular framing");
            self.expecting_startup = false;
        }

        Ok(Some(Frame { phase, bytes }))
    }
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

fn violation(err: ProtocolError) -> ProtocolError {
    #[cfg(feature = "log")]
    log::warn!("{err}");
    err
}

#[cfg(feature = "codec")]
impl tokio_util::codec::Decoder for FrameDecoder {
    type Item = Frame;
    type Error = crate::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        Ok(self.try_extract_frame(src)?)
    }
}
