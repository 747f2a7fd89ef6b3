//! Decoder configuration.
use std::env::var;

/// Limits applied by [`FrameDecoder`][crate::postgres::FrameDecoder].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecoderConfig {
    pub(crate) max_frame_len: usize,
    pub(crate) max_startup_len: usize,
}

impl DecoderConfig {
    /// Default maximum regular frame size, 1 GiB.
    pub const DEFAULT_MAX_FRAME_LEN: usize = 1 << 30;
    /// Default maximum startup frame size, postgres itself rejects startup packet above this.
    pub const DEFAULT_MAX_STARTUP_LEN: usize = 10_000;

    /// Retrieve configuration from environment variable.
    ///
    /// It reads:
    /// - `PGWIRE_MAX_FRAME_LEN`
    /// - `PGWIRE_MAX_STARTUP_LEN`
    ///
    /// Missing or unparsable value fallback to default.
    pub fn from_env() -> DecoderConfig {
        macro_rules! env {
            ($name:literal,$def:expr) => {
                match var($name).ok().and_then(|e| e.parse().ok()) {
                    Some(ok) => ok,
                    None => $def,
                }
            };
        }

        Self {
            max_frame_len: env!("PGWIRE_MAX_FRAME_LEN", Self::DEFAULT_MAX_FRAME_LEN),
            max_startup_len: env!("PGWIRE_MAX_STARTUP_LEN", Self::DEFAULT_MAX_STARTUP_LEN),
        }
    }

    /// Set maximum regular frame size, including tag.
    pub fn max_frame_len(mut self, len: usize) -> Self {
        self.max_frame_len = len;
        self
    }

    /// Set maximum startup frame size.
    pub fn max_startup_len(mut self, len: usize) -> Self {
        self.max_startup_len = len;
        self
    }

    pub fn get_max_frame_len(&self) -> usize {
        self.max_frame_len
    }

    pub fn get_max_startup_len(&self) -> usize {
        self.max_startup_len
    }
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            max_frame_len: Self::DEFAULT_MAX_FRAME_LEN,
            max_startup_len: Self::DEFAULT_MAX_STARTUP_LEN,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn builder() {
        let config = DecoderConfig::default().max_frame_len(64).max_startup_len(16);
        assert_eq!(config.get_max_frame_len(), 64);
        assert_eq!(config.get_max_startup_len(), 16);
        assert_eq!(DecoderConfig::default().get_max_startup_len(), 10_000);
    }
}
