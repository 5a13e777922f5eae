use std::fmt;

use thiserror::Error;

use crate::decoding::domain::native_capability::CapabilityError;
use crate::shared::frame::Frame;

/// Text extracted from one frame. Never outlives the tick that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DecodedPayload(String);

impl DecodedPayload {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for DecodedPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DecodedPayload {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

/// A genuine failure while decoding one frame. "No code in frame" is not an
/// error; it is `Ok(None)`.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("native detector failed: {0}")]
    Capability(#[from] CapabilityError),
    #[error("frame unusable: {0}")]
    Frame(String),
    #[error("decode worker is no longer running")]
    WorkerStopped,
}

/// Domain interface for QR decoding.
///
/// Implementations may keep scratch buffers between calls, hence
/// `&mut self`.
pub trait QrDecoder: Send {
    fn detect(&mut self, frame: &Frame) -> Result<Option<DecodedPayload>, DecodeError>;

    /// Human-readable name for logging.
    fn name(&self) -> &str {
        "unnamed"
    }
}
