//! Error types for the engine's two caller-facing surfaces.
//!
//! Everything here is recoverable by the caller and reported immediately;
//! the engine never retries on its own. Sample loss under overload is a
//! policy, not an error, and has no variant.

use thiserror::Error;

use crate::sample::RECORD_SIZE;

/// Outcome of a failed read on the data channel.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReadError {
    /// Non-blocking read on an empty buffer. Expected transient condition;
    /// retry later or poll for readiness first.
    #[error("no sample available")]
    WouldBlock,

    /// A blocking read was cancelled by its deadline before data arrived.
    #[error("read interrupted before a sample arrived")]
    Interrupted,

    /// The engine shut down while the caller was waiting.
    #[error("engine is shut down")]
    Shutdown,

    /// The destination buffer cannot hold one full record. Nothing was
    /// consumed; partial records are never delivered.
    #[error("buffer of {got} bytes is smaller than one {need}-byte record")]
    ShortBuffer { need: usize, got: usize },
}

impl ReadError {
    pub(crate) fn short(got: usize) -> Self {
        ReadError::ShortBuffer {
            need: RECORD_SIZE,
            got,
        }
    }
}

/// Outcome of a rejected configuration write. The previously committed
/// value is always left intact.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Value parsed but falls outside the attribute's accepted range.
    #[error("{attr}={value} out of range [{min}, {max}]")]
    OutOfRange {
        attr: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },

    /// Mode string is not one of `normal`, `noisy`, `ramp`.
    #[error("unknown mode {0:?}")]
    BadMode(String),

    /// Attribute text did not parse as the expected type.
    #[error("malformed value {text:?} for attribute {attr}")]
    Malformed { attr: &'static str, text: String },

    /// No attribute with that name exists.
    #[error("unknown attribute {0:?}")]
    UnknownAttr(String),

    /// The attribute exists but cannot be written.
    #[error("attribute {0} is read-only")]
    ReadOnly(&'static str),
}
