//! Engine error types

use thiserror::Error;
use v2g_proto::{DecodeError, EncodeError, FrameError};

/// Errors from the byte-level entry point
///
/// Protocol problems are not errors: they are answered with a response code.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("Frame error: {0}")]
    Frame(#[from] FrameError),

    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("Encode error: {0}")]
    Encode(#[from] EncodeError),

    #[error("Session already terminated")]
    Terminated,
}

pub type EngineResult<T> = std::result::Result<T, EngineError>;
