//! Error types for framing and the codec boundary

use thiserror::Error;

use crate::variant::{Family, MessageType};

/// V2GTP header errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FrameError {
    #[error("V2GTP version mismatch: got {version:#04x}/{inverse:#04x}, expected 0x01/0xfe")]
    VersionMismatch { version: u8, inverse: u8 },

    #[error("Payload type {0:#06x} not accepted here")]
    PayloadIdMismatch(u16),

    #[error("Truncated V2GTP header: {0} bytes")]
    Truncated(usize),

    #[error("Payload length mismatch: header says {expected}, got {actual}")]
    LengthMismatch { expected: u32, actual: usize },
}

/// Errors reported by an EXI codec implementation
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("Malformed document: {0}")]
    Malformed(String),

    #[error("Document could not be encoded: {0}")]
    Encode(String),
}

/// Errors turning payload bytes into a [`Message`](crate::Message)
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("{0} document carries no message")]
    Empty(Family),

    #[error("{family} document carries {count} messages")]
    Ambiguous { family: Family, count: usize },

    #[error("Payload type {0:#06x} has no message family")]
    NoFamily(u16),
}

/// Errors turning a [`Message`](crate::Message) into payload bytes
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EncodeError {
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("{0} has no document slot in its family")]
    FamilyMismatch(MessageType),

    #[error("Payload too large: {0} bytes")]
    PayloadTooLarge(usize),
}
