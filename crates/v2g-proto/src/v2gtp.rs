//! V2G transfer protocol header
//!
//! Every V2G message travels behind an 8-byte big-endian header:
//!
//! ```text
//! +---------+-----------------+--------------+----------------+
//! | version | inverse version | payload type | payload length |
//! | 0x01    | 0xFE            | u16          | u32            |
//! +---------+-----------------+--------------+----------------+
//! ```

use crate::error::FrameError;
use crate::variant::Family;

/// Protocol version byte
pub const V2GTP_VERSION: u8 = 0x01;
/// Bitwise inverse of [`V2GTP_VERSION`]
pub const V2GTP_VERSION_INV: u8 = 0xFE;
/// Header size in bytes
pub const HEADER_LENGTH: usize = 8;

/// Payload type identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum PayloadType {
    /// SupportedAppProtocol handshake
    Sap = 0x8001,
    /// ISO 15118-20 common messages
    Part20Main = 0x8002,
    /// ISO 15118-20 AC messages
    Part20Ac = 0x8003,
    /// ISO 15118-20 DC messages
    Part20Dc = 0x8004,
    /// SECC discovery request (UDP)
    SdpRequest = 0x9000,
    /// SECC discovery response (UDP)
    SdpResponse = 0x9001,
}

impl PayloadType {
    /// Payload types carried on the TCP/TLS session stream
    pub const SESSION: [PayloadType; 4] = [
        PayloadType::Sap,
        PayloadType::Part20Main,
        PayloadType::Part20Ac,
        PayloadType::Part20Dc,
    ];

    pub fn id(self) -> u16 {
        self as u16
    }

    pub fn from_id(id: u16) -> Option<Self> {
        match id {
            0x8001 => Some(Self::Sap),
            0x8002 => Some(Self::Part20Main),
            0x8003 => Some(Self::Part20Ac),
            0x8004 => Some(Self::Part20Dc),
            0x9000 => Some(Self::SdpRequest),
            0x9001 => Some(Self::SdpResponse),
            _ => None,
        }
    }

    /// Message family decoded from this payload type, if any
    pub fn into_family(self) -> Option<Family> {
        match self {
            Self::Sap => Some(Family::AppHandshake),
            Self::Part20Main => Some(Family::Main),
            Self::Part20Ac => Some(Family::Ac),
            Self::Part20Dc => Some(Family::Dc),
            Self::SdpRequest | Self::SdpResponse => None,
        }
    }
}

impl From<Family> for PayloadType {
    fn from(family: Family) -> Self {
        match family {
            Family::AppHandshake => Self::Sap,
            Family::Main => Self::Part20Main,
            Family::Ac => Self::Part20Ac,
            Family::Dc => Self::Part20Dc,
        }
    }
}

/// Build the header for a payload of `payload_len` bytes
pub fn write_header(payload_len: u32, payload_type: PayloadType) -> [u8; HEADER_LENGTH] {
    let mut header = [0u8; HEADER_LENGTH];
    header[0] = V2GTP_VERSION;
    header[1] = V2GTP_VERSION_INV;
    header[2..4].copy_from_slice(&payload_type.id().to_be_bytes());
    header[4..8].copy_from_slice(&payload_len.to_be_bytes());
    header
}

/// Parse a header, accepting only the given payload types
///
/// Only the first [`HEADER_LENGTH`] bytes are inspected.
pub fn read_header(
    bytes: &[u8],
    accepted: &[PayloadType],
) -> Result<(u32, PayloadType), FrameError> {
    if bytes.len() < HEADER_LENGTH {
        return Err(FrameError::Truncated(bytes.len()));
    }

    if bytes[0] != V2GTP_VERSION || bytes[1] != V2GTP_VERSION_INV {
        return Err(FrameError::VersionMismatch {
            version: bytes[0],
            inverse: bytes[1],
        });
    }

    let id = u16::from_be_bytes([bytes[2], bytes[3]]);
    let payload_type = PayloadType::from_id(id)
        .filter(|ty| accepted.contains(ty))
        .ok_or(FrameError::PayloadIdMismatch(id))?;

    let payload_len = u32::from_be_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
    Ok((payload_len, payload_type))
}
