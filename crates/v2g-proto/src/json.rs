//! Development codec
//!
//! Speaks the same document model as an EXI codec, serialized as JSON. Used
//! by the daemon's `--codec json` mode and throughout the test suites so a
//! session can run end to end without generated EXI bindings.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::codec::{AcDocument, AppHandshakeDocument, DcDocument, ExiCodec, MainDocument};
use crate::error::CodecError;

/// JSON rendition of the EXI document model
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl JsonCodec {
    fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CodecError> {
        serde_json::from_slice(bytes).map_err(|e| CodecError::Malformed(e.to_string()))
    }

    fn encode<T: Serialize>(document: &T) -> Result<Vec<u8>, CodecError> {
        serde_json::to_vec(document).map_err(|e| CodecError::Encode(e.to_string()))
    }
}

impl ExiCodec for JsonCodec {
    fn decode_app_handshake(&self, bytes: &[u8]) -> Result<AppHandshakeDocument, CodecError> {
        Self::decode(bytes)
    }

    fn encode_app_handshake(&self, document: &AppHandshakeDocument) -> Result<Vec<u8>, CodecError> {
        Self::encode(document)
    }

    fn decode_main(&self, bytes: &[u8]) -> Result<MainDocument, CodecError> {
        Self::decode(bytes)
    }

    fn encode_main(&self, document: &MainDocument) -> Result<Vec<u8>, CodecError> {
        Self::encode(document)
    }

    fn decode_dc(&self, bytes: &[u8]) -> Result<DcDocument, CodecError> {
        Self::decode(bytes)
    }

    fn encode_dc(&self, document: &DcDocument) -> Result<Vec<u8>, CodecError> {
        Self::encode(document)
    }

    fn decode_ac(&self, bytes: &[u8]) -> Result<AcDocument, CodecError> {
        Self::decode(bytes)
    }

    fn encode_ac(&self, document: &AcDocument) -> Result<Vec<u8>, CodecError> {
        Self::encode(document)
    }
}
