//! Payload bytes to [`Message`] and back

use tracing::trace;

use crate::codec::{AcDocument, AppHandshakeDocument, DcDocument, ExiCodec, MainDocument};
use crate::error::{DecodeError, EncodeError};
use crate::v2gtp::{write_header, PayloadType};
use crate::variant::{Family, Message};

/// Decode a payload of the given family into exactly one message
pub fn decode(codec: &dyn ExiCodec, family: Family, bytes: &[u8]) -> Result<Message, DecodeError> {
    trace!(%family, len = bytes.len(), "Decoding payload");

    match family {
        Family::AppHandshake => codec.decode_app_handshake(bytes)?.into_message(),
        Family::Main => codec.decode_main(bytes)?.into_message(),
        Family::Dc => codec.decode_dc(bytes)?.into_message(),
        Family::Ac => codec.decode_ac(bytes)?.into_message(),
    }
}

/// Decode a payload by its V2GTP payload type
pub fn decode_payload(
    codec: &dyn ExiCodec,
    payload_type: PayloadType,
    bytes: &[u8],
) -> Result<Message, DecodeError> {
    let family = payload_type
        .into_family()
        .ok_or(DecodeError::NoFamily(payload_type.id()))?;
    decode(codec, family, bytes)
}

/// Encode a message, returning the payload type it travels under
pub fn encode(codec: &dyn ExiCodec, message: Message) -> Result<(PayloadType, Vec<u8>), EncodeError> {
    let ty = message.message_type();
    let family = ty.family();
    let mismatch = EncodeError::FamilyMismatch(ty);

    let bytes = match family {
        Family::AppHandshake => {
            codec.encode_app_handshake(&AppHandshakeDocument::from_message(message).ok_or(mismatch)?)?
        }
        Family::Main => codec.encode_main(&MainDocument::from_message(message).ok_or(mismatch)?)?,
        Family::Dc => codec.encode_dc(&DcDocument::from_message(message).ok_or(mismatch)?)?,
        Family::Ac => codec.encode_ac(&AcDocument::from_message(message).ok_or(mismatch)?)?,
    };

    Ok((PayloadType::from(family), bytes))
}

/// Encode a message and prepend its V2GTP header
pub fn frame(codec: &dyn ExiCodec, message: Message) -> Result<Vec<u8>, EncodeError> {
    let (payload_type, payload) = encode(codec, message)?;
    let len = u32::try_from(payload.len()).map_err(|_| EncodeError::PayloadTooLarge(payload.len()))?;

    let mut out = Vec::with_capacity(crate::v2gtp::HEADER_LENGTH + payload.len());
    out.extend_from_slice(&write_header(len, payload_type));
    out.extend_from_slice(&payload);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CodecError;
    use crate::json::JsonCodec;
    use crate::messages::*;
    use crate::v2gtp::{read_header, HEADER_LENGTH};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_frame_and_decode() {
        let request = DcPreChargeRequest {
            header: Header {
                session_id: SessionId::new([1, 2, 3, 4, 5, 6, 7, 8]),
                timestamp: 1_700_000_000,
            },
            processing: Processing::Ongoing,
            present_voltage: RationalNumber::new(3500, -1),
            target_voltage: RationalNumber::new(4000, -1),
        };

        let bytes = frame(&JsonCodec, Message::from(request.clone())).unwrap();
        let (len, payload_type) = read_header(&bytes, &PayloadType::SESSION).unwrap();
        assert_eq!(payload_type, PayloadType::Part20Dc);
        assert_eq!(len as usize, bytes.len() - HEADER_LENGTH);

        let message = decode_payload(&JsonCodec, payload_type, &bytes[HEADER_LENGTH..]).unwrap();
        assert_eq!(message.expect::<DcPreChargeRequest>(), &request);
    }

    #[test]
    fn test_decode_wrong_family_is_empty() {
        let (_, bytes) = encode(&JsonCodec, Message::from(AcChargeLoopRequest::default())).unwrap();
        // An AC document read as DC carries none of the DC slots
        assert_eq!(
            decode(&JsonCodec, Family::Dc, &bytes),
            Err(DecodeError::Empty(Family::Dc))
        );
    }

    #[test]
    fn test_decode_garbage() {
        let err = decode(&JsonCodec, Family::Main, b"\x80\x98\x02\x10").unwrap_err();
        assert!(matches!(err, DecodeError::Codec(CodecError::Malformed(_))));
    }

    #[test]
    fn test_sdp_has_no_family() {
        assert_eq!(
            decode_payload(&JsonCodec, PayloadType::SdpRequest, b"{}"),
            Err(DecodeError::NoFamily(0x9000))
        );
    }
}
