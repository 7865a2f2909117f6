//! ISO 15118-20 wire model
//!
//! This crate holds everything that describes a V2G message independently of
//! how a session reacts to it:
//!
//! - [`v2gtp`]: the 8-byte V2G transfer protocol header
//! - [`messages`]: request/response structs of the four message families
//!   (application handshake, common, DC, AC) and their datatypes
//! - [`variant`]: the closed [`Message`] union over all of them
//! - [`codec`] / [`envelope`]: the EXI codec boundary and the conversion from
//!   decoded documents to a single [`Message`]
//! - [`json`]: a development codec speaking JSON documents
//!
//! # Example
//!
//! ```
//! use v2g_proto::{envelope, JsonCodec, Message, SessionSetupRequest};
//!
//! let codec = JsonCodec;
//! let request = SessionSetupRequest {
//!     evcc_id: "WMIV1234567890ABCDEX".into(),
//!     ..Default::default()
//! };
//!
//! let bytes = envelope::frame(&codec, Message::from(request.clone())).unwrap();
//! let (len, payload_type) = v2g_proto::read_header(&bytes, &[v2g_proto::PayloadType::Part20Main]).unwrap();
//! assert_eq!(len as usize, bytes.len() - v2g_proto::HEADER_LENGTH);
//!
//! let message = envelope::decode(&codec, payload_type.into_family().unwrap(), &bytes[8..]).unwrap();
//! assert_eq!(message.expect::<SessionSetupRequest>(), &request);
//! ```

pub mod codec;
pub mod envelope;
pub mod error;
pub mod json;
pub mod messages;
pub mod v2gtp;
pub mod variant;

pub use codec::{AcDocument, AppHandshakeDocument, DcDocument, ExiCodec, MainDocument};
pub use error::{CodecError, DecodeError, EncodeError, FrameError};
pub use json::JsonCodec;
pub use messages::*;
pub use v2gtp::{read_header, write_header, PayloadType, HEADER_LENGTH};
pub use variant::{Family, Message, MessageKind, MessageType, Response};
