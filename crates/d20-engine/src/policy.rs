//! Failure responses
//!
//! A request that cannot be served is answered with the response type that
//! matches it, carrying only the mandatory fields and the failure code.

use v2g_proto::{Header, Message, MessageType, ResponseCode};

/// Mandatory-fields-only response to `request` with the given code
///
/// Returns `None` when `request` is itself a response type. The
/// SupportedAppProtocol response has its own code set and always reports
/// `Failed_NoNegotiation`.
pub fn failure_response(request: MessageType, code: ResponseCode, header: Header) -> Option<Message> {
    let mut response = Message::default_of(request.response_type()?);
    if let Some(res) = response.as_response_mut() {
        *res.header_mut() = header;
        res.set_response_code(code);
    }
    Some(response)
}

/// Response to a request the current state does not accept
pub fn sequence_error(request: MessageType, header: Header) -> Option<Message> {
    failure_response(request, ResponseCode::FailedSequenceError, header)
}
