use tracing::{info, warn};
use v2g_proto::{ChargingSession, Message, MessageType, ResponseCode, SessionStopRequest, SessionStopResponse};

use super::{request_of, Event, Handler, State};
use crate::context::Context;
use crate::feedback::Signal;

/// Waiting for SessionStopReq after the energy transfer ended
///
/// SessionStopReq is accepted in every state; the engine routes it to
/// [`handle_request`] directly.
#[derive(Debug, Default)]
pub struct SessionStop;

impl Handler for SessionStop {
    fn handle(&mut self, ctx: &mut Context<'_>, event: Event) -> Option<State> {
        match request_of(event, |_| {})? {
            Message::SessionStopRequest(req) => {
                handle_request(ctx, &req);
                None
            }
            other => {
                ctx.sequence_error(other.message_type());
                None
            }
        }
    }
}

/// Answer SessionStopReq and end the session on success
pub fn handle_request(ctx: &mut Context<'_>, req: &SessionStopRequest) {
    if !ctx.is_known_session(&req.header) {
        ctx.respond_failure(MessageType::SessionStopRequest, ResponseCode::FailedUnknownSession);
        return;
    }

    match req.charging_session {
        ChargingSession::Terminate => ctx.signal(Signal::DlinkTerminate),
        ChargingSession::Pause => ctx.signal(Signal::DlinkPause),
        ChargingSession::ServiceRenegotiation => {
            warn!("Service renegotiation requested but not supported");
            ctx.respond_failure(
                MessageType::SessionStopRequest,
                ResponseCode::FailedNoServiceRenegotiationSupported,
            );
            return;
        }
    }

    info!(
        charging_session = ?req.charging_session,
        code = req.ev_termination_code.as_deref().unwrap_or("-"),
        explanation = req.ev_termination_explanation.as_deref().unwrap_or("-"),
        "Session stopped by EV"
    );

    ctx.respond(SessionStopResponse {
        header: ctx.header(),
        response_code: ResponseCode::Ok,
    });
    ctx.session.terminated = true;
}
