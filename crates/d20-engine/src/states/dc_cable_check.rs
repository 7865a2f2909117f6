use tracing::{info, warn};
use v2g_proto::{
    DcCableCheckRequest, DcCableCheckResponse, Message, MessageType, Processing, ResponseCode,
};

use super::{request_of, DcPreCharge, Event, Handler, State};
use crate::context::Context;
use crate::control::CableCheckFinished;
use crate::feedback::Signal;
use crate::timeout::OngoingWait;

/// Isolation check, answered "Ongoing" until the host reports a result
#[derive(Debug, Default)]
pub struct DcCableCheck {
    wait: OngoingWait,
    started: bool,
}

impl Handler for DcCableCheck {
    fn handle(&mut self, ctx: &mut Context<'_>, event: Event) -> Option<State> {
        match request_of(event, |kind| self.wait.on_timeout(kind))? {
            Message::DcCableCheckRequest(req) => self.handle_request(ctx, &req),
            other => {
                ctx.sequence_error(other.message_type());
                None
            }
        }
    }
}

impl DcCableCheck {
    fn respond(ctx: &mut Context<'_>, response_code: ResponseCode, processing: Processing) {
        ctx.respond(DcCableCheckResponse {
            header: ctx.header(),
            response_code,
            processing,
        });
    }

    fn handle_request(&mut self, ctx: &mut Context<'_>, req: &DcCableCheckRequest) -> Option<State> {
        if !ctx.is_known_session(&req.header) {
            ctx.respond_failure(MessageType::DcCableCheckRequest, ResponseCode::FailedUnknownSession);
            return None;
        }

        if self.wait.take_expired() {
            warn!("Cable check did not finish in time");
            Self::respond(ctx, ResponseCode::Failed, Processing::Finished);
            return None;
        }

        if !self.started {
            ctx.signal(Signal::StartCableCheck);
            self.started = true;
        }

        match ctx.poll_control_event::<CableCheckFinished>() {
            Some(CableCheckFinished(true)) => {
                info!("Cable check passed");
                self.wait.finish(ctx);
                Self::respond(ctx, ResponseCode::Ok, Processing::Finished);
                Some(DcPreCharge::default().into())
            }
            Some(CableCheckFinished(false)) => {
                warn!("Cable check failed");
                self.wait.finish(ctx);
                Self::respond(ctx, ResponseCode::Failed, Processing::Finished);
                None
            }
            None => {
                self.wait.wait(ctx);
                Self::respond(ctx, ResponseCode::Ok, Processing::Ongoing);
                None
            }
        }
    }
}
