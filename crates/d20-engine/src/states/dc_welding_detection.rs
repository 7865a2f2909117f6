use tracing::{debug, warn};
use v2g_proto::{
    DcWeldingDetectionRequest, DcWeldingDetectionResponse, Message, MessageType, RationalNumber,
    ResponseCode,
};

use super::{request_of, Event, Handler, State};
use crate::context::Context;
use crate::control::PresentVoltageCurrent;
use crate::timeout::OngoingWait;

/// Voltage check after the contactors opened
///
/// The EV decides when it is done and follows with SessionStopReq, which
/// the engine handles in every state.
#[derive(Debug, Default)]
pub struct DcWeldingDetection {
    wait: OngoingWait,
}

impl Handler for DcWeldingDetection {
    fn handle(&mut self, ctx: &mut Context<'_>, event: Event) -> Option<State> {
        match request_of(event, |kind| self.wait.on_timeout(kind))? {
            Message::DcWeldingDetectionRequest(req) => {
                self.handle_request(ctx, &req);
                None
            }
            other => {
                ctx.sequence_error(other.message_type());
                None
            }
        }
    }
}

impl DcWeldingDetection {
    fn handle_request(&mut self, ctx: &mut Context<'_>, req: &DcWeldingDetectionRequest) {
        if !ctx.is_known_session(&req.header) {
            ctx.respond_failure(MessageType::DcWeldingDetectionRequest, ResponseCode::FailedUnknownSession);
            return;
        }

        if self.wait.take_expired() {
            warn!("Output voltage did not drop in time");
            ctx.respond_failure(MessageType::DcWeldingDetectionRequest, ResponseCode::Failed);
            return;
        }

        let present = ctx
            .poll_control_event::<PresentVoltageCurrent>()
            .map_or(0.0, |p| p.voltage);
        if present <= ctx.config.welding_detection_threshold_v {
            self.wait.finish(ctx);
        } else {
            debug!(present, "Waiting for the output to discharge");
            self.wait.wait(ctx);
        }

        ctx.respond(DcWeldingDetectionResponse {
            header: ctx.header(),
            response_code: ResponseCode::Ok,
            present_voltage: RationalNumber::from_float(present),
        });
    }
}
