//! DC_PreCharge: ramping the output voltage to the EV battery voltage
//!
//! DC_PreChargeRes has no processing field, so the EV decides on its own
//! when the ramp is done. A PowerDeliveryReq arriving here after at least
//! one answered DC_PreChargeReq hands over to PowerDelivery.

use tracing::{debug, info, warn};
use v2g_proto::{
    DcPreChargeRequest, DcPreChargeResponse, Message, MessageType, PowerDeliveryRequest,
    RationalNumber, ResponseCode,
};

use super::{request_of, Event, Handler, PowerDelivery, State};
use crate::context::Context;
use crate::control::PresentVoltageCurrent;
use crate::feedback::{Feedback, Signal};
use crate::timeout::OngoingWait;

/// Output voltage ramp towards the EV battery voltage
#[derive(Debug, Default)]
pub struct DcPreCharge {
    wait: OngoingWait,
    started: bool,
}

impl Handler for DcPreCharge {
    fn handle(&mut self, ctx: &mut Context<'_>, event: Event) -> Option<State> {
        match request_of(event, |kind| self.wait.on_timeout(kind))? {
            Message::DcPreChargeRequest(req) => self.handle_request(ctx, &req),
            Message::PowerDeliveryRequest(req) if self.started => self.hand_over(ctx, req),
            other => {
                ctx.sequence_error(other.message_type());
                None
            }
        }
    }
}

impl DcPreCharge {
    fn handle_request(&mut self, ctx: &mut Context<'_>, req: &DcPreChargeRequest) -> Option<State> {
        if !ctx.is_known_session(&req.header) {
            ctx.respond_failure(MessageType::DcPreChargeRequest, ResponseCode::FailedUnknownSession);
            return None;
        }

        if self.wait.take_expired() {
            warn!("Pre-charge did not reach the target voltage in time");
            ctx.respond_failure(MessageType::DcPreChargeRequest, ResponseCode::Failed);
            return None;
        }

        if !self.started {
            ctx.signal(Signal::PreChargeStarted);
            self.started = true;
        }

        if respond(ctx, req) {
            info!("Pre-charge voltage reached");
            self.wait.finish(ctx);
            Some(PowerDelivery::default().into())
        } else {
            self.wait.wait(ctx);
            None
        }
    }

    fn hand_over(&mut self, ctx: &mut Context<'_>, req: PowerDeliveryRequest) -> Option<State> {
        if !ctx.is_known_session(&req.header) {
            ctx.respond_failure(MessageType::PowerDeliveryRequest, ResponseCode::FailedUnknownSession);
            return None;
        }

        if self.wait.take_expired() {
            warn!("Pre-charge did not reach the target voltage in time");
            ctx.respond_failure(MessageType::PowerDeliveryRequest, ResponseCode::Failed);
            return None;
        }

        info!("EV finished pre-charge");
        self.wait.finish(ctx);
        let mut power_delivery = PowerDelivery::default();
        let event = Event::IncomingMessage(Message::PowerDeliveryRequest(req));
        match power_delivery.handle(ctx, event) {
            Some(next) => Some(next),
            None => Some(power_delivery.into()),
        }
    }
}

/// Answer a DC_PreChargeReq with the present output voltage
///
/// Returns `true` once the output is within the configured tolerance of the
/// EV's target.
pub fn respond(ctx: &mut Context<'_>, req: &DcPreChargeRequest) -> bool {
    let target = req.target_voltage.to_float();
    ctx.feedback(Feedback::DcPreChargeTargetVoltage(target));

    let present = ctx
        .poll_control_event::<PresentVoltageCurrent>()
        .map_or(0.0, |p| p.voltage);
    debug!(present, target, "Pre-charge");

    ctx.respond(DcPreChargeResponse {
        header: ctx.header(),
        response_code: ResponseCode::Ok,
        present_voltage: RationalNumber::from_float(present),
    });

    (present - target).abs() <= ctx.config.pre_charge_tolerance_v
}
