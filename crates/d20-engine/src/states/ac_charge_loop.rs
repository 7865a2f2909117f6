use tracing::warn;
use v2g_proto::{
    AcChargeLoopRequest, AcChargeLoopRequestMode, AcChargeLoopResponse, AcChargeLoopResponseMode,
    ControlMode, DynamicAcLoopResponse, EvseNotification, EvseStatus, Message, MobilityNeedsMode,
    ResponseCode, ScheduledAcLoopResponse,
};

use super::dc_charge_loop::{ACK_MAX_DELAY_S, DYNAMIC_PAUSE_DELAY_S};
use super::{power_delivery, request_of, Event, Handler, State};
use crate::config::AcTransferLimits;
use crate::context::Context;
use crate::control::{PauseCharging, StopCharging};
use crate::feedback::{Feedback, Signal};
use crate::session::Session;

/// AC energy transfer; same request pattern as the DC loop
#[derive(Debug, Default)]
pub struct AcChargeLoop {
    started: bool,
}

impl Handler for AcChargeLoop {
    fn handle(&mut self, ctx: &mut Context<'_>, event: Event) -> Option<State> {
        match request_of(event, |_| {})? {
            Message::PowerDeliveryRequest(req) => {
                self.started = false;
                power_delivery::handle_in_charge_loop(ctx, &req)
            }
            Message::AcChargeLoopRequest(req) => {
                if !self.started {
                    ctx.signal(Signal::ChargeLoopStarted);
                    self.started = true;
                }

                let stop = ctx.poll_control_event::<StopCharging>().is_some_and(|s| s.0);
                let pause = ctx.poll_control_event::<PauseCharging>().is_some_and(|p| p.0);
                let res = handle_request(&req, ctx.session, stop, pause, &ctx.config.ac_limits);

                if !res.response_code.is_failure() {
                    if let Some(power) = requested_power(&req.control_mode) {
                        ctx.feedback(Feedback::AcChargeLoopTarget { power });
                    }
                }
                ctx.respond(res);
                None
            }
            other => {
                ctx.sequence_error(other.message_type());
                None
            }
        }
    }
}

fn requested_power(mode: &AcChargeLoopRequestMode) -> Option<f32> {
    match mode {
        AcChargeLoopRequestMode::Scheduled(m) | AcChargeLoopRequestMode::BptScheduled(m) => {
            m.max_charge_power.map(|p| p.to_float())
        }
        AcChargeLoopRequestMode::Dynamic(m) | AcChargeLoopRequestMode::BptDynamic(m) => {
            Some(m.max_charge_power.to_float())
        }
    }
}

/// Build the AC_ChargeLoopRes for `req`
pub fn handle_request(
    req: &AcChargeLoopRequest,
    session: &Session,
    stop: bool,
    pause: bool,
    limits: &AcTransferLimits,
) -> AcChargeLoopResponse {
    let failed = |response_code| AcChargeLoopResponse {
        header: session.header(),
        response_code,
        ..AcChargeLoopResponse::default()
    };

    if !session.matches(&req.header) {
        return failed(ResponseCode::FailedUnknownSession);
    }

    let Some(selected) = &session.selected_services else {
        return failed(ResponseCode::Failed);
    };

    let (control_mode, bpt) = match &req.control_mode {
        AcChargeLoopRequestMode::Scheduled(_) => (ControlMode::Scheduled, false),
        AcChargeLoopRequestMode::BptScheduled(_) => (ControlMode::Scheduled, true),
        AcChargeLoopRequestMode::Dynamic(_) => (ControlMode::Dynamic, false),
        AcChargeLoopRequestMode::BptDynamic(_) => (ControlMode::Dynamic, true),
    };

    if selected.control_mode != control_mode
        || selected.is_bpt() != bpt
        || !selected.energy_service.is_ac()
    {
        warn!(?control_mode, bpt, "Charge loop request does not match the selected service");
        return failed(ResponseCode::Failed);
    }

    if bpt && limits.discharge.is_none() {
        warn!("BPT charge loop without discharge limits");
        return failed(ResponseCode::Failed);
    }

    let target_active_power = limits.max_charge_power;
    let scheduled = ScheduledAcLoopResponse {
        target_active_power: Some(target_active_power),
    };
    let dynamic = DynamicAcLoopResponse {
        ack_max_delay: (selected.mobility_needs_mode == MobilityNeedsMode::ProvidedBySecc)
            .then_some(ACK_MAX_DELAY_S),
        target_active_power,
        ..DynamicAcLoopResponse::default()
    };
    let control_mode_res = match &req.control_mode {
        AcChargeLoopRequestMode::Scheduled(_) => AcChargeLoopResponseMode::Scheduled(scheduled),
        AcChargeLoopRequestMode::BptScheduled(_) => AcChargeLoopResponseMode::BptScheduled(scheduled),
        AcChargeLoopRequestMode::Dynamic(_) => AcChargeLoopResponseMode::Dynamic(dynamic),
        AcChargeLoopRequestMode::BptDynamic(_) => AcChargeLoopResponseMode::BptDynamic(dynamic),
    };

    let status = if stop {
        Some(EvseStatus {
            notification_max_delay: 0,
            notification: EvseNotification::Terminate,
        })
    } else if pause {
        Some(EvseStatus {
            notification_max_delay: match control_mode {
                ControlMode::Dynamic => DYNAMIC_PAUSE_DELAY_S,
                ControlMode::Scheduled => 0,
            },
            notification: EvseNotification::Pause,
        })
    } else {
        None
    };

    AcChargeLoopResponse {
        header: session.header(),
        response_code: ResponseCode::Ok,
        status,
        target_frequency: None,
        control_mode: control_mode_res,
    }
}
