use tracing::warn;
use v2g_proto::{
    AcChargeParameterDiscoveryRequest, AcChargeParameterDiscoveryResponse, AcCpdRequestMode,
    AcCpdResponseMode, AcCpdResponseParams, Message, MessageType, ResponseCode,
};

use super::{request_of, Event, Handler, ScheduleExchange, State};
use crate::config::AcTransferLimits;
use crate::context::Context;

#[derive(Debug, Default)]
pub struct AcChargeParameterDiscovery;

impl Handler for AcChargeParameterDiscovery {
    fn handle(&mut self, ctx: &mut Context<'_>, event: Event) -> Option<State> {
        match request_of(event, |_| {})? {
            Message::AcChargeParameterDiscoveryRequest(req) => handle_request(ctx, &req),
            other => {
                ctx.sequence_error(other.message_type());
                None
            }
        }
    }
}

fn handle_request(ctx: &mut Context<'_>, req: &AcChargeParameterDiscoveryRequest) -> Option<State> {
    const REQUEST: MessageType = MessageType::AcChargeParameterDiscoveryRequest;

    if !ctx.is_known_session(&req.header) {
        ctx.respond_failure(REQUEST, ResponseCode::FailedUnknownSession);
        return None;
    }

    let Some(bpt) = ctx.session.selected_services.as_ref().map(|s| s.is_bpt()) else {
        ctx.respond_failure(REQUEST, ResponseCode::Failed);
        return None;
    };

    let requested_bpt = matches!(req.transfer_mode, AcCpdRequestMode::BptAc(_));
    if requested_bpt != bpt {
        warn!(requested_bpt, selected_bpt = bpt, "Transfer mode does not match the selected service");
        ctx.respond_failure(REQUEST, ResponseCode::FailedWrongChargeParameter);
        return None;
    }

    let params = response_params(&ctx.config.ac_limits, bpt);
    let transfer_mode = if bpt {
        AcCpdResponseMode::BptAc(params)
    } else {
        AcCpdResponseMode::Ac(params)
    };
    ctx.respond(AcChargeParameterDiscoveryResponse {
        header: ctx.header(),
        response_code: ResponseCode::Ok,
        transfer_mode,
    });

    Some(ScheduleExchange.into())
}

pub fn response_params(limits: &AcTransferLimits, bpt: bool) -> AcCpdResponseParams {
    let discharge = limits.discharge.filter(|_| bpt);
    AcCpdResponseParams {
        max_charge_power: limits.max_charge_power,
        min_charge_power: limits.min_charge_power,
        nominal_frequency: limits.nominal_frequency,
        max_power_asymmetry: limits.max_power_asymmetry,
        power_ramp_limit: limits.power_ramp_limit,
        present_active_power: None,
        max_discharge_power: discharge.map(|d| d.max_discharge_power),
        min_discharge_power: discharge.map(|d| d.min_discharge_power),
    }
}
