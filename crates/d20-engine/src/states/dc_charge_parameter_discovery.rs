use tracing::{debug, warn};
use v2g_proto::{
    DcChargeParameterDiscoveryRequest, DcChargeParameterDiscoveryResponse, DcCpdRequestMode,
    DcCpdResponseMode, DcCpdResponseParams, Message, MessageType, ResponseCode,
};

use super::{request_of, Event, Handler, ScheduleExchange, State};
use crate::config::DcTransferLimits;
use crate::context::Context;

#[derive(Debug, Default)]
pub struct DcChargeParameterDiscovery;

impl Handler for DcChargeParameterDiscovery {
    fn handle(&mut self, ctx: &mut Context<'_>, event: Event) -> Option<State> {
        match request_of(event, |_| {})? {
            Message::DcChargeParameterDiscoveryRequest(req) => handle_request(ctx, &req),
            other => {
                ctx.sequence_error(other.message_type());
                None
            }
        }
    }
}

fn handle_request(ctx: &mut Context<'_>, req: &DcChargeParameterDiscoveryRequest) -> Option<State> {
    const REQUEST: MessageType = MessageType::DcChargeParameterDiscoveryRequest;

    if !ctx.is_known_session(&req.header) {
        ctx.respond_failure(REQUEST, ResponseCode::FailedUnknownSession);
        return None;
    }

    let bpt = match &ctx.session.selected_services {
        Some(selected) => selected.is_bpt(),
        None => {
            ctx.respond_failure(REQUEST, ResponseCode::Failed);
            return None;
        }
    };

    let requested_bpt = matches!(req.transfer_mode, DcCpdRequestMode::BptDc(_));
    if requested_bpt != bpt {
        warn!(requested_bpt, selected_bpt = bpt, "Transfer mode does not match the selected service");
        ctx.respond_failure(REQUEST, ResponseCode::FailedWrongChargeParameter);
        return None;
    }

    let params = response_params(&ctx.config.dc_limits, bpt);
    debug!(?params, "DC limits");

    let transfer_mode = if bpt {
        DcCpdResponseMode::BptDc(params)
    } else {
        DcCpdResponseMode::Dc(params)
    };
    ctx.respond(DcChargeParameterDiscoveryResponse {
        header: ctx.header(),
        response_code: ResponseCode::Ok,
        transfer_mode,
    });

    Some(ScheduleExchange.into())
}

/// EVSE limits as reported to the EV; discharge limits only for BPT
pub fn response_params(limits: &DcTransferLimits, bpt: bool) -> DcCpdResponseParams {
    let discharge = limits.discharge.filter(|_| bpt);
    DcCpdResponseParams {
        max_charge_power: limits.max_charge_power,
        min_charge_power: limits.min_charge_power,
        max_charge_current: limits.max_charge_current,
        min_charge_current: limits.min_charge_current,
        max_voltage: limits.max_voltage,
        min_voltage: limits.min_voltage,
        power_ramp_limit: limits.power_ramp_limit,
        max_discharge_power: discharge.map(|d| d.max_discharge_power),
        min_discharge_power: discharge.map(|d| d.min_discharge_power),
        max_discharge_current: discharge.map(|d| d.max_discharge_current),
        min_discharge_current: discharge.map(|d| d.min_discharge_current),
    }
}
