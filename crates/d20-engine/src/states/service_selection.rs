use tracing::{info, warn};
use v2g_proto::{
    Message, MessageType, ResponseCode, SelectedService, ServiceCategory, ServiceSelectionRequest,
    ServiceSelectionResponse,
};

use super::{
    request_of, service_detail, AcChargeParameterDiscovery, DcChargeParameterDiscovery, Event,
    Handler, State,
};
use crate::context::Context;
use crate::session::{OfferedServices, SelectedServiceParameters};

#[derive(Debug, Default)]
pub struct ServiceSelection;

impl Handler for ServiceSelection {
    fn handle(&mut self, ctx: &mut Context<'_>, event: Event) -> Option<State> {
        match request_of(event, |_| {})? {
            // The EV may ask for details of further services first
            Message::ServiceDetailRequest(req) => {
                service_detail::handle_request(ctx, &req);
                None
            }
            Message::ServiceSelectionRequest(req) => handle_request(ctx, &req),
            other => {
                ctx.sequence_error(other.message_type());
                None
            }
        }
    }
}

fn handle_request(ctx: &mut Context<'_>, req: &ServiceSelectionRequest) -> Option<State> {
    if !ctx.is_known_session(&req.header) {
        ctx.respond_failure(MessageType::ServiceSelectionRequest, ResponseCode::FailedUnknownSession);
        return None;
    }

    let selected = match select(&ctx.session.offered_services, req) {
        Ok(selected) => selected,
        Err(code) => {
            warn!(selected = ?req.selected_energy_transfer_service, %code, "Service selection rejected");
            ctx.respond_failure(MessageType::ServiceSelectionRequest, code);
            return None;
        }
    };

    info!(
        service = %selected.energy_service,
        control_mode = ?selected.control_mode,
        vas = selected.vas.len(),
        "Services selected"
    );

    let dc = selected.energy_service.is_dc();
    ctx.session.selected_services = Some(selected);
    ctx.respond(ServiceSelectionResponse {
        header: ctx.header(),
        response_code: ResponseCode::Ok,
    });

    if dc {
        Some(DcChargeParameterDiscovery.into())
    } else {
        Some(AcChargeParameterDiscovery.into())
    }
}

/// Resolve the EV's choice against what was offered
pub fn select(
    offered: &OfferedServices,
    req: &ServiceSelectionRequest,
) -> Result<SelectedServiceParameters, ResponseCode> {
    let SelectedService {
        service_id,
        parameter_set_id: id,
    } = req.selected_energy_transfer_service;

    if !service_id.is_energy_transfer() || !offered.energy_services.contains(&service_id) {
        return Err(ResponseCode::FailedNoEnergyTransferServiceSelected);
    }

    let invalid = ResponseCode::FailedServiceSelectionInvalid;
    let mut selected = match service_id {
        ServiceCategory::Dc => offered
            .dc_parameter_list
            .get(&id)
            .map(|list| SelectedServiceParameters::from_dc(service_id, list)),
        ServiceCategory::DcBpt => offered
            .dc_bpt_parameter_list
            .get(&id)
            .map(SelectedServiceParameters::from_dc_bpt),
        ServiceCategory::Ac => offered
            .ac_parameter_list
            .get(&id)
            .map(|list| SelectedServiceParameters::from_ac(service_id, list)),
        ServiceCategory::AcBpt => offered
            .ac_bpt_parameter_list
            .get(&id)
            .map(SelectedServiceParameters::from_ac_bpt),
        _ => None,
    }
    .ok_or(invalid)?;

    for vas in req.selected_vas_list.iter().flatten() {
        let valid = offered.vas_services.contains(&vas.service_id)
            && offered.has_parameter_set(vas.service_id, vas.parameter_set_id);
        if !valid {
            return Err(invalid);
        }
        selected.vas.push(*vas);
    }

    Ok(selected)
}
