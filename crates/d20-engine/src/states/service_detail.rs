//! ServiceDetail: parameter sets of one offered service
//!
//! Parameter-set ids are assigned here (0..n in configuration order) and
//! recorded in the session, so ServiceSelection can resolve them.

use std::collections::BTreeMap;

use tracing::debug;
use v2g_proto::{
    Message, Parameter, ParameterSet, ResponseCode, ServiceCategory, ServiceDetailRequest,
    ServiceDetailResponse,
};

use super::{request_of, Event, Handler, ServiceSelection, State};
use crate::config::{
    AcBptParameterList, AcParameterList, DcBptParameterList, DcParameterList,
    InternetParameterList, ParkingParameterList,
};
use crate::context::Context;

#[derive(Debug, Default)]
pub struct ServiceDetail;

impl Handler for ServiceDetail {
    fn handle(&mut self, ctx: &mut Context<'_>, event: Event) -> Option<State> {
        match request_of(event, |_| {})? {
            Message::ServiceDetailRequest(req) => {
                handle_request(ctx, &req).then(|| ServiceSelection.into())
            }
            other => {
                ctx.sequence_error(other.message_type());
                None
            }
        }
    }
}

/// Answer a ServiceDetailReq; `true` when the parameter sets were sent
///
/// The requested service is checked before the session id. Failure responses
/// carry the default DC parameter set.
pub fn handle_request(ctx: &mut Context<'_>, req: &ServiceDetailRequest) -> bool {
    let fail = |ctx: &mut Context<'_>, response_code: ResponseCode| {
        let res = ServiceDetailResponse {
            header: ctx.header(),
            response_code,
            ..ServiceDetailResponse::default()
        };
        ctx.respond(res);
        false
    };

    let service = req.service;
    if !ctx.session.offered_services.offers(service) {
        return fail(ctx, ResponseCode::FailedServiceIdInvalid);
    }

    if !ctx.is_known_session(&req.header) {
        return fail(ctx, ResponseCode::FailedUnknownSession);
    }

    let config = ctx.config;
    let offered = &mut ctx.session.offered_services;
    let service_parameter_list = match service {
        ServiceCategory::Dc => assign(&config.dc_parameter_list, &mut offered.dc_parameter_list, dc_parameters),
        ServiceCategory::DcBpt => assign(
            &config.dc_bpt_parameter_list,
            &mut offered.dc_bpt_parameter_list,
            dc_bpt_parameters,
        ),
        ServiceCategory::Ac => assign(&config.ac_parameter_list, &mut offered.ac_parameter_list, ac_parameters),
        ServiceCategory::AcBpt => assign(
            &config.ac_bpt_parameter_list,
            &mut offered.ac_bpt_parameter_list,
            ac_bpt_parameters,
        ),
        ServiceCategory::Internet => assign(
            &config.internet_parameter_list,
            &mut offered.internet_parameter_list,
            internet_parameters,
        ),
        ServiceCategory::ParkingStatus => assign(
            &config.parking_parameter_list,
            &mut offered.parking_parameter_list,
            parking_parameters,
        ),
        ServiceCategory::Wpt | ServiceCategory::DcAcdp | ServiceCategory::DcAcdpBpt => {
            return fail(ctx, ResponseCode::FailedServiceIdInvalid);
        }
    };

    debug!(%service, sets = service_parameter_list.len(), "Service detail");

    let res = ServiceDetailResponse {
        header: ctx.header(),
        response_code: ResponseCode::Ok,
        service,
        service_parameter_list,
    };
    ctx.respond(res);
    true
}

fn assign<T: Copy>(
    lists: &[T],
    table: &mut BTreeMap<u16, T>,
    to_parameters: fn(&T) -> Vec<Parameter>,
) -> Vec<ParameterSet> {
    table.clear();
    lists
        .iter()
        .zip(0u16..)
        .map(|(list, id)| {
            table.insert(id, *list);
            ParameterSet {
                id,
                parameters: to_parameters(list),
            }
        })
        .collect()
}

fn dc_parameters(list: &DcParameterList) -> Vec<Parameter> {
    vec![
        Parameter::int("Connector", list.connector.value()),
        Parameter::int("ControlMode", list.control_mode.value()),
        Parameter::int("MobilityNeedsMode", list.mobility_needs_mode.value()),
        Parameter::int("Pricing", list.pricing.value()),
    ]
}

fn dc_bpt_parameters(list: &DcBptParameterList) -> Vec<Parameter> {
    let mut parameters = dc_parameters(&list.dc);
    parameters.push(Parameter::int("BPTChannel", list.bpt_channel.value()));
    parameters.push(Parameter::int("GeneratorMode", list.generator_mode.value()));
    parameters
}

fn ac_parameters(list: &AcParameterList) -> Vec<Parameter> {
    vec![
        Parameter::int("Connector", list.connector.value()),
        Parameter::int("ControlMode", list.control_mode.value()),
        Parameter::rational("EVSENominalVoltage", list.nominal_voltage),
        Parameter::int("MobilityNeedsMode", list.mobility_needs_mode.value()),
        Parameter::int("Pricing", list.pricing.value()),
    ]
}

fn ac_bpt_parameters(list: &AcBptParameterList) -> Vec<Parameter> {
    let mut parameters = ac_parameters(&list.ac);
    parameters.push(Parameter::int("BPTChannel", list.bpt_channel.value()));
    parameters.push(Parameter::int("GeneratorMode", list.generator_mode.value()));
    parameters
}

fn internet_parameters(list: &InternetParameterList) -> Vec<Parameter> {
    vec![
        Parameter::string("Protocol", list.protocol.as_str()),
        Parameter::int("Port", list.port.value()),
    ]
}

fn parking_parameters(list: &ParkingParameterList) -> Vec<Parameter> {
    vec![
        Parameter::int("IntendedService", list.intended_service.value()),
        Parameter::int("ParkingStatusType", list.parking_status_type.value()),
    ]
}
