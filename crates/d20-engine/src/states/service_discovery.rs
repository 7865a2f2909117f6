use tracing::debug;
use v2g_proto::{
    Message, MessageType, ResponseCode, Service, ServiceCategory, ServiceDiscoveryRequest,
    ServiceDiscoveryResponse,
};

use super::{request_of, Event, Handler, ServiceDetail, State};
use crate::context::Context;

#[derive(Debug, Default)]
pub struct ServiceDiscovery;

impl Handler for ServiceDiscovery {
    fn handle(&mut self, ctx: &mut Context<'_>, event: Event) -> Option<State> {
        match request_of(event, |_| {})? {
            Message::ServiceDiscoveryRequest(req) => handle_request(ctx, &req),
            other => {
                ctx.sequence_error(other.message_type());
                None
            }
        }
    }
}

fn handle_request(ctx: &mut Context<'_>, req: &ServiceDiscoveryRequest) -> Option<State> {
    if !ctx.is_known_session(&req.header) {
        ctx.respond_failure(MessageType::ServiceDiscoveryRequest, ResponseCode::FailedUnknownSession);
        return None;
    }

    let wanted = |service: &ServiceCategory| match &req.supported_service_ids {
        Some(ids) => ids.contains(&service.id()),
        None => true,
    };

    let energy_services: Vec<ServiceCategory> = ctx
        .config
        .supported_energy_services
        .iter()
        .copied()
        .filter(|s| wanted(s))
        .collect();
    let vas_services: Vec<ServiceCategory> =
        ctx.config.vas_services().into_iter().filter(|s| wanted(s)).collect();

    debug!(?energy_services, ?vas_services, "Offering services");

    let to_list = |services: &[ServiceCategory]| -> Vec<Service> {
        services
            .iter()
            .map(|&service_id| Service {
                service_id,
                free_service: false,
            })
            .collect()
    };

    let res = ServiceDiscoveryResponse {
        header: ctx.header(),
        response_code: ResponseCode::Ok,
        service_renegotiation_supported: false,
        energy_transfer_service_list: to_list(&energy_services),
        vas_list: (!vas_services.is_empty()).then(|| to_list(&vas_services)),
    };

    ctx.session.offered_services.energy_services = energy_services;
    ctx.session.offered_services.vas_services = vas_services;
    ctx.respond(res);

    Some(ServiceDetail.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{InternetParameterList, SessionConfig};
    use crate::context::testing::Harness;
    use crate::states::StateId;
    use v2g_proto::{InternetPort, InternetProtocol};

    fn config() -> SessionConfig {
        SessionConfig {
            supported_energy_services: vec![ServiceCategory::Dc, ServiceCategory::DcBpt],
            internet_parameter_list: vec![InternetParameterList {
                protocol: InternetProtocol::Https,
                port: InternetPort::Port443,
            }],
            ..SessionConfig::default()
        }
    }

    #[test]
    fn test_all_services_offered() {
        let mut harness = Harness::established().with_config(config());
        let event: Event = Message::from(ServiceDiscoveryRequest {
            header: harness.header(),
            supported_service_ids: None,
        })
        .into();

        let (next, res) = harness.run(|ctx| ServiceDiscovery.handle(ctx, event));
        assert_eq!(next.map(|s| s.id()), Some(StateId::ServiceDetail));

        let res = res.unwrap();
        let res = res.expect::<ServiceDiscoveryResponse>();
        assert_eq!(res.response_code, ResponseCode::Ok);
        assert!(!res.service_renegotiation_supported);
        assert_eq!(res.energy_transfer_service_list.len(), 2);
        assert_eq!(
            res.vas_list.as_ref().map(|l| l[0].service_id),
            Some(ServiceCategory::Internet)
        );
        assert_eq!(
            harness.session.offered_services.vas_services,
            vec![ServiceCategory::Internet]
        );
    }

    #[test]
    fn test_filtered_by_ev_ids() {
        let mut harness = Harness::established().with_config(config());
        let event: Event = Message::from(ServiceDiscoveryRequest {
            header: harness.header(),
            supported_service_ids: Some(vec![ServiceCategory::DcBpt.id()]),
        })
        .into();

        let (_, res) = harness.run(|ctx| ServiceDiscovery.handle(ctx, event));
        let res = res.unwrap();
        let res = res.expect::<ServiceDiscoveryResponse>();
        assert_eq!(
            res.energy_transfer_service_list,
            vec![Service {
                service_id: ServiceCategory::DcBpt,
                free_service: false
            }]
        );
        assert_eq!(res.vas_list, None);
        assert_eq!(
            harness.session.offered_services.energy_services,
            vec![ServiceCategory::DcBpt]
        );
    }
}
