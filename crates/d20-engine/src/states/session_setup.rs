//! SupportedAppProtocol handshake and SessionSetup

use tracing::info;
use v2g_proto::{
    AppProtocol, Message, ResponseCode, SapResponseCode, SessionId,
    SessionSetupRequest, SessionSetupResponse, SupportedAppProtocolRequest,
    SupportedAppProtocolResponse, ISO20_AC_NAMESPACE, ISO20_DC_NAMESPACE,
};

use super::{request_of, AuthorizationSetup, Event, Handler, State};
use crate::config::SessionConfig;
use crate::context::Context;
use crate::feedback::Feedback;

/// Major version of ISO 15118-20
const ISO20_VERSION_MAJOR: u32 = 1;

#[derive(Debug, Default)]
pub struct SessionSetup;

impl Handler for SessionSetup {
    fn handle(&mut self, ctx: &mut Context<'_>, event: Event) -> Option<State> {
        match request_of(event, |_| {})? {
            Message::SupportedAppProtocolRequest(req) => {
                handle_app_handshake(ctx, &req);
                None
            }
            Message::SessionSetupRequest(req) => {
                handle_session_setup(ctx, &req);
                Some(AuthorizationSetup.into())
            }
            other => {
                ctx.sequence_error(other.message_type());
                None
            }
        }
    }
}

/// Highest-priority ISO 15118-20 protocol the EVSE can serve
pub fn select_app_protocol<'a>(
    req: &'a SupportedAppProtocolRequest,
    config: &SessionConfig,
) -> Option<&'a AppProtocol> {
    req.app_protocols
        .iter()
        .filter(|p| p.version_major == ISO20_VERSION_MAJOR)
        .filter(|p| {
            (p.protocol_namespace == ISO20_DC_NAMESPACE && config.supports_dc())
                || (p.protocol_namespace == ISO20_AC_NAMESPACE && config.supports_ac())
        })
        .min_by_key(|p| p.priority)
}

fn handle_app_handshake(ctx: &mut Context<'_>, req: &SupportedAppProtocolRequest) {
    let res = match select_app_protocol(req, ctx.config) {
        Some(protocol) => {
            info!(
                namespace = %protocol.protocol_namespace,
                schema_id = protocol.schema_id,
                "App protocol negotiated"
            );
            ctx.feedback(Feedback::SelectedProtocol(protocol.protocol_namespace.clone()));
            SupportedAppProtocolResponse {
                response_code: if protocol.version_minor == 0 {
                    SapResponseCode::SuccessfulNegotiation
                } else {
                    SapResponseCode::SuccessfulNegotiationWithMinorDeviation
                },
                schema_id: Some(protocol.schema_id),
            }
        }
        None => {
            info!(offered = req.app_protocols.len(), "No supported app protocol offered");
            SupportedAppProtocolResponse {
                response_code: SapResponseCode::FailedNoNegotiation,
                schema_id: None,
            }
        }
    };
    ctx.respond(res);
}

fn handle_session_setup(ctx: &mut Context<'_>, req: &SessionSetupRequest) {
    ctx.feedback(Feedback::EvccId(req.evcc_id.clone()));
    ctx.session.evcc_id = Some(req.evcc_id.clone());

    let requested = req.header.session_id;
    let (id, response_code) = match ctx.previous_session_id {
        Some(previous) if !previous.is_zero() && previous == requested => {
            (previous, ResponseCode::OkOldSessionJoined)
        }
        _ => (SessionId::random(), ResponseCode::OkNewSessionEstablished),
    };

    ctx.session.establish(id);
    info!(session_id = %id, evcc_id = %req.evcc_id, %response_code, "Session set up");

    let res = SessionSetupResponse {
        header: ctx.header(),
        response_code,
        evse_id: ctx.config.evse_id.clone(),
    };
    ctx.respond(res);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::testing::Harness;
    use crate::states::StateId;
    use v2g_proto::{Header, MessageType, ServiceCategory};

    fn protocol(namespace: &str, priority: u8, schema_id: u8) -> AppProtocol {
        AppProtocol {
            protocol_namespace: namespace.to_string(),
            version_major: 1,
            version_minor: 0,
            schema_id,
            priority,
        }
    }

    #[test]
    fn test_new_session() {
        let mut harness = Harness::default();
        let req = SessionSetupRequest {
            header: Header::default(),
            evcc_id: "WMIV1234567890ABCDEX".into(),
        };

        let (next, res) = harness.run(|ctx| SessionSetup.handle(ctx, Message::from(req).into()));
        assert_eq!(next.map(|s| s.id()), Some(StateId::AuthorizationSetup));

        let res = res.unwrap();
        let res = res.expect::<SessionSetupResponse>();
        assert_eq!(res.response_code, ResponseCode::OkNewSessionEstablished);
        assert_eq!(res.evse_id, harness.config.evse_id);
        assert!(!res.header.session_id.is_zero());
        assert_eq!(res.header.session_id, harness.session.id());
        assert_eq!(harness.session.evcc_id.as_deref(), Some("WMIV1234567890ABCDEX"));
    }

    #[test]
    fn test_resume_previous_session() {
        let previous = SessionId::new([0x11; 8]);
        let mut harness = Harness {
            previous_session_id: Some(previous),
            ..Harness::default()
        };
        let req = SessionSetupRequest {
            header: Header {
                session_id: previous,
                timestamp: 0,
            },
            evcc_id: "EV".into(),
        };

        let (_, res) = harness.run(|ctx| SessionSetup.handle(ctx, Message::from(req).into()));
        let res = res.unwrap();
        assert_eq!(
            res.expect::<SessionSetupResponse>().response_code,
            ResponseCode::OkOldSessionJoined
        );
        assert_eq!(harness.session.id(), previous);
    }

    #[test]
    fn test_unknown_previous_id_gets_new_session() {
        let mut harness = Harness {
            previous_session_id: Some(SessionId::new([0x11; 8])),
            ..Harness::default()
        };
        let req = SessionSetupRequest {
            header: Header {
                session_id: SessionId::new([0x22; 8]),
                timestamp: 0,
            },
            evcc_id: "EV".into(),
        };

        let (_, res) = harness.run(|ctx| SessionSetup.handle(ctx, Message::from(req).into()));
        let res = res.unwrap();
        let res = res.expect::<SessionSetupResponse>();
        assert_eq!(res.response_code, ResponseCode::OkNewSessionEstablished);
        assert_ne!(res.header.session_id, SessionId::new([0x22; 8]));
    }

    #[test]
    fn test_app_handshake_picks_highest_priority() {
        let mut config = SessionConfig::default();
        config.supported_energy_services = vec![ServiceCategory::Dc, ServiceCategory::Ac];
        let mut harness = Harness::default().with_config(config);

        let req = SupportedAppProtocolRequest {
            app_protocols: vec![
                protocol("urn:iso:15118:2:2013:MsgDef", 1, 1),
                protocol(ISO20_AC_NAMESPACE, 3, 2),
                protocol(ISO20_DC_NAMESPACE, 2, 3),
            ],
        };

        let (next, res) = harness.run(|ctx| SessionSetup.handle(ctx, Message::from(req).into()));
        assert!(next.is_none());

        let res = res.unwrap();
        let res = res.expect::<SupportedAppProtocolResponse>();
        assert_eq!(res.response_code, SapResponseCode::SuccessfulNegotiation);
        assert_eq!(res.schema_id, Some(3));
        assert_eq!(
            harness.feedback,
            vec![Feedback::SelectedProtocol(ISO20_DC_NAMESPACE.to_string())]
        );
    }

    #[test]
    fn test_app_handshake_without_match() {
        // DC only, EV offers AC only
        let mut harness = Harness::default();
        let req = SupportedAppProtocolRequest {
            app_protocols: vec![protocol(ISO20_AC_NAMESPACE, 1, 1)],
        };

        let (_, res) = harness.run(|ctx| SessionSetup.handle(ctx, Message::from(req).into()));
        let res = res.unwrap();
        assert!(res.is_failure());
        assert_eq!(res.expect::<SupportedAppProtocolResponse>().schema_id, None);
    }

    #[test]
    fn test_other_request_is_sequence_error() {
        let mut harness = Harness::default();
        let message = Message::default_of(MessageType::ServiceDiscoveryRequest);

        let (next, res) = harness.run(|ctx| SessionSetup.handle(ctx, message.into()));
        assert!(next.is_none());
        assert_eq!(
            res.unwrap().response_code(),
            Some(ResponseCode::FailedSequenceError)
        );
    }
}
