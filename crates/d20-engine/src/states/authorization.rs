//! Authorization: wait for the host's decision on EIM or PnC

use tracing::{info, warn};
use v2g_proto::{
    Authorization as AuthorizationService, AuthorizationRequest, AuthorizationResponse, Message,
    MessageType, Processing, ResponseCode,
};

use super::{request_of, Event, Handler, ServiceDiscovery, State};
use crate::context::Context;
use crate::control::AuthorizationStatus;
use crate::feedback::Signal;
use crate::timeout::OngoingWait;

#[derive(Debug, Default)]
pub struct Authorization {
    wait: OngoingWait,
}

impl Handler for Authorization {
    fn handle(&mut self, ctx: &mut Context<'_>, event: Event) -> Option<State> {
        match request_of(event, |kind| self.wait.on_timeout(kind))? {
            Message::AuthorizationRequest(req) => self.handle_request(ctx, &req),
            other => {
                ctx.sequence_error(other.message_type());
                None
            }
        }
    }
}

impl Authorization {
    fn respond(ctx: &mut Context<'_>, response_code: ResponseCode, evse_processing: Processing) {
        let res = AuthorizationResponse {
            header: ctx.header(),
            response_code,
            evse_processing,
        };
        ctx.respond(res);
    }

    fn handle_request(&mut self, ctx: &mut Context<'_>, req: &AuthorizationRequest) -> Option<State> {
        if !ctx.is_known_session(&req.header) {
            ctx.respond_failure(MessageType::AuthorizationRequest, ResponseCode::FailedUnknownSession);
            return None;
        }

        if self.wait.take_expired() {
            warn!("Authorization not granted in time");
            Self::respond(ctx, ResponseCode::Failed, Processing::Finished);
            return None;
        }

        let selected = req.selected_authorization_service;
        if !ctx.session.offered_services.auth_services.contains(&selected) {
            warn!(%selected, "Authorization service was not offered");
            Self::respond(ctx, ResponseCode::WarningAuthorizationSelectionInvalid, Processing::Finished);
            return None;
        }

        if selected == AuthorizationService::Pnc {
            let challenge_ok = match (&req.pnc_params, &ctx.session.gen_challenge) {
                (Some(params), Some(challenge)) => &params.gen_challenge == challenge,
                _ => false,
            };
            if !challenge_ok {
                warn!("PnC challenge mismatch");
                Self::respond(ctx, ResponseCode::WarningChallengeInvalid, Processing::Finished);
                return None;
            }
        }
        ctx.session.selected_authorization = Some(selected);

        match ctx.poll_control_event::<AuthorizationStatus>() {
            Some(AuthorizationStatus::Accepted) => {
                info!(%selected, "Authorization accepted");
                self.wait.finish(ctx);
                Self::respond(ctx, ResponseCode::Ok, Processing::Finished);
                Some(ServiceDiscovery.into())
            }
            Some(AuthorizationStatus::Rejected) => {
                info!(%selected, "Authorization rejected");
                self.wait.finish(ctx);
                let code = match selected {
                    AuthorizationService::Eim => ResponseCode::WarningEimAuthorizationFailure,
                    AuthorizationService::Pnc => ResponseCode::WarningGeneralPncAuthorizationError,
                };
                Self::respond(ctx, code, Processing::Finished);
                None
            }
            Some(AuthorizationStatus::Pending) | None => {
                if !self.wait.is_waiting() && selected == AuthorizationService::Eim {
                    ctx.signal(Signal::RequireAuthEim);
                }
                self.wait.wait(ctx);
                Self::respond(ctx, ResponseCode::Ok, Processing::Ongoing);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::testing::Harness;
    use crate::states::StateId;
    use crate::timeout::TimeoutKind;
    use v2g_proto::PncAuthorization;

    fn harness() -> Harness {
        let mut harness = Harness::established();
        harness.session.offered_services.auth_services = vec![AuthorizationService::Eim];
        harness
    }

    fn eim_request(harness: &Harness) -> Event {
        Message::from(AuthorizationRequest {
            header: harness.header(),
            selected_authorization_service: AuthorizationService::Eim,
            pnc_params: None,
        })
        .into()
    }

    fn processing(res: &Option<Message>) -> (ResponseCode, Processing) {
        let res = res.as_ref().unwrap().expect::<AuthorizationResponse>();
        (res.response_code, res.evse_processing)
    }

    #[test]
    fn test_pending_pending_accepted() {
        let mut harness = harness();
        let mut state = Authorization::default();

        harness.control(AuthorizationStatus::Pending);
        let event = eim_request(&harness);
        let (next, res) = harness.run(|ctx| state.handle(ctx, event));
        assert!(next.is_none());
        assert_eq!(processing(&res), (ResponseCode::Ok, Processing::Ongoing));
        assert!(harness.timeouts.is_armed(TimeoutKind::Ongoing));

        let event = eim_request(&harness);
        let (next, res) = harness.run(|ctx| state.handle(ctx, event));
        assert!(next.is_none());
        assert_eq!(processing(&res), (ResponseCode::Ok, Processing::Ongoing));

        harness.control(AuthorizationStatus::Accepted);
        let event = eim_request(&harness);
        let (next, res) = harness.run(|ctx| state.handle(ctx, event));
        assert_eq!(next.map(|s| s.id()), Some(StateId::ServiceDiscovery));
        assert_eq!(processing(&res), (ResponseCode::Ok, Processing::Finished));
        assert!(!harness.timeouts.is_armed(TimeoutKind::Ongoing));

        // Identification is requested once, not on every poll
        assert_eq!(harness.signals(), vec![Signal::RequireAuthEim]);
        assert_eq!(
            harness.session.selected_authorization,
            Some(AuthorizationService::Eim)
        );
    }

    #[test]
    fn test_no_decision_yet_is_ongoing() {
        let mut harness = harness();
        let event = eim_request(&harness);
        let (_, res) = harness.run(|ctx| Authorization::default().handle(ctx, event));
        assert_eq!(processing(&res), (ResponseCode::Ok, Processing::Ongoing));
    }

    #[test]
    fn test_rejected_stays() {
        let mut harness = harness();
        harness.control(AuthorizationStatus::Rejected);
        let event = eim_request(&harness);

        let (next, res) = harness.run(|ctx| Authorization::default().handle(ctx, event));
        assert!(next.is_none());
        assert_eq!(
            processing(&res),
            (ResponseCode::WarningEimAuthorizationFailure, Processing::Finished)
        );
    }

    #[test]
    fn test_selection_not_offered() {
        let mut harness = harness();
        harness.control(AuthorizationStatus::Accepted);
        let event: Event = Message::from(AuthorizationRequest {
            header: harness.header(),
            selected_authorization_service: AuthorizationService::Pnc,
            pnc_params: None,
        })
        .into();

        let (next, res) = harness.run(|ctx| Authorization::default().handle(ctx, event));
        assert!(next.is_none());
        assert_eq!(
            processing(&res),
            (ResponseCode::WarningAuthorizationSelectionInvalid, Processing::Finished)
        );
    }

    #[test]
    fn test_pnc_challenge() {
        let mut harness = harness();
        harness.session.offered_services.auth_services = vec![AuthorizationService::Pnc];
        harness.session.gen_challenge = Some(vec![7; 16]);
        harness.control(AuthorizationStatus::Accepted);

        let request = |challenge: Vec<u8>, harness: &Harness| -> Event {
            Message::from(AuthorizationRequest {
                header: harness.header(),
                selected_authorization_service: AuthorizationService::Pnc,
                pnc_params: Some(PncAuthorization {
                    id: "id1".into(),
                    gen_challenge: challenge,
                    contract_id: "DE8AA001234567".into(),
                }),
            })
            .into()
        };

        let event = request(vec![8; 16], &harness);
        let (_, res) = harness.run(|ctx| Authorization::default().handle(ctx, event));
        assert_eq!(processing(&res).0, ResponseCode::WarningChallengeInvalid);

        let event = request(vec![7; 16], &harness);
        let (next, res) = harness.run(|ctx| Authorization::default().handle(ctx, event));
        assert_eq!(processing(&res), (ResponseCode::Ok, Processing::Finished));
        assert_eq!(next.map(|s| s.id()), Some(StateId::ServiceDiscovery));
    }

    #[test]
    fn test_ongoing_expiry_fails_next_request() {
        let mut harness = harness();
        let mut state = Authorization::default();

        let event = eim_request(&harness);
        harness.run(|ctx| state.handle(ctx, event));

        let (next, res) = harness.run(|ctx| state.handle(ctx, Event::Timeout(TimeoutKind::Ongoing)));
        assert!(next.is_none());
        assert!(res.is_none());

        let event = eim_request(&harness);
        let (_, res) = harness.run(|ctx| state.handle(ctx, event));
        assert_eq!(processing(&res), (ResponseCode::Failed, Processing::Finished));
    }
}
