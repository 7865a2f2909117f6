use rand::RngCore;
use tracing::debug;
use v2g_proto::{
    Authorization as AuthorizationService, AuthorizationModeOffer, AuthorizationSetupRequest,
    AuthorizationSetupResponse, Message, MessageType, ResponseCode,
};

use super::{request_of, Authorization, Event, Handler, State};
use crate::context::Context;

/// Length of the PnC challenge in bytes
pub const GEN_CHALLENGE_LENGTH: usize = 16;

#[derive(Debug, Default)]
pub struct AuthorizationSetup;

impl Handler for AuthorizationSetup {
    fn handle(&mut self, ctx: &mut Context<'_>, event: Event) -> Option<State> {
        match request_of(event, |_| {})? {
            Message::AuthorizationSetupRequest(req) => handle_request(ctx, &req),
            other => {
                ctx.sequence_error(other.message_type());
                None
            }
        }
    }
}

fn handle_request(ctx: &mut Context<'_>, req: &AuthorizationSetupRequest) -> Option<State> {
    if !ctx.is_known_session(&req.header) {
        ctx.respond_failure(MessageType::AuthorizationSetupRequest, ResponseCode::FailedUnknownSession);
        return None;
    }

    let services = ctx.config.authorization_services.clone();
    let authorization_mode = if services.contains(&AuthorizationService::Pnc) {
        let mut challenge = vec![0u8; GEN_CHALLENGE_LENGTH];
        rand::thread_rng().fill_bytes(&mut challenge);
        ctx.session.gen_challenge = Some(challenge.clone());
        AuthorizationModeOffer::Pnc {
            gen_challenge: challenge,
            supported_providers: None,
        }
    } else {
        AuthorizationModeOffer::Eim
    };

    debug!(?services, "Offering authorization services");
    ctx.session.offered_services.auth_services = services.clone();

    let res = AuthorizationSetupResponse {
        header: ctx.header(),
        response_code: ResponseCode::Ok,
        authorization_services: services,
        certificate_installation_service: ctx.config.certificate_installation_service,
        authorization_mode,
    };
    ctx.respond(res);

    Some(Authorization::default().into())
}
