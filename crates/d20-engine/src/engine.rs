//! Session driver
//!
//! [`Engine`] owns one session and its current state. It is sans-IO: the
//! caller feeds [`Event`]s (or raw payloads) and gets the response to send,
//! if any. Rules that hold in every state live here:
//!
//! - requests disarm the Sequence timer, responses re-arm it
//! - the first SessionSetupReq disarms the Performance timer
//! - SessionStopReq is accepted in any state
//! - a `FAILED*` response, a Performance/Sequence expiry, an undecodable
//!   payload or a response type sent by the EV end the session

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};
use v2g_proto::{envelope, ExiCodec, Message, MessageType, PayloadType, SessionId};

use crate::config::SessionConfig;
use crate::context::Context;
use crate::control::ControlEventStore;
use crate::error::{EngineError, EngineResult};
use crate::feedback::{Feedback, Signal};
use crate::session::Session;
use crate::states::{session_stop, Event, State, StateId};
use crate::timeout::{TimeoutKind, Timeouts};

pub struct Engine {
    config: Arc<SessionConfig>,
    codec: Arc<dyn ExiCodec>,
    session: Session,
    state: State,
    previous_session_id: Option<SessionId>,
    timeouts: Timeouts,
    controls: ControlEventStore,
    feedback: Vec<Feedback>,
}

impl Engine {
    /// Start a session; the Performance timer runs from here
    pub fn new(config: Arc<SessionConfig>, codec: Arc<dyn ExiCodec>) -> Self {
        let mut timeouts = Timeouts::default();
        timeouts.start(TimeoutKind::Performance, config.timeouts.performance());

        let mut engine = Self {
            config,
            codec,
            session: Session::new(),
            state: State::initial(),
            previous_session_id: None,
            timeouts,
            controls: ControlEventStore::default(),
            feedback: Vec::new(),
        };

        let mut ctx = Context::new(
            &mut engine.session,
            &engine.config,
            engine.previous_session_id,
            &mut engine.timeouts,
            &engine.controls,
            &mut engine.feedback,
        );
        engine.state.enter(&mut ctx);
        debug!(state = %engine.state.id(), "Session started");

        engine
    }

    /// Allow the EV to resume the session with this id
    pub fn with_previous_session(mut self, id: SessionId) -> Self {
        self.previous_session_id = Some(id);
        self
    }

    pub fn is_terminated(&self) -> bool {
        self.session.terminated
    }

    pub fn current_state(&self) -> StateId {
        self.state.id()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Nearest armed timer; the driver sends `Event::Timeout` once it passes
    pub fn next_deadline(&self) -> Option<(TimeoutKind, Instant)> {
        self.timeouts.next()
    }

    /// Notifications collected since the last call
    pub fn drain_feedback(&mut self) -> Vec<Feedback> {
        std::mem::take(&mut self.feedback)
    }

    /// Decode a V2GTP payload, handle it and return the framed response
    pub fn handle_payload(
        &mut self,
        payload_type: PayloadType,
        payload: &[u8],
    ) -> EngineResult<Option<Vec<u8>>> {
        if self.session.terminated {
            return Err(EngineError::Terminated);
        }

        let message = match envelope::decode_payload(self.codec.as_ref(), payload_type, payload) {
            Ok(message) => message,
            Err(e) => {
                warn!(error = %e, ?payload_type, "Undecodable payload, ending session");
                self.terminate(Signal::DlinkError);
                return Err(e.into());
            }
        };
        self.handle_framed(Event::IncomingMessage(message))
    }

    /// [`handle`](Self::handle) with the response framed for the wire
    pub fn handle_framed(&mut self, event: Event) -> EngineResult<Option<Vec<u8>>> {
        match self.handle(event) {
            Some(response) => Ok(Some(envelope::frame(self.codec.as_ref(), response)?)),
            None => Ok(None),
        }
    }

    /// Handle one event, returning the response to send
    pub fn handle(&mut self, event: Event) -> Option<Message> {
        if self.session.terminated {
            warn!(?event, "Event after session end ignored");
            return None;
        }

        match &event {
            Event::Control(control) => {
                debug!(?control, "Control event");
                self.controls.set(*control);
            }
            Event::Timeout(kind) => {
                if !self.timeouts.is_armed(*kind) {
                    debug!(?kind, "Stale timeout ignored");
                    return None;
                }
                self.timeouts.stop(*kind);
                if *kind != TimeoutKind::Ongoing {
                    warn!(?kind, state = %self.state.id(), "Timeout, ending session");
                    self.terminate(Signal::DlinkError);
                    return None;
                }
            }
            Event::IncomingMessage(message) => {
                let ty = message.message_type();
                if !ty.is_request() {
                    warn!(message = %ty, "EV sent a response message, ending session");
                    self.terminate(Signal::DlinkError);
                    return None;
                }
                debug!(request = %ty, state = %self.state.id(), "Request");

                self.timeouts.stop(TimeoutKind::Sequence);
                if ty == MessageType::SessionSetupRequest {
                    self.timeouts.stop(TimeoutKind::Performance);
                }
            }
        }

        let mut ctx = Context::new(
            &mut self.session,
            &self.config,
            self.previous_session_id,
            &mut self.timeouts,
            &self.controls,
            &mut self.feedback,
        );

        let next = match event {
            Event::IncomingMessage(Message::SessionStopRequest(req)) => {
                session_stop::handle_request(&mut ctx, &req);
                None
            }
            event => self.state.handle(&mut ctx, event),
        };

        if let Some(next) = next {
            info!(from = %self.state.id(), to = %next.id(), "State transition");
            self.state = next;
            self.state.enter(&mut ctx);
        }

        let response = ctx.take_response();
        if let Some(response) = &response {
            self.after_response(response);
        }
        response
    }

    fn after_response(&mut self, response: &Message) {
        if let Some(code) = response.response_code() {
            self.feedback.push(Feedback::ResponseCode(code));
        }

        if response.is_failure() {
            warn!(
                response = %response.message_type(),
                code = ?response.response_code(),
                "Failure response, ending session"
            );
            self.terminate(Signal::DlinkError);
        } else if self.session.terminated {
            self.timeouts.clear();
        } else {
            self.timeouts
                .start(TimeoutKind::Sequence, self.config.timeouts.sequence());
        }
    }

    fn terminate(&mut self, signal: Signal) {
        self.session.terminated = true;
        self.timeouts.clear();
        self.feedback.push(Feedback::Signal(signal));
        info!(state = %self.state.id(), %signal, "Session terminated");
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("state", &self.state.id())
            .field("session", &self.session)
            .field("terminated", &self.session.terminated)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::AuthorizationStatus;
    use v2g_proto::{Header, JsonCodec, SessionSetupRequest, SessionSetupResponse};

    fn engine() -> Engine {
        Engine::new(Arc::new(SessionConfig::default()), Arc::new(JsonCodec))
    }

    fn session_setup() -> Event {
        Message::from(SessionSetupRequest {
            header: Header::default(),
            evcc_id: "EV".into(),
        })
        .into()
    }

    #[test]
    fn test_performance_timer_armed_at_start() {
        let engine = engine();
        assert_eq!(
            engine.next_deadline().map(|(kind, _)| kind),
            Some(TimeoutKind::Performance)
        );
        assert_eq!(engine.current_state(), StateId::SessionSetup);
    }

    #[test]
    fn test_session_setup_swaps_timers() {
        let mut engine = engine();
        let res = engine.handle(session_setup()).unwrap();
        assert_eq!(res.message_type(), MessageType::SessionSetupResponse);
        assert_eq!(engine.current_state(), StateId::AuthorizationSetup);
        assert_eq!(
            engine.next_deadline().map(|(kind, _)| kind),
            Some(TimeoutKind::Sequence)
        );
        assert!(engine
            .drain_feedback()
            .contains(&Feedback::ResponseCode(v2g_proto::ResponseCode::OkNewSessionEstablished)));
    }

    #[test]
    fn test_sequence_timeout_terminates() {
        let mut engine = engine();
        engine.handle(session_setup());
        engine.drain_feedback();

        assert!(engine.handle(Event::Timeout(TimeoutKind::Sequence)).is_none());
        assert!(engine.is_terminated());
        assert_eq!(engine.next_deadline(), None);
        assert_eq!(engine.drain_feedback(), vec![Feedback::Signal(Signal::DlinkError)]);
    }

    #[test]
    fn test_stale_timeout_ignored() {
        let mut engine = engine();
        engine.handle(session_setup());

        // Performance was disarmed by SessionSetupReq
        engine.handle(Event::Timeout(TimeoutKind::Performance));
        assert!(!engine.is_terminated());
    }

    #[test]
    fn test_response_from_ev_terminates() {
        let mut engine = engine();
        let event: Event = Message::from(SessionSetupResponse::default()).into();
        assert!(engine.handle(event).is_none());
        assert!(engine.is_terminated());
    }

    #[test]
    fn test_events_after_termination_ignored() {
        let mut engine = engine();
        engine.handle(Event::Timeout(TimeoutKind::Performance));
        assert!(engine.is_terminated());

        assert!(engine.handle(session_setup()).is_none());
        assert_eq!(engine.current_state(), StateId::SessionSetup);
        assert_eq!(
            engine.handle_payload(PayloadType::Part20Main, b"{}"),
            Err(EngineError::Terminated)
        );
    }

    #[test]
    fn test_decode_error_terminates() {
        let mut engine = engine();
        let err = engine.handle_payload(PayloadType::Part20Main, b"not json").unwrap_err();
        assert!(matches!(err, EngineError::Decode(_)));
        assert!(engine.is_terminated());
        assert_eq!(engine.drain_feedback(), vec![Feedback::Signal(Signal::DlinkError)]);
    }

    #[test]
    fn test_control_events_are_stored() {
        let mut engine = engine();
        assert!(engine
            .handle(crate::control::ControlEvent::from(AuthorizationStatus::Accepted).into())
            .is_none());
        assert_eq!(engine.controls.get::<AuthorizationStatus>(), Some(AuthorizationStatus::Accepted));
    }

    #[test]
    fn test_sequence_error_terminates() {
        let mut engine = engine();
        let res = engine
            .handle(Message::default_of(MessageType::PowerDeliveryRequest).into())
            .unwrap();
        assert_eq!(res.response_code(), Some(v2g_proto::ResponseCode::FailedSequenceError));
        assert!(engine.is_terminated());
    }
}
