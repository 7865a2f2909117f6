//! The boundary between a state and the rest of the world
//!
//! A state sees the session, the configuration and the latest control events
//! through [`Context`], and acts only by responding, arming timers and
//! emitting feedback.

use std::time::Duration;

use tracing::{debug, warn};
use v2g_proto::{Header, Message, MessageType, ResponseCode, SessionId};

use crate::config::SessionConfig;
use crate::control::{ControlEventStore, ControlValue};
use crate::feedback::{Feedback, Signal};
use crate::policy;
use crate::session::Session;
use crate::timeout::{TimeoutKind, Timeouts};

pub struct Context<'a> {
    pub session: &'a mut Session,
    pub config: &'a SessionConfig,
    /// Id of an earlier session the host allows the EV to resume
    pub previous_session_id: Option<SessionId>,
    timeouts: &'a mut Timeouts,
    controls: &'a ControlEventStore,
    feedback: &'a mut Vec<Feedback>,
    response: Option<Message>,
}

impl<'a> Context<'a> {
    pub(crate) fn new(
        session: &'a mut Session,
        config: &'a SessionConfig,
        previous_session_id: Option<SessionId>,
        timeouts: &'a mut Timeouts,
        controls: &'a ControlEventStore,
        feedback: &'a mut Vec<Feedback>,
    ) -> Self {
        Self {
            session,
            config,
            previous_session_id,
            timeouts,
            controls,
            feedback,
            response: None,
        }
    }

    /// Queue the response to the current request
    pub fn respond(&mut self, message: impl Into<Message>) {
        let message = message.into();
        if let Some(previous) = &self.response {
            warn!(
                previous = %previous.message_type(),
                next = %message.message_type(),
                "Response replaced before it was sent"
            );
        }
        self.response = Some(message);
    }

    /// Answer `request` with a mandatory-fields-only response carrying `code`
    pub fn respond_failure(&mut self, request: MessageType, code: ResponseCode) {
        debug!(%request, %code, "Failing request");
        if let Some(response) = policy::failure_response(request, code, self.header()) {
            self.respond(response);
        }
    }

    /// Answer a request the current state does not accept
    pub fn sequence_error(&mut self, request: MessageType) {
        warn!(%request, "Sequence error");
        self.respond_failure(request, ResponseCode::FailedSequenceError);
    }

    pub fn start_timeout(&mut self, kind: TimeoutKind, duration: Duration) {
        debug!(?kind, ?duration, "Timeout armed");
        self.timeouts.start(kind, duration);
    }

    pub fn stop_timeout(&mut self, kind: TimeoutKind) {
        self.timeouts.stop(kind);
    }

    /// Latest value of a control event kind, if the host reported one
    pub fn poll_control_event<T: ControlValue>(&self) -> Option<T> {
        self.controls.get::<T>()
    }

    pub fn feedback(&mut self, feedback: impl Into<Feedback>) {
        self.feedback.push(feedback.into());
    }

    pub fn signal(&mut self, signal: Signal) {
        debug!(%signal, "Signal");
        self.feedback(signal);
    }

    /// Response header for this session
    pub fn header(&self) -> Header {
        self.session.header()
    }

    /// Whether a request header belongs to this session
    pub fn is_known_session(&self, header: &Header) -> bool {
        self.session.matches(header)
    }

    pub(crate) fn take_response(&mut self) -> Option<Message> {
        self.response.take()
    }
}
