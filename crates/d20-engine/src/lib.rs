//! EVSE-side ISO 15118-20 session engine
//!
//! One [`Engine`] per connection. It consumes decoded messages, control
//! events from the host and timer expiries, drives the session through its
//! [`states`] and returns the response to send. No I/O happens here; the
//! daemon owns the socket and the clock.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use d20_engine::{Engine, SessionConfig, StateId};
//! use v2g_proto::{JsonCodec, Message, ResponseCode, SessionSetupRequest};
//!
//! let mut engine = Engine::new(Arc::new(SessionConfig::default()), Arc::new(JsonCodec));
//! let request = SessionSetupRequest {
//!     evcc_id: "WMIV1234567890ABCDEX".into(),
//!     ..Default::default()
//! };
//!
//! let response = engine.handle(Message::from(request).into()).unwrap();
//! assert_eq!(response.response_code(), Some(ResponseCode::OkNewSessionEstablished));
//! assert_eq!(engine.current_state(), StateId::AuthorizationSetup);
//! ```

pub mod config;
pub mod context;
pub mod control;
pub mod engine;
pub mod error;
pub mod feedback;
pub mod policy;
pub mod session;
pub mod states;
pub mod timeout;

pub use config::{SessionConfig, TimeoutConfig};
pub use context::Context;
pub use control::{
    AuthorizationStatus, CableCheckFinished, ContactorsClosed, ControlEvent, PauseCharging,
    PresentVoltageCurrent, StopCharging,
};
pub use engine::Engine;
pub use error::{EngineError, EngineResult};
pub use feedback::{Feedback, Signal};
pub use session::Session;
pub use states::{Event, StateId};
pub use timeout::TimeoutKind;
