//! Session states
//!
//! Each state is a small struct holding only what it needs between two
//! requests of its own (usually an [`OngoingWait`](crate::timeout::OngoingWait)).
//! [`Handler::handle`] consumes an event, responds through the
//! [`Context`] and returns the next state, if any.

use v2g_proto::Message;

use crate::context::Context;
use crate::control::ControlEvent;
use crate::timeout::TimeoutKind;

pub mod ac_charge_loop;
pub mod ac_charge_parameter_discovery;
pub mod authorization;
pub mod authorization_setup;
pub mod dc_cable_check;
pub mod dc_charge_loop;
pub mod dc_charge_parameter_discovery;
pub mod dc_pre_charge;
pub mod dc_welding_detection;
pub mod power_delivery;
pub mod schedule_exchange;
pub mod service_detail;
pub mod service_discovery;
pub mod service_selection;
pub mod session_setup;
pub mod session_stop;

pub use ac_charge_loop::AcChargeLoop;
pub use ac_charge_parameter_discovery::AcChargeParameterDiscovery;
pub use authorization::Authorization;
pub use authorization_setup::AuthorizationSetup;
pub use dc_cable_check::DcCableCheck;
pub use dc_charge_loop::DcChargeLoop;
pub use dc_charge_parameter_discovery::DcChargeParameterDiscovery;
pub use dc_pre_charge::DcPreCharge;
pub use dc_welding_detection::DcWeldingDetection;
pub use power_delivery::PowerDelivery;
pub use schedule_exchange::ScheduleExchange;
pub use service_detail::ServiceDetail;
pub use service_discovery::ServiceDiscovery;
pub use service_selection::ServiceSelection;
pub use session_setup::SessionSetup;
pub use session_stop::SessionStop;

/// Input to the engine
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    IncomingMessage(Message),
    Control(ControlEvent),
    Timeout(TimeoutKind),
}

impl From<Message> for Event {
    fn from(message: Message) -> Self {
        Event::IncomingMessage(message)
    }
}

impl From<ControlEvent> for Event {
    fn from(event: ControlEvent) -> Self {
        Event::Control(event)
    }
}

/// Behaviour of one state
pub trait Handler {
    /// Called once when the state becomes current
    fn enter(&mut self, _ctx: &mut Context<'_>) {}

    fn handle(&mut self, ctx: &mut Context<'_>, event: Event) -> Option<State>;
}

macro_rules! states {
    ($( $variant:ident ),* $(,)?) => {
        #[derive(Debug)]
        pub enum State {
            $( $variant($variant), )*
        }

        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum StateId {
            $( $variant, )*
        }

        impl State {
            pub fn id(&self) -> StateId {
                match self {
                    $( Self::$variant(_) => StateId::$variant, )*
                }
            }

            pub(crate) fn enter(&mut self, ctx: &mut Context<'_>) {
                match self {
                    $( Self::$variant(state) => state.enter(ctx), )*
                }
            }

            pub(crate) fn handle(&mut self, ctx: &mut Context<'_>, event: Event) -> Option<State> {
                match self {
                    $( Self::$variant(state) => state.handle(ctx, event), )*
                }
            }
        }

        impl StateId {
            pub fn name(self) -> &'static str {
                match self {
                    $( Self::$variant => stringify!($variant), )*
                }
            }
        }

        $(
            impl From<$variant> for State {
                fn from(state: $variant) -> Self {
                    State::$variant(state)
                }
            }
        )*
    };
}

states! {
    SessionSetup,
    AuthorizationSetup,
    Authorization,
    ServiceDiscovery,
    ServiceDetail,
    ServiceSelection,
    DcChargeParameterDiscovery,
    AcChargeParameterDiscovery,
    ScheduleExchange,
    DcCableCheck,
    DcPreCharge,
    PowerDelivery,
    DcChargeLoop,
    AcChargeLoop,
    DcWeldingDetection,
    SessionStop,
}

impl State {
    pub fn initial() -> Self {
        State::SessionSetup(SessionSetup)
    }
}

impl std::fmt::Display for StateId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Split an event into the inbound request, routing timeouts to `on_timeout`
///
/// Control events carry no request; states read them with
/// [`Context::poll_control_event`].
pub(crate) fn request_of(event: Event, on_timeout: impl FnOnce(TimeoutKind)) -> Option<Message> {
    match event {
        Event::IncomingMessage(message) => Some(message),
        Event::Timeout(kind) => {
            on_timeout(kind);
            None
        }
        Event::Control(_) => None,
    }
}
