//! Control events from the host
//!
//! The authorization backend and the power module report progress through
//! [`ControlEvent`]s. The engine keeps the latest value of each kind and
//! states poll them with [`Context::poll_control_event`](crate::Context::poll_control_event).

use serde::{Deserialize, Serialize};

/// Outcome of the external authorization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthorizationStatus {
    Pending,
    Accepted,
    Rejected,
}

/// Isolation monitoring result; `true` means the cable is safe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CableCheckFinished(pub bool);

/// Present output of the power module
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PresentVoltageCurrent {
    pub voltage: f32,
    pub current: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactorsClosed(pub bool);

/// Host asks to end the charging session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopCharging(pub bool);

/// Host asks to pause the charging session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PauseCharging(pub bool);

/// Value kept in the [`ControlEventStore`]
pub trait ControlValue: Copy {
    fn latest(store: &ControlEventStore) -> Option<Self>;
}

macro_rules! control_events {
    ($( $variant:ident ($ty:ident) => $slot:ident ),* $(,)?) => {
        #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
        pub enum ControlEvent {
            $( $variant($ty), )*
        }

        /// Latest value of each control event kind
        #[derive(Debug, Clone, Default)]
        pub struct ControlEventStore {
            $( $slot: Option<$ty>, )*
        }

        impl ControlEventStore {
            pub fn set(&mut self, event: ControlEvent) {
                match event {
                    $( ControlEvent::$variant(value) => self.$slot = Some(value), )*
                }
            }
        }

        $(
            impl ControlValue for $ty {
                fn latest(store: &ControlEventStore) -> Option<Self> {
                    store.$slot
                }
            }

            impl From<$ty> for ControlEvent {
                fn from(value: $ty) -> Self {
                    ControlEvent::$variant(value)
                }
            }
        )*
    };
}

control_events! {
    AuthorizationResponse(AuthorizationStatus) => authorization,
    CableCheckFinished(CableCheckFinished) => cable_check,
    PresentVoltageCurrent(PresentVoltageCurrent) => present_voltage_current,
    ContactorsClosed(ContactorsClosed) => contactors,
    StopCharging(StopCharging) => stop_charging,
    PauseCharging(PauseCharging) => pause_charging,
}

impl ControlEventStore {
    pub fn get<T: ControlValue>(&self) -> Option<T> {
        T::latest(self)
    }
}
