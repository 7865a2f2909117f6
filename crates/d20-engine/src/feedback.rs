//! Notifications from the engine to the host
//!
//! Collected while an event is handled and drained by the I/O layer with
//! [`Engine::drain_feedback`](crate::Engine::drain_feedback).

use v2g_proto::ResponseCode;

/// Edge-triggered notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    /// External identification (RFID, app, ...) is needed
    RequireAuthEim,
    StartCableCheck,
    PreChargeStarted,
    CloseContactor,
    ChargeLoopStarted,
    ChargeLoopFinished,
    OpenContactor,
    /// Service negotiation is done
    SetupFinished,
    /// Session ended, the data link may be closed
    DlinkTerminate,
    /// Session paused, the data link may go to sleep
    DlinkPause,
    /// Session aborted on a protocol error or timeout
    DlinkError,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Feedback {
    Signal(Signal),
    /// Namespace chosen in the SupportedAppProtocol handshake
    SelectedProtocol(String),
    EvccId(String),
    DcPreChargeTargetVoltage(f32),
    DcChargeLoopTarget { voltage: f32, current: f32 },
    /// AC target power requested by the EV (W)
    AcChargeLoopTarget { power: f32 },
    /// Code of every response sent
    ResponseCode(ResponseCode),
}

impl From<Signal> for Feedback {
    fn from(signal: Signal) -> Self {
        Feedback::Signal(signal)
    }
}

impl std::fmt::Display for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}
