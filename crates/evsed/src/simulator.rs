//! Simulated charger hardware
//!
//! Stands in for the authorization backend and the power module: every
//! signal the engine raises is answered with the control event real
//! hardware would send, after a configurable delay.

use std::time::Duration;

use d20_engine::{
    AuthorizationStatus, CableCheckFinished, ContactorsClosed, ControlEvent, Feedback,
    PresentVoltageCurrent, Signal,
};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::config::SimulatorConfig;

pub struct ChargerSimulator {
    config: SimulatorConfig,
    events: mpsc::Sender<ControlEvent>,
}

impl ChargerSimulator {
    pub fn new(config: SimulatorConfig, events: mpsc::Sender<ControlEvent>) -> Self {
        Self { config, events }
    }

    /// Control events answering `feedback` and the delay before they are sent
    pub fn respond(&self, feedback: &Feedback) -> Option<(Duration, Vec<ControlEvent>)> {
        let ms = Duration::from_millis;
        let reply = match feedback {
            Feedback::Signal(Signal::RequireAuthEim) => (
                ms(self.config.authorization_delay_ms),
                vec![AuthorizationStatus::Accepted.into()],
            ),
            Feedback::Signal(Signal::StartCableCheck) => (
                ms(self.config.cable_check_delay_ms),
                vec![CableCheckFinished(true).into()],
            ),
            Feedback::Signal(Signal::CloseContactor) => (
                ms(self.config.contactor_delay_ms),
                vec![ContactorsClosed(true).into()],
            ),
            Feedback::Signal(Signal::OpenContactor) => (
                ms(self.config.contactor_delay_ms),
                vec![
                    ContactorsClosed(false).into(),
                    PresentVoltageCurrent {
                        voltage: 0.0,
                        current: 0.0,
                    }
                    .into(),
                ],
            ),
            Feedback::DcPreChargeTargetVoltage(voltage) => (
                Duration::ZERO,
                vec![PresentVoltageCurrent {
                    voltage: *voltage,
                    current: 0.0,
                }
                .into()],
            ),
            Feedback::DcChargeLoopTarget { voltage, current } => (
                Duration::ZERO,
                vec![PresentVoltageCurrent {
                    voltage: *voltage,
                    current: current.min(self.config.charge_current_a),
                }
                .into()],
            ),
            _ => return None,
        };
        Some(reply)
    }

    pub fn on_feedback(&self, feedback: &Feedback) {
        let Some((delay, events)) = self.respond(feedback) else {
            return;
        };

        debug!(?feedback, ?delay, count = events.len(), "Simulating charger reply");
        let tx = self.events.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            for event in events {
                if tx.send(event).await.is_err() {
                    warn!("Connection gone, dropping simulated control event");
                    return;
                }
            }
        });
    }
}
