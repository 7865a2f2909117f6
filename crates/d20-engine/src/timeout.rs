//! Protocol timers
//!
//! The engine never sleeps. It records deadlines here, reports the nearest one
//! through [`Engine::next_deadline`](crate::Engine::next_deadline) and expects
//! the driver to feed back a `Timeout` event when it passes.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::context::Context;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeoutKind {
    /// A state keeps answering "Ongoing"
    Ongoing,
    /// Communication setup, connection to first SessionSetupReq
    Performance,
    /// Response to next request
    Sequence,
}

impl TimeoutKind {
    const ALL: [TimeoutKind; 3] = [Self::Ongoing, Self::Performance, Self::Sequence];

    fn index(self) -> usize {
        match self {
            Self::Ongoing => 0,
            Self::Performance => 1,
            Self::Sequence => 2,
        }
    }
}

/// At most one deadline per kind
#[derive(Debug, Clone, Default)]
pub struct Timeouts {
    deadlines: [Option<Instant>; 3],
}

impl Timeouts {
    pub fn start(&mut self, kind: TimeoutKind, duration: Duration) {
        self.deadlines[kind.index()] = Some(Instant::now() + duration);
    }

    pub fn stop(&mut self, kind: TimeoutKind) {
        self.deadlines[kind.index()] = None;
    }

    pub fn is_armed(&self, kind: TimeoutKind) -> bool {
        self.deadlines[kind.index()].is_some()
    }

    pub fn clear(&mut self) {
        self.deadlines = [None; 3];
    }

    /// Nearest armed deadline
    pub fn next(&self) -> Option<(TimeoutKind, Instant)> {
        TimeoutKind::ALL
            .iter()
            .filter_map(|&kind| self.deadlines[kind.index()].map(|at| (kind, at)))
            .min_by_key(|&(_, at)| at)
    }
}

/// Ongoing timer bookkeeping shared by every state that may answer "Ongoing"
///
/// Requests and responses strictly alternate, so an expiry cannot be answered
/// right away. It is remembered and the next request of the state is answered
/// with `FAILED`.
#[derive(Debug, Clone, Default)]
pub struct OngoingWait {
    armed: bool,
    expired: bool,
}

impl OngoingWait {
    /// Arm the timer on the first "Ongoing" answer; later calls keep the deadline
    pub fn wait(&mut self, ctx: &mut Context<'_>) {
        if !self.armed {
            let duration = ctx.config.timeouts.ongoing();
            ctx.start_timeout(TimeoutKind::Ongoing, duration);
            self.armed = true;
        }
    }

    /// Disarm on a terminal outcome
    pub fn finish(&mut self, ctx: &mut Context<'_>) {
        if self.armed {
            ctx.stop_timeout(TimeoutKind::Ongoing);
            self.armed = false;
        }
    }

    pub fn is_waiting(&self) -> bool {
        self.armed
    }

    /// Record an Ongoing expiry; other kinds are ignored
    pub fn on_timeout(&mut self, kind: TimeoutKind) {
        if kind == TimeoutKind::Ongoing && self.armed {
            self.armed = false;
            self.expired = true;
        }
    }

    /// Whether the timer expired since the last request, clearing the flag
    pub fn take_expired(&mut self) -> bool {
        std::mem::take(&mut self.expired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_picks_nearest() {
        let mut timeouts = Timeouts::default();
        assert_eq!(timeouts.next(), None);

        timeouts.start(TimeoutKind::Sequence, Duration::from_secs(60));
        timeouts.start(TimeoutKind::Ongoing, Duration::from_secs(5));
        assert_eq!(timeouts.next().map(|(kind, _)| kind), Some(TimeoutKind::Ongoing));

        timeouts.stop(TimeoutKind::Ongoing);
        assert_eq!(timeouts.next().map(|(kind, _)| kind), Some(TimeoutKind::Sequence));
    }

    #[test]
    fn test_restart_replaces_deadline() {
        let mut timeouts = Timeouts::default();
        timeouts.start(TimeoutKind::Sequence, Duration::from_secs(60));
        let (_, first) = timeouts.next().unwrap();
        timeouts.start(TimeoutKind::Sequence, Duration::from_secs(1));
        let (_, second) = timeouts.next().unwrap();
        assert!(second < first);
    }

    #[test]
    fn test_clear() {
        let mut timeouts = Timeouts::default();
        timeouts.start(TimeoutKind::Performance, Duration::from_secs(20));
        timeouts.start(TimeoutKind::Ongoing, Duration::from_secs(20));
        timeouts.clear();
        assert!(!timeouts.is_armed(TimeoutKind::Performance));
        assert_eq!(timeouts.next(), None);
    }

    #[test]
    fn test_ongoing_expiry_is_remembered_once() {
        let mut wait = OngoingWait::default();
        // Not armed: a stray expiry is ignored
        wait.on_timeout(TimeoutKind::Ongoing);
        assert!(!wait.take_expired());

        wait.armed = true;
        wait.on_timeout(TimeoutKind::Sequence);
        assert!(!wait.take_expired());

        wait.on_timeout(TimeoutKind::Ongoing);
        assert!(!wait.is_waiting());
        assert!(wait.take_expired());
        assert!(!wait.take_expired());
    }
}
