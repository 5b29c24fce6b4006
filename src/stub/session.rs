//! Stub MQTT session state machine.
//!
//! # States
//! - Stopped: no subscription
//! - Running: subscribed to the detection topic
//! - Error: the subscriber failed; reported by status until the next start
//!
//! # State Transitions
//! ```text
//! Stopped → Running: start
//! Error   → Running: start
//! Running → Running: start (reported as "already running")
//! Running → Stopped: stop
//! Error   → Stopped: stop
//! Stopped → Stopped: stop (reported as "not running")
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::gateway::types::{SessionState, SessionStatus, Transition};

#[derive(Debug, Clone, PartialEq, Eq)]
enum State {
    Stopped,
    Running,
    Error(String),
}

#[derive(Debug)]
pub struct SessionMachine {
    state: Mutex<State>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl Default for SessionMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionMachine {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::Stopped),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn start(&self) -> Transition {
        let mut state = self.lock();
        match *state {
            State::Running => Transition::AlreadyRunning,
            State::Stopped | State::Error(_) => {
                *state = State::Running;
                tracing::info!("Stub MQTT session started");
                Transition::Started
            }
        }
    }

    pub fn stop(&self) -> Transition {
        let mut state = self.lock();
        match *state {
            State::Stopped => Transition::NotRunning,
            // An errored subscriber is not running; the error is cleared and
            // the caller hears `not running`.
            State::Error(_) => {
                *state = State::Stopped;
                Transition::NotRunning
            }
            State::Running => {
                *state = State::Stopped;
                tracing::info!("Stub MQTT session stopped");
                Transition::Stopped
            }
        }
    }

    pub fn status(&self) -> SessionStatus {
        match &*self.lock() {
            State::Running => SessionStatus {
                running: true,
                state: SessionState::Running,
                detail: None,
            },
            State::Stopped => SessionStatus {
                running: false,
                state: SessionState::Stopped,
                detail: None,
            },
            State::Error(detail) => SessionStatus {
                running: false,
                state: SessionState::Error,
                detail: Some(detail.clone()),
            },
        }
    }

    /// Put the session in the error state, as a failed broker connection would.
    pub fn fail(&self, detail: impl Into<String>) {
        let detail = detail.into();
        tracing::warn!(detail = %detail, "Stub MQTT session failed");
        *self.lock() = State::Error(detail);
    }

    pub fn is_running(&self) -> bool {
        *self.lock() == State::Running
    }

    /// Mark a start/stop request as in flight until the guard drops.
    pub fn enter_transition(&self) -> TransitionGuard<'_> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        TransitionGuard { machine: self }
    }

    /// Highest number of start/stop requests ever handled concurrently.
    pub fn max_concurrent_transitions(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        // A panic while holding this lock cannot leave State half-written.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

pub struct TransitionGuard<'a> {
    machine: &'a SessionMachine,
}

impl Drop for TransitionGuard<'_> {
    fn drop(&mut self) {
        self.machine.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_twice_is_already_running() {
        let session = SessionMachine::new();
        assert_eq!(session.start(), Transition::Started);
        assert_eq!(session.start(), Transition::AlreadyRunning);
        assert!(session.is_running());
    }

    #[test]
    fn stop_when_stopped_is_not_running() {
        let session = SessionMachine::new();
        assert_eq!(session.stop(), Transition::NotRunning);
        assert_eq!(session.status().state, SessionState::Stopped);
    }

    #[test]
    fn error_state_is_reported_and_recoverable() {
        let session = SessionMachine::new();
        session.start();
        session.fail("broker refused connection");

        let status = session.status();
        assert!(!status.running);
        assert_eq!(status.state, SessionState::Error);
        assert_eq!(status.detail.as_deref(), Some("broker refused connection"));

        assert_eq!(session.start(), Transition::Started);
        assert!(session.status().running);
    }

    #[test]
    fn stop_clears_error() {
        let session = SessionMachine::new();
        session.fail("boom");
        assert_eq!(session.stop(), Transition::NotRunning);
        assert_eq!(session.status().state, SessionState::Stopped);
    }

    #[test]
    fn transition_guard_tracks_concurrency() {
        let session = SessionMachine::new();
        {
            let _a = session.enter_transition();
            let _b = session.enter_transition();
        }
        let _c = session.enter_transition();
        assert_eq!(session.max_concurrent_transitions(), 2);
    }
}
