//! The process lifecycle state machine.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

use serde::{Deserialize, Serialize};

/// The single authoritative phase of the hosting process.
///
/// ```text
/// Uninitialized ──(handshake)──→ Initializing ──(ready confirmed)──→ Ready
///       ↑                             │
///       └────────(handshake failed)───┘
///
/// Ready ──(activation confirmed)──→ SessionActive
///   │                                    │
///   │ (terminate requested)              │ (idle timeout / terminate)
///   ▼                                    ▼
/// Terminating ──(cleanup complete)──→ Terminated
/// ```
///
/// - **Uninitialized**: process started, no fleet handshake yet.
/// - **Initializing**: handshake and readiness advertisement in flight.
/// - **Ready**: advertised to the fleet, waiting for a session.
/// - **SessionActive**: hosting a game session; connects are accepted.
/// - **Terminating**: teardown in progress, nothing new accepted.
/// - **Terminated**: terminal. The process exits from here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum LifecycleState {
    Uninitialized = 0,
    Initializing = 1,
    Ready = 2,
    SessionActive = 3,
    Terminating = 4,
    Terminated = 5,
}

impl LifecycleState {
    /// Returns `true` if player connections are accepted in this state.
    pub fn is_accepting_connections(&self) -> bool {
        matches!(self, Self::SessionActive)
    }

    /// Returns `true` once teardown has begun (health checks report
    /// unhealthy from here on).
    pub fn is_shutting_down(&self) -> bool {
        matches!(self, Self::Terminating | Self::Terminated)
    }

    /// Returns `true` for the terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Terminated)
    }

    /// Returns `true` if transitioning to `target` is a legal edge of
    /// the machine. The reverse edge `Initializing → Uninitialized` is
    /// the handshake-failure revert.
    pub fn can_transition_to(self, target: Self) -> bool {
        use LifecycleState::*;
        matches!(
            (self, target),
            (Uninitialized, Initializing)
                | (Initializing, Ready)
                | (Initializing, Uninitialized)
                | (Ready, SessionActive)
                | (Ready, Terminating)
                | (SessionActive, Terminating)
                | (Terminating, Terminated)
        )
    }

    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Uninitialized,
            1 => Self::Initializing,
            2 => Self::Ready,
            3 => Self::SessionActive,
            4 => Self::Terminating,
            _ => Self::Terminated,
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uninitialized => write!(f, "Uninitialized"),
            Self::Initializing => write!(f, "Initializing"),
            Self::Ready => write!(f, "Ready"),
            Self::SessionActive => write!(f, "SessionActive"),
            Self::Terminating => write!(f, "Terminating"),
            Self::Terminated => write!(f, "Terminated"),
        }
    }
}

/// Atomic cell holding the current [`LifecycleState`].
///
/// Writes happen only inside the manager's lifecycle critical section;
/// reads are lock-free so the health-check path never queues behind
/// connect/disconnect processing.
#[derive(Debug)]
pub(crate) struct StateCell(AtomicU8);

impl StateCell {
    pub(crate) fn new() -> Self {
        Self(AtomicU8::new(LifecycleState::Uninitialized as u8))
    }

    pub(crate) fn load(&self) -> LifecycleState {
        LifecycleState::from_u8(self.0.load(Ordering::Acquire))
    }

    pub(crate) fn store(&self, state: LifecycleState) {
        self.0.store(state as u8, Ordering::Release);
    }
}
