//! Observer notifications emitted by the lifecycle manager.
//!
//! Events are delivered over a broadcast channel, never by calling
//! observer code inline — an observer cannot re-enter the manager from
//! inside a notification, and a slow observer cannot stall a lifecycle
//! transition.

use std::fmt;

use moorage_fleet::{ConnectionId, GameSession};

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    /// The idle window elapsed with no connected players.
    IdleTimeout,

    /// The fleet service requested process termination.
    Requested,

    /// A player disconnected and the configured
    /// [`DisconnectPolicy`](crate::DisconnectPolicy) ends the session.
    PlayerDeparted,
}

impl fmt::Display for EndReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IdleTimeout => write!(f, "idle timeout"),
            Self::Requested => write!(f, "terminate requested"),
            Self::PlayerDeparted => write!(f, "player departed"),
        }
    }
}

/// A lifecycle notification.
#[derive(Debug, Clone)]
pub enum LifecycleEvent {
    /// A game session was activated on this process.
    SessionStarted(GameSession),

    /// A player connection was validated and registered.
    PlayerConnected {
        connection: ConnectionId,
    },

    /// A registered player disconnected. `remaining` is the registry
    /// count after removal.
    PlayerDisconnected {
        connection: ConnectionId,
        remaining: usize,
    },

    /// The session (and the process) finished terminating.
    SessionEnded {
        reason: EndReason,
    },
}
