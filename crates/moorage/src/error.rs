//! Error types for the lifecycle layer, plus the unified wrapper.

use moorage_fleet::{ConnectionId, FleetError};
use moorage_idle::IdleError;

use crate::LifecycleState;

/// Errors from [`initialize`](crate::SessionLifecycleManager::initialize).
///
/// A handshake failure is fatal to startup — the process has nothing to
/// host without the fleet service — but the call is retryable from
/// `Uninitialized`, so supervisors may back off and try again before
/// exiting non-zero.
#[derive(Debug, thiserror::Error)]
pub enum InitError {
    /// The fleet handshake or readiness confirmation failed.
    #[error("fleet handshake failed: {0}")]
    Handshake(#[from] FleetError),

    /// `initialize` was called from a state other than `Uninitialized`.
    #[error("initialize called in state {0}")]
    AlreadyInitialized(LifecycleState),
}

/// Errors from [`connect_player`](crate::SessionLifecycleManager::connect_player).
///
/// All recoverable per-connection: the client is dropped or retries,
/// the session carries on.
#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    /// No session is active; the process is not accepting connections.
    #[error("not accepting connections in state {0}")]
    NotAcceptingConnections(LifecycleState),

    /// The fleet service did not validate the presented token.
    #[error("player token rejected: {0}")]
    Rejected(#[source] FleetError),

    /// The connection id is already registered. Duplicate connects are
    /// rejected, never overwritten.
    #[error("connection {0} is already registered")]
    DuplicateConnection(ConnectionId),
}

/// Errors from [`disconnect_player`](crate::SessionLifecycleManager::disconnect_player).
#[derive(Debug, thiserror::Error)]
pub enum DisconnectError {
    /// The connection id was never registered. Surfaced to the caller
    /// rather than absorbed: an unknown disconnect means the networking
    /// layer and the registry disagree about who is connected, which is
    /// a bug upstream that silent logging would mask.
    #[error("connection {0} is not registered")]
    UnknownConnection(ConnectionId),
}

/// Top-level error that wraps every error this workspace can produce.
///
/// Consumers that drive the whole lifecycle from one place deal with
/// this single type; the `#[from]` conversions let `?` lift each
/// layer's error automatically.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    /// A startup/handshake error.
    #[error(transparent)]
    Init(#[from] InitError),

    /// A per-connection admission error.
    #[error(transparent)]
    Connect(#[from] ConnectError),

    /// A disconnect-path error.
    #[error(transparent)]
    Disconnect(#[from] DisconnectError),

    /// An idle-supervisor usage error.
    #[error(transparent)]
    Idle(#[from] IdleError),

    /// A raw fleet-service error, for callers talking to the client
    /// directly.
    #[error(transparent)]
    Fleet(#[from] FleetError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_init_error() {
        let err = InitError::Handshake(FleetError::Unavailable("gone".into()));
        let host_err: HostError = err.into();
        assert!(matches!(host_err, HostError::Init(_)));
        assert!(host_err.to_string().contains("gone"));
    }

    #[test]
    fn test_from_connect_error() {
        let err = ConnectError::DuplicateConnection(ConnectionId(3));
        let host_err: HostError = err.into();
        assert!(matches!(host_err, HostError::Connect(_)));
        assert!(host_err.to_string().contains("C-3"));
    }

    #[test]
    fn test_from_disconnect_error() {
        let err = DisconnectError::UnknownConnection(ConnectionId(9));
        let host_err: HostError = err.into();
        assert!(matches!(host_err, HostError::Disconnect(_)));
    }

    #[test]
    fn test_from_idle_error() {
        let host_err: HostError = IdleError::DoubleStart.into();
        assert!(matches!(host_err, HostError::Idle(_)));
    }

    #[test]
    fn test_connect_rejected_preserves_cause() {
        let err = ConnectError::Rejected(FleetError::InvalidToken);
        assert!(err.to_string().contains("not valid"));
    }
}
