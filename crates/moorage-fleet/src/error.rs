//! Error type for fleet-service calls.

/// Errors reported by the fleet service (or by the client plumbing
/// that talks to it).
///
/// Every fallible [`FleetClient`](crate::FleetClient) operation returns
/// one of these. The lifecycle layer decides what each failure means —
/// a handshake failure is fatal to startup, a token rejection only
/// drops one player.
#[derive(Debug, Clone, thiserror::Error)]
pub enum FleetError {
    /// The service could not be reached, or the connection to it broke.
    #[error("fleet service unavailable: {0}")]
    Unavailable(String),

    /// The service understood the request and said no.
    #[error("fleet service rejected the request: {0}")]
    Rejected(String),

    /// A player session token was not recognized by the service.
    /// Could be stale, mistyped, or a join attempt with no reservation.
    #[error("player session token not valid")]
    InvalidToken,
}
