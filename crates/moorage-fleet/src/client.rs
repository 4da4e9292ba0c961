//! The two traits that sit on either side of the fleet boundary.
//!
//! Moorage doesn't implement fleet connectivity itself — that's the
//! deployment's job (an SDK client, a gRPC stub, a local stub for
//! development). Instead it defines [`FleetClient`], the calls the
//! lifecycle manager makes into the service, and [`HostCallbacks`],
//! the calls the service makes back. The lifecycle manager implements
//! `HostCallbacks`; the deployment implements `FleetClient`; tests
//! implement both with mocks. No framework code changes either way.

use std::future::Future;
use std::path::PathBuf;

use crate::{FleetError, GameSession};

/// The calls this process makes *into* the fleet service.
///
/// # Trait bounds
///
/// - `Send + Sync` → the client is shared across async tasks; the
///   activation callback, the networking layer, and the idle timer all
///   reach it concurrently.
/// - `'static` → it doesn't borrow temporary data; it lives as long as
///   the process.
///
/// All fallible operations return [`FleetError`]. What a failure means
/// is the caller's decision, not this trait's.
pub trait FleetClient: Send + Sync + 'static {
    /// Performs the one-time handshake that attaches this process to
    /// the fleet service.
    fn initialize(&self) -> impl Future<Output = Result<(), FleetError>> + Send;

    /// Advertises this process as ready to host a session.
    ///
    /// Registers `callbacks` as the surface the service will invoke for
    /// session assignment, termination, and health polling. `log_paths`
    /// names the files the service should retain when the session ends.
    fn confirm_ready(
        &self,
        listen_port: u16,
        log_paths: &[PathBuf],
        callbacks: impl HostCallbacks,
    ) -> impl Future<Output = Result<(), FleetError>> + Send;

    /// Confirms that this process accepts the session the service just
    /// assigned via [`HostCallbacks::on_session_activation_requested`].
    fn activate_session(&self) -> impl Future<Output = Result<(), FleetError>> + Send;

    /// Validates a connecting player's session token against the
    /// service's reservation for this session.
    fn validate_player_token(
        &self,
        token: &str,
    ) -> impl Future<Output = Result<(), FleetError>> + Send;

    /// Tells the service a player slot is free again after a disconnect.
    fn release_player_slot(
        &self,
        token: &str,
    ) -> impl Future<Output = Result<(), FleetError>> + Send;

    /// Acknowledges that this process is terminating its session.
    fn acknowledge_termination(&self) -> impl Future<Output = Result<(), FleetError>> + Send;

    /// Tears down the connection to the service. Fire-and-forget:
    /// called at the end of the termination path, after which nothing
    /// else will use this client.
    fn teardown_connection(&self) -> impl Future<Output = ()> + Send;
}

/// Shared ownership of a client is itself a client: every call forwards
/// to the inner value. This lets a deployment (or a test) hold one
/// `Arc`-shared client and hand a clone to the lifecycle manager while
/// retaining its own handle.
impl<T: FleetClient + ?Sized> FleetClient for std::sync::Arc<T> {
    fn initialize(&self) -> impl Future<Output = Result<(), FleetError>> + Send {
        (**self).initialize()
    }

    fn confirm_ready(
        &self,
        listen_port: u16,
        log_paths: &[PathBuf],
        callbacks: impl HostCallbacks,
    ) -> impl Future<Output = Result<(), FleetError>> + Send {
        (**self).confirm_ready(listen_port, log_paths, callbacks)
    }

    fn activate_session(&self) -> impl Future<Output = Result<(), FleetError>> + Send {
        (**self).activate_session()
    }

    fn validate_player_token(
        &self,
        token: &str,
    ) -> impl Future<Output = Result<(), FleetError>> + Send {
        (**self).validate_player_token(token)
    }

    fn release_player_slot(
        &self,
        token: &str,
    ) -> impl Future<Output = Result<(), FleetError>> + Send {
        (**self).release_player_slot(token)
    }

    fn acknowledge_termination(&self) -> impl Future<Output = Result<(), FleetError>> + Send {
        (**self).acknowledge_termination()
    }

    fn teardown_connection(&self) -> impl Future<Output = ()> + Send {
        (**self).teardown_connection()
    }
}

/// The calls the fleet service makes *back into* this process.
///
/// The lifecycle manager implements this and hands itself to
/// [`FleetClient::confirm_ready`]. The service invokes these from its
/// own tasks — potentially concurrently with each other and with
/// networking-layer traffic — so implementations must synchronize
/// internally.
pub trait HostCallbacks: Send + Sync + 'static {
    /// The service assigned a game session to this process.
    fn on_session_activation_requested(
        &self,
        session: GameSession,
    ) -> impl Future<Output = ()> + Send;

    /// The service asked this process to shut down.
    fn on_process_terminate_requested(&self) -> impl Future<Output = ()> + Send;

    /// Periodic health poll. The service enforces a response deadline
    /// and treats a non-answer as unhealthy, so this must return
    /// quickly — it is deliberately synchronous.
    fn on_health_check_requested(&self) -> bool;
}
