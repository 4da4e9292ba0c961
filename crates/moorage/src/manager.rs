//! The session-lifecycle manager: the state machine and the callback
//! surface that both external collaborators drive.
//!
//! # Concurrency model
//!
//! Four kinds of callers reach into this type without any shared
//! caller-side lock: fleet-service callback tasks (activation,
//! terminate, health), networking-event tasks (connect, disconnect),
//! and the idle-timer task (expiry). The manager owns all the mutual
//! exclusion itself:
//!
//! - One `tokio::sync::Mutex` guards the lifecycle critical section —
//!   the active session plus every compound registry/supervisor update.
//!   Connect and disconnect apply their registry change and their timer
//!   change inside it, so the supervisor always observes a consistent
//!   sequence of cancel/restart calls.
//! - The state phase lives in an atomic cell, written only inside the
//!   critical section and read lock-free, so health checks never queue
//!   behind connect/disconnect processing.
//! - Activation arms the idle supervisor and stores the session
//!   *before* the cell advertises `SessionActive`; connects re-check
//!   the state under the lock, so no connect ever observes an active
//!   session whose timer isn't armed yet.
//! - Idle expiry re-validates under the lock before terminating — a
//!   connection that arrived during the race window and lost the
//!   cancel race still keeps the session alive.

use std::sync::Arc;

use moorage_fleet::{ConnectionId, FleetClient, FleetError, GameSession, HostCallbacks};
use moorage_idle::IdleTimeoutSupervisor;
use moorage_registry::PlayerSessionRegistry;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, trace, warn};

use crate::state::StateCell;
use crate::{
    ConnectError, DisconnectError, DisconnectPolicy, EndReason, HostConfig, InitError,
    LifecycleEvent, LifecycleState,
};

/// Buffered lifecycle events per subscriber. A subscriber that lags
/// past this loses the oldest events, never blocks the manager.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Everything shared between manager handles and the idle-timer task.
struct Shared<F: FleetClient> {
    fleet: F,
    config: HostConfig,
    /// Current phase; lock-free reads for the health-check path.
    state: StateCell,
    registry: PlayerSessionRegistry,
    idle: IdleTimeoutSupervisor,
    /// The lifecycle critical section: holds the active session and
    /// serializes every compound state/registry/supervisor update.
    lifecycle: Mutex<Option<GameSession>>,
    events: broadcast::Sender<LifecycleEvent>,
}

/// Drives one game-server process through its hosting lifecycle.
///
/// Cheap to clone — a handle over shared state. One logical manager
/// exists per process; clones are how the fleet client, the networking
/// layer, and the idle timer all hold onto it at once.
pub struct SessionLifecycleManager<F: FleetClient> {
    shared: Arc<Shared<F>>,
}

impl<F: FleetClient> Clone for SessionLifecycleManager<F> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<F: FleetClient> SessionLifecycleManager<F> {
    /// Creates a manager in `Uninitialized` over the given fleet client.
    pub fn new(fleet: F, config: HostConfig) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            shared: Arc::new(Shared {
                fleet,
                config,
                state: StateCell::new(),
                registry: PlayerSessionRegistry::new(),
                idle: IdleTimeoutSupervisor::new(),
                lifecycle: Mutex::new(None),
                events,
            }),
        }
    }

    // =====================================================================
    // Startup
    // =====================================================================

    /// Performs the one-time fleet handshake and advertises readiness.
    ///
    /// On success the process is `Ready` and this manager's callback
    /// surface is registered with the fleet service. On failure the
    /// process reverts to `Uninitialized` and the call may be retried.
    ///
    /// # Errors
    /// - [`InitError::AlreadyInitialized`] unless called from
    ///   `Uninitialized`.
    /// - [`InitError::Handshake`] if the service could not be reached
    ///   or refused the readiness confirmation.
    pub async fn initialize(&self) -> Result<(), InitError> {
        let _lifecycle = self.shared.lifecycle.lock().await;

        let state = self.shared.state.load();
        if state != LifecycleState::Uninitialized {
            return Err(InitError::AlreadyInitialized(state));
        }

        self.shared.state.store(LifecycleState::Initializing);
        info!("starting fleet handshake");

        if let Err(e) = self.handshake().await {
            self.shared.state.store(LifecycleState::Uninitialized);
            warn!(error = %e, "fleet handshake failed");
            return Err(InitError::Handshake(e));
        }

        self.shared.state.store(LifecycleState::Ready);
        info!(
            port = self.shared.config.listen_port,
            "process ready, awaiting session assignment"
        );
        Ok(())
    }

    async fn handshake(&self) -> Result<(), FleetError> {
        self.shared.fleet.initialize().await?;
        self.shared
            .fleet
            .confirm_ready(
                self.shared.config.listen_port,
                &self.shared.config.log_paths,
                self.clone(),
            )
            .await
    }

    // =====================================================================
    // Player connections (networking layer)
    // =====================================================================

    /// Admits a connecting player.
    ///
    /// Validates the presented token with the fleet service, then
    /// registers the connection. The first registered connection
    /// cancels the idle timer, atomically with the registration.
    ///
    /// # Errors
    /// - [`ConnectError::NotAcceptingConnections`] unless a session is
    ///   active.
    /// - [`ConnectError::DuplicateConnection`] if the id is already
    ///   registered (the original registration is kept).
    /// - [`ConnectError::Rejected`] if the service did not validate
    ///   the token; nothing is registered.
    pub async fn connect_player(
        &self,
        connection: ConnectionId,
        token: &str,
    ) -> Result<(), ConnectError> {
        let state = self.shared.state.load();
        if !state.is_accepting_connections() {
            return Err(ConnectError::NotAcceptingConnections(state));
        }
        if self.shared.registry.contains(connection) {
            return Err(ConnectError::DuplicateConnection(connection));
        }

        // Validate before taking the lifecycle lock — the fleet call
        // can block, and only the registration itself needs atomicity.
        self.shared
            .fleet
            .validate_player_token(token)
            .await
            .map_err(ConnectError::Rejected)?;

        let _lifecycle = self.shared.lifecycle.lock().await;

        // Re-check under the lock: the session may have terminated
        // while the token was in flight.
        let state = self.shared.state.load();
        if !state.is_accepting_connections() {
            return Err(ConnectError::NotAcceptingConnections(state));
        }
        if !self.shared.registry.insert(connection, token) {
            return Err(ConnectError::DuplicateConnection(connection));
        }

        let players = self.shared.registry.len();
        if players == 1 {
            // First connection: the session is no longer idle. A false
            // return means expiry already claimed the timer; its
            // handler will see the non-empty registry and stand down.
            let cancelled = self.shared.idle.cancel();
            trace!(cancelled, "first player connected, idle timer cancelled");
        }

        info!(%connection, players, "player connected");
        self.emit(LifecycleEvent::PlayerConnected { connection });
        Ok(())
    }

    /// Removes a disconnected player and applies the disconnect policy.
    ///
    /// Releases the player's slot with the fleet service (best-effort),
    /// then either terminates the session
    /// ([`DisconnectPolicy::EndSession`]) or, when the registry drained
    /// and the session is still active, restarts the idle timer
    /// ([`DisconnectPolicy::StayActive`]).
    ///
    /// # Errors
    /// [`DisconnectError::UnknownConnection`] if the id was never
    /// registered. This is escalated, not absorbed — it means the
    /// networking layer and the registry have desynchronized.
    pub async fn disconnect_player(&self, connection: ConnectionId) -> Result<(), DisconnectError> {
        let mut lifecycle = self.shared.lifecycle.lock().await;

        let Some(token) = self.shared.registry.remove(connection) else {
            warn!(%connection, "disconnect for unregistered connection");
            return Err(DisconnectError::UnknownConnection(connection));
        };

        let remaining = self.shared.registry.len();
        info!(%connection, players = remaining, "player disconnected");

        if let Err(e) = self.shared.fleet.release_player_slot(&token).await {
            warn!(%connection, error = %e, "failed to release player slot");
        }
        self.emit(LifecycleEvent::PlayerDisconnected {
            connection,
            remaining,
        });

        match self.shared.config.disconnect_policy {
            DisconnectPolicy::EndSession => {
                self.terminate_locked(&mut lifecycle, EndReason::PlayerDeparted)
                    .await;
            }
            DisconnectPolicy::StayActive => {
                if remaining == 0
                    && self.shared.state.load() == LifecycleState::SessionActive
                {
                    let manager = self.clone();
                    self.shared
                        .idle
                        .restart(self.shared.config.idle_timeout, move || async move {
                            manager.on_idle_expired().await;
                        });
                    debug!("registry drained, idle timer restarted");
                }
            }
        }

        Ok(())
    }

    // =====================================================================
    // Observation
    // =====================================================================

    /// Current lifecycle phase. Lock-free.
    pub fn state(&self) -> LifecycleState {
        self.shared.state.load()
    }

    /// Number of registered player connections.
    pub fn player_count(&self) -> usize {
        self.shared.registry.len()
    }

    /// Whether the idle-timeout timer is currently armed.
    pub fn idle_timer_armed(&self) -> bool {
        self.shared.idle.is_armed()
    }

    /// Snapshot of the active session, if any.
    pub async fn current_session(&self) -> Option<GameSession> {
        self.shared.lifecycle.lock().await.clone()
    }

    /// Subscribes to lifecycle notifications.
    ///
    /// Delivery is over a broadcast channel: observers run on their own
    /// tasks and cannot re-enter the manager from within a
    /// notification.
    pub fn subscribe(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.shared.events.subscribe()
    }

    // =====================================================================
    // Internals
    // =====================================================================

    async fn handle_activation(&self, session: GameSession) {
        let mut lifecycle = self.shared.lifecycle.lock().await;

        let state = self.shared.state.load();
        if state != LifecycleState::Ready {
            // Includes the duplicate-activation case: a second request
            // while a session is active is ignored without touching the
            // fleet service or arming a second timer.
            warn!(
                %state,
                session_id = %session.session_id,
                "session activation requested outside Ready, ignoring"
            );
            return;
        }

        if let Err(e) = self.shared.fleet.activate_session().await {
            // Non-fatal: the service may re-request activation.
            warn!(
                error = %e,
                session_id = %session.session_id,
                "fleet rejected session activation, staying ready"
            );
            return;
        }

        // Arm the supervisor and store the session before the state
        // cell advertises SessionActive — a connect that observes the
        // active state always finds a cancellable timer.
        let manager = self.clone();
        if let Err(e) = self
            .shared
            .idle
            .start(self.shared.config.idle_timeout, move || async move {
                manager.on_idle_expired().await;
            })
        {
            warn!(error = %e, "idle timer was already armed at activation");
        }
        *lifecycle = Some(session.clone());
        self.shared.state.store(LifecycleState::SessionActive);

        info!(
            session_id = %session.session_id,
            port = session.port,
            idle_timeout = ?self.shared.config.idle_timeout,
            "game session activated"
        );
        self.emit(LifecycleEvent::SessionStarted(session));
    }

    /// The idle timer elapsed. Expiry is a request, not a verdict: a
    /// player may have connected in the race window, so current state
    /// decides whether anything actually terminates.
    async fn on_idle_expired(&self) {
        let mut lifecycle = self.shared.lifecycle.lock().await;

        if self.shared.state.load() != LifecycleState::SessionActive
            || !self.shared.registry.is_empty()
        {
            debug!("idle expiry superseded by activity, ignoring");
            return;
        }

        info!(
            idle_timeout = ?self.shared.config.idle_timeout,
            "session idle window elapsed with no players"
        );
        self.terminate_locked(&mut lifecycle, EndReason::IdleTimeout)
            .await;
    }

    /// The termination path. Caller holds the lifecycle lock.
    ///
    /// Idempotent — a second caller that finds teardown already begun
    /// returns without re-running cleanup. Every step past the state
    /// transition is best-effort: a failure to acknowledge termination
    /// to the fleet service never prevents local cleanup.
    async fn terminate_locked(&self, lifecycle: &mut Option<GameSession>, reason: EndReason) {
        let state = self.shared.state.load();
        if state.is_shutting_down() {
            debug!(%state, "termination already in progress");
            return;
        }

        self.shared.state.store(LifecycleState::Terminating);
        info!(%reason, "terminating session");

        self.shared.idle.cancel();
        let dropped = self.shared.registry.clear();
        if dropped > 0 {
            info!(connections = dropped, "dropped remaining player connections");
        }
        *lifecycle = None;

        if let Err(e) = self.shared.fleet.acknowledge_termination().await {
            warn!(error = %e, "failed to acknowledge termination, continuing cleanup");
        }
        self.shared.fleet.teardown_connection().await;

        self.shared.state.store(LifecycleState::Terminated);
        info!("session terminated");
        self.emit(LifecycleEvent::SessionEnded { reason });
    }

    /// No subscribers is fine; events are advisory.
    fn emit(&self, event: LifecycleEvent) {
        let _ = self.shared.events.send(event);
    }
}

/// The surface the fleet service drives. Registered with the service
/// during [`initialize`](SessionLifecycleManager::initialize) via
/// `confirm_ready`.
impl<F: FleetClient> HostCallbacks for SessionLifecycleManager<F> {
    /// A hosting request arrived. Precondition: `Ready`. On fleet
    /// confirmation the session becomes active and the idle window
    /// starts; on rejection the process stays `Ready` and the service
    /// may retry. Safe to invoke from any task.
    async fn on_session_activation_requested(&self, session: GameSession) {
        self.handle_activation(session).await;
    }

    /// The service requested shutdown. Runs the termination path;
    /// never panics, continues through step failures.
    async fn on_process_terminate_requested(&self) {
        let mut lifecycle = self.shared.lifecycle.lock().await;
        self.terminate_locked(&mut lifecycle, EndReason::Requested)
            .await;
    }

    /// Health poll. A single atomic load — never touches the lifecycle
    /// lock, so it answers within the service's deadline no matter what
    /// connect/disconnect traffic is in flight.
    fn on_health_check_requested(&self) -> bool {
        let state = self.shared.state.load();
        let healthy = !state.is_shutting_down();
        trace!(%state, healthy, "health check");
        healthy
    }
}
