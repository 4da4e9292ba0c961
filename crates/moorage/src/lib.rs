//! # Moorage
//!
//! Session-lifecycle controller for a game-server process hosted by an
//! external fleet-orchestration service.
//!
//! Moorage drives one process through its hosting lifecycle —
//! initialization, readiness, session activation, player tracking,
//! idle-timeout supervision, termination — while keeping the concurrent
//! callers that mutate that lifecycle (fleet callbacks, networking
//! events, the idle timer, health polls) from ever racing each other
//! into an inconsistent state.
//!
//! # Key types
//!
//! - [`SessionLifecycleManager`] — the state machine and the callback
//!   surface both collaborators drive
//! - [`LifecycleState`] — the single authoritative phase of the process
//! - [`HostConfig`] — port, idle window, log paths, disconnect policy
//! - [`LifecycleEvent`] — observer notifications, delivered off-lock
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use moorage::{HostConfig, SessionLifecycleManager};
//!
//! let manager = SessionLifecycleManager::new(my_fleet_client, HostConfig::default());
//! manager.initialize().await?;
//! // The fleet service now drives activation / terminate / health
//! // through the HostCallbacks surface; the networking layer calls
//! // manager.connect_player / manager.disconnect_player.
//! ```

mod config;
mod error;
mod event;
mod manager;
mod state;

pub use config::{DisconnectPolicy, HostConfig, DEFAULT_IDLE_TIMEOUT, DEFAULT_LISTEN_PORT};
pub use error::{ConnectError, DisconnectError, HostError, InitError};
pub use event::{EndReason, LifecycleEvent};
pub use manager::SessionLifecycleManager;
pub use state::LifecycleState;

pub use moorage_fleet::{
    ConnectionId, FleetClient, FleetError, GameSession, HostCallbacks, SessionId,
};
pub use moorage_idle::{IdleError, IdleTimeoutSupervisor};
pub use moorage_registry::PlayerSessionRegistry;
