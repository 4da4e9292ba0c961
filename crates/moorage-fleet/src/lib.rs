//! The fleet-orchestration boundary for Moorage.
//!
//! Moorage does not speak the fleet service's wire protocol itself —
//! that belongs to whichever SDK or client the deployment uses. This
//! crate defines the *seam*: the types that cross it and the two traits
//! on either side of it.
//!
//! 1. **Types** — [`ConnectionId`], [`SessionId`], [`GameSession`]:
//!    the data a hosting assignment carries.
//! 2. **Consumed interface** — [`FleetClient`]: the calls the lifecycle
//!    manager makes *into* the fleet service (handshake, readiness,
//!    token validation, termination acknowledgement).
//! 3. **Exposed interface** — [`HostCallbacks`]: the calls the fleet
//!    service makes *back into* this process (session assignment,
//!    terminate request, health polling).
//!
//! # How it fits in the stack
//!
//! ```text
//! Fleet service (external)  ← assigns sessions, polls health
//!     ↕  this crate's traits
//! Lifecycle layer (moorage) ← drives the process state machine
//!     ↕
//! Registry / idle layers    ← track players, supervise the idle window
//! ```

mod client;
mod error;
mod types;

pub use client::{FleetClient, HostCallbacks};
pub use error::FleetError;
pub use types::{ConnectionId, GameSession, SessionId};
