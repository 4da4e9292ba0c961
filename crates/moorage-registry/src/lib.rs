//! Player-session tracking for Moorage.
//!
//! One job: remember which transport connections have presented a valid
//! session token, so that disconnects can be matched to the token that
//! needs releasing and the lifecycle layer can tell an occupied session
//! from an idle one.
//!
//! # How it fits in the stack
//!
//! ```text
//! Lifecycle layer (above)  ← decides when entries may exist at all
//!     ↕
//! Registry (this crate)    ← connection id → validated session token
//!     ↕
//! Fleet boundary (below)   ← provides ConnectionId
//! ```

mod registry;

pub use registry::PlayerSessionRegistry;
