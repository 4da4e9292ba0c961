//! Types that cross the fleet-service boundary.
//!
//! Everything here is data the orchestration service either hands to
//! this process (a hosting assignment) or that the networking layer
//! supplies when a client shows up (a connection identifier).

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for one transport-layer connection.
///
/// The networking layer assigns these — one per connect event — and
/// presents the same value again on disconnect. Newtype wrapper so a
/// connection id can't be confused with any other `u64` in the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "C-{}", self.0)
    }
}

/// The fleet service's opaque identifier for a hosting assignment.
///
/// Assigned by the orchestration service when it places a game session
/// on this process. Never parsed or interpreted locally.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// GameSession
// ---------------------------------------------------------------------------

/// One hosting assignment accepted from the fleet service.
///
/// Created when the service requests activation, immutable afterwards,
/// released when the session terminates. The properties are whatever
/// key-value pairs the service declared for the match (map name, game
/// mode, and so on) — Moorage carries them, it doesn't interpret them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSession {
    /// The service-assigned session identifier.
    pub session_id: SessionId,

    /// Declared game properties, as sent by the service.
    pub properties: HashMap<String, String>,

    /// The port this process listens on for the session.
    pub port: u16,
}

impl GameSession {
    /// Creates a session with no properties.
    pub fn new(session_id: impl Into<String>, port: u16) -> Self {
        Self {
            session_id: SessionId(session_id.into()),
            properties: HashMap::new(),
            port,
        }
    }

    /// Adds a declared property (builder-style, used when constructing
    /// an assignment from service data).
    pub fn with_property(
        mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Looks up a declared property by key.
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_id_display_is_prefixed() {
        assert_eq!(ConnectionId(42).to_string(), "C-42");
    }

    #[test]
    fn test_session_id_display_is_raw() {
        let id = SessionId("gsess-abc123".to_string());
        assert_eq!(id.to_string(), "gsess-abc123");
    }

    #[test]
    fn test_connection_id_serializes_transparently() {
        let json = serde_json::to_string(&ConnectionId(7)).unwrap();
        assert_eq!(json, "7");
        let back: ConnectionId = serde_json::from_str("7").unwrap();
        assert_eq!(back, ConnectionId(7));
    }

    #[test]
    fn test_game_session_property_lookup() {
        let session = GameSession::new("gsess-1", 7777)
            .with_property("map", "harbor")
            .with_property("mode", "ranked");

        assert_eq!(session.property("map"), Some("harbor"));
        assert_eq!(session.property("mode"), Some("ranked"));
        assert_eq!(session.property("missing"), None);
    }

    #[test]
    fn test_game_session_round_trips_through_json() {
        let session = GameSession::new("gsess-2", 9000).with_property("map", "quay");

        let json = serde_json::to_string(&session).unwrap();
        let back: GameSession = serde_json::from_str(&json).unwrap();

        assert_eq!(back, session);
    }
}
