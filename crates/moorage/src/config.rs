//! Host configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// How long an active session may sit with zero connected players
/// before it is torn down.
///
/// This is the reference deployment's window. It is a named constant on
/// purpose: the value has been misquoted in the past, so every use goes
/// through this one definition.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(120);

/// Default port the process advertises to the fleet service.
pub const DEFAULT_LISTEN_PORT: u16 = 7777;

// ---------------------------------------------------------------------------
// DisconnectPolicy
// ---------------------------------------------------------------------------

/// What happens to the session when a player disconnects.
///
/// The reference behavior ends the whole session on any disconnect —
/// unusual for a multi-player host, so it is a named, overridable
/// policy rather than hard-coded behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DisconnectPolicy {
    /// Any player disconnect terminates the session (reference
    /// product behavior; suits one-session-per-match hosts).
    EndSession,

    /// The session keeps running. When the last player leaves, the
    /// idle-timeout window restarts.
    StayActive,
}

// ---------------------------------------------------------------------------
// HostConfig
// ---------------------------------------------------------------------------

/// Configuration for the hosting process.
///
/// Deployments override these when constructing the lifecycle manager.
/// No field is read from disk and nothing is persisted — the process is
/// stateless across restarts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostConfig {
    /// Port this process listens on; advertised to the fleet service
    /// during readiness confirmation.
    pub listen_port: u16,

    /// Idle window for an active session with no connected players.
    pub idle_timeout: Duration,

    /// Log files the fleet service should retain when the session ends.
    pub log_paths: Vec<PathBuf>,

    /// Session fate on player disconnect.
    pub disconnect_policy: DisconnectPolicy,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            listen_port: DEFAULT_LISTEN_PORT,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            log_paths: Vec::new(),
            disconnect_policy: DisconnectPolicy::EndSession,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_config_defaults() {
        let config = HostConfig::default();
        assert_eq!(config.listen_port, 7777);
        assert_eq!(config.idle_timeout, Duration::from_secs(120));
        assert!(config.log_paths.is_empty());
        assert_eq!(config.disconnect_policy, DisconnectPolicy::EndSession);
    }

    #[test]
    fn test_host_config_round_trips_through_json() {
        let config = HostConfig {
            listen_port: 9100,
            idle_timeout: Duration::from_secs(45),
            log_paths: vec![PathBuf::from("/var/log/game/server.log")],
            disconnect_policy: DisconnectPolicy::StayActive,
        };

        let json = serde_json::to_string(&config).unwrap();
        let back: HostConfig = serde_json::from_str(&json).unwrap();

        assert_eq!(back.listen_port, 9100);
        assert_eq!(back.idle_timeout, Duration::from_secs(45));
        assert_eq!(back.disconnect_policy, DisconnectPolicy::StayActive);
    }
}
