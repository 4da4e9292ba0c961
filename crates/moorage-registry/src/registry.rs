//! The player-session registry: connection id → validated token.
//!
//! # Concurrency note
//!
//! Unlike a map owned by a single task, this registry is hit from
//! several directions at once — networking-event tasks for connects
//! and disconnects, the idle-timer task checking emptiness, the
//! lifecycle layer clearing it on termination. Every operation takes
//! the internal lock exactly once, so the emptiness a caller observes
//! is always a state the map actually passed through (no torn reads
//! between a count and a lookup).

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use moorage_fleet::ConnectionId;

/// Tracks every connection that has presented a valid session token.
///
/// An entry exists from the moment a connect is validated until the
/// connection disconnects or the session is torn down. The token stored
/// against each connection is what gets handed back to the fleet
/// service when the slot is released.
#[derive(Debug, Default)]
pub struct PlayerSessionRegistry {
    /// `ConnectionId → session token`. One entry per live connection.
    entries: Mutex<HashMap<ConnectionId, String>>,
}

impl PlayerSessionRegistry {
    /// Creates a new, empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a connection with its validated token.
    ///
    /// Returns `false` if the connection id is already registered — a
    /// duplicate connect is rejected, never overwritten, so the token
    /// recorded for a connection is always the one that was validated
    /// first.
    pub fn insert(&self, connection: ConnectionId, token: impl Into<String>) -> bool {
        let mut entries = self.lock();
        if entries.contains_key(&connection) {
            tracing::debug!(%connection, "duplicate registration rejected");
            return false;
        }
        entries.insert(connection, token.into());
        true
    }

    /// Removes a connection, returning its token for slot release.
    ///
    /// Returns `None` if the connection was never registered — the
    /// caller surfaces that, since it means the networking layer and
    /// the registry disagree about who is connected.
    pub fn remove(&self, connection: ConnectionId) -> Option<String> {
        self.lock().remove(&connection)
    }

    /// Returns `true` if the connection is currently registered.
    pub fn contains(&self, connection: ConnectionId) -> bool {
        self.lock().contains_key(&connection)
    }

    /// Returns `true` if no connections are registered.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Returns the number of registered connections.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Drops every entry, returning how many were removed.
    ///
    /// Used on session termination, where per-connection bookkeeping no
    /// longer matters.
    pub fn clear(&self) -> usize {
        let mut entries = self.lock();
        let dropped = entries.len();
        entries.clear();
        dropped
    }

    /// Recovers the guard even if another holder panicked mid-operation;
    /// every mutation here leaves the map coherent.
    fn lock(&self) -> MutexGuard<'_, HashMap<ConnectionId, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! Unit tests for `PlayerSessionRegistry`.
    //!
    //! Naming convention: `test_{function}_{scenario}_{expected}`.
    //! The count property under test: the reported length equals net
    //! inserts minus successful removes — never negative, never
    //! double-counting a duplicate insert.

    use super::*;

    fn cid(id: u64) -> ConnectionId {
        ConnectionId(id)
    }

    // =====================================================================
    // insert()
    // =====================================================================

    #[test]
    fn test_insert_new_connection_returns_true() {
        let registry = PlayerSessionRegistry::new();

        assert!(registry.insert(cid(1), "tok-1"));
        assert!(registry.contains(cid(1)));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_insert_duplicate_returns_false_and_keeps_original_token() {
        let registry = PlayerSessionRegistry::new();
        registry.insert(cid(1), "tok-first");

        assert!(!registry.insert(cid(1), "tok-second"));

        // Still exactly one entry, and it's the first token.
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.remove(cid(1)), Some("tok-first".to_string()));
    }

    #[test]
    fn test_insert_distinct_connections_all_tracked() {
        let registry = PlayerSessionRegistry::new();

        for id in 1..=4 {
            assert!(registry.insert(cid(id), format!("tok-{id}")));
        }

        assert_eq!(registry.len(), 4);
    }

    // =====================================================================
    // remove()
    // =====================================================================

    #[test]
    fn test_remove_registered_connection_returns_token() {
        let registry = PlayerSessionRegistry::new();
        registry.insert(cid(1), "tok-1");

        assert_eq!(registry.remove(cid(1)), Some("tok-1".to_string()));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_remove_unknown_connection_returns_none_registry_unchanged() {
        let registry = PlayerSessionRegistry::new();
        registry.insert(cid(1), "tok-1");

        assert_eq!(registry.remove(cid(99)), None);

        assert_eq!(registry.len(), 1);
        assert!(registry.contains(cid(1)));
    }

    #[test]
    fn test_remove_twice_second_returns_none() {
        let registry = PlayerSessionRegistry::new();
        registry.insert(cid(1), "tok-1");

        assert!(registry.remove(cid(1)).is_some());
        assert_eq!(registry.remove(cid(1)), None);
    }

    // =====================================================================
    // is_empty() / len()
    // =====================================================================

    #[test]
    fn test_len_tracks_net_inserts_minus_removes() {
        let registry = PlayerSessionRegistry::new();
        assert!(registry.is_empty());

        registry.insert(cid(1), "a");
        registry.insert(cid(2), "b");
        registry.insert(cid(1), "dup"); // rejected, must not count
        assert_eq!(registry.len(), 2);

        registry.remove(cid(1));
        assert_eq!(registry.len(), 1);

        registry.remove(cid(1)); // already gone, must not go negative
        assert_eq!(registry.len(), 1);

        registry.remove(cid(2));
        assert!(registry.is_empty());
    }

    // =====================================================================
    // clear()
    // =====================================================================

    #[test]
    fn test_clear_drops_all_entries_and_reports_count() {
        let registry = PlayerSessionRegistry::new();
        registry.insert(cid(1), "a");
        registry.insert(cid(2), "b");
        registry.insert(cid(3), "c");

        assert_eq!(registry.clear(), 3);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_clear_empty_registry_reports_zero() {
        let registry = PlayerSessionRegistry::new();
        assert_eq!(registry.clear(), 0);
    }

    // =====================================================================
    // Concurrent access
    // =====================================================================

    #[test]
    fn test_concurrent_inserts_and_removes_keep_count_consistent() {
        use std::sync::Arc;

        let registry = Arc::new(PlayerSessionRegistry::new());
        let mut handles = Vec::new();

        // 8 threads, each inserting then removing its own connections.
        // Whatever the interleaving, the net count must come back to 0
        // and no thread may observe a torn state.
        for t in 0..8u64 {
            let registry = Arc::clone(&registry);
            handles.push(std::thread::spawn(move || {
                for i in 0..100u64 {
                    let id = cid(t * 1000 + i);
                    assert!(registry.insert(id, "tok"));
                    assert!(registry.contains(id));
                    assert_eq!(registry.remove(id), Some("tok".to_string()));
                }
            }));
        }

        for handle in handles {
            handle.join().expect("worker thread panicked");
        }

        assert!(registry.is_empty());
    }
}
