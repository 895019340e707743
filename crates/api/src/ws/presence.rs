//! Per-user online-presence tracking.
//!
//! A user is online while they have at least one open WebSocket connection.
//! The registry tracks connection IDs per user so that multi-device users
//! only produce presence transitions on the first connect and the last
//! disconnect.

use std::collections::{HashMap, HashSet};

use questline_core::types::DbId;
use tokio::sync::RwLock;

/// Tracks which users are online and through which connections.
///
/// Thread-safe via interior `RwLock`; designed to be shared behind `Arc`
/// (usually as a field of the connection manager).
pub struct PresenceRegistry {
    online: RwLock<HashMap<DbId, HashSet<String>>>,
}

impl PresenceRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            online: RwLock::new(HashMap::new()),
        }
    }

    /// Record a new connection for a user.
    ///
    /// Returns `true` if this was the user's first connection, i.e. they
    /// just transitioned from offline to online.
    pub async fn add_connection(&self, user_id: DbId, conn_id: &str) -> bool {
        let mut online = self.online.write().await;
        let conns = online.entry(user_id).or_default();
        let came_online = conns.is_empty();
        conns.insert(conn_id.to_string());
        came_online
    }

    /// Remove a connection for a user.
    ///
    /// Returns `true` if this was the user's last connection, i.e. they
    /// just transitioned from online to offline. The user's entry is
    /// dropped entirely once its connection set is empty.
    pub async fn remove_connection(&self, user_id: DbId, conn_id: &str) -> bool {
        let mut online = self.online.write().await;
        let Some(conns) = online.get_mut(&user_id) else {
            return false;
        };
        conns.remove(conn_id);
        if conns.is_empty() {
            online.remove(&user_id);
            true
        } else {
            false
        }
    }

    /// Whether the user currently has any open connection.
    pub async fn is_online(&self, user_id: DbId) -> bool {
        self.online.read().await.contains_key(&user_id)
    }

    /// Connection IDs for a user (empty if offline).
    pub async fn connections_for(&self, user_id: DbId) -> Vec<String> {
        self.online
            .read()
            .await
            .get(&user_id)
            .map(|conns| conns.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Filter a candidate list down to the users that are currently online.
    pub async fn online_among(&self, user_ids: &[DbId]) -> Vec<DbId> {
        let online = self.online.read().await;
        user_ids
            .iter()
            .copied()
            .filter(|id| online.contains_key(id))
            .collect()
    }
}

impl Default for PresenceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_first_connection_comes_online() {
        let registry = PresenceRegistry::new();
        assert!(registry.add_connection(1, "conn-a").await);
        assert!(registry.is_online(1).await);
    }

    #[tokio::test]
    async fn test_second_connection_is_not_a_transition() {
        let registry = PresenceRegistry::new();
        assert!(registry.add_connection(1, "conn-a").await);
        assert!(!registry.add_connection(1, "conn-b").await);
    }

    #[tokio::test]
    async fn test_offline_only_after_last_disconnect() {
        let registry = PresenceRegistry::new();
        registry.add_connection(1, "conn-a").await;
        registry.add_connection(1, "conn-b").await;

        assert!(!registry.remove_connection(1, "conn-a").await);
        assert!(registry.is_online(1).await);

        assert!(registry.remove_connection(1, "conn-b").await);
        assert!(!registry.is_online(1).await);
    }

    #[tokio::test]
    async fn test_remove_unknown_connection_is_noop() {
        let registry = PresenceRegistry::new();
        assert!(!registry.remove_connection(99, "ghost").await);
    }

    #[tokio::test]
    async fn test_online_among_filters() {
        let registry = PresenceRegistry::new();
        registry.add_connection(1, "a").await;
        registry.add_connection(3, "b").await;

        let online = registry.online_among(&[1, 2, 3, 4]).await;
        assert_eq!(online, vec![1, 3]);
    }
}
