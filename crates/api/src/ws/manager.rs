use std::collections::{HashMap, HashSet};

use axum::body::Bytes;
use axum::extract::ws::Message;
use questline_core::types::{DbId, Timestamp};
use tokio::sync::{mpsc, RwLock};

use crate::ws::presence::PresenceRegistry;

/// Channel sender half for pushing messages to a WebSocket connection.
pub type WsSender = mpsc::UnboundedSender<Message>;

/// Room name for a user's personal channel (notifications, DMs metadata).
pub fn user_room(user_id: DbId) -> String {
    format!("user:{user_id}")
}

/// Room name for a squad channel.
pub fn squad_room(squad_id: DbId) -> String {
    format!("squad:{squad_id}")
}

/// Room name for a community channel.
pub fn community_room(community_id: DbId) -> String {
    format!("community:{community_id}")
}

/// Room name for a direct-message conversation channel.
pub fn conversation_room(conversation_id: DbId) -> String {
    format!("conversation:{conversation_id}")
}

/// Metadata for a single WebSocket connection.
pub struct WsConnection {
    /// Authenticated user ID. Connections are only registered after the
    /// handshake token has been validated.
    pub user_id: DbId,
    /// Channel sender for outbound messages to this connection.
    pub sender: WsSender,
    /// When this connection was established.
    pub connected_at: Timestamp,
}

/// Manages all active WebSocket connections, their room memberships, and
/// the presence registry.
///
/// Thread-safe via interior `RwLock`; designed to be wrapped in `Arc` and
/// shared across the application.
pub struct WsManager {
    connections: RwLock<HashMap<String, WsConnection>>,
    /// Room name -> set of connection IDs joined to it.
    rooms: RwLock<HashMap<String, HashSet<String>>>,
    presence: PresenceRegistry,
}

impl WsManager {
    /// Create a new, empty connection manager.
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
            rooms: RwLock::new(HashMap::new()),
            presence: PresenceRegistry::new(),
        }
    }

    /// The presence registry backing this manager.
    pub fn presence(&self) -> &PresenceRegistry {
        &self.presence
    }

    /// Register a new authenticated connection.
    ///
    /// Returns the receiver half of the message channel (so the caller can
    /// forward messages to the WebSocket sink) and whether the user just
    /// transitioned from offline to online.
    pub async fn add(
        &self,
        conn_id: String,
        user_id: DbId,
    ) -> (mpsc::UnboundedReceiver<Message>, bool) {
        let (tx, rx) = mpsc::unbounded_channel();
        let conn = WsConnection {
            user_id,
            sender: tx,
            connected_at: chrono::Utc::now(),
        };
        self.connections.write().await.insert(conn_id.clone(), conn);
        let came_online = self.presence.add_connection(user_id, &conn_id).await;
        (rx, came_online)
    }

    /// Remove a connection by its ID, leaving all of its rooms.
    ///
    /// Returns the connection's user ID and whether the user just went
    /// offline (this was their last connection), or `None` if the
    /// connection was unknown.
    pub async fn remove(&self, conn_id: &str) -> Option<(DbId, bool)> {
        let conn = self.connections.write().await.remove(conn_id)?;

        let mut rooms = self.rooms.write().await;
        rooms.retain(|_, members| {
            members.remove(conn_id);
            !members.is_empty()
        });
        drop(rooms);

        let went_offline = self.presence.remove_connection(conn.user_id, conn_id).await;
        Some((conn.user_id, went_offline))
    }

    /// Join a connection to a room.
    pub async fn join_room(&self, room: &str, conn_id: &str) {
        self.rooms
            .write()
            .await
            .entry(room.to_string())
            .or_default()
            .insert(conn_id.to_string());
    }

    /// Remove a connection from a room. Empty rooms are dropped.
    pub async fn leave_room(&self, room: &str, conn_id: &str) {
        let mut rooms = self.rooms.write().await;
        if let Some(members) = rooms.get_mut(room) {
            members.remove(conn_id);
            if members.is_empty() {
                rooms.remove(room);
            }
        }
    }

    /// Send a message to every connection joined to a room.
    ///
    /// Returns the number of connections the message was sent to.
    /// Connections whose send channels are closed are silently skipped
    /// (they will be cleaned up on their next receive loop iteration).
    pub async fn send_to_room(&self, room: &str, message: Message) -> usize {
        self.send_to_room_excluding(room, None, message).await
    }

    /// Send a message to a room, optionally skipping one connection
    /// (typically the sender's own socket for typing relays).
    pub async fn send_to_room_excluding(
        &self,
        room: &str,
        except_conn_id: Option<&str>,
        message: Message,
    ) -> usize {
        let rooms = self.rooms.read().await;
        let Some(members) = rooms.get(room) else {
            return 0;
        };
        let conns = self.connections.read().await;
        let mut count = 0;
        for conn_id in members {
            if Some(conn_id.as_str()) == except_conn_id {
                continue;
            }
            if let Some(conn) = conns.get(conn_id) {
                let _ = conn.sender.send(message.clone());
                count += 1;
            }
        }
        count
    }

    /// Send a message to one specific connection.
    pub async fn send_to_conn(&self, conn_id: &str, message: Message) {
        if let Some(conn) = self.connections.read().await.get(conn_id) {
            let _ = conn.sender.send(message);
        }
    }

    /// Send a message to all connections belonging to a specific user.
    ///
    /// Returns the number of connections the message was sent to.
    pub async fn send_to_user(&self, user_id: DbId, message: Message) -> usize {
        let conns = self.connections.read().await;
        let mut count = 0;
        for conn in conns.values() {
            if conn.user_id == user_id {
                let _ = conn.sender.send(message.clone());
                count += 1;
            }
        }
        count
    }

    /// Return the current number of active connections.
    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Send a Close frame to every connection, then clear all state.
    ///
    /// Used during graceful shutdown to notify all clients before the
    /// server stops accepting new connections.
    pub async fn shutdown_all(&self) {
        let mut conns = self.connections.write().await;
        let count = conns.len();
        for conn in conns.values() {
            let _ = conn.sender.send(Message::Close(None));
        }
        conns.clear();
        self.rooms.write().await.clear();
        tracing::info!(count, "Closed all WebSocket connections");
    }

    /// Send a Ping frame to every connected client.
    ///
    /// Used by the heartbeat task to keep connections alive and detect
    /// stale ones.
    pub async fn ping_all(&self) {
        let conns = self.connections.read().await;
        for conn in conns.values() {
            let _ = conn.sender.send(Message::Ping(Bytes::new()));
        }
    }
}

impl Default for WsManager {
    fn default() -> Self {
        Self::new()
    }
}
