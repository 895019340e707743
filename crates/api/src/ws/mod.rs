//! WebSocket infrastructure for real-time communication.
//!
//! Provides connection management, room membership, presence tracking,
//! the wire protocol, heartbeat monitoring, and the HTTP upgrade handler
//! used by Axum routes.

mod handler;
mod heartbeat;
pub mod manager;
pub mod presence;
pub mod protocol;

pub use handler::ws_handler;
pub use heartbeat::start_heartbeat;
pub use manager::{community_room, conversation_room, squad_room, user_room, WsManager};
pub use presence::PresenceRegistry;
