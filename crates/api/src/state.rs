use std::sync::Arc;

use questline_core::secrets::CredentialCipher;

use crate::config::ServerConfig;
use crate::ws::WsManager;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: questline_db::DbPool,
    /// Server configuration (day boundary policy, JWT, timeouts).
    pub config: Arc<ServerConfig>,
    /// WebSocket connection manager: presence registry + room membership.
    pub ws_manager: Arc<WsManager>,
    /// Centralized event bus for publishing platform events.
    pub event_bus: Arc<questline_events::EventBus>,
    /// Cipher for AI-provider credentials at rest.
    pub cipher: Arc<CredentialCipher>,
    /// Shared HTTP client for outbound AI judgement calls.
    pub http_client: reqwest::Client,
}
