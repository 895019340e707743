use std::sync::Arc;
use std::time::Duration;

use crate::ws::manager::WsManager;

/// Seconds between heartbeat pings.
const HEARTBEAT_INTERVAL_SECS: u64 = 30;

/// Spawn the background task that pings every connected socket on a fixed
/// interval so half-open connections get noticed and reaped.
///
/// Runs until aborted; shutdown keeps the handle and aborts it after the
/// sockets are closed.
pub fn start_heartbeat(ws_manager: Arc<WsManager>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(HEARTBEAT_INTERVAL_SECS));
        loop {
            interval.tick().await;
            let count = ws_manager.connection_count().await;
            if count > 0 {
                tracing::debug!(count, "WebSocket heartbeat ping");
            }
            ws_manager.ping_all().await;
        }
    })
}
