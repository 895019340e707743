//! Event-to-realtime routing engine.
//!
//! Request handlers persist notification rows themselves (they know the
//! recipient); this router handles the fan-out that crosses users, i.e.
//! leaderboard updates pushed to every squad and community room a user's XP
//! change is visible in.

use std::sync::Arc;

use questline_core::types::DbId;
use questline_db::repositories::{MembershipRepo, XpTransactionRepo};
use questline_db::DbPool;
use questline_events::PlatformEvent;
use tokio::sync::broadcast;

use crate::services::completion::EVENT_TASK_COMPLETED;
use crate::services::verification::EVENT_VERIFICATION_APPROVED;
use crate::ws::protocol::ServerEvent;
use crate::ws::{community_room, squad_room, user_room, WsManager};

/// Routes platform events to WebSocket fan-out.
pub struct NotificationRouter {
    pool: DbPool,
    ws_manager: Arc<WsManager>,
}

impl NotificationRouter {
    pub fn new(pool: DbPool, ws_manager: Arc<WsManager>) -> Self {
        Self { pool, ws_manager }
    }

    /// Run the main routing loop.
    ///
    /// Subscribes to the event bus via `receiver` and processes each event.
    /// The loop exits when the channel is closed (i.e. the
    /// [`EventBus`](questline_events::EventBus) is dropped).
    pub async fn run(self, mut receiver: broadcast::Receiver<PlatformEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    if let Err(e) = self.route_event(&event).await {
                        tracing::error!(
                            error = %e,
                            event_type = %event.event_type,
                            "Failed to route event"
                        );
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Notification router lagged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, notification router shutting down");
                    break;
                }
            }
        }
    }

    /// Route a single event.
    async fn route_event(&self, event: &PlatformEvent) -> Result<(), sqlx::Error> {
        match event.event_type.as_str() {
            // XP was credited immediately: the actor's standing changed.
            EVENT_TASK_COMPLETED => {
                let credited = event
                    .payload
                    .get("credited")
                    .and_then(|v| v.as_bool())
                    .unwrap_or(false);
                if credited {
                    if let Some(user_id) = event.actor_user_id {
                        self.broadcast_leaderboard(user_id).await?;
                    }
                }
            }
            // Deferred XP landed on approval: the submitter's standing changed.
            EVENT_VERIFICATION_APPROVED => {
                if let Some(user_id) = event.recipient_user_id {
                    self.broadcast_leaderboard(user_id).await?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Push the user's new XP total to their own room and every group room
    /// whose leaderboard lists them.
    async fn broadcast_leaderboard(&self, user_id: DbId) -> Result<(), sqlx::Error> {
        let total_xp = XpTransactionRepo::total_for_user(&self.pool, user_id).await?;
        let message = ServerEvent::LeaderboardUpdate { user_id, total_xp }.to_message();

        self.ws_manager
            .send_to_room(&user_room(user_id), message.clone())
            .await;
        for squad_id in MembershipRepo::squad_ids_for_user(&self.pool, user_id).await? {
            self.ws_manager
                .send_to_room(&squad_room(squad_id), message.clone())
                .await;
        }
        for community_id in MembershipRepo::community_ids_for_user(&self.pool, user_id).await? {
            self.ws_manager
                .send_to_room(&community_room(community_id), message.clone())
                .await;
        }
        Ok(())
    }
}
