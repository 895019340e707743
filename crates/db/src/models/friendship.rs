//! Friendship rows; only accepted pairs feed presence fan-out.

use questline_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// Friendship status value for accepted pairs.
pub const FRIENDSHIP_ACCEPTED: &str = "accepted";

/// A row from the `friendships` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Friendship {
    pub id: DbId,
    pub user_id: DbId,
    pub friend_id: DbId,
    pub status: String,
    pub created_at: Timestamp,
}
