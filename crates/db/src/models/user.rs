//! User entity models and DTOs.

use questline_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `users` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: DbId,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub total_xp: i64,
    /// Denormalized presence status: `offline`, `online`, or `busy`.
    pub status: String,
    pub last_seen_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

/// DTO for inserting a user.
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

/// Public profile shape returned by the API (never exposes the hash).
#[derive(Debug, Serialize, Deserialize)]
pub struct PublicUser {
    pub id: DbId,
    pub username: String,
    pub email: String,
    pub total_xp: i64,
    pub status: String,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            total_xp: user.total_xp,
            status: user.status,
        }
    }
}
