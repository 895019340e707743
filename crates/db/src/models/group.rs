//! Community, squad, and membership models.
//!
//! Minimal surface for the core pipeline: the completion path needs the
//! community reward multiplier and the verification path needs moderation
//! role lookups.

use questline_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `communities` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Community {
    pub id: DbId,
    pub name: String,
    pub owner_id: DbId,
    /// Reward multiplier in `[1, 2]` applied to member task completions.
    pub xp_multiplier: f32,
    pub created_at: Timestamp,
}

/// A row from the `squads` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Squad {
    pub id: DbId,
    pub name: String,
    pub owner_id: DbId,
    pub created_at: Timestamp,
}

/// A row from the `memberships` table. Exactly one of `community_id` /
/// `squad_id` is set (`ck_memberships_one_target`).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Membership {
    pub id: DbId,
    pub user_id: DbId,
    pub community_id: Option<DbId>,
    pub squad_id: Option<DbId>,
    pub role: String,
    pub created_at: Timestamp,
}
