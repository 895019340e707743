//! XP ledger models.

use questline_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// Source kind for completion-sourced ledger entries.
pub const SOURCE_TASK_COMPLETION: &str = "task_completion";

/// A row from the append-only `xp_transactions` ledger.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct XpTransaction {
    pub id: DbId,
    pub user_id: DbId,
    pub amount: i64,
    pub source_kind: String,
    pub source_id: DbId,
    pub base_xp: i64,
    pub streak_bonus: i64,
    pub multiplier_bonus: i64,
    pub description: String,
    pub created_at: Timestamp,
}

/// Values for a new ledger entry. The user balance increment is applied in
/// the same transaction as the insert, never separately.
#[derive(Debug, Clone)]
pub struct CreateXpTransaction {
    pub user_id: DbId,
    pub amount: i64,
    pub source_kind: &'static str,
    pub source_id: DbId,
    pub base_xp: i64,
    pub streak_bonus: i64,
    pub multiplier_bonus: i64,
    pub description: String,
}
