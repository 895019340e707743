//! Task entity models and DTOs.

use chrono::NaiveDate;
use questline_core::difficulty::Difficulty;
use questline_core::streak::TaskSnapshot;
use questline_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `tasks` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Task {
    pub id: DbId,
    pub user_id: DbId,
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub difficulty: String,
    pub frequency: String,
    pub visibility: String,
    pub requires_proof: bool,
    pub community_id: Option<DbId>,
    pub squad_id: Option<DbId>,
    pub current_streak: i32,
    pub longest_streak: i32,
    pub last_completed_on: Option<NaiveDate>,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Task {
    /// The slice of state the streak/XP engine consumes.
    pub fn snapshot(&self) -> TaskSnapshot {
        TaskSnapshot {
            difficulty: Difficulty::parse_or_default(&self.difficulty),
            current_streak: self.current_streak,
            longest_streak: self.longest_streak,
            last_completed_on: self.last_completed_on,
            requires_proof: self.requires_proof,
        }
    }
}

/// DTO for inserting a task.
#[derive(Debug, Deserialize)]
pub struct CreateTask {
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub difficulty: Option<String>,
    pub frequency: Option<String>,
    pub visibility: Option<String>,
    #[serde(default)]
    pub requires_proof: bool,
    pub community_id: Option<DbId>,
    pub squad_id: Option<DbId>,
}

/// DTO for patching a task (owner edits only; streak fields are engine-owned).
#[derive(Debug, Deserialize)]
pub struct UpdateTask {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub difficulty: Option<String>,
    pub frequency: Option<String>,
    pub visibility: Option<String>,
    pub requires_proof: Option<bool>,
    pub is_active: Option<bool>,
}
