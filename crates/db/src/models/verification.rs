//! Verification queue and verifier-config models.

use questline_core::error::CoreError;
use questline_core::types::{DbId, Timestamp};
use questline_core::verification::VerificationTarget;
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `verification_queue` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct VerificationEntry {
    pub id: DbId,
    pub completion_id: DbId,
    pub squad_id: Option<DbId>,
    pub community_id: Option<DbId>,
    pub status: String,
    pub priority: i32,
    pub created_at: Timestamp,
    pub resolved_at: Option<Timestamp>,
}

impl VerificationEntry {
    /// The squad-XOR-community target, enforced by `ck_verification_queue_one_target`.
    pub fn target(&self) -> Result<VerificationTarget, CoreError> {
        VerificationTarget::from_columns(self.squad_id, self.community_id)
    }
}

/// A pending entry joined with its completion and task context, as listed
/// for moderators.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct QueueListing {
    pub id: DbId,
    pub completion_id: DbId,
    pub squad_id: Option<DbId>,
    pub community_id: Option<DbId>,
    pub priority: i32,
    pub created_at: Timestamp,
    pub task_id: DbId,
    pub task_title: String,
    pub submitter_id: DbId,
    pub submitter_username: String,
    pub proof_url: Option<String>,
    pub proof_type: Option<String>,
}

/// A row from the `verifier_configs` table.
#[derive(Debug, Clone, FromRow)]
pub struct VerifierConfig {
    pub id: DbId,
    pub squad_id: Option<DbId>,
    pub community_id: Option<DbId>,
    pub provider: String,
    pub model: String,
    /// AES-256-GCM sealed API key; decrypted transiently for each call.
    pub api_key_ciphertext: Vec<u8>,
    pub custom_prompt: Option<String>,
    pub confidence_threshold: f32,
    pub created_at: Timestamp,
}
