//! Repository for the `verifier_configs` table.

use questline_core::types::DbId;
use questline_core::verification::VerificationTarget;
use sqlx::PgPool;

use crate::models::verification::VerifierConfig;

/// Column list for `verifier_configs` queries.
const COLUMNS: &str = "id, squad_id, community_id, provider, model, api_key_ciphertext, \
     custom_prompt, confidence_threshold, created_at";

/// Provides AI verifier configuration per squad/community.
pub struct VerifierConfigRepo;

impl VerifierConfigRepo {
    /// Insert a config for a target. The API key must already be sealed.
    pub async fn create(
        pool: &PgPool,
        target: VerificationTarget,
        provider: &str,
        model: &str,
        api_key_ciphertext: &[u8],
        custom_prompt: Option<&str>,
        confidence_threshold: f32,
    ) -> Result<VerifierConfig, sqlx::Error> {
        let (squad_id, community_id) = target.into_columns();
        let query = format!(
            "INSERT INTO verifier_configs \
                 (squad_id, community_id, provider, model, api_key_ciphertext, \
                  custom_prompt, confidence_threshold) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, VerifierConfig>(&query)
            .bind(squad_id)
            .bind(community_id)
            .bind(provider)
            .bind(model)
            .bind(api_key_ciphertext)
            .bind(custom_prompt)
            .bind(confidence_threshold)
            .fetch_one(pool)
            .await
    }

    /// The config for a squad or community, if one is set up.
    pub async fn find_for_target(
        pool: &PgPool,
        target: VerificationTarget,
    ) -> Result<Option<VerifierConfig>, sqlx::Error> {
        let (squad_id, community_id) = target.into_columns();
        let query = format!(
            "SELECT {COLUMNS} FROM verifier_configs \
             WHERE (squad_id = $1 AND $1 IS NOT NULL) \
                OR (community_id = $2 AND $2 IS NOT NULL)"
        );
        sqlx::query_as::<_, VerifierConfig>(&query)
            .bind(squad_id)
            .bind(community_id)
            .fetch_optional(pool)
            .await
    }
}
