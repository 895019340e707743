//! Verification state machine types and the moderation worklist target.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::DbId;

/// Default auto-approval threshold when a verifier config does not set one.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.8;

/// Reason stored when the external judge is unreachable or misbehaves.
pub const AI_FAILURE_REASON: &str = "AI verification failed";

/// Status of a task completion.
///
/// `Pending` transitions exactly once to `Verified` or `Rejected`;
/// `AutoVerified` is terminal from creation (no proof was required).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    Pending,
    AutoVerified,
    Verified,
    Rejected,
}

impl VerificationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            VerificationStatus::Pending => "pending",
            VerificationStatus::AutoVerified => "auto_verified",
            VerificationStatus::Verified => "verified",
            VerificationStatus::Rejected => "rejected",
        }
    }

    pub fn parse(value: &str) -> Result<Self, CoreError> {
        match value {
            "pending" => Ok(VerificationStatus::Pending),
            "auto_verified" => Ok(VerificationStatus::AutoVerified),
            "verified" => Ok(VerificationStatus::Verified),
            "rejected" => Ok(VerificationStatus::Rejected),
            other => Err(CoreError::Validation(format!(
                "Unknown verification status '{other}'"
            ))),
        }
    }
}

/// The squad or community whose moderators own a verification queue entry.
///
/// Modeled as a tagged variant so both-set and both-null states cannot be
/// represented; the storage layer keeps two nullable columns under a CHECK
/// constraint and converts at the edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum VerificationTarget {
    Squad(DbId),
    Community(DbId),
}

impl VerificationTarget {
    /// Reconstruct from the two nullable storage columns.
    pub fn from_columns(
        squad_id: Option<DbId>,
        community_id: Option<DbId>,
    ) -> Result<Self, CoreError> {
        match (squad_id, community_id) {
            (Some(id), None) => Ok(VerificationTarget::Squad(id)),
            (None, Some(id)) => Ok(VerificationTarget::Community(id)),
            (None, None) => Err(CoreError::Internal(
                "Verification target has neither squad nor community".into(),
            )),
            (Some(_), Some(_)) => Err(CoreError::Internal(
                "Verification target has both squad and community".into(),
            )),
        }
    }

    /// Split back into the two nullable storage columns.
    pub fn into_columns(self) -> (Option<DbId>, Option<DbId>) {
        match self {
            VerificationTarget::Squad(id) => (Some(id), None),
            VerificationTarget::Community(id) => (None, Some(id)),
        }
    }
}

/// Confidence judgement returned by an AI proof verifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Judgement {
    /// Confidence that the proof matches the task, in `[0, 1]`.
    pub confidence: f32,
    pub reason: String,
}

impl Judgement {
    /// The degraded judgement used whenever the external judge fails: zero
    /// confidence, so the entry stays pending for a human.
    pub fn failed() -> Self {
        Self {
            confidence: 0.0,
            reason: AI_FAILURE_REASON.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;

    #[test]
    fn status_round_trips() {
        for status in [
            VerificationStatus::Pending,
            VerificationStatus::AutoVerified,
            VerificationStatus::Verified,
            VerificationStatus::Rejected,
        ] {
            assert_eq!(VerificationStatus::parse(status.as_str()).unwrap(), status);
        }
        assert!(VerificationStatus::parse("approved").is_err());
    }

    #[test]
    fn target_requires_exactly_one_side() {
        assert_eq!(
            VerificationTarget::from_columns(Some(3), None).unwrap(),
            VerificationTarget::Squad(3)
        );
        assert_eq!(
            VerificationTarget::from_columns(None, Some(9)).unwrap(),
            VerificationTarget::Community(9)
        );
        assert!(matches!(
            VerificationTarget::from_columns(None, None),
            Err(CoreError::Internal(_))
        ));
        assert!(matches!(
            VerificationTarget::from_columns(Some(1), Some(2)),
            Err(CoreError::Internal(_))
        ));
    }

    #[test]
    fn failed_judgement_has_zero_confidence() {
        let judgement = Judgement::failed();
        assert_eq!(judgement.confidence, 0.0);
        assert_eq!(judgement.reason, AI_FAILURE_REASON);
    }
}
