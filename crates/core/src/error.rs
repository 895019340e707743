use crate::types::DbId;

/// Domain error taxonomy shared across the workspace.
///
/// HTTP mapping lives in the API crate; this enum only carries the stable
/// machine-readable kinds.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// The task already has a completion within the current calendar day.
    #[error("Task {task_id} has already been completed today")]
    AlreadyCompleted { task_id: DbId },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// AI verification was requested but the entry's squad/community has no
    /// provider credential configured.
    #[error("No AI verifier is configured for this squad or community")]
    VerifierNotConfigured,

    /// AI verification was requested but the completion carries no proof.
    #[error("Completion has no proof attached")]
    MissingProof,

    #[error("Internal error: {0}")]
    Internal(String),
}
