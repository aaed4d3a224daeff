//! Service-level error type.
//!
//! Every fallible session operation returns `SessionError`; the API layer
//! maps the categories onto HTTP statuses and `ERROR` frames.

use emberfall_domain::StateConflict;

use crate::infrastructure::ports::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The request was well-formed JSON but semantically invalid.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The caller is not allowed to act on this entity.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// A state-machine rule rejected the operation.
    #[error(transparent)]
    Conflict(#[from] StateConflict),

    /// A collaborator failed; the request may be retried.
    #[error("transient failure: {0}")]
    Transient(String),
}

impl SessionError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

impl From<StoreError> for SessionError {
    fn from(e: StoreError) -> Self {
        Self::Transient(e.to_string())
    }
}
