use thiserror::Error;

use tether_core::{StoreError, ValidationError};

/// Errors surfaced by state operations.
///
/// Every transaction abort is classified into exactly one of these kinds;
/// retry policy is left to the caller.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StateError {
    #[error("{kind} {id:?} already exists")]
    AlreadyExists { kind: &'static str, id: String },

    #[error("{kind} {id:?} not found")]
    ReferenceNotFound { kind: &'static str, id: String },

    #[error("provider id {0:?} not unique")]
    ProviderIdNotUnique(String),

    #[error("{kind} {id:?} is not alive")]
    NotAlive { kind: &'static str, id: String },

    #[error("{kind} {id:?} not found or not dead")]
    NotDeadOrNotFound { kind: &'static str, id: String },

    #[error("{kind} {id:?} not found")]
    NotFound { kind: &'static str, id: String },

    #[error("state changed concurrently: {0}")]
    Conflict(String),

    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

impl StateError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StateError::NotFound { .. })
    }

    /// Wrap a store failure that is not an abort.
    pub fn unavailable(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(msg) | StoreError::Codec(msg) => StateError::StoreUnavailable(msg),
            other => StateError::StoreUnavailable(other.to_string()),
        }
    }

    /// Whether re-reading and trying again as a fresh operation may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            StateError::Conflict(_) | StateError::StoreUnavailable(_)
        )
    }
}

impl From<StoreError> for StateError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Aborted => StateError::Conflict("transaction aborted".to_string()),
            StoreError::NotFound { collection, id } => StateError::NotFound {
                kind: "document",
                id: format!("{}/{}", collection, id),
            },
            StoreError::Unavailable(msg) | StoreError::Codec(msg) => {
                StateError::StoreUnavailable(msg)
            }
        }
    }
}
