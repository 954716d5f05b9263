//! Errors raised by the synchronization core.
//!
//! `Desync`, `NotFound` and `TypeMismatch` are programming errors: the
//! graphics mirror disagrees with the model, or a caller passed the wrong
//! kind of reference. They propagate to the caller untouched. Rejected user
//! commands arrive wrapped as `Model` and are the only variant the
//! interaction layer downgrades to a warning. `Config` is a malformed
//! editor configuration.

use nodal_core::{EntityKind, Identifier, ModelError};

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// The registry was asked to create a mirror that exists, or to remove
    /// one that does not.
    #[error("graphics {kind} {id} out of sync on {op}")]
    Desync {
        kind: EntityKind,
        id: Identifier,
        op: &'static str,
    },

    #[error("no graphics {kind} for {id}")]
    NotFound { kind: EntityKind, id: Identifier },

    #[error("expected {expected}, got {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("invalid editor config: {0}")]
    Config(#[source] serde_json::Error),
}

impl SyncError {
    pub fn is_desync(&self) -> bool {
        matches!(self, SyncError::Desync { .. })
    }
}
