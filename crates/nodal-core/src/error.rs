//! Errors raised by the domain model and its command layer.
//!
//! These are the *user-facing* failures: a rejected connection, a lookup of
//! an entity that no longer exists, a malformed library document. The editor
//! catches them at the interaction boundary and keeps going.

use crate::id::{Identifier, PortType};
use crate::model::EntityKind;

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// No live entity of this kind carries the identifier.
    #[error("{kind} {id} not found")]
    NotFound { kind: EntityKind, id: Identifier },

    /// The two ports cannot be connected inside this graph.
    #[error("cannot connect {source_path} to {target_path}: {reason}")]
    InvalidConnection {
        source_path: String,
        target_path: String,
        reason: String,
    },

    /// The target already has a connection in this graph and `force` was not set.
    #[error("{target_path} is already connected")]
    TargetOccupied { target_path: String },

    /// Disconnecting two ports that have no connection between them.
    #[error("{source_path} is not connected to {target_path}")]
    NotConnected {
        source_path: String,
        target_path: String,
    },

    #[error("port types differ: {source_type} -> {target_type}")]
    TypeMismatch {
        source_type: PortType,
        target_type: PortType,
    },

    /// A node handed to a graph-level command lives in another scope.
    #[error("{path} is not in graph {graph}")]
    NotInGraph { path: String, graph: String },

    /// Grouping needs at least one node.
    #[error("no nodes to group")]
    EmptySelection,

    /// A library document references something it does not define.
    #[error("invalid node document: {0}")]
    Document(String),

    #[error("library entry '{0}' not found")]
    UnknownLibraryEntry(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl ModelError {
    pub fn not_found(kind: EntityKind, id: Identifier) -> Self {
        ModelError::NotFound { kind, id }
    }
}
