// ── Core error types ──
//
// Every failure a store can run into while applying a mutation. The
// stores log and return these; the dispatcher logs and drops them, so
// none of them ever ends a collaborative session.

use thiserror::Error;

use crate::model::{EntityId, EntityKind, EntryId, RestoreKey};

/// Unified error type for the core crate.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    // ── Lookup misses ────────────────────────────────────────────────
    /// The referenced entity is absent or tombstoned. Usually a remote
    /// message racing a local delete.
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: EntityKind,
        identifier: EntityId,
    },

    #[error("Changelog entry not found: {id}")]
    EntryNotFound { id: EntryId },

    #[error("No undone changes stored under key {key}")]
    StashNotFound { key: RestoreKey },

    // ── Structural violations ────────────────────────────────────────
    #[error("Cannot place {clipped} inside itself or its descendant {destination}")]
    CyclicMove {
        clipped: EntityId,
        destination: EntityId,
    },

    #[error("Destination {destination} no longer exists")]
    DestinationGone { destination: EntityId },

    #[error("A {clipped} cannot be placed inside a {destination}")]
    InvalidDestination {
        clipped: EntityKind,
        destination: EntityKind,
    },

    #[error("Operation not supported: {operation} on {entity_type}")]
    Unsupported {
        operation: String,
        entity_type: EntityKind,
    },

    // ── Message errors ───────────────────────────────────────────────
    #[error("Invalid message: {message}")]
    InvalidMessage { message: String },
}

impl CoreError {
    pub(crate) fn not_found(entity_type: EntityKind, identifier: &EntityId) -> Self {
        Self::NotFound {
            entity_type,
            identifier: identifier.clone(),
        }
    }

    /// Lookup misses are the accepted eventual-consistency gap; everything
    /// else points at a rejected edit.
    pub fn is_lookup_miss(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. } | Self::EntryNotFound { .. } | Self::StashNotFound { .. }
        )
    }
}
