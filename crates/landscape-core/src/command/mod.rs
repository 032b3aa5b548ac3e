// ── Command API ──
//
// Every structural mutation flows through one `Command` enum. The store
// routes each variant to its primitive; the broadcast decision is taken
// once, after routing, from the `MutationContext`.

pub mod requests;

use crate::model::{EntityId, EntityKind, EntryId, RestoreKey};

pub use requests::{
    AddCommunicationRequest, CreateApplicationRequest, CreateEntityRequest, CutInsertRequest,
    DuplicateApplicationRequest, NodeRef, PasteRequest,
};

/// Who authored a mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationOrigin {
    /// This client's user. Successful mutations are broadcast.
    Local,
    /// Replayed from another participant. Never broadcast again.
    Remote,
}

/// Per-call flags threaded into every store entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MutationContext {
    pub origin: MutationOrigin,
    /// Inverse or redo of a logged change: the log is not touched.
    pub undo: bool,
}

impl MutationContext {
    pub const LOCAL: Self = Self {
        origin: MutationOrigin::Local,
        undo: false,
    };

    pub const REMOTE: Self = Self {
        origin: MutationOrigin::Remote,
        undo: false,
    };

    pub fn remote(undo: bool) -> Self {
        Self {
            origin: MutationOrigin::Remote,
            undo,
        }
    }

    pub fn local_undo() -> Self {
        Self {
            origin: MutationOrigin::Local,
            undo: true,
        }
    }

    pub fn is_local(self) -> bool {
        self.origin == MutationOrigin::Local
    }
}

/// All possible write operations against a landscape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    // ── Structure ────────────────────────────────────────────────────
    CreateApplication(CreateApplicationRequest),
    CreatePackage(CreateEntityRequest),
    CreateClass(CreateEntityRequest),
    Rename {
        kind: EntityKind,
        id: EntityId,
        new_name: String,
        entry_id: EntryId,
    },
    Delete {
        kind: EntityKind,
        id: EntityId,
        entry_id: EntryId,
    },
    Restore {
        kind: EntityKind,
        id: EntityId,
        /// Return the entity to the parent it was cut from.
        undo_cut: bool,
    },
    Paste(PasteRequest),
    CutInsert(CutInsertRequest),
    DuplicateApplication(DuplicateApplicationRequest),

    // ── Communication ────────────────────────────────────────────────
    AddCommunication(AddCommunicationRequest),
    RenameCommunication {
        id: EntityId,
        new_name: String,
        entry_id: EntryId,
    },
    DeleteCommunication {
        id: EntityId,
        entry_id: EntryId,
    },
    RestoreCommunication {
        id: EntityId,
    },

    // ── Changelog ────────────────────────────────────────────────────
    /// Drop entries from the visible log, stashing them under `key`.
    RemoveEntries {
        entry_ids: Vec<EntryId>,
        key: RestoreKey,
    },
    /// Re-insert the entries stashed under `key`.
    RestoreEntries {
        key: RestoreKey,
    },
}

impl Command {
    /// Short name used in log lines.
    pub fn name(&self) -> &'static str {
        match self {
            Self::CreateApplication(_) => "create_application",
            Self::CreatePackage(_) => "create_package",
            Self::CreateClass(_) => "create_class",
            Self::Rename { .. } => "rename",
            Self::Delete { .. } => "delete",
            Self::Restore { .. } => "restore",
            Self::Paste(_) => "paste",
            Self::CutInsert(_) => "cut_insert",
            Self::DuplicateApplication(_) => "duplicate_application",
            Self::AddCommunication(_) => "add_communication",
            Self::RenameCommunication { .. } => "rename_communication",
            Self::DeleteCommunication { .. } => "delete_communication",
            Self::RestoreCommunication { .. } => "restore_communication",
            Self::RemoveEntries { .. } => "remove_entries",
            Self::RestoreEntries { .. } => "restore_entries",
        }
    }

    /// The entity a structural command targets, if any.
    pub fn target(&self) -> Option<&EntityId> {
        match self {
            Self::CreateApplication(r) => Some(&r.id),
            Self::CreatePackage(r) | Self::CreateClass(r) => Some(&r.id),
            Self::Rename { id, .. }
            | Self::Delete { id, .. }
            | Self::Restore { id, .. }
            | Self::RenameCommunication { id, .. }
            | Self::DeleteCommunication { id, .. }
            | Self::RestoreCommunication { id } => Some(id),
            Self::Paste(r) => Some(&r.clipped_id),
            Self::CutInsert(r) => Some(&r.clipped_id),
            Self::DuplicateApplication(r) => Some(&r.app_id),
            Self::AddCommunication(_)
            | Self::RemoveEntries { .. }
            | Self::RestoreEntries { .. } => None,
        }
    }
}

/// Result of a successfully applied command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandResult {
    Ok,
    /// A new entity was attached; callers chain dependent edits on it.
    Created(EntityId),
    /// Nothing to do: already applied, or the state already matches.
    Unchanged,
}

impl CommandResult {
    pub fn created_id(&self) -> Option<&EntityId> {
        match self {
            Self::Created(id) => Some(id),
            _ => None,
        }
    }

    pub fn changed(&self) -> bool {
        !matches!(self, Self::Unchanged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contexts() {
        assert!(MutationContext::LOCAL.is_local());
        assert!(!MutationContext::remote(true).is_local());
        assert!(MutationContext::local_undo().undo);
    }

    #[test]
    fn unchanged_is_not_a_change() {
        assert!(!CommandResult::Unchanged.changed());
        assert!(CommandResult::Ok.changed());
        let created = CommandResult::Created(EntityId::from("p"));
        assert_eq!(created.created_id(), Some(&EntityId::from("p")));
    }

    #[test]
    fn application_node_is_derived_from_name() {
        let a = NodeRef::for_new_application("shop");
        let b = NodeRef::for_new_application("shop");
        assert_eq!(a, b);
        assert_eq!(a.host_name, "shop-host");
    }
}
