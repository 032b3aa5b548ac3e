// ── Undo / redo ──
//
// Undo applies inverse commands newest-first and stashes the undone
// entries; redo replays the forward commands oldest-first and puts the
// entries back. Both go through `execute` as local undo mutations, so
// peers see the same inverse commands followed by one changelog message.

use tracing::{info, warn};

use super::landscape_store::LandscapeStore;
use crate::changelog::{Change, ChangeLogEntry};
use crate::command::{Command, CommandResult, CutInsertRequest, MutationContext};
use crate::error::CoreError;
use crate::model::{EntityKind, EntryId, RestoreKey};

impl LandscapeStore {
    /// Undo `entry_id`, together with its create-bundle if it has one.
    ///
    /// Members that can no longer be inverted (already undone elsewhere,
    /// entity gone) are skipped. Returns the key to redo with.
    pub fn undo(&mut self, entry_id: EntryId) -> Result<RestoreKey, CoreError> {
        let entries = match self.changelog.create_bundle(entry_id) {
            Some(bundle) => bundle,
            None => vec![
                self.changelog
                    .get(entry_id)
                    .cloned()
                    .ok_or(CoreError::EntryNotFound { id: entry_id })?,
            ],
        };

        for entry in entries.iter().rev() {
            let inverse = inverse_of(entry);
            if let Err(err) = self.execute(inverse, MutationContext::local_undo()) {
                warn!(entry = %entry.id, error = %err, "skipping entry that cannot be undone");
            }
        }

        let key = RestoreKey::fresh();
        let entry_ids = entries.iter().map(|e| e.id).collect();
        self.execute(Command::RemoveEntries { entry_ids, key }, MutationContext::LOCAL)?;
        info!(%key, entries = entries.len(), "undone");
        Ok(key)
    }

    /// Undo the most recent live entry.
    pub fn undo_last(&mut self) -> Result<Option<RestoreKey>, CoreError> {
        match self.changelog.last().map(|e| e.id) {
            Some(id) => self.undo(id).map(Some),
            None => Ok(None),
        }
    }

    /// Re-apply the entries stashed under `key`.
    pub fn redo(&mut self, key: RestoreKey) -> Result<(), CoreError> {
        let mut entries = self
            .changelog
            .stash(key)
            .ok_or(CoreError::StashNotFound { key })?
            .to_vec();
        entries.sort_by_key(|e| e.seq);

        for entry in &entries {
            let forward = forward_of(entry);
            if let Err(err) = self.execute(forward, MutationContext::local_undo()) {
                warn!(entry = %entry.id, error = %err, "skipping entry that cannot be redone");
            }
        }
        self.execute(Command::RestoreEntries { key }, MutationContext::LOCAL)?;
        info!(%key, entries = entries.len(), "redone");
        Ok(())
    }

    /// Redo the most recent undo.
    pub fn redo_last(&mut self) -> Result<bool, CoreError> {
        let key = self.changelog.stash_keys().next();
        match key {
            Some(key) => self.redo(key).map(|()| true),
            None => Ok(false),
        }
    }

    /// Drop the whole log, live and stashed, and physically remove the
    /// tombstones it referenced.
    pub fn clear_changelog(&mut self) {
        let discarded = self.changelog.clear();
        self.purge_discarded(&discarded);
    }

    // ── Changelog commands ───────────────────────────────────────────

    pub(super) fn remove_entries(&mut self, ids: &[EntryId], key: RestoreKey) -> CommandResult {
        let (removed, evicted) = self.changelog.remove_entries(ids, key);
        self.purge_discarded(&evicted);
        if removed.is_empty() {
            CommandResult::Unchanged
        } else {
            CommandResult::Ok
        }
    }

    pub(super) fn restore_entries(&mut self, key: RestoreKey) -> Result<CommandResult, CoreError> {
        self.changelog
            .restore_entries(key)
            .map(|_| CommandResult::Ok)
            .ok_or(CoreError::StashNotFound { key })
    }

    /// Purge entities whose only record was in `discarded` and that are
    /// tombstoned themselves.
    fn purge_discarded(&mut self, discarded: &[ChangeLogEntry]) {
        for entry in discarded {
            let id = &entry.entity_id;
            if self.landscape.is_tombstoned(id) && !self.changelog.mentions(id) {
                self.landscape.purge(id);
            }
        }
    }
}

/// The command that reverses `entry`.
fn inverse_of(entry: &ChangeLogEntry) -> Command {
    let id = entry.entity_id.clone();
    let communication = entry.entity_type == EntityKind::Communication;
    match &entry.change {
        Change::Create { .. } if communication => Command::DeleteCommunication {
            id,
            entry_id: EntryId::fresh(),
        },
        Change::Create { .. } => Command::Delete {
            kind: entry.entity_type,
            id,
            entry_id: EntryId::fresh(),
        },
        Change::Rename { original_name, .. } if communication => Command::RenameCommunication {
            id,
            new_name: original_name.clone(),
            entry_id: EntryId::fresh(),
        },
        Change::Rename { original_name, .. } => Command::Rename {
            kind: entry.entity_type,
            id,
            new_name: original_name.clone(),
            entry_id: EntryId::fresh(),
        },
        Change::Delete { .. } if communication => Command::RestoreCommunication { id },
        Change::Delete { .. } => Command::Restore {
            kind: entry.entity_type,
            id,
            undo_cut: false,
        },
        Change::CutInsert { .. } => Command::Restore {
            kind: entry.entity_type,
            id,
            undo_cut: true,
        },
    }
}

/// The command that re-applies `entry` after it was undone.
fn forward_of(entry: &ChangeLogEntry) -> Command {
    let id = entry.entity_id.clone();
    let communication = entry.entity_type == EntityKind::Communication;
    match &entry.change {
        Change::Create { .. } if communication => Command::RestoreCommunication { id },
        Change::Create { .. } => Command::Restore {
            kind: entry.entity_type,
            id,
            undo_cut: false,
        },
        Change::Rename { new_name, .. } if communication => Command::RenameCommunication {
            id,
            new_name: new_name.clone(),
            entry_id: entry.id,
        },
        Change::Rename { new_name, .. } => Command::Rename {
            kind: entry.entity_type,
            id,
            new_name: new_name.clone(),
            entry_id: entry.id,
        },
        Change::Delete { .. } if communication => Command::DeleteCommunication {
            id,
            entry_id: entry.id,
        },
        Change::Delete { .. } => Command::Delete {
            kind: entry.entity_type,
            id,
            entry_id: entry.id,
        },
        Change::CutInsert { destination_id, .. } => Command::CutInsert(CutInsertRequest {
            kind: entry.entity_type,
            clipped_id: id,
            destination_id: destination_id.clone(),
            entry_id: entry.id,
        }),
    }
}
