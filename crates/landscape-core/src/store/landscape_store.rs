// ── Landscape graph store ──
//
// Owns the arena and its changelog. Every mutation enters through
// `execute`, which routes the command, publishes the change, and (for
// local mutations only) hands the outbound message to the sender.

use std::sync::Arc;

use tracing::{debug, warn};

use super::events::{EventHub, WorkspaceEvent};
use crate::changelog::{Change, ChangeLogEntry, Changelog, DEFAULT_MAX_STASHES};
use crate::command::{
    AddCommunicationRequest, Command, CommandResult, CreateApplicationRequest,
    CreateEntityRequest, CutInsertRequest, DuplicateApplicationRequest, MutationContext, NodeRef,
    PasteRequest,
};
use crate::error::CoreError;
use crate::message::CollabMessage;
use crate::model::{
    Application, Class, ClassCommunication, EntityId, EntityKind, EntryId, Landscape, Package,
};
use crate::sender::{MessageSender, OfflineSender};

/// Single source of truth for one landscape: the structural tree, the
/// communication edges, and the log of edits made to them.
pub struct LandscapeStore {
    pub(super) landscape: Landscape,
    pub(super) changelog: Changelog,
    sender: Arc<dyn MessageSender>,
    events: EventHub,
}

impl std::fmt::Debug for LandscapeStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LandscapeStore")
            .field("token", &self.landscape.token)
            .field("entries", &self.changelog.len())
            .finish_non_exhaustive()
    }
}

impl LandscapeStore {
    pub fn new(landscape: Landscape, sender: Arc<dyn MessageSender>, events: EventHub) -> Self {
        Self::with_max_stashes(landscape, sender, events, DEFAULT_MAX_STASHES)
    }

    pub fn with_max_stashes(
        landscape: Landscape,
        sender: Arc<dyn MessageSender>,
        events: EventHub,
        max_stashes: usize,
    ) -> Self {
        Self {
            landscape,
            changelog: Changelog::new(max_stashes),
            sender,
            events,
        }
    }

    /// Store that never broadcasts, for single-user use and tests.
    pub fn offline(landscape: Landscape) -> Self {
        Self::new(landscape, Arc::new(OfflineSender), EventHub::default())
    }

    // ── Read access ──────────────────────────────────────────────────

    pub fn landscape(&self) -> &Landscape {
        &self.landscape
    }

    pub fn changelog(&self) -> &Changelog {
        &self.changelog
    }

    pub fn events(&self) -> &EventHub {
        &self.events
    }

    pub fn application(&self, id: &EntityId) -> Option<&Application> {
        self.landscape.live_application(id)
    }

    pub fn package(&self, id: &EntityId) -> Option<&Package> {
        self.landscape.live_package(id)
    }

    pub fn class(&self, id: &EntityId) -> Option<&Class> {
        self.landscape.live_class(id)
    }

    pub fn communication(&self, id: &EntityId) -> Option<&ClassCommunication> {
        self.landscape.live_communication(id)
    }

    // ── Command routing ──────────────────────────────────────────────

    /// Apply `command` and, when it changed state and was authored
    /// locally, broadcast it.
    pub fn execute(
        &mut self,
        command: Command,
        ctx: MutationContext,
    ) -> Result<CommandResult, CoreError> {
        let result = match self.route(&command, ctx) {
            Ok(result) => result,
            Err(err) => {
                if err.is_lookup_miss() {
                    warn!(command = command.name(), error = %err, "lookup miss, ignoring");
                } else {
                    warn!(command = command.name(), error = %err, "mutation rejected");
                }
                return Err(err);
            }
        };

        if !result.changed() {
            debug!(command = command.name(), origin = ?ctx.origin, "already applied");
            return Ok(result);
        }

        self.events.publish(WorkspaceEvent::Mutated {
            command: command.name(),
            target: command.target().cloned(),
            origin: ctx.origin,
        });
        if ctx.is_local() {
            if let Some(message) = CollabMessage::from_command(&command, ctx.undo) {
                self.sender.send(message);
            }
        }
        debug!(command = command.name(), origin = ?ctx.origin, undo = ctx.undo, "applied");
        Ok(result)
    }

    fn route(
        &mut self,
        command: &Command,
        ctx: MutationContext,
    ) -> Result<CommandResult, CoreError> {
        match command {
            Command::CreateApplication(req) => Ok(self.create_application(req, ctx)),
            Command::CreatePackage(req) => self.create_entity(EntityKind::Package, req, ctx),
            Command::CreateClass(req) => self.create_entity(EntityKind::Class, req, ctx),
            Command::Rename {
                kind,
                id,
                new_name,
                entry_id,
            } => self.rename(*kind, id, new_name, *entry_id, ctx),
            Command::Delete { kind, id, entry_id } => self.delete(*kind, id, *entry_id, ctx),
            Command::Restore { kind, id, undo_cut } => self.restore(*kind, id, *undo_cut),
            Command::Paste(req) => self.apply_paste(req, ctx),
            Command::CutInsert(req) => self.apply_cut_insert(req, ctx),
            Command::DuplicateApplication(req) => self.apply_duplicate_application(req, ctx),
            Command::AddCommunication(req) => self.apply_add_communication(req, ctx),
            Command::RenameCommunication {
                id,
                new_name,
                entry_id,
            } => self.rename_communication(id, new_name, *entry_id, ctx),
            Command::DeleteCommunication { id, entry_id } => {
                self.delete_communication(id, *entry_id, ctx)
            }
            Command::RestoreCommunication { id } => self.restore_communication(id),
            Command::RemoveEntries { entry_ids, key } => Ok(self.remove_entries(entry_ids, *key)),
            Command::RestoreEntries { key } => self.restore_entries(*key),
        }
    }

    // ── Changelog recording ──────────────────────────────────────────

    /// Build an entry about `entity_id`, attributing it to the entity's
    /// current application.
    pub(super) fn entry(
        &self,
        id: EntryId,
        kind: EntityKind,
        entity_id: &EntityId,
        change: Change,
    ) -> ChangeLogEntry {
        let app_id = match kind {
            EntityKind::Communication => self
                .landscape
                .communication(entity_id)
                .map(|c| c.source_app_id.clone()),
            _ => self.landscape.app_of(entity_id).cloned(),
        };
        let app = app_id.and_then(|app_id| {
            let name = self.landscape.application(&app_id)?.name.clone();
            Some((app_id, name))
        });
        ChangeLogEntry::new(id, kind, entity_id.clone(), app, change)
    }

    pub(super) fn record(&mut self, entry: ChangeLogEntry) {
        self.changelog.append(entry);
    }

    /// Log a rename, folding it into the entity's latest CREATE or
    /// RENAME entry when there is one.
    pub(super) fn record_rename(
        &mut self,
        kind: EntityKind,
        id: &EntityId,
        original: String,
        new_name: &str,
        entry_id: EntryId,
    ) {
        let mut revert_of = None;
        if let Some(latest) = self.changelog.latest_for_mut(id) {
            match &mut latest.change {
                Change::Create { name, .. } => {
                    new_name.clone_into(name);
                    return;
                }
                Change::Rename {
                    original_name,
                    new_name: renamed,
                } => {
                    if original_name == new_name {
                        revert_of = Some(latest.id);
                    } else {
                        new_name.clone_into(renamed);
                        return;
                    }
                }
                Change::Delete { .. } | Change::CutInsert { .. } => {}
            }
        }
        if let Some(reverted) = revert_of {
            self.changelog.drop_entry(reverted);
            return;
        }
        let entry = self.entry(
            entry_id,
            kind,
            id,
            Change::Rename {
                original_name: original,
                new_name: new_name.to_owned(),
            },
        );
        self.record(entry);
    }

    // ── Local convenience API ────────────────────────────────────────
    //
    // Mint ids, default names and entry ids, then execute as a local
    // mutation.

    /// Create an application on the first node in ingestion order, or
    /// on a fresh node when the landscape has none. Use
    /// [`add_application_on`](Self::add_application_on) to pick the node.
    pub fn add_application(
        &mut self,
        name: Option<&str>,
        language: &str,
    ) -> Result<EntityId, CoreError> {
        let node_id = self.landscape.nodes().next().map(|n| n.id.clone());
        self.add_application_on(node_id.as_ref(), name, language)
    }

    /// Create an application on `node_id`, or on a fresh node for `None`.
    pub fn add_application_on(
        &mut self,
        node_id: Option<&EntityId>,
        name: Option<&str>,
        language: &str,
    ) -> Result<EntityId, CoreError> {
        let name = name.map_or_else(
            || self.landscape.next_application_name("newApplication"),
            str::to_owned,
        );
        let node = match node_id {
            Some(node_id) => {
                let n = self
                    .landscape
                    .node(node_id)
                    .ok_or_else(|| CoreError::not_found(EntityKind::Node, node_id))?;
                NodeRef {
                    id: n.id.clone(),
                    host_name: n.host_name.clone(),
                    ip_address: n.ip_address.clone(),
                }
            }
            None => NodeRef::for_new_application(&name),
        };
        let id = EntityId::derive([node.id.as_str(), name.as_str()]);
        let request = CreateApplicationRequest {
            id: id.clone(),
            name,
            language: language.to_owned(),
            node,
            entry_id: EntryId::fresh(),
        };
        self.created(Command::CreateApplication(request), id)
    }

    pub fn add_package(&mut self, parent_id: &EntityId) -> Result<EntityId, CoreError> {
        let id = EntityId::fresh();
        let request = CreateEntityRequest {
            id: id.clone(),
            parent_id: parent_id.clone(),
            name: self.landscape.next_default_name(parent_id, "newPackage"),
            entry_id: EntryId::fresh(),
        };
        self.created(Command::CreatePackage(request), id)
    }

    pub fn add_class(&mut self, parent_id: &EntityId) -> Result<EntityId, CoreError> {
        let id = EntityId::fresh();
        let request = CreateEntityRequest {
            id: id.clone(),
            parent_id: parent_id.clone(),
            name: self.landscape.next_default_name(parent_id, "newClass"),
            entry_id: EntryId::fresh(),
        };
        self.created(Command::CreateClass(request), id)
    }

    pub fn rename_entity(
        &mut self,
        kind: EntityKind,
        id: &EntityId,
        new_name: &str,
    ) -> Result<CommandResult, CoreError> {
        let command = if kind == EntityKind::Communication {
            Command::RenameCommunication {
                id: id.clone(),
                new_name: new_name.to_owned(),
                entry_id: EntryId::fresh(),
            }
        } else {
            Command::Rename {
                kind,
                id: id.clone(),
                new_name: new_name.to_owned(),
                entry_id: EntryId::fresh(),
            }
        };
        self.execute(command, MutationContext::LOCAL)
    }

    pub fn delete_entity(
        &mut self,
        kind: EntityKind,
        id: &EntityId,
    ) -> Result<CommandResult, CoreError> {
        let command = if kind == EntityKind::Communication {
            Command::DeleteCommunication {
                id: id.clone(),
                entry_id: EntryId::fresh(),
            }
        } else {
            Command::Delete {
                kind,
                id: id.clone(),
                entry_id: EntryId::fresh(),
            }
        };
        self.execute(command, MutationContext::LOCAL)
    }

    pub fn restore_entity(
        &mut self,
        kind: EntityKind,
        id: &EntityId,
        undo_cut: bool,
    ) -> Result<CommandResult, CoreError> {
        let command = if kind == EntityKind::Communication {
            Command::RestoreCommunication { id: id.clone() }
        } else {
            Command::Restore {
                kind,
                id: id.clone(),
                undo_cut,
            }
        };
        self.execute(command, MutationContext::LOCAL)
    }

    /// Copy `clipped_id` under `destination_id`. Returns the copy's id.
    pub fn paste(
        &mut self,
        kind: EntityKind,
        clipped_id: &EntityId,
        destination_id: &EntityId,
    ) -> Result<CommandResult, CoreError> {
        let base = self
            .landscape
            .name_of(clipped_id)
            .ok_or_else(|| CoreError::not_found(kind, clipped_id))?;
        let request = PasteRequest {
            kind,
            clipped_id: clipped_id.clone(),
            destination_id: destination_id.clone(),
            name: self.landscape.copy_name(destination_id, base, false),
            entry_id: EntryId::fresh(),
        };
        self.execute(Command::Paste(request), MutationContext::LOCAL)
    }

    pub fn cut_insert(
        &mut self,
        kind: EntityKind,
        clipped_id: &EntityId,
        destination_id: &EntityId,
    ) -> Result<CommandResult, CoreError> {
        let request = CutInsertRequest {
            kind,
            clipped_id: clipped_id.clone(),
            destination_id: destination_id.clone(),
            entry_id: EntryId::fresh(),
        };
        self.execute(Command::CutInsert(request), MutationContext::LOCAL)
    }

    pub fn duplicate_application(&mut self, app_id: &EntityId) -> Result<EntityId, CoreError> {
        let app = self
            .application(app_id)
            .ok_or_else(|| CoreError::not_found(EntityKind::Application, app_id))?;
        let name = self.landscape.application_copy_name(&app.name);
        let id = EntityId::derive([app.parent_id.as_str(), name.as_str()]);
        let request = DuplicateApplicationRequest {
            app_id: app_id.clone(),
            name,
            entry_id: EntryId::fresh(),
        };
        self.created(Command::DuplicateApplication(request), id)
    }

    pub fn add_communication(
        &mut self,
        source_class_id: &EntityId,
        target_class_id: &EntityId,
        operation_name: &str,
    ) -> Result<CommandResult, CoreError> {
        let request = AddCommunicationRequest {
            source_class_id: source_class_id.clone(),
            target_class_id: target_class_id.clone(),
            operation_name: operation_name.to_owned(),
            entry_id: EntryId::fresh(),
        };
        self.execute(Command::AddCommunication(request), MutationContext::LOCAL)
    }

    /// Execute a creating command. An id collision means the entity is
    /// already there, so `expected` is returned as-is.
    fn created(&mut self, command: Command, expected: EntityId) -> Result<EntityId, CoreError> {
        match self.execute(command, MutationContext::LOCAL)? {
            CommandResult::Created(id) => Ok(id),
            CommandResult::Ok | CommandResult::Unchanged => Ok(expected),
        }
    }
}
