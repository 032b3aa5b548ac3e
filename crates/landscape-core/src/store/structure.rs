// ── Structural mutation primitives ──
//
// Create, rename, delete, restore, paste, cut-insert and duplicate for
// applications, packages and classes. Each primitive validates first and
// mutates second, so a rejected command leaves the arena untouched.

use std::collections::HashMap;

use tracing::debug;

use super::landscape_store::LandscapeStore;
use crate::changelog::{Change, ChangeLogEntry, Endpoints};
use crate::command::{
    CommandResult, CreateApplicationRequest, CreateEntityRequest, CutInsertRequest,
    DuplicateApplicationRequest, MutationContext, PasteRequest,
};
use crate::error::CoreError;
use crate::model::{
    Application, Class, ClassCommunication, EntityId, EntityKind, EntryId, Node, Package,
};

impl LandscapeStore {
    // ── Create ───────────────────────────────────────────────────────

    pub(super) fn create_application(
        &mut self,
        req: &CreateApplicationRequest,
        ctx: MutationContext,
    ) -> CommandResult {
        if self.landscape.contains(&req.id) {
            return CommandResult::Unchanged;
        }
        if self.landscape.node(&req.node.id).is_none() {
            self.landscape.insert_node(Node {
                id: req.node.id.clone(),
                host_name: req.node.host_name.clone(),
                ip_address: req.node.ip_address.clone(),
                applications: Vec::new(),
            });
        }
        self.landscape.insert_application(Application {
            id: req.id.clone(),
            name: req.name.clone(),
            language: req.language.clone(),
            parent_id: req.node.id.clone(),
            packages: Vec::new(),
            deleted: false,
        });
        if !ctx.undo {
            let entry = self.entry(
                req.entry_id,
                EntityKind::Application,
                &req.id,
                Change::Create {
                    name: req.name.clone(),
                    parent_id: Some(req.node.id.clone()),
                    endpoints: None,
                },
            );
            self.record(entry);
        }
        CommandResult::Created(req.id.clone())
    }

    pub(super) fn create_entity(
        &mut self,
        kind: EntityKind,
        req: &CreateEntityRequest,
        ctx: MutationContext,
    ) -> Result<CommandResult, CoreError> {
        if self.landscape.contains(&req.id) {
            return Ok(CommandResult::Unchanged);
        }
        let parent_kind = self.live_kind(&req.parent_id).ok_or_else(|| {
            let parent = self
                .landscape
                .kind_of(&req.parent_id)
                .unwrap_or(EntityKind::Package);
            CoreError::not_found(parent, &req.parent_id)
        })?;
        check_placement(kind, parent_kind)?;

        let fqn = self.landscape.fqn_under(&req.parent_id, &req.name);
        let app_id = self
            .landscape
            .app_of(&req.parent_id)
            .cloned()
            .ok_or_else(|| CoreError::not_found(parent_kind, &req.parent_id))?;
        if kind == EntityKind::Package {
            self.landscape.insert_package(Package {
                id: req.id.clone(),
                name: req.name.clone(),
                fqn,
                parent_id: req.parent_id.clone(),
                app_id,
                sub_packages: Vec::new(),
                classes: Vec::new(),
                deleted: false,
                previous_parents: Vec::new(),
            });
        } else {
            self.landscape.insert_class(Class {
                id: req.id.clone(),
                name: req.name.clone(),
                fqn,
                methods: Vec::new(),
                parent_id: req.parent_id.clone(),
                app_id,
                deleted: false,
                previous_parents: Vec::new(),
            });
        }

        if !ctx.undo {
            let entry = self.entry(
                req.entry_id,
                kind,
                &req.id,
                Change::Create {
                    name: req.name.clone(),
                    parent_id: Some(req.parent_id.clone()),
                    endpoints: None,
                },
            );
            self.record(entry);
        }
        Ok(CommandResult::Created(req.id.clone()))
    }

    // ── Rename ───────────────────────────────────────────────────────

    pub(super) fn rename(
        &mut self,
        kind: EntityKind,
        id: &EntityId,
        new_name: &str,
        entry_id: EntryId,
        ctx: MutationContext,
    ) -> Result<CommandResult, CoreError> {
        if self.live_kind(id) != Some(kind) {
            return Err(CoreError::not_found(kind, id));
        }
        if self.landscape.name_of(id) == Some(new_name) {
            return Ok(CommandResult::Unchanged);
        }
        let original = self
            .landscape
            .rename(id, new_name)
            .ok_or_else(|| CoreError::not_found(kind, id))?;
        if !ctx.undo {
            self.record_rename(kind, id, original, new_name, entry_id);
        }
        Ok(CommandResult::Ok)
    }

    // ── Delete / restore ─────────────────────────────────────────────

    /// Tombstone an entity. A logged delete also tombstones every live
    /// edge touching a class in the subtree, each with its own entry.
    pub(super) fn delete(
        &mut self,
        kind: EntityKind,
        id: &EntityId,
        entry_id: EntryId,
        ctx: MutationContext,
    ) -> Result<CommandResult, CoreError> {
        if !matches!(
            kind,
            EntityKind::Application | EntityKind::Package | EntityKind::Class
        ) {
            return Err(CoreError::Unsupported {
                operation: "delete".into(),
                entity_type: kind,
            });
        }
        if self.live_kind(id) != Some(kind) {
            return Err(CoreError::not_found(kind, id));
        }

        if ctx.undo {
            self.landscape.set_deleted(id, true);
            return Ok(CommandResult::Ok);
        }

        let classes = self.landscape.live_classes_within(id);
        let edges: Vec<EntityId> = self
            .landscape
            .communications_touching(&classes)
            .into_iter()
            .filter(|edge| self.landscape.is_live(edge))
            .collect();

        let name = self.landscape.name_of(id).unwrap_or_default().to_owned();
        let parent_id = self.landscape.parent_of(id).cloned();
        let entry = self.entry(
            entry_id,
            kind,
            id,
            Change::Delete {
                name,
                parent_id,
                endpoints: None,
            },
        );
        self.record(entry);

        for edge in &edges {
            let cascaded = EntryId::cascaded(entry_id, edge);
            let entry = self.communication_entry(cascaded, edge, false);
            self.landscape.set_deleted(edge, true);
            if let Some(entry) = entry {
                self.record(entry);
            }
        }
        self.landscape.set_deleted(id, true);
        debug!(%id, %kind, edges = edges.len(), "tombstoned");
        Ok(CommandResult::Ok)
    }

    /// Clear a tombstone, or with `undo_cut` move the entity back to the
    /// parent it was last cut from.
    pub(super) fn restore(
        &mut self,
        kind: EntityKind,
        id: &EntityId,
        undo_cut: bool,
    ) -> Result<CommandResult, CoreError> {
        if self.landscape.kind_of(id) != Some(kind) {
            return Err(CoreError::not_found(kind, id));
        }
        if !undo_cut {
            return Ok(match self.landscape.set_deleted(id, false) {
                Some(true) => CommandResult::Ok,
                _ => CommandResult::Unchanged,
            });
        }

        let Some(origin) = self.landscape.last_previous_parent(id).cloned() else {
            return Ok(CommandResult::Unchanged);
        };
        if !self.landscape.is_live(&origin) {
            return Err(CoreError::DestinationGone {
                destination: origin,
            });
        }
        if self.landscape.is_within(&origin, id) {
            return Err(CoreError::CyclicMove {
                clipped: id.clone(),
                destination: origin,
            });
        }
        self.landscape.pop_previous_parent(id);
        self.landscape.relocate(id, &origin, false);
        Ok(CommandResult::Ok)
    }

    // ── Paste / cut-insert ───────────────────────────────────────────

    /// Validate moving or copying `clipped` (of `kind`) under
    /// `destination`.
    fn check_clip(
        &self,
        kind: EntityKind,
        clipped: &EntityId,
        destination: &EntityId,
    ) -> Result<(), CoreError> {
        if self.live_kind(clipped) != Some(kind) {
            return Err(CoreError::not_found(kind, clipped));
        }
        let destination_kind = self
            .live_kind(destination)
            .ok_or_else(|| CoreError::DestinationGone {
                destination: destination.clone(),
            })?;
        if self.landscape.is_within(destination, clipped) {
            return Err(CoreError::CyclicMove {
                clipped: clipped.clone(),
                destination: destination.clone(),
            });
        }
        check_placement(kind, destination_kind)
    }

    pub(super) fn apply_paste(
        &mut self,
        req: &PasteRequest,
        ctx: MutationContext,
    ) -> Result<CommandResult, CoreError> {
        self.check_clip(req.kind, &req.clipped_id, &req.destination_id)?;
        let new_id = EntityId::derive([req.destination_id.as_str(), req.name.as_str()]);
        if self.landscape.contains(&new_id) {
            return Ok(CommandResult::Unchanged);
        }

        let mut copied = HashMap::new();
        let app_id = self
            .landscape
            .app_of(&req.destination_id)
            .cloned()
            .ok_or_else(|| CoreError::DestinationGone {
                destination: req.destination_id.clone(),
            })?;
        self.copy_subtree(
            &req.clipped_id,
            &req.destination_id,
            &req.name,
            &app_id,
            &mut copied,
        );

        if !ctx.undo {
            let entry = self.entry(
                req.entry_id,
                req.kind,
                &new_id,
                Change::Create {
                    name: req.name.clone(),
                    parent_id: Some(req.destination_id.clone()),
                    endpoints: None,
                },
            );
            self.record(entry);
        }
        Ok(CommandResult::Created(new_id))
    }

    /// Move in one step: the entity is detached and re-attached inside
    /// a single call, after every check has passed.
    pub(super) fn apply_cut_insert(
        &mut self,
        req: &CutInsertRequest,
        ctx: MutationContext,
    ) -> Result<CommandResult, CoreError> {
        self.check_clip(req.kind, &req.clipped_id, &req.destination_id)?;
        if self.landscape.parent_of(&req.clipped_id) == Some(&req.destination_id) {
            return Ok(CommandResult::Unchanged);
        }
        let destination_kind = self
            .landscape
            .kind_of(&req.destination_id)
            .unwrap_or(EntityKind::Package);
        let destination_name = self
            .landscape
            .name_of(&req.destination_id)
            .unwrap_or_default()
            .to_owned();
        let origin = self
            .landscape
            .relocate(&req.clipped_id, &req.destination_id, true)
            .ok_or_else(|| CoreError::not_found(req.kind, &req.clipped_id))?;

        if !ctx.undo {
            let name = self
                .landscape
                .name_of(&req.clipped_id)
                .unwrap_or_default()
                .to_owned();
            let entry = self.entry(
                req.entry_id,
                req.kind,
                &req.clipped_id,
                Change::CutInsert {
                    name,
                    origin_parent_id: origin,
                    destination_id: req.destination_id.clone(),
                    destination_type: destination_kind,
                    destination_name,
                },
            );
            self.record(entry);
        }
        Ok(CommandResult::Ok)
    }

    // ── Duplicate ────────────────────────────────────────────────────

    /// Deep copy of an application on the same node, ids derived from
    /// the copy's path. Edges with both ends inside the application are
    /// copied too. One CREATE entry covers the whole copy.
    pub(super) fn apply_duplicate_application(
        &mut self,
        req: &DuplicateApplicationRequest,
        ctx: MutationContext,
    ) -> Result<CommandResult, CoreError> {
        let source = self
            .landscape
            .live_application(&req.app_id)
            .cloned()
            .ok_or_else(|| CoreError::not_found(EntityKind::Application, &req.app_id))?;
        let new_id = EntityId::derive([source.parent_id.as_str(), req.name.as_str()]);
        if self.landscape.contains(&new_id) {
            return Ok(CommandResult::Unchanged);
        }

        self.landscape.insert_application(Application {
            id: new_id.clone(),
            name: req.name.clone(),
            language: source.language.clone(),
            parent_id: source.parent_id.clone(),
            packages: Vec::new(),
            deleted: false,
        });
        let mut copied = HashMap::new();
        for pkg_id in &source.packages {
            let Some(name) = self.live_child_name(pkg_id) else {
                continue;
            };
            self.copy_subtree(pkg_id, &new_id, &name, &new_id, &mut copied);
        }

        let edges: Vec<ClassCommunication> = self
            .landscape
            .communications()
            .filter(|c| {
                copied.contains_key(&c.source_class_id)
                    && copied.contains_key(&c.target_class_id)
                    && self.landscape.is_live(&c.id)
            })
            .cloned()
            .collect();
        for edge in edges {
            let (Some(source_class_id), Some(target_class_id)) = (
                copied.get(&edge.source_class_id).cloned(),
                copied.get(&edge.target_class_id).cloned(),
            ) else {
                continue;
            };
            self.landscape.insert_communication(ClassCommunication {
                id: EntityId::communication(&source_class_id, &target_class_id),
                source_app_id: new_id.clone(),
                source_class_id,
                target_app_id: new_id.clone(),
                target_class_id,
                operation_name: edge.operation_name,
                is_bidirectional: edge.is_bidirectional,
                deleted: false,
            });
        }

        if !ctx.undo {
            let entry = self.entry(
                req.entry_id,
                EntityKind::Application,
                &new_id,
                Change::Create {
                    name: req.name.clone(),
                    parent_id: Some(source.parent_id.clone()),
                    endpoints: None,
                },
            );
            self.record(entry);
        }
        debug!(
            source = %req.app_id,
            copy = %new_id,
            classes = copied.len(),
            "duplicated application"
        );
        Ok(CommandResult::Created(new_id))
    }

    // ── Helpers ──────────────────────────────────────────────────────

    /// Kind of a live application, package, or class.
    pub(super) fn live_kind(&self, id: &EntityId) -> Option<EntityKind> {
        self.landscape
            .kind_of(id)
            .filter(|_| self.landscape.is_live(id))
    }

    fn live_child_name(&self, id: &EntityId) -> Option<String> {
        if self.landscape.is_tombstoned(id) {
            return None;
        }
        self.landscape.name_of(id).map(str::to_owned)
    }

    /// Copy `source` and its live descendants under `parent` as `name`.
    /// Records every copied class as `old id → new id` in `copied`.
    fn copy_subtree(
        &mut self,
        source: &EntityId,
        parent: &EntityId,
        name: &str,
        app_id: &EntityId,
        copied: &mut HashMap<EntityId, EntityId>,
    ) {
        let id = EntityId::derive([parent.as_str(), name]);
        let fqn = self.landscape.fqn_under(parent, name);

        if let Some(class) = self.landscape.class(source).cloned() {
            self.landscape.insert_class(Class {
                id: id.clone(),
                name: name.to_owned(),
                fqn,
                methods: class.methods,
                parent_id: parent.clone(),
                app_id: app_id.clone(),
                deleted: false,
                previous_parents: Vec::new(),
            });
            copied.insert(source.clone(), id);
            return;
        }

        let Some(pkg) = self.landscape.package(source).cloned() else {
            return;
        };
        self.landscape.insert_package(Package {
            id: id.clone(),
            name: name.to_owned(),
            fqn,
            parent_id: parent.clone(),
            app_id: app_id.clone(),
            sub_packages: Vec::new(),
            classes: Vec::new(),
            deleted: false,
            previous_parents: Vec::new(),
        });
        for child in pkg.sub_packages.iter().chain(&pkg.classes) {
            if let Some(child_name) = self.live_child_name(child) {
                self.copy_subtree(child, &id, &child_name, app_id, copied);
            }
        }
    }

    /// Changelog entry for an edge, with endpoint names for display.
    pub(super) fn communication_entry(
        &self,
        entry_id: EntryId,
        edge: &EntityId,
        create: bool,
    ) -> Option<ChangeLogEntry> {
        let comm = self.landscape.communication(edge)?;
        let class_name = |id: &EntityId| self.landscape.name_of(id).unwrap_or_default().to_owned();
        let endpoints = Some(Endpoints {
            source_class_id: comm.source_class_id.clone(),
            source_name: class_name(&comm.source_class_id),
            target_class_id: comm.target_class_id.clone(),
            target_name: class_name(&comm.target_class_id),
        });
        let name = comm.operation_name.clone();
        let change = if create {
            Change::Create {
                name,
                parent_id: None,
                endpoints,
            }
        } else {
            Change::Delete {
                name,
                parent_id: None,
                endpoints,
            }
        };
        Some(self.entry(entry_id, EntityKind::Communication, edge, change))
    }
}

/// Packages go under applications or packages, classes under packages.
fn check_placement(clipped: EntityKind, destination: EntityKind) -> Result<(), CoreError> {
    let allowed = match clipped {
        EntityKind::Package => {
            matches!(destination, EntityKind::Application | EntityKind::Package)
        }
        EntityKind::Class => destination == EntityKind::Package,
        EntityKind::Node | EntityKind::Application | EntityKind::Communication => false,
    };
    if allowed {
        Ok(())
    } else {
        Err(CoreError::InvalidDestination {
            clipped,
            destination,
        })
    }
}
