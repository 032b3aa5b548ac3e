// ── Landscape arena ──
//
// All entities live in id-keyed ordered maps. Tree structure is held
// through `parent_id` back-references and child id lists; nothing holds
// a pointer to anything else. Every ancestry question is answered by
// walking the id chain.

use std::collections::HashSet;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::entity::{Application, Class, ClassCommunication, EntityKind, Node, Package};
use super::entity_id::EntityId;

/// The structural tree plus the communication edges of one landscape.
///
/// Tombstoned entities stay in the maps until purged. Only the root of
/// a deletion carries the `deleted` flag; its descendants become
/// unreachable through the ancestor walk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Landscape {
    pub token: Option<String>,
    nodes: IndexMap<EntityId, Node>,
    applications: IndexMap<EntityId, Application>,
    packages: IndexMap<EntityId, Package>,
    classes: IndexMap<EntityId, Class>,
    communications: IndexMap<EntityId, ClassCommunication>,
}

impl Landscape {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty landscape for `token`.
    pub fn with_token(token: Option<String>) -> Self {
        Self {
            token,
            ..Self::default()
        }
    }

    // ── Raw lookups (tombstones included) ────────────────────────────

    pub fn node(&self, id: &EntityId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn application(&self, id: &EntityId) -> Option<&Application> {
        self.applications.get(id)
    }

    pub fn package(&self, id: &EntityId) -> Option<&Package> {
        self.packages.get(id)
    }

    pub fn class(&self, id: &EntityId) -> Option<&Class> {
        self.classes.get(id)
    }

    pub fn communication(&self, id: &EntityId) -> Option<&ClassCommunication> {
        self.communications.get(id)
    }

    /// Which map holds `id`, if any.
    pub fn kind_of(&self, id: &EntityId) -> Option<EntityKind> {
        if self.applications.contains_key(id) {
            Some(EntityKind::Application)
        } else if self.packages.contains_key(id) {
            Some(EntityKind::Package)
        } else if self.classes.contains_key(id) {
            Some(EntityKind::Class)
        } else if self.communications.contains_key(id) {
            Some(EntityKind::Communication)
        } else if self.nodes.contains_key(id) {
            Some(EntityKind::Node)
        } else {
            None
        }
    }

    pub fn contains(&self, id: &EntityId) -> bool {
        self.kind_of(id).is_some()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn applications(&self) -> impl Iterator<Item = &Application> {
        self.applications.values()
    }

    pub fn packages(&self) -> impl Iterator<Item = &Package> {
        self.packages.values()
    }

    pub fn classes(&self) -> impl Iterator<Item = &Class> {
        self.classes.values()
    }

    pub fn communications(&self) -> impl Iterator<Item = &ClassCommunication> {
        self.communications.values()
    }

    // ── Reachability ─────────────────────────────────────────────────

    /// `true` if `id` is present, not tombstoned, and reachable from its
    /// application root. Communications additionally need both endpoints
    /// to be live.
    pub fn is_live(&self, id: &EntityId) -> bool {
        if let Some(app) = self.applications.get(id) {
            return !app.deleted;
        }
        if let Some(pkg) = self.packages.get(id) {
            return !pkg.deleted && self.is_live(&pkg.parent_id);
        }
        if let Some(class) = self.classes.get(id) {
            return !class.deleted && self.is_live(&class.parent_id);
        }
        if let Some(comm) = self.communications.get(id) {
            return !comm.deleted
                && self.is_live(&comm.source_class_id)
                && self.is_live(&comm.target_class_id);
        }
        self.nodes.contains_key(id)
    }

    pub fn live_application(&self, id: &EntityId) -> Option<&Application> {
        self.applications.get(id).filter(|_| self.is_live(id))
    }

    pub fn live_package(&self, id: &EntityId) -> Option<&Package> {
        self.packages.get(id).filter(|_| self.is_live(id))
    }

    pub fn live_class(&self, id: &EntityId) -> Option<&Class> {
        self.classes.get(id).filter(|_| self.is_live(id))
    }

    pub fn live_communication(&self, id: &EntityId) -> Option<&ClassCommunication> {
        self.communications.get(id).filter(|_| self.is_live(id))
    }

    /// Parent id of a package or class, application id of a package's
    /// owner, node id of an application.
    pub fn parent_of(&self, id: &EntityId) -> Option<&EntityId> {
        if let Some(pkg) = self.packages.get(id) {
            return Some(&pkg.parent_id);
        }
        if let Some(class) = self.classes.get(id) {
            return Some(&class.parent_id);
        }
        self.applications.get(id).map(|app| &app.parent_id)
    }

    /// Owning application of any structural entity (an application owns
    /// itself).
    pub fn app_of(&self, id: &EntityId) -> Option<&EntityId> {
        if let Some(app) = self.applications.get(id) {
            return Some(&app.id);
        }
        if let Some(pkg) = self.packages.get(id) {
            return Some(&pkg.app_id);
        }
        self.classes.get(id).map(|class| &class.app_id)
    }

    /// `true` if `candidate` is `ancestor` or lies below it.
    ///
    /// Walks `candidate`'s parent chain; bounded by the arena size so a
    /// corrupted chain cannot loop forever.
    pub fn is_within(&self, candidate: &EntityId, ancestor: &EntityId) -> bool {
        let limit = self.packages.len() + self.classes.len() + self.applications.len() + 1;
        let mut current = Some(candidate);
        for _ in 0..=limit {
            let Some(id) = current else { return false };
            if id == ancestor {
                return true;
            }
            if self.applications.contains_key(id) {
                return false;
            }
            current = self.parent_of(id);
        }
        false
    }

    /// Direct structural children of an application or package,
    /// tombstones included.
    pub fn children_of(&self, id: &EntityId) -> Vec<EntityId> {
        if let Some(app) = self.applications.get(id) {
            return app.packages.clone();
        }
        if let Some(pkg) = self.packages.get(id) {
            return pkg.sub_packages.iter().chain(&pkg.classes).cloned().collect();
        }
        if let Some(node) = self.nodes.get(id) {
            return node.applications.clone();
        }
        Vec::new()
    }

    /// Every package and class below `root` (exclusive), not descending
    /// into tombstoned entities.
    pub fn live_descendants(&self, root: &EntityId) -> Vec<EntityId> {
        let mut out = Vec::new();
        let mut stack = self.children_of(root);
        stack.reverse();
        while let Some(id) = stack.pop() {
            let deleted = self
                .packages
                .get(&id)
                .map(|p| p.deleted)
                .or_else(|| self.classes.get(&id).map(|c| c.deleted))
                .unwrap_or(true);
            if deleted {
                continue;
            }
            let mut children = self.children_of(&id);
            children.reverse();
            stack.extend(children);
            out.push(id);
        }
        out
    }

    /// Live classes at or below `root`.
    pub fn live_classes_within(&self, root: &EntityId) -> Vec<EntityId> {
        let mut ids = Vec::new();
        if self.classes.get(root).is_some_and(|c| !c.deleted) {
            ids.push(root.clone());
        }
        ids.extend(
            self.live_descendants(root)
                .into_iter()
                .filter(|id| self.classes.contains_key(id)),
        );
        ids
    }

    /// Non-tombstoned communications with an endpoint in `class_ids`.
    pub fn communications_touching(&self, class_ids: &[EntityId]) -> Vec<EntityId> {
        self.communications
            .values()
            .filter(|comm| !comm.deleted && class_ids.iter().any(|id| comm.touches(id)))
            .map(|comm| comm.id.clone())
            .collect()
    }

    /// Names of every child of `parent`, tombstones included.
    fn child_names(&self, parent: &EntityId) -> HashSet<String> {
        self.children_of(parent)
            .iter()
            .filter_map(|id| self.name_of(id))
            .map(str::to_owned)
            .collect()
    }

    pub fn name_of(&self, id: &EntityId) -> Option<&str> {
        if let Some(app) = self.applications.get(id) {
            return Some(&app.name);
        }
        if let Some(pkg) = self.packages.get(id) {
            return Some(&pkg.name);
        }
        if let Some(class) = self.classes.get(id) {
            return Some(&class.name);
        }
        if let Some(comm) = self.communications.get(id) {
            return Some(&comm.operation_name);
        }
        self.nodes.get(id).map(|node| node.host_name.as_str())
    }

    /// The first of `prefix1`, `prefix2`, ... that no child of `parent` uses.
    pub fn next_default_name(&self, parent: &EntityId, prefix: &str) -> String {
        let taken = self.child_names(parent);
        (1..)
            .map(|n| format!("{prefix}{n}"))
            .find(|name| !taken.contains(name))
            .unwrap_or_else(|| prefix.to_owned())
    }

    /// A name for a copy of `base` under `parent`: `base` itself when
    /// free (unless `force_copy`), then `base-copy`, `base-copy2`, …
    pub fn copy_name(&self, parent: &EntityId, base: &str, force_copy: bool) -> String {
        let taken = self.child_names(parent);
        if !force_copy && !taken.contains(base) {
            return base.to_owned();
        }
        let first = format!("{base}-copy");
        if !taken.contains(&first) {
            return first;
        }
        (2..)
            .map(|n| format!("{base}-copy{n}"))
            .find(|name| !taken.contains(name))
            .unwrap_or(first)
    }

    /// Application names are unique across the landscape rather than per
    /// parent.
    pub fn application_copy_name(&self, base: &str) -> String {
        let taken: HashSet<&str> = self.applications.values().map(|a| a.name.as_str()).collect();
        let first = format!("{base}-copy");
        if !taken.contains(first.as_str()) {
            return first;
        }
        (2..)
            .map(|n| format!("{base}-copy{n}"))
            .find(|name| !taken.contains(name.as_str()))
            .unwrap_or(first)
    }

    /// `prefix1`, `prefix2`, … across every application name.
    pub fn next_application_name(&self, prefix: &str) -> String {
        let taken: HashSet<&str> = self.applications.values().map(|a| a.name.as_str()).collect();
        (1..)
            .map(|n| format!("{prefix}{n}"))
            .find(|name| !taken.contains(name.as_str()))
            .unwrap_or_else(|| prefix.to_owned())
    }

    /// Parent a package or class was most recently cut from.
    pub fn last_previous_parent(&self, id: &EntityId) -> Option<&EntityId> {
        if let Some(pkg) = self.packages.get(id) {
            return pkg.previous_parents.last();
        }
        self.classes.get(id)?.previous_parents.last()
    }

    /// The entity's own tombstone flag, ignoring ancestors.
    pub fn is_tombstoned(&self, id: &EntityId) -> bool {
        self.applications
            .get(id)
            .map(|a| a.deleted)
            .or_else(|| self.packages.get(id).map(|p| p.deleted))
            .or_else(|| self.classes.get(id).map(|c| c.deleted))
            .or_else(|| self.communications.get(id).map(|c| c.deleted))
            .unwrap_or(false)
    }

    /// Fully-qualified name for a package or class named `name` placed
    /// under `parent_id`.
    pub fn fqn_under(&self, parent_id: &EntityId, name: &str) -> String {
        match self.packages.get(parent_id) {
            Some(parent) => format!("{}.{name}", parent.fqn),
            None => name.to_owned(),
        }
    }

    // ── Mutation primitives ──────────────────────────────────────────
    //
    // These keep the arena consistent (child lists, parent links, fqn,
    // app ids) and nothing more. Changelog and broadcast live in the
    // store layer.

    pub(crate) fn insert_node(&mut self, node: Node) {
        self.nodes.insert(node.id.clone(), node);
    }

    pub(crate) fn insert_application(&mut self, app: Application) {
        if let Some(node) = self.nodes.get_mut(&app.parent_id) {
            if !node.applications.contains(&app.id) {
                node.applications.push(app.id.clone());
            }
        }
        self.applications.insert(app.id.clone(), app);
    }

    pub(crate) fn insert_package(&mut self, pkg: Package) {
        self.attach(&pkg.parent_id, &pkg.id, EntityKind::Package);
        self.packages.insert(pkg.id.clone(), pkg);
    }

    pub(crate) fn insert_class(&mut self, class: Class) {
        self.attach(&class.parent_id, &class.id, EntityKind::Class);
        self.classes.insert(class.id.clone(), class);
    }

    pub(crate) fn insert_communication(&mut self, comm: ClassCommunication) {
        self.communications.insert(comm.id.clone(), comm);
    }

    pub(crate) fn communication_mut(&mut self, id: &EntityId) -> Option<&mut ClassCommunication> {
        self.communications.get_mut(id)
    }

    /// Set or clear the tombstone flag. Returns the previous value.
    pub(crate) fn set_deleted(&mut self, id: &EntityId, deleted: bool) -> Option<bool> {
        let flag = if let Some(app) = self.applications.get_mut(id) {
            &mut app.deleted
        } else if let Some(pkg) = self.packages.get_mut(id) {
            &mut pkg.deleted
        } else if let Some(class) = self.classes.get_mut(id) {
            &mut class.deleted
        } else if let Some(comm) = self.communications.get_mut(id) {
            &mut comm.deleted
        } else {
            return None;
        };
        Some(std::mem::replace(flag, deleted))
    }

    /// Rename an application, package, or class and recompute every
    /// affected fqn. Returns the previous name.
    pub(crate) fn rename(&mut self, id: &EntityId, name: &str) -> Option<String> {
        if let Some(app) = self.applications.get_mut(id) {
            return Some(std::mem::replace(&mut app.name, name.to_owned()));
        }
        if let Some(pkg) = self.packages.get_mut(id) {
            let old = std::mem::replace(&mut pkg.name, name.to_owned());
            self.refresh_subtree(id);
            return Some(old);
        }
        if let Some(class) = self.classes.get_mut(id) {
            let old = std::mem::replace(&mut class.name, name.to_owned());
            self.refresh_subtree(id);
            return Some(old);
        }
        None
    }

    /// Move a package or class under `new_parent` in one step. The entity
    /// is detached from its old parent and attached to the new one before
    /// this returns; `record` pushes the old parent onto
    /// `previous_parents`. Returns the old parent.
    pub(crate) fn relocate(
        &mut self,
        id: &EntityId,
        new_parent: &EntityId,
        record: bool,
    ) -> Option<EntityId> {
        let kind = self.kind_of(id)?;
        let old_parent = self.parent_of(id)?.clone();
        self.detach(&old_parent, id);
        self.attach(new_parent, id, kind);
        match kind {
            EntityKind::Package => {
                let pkg = self.packages.get_mut(id)?;
                pkg.parent_id = new_parent.clone();
                if record {
                    pkg.previous_parents.push(old_parent.clone());
                }
            }
            EntityKind::Class => {
                let class = self.classes.get_mut(id)?;
                class.parent_id = new_parent.clone();
                if record {
                    class.previous_parents.push(old_parent.clone());
                }
            }
            _ => return None,
        }
        self.refresh_subtree(id);
        Some(old_parent)
    }

    pub(crate) fn pop_previous_parent(&mut self, id: &EntityId) -> Option<EntityId> {
        if let Some(pkg) = self.packages.get_mut(id) {
            return pkg.previous_parents.pop();
        }
        self.classes.get_mut(id)?.previous_parents.pop()
    }

    pub(crate) fn push_previous_parent(&mut self, id: &EntityId, parent: EntityId) {
        if let Some(pkg) = self.packages.get_mut(id) {
            pkg.previous_parents.push(parent);
        } else if let Some(class) = self.classes.get_mut(id) {
            class.previous_parents.push(parent);
        }
    }

    /// Physically remove an entity, its whole subtree, and every edge
    /// touching a removed class.
    pub(crate) fn purge(&mut self, id: &EntityId) {
        if let Some(comm) = self.communications.shift_remove(id) {
            tracing::trace!(id = %comm.id, "purged communication");
            return;
        }

        let mut doomed = vec![id.clone()];
        let mut stack = self.children_of(id);
        while let Some(child) = stack.pop() {
            stack.extend(self.children_of(&child));
            doomed.push(child);
        }

        if let Some(parent) = self.parent_of(id).cloned() {
            self.detach(&parent, id);
        }
        if let Some(app) = self.applications.get(id) {
            if let Some(node) = self.nodes.get_mut(&app.parent_id) {
                node.applications.retain(|a| a != id);
            }
        }

        self.communications
            .retain(|_, comm| !doomed.iter().any(|d| comm.touches(d)));
        for d in &doomed {
            self.applications.shift_remove(d);
            self.packages.shift_remove(d);
            self.classes.shift_remove(d);
        }
        tracing::trace!(%id, removed = doomed.len(), "purged subtree");
    }

    // ── Private helpers ──────────────────────────────────────────────

    fn attach(&mut self, parent: &EntityId, child: &EntityId, kind: EntityKind) {
        if let Some(app) = self.applications.get_mut(parent) {
            if !app.packages.contains(child) {
                app.packages.push(child.clone());
            }
        } else if let Some(pkg) = self.packages.get_mut(parent) {
            let list = match kind {
                EntityKind::Class => &mut pkg.classes,
                _ => &mut pkg.sub_packages,
            };
            if !list.contains(child) {
                list.push(child.clone());
            }
        }
    }

    fn detach(&mut self, parent: &EntityId, child: &EntityId) {
        if let Some(app) = self.applications.get_mut(parent) {
            app.packages.retain(|id| id != child);
        } else if let Some(pkg) = self.packages.get_mut(parent) {
            pkg.sub_packages.retain(|id| id != child);
            pkg.classes.retain(|id| id != child);
        }
    }

    /// Recompute fqn and owning app for `root` and everything below it,
    /// then re-point communication app ids at the classes' new owners.
    fn refresh_subtree(&mut self, root: &EntityId) {
        let mut stack = vec![root.clone()];
        let mut touched_classes = Vec::new();
        while let Some(id) = stack.pop() {
            let Some(parent_id) = self.parent_of(&id).cloned() else {
                continue;
            };
            let Some(app_id) = self.app_of(&parent_id).cloned() else {
                continue;
            };
            if let Some(pkg) = self.packages.get(&id) {
                let fqn = self.fqn_under(&parent_id, &pkg.name);
                if let Some(pkg) = self.packages.get_mut(&id) {
                    pkg.fqn = fqn;
                    pkg.app_id = app_id;
                    stack.extend(pkg.sub_packages.iter().cloned());
                    stack.extend(pkg.classes.iter().cloned());
                }
            } else if let Some(class) = self.classes.get(&id) {
                let fqn = self.fqn_under(&parent_id, &class.name);
                if let Some(class) = self.classes.get_mut(&id) {
                    class.fqn = fqn;
                    class.app_id = app_id;
                    touched_classes.push(id);
                }
            }
        }

        for comm in self.communications.values_mut() {
            for class_id in &touched_classes {
                let Some(class) = self.classes.get(class_id) else {
                    continue;
                };
                if &comm.source_class_id == class_id {
                    comm.source_app_id = class.app_id.clone();
                }
                if &comm.target_class_id == class_id {
                    comm.target_app_id = class.app_id.clone();
                }
            }
        }
    }
}
