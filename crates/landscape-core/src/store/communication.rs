// ── Communication edge primitives ──
//
// Edges are content-addressed by their sorted endpoint pair, so adding
// the same edge twice lands on the same id.

use tracing::debug;

use super::landscape_store::LandscapeStore;
use crate::command::{AddCommunicationRequest, CommandResult, MutationContext};
use crate::error::CoreError;
use crate::model::{ClassCommunication, EntityId, EntityKind, EntryId};

impl LandscapeStore {
    pub(super) fn apply_add_communication(
        &mut self,
        req: &AddCommunicationRequest,
        ctx: MutationContext,
    ) -> Result<CommandResult, CoreError> {
        let source = self
            .landscape
            .live_class(&req.source_class_id)
            .ok_or_else(|| CoreError::not_found(EntityKind::Class, &req.source_class_id))?;
        let target = self
            .landscape
            .live_class(&req.target_class_id)
            .ok_or_else(|| CoreError::not_found(EntityKind::Class, &req.target_class_id))?;
        let id = EntityId::communication(&source.id, &target.id);
        let edge = ClassCommunication {
            id: id.clone(),
            source_app_id: source.app_id.clone(),
            source_class_id: source.id.clone(),
            target_app_id: target.app_id.clone(),
            target_class_id: target.id.clone(),
            operation_name: req.operation_name.clone(),
            is_bidirectional: false,
            deleted: false,
        };

        if let Some(existing) = self.landscape.communication_mut(&id) {
            if !existing.deleted {
                let reversed = existing.source_class_id == req.target_class_id
                    && existing.source_class_id != existing.target_class_id;
                if reversed && !existing.is_bidirectional {
                    existing.is_bidirectional = true;
                    debug!(%id, "edge is now bidirectional");
                    return Ok(CommandResult::Ok);
                }
                return Ok(CommandResult::Unchanged);
            }
            *existing = edge;
        } else {
            self.landscape.insert_communication(edge);
        }

        if !ctx.undo {
            if let Some(entry) = self.communication_entry(req.entry_id, &id, true) {
                self.record(entry);
            }
        }
        Ok(CommandResult::Created(id))
    }

    pub(super) fn rename_communication(
        &mut self,
        id: &EntityId,
        new_name: &str,
        entry_id: EntryId,
        ctx: MutationContext,
    ) -> Result<CommandResult, CoreError> {
        if !self.landscape.is_live(id) {
            return Err(CoreError::not_found(EntityKind::Communication, id));
        }
        let Some(edge) = self.landscape.communication_mut(id) else {
            return Err(CoreError::not_found(EntityKind::Communication, id));
        };
        if edge.operation_name == new_name {
            return Ok(CommandResult::Unchanged);
        }
        let original = std::mem::replace(&mut edge.operation_name, new_name.to_owned());
        if !ctx.undo {
            self.record_rename(EntityKind::Communication, id, original, new_name, entry_id);
        }
        Ok(CommandResult::Ok)
    }

    pub(super) fn delete_communication(
        &mut self,
        id: &EntityId,
        entry_id: EntryId,
        ctx: MutationContext,
    ) -> Result<CommandResult, CoreError> {
        if self.landscape.live_communication(id).is_none() {
            return Err(CoreError::not_found(EntityKind::Communication, id));
        }
        if !ctx.undo {
            if let Some(entry) = self.communication_entry(entry_id, id, false) {
                self.record(entry);
            }
        }
        self.landscape.set_deleted(id, true);
        Ok(CommandResult::Ok)
    }

    pub(super) fn restore_communication(
        &mut self,
        id: &EntityId,
    ) -> Result<CommandResult, CoreError> {
        if self.landscape.communication(id).is_none() {
            return Err(CoreError::not_found(EntityKind::Communication, id));
        }
        match self.landscape.set_deleted(id, false) {
            Some(true) => Ok(CommandResult::Ok),
            Some(false) => Ok(CommandResult::Unchanged),
            None => Err(CoreError::not_found(EntityKind::Communication, id)),
        }
    }
}
