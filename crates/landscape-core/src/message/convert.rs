// ── Message ↔ Command conversion ──
//
// Outbound: a resolved command becomes the message other participants
// replay. Inbound: a message becomes a command, filling in anything the
// sender left out (entry ids, copy names) from the local landscape.

use super::{
    ChangelogRemoveMessage, ChangelogRestoreMessage, CollabMessage, CommunicationMessage,
    CopyPasteMessage, CreateOrDeleteAction, CreateOrDeleteMessage, CutInsertMessage,
    DeleteCommunicationMessage, DuplicateAppMessage, RenameMessage, RenameOperationMessage,
    RestoreCommunicationMessage, RestoreMessage,
};
use crate::command::{
    AddCommunicationRequest, Command, CreateApplicationRequest, CreateEntityRequest,
    CutInsertRequest, DuplicateApplicationRequest, NodeRef, PasteRequest,
};
use crate::error::CoreError;
use crate::model::{EntityId, EntityKind, EntryId, Landscape};

impl CollabMessage {
    /// The message announcing `command` to other participants.
    ///
    /// `None` for commands with no wire form.
    pub fn from_command(command: &Command, undo: bool) -> Option<Self> {
        let message = match command {
            Command::CreateApplication(req) => {
                Self::RestructureCreateOrDelete(CreateOrDeleteMessage {
                    action: CreateOrDeleteAction::Create,
                    entity_type: EntityKind::Application,
                    entity_id: req.id.clone(),
                    name: Some(req.name.clone()),
                    language: Some(req.language.clone()),
                    parent_id: Some(req.node.id.clone()),
                    node: Some(req.node.clone()),
                    undo,
                    entry_id: Some(req.entry_id),
                })
            }
            Command::CreatePackage(req) => create_message(EntityKind::Package, req, undo),
            Command::CreateClass(req) => create_message(EntityKind::Class, req, undo),
            Command::Rename {
                kind,
                id,
                new_name,
                entry_id,
            } => Self::RestructureRename(RenameMessage {
                entity_type: *kind,
                entity_id: id.clone(),
                new_name: new_name.clone(),
                app_id: None,
                undo,
                entry_id: Some(*entry_id),
            }),
            Command::Delete { kind, id, entry_id } => {
                Self::RestructureCreateOrDelete(CreateOrDeleteMessage {
                    action: CreateOrDeleteAction::Delete,
                    entity_type: *kind,
                    entity_id: id.clone(),
                    name: None,
                    language: None,
                    parent_id: None,
                    node: None,
                    undo,
                    entry_id: Some(*entry_id),
                })
            }
            Command::Restore { kind, id, undo_cut } => {
                let restore = RestoreMessage {
                    entity_id: id.clone(),
                    undo_cut_operation: *undo_cut,
                    undo,
                };
                match kind {
                    EntityKind::Application => Self::RestructureRestoreApp(restore),
                    EntityKind::Package => Self::RestructureRestorePackage(restore),
                    EntityKind::Class => Self::RestructureRestoreClass(restore),
                    EntityKind::Node | EntityKind::Communication => return None,
                }
            }
            Command::Paste(req) => Self::RestructureCopyAndPaste(CopyPasteMessage {
                entity_type: req.kind,
                clipped_entity_id: req.clipped_id.clone(),
                destination_id: req.destination_id.clone(),
                name: Some(req.name.clone()),
                undo,
                entry_id: Some(req.entry_id),
            }),
            Command::CutInsert(req) => Self::RestructureCutAndInsert(CutInsertMessage {
                entity_type: req.kind,
                clipped_entity_id: req.clipped_id.clone(),
                destination_id: req.destination_id.clone(),
                undo,
                entry_id: Some(req.entry_id),
            }),
            Command::DuplicateApplication(req) => {
                Self::RestructureDuplicateApp(DuplicateAppMessage {
                    app_id: req.app_id.clone(),
                    name: Some(req.name.clone()),
                    undo,
                    entry_id: Some(req.entry_id),
                })
            }
            Command::AddCommunication(req) => {
                Self::RestructureCommunication(CommunicationMessage {
                    source_class_id: req.source_class_id.clone(),
                    target_class_id: req.target_class_id.clone(),
                    method_name: req.operation_name.clone(),
                    undo,
                    entry_id: Some(req.entry_id),
                })
            }
            Command::RenameCommunication {
                id,
                new_name,
                entry_id,
            } => Self::RestructureRenameOperation(RenameOperationMessage {
                communication_id: id.clone(),
                new_name: new_name.clone(),
                undo,
                entry_id: Some(*entry_id),
            }),
            Command::DeleteCommunication { id, entry_id } => {
                Self::RestructureDeleteCommunication(DeleteCommunicationMessage {
                    communication_id: id.clone(),
                    undo,
                    entry_id: Some(*entry_id),
                })
            }
            Command::RestoreCommunication { id } => {
                Self::RestructureRestoreCommunication(RestoreCommunicationMessage {
                    communication_id: id.clone(),
                    undo,
                })
            }
            Command::RemoveEntries { entry_ids, key } => {
                Self::ChangelogRemoveEntry(ChangelogRemoveMessage {
                    entry_ids: entry_ids.clone(),
                    key: *key,
                })
            }
            Command::RestoreEntries { key } => {
                Self::ChangelogRestoreEntries(ChangelogRestoreMessage { key: *key })
            }
        };
        Some(message)
    }

    /// The command a received message asks for, plus its undo flag.
    ///
    /// `Ok(None)` for shared-view messages, which carry no command.
    pub fn to_command(&self, landscape: &Landscape) -> Result<Option<(Command, bool)>, CoreError> {
        let resolved = match self {
            Self::RestructureRename(m) => {
                let command = if m.entity_type == EntityKind::Communication {
                    Command::RenameCommunication {
                        id: m.entity_id.clone(),
                        new_name: m.new_name.clone(),
                        entry_id: entry(m.entry_id),
                    }
                } else {
                    Command::Rename {
                        kind: m.entity_type,
                        id: m.entity_id.clone(),
                        new_name: m.new_name.clone(),
                        entry_id: entry(m.entry_id),
                    }
                };
                (command, m.undo)
            }
            Self::RestructureCreateOrDelete(m) => (create_or_delete(m)?, m.undo),
            Self::RestructureCopyAndPaste(m) => {
                let name = match &m.name {
                    Some(name) => name.clone(),
                    None => {
                        let base = landscape.name_of(&m.clipped_entity_id).ok_or_else(|| {
                            CoreError::not_found(m.entity_type, &m.clipped_entity_id)
                        })?;
                        landscape.copy_name(&m.destination_id, base, false)
                    }
                };
                let command = Command::Paste(PasteRequest {
                    kind: m.entity_type,
                    clipped_id: m.clipped_entity_id.clone(),
                    destination_id: m.destination_id.clone(),
                    name,
                    entry_id: entry(m.entry_id),
                });
                (command, m.undo)
            }
            Self::RestructureCutAndInsert(m) => {
                let command = Command::CutInsert(CutInsertRequest {
                    kind: m.entity_type,
                    clipped_id: m.clipped_entity_id.clone(),
                    destination_id: m.destination_id.clone(),
                    entry_id: entry(m.entry_id),
                });
                (command, m.undo)
            }
            Self::RestructureDuplicateApp(m) => {
                let name = match &m.name {
                    Some(name) => name.clone(),
                    None => {
                        let app = landscape.application(&m.app_id).ok_or_else(|| {
                            CoreError::not_found(EntityKind::Application, &m.app_id)
                        })?;
                        landscape.application_copy_name(&app.name)
                    }
                };
                let command = Command::DuplicateApplication(DuplicateApplicationRequest {
                    app_id: m.app_id.clone(),
                    name,
                    entry_id: entry(m.entry_id),
                });
                (command, m.undo)
            }
            Self::RestructureRestoreApp(m) => (restore(EntityKind::Application, m), m.undo),
            Self::RestructureRestorePackage(m) => (restore(EntityKind::Package, m), m.undo),
            Self::RestructureRestoreClass(m) => (restore(EntityKind::Class, m), m.undo),
            Self::RestructureCommunication(m) => {
                let command = Command::AddCommunication(AddCommunicationRequest {
                    source_class_id: m.source_class_id.clone(),
                    target_class_id: m.target_class_id.clone(),
                    operation_name: m.method_name.clone(),
                    entry_id: entry(m.entry_id),
                });
                (command, m.undo)
            }
            Self::RestructureRenameOperation(m) => {
                let command = Command::RenameCommunication {
                    id: m.communication_id.clone(),
                    new_name: m.new_name.clone(),
                    entry_id: entry(m.entry_id),
                };
                (command, m.undo)
            }
            Self::RestructureDeleteCommunication(m) => {
                let command = Command::DeleteCommunication {
                    id: m.communication_id.clone(),
                    entry_id: entry(m.entry_id),
                };
                (command, m.undo)
            }
            Self::RestructureRestoreCommunication(m) => {
                let command = Command::RestoreCommunication {
                    id: m.communication_id.clone(),
                };
                (command, m.undo)
            }
            Self::ChangelogRemoveEntry(m) => {
                let command = Command::RemoveEntries {
                    entry_ids: m.entry_ids.clone(),
                    key: m.key,
                };
                (command, false)
            }
            Self::ChangelogRestoreEntries(m) => (Command::RestoreEntries { key: m.key }, false),
            Self::ComponentUpdate(_)
            | Self::HighlightingUpdate(_)
            | Self::AllHighlightsReset
            | Self::LandscapeSwitch(_)
            | Self::ShareSettings(_)
            | Self::RestructureModeUpdate(_)
            | Self::Ping(_) => return Ok(None),
        };
        Ok(Some(resolved))
    }
}

fn create_message(kind: EntityKind, req: &CreateEntityRequest, undo: bool) -> CollabMessage {
    CollabMessage::RestructureCreateOrDelete(CreateOrDeleteMessage {
        action: CreateOrDeleteAction::Create,
        entity_type: kind,
        entity_id: req.id.clone(),
        name: Some(req.name.clone()),
        language: None,
        parent_id: Some(req.parent_id.clone()),
        node: None,
        undo,
        entry_id: Some(req.entry_id),
    })
}

fn create_or_delete(m: &CreateOrDeleteMessage) -> Result<Command, CoreError> {
    let entry_id = entry(m.entry_id);
    if m.action == CreateOrDeleteAction::Delete {
        return Ok(if m.entity_type == EntityKind::Communication {
            Command::DeleteCommunication {
                id: m.entity_id.clone(),
                entry_id,
            }
        } else {
            Command::Delete {
                kind: m.entity_type,
                id: m.entity_id.clone(),
                entry_id,
            }
        });
    }

    let missing = |field: &str| CoreError::InvalidMessage {
        message: format!("create {} without {field}", m.entity_type),
    };
    let name = m.name.clone().ok_or_else(|| missing("name"))?;
    match m.entity_type {
        EntityKind::Application => {
            let node = m
                .node
                .clone()
                .unwrap_or_else(|| NodeRef::for_new_application(&name));
            Ok(Command::CreateApplication(CreateApplicationRequest {
                id: m.entity_id.clone(),
                language: m.language.clone().unwrap_or_else(|| "java".to_owned()),
                name,
                node,
                entry_id,
            }))
        }
        EntityKind::Package | EntityKind::Class => {
            let request = CreateEntityRequest {
                id: m.entity_id.clone(),
                parent_id: m.parent_id.clone().ok_or_else(|| missing("parentId"))?,
                name,
                entry_id,
            };
            Ok(if m.entity_type == EntityKind::Package {
                Command::CreatePackage(request)
            } else {
                Command::CreateClass(request)
            })
        }
        EntityKind::Node | EntityKind::Communication => Err(CoreError::Unsupported {
            operation: "create".into(),
            entity_type: m.entity_type,
        }),
    }
}

fn restore(kind: EntityKind, m: &RestoreMessage) -> Command {
    Command::Restore {
        kind,
        id: m.entity_id.clone(),
        undo_cut: m.undo_cut_operation,
    }
}

/// Entry id carried by the sender, or a fresh one for senders that
/// do not ship entry ids.
fn entry(carried: Option<EntryId>) -> EntryId {
    carried.unwrap_or_else(EntryId::fresh)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn structural_commands_survive_the_wire() {
        let command = Command::Rename {
            kind: EntityKind::Package,
            id: EntityId::from("pkg1"),
            new_name: "pkg1-renamed".into(),
            entry_id: EntryId::fresh(),
        };
        let message = CollabMessage::from_command(&command, false).unwrap();
        let back = message.to_command(&Landscape::new()).unwrap().unwrap();
        assert_eq!(back, (command, false));
    }

    #[test]
    fn undo_flag_is_carried() {
        let command = Command::Delete {
            kind: EntityKind::Class,
            id: EntityId::from("c"),
            entry_id: EntryId::fresh(),
        };
        let message = CollabMessage::from_command(&command, true).unwrap();
        let (_, undo) = message.to_command(&Landscape::new()).unwrap().unwrap();
        assert!(undo);
    }

    #[test]
    fn communication_restore_has_own_variant() {
        let restore = Command::Restore {
            kind: EntityKind::Communication,
            id: EntityId::from("e"),
            undo_cut: false,
        };
        assert!(CollabMessage::from_command(&restore, false).is_none());
    }

    #[test]
    fn create_without_parent_is_invalid() {
        let message = CollabMessage::RestructureCreateOrDelete(CreateOrDeleteMessage {
            action: CreateOrDeleteAction::Create,
            entity_type: EntityKind::Package,
            entity_id: EntityId::from("p"),
            name: Some("p".into()),
            language: None,
            parent_id: None,
            node: None,
            undo: false,
            entry_id: None,
        });
        let err = message.to_command(&Landscape::new()).unwrap_err();
        assert!(matches!(err, CoreError::InvalidMessage { .. }));
    }

    #[test]
    fn view_messages_carry_no_command() {
        let message = CollabMessage::AllHighlightsReset;
        assert!(message.to_command(&Landscape::new()).unwrap().is_none());
    }
}
