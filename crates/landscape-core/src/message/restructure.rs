// ── Restructuring messages ──
//
// Payloads for every structural edit a participant can broadcast. Ids
// and names are carried verbatim so the receiving store derives the
// same ids the sender did.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::command::NodeRef;
use crate::model::{EntityId, EntityKind, EntryId, RestoreKey};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameMessage {
    pub entity_type: EntityKind,
    pub entity_id: EntityId,
    pub new_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_id: Option<EntityId>,
    #[serde(default)]
    pub undo: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_id: Option<EntryId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum CreateOrDeleteAction {
    Create,
    Delete,
}

/// Create or delete an application, package, or class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrDeleteMessage {
    pub action: CreateOrDeleteAction,
    pub entity_type: EntityKind,
    pub entity_id: EntityId,
    /// Name of the created entity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Application language on create.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Parent package or application on create.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<EntityId>,
    /// Node an application is created on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node: Option<NodeRef>,
    #[serde(default)]
    pub undo: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_id: Option<EntryId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CopyPasteMessage {
    pub entity_type: EntityKind,
    pub clipped_entity_id: EntityId,
    pub destination_id: EntityId,
    /// Name of the copy; picked by the receiver when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub undo: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_id: Option<EntryId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CutInsertMessage {
    pub entity_type: EntityKind,
    pub clipped_entity_id: EntityId,
    pub destination_id: EntityId,
    #[serde(default)]
    pub undo: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_id: Option<EntryId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunicationMessage {
    pub source_class_id: EntityId,
    pub target_class_id: EntityId,
    pub method_name: String,
    #[serde(default)]
    pub undo: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_id: Option<EntryId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameOperationMessage {
    pub communication_id: EntityId,
    pub new_name: String,
    #[serde(default)]
    pub undo: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_id: Option<EntryId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteCommunicationMessage {
    pub communication_id: EntityId,
    #[serde(default)]
    pub undo: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_id: Option<EntryId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoreCommunicationMessage {
    pub communication_id: EntityId,
    #[serde(default)]
    pub undo: bool,
}

/// Restore an application, package, or class. The kind is carried by
/// the message variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoreMessage {
    pub entity_id: EntityId,
    #[serde(default)]
    pub undo_cut_operation: bool,
    #[serde(default)]
    pub undo: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateAppMessage {
    pub app_id: EntityId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub undo: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_id: Option<EntryId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangelogRemoveMessage {
    pub entry_ids: Vec<EntryId>,
    pub key: RestoreKey,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangelogRestoreMessage {
    pub key: RestoreKey,
}
