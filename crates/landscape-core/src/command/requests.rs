// ── Typed request structs for Command payloads ──
//
// Requests are fully resolved: ids, names, and changelog entry ids are
// filled in before a command reaches the store, so the same command
// replayed on another peer produces the same state.

use serde::{Deserialize, Serialize};

use crate::model::{EntityId, EntityKind, EntryId};

// ── Structure ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateApplicationRequest {
    pub id: EntityId,
    pub name: String,
    pub language: String,
    /// Node the application is placed on. Created when missing.
    pub node: NodeRef,
    pub entry_id: EntryId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeRef {
    pub id: EntityId,
    pub host_name: String,
    pub ip_address: String,
}

impl NodeRef {
    /// Node used for applications created by restructuring.
    pub fn for_new_application(name: &str) -> Self {
        let host_name = format!("{name}-host");
        let ip_address = "0.0.0.0".to_owned();
        Self {
            id: EntityId::derive(["node", host_name.as_str(), ip_address.as_str()]),
            host_name,
            ip_address,
        }
    }
}

/// Create a package or class under `parent_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEntityRequest {
    pub id: EntityId,
    pub parent_id: EntityId,
    pub name: String,
    pub entry_id: EntryId,
}

/// Copy `clipped_id` (and its subtree) under `destination_id` as `name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasteRequest {
    pub kind: EntityKind,
    pub clipped_id: EntityId,
    pub destination_id: EntityId,
    pub name: String,
    pub entry_id: EntryId,
}

/// Move `clipped_id` under `destination_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CutInsertRequest {
    pub kind: EntityKind,
    pub clipped_id: EntityId,
    pub destination_id: EntityId,
    pub entry_id: EntryId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateApplicationRequest {
    pub app_id: EntityId,
    pub name: String,
    pub entry_id: EntryId,
}

// ── Communication ──────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddCommunicationRequest {
    pub source_class_id: EntityId,
    pub target_class_id: EntityId,
    pub operation_name: String,
    pub entry_id: EntryId,
}
