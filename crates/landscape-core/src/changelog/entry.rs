// ── Changelog entries ──

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::model::{EntityId, EntityKind, EntryId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum ChangeAction {
    Create,
    Rename,
    Delete,
    #[serde(rename = "CUTINSERT")]
    #[strum(serialize = "CUTINSERT")]
    CutInsert,
}

/// Endpoints of a communication, captured when the entry was recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Endpoints {
    pub source_class_id: EntityId,
    pub source_name: String,
    pub target_class_id: EntityId,
    pub target_name: String,
}

/// Payload of an entry, tagged by action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Change {
    #[serde(rename = "CREATE", rename_all = "camelCase")]
    Create {
        name: String,
        parent_id: Option<EntityId>,
        #[serde(default)]
        endpoints: Option<Endpoints>,
    },
    #[serde(rename = "RENAME", rename_all = "camelCase")]
    Rename {
        original_name: String,
        new_name: String,
    },
    #[serde(rename = "DELETE", rename_all = "camelCase")]
    Delete {
        name: String,
        parent_id: Option<EntityId>,
        #[serde(default)]
        endpoints: Option<Endpoints>,
    },
    #[serde(rename = "CUTINSERT", rename_all = "camelCase")]
    CutInsert {
        name: String,
        origin_parent_id: EntityId,
        destination_id: EntityId,
        destination_type: EntityKind,
        destination_name: String,
    },
}

impl Change {
    pub fn action(&self) -> ChangeAction {
        match self {
            Self::Create { .. } => ChangeAction::Create,
            Self::Rename { .. } => ChangeAction::Rename,
            Self::Delete { .. } => ChangeAction::Delete,
            Self::CutInsert { .. } => ChangeAction::CutInsert,
        }
    }
}

/// One user-visible structural edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeLogEntry {
    pub id: EntryId,
    pub entity_type: EntityKind,
    pub entity_id: EntityId,
    /// Owning application at the time of the edit.
    pub app_id: Option<EntityId>,
    pub app_name: String,
    #[serde(flatten)]
    pub change: Change,
    pub created_at: DateTime<Utc>,
    /// Position in the local log; restored entries go back here.
    #[serde(skip)]
    pub(crate) seq: u64,
}

impl ChangeLogEntry {
    pub fn new(
        id: EntryId,
        entity_type: EntityKind,
        entity_id: EntityId,
        app: Option<(EntityId, String)>,
        change: Change,
    ) -> Self {
        let (app_id, app_name) = match app {
            Some((id, name)) => (Some(id), name),
            None => (None, String::new()),
        };
        Self {
            id,
            entity_type,
            entity_id,
            app_id,
            app_name,
            change,
            created_at: Utc::now(),
            seq: 0,
        }
    }

    pub fn action(&self) -> ChangeAction {
        self.change.action()
    }

    /// Ids this entry depends on: the parent it was created or placed
    /// under, and the endpoints of a communication.
    pub fn references(&self) -> Vec<&EntityId> {
        match &self.change {
            Change::Create {
                parent_id,
                endpoints,
                ..
            }
            | Change::Delete {
                parent_id,
                endpoints,
                ..
            } => parent_id
                .iter()
                .chain(
                    endpoints
                        .iter()
                        .flat_map(|e| [&e.source_class_id, &e.target_class_id]),
                )
                .collect(),
            Change::Rename { .. } => Vec::new(),
            Change::CutInsert {
                origin_parent_id,
                destination_id,
                ..
            } => vec![origin_parent_id, destination_id],
        }
    }

    /// `true` if this entry depends on `id` (see [`references`](Self::references)).
    pub fn references_entity(&self, id: &EntityId) -> bool {
        self.references().into_iter().any(|r| r == id)
    }
}

impl fmt::Display for ChangeLogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.entity_type != EntityKind::Application && !self.app_name.is_empty() {
            write!(f, "{}: ", self.app_name)?;
        }
        let noun = self.entity_type.noun();
        match &self.change {
            Change::Create {
                name,
                endpoints: Some(e),
                ..
            } => write!(
                f,
                "Created {noun} \"{name}\" from {} to {}",
                e.source_name, e.target_name
            ),
            Change::Create { name, .. } => write!(f, "Created {noun} \"{name}\""),
            Change::Rename {
                original_name,
                new_name,
            } => write!(f, "Renamed {noun} \"{original_name}\" to \"{new_name}\""),
            Change::Delete {
                name,
                endpoints: Some(e),
                ..
            } => write!(
                f,
                "Deleted {noun} \"{name}\" from {} to {}",
                e.source_name, e.target_name
            ),
            Change::Delete { name, .. } => write!(f, "Deleted {noun} \"{name}\""),
            Change::CutInsert {
                name,
                destination_type,
                destination_name,
                ..
            } => write!(
                f,
                "Moved {noun} \"{name}\" to {} \"{destination_name}\"",
                destination_type.noun()
            ),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn entry(kind: EntityKind, change: Change) -> ChangeLogEntry {
        ChangeLogEntry::new(
            EntryId::fresh(),
            kind,
            EntityId::from("e"),
            Some((EntityId::from("app"), "shop".into())),
            change,
        )
    }

    #[test]
    fn describes_create_and_rename() {
        let create = entry(
            EntityKind::Package,
            Change::Create {
                name: "newPackage1".into(),
                parent_id: Some(EntityId::from("app")),
                endpoints: None,
            },
        );
        insta::assert_snapshot!(create.to_string(), @r#"shop: Created package "newPackage1""#);

        let rename = entry(
            EntityKind::Class,
            Change::Rename {
                original_name: "Cart".into(),
                new_name: "Basket".into(),
            },
        );
        insta::assert_snapshot!(rename.to_string(), @r#"shop: Renamed class "Cart" to "Basket""#);
    }

    #[test]
    fn application_entries_have_no_prefix() {
        let e = entry(
            EntityKind::Application,
            Change::Delete {
                name: "shop".into(),
                parent_id: None,
                endpoints: None,
            },
        );
        assert_eq!(e.to_string(), "Deleted application \"shop\"");
    }

    #[test]
    fn references_cover_parent_and_endpoints() {
        let e = entry(
            EntityKind::Communication,
            Change::Create {
                name: "call".into(),
                parent_id: None,
                endpoints: Some(Endpoints {
                    source_class_id: EntityId::from("a"),
                    source_name: "A".into(),
                    target_class_id: EntityId::from("b"),
                    target_name: "B".into(),
                }),
            },
        );
        assert!(e.references_entity(&EntityId::from("a")));
        assert!(e.references_entity(&EntityId::from("b")));
        assert_eq!(e.to_string(), "shop: Created communication \"call\" from A to B");
    }

    #[test]
    fn entry_serializes_action_tag() {
        let e = entry(
            EntityKind::Class,
            Change::CutInsert {
                name: "Cart".into(),
                origin_parent_id: EntityId::from("web"),
                destination_id: EntityId::from("org"),
                destination_type: EntityKind::Package,
                destination_name: "org".into(),
            },
        );
        let value = serde_json::to_value(&e).unwrap();
        assert_eq!(value["action"], "CUTINSERT");
        assert_eq!(value["destinationId"], "org");
        assert_eq!(e.action().to_string(), "CUTINSERT");
    }
}
