// ── Structural entities ──
//
// Node → Application → Package → Class, plus class-to-class
// communication edges. Every link is an id; the arena in
// `model::landscape` owns the values.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::entity_id::EntityId;

/// Kind of a structural entity, as it appears on the wire.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityKind {
    Node,
    Application,
    Package,
    Class,
    Communication,
}

impl EntityKind {
    /// Lower-case noun used in changelog descriptions.
    pub fn noun(self) -> &'static str {
        match self {
            Self::Node => "node",
            Self::Application => "application",
            Self::Package => "package",
            Self::Class => "class",
            Self::Communication => "communication",
        }
    }
}

/// Host that owns applications. Not edited by restructuring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: EntityId,
    pub host_name: String,
    pub ip_address: String,
    pub applications: Vec<EntityId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub id: EntityId,
    pub name: String,
    pub language: String,
    /// Owning node.
    pub parent_id: EntityId,
    /// Top-level packages, in insertion order.
    pub packages: Vec<EntityId>,
    pub deleted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    pub id: EntityId,
    pub name: String,
    /// Dot-joined package path below the owning application.
    pub fqn: String,
    /// Either the owning application (top-level) or a package.
    pub parent_id: EntityId,
    pub app_id: EntityId,
    pub sub_packages: Vec<EntityId>,
    pub classes: Vec<EntityId>,
    pub deleted: bool,
    /// Parents this package was cut from, most recent last.
    pub previous_parents: Vec<EntityId>,
}

impl Package {
    pub fn is_top_level(&self) -> bool {
        self.parent_id == self.app_id
    }
}

/// Read-only method record attached to a class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Method {
    pub name: String,
    #[serde(default)]
    pub hash_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Class {
    pub id: EntityId,
    pub name: String,
    pub fqn: String,
    pub methods: Vec<Method>,
    /// Owning package.
    pub parent_id: EntityId,
    pub app_id: EntityId,
    pub deleted: bool,
    pub previous_parents: Vec<EntityId>,
}

/// Directed edge between two classes, identified by its unordered
/// endpoint pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassCommunication {
    pub id: EntityId,
    pub source_app_id: EntityId,
    pub source_class_id: EntityId,
    pub target_app_id: EntityId,
    pub target_class_id: EntityId,
    pub operation_name: String,
    pub is_bidirectional: bool,
    pub deleted: bool,
}

impl ClassCommunication {
    pub fn touches(&self, class_id: &EntityId) -> bool {
        &self.source_class_id == class_id || &self.target_class_id == class_id
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn entity_kind_wire_names() {
        assert_eq!(EntityKind::Package.to_string(), "PACKAGE");
        assert_eq!(
            serde_json::to_string(&EntityKind::Communication).unwrap(),
            "\"COMMUNICATION\""
        );
        let kind: EntityKind = "CLASS".parse().unwrap();
        assert_eq!(kind, EntityKind::Class);
    }

    #[test]
    fn communication_touches_both_endpoints() {
        let comm = ClassCommunication {
            id: EntityId::from("c"),
            source_app_id: EntityId::from("app"),
            source_class_id: EntityId::from("a"),
            target_app_id: EntityId::from("app"),
            target_class_id: EntityId::from("b"),
            operation_name: "call".into(),
            is_bidirectional: false,
            deleted: false,
        };
        assert!(comm.touches(&EntityId::from("a")));
        assert!(comm.touches(&EntityId::from("b")));
        assert!(!comm.touches(&EntityId::from("c")));
    }
}
