// ── Initial ingestion ──
//
// Converts the structure document handed over by the loading
// collaborator into the arena. Ids come from the structural path, so
// every client that ingests the same document ends up with the same ids.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::entity::{Application, Class, ClassCommunication, Method, Node, Package};
use super::entity_id::EntityId;
use super::landscape::Landscape;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LandscapeStructure {
    #[serde(default)]
    pub landscape_token: Option<String>,
    #[serde(default)]
    pub nodes: Vec<NodeStructure>,
    #[serde(default)]
    pub communications: Vec<CommunicationStructure>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeStructure {
    pub host_name: String,
    pub ip_address: String,
    #[serde(default)]
    pub applications: Vec<ApplicationStructure>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationStructure {
    pub name: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub packages: Vec<PackageStructure>,
}

fn default_language() -> String {
    "java".into()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageStructure {
    pub name: String,
    #[serde(default)]
    pub sub_packages: Vec<PackageStructure>,
    #[serde(default)]
    pub classes: Vec<ClassStructure>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassStructure {
    pub name: String,
    #[serde(default)]
    pub methods: Vec<Method>,
}

/// Communication between two classes, addressed by application name and
/// class fqn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunicationStructure {
    pub source_app: String,
    pub source_class: String,
    pub target_app: String,
    pub target_class: String,
    pub operation_name: String,
    #[serde(default)]
    pub is_bidirectional: bool,
}

impl Landscape {
    /// Build an arena from a structure document.
    ///
    /// Communications whose endpoints cannot be resolved are skipped with
    /// a warning.
    pub fn from_structure(structure: &LandscapeStructure) -> Self {
        let mut landscape = Landscape::new();
        landscape.token.clone_from(&structure.landscape_token);

        for node in &structure.nodes {
            let node_id =
                EntityId::derive(["node", node.host_name.as_str(), node.ip_address.as_str()]);
            landscape.insert_node(Node {
                id: node_id.clone(),
                host_name: node.host_name.clone(),
                ip_address: node.ip_address.clone(),
                applications: Vec::new(),
            });

            for app in &node.applications {
                let app_id = EntityId::derive([node_id.as_str(), app.name.as_str()]);
                landscape.insert_application(Application {
                    id: app_id.clone(),
                    name: app.name.clone(),
                    language: app.language.clone(),
                    parent_id: node_id.clone(),
                    packages: Vec::new(),
                    deleted: false,
                });
                for pkg in &app.packages {
                    ingest_package(&mut landscape, pkg, &app_id, &app_id);
                }
            }
        }

        for comm in &structure.communications {
            let source = find_class(&landscape, &comm.source_app, &comm.source_class);
            let target = find_class(&landscape, &comm.target_app, &comm.target_class);
            let (Some((source_app_id, source_class_id)), Some((target_app_id, target_class_id))) =
                (source, target)
            else {
                warn!(
                    source = %comm.source_class,
                    target = %comm.target_class,
                    "skipping communication with unknown endpoint"
                );
                continue;
            };
            let id = EntityId::communication(&source_class_id, &target_class_id);
            landscape.insert_communication(ClassCommunication {
                id,
                source_app_id,
                source_class_id,
                target_app_id,
                target_class_id,
                operation_name: comm.operation_name.clone(),
                is_bidirectional: comm.is_bidirectional,
                deleted: false,
            });
        }

        debug!(
            applications = landscape.applications().count(),
            classes = landscape.classes().count(),
            communications = landscape.communications().count(),
            "landscape ingested"
        );
        landscape
    }
}

fn ingest_package(
    landscape: &mut Landscape,
    pkg: &PackageStructure,
    parent_id: &EntityId,
    app_id: &EntityId,
) {
    let id = EntityId::derive([parent_id.as_str(), pkg.name.as_str()]);
    let fqn = landscape.fqn_under(parent_id, &pkg.name);
    landscape.insert_package(Package {
        id: id.clone(),
        name: pkg.name.clone(),
        fqn,
        parent_id: parent_id.clone(),
        app_id: app_id.clone(),
        sub_packages: Vec::new(),
        classes: Vec::new(),
        deleted: false,
        previous_parents: Vec::new(),
    });

    for sub in &pkg.sub_packages {
        ingest_package(landscape, sub, &id, app_id);
    }
    for class in &pkg.classes {
        let class_id = EntityId::derive([id.as_str(), class.name.as_str()]);
        let fqn = landscape.fqn_under(&id, &class.name);
        landscape.insert_class(Class {
            id: class_id,
            name: class.name.clone(),
            fqn,
            methods: class.methods.clone(),
            parent_id: id.clone(),
            app_id: app_id.clone(),
            deleted: false,
            previous_parents: Vec::new(),
        });
    }
}

fn find_class(landscape: &Landscape, app_name: &str, fqn: &str) -> Option<(EntityId, EntityId)> {
    let app = landscape.applications().find(|a| a.name == app_name)?;
    let class = landscape
        .classes()
        .find(|c| c.app_id == app.id && c.fqn == fqn)?;
    Some((app.id.clone(), class.id.clone()))
}
