// ── Landscape domain model ──
//
// Identity types, structural entities, the id-keyed arena that holds
// them, and ingestion of the initial structure document.

pub mod entity;
pub mod entity_id;
pub mod ingest;
pub mod landscape;

// ── Re-exports ──────────────────────────────────────────────────────

pub use entity::{Application, Class, ClassCommunication, EntityKind, Method, Node, Package};
pub use entity_id::{EntityId, EntryId, RestoreKey};
pub use ingest::{
    ApplicationStructure, ClassStructure, CommunicationStructure, LandscapeStructure,
    NodeStructure, PackageStructure,
};
pub use landscape::Landscape;
