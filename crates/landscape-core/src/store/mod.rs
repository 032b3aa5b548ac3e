// ── Landscape graph store ──
//
// Structural mutation primitives, communication edges, changelog
// recording and undo, all behind `LandscapeStore::execute`.

mod communication;
mod events;
mod landscape_store;
mod structure;
mod undo;

#[cfg(test)]
mod tests;

pub use events::{DEFAULT_EVENT_CAPACITY, EventHub, WorkspaceEvent};
pub use landscape_store::LandscapeStore;
