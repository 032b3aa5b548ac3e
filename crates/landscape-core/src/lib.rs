// landscape-core: Collaborative landscape graph store, changelog, and message dispatch.
//
// Applications, packages, and classes form a tree; class communications
// cut across it. Every edit goes through `LandscapeStore::execute`,
// lands in an undoable changelog, and is broadcast to peers when it was
// authored locally. Inbound peer messages enter through the
// `Dispatcher` and are applied with remote origin.

pub mod bus;
pub mod changelog;
pub mod command;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod message;
pub mod model;
pub mod sender;
pub mod session;
pub mod store;
pub mod view;
pub mod workspace;

// ── Primary re-exports ──────────────────────────────────────────────
pub use bus::MessageBus;
pub use changelog::{Change, ChangeAction, ChangeLogEntry, Changelog, detect_bundle};
pub use command::requests::*;
pub use command::{Command, CommandResult, MutationContext, MutationOrigin};
pub use config::SessionConfig;
pub use dispatcher::{DispatchOutcome, Dispatcher, DispatcherState};
pub use error::CoreError;
pub use message::{CollabMessage, Envelope};
pub use sender::{ChannelSender, MessageSender, OfflineSender};
pub use session::Session;
pub use store::{EventHub, LandscapeStore, WorkspaceEvent};
pub use view::SharedView;
pub use workspace::Workspace;

// Re-export model types at the crate root for ergonomics.
pub use model::{
    Application, Class, ClassCommunication, EntityId, EntityKind, EntryId, Landscape,
    LandscapeStructure, Method, Node, Package, RestoreKey,
};
