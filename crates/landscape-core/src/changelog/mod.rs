// ── Changelog ──
//
// Ordered, user-visible log of structural edits, bundle detection, and
// the redo stash. Undo execution lives in the store, which owns both the
// log and the landscape it inverts.

mod bundle;
mod entry;
mod log;

pub use bundle::detect_bundle;
pub use entry::{Change, ChangeAction, ChangeLogEntry, Endpoints};
pub use log::{Changelog, DEFAULT_MAX_STASHES};
