// ── Runtime session configuration ──
//
// Tuning for one collaboration session. Never touches disk: the config
// crate or the embedding application builds a `SessionConfig` and hands
// it in.

use std::time::Duration;

use crate::bus::DEFAULT_BUS_CAPACITY;
use crate::changelog::DEFAULT_MAX_STASHES;
use crate::store::DEFAULT_EVENT_CAPACITY;

/// Identifier used when the server never assigns one.
pub const DEFAULT_OFFLINE_USER_ID: &str = "offline";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Id this participant is known by, once assigned.
    pub user_id: Option<String>,
    /// Fallback when id assignment times out.
    pub offline_user_id: String,
    /// Envelopes buffered per bus subscriber.
    pub bus_capacity: usize,
    /// Workspace events buffered per subscriber.
    pub event_capacity: usize,
    /// How long to wait for a server-assigned id.
    pub id_request_timeout: Duration,
    /// Undo stashes kept for redo.
    pub max_redo_stashes: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            user_id: None,
            offline_user_id: DEFAULT_OFFLINE_USER_ID.into(),
            bus_capacity: DEFAULT_BUS_CAPACITY,
            event_capacity: DEFAULT_EVENT_CAPACITY,
            id_request_timeout: Duration::from_secs(5),
            max_redo_stashes: DEFAULT_MAX_STASHES,
        }
    }
}
