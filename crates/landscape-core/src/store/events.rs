// ── Workspace change notification ──
//
// Every applied mutation is announced twice: as a typed event on a
// broadcast channel for consumers that care what changed, and as a
// version bump on a watch channel for consumers that only re-render.

use std::sync::Arc;

use futures_core::Stream;
use tokio::sync::{broadcast, watch};
use tokio_stream::wrappers::WatchStream;

use crate::command::MutationOrigin;
use crate::model::EntityId;

/// Default broadcast capacity for workspace events.
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// What changed in a workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkspaceEvent {
    /// A command changed the landscape or the changelog.
    Mutated {
        command: &'static str,
        target: Option<EntityId>,
        origin: MutationOrigin,
    },
    /// Shared, non-structural view state changed.
    ViewChanged { event: &'static str },
    /// The store was replaced for another landscape.
    LandscapeSwitched { token: Option<String> },
    /// Inbound envelopes were lost to lag; the landscape has to be
    /// fetched again and reloaded.
    ResyncRequired { skipped: u64 },
}

/// Fan-out point for [`WorkspaceEvent`]s.
///
/// Cloning shares the channels, so a replacement store keeps notifying
/// the same subscribers.
#[derive(Debug, Clone)]
pub struct EventHub {
    tx: broadcast::Sender<WorkspaceEvent>,
    version: Arc<watch::Sender<u64>>,
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}

impl EventHub {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        let (version, _) = watch::channel(0);
        Self {
            tx,
            version: Arc::new(version),
        }
    }

    pub fn publish(&self, event: WorkspaceEvent) {
        self.version.send_modify(|v| *v = v.wrapping_add(1));
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WorkspaceEvent> {
        self.tx.subscribe()
    }

    /// Current version; bumps once per published event.
    pub fn version(&self) -> u64 {
        *self.version.borrow()
    }

    pub fn watch_version(&self) -> watch::Receiver<u64> {
        self.version.subscribe()
    }

    /// Version changes as a `Stream`, starting with the current value.
    pub fn version_stream(&self) -> impl Stream<Item = u64> + Send + 'static {
        WatchStream::new(self.version.subscribe())
    }
}
