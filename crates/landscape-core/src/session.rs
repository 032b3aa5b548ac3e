// ── Collaboration session ──
//
// Lifecycle of one participant's connection to a shared landscape:
// the workspace behind a lock, the inbound bus, and the background task
// that feeds bus envelopes through the dispatcher while attached.

use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{Mutex, broadcast, oneshot, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::bus::MessageBus;
use crate::config::SessionConfig;
use crate::dispatcher::{DispatchOutcome, Dispatcher, DispatcherState};
use crate::message::Envelope;
use crate::model::{Landscape, LandscapeStructure};
use crate::sender::{MessageSender, OfflineSender};
use crate::store::{EventHub, WorkspaceEvent};
use crate::workspace::Workspace;

/// Handle to a collaboration session.
///
/// Cheaply cloneable via `Arc<SessionInner>`. Store mutations run to
/// completion under the workspace lock, so two envelopes never
/// interleave mid-mutation.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    config: SessionConfig,
    user_id: watch::Sender<Option<String>>,
    state: Mutex<SessionState>,
    bus: MessageBus,
    events: EventHub,
    dispatcher_state: watch::Sender<DispatcherState>,
    cancel: Mutex<Option<CancellationToken>>,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

struct SessionState {
    workspace: Workspace,
    dispatcher: Dispatcher,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("user_id", &*self.inner.user_id.borrow())
            .field("dispatcher", &*self.inner.dispatcher_state.borrow())
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Create a detached session. Call [`attach()`](Self::attach) to
    /// start applying inbound envelopes.
    pub fn new(
        config: SessionConfig,
        landscape: Landscape,
        sender: Arc<dyn MessageSender>,
    ) -> Self {
        let events = EventHub::new(config.event_capacity);
        let workspace =
            Workspace::with_max_stashes(landscape, sender, events.clone(), config.max_redo_stashes);
        let bus = MessageBus::new(config.bus_capacity);
        let (user_id, _) = watch::channel(config.user_id.clone());
        let (dispatcher_state, _) = watch::channel(DispatcherState::Detached);

        Self {
            inner: Arc::new(SessionInner {
                config,
                user_id,
                state: Mutex::new(SessionState {
                    workspace,
                    dispatcher: Dispatcher::new(),
                }),
                bus,
                events,
                dispatcher_state,
                cancel: Mutex::new(None),
                task_handles: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Single-user session: nothing is broadcast.
    pub fn offline(config: SessionConfig, landscape: Landscape) -> Self {
        Self::new(config, landscape, Arc::new(OfflineSender))
    }

    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    /// Where the network layer publishes decoded envelopes.
    pub fn bus(&self) -> &MessageBus {
        &self.inner.bus
    }

    pub fn events(&self) -> &EventHub {
        &self.inner.events
    }

    pub fn user_id(&self) -> Option<String> {
        self.inner.user_id.borrow().clone()
    }

    pub fn dispatcher_state(&self) -> watch::Receiver<DispatcherState> {
        self.inner.dispatcher_state.subscribe()
    }

    // ── Workspace access ─────────────────────────────────────────────

    /// Run `f` against the workspace under the session lock.
    pub async fn with_workspace<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&mut Workspace) -> T,
    {
        let mut state = self.inner.state.lock().await;
        f(&mut state.workspace)
    }

    /// Replace the current landscape with a freshly ingested one.
    pub async fn load(&self, structure: &LandscapeStructure) {
        self.inner.state.lock().await.workspace.load(structure);
    }

    /// Dispatch one envelope directly, bypassing the bus.
    pub async fn deliver(&self, envelope: &Envelope) -> DispatchOutcome {
        let mut state = self.inner.state.lock().await;
        let SessionState {
            workspace,
            dispatcher,
        } = &mut *state;
        dispatcher.dispatch(workspace, envelope)
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Start applying envelopes published on the bus. A no-op when
    /// already attached.
    pub async fn attach(&self) {
        let mut cancel = self.inner.cancel.lock().await;
        if cancel.is_some() {
            debug!("session already attached");
            return;
        }

        // Subscribe before flipping state so nothing published after
        // `attach` returns is missed.
        let rx = self.inner.bus.subscribe();
        self.inner.state.lock().await.dispatcher.attach();
        let token = CancellationToken::new();
        let handle = tokio::spawn(dispatcher_task(self.clone(), rx, token.clone()));
        self.inner.task_handles.lock().await.push(handle);
        *cancel = Some(token);

        self.inner.dispatcher_state.send_replace(DispatcherState::Attached);
        info!("session attached");
    }

    /// Stop the dispatcher task. Envelopes published while detached are
    /// dropped.
    pub async fn detach(&self) {
        let Some(token) = self.inner.cancel.lock().await.take() else {
            return;
        };
        token.cancel();

        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }
        drop(handles);

        self.inner.state.lock().await.dispatcher.detach();
        self.inner.dispatcher_state.send_replace(DispatcherState::Detached);
        info!("session detached");
    }

    /// Wait for the server to assign this participant an id.
    ///
    /// Falls back to the configured offline id when the answer does not
    /// arrive within `id_request_timeout` or the sender goes away.
    pub async fn await_assigned_id(&self, rx: oneshot::Receiver<String>) -> String {
        let timeout = self.inner.config.id_request_timeout;
        let id = match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(id)) => {
                debug!(%id, "server assigned id");
                id
            }
            Ok(Err(_)) => {
                warn!("id request abandoned, using offline id");
                self.inner.config.offline_user_id.clone()
            }
            Err(_) => {
                warn!(?timeout, "id request timed out, using offline id");
                self.inner.config.offline_user_id.clone()
            }
        };
        self.inner.user_id.send_replace(Some(id.clone()));
        id
    }
}

// ── Background tasks ─────────────────────────────────────────────────

/// Feed bus envelopes through the dispatcher until cancelled.
async fn dispatcher_task(
    session: Session,
    mut rx: broadcast::Receiver<Arc<Envelope>>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            received = rx.recv() => match received {
                Ok(envelope) => {
                    session.deliver(&envelope).await;
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "dispatcher lagged behind the bus, resync required");
                    session
                        .inner
                        .events
                        .publish(WorkspaceEvent::ResyncRequired { skipped });
                }
                Err(RecvError::Closed) => break,
            },
        }
    }
    debug!("dispatcher task stopped");
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::message::{CollabMessage, RenameMessage};
    use crate::model::{EntityId, EntityKind};

    async fn session_with_package() -> (Session, EntityId) {
        let session = Session::offline(SessionConfig::default(), Landscape::new());
        let pkg = session
            .with_workspace(|ws| {
                let store = ws.store_mut();
                let app = store.add_application(Some("shop"), "java").unwrap();
                store.add_package(&app).unwrap()
            })
            .await;
        (session, pkg)
    }

    fn rename(id: &EntityId, name: &str) -> Envelope {
        Envelope::new(
            "peer",
            CollabMessage::RestructureRename(RenameMessage {
                entity_type: EntityKind::Package,
                entity_id: id.clone(),
                new_name: name.into(),
                app_id: None,
                undo: false,
                entry_id: None,
            }),
        )
    }

    #[tokio::test]
    async fn attached_session_applies_bus_envelopes() {
        let (session, pkg) = session_with_package().await;
        let mut events = session.events().subscribe();
        session.attach().await;
        assert_eq!(*session.dispatcher_state().borrow(), DispatcherState::Attached);

        assert_eq!(session.bus().publish(rename(&pkg, "core")), 1);
        let event = tokio::time::timeout(Duration::from_secs(1), events.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(event, WorkspaceEvent::Mutated { command: "rename", .. }));

        let name = session
            .with_workspace(|ws| ws.store().package(&pkg).map(|p| p.name.clone()))
            .await;
        assert_eq!(name.as_deref(), Some("core"));
        session.detach().await;
    }

    #[tokio::test]
    async fn detached_session_ignores_bus() {
        let (session, pkg) = session_with_package().await;
        session.attach().await;
        session.detach().await;
        assert_eq!(*session.dispatcher_state().borrow(), DispatcherState::Detached);
        assert_eq!(session.bus().subscriber_count(), 0);
        assert_eq!(session.bus().publish(rename(&pkg, "core")), 0);
        assert_eq!(session.deliver(&rename(&pkg, "core")).await, DispatchOutcome::Dropped);
    }

    #[tokio::test]
    async fn reattach_after_detach() {
        let (session, pkg) = session_with_package().await;
        session.attach().await;
        session.attach().await;
        session.detach().await;
        session.attach().await;
        assert_eq!(session.deliver(&rename(&pkg, "core")).await, DispatchOutcome::Applied);
        session.detach().await;
    }

    #[tokio::test]
    async fn dispatcher_state_watch_follows_lifecycle() {
        let session = Session::offline(SessionConfig::default(), Landscape::new());
        let mut state = session.dispatcher_state();
        assert_eq!(*state.borrow_and_update(), DispatcherState::Detached);

        session.attach().await;
        state.changed().await.unwrap();
        assert_eq!(*state.borrow_and_update(), DispatcherState::Attached);

        session.detach().await;
        state.changed().await.unwrap();
        assert_eq!(*state.borrow(), DispatcherState::Detached);
    }

    #[tokio::test]
    async fn lagging_behind_the_bus_asks_for_resync() {
        let config = SessionConfig {
            bus_capacity: 1,
            ..SessionConfig::default()
        };
        let session = Session::offline(config, Landscape::new());
        let pkg = session
            .with_workspace(|ws| {
                let store = ws.store_mut();
                let app = store.add_application(Some("shop"), "java").unwrap();
                store.add_package(&app).unwrap()
            })
            .await;
        let mut events = session.events().subscribe();
        session.attach().await;

        // The dispatcher task has not run yet; only the last one fits.
        for name in ["a", "b", "c"] {
            session.bus().publish(rename(&pkg, name));
        }
        let first = tokio::time::timeout(Duration::from_secs(1), events.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(first, WorkspaceEvent::ResyncRequired { skipped: 2 });

        let next = tokio::time::timeout(Duration::from_secs(1), events.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(next, WorkspaceEvent::Mutated { command: "rename", .. }));
        let name = session
            .with_workspace(|ws| ws.store().package(&pkg).map(|p| p.name.clone()))
            .await;
        assert_eq!(name.as_deref(), Some("c"));
        session.detach().await;
    }

    #[tokio::test(start_paused = true)]
    async fn assigned_id_falls_back_on_timeout() {
        let session = Session::offline(SessionConfig::default(), Landscape::new());
        let (_tx, rx) = oneshot::channel::<String>();
        let id = session.await_assigned_id(rx).await;
        assert_eq!(id, session.config().offline_user_id);
        assert_eq!(session.user_id().as_deref(), Some("offline"));
    }

    #[tokio::test]
    async fn assigned_id_from_server() {
        let session = Session::offline(SessionConfig::default(), Landscape::new());
        let (tx, rx) = oneshot::channel();
        tx.send("user-7".to_owned()).unwrap();
        assert_eq!(session.await_assigned_id(rx).await, "user-7");
    }
}
