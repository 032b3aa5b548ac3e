// ── Workspace ──
//
// The per-landscape state a session works on: the structural store and
// the shared view. Switching landscapes disposes both and starts over;
// event subscribers stay attached across the switch.

use std::sync::Arc;

use tracing::info;

use crate::changelog::DEFAULT_MAX_STASHES;
use crate::model::{Landscape, LandscapeStructure};
use crate::sender::MessageSender;
use crate::store::{EventHub, LandscapeStore, WorkspaceEvent};
use crate::view::SharedView;

pub struct Workspace {
    store: LandscapeStore,
    view: SharedView,
    sender: Arc<dyn MessageSender>,
    events: EventHub,
    max_stashes: usize,
}

impl std::fmt::Debug for Workspace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workspace")
            .field("store", &self.store)
            .field("view", &self.view)
            .field("max_stashes", &self.max_stashes)
            .finish_non_exhaustive()
    }
}

impl Workspace {
    pub fn new(landscape: Landscape, sender: Arc<dyn MessageSender>, events: EventHub) -> Self {
        Self::with_max_stashes(landscape, sender, events, DEFAULT_MAX_STASHES)
    }

    pub fn with_max_stashes(
        landscape: Landscape,
        sender: Arc<dyn MessageSender>,
        events: EventHub,
        max_stashes: usize,
    ) -> Self {
        let view = SharedView::new(landscape.token.clone());
        let store = LandscapeStore::with_max_stashes(
            landscape,
            Arc::clone(&sender),
            events.clone(),
            max_stashes,
        );
        Self {
            store,
            view,
            sender,
            events,
            max_stashes,
        }
    }

    pub fn store(&self) -> &LandscapeStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut LandscapeStore {
        &mut self.store
    }

    pub fn view(&self) -> &SharedView {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut SharedView {
        &mut self.view
    }

    pub fn events(&self) -> &EventHub {
        &self.events
    }

    /// Replace the store with an empty landscape for `token`.
    ///
    /// The structure of the new landscape is fetched by the loading
    /// collaborator and handed in through [`Workspace::load`].
    pub fn switch_landscape(&mut self, token: Option<String>) {
        self.replace(Landscape::with_token(token));
    }

    /// Replace the store with a freshly ingested landscape.
    pub fn load(&mut self, structure: &LandscapeStructure) {
        self.replace(Landscape::from_structure(structure));
    }

    fn replace(&mut self, landscape: Landscape) {
        let token = landscape.token.clone();
        self.store = LandscapeStore::with_max_stashes(
            landscape,
            Arc::clone(&self.sender),
            self.events.clone(),
            self.max_stashes,
        );
        self.view = SharedView::new(token.clone());
        info!(token = ?token, "landscape switched");
        self.events.publish(WorkspaceEvent::LandscapeSwitched { token });
    }
}
