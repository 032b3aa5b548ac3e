// ── Collaborative dispatcher ──
//
// The only path from an inbound envelope to the store. Shared-view
// messages update the `SharedView`; structural messages are resolved
// into a `Command` and executed with remote origin, so nothing is
// broadcast back. Store failures end here as a `Rejected` outcome.

use strum::{Display, IntoStaticStr};
use tracing::{debug, trace};

use crate::command::{CommandResult, MutationContext};
use crate::message::{CollabMessage, Envelope};
use crate::store::WorkspaceEvent;
use crate::workspace::Workspace;

/// Whether inbound envelopes are applied or dropped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum DispatcherState {
    /// Disconnected: envelopes are dropped, not queued.
    #[default]
    Detached,
    Attached,
}

/// What happened to one envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum DispatchOutcome {
    /// Ignored because the dispatcher is detached.
    Dropped,
    /// State changed.
    Applied,
    /// Already applied, or nothing to do.
    Unchanged,
    /// The store refused it (lookup miss, cyclic move, malformed).
    Rejected,
}

#[derive(Debug, Default)]
pub struct Dispatcher {
    state: DispatcherState,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> DispatcherState {
        self.state
    }

    pub fn is_attached(&self) -> bool {
        self.state == DispatcherState::Attached
    }

    /// Start applying envelopes, on join or rejoin.
    pub fn attach(&mut self) {
        if self.state != DispatcherState::Attached {
            debug!("dispatcher attached");
        }
        self.state = DispatcherState::Attached;
    }

    /// Stop applying envelopes, on disconnect.
    pub fn detach(&mut self) {
        if self.state != DispatcherState::Detached {
            debug!("dispatcher detached");
        }
        self.state = DispatcherState::Detached;
    }

    /// Apply one inbound envelope to `workspace`.
    pub fn dispatch(&self, workspace: &mut Workspace, envelope: &Envelope) -> DispatchOutcome {
        let message = &envelope.original_message;
        let event = message.event_name();
        if !self.is_attached() {
            trace!(event, user = %envelope.user_id, "detached, dropping envelope");
            return DispatchOutcome::Dropped;
        }

        let outcome = if message.is_structural() {
            dispatch_structural(workspace, message)
        } else {
            dispatch_view(workspace, &envelope.user_id, message)
        };
        debug!(event, user = %envelope.user_id, outcome = %outcome, "dispatched");
        outcome
    }
}

fn dispatch_structural(workspace: &mut Workspace, message: &CollabMessage) -> DispatchOutcome {
    let resolved = message.to_command(workspace.store().landscape());
    let (command, undo) = match resolved {
        Ok(Some(pair)) => pair,
        Ok(None) => return DispatchOutcome::Unchanged,
        Err(err) => {
            debug!(event = message.event_name(), error = %err, "could not resolve message");
            return DispatchOutcome::Rejected;
        }
    };
    match workspace
        .store_mut()
        .execute(command, MutationContext::remote(undo))
    {
        Ok(CommandResult::Unchanged) => DispatchOutcome::Unchanged,
        Ok(_) => DispatchOutcome::Applied,
        Err(_) => DispatchOutcome::Rejected,
    }
}

fn dispatch_view(
    workspace: &mut Workspace,
    user_id: &str,
    message: &CollabMessage,
) -> DispatchOutcome {
    let view = workspace.view_mut();
    let changed = match message {
        CollabMessage::ComponentUpdate(m) => view.apply_component_update(m),
        CollabMessage::HighlightingUpdate(m) => view.apply_highlight(user_id, m),
        CollabMessage::AllHighlightsReset => view.reset_highlights(),
        CollabMessage::ShareSettings(m) => view.apply_settings(m),
        CollabMessage::RestructureModeUpdate(m) => view.apply_restructure_mode(m),
        CollabMessage::Ping(m) => {
            // Presence only; not worth a re-render.
            view.record_ping(user_id, m);
            return DispatchOutcome::Applied;
        }
        CollabMessage::LandscapeSwitch(m) => {
            if view.landscape_token() == Some(m.landscape_token.as_str()) {
                return DispatchOutcome::Unchanged;
            }
            workspace.switch_landscape(Some(m.landscape_token.clone()));
            return DispatchOutcome::Applied;
        }
        _ => return DispatchOutcome::Unchanged,
    };

    if !changed {
        return DispatchOutcome::Unchanged;
    }
    workspace.events().publish(WorkspaceEvent::ViewChanged {
        event: message.event_name(),
    });
    DispatchOutcome::Applied
}
