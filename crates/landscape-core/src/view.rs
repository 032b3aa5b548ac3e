// ── Shared view state ──
//
// Non-structural state that participants mirror for each other: which
// components are open, what each user highlights, whether restructure
// mode is on, and the last settings someone shared. None of it is
// recorded in the changelog.

use chrono::{DateTime, Utc};
use indexmap::{IndexMap, IndexSet};
use serde::Serialize;

use crate::message::{
    ComponentUpdateMessage, HighlightingUpdateMessage, PingMessage, RestructureModeMessage,
    ShareSettingsMessage,
};

/// Mirror of what other participants see.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedView {
    open_components: IndexSet<String>,
    foundations: IndexSet<String>,
    highlights: IndexMap<String, IndexSet<String>>,
    restructure_mode: bool,
    settings: Option<serde_json::Value>,
    landscape_token: Option<String>,
    last_ping: IndexMap<String, DateTime<Utc>>,
}

impl SharedView {
    pub fn new(landscape_token: Option<String>) -> Self {
        Self {
            landscape_token,
            ..Self::default()
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn is_open(&self, component_id: &str) -> bool {
        self.open_components.contains(component_id)
    }

    pub fn open_components(&self) -> impl Iterator<Item = &str> {
        self.open_components.iter().map(String::as_str)
    }

    pub fn is_foundation(&self, component_id: &str) -> bool {
        self.foundations.contains(component_id)
    }

    /// Entities `user_id` currently highlights, oldest first.
    pub fn highlights_of(&self, user_id: &str) -> impl Iterator<Item = &str> {
        self.highlights
            .get(user_id)
            .into_iter()
            .flatten()
            .map(String::as_str)
    }

    /// `true` if any participant highlights `entity_id`.
    pub fn is_highlighted(&self, entity_id: &str) -> bool {
        self.highlights.values().any(|set| set.contains(entity_id))
    }

    pub fn restructure_mode(&self) -> bool {
        self.restructure_mode
    }

    pub fn settings(&self) -> Option<&serde_json::Value> {
        self.settings.as_ref()
    }

    pub fn landscape_token(&self) -> Option<&str> {
        self.landscape_token.as_deref()
    }

    pub fn last_ping(&self, user_id: &str) -> Option<DateTime<Utc>> {
        self.last_ping.get(user_id).copied()
    }

    // ── Updates ──────────────────────────────────────────────────────
    //
    // Each returns `true` when the view actually changed.

    pub fn apply_component_update(&mut self, msg: &ComponentUpdateMessage) -> bool {
        let changed = if msg.is_opened {
            self.open_components.insert(msg.component_id.clone())
        } else {
            self.open_components.shift_remove(&msg.component_id)
        };
        let foundation_changed = if msg.is_foundation && msg.is_opened {
            self.foundations.insert(msg.component_id.clone())
        } else {
            self.foundations.shift_remove(&msg.component_id)
        };
        changed || foundation_changed
    }

    /// A plain highlight replaces the user's selection; a multi-select
    /// highlight adds to it. Un-highlighting removes just that entity.
    pub fn apply_highlight(&mut self, user_id: &str, msg: &HighlightingUpdateMessage) -> bool {
        let set = self.highlights.entry(user_id.to_owned()).or_default();
        if !msg.is_highlighted {
            let removed = set.shift_remove(&msg.entity_id);
            if set.is_empty() {
                self.highlights.shift_remove(user_id);
            }
            return removed;
        }
        if msg.multi_selected {
            return set.insert(msg.entity_id.clone());
        }
        if set.len() == 1 && set.contains(&msg.entity_id) {
            return false;
        }
        set.clear();
        set.insert(msg.entity_id.clone());
        true
    }

    pub fn reset_highlights(&mut self) -> bool {
        let had_any = !self.highlights.is_empty();
        self.highlights.clear();
        had_any
    }

    pub fn apply_restructure_mode(&mut self, msg: &RestructureModeMessage) -> bool {
        let next = msg.enabled.unwrap_or(!self.restructure_mode);
        let changed = next != self.restructure_mode;
        self.restructure_mode = next;
        changed
    }

    pub fn apply_settings(&mut self, msg: &ShareSettingsMessage) -> bool {
        if self.settings.as_ref() == Some(&msg.settings) {
            return false;
        }
        self.settings = Some(msg.settings.clone());
        true
    }

    /// Record a ping. A missing or out-of-range timestamp counts as now.
    pub fn record_ping(&mut self, user_id: &str, msg: &PingMessage) -> bool {
        let at = msg
            .timestamp
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .unwrap_or_else(Utc::now);
        self.last_ping.insert(user_id.to_owned(), at);
        true
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn highlight(entity: &str, on: bool, multi: bool) -> HighlightingUpdateMessage {
        HighlightingUpdateMessage {
            entity_id: entity.into(),
            entity_type: None,
            is_highlighted: on,
            multi_selected: multi,
        }
    }

    #[test]
    fn single_highlight_replaces_selection() {
        let mut view = SharedView::default();
        assert!(view.apply_highlight("a", &highlight("x", true, false)));
        assert!(view.apply_highlight("a", &highlight("y", true, false)));
        assert_eq!(view.highlights_of("a").collect::<Vec<_>>(), vec!["y"]);
        assert!(!view.apply_highlight("a", &highlight("y", true, false)));
    }

    #[test]
    fn multi_select_accumulates_per_user() {
        let mut view = SharedView::default();
        view.apply_highlight("a", &highlight("x", true, true));
        view.apply_highlight("a", &highlight("y", true, true));
        view.apply_highlight("b", &highlight("z", true, false));
        assert_eq!(view.highlights_of("a").collect::<Vec<_>>(), vec!["x", "y"]);
        assert!(view.is_highlighted("z"));

        assert!(view.apply_highlight("a", &highlight("x", false, false)));
        assert!(!view.is_highlighted("x"));
        assert!(view.reset_highlights());
        assert!(!view.reset_highlights());
    }

    #[test]
    fn component_open_and_close() {
        let mut view = SharedView::default();
        let open = ComponentUpdateMessage {
            component_id: "pkg".into(),
            is_opened: true,
            is_foundation: false,
        };
        assert!(view.apply_component_update(&open));
        assert!(!view.apply_component_update(&open));
        assert!(view.is_open("pkg"));
        let close = ComponentUpdateMessage {
            is_opened: false,
            ..open
        };
        assert!(view.apply_component_update(&close));
        assert!(!view.is_open("pkg"));
    }

    #[test]
    fn restructure_mode_toggles_without_explicit_state() {
        let mut view = SharedView::default();
        assert!(view.apply_restructure_mode(&RestructureModeMessage { enabled: None }));
        assert!(view.restructure_mode());
        assert!(!view.apply_restructure_mode(&RestructureModeMessage {
            enabled: Some(true)
        }));
    }

    #[test]
    fn identical_settings_are_not_a_change() {
        let mut view = SharedView::default();
        let msg = ShareSettingsMessage {
            settings: json!({ "heatmap": true }),
        };
        assert!(view.apply_settings(&msg));
        assert!(!view.apply_settings(&msg));
    }

    #[test]
    fn ping_uses_message_timestamp() {
        let mut view = SharedView::default();
        view.record_ping("a", &PingMessage {
            timestamp: Some(1_700_000_000_000),
        });
        assert_eq!(view.last_ping("a").unwrap().timestamp(), 1_700_000_000);
    }
}
