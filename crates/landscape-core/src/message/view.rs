// ── Shared-view messages ──
//
// Non-structural state other participants mirror: open components,
// highlights, the active landscape, and settings.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentUpdateMessage {
    pub component_id: String,
    pub is_opened: bool,
    #[serde(default)]
    pub is_foundation: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HighlightingUpdateMessage {
    pub entity_id: String,
    #[serde(default)]
    pub entity_type: Option<String>,
    pub is_highlighted: bool,
    #[serde(default)]
    pub multi_selected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LandscapeSwitchMessage {
    pub landscape_token: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareSettingsMessage {
    pub settings: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestructureModeMessage {
    /// Explicit state; a bare toggle when absent.
    #[serde(default)]
    pub enabled: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PingMessage {
    #[serde(default)]
    pub timestamp: Option<i64>,
}
