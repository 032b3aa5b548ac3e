// ── Collaboration messages ──
//
// Typed payloads exchanged between participants. The network layer
// decodes frames into `Envelope<CollabMessage>` and publishes them on
// the bus; wire framing is its concern, not ours.

mod convert;
mod restructure;
mod view;

use serde::{Deserialize, Serialize};

pub use restructure::{
    ChangelogRemoveMessage, ChangelogRestoreMessage, CommunicationMessage, CopyPasteMessage,
    CreateOrDeleteAction, CreateOrDeleteMessage, CutInsertMessage, DeleteCommunicationMessage,
    DuplicateAppMessage, RenameMessage, RenameOperationMessage, RestoreCommunicationMessage,
    RestoreMessage,
};
pub use view::{
    ComponentUpdateMessage, HighlightingUpdateMessage, LandscapeSwitchMessage, PingMessage,
    RestructureModeMessage, ShareSettingsMessage,
};

/// Every message kind a participant can send or receive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum CollabMessage {
    // ── Shared view ──────────────────────────────────────────────────
    ComponentUpdate(ComponentUpdateMessage),
    HighlightingUpdate(HighlightingUpdateMessage),
    AllHighlightsReset,
    LandscapeSwitch(LandscapeSwitchMessage),
    ShareSettings(ShareSettingsMessage),
    RestructureModeUpdate(RestructureModeMessage),
    Ping(PingMessage),

    // ── Structure ────────────────────────────────────────────────────
    RestructureRename(RenameMessage),
    RestructureCreateOrDelete(CreateOrDeleteMessage),
    RestructureCopyAndPaste(CopyPasteMessage),
    RestructureCutAndInsert(CutInsertMessage),
    RestructureDuplicateApp(DuplicateAppMessage),
    RestructureRestoreApp(RestoreMessage),
    RestructureRestorePackage(RestoreMessage),
    RestructureRestoreClass(RestoreMessage),

    // ── Communication ────────────────────────────────────────────────
    RestructureCommunication(CommunicationMessage),
    RestructureRenameOperation(RenameOperationMessage),
    RestructureDeleteCommunication(DeleteCommunicationMessage),
    RestructureRestoreCommunication(RestoreCommunicationMessage),

    // ── Changelog ────────────────────────────────────────────────────
    ChangelogRemoveEntry(ChangelogRemoveMessage),
    ChangelogRestoreEntries(ChangelogRestoreMessage),
}

impl CollabMessage {
    /// Event name as it appears in the `event` tag.
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::ComponentUpdate(_) => "component_update",
            Self::HighlightingUpdate(_) => "highlighting_update",
            Self::AllHighlightsReset => "all_highlights_reset",
            Self::LandscapeSwitch(_) => "landscape_switch",
            Self::ShareSettings(_) => "share_settings",
            Self::RestructureModeUpdate(_) => "restructure_mode_update",
            Self::Ping(_) => "ping",
            Self::RestructureRename(_) => "restructure_rename",
            Self::RestructureCreateOrDelete(_) => "restructure_create_or_delete",
            Self::RestructureCopyAndPaste(_) => "restructure_copy_and_paste",
            Self::RestructureCutAndInsert(_) => "restructure_cut_and_insert",
            Self::RestructureDuplicateApp(_) => "restructure_duplicate_app",
            Self::RestructureRestoreApp(_) => "restructure_restore_app",
            Self::RestructureRestorePackage(_) => "restructure_restore_package",
            Self::RestructureRestoreClass(_) => "restructure_restore_class",
            Self::RestructureCommunication(_) => "restructure_communication",
            Self::RestructureRenameOperation(_) => "restructure_rename_operation",
            Self::RestructureDeleteCommunication(_) => "restructure_delete_communication",
            Self::RestructureRestoreCommunication(_) => "restructure_restore_communication",
            Self::ChangelogRemoveEntry(_) => "changelog_remove_entry",
            Self::ChangelogRestoreEntries(_) => "changelog_restore_entries",
        }
    }

    /// `true` for messages that edit the landscape or its changelog.
    pub fn is_structural(&self) -> bool {
        !matches!(
            self,
            Self::ComponentUpdate(_)
                | Self::HighlightingUpdate(_)
                | Self::AllHighlightsReset
                | Self::LandscapeSwitch(_)
                | Self::ShareSettings(_)
                | Self::RestructureModeUpdate(_)
                | Self::Ping(_)
        )
    }
}

/// A message forwarded by the network layer, tagged with its sender.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T = CollabMessage> {
    pub user_id: String,
    pub original_message: T,
}

impl<T> Envelope<T> {
    pub fn new(user_id: impl Into<String>, original_message: T) -> Self {
        Self {
            user_id: user_id.into(),
            original_message,
        }
    }
}
