//! Wire types shared by the host and the editor surface.
//!
//! Every message is a JSON object `{"kind": ..., "payload": ...}`; field and
//! variant names are camelCase on the wire.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use webtext_plate_core::StructuredDocument;

use crate::error::ProtocolError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActionId {
    Undo,
    Redo,
    ToggleBold,
    ToggleItalic,
    ToggleStrike,
    ToggleUnderline,
    ToggleBulletListItem,
    ToggleOrderedListItem,
    ToggleTaskListItem,
    SinkListItem,
    LiftListItem,
    ToggleH1,
    ToggleH2,
    ToggleH3,
    ToggleBlockquote,
    SetHorizontalRule,
    UnsetColor,
    UnsetHighlight,
}

impl ActionId {
    pub const ALL: [ActionId; 18] = [
        ActionId::Undo,
        ActionId::Redo,
        ActionId::ToggleBold,
        ActionId::ToggleItalic,
        ActionId::ToggleStrike,
        ActionId::ToggleUnderline,
        ActionId::ToggleBulletListItem,
        ActionId::ToggleOrderedListItem,
        ActionId::ToggleTaskListItem,
        ActionId::SinkListItem,
        ActionId::LiftListItem,
        ActionId::ToggleH1,
        ActionId::ToggleH2,
        ActionId::ToggleH3,
        ActionId::ToggleBlockquote,
        ActionId::SetHorizontalRule,
        ActionId::UnsetColor,
        ActionId::UnsetHighlight,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ActionId::Undo => "undo",
            ActionId::Redo => "redo",
            ActionId::ToggleBold => "toggleBold",
            ActionId::ToggleItalic => "toggleItalic",
            ActionId::ToggleStrike => "toggleStrike",
            ActionId::ToggleUnderline => "toggleUnderline",
            ActionId::ToggleBulletListItem => "toggleBulletListItem",
            ActionId::ToggleOrderedListItem => "toggleOrderedListItem",
            ActionId::ToggleTaskListItem => "toggleTaskListItem",
            ActionId::SinkListItem => "sinkListItem",
            ActionId::LiftListItem => "liftListItem",
            ActionId::ToggleH1 => "toggleH1",
            ActionId::ToggleH2 => "toggleH2",
            ActionId::ToggleH3 => "toggleH3",
            ActionId::ToggleBlockquote => "toggleBlockquote",
            ActionId::SetHorizontalRule => "setHorizontalRule",
            ActionId::UnsetColor => "unsetColor",
            ActionId::UnsetHighlight => "unsetHighlight",
        }
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionId {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ActionId::ALL
            .into_iter()
            .find(|action| action.as_str() == s)
            .ok_or_else(|| ProtocolError::UnknownAction(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FocusCommand {
    Focus,
    Blur,
}

/// Payload of `insertVideo`. Missing sizes fall back to the configured defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoEmbed {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
}

/// Host to editor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload", rename_all = "camelCase")]
pub enum NativeMessage {
    Action(ActionId),
    Editor(FocusCommand),
    InitialContent(String),
    InsertImage(String),
    InsertVideo(VideoEmbed),
    SetColor(String),
    SetHighlight(String),
}

impl NativeMessage {
    pub const KINDS: [&'static str; 7] = [
        "action",
        "editor",
        "initialContent",
        "insertImage",
        "insertVideo",
        "setColor",
        "setHighlight",
    ];

    pub fn kind(&self) -> &'static str {
        match self {
            NativeMessage::Action(_) => "action",
            NativeMessage::Editor(_) => "editor",
            NativeMessage::InitialContent(_) => "initialContent",
            NativeMessage::InsertImage(_) => "insertImage",
            NativeMessage::InsertVideo(_) => "insertVideo",
            NativeMessage::SetColor(_) => "setColor",
            NativeMessage::SetHighlight(_) => "setHighlight",
        }
    }
}

/// Editor to host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload", rename_all = "camelCase")]
pub enum WebViewMessage {
    EditorInitialised,
    EditorStateUpdate(Box<EditorState>),
}

impl WebViewMessage {
    pub const KINDS: [&'static str; 2] = ["editorInitialised", "editorStateUpdate"];

    pub fn kind(&self) -> &'static str {
        match self {
            WebViewMessage::EditorInitialised => "editorInitialised",
            WebViewMessage::EditorStateUpdate(_) => "editorStateUpdate",
        }
    }
}

/// Flat projection of the editor the host renders its toolbar from.
///
/// Recomputed wholesale after every change; the default value has every flag off.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorState {
    pub html: String,
    pub json: StructuredDocument,

    pub can_bold: bool,
    pub can_italic: bool,
    pub can_strike: bool,
    pub can_underline: bool,
    pub can_horizontal_rule: bool,
    pub can_sink_list_item: bool,
    pub can_lift_list_item: bool,
    pub can_h1: bool,
    pub can_h2: bool,
    pub can_h3: bool,
    pub can_blockquote: bool,
    pub can_undo: bool,
    pub can_redo: bool,
    pub can_bullet_list: bool,
    pub can_ordered_list: bool,
    pub can_task_list: bool,
    pub can_set_color: bool,
    pub can_set_highlight: bool,
    pub can_unset_color: bool,
    pub can_unset_highlight: bool,

    pub is_bullet_list_active: bool,
    pub is_ordered_list_active: bool,
    pub is_task_list_active: bool,
    pub is_bold_active: bool,
    pub is_italic_active: bool,
    pub is_strike_active: bool,
    pub is_underline_active: bool,
    pub is_h1_active: bool,
    pub is_h2_active: bool,
    pub is_h3_active: bool,
    pub is_blockquote_active: bool,

    pub active_color: Option<String>,
    pub active_highlight: Option<String>,
}
