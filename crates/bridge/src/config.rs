use serde::{Deserialize, Serialize};
use webtext_plate_core::EmbedBounds;

/// What the editor does with host messages that arrive before it is ready.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PreReadyPolicy {
    /// Keep them and replay in arrival order right after `editorInitialised`.
    #[default]
    Queue,
    Drop,
}

/// Whether a command that changed nothing still produces a state update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NoopPolicy {
    #[default]
    Silent,
    Echo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ContentPolicy {
    /// Every `initialContent` replaces the document.
    #[default]
    LastWriteWins,
    /// `initialContent` is dropped once the document has local edits.
    IgnoreIfDirty,
}

pub const DEFAULT_PALETTE: [&str; 8] = [
    "#958DF1", "#F98181", "#FBBC88", "#FAF594", "#70CFF8", "#94FADB", "#B9F18D", "#000000",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BridgeConfig {
    pub pre_ready: PreReadyPolicy,
    pub noop: NoopPolicy,
    pub content: ContentPolicy,
    pub embed: EmbedBounds,
    /// Zero means the engine default.
    pub max_undo: usize,
    pub palette: Vec<String>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            pre_ready: PreReadyPolicy::default(),
            noop: NoopPolicy::default(),
            content: ContentPolicy::default(),
            embed: EmbedBounds::default(),
            max_undo: 200,
            palette: DEFAULT_PALETTE.iter().map(|c| c.to_string()).collect(),
        }
    }
}

impl BridgeConfig {
    pub fn from_json_str(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}
