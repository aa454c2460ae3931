mod bridge;
mod codec;
mod config;
mod dispatcher;
mod engine;
mod error;
mod host;
mod projector;
mod protocol;

pub use crate::bridge::{EditorEndpoint, HostEndpoint, pair};
pub use crate::codec::{decode_native, decode_webview, encode_native, encode_webview};
pub use crate::config::{BridgeConfig, ContentPolicy, NoopPolicy, PreReadyPolicy};
pub use crate::dispatcher::{EditorSession, SessionPhase};
pub use crate::engine::{DocumentEngine, Feature, PlateEngine, ValueMark};
pub use crate::error::ProtocolError;
pub use crate::host::{Control, ControlState, HostController, PickerMode};
pub use crate::projector::project;
pub use crate::protocol::{
    ActionId, EditorState, FocusCommand, NativeMessage, VideoEmbed, WebViewMessage,
};
