use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ProtocolError;
use crate::protocol::{ActionId, NativeMessage, WebViewMessage};

pub fn encode_native(msg: &NativeMessage) -> Result<String, ProtocolError> {
    encode(msg)
}

pub fn encode_webview(msg: &WebViewMessage) -> Result<String, ProtocolError> {
    encode(msg)
}

pub fn decode_native(text: &str) -> Result<NativeMessage, ProtocolError> {
    let value = decode_envelope(text, &NativeMessage::KINDS)?;
    if value.get("kind").and_then(Value::as_str) == Some("action") {
        if let Some(action) = value.get("payload").and_then(Value::as_str) {
            action.parse::<ActionId>()?;
        }
    }
    from_value(value)
}

pub fn decode_webview(text: &str) -> Result<WebViewMessage, ProtocolError> {
    let value = decode_envelope(text, &WebViewMessage::KINDS)?;
    from_value(value)
}

fn encode<T: Serialize>(msg: &T) -> Result<String, ProtocolError> {
    serde_json::to_string(msg).map_err(|err| ProtocolError::Malformed(err.to_string()))
}

// Parses the JSON object and checks its `kind` before the typed decode, so an
// unknown kind is reported as such rather than as a shape error.
fn decode_envelope(text: &str, kinds: &[&str]) -> Result<Value, ProtocolError> {
    let value: Value =
        serde_json::from_str(text).map_err(|err| ProtocolError::Malformed(err.to_string()))?;
    let Some(object) = value.as_object() else {
        return Err(ProtocolError::Malformed("expected a JSON object".to_string()));
    };
    let Some(kind) = object.get("kind").and_then(Value::as_str) else {
        return Err(ProtocolError::Malformed("missing string field `kind`".to_string()));
    };
    if !kinds.contains(&kind) {
        return Err(ProtocolError::UnknownKind(kind.to_string()));
    }
    Ok(value)
}

fn from_value<T: DeserializeOwned>(value: Value) -> Result<T, ProtocolError> {
    serde_json::from_value(value).map_err(|err| ProtocolError::Malformed(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{EditorState, FocusCommand, VideoEmbed};

    #[test]
    fn native_messages_use_kind_and_payload() {
        let text = encode_native(&NativeMessage::Action(ActionId::ToggleH2)).unwrap();
        assert_eq!(text, r#"{"kind":"action","payload":"toggleH2"}"#);

        let text = encode_native(&NativeMessage::Editor(FocusCommand::Blur)).unwrap();
        assert_eq!(text, r#"{"kind":"editor","payload":"blur"}"#);
    }

    #[test]
    fn initialised_carries_no_payload() {
        let text = encode_webview(&WebViewMessage::EditorInitialised).unwrap();
        assert_eq!(text, r#"{"kind":"editorInitialised"}"#);
        assert_eq!(decode_webview(&text), Ok(WebViewMessage::EditorInitialised));
    }

    #[test]
    fn video_sizes_are_optional() {
        let msg = decode_native(r#"{"kind":"insertVideo","payload":{"url":"x"}}"#).unwrap();
        assert_eq!(
            msg,
            NativeMessage::InsertVideo(VideoEmbed {
                url: "x".to_string(),
                width: None,
                height: None,
            })
        );
    }

    #[test]
    fn state_updates_decode_from_partial_objects() {
        let msg =
            decode_webview(r#"{"kind":"editorStateUpdate","payload":{"canBold":true}}"#).unwrap();
        let WebViewMessage::EditorStateUpdate(state) = msg else {
            panic!("expected a state update");
        };
        assert!(state.can_bold);
        assert_eq!(state.html, EditorState::default().html);
    }

    #[test]
    fn decode_failures_are_classified() {
        assert!(matches!(decode_native("not json"), Err(ProtocolError::Malformed(_))));
        assert!(matches!(decode_native("[1, 2]"), Err(ProtocolError::Malformed(_))));
        assert!(matches!(
            decode_native(r#"{"payload":"toggleBold"}"#),
            Err(ProtocolError::Malformed(_))
        ));
        assert_eq!(
            decode_native(r#"{"kind":"teleport","payload":1}"#),
            Err(ProtocolError::UnknownKind("teleport".to_string()))
        );
        assert_eq!(
            decode_native(r#"{"kind":"action","payload":"toggleFlying"}"#),
            Err(ProtocolError::UnknownAction("toggleFlying".to_string()))
        );
        assert!(matches!(
            decode_native(r#"{"kind":"action","payload":7}"#),
            Err(ProtocolError::Malformed(_))
        ));
        assert!(matches!(
            decode_native(r#"{"kind":"insertVideo","payload":{"width":3}}"#),
            Err(ProtocolError::Malformed(_))
        ));
    }
}
