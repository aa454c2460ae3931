use thiserror::Error;

/// Failures at the message boundary. None of them changes editor state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// Not JSON, or JSON of the wrong shape for a known kind.
    #[error("malformed message: {0}")]
    Malformed(String),

    #[error("unknown message kind: {0}")]
    UnknownKind(String),

    /// An `action` message whose payload is not a known action identifier.
    #[error("unknown action: {0}")]
    UnknownAction(String),

    #[error("peer disconnected")]
    Disconnected,
}

/// Decode failures kept for inspection per session or controller; older ones fall off.
pub(crate) const MAX_DIAGNOSTICS: usize = 64;

pub(crate) fn record_diagnostic(diagnostics: &mut Vec<ProtocolError>, err: ProtocolError) {
    if diagnostics.len() >= MAX_DIAGNOSTICS {
        diagnostics.remove(0);
    }
    diagnostics.push(err);
}
