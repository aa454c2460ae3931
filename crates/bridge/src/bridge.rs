//! In-process transport between the host and the editor surface.
//!
//! Messages cross as JSON text over two unbounded channels, one per direction.
//! Sending never blocks and arrival order matches send order.

use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

use crate::codec::{decode_native, decode_webview, encode_native, encode_webview};
use crate::error::ProtocolError;
use crate::protocol::{NativeMessage, WebViewMessage};

/// The host's end: sends `NativeMessage`, receives `WebViewMessage`.
pub struct HostEndpoint {
    tx: Sender<String>,
    rx: Receiver<String>,
}

/// The editor's end: sends `WebViewMessage`, receives `NativeMessage`.
pub struct EditorEndpoint {
    tx: Sender<String>,
    rx: Receiver<String>,
}

pub fn pair() -> (HostEndpoint, EditorEndpoint) {
    let (to_editor, from_host) = mpsc::channel();
    let (to_host, from_editor) = mpsc::channel();
    (
        HostEndpoint {
            tx: to_editor,
            rx: from_editor,
        },
        EditorEndpoint {
            tx: to_host,
            rx: from_host,
        },
    )
}

fn send_text(tx: &Sender<String>, text: String) -> Result<(), ProtocolError> {
    tx.send(text).map_err(|_| ProtocolError::Disconnected)
}

// `None` once the queue is empty or the peer is gone and nothing is left.
fn next_text(rx: &Receiver<String>) -> Option<String> {
    match rx.try_recv() {
        Ok(text) => Some(text),
        Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
    }
}

impl HostEndpoint {
    pub fn send(&self, msg: &NativeMessage) -> Result<(), ProtocolError> {
        send_text(&self.tx, encode_native(msg)?)
    }

    /// Sends text as-is, without checking that it decodes.
    pub fn send_raw(&self, text: impl Into<String>) -> Result<(), ProtocolError> {
        send_text(&self.tx, text.into())
    }

    /// Next inbound message; a decode failure is returned in place of the message.
    pub fn try_recv(&self) -> Option<Result<WebViewMessage, ProtocolError>> {
        next_text(&self.rx).map(|text| decode_webview(&text))
    }
}

impl EditorEndpoint {
    pub fn send(&self, msg: &WebViewMessage) -> Result<(), ProtocolError> {
        send_text(&self.tx, encode_webview(msg)?)
    }

    pub fn send_raw(&self, text: impl Into<String>) -> Result<(), ProtocolError> {
        send_text(&self.tx, text.into())
    }

    pub fn try_recv(&self) -> Option<Result<NativeMessage, ProtocolError>> {
        next_text(&self.rx).map(|text| decode_native(&text))
    }
}
