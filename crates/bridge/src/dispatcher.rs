//! Editor-side session: receives host messages, drives the engine and emits state.

use std::collections::VecDeque;

use tracing::{debug, info, warn};
use webtext_plate_core::Selection;

use crate::bridge::EditorEndpoint;
use crate::config::{BridgeConfig, ContentPolicy, NoopPolicy, PreReadyPolicy};
use crate::engine::{DocumentEngine, PlateEngine, ValueMark};
use crate::error::{ProtocolError, record_diagnostic};
use crate::projector::project;
use crate::protocol::{FocusCommand, NativeMessage, WebViewMessage};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Uninitialised,
    Ready,
}

/// One mounted editor. Owns its engine; outgoing messages collect in an outbox
/// until they are taken or flushed to an endpoint.
pub struct EditorSession<E: DocumentEngine = PlateEngine> {
    engine: E,
    config: BridgeConfig,
    phase: SessionPhase,
    pending: VecDeque<NativeMessage>,
    outbox: Vec<WebViewMessage>,
    diagnostics: Vec<ProtocolError>,
}

impl EditorSession<PlateEngine> {
    pub fn with_config(config: BridgeConfig) -> Self {
        let engine = PlateEngine::new(&config);
        Self::new(engine, config)
    }
}

impl<E: DocumentEngine> EditorSession<E> {
    pub fn new(engine: E, config: BridgeConfig) -> Self {
        Self {
            engine,
            config,
            phase: SessionPhase::Uninitialised,
            pending: VecDeque::new(),
            outbox: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Recent protocol errors seen by this session, oldest first.
    pub fn diagnostics(&self) -> &[ProtocolError] {
        &self.diagnostics
    }

    pub fn take_diagnostics(&mut self) -> Vec<ProtocolError> {
        std::mem::take(&mut self.diagnostics)
    }

    /// Messages held back until the session is ready.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Signals that the engine is ready. The first call emits `editorInitialised`
    /// and replays queued messages; later calls do nothing.
    pub fn boot(&mut self) {
        if self.phase == SessionPhase::Ready {
            debug!("editor session already booted");
            return;
        }
        self.phase = SessionPhase::Ready;
        self.outbox.push(WebViewMessage::EditorInitialised);
        info!(queued = self.pending.len(), "editor initialised");

        while let Some(msg) = self.pending.pop_front() {
            self.dispatch(msg);
        }
    }

    /// Handles one decoded host message.
    pub fn receive(&mut self, msg: NativeMessage) {
        if self.phase == SessionPhase::Ready {
            self.dispatch(msg);
            return;
        }
        match self.config.pre_ready {
            PreReadyPolicy::Queue => {
                debug!(kind = msg.kind(), "queueing message until the editor is ready");
                self.pending.push_back(msg);
            }
            PreReadyPolicy::Drop => {
                warn!(kind = msg.kind(), "dropping message received before the editor was ready");
            }
        }
    }

    /// Decodes and handles raw wire text. Decode failures are reported, never fatal.
    pub fn receive_text(&mut self, text: &str) {
        match crate::codec::decode_native(text) {
            Ok(msg) => self.receive(msg),
            Err(err) => self.report(err),
        }
    }

    /// Moves the selection from the surface itself (caret movement, clicks).
    pub fn select(&mut self, selection: Selection) {
        if self.engine.set_selection(selection) {
            self.emit_state();
        }
    }

    /// Keyboard input from the surface.
    pub fn type_text(&mut self, text: &str) {
        if self.engine.insert_text(text) {
            self.emit_state();
        }
    }

    pub fn take_outgoing(&mut self) -> Vec<WebViewMessage> {
        std::mem::take(&mut self.outbox)
    }

    /// Sends everything in the outbox, in order.
    pub fn flush(&mut self, endpoint: &EditorEndpoint) -> Result<(), ProtocolError> {
        for msg in self.outbox.drain(..) {
            endpoint.send(&msg)?;
        }
        Ok(())
    }

    /// Handles every message waiting on the endpoint, then flushes. Returns how many
    /// inbound messages were read, including ones that failed to decode.
    pub fn pump(&mut self, endpoint: &EditorEndpoint) -> Result<usize, ProtocolError> {
        let mut read = 0;
        while let Some(received) = endpoint.try_recv() {
            read += 1;
            match received {
                Ok(msg) => self.receive(msg),
                Err(err) => self.report(err),
            }
        }
        self.flush(endpoint)?;
        Ok(read)
    }

    fn report(&mut self, err: ProtocolError) {
        warn!(error = %err, "dropping inbound message");
        record_diagnostic(&mut self.diagnostics, err);
    }

    fn dispatch(&mut self, msg: NativeMessage) {
        debug!(kind = msg.kind(), "dispatching");
        match msg {
            NativeMessage::Action(action) => {
                let changed = self.engine.apply_command(action);
                self.after_command(changed);
            }
            NativeMessage::Editor(FocusCommand::Focus) => {
                self.engine.focus();
                self.after_command(false);
            }
            NativeMessage::Editor(FocusCommand::Blur) => {
                self.engine.blur();
                self.after_command(false);
            }
            NativeMessage::InitialContent(html) => {
                if self.config.content == ContentPolicy::IgnoreIfDirty && self.engine.is_dirty() {
                    warn!("ignoring initial content: the document has local edits");
                    return;
                }
                self.engine.replace_content(&html);
                self.emit_state();
            }
            NativeMessage::InsertImage(url) => {
                let changed = self.engine.insert_image(&url);
                self.after_command(changed);
            }
            NativeMessage::InsertVideo(video) => {
                let changed = self
                    .engine
                    .insert_embed(&video.url, video.width, video.height);
                self.after_command(changed);
            }
            NativeMessage::SetColor(value) => {
                let changed = self.engine.set_mark_with_value(ValueMark::Color, &value);
                self.after_command(changed);
            }
            NativeMessage::SetHighlight(value) => {
                let changed = self
                    .engine
                    .set_mark_with_value(ValueMark::Highlight, &value);
                self.after_command(changed);
            }
        }
    }

    fn after_command(&mut self, changed: bool) {
        if changed || self.config.noop == NoopPolicy::Echo {
            self.emit_state();
        }
    }

    fn emit_state(&mut self) {
        // Nothing may reach the host before `editorInitialised`.
        if self.phase != SessionPhase::Ready {
            return;
        }
        let state = project(&self.engine);
        self.outbox.push(WebViewMessage::EditorStateUpdate(Box::new(state)));
    }
}
