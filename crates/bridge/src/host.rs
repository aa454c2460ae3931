//! Native-side controller: keeps the last editor state and turns toolbar input into
//! messages. Rendering is left to the embedding application.

use tracing::{debug, warn};

use crate::bridge::HostEndpoint;
use crate::config::BridgeConfig;
use crate::error::{ProtocolError, record_diagnostic};
use crate::protocol::{
    ActionId, EditorState, FocusCommand, NativeMessage, VideoEmbed, WebViewMessage,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Control {
    Bold,
    Italic,
    Strike,
    Underline,
    BulletList,
    OrderedList,
    TaskList,
    H1,
    H2,
    H3,
    Quote,
    Sink,
    Lift,
    HorizontalRule,
    Undo,
    Redo,
    Color,
    Highlight,
}

impl Control {
    /// Toolbar order.
    pub const ALL: [Control; 18] = [
        Control::Bold,
        Control::Italic,
        Control::Strike,
        Control::Underline,
        Control::BulletList,
        Control::OrderedList,
        Control::TaskList,
        Control::H1,
        Control::H2,
        Control::H3,
        Control::Quote,
        Control::Sink,
        Control::Lift,
        Control::HorizontalRule,
        Control::Undo,
        Control::Redo,
        Control::Color,
        Control::Highlight,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Control::Bold => "Bold",
            Control::Italic => "Italic",
            Control::Strike => "Strike",
            Control::Underline => "Underline",
            Control::BulletList => "Bullets",
            Control::OrderedList => "Numbers",
            Control::TaskList => "Tasks",
            Control::H1 => "H1",
            Control::H2 => "H2",
            Control::H3 => "H3",
            Control::Quote => "Quote",
            Control::Sink => "Sink",
            Control::Lift => "Lift",
            Control::HorizontalRule => "HR",
            Control::Undo => "Undo",
            Control::Redo => "Redo",
            Control::Color => "Color",
            Control::Highlight => "Highlight",
        }
    }

    /// The action a press sends. Color and Highlight open the picker instead.
    pub fn action(self) -> Option<ActionId> {
        let action = match self {
            Control::Bold => ActionId::ToggleBold,
            Control::Italic => ActionId::ToggleItalic,
            Control::Strike => ActionId::ToggleStrike,
            Control::Underline => ActionId::ToggleUnderline,
            Control::BulletList => ActionId::ToggleBulletListItem,
            Control::OrderedList => ActionId::ToggleOrderedListItem,
            Control::TaskList => ActionId::ToggleTaskListItem,
            Control::H1 => ActionId::ToggleH1,
            Control::H2 => ActionId::ToggleH2,
            Control::H3 => ActionId::ToggleH3,
            Control::Quote => ActionId::ToggleBlockquote,
            Control::Sink => ActionId::SinkListItem,
            Control::Lift => ActionId::LiftListItem,
            Control::HorizontalRule => ActionId::SetHorizontalRule,
            Control::Undo => ActionId::Undo,
            Control::Redo => ActionId::Redo,
            Control::Color | Control::Highlight => return None,
        };
        Some(action)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlState {
    pub control: Control,
    pub active: bool,
    pub enabled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickerMode {
    Color,
    Highlight,
}

impl PickerMode {
    fn control(self) -> Control {
        match self {
            PickerMode::Color => Control::Color,
            PickerMode::Highlight => Control::Highlight,
        }
    }
}

pub struct HostController {
    endpoint: HostEndpoint,
    state: EditorState,
    initialised: bool,
    content: Option<String>,
    picker: Option<PickerMode>,
    palette: Vec<String>,
    diagnostics: Vec<ProtocolError>,
}

impl HostController {
    pub fn new(endpoint: HostEndpoint, config: &BridgeConfig) -> Self {
        Self {
            endpoint,
            state: EditorState::default(),
            initialised: false,
            content: None,
            picker: None,
            palette: config.palette.clone(),
            diagnostics: Vec::new(),
        }
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    pub fn is_initialised(&self) -> bool {
        self.initialised
    }

    pub fn picker(&self) -> Option<PickerMode> {
        self.picker
    }

    pub fn palette(&self) -> &[String] {
        &self.palette
    }

    pub fn diagnostics(&self) -> &[ProtocolError] {
        &self.diagnostics
    }

    pub fn take_diagnostics(&mut self) -> Vec<ProtocolError> {
        std::mem::take(&mut self.diagnostics)
    }

    pub fn endpoint(&self) -> &HostEndpoint {
        &self.endpoint
    }

    /// Supplies content from outside the editor. Each distinct value is sent once;
    /// it is sent again when the editor announces it is initialised.
    pub fn set_content(&mut self, html: impl Into<String>) -> Result<bool, ProtocolError> {
        let html = html.into();
        if self.content.as_deref() == Some(html.as_str()) {
            return Ok(false);
        }
        self.endpoint
            .send(&NativeMessage::InitialContent(html.clone()))?;
        self.content = Some(html);
        Ok(true)
    }

    pub fn toolbar(&self) -> Vec<ControlState> {
        Control::ALL
            .into_iter()
            .map(|control| ControlState {
                control,
                active: self.is_active(control),
                enabled: self.is_enabled(control),
            })
            .collect()
    }

    pub fn control_state(&self, control: Control) -> ControlState {
        ControlState {
            control,
            active: self.is_active(control),
            enabled: self.is_enabled(control),
        }
    }

    fn is_active(&self, control: Control) -> bool {
        let s = &self.state;
        match control {
            Control::Bold => s.is_bold_active,
            Control::Italic => s.is_italic_active,
            Control::Strike => s.is_strike_active,
            Control::Underline => s.is_underline_active,
            Control::BulletList => s.is_bullet_list_active,
            Control::OrderedList => s.is_ordered_list_active,
            Control::TaskList => s.is_task_list_active,
            Control::H1 => s.is_h1_active,
            Control::H2 => s.is_h2_active,
            Control::H3 => s.is_h3_active,
            Control::Quote => s.is_blockquote_active,
            Control::Sink | Control::Lift | Control::HorizontalRule => false,
            Control::Undo | Control::Redo => false,
            Control::Color => self.picker == Some(PickerMode::Color),
            Control::Highlight => self.picker == Some(PickerMode::Highlight),
        }
    }

    fn is_enabled(&self, control: Control) -> bool {
        let s = &self.state;
        match control {
            Control::Bold => s.can_bold,
            Control::Italic => s.can_italic,
            Control::Strike => s.can_strike,
            Control::Underline => s.can_underline,
            Control::BulletList => s.can_bullet_list,
            Control::OrderedList => s.can_ordered_list,
            Control::TaskList => s.can_task_list,
            Control::H1 => s.can_h1,
            Control::H2 => s.can_h2,
            Control::H3 => s.can_h3,
            Control::Quote => s.can_blockquote,
            Control::Sink => s.can_sink_list_item,
            Control::Lift => s.can_lift_list_item,
            Control::HorizontalRule => s.can_horizontal_rule,
            Control::Undo => s.can_undo,
            Control::Redo => s.can_redo,
            Control::Color => s.can_set_color,
            Control::Highlight => s.can_set_highlight,
        }
    }

    /// Handles a toolbar press. Returns whether anything happened; disabled
    /// controls do nothing.
    pub fn press(&mut self, control: Control) -> Result<bool, ProtocolError> {
        if !self.is_enabled(control) {
            debug!(control = control.label(), "ignoring press on a disabled control");
            return Ok(false);
        }
        match control.action() {
            Some(action) => {
                self.endpoint.send(&NativeMessage::Action(action))?;
            }
            None => {
                let mode = match control {
                    Control::Highlight => PickerMode::Highlight,
                    _ => PickerMode::Color,
                };
                self.picker = if self.picker == Some(mode) {
                    None
                } else {
                    Some(mode)
                };
            }
        }
        Ok(true)
    }

    /// Applies a swatch in the open picker's mode and closes the picker.
    pub fn pick(&mut self, color: impl Into<String>) -> Result<bool, ProtocolError> {
        let Some(mode) = self.picker else {
            return Ok(false);
        };
        let color = color.into();
        let msg = match mode {
            PickerMode::Color => NativeMessage::SetColor(color),
            PickerMode::Highlight => NativeMessage::SetHighlight(color),
        };
        self.endpoint.send(&msg)?;
        self.picker = None;
        Ok(true)
    }

    /// Clears the open picker's mark and closes the picker.
    pub fn unset(&mut self) -> Result<bool, ProtocolError> {
        let Some(mode) = self.picker else {
            return Ok(false);
        };
        let (enabled, action) = match mode {
            PickerMode::Color => (self.state.can_unset_color, ActionId::UnsetColor),
            PickerMode::Highlight => (self.state.can_unset_highlight, ActionId::UnsetHighlight),
        };
        self.picker = None;
        if !enabled {
            debug!(control = mode.control().label(), "nothing to unset");
            return Ok(false);
        }
        self.endpoint.send(&NativeMessage::Action(action))?;
        Ok(true)
    }

    pub fn insert_image(&self, url: impl Into<String>) -> Result<(), ProtocolError> {
        self.endpoint.send(&NativeMessage::InsertImage(url.into()))
    }

    pub fn insert_video(
        &self,
        url: impl Into<String>,
        width: Option<f64>,
        height: Option<f64>,
    ) -> Result<(), ProtocolError> {
        self.endpoint.send(&NativeMessage::InsertVideo(VideoEmbed {
            url: url.into(),
            width,
            height,
        }))
    }

    pub fn focus_editor(&self) -> Result<(), ProtocolError> {
        self.endpoint.send(&NativeMessage::Editor(FocusCommand::Focus))
    }

    pub fn blur_editor(&self) -> Result<(), ProtocolError> {
        self.endpoint.send(&NativeMessage::Editor(FocusCommand::Blur))
    }

    /// Handles every message waiting from the editor, in arrival order, and returns
    /// the ones that decoded.
    pub fn pump(&mut self) -> Result<Vec<WebViewMessage>, ProtocolError> {
        let mut handled = Vec::new();
        while let Some(received) = self.endpoint.try_recv() {
            match received {
                Ok(msg) => {
                    self.handle(&msg)?;
                    handled.push(msg);
                }
                Err(err) => {
                    warn!(error = %err, "dropping message from the editor");
                    record_diagnostic(&mut self.diagnostics, err);
                }
            }
        }
        Ok(handled)
    }

    fn handle(&mut self, msg: &WebViewMessage) -> Result<(), ProtocolError> {
        match msg {
            WebViewMessage::EditorInitialised => {
                self.initialised = true;
                // Content sent before the editor was listening may have been lost.
                if let Some(html) = &self.content {
                    self.endpoint
                        .send(&NativeMessage::InitialContent(html.clone()))?;
                }
            }
            WebViewMessage::EditorStateUpdate(state) => {
                self.state = (**state).clone();
            }
        }
        Ok(())
    }
}
