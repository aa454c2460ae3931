//! The engine boundary the dispatcher talks to, and its plate-core implementation.

use serde_json::{Value, json};
use tracing::{debug, error};
use webtext_plate_core::{
    Document, Editor, EditorConfig, ListType, Marks, Node, PluginRegistry, Point, Selection,
    StructuredDocument, is_heading_active, is_in_blockquote, is_list_active, is_mark_active,
    parse_html, selection_marks, to_html,
};

use crate::config::BridgeConfig;
use crate::protocol::ActionId;

/// Formatting that can be reported as active at the selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    Bold,
    Italic,
    Strike,
    Underline,
    BulletList,
    OrderedList,
    TaskList,
    Heading(u8),
    Blockquote,
}

/// Marks that carry a value rather than an on/off state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueMark {
    Color,
    Highlight,
}

/// Black-box document engine owned by one editor session.
///
/// Mutating calls report whether they changed anything. An inapplicable call is a
/// no-op, never an error.
pub trait DocumentEngine {
    fn apply_command(&mut self, action: ActionId) -> bool;
    fn query_applicable(&self, action: ActionId) -> bool;
    fn query_active(&self, feature: Feature) -> bool;

    /// Value of the mark at the selection, if any.
    fn active_value(&self, mark: ValueMark) -> Option<String>;
    /// True when a value mark could be set at the selection.
    fn can_set_mark(&self, mark: ValueMark) -> bool;
    fn set_mark_with_value(&mut self, mark: ValueMark, value: &str) -> bool;
    fn unset_mark(&mut self, mark: ValueMark) -> bool;

    /// Replaces the whole document. History restarts and the caret moves to the start.
    fn replace_content(&mut self, html: &str);
    fn serialize_html(&self) -> String;
    fn serialize_structured(&self) -> StructuredDocument;
    /// True once the document has local edits since the last replacement.
    fn is_dirty(&self) -> bool;

    fn insert_image(&mut self, url: &str) -> bool;
    fn insert_embed(&mut self, url: &str, width: Option<f64>, height: Option<f64>) -> bool;

    fn focus(&mut self);
    fn blur(&mut self);
    fn is_focused(&self) -> bool;

    /// Moves the selection; returns whether it changed.
    fn set_selection(&mut self, selection: Selection) -> bool;
    /// Types text over the selection, the way the surface does for keyboard input.
    fn insert_text(&mut self, text: &str) -> bool;
}

pub struct PlateEngine {
    editor: Editor,
    focused: bool,
}

impl PlateEngine {
    pub fn new(config: &BridgeConfig) -> Self {
        let doc = Document {
            children: vec![Node::paragraph("")],
        };
        let selection = Selection::collapsed(Point::new(vec![0, 0], 0));
        let editor = Editor::with_config(
            doc,
            selection,
            PluginRegistry::richtext_with_embed_bounds(config.embed),
            EditorConfig {
                max_undo: config.max_undo,
                ..EditorConfig::default()
            },
        );
        Self {
            editor,
            focused: false,
        }
    }

    pub fn editor(&self) -> &Editor {
        &self.editor
    }

    fn run(&mut self, id: &str, args: Option<Value>) -> bool {
        let tx = match self.editor.plan_command(id, args) {
            Ok(tx) => tx,
            Err(err) => {
                debug!(command = id, reason = %err, "command not applicable");
                return false;
            }
        };
        if tx.is_empty() {
            return false;
        }
        let source = tx.meta.source.clone().unwrap_or_default();
        match self.editor.apply(tx) {
            Ok(()) => true,
            Err(err) => {
                error!(
                    command = id,
                    %source,
                    error = %err,
                    "planned transaction failed to apply"
                );
                false
            }
        }
    }

    fn value_mark_commands(mark: ValueMark) -> (&'static str, &'static str) {
        match mark {
            ValueMark::Color => ("marks.set_text_color", "marks.unset_text_color"),
            ValueMark::Highlight => ("marks.set_highlight_color", "marks.unset_highlight_color"),
        }
    }
}

impl Default for PlateEngine {
    fn default() -> Self {
        Self::new(&BridgeConfig::default())
    }
}

// Plate command and arguments behind each action. Undo and redo go to the history.
fn command_for(action: ActionId) -> Option<(&'static str, Option<Value>)> {
    let list = |ty: ListType| Some(json!({ "type": ty.as_str() }));
    let heading = |level: u64| Some(json!({ "level": level }));
    let command = match action {
        ActionId::Undo | ActionId::Redo => return None,
        ActionId::ToggleBold => ("marks.toggle_bold", None),
        ActionId::ToggleItalic => ("marks.toggle_italic", None),
        ActionId::ToggleStrike => ("marks.toggle_strikethrough", None),
        ActionId::ToggleUnderline => ("marks.toggle_underline", None),
        ActionId::ToggleBulletListItem => ("list.toggle", list(ListType::Bulleted)),
        ActionId::ToggleOrderedListItem => ("list.toggle", list(ListType::Ordered)),
        ActionId::ToggleTaskListItem => ("list.toggle", list(ListType::Task)),
        ActionId::SinkListItem => ("list.sink", None),
        ActionId::LiftListItem => ("list.lift", None),
        ActionId::ToggleH1 => ("heading.toggle", heading(1)),
        ActionId::ToggleH2 => ("heading.toggle", heading(2)),
        ActionId::ToggleH3 => ("heading.toggle", heading(3)),
        ActionId::ToggleBlockquote => ("blockquote.toggle", None),
        ActionId::SetHorizontalRule => ("divider.insert", None),
        ActionId::UnsetColor => (PlateEngine::value_mark_commands(ValueMark::Color).1, None),
        ActionId::UnsetHighlight => {
            (PlateEngine::value_mark_commands(ValueMark::Highlight).1, None)
        }
    };
    Some(command)
}

impl DocumentEngine for PlateEngine {
    fn apply_command(&mut self, action: ActionId) -> bool {
        match action {
            ActionId::Undo => self.editor.undo(),
            ActionId::Redo => self.editor.redo(),
            ActionId::UnsetColor => self.unset_mark(ValueMark::Color),
            ActionId::UnsetHighlight => self.unset_mark(ValueMark::Highlight),
            _ => match command_for(action) {
                Some((id, args)) => self.run(id, args),
                None => false,
            },
        }
    }

    fn query_applicable(&self, action: ActionId) -> bool {
        match action {
            ActionId::Undo => self.editor.can_undo(),
            ActionId::Redo => self.editor.can_redo(),
            _ => command_for(action)
                .is_some_and(|(id, args)| self.editor.can_run_command(id, args)),
        }
    }

    fn query_active(&self, feature: Feature) -> bool {
        let editor = &self.editor;
        match feature {
            Feature::Bold => is_mark_active(editor, |m: &Marks| m.bold),
            Feature::Italic => is_mark_active(editor, |m: &Marks| m.italic),
            Feature::Strike => is_mark_active(editor, |m: &Marks| m.strikethrough),
            Feature::Underline => is_mark_active(editor, |m: &Marks| m.underline),
            Feature::BulletList => is_list_active(editor, ListType::Bulleted),
            Feature::OrderedList => is_list_active(editor, ListType::Ordered),
            Feature::TaskList => is_list_active(editor, ListType::Task),
            Feature::Heading(level) => is_heading_active(editor, u64::from(level)),
            Feature::Blockquote => is_in_blockquote(editor),
        }
    }

    fn active_value(&self, mark: ValueMark) -> Option<String> {
        let marks = selection_marks(&self.editor);
        match mark {
            ValueMark::Color => marks.text_color,
            ValueMark::Highlight => marks.highlight_color,
        }
    }

    fn can_set_mark(&self, _mark: ValueMark) -> bool {
        self.editor
            .run_query::<bool>("marks.accepts_marks", None)
            .unwrap_or(false)
    }

    fn set_mark_with_value(&mut self, mark: ValueMark, value: &str) -> bool {
        let (set, _) = Self::value_mark_commands(mark);
        self.run(set, Some(json!({ "color": value })))
    }

    fn unset_mark(&mut self, mark: ValueMark) -> bool {
        let (_, unset) = Self::value_mark_commands(mark);
        self.run(unset, None)
    }

    fn replace_content(&mut self, html: &str) {
        self.editor.replace_document(parse_html(html));
    }

    fn serialize_html(&self) -> String {
        to_html(self.editor.doc())
    }

    fn serialize_structured(&self) -> StructuredDocument {
        StructuredDocument::from_document(self.editor.doc().clone())
    }

    fn is_dirty(&self) -> bool {
        self.editor.is_dirty()
    }

    fn insert_image(&mut self, url: &str) -> bool {
        self.run("image.insert", Some(json!({ "src": url })))
    }

    fn insert_embed(&mut self, url: &str, width: Option<f64>, height: Option<f64>) -> bool {
        self.run(
            "video.insert",
            Some(json!({ "src": url, "width": width, "height": height })),
        )
    }

    fn focus(&mut self) {
        self.focused = true;
    }

    fn blur(&mut self) {
        self.focused = false;
    }

    fn is_focused(&self) -> bool {
        self.focused
    }

    fn set_selection(&mut self, selection: Selection) -> bool {
        let before = self.editor.selection().clone();
        self.editor.set_selection(selection);
        self.editor.selection() != &before
    }

    fn insert_text(&mut self, text: &str) -> bool {
        self.run("text.insert", Some(json!({ "text": text })))
    }
}
