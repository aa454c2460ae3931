use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::apply::ApplyError;
use crate::history::{Direction, History, UndoRecord};
use crate::ops::{Op, Path, Transaction};
use crate::plugin::{CommandError, PluginRegistry, QueryError, TransactionPreview};
use crate::util::first_text_point;

pub type Attrs = BTreeMap<String, serde_json::Value>;
pub type ElementKind = String;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Document {
    #[serde(default)]
    pub children: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum Node {
    Element(ElementNode),
    Text(TextNode),
    Void(VoidNode),
}

impl Node {
    fn element(kind: &str, attrs: Attrs, children: Vec<Node>) -> Self {
        Node::Element(ElementNode {
            kind: kind.to_string(),
            attrs,
            children,
        })
    }

    fn void(kind: &str, attrs: Attrs) -> Self {
        Node::Void(VoidNode {
            kind: kind.to_string(),
            attrs,
        })
    }

    pub fn text(text: impl Into<String>, marks: Marks) -> Self {
        Node::Text(TextNode {
            text: text.into(),
            marks,
        })
    }

    fn plain(text: impl Into<String>) -> Vec<Node> {
        vec![Node::text(text, Marks::default())]
    }

    pub fn paragraph(text: impl Into<String>) -> Self {
        Self::element("paragraph", Attrs::default(), Self::plain(text))
    }

    pub fn heading(level: u64, text: impl Into<String>) -> Self {
        let attrs = Attrs::from([("level".to_string(), Value::from(level))]);
        Self::element("heading", attrs, Self::plain(text))
    }

    /// A list item of `list_type` (`bulleted`, `ordered` or `task`) nested `level` deep.
    pub fn list_item(list_type: &str, level: u64, text: impl Into<String>) -> Self {
        let mut attrs = Attrs::from([("list_type".to_string(), Value::from(list_type))]);
        if level > 0 {
            attrs.insert("list_level".to_string(), Value::from(level));
        }
        if list_type == "task" {
            attrs.insert("checked".to_string(), Value::Bool(false));
        }
        Self::element("list_item", attrs, Self::plain(text))
    }

    pub fn blockquote(children: Vec<Node>) -> Self {
        Self::element("blockquote", Attrs::default(), children)
    }

    pub fn divider() -> Self {
        Self::void("divider", Attrs::default())
    }

    pub fn image(src: impl Into<String>, alt: Option<String>) -> Self {
        let mut attrs = Attrs::from([("src".to_string(), Value::String(src.into()))]);
        if let Some(alt) = alt {
            attrs.insert("alt".to_string(), Value::String(alt));
        }
        Self::void("image", attrs)
    }

    pub fn video(src: impl Into<String>, width: u64, height: u64) -> Self {
        Self::void(
            "video",
            Attrs::from([
                ("src".to_string(), Value::String(src.into())),
                ("width".to_string(), Value::from(width)),
                ("height".to_string(), Value::from(height)),
            ]),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementNode {
    pub kind: ElementKind,
    #[serde(default)]
    pub attrs: Attrs,
    #[serde(default)]
    pub children: Vec<Node>,
}

impl ElementNode {
    pub fn attr_str(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).and_then(|v| v.as_str())
    }

    pub fn attr_u64(&self, key: &str) -> Option<u64> {
        self.attrs.get(key).and_then(|v| v.as_u64())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoidNode {
    pub kind: ElementKind,
    #[serde(default)]
    pub attrs: Attrs,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextNode {
    pub text: String,
    #[serde(default)]
    pub marks: Marks,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Marks {
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
    #[serde(default)]
    pub underline: bool,
    #[serde(default)]
    pub strikethrough: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highlight_color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    #[serde(default)]
    pub path: Path,
    pub offset: usize,
}

impl Point {
    pub fn new(path: Path, offset: usize) -> Self {
        Self { path, offset }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub anchor: Point,
    pub focus: Point,
}

impl Selection {
    pub fn collapsed(point: Point) -> Self {
        Self {
            anchor: point.clone(),
            focus: point,
        }
    }

    pub fn range(anchor: Point, focus: Point) -> Self {
        Self { anchor, focus }
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }
}

const DEFAULT_MAX_UNDO: usize = 200;
const DEFAULT_NORMALIZE_ROUNDS: usize = 100;

/// Editor limits. Zero means "use the default".
#[derive(Debug, Clone, Default)]
pub struct EditorConfig {
    pub max_undo: usize,
    pub max_normalize_iterations: usize,
}

impl EditorConfig {
    fn undo_limit(&self) -> usize {
        if self.max_undo == 0 {
            DEFAULT_MAX_UNDO
        } else {
            self.max_undo
        }
    }

    fn normalize_rounds(&self) -> usize {
        if self.max_normalize_iterations == 0 {
            DEFAULT_NORMALIZE_ROUNDS
        } else {
            self.max_normalize_iterations
        }
    }
}

pub struct Editor {
    doc: Document,
    selection: Selection,
    registry: PluginRegistry,
    normalize_rounds: usize,
    history: History,
    dirty: bool,
}

impl Editor {
    pub fn new(doc: Document, selection: Selection, registry: PluginRegistry) -> Self {
        Self::with_config(doc, selection, registry, EditorConfig::default())
    }

    pub fn with_config(
        doc: Document,
        selection: Selection,
        registry: PluginRegistry,
        config: EditorConfig,
    ) -> Self {
        let mut editor = Self {
            doc,
            selection,
            registry,
            normalize_rounds: config.normalize_rounds(),
            history: History::new(config.undo_limit()),
            dirty: false,
        };
        editor.normalize_in_place();
        editor
    }

    pub fn with_richtext_plugins() -> Self {
        let doc = Document {
            children: vec![Node::paragraph("")],
        };
        Self::new(doc, Selection::collapsed(Point::new(vec![0, 0], 0)), PluginRegistry::richtext())
    }

    pub fn doc(&self) -> &Document {
        &self.doc
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn set_selection(&mut self, selection: Selection) {
        self.selection = self.registry.normalize_selection(&self.doc, &selection);
    }

    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    /// True once any transaction, undo or redo has run since the last document replacement.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Swaps in a whole new document.
    ///
    /// The replacement becomes a new history root: both undo and redo stacks are
    /// cleared, and the caret moves to the first text position.
    pub fn replace_document(&mut self, doc: Document) {
        self.doc = doc;
        self.history.clear();
        self.dirty = false;
        if let Err(err) = self.normalize_with_inverse_ops() {
            warn!(error = %err, "replacement document did not normalize cleanly");
        }
        let start = first_text_point(&self.doc).unwrap_or(Point::new(vec![0, 0], 0));
        self.set_selection(Selection::collapsed(start));
    }

    pub fn can_undo(&self) -> bool {
        self.history.has(Direction::Undo)
    }

    pub fn can_redo(&self) -> bool {
        self.history.has(Direction::Redo)
    }

    pub fn undo(&mut self) -> bool {
        self.step(Direction::Undo)
    }

    pub fn redo(&mut self) -> bool {
        self.step(Direction::Redo)
    }

    fn step(&mut self, direction: Direction) -> bool {
        let Some(entry) = self.history.pop(direction) else {
            return false;
        };
        let UndoRecord {
            inverse_ops,
            selection_before,
            selection_after,
        } = entry;

        let mut reverted = Vec::with_capacity(inverse_ops.len());
        for op in inverse_ops {
            match self.apply_op(op) {
                Ok(inverse) => reverted.push(inverse),
                Err(err) => {
                    // The rest of the entry no longer lines up with the document.
                    warn!(error = %err, ?direction, "history replay stopped early");
                    break;
                }
            }
        }
        reverted.reverse();

        self.selection = match direction {
            Direction::Undo => selection_before.clone(),
            Direction::Redo => selection_after.clone(),
        };
        self.normalize_in_place();
        self.dirty = true;

        self.history.push_opposite(
            direction,
            UndoRecord {
                inverse_ops: reverted,
                selection_before,
                selection_after,
            },
        );
        true
    }

    pub fn apply(&mut self, tx: Transaction) -> Result<(), ApplyError> {
        let selection_before = self.selection.clone();
        let Transaction {
            ops,
            selection_after,
            meta,
        } = tx;
        debug!(
            source = meta.source.as_deref().unwrap_or("unknown"),
            ops = ops.len(),
            "applying transaction"
        );

        let mut inverse_ops = ops
            .into_iter()
            .map(|op| self.apply_op(op))
            .collect::<Result<Vec<_>, _>>()?;
        if let Some(sel) = selection_after {
            self.selection = sel;
        }
        inverse_ops.extend(self.normalize_with_inverse_ops()?);
        inverse_ops.reverse();
        self.clamp_selection();

        self.history.record(UndoRecord {
            inverse_ops,
            selection_before,
            selection_after: self.selection.clone(),
        });
        self.dirty = true;
        Ok(())
    }

    /// Applies `tx` to a scratch copy and returns the normalized result.
    pub fn preview_transaction(&self, tx: &Transaction) -> Result<TransactionPreview, ApplyError> {
        let mut doc = self.doc.clone();
        let mut selection = self.selection.clone();
        for op in &tx.ops {
            crate::apply::apply_op(&mut doc, &mut selection, op.clone())?;
        }
        if let Some(sel) = &tx.selection_after {
            selection = sel.clone();
        }
        normalize_to_fixpoint(&self.registry, self.normalize_rounds, &mut doc, &mut selection)?;
        let selection = self.registry.normalize_selection(&doc, &selection);
        Ok(TransactionPreview { doc, selection })
    }

    /// Builds the transaction a command would apply, without touching the document.
    pub fn plan_command(&self, id: &str, args: Option<Value>) -> Result<Transaction, CommandError> {
        let command = self
            .registry
            .command(id)
            .ok_or_else(|| CommandError::new(format!("Unknown command: {id}")))?;
        (command.handler)(self, args)
    }

    /// Runs a command and reports whether it changed anything.
    ///
    /// An inapplicable command plans an empty transaction and returns `Ok(false)`.
    pub fn run_command(&mut self, id: &str, args: Option<Value>) -> Result<bool, CommandError> {
        let tx = self.plan_command(id, args)?;
        if tx.is_empty() {
            return Ok(false);
        }
        self.apply(tx)
            .map_err(|e| CommandError::new(format!("Failed to apply {id}: {e}")))?;
        Ok(true)
    }

    pub fn can_run_command(&self, id: &str, args: Option<Value>) -> bool {
        self.plan_command(id, args)
            .is_ok_and(|tx| !tx.is_empty() && self.preview_transaction(&tx).is_ok())
    }

    pub fn run_query_json(&self, id: &str, args: Option<Value>) -> Result<Value, QueryError> {
        let query = self
            .registry
            .query(id)
            .ok_or_else(|| QueryError::new(format!("Unknown query: {id}")))?;
        (query.handler)(self, args)
    }

    pub fn run_query<T>(&self, id: &str, args: Option<Value>) -> Result<T, QueryError>
    where
        T: DeserializeOwned,
    {
        let value = self.run_query_json(id, args)?;
        serde_json::from_value(value)
            .map_err(|err| QueryError::new(format!("Failed to decode query result: {err}")))
    }

    fn normalize_in_place(&mut self) {
        if let Err(err) = self.normalize_with_inverse_ops() {
            warn!(error = %err, "normalization stopped early");
        }
        self.clamp_selection();
    }

    fn clamp_selection(&mut self) {
        self.selection = self.registry.normalize_selection(&self.doc, &self.selection);
    }

    fn normalize_with_inverse_ops(&mut self) -> Result<Vec<Op>, ApplyError> {
        normalize_to_fixpoint(
            &self.registry,
            self.normalize_rounds,
            &mut self.doc,
            &mut self.selection,
        )
    }

    fn apply_op(&mut self, op: Op) -> Result<Op, ApplyError> {
        crate::apply::apply_op(&mut self.doc, &mut self.selection, op)
    }
}

// Runs the registry's normalize passes until they stop producing ops. Returns the
// inverses of everything applied, in application order.
fn normalize_to_fixpoint(
    registry: &PluginRegistry,
    rounds: usize,
    doc: &mut Document,
    selection: &mut Selection,
) -> Result<Vec<Op>, ApplyError> {
    let mut inverses = Vec::new();
    for _ in 0..rounds {
        let ops = registry.normalize(doc);
        if ops.is_empty() {
            return Ok(inverses);
        }
        for op in ops {
            inverses.push(crate::apply::apply_op(doc, selection, op)?);
        }
    }
    Err(ApplyError::NormalizeDidNotConverge)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttrPatch {
    #[serde(default)]
    pub set: Attrs,
    #[serde(default)]
    pub remove: Vec<String>,
}

impl AttrPatch {
    pub fn set(key: impl Into<String>, value: Value) -> Self {
        let mut set = Attrs::default();
        set.insert(key.into(), value);
        Self {
            set,
            remove: Vec::new(),
        }
    }

    pub fn remove(key: impl Into<String>) -> Self {
        Self {
            set: Attrs::default(),
            remove: vec![key.into()],
        }
    }
}
