use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::apply::clamp_to_char_boundary;
use crate::blocks::{BlockquotePlugin, HeadingPlugin};
use crate::core::{Document, Editor, ElementNode, Marks, Node, Point, Selection};
use crate::list::ListPlugin;
use crate::marks::MarksPlugin;
use crate::media::{DividerPlugin, EmbedBounds, ImagePlugin, VideoPlugin};
use crate::ops::{Op, Transaction};
use crate::util::{first_text_point, normalize_point_to_existing_text};

/// A command could not be planned or applied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct CommandError {
    message: String,
}

impl CommandError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct QueryError {
    message: String,
}

impl QueryError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("node kind `{0}` is registered twice")]
    DuplicateKind(String),
    #[error("command `{0}` is registered twice")]
    DuplicateCommand(String),
    #[error("query `{0}` is registered twice")]
    DuplicateQuery(String),
}

/// Plans the transaction for a command. An empty transaction means "not applicable".
pub type CommandHandler =
    Arc<dyn Fn(&Editor, Option<Value>) -> Result<Transaction, CommandError> + Send + Sync>;

pub type QueryHandler =
    Arc<dyn Fn(&Editor, Option<Value>) -> Result<Value, QueryError> + Send + Sync>;

#[derive(Clone)]
pub struct CommandSpec {
    pub id: String,
    pub handler: CommandHandler,
}

impl CommandSpec {
    pub fn new(
        id: impl Into<String>,
        handler: impl Fn(&Editor, Option<Value>) -> Result<Transaction, CommandError>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        Self {
            id: id.into(),
            handler: Arc::new(handler),
        }
    }
}

#[derive(Clone)]
pub struct QuerySpec {
    pub id: String,
    pub handler: QueryHandler,
}

impl QuerySpec {
    pub fn new(
        id: impl Into<String>,
        handler: impl Fn(&Editor, Option<Value>) -> Result<Value, QueryError>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        Self {
            id: id.into(),
            handler: Arc::new(handler),
        }
    }

    /// A query that ignores its arguments and answers with a bool.
    pub fn flag(id: impl Into<String>, f: fn(&Editor) -> bool) -> Self {
        Self::new(id, move |editor, _args| Ok(Value::Bool(f(editor))))
    }
}

/// What a node kind may contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChildConstraint {
    /// Void nodes.
    None,
    /// Containers such as blockquotes.
    BlockOnly,
    /// Text blocks: paragraphs, headings and list items.
    InlineOnly,
    Any,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSpec {
    pub kind: String,
    pub children: ChildConstraint,
}

impl NodeSpec {
    fn of(kind: &str, children: ChildConstraint) -> Self {
        Self {
            kind: kind.to_string(),
            children,
        }
    }

    pub fn text_block(kind: &str) -> Self {
        Self::of(kind, ChildConstraint::InlineOnly)
    }

    pub fn container(kind: &str) -> Self {
        Self::of(kind, ChildConstraint::BlockOnly)
    }

    pub fn void_block(kind: &str) -> Self {
        Self::of(kind, ChildConstraint::None)
    }
}

pub trait NormalizePass: Send + Sync {
    fn id(&self) -> &'static str;
    fn run(&self, doc: &Document, registry: &PluginRegistry) -> Vec<Op>;
}

#[derive(Debug, Clone)]
pub struct TransactionPreview {
    pub doc: Document,
    pub selection: Selection,
}

/// A bundle of node kinds, normalize passes, commands and queries.
pub trait PlatePlugin: Send + Sync {
    fn id(&self) -> &'static str;
    fn node_specs(&self) -> Vec<NodeSpec> {
        Vec::new()
    }
    fn normalize_passes(&self) -> Vec<Box<dyn NormalizePass>> {
        Vec::new()
    }
    fn commands(&self) -> Vec<CommandSpec> {
        Vec::new()
    }
    fn queries(&self) -> Vec<QuerySpec> {
        Vec::new()
    }
}

#[derive(Default)]
pub struct PluginRegistry {
    node_specs: HashMap<String, NodeSpec>,
    normalize_passes: Vec<Box<dyn NormalizePass>>,
    commands: HashMap<String, CommandSpec>,
    queries: HashMap<String, QuerySpec>,
}

fn insert_unique<T, E>(
    map: &mut HashMap<String, T>,
    key: String,
    value: T,
    duplicate: impl FnOnce(String) -> E,
) -> Result<(), E> {
    match map.entry(key) {
        Entry::Occupied(slot) => Err(duplicate(slot.key().clone())),
        Entry::Vacant(slot) => {
            slot.insert(value);
            Ok(())
        }
    }
}

impl PluginRegistry {
    pub fn new(
        plugins: impl IntoIterator<Item = Box<dyn PlatePlugin>>,
    ) -> Result<Self, RegistryError> {
        let mut registry = Self::default();
        for plugin in plugins {
            registry.register_plugin(plugin)?;
        }
        Ok(registry)
    }

    fn from_builtin(plugins: Vec<Box<dyn PlatePlugin>>) -> Self {
        match Self::new(plugins) {
            Ok(registry) => registry,
            // Built-in plugins never collide; a collision is a programming error.
            Err(err) => panic!("built-in plugins failed to register: {err}"),
        }
    }

    /// Paragraphs, plain text input and the structural normalize passes.
    pub fn core() -> Self {
        Self::from_builtin(core_plugins())
    }

    pub fn richtext() -> Self {
        Self::richtext_with_embed_bounds(EmbedBounds::default())
    }

    pub fn richtext_with_embed_bounds(bounds: EmbedBounds) -> Self {
        let mut plugins = core_plugins();
        let richtext: Vec<Box<dyn PlatePlugin>> = vec![
            Box::new(MarksPlugin),
            Box::new(HeadingPlugin),
            Box::new(BlockquotePlugin),
            Box::new(ListPlugin),
            Box::new(DividerPlugin),
            Box::new(ImagePlugin),
            Box::new(VideoPlugin::new(bounds)),
        ];
        plugins.extend(richtext);
        Self::from_builtin(plugins)
    }

    pub fn register_plugin(&mut self, plugin: Box<dyn PlatePlugin>) -> Result<(), RegistryError> {
        for spec in plugin.node_specs() {
            insert_unique(
                &mut self.node_specs,
                spec.kind.clone(),
                spec,
                RegistryError::DuplicateKind,
            )?;
        }
        for cmd in plugin.commands() {
            insert_unique(
                &mut self.commands,
                cmd.id.clone(),
                cmd,
                RegistryError::DuplicateCommand,
            )?;
        }
        for query in plugin.queries() {
            insert_unique(
                &mut self.queries,
                query.id.clone(),
                query,
                RegistryError::DuplicateQuery,
            )?;
        }
        self.normalize_passes.extend(plugin.normalize_passes());
        Ok(())
    }

    pub fn node_specs(&self) -> &HashMap<String, NodeSpec> {
        &self.node_specs
    }

    pub fn command(&self, id: &str) -> Option<CommandSpec> {
        self.commands.get(id).cloned()
    }

    pub fn query(&self, id: &str) -> Option<QuerySpec> {
        self.queries.get(id).cloned()
    }

    /// Kinds without a spec accept anything.
    pub fn child_constraint(&self, kind: &str) -> ChildConstraint {
        self.node_specs
            .get(kind)
            .map_or(ChildConstraint::Any, |spec| spec.children)
    }

    /// Ops from the first pass that still has work, or nothing once the document is
    /// normalized.
    pub fn normalize(&self, doc: &Document) -> Vec<Op> {
        // Passes share one snapshot, so running several per round could collide on paths.
        self.normalize_passes
            .iter()
            .map(|pass| pass.run(doc, self))
            .find(|ops| !ops.is_empty())
            .unwrap_or_default()
    }

    /// Moves each end of the selection onto an existing text position.
    pub fn normalize_selection(&self, doc: &Document, selection: &Selection) -> Selection {
        let snap = |point: &Point| normalize_point_to_existing_text(doc, point);
        let anchor = snap(&selection.anchor)
            .or_else(|| snap(&selection.focus))
            .or_else(|| first_text_point(doc))
            .unwrap_or_else(|| Point::new(vec![0], 0));
        let focus = snap(&selection.focus).unwrap_or_else(|| anchor.clone());
        Selection { anchor, focus }
    }
}

fn core_plugins() -> Vec<Box<dyn PlatePlugin>> {
    vec![
        Box::new(CoreParagraphPlugin),
        Box::new(CoreNormalizePlugin),
        Box::new(CoreTextPlugin),
    ]
}

/// Walks every container in document order, calling `visit` with each child list and
/// its parent path. Text blocks are not descended into.
pub(crate) fn visit_containers(
    doc: &Document,
    registry: &PluginRegistry,
    visit: &mut dyn FnMut(&[Node], &[usize]),
) {
    visit_container(&doc.children, &[], registry, visit);
}

fn visit_container(
    children: &[Node],
    path: &[usize],
    registry: &PluginRegistry,
    visit: &mut dyn FnMut(&[Node], &[usize]),
) {
    visit(children, path);
    let containers = children.iter().enumerate().filter_map(|(ix, node)| match node {
        Node::Element(el) if registry.child_constraint(&el.kind) != ChildConstraint::InlineOnly => {
            Some((ix, el))
        }
        _ => None,
    });
    for (ix, el) in containers {
        let mut child = path.to_vec();
        child.push(ix);
        visit_container(&el.children, &child, registry, visit);
    }
}

// Text blocks as seen by the normalize passes: inline-only elements under any container.
fn for_each_text_block(
    doc: &Document,
    registry: &PluginRegistry,
    mut f: impl FnMut(&ElementNode, Vec<usize>),
) {
    visit_containers(doc, registry, &mut |children, parent| {
        for (ix, node) in children.iter().enumerate() {
            match node {
                Node::Element(el)
                    if registry.child_constraint(&el.kind) == ChildConstraint::InlineOnly =>
                {
                    let mut path = parent.to_vec();
                    path.push(ix);
                    f(el, path);
                }
                _ => {}
            }
        }
    });
}

struct CoreParagraphPlugin;

impl PlatePlugin for CoreParagraphPlugin {
    fn id(&self) -> &'static str {
        "core.paragraph"
    }

    fn node_specs(&self) -> Vec<NodeSpec> {
        vec![NodeSpec::text_block("paragraph")]
    }
}

struct CoreTextPlugin;

impl PlatePlugin for CoreTextPlugin {
    fn id(&self) -> &'static str {
        "core.text"
    }

    fn commands(&self) -> Vec<CommandSpec> {
        // Types over the caret, replacing a selection within one leaf.
        vec![CommandSpec::new("text.insert", |editor, args| {
            let text = args
                .as_ref()
                .and_then(|v| v.get("text"))
                .and_then(Value::as_str)
                .ok_or_else(|| CommandError::new("Missing args.text"))?;
            insert_text(editor, text).map_err(CommandError::new)
        })]
    }
}

fn insert_text(editor: &Editor, text: &str) -> Result<Transaction, String> {
    let source = "command:text.insert";
    let sel = editor.selection();
    if sel.anchor.path != sel.focus.path {
        return Err("Selection spans several text leaves".into());
    }
    let path = &sel.focus.path;
    let Some(Node::Text(leaf)) = crate::util::node_at_path(editor.doc(), path) else {
        return Err("Selection is not in a text node".into());
    };

    let (lo, hi) = if sel.anchor.offset <= sel.focus.offset {
        (sel.anchor.offset, sel.focus.offset)
    } else {
        (sel.focus.offset, sel.anchor.offset)
    };
    let start = clamp_to_char_boundary(&leaf.text, lo);
    let end = clamp_to_char_boundary(&leaf.text, hi);

    let remove = (start < end).then(|| Op::RemoveText {
        path: path.clone(),
        range: start..end,
    });
    let insert = (!text.is_empty()).then(|| Op::InsertText {
        path: path.clone(),
        offset: start,
        text: text.to_string(),
    });
    let ops: Vec<Op> = remove.into_iter().chain(insert).collect();
    if ops.is_empty() {
        return Ok(Transaction::empty(source));
    }

    let caret = Point::new(path.clone(), start + text.len());
    Ok(Transaction::new(ops)
        .selection_after(Selection::collapsed(caret))
        .source(source))
}

struct CoreNormalizePlugin;

impl PlatePlugin for CoreNormalizePlugin {
    fn id(&self) -> &'static str {
        "core.normalize"
    }

    fn normalize_passes(&self) -> Vec<Box<dyn NormalizePass>> {
        vec![
            Box::new(EnsureNonEmptyDocument),
            Box::new(EnsureTextBlockHasTextLeaf),
            Box::new(MergeAdjacentTextLeaves),
        ]
    }
}

/// An empty document gets a single empty paragraph.
struct EnsureNonEmptyDocument;

impl NormalizePass for EnsureNonEmptyDocument {
    fn id(&self) -> &'static str {
        "core.ensure_non_empty_document"
    }

    fn run(&self, doc: &Document, _registry: &PluginRegistry) -> Vec<Op> {
        if !doc.children.is_empty() {
            return Vec::new();
        }
        vec![Op::InsertNode {
            path: vec![0],
            node: Node::paragraph(""),
        }]
    }
}

struct EnsureTextBlockHasTextLeaf;

impl NormalizePass for EnsureTextBlockHasTextLeaf {
    fn id(&self) -> &'static str {
        "core.ensure_text_block_has_text_leaf"
    }

    fn run(&self, doc: &Document, registry: &PluginRegistry) -> Vec<Op> {
        let mut ops = Vec::new();
        for_each_text_block(doc, registry, |el, mut path| {
            if !el.children.iter().any(|n| matches!(n, Node::Text(_))) {
                path.push(0);
                ops.push(Op::InsertNode {
                    path,
                    node: Node::text("", Marks::default()),
                });
            }
        });
        ops
    }
}

struct MergeAdjacentTextLeaves;

impl NormalizePass for MergeAdjacentTextLeaves {
    fn id(&self) -> &'static str {
        "core.merge_adjacent_text_leaves"
    }

    fn run(&self, doc: &Document, registry: &PluginRegistry) -> Vec<Op> {
        let mut ops = Vec::new();
        for_each_text_block(doc, registry, |el, path| {
            merge_leaves_in_block(&el.children, &path, &mut ops);
        });
        ops
    }
}

// Each run of equal-mark leaves collapses into its first leaf. Runs are handled right to
// left so earlier paths stay valid, and each follower is folded in one at a time so the
// caret follows the merged text.
fn merge_leaves_in_block(children: &[Node], block_path: &[usize], ops: &mut Vec<Op>) {
    let leaf = |ix: usize| match &children[ix] {
        Node::Text(t) => Some(t),
        _ => None,
    };
    let child = |ix: usize| {
        let mut path = block_path.to_vec();
        path.push(ix);
        path
    };

    let mut end = children.len();
    while let Some(last) = end.checked_sub(1) {
        let Some(tail) = leaf(last) else {
            end = last;
            continue;
        };
        let first = (0..last)
            .rev()
            .take_while(|&ix| leaf(ix).is_some_and(|t| t.marks == tail.marks))
            .last()
            .unwrap_or(last);
        end = first;
        let Some(head) = leaf(first).filter(|_| first < last) else {
            continue;
        };

        let (head_path, follower_path) = (child(first), child(first + 1));
        let mut head_len = head.text.len();
        for follower in (first + 1..=last).filter_map(leaf) {
            if !follower.text.is_empty() {
                ops.push(Op::InsertText {
                    path: head_path.clone(),
                    offset: head_len,
                    text: follower.text.clone(),
                });
                head_len += follower.text.len();
            }
            ops.push(Op::RemoveNode {
                path: follower_path.clone(),
            });
        }
    }
}
