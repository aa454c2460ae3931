use serde_json::Value;

use crate::core::{Attrs, Document, ElementNode, Editor, Node, Point, Selection};
use crate::ops::{Op, Path, Transaction};
use crate::plugin::{
    CommandError, CommandSpec, NodeSpec, NormalizePass, PlatePlugin, PluginRegistry, QuerySpec,
    visit_containers,
};
use crate::util::{
    ancestor_element_path, children_at_path, element_at_path, ordered_selection_points,
    retype_selected_blocks, retyped_block, selected_text_blocks,
};

pub const MAX_HEADING_LEVEL: u64 = 3;

pub struct HeadingPlugin;

impl PlatePlugin for HeadingPlugin {
    fn id(&self) -> &'static str {
        "heading"
    }

    fn node_specs(&self) -> Vec<NodeSpec> {
        vec![NodeSpec::text_block("heading")]
    }

    fn normalize_passes(&self) -> Vec<Box<dyn NormalizePass>> {
        vec![Box::new(NormalizeHeadingLevels)]
    }

    fn commands(&self) -> Vec<CommandSpec> {
        vec![
            CommandSpec::new("heading.toggle", |editor, args| {
                let level = level_arg(args.as_ref())?;
                toggle_heading(editor, level).map_err(CommandError::new)
            }),
            CommandSpec::new("heading.unset", |editor, _args| {
                retype_selected_blocks(editor, "command:heading.unset", |el| {
                    (el.kind == "heading").then(|| retyped_block(el, "paragraph", Attrs::default()))
                })
                .map_err(CommandError::new)
            }),
        ]
    }

    fn queries(&self) -> Vec<QuerySpec> {
        vec![
            QuerySpec::new("heading.is_active", |editor, args| {
                let level = args
                    .as_ref()
                    .and_then(|v| v.get("level"))
                    .and_then(|v| v.as_u64())
                    .unwrap_or(1);
                Ok(Value::Bool(is_heading_active(editor, level)))
            }),
            QuerySpec::new("heading.level", |editor, _args| {
                Ok(active_heading_level(editor).map_or(Value::Null, Value::from))
            }),
        ]
    }
}

fn level_arg(args: Option<&Value>) -> Result<u64, CommandError> {
    let level = args
        .and_then(|v| v.get("level"))
        .and_then(|v| v.as_u64())
        .ok_or_else(|| CommandError::new("Missing args.level"))?;
    if !(1..=MAX_HEADING_LEVEL).contains(&level) {
        return Err(CommandError::new(format!("Unsupported heading level: {level}")));
    }
    Ok(level)
}

pub fn heading_level(el: &ElementNode) -> Option<u64> {
    (el.kind == "heading").then(|| el.attr_u64("level").unwrap_or(1).clamp(1, MAX_HEADING_LEVEL))
}

fn heading_attrs(level: u64) -> Attrs {
    let mut attrs = Attrs::default();
    attrs.insert("level".to_string(), Value::from(level));
    attrs
}

/// True when every selected text block is a heading at `level`.
pub fn is_heading_active(editor: &Editor, level: u64) -> bool {
    let blocks = selected_text_blocks(editor.doc(), editor.registry(), editor.selection());
    !blocks.is_empty() && blocks.iter().all(|b| heading_level(b.el) == Some(level))
}

fn active_heading_level(editor: &Editor) -> Option<u64> {
    let blocks = selected_text_blocks(editor.doc(), editor.registry(), editor.selection());
    let first = heading_level(blocks.first()?.el)?;
    blocks
        .iter()
        .all(|b| heading_level(b.el) == Some(first))
        .then_some(first)
}

fn toggle_heading(editor: &Editor, level: u64) -> Result<Transaction, String> {
    let source = "command:heading.toggle";
    if is_heading_active(editor, level) {
        return retype_selected_blocks(editor, source, |el| {
            Some(retyped_block(el, "paragraph", Attrs::default()))
        });
    }

    retype_selected_blocks(editor, source, |el| match el.kind.as_str() {
        "paragraph" | "heading" => Some(retyped_block(el, "heading", heading_attrs(level))),
        _ => None,
    })
}

struct NormalizeHeadingLevels;

impl NormalizePass for NormalizeHeadingLevels {
    fn id(&self) -> &'static str {
        "heading.normalize_levels"
    }

    fn run(&self, doc: &Document, registry: &PluginRegistry) -> Vec<Op> {
        let mut ops = Vec::new();
        visit_containers(doc, registry, &mut |children, parent_path| {
            for (ix, node) in children.iter().enumerate() {
                let Node::Element(el) = node else {
                    continue;
                };
                let Some(level) = heading_level(el) else {
                    continue;
                };
                if el.attr_u64("level") == Some(level) {
                    continue;
                }
                let mut path = parent_path.to_vec();
                path.push(ix);
                ops.push(Op::SetNodeAttrs {
                    path,
                    patch: crate::core::AttrPatch::set("level", Value::from(level)),
                });
            }
        });
        ops
    }
}

pub struct BlockquotePlugin;

impl PlatePlugin for BlockquotePlugin {
    fn id(&self) -> &'static str {
        "blockquote"
    }

    fn node_specs(&self) -> Vec<NodeSpec> {
        vec![NodeSpec::container("blockquote")]
    }

    fn normalize_passes(&self) -> Vec<Box<dyn NormalizePass>> {
        vec![Box::new(NormalizeBlockquoteChildren)]
    }

    fn commands(&self) -> Vec<CommandSpec> {
        vec![
            CommandSpec::new("blockquote.toggle", |editor, _args| {
                let tx = if is_in_blockquote(editor) {
                    unwrap_selected_blockquotes(editor)
                } else {
                    wrap_selection_in_blockquote(editor)
                };
                tx.map_err(CommandError::new)
            }),
            CommandSpec::new("blockquote.wrap_selection", |editor, _args| {
                wrap_selection_in_blockquote(editor).map_err(CommandError::new)
            }),
            CommandSpec::new("blockquote.unwrap", |editor, _args| {
                unwrap_selected_blockquotes(editor).map_err(CommandError::new)
            }),
        ]
    }

    fn queries(&self) -> Vec<QuerySpec> {
        vec![QuerySpec::flag("blockquote.is_active", is_in_blockquote)]
    }
}

/// True when every selected text block sits inside a blockquote.
pub fn is_in_blockquote(editor: &Editor) -> bool {
    let quotes = enclosing_blockquotes(editor);
    !quotes.is_empty() && quotes.iter().all(Option::is_some)
}

// The nearest blockquote around each selected text block, in document order.
fn enclosing_blockquotes(editor: &Editor) -> Vec<Option<Path>> {
    selected_text_blocks(editor.doc(), editor.registry(), editor.selection())
        .iter()
        .map(|block| ancestor_element_path(editor.doc(), &block.path, "blockquote"))
        .collect()
}

fn child_path(parent: &[usize], ix: usize) -> Path {
    let mut path = parent.to_vec();
    path.push(ix);
    path
}

// Rewrites both selection ends; points `remap` declines are kept as they are.
fn remap_selection(sel: &Selection, remap: impl Fn(&Point) -> Option<Point>) -> Selection {
    let moved = |point: &Point| remap(point).unwrap_or_else(|| point.clone());
    Selection::range(moved(&sel.anchor), moved(&sel.focus))
}

/// Moves the sibling blocks from the selection start through the selection end into a
/// new blockquote at the position of the first one.
fn wrap_selection_in_blockquote(editor: &Editor) -> Result<Transaction, String> {
    let source = "command:blockquote.wrap_selection";
    let sel = editor.selection();
    let (start, end) = ordered_selection_points(sel);
    let block_of = |point: &Point| -> Option<(usize, Path)> {
        let (_, block) = point.path.split_last()?;
        let (&ix, parent) = block.split_last()?;
        Some((ix, parent.to_vec()))
    };
    let (first, parent) = block_of(&start).ok_or("Selection start is not in a block")?;
    let (last, end_parent) = block_of(&end).ok_or("Selection end is not in a block")?;

    // Blocks under different containers cannot be wrapped together.
    if parent != end_parent {
        return Ok(Transaction::empty(source));
    }
    let (first, last) = (first.min(last), first.max(last));

    let siblings =
        children_at_path(editor.doc(), &parent).ok_or("Selection parent is not a container")?;
    let wrapped = siblings
        .get(first..=last)
        .ok_or("Selection block range is out of bounds")?
        .to_vec();

    let mut ops: Vec<Op> = (first..=last)
        .rev()
        .map(|ix| Op::RemoveNode {
            path: child_path(&parent, ix),
        })
        .collect();
    ops.push(Op::InsertNode {
        path: child_path(&parent, first),
        node: Node::blockquote(wrapped),
    });

    let depth = parent.len();
    let selection_after = remap_selection(sel, |point| {
        if point.path.len() < depth + 2 || !point.path.starts_with(&parent) {
            return None;
        }
        let ix = point.path[depth];
        if !(first..=last).contains(&ix) {
            return None;
        }
        let mut path = child_path(&parent, first);
        path.push(ix - first);
        path.extend_from_slice(&point.path[depth + 1..]);
        Some(Point::new(path, point.offset))
    });

    Ok(Transaction::new(ops)
        .selection_after(selection_after)
        .source(source))
}

/// Lifts the children of every blockquote around the selected blocks into its parent.
///
/// A blockquote nested inside another selected one goes out with its parent.
fn unwrap_selected_blockquotes(editor: &Editor) -> Result<Transaction, String> {
    let source = "command:blockquote.unwrap";
    let mut quotes: Vec<Path> = enclosing_blockquotes(editor).into_iter().flatten().collect();
    quotes.sort();
    quotes.dedup();
    let nested = |path: &Path| {
        quotes
            .iter()
            .any(|outer| outer.len() < path.len() && path.starts_with(outer))
    };
    let outermost: Vec<Path> = quotes.iter().filter(|path| !nested(*path)).cloned().collect();
    if outermost.is_empty() {
        return Ok(Transaction::empty(source));
    }

    // Last to first, so the paths of the earlier blockquotes stay valid.
    let mut ops = Vec::new();
    let mut selection = editor.selection().clone();
    for quote_path in outermost.iter().rev() {
        let (&quote_ix, parent) = quote_path.split_last().ok_or("Invalid blockquote path")?;
        let quote =
            element_at_path(editor.doc(), quote_path).ok_or("Blockquote node not found")?;

        ops.push(Op::RemoveNode {
            path: quote_path.clone(),
        });
        ops.extend(quote.children.iter().cloned().enumerate().map(|(i, node)| {
            Op::InsertNode {
                path: child_path(parent, quote_ix + i),
                node,
            }
        }));

        let lifted = quote.children.len();
        selection = remap_selection(&selection, |point| lift_point(point, quote_path, lifted));
    }

    Ok(Transaction::new(ops)
        .selection_after(selection)
        .source(source))
}

// Where `point` lands once the blockquote at `quote_path` is replaced by its `lifted`
// children. `None` when the point is unaffected.
fn lift_point(point: &Point, quote_path: &[usize], lifted: usize) -> Option<Point> {
    let (&quote_ix, parent) = quote_path.split_last()?;
    let depth = parent.len();
    if point.path.len() <= depth || !point.path.starts_with(parent) {
        return None;
    }

    let ix = point.path[depth];
    let mut path = point.path.clone();
    if ix == quote_ix {
        let child = *point.path.get(depth + 1)?;
        path.remove(depth + 1);
        path[depth] = quote_ix + child;
    } else if ix > quote_ix {
        path[depth] = ix + lifted - 1;
    } else {
        return None;
    }
    Some(Point::new(path, point.offset))
}

struct NormalizeBlockquoteChildren;

impl NormalizePass for NormalizeBlockquoteChildren {
    fn id(&self) -> &'static str {
        "blockquote.ensure_non_empty"
    }

    fn run(&self, doc: &Document, registry: &PluginRegistry) -> Vec<Op> {
        let mut ops = Vec::new();
        visit_containers(doc, registry, &mut |children, parent_path| {
            let empty_quotes = children.iter().enumerate().filter(|(_, node)| match node {
                Node::Element(el) => el.kind == "blockquote" && el.children.is_empty(),
                _ => false,
            });
            for (ix, _) in empty_quotes {
                let mut path = child_path(parent_path, ix);
                path.push(0);
                ops.push(Op::InsertNode {
                    path,
                    node: Node::paragraph(""),
                });
            }
        });
        ops
    }
}
