//! Inline marks: bold, italic, underline, strikethrough, text color and highlight.

use serde_json::Value;

use crate::apply::clamp_to_char_boundary;
use crate::core::{Editor, ElementNode, Marks, Node, Point, Selection, TextNode};
use crate::ops::{Op, Transaction};
use crate::plugin::{CommandError, CommandSpec, PlatePlugin, QueryError, QuerySpec};
use crate::util::{
    TextBlock, apply_marks_in_block, element_is_text_block, is_point_in_block, node_at_path,
    ordered_selection_points, point_for_global_offset, point_global_offset, selected_text_blocks,
    text_leaves_in_range, total_inline_text_len,
};

pub struct MarksPlugin;

impl PlatePlugin for MarksPlugin {
    fn id(&self) -> &'static str {
        "marks"
    }

    fn commands(&self) -> Vec<CommandSpec> {
        vec![
            bool_mark_command("marks.toggle_bold", |m| m.bold, |m, v| m.bold = v),
            bool_mark_command("marks.toggle_italic", |m| m.italic, |m, v| m.italic = v),
            bool_mark_command("marks.toggle_underline", |m| m.underline, |m, v| m.underline = v),
            bool_mark_command(
                "marks.toggle_strikethrough",
                |m| m.strikethrough,
                |m, v| m.strikethrough = v,
            ),
            CommandSpec::new("marks.set_text_color", |editor, args| {
                let color = color_arg(args.as_ref())?;
                set_value_mark(
                    editor,
                    |m, v| m.text_color = v,
                    Some(color),
                    "command:marks.set_text_color",
                )
                .map_err(CommandError::new)
            }),
            CommandSpec::new("marks.unset_text_color", |editor, _args| {
                set_value_mark(
                    editor,
                    |m, v| m.text_color = v,
                    None,
                    "command:marks.unset_text_color",
                )
                .map_err(CommandError::new)
            }),
            CommandSpec::new("marks.set_highlight_color", |editor, args| {
                let color = color_arg(args.as_ref())?;
                set_value_mark(
                    editor,
                    |m, v| m.highlight_color = v,
                    Some(color),
                    "command:marks.set_highlight_color",
                )
                .map_err(CommandError::new)
            }),
            CommandSpec::new("marks.unset_highlight_color", |editor, _args| {
                set_value_mark(
                    editor,
                    |m, v| m.highlight_color = v,
                    None,
                    "command:marks.unset_highlight_color",
                )
                .map_err(CommandError::new)
            }),
        ]
    }

    fn queries(&self) -> Vec<QuerySpec> {
        vec![
            QuerySpec::new("marks.get_active", |editor, _args| {
                serde_json::to_value(selection_marks(editor))
                    .map_err(|err| QueryError::new(format!("Failed to encode marks: {err}")))
            }),
            QuerySpec::flag("marks.is_bold_active", |editor| {
                is_mark_active(editor, |m| m.bold)
            }),
            QuerySpec::flag("marks.is_italic_active", |editor| {
                is_mark_active(editor, |m| m.italic)
            }),
            QuerySpec::flag("marks.is_underline_active", |editor| {
                is_mark_active(editor, |m| m.underline)
            }),
            QuerySpec::flag("marks.is_strikethrough_active", |editor| {
                is_mark_active(editor, |m| m.strikethrough)
            }),
            QuerySpec::flag("marks.accepts_marks", focus_in_text_block),
        ]
    }
}

fn bool_mark_command(
    id: &'static str,
    get: fn(&Marks) -> bool,
    set: fn(&mut Marks, bool),
) -> CommandSpec {
    let source = format!("command:{id}");
    CommandSpec::new(id, move |editor, _args| {
        toggle_bool_mark(editor, get, set, &source).map_err(CommandError::new)
    })
}

fn color_arg(args: Option<&Value>) -> Result<String, CommandError> {
    args.and_then(|v| v.get("color"))
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or_else(|| CommandError::new("Missing args.color"))
}

/// Marks of the text leaf holding the selection focus.
pub fn focus_marks(editor: &Editor) -> Marks {
    match node_at_path(editor.doc(), &editor.selection().focus.path) {
        Some(Node::Text(text)) => text.marks.clone(),
        _ => Marks::default(),
    }
}

/// Marks describing the selection: the focus leaf at a caret, otherwise the first
/// non-empty selected leaf.
pub fn selection_marks(editor: &Editor) -> Marks {
    let sel = editor.selection();
    if sel.is_collapsed() {
        return focus_marks(editor);
    }
    selected_ranges(editor, sel)
        .iter()
        .flat_map(|range| range.leaves())
        .find(|leaf| !leaf.text.is_empty())
        .map(|leaf| leaf.marks.clone())
        .unwrap_or_else(|| focus_marks(editor))
}

/// At a caret the focus leaf decides; over a range every non-empty selected leaf must
/// carry the mark.
pub fn is_mark_active(editor: &Editor, get: fn(&Marks) -> bool) -> bool {
    let sel = editor.selection();
    if sel.is_collapsed() {
        return get(&focus_marks(editor));
    }

    let mut seen_any = false;
    for range in selected_ranges(editor, sel) {
        for leaf in range.leaves() {
            if leaf.text.is_empty() {
                continue;
            }
            seen_any = true;
            if !get(&leaf.marks) {
                return false;
            }
        }
    }
    seen_any
}

fn focus_in_text_block(editor: &Editor) -> bool {
    let focus = &editor.selection().focus;
    let Some((_, block_path)) = focus.path.split_last() else {
        return false;
    };
    let Some(Node::Element(block)) = node_at_path(editor.doc(), block_path) else {
        return false;
    };
    element_is_text_block(block, editor.registry())
        && matches!(node_at_path(editor.doc(), &focus.path), Some(Node::Text(_)))
}

struct BlockRange<'a> {
    block: TextBlock<'a>,
    start_global: usize,
    end_global: usize,
}

impl<'a> BlockRange<'a> {
    fn leaves(&self) -> impl Iterator<Item = &'a TextNode> + use<'a> {
        let el: &'a ElementNode = self.block.el;
        text_leaves_in_range(&el.children, self.start_global, self.end_global)
    }
}

// Non-empty slices of each selected text block, in document order.
fn selected_ranges<'a>(editor: &'a Editor, sel: &Selection) -> Vec<BlockRange<'a>> {
    let (start, end) = ordered_selection_points(sel);
    let blocks = selected_text_blocks(editor.doc(), editor.registry(), sel);
    let last = blocks.len().saturating_sub(1);

    blocks
        .into_iter()
        .enumerate()
        .filter_map(|(ix, block)| {
            let children = block.el.children.as_slice();
            let total_len = total_inline_text_len(children);
            let start_global = if ix == 0 {
                point_global_offset(children, start.path.last().copied().unwrap_or(0), start.offset)
            } else {
                0
            };
            let end_global = if ix == last {
                point_global_offset(children, end.path.last().copied().unwrap_or(0), end.offset)
            } else {
                total_len
            };
            (start_global < end_global).then_some(BlockRange {
                block,
                start_global,
                end_global,
            })
        })
        .collect()
}

fn toggle_bool_mark(
    editor: &Editor,
    get: fn(&Marks) -> bool,
    set: fn(&mut Marks, bool),
    source: &str,
) -> Result<Transaction, String> {
    let sel = editor.selection().clone();
    if sel.is_collapsed() {
        let target = !get(&focus_marks(editor));
        return mark_at_caret(editor, |mut marks| {
            set(&mut marks, target);
            marks
        })
        .map(|planned| planned.into_transaction(source));
    }

    let target = !is_mark_active(editor, get);
    apply_mark_range(editor, &sel, &|mut marks: Marks| {
        set(&mut marks, target);
        marks
    })
    .map(|planned| planned.into_transaction(source))
}

fn set_value_mark(
    editor: &Editor,
    set: fn(&mut Marks, Option<String>),
    value: Option<String>,
    source: &str,
) -> Result<Transaction, String> {
    let sel = editor.selection().clone();
    let apply = move |mut marks: Marks| {
        set(&mut marks, value.clone());
        marks
    };
    let planned = if sel.is_collapsed() {
        mark_at_caret(editor, apply)?
    } else {
        apply_mark_range(editor, &sel, &apply)?
    };
    Ok(planned.into_transaction(source))
}

struct PlannedMarks {
    ops: Vec<Op>,
    selection_after: Selection,
}

impl PlannedMarks {
    fn into_transaction(self, source: &str) -> Transaction {
        if self.ops.is_empty() {
            return Transaction::empty(source);
        }
        Transaction::new(self.ops)
            .selection_after(self.selection_after)
            .source(source)
    }
}

// Splits the focus leaf around the caret and leaves an empty leaf carrying the new
// marks, so the next typed text picks them up.
fn mark_at_caret(
    editor: &Editor,
    apply: impl Fn(Marks) -> Marks,
) -> Result<PlannedMarks, String> {
    let focus = editor.selection().focus.clone();
    let (child_ix, block_path) = focus
        .path
        .split_last()
        .ok_or_else(|| "Selection is not in a text node".to_string())?;

    let Some(Node::Element(_)) = node_at_path(editor.doc(), block_path) else {
        return Err("Selection is not in a text block".into());
    };
    let Some(Node::Text(text)) = node_at_path(editor.doc(), &focus.path) else {
        return Err("Selection is not in a text node".into());
    };

    let marks_before = text.marks.clone();
    let marks_after = apply(marks_before.clone());
    if marks_after == marks_before {
        return Ok(PlannedMarks {
            ops: Vec::new(),
            selection_after: editor.selection().clone(),
        });
    }

    if text.text.is_empty() {
        return Ok(PlannedMarks {
            ops: vec![Op::SetTextMarks {
                path: focus.path.clone(),
                marks: marks_after,
            }],
            selection_after: Selection::collapsed(Point::new(focus.path.clone(), 0)),
        });
    }

    let cursor = clamp_to_char_boundary(&text.text, focus.offset);
    let (left, right) = text.text.split_at(cursor);
    let pieces = [
        Node::text(left, marks_before.clone()),
        Node::text("", marks_after),
        Node::text(right, marks_before),
    ];
    // Drop empty outer pieces; the middle leaf is the caret's new home.
    let replacement: Vec<Node> = pieces
        .into_iter()
        .enumerate()
        .filter(|(i, node)| *i == 1 || !matches!(node, Node::Text(t) if t.text.is_empty()))
        .map(|(_, node)| node)
        .collect();
    let caret_ix = child_ix + usize::from(!left.is_empty());

    let ops = std::iter::once(Op::RemoveNode {
        path: focus.path.clone(),
    })
    .chain(insert_children(block_path, *child_ix, replacement))
    .collect();

    let mut caret_path = block_path.to_vec();
    caret_path.push(caret_ix);
    Ok(PlannedMarks {
        ops,
        selection_after: Selection::collapsed(Point::new(caret_path, 0)),
    })
}

// Inserts `nodes` as consecutive children of `block_path`, starting at `first`.
fn insert_children(
    block_path: &[usize],
    first: usize,
    nodes: Vec<Node>,
) -> impl Iterator<Item = Op> {
    let block_path = block_path.to_vec();
    nodes.into_iter().enumerate().map(move |(i, node)| {
        let mut path = block_path.clone();
        path.push(first + i);
        Op::InsertNode { path, node }
    })
}

fn apply_mark_range(
    editor: &Editor,
    sel: &Selection,
    apply: &dyn Fn(Marks) -> Marks,
) -> Result<PlannedMarks, String> {
    let ranges = selected_ranges(editor, sel);
    if ranges.is_empty() && selected_text_blocks(editor.doc(), editor.registry(), sel).is_empty() {
        return Err("Selection is not in a text block".into());
    }

    let mut ops: Vec<Op> = Vec::new();
    let mut new_anchor = sel.anchor.clone();
    let mut new_focus = sel.focus.clone();

    for range in &ranges {
        let changes = range
            .leaves()
            .any(|leaf| apply(leaf.marks.clone()) != leaf.marks);
        if !changes {
            continue;
        }

        let block = &range.block;
        let children = block.el.children.as_slice();
        let new_children =
            apply_marks_in_block(children, range.start_global, range.end_global, apply);

        ops.extend((0..children.len()).rev().map(|child_ix| {
            let mut path = block.path.clone();
            path.push(child_ix);
            Op::RemoveNode { path }
        }));
        ops.extend(insert_children(&block.path, 0, new_children.clone()));

        for point in [&mut new_anchor, &mut new_focus] {
            if is_point_in_block(point, &block.path) {
                let child_ix = point.path.last().copied().unwrap_or(0);
                let global = point_global_offset(children, child_ix, point.offset);
                *point = point_for_global_offset(&block.path, &new_children, global);
            }
        }
    }

    Ok(PlannedMarks {
        ops,
        selection_after: Selection::range(new_anchor, new_focus),
    })
}
