//! Tree and selection helpers shared by the plugins.

use std::cmp::Ordering;

use crate::apply::clamp_to_char_boundary;
use crate::core::{Attrs, Document, Editor, ElementNode, Marks, Node, Point, Selection, TextNode};
use crate::ops::{Op, Path, Transaction};
use crate::plugin::{ChildConstraint, PluginRegistry};

pub fn node_at_path<'a>(doc: &'a Document, path: &[usize]) -> Option<&'a Node> {
    let (&first, rest) = path.split_first()?;
    rest.iter()
        .try_fold(doc.children.get(first)?, |node, &ix| match node {
            Node::Element(el) => el.children.get(ix),
            Node::Void(_) | Node::Text(_) => None,
        })
}

pub fn element_at_path<'a>(doc: &'a Document, path: &[usize]) -> Option<&'a ElementNode> {
    match node_at_path(doc, path)? {
        Node::Element(el) => Some(el),
        _ => None,
    }
}

pub fn children_at_path<'a>(doc: &'a Document, parent_path: &[usize]) -> Option<&'a [Node]> {
    if parent_path.is_empty() {
        Some(&doc.children)
    } else {
        element_at_path(doc, parent_path).map(|el| el.children.as_slice())
    }
}

/// Nearest ancestor (or self) of `path` that is an element of `kind`.
pub fn ancestor_element_path(doc: &Document, path: &[usize], kind: &str) -> Option<Path> {
    (1..=path.len())
        .rev()
        .map(|depth| &path[..depth])
        .find(|prefix| element_at_path(doc, prefix).is_some_and(|el| el.kind == kind))
        .map(<[usize]>::to_vec)
}

pub fn first_text_point(doc: &Document) -> Option<Point> {
    first_text_point_under(&doc.children, &mut Vec::new())
}

fn first_text_point_under(children: &[Node], path: &mut Vec<usize>) -> Option<Point> {
    children.iter().enumerate().find_map(|(ix, node)| {
        path.push(ix);
        let found = match node {
            Node::Text(_) => Some(Point::new(path.clone(), 0)),
            Node::Element(el) => first_text_point_under(&el.children, path),
            Node::Void(_) => None,
        };
        path.pop();
        found
    })
}

/// Snaps `point` onto the closest text leaf along its path, clamping indices that run
/// past the end of a child list and offsets that run past the end of the text.
pub fn normalize_point_to_existing_text(doc: &Document, point: &Point) -> Option<Point> {
    if point.path.is_empty() {
        return None;
    }

    let mut resolved = Vec::with_capacity(point.path.len());
    let mut children = doc.children.as_slice();
    for &wanted in &point.path {
        let Some(last) = children.len().checked_sub(1) else {
            break;
        };
        let ix = wanted.min(last);
        resolved.push(ix);
        match &children[ix] {
            Node::Text(leaf) => {
                let offset = clamp_to_char_boundary(&leaf.text, point.offset);
                return Some(Point::new(resolved, offset));
            }
            Node::Element(el) => children = &el.children,
            Node::Void(_) => break,
        }
    }

    // The path ended on an element (or a void); descend to its first text leaf.
    match node_at_path(doc, &resolved)? {
        Node::Element(el) => first_text_point_under(&el.children, &mut resolved),
        _ => None,
    }
}

/// The selection's ends in document order.
pub fn ordered_selection_points(sel: &Selection) -> (Point, Point) {
    let (anchor, focus) = (&sel.anchor, &sel.focus);
    if (&focus.path, focus.offset) < (&anchor.path, anchor.offset) {
        (focus.clone(), anchor.clone())
    } else {
        (anchor.clone(), focus.clone())
    }
}

pub struct TextBlock<'a> {
    pub path: Path,
    pub el: &'a ElementNode,
}

pub fn element_is_text_block(el: &ElementNode, registry: &PluginRegistry) -> bool {
    match registry.node_specs().get(&el.kind).map(|s| &s.children) {
        Some(ChildConstraint::InlineOnly) => true,
        Some(_) => false,
        None => el.children.iter().any(|n| matches!(n, Node::Text(_))),
    }
}

pub fn text_blocks_in_order<'a>(
    doc: &'a Document,
    registry: &PluginRegistry,
) -> Vec<TextBlock<'a>> {
    let mut out = Vec::new();
    collect_text_blocks(&doc.children, &[], registry, &mut out);
    out
}

fn collect_text_blocks<'a>(
    nodes: &'a [Node],
    prefix: &[usize],
    registry: &PluginRegistry,
    out: &mut Vec<TextBlock<'a>>,
) {
    for (ix, node) in nodes.iter().enumerate() {
        let Node::Element(el) = node else {
            continue;
        };
        let mut path = prefix.to_vec();
        path.push(ix);
        if element_is_text_block(el, registry) {
            out.push(TextBlock { path, el });
        } else {
            collect_text_blocks(&el.children, &path, registry, out);
        }
    }
}

/// Text blocks touched by the selection, in document order.
///
/// Empty when either end of the selection is not inside a text block.
pub fn selected_text_blocks<'a>(
    doc: &'a Document,
    registry: &PluginRegistry,
    sel: &Selection,
) -> Vec<TextBlock<'a>> {
    let (start, end) = ordered_selection_points(sel);
    let (Some((_, from)), Some((_, to))) = (start.path.split_last(), end.path.split_last()) else {
        return Vec::new();
    };

    let blocks = text_blocks_in_order(doc, registry);
    let locate = |target: &[usize]| blocks.iter().position(|b| b.path == target);
    let (Some(a), Some(b)) = (locate(from), locate(to)) else {
        return Vec::new();
    };
    let (first, last) = (a.min(b), a.max(b));

    blocks.into_iter().skip(first).take(last - first + 1).collect()
}

fn inline_len(node: &Node) -> usize {
    match node {
        Node::Text(leaf) => leaf.text.len(),
        Node::Element(_) | Node::Void(_) => 0,
    }
}

/// Byte offset of a point measured across all text leaves of its block.
pub fn point_global_offset(children: &[Node], child_ix: usize, offset: usize) -> usize {
    let preceding: usize = children.iter().take(child_ix).map(inline_len).sum();
    let within = match children.get(child_ix) {
        Some(Node::Text(leaf)) => clamp_to_char_boundary(&leaf.text, offset),
        _ => 0,
    };
    preceding + within
}

/// Inverse of [`point_global_offset`]. An offset on a leaf boundary lands at the start
/// of the following leaf.
pub fn point_for_global_offset(
    block_path: &[usize],
    children: &[Node],
    global_offset: usize,
) -> Point {
    let leaf_point = |ix: usize, offset: usize| {
        let mut path = block_path.to_vec();
        path.push(ix);
        Point::new(path, offset)
    };

    let mut remaining = global_offset;
    for (ix, node) in children.iter().enumerate() {
        let Node::Text(leaf) = node else {
            continue;
        };
        let len = leaf.text.len();
        match remaining.cmp(&len) {
            Ordering::Less => return leaf_point(ix, clamp_to_char_boundary(&leaf.text, remaining)),
            Ordering::Equal if matches!(children.get(ix + 1), Some(Node::Text(_))) => {
                return leaf_point(ix + 1, 0);
            }
            Ordering::Equal => return leaf_point(ix, len),
            Ordering::Greater => remaining -= len,
        }
    }

    // Past the end: clamp to the end of the last text leaf.
    children
        .iter()
        .enumerate()
        .rev()
        .find_map(|(ix, node)| match node {
            Node::Text(leaf) => Some(leaf_point(ix, leaf.text.len())),
            _ => None,
        })
        .unwrap_or_else(|| leaf_point(0, 0))
}

pub fn is_point_in_block(point: &Point, block_path: &[usize]) -> bool {
    point.path.len() == block_path.len() + 1 && point.path.starts_with(block_path)
}

pub fn total_inline_text_len(children: &[Node]) -> usize {
    children.iter().map(inline_len).sum()
}

/// Text leaves of `children` overlapping `[start_global, end_global)`.
pub fn text_leaves_in_range(
    children: &[Node],
    start_global: usize,
    end_global: usize,
) -> impl Iterator<Item = &TextNode> {
    let mut cursor = 0usize;
    children.iter().filter_map(move |node| {
        let Node::Text(leaf) = node else {
            return None;
        };
        let span = cursor..cursor + leaf.text.len();
        cursor = span.end;
        (start_global < span.end && end_global > span.start).then_some(leaf)
    })
}

/// Splits text leaves at the range boundaries and maps the marks of the covered part.
pub fn apply_marks_in_block(
    children: &[Node],
    start_global: usize,
    end_global: usize,
    apply: &dyn Fn(Marks) -> Marks,
) -> Vec<Node> {
    if start_global >= end_global {
        return children.to_vec();
    }

    let mut out = Vec::with_capacity(children.len() + 2);
    let mut cursor = 0usize;
    for node in children {
        let Node::Text(leaf) = node else {
            out.push(node.clone());
            continue;
        };
        let span = cursor..cursor + leaf.text.len();
        cursor = span.end;
        if end_global <= span.start || start_global >= span.end {
            out.push(node.clone());
            continue;
        }

        let cut = |global: usize| {
            clamp_to_char_boundary(&leaf.text, global.saturating_sub(span.start))
        };
        let (lo, hi) = (cut(start_global), cut(end_global));
        let pieces = [
            (&leaf.text[..lo], leaf.marks.clone()),
            (&leaf.text[lo..hi], apply(leaf.marks.clone())),
            (&leaf.text[hi..], leaf.marks.clone()),
        ];
        out.extend(
            pieces
                .into_iter()
                .filter(|(text, _)| !text.is_empty())
                .map(|(text, marks)| Node::text(text, marks)),
        );
    }

    if out.is_empty() {
        out.push(Node::text("", Marks::default()));
    }
    out
}

/// Rebuilds `el` as a different block kind, keeping its inline children.
pub fn retyped_block(el: &ElementNode, kind: &str, attrs: Attrs) -> Node {
    Node::Element(ElementNode {
        kind: kind.to_string(),
        attrs,
        children: el.children.clone(),
    })
}

/// Replaces every selected text block for which `retype` yields a different node.
///
/// Block paths and inline children are unchanged, so the selection is carried over as is.
/// Returns an empty transaction when no block changes.
pub fn retype_selected_blocks(
    editor: &Editor,
    source: &str,
    retype: impl Fn(&ElementNode) -> Option<Node>,
) -> Result<Transaction, String> {
    let blocks = selected_text_blocks(editor.doc(), editor.registry(), editor.selection());
    if blocks.is_empty() {
        return Err("Selection is not in a text block".into());
    }

    let ops: Vec<Op> = blocks
        .iter()
        .filter_map(|block| {
            let next = retype(block.el)?;
            let unchanged = matches!(&next, Node::Element(el) if el == block.el);
            (!unchanged).then(|| Op::replace_node(&block.path, next))
        })
        .flatten()
        .collect();

    if ops.is_empty() {
        return Ok(Transaction::empty(source));
    }
    Ok(Transaction::new(ops)
        .selection_after(editor.selection().clone())
        .source(source))
}
