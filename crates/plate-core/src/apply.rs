//! Single-op application. Each op moves the selection along with the tree and hands
//! back the op that undoes it.

use std::ops::Range;

use thiserror::Error;

use crate::core::{AttrPatch, Attrs, Document, Node, Point, Selection, TextNode};
use crate::ops::Op;
use crate::util::node_at_path;

#[derive(Debug, Error)]
pub enum ApplyError {
    #[error("invalid path: {0}")]
    InvalidPath(String),
    #[error("normalization did not converge")]
    NormalizeDidNotConverge,
}

impl From<PathError> for ApplyError {
    fn from(value: PathError) -> Self {
        ApplyError::InvalidPath(value.0)
    }
}

#[derive(Debug, Error)]
#[error("{0}")]
pub struct PathError(pub String);

pub(crate) fn clamp_to_char_boundary(s: &str, ix: usize) -> usize {
    let mut ix = ix.min(s.len());
    while !s.is_char_boundary(ix) {
        ix -= 1;
    }
    ix
}

pub(crate) fn apply_op(
    doc: &mut Document,
    selection: &mut Selection,
    op: Op,
) -> Result<Op, ApplyError> {
    let inverse = match op {
        Op::InsertText { path, offset, text } => {
            let leaf = doc.text_mut(&path)?;
            let at = clamp_to_char_boundary(&leaf.text, offset);
            leaf.text.insert_str(at, &text);
            let len = text.len();
            // A point exactly at the insertion offset stays in front of the new text.
            selection.map_points(|p| {
                if p.path == path && p.offset > at {
                    p.offset += len;
                }
            });
            Op::RemoveText {
                path,
                range: at..at + len,
            }
        }
        Op::RemoveText { path, range } => {
            let leaf = doc.text_mut(&path)?;
            let range = clamp_to_char_boundary(&leaf.text, range.start)
                ..clamp_to_char_boundary(&leaf.text, range.end);
            let removed: String = if range.start < range.end {
                leaf.text.drain(range.clone()).collect()
            } else {
                String::new()
            };
            selection.map_points(|p| {
                if p.path == path {
                    p.offset = offset_after_removal(p.offset, &range);
                }
            });
            Op::InsertText {
                path,
                offset: range.start,
                text: removed,
            }
        }
        Op::InsertNode { path, node } => {
            let (index, parent) = split_index(&path)?;
            doc.insert_at(parent, index, node)?;
            selection.map_points(|p| {
                if let Some(slot) = sibling_slot(p, parent) {
                    if *slot >= index {
                        *slot += 1;
                    }
                }
            });
            Op::RemoveNode { path }
        }
        Op::RemoveNode { path } => {
            let (index, parent) = split_index(&path)?;
            let removed = doc.remove_at(parent, index)?;
            let merged_at = merged_into_left_sibling(doc, parent, index, &removed);
            selection.map_points(|p| relocate_after_removal(p, parent, index, &removed, merged_at));
            Op::InsertNode {
                path,
                node: removed,
            }
        }
        Op::SetNodeAttrs { path, patch } => {
            let attrs = match doc.node_mut(&path)? {
                Node::Element(el) => &mut el.attrs,
                Node::Void(v) => &mut v.attrs,
                Node::Text(_) => {
                    return Err(ApplyError::InvalidPath("text leaves carry no attrs".into()));
                }
            };
            let undo = patch.apply_to(attrs);
            Op::SetNodeAttrs { path, patch: undo }
        }
        Op::SetTextMarks { path, marks } => {
            let leaf = doc.text_mut(&path)?;
            let old = std::mem::replace(&mut leaf.marks, marks);
            Op::SetTextMarks { path, marks: old }
        }
    };
    Ok(inverse)
}

fn split_index(path: &[usize]) -> Result<(usize, &[usize]), PathError> {
    path.split_last()
        .map(|(&index, parent)| (index, parent))
        .ok_or_else(|| PathError("empty path".into()))
}

fn offset_after_removal(offset: usize, removed: &Range<usize>) -> usize {
    if offset <= removed.start {
        offset
    } else if offset >= removed.end {
        offset - removed.len()
    } else {
        removed.start
    }
}

// The path component of `point` that indexes into `parent`'s children, if the point
// lies under `parent`.
fn sibling_slot<'a>(point: &'a mut Point, parent: &[usize]) -> Option<&'a mut usize> {
    let depth = parent.len();
    if point.path.len() > depth && point.path.starts_with(parent) {
        point.path.get_mut(depth)
    } else {
        None
    }
}

// When a removed text leaf was folded into its left neighbour, the neighbour now ends
// with the removed text. Returns where that text starts inside the neighbour.
fn merged_into_left_sibling(
    doc: &Document,
    parent: &[usize],
    index: usize,
    removed: &Node,
) -> Option<usize> {
    let Node::Text(removed) = removed else {
        return None;
    };
    let mut left_path = parent.to_vec();
    left_path.push(index.checked_sub(1)?);
    match node_at_path(doc, &left_path) {
        Some(Node::Text(left))
            if left.marks == removed.marks && left.text.ends_with(&removed.text) =>
        {
            Some(left.text.len() - removed.text.len())
        }
        _ => None,
    }
}

fn relocate_after_removal(
    point: &mut Point,
    parent: &[usize],
    index: usize,
    removed: &Node,
    merged_at: Option<usize>,
) {
    let depth = parent.len();
    let Some(slot) = sibling_slot(point, parent) else {
        return;
    };
    if *slot > index {
        *slot -= 1;
        return;
    }
    if *slot < index {
        return;
    }

    point.path.truncate(depth + 1);
    point.path[depth] = index.saturating_sub(1);
    point.offset = match (merged_at, removed) {
        (Some(start), Node::Text(text)) => start + point.offset.min(text.text.len()),
        _ => 0,
    };
}

impl Selection {
    pub(crate) fn map_points(&mut self, mut f: impl FnMut(&mut Point)) {
        f(&mut self.anchor);
        f(&mut self.focus);
    }
}

impl Document {
    fn node_mut(&mut self, path: &[usize]) -> Result<&mut Node, PathError> {
        let Some((&first, rest)) = path.split_first() else {
            return Err(PathError("empty path".into()));
        };
        let len = self.children.len();
        let mut node = self
            .children
            .get_mut(first)
            .ok_or_else(|| PathError(format!("index {first} out of bounds ({len}) at depth 0")))?;

        for (depth, &ix) in rest.iter().enumerate() {
            let Node::Element(el) = node else {
                return Err(PathError(format!("no children below depth {depth}")));
            };
            let len = el.children.len();
            node = el.children.get_mut(ix).ok_or_else(|| {
                PathError(format!("index {ix} out of bounds ({len}) at depth {}", depth + 1))
            })?;
        }
        Ok(node)
    }

    fn text_mut(&mut self, path: &[usize]) -> Result<&mut TextNode, PathError> {
        match self.node_mut(path)? {
            Node::Text(leaf) => Ok(leaf),
            _ => Err(PathError("expected a text leaf".into())),
        }
    }

    fn children_mut(&mut self, parent: &[usize]) -> Result<&mut Vec<Node>, PathError> {
        if parent.is_empty() {
            return Ok(&mut self.children);
        }
        match self.node_mut(parent)? {
            Node::Element(el) => Ok(&mut el.children),
            _ => Err(PathError("parent is not a container".into())),
        }
    }

    fn insert_at(&mut self, parent: &[usize], index: usize, node: Node) -> Result<(), PathError> {
        let children = self.children_mut(parent)?;
        if index > children.len() {
            return Err(PathError(format!(
                "insert index {index} past the end ({})",
                children.len()
            )));
        }
        children.insert(index, node);
        Ok(())
    }

    fn remove_at(&mut self, parent: &[usize], index: usize) -> Result<Node, PathError> {
        let children = self.children_mut(parent)?;
        if index >= children.len() {
            return Err(PathError(format!(
                "remove index {index} out of bounds ({})",
                children.len()
            )));
        }
        Ok(children.remove(index))
    }
}

impl AttrPatch {
    /// Applies the patch and returns the patch that restores the previous attrs.
    pub(crate) fn apply_to(&self, attrs: &mut Attrs) -> AttrPatch {
        let mut undo = AttrPatch::default();
        for (key, value) in &self.set {
            match attrs.insert(key.clone(), value.clone()) {
                Some(prev) => {
                    undo.set.insert(key.clone(), prev);
                }
                None => undo.remove.push(key.clone()),
            }
        }
        for key in &self.remove {
            if let Some(prev) = attrs.remove(key) {
                undo.set.insert(key.clone(), prev);
            }
        }
        undo
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    use crate::core::{ElementNode, Marks};

    fn caret(path: Vec<usize>, offset: usize) -> Selection {
        Selection::collapsed(Point::new(path, offset))
    }

    #[test]
    fn clamps_inside_multibyte_chars() {
        assert_eq!(clamp_to_char_boundary("aé", 2), 1);
        assert_eq!(clamp_to_char_boundary("aé", 9), 3);
    }

    #[test]
    fn removal_inverse_restores_text() {
        let mut doc = Document {
            children: vec![Node::paragraph("hello")],
        };
        let mut sel = caret(vec![0, 0], 5);
        let inverse = apply_op(
            &mut doc,
            &mut sel,
            Op::RemoveText {
                path: vec![0, 0],
                range: 1..3,
            },
        )
        .unwrap();
        assert_eq!(doc.children, vec![Node::paragraph("hlo")]);
        assert_eq!(sel.focus.offset, 3);

        apply_op(&mut doc, &mut sel, inverse).unwrap();
        assert_eq!(doc.children, vec![Node::paragraph("hello")]);
    }

    #[test]
    fn removing_a_merged_leaf_keeps_the_caret_on_its_character() {
        let mut doc = Document {
            children: vec![Node::Element(ElementNode {
                kind: "paragraph".into(),
                attrs: Attrs::default(),
                children: vec![
                    Node::text("abcd", Marks::default()),
                    Node::text("cd", Marks::default()),
                ],
            })],
        };
        let mut sel = caret(vec![0, 1], 1);
        apply_op(&mut doc, &mut sel, Op::RemoveNode { path: vec![0, 1] }).unwrap();
        assert_eq!(sel, caret(vec![0, 0], 3));
    }

    #[test]
    fn attr_patch_undo_round_trips() {
        let mut attrs = Attrs::default();
        attrs.insert("level".into(), Value::from(1));
        let patch = AttrPatch {
            set: Attrs::from([
                ("level".to_string(), Value::from(2)),
                ("id".to_string(), Value::from("x")),
            ]),
            remove: Vec::new(),
        };
        let undo = patch.apply_to(&mut attrs);
        undo.apply_to(&mut attrs);
        assert_eq!(attrs.get("level"), Some(&Value::from(1)));
        assert!(!attrs.contains_key("id"));
    }
}
