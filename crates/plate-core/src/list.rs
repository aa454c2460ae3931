//! Flat list items: every item is a sibling block carrying its type and nesting level.

use serde_json::Value;

use crate::core::{AttrPatch, Attrs, Document, ElementNode, Editor, Node};
use crate::ops::{Op, Transaction};
use crate::plugin::{
    CommandError, CommandSpec, NodeSpec, NormalizePass, PlatePlugin, PluginRegistry, QuerySpec,
    visit_containers,
};
use crate::util::{
    children_at_path, node_at_path, ordered_selection_points, retype_selected_blocks,
    retyped_block, selected_text_blocks,
};

pub const MAX_LIST_LEVEL: u64 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListType {
    Bulleted,
    Ordered,
    Task,
}

impl ListType {
    pub fn as_str(self) -> &'static str {
        match self {
            ListType::Bulleted => "bulleted",
            ListType::Ordered => "ordered",
            ListType::Task => "task",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "bulleted" | "bullet" => Some(ListType::Bulleted),
            "ordered" => Some(ListType::Ordered),
            "task" | "todo" => Some(ListType::Task),
            _ => None,
        }
    }
}

/// Reads the list attributes of a `list_item` element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListItemInfo {
    pub list_type: ListType,
    pub level: u64,
}

impl ListItemInfo {
    pub fn of(el: &ElementNode) -> Option<Self> {
        if el.kind != "list_item" {
            return None;
        }
        let list_type = el
            .attr_str("list_type")
            .and_then(ListType::parse)
            .unwrap_or(ListType::Bulleted);
        Some(Self {
            list_type,
            level: el.attr_u64("list_level").unwrap_or(0).min(MAX_LIST_LEVEL),
        })
    }
}

fn list_item_attrs(list_type: ListType, level: u64, checked: bool) -> Attrs {
    let mut attrs = Attrs::default();
    attrs.insert("list_type".to_string(), Value::from(list_type.as_str()));
    if level > 0 {
        attrs.insert("list_level".to_string(), Value::from(level));
    }
    if list_type == ListType::Task {
        attrs.insert("checked".to_string(), Value::Bool(checked));
    }
    attrs
}

pub struct ListPlugin;

impl PlatePlugin for ListPlugin {
    fn id(&self) -> &'static str {
        "list"
    }

    fn node_specs(&self) -> Vec<NodeSpec> {
        vec![NodeSpec::text_block("list_item")]
    }

    fn normalize_passes(&self) -> Vec<Box<dyn NormalizePass>> {
        vec![Box::new(NormalizeListAttrs)]
    }

    fn commands(&self) -> Vec<CommandSpec> {
        vec![
            CommandSpec::new("list.toggle", |editor, args| {
                let list_type = args
                    .as_ref()
                    .and_then(|v| v.get("type"))
                    .and_then(|v| v.as_str())
                    .and_then(ListType::parse)
                    .ok_or_else(|| CommandError::new("Missing or invalid args.type"))?;
                toggle_list(editor, list_type).map_err(CommandError::new)
            }),
            CommandSpec::new("list.sink", |editor, _args| {
                sink_list_item(editor).map_err(CommandError::new)
            }),
            CommandSpec::new("list.lift", |editor, _args| {
                lift_list_item(editor).map_err(CommandError::new)
            }),
            CommandSpec::new("list.toggle_checked", |editor, _args| {
                retype_selected_blocks(editor, "command:list.toggle_checked", |el| {
                    let info = ListItemInfo::of(el)?;
                    if info.list_type != ListType::Task {
                        return None;
                    }
                    let checked = el.attrs.get("checked").and_then(Value::as_bool) == Some(true);
                    Some(retyped_block(
                        el,
                        "list_item",
                        list_item_attrs(ListType::Task, info.level, !checked),
                    ))
                })
                .map_err(CommandError::new)
            }),
        ]
    }

    fn queries(&self) -> Vec<QuerySpec> {
        vec![QuerySpec::new("list.is_active", |editor, args| {
            let list_type = args
                .as_ref()
                .and_then(|v| v.get("type"))
                .and_then(|v| v.as_str())
                .and_then(ListType::parse)
                .unwrap_or(ListType::Bulleted);
            Ok(Value::Bool(is_list_active(editor, list_type)))
        })]
    }
}

/// True when every selected text block is a list item of `list_type`.
pub fn is_list_active(editor: &Editor, list_type: ListType) -> bool {
    let blocks = selected_text_blocks(editor.doc(), editor.registry(), editor.selection());
    !blocks.is_empty()
        && blocks
            .iter()
            .all(|b| ListItemInfo::of(b.el).is_some_and(|info| info.list_type == list_type))
}

fn toggle_list(editor: &Editor, list_type: ListType) -> Result<Transaction, String> {
    let source = "command:list.toggle";
    if is_list_active(editor, list_type) {
        return retype_selected_blocks(editor, source, |el| {
            Some(retyped_block(el, "paragraph", Attrs::default()))
        });
    }

    retype_selected_blocks(editor, source, |el| {
        let level = match el.kind.as_str() {
            "paragraph" => 0,
            "list_item" => ListItemInfo::of(el).map_or(0, |info| info.level),
            _ => return None,
        };
        Some(retyped_block(
            el,
            "list_item",
            list_item_attrs(list_type, level, false),
        ))
    })
}

// The list item holding the start of the selection, with its path.
fn start_list_item(editor: &Editor) -> Option<(Vec<usize>, &ElementNode, ListItemInfo)> {
    let (start, _) = ordered_selection_points(editor.selection());
    let (_, block_path) = start.path.split_last()?;
    let Some(Node::Element(el)) = node_at_path(editor.doc(), block_path) else {
        return None;
    };
    let info = ListItemInfo::of(el)?;
    Some((block_path.to_vec(), el, info))
}

fn set_list_level(path: &[usize], level: u64) -> Op {
    let patch = if level == 0 {
        AttrPatch::remove("list_level")
    } else {
        AttrPatch::set("list_level", Value::from(level))
    };
    Op::SetNodeAttrs {
        path: path.to_vec(),
        patch,
    }
}

fn sink_list_item(editor: &Editor) -> Result<Transaction, String> {
    let source = "command:list.sink";
    let Some((path, _, info)) = start_list_item(editor) else {
        return Ok(Transaction::empty(source));
    };
    if info.level >= MAX_LIST_LEVEL {
        return Ok(Transaction::empty(source));
    }

    let Some((&ix, parent_path)) = path.split_last() else {
        return Ok(Transaction::empty(source));
    };
    let previous = ix
        .checked_sub(1)
        .and_then(|prev_ix| children_at_path(editor.doc(), parent_path)?.get(prev_ix));
    let Some(Node::Element(prev_el)) = previous else {
        return Ok(Transaction::empty(source));
    };
    let Some(prev) = ListItemInfo::of(prev_el) else {
        return Ok(Transaction::empty(source));
    };
    if prev.list_type != info.list_type || prev.level < info.level {
        return Ok(Transaction::empty(source));
    }

    Ok(Transaction::new(vec![set_list_level(&path, info.level + 1)])
        .selection_after(editor.selection().clone())
        .source(source))
}

fn lift_list_item(editor: &Editor) -> Result<Transaction, String> {
    let source = "command:list.lift";
    let Some((path, el, info)) = start_list_item(editor) else {
        return Ok(Transaction::empty(source));
    };

    let ops: Vec<Op> = if info.level > 0 {
        vec![set_list_level(&path, info.level - 1)]
    } else {
        Op::replace_node(&path, retyped_block(el, "paragraph", Attrs::default())).into()
    };

    Ok(Transaction::new(ops)
        .selection_after(editor.selection().clone())
        .source(source))
}

/// Keeps list attributes consistent: levels within bounds, `checked` only on task
/// items, and `list_index` numbering each run of ordered items per level.
struct NormalizeListAttrs;

impl NormalizePass for NormalizeListAttrs {
    fn id(&self) -> &'static str {
        "list.normalize_attrs"
    }

    fn run(&self, doc: &Document, registry: &PluginRegistry) -> Vec<Op> {
        let mut ops = Vec::new();
        visit_containers(doc, registry, &mut |children, parent_path| {
            // counters[level] is the running number of ordered items at that level.
            let mut counters: Vec<u64> = Vec::new();
            for (ix, node) in children.iter().enumerate() {
                let item = match node {
                    Node::Element(el) => ListItemInfo::of(el).map(|info| (el, info)),
                    _ => None,
                };
                let Some((el, info)) = item else {
                    counters.clear();
                    continue;
                };

                let level = info.level as usize;
                counters.resize(level + 1, 0);
                let index = if info.list_type == ListType::Ordered {
                    counters[level] += 1;
                    Some(counters[level])
                } else {
                    counters[level] = 0;
                    None
                };

                let mut patch = AttrPatch::default();
                let stored_level = el.attr_u64("list_level");
                if stored_level.is_some_and(|l| l != info.level) || stored_level == Some(0) {
                    if info.level == 0 {
                        patch.remove.push("list_level".to_string());
                    } else {
                        patch.set.insert("list_level".to_string(), Value::from(info.level));
                    }
                }
                if el.attr_str("list_type") != Some(info.list_type.as_str()) {
                    patch
                        .set
                        .insert("list_type".to_string(), Value::from(info.list_type.as_str()));
                }
                match index {
                    Some(index) if el.attr_u64("list_index") != Some(index) => {
                        patch.set.insert("list_index".to_string(), Value::from(index));
                    }
                    None if el.attrs.contains_key("list_index") => {
                        patch.remove.push("list_index".to_string());
                    }
                    _ => {}
                }
                let has_checked = el.attrs.get("checked").is_some_and(Value::is_boolean);
                if info.list_type == ListType::Task && !has_checked {
                    patch.set.insert("checked".to_string(), Value::Bool(false));
                } else if info.list_type != ListType::Task && el.attrs.contains_key("checked") {
                    patch.remove.push("checked".to_string());
                }

                if patch.set.is_empty() && patch.remove.is_empty() {
                    continue;
                }
                let mut path = parent_path.to_vec();
                path.push(ix);
                ops.push(Op::SetNodeAttrs { path, patch });
            }
        });
        ops
    }
}
