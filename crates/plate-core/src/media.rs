use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::{AttrPatch, Attrs, Document, Editor, Node, Point, Selection};
use crate::ops::{Op, Transaction};
use crate::plugin::{
    CommandError, CommandSpec, NodeSpec, NormalizePass, PlatePlugin, PluginRegistry,
    visit_containers,
};
use crate::util::element_at_path;

/// Size rules for embedded video frames.
///
/// A missing, zero, negative or non-finite dimension falls back to the default; any
/// other value is raised to the floor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EmbedBounds {
    pub default_width: u64,
    pub default_height: u64,
    pub min_width: u64,
    pub min_height: u64,
}

impl Default for EmbedBounds {
    fn default() -> Self {
        Self {
            default_width: 640,
            default_height: 480,
            min_width: 320,
            min_height: 180,
        }
    }
}

impl EmbedBounds {
    pub fn width(&self, requested: Option<f64>) -> u64 {
        clamp_dimension(requested, self.default_width, self.min_width)
    }

    pub fn height(&self, requested: Option<f64>) -> u64 {
        clamp_dimension(requested, self.default_height, self.min_height)
    }
}

fn clamp_dimension(requested: Option<f64>, default: u64, floor: u64) -> u64 {
    match requested {
        Some(v) if v.is_finite() && v > 0.0 => (v.round() as u64).max(floor),
        _ => default.max(floor),
    }
}

// The block holding the selection focus: (parent path, index within parent).
fn focus_block_slot(editor: &Editor) -> Option<(Vec<usize>, usize)> {
    let focus = &editor.selection().focus;
    let (_, block_path) = focus.path.split_last()?;
    element_at_path(editor.doc(), block_path)?;
    let (&ix, parent_path) = block_path.split_last()?;
    Some((parent_path.to_vec(), ix))
}

fn insert_after_focus_block(
    editor: &Editor,
    node: Node,
    source: &str,
) -> Result<Transaction, String> {
    let (parent_path, ix) =
        focus_block_slot(editor).ok_or_else(|| "Selection is not in a block".to_string())?;
    let mut path = parent_path;
    path.push(ix + 1);
    Ok(Transaction::new(vec![Op::InsertNode { path, node }])
        .selection_after(editor.selection().clone())
        .source(source))
}

pub struct DividerPlugin;

impl PlatePlugin for DividerPlugin {
    fn id(&self) -> &'static str {
        "divider"
    }

    fn node_specs(&self) -> Vec<NodeSpec> {
        vec![NodeSpec::void_block("divider")]
    }

    fn commands(&self) -> Vec<CommandSpec> {
        vec![
            CommandSpec::new("divider.insert", |editor, _args| {
                insert_divider(editor).map_err(CommandError::new)
            }),
        ]
    }
}

fn insert_divider(editor: &Editor) -> Result<Transaction, String> {
    let (parent_path, ix) =
        focus_block_slot(editor).ok_or_else(|| "Selection is not in a block".to_string())?;

    let mut divider_path = parent_path.clone();
    divider_path.push(ix + 1);
    let mut paragraph_path = parent_path;
    paragraph_path.push(ix + 2);

    let mut caret_path = paragraph_path.clone();
    caret_path.push(0);

    Ok(Transaction::new(vec![
        Op::InsertNode {
            path: divider_path,
            node: Node::divider(),
        },
        Op::InsertNode {
            path: paragraph_path,
            node: Node::paragraph(""),
        },
    ])
    .selection_after(Selection::collapsed(Point::new(caret_path, 0)))
    .source("command:divider.insert"))
}

pub struct ImagePlugin;

impl PlatePlugin for ImagePlugin {
    fn id(&self) -> &'static str {
        "image"
    }

    fn node_specs(&self) -> Vec<NodeSpec> {
        vec![NodeSpec::void_block("image")]
    }

    fn commands(&self) -> Vec<CommandSpec> {
        vec![
            CommandSpec::new("image.insert", |editor, args| {
                let src = args
                    .as_ref()
                    .and_then(|v| v.get("src"))
                    .and_then(|v| v.as_str())
                    .filter(|s| !s.trim().is_empty())
                    .ok_or_else(|| CommandError::new("Missing args.src"))?;
                let alt = args
                    .as_ref()
                    .and_then(|v| v.get("alt"))
                    .and_then(|v| v.as_str())
                    .map(str::to_string);
                insert_after_focus_block(editor, Node::image(src, alt), "command:image.insert")
                    .map_err(CommandError::new)
            }),
        ]
    }
}

pub struct VideoPlugin {
    bounds: EmbedBounds,
}

impl VideoPlugin {
    pub fn new(bounds: EmbedBounds) -> Self {
        Self { bounds }
    }
}

impl PlatePlugin for VideoPlugin {
    fn id(&self) -> &'static str {
        "video"
    }

    fn node_specs(&self) -> Vec<NodeSpec> {
        vec![NodeSpec::void_block("video")]
    }

    fn normalize_passes(&self) -> Vec<Box<dyn NormalizePass>> {
        vec![Box::new(ClampVideoDimensions {
            bounds: self.bounds,
        })]
    }

    fn commands(&self) -> Vec<CommandSpec> {
        let bounds = self.bounds;
        vec![
            // Missing or tiny sizes are corrected by the embed bounds.
            CommandSpec::new("video.insert", move |editor, args| {
                let args = args.as_ref();
                let src = args
                    .and_then(|v| v.get("src"))
                    .and_then(|v| v.as_str())
                    .filter(|s| !s.trim().is_empty())
                    .ok_or_else(|| CommandError::new("Missing args.src"))?;
                let width = bounds.width(args.and_then(|v| v.get("width")).and_then(Value::as_f64));
                let height =
                    bounds.height(args.and_then(|v| v.get("height")).and_then(Value::as_f64));
                insert_after_focus_block(
                    editor,
                    Node::video(src, width, height),
                    "command:video.insert",
                )
                .map_err(CommandError::new)
            }),
        ]
    }
}

struct ClampVideoDimensions {
    bounds: EmbedBounds,
}

impl NormalizePass for ClampVideoDimensions {
    fn id(&self) -> &'static str {
        "video.clamp_dimensions"
    }

    fn run(&self, doc: &Document, registry: &PluginRegistry) -> Vec<Op> {
        let mut ops = Vec::new();
        visit_containers(doc, registry, &mut |children, parent_path| {
            for (ix, node) in children.iter().enumerate() {
                let Node::Void(video) = node else {
                    continue;
                };
                if video.kind != "video" {
                    continue;
                }

                let mut set = Attrs::default();
                let dims = [
                    ("width", self.bounds.width(video.attrs.get("width").and_then(Value::as_f64))),
                    (
                        "height",
                        self.bounds.height(video.attrs.get("height").and_then(Value::as_f64)),
                    ),
                ];
                for (key, value) in dims {
                    if video.attrs.get(key).and_then(Value::as_u64) != Some(value) {
                        set.insert(key.to_string(), Value::from(value));
                    }
                }
                if set.is_empty() {
                    continue;
                }

                let mut path = parent_path.to_vec();
                path.push(ix);
                ops.push(Op::SetNodeAttrs {
                    path,
                    patch: AttrPatch {
                        set,
                        remove: Vec::new(),
                    },
                });
            }
        });
        ops
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dimensions_fall_back_to_defaults() {
        let bounds = EmbedBounds::default();
        assert_eq!(bounds.width(None), 640);
        assert_eq!(bounds.width(Some(0.0)), 640);
        assert_eq!(bounds.height(Some(-5.0)), 480);
        assert_eq!(bounds.height(Some(f64::NAN)), 480);
    }

    #[test]
    fn dimensions_are_raised_to_the_floor() {
        let bounds = EmbedBounds::default();
        assert_eq!(bounds.width(Some(10.0)), 320);
        assert_eq!(bounds.height(Some(90.4)), 180);
        assert_eq!(bounds.width(Some(800.0)), 800);
    }
}
