use pretty_assertions::assert_eq;
use webtext_plate_core::{
    Document, Editor, EmbedBounds, Node, PluginRegistry, Point, Selection,
};

fn editor_with(children: Vec<Node>, registry: PluginRegistry) -> Editor {
    let doc = Document { children };
    let selection = Selection::collapsed(Point::new(vec![0, 0], 1));
    Editor::new(doc, selection, registry)
}

fn video_dims(node: &Node) -> (u64, u64) {
    let Node::Void(v) = node else {
        panic!("expected void node");
    };
    assert_eq!(v.kind, "video");
    (
        v.attrs.get("width").and_then(|v| v.as_u64()).unwrap_or(0),
        v.attrs.get("height").and_then(|v| v.as_u64()).unwrap_or(0),
    )
}

#[test]
fn divider_insert_adds_rule_and_trailing_paragraph() {
    let mut editor = editor_with(vec![Node::paragraph("a")], PluginRegistry::richtext());

    editor.run_command("divider.insert", None).unwrap();

    assert_eq!(
        editor.doc().children,
        vec![Node::paragraph("a"), Node::divider(), Node::paragraph("")]
    );
    assert_eq!(
        editor.selection(),
        &Selection::collapsed(Point::new(vec![2, 0], 0))
    );
}

#[test]
fn video_insert_replaces_degenerate_sizes_with_defaults() {
    let mut editor = editor_with(vec![Node::paragraph("a")], PluginRegistry::richtext());

    editor
        .run_command(
            "video.insert",
            Some(serde_json::json!({ "src": "x", "width": 0, "height": -5 })),
        )
        .unwrap();

    let (width, height) = video_dims(&editor.doc().children[1]);
    assert_eq!((width, height), (640, 480));
    assert!(width >= 320 && height >= 180);
}

#[test]
fn video_insert_raises_small_sizes_to_the_floor() {
    let mut editor = editor_with(vec![Node::paragraph("a")], PluginRegistry::richtext());

    editor
        .run_command(
            "video.insert",
            Some(serde_json::json!({ "src": "x", "width": 100, "height": 900 })),
        )
        .unwrap();

    assert_eq!(video_dims(&editor.doc().children[1]), (320, 900));
}

#[test]
fn loaded_videos_are_clamped_by_normalization() {
    let bounds = EmbedBounds {
        default_width: 800,
        default_height: 450,
        min_width: 400,
        min_height: 200,
    };
    let editor = editor_with(
        vec![Node::paragraph("a"), Node::video("x", 10, 0)],
        PluginRegistry::richtext_with_embed_bounds(bounds),
    );

    assert_eq!(video_dims(&editor.doc().children[1]), (400, 450));
}

#[test]
fn image_insert_needs_a_source() {
    let mut editor = editor_with(vec![Node::paragraph("a")], PluginRegistry::richtext());

    assert!(!editor.can_run_command("image.insert", Some(serde_json::json!({ "src": " " }))));

    editor
        .run_command(
            "image.insert",
            Some(serde_json::json!({ "src": "https://example.com/a.png" })),
        )
        .unwrap();
    assert_eq!(
        editor.doc().children[1],
        Node::image("https://example.com/a.png", None)
    );
}
