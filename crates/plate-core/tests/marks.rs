use pretty_assertions::assert_eq;
use webtext_plate_core::{
    Attrs, Document, Editor, ElementNode, Marks, Node, PluginRegistry, Point, Selection,
};

fn paragraph_with(children: Vec<Node>) -> Node {
    Node::Element(ElementNode {
        kind: "paragraph".to_string(),
        attrs: Attrs::default(),
        children,
    })
}

fn leaves(editor: &Editor, block: usize) -> Vec<(String, bool)> {
    let Node::Element(el) = &editor.doc().children[block] else {
        panic!("expected element block");
    };
    el.children
        .iter()
        .map(|n| match n {
            Node::Text(t) => (t.text.clone(), t.marks.bold),
            _ => (String::new(), false),
        })
        .collect()
}

#[test]
fn toggle_bold_on_range_splits_and_restores() {
    let doc = Document {
        children: vec![Node::paragraph("abcde")],
    };
    let selection = Selection::range(Point::new(vec![0, 0], 1), Point::new(vec![0, 0], 3));
    let mut editor = Editor::new(doc.clone(), selection, PluginRegistry::richtext());

    assert!(editor.run_command("marks.toggle_bold", None).unwrap());
    assert_eq!(
        leaves(&editor, 0),
        vec![
            ("a".to_string(), false),
            ("bc".to_string(), true),
            ("de".to_string(), false),
        ]
    );
    assert!(editor.run_query::<bool>("marks.is_bold_active", None).unwrap());

    assert!(editor.run_command("marks.toggle_bold", None).unwrap());
    assert_eq!(editor.doc(), &doc);
    assert!(!editor.run_query::<bool>("marks.is_bold_active", None).unwrap());
}

#[test]
fn partially_marked_range_is_not_active_and_toggles_on() {
    let bold = Marks {
        bold: true,
        ..Marks::default()
    };
    let doc = Document {
        children: vec![paragraph_with(vec![
            Node::text("ab", bold),
            Node::text("cd", Marks::default()),
        ])],
    };
    let selection = Selection::range(Point::new(vec![0, 0], 0), Point::new(vec![0, 1], 2));
    let mut editor = Editor::new(doc, selection, PluginRegistry::richtext());

    assert!(!editor.run_query::<bool>("marks.is_bold_active", None).unwrap());
    editor.run_command("marks.toggle_bold", None).unwrap();
    assert_eq!(leaves(&editor, 0), vec![("abcd".to_string(), true)]);
}

#[test]
fn caret_toggle_marks_the_insertion_point() {
    let doc = Document {
        children: vec![Node::paragraph("hello")],
    };
    let selection = Selection::collapsed(Point::new(vec![0, 0], 5));
    let mut editor = Editor::new(doc.clone(), selection, PluginRegistry::richtext());

    editor.run_command("marks.toggle_bold", None).unwrap();
    assert!(editor.run_query::<bool>("marks.is_bold_active", None).unwrap());
    assert_eq!(
        leaves(&editor, 0),
        vec![("hello".to_string(), false), (String::new(), true)]
    );

    editor
        .run_command("text.insert", Some(serde_json::json!({ "text": "!" })))
        .unwrap();
    assert_eq!(
        leaves(&editor, 0),
        vec![("hello".to_string(), false), ("!".to_string(), true)]
    );
}

#[test]
fn caret_toggle_twice_leaves_the_document_unchanged() {
    let doc = Document {
        children: vec![Node::paragraph("hello")],
    };
    let selection = Selection::collapsed(Point::new(vec![0, 0], 2));
    let mut editor = Editor::new(doc.clone(), selection, PluginRegistry::richtext());

    editor.run_command("marks.toggle_italic", None).unwrap();
    editor.run_command("marks.toggle_italic", None).unwrap();

    assert_eq!(editor.doc(), &doc);
    assert_eq!(editor.selection().focus, Point::new(vec![0, 0], 2));
}

#[test]
fn unset_color_is_applicable_only_when_color_is_present() {
    let colored = Marks {
        text_color: Some("#958DF1".to_string()),
        ..Marks::default()
    };
    let doc = Document {
        children: vec![
            paragraph_with(vec![Node::text("tinted", colored)]),
            Node::paragraph("plain"),
        ],
    };
    let selection = Selection::collapsed(Point::new(vec![0, 0], 3));
    let mut editor = Editor::new(doc, selection, PluginRegistry::richtext());

    assert!(editor.can_run_command("marks.unset_text_color", None));
    assert!(!editor.can_run_command("marks.unset_highlight_color", None));

    editor.set_selection(Selection::collapsed(Point::new(vec![1, 0], 1)));
    assert!(!editor.can_run_command("marks.unset_text_color", None));
    assert!(editor.run_query::<bool>("marks.accepts_marks", None).unwrap());
}

#[test]
fn set_color_over_range_and_unset_again() {
    let doc = Document {
        children: vec![Node::paragraph("paint me")],
    };
    let selection = Selection::range(Point::new(vec![0, 0], 0), Point::new(vec![0, 0], 5));
    let mut editor = Editor::new(doc.clone(), selection, PluginRegistry::richtext());

    editor
        .run_command(
            "marks.set_highlight_color",
            Some(serde_json::json!({ "color": "#FAF594" })),
        )
        .unwrap();
    let active = editor.run_query::<Marks>("marks.get_active", None).unwrap();
    assert_eq!(active.highlight_color.as_deref(), Some("#FAF594"));

    // Same value again changes nothing.
    assert!(!editor.can_run_command(
        "marks.set_highlight_color",
        Some(serde_json::json!({ "color": "#FAF594" }))
    ));

    editor.run_command("marks.unset_highlight_color", None).unwrap();
    assert_eq!(editor.doc(), &doc);
}

#[test]
fn set_color_requires_a_color_argument() {
    let mut editor = Editor::with_richtext_plugins();
    let err = editor
        .run_command("marks.set_text_color", None)
        .unwrap_err();
    assert_eq!(err.message(), "Missing args.color");
}
