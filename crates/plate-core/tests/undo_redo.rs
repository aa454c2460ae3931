use webtext_plate_core::{
    Document, Editor, EditorConfig, Node, Op, PluginRegistry, Point, Selection, Transaction,
};

fn editor_with_text(text: &str) -> Editor {
    let doc = Document {
        children: vec![Node::paragraph(text)],
    };
    let selection = Selection::collapsed(Point::new(vec![0, 0], 0));
    Editor::new(doc, selection, PluginRegistry::richtext())
}

fn type_text(editor: &mut Editor, text: &str) {
    editor
        .run_command("text.insert", Some(serde_json::json!({ "text": text })))
        .unwrap();
}

#[test]
fn undo_redo_handles_multi_op_insert_order() {
    let mut editor = editor_with_text("");

    let tx = Transaction::new(vec![
        Op::InsertText {
            path: vec![0, 0],
            offset: 0,
            text: "a".to_string(),
        },
        Op::InsertText {
            path: vec![0, 0],
            offset: 1,
            text: "b".to_string(),
        },
    ])
    .selection_after(Selection::collapsed(Point::new(vec![0, 0], 2)))
    .source("test:multi_insert");

    editor.apply(tx).unwrap();
    assert_eq!(editor.doc().children, vec![Node::paragraph("ab")]);
    assert_eq!(editor.selection().focus.offset, 2);

    assert!(editor.undo());
    assert_eq!(editor.doc().children, vec![Node::paragraph("")]);
    assert_eq!(editor.selection().focus.offset, 0);

    assert!(editor.redo());
    assert_eq!(editor.doc().children, vec![Node::paragraph("ab")]);
    assert_eq!(editor.selection().focus.offset, 2);
}

#[test]
fn command_history_round_trips_a_heading_toggle() {
    let mut editor = editor_with_text("Title");

    editor
        .run_command("heading.toggle", Some(serde_json::json!({ "level": 1 })))
        .unwrap();
    assert!(editor.can_undo());
    assert!(!editor.can_redo());

    assert!(editor.undo());
    assert_eq!(editor.doc().children, vec![Node::paragraph("Title")]);
    assert!(editor.can_redo());

    assert!(editor.redo());
    assert_eq!(editor.doc().children, vec![Node::heading(1, "Title")]);
}

#[test]
fn new_edit_clears_redo() {
    let mut editor = editor_with_text("");
    type_text(&mut editor, "a");
    assert!(editor.undo());
    assert!(editor.can_redo());

    type_text(&mut editor, "b");
    assert!(!editor.can_redo());
}

#[test]
fn replace_document_starts_a_new_history_root() {
    let mut editor = editor_with_text("");
    type_text(&mut editor, "draft");
    assert!(editor.can_undo());
    assert!(editor.is_dirty());

    editor.replace_document(Document {
        children: vec![Node::heading(2, "Fresh"), Node::paragraph("body")],
    });

    assert!(!editor.can_undo());
    assert!(!editor.can_redo());
    assert!(!editor.is_dirty());
    assert_eq!(
        editor.selection(),
        &Selection::collapsed(Point::new(vec![0, 0], 0))
    );
    assert!(!editor.undo());
}

#[test]
fn undo_stack_is_capped() {
    let doc = Document {
        children: vec![Node::paragraph("")],
    };
    let selection = Selection::collapsed(Point::new(vec![0, 0], 0));
    let config = EditorConfig {
        max_undo: 2,
        ..EditorConfig::default()
    };
    let mut editor = Editor::with_config(doc, selection, PluginRegistry::richtext(), config);

    for text in ["a", "b", "c"] {
        type_text(&mut editor, text);
    }

    assert!(editor.undo());
    assert!(editor.undo());
    assert!(!editor.undo());
    assert_eq!(editor.doc().children, vec![Node::paragraph("a")]);
}
