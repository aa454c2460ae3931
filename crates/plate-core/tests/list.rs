use pretty_assertions::assert_eq;
use webtext_plate_core::{Document, Editor, Node, PluginRegistry, Point, Selection};

fn editor_at(children: Vec<Node>, block: usize) -> Editor {
    let doc = Document { children };
    let selection = Selection::collapsed(Point::new(vec![block, 0], 0));
    Editor::new(doc, selection, PluginRegistry::richtext())
}

fn list_type(ty: &str) -> Option<serde_json::Value> {
    Some(serde_json::json!({ "type": ty }))
}

fn attr_u64(editor: &Editor, block: usize, key: &str) -> Option<u64> {
    let Node::Element(el) = &editor.doc().children[block] else {
        panic!("expected element block");
    };
    el.attr_u64(key)
}

#[test]
fn toggle_list_converts_paragraph_and_back() {
    let mut editor = editor_at(vec![Node::paragraph("item")], 0);

    editor.run_command("list.toggle", list_type("bulleted")).unwrap();
    assert_eq!(
        editor.doc().children,
        vec![Node::list_item("bulleted", 0, "item")]
    );
    assert!(editor.run_query::<bool>("list.is_active", list_type("bulleted")).unwrap());
    assert!(!editor.run_query::<bool>("list.is_active", list_type("ordered")).unwrap());

    editor.run_command("list.toggle", list_type("bulleted")).unwrap();
    assert_eq!(editor.doc().children, vec![Node::paragraph("item")]);
}

#[test]
fn toggle_list_switches_type_and_numbers_ordered_items() {
    let mut editor = editor_at(
        vec![
            Node::list_item("bulleted", 0, "a"),
            Node::list_item("ordered", 0, "b"),
        ],
        0,
    );

    editor.run_command("list.toggle", list_type("ordered")).unwrap();
    assert!(editor.run_query::<bool>("list.is_active", list_type("ordered")).unwrap());
    assert_eq!(attr_u64(&editor, 0, "list_index"), Some(1));
    assert_eq!(attr_u64(&editor, 1, "list_index"), Some(2));
}

#[test]
fn ordered_numbering_restarts_after_other_blocks() {
    let editor = editor_at(
        vec![
            Node::list_item("ordered", 0, "a"),
            Node::list_item("ordered", 0, "b"),
            Node::paragraph("break"),
            Node::list_item("ordered", 0, "c"),
        ],
        0,
    );

    assert_eq!(attr_u64(&editor, 1, "list_index"), Some(2));
    assert_eq!(attr_u64(&editor, 3, "list_index"), Some(1));
}

#[test]
fn task_items_carry_a_checked_flag() {
    let mut editor = editor_at(vec![Node::paragraph("todo")], 0);

    editor.run_command("list.toggle", list_type("task")).unwrap();
    let Node::Element(el) = &editor.doc().children[0] else {
        panic!("expected element block");
    };
    assert_eq!(el.attrs.get("checked"), Some(&serde_json::json!(false)));

    editor.run_command("list.toggle_checked", None).unwrap();
    let Node::Element(el) = &editor.doc().children[0] else {
        panic!("expected element block");
    };
    assert_eq!(el.attrs.get("checked"), Some(&serde_json::json!(true)));
}

#[test]
fn sink_requires_a_previous_item_of_the_same_type() {
    let items = vec![
        Node::list_item("bulleted", 0, "a"),
        Node::list_item("bulleted", 0, "b"),
        Node::list_item("ordered", 0, "c"),
    ];

    assert!(!editor_at(items.clone(), 0).can_run_command("list.sink", None));
    assert!(editor_at(items.clone(), 1).can_run_command("list.sink", None));
    assert!(!editor_at(items, 2).can_run_command("list.sink", None));
}

#[test]
fn sink_is_limited_to_one_level_below_the_previous_item() {
    let mut editor = editor_at(
        vec![
            Node::list_item("bulleted", 0, "a"),
            Node::list_item("bulleted", 0, "b"),
        ],
        1,
    );

    assert!(editor.run_command("list.sink", None).unwrap());
    assert_eq!(attr_u64(&editor, 1, "list_level"), Some(1));
    assert!(!editor.can_run_command("list.sink", None));
}

#[test]
fn sink_stops_at_the_maximum_level() {
    let editor = editor_at(
        vec![
            Node::list_item("bulleted", 8, "a"),
            Node::list_item("bulleted", 8, "b"),
        ],
        1,
    );
    assert!(!editor.can_run_command("list.sink", None));
}

#[test]
fn lift_outdents_then_leaves_the_list() {
    let mut editor = editor_at(
        vec![
            Node::list_item("bulleted", 0, "a"),
            Node::list_item("bulleted", 1, "b"),
        ],
        1,
    );

    assert!(editor.run_command("list.lift", None).unwrap());
    assert_eq!(attr_u64(&editor, 1, "list_level"), None);

    assert!(editor.run_command("list.lift", None).unwrap());
    assert_eq!(editor.doc().children[1], Node::paragraph("b"));
    assert!(!editor.can_run_command("list.lift", None));
}

#[test]
fn list_commands_ignore_headings() {
    let editor = editor_at(vec![Node::heading(1, "title")], 0);
    assert!(!editor.can_run_command("list.toggle", list_type("bulleted")));
    assert!(!editor.can_run_command("list.lift", None));
}
