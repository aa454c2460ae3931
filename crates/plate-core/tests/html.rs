use pretty_assertions::assert_eq;
use webtext_plate_core::{
    Editor, Node, PluginRegistry, Point, Selection, StructuredDocument, parse_html, to_html,
};

const CANONICAL: &str = concat!(
    "<h1>Title</h1>",
    "<p>Plain <strong>bold</strong> and <em>italic</em> with <u>under</u> and <s>struck</s></p>",
    "<blockquote><p>quoted</p><p>twice</p></blockquote>",
    "<hr>",
    "<ul><li><p>one</p><ul><li><p>two</p></li></ul></li></ul>",
    "<ol><li><p>first</p></li><li><p>second</p></li></ol>",
    "<ul data-type=\"taskList\"><li data-type=\"taskItem\" data-checked=\"true\"><p>done</p></li></ul>",
    "<img src=\"https://example.com/a.png\" alt=\"A &amp; B\">",
    "<div data-video><iframe src=\"https://example.com/v\" width=\"640\" height=\"480\" allowfullscreen></iframe></div>",
    "<p><mark data-color=\"#FAF594\" style=\"background-color: #FAF594\"><span style=\"color: #958DF1\">tinted</span></mark></p>",
);

fn editor_from_html(html: &str) -> Editor {
    let doc = parse_html(html);
    let selection = Selection::collapsed(Point::new(vec![0, 0], 0));
    Editor::new(doc, selection, PluginRegistry::richtext())
}

#[test]
fn canonical_html_round_trips() {
    assert_eq!(to_html(&parse_html(CANONICAL)), CANONICAL);
}

#[test]
fn canonical_html_round_trips_through_the_editor() {
    let editor = editor_from_html(CANONICAL);
    assert_eq!(to_html(editor.doc()), CANONICAL);
}

#[test]
fn alternate_spellings_are_canonicalized() {
    let doc = parse_html("<h4>small</h4><p><b>b</b><i>i</i><del>d</del><strike>s</strike></p>");
    assert_eq!(
        to_html(&doc),
        "<p>small</p><p><strong>b</strong><em>i</em><s>d</s><s>s</s></p>"
    );
}

#[test]
fn line_breaks_and_entities_survive() {
    let html = "<p>a &amp; b<br>c &lt; d</p>";
    let editor = editor_from_html(html);
    assert_eq!(to_html(editor.doc()), html);
}

#[test]
fn bare_iframe_is_read_as_video_and_clamped() {
    let editor = editor_from_html("<p>x</p><iframe src=\"https://v\" width=\"10\"></iframe>");
    assert_eq!(
        to_html(editor.doc()),
        "<p>x</p><div data-video><iframe src=\"https://v\" width=\"320\" height=\"480\" allowfullscreen></iframe></div>"
    );
}

#[test]
fn empty_input_reads_as_one_empty_paragraph() {
    assert_eq!(parse_html("").children, vec![Node::paragraph("")]);
    assert_eq!(parse_html("   \n ").children, vec![Node::paragraph("")]);
    assert_eq!(to_html(&parse_html("")), "<p></p>");
}

#[test]
fn structured_document_round_trips_through_json() {
    let editor = editor_from_html(CANONICAL);
    let structured = StructuredDocument::from_document(editor.doc().clone());
    assert_eq!(structured.schema, "webtext");

    let json = structured.to_json_pretty().unwrap();
    let back = StructuredDocument::parse(&json).unwrap();
    assert_eq!(back, structured);
}
