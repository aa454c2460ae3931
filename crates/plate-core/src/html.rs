//! HTML codec for the editor's document dialect.
//!
//! Writing produces a fixed, canonical form. Reading is tolerant: unknown tags are
//! transparent, `<script>`/`<style>` bodies are discarded, unclosed elements are closed
//! implicitly and nothing is ever rejected.

use std::collections::BTreeMap;

use crate::core::{Document, ElementNode, Marks, Node, TextNode, VoidNode};
use crate::list::{ListItemInfo, ListType};

pub fn to_html(doc: &Document) -> String {
    let mut out = String::new();
    write_blocks(&mut out, &doc.children);
    if out.is_empty() {
        out.push_str("<p></p>");
    }
    out
}

pub fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn write_blocks(out: &mut String, nodes: &[Node]) {
    let mut ix = 0;
    while ix < nodes.len() {
        let list_run = nodes[ix..]
            .iter()
            .take_while(|n| matches!(n, Node::Element(el) if el.kind == "list_item"))
            .filter_map(|n| match n {
                Node::Element(el) => Some(el),
                _ => None,
            })
            .collect::<Vec<_>>();
        if !list_run.is_empty() {
            ix += list_run.len();
            write_list_run(out, &list_run);
            continue;
        }

        match &nodes[ix] {
            Node::Element(el) => write_element(out, el),
            Node::Void(v) => write_void(out, v),
            // Stray inline text at block level.
            Node::Text(t) => {
                out.push_str("<p>");
                if !t.text.is_empty() {
                    write_text_leaf(out, t);
                }
                out.push_str("</p>");
            }
        }
        ix += 1;
    }
}

fn write_element(out: &mut String, el: &ElementNode) {
    match el.kind.as_str() {
        "heading" => {
            let level = el.attr_u64("level").unwrap_or(1).clamp(1, 3);
            out.push_str(&format!("<h{level}>"));
            write_inline(out, &el.children);
            out.push_str(&format!("</h{level}>"));
        }
        "blockquote" => {
            out.push_str("<blockquote>");
            write_blocks(out, &el.children);
            out.push_str("</blockquote>");
        }
        _ => {
            out.push_str("<p>");
            write_inline(out, &el.children);
            out.push_str("</p>");
        }
    }
}

fn write_void(out: &mut String, v: &VoidNode) {
    let attr = |key: &str| v.attrs.get(key).and_then(|v| v.as_str()).unwrap_or("");
    match v.kind.as_str() {
        "divider" => out.push_str("<hr>"),
        "image" => {
            out.push_str(&format!("<img src=\"{}\"", escape_html(attr("src"))));
            if let Some(alt) = v.attrs.get("alt").and_then(|v| v.as_str()) {
                out.push_str(&format!(" alt=\"{}\"", escape_html(alt)));
            }
            out.push('>');
        }
        "video" => {
            let dim = |key: &str| v.attrs.get(key).and_then(|v| v.as_u64()).unwrap_or(0);
            out.push_str(&format!(
                "<div data-video><iframe src=\"{}\" width=\"{}\" height=\"{}\" allowfullscreen></iframe></div>",
                escape_html(attr("src")),
                dim("width"),
                dim("height"),
            ));
        }
        _ => {}
    }
}

// Flat list items become nested lists. An item may be at most one level deeper than
// the item before it; deeper jumps are pulled up.
fn write_list_run(out: &mut String, items: &[&ElementNode]) {
    let mut leveled: Vec<(&ElementNode, ListItemInfo)> = Vec::with_capacity(items.len());
    let mut prev_level: Option<u64> = None;
    for &el in items {
        let Some(mut info) = ListItemInfo::of(el) else {
            continue;
        };
        info.level = match prev_level {
            None => 0,
            Some(prev) => info.level.min(prev + 1),
        };
        prev_level = Some(info.level);
        leveled.push((el, info));
    }
    write_list_level(out, &leveled, 0);
}

fn write_list_level(out: &mut String, items: &[(&ElementNode, ListItemInfo)], level: u64) -> usize {
    let mut ix = 0;
    while ix < items.len() && items[ix].1.level == level {
        let list_type = items[ix].1.list_type;
        let (open, close) = match list_type {
            ListType::Bulleted => ("<ul>", "</ul>"),
            ListType::Ordered => ("<ol>", "</ol>"),
            ListType::Task => ("<ul data-type=\"taskList\">", "</ul>"),
        };
        out.push_str(open);
        while ix < items.len() && items[ix].1.level == level && items[ix].1.list_type == list_type {
            let (el, _) = items[ix];
            if list_type == ListType::Task {
                let checked = el.attrs.get("checked").and_then(|v| v.as_bool()) == Some(true);
                out.push_str(&format!(
                    "<li data-type=\"taskItem\" data-checked=\"{checked}\"><p>"
                ));
            } else {
                out.push_str("<li><p>");
            }
            write_inline(out, &el.children);
            out.push_str("</p>");
            ix += 1;
            if ix < items.len() && items[ix].1.level > level {
                ix += write_list_level(out, &items[ix..], level + 1);
            }
            out.push_str("</li>");
        }
        out.push_str(close);
    }
    ix
}

fn write_inline(out: &mut String, children: &[Node]) {
    for node in children {
        let Node::Text(t) = node else {
            continue;
        };
        if t.text.is_empty() {
            continue;
        }
        write_text_leaf(out, t);
    }
}

fn write_text_leaf(out: &mut String, t: &TextNode) {
    let m = &t.marks;
    let mut close: Vec<&str> = Vec::new();

    if let Some(color) = &m.highlight_color {
        let color = escape_html(color);
        out.push_str(&format!(
            "<mark data-color=\"{color}\" style=\"background-color: {color}\">"
        ));
        close.push("</mark>");
    }
    if let Some(color) = &m.text_color {
        out.push_str(&format!("<span style=\"color: {}\">", escape_html(color)));
        close.push("</span>");
    }
    for (on, open, end) in [
        (m.bold, "<strong>", "</strong>"),
        (m.italic, "<em>", "</em>"),
        (m.underline, "<u>", "</u>"),
        (m.strikethrough, "<s>", "</s>"),
    ] {
        if on {
            out.push_str(open);
            close.push(end);
        }
    }

    for (ix, line) in t.text.split('\n').enumerate() {
        if ix > 0 {
            out.push_str("<br>");
        }
        out.push_str(&escape_text(line));
    }

    for end in close.iter().rev() {
        out.push_str(end);
    }
}

fn escape_text(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Parses HTML into a document. Never fails; unreadable input yields an empty paragraph.
pub fn parse_html(input: &str) -> Document {
    let dom = build_dom(tokenize(input));
    let mut sink = BlockSink::default();
    walk_nodes(&dom, &Marks::default(), &mut sink);
    let mut children = sink.finish();
    if children.is_empty() {
        children.push(Node::paragraph(""));
    }
    Document { children }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Text(String),
    Open {
        name: String,
        attrs: BTreeMap<String, String>,
        self_closing: bool,
    },
    Close(String),
}

const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

const RAW_TEXT_TAGS: &[&str] = &["script", "style"];

fn tokenize(input: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut rest = input;

    while !rest.is_empty() {
        let Some(lt) = rest.find('<') else {
            tokens.push(Token::Text(decode_entities(rest)));
            break;
        };
        if lt > 0 {
            tokens.push(Token::Text(decode_entities(&rest[..lt])));
        }
        rest = &rest[lt..];

        if let Some(comment) = rest.strip_prefix("<!--") {
            rest = comment.find("-->").map_or("", |end| &comment[end + 3..]);
            continue;
        }
        if rest.starts_with("<!") || rest.starts_with("<?") {
            rest = rest.find('>').map_or("", |end| &rest[end + 1..]);
            continue;
        }

        let Some(gt) = find_tag_end(rest) else {
            // An unterminated tag is treated as text.
            tokens.push(Token::Text(decode_entities(rest)));
            break;
        };
        let inner = &rest[1..gt];
        rest = &rest[gt + 1..];

        if let Some(name) = inner.strip_prefix('/') {
            let name = name.trim().to_ascii_lowercase();
            if !name.is_empty() {
                tokens.push(Token::Close(name));
            }
            continue;
        }

        let Some((name, attrs, self_closing)) = parse_tag(inner) else {
            tokens.push(Token::Text(decode_entities(&format!("<{inner}>"))));
            continue;
        };

        if RAW_TEXT_TAGS.contains(&name.as_str()) {
            let close = format!("</{name}");
            let lower = rest.to_ascii_lowercase();
            rest = match lower.find(&close) {
                Some(end) => rest[end..].find('>').map_or("", |gt| &rest[end + gt + 1..]),
                None => "",
            };
            continue;
        }

        tokens.push(Token::Open {
            name,
            attrs,
            self_closing,
        });
    }

    tokens
}

// Index of the '>' closing the tag at the start of `s`, skipping quoted attribute values.
fn find_tag_end(s: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    for (ix, ch) in s.char_indices().skip(1) {
        match (quote, ch) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(ch),
            (None, '>') => return Some(ix),
            (None, _) => {}
        }
    }
    None
}

fn parse_tag(inner: &str) -> Option<(String, BTreeMap<String, String>, bool)> {
    let inner = inner.trim();
    let (inner, self_closing) = match inner.strip_suffix('/') {
        Some(stripped) => (stripped.trim_end(), true),
        None => (inner, false),
    };

    let name_end = inner
        .find(|c: char| c.is_ascii_whitespace())
        .unwrap_or(inner.len());
    let name = inner[..name_end].to_ascii_lowercase();
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return None;
    }

    let mut attrs = BTreeMap::new();
    let mut rest = inner[name_end..].trim_start();
    while !rest.is_empty() {
        let key_end = rest
            .find(|c: char| c == '=' || c.is_ascii_whitespace())
            .unwrap_or(rest.len());
        let key = rest[..key_end].to_ascii_lowercase();
        rest = rest[key_end..].trim_start();

        let value = if let Some(after_eq) = rest.strip_prefix('=') {
            let after_eq = after_eq.trim_start();
            match after_eq.chars().next() {
                Some(q @ ('"' | '\'')) => {
                    let body = &after_eq[1..];
                    let end = body.find(q).unwrap_or(body.len());
                    rest = body.get(end + 1..).unwrap_or("");
                    &body[..end]
                }
                _ => {
                    let end = after_eq
                        .find(|c: char| c.is_ascii_whitespace())
                        .unwrap_or(after_eq.len());
                    rest = &after_eq[end..];
                    &after_eq[..end]
                }
            }
        } else {
            ""
        };
        rest = rest.trim_start();

        if !key.is_empty() {
            attrs.insert(key, decode_entities(value));
        }
    }

    Some((name, attrs, self_closing))
}

fn decode_entities(input: &str) -> String {
    if !input.contains('&') {
        return input.to_string();
    }

    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];

        let decoded = rest[1..].find(';').filter(|&end| end <= 10).and_then(|end| {
            let entity = &rest[1..end + 1];
            let ch = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" | "#39" => Some('\''),
                "nbsp" => Some('\u{a0}'),
                _ => entity
                    .strip_prefix("#x")
                    .or_else(|| entity.strip_prefix("#X"))
                    .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                    .or_else(|| entity.strip_prefix('#').and_then(|dec| dec.parse().ok()))
                    .and_then(char::from_u32),
            }?;
            Some((ch, end + 2))
        });

        match decoded {
            Some((ch, consumed)) => {
                out.push(ch);
                rest = &rest[consumed..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

#[derive(Debug, Clone, PartialEq)]
enum DomNode {
    Element {
        name: String,
        attrs: BTreeMap<String, String>,
        children: Vec<DomNode>,
    },
    Text(String),
}

fn build_dom(tokens: Vec<Token>) -> Vec<DomNode> {
    struct Open {
        name: String,
        attrs: BTreeMap<String, String>,
        children: Vec<DomNode>,
    }

    fn close_top(stack: &mut Vec<Open>, root: &mut Vec<DomNode>) {
        let Some(open) = stack.pop() else {
            return;
        };
        let node = DomNode::Element {
            name: open.name,
            attrs: open.attrs,
            children: open.children,
        };
        match stack.last_mut() {
            Some(parent) => parent.children.push(node),
            None => root.push(node),
        }
    }

    fn push_node(stack: &mut [Open], root: &mut Vec<DomNode>, node: DomNode) {
        match stack.last_mut() {
            Some(parent) => parent.children.push(node),
            None => root.push(node),
        }
    }

    let mut root: Vec<DomNode> = Vec::new();
    let mut stack: Vec<Open> = Vec::new();

    for token in tokens {
        match token {
            Token::Text(text) => push_node(&mut stack, &mut root, DomNode::Text(text)),
            Token::Open {
                name,
                attrs,
                self_closing,
            } => {
                // Implied end tags for the common cases.
                if name == "p" && stack.last().is_some_and(|o| o.name == "p") {
                    close_top(&mut stack, &mut root);
                }
                if name == "li" {
                    let open_li = stack
                        .iter()
                        .rposition(|o| matches!(o.name.as_str(), "li" | "ul" | "ol"))
                        .filter(|&ix| stack[ix].name == "li");
                    if let Some(ix) = open_li {
                        while stack.len() > ix {
                            close_top(&mut stack, &mut root);
                        }
                    }
                }

                if self_closing || VOID_TAGS.contains(&name.as_str()) {
                    push_node(
                        &mut stack,
                        &mut root,
                        DomNode::Element {
                            name,
                            attrs,
                            children: Vec::new(),
                        },
                    );
                } else {
                    stack.push(Open {
                        name,
                        attrs,
                        children: Vec::new(),
                    });
                }
            }
            Token::Close(name) => {
                if let Some(ix) = stack.iter().rposition(|o| o.name == name) {
                    while stack.len() > ix {
                        close_top(&mut stack, &mut root);
                    }
                }
            }
        }
    }

    while !stack.is_empty() {
        close_top(&mut stack, &mut root);
    }
    root
}

const TRANSPARENT_BLOCK_TAGS: &[&str] = &[
    "html", "body", "div", "section", "article", "main", "header", "footer", "nav", "aside",
    "figure", "figcaption", "table", "tbody", "thead", "tr", "td", "th",
];

/// Collects blocks, grouping loose inline content into paragraphs.
#[derive(Default)]
struct BlockSink {
    blocks: Vec<Node>,
    pending: Vec<Node>,
}

impl BlockSink {
    fn push_inline(&mut self, leaf: Node) {
        self.pending.push(leaf);
    }

    fn push_block(&mut self, block: Node) {
        self.flush();
        self.blocks.push(block);
    }

    fn flush(&mut self) {
        let pending = std::mem::take(&mut self.pending);
        let has_content = pending
            .iter()
            .any(|n| matches!(n, Node::Text(t) if !t.text.trim().is_empty()));
        if has_content {
            self.blocks.push(text_block("paragraph", trim_inline(pending)));
        }
    }

    fn finish(mut self) -> Vec<Node> {
        self.flush();
        self.blocks
    }
}

fn text_block(kind: &str, children: Vec<Node>) -> Node {
    let children = if children.is_empty() {
        vec![Node::text("", Marks::default())]
    } else {
        children
    };
    Node::Element(ElementNode {
        kind: kind.to_string(),
        attrs: Default::default(),
        children,
    })
}

// Leading and trailing spaces of a block are layout, not content.
fn trim_inline(mut leaves: Vec<Node>) -> Vec<Node> {
    if let Some(Node::Text(first)) = leaves.first_mut() {
        first.text = first.text.trim_start_matches(' ').to_string();
    }
    if let Some(Node::Text(last)) = leaves.last_mut() {
        last.text = last.text.trim_end_matches(' ').to_string();
    }
    leaves.retain(|n| !matches!(n, Node::Text(t) if t.text.is_empty()));
    leaves
}

fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for ch in text.chars() {
        if matches!(ch, ' ' | '\n' | '\t' | '\r' | '\x0c') {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(ch);
            in_space = false;
        }
    }
    out
}

fn inline_marks(name: &str, attrs: &BTreeMap<String, String>, marks: &Marks) -> Option<Marks> {
    let mut next = marks.clone();
    match name {
        "strong" | "b" => next.bold = true,
        "em" | "i" => next.italic = true,
        "u" | "ins" => next.underline = true,
        "s" | "strike" | "del" => next.strikethrough = true,
        "mark" => {
            let color = attrs
                .get("data-color")
                .cloned()
                .or_else(|| style_property(attrs, "background-color"))
                .unwrap_or_else(|| "yellow".to_string());
            next.highlight_color = Some(color);
        }
        "span" | "font" => {
            let color = style_property(attrs, "color").or_else(|| attrs.get("color").cloned());
            if let Some(color) = color {
                next.text_color = Some(color);
            }
        }
        "a" | "code" | "small" | "sub" | "sup" | "label" | "abbr" | "cite" | "q" => {}
        _ => return None,
    }
    Some(next)
}

fn style_property(attrs: &BTreeMap<String, String>, property: &str) -> Option<String> {
    attrs.get("style")?.split(';').find_map(|decl| {
        let (key, value) = decl.split_once(':')?;
        (key.trim().eq_ignore_ascii_case(property))
            .then(|| value.trim().to_string())
            .filter(|v| !v.is_empty())
    })
}

fn walk_nodes(nodes: &[DomNode], marks: &Marks, sink: &mut BlockSink) {
    for node in nodes {
        walk_node(node, marks, sink);
    }
}

fn walk_node(node: &DomNode, marks: &Marks, sink: &mut BlockSink) {
    let (name, attrs, children) = match node {
        DomNode::Text(text) => {
            sink.push_inline(Node::text(collapse_whitespace(text), marks.clone()));
            return;
        }
        DomNode::Element {
            name,
            attrs,
            children,
        } => (name.as_str(), attrs, children.as_slice()),
    };

    match name {
        "p" | "pre" | "h4" | "h5" | "h6" => {
            sink.push_block(text_block("paragraph", inline_content(children, marks)));
        }
        "h1" | "h2" | "h3" => {
            let level: u64 = name[1..].parse().unwrap_or(1);
            let mut block = text_block("heading", inline_content(children, marks));
            if let Node::Element(el) = &mut block {
                el.attrs.insert("level".to_string(), level.into());
            }
            sink.push_block(block);
        }
        "blockquote" => {
            let mut inner = BlockSink::default();
            walk_nodes(children, marks, &mut inner);
            let mut blocks = inner.finish();
            if blocks.is_empty() {
                blocks.push(Node::paragraph(""));
            }
            sink.push_block(Node::blockquote(blocks));
        }
        "ul" | "ol" => {
            sink.flush();
            read_list(name, attrs, children, 0, marks, &mut sink.blocks);
        }
        "li" => {
            // A list item outside of a list.
            sink.flush();
            read_list(
                "ul",
                &BTreeMap::new(),
                std::slice::from_ref(node),
                0,
                marks,
                &mut sink.blocks,
            );
        }
        "hr" => sink.push_block(Node::divider()),
        "img" => {
            if let Some(src) = attrs.get("src").filter(|s| !s.trim().is_empty()) {
                sink.push_block(Node::image(src.clone(), attrs.get("alt").cloned()));
            }
        }
        "iframe" | "video" => {
            if let Some(video) = read_video(attrs, children) {
                sink.push_block(video);
            }
        }
        "div" if attrs.contains_key("data-video") => {
            let frame = children.iter().find_map(|child| match child {
                DomNode::Element {
                    name,
                    attrs,
                    children,
                } if name == "iframe" || name == "video" => read_video(attrs, children),
                _ => None,
            });
            match frame {
                Some(video) => sink.push_block(video),
                None => walk_nodes(children, marks, sink),
            }
        }
        "br" => sink.push_inline(Node::text("\n", marks.clone())),
        "input" => {}
        _ if TRANSPARENT_BLOCK_TAGS.contains(&name) => {
            sink.flush();
            walk_nodes(children, marks, sink);
            sink.flush();
        }
        _ => {
            let marks = inline_marks(name, attrs, marks).unwrap_or_else(|| marks.clone());
            walk_nodes(children, &marks, sink);
        }
    }
}

fn read_video(attrs: &BTreeMap<String, String>, children: &[DomNode]) -> Option<Node> {
    let src = attrs.get("src").cloned().or_else(|| {
        children.iter().find_map(|child| match child {
            DomNode::Element { name, attrs, .. } if name == "source" => attrs.get("src").cloned(),
            _ => None,
        })
    })?;
    if src.trim().is_empty() {
        return None;
    }
    // Unparseable sizes read as zero; normalization substitutes the defaults.
    let dim = |key: &str| {
        attrs
            .get(key)
            .and_then(|v| v.trim().trim_end_matches("px").parse::<f64>().ok())
            .filter(|v| v.is_finite() && *v > 0.0)
            .map_or(0, |v| v.round() as u64)
    };
    Some(Node::video(src, dim("width"), dim("height")))
}

// Inline leaves of a text block; nested block structure is flattened into its text.
fn inline_content(children: &[DomNode], marks: &Marks) -> Vec<Node> {
    let mut sink = BlockSink::default();
    walk_nodes(children, marks, &mut sink);
    let mut leaves: Vec<Node> = Vec::new();
    for block in sink.blocks {
        if let Node::Element(el) = block {
            leaves.extend(el.children.into_iter().filter(|n| matches!(n, Node::Text(_))));
        }
    }
    leaves.extend(sink.pending);
    trim_inline(leaves)
}

fn read_list(
    tag: &str,
    attrs: &BTreeMap<String, String>,
    children: &[DomNode],
    level: u64,
    marks: &Marks,
    out: &mut Vec<Node>,
) {
    let list_type = match tag {
        "ol" => ListType::Ordered,
        _ if attrs.get("data-type").is_some_and(|t| t == "taskList") => ListType::Task,
        _ => ListType::Bulleted,
    };

    for child in children {
        let DomNode::Element {
            name,
            attrs: item_attrs,
            children: item_children,
        } = child
        else {
            if let DomNode::Text(text) = child {
                if !text.trim().is_empty() {
                    out.push(list_item(list_type, level, false, trim_inline(vec![Node::text(
                        collapse_whitespace(text),
                        marks.clone(),
                    )])));
                }
            }
            continue;
        };

        match name.as_str() {
            "li" => {
                let item_type = if item_attrs.get("data-type").is_some_and(|t| t == "taskItem") {
                    ListType::Task
                } else {
                    list_type
                };
                let checked = item_attrs.get("data-checked").is_some_and(|v| v == "true")
                    || item_children.iter().any(is_checked_checkbox);

                let (nested, content): (Vec<&DomNode>, Vec<&DomNode>) =
                    item_children.iter().partition(|n| {
                        matches!(n, DomNode::Element { name, .. } if name == "ul" || name == "ol")
                    });
                let content: Vec<DomNode> = content.into_iter().cloned().collect();
                out.push(list_item(
                    item_type,
                    level,
                    checked,
                    inline_content(&content, marks),
                ));

                for list in nested {
                    if let DomNode::Element {
                        name,
                        attrs,
                        children,
                    } = list
                    {
                        let level = (level + 1).min(crate::list::MAX_LIST_LEVEL);
                        read_list(name, attrs, children, level, marks, out);
                    }
                }
            }
            "ul" | "ol" => read_list(
                name,
                item_attrs,
                item_children,
                (level + 1).min(crate::list::MAX_LIST_LEVEL),
                marks,
                out,
            ),
            _ => {}
        }
    }
}

fn is_checked_checkbox(node: &DomNode) -> bool {
    match node {
        DomNode::Element {
            name,
            attrs,
            children,
        } => {
            (name == "input" && attrs.contains_key("checked"))
                || children.iter().any(is_checked_checkbox)
        }
        DomNode::Text(_) => false,
    }
}

fn list_item(list_type: ListType, level: u64, checked: bool, children: Vec<Node>) -> Node {
    let mut block = text_block("list_item", children);
    if let Node::Element(el) = &mut block {
        el.attrs
            .insert("list_type".to_string(), list_type.as_str().into());
        if level > 0 {
            el.attrs.insert("list_level".to_string(), level.into());
        }
        if list_type == ListType::Task {
            el.attrs.insert("checked".to_string(), checked.into());
        }
    }
    block
}
