/// Built-in session: each line is one host message as it appears on the wire.
pub const DEMO: &str = r##"
# headline and a rule under it
{"kind":"action","payload":"toggleH1"}
{"kind":"action","payload":"setHorizontalRule"}
# the caret now sits in the paragraph after the rule
{"kind":"action","payload":"toggleTaskListItem"}
{"kind":"action","payload":"sinkListItem"}
{"kind":"insertVideo","payload":{"url":"https://example.com/embed/intro","width":0,"height":-5}}
{"kind":"insertImage","payload":"https://example.com/diagram.png"}
{"kind":"editor","payload":"focus"}
# not an action the editor knows
{"kind":"action","payload":"toggleFlying"}
{"kind":"action","payload":"undo"}
{"kind":"action","payload":"redo"}
{"kind":"editor","payload":"blur"}
"##;

pub struct Line<'a> {
    pub number: usize,
    pub text: &'a str,
}

/// Message lines of a script, skipping blanks and `#` comments.
pub fn lines(source: &str) -> impl Iterator<Item = Line<'_>> {
    source
        .lines()
        .enumerate()
        .map(|(ix, text)| Line {
            number: ix + 1,
            text: text.trim(),
        })
        .filter(|line| !line.text.is_empty() && !line.text.starts_with('#'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use webtext_bridge::{ProtocolError, decode_native};

    #[test]
    fn demo_lines_decode_except_the_deliberate_mistake() {
        let failures: Vec<ProtocolError> = lines(DEMO)
            .filter_map(|line| decode_native(line.text).err())
            .collect();
        assert_eq!(
            failures,
            vec![ProtocolError::UnknownAction("toggleFlying".to_string())]
        );
    }

    #[test]
    fn comments_and_blank_lines_are_skipped() {
        let numbers: Vec<usize> = lines("# a\n\n  x\n#b\ny").map(|l| l.number).collect();
        assert_eq!(numbers, vec![3, 5]);
    }
}
