//! Representation of the original input.
use super::types::LineNumber;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SourceLine<'s> {
    pub(crate) number: LineNumber,
    pub(crate) text: &'s str,
}

#[derive(Debug)]
pub(crate) struct Source<'s> {
    body: &'s str,
}

impl<'s> Source<'s> {
    pub(crate) fn new(body: &'s str) -> Source<'s> {
        Source { body }
    }

    /// Split the source into lines.  A trailing carriage return is
    /// not part of a line's text.  Even an empty source has one
    /// (blank) line, so that there is somewhere to report a missing
    /// `.END`.
    pub(crate) fn lines(&self) -> Vec<SourceLine<'s>> {
        let mut result: Vec<SourceLine<'s>> = self
            .body
            .lines()
            .zip(1..)
            .map(|(text, number)| SourceLine { number, text })
            .collect();
        if result.is_empty() {
            result.push(SourceLine {
                number: 1,
                text: "",
            });
        }
        result
    }
}

#[test]
fn test_lines() {
    let src = Source::new("STOP\r\n.END\n");
    assert_eq!(
        src.lines(),
        vec![
            SourceLine {
                number: 1,
                text: "STOP"
            },
            SourceLine {
                number: 2,
                text: ".END"
            },
        ]
    );
}

#[test]
fn test_empty_source_has_one_line() {
    assert_eq!(
        Source::new("").lines(),
        vec![SourceLine {
            number: 1,
            text: ""
        }]
    );
}
