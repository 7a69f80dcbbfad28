use chumsky::prelude::SimpleSpan;
use std::ops::Range;

pub(crate) type Span = SimpleSpan;

pub(crate) fn span(range: Range<usize>) -> Span {
    Span::from(range)
}

pub(crate) fn extract_span<'a>(body: &'a str, span: &Span) -> &'a str {
    &body[span.start..span.end]
}

/// The smallest span covering both `a` and `b`.
pub(crate) fn join(a: &Span, b: &Span) -> Span {
    span(a.start.min(b.start)..a.end.max(b.end))
}

#[test]
fn test_extract_span() {
    let body = "LDWA 5,i";
    assert_eq!(extract_span(body, &span(5..8)), "5,i");
    assert_eq!(extract_span(body, &join(&span(5..6), &span(7..8))), "5,i");
}
