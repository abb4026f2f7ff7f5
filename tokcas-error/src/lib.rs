//! Contains the [`ErrorKind`] trait implemented by every error that points into source text, and
//! the [`Error`] type pairing such a kind with the regions it points at.

// lets derived `ErrorKind` impls name this crate from inside its own tests
#[cfg(test)]
extern crate self as tokcas_error;

use ariadne::{Color, Label, Report, ReportKind, Source};
use std::{fmt::Debug, ops::Range};

/// The color to use to highlight expressions.
pub const EXPR: Color = Color::RGB(52, 235, 152);

/// Represents any kind of error that can occur while reading an expression.
pub trait ErrorKind: Debug + Send {
    /// Builds the report for this error.
    fn build_report<'a>(
        &self,
        src_id: &'a str,
        spans: &[Range<usize>],
    ) -> Report<'a, (&'a str, Range<usize>)>;
}

/// Builds the report for an error: `labels` are attached to `spans` in order, and highlighted with
/// [`EXPR`]. Empty labels highlight their span without a message.
///
/// This is what a derived [`ErrorKind`] calls.
pub fn report<'a, L: ToString>(
    src_id: &'a str,
    spans: &[Range<usize>],
    message: impl ToString,
    labels: impl IntoIterator<Item = L>,
    help: Option<String>,
    note: Option<String>,
) -> Report<'a, (&'a str, Range<usize>)> {
    let start = spans.first().map_or(0, |span| span.start);
    let labels = labels.into_iter().zip(spans).map(|(text, span)| {
        let text = text.to_string();
        let label = Label::new((src_id, span.clone())).with_color(EXPR);
        if text.is_empty() {
            label
        } else {
            label.with_message(text)
        }
    });

    let mut builder = Report::build(ReportKind::Error, src_id, start)
        .with_message(message.to_string())
        .with_labels(labels);
    if let Some(help) = help {
        builder.set_help(help);
    }
    if let Some(note) = note {
        builder.set_note(note);
    }
    builder.finish()
}

/// An error associated with regions of source code that can be highlighted.
#[derive(Debug)]
pub struct Error {
    /// The regions of the source code that this error originated from.
    pub spans: Vec<Range<usize>>,

    /// The kind of error that occurred.
    pub kind: Box<dyn ErrorKind>,

    /// Whether the error stops the parser from trying alternatives.
    pub fatal: bool,
}

impl Error {
    /// Creates a new error with the given spans and kind.
    pub fn new(spans: Vec<Range<usize>>, kind: impl ErrorKind + 'static) -> Self {
        Self { spans, kind: Box::new(kind), fatal: false }
    }

    /// Creates a new fatal error with the given spans and kind.
    pub fn new_fatal(spans: Vec<Range<usize>>, kind: impl ErrorKind + 'static) -> Self {
        Self { spans, kind: Box::new(kind), fatal: true }
    }

    /// Build a report from this error kind.
    pub fn build_report<'a>(&self, src_id: &'a str) -> Report<'a, (&'a str, Range<usize>)> {
        self.kind.build_report(src_id, &self.spans)
    }

    /// Renders the report against the given source text, including ANSI color codes.
    pub fn render(&self, src_id: &str, source: &str) -> String {
        let mut buf = Vec::new();
        // writing into a `Vec` cannot fail
        let _ = self.build_report(src_id).write((src_id, Source::from(source)), &mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokcas_attrs::ErrorKind;

    #[derive(Debug, Clone, ErrorKind, PartialEq)]
    #[error(
        message = "unknown operator",
        labels = [format!("`{}` is not an operator", symbol)],
        help = "operators are `+ - * / % // ^ !`",
    )]
    struct UnknownOperator {
        symbol: char,
    }

    #[derive(Debug, Clone, ErrorKind, PartialEq)]
    #[error(message = "empty input")]
    struct EmptyInput;

    fn strip(text: String) -> String {
        String::from_utf8(strip_ansi_escapes::strip(text)).unwrap()
    }

    #[test]
    fn report_contains_message_and_label() {
        let err = Error::new(vec![2..3], UnknownOperator { symbol: '$' });
        let rendered = strip(err.render("input", "x $ y"));

        assert!(rendered.contains("unknown operator"));
        assert!(rendered.contains("`$` is not an operator"));
        assert!(rendered.contains("operators are"));
        assert!(!err.fatal);
    }

    #[test]
    fn report_without_labels() {
        let err = Error::new_fatal(vec![0..2], EmptyInput);
        let rendered = strip(err.render("input", "()"));

        assert!(rendered.contains("empty input"));
        assert!(err.fatal);
    }
}
