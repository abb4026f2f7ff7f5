use ariadne::Fmt;
use tokcas_attrs::ErrorKind;
use tokcas_error::{ErrorKind, EXPR};
use crate::tokenizer::TokenKind;

/// The end of the source code was reached unexpectedly.
#[derive(Debug, Clone, ErrorKind, PartialEq)]
#[error(
    message = "unexpected end of input",
    labels = [format!("you might need to add another {} here", "expression".fg(EXPR))],
)]
pub struct UnexpectedEof;

/// The end of the source code was expected, but something else was found.
#[derive(Debug, Clone, ErrorKind, PartialEq)]
#[error(
    message = "expected end of input",
    labels = [format!("I could not understand the remaining {} here", "expression".fg(EXPR))],
)]
pub struct ExpectedEof;

/// An unexpected token was encountered.
#[derive(Debug, Clone, ErrorKind, PartialEq)]
#[error(
    message = "unexpected token",
    labels = [format!("expected one of: {}", expected.iter().map(|t| format!("{:?}", t)).collect::<Vec<_>>().join(", "))],
    help = format!("found {:?}", found),
)]
pub struct UnexpectedToken {
    /// The token(s) that were expected.
    pub expected: &'static [TokenKind],

    /// The token that was found.
    pub found: TokenKind,
}

/// An opening parenthesis was never closed.
#[derive(Debug, Clone, ErrorKind, PartialEq)]
#[error(
    message = "unclosed parenthesis",
    labels = ["this parenthesis is never closed"],
    help = format!("add a closing parenthesis `{}` after the {}", ")".fg(EXPR), "expression".fg(EXPR)),
)]
pub struct UnclosedParen;

/// A closing parenthesis has no matching opening parenthesis.
#[derive(Debug, Clone, ErrorKind, PartialEq)]
#[error(
    message = "unmatched closing parenthesis",
    labels = ["this parenthesis has no opening partner"],
)]
pub struct UnmatchedCloseParen;

/// A number literal could not be represented.
#[derive(Debug, Clone, ErrorKind, PartialEq)]
#[error(
    message = format!("invalid number: `{}`", lexeme),
    labels = ["here"],
    note = "numbers are stored as 64-bit floating point values",
)]
pub struct InvalidNumber {
    /// The text of the literal.
    pub lexeme: String,
}
