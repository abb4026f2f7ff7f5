pub mod ast;
pub mod error;
pub mod token;

use error::{kind, Error};
use super::tokenizer::{tokenize_complete, Token, TokenKind};
use std::ops::Range;

/// A high-level parser for algebraic expressions. This is the type to use to parse a piece of
/// text into an abstract syntax tree.
#[derive(Debug, Clone)]
pub struct Parser<'source> {
    /// The tokens that this parser is currently parsing.
    tokens: Box<[Token<'source>]>,

    /// The index of the **next** token to be parsed.
    cursor: usize,

    /// Whether `a^b^c` groups as `a^(b^c)` instead of `(a^b)^c`.
    right_associative_power: bool,
}

impl<'source> Parser<'source> {
    /// Create a new parser for the given source.
    pub fn new(source: &'source str) -> Self {
        Self {
            tokens: tokenize_complete(source),
            cursor: 0,
            right_associative_power: false,
        }
    }

    /// Sets the associativity of the power operator.
    pub fn right_associative_power(mut self, right: bool) -> Self {
        self.right_associative_power = right;
        self
    }

    /// Returns true if the power operator is right-associative for this parser.
    pub fn is_power_right_associative(&self) -> bool {
        self.right_associative_power
    }

    /// Creates an error that points at the current token, or the end of the source code if the
    /// cursor is at the end of the stream.
    pub fn error(&self, kind: impl error::ErrorKind + 'static) -> Error {
        Error::new(vec![self.span()], kind)
    }

    /// Creates a fatal error that points at the current token, or the end of the source code if
    /// the cursor is at the end of the stream.
    pub fn error_fatal(&self, kind: impl error::ErrorKind + 'static) -> Error {
        Error::new_fatal(vec![self.span()], kind)
    }

    /// Returns a span pointing at the end of the source code.
    pub fn eof_span(&self) -> Range<usize> {
        self.tokens.last().map_or(0..0, |token| token.span.end..token.span.end)
    }

    /// Returns the span of the current non-whitespace token, or the end of the source code if
    /// there is none.
    pub fn span(&self) -> Range<usize> {
        self.peek_token()
            .map_or(self.eof_span(), |token| token.span.clone())
    }

    /// Returns the next non-whitespace token without moving the cursor.
    pub fn peek_token(&self) -> Option<&Token<'source>> {
        self.tokens[self.cursor.min(self.tokens.len())..]
            .iter()
            .find(|token| !token.is_whitespace())
    }

    /// Returns the kind of the next non-whitespace token without moving the cursor.
    pub fn peek_kind(&self) -> Option<TokenKind> {
        self.peek_token().map(|token| token.kind)
    }

    /// Returns the next token to be parsed, then advances the cursor. Whitespace tokens are
    /// skipped.
    ///
    /// Returns an EOF error if there are no more tokens.
    pub fn next_token(&mut self) -> Result<Token<'source>, Error> {
        while self.cursor < self.tokens.len() {
            let token = &self.tokens[self.cursor];
            self.cursor += 1;
            if !token.is_whitespace() {
                // cloning is cheap: only Range<_> is cloned
                return Ok(token.clone());
            }
        }

        Err(self.error(kind::UnexpectedEof))
    }

    /// Speculatively parses a value from the given stream of tokens. If parsing fails, the cursor
    /// is moved back to where it was.
    pub fn try_parse<T: Parse>(&mut self) -> Result<T, Error> {
        self.try_parse_with_fn(T::parse)
    }

    /// Speculatively parses a value using a custom parsing function. If parsing fails, the
    /// cursor is moved back to where it was.
    pub fn try_parse_with_fn<T, F>(&mut self, f: F) -> Result<T, Error>
    where
        F: FnOnce(&mut Parser<'source>) -> Result<T, Error>,
    {
        let start = self.cursor;
        match f(self) {
            Ok(value) => Ok(value),
            err => {
                self.cursor = start;
                err
            },
        }
    }

    /// Attempts to parse a value from the given stream of tokens. All the tokens must be consumed
    /// by the parser; if not, an error is returned.
    pub fn try_parse_full<T: Parse>(&mut self) -> Result<T, Error> {
        let value = T::parse(self)?;
        match self.peek_token() {
            None => Ok(value),
            Some(token) if token.kind == TokenKind::CloseParen => {
                Err(self.error_fatal(kind::UnmatchedCloseParen))
            },
            Some(_) => Err(self.error_fatal(kind::ExpectedEof)),
        }
    }
}

/// Any type that can be parsed from a source of tokens.
pub trait Parse: Sized {
    /// Parses a value from the given stream of tokens, advancing the stream past the consumed
    /// tokens if parsing is successful.
    fn parse(input: &mut Parser) -> Result<Self, Error>;
}

/// The associativity of a binary or unary operation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Associativity {
    /// `a op b op c` is evaluated as `(a op b) op c`.
    Left,

    /// `a op b op c` is evaluated as `a op (b op c)`.
    Right,
}

/// The precedence of an operation, in order from lowest precedence (evaluated last) to highest
/// precedence (evaluated first).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Precedence {
    /// Any precedence.
    Any,

    /// Precedence of addition (`+`) and subtraction (`-`), which separate terms.
    Term,

    /// Precedence of multiplication (`*`), division (`/`), modulo (`%`), and integer division
    /// (`//`), which separate factors.
    Factor,

    /// Precedence of unary subtraction (`-`).
    Neg,

    /// Precedence of exponentiation (`^`).
    Exp,

    /// Precedence of factorial (`!`).
    Factorial,
}

impl PartialOrd for Precedence {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        let left = *self as u8;
        let right = *other as u8;
        left.partial_cmp(&right)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use super::*;

    use ast::{
        binary::Binary,
        equation::Equation,
        expr::Expr,
        literal::{Literal, LitNum, LitSym},
        paren::Paren,
        unary::Unary,
    };
    use token::op::{BinOp, BinOpKind, UnaryOp, UnaryOpKind};

    fn num(value: f64, span: Range<usize>) -> Expr {
        Expr::Literal(Literal::Number(LitNum { value, span }))
    }

    fn sym(name: &str, span: Range<usize>) -> Expr {
        Expr::Literal(Literal::Symbol(LitSym { name: name.to_string(), span }))
    }

    fn bin(lhs: Expr, kind: BinOpKind, op_span: Range<usize>, rhs: Expr, implicit: bool) -> Expr {
        let span = lhs.span().start..rhs.span().end;
        Expr::Binary(Binary {
            lhs: Box::new(lhs),
            op: BinOp { kind, implicit, span: op_span },
            rhs: Box::new(rhs),
            span,
        })
    }

    #[test]
    fn literal_int() {
        let mut parser = Parser::new("16");
        let expr = parser.try_parse_full::<Expr>().unwrap();

        assert_eq!(expr, num(16.0, 0..2));
    }

    #[test]
    fn literal_float() {
        let mut parser = Parser::new("3.25");
        let expr = parser.try_parse_full::<Expr>().unwrap();

        assert_eq!(expr, num(3.25, 0..4));
    }

    #[test]
    fn term_then_factor() {
        let mut parser = Parser::new("1 + 2 * x");
        let expr = parser.try_parse_full::<Expr>().unwrap();

        assert_eq!(expr, bin(
            num(1.0, 0..1),
            BinOpKind::Add,
            2..3,
            bin(num(2.0, 4..5), BinOpKind::Mul, 6..7, sym("x", 8..9), false),
            false,
        ));
    }

    #[test]
    fn left_associative_subtraction() {
        let mut parser = Parser::new("a-b-c");
        let expr = parser.try_parse_full::<Expr>().unwrap();

        assert_eq!(expr, bin(
            bin(sym("a", 0..1), BinOpKind::Sub, 1..2, sym("b", 2..3), false),
            BinOpKind::Sub,
            3..4,
            sym("c", 4..5),
            false,
        ));
    }

    #[test]
    fn power_associativity() {
        let mut parser = Parser::new("a^b^c");
        let left = parser.try_parse_full::<Expr>().unwrap();
        assert_eq!(left, bin(
            bin(sym("a", 0..1), BinOpKind::Exp, 1..2, sym("b", 2..3), false),
            BinOpKind::Exp,
            3..4,
            sym("c", 4..5),
            false,
        ));

        let mut parser = Parser::new("a^b^c").right_associative_power(true);
        let right = parser.try_parse_full::<Expr>().unwrap();
        assert_eq!(right, bin(
            sym("a", 0..1),
            BinOpKind::Exp,
            1..2,
            bin(sym("b", 2..3), BinOpKind::Exp, 3..4, sym("c", 4..5), false),
            false,
        ));
    }

    #[test]
    fn implicit_multiplication() {
        let mut parser = Parser::new("2x");
        let expr = parser.try_parse_full::<Expr>().unwrap();

        assert_eq!(expr, bin(num(2.0, 0..1), BinOpKind::Mul, 1..1, sym("x", 1..2), true));
    }

    #[test]
    fn negation_binds_weaker_than_power() {
        let mut parser = Parser::new("-x^2");
        let expr = parser.try_parse_full::<Expr>().unwrap();

        assert_eq!(expr, Expr::Unary(Unary {
            operand: Box::new(bin(sym("x", 1..2), BinOpKind::Exp, 2..3, num(2.0, 3..4), false)),
            op: UnaryOp { kind: UnaryOpKind::Neg, span: 0..1 },
            span: 0..4,
        }));
    }

    #[test]
    fn factorial_and_paren() {
        let mut parser = Parser::new("(n+1)!");
        let expr = parser.try_parse_full::<Expr>().unwrap();

        assert_eq!(expr, Expr::Unary(Unary {
            operand: Box::new(Expr::Paren(Paren {
                expr: Box::new(bin(sym("n", 1..2), BinOpKind::Add, 2..3, num(1.0, 3..4), false)),
                span: 0..5,
            })),
            op: UnaryOp { kind: UnaryOpKind::Factorial, span: 5..6 },
            span: 0..6,
        }));
    }

    #[test]
    fn equation() {
        let mut parser = Parser::new("y = 2");
        let eq = parser.try_parse_full::<Equation>().unwrap();

        assert_eq!(eq, Equation {
            lhs: sym("y", 0..1),
            rhs: Some(num(2.0, 4..5)),
            span: 0..5,
        });
    }

    #[test]
    fn unclosed_paren() {
        let mut parser = Parser::new("(a + b");
        assert!(parser.try_parse_full::<Expr>().is_err());
    }

    #[test]
    fn unmatched_close_paren() {
        let mut parser = Parser::new("a + b)");
        let err = parser.try_parse_full::<Expr>().unwrap_err();
        assert!(err.fatal);
        assert_eq!(err.spans, vec![5..6]);
    }

    #[test]
    fn dangling_operator() {
        let mut parser = Parser::new("a *");
        assert!(parser.try_parse_full::<Expr>().is_err());
    }
}
