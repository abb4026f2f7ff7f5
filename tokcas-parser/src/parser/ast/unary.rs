use crate::{
    parser::{
        ast::{binary::Binary, expr::Expr, literal::Literal, paren::Paren},
        error::Error,
        token::op::{UnaryOp, UnaryOpKind},
        Parse,
        Parser,
        Precedence,
    },
    tokenizer::TokenKind,
};
use std::{fmt, ops::Range};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A unary operation, such as `-x` or `n!`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Unary {
    /// The operand of the unary operation.
    pub operand: Box<Expr>,

    /// The operator of the unary operation.
    pub op: UnaryOp,

    /// The region of the source code that this unary operation was parsed from.
    pub span: Range<usize>,
}

impl Unary {
    /// Returns the span of the unary operation.
    pub fn span(&self) -> Range<usize> {
        self.span.clone()
    }

    /// Parses a unary operation, or a primary expression if there is no unary operator.
    ///
    /// Negation applies to everything that binds tighter than it, so `-x^2` is `-(x^2)`.
    /// Factorials are postfix and bind tightest of all.
    pub fn parse_or_lower(input: &mut Parser) -> Result<Expr, Error> {
        if input.peek_kind() == Some(TokenKind::Sub) {
            let op = input.try_parse::<UnaryOp>()?;
            let operand = Self::parse_or_lower(input)?;
            let operand = Binary::parse_expr(input, operand, Precedence::Exp)?;
            let span = op.span.start..operand.span().end;
            return Ok(Expr::Unary(Unary {
                operand: Box::new(operand),
                op,
                span,
            }));
        }

        let mut expr = match input.peek_kind() {
            Some(TokenKind::OpenParen) => Expr::Paren(input.try_parse::<Paren>()?),
            _ => Expr::Literal(input.try_parse::<Literal>()?),
        };

        while input.peek_kind() == Some(TokenKind::Factorial) {
            let op = input.try_parse::<UnaryOp>()?;
            let span = expr.span().start..op.span.end;
            expr = Expr::Unary(Unary {
                operand: Box::new(expr),
                op,
                span,
            });
        }

        Ok(expr)
    }
}

impl fmt::Display for Unary {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.op.kind {
            UnaryOpKind::Neg => write!(f, "-{}", self.operand),
            UnaryOpKind::Factorial => write!(f, "{}!", self.operand),
        }
    }
}
