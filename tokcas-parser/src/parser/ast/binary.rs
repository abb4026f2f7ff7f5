use crate::{
    parser::{
        ast::{expr::Expr, unary::Unary},
        error::Error,
        token::op::{BinOp, BinOpKind},
        Associativity,
        Parser,
        Precedence,
    },
    tokenizer::TokenKind,
};
use std::{fmt, ops::Range};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A binary expression, such as `1 + 2`. Binary expressions can include nested expressions.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Binary {
    /// The left-hand side of the binary expression.
    pub lhs: Box<Expr>,

    /// The operator of the binary expression.
    pub op: BinOp,

    /// The right-hand side of the binary expression.
    pub rhs: Box<Expr>,

    /// The region of the source code that this binary expression was parsed from.
    pub span: Range<usize>,
}

/// Looks at the next token and returns the binary operator it represents, without consuming it.
/// An operand directly following another operand is implicit multiplication.
fn peek_op(input: &Parser, lhs_end: usize) -> Option<BinOp> {
    let token = input.peek_token()?;
    let kind = match token.kind {
        TokenKind::Exp => BinOpKind::Exp,
        TokenKind::Mul => BinOpKind::Mul,
        TokenKind::Div => BinOpKind::Div,
        TokenKind::Mod => BinOpKind::Mod,
        TokenKind::IntDiv => BinOpKind::IntDiv,
        TokenKind::Add => BinOpKind::Add,
        TokenKind::Sub => BinOpKind::Sub,
        kind if kind.starts_operand() => return Some(BinOp {
            kind: BinOpKind::Mul,
            implicit: true,
            span: lhs_end..token.span.start,
        }),
        _ => return None,
    };

    Some(BinOp {
        kind,
        implicit: false,
        span: token.span.clone(),
    })
}

impl Binary {
    /// Returns the span of the binary expression.
    pub fn span(&self) -> Range<usize> {
        self.span.clone()
    }

    /// Parses binary operators of at least the given precedence following `lhs`, building the
    /// tree by precedence climbing.
    pub fn parse_expr(
        input: &mut Parser,
        mut lhs: Expr,
        precedence: Precedence,
    ) -> Result<Expr, Error> {
        let right_power = input.is_power_right_associative();

        while let Some(op) = peek_op(input, lhs.span().end) {
            if op.precedence() < precedence {
                break;
            }
            if !op.implicit {
                input.next_token()?;
            }

            let mut rhs = Unary::parse_or_lower(input)?;
            while let Some(next_op) = peek_op(input, rhs.span().end) {
                // `3 + 4 * 5` must group as `3 + (4 * 5)`, so a tighter operator claims `rhs` first
                let next_precedence = next_op.precedence();
                if next_precedence > op.precedence()
                    || (next_precedence == op.precedence()
                        && next_op.associativity(right_power) == Associativity::Right)
                {
                    rhs = Self::parse_expr(input, rhs, next_precedence)?;
                } else {
                    break;
                }
            }

            let span = lhs.span().start..rhs.span().end;
            lhs = Expr::Binary(Binary {
                lhs: Box::new(lhs),
                op,
                rhs: Box::new(rhs),
                span,
            });
        }

        Ok(lhs)
    }
}

impl fmt::Display for Binary {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {} {}", self.lhs, self.op.kind.symbol(), self.rhs)
    }
}
