use crate::{
    parser::{ast::expr::Expr, error::Error, token::Assign, Parse, Parser},
    tokenizer::TokenKind,
};
use std::{fmt, ops::Range};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// An equation `lhs = rhs`, or a bare expression when there is no `=`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Equation {
    /// The left-hand side.
    pub lhs: Expr,

    /// The right-hand side, if the input was an equation.
    pub rhs: Option<Expr>,

    /// The region of the source code that this equation was parsed from.
    pub span: Range<usize>,
}

impl Parse for Equation {
    fn parse(input: &mut Parser) -> Result<Self, Error> {
        let lhs = input.try_parse::<Expr>()?;
        let rhs = if input.peek_kind() == Some(TokenKind::Assign) {
            input.try_parse::<Assign>()?;
            Some(input.try_parse::<Expr>()?)
        } else {
            None
        };

        let end = rhs.as_ref().map_or(lhs.span().end, |rhs| rhs.span().end);
        Ok(Self {
            span: lhs.span().start..end,
            lhs,
            rhs,
        })
    }
}

impl fmt::Display for Equation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.rhs {
            Some(rhs) => write!(f, "{} = {}", self.lhs, rhs),
            None => write!(f, "{}", self.lhs),
        }
    }
}
