use crate::parser::{
    ast::expr::Expr,
    error::{kind, Error},
    token::{CloseParen, OpenParen},
    Parse,
    Parser,
};
use std::{fmt, ops::Range};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A parenthesized expression, such as `(a + b)`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Paren {
    /// The inner expression.
    pub expr: Box<Expr>,

    /// The region of the source code that this expression was parsed from, including the
    /// parentheses.
    pub span: Range<usize>,
}

impl Paren {
    /// Returns the innermost expression of nested parentheses, such as `x` in `((x))`.
    pub fn innermost(&self) -> &Expr {
        let mut inner = &*self.expr;
        while let Expr::Paren(paren) = inner {
            inner = &paren.expr;
        }
        inner
    }
}

impl Parse for Paren {
    fn parse(input: &mut Parser) -> Result<Self, Error> {
        let open = input.try_parse::<OpenParen>()?;
        let expr = input.try_parse::<Expr>()?;
        let close = input.try_parse::<CloseParen>()
            .map_err(|_| Error::new_fatal(vec![open.span.clone()], kind::UnclosedParen))?;

        Ok(Self {
            expr: Box::new(expr),
            span: open.span.start..close.span.end,
        })
    }
}

impl fmt::Display for Paren {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({})", self.expr)
    }
}
