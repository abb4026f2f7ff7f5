use crate::{
    parser::{error::{kind, Error}, Parse, Parser},
    tokenizer::TokenKind,
};
use std::{fmt, ops::Range};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A number literal, such as `2` or `0.5`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LitNum {
    /// The value of the number.
    pub value: f64,

    /// The region of the source code that this literal was parsed from.
    pub span: Range<usize>,
}

impl fmt::Display for LitNum {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

/// A symbol literal, naming a variable or a reserved constant such as `pi`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LitSym {
    /// The name of the symbol.
    pub name: String,

    /// The region of the source code that this literal was parsed from.
    pub span: Range<usize>,
}

impl fmt::Display for LitSym {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Represents a literal value in an expression.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Literal {
    Number(LitNum),
    Symbol(LitSym),
}

impl Literal {
    /// Returns the span of the literal.
    pub fn span(&self) -> Range<usize> {
        match self {
            Literal::Number(num) => num.span.clone(),
            Literal::Symbol(sym) => sym.span.clone(),
        }
    }
}

impl Parse for Literal {
    fn parse(input: &mut Parser) -> Result<Self, Error> {
        let token = input.next_token()?;
        match token.kind {
            TokenKind::Int | TokenKind::Float => {
                let value = token.lexeme.parse::<f64>()
                    .ok()
                    .filter(|value| value.is_finite())
                    .ok_or_else(|| Error::new_fatal(vec![token.span.clone()], kind::InvalidNumber {
                        lexeme: token.lexeme.to_string(),
                    }))?;
                Ok(Literal::Number(LitNum { value, span: token.span }))
            },
            TokenKind::Name => Ok(Literal::Symbol(LitSym {
                name: token.lexeme.to_string(),
                span: token.span,
            })),
            _ => Err(Error::new(vec![token.span], kind::UnexpectedToken {
                expected: &[TokenKind::Int, TokenKind::Float, TokenKind::Name],
                found: token.kind,
            })),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Literal::Number(num) => num.fmt(f),
            Literal::Symbol(sym) => sym.fmt(f),
        }
    }
}
