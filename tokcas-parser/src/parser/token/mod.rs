pub mod op;

use crate::tokenizer::TokenKind;
use super::{error::{kind, Error}, Parse, Parser};
use std::ops::Range;

/// Generates a parseable struct for a token that carries no value of its own, such as a
/// parenthesis.
macro_rules! token_kinds {
    ($($kind:ident)*) => {
        $(
            #[derive(Debug, Clone, PartialEq)]
            pub struct $kind {
                /// The region of the source code that this token was parsed from.
                pub span: Range<usize>,
            }

            impl Parse for $kind {
                fn parse(input: &mut Parser) -> Result<Self, Error> {
                    let token = input.next_token()?;

                    if token.kind == TokenKind::$kind {
                        Ok(Self { span: token.span })
                    } else {
                        Err(Error::new(vec![token.span], kind::UnexpectedToken {
                            expected: &[TokenKind::$kind],
                            found: token.kind,
                        }))
                    }
                }
            }
        )*
    };
}

token_kinds!(OpenParen CloseParen Assign);
