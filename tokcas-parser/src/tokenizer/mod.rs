pub mod token;

use logos::{Lexer, Logos};
pub use token::{Token, TokenKind};

/// Returns an iterator over the token kinds produced by the tokenizer.
pub fn tokenize(input: &str) -> Lexer<TokenKind> {
    TokenKind::lexer(input)
}

/// Returns an owned array containing all of the tokens produced by the tokenizer. This allows us
/// to backtrack in case of an error.
///
/// Input the lexer cannot classify at all becomes a [`TokenKind::Symbol`] token, so the parser
/// can point at it.
pub fn tokenize_complete(input: &str) -> Box<[Token]> {
    let mut lexer = tokenize(input);
    let mut tokens = Vec::new();

    while let Some(result) = lexer.next() {
        tokens.push(Token {
            span: lexer.span(),
            kind: result.unwrap_or(TokenKind::Symbol),
            lexeme: lexer.slice(),
        });
    }

    tokens.into_boxed_slice()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Compares the tokens produced by the tokenizer to the raw expected tokens.
    fn compare_tokens<'source, const N: usize>(input: &'source str, expected: [(TokenKind, &'source str); N]) {
        let mut lexer = tokenize(input);

        for (expected_kind, expected_lexeme) in expected.into_iter() {
            assert_eq!(lexer.next(), Some(Ok(expected_kind)));
            assert_eq!(lexer.slice(), expected_lexeme);
        }

        assert_eq!(lexer.next(), None);
    }

    #[test]
    fn polynomial() {
        compare_tokens(
            "x^2 - 1",
            [
                (TokenKind::Name, "x"),
                (TokenKind::Exp, "^"),
                (TokenKind::Int, "2"),
                (TokenKind::Whitespace, " "),
                (TokenKind::Sub, "-"),
                (TokenKind::Whitespace, " "),
                (TokenKind::Int, "1"),
            ],
        );
    }

    #[test]
    fn operators() {
        compare_tokens(
            "a//b%c**2!",
            [
                (TokenKind::Name, "a"),
                (TokenKind::IntDiv, "//"),
                (TokenKind::Name, "b"),
                (TokenKind::Mod, "%"),
                (TokenKind::Name, "c"),
                (TokenKind::Exp, "**"),
                (TokenKind::Int, "2"),
                (TokenKind::Factorial, "!"),
            ],
        );
    }

    #[test]
    fn equation_with_floats() {
        compare_tokens(
            "y_2 = 3.5x + .25",
            [
                (TokenKind::Name, "y_2"),
                (TokenKind::Whitespace, " "),
                (TokenKind::Assign, "="),
                (TokenKind::Whitespace, " "),
                (TokenKind::Float, "3.5"),
                (TokenKind::Name, "x"),
                (TokenKind::Whitespace, " "),
                (TokenKind::Add, "+"),
                (TokenKind::Whitespace, " "),
                (TokenKind::Float, ".25"),
            ],
        );
    }

    #[test]
    fn unknown_symbol() {
        let tokens = tokenize_complete("2 $ 3");
        assert_eq!(tokens[2].kind, TokenKind::Symbol);
        assert_eq!(tokens[2].lexeme, "$");
    }
}
