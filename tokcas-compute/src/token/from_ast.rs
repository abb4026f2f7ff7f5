//! Conversion from the syntax tree of `tokcas-parser` into token sides.

use crate::{ctxt::Ctxt, error::Error, simplify::organize::organize, token::{Op, Token}};
use tokcas_attrs::ErrorKind;
use tokcas_error::{Error as SpanError, ErrorKind};
use tokcas_parser::parser::{
    ast::{equation::Equation, expr::Expr, literal::Literal},
    token::op::{BinOpKind, UnaryOpKind},
    Parser,
};

/// The expression does not fit in an equation side.
#[derive(Debug, Clone, ErrorKind, PartialEq)]
#[error(
    message = "expression too large",
    labels = ["this expression"],
    help = format!("the limit is {} tokens per side", limit),
)]
pub struct ExpressionTooLarge {
    /// The capacity of a side.
    pub limit: usize,
}

/// Appends the tokens of `expr` to `out`, placing its operators at `level` and its operands one
/// level deeper. The result is fully parenthesized; [`organize`] removes the excess.
fn build(cx: &mut Ctxt, expr: &Expr, level: i32, out: &mut Vec<Token>) -> Result<(), Error> {
    cx.check_len(out.len() + 1)?;
    match expr {
        Expr::Literal(Literal::Number(num)) => out.push(Token::constant(level, num.value)),
        Expr::Literal(Literal::Symbol(sym)) => {
            let var = if sym.name == "sign" {
                cx.next_sign(&[&out[..]])
            } else {
                cx.vars.intern(&sym.name)
            };
            out.push(Token::variable(level, var));
        },
        Expr::Paren(paren) => build(cx, &paren.expr, level, out)?,
        Expr::Unary(unary) => match unary.op.kind {
            UnaryOpKind::Neg => {
                if let Expr::Literal(Literal::Number(num)) = &*unary.operand {
                    out.push(Token::constant(level, -num.value));
                } else {
                    out.push(Token::constant(level + 1, -1.0));
                    out.push(Token::operator(level, Op::Times));
                    build(cx, &unary.operand, level + 1, out)?;
                }
            },
            UnaryOpKind::Factorial => {
                build(cx, &unary.operand, level + 1, out)?;
                out.push(Token::operator(level, Op::Factorial));
                out.push(Token::constant(level + 1, 1.0));
            },
        },
        Expr::Binary(binary) => {
            let op = match binary.op.kind {
                BinOpKind::Exp => Op::Power,
                BinOpKind::Mul => Op::Times,
                BinOpKind::Div => Op::Divide,
                BinOpKind::Mod => Op::Modulus,
                BinOpKind::IntDiv => Op::IDivide,
                BinOpKind::Add => Op::Plus,
                BinOpKind::Sub => Op::Minus,
            };
            build(cx, &binary.lhs, level + 1, out)?;
            out.push(Token::operator(level, op));
            build(cx, &binary.rhs, level + 1, out)?;
        },
    }
    Ok(())
}

/// Converts a syntax tree into an organized side.
pub fn side_from_ast(cx: &mut Ctxt, expr: &Expr) -> Result<Vec<Token>, Error> {
    let mut side = Vec::new();
    build(cx, expr, 1, &mut side)?;
    organize(&mut side)?;
    Ok(side)
}

/// Converts a span-less engine error from conversion into a span error covering `span`.
fn to_span_error(cx: &Ctxt, err: Error, span: std::ops::Range<usize>) -> SpanError {
    log::debug!("conversion failed: {}", err);
    SpanError::new_fatal(vec![span], ExpressionTooLarge { limit: cx.n_tokens() })
}

/// Parses an expression into an organized side.
pub fn parse_side(cx: &mut Ctxt, source: &str) -> Result<Vec<Token>, SpanError> {
    let mut parser = Parser::new(source).right_associative_power(cx.config.right_associative_power);
    let expr = parser.try_parse_full::<Expr>()?;
    side_from_ast(cx, &expr).map_err(|err| to_span_error(cx, err, expr.span()))
}

/// Parses an equation or expression into its two sides. The right-hand side is empty if the source
/// has no `=`.
pub fn parse_equation(cx: &mut Ctxt, source: &str) -> Result<(Vec<Token>, Vec<Token>), SpanError> {
    let mut parser = Parser::new(source).right_associative_power(cx.config.right_associative_power);
    let Equation { lhs, rhs, .. } = parser.try_parse_full::<Equation>()?;
    let lhs_side = side_from_ast(cx, &lhs).map_err(|err| to_span_error(cx, err, lhs.span()))?;
    let rhs_side = match rhs {
        Some(rhs) => side_from_ast(cx, &rhs).map_err(|err| to_span_error(cx, err, rhs.span()))?,
        None => Vec::new(),
    };
    Ok((lhs_side, rhs_side))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use crate::token::{fmt::display, Var};
    use super::*;

    #[test]
    fn precedence_becomes_levels() {
        let mut cx = Ctxt::default();
        let side = parse_side(&mut cx, "1 + 2*x^3").unwrap();
        let levels = side.iter().map(|t| t.level).collect::<Vec<_>>();
        assert_eq!(levels, vec![1, 1, 2, 2, 3, 3, 3]);
        assert_eq!(display(&cx, &side), "1 + 2*x^3");
    }

    #[test]
    fn negation_is_multiplication() {
        let mut cx = Ctxt::default();
        let side = parse_side(&mut cx, "-x").unwrap();
        assert_eq!(display(&cx, &side), "-1*x");
        let side = parse_side(&mut cx, "-2").unwrap();
        assert_eq!(side, vec![Token::constant(1, -2.0)]);
    }

    #[test]
    fn factorial_has_dummy_operand() {
        let mut cx = Ctxt::default();
        let side = parse_side(&mut cx, "n!").unwrap();
        assert_eq!(side.len(), 3);
        assert!(side[1].is_op(Op::Factorial));
        assert_eq!(display(&cx, &side), "n!");
    }

    #[test]
    fn bare_sign_variables_are_distinct() {
        let mut cx = Ctxt::default();
        let side = parse_side(&mut cx, "sign*sign").unwrap();
        assert_ne!(side[0].as_var(), side[2].as_var());
        assert!(side[0].as_var().map_or(false, |v: Var| v.is_sign()));
    }

    #[test]
    fn equations_have_two_sides() {
        let mut cx = Ctxt::default();
        let (lhs, rhs) = parse_equation(&mut cx, "y = x + 1").unwrap();
        assert_eq!(lhs.len(), 1);
        assert_eq!(rhs.len(), 3);
        let (_, rhs) = parse_equation(&mut cx, "x + 1").unwrap();
        assert!(rhs.is_empty());
    }

    #[test]
    fn capacity_is_enforced() {
        let mut cx = Ctxt::with_capacity(100);
        let src = vec!["x"; 60].join(" + ");
        let err = parse_side(&mut cx, &src).unwrap_err();
        assert!(err.fatal);
    }
}
