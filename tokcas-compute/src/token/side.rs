//! Queries and edits on expression sides.
//!
//! A side is a `Vec<Token>` of odd length. Read-only queries take any slice of tokens, so they work
//! on a whole side or on one operand inside it. Edits that grow a side check the capacity of the
//! [`Ctxt`] first and fail with [`Error::TooLarge`] instead of growing past it.

use crate::{ctxt::Ctxt, error::Error, token::{Op, Token, TokenKind, Var, VarTable}, warning::Warning};
use std::ops::Range;

/// Returns the base (minimum) parenthesization level of an expression.
pub fn min_level(p: &[Token]) -> i32 {
    match p.len() {
        0 => 1,
        1 => p[0].level,
        3 => p[1].level,
        _ => p.iter().skip(1).step_by(2).map(|t| t.level).min().unwrap_or(1),
    }
}

/// Returns the index one past the operand that contains `loc` and lives at or below `level`.
///
/// This is the first index after `loc` whose level is less than `level`, or the length of `p`.
pub fn operand_end(p: &[Token], loc: usize, level: i32) -> usize {
    let mut i = loc;
    while i < p.len() && p[i].level >= level {
        i += 1;
    }
    i
}

/// Returns the index of the first token of the operand that contains `loc` and lives at or below
/// `level`.
pub fn operand_start(p: &[Token], loc: usize, level: i32) -> usize {
    let mut i = loc;
    while i > 0 && p[i - 1].level >= level {
        i -= 1;
    }
    i
}

/// Returns the number of `+` and `-` operators at exactly `level`.
pub fn level_plus_count(p: &[Token], level: i32) -> usize {
    p.iter()
        .skip(1)
        .step_by(2)
        .filter(|t| t.level == level && t.op().map_or(false, Op::is_additive))
        .count()
}

/// Returns the number of `+` and `-` operators at the base level of the expression.
pub fn level1_plus_count(p: &[Token]) -> usize {
    level_plus_count(p, min_level(p))
}

/// Returns the number of variable tokens.
pub fn var_count(p: &[Token]) -> usize {
    p.iter().filter(|t| t.is_var()).count()
}

/// Returns the number of times `var` occurs.
pub fn found_var(p: &[Token], var: Var) -> usize {
    p.iter().filter(|t| t.is_var_eq(var)).count()
}

/// Returns true if the expression contains no symbolic variables.
///
/// If `*vp` is `None` on entry, it is set to the only symbolic variable of the expression, or left
/// `None` if there are zero or several. If `*vp` is `Some` on entry, this only checks that the
/// expression has no variables at all.
pub fn no_vars(p: &[Token], vp: &mut Option<Var>) -> bool {
    if vp.is_some() {
        return var_count(p) == 0;
    }

    let mut found = false;
    for var in p.iter().filter_map(Token::as_var) {
        if !var.is_symbolic() {
            continue;
        }
        match *vp {
            Some(v) if v != var => {
                *vp = None;
                break;
            },
            Some(_) => {},
            None => {
                found = true;
                *vp = Some(var);
            },
        }
    }
    !found
}

/// Returns true if the expression contains an infinite or NaN constant.
pub fn exp_contains_infinity(p: &[Token]) -> bool {
    p.iter().any(|t| t.as_constant().map_or(false, |d| !d.is_finite()))
}

/// Returns true if the expression contains a NaN constant.
pub fn exp_contains_nan(p: &[Token]) -> bool {
    p.iter().any(|t| t.as_constant().map_or(false, f64::is_nan))
}

/// Returns true if the expression is numeric. `e`, `pi`, `i`, and sign variables count as numbers.
pub fn exp_is_numeric(p: &[Token]) -> bool {
    !p.iter().filter_map(Token::as_var).any(|v| v.is_symbolic())
}

/// Returns true if the expression contains an absolute value, which looks like `(x^k1)^k2` with
/// constant `k1` and non-integer constant `k2`.
pub fn exp_is_absolute(p: &[Token]) -> bool {
    if p.len() < 5 {
        return false;
    }
    let mut i = p.len() - 2;
    while i > 2 {
        if p[i].is_op(Op::Power) {
            let level = p[i].level;
            let outer = p[i + 1];
            if outer.level == level && outer.as_constant().map_or(false, |d| d % 1.0 != 0.0) {
                let inner = level + 1;
                if p[i - 2].is_op(Op::Power)
                    && p[i - 2].level == inner
                    && p[i - 1].level == inner
                    && p[i - 1].is_constant()
                {
                    return true;
                }
            }
        }
        i -= 2;
    }
    false
}

/// Returns true if the expression certainly evaluates to an integer: no division, integral
/// constants, and only integer or sign variables.
pub fn is_integer_expr(vars: &VarTable, p: &[Token]) -> bool {
    p.iter().all(|t| match t.kind {
        TokenKind::Operator(op) => op != Op::Divide,
        TokenKind::Constant(d) => d % 1.0 == 0.0,
        TokenKind::Variable(v) => vars.is_integer(v) || v.is_sign(),
    })
}

/// Raises the levels of the operator at `i` and both of its operands by one, so that the operator
/// binds tighter than its neighbors on the same level.
pub fn binary_parenthesize(p: &mut [Token], i: usize) {
    let level = p[i].level;
    p[i].level += 1;

    let left = p[i - 1].level;
    p[i - 1].level += 1;
    if left > level {
        for t in p[..i - 1].iter_mut().rev() {
            if t.level <= level {
                break;
            }
            t.level += 1;
        }
    }

    let right = p[i + 1].level;
    p[i + 1].level += 1;
    if right > level {
        for t in p[i + 2..].iter_mut() {
            if t.level <= level {
                break;
            }
            t.level += 1;
        }
    }
}

/// Raises the level of every token in `range` by `by`.
pub fn raise_levels(p: &mut [Token], range: Range<usize>, by: i32) {
    for t in &mut p[range] {
        t.level += by;
    }
}

/// Inserts `tokens` into `side` at `at`, failing if the result would not fit.
pub fn insert(cx: &Ctxt, side: &mut Vec<Token>, at: usize, tokens: &[Token]) -> Result<(), Error> {
    cx.check_len(side.len() + tokens.len())?;
    side.splice(at..at, tokens.iter().copied());
    Ok(())
}

/// Replaces `range` of `side` with `tokens`, failing if the result would not fit.
pub fn replace(
    cx: &Ctxt,
    side: &mut Vec<Token>,
    range: Range<usize>,
    tokens: &[Token],
) -> Result<(), Error> {
    cx.check_len(side.len() - range.len() + tokens.len())?;
    side.splice(range, tokens.iter().copied());
    Ok(())
}

/// Returns true if the side is a well-formed token array: odd length, operands and operators
/// alternating, positive levels, and every operator sharing its level with its immediate operands
/// or shallower ones.
pub fn is_well_formed(p: &[Token]) -> bool {
    if p.len() % 2 == 0 {
        return false;
    }
    p.iter().enumerate().all(|(i, t)| {
        t.level >= 1 && (t.op().is_some() == (i % 2 == 1))
    }) && p.iter().enumerate().skip(1).step_by(2).all(|(i, t)| {
        p[i - 1].level >= t.level && p[i + 1].level >= t.level
    })
}

/// Replaces every occurrence of `var` in `side` with `expr`, at the level of the replaced token.
///
/// Returns true if anything was substituted. Substituting a non-integer expression for an integer
/// variable is allowed, but noted in the log.
pub fn subst_var_with_exp(
    cx: &mut Ctxt,
    side: &mut Vec<Token>,
    expr: &[Token],
    var: Var,
) -> Result<bool, Error> {
    if expr.is_empty() {
        return Ok(false);
    }

    let mut substituted = false;
    for j in (0..side.len()).rev() {
        if side[j].is_var_eq(var) {
            let level = side[j].level;
            let shifted = expr.iter().map(|t| Token { level: t.level + level, ..*t }).collect::<Vec<_>>();
            replace(cx, side, j..j + 1, &shifted)?;
            substituted = true;
        }
    }
    if substituted && cx.vars.is_integer(var) && !is_integer_expr(&cx.vars, expr) {
        log::info!("substituting integer variable with non-integer expression");
    }
    Ok(substituted)
}

/// Warns through the context if `denominator` is zero, returning true in that case.
pub fn check_divide_by_zero(cx: &mut Ctxt, denominator: f64) -> bool {
    let zero = denominator == 0.0;
    if zero {
        cx.warn(Warning::DivideByZero);
    }
    zero
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use super::*;

    fn k(level: i32, value: f64) -> Token {
        Token::constant(level, value)
    }

    fn op(level: i32, op: Op) -> Token {
        Token::operator(level, op)
    }

    #[test]
    fn min_level_of_sum() {
        // (2 * 3) + 4
        let p = [k(2, 2.0), op(2, Op::Times), k(2, 3.0), op(1, Op::Plus), k(1, 4.0)];
        assert_eq!(min_level(&p), 1);
        assert_eq!(min_level(&p[..3]), 2);
        assert_eq!(level1_plus_count(&p), 1);
        assert_eq!(operand_end(&p, 0, 2), 3);
        assert_eq!(operand_start(&p, 2, 2), 0);
    }

    #[test]
    fn parenthesize_operator() {
        // 1 + 2 * 3 -> 1 + (2 * 3)
        let mut p = vec![k(1, 1.0), op(1, Op::Plus), k(1, 2.0), op(1, Op::Times), k(1, 3.0)];
        binary_parenthesize(&mut p, 3);
        let levels = p.iter().map(|t| t.level).collect::<Vec<_>>();
        assert_eq!(levels, vec![1, 1, 2, 2, 2]);
        assert!(is_well_formed(&p));
    }

    #[test]
    fn single_variable_detection() {
        let x = Var { base: crate::token::VarBase::Named(0), subscript: 0 };
        let y = Var { base: crate::token::VarBase::Named(1), subscript: 0 };
        let p = [Token::variable(1, x), op(1, Op::Plus), Token::variable(1, Var::PI)];
        let mut vp = None;
        assert!(!no_vars(&p, &mut vp));
        assert_eq!(vp, Some(x));

        let q = [Token::variable(1, x), op(1, Op::Plus), Token::variable(1, y)];
        let mut vp = None;
        no_vars(&q, &mut vp);
        assert_eq!(vp, None);
        assert!(exp_is_numeric(&[Token::variable(1, Var::IMAGINARY)]));
    }

    #[test]
    fn absolute_value_shape() {
        // (x^2)^0.5
        let x = Token::variable(2, Var { base: crate::token::VarBase::Named(0), subscript: 0 });
        let p = [x, op(2, Op::Power), k(2, 2.0), op(1, Op::Power), k(1, 0.5)];
        assert!(exp_is_absolute(&p));
    }

    #[test]
    fn insert_respects_capacity() {
        let cx = Ctxt::with_capacity(100);
        let mut side = vec![k(1, 1.0); 99];
        assert_eq!(insert(&cx, &mut side, 0, &[k(1, 1.0), op(1, Op::Plus)]), Err(Error::TooLarge));
        assert_eq!(side.len(), 99);
    }
}
