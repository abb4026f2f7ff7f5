//! Laplace transforms of polynomials, one additive term at a time.
//!
//! The transformed side keeps the same variable: `t^k` becomes `k!/t^(k + 1)`, to be read in the
//! frequency variable. The inverse maps `c/s^k` back to `c*s^(k - 1)/(k - 1)!`.

use std::ops::Range;
use crate::{
    ctxt::Ctxt,
    error::Error,
    poly::poly_in_v,
    simplify::{factorv, simp_loop},
    token::{side::min_level, Op, Token, Var},
    unfactor::uf_simp,
};
use super::int_dispatch;

/// Returns the end of the exponent starting at `start`, whose power operator is at `plevel`.
fn exponent_end(side: &[Token], start: usize, end: usize, plevel: i32) -> usize {
    let mut j = start;
    while j < end && side[j].level >= plevel {
        j += 1;
    }
    j
}

/// The tokens of `(k)!`, for an exponent `k` already raised above `level`.
fn factorial_of(op: Op, level: i32, exponent: &[Token]) -> Vec<Token> {
    let mut out = Vec::with_capacity(exponent.len() + 3);
    out.push(Token::operator(level, op));
    out.extend_from_slice(exponent);
    out.push(Token::operator(level + 1, Op::Factorial));
    out.push(Token::constant(level + 1, 1.0));
    out
}

/// Transforms the polynomial term `side[term]`: `c*v^k` becomes `c*v^((k + 1)*-1)*k!`, and a term
/// without `v` is divided by `v`.
///
/// Returns false if `v` is not raised to a power, which [`make_powers`](super::make_powers)
/// guarantees it is.
pub fn laplace_term(cx: &mut Ctxt, side: &mut Vec<Token>, term: Range<usize>, v: Var) -> Result<bool, Error> {
    let mlevel = min_level(&side[term.clone()]) + 1;
    let Range { start: loc, end: eloc } = term;

    let Some(i) = (loc..eloc).step_by(2).find(|&i| side[i].is_var_eq(v)) else {
        cx.check_len(side.len() + 2)?;
        for t in &mut side[loc..eloc] {
            t.level += 2;
        }
        side.splice(eloc..eloc, [Token::operator(mlevel, Op::Divide), Token::variable(mlevel, v)]);
        return Ok(true);
    };
    if i + 1 >= eloc || !side[i + 1].is_op(Op::Power) {
        return Ok(false);
    }
    for t in &mut side[loc..eloc] {
        t.level += 2;
    }

    let plevel = side[i + 1].level;
    let exponent = i + 2;
    let j = exponent_end(side, exponent, eloc, plevel);
    let k = side[exponent..j].to_vec();
    cx.check_len(side.len() + k.len() + 7)?;

    // v^k becomes v^((k + 1)*-1)
    for t in &mut side[exponent..j] {
        t.level += 2;
    }
    let level = plevel + 1;
    side.splice(j..j, [
        Token::operator(level + 1, Op::Plus),
        Token::constant(level + 1, 1.0),
        Token::operator(level, Op::Times),
        Token::constant(level, -1.0),
    ]);

    // and the term is multiplied by k!
    let eloc = eloc + 4;
    let k: Vec<_> = k.into_iter().map(|t| Token { level: t.level + 2, ..t }).collect();
    side.splice(eloc..eloc, factorial_of(Op::Times, mlevel, &k));
    Ok(true)
}

/// Inverse transforms the term `side[term]`: `c/v^k` becomes `c*v^(k - 1)/(k - 1)!`.
///
/// Returns false unless `v` is a divisor raised to a power. Constants have no inverse here.
pub fn inverse_laplace_term(cx: &mut Ctxt, side: &mut Vec<Token>, term: Range<usize>, v: Var) -> Result<bool, Error> {
    let mlevel = min_level(&side[term.clone()]) + 1;
    let Range { start: loc, end: eloc } = term;

    let Some(i) = (loc..eloc).step_by(2).find(|&i| side[i].is_var_eq(v)) else {
        return Ok(false);
    };
    if i + 1 >= eloc || !side[i + 1].is_op(Op::Power) || i == loc || !side[i - 1].is_op(Op::Divide) {
        return Ok(false);
    }
    for t in &mut side[loc..eloc] {
        t.level += 2;
    }

    let plevel = side[i + 1].level;
    let exponent = i + 2;
    let j = exponent_end(side, exponent, eloc, plevel);
    cx.check_len(side.len() + (j - exponent) + 7)?;

    // c/v^k becomes c*v^(k - 1)
    for t in &mut side[exponent..j] {
        t.level += 1;
    }
    side[i - 1].set_op(Op::Times);
    let level = plevel + 1;
    side.splice(j..j, [Token::operator(level, Op::Minus), Token::constant(level, 1.0)]);

    // divided by (k - 1)!
    let k_minus_one = side[exponent..j + 2].to_vec();
    let eloc = eloc + 2;
    side.splice(eloc..eloc, factorial_of(Op::Divide, mlevel, &k_minus_one));
    Ok(true)
}

/// Takes the Laplace transform of `side` with respect to `v`, or the inverse transform if `inverse`
/// is set. The result is only lightly simplified.
///
/// Returns `None` if the side is not a polynomial in `v`. The inverse also accepts negative
/// powers, and fails on any term without `v`.
pub fn laplace(cx: &mut Ctxt, side: &[Token], v: Var, inverse: bool) -> Result<Option<Vec<Token>>, Error> {
    let mut result = side.to_vec();
    cx.scoped(|c| c.partial = false, |cx| uf_simp(cx, &mut result))?;
    factorv(cx, &mut result, v)?;
    if !poly_in_v(&result, v, inverse) {
        log::debug!("Laplace transform failed, not a polynomial");
        return Ok(None);
    }
    let transformed = if inverse {
        int_dispatch(cx, &mut result, v, inverse_laplace_term)?
    } else {
        int_dispatch(cx, &mut result, v, laplace_term)?
    };
    if !transformed {
        log::debug!("Laplace transform failed for a term");
        return Ok(None);
    }
    simp_loop(cx, &mut result)?;
    Ok(Some(result))
}

#[cfg(test)]
mod tests {
    use crate::{
        compare::se_compare,
        simplify::simpa_side,
        token::{fmt::display, from_ast::parse_side, side::is_well_formed},
    };
    use super::*;

    fn transforms_to(src: &str, expected: &str, inverse: bool) -> bool {
        let mut cx = Ctxt::default();
        let side = parse_side(&mut cx, src).unwrap();
        let t = cx.vars.intern("t");
        let mut result = laplace(&mut cx, &side, t, inverse).unwrap().unwrap();
        assert!(is_well_formed(&result), "{}: {:?}", src, result);

        let mut expected = parse_side(&mut cx, expected).unwrap();
        simpa_side(&mut cx, &mut result, false, false).unwrap();
        simpa_side(&mut cx, &mut expected, false, false).unwrap();
        let matched = se_compare(&cx, &result, &expected).is_match();
        if !matched {
            eprintln!("{}: got {}", src, display(&cx, &result));
        }
        matched
    }

    #[test]
    fn powers_transform_with_factorials() {
        assert!(transforms_to("t^2", "2/t^3", false));
        assert!(transforms_to("t", "1/t^2", false));
        assert!(transforms_to("5*t^3", "30/t^4", false));
    }

    #[test]
    fn constants_are_divided() {
        assert!(transforms_to("7", "7/t", false));
        assert!(transforms_to("3*t^2 + 1", "6/t^3 + 1/t", false));
    }

    #[test]
    fn inverse_transform() {
        assert!(transforms_to("2/t^3", "t^2", true));
        assert!(transforms_to("1/t", "1", true));
        assert!(transforms_to("6/t^3 + 1/t", "3*t^2 + 1", true));
    }

    #[test]
    fn inverse_undoes_transform() {
        let mut cx = Ctxt::default();
        let mut original = parse_side(&mut cx, "a*t^3 - 4*t + b").unwrap();
        let t = cx.vars.intern("t");
        let forward = laplace(&mut cx, &original, t, false).unwrap().unwrap();
        let mut back = laplace(&mut cx, &forward, t, true).unwrap().unwrap();
        simpa_side(&mut cx, &mut back, false, false).unwrap();
        simpa_side(&mut cx, &mut original, false, false).unwrap();
        assert!(se_compare(&cx, &back, &original).is_match(), "got {}", display(&cx, &back));
    }

    #[test]
    fn non_polynomials_fail() {
        let mut cx = Ctxt::default();
        let t = cx.vars.intern("t");
        for src in ["2^t", "t^t", "1/t"] {
            let side = parse_side(&mut cx, src).unwrap();
            assert_eq!(laplace(&mut cx, &side, t, false).unwrap(), None, "{}", src);
        }

        // only negative powers have an inverse
        for src in ["t^2", "5"] {
            let side = parse_side(&mut cx, src).unwrap();
            assert_eq!(laplace(&mut cx, &side, t, true).unwrap(), None, "{}", src);
        }
    }
}
