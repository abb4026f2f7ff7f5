//! Integration of polynomials, one additive term at a time.

use std::ops::Range;
use crate::{
    ctxt::Ctxt,
    error::Error,
    simplify::{factorv, simp_loop, simpa_side},
    token::{side::{min_level, subst_var_with_exp}, Op, Token, Var},
    unfactor::uf_simp,
};

/// Raises every `v` in the side to a power, `v` becoming `v^1`, except where `v` is itself in an
/// exponent.
pub fn make_powers(cx: &Ctxt, side: &mut Vec<Token>, v: Var) -> Result<(), Error> {
    let mut i = 0;
    while i < side.len() {
        let level = side[i].level;
        if side[i].is_op(Op::Power) {
            i += 2;
            while i < side.len() && side[i].level >= level {
                i += 2;
            }
            continue;
        }
        if side[i].is_var_eq(v) && side.get(i + 1).map_or(true, |t| !t.is_op(Op::Power)) {
            cx.check_len(side.len() + 2)?;
            side[i].level = level + 1;
            side.splice(i + 1..i + 1, [Token::operator(level + 1, Op::Power), Token::constant(level + 1, 1.0)]);
            i += 2;
        }
        i += 1;
    }
    Ok(())
}

/// Calls `f` on every term added at level 1, after [`make_powers`]. Each call may rewrite its
/// term in place, as long as it adds no level 1 operators.
///
/// Returns false as soon as `f` does.
pub fn int_dispatch<F>(cx: &mut Ctxt, side: &mut Vec<Token>, v: Var, mut f: F) -> Result<bool, Error>
where
    F: FnMut(&mut Ctxt, &mut Vec<Token>, Range<usize>, Var) -> Result<bool, Error>,
{
    make_powers(cx, side, v)?;
    let mut start = 0;
    loop {
        let mut end = start + 1;
        while end < side.len() && !(side[end].level == 1 && side[end].op().map_or(false, Op::is_additive)) {
            end += 2;
        }
        if !f(cx, side, start..end.min(side.len()), v)? {
            return Ok(false);
        }

        // the term has changed length, so look for the next one from its start
        let mut i = start + 1;
        while i < side.len() && side[i].level != 1 {
            i += 2;
        }
        if i >= side.len() {
            return Ok(true);
        }
        start = i + 1;
    }
}

/// Returns true if the term is `c*v^k` with `c` free of `v` and `v` appearing once, with
/// multiplication and division only.
fn is_polynomial_term(side: &[Token], term: Range<usize>, v: Var) -> bool {
    let level = min_level(&side[term.clone()]);
    let mut count = 0;
    for i in term.clone().step_by(2) {
        if !side[i].is_var_eq(v) {
            continue;
        }
        count += 1;
        if count > 1 {
            return false;
        }

        let vlevel = side[i].level;
        if vlevel != level && vlevel != level + 1 {
            return false;
        }
        let simple_ops = (term.start + 1..term.end).step_by(2).all(|k| {
            side[k].level != level
                || matches!(side[k].op(), Some(Op::Times | Op::Divide))
                || (side[k].is_op(Op::Power) && k == i + 1)
        });
        if !simple_ops {
            return false;
        }
        if vlevel == level + 1 && !(i + 1 < term.end && side[i + 1].level == vlevel && side[i + 1].is_op(Op::Power)) {
            return false;
        }
    }
    true
}

/// Integrates the polynomial term `side[term]` with respect to `v`: `c*v^k` becomes
/// `c*v^(k + 1)/(k + 1)`, and a term without `v` is multiplied by `v`.
///
/// Returns false if the term is not a polynomial term in `v`, or is `c/v`.
pub fn integrate_term(cx: &mut Ctxt, side: &mut Vec<Token>, term: Range<usize>, v: Var) -> Result<bool, Error> {
    if !is_polynomial_term(side, term.clone(), v) {
        return Ok(false);
    }
    let mlevel = min_level(&side[term.clone()]) + 1;
    let Range { start: loc, end: mut eloc } = term;

    let Some(i) = (loc..eloc).step_by(2).find(|&i| side[i].is_var_eq(v)) else {
        cx.check_len(side.len() + 2)?;
        for t in &mut side[loc..eloc] {
            t.level += 2;
        }
        side.splice(eloc..eloc, [Token::operator(mlevel, Op::Times), Token::variable(mlevel, v)]);
        return Ok(true);
    };
    if !side.get(i + 1).map_or(false, |t| t.is_op(Op::Power)) {
        return Ok(false);
    }
    let divided = i > loc && side[i - 1].is_op(Op::Divide);
    let exponent = i + 2;
    if divided && side[exponent].level == side[i + 1].level && side[exponent].is_constant_eq(1.0) {
        log::debug!("can't integrate 1/{}", cx.vars.name(v));
        return Ok(false);
    }

    for t in &mut side[loc..eloc] {
        t.level += 2;
    }
    let plevel = side[i + 1].level;
    let exponent_end = |side: &[Token], eloc: usize| {
        let mut j = exponent;
        while j < eloc && side[j].level >= plevel {
            j += 1;
        }
        j
    };

    // c/v^k becomes c*v^(-1*k)
    if divided {
        cx.check_len(side.len() + 2)?;
        let j = exponent_end(side, eloc);
        for t in &mut side[exponent..j] {
            t.level += 1;
        }
        side[i - 1].set_op(Op::Times);
        side.splice(exponent..exponent, [Token::constant(plevel + 1, -1.0), Token::operator(plevel + 1, Op::Times)]);
        eloc += 2;
    }

    // v^k becomes v^(k + 1)
    let j = exponent_end(side, eloc);
    for t in &mut side[exponent..j] {
        t.level += 1;
    }
    cx.check_len(side.len() + (j - exponent) + 5)?;
    side.splice(j..j, [Token::operator(plevel + 1, Op::Plus), Token::constant(plevel + 1, 1.0)]);
    eloc += 2;
    let new_exponent = side[exponent..j + 2].to_vec();

    // and the term is divided by k + 1
    let mut divisor = vec![Token::operator(mlevel, Op::Divide)];
    divisor.extend(new_exponent);
    side.splice(eloc..eloc, divisor);
    Ok(true)
}

/// Integrates `side` with respect to `v`, `order` times, and simplifies the result. No constant of
/// integration is added.
///
/// Returns `None` if the side is not a polynomial in `v`.
pub fn integrate(cx: &mut Ctxt, side: &[Token], v: Var, order: u32) -> Result<Option<Vec<Token>>, Error> {
    let mut result = side.to_vec();
    cx.scoped(|c| c.partial = false, |cx| uf_simp(cx, &mut result))?;
    factorv(cx, &mut result, v)?;
    for _ in 0..order {
        if !int_dispatch(cx, &mut result, v, integrate_term)? {
            log::debug!("integration failed, not a polynomial");
            return Ok(None);
        }
        simp_loop(cx, &mut result)?;
    }
    simpa_side(cx, &mut result, false, false)?;
    Ok(Some(result))
}

/// Integrates `side` with respect to `v` from `lower` to `upper`.
///
/// Returns `None` if the side is not a polynomial in `v`.
pub fn integrate_definite(
    cx: &mut Ctxt,
    side: &[Token],
    v: Var,
    lower: &[Token],
    upper: &[Token],
) -> Result<Option<Vec<Token>>, Error> {
    let mut antiderivative = side.to_vec();
    cx.scoped(|c| c.partial = false, |cx| uf_simp(cx, &mut antiderivative))?;
    factorv(cx, &mut antiderivative, v)?;
    if !int_dispatch(cx, &mut antiderivative, v, integrate_term)? {
        return Ok(None);
    }
    simp_loop(cx, &mut antiderivative)?;

    let mut at_lower = antiderivative.clone();
    subst_var_with_exp(cx, &mut at_lower, lower, v)?;
    let mut result = antiderivative;
    subst_var_with_exp(cx, &mut result, upper, v)?;

    cx.check_len(result.len() + 1 + at_lower.len())?;
    for t in result.iter_mut().chain(at_lower.iter_mut()) {
        t.level += 1;
    }
    result.push(Token::operator(1, Op::Minus));
    result.extend(at_lower);
    simpa_side(cx, &mut result, false, false)?;
    Ok(Some(result))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use crate::{
        calculus::differentiate,
        compare::se_compare,
        token::{fmt::display, from_ast::parse_side, side::is_well_formed},
    };
    use super::*;

    #[test]
    fn powers_are_made_explicit() {
        let mut cx = Ctxt::default();
        let mut side = parse_side(&mut cx, "x + y^x").unwrap();
        let x = cx.vars.intern("x");
        let before = side.len();
        make_powers(&cx, &mut side, x).unwrap();
        assert!(is_well_formed(&side));

        // the exponent of y is left alone
        assert_eq!(side.len(), before + 2);
        assert_eq!(display(&cx, &side), "x^1 + y^x");
    }

    #[test]
    fn single_power() {
        let mut cx = Ctxt::default();
        let side = parse_side(&mut cx, "x^2").unwrap();
        let x = cx.vars.intern("x");
        let result = integrate(&mut cx, &side, x, 1).unwrap().unwrap();
        assert_eq!(display(&cx, &result), "x^3/3");
    }

    #[test]
    fn constant_term() {
        let mut cx = Ctxt::default();
        let side = parse_side(&mut cx, "5").unwrap();
        let x = cx.vars.intern("x");
        let result = integrate(&mut cx, &side, x, 1).unwrap().unwrap();
        assert_eq!(display(&cx, &result), "5*x");
    }

    #[test]
    fn derivative_of_integral() {
        for src in ["3*x^2 + 2*x + 1", "a*x^3 - x/b", "(x + 1)^2"] {
            let mut cx = Ctxt::default();
            let mut original = parse_side(&mut cx, src).unwrap();
            let x = cx.vars.intern("x");
            let mut result = integrate(&mut cx, &original, x, 1).unwrap().unwrap();
            assert!(is_well_formed(&result), "{}: {:?}", src, result);

            assert!(differentiate(&mut cx, &mut result, x).unwrap());
            simpa_side(&mut cx, &mut result, false, false).unwrap();
            simpa_side(&mut cx, &mut original, false, false).unwrap();
            assert!(
                se_compare(&cx, &result, &original).is_match(),
                "{}: got {}",
                src,
                display(&cx, &result),
            );
        }
    }

    #[test]
    fn non_polynomials_fail() {
        for src in ["1/x", "x^x", "2^x", "x%3"] {
            let mut cx = Ctxt::default();
            let side = parse_side(&mut cx, src).unwrap();
            let x = cx.vars.intern("x");
            assert_eq!(integrate(&mut cx, &side, x, 1).unwrap(), None, "{}", src);
        }
    }

    #[test]
    fn negative_powers() {
        let mut cx = Ctxt::default();
        let side = parse_side(&mut cx, "1/x^2").unwrap();
        let x = cx.vars.intern("x");
        let result = integrate(&mut cx, &side, x, 1).unwrap().unwrap();
        assert!(is_well_formed(&result));
        assert!(result.iter().any(|t| t.is_var_eq(x)));
    }

    #[test]
    fn repeated_integration() {
        let mut cx = Ctxt::default();
        let side = parse_side(&mut cx, "6").unwrap();
        let x = cx.vars.intern("x");
        let result = integrate(&mut cx, &side, x, 2).unwrap().unwrap();
        assert_eq!(display(&cx, &result), "3*x^2");
    }

    #[test]
    fn definite_integral() {
        let mut cx = Ctxt::default();
        let side = parse_side(&mut cx, "2*x").unwrap();
        let lower = parse_side(&mut cx, "0").unwrap();
        let upper = parse_side(&mut cx, "3").unwrap();
        let x = cx.vars.intern("x");
        let result = integrate_definite(&mut cx, &side, x, &lower, &upper).unwrap().unwrap();
        assert_eq!(display(&cx, &result), "9");
    }
}
