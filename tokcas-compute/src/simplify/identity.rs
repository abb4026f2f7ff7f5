//! Context-free algebraic identities: `x+0`, `1*x`, `x^1`, sign variables, and nested powers.
//!
//! Every pass in this module scans a side once, rewrites what it can in place, and returns whether
//! it changed anything. The orchestrator calls them in loops until they stop firing.

use crate::{
    consts::{always_positive, EPSILON},
    ctxt::Ctxt,
    error::Error,
    factor::integer::factor_one,
    numeric::fraction_parts,
    token::{
        side::{binary_parenthesize, check_divide_by_zero, is_integer_expr, operand_end, operand_start},
        Op,
        Token,
        Var,
    },
};

fn is_constant_at(side: &[Token], i: usize, level: i32) -> Option<f64> {
    let t = side.get(i)?;
    if t.level == level {
        t.as_constant()
    } else {
        None
    }
}

/// Returns the index of the first operator after `i` whose level is below `limit`, or the length
/// of the side.
fn run_end(side: &[Token], i: usize, limit: i32) -> usize {
    let mut j = i + 2;
    while j < side.len() && side[j].level >= limit {
        j += 2;
    }
    j
}

fn flip_additive(side: &mut [Token], i: usize) {
    if let Some(op) = side[i].op() {
        side[i].set_op(op.inverse());
    }
}

/// Applies the identities that need no context:
///
/// - `x + 0 -> x`, `0 + x -> x`, `x - 0 -> x`, `0 - x -> -1*x`
/// - `x + -k -> x - k`
/// - `0*x -> 0`, `0/x -> 0`, `0%x -> 0`, `1*x -> x`
/// - `x/k -> x*(1/k)`, `x/sign -> x*sign`
/// - `integer % (1/n) -> 0`
/// - `x^0 -> 1`, `x^1 -> x`, `1^x -> 1`
/// - a sum containing a single infinity is that infinity
///
/// Constants in a product are moved to the front.
pub fn elim_k(cx: &mut Ctxt, side: &mut Vec<Token>) -> Result<bool, Error> {
    let mut modified = false;
    let mut i = 1;
    while i < side.len() {
        let Some(op) = side[i].op() else {
            i += 1;
            continue;
        };
        let level = side[i].level;

        if op.is_additive() {
            let mut p2 = i + 1;
            // x + -2*y -> x - 2*y
            if i + 2 < side.len()
                && side[i + 2].level == level + 1
                && side[i + 2].op().map_or(false, Op::is_multiplicative)
                && side[p2].as_constant().map_or(false, |d| d < 0.0)
            {
                flip_additive(side, i);
                let d = side[p2].as_constant().unwrap_or_default();
                side[p2].set_constant(-d);
            }
            if let Some(d) = is_constant_at(side, p2, level) {
                if d < 0.0 {
                    flip_additive(side, i);
                    side[p2].set_constant(-d);
                }
                if d == 0.0 {
                    side.drain(i..i + 2);
                    modified = true;
                    continue;
                }
            }

            if is_constant_at(side, i - 1, level).map_or(false, f64::is_infinite) {
                p2 = i - 1;
            }
            if is_constant_at(side, p2, level).map_or(false, f64::is_infinite) {
                let start = operand_start(side, i, level);
                let end = operand_end(side, i, level);
                let other_infinity = (start..end)
                    .filter(|&k| k != p2)
                    .any(|k| side[k].as_constant().map_or(false, |d| !d.is_finite()));
                if !other_infinity {
                    let mut infinity = side[p2];
                    if p2 > start && side[p2 - 1].is_op(Op::Minus) {
                        infinity.set_constant(-infinity.as_constant().unwrap_or_default());
                    }
                    side.splice(start..end, [infinity]);
                    return Ok(true);
                }
            }
        }

        match side[i].op().unwrap_or(op) {
            Op::Plus => {
                if is_constant_at(side, i - 1, level) == Some(0.0) {
                    side.drain(i - 1..=i);
                    modified = true;
                    continue;
                }
            },
            Op::Minus => {
                if is_constant_at(side, i - 1, level) == Some(0.0)
                    && (i == 1 || side[i - 2].level < level)
                {
                    side[i - 1].set_constant(-1.0);
                    side[i].set_op(Op::Times);
                    binary_parenthesize(side, i);
                    modified = true;
                    continue;
                }
            },
            Op::Times => {
                if let Some(d) = is_constant_at(side, i - 1, level) {
                    if d == 0.0 {
                        let end = run_end(side, i, level);
                        side.drain(i..end);
                        modified = true;
                        continue;
                    }
                    if (d - 1.0).abs() <= EPSILON {
                        side.drain(i - 1..=i);
                        modified = true;
                        continue;
                    }
                }
                if let Some(d) = is_constant_at(side, i + 1, level) {
                    // move the constant to the front of the product
                    let start = operand_start(side, i - 1, level);
                    if is_constant_at(side, start, level).is_none() {
                        side.drain(i..=i + 1);
                        side.splice(start..start, [
                            Token::constant(level, d),
                            Token::operator(level, Op::Times),
                        ]);
                        i = if start > 0 { start - 1 } else { 1 };
                        continue;
                    }
                }
            },
            Op::Divide => {
                if is_constant_at(side, i - 1, level) == Some(0.0) {
                    let end = run_end(side, i, level);
                    side.drain(i..end);
                    modified = true;
                    continue;
                }
                if let Some(d) = is_constant_at(side, i + 1, level) {
                    let (numerator, denominator) = fraction_parts(d);
                    check_divide_by_zero(cx, numerator);
                    side[i + 1].set_constant(denominator / numerator);
                    side[i].set_op(Op::Times);
                    continue;
                }
                if side[i + 1].level == level && side[i + 1].as_var().map_or(false, |v| v.is_sign()) {
                    side[i].set_op(Op::Times);
                    continue;
                }
            },
            Op::Modulus | Op::IDivide => {
                if is_constant_at(side, i - 1, level) == Some(0.0) {
                    let end = run_end(side, i, level);
                    side.drain(i..end);
                    modified = true;
                    continue;
                }
                if op == Op::Modulus {
                    if let Some(d) = is_constant_at(side, i + 1, level).map(f64::abs) {
                        if d > EPSILON && (1.0 / d) % 1.0 == 0.0 {
                            let start = operand_start(side, i - 1, level);
                            if is_integer_expr(&cx.vars, &side[start..i]) {
                                side.drain(start..=i);
                                side[start].set_constant(0.0);
                                i = if start > 0 { start - 1 } else { 1 };
                                modified = true;
                                continue;
                            }
                        }
                    }
                }
            },
            Op::Power => {
                if is_constant_at(side, i - 1, level) == Some(1.0) {
                    let end = run_end(side, i, level + 1);
                    side.drain(i..end);
                    modified = true;
                    continue;
                }
                if let Some(d) = is_constant_at(side, i + 1, level) {
                    if d == 0.0 {
                        let start = operand_start(side, i - 1, level + 1);
                        side.drain(start..=i);
                        side[start].set_constant(1.0);
                        i = start + 1;
                        modified = true;
                        continue;
                    }
                    if (d - 1.0).abs() <= EPSILON {
                        side.drain(i..=i + 1);
                        modified = true;
                        continue;
                    }
                }
            },
            _ => {},
        }
        i += 2;
    }
    Ok(modified)
}

/// Removes sign ambiguity that does not matter:
///
/// - sign variables and negative constants under an even power become `1` and positive constants
/// - `i^(2*k) -> (-1)^k`
/// - `i^1 -> i*1`, `i^3 -> i*-1`, counting powers modulo 4
/// - odd roots of sign variables drop their root
pub fn elim_sign(cx: &mut Ctxt, side: &mut Vec<Token>) -> Result<bool, Error> {
    let mut modified = false;
    let mut i = 1;
    while i < side.len() {
        let level = side[i].level;
        let Some(op) = side[i].op() else {
            return Err(Error::Bug("operator expected while eliminating signs"));
        };
        let exponent = side[i + 1];
        let (Some(c), Op::Power) = (exponent.as_constant(), op) else {
            i += 2;
            continue;
        };
        if exponent.level != level && exponent.level != level + 1 {
            i += 2;
            continue;
        }
        if exponent.level == level + 1 {
            // the exponent must be `c*integer`
            if i + 3 >= side.len() || !side[i + 2].is_op(Op::Times) {
                i += 2;
                continue;
            }
            let mut k = i + 2;
            while k < side.len() && side[k].level > level {
                k += 2;
            }
            if k <= i + 2 || !is_integer_expr(&cx.vars, &side[i + 3..k]) {
                i += 2;
                continue;
            }
        }

        let (numerator, denominator) = fraction_parts(c);
        if always_positive(numerator) {
            if side[i - 1].level == level && side[i - 1].is_var_eq(Var::IMAGINARY) {
                side[i - 1] = Token::constant(level, -1.0);
                side[i + 1].set_constant(c / 2.0);
                modified = true;
                i += 2;
                continue;
            }

            let base_op = side[..i]
                .iter()
                .rev()
                .take_while(|t| t.level >= level)
                .find(|t| t.level <= level + 1 && t.op().is_some())
                .and_then(Token::op);
            if matches!(base_op, None | Some(Op::Times | Op::Divide)) {
                for j in (0..i).rev() {
                    let t = &mut side[j];
                    if t.level < level {
                        break;
                    }
                    if t.level > level + 1 {
                        continue;
                    }
                    if t.as_var().map_or(false, |v| v.is_sign()) {
                        *t = Token::constant(t.level, 1.0);
                        modified = true;
                    } else if let Some(d) = t.as_constant().filter(|&d| d < 0.0) {
                        t.set_constant(-d);
                        modified = true;
                    }
                }
            }
        } else if side[i - 1].level == level {
            if let Some(v) = side[i - 1].as_var() {
                if v == Var::IMAGINARY && exponent.level == level {
                    let d = c % 4.0;
                    if d == 1.0 || d == 3.0 {
                        side[i].set_op(Op::Times);
                        side[i + 1].set_constant(if d == 1.0 { 1.0 } else { -1.0 });
                        modified = true;
                    }
                } else if v.is_sign() && denominator % 2.0 == 1.0 {
                    let numerator = numerator % 2.0;
                    if numerator != c {
                        side[i + 1].set_constant(numerator);
                        modified = true;
                    }
                }
            }
        }
        i += 2;
    }
    Ok(modified)
}

/// Merges nested powers, `(x^a)^b -> x^(a*b)`.
///
/// Unless the symbolic flag is set, merges that would change the real domain are skipped: an
/// outer exponent with an even denominator (such as `^(1/2)`), or a non-constant outer exponent,
/// is only merged when the inner exponent is a constant with an odd numerator, or when the base
/// is a non-negative constant.
pub fn simp_pp(cx: &Ctxt, side: &mut [Token]) -> bool {
    let mut modified = false;
    let mut i = 1;
    while i < side.len() {
        if !side[i].is_op(Op::Power) {
            i += 2;
            continue;
        }
        let ilevel = side[i].level;
        let mut merged = false;
        let mut j = i + 2;
        while j < side.len() {
            let jlevel = side[j].level;
            if jlevel == ilevel - 1 && side[j].is_op(Op::Power) {
                let base_is_nonnegative_constant = side[i - 1].level == ilevel
                    && side[i - 1].as_constant().map_or(false, |d| d >= 0.0);
                if !cx.config.symbolic && !base_is_nonnegative_constant {
                    // (x^2)^(1/2) is |x|, but (x^3)^(1/2) is x^(3/2)
                    let inner_odd_numerator = i + 2 == j
                        && side[i + 1]
                            .as_constant()
                            .map_or(false, |d| fraction_parts(d).0 % 2.0 != 0.0);
                    let outer = side[j + 1].as_constant().filter(|_| side[j + 1].level == jlevel);
                    let unsafe_merge = match outer {
                        Some(d) => fraction_parts(d).1 % 2.0 == 0.0 && !inner_odd_numerator,
                        None => !inner_odd_numerator,
                    };
                    if unsafe_merge {
                        break;
                    }
                }

                side[j].set_op(Op::Times);
                let mut k = j;
                while k < side.len() && side[k].level >= jlevel {
                    side[k].level += 2;
                    k += 1;
                }
                for t in &mut side[i + 1..j] {
                    t.level += 1;
                }
                modified = true;
                merged = true;
                break;
            }
            if jlevel <= ilevel {
                break;
            }
            j += 2;
        }
        if !merged {
            i += 2;
        }
    }
    modified
}

/// Takes integer factors out of roots of integers, `12^(1/2) -> 2*3^(1/2)`.
pub fn integer_root_simp(cx: &mut Ctxt, side: &mut Vec<Token>) -> Result<bool, Error> {
    let mut modified = false;
    let mut i = 1;
    while i + 3 < side.len() {
        if !side[i].is_op(Op::Power) {
            i += 2;
            continue;
        }
        let level = side[i].level;
        let shape = side[i - 1].level == level
            && side[i + 1].level == level + 1
            && side[i + 2].level == level + 1
            && side[i + 3].level == level + 1
            && side[i + 2].is_op(Op::Divide);
        let (Some(base), Some(numerator), Some(denominator)) = (
            side[i - 1].as_constant(),
            side[i + 1].as_constant(),
            side[i + 3].as_constant(),
        ) else {
            i += 2;
            continue;
        };
        if !shape
            || (i + 4 < side.len() && side[i + 4].level >= level)
            || !(1.0..=50.0).contains(&numerator)
            || numerator % 1.0 != 0.0
            || !(2.0..=50.0).contains(&denominator)
            || denominator % 1.0 != 0.0
        {
            i += 2;
            continue;
        }

        let d2 = base.powf(numerator);
        if !d2.is_finite() {
            i += 2;
            continue;
        }
        let Some(mut factors) = factor_one(d2)? else {
            i += 2;
            continue;
        };
        let mut d1 = 1.0;
        for (prime, count) in factors.iter_mut() {
            if *prime > 0.0 {
                while *count >= denominator {
                    d1 *= *prime;
                    *count -= denominator;
                }
            }
        }
        if d1 == 1.0 {
            i += 2;
            continue;
        }

        cx.check_len(side.len() + 2)?;
        side[i + 1].set_constant(1.0);
        side[i - 1].set_constant(factors.multiply_out());
        for t in &mut side[i - 1..i + 4] {
            t.level += 1;
        }
        side.splice(i - 1..i - 1, [Token::constant(level, d1), Token::operator(level, Op::Times)]);
        modified = true;
        i += 6;
    }
    Ok(modified)
}

/// Moves a constant factor of an exponent into the base, `k^(c*x) -> (k^c)^x`.
pub fn simp_constant_power(cx: &mut Ctxt, side: &mut Vec<Token>) -> Result<bool, Error> {
    let mut modified = false;
    let mut i = 1;
    while i < side.len() {
        if !side[i].is_op(Op::Power) {
            i += 2;
            continue;
        }
        let level = side[i].level;
        let base = is_constant_at(side, i - 1, level);
        let exponent = is_constant_at(side, i + 1, level + 1);
        let j = i + 2;
        let applicable = match (base, exponent) {
            (Some(b), Some(e)) => {
                (b >= 0.0 || cx.config.symbolic) && e != 1.0 && j < side.len() && side[j].level == level + 1
            },
            _ => false,
        };
        if !applicable {
            i += 2;
            continue;
        }

        match side[j].op() {
            Some(Op::Times) => {},
            Some(Op::Divide) => {
                cx.check_len(side.len() + 2)?;
                side.splice(j + 1..j + 1, [
                    Token::constant(level + 1, 1.0),
                    Token::operator(level + 1, Op::Divide),
                ]);
            },
            _ => {
                i += 2;
                continue;
            },
        }
        side[j].level = level;
        side[j].set_op(Op::Power);
        side[i - 1].level += 1;
        side[i].level += 1;
        modified = true;
        i += 2;
    }
    Ok(modified)
}

/// Rewrites negative exponents as division, `x^-y -> 1/x^y`.
pub fn simp2_power(cx: &mut Ctxt, side: &mut Vec<Token>) -> Result<bool, Error> {
    let mut modified = false;
    let mut i = 1;
    while i < side.len() {
        if !side[i].is_op(Op::Power) {
            i += 2;
            continue;
        }
        let level = side[i].level;
        let mut op = None;
        let mut negative = None;
        let mut j = i + 1;
        while j < side.len() && side[j].level >= level {
            if side[j].level == level + 1 {
                if let Some(o) = side[j].op() {
                    op = Some(o);
                } else if side[j].as_constant().map_or(false, |d| d < 0.0) {
                    negative = Some(j);
                }
            }
            j += 1;
        }
        if j - i <= 2 && side[i + 1].as_constant().map_or(false, |d| d < 0.0) {
            negative = Some(i + 1);
        }
        let Some(k) = negative else {
            i += 2;
            continue;
        };
        if matches!(op, None | Some(Op::Times | Op::Divide)) {
            cx.check_len(side.len() + 2)?;
            let d = side[k].as_constant().unwrap_or_default();
            side[k].set_constant(-d);
            let start = operand_start(side, i - 1, level);
            for t in &mut side[start..j] {
                t.level += 1;
            }
            side.splice(start..start, [
                Token::constant(level, 1.0),
                Token::operator(level, Op::Divide),
            ]);
            modified = true;
            i += 2;
        }
        i += 2;
    }
    Ok(modified)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use crate::{
        simplify::organize::organize,
        token::{fmt::display, from_ast::parse_side, side::is_well_formed},
    };
    use super::*;

    fn run(
        src: &str,
        pass: impl Fn(&mut Ctxt, &mut Vec<Token>) -> Result<bool, Error>,
    ) -> (bool, String) {
        let mut cx = Ctxt::default();
        let mut side = parse_side(&mut cx, src).unwrap();
        let changed = pass(&mut cx, &mut side).unwrap();
        assert!(is_well_formed(&side), "{:?}", side);
        organize(&mut side).unwrap();
        (changed, display(&cx, &side))
    }

    fn elim_k_all(cx: &mut Ctxt, side: &mut Vec<Token>) -> Result<bool, Error> {
        let mut changed = false;
        while elim_k(cx, side)? {
            organize(side)?;
            changed = true;
        }
        Ok(changed)
    }

    #[test]
    fn additive_identities() {
        assert_eq!(run("x + 0", elim_k_all), (true, "x".to_string()));
        assert_eq!(run("0 + x", elim_k_all), (true, "x".to_string()));
        assert_eq!(run("x - 0", elim_k_all), (true, "x".to_string()));
        assert_eq!(run("0 - x", elim_k_all), (true, "-1*x".to_string()));
        assert_eq!(run("x + -3", elim_k).1, "x - 3");
        assert_eq!(run("x + -2*y", elim_k).1, "x - 2*y");
    }

    #[test]
    fn multiplicative_identities() {
        assert_eq!(run("0*x*y", elim_k_all).1, "0");
        assert_eq!(run("1*x", elim_k_all).1, "x");
        assert_eq!(run("x*3", elim_k).1, "3*x");
        assert_eq!(run("x/4", elim_k).1, "0.25*x");
        assert_eq!(run("0/x", elim_k_all).1, "0");
    }

    #[test]
    fn power_identities() {
        assert_eq!(run("x^0", elim_k_all).1, "1");
        assert_eq!(run("x^1", elim_k_all).1, "x");
        assert_eq!(run("1^x", elim_k_all).1, "1");
    }

    #[test]
    fn single_infinity_absorbs_sum() {
        let mut cx = Ctxt::default();
        let mut side = parse_side(&mut cx, "x - y").unwrap();
        side[2] = Token::constant(1, f64::INFINITY);
        assert!(elim_k(&mut cx, &mut side).unwrap());
        assert_eq!(side, vec![Token::constant(1, f64::NEG_INFINITY)]);
    }

    #[test]
    fn integer_modulus_of_unit_fraction() {
        assert_eq!(run("integer_n % 1", elim_k_all).1, "0");
        assert_eq!(run("x % 1", elim_k_all).1, "x%1");
    }

    #[test]
    fn even_powers_drop_signs() {
        assert_eq!(run("(sign*x)^2", elim_sign), (true, "(1*x)^2".to_string()));
        assert_eq!(run("(-3)^2", elim_sign).1, "3^2");
        assert_eq!(run("i^2", elim_sign).1, "(-1)^1");
        assert_eq!(run("i^3", elim_sign).1, "i*-1");
        assert_eq!(run("sign^3", elim_sign).1, "sign^1");
    }

    #[test]
    fn nested_powers() {
        let simp_pp_pass = |cx: &mut Ctxt, side: &mut Vec<Token>| Ok(simp_pp(cx, side));
        assert_eq!(run("(x^2)^3", simp_pp_pass), (true, "x^(2*3)".to_string()));
        assert_eq!(run("(x^3)^0.5", simp_pp_pass), (true, "x^(3*0.5)".to_string()));
        assert_eq!(run("(x^y)^z", simp_pp_pass).0, false);
        assert_eq!(run("(4^y)^z", simp_pp_pass).0, true);
    }

    #[test]
    fn even_inner_powers_keep_their_root() {
        let simp_pp_pass = |cx: &mut Ctxt, side: &mut Vec<Token>| Ok(simp_pp(cx, side));
        assert_eq!(run("(x^2)^0.5", simp_pp_pass), (false, "(x^2)^0.5".to_string()));
        assert_eq!(run("(x^2)^y", simp_pp_pass), (false, "(x^2)^y".to_string()));
        assert_eq!(run("(x^3)^y", simp_pp_pass).0, true);
        assert_eq!(run("(x^y)^0.5", simp_pp_pass).0, false);

        // odd denominators can't change the sign
        assert_eq!(run("(x^2)^3", simp_pp_pass).0, true);
    }

    #[test]
    fn symbolic_mode_merges_everything() {
        let mut cx = Ctxt::default();
        cx.config.symbolic = true;
        let mut side = parse_side(&mut cx, "(x^3)^0.5").unwrap();
        assert!(simp_pp(&cx, &mut side));
    }

    #[test]
    fn integer_roots() {
        assert_eq!(run("12^(1/2)", integer_root_simp), (true, "2*3^(1/2)".to_string()));
        assert_eq!(run("8^(2/3)", integer_root_simp).1, "4*1^(1/3)");
        assert_eq!(run("7^(1/2)", integer_root_simp).0, false);
    }

    #[test]
    fn constant_powers() {
        assert_eq!(run("2^(3*x)", simp_constant_power), (true, "(2^3)^x".to_string()));
        assert_eq!(run("2^(3/x)", simp_constant_power), (true, "(2^3)^(1/x)".to_string()));
    }

    #[test]
    fn negative_exponents() {
        assert_eq!(run("x^-2", simp2_power), (true, "1/x^2".to_string()));
        assert_eq!(run("3*x^(-2*y)", simp2_power), (true, "3*1/x^(2*y)".to_string()));
        assert_eq!(run("x^(y - 2)", simp2_power).0, false);
    }
}
