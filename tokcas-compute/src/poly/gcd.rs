//! The Euclidean algorithm applied to polynomials, and the division simplifier built on it.

use crate::{
    ctxt::Ctxt,
    error::Error,
    simplify::{organize::organize, simp_ssub},
    token::{fmt::display, side::level1_plus_count, Op, Token, Var},
    unfactor::{uf_power, uf_simp},
};
use std::ops::Range;
use super::{div::raised, poly_div};

/// The most divisions the Euclidean algorithm performs before giving up.
const MAX_EUCLID_STEPS: usize = 50;

/// Appends the factor `p[j..i]`, with the operator before it unless it is the first one kept.
fn keep_factor(kept: &mut Vec<Token>, p: &[Token], j: usize, i: usize) {
    let from = if kept.is_empty() { j } else { j - 1 };
    kept.extend_from_slice(&p[from..i]);
}

/// Simplifies `p` and removes its level 1 factors that are not sums, as well as its divisors,
/// leaving a simpler polynomial that is easier to work with.
///
/// Returns true if the result is a sum. If this returns false, `p` should be discarded.
fn remove_factors(cx: &mut Ctxt, p: &mut Vec<Token>) -> Result<bool, Error> {
    loop {
        simp_ssub(cx, p, None, 1.0, false, true, 4)?;
        if !uf_power(cx, p)? {
            break;
        }
    }

    let mut kept = Vec::new();
    let mut plus = false;
    let mut divided = false;
    let mut j = 0;
    let mut i = 1;
    while i < p.len() {
        let op = p[i].op();
        match p[i].level {
            1 => match op {
                Some(Op::Plus | Op::Minus) => plus = true,
                Some(op @ (Op::Times | Op::Divide)) => {
                    if plus && !divided {
                        keep_factor(&mut kept, p, j, i);
                    }
                    plus = false;
                    divided = op == Op::Divide;
                    j = i + 1;
                },
                _ => return Ok(false),
            },
            2 if op.map_or(false, Op::is_additive) => plus = true,
            _ => {},
        }
        i += 2;
    }
    if plus && !divided {
        keep_factor(&mut kept, p, j, p.len());
    }
    if kept.is_empty() {
        return Ok(false);
    }
    organize(&mut kept)?;
    *p = kept;
    Ok(true)
}

/// The outcome of the Euclidean algorithm.
enum Euclid {
    /// The last divisor divides exactly. `quotient` is the dividend of the last division over the
    /// GCD, which is `larger/gcd` after one step.
    Found {
        steps: usize,
        gcd: Vec<Token>,
        quotient: Vec<Token>,
    },

    /// Nothing found, but swapping the operands might work.
    Retry,

    /// Nothing found, and swapping the operands won't help.
    Failed,
}

fn do_gcd(cx: &mut Ctxt, larger: Vec<Token>, smaller: Vec<Token>, v: &mut Option<Var>) -> Result<Euclid, Error> {
    let mut dividend = larger;
    let mut divisor = smaller;
    for steps in 1..MAX_EUCLID_STEPS {
        let Some(d) = poly_div(cx, &dividend, &divisor, v)? else {
            return Ok(if steps == 1 { Euclid::Retry } else { Euclid::Failed });
        };
        if d.is_exact() {
            log::trace!("raw polynomial gcd: {}", display(cx, &divisor));
            return Ok(Euclid::Found { steps, gcd: divisor, quotient: d.quotient });
        }
        if divisor.len() > cx.n_tokens() || d.remainder.len() > cx.divisor_size() {
            return Ok(Euclid::Retry);
        }
        dividend = std::mem::replace(&mut divisor, d.remainder);
    }
    Ok(Euclid::Retry)
}

/// Computes the simplified polynomial GCD of `larger` and `smaller`, for factoring.
///
/// Trivial factors are removed from `smaller` before starting. If `v` is `None`, the best base
/// variable is chosen. Returns `(larger/gcd, gcd)`, both expanded and simplified.
pub fn poly_gcd(
    cx: &mut Ctxt,
    larger: &[Token],
    smaller: &[Token],
    v: Option<Var>,
) -> Result<Option<(Vec<Token>, Vec<Token>)>, Error> {
    log::trace!("polynomial gcd of {} and {}", display(cx, larger), display(cx, smaller));
    if larger.len() > cx.n_tokens() || smaller.len() > cx.divisor_size().min(cx.n_tokens()) {
        return Ok(None);
    }
    let mut divisor = smaller.to_vec();
    if !remove_factors(cx, &mut divisor)? || divisor.len() > cx.divisor_size() {
        return Ok(None);
    }

    let mut v = v;
    let Euclid::Found { steps, mut gcd, quotient } = do_gcd(cx, larger.to_vec(), divisor, &mut v)? else {
        return Ok(None);
    };
    let mut quotient = if steps > 1 {
        if !remove_factors(cx, &mut gcd)? || gcd.len() > cx.divisor_size() {
            return Ok(None);
        }
        match poly_div(cx, larger, &gcd, &mut v)? {
            Some(d) if d.is_exact() => d.quotient,
            _ => {
                log::debug!("polynomial gcd found, but dividing the larger polynomial by it failed");
                return Ok(None);
            },
        }
    } else {
        quotient
    };
    uf_simp(cx, &mut quotient)?;
    uf_simp(cx, &mut gcd)?;
    Ok(Some((quotient, gcd)))
}

/// The outcome of [`poly2_gcd`].
#[derive(Debug, Clone, PartialEq)]
pub enum GcdSearch {
    /// Both operands divided by their GCD.
    Found {
        larger: Vec<Token>,
        smaller: Vec<Token>,
    },

    /// Nothing found, but swapping the operands might work.
    Retry,

    /// Nothing found, and swapping the operands won't help.
    Failed,
}

/// Computes the polynomial GCD of `larger` and `smaller`, for the division simplifiers, and
/// returns both divided by it.
///
/// With `require_additive`, both operands and the GCD must contain addition or subtraction.
pub fn poly2_gcd(
    cx: &mut Ctxt,
    larger: &[Token],
    smaller: &[Token],
    v: Option<Var>,
    require_additive: bool,
) -> Result<GcdSearch, Error> {
    let has_additive = |p: &[Token]| p.iter().skip(1).step_by(2).any(|t| t.op().map_or(false, Op::is_additive));
    if require_additive && !(has_additive(larger) && has_additive(smaller)) {
        return Ok(GcdSearch::Retry);
    }
    if larger.len() > cx.n_tokens() || smaller.len() > cx.divisor_size().min(cx.n_tokens()) {
        return Ok(GcdSearch::Retry);
    }
    log::trace!("polynomial gcd of {} and {}", display(cx, larger), display(cx, smaller));

    let mut v = v;
    let (steps, gcd, quotient) = match do_gcd(cx, larger.to_vec(), smaller.to_vec(), &mut v)? {
        Euclid::Found { steps, gcd, quotient } => (steps, gcd, quotient),
        Euclid::Retry => return Ok(GcdSearch::Retry),
        Euclid::Failed => return Ok(GcdSearch::Failed),
    };
    if steps == 1 {
        return Ok(GcdSearch::Found { larger: quotient, smaller: vec![Token::constant(1, 1.0)] });
    }
    if require_additive && level1_plus_count(&gcd) == 0 {
        return Ok(GcdSearch::Retry);
    }

    let smaller = match poly_div(cx, smaller, &gcd, &mut v)? {
        Some(d) if d.is_exact() && d.quotient.len() <= cx.divisor_size() => d.quotient,
        _ => {
            log::debug!("polynomial gcd found, but dividing the smaller polynomial by it failed");
            return Ok(GcdSearch::Retry);
        },
    };
    let larger = match poly_div(cx, larger, &gcd, &mut v)? {
        Some(d) if d.is_exact() => d.quotient,
        _ => {
            log::debug!("polynomial gcd found, but dividing the larger polynomial by it failed");
            return Ok(GcdSearch::Retry);
        },
    };
    Ok(GcdSearch::Found { larger, smaller })
}

/// Divides `a` and `b` by their polynomial GCD, trying each as the larger operand. Returns
/// `(a/gcd, b/gcd)`.
pub(crate) fn cancel_gcd(cx: &mut Ctxt, a: &[Token], b: &[Token]) -> Result<Option<(Vec<Token>, Vec<Token>)>, Error> {
    match poly2_gcd(cx, a, b, None, true)? {
        GcdSearch::Found { larger, smaller } => Ok(Some((larger, smaller))),
        GcdSearch::Failed => Ok(None),
        GcdSearch::Retry => match poly2_gcd(cx, b, a, None, true)? {
            GcdSearch::Found { larger, smaller } => Ok(Some((smaller, larger))),
            _ => Ok(None),
        },
    }
}

/// Replaces the two operands of a side with new tokens based at level 1, the later one first so
/// the earlier range stays valid.
pub(crate) fn replace_pair(
    cx: &Ctxt,
    side: &mut Vec<Token>,
    level: i32,
    (first, first_with): (Range<usize>, Vec<Token>),
    (second, second_with): (Range<usize>, Vec<Token>),
) -> Result<(), Error> {
    let grown = first_with.len() + second_with.len();
    cx.check_len((side.len() + grown).saturating_sub(first.len() + second.len()))?;
    let mut parts = [(first, first_with), (second, second_with)];
    parts.sort_by_key(|(range, _)| std::cmp::Reverse(range.start));
    for (range, tokens) in parts {
        side.splice(range, raised(&tokens, level).collect::<Vec<_>>());
    }
    Ok(())
}

/// Cancels the polynomial GCD out of every fraction: `(x^2 - 1)/(x + 1)` becomes `(x - 1)/1`.
///
/// Returns true if the side was modified.
pub fn poly_gcd_simp(cx: &mut Ctxt, side: &mut Vec<Token>) -> Result<bool, Error> {
    polydiv_recurse(cx, side, 0, 1)
}

fn operand_end(side: &[Token], start: usize, level: i32) -> usize {
    let mut k = start + 1;
    while k < side.len() && side[k].level > level {
        k += 2;
    }
    k.min(side.len())
}

fn polydiv_recurse(cx: &mut Ctxt, side: &mut Vec<Token>, loc: usize, level: i32) -> Result<bool, Error> {
    let mut modified = false;
    let mut i = loc;
    while i < side.len() && side[i].level >= level {
        if side[i].level > level {
            modified |= polydiv_recurse(cx, side, i, level + 1)?;
            i += 1;
            while i < side.len() && side[i].level > level {
                i += 2;
            }
            continue;
        }
        i += 1;
    }

    'start: loop {
        let mut i = loc + 1;
        while i < side.len() && side[i].level >= level {
            if side[i].op().is_none() {
                return Err(Error::Bug("operand where an operator was expected while cancelling polynomial GCDs"));
            }
            if !(side[i].level == level && side[i].is_op(Op::Divide)) {
                i += 2;
                continue;
            }
            let divisor = i + 1..operand_end(side, i + 1, level);

            let mut last_op2 = None;
            let mut j = loc;
            while j < side.len() && side[j].level >= level {
                if side[j].level == level && side[j].op().is_some() {
                    last_op2 = side[j].op();
                    j += 1;
                    continue;
                }
                match last_op2 {
                    Some(Op::Divide) => {
                        j += 1;
                        continue;
                    },
                    None | Some(Op::Times) => {},
                    Some(_) => return Err(Error::Bug("expression is corrupt while cancelling polynomial GCDs")),
                }
                last_op2 = Some(Op::Divide);
                let factor = j..operand_end(side, j, level);

                if let Some((den, num)) = cancel_gcd(cx, &side[divisor.clone()], &side[factor.clone()])? {
                    replace_pair(cx, side, level, (factor, num), (divisor, den))?;
                    log::debug!("division simplified with polynomial gcd");
                    modified = true;
                    continue 'start;
                }
                j += 1;
            }
            i += 2;
        }
        return Ok(modified);
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use crate::{
        simplify::simpa_side,
        token::{from_ast::parse_side, side::is_well_formed},
    };
    use super::*;

    fn simplified(cx: &mut Ctxt, mut p: Vec<Token>) -> String {
        simpa_side(cx, &mut p, false, false).unwrap();
        display(cx, &p)
    }

    #[test]
    fn gcd_of_polynomials() {
        let mut cx = Ctxt::default();
        let larger = parse_side(&mut cx, "x^2 - 1").unwrap();
        let smaller = parse_side(&mut cx, "x^2 + 2*x + 1").unwrap();
        let (quotient, gcd) = poly_gcd(&mut cx, &larger, &smaller, None).unwrap().unwrap();
        assert_eq!(simplified(&mut cx, gcd), "x + 1");
        assert_eq!(simplified(&mut cx, quotient), "x - 1");
    }

    #[test]
    fn gcd_divides_both() {
        let mut cx = Ctxt::default();
        let a = parse_side(&mut cx, "x^3 - x").unwrap();
        let b = parse_side(&mut cx, "x^2 + x").unwrap();
        let GcdSearch::Found { larger, smaller } = poly2_gcd(&mut cx, &a, &b, None, true).unwrap() else {
            panic!("no gcd found");
        };
        assert_eq!(simplified(&mut cx, larger), "x - 1");
        assert_eq!(simplified(&mut cx, smaller), "1");
    }

    #[test]
    fn coprime_polynomials() {
        let mut cx = Ctxt::default();
        let a = parse_side(&mut cx, "x^2 + 1").unwrap();
        let b = parse_side(&mut cx, "x + 1").unwrap();
        assert!(!matches!(poly2_gcd(&mut cx, &a, &b, None, true).unwrap(), GcdSearch::Found { .. }));
    }

    #[test]
    fn gcd_needs_sums() {
        let mut cx = Ctxt::default();
        let a = parse_side(&mut cx, "x^2").unwrap();
        let b = parse_side(&mut cx, "x + 1").unwrap();
        assert_eq!(poly2_gcd(&mut cx, &a, &b, None, true).unwrap(), GcdSearch::Retry);
    }

    #[test]
    fn fractions_are_reduced() {
        let mut cx = Ctxt::default();
        let mut side = parse_side(&mut cx, "(x^2 - 1)/(x^2 + 2*x + 1)").unwrap();
        assert!(poly_gcd_simp(&mut cx, &mut side).unwrap());
        assert!(is_well_formed(&side));
        assert!(!simplified(&mut cx, side).contains('^'));
    }

    #[test]
    fn trivial_factors_are_removed() {
        let mut cx = Ctxt::default();
        let mut p = parse_side(&mut cx, "2*x*(x + 1)").unwrap();
        assert!(remove_factors(&mut cx, &mut p).unwrap());
        assert_eq!(display(&cx, &p), "x + 1");

        let mut p = parse_side(&mut cx, "x*y").unwrap();
        assert!(!remove_factors(&mut cx, &mut p).unwrap());
    }
}
