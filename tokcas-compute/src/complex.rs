//! Complex-valued constants.
//!
//! The engine represents a complex number as the expression `re + im*i`. This module evaluates
//! such expressions with [`num_complex`] and folds powers whose base or exponent is complex.

use crate::{
    consts::EPSILON,
    ctxt::Ctxt,
    error::Error,
    simplify::{constant::{calc, get_constant, Fold}, elim_loop},
    token::{side::{exp_is_numeric, found_var}, Op, Token, TokenKind, Var},
};
use num_complex::Complex64;

/// Zeroes a part that is negligible next to the other one. Returns true if it did.
pub fn complex_fixup(c: &mut Complex64) -> bool {
    if (c.re * EPSILON).abs() > c.im.abs() {
        c.im = 0.0;
        true
    } else if (c.im * EPSILON).abs() > c.re.abs() {
        c.re = 0.0;
        true
    } else {
        false
    }
}

/// Raises `a` to the power `b` through the principal logarithm, giving one root of many.
pub fn complex_pow(a: Complex64, b: Complex64) -> Complex64 {
    let mut r = (a.ln() * b).exp();
    complex_fixup(&mut r);
    r
}

/// Evaluates a numeric expression in complex arithmetic.
fn eval_complex(cx: &mut Ctxt, p: &[Token]) -> Option<Complex64> {
    if p.len() == 1 {
        return match p[0].kind {
            TokenKind::Constant(d) => Some(Complex64::new(d, 0.0)),
            TokenKind::Variable(Var::IMAGINARY) => Some(Complex64::i()),
            TokenKind::Variable(v) => v.const_value().map(|d| Complex64::new(d, 0.0)),
            TokenKind::Operator(_) => None,
        };
    }

    let mut level = p.get(1)?.level;
    let mut c1 = eval_complex(cx, &p[..1])?;
    let mut i = 1;
    while i < p.len() {
        let op = p[i].op()?;
        if p[i].level > level {
            return None;
        }
        level = p[i].level;
        let mut j = i + 2;
        while j < p.len() && p[j].level > level {
            j += 2;
        }
        let c2 = eval_complex(cx, p.get(i + 1..j)?)?;
        c1 = match op {
            Op::Plus => c1 + c2,
            Op::Minus => c1 - c2,
            Op::Times => c1 * c2,
            Op::Divide if c2 == Complex64::new(0.0, 0.0) => return None,
            Op::Divide => c1 / c2,
            Op::Power if c1.im == 0.0 && c2.im == 0.0 && c1.re >= 0.0 => {
                let mut d = c1.re;
                if cx.scoped(|config| config.approximate_roots = true, |cx| calc(cx, None, &mut d, op, c2.re)) != Fold::Done {
                    return None;
                }
                Complex64::new(d, 0.0)
            },
            Op::Power => complex_pow(c1, c2),
            _ if c1.im == 0.0 && c2.im == 0.0 => {
                let mut d = c1.re;
                if calc(cx, None, &mut d, op, c2.re) != Fold::Done {
                    return None;
                }
                Complex64::new(d, 0.0)
            },
            _ => return None,
        };
        i = j;
    }
    Some(c1)
}

/// Evaluates a numeric expression that contains the imaginary unit at most once, returning it as a
/// complex number. Works best on approximated expressions.
pub fn parse_complex(cx: &mut Ctxt, p: &[Token]) -> Option<Complex64> {
    if !exp_is_numeric(p) {
        return None;
    }
    if let Some(re) = get_constant(cx, p) {
        return Some(Complex64::new(re, 0.0));
    }
    if found_var(p, Var::IMAGINARY) != 1 {
        return None;
    }
    let mut c = eval_complex(cx, p)?;
    complex_fixup(&mut c);
    c.is_finite().then_some(c)
}

/// Replaces one power with a complex base or exponent by its principal value, `re + im*i`.
/// Returns true if the side changed.
pub fn complex_root_simp(cx: &mut Ctxt, side: &mut Vec<Token>) -> Result<bool, Error> {
    let mut modified = false;
    'start_over: loop {
        let mut i = 1;
        while i < side.len() {
            if !side[i].is_op(Op::Power) {
                i += 2;
                continue;
            }
            let level = side[i].level;
            let mut end = i + 2;
            while end < side.len() && side[end].level >= level {
                end += 2;
            }
            let mut start = i;
            while start > 0 && side[start - 1].level >= level {
                start -= 1;
            }

            let (Some(p), Some(c)) = (
                parse_complex(cx, &side[i + 1..end]),
                parse_complex(cx, &side[start..i]),
            ) else {
                i += 2;
                continue;
            };
            if c.im == 0.0 && p.im == 0.0 {
                i += 2;
                continue;
            }

            let r = complex_pow(c, p);
            let tokens = [
                Token::constant(level, r.re),
                Token::operator(level, Op::Plus),
                Token::constant(level + 1, r.im),
                Token::operator(level + 1, Op::Times),
                Token::variable(level + 1, Var::IMAGINARY),
            ];
            crate::token::side::replace(cx, side, start..end, &tokens)?;
            modified = true;
            continue 'start_over;
        }
        break;
    }
    if modified {
        log::debug!("complex number roots approximated");
    }
    Ok(modified)
}

/// Approximates every power of a complex number in a side. Returns true if anything changed.
pub fn approximate_complex_roots(cx: &mut Ctxt, side: &mut Vec<Token>) -> Result<bool, Error> {
    let mut changed = false;
    loop {
        elim_loop(cx, side)?;
        if !complex_root_simp(cx, side)? {
            break;
        }
        changed = true;
    }
    Ok(changed)
}

#[cfg(test)]
mod tests {
    use assert_float_eq::{
        afe_is_absolute_eq,
        assert_float_absolute_eq,
    };
    use pretty_assertions::assert_eq;
    use crate::token::{from_ast::parse_side, side::is_well_formed};
    use super::*;

    #[test]
    fn principal_square_root_of_minus_one() {
        let r = complex_pow(Complex64::new(-1.0, 0.0), Complex64::new(0.5, 0.0));
        assert_eq!(r.re, 0.0);
        assert_float_absolute_eq!(r.im, 1.0);
    }

    #[test]
    fn parses_rectangular_form() {
        let mut cx = Ctxt::default();
        let side = parse_side(&mut cx, "3 - 2*i").unwrap();
        let c = parse_complex(&mut cx, &side).unwrap();
        assert_float_absolute_eq!(c.re, 3.0);
        assert_float_absolute_eq!(c.im, -2.0);

        let side = parse_side(&mut cx, "i*i").unwrap();
        assert_eq!(parse_complex(&mut cx, &side), None);
        let side = parse_side(&mut cx, "x + i").unwrap();
        assert_eq!(parse_complex(&mut cx, &side), None);
    }

    #[test]
    fn folds_complex_powers() {
        let mut cx = Ctxt::default();
        let mut side = parse_side(&mut cx, "(1 + i)^2").unwrap();
        assert!(complex_root_simp(&mut cx, &mut side).unwrap());
        assert!(is_well_formed(&side));
        let c = parse_complex(&mut cx, &side).unwrap();
        assert_float_absolute_eq!(c.re, 0.0, 1e-12);
        assert_float_absolute_eq!(c.im, 2.0, 1e-12);
    }
}
