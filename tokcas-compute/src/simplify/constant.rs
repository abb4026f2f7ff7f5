//! Constant folding.

use crate::{
    complex::complex_pow,
    config::ModulusMode,
    consts::{always_positive, EPSILON},
    ctxt::Ctxt,
    error::Error,
    numeric::{f_to_fraction, factorial, fixed_fmod},
    token::{side::check_divide_by_zero, Op, Token, TokenKind, Var},
    warning::Warning,
};
use num_complex::Complex64;

/// The outcome of [`calc`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fold {
    /// The result was stored in the first operand.
    Done,

    /// A negative number was raised to a non-integer power. Nothing was stored; the caller decides
    /// whether to produce an imaginary or signed result.
    NegativeBase,

    /// The operation could not be folded without losing information, for example because the
    /// result overflowed or is an irrational surd that should be preserved.
    Unchanged,
}

/// Surfaces a numeric fault in a computed value as a domain error.
fn domain_check(value: f64) -> Result<f64, Error> {
    if value.is_nan() {
        Err(Error::Domain("Floating point domain error.".to_string()))
    } else if value.is_infinite() {
        Err(Error::Domain("Floating point overflow.".to_string()))
    } else {
        Ok(value)
    }
}

/// Floating-point arithmetic on two constants: `k1 op2 k2`, with the result stored in `k1`.
///
/// `op1` is the operator that precedes `k1` in its run, if any. For `+` and `-` the sign of the
/// result is moved into it, and a `/` before `k1` means `k1` is really a divisor.
pub fn calc(cx: &mut Ctxt, op1: Option<&mut Op>, k1: &mut f64, op2: Op, k2: f64) -> Fold {
    let finite = k1.is_finite() && k2.is_finite();
    match op2 {
        Op::Plus | Op::Minus => {
            let mut d = if op1.as_deref() == Some(&Op::Minus) { -*k1 } else { *k1 };
            let tolerance = d.abs() * EPSILON;
            if op2 == Op::Plus {
                d += k2;
            } else {
                d -= k2;
            }
            if d.abs() < tolerance {
                d = 0.0;
            }
            match op1 {
                None => *k1 = d,
                Some(op1) if d >= 0.0 => {
                    *op1 = Op::Plus;
                    *k1 = d;
                },
                Some(op1) => {
                    *op1 = Op::Minus;
                    *k1 = -d;
                },
            }
        },
        Op::Times | Op::Divide => {
            let by_zero = match op1 {
                Some(op1) if *op1 == Op::Divide && op2 == Op::Times => {
                    let by_zero = check_divide_by_zero(cx, *k1);
                    *k1 = k2 / *k1;
                    *op1 = Op::Times;
                    by_zero
                },
                Some(op1) if *op1 == Op::Divide => {
                    *k1 *= k2;
                    false
                },
                _ if op2 == Op::Divide => {
                    let by_zero = check_divide_by_zero(cx, k2);
                    *k1 /= k2;
                    by_zero
                },
                _ => {
                    *k1 *= k2;
                    false
                },
            };
            if by_zero {
                return Fold::Done;
            }
        },
        Op::IDivide => {
            let by_zero = check_divide_by_zero(cx, k2);
            *k1 = (*k1 / k2).trunc();
            if by_zero {
                return Fold::Done;
            }
        },
        Op::Modulus => {
            if k2 == 0.0 {
                cx.warn(Warning::ModuloZero);
            }
            *k1 = fixed_fmod(*k1, k2);
            let mode = cx.config.modulus_mode;
            if mode != ModulusMode::Dividend && *k1 < 0.0 {
                *k1 += k2.abs();
            }
            if mode == ModulusMode::Divisor && k2 < 0.0 && *k1 > 0.0 {
                *k1 += k2;
            }
        },
        Op::Power => {
            if *k1 < 0.0 && k2 % 1.0 != 0.0 {
                return Fold::NegativeBase;
            }
            let d = if *k1 == 0.0 && k2 == 0.0 {
                cx.warn(Warning::ZeroPowerZero);
                1.0
            } else if *k1 == 0.0 && k2 < 0.0 {
                cx.warn(Warning::ZeroToNegativePower);
                f64::INFINITY
            } else {
                let d = k1.powf(k2);
                if cx.config.preserve_surds
                    && !cx.config.approximate_roots
                    && k2.is_finite()
                    && k2 % 1.0 != 0.0
                    && f_to_fraction(*k1).is_some()
                    && f_to_fraction(d).is_none()
                {
                    return Fold::Unchanged;
                }
                // overflowed and underflowed powers are kept as they are
                if finite && (!d.is_finite() || (d == 0.0 && *k1 != 0.0)) {
                    return Fold::Unchanged;
                }
                d
            };
            *k1 = d;
            return Fold::Done;
        },
        Op::Factorial => match factorial(*k1) {
            Some(d) => *k1 = d,
            None => return Fold::Unchanged,
        },
        Op::Negate => return Fold::Unchanged,
    }
    if finite && !k1.is_finite() {
        cx.warn(Warning::InfinityProduced);
    }
    Fold::Done
}

/// Folds pairs of constants that share a level, recursively. Returns true if the side changed.
///
/// With `iflag`, irrational powers of negative numbers are folded into complex constants using
/// the imaginary unit.
pub fn combine_constants(cx: &mut Ctxt, side: &mut Vec<Token>, iflag: bool) -> Result<bool, Error> {
    const_recurse(cx, side, 0, 1, iflag)
}

fn const_recurse(
    cx: &mut Ctxt,
    side: &mut Vec<Token>,
    start: usize,
    level: i32,
    iflag: bool,
) -> Result<bool, Error> {
    let mut loc = start;
    let mut loc1 = start;
    let mut have_constant = false;
    let mut modified = false;

    loop {
        if loc >= side.len() || side[loc].level < level {
            if loc - start == 1 {
                side[start].level = (level - 1).max(1);
            }
            return Ok(modified);
        }
        if side[loc].level > level {
            modified |= const_recurse(cx, side, loc, level + 1, iflag)?;
            while loc < side.len() && side[loc].level > level {
                loc += 1;
            }
            continue;
        }

        if let TokenKind::Constant(d2) = side[loc].kind {
            if !have_constant {
                loc1 = loc;
                have_constant = true;
                loc += 1;
                continue;
            }
            let Some(op) = side[loc - 1].op() else {
                return Err(Error::Bug("operand found where an operator was expected"));
            };
            let Some(mut d1) = side[loc1].as_constant() else {
                return Err(Error::Bug("constant folding lost its first operand"));
            };
            let mut op1 = if loc1 > start { side[loc1 - 1].op() } else { None };

            match calc(cx, op1.as_mut(), &mut d1, op, d2) {
                Fold::Done => {
                    side[loc1].set_constant(d1);
                    if let Some(op1) = op1 {
                        side[loc1 - 1].set_op(op1);
                    }
                    side.drain(loc - 1..=loc);
                    modified = true;
                    loc -= 1;
                    continue;
                },
                Fold::NegativeBase if op == Op::Power => {
                    let replacement = match negative_power(cx, d1, d2, level, iflag)? {
                        Some(tokens) => tokens,
                        None => return Ok(modified),
                    };
                    cx.check_len(side.len() + 2)?;
                    side.splice(loc1..=loc, replacement);
                    return Ok(true);
                },
                _ => {},
            }
        }
        loc += 1;
    }
}

/// Computes the replacement for `d1^d2` where `d1` is negative and `d2` is not an integer, at
/// `level`. Returns `None` if the power should be left alone.
fn negative_power(
    cx: &mut Ctxt,
    d1: f64,
    d2: f64,
    level: i32,
    iflag: bool,
) -> Result<Option<Vec<Token>>, Error> {
    let Some((numerator, denominator)) = f_to_fraction(d2) else {
        // irrational power
        if !iflag || (cx.config.preserve_surds && !cx.config.approximate_roots) {
            return Ok(None);
        }
        let c = complex_pow(Complex64::new(d1, 0.0), Complex64::new(d2, 0.0));
        cx.warn(Warning::ImaginaryConstant);
        return Ok(Some(vec![
            Token::constant(level, c.re),
            Token::operator(level, Op::Plus),
            Token::variable(level + 1, Var::IMAGINARY),
            Token::operator(level + 1, Op::Times),
            Token::constant(level + 1, c.im),
        ]));
    };

    let d3 = domain_check((-d1).powf(d2))?;
    if !always_positive(denominator) {
        // odd root of a negative number is real: (-d1)^d2 * (+/-1)
        let sign = if always_positive(numerator) { 1.0 } else { -1.0 };
        return Ok(Some(vec![
            Token::constant(level + 1, -d1),
            Token::operator(level + 1, Op::Power),
            Token::constant(level + 1, d2),
            Token::operator(level, Op::Times),
            Token::constant(level, sign),
        ]));
    }
    if !iflag {
        return Ok(None);
    }

    cx.warn(Warning::ImaginaryConstant);
    if d2 == 0.5 {
        Ok(Some(vec![
            Token::constant(level + 1, -d1),
            Token::operator(level + 1, Op::Power),
            Token::constant(level + 1, d2),
            Token::operator(level, Op::Times),
            Token::variable(level, Var::IMAGINARY),
        ]))
    } else {
        Ok(Some(vec![
            Token::constant(level, d3),
            Token::operator(level, Op::Times),
            Token::variable(level + 1, Var::IMAGINARY),
            Token::operator(level + 1, Op::Power),
            Token::constant(level + 1, d2 * 2.0),
        ]))
    }
}

/// Evaluates an expression that contains no variables other than `e` and `pi`. Irrational powers
/// are approximated. Returns `None` if the expression is not a real constant.
pub fn get_constant(cx: &mut Ctxt, p: &[Token]) -> Option<f64> {
    if p.len() == 1 {
        return match p[0].kind {
            TokenKind::Constant(d) => Some(d),
            TokenKind::Variable(v) => v.const_value(),
            TokenKind::Operator(_) => None,
        };
    }
    if p.len() < 3 || p.len() % 2 == 0 {
        return None;
    }

    let mut level = p[1].level;
    let mut d1 = get_constant(cx, &p[..1])?;
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
        let d2 = get_constant(cx, &p[i + 1..j])?;
        let fold = cx.scoped(
            |config| config.approximate_roots = true,
            |cx| calc(cx, None, &mut d1, op, d2),
        );
        if fold != Fold::Done {
            return None;
        }
        i = j;
    }
    Some(d1)
}

#[cfg(test)]
mod tests {
    use assert_float_eq::{
        afe_is_relative_eq,
        assert_float_relative_eq,
    };
    use pretty_assertions::assert_eq;
    use crate::token::{fmt::display, from_ast::parse_side};
    use super::*;

    fn folded(cx: &mut Ctxt, src: &str, iflag: bool) -> String {
        let mut side = parse_side(cx, src).unwrap();
        while combine_constants(cx, &mut side, iflag).unwrap() {}
        display(cx, &side)
    }

    #[test]
    fn arithmetic() {
        let mut cx = Ctxt::default();
        assert_eq!(folded(&mut cx, "2 + 3*4", false), "14");
        assert_eq!(folded(&mut cx, "x - 2 + 3", false), "x + 1");
        assert_eq!(folded(&mut cx, "2*x*3", false), "6*x");
        assert_eq!(folded(&mut cx, "x/2*4", false), "x*2");
        assert_eq!(folded(&mut cx, "3!", false), "6");
        assert_eq!(folded(&mut cx, "7 // 2", false), "3");
    }

    #[test]
    fn sums_cancel_within_epsilon() {
        let mut cx = Ctxt::default();
        let mut k1 = 0.1 + 0.2;
        assert_eq!(calc(&mut cx, None, &mut k1, Op::Minus, 0.3), Fold::Done);
        assert_eq!(k1, 0.0);
    }

    #[test]
    fn minus_moves_into_operator() {
        let mut cx = Ctxt::default();
        let mut op1 = Op::Minus;
        let mut k1 = 2.0;
        calc(&mut cx, Some(&mut op1), &mut k1, Op::Plus, 5.0);
        assert_eq!((op1, k1), (Op::Plus, 3.0));
    }

    #[test]
    fn divide_by_zero_warns() {
        let mut cx = Ctxt::default();
        let mut k1 = 1.0;
        assert_eq!(calc(&mut cx, None, &mut k1, Op::Divide, 0.0), Fold::Done);
        assert!(k1.is_infinite());
        assert_eq!(cx.take_warnings(), vec![Warning::DivideByZero]);
    }

    #[test]
    fn zero_to_zero_is_one() {
        let mut cx = Ctxt::default();
        assert_eq!(folded(&mut cx, "0^0", false), "1");
        assert_eq!(cx.take_warnings(), vec![Warning::ZeroPowerZero]);
    }

    #[test]
    fn modulus_modes() {
        let mut cx = Ctxt::default();
        let mut modulo = |cx: &mut Ctxt, mode, k1, k2| {
            cx.config.modulus_mode = mode;
            let mut k1 = k1;
            calc(cx, None, &mut k1, Op::Modulus, k2);
            k1
        };
        assert_eq!(modulo(&mut cx, ModulusMode::Dividend, -7.0, 3.0), -1.0);
        assert_eq!(modulo(&mut cx, ModulusMode::NonNegative, -7.0, 3.0), 2.0);
        assert_eq!(modulo(&mut cx, ModulusMode::Divisor, 7.0, -3.0), -2.0);
    }

    #[test]
    fn surds_are_preserved() {
        let mut cx = Ctxt::default();
        let mut k1 = 2.0;
        assert_eq!(calc(&mut cx, None, &mut k1, Op::Power, 0.5), Fold::Unchanged);
        let mut k1 = 4.0;
        assert_eq!(calc(&mut cx, None, &mut k1, Op::Power, 0.5), Fold::Done);
        assert_eq!(k1, 2.0);
    }

    #[test]
    fn odd_roots_of_negatives_are_real() {
        let mut cx = Ctxt::default();
        assert_eq!(folded(&mut cx, "(-8)^(1/3)", false), "-2");
    }

    #[test]
    fn square_roots_of_negatives_need_iflag() {
        let mut cx = Ctxt::default();
        let mut side = parse_side(&mut cx, "(-4)^0.5").unwrap();
        assert!(!combine_constants(&mut cx, &mut side, false).unwrap());
        assert_eq!(side.len(), 3);
        assert_eq!(folded(&mut cx, "(-4)^0.5", true), "2*i");
    }

    #[test]
    fn constants_evaluate() {
        let mut cx = Ctxt::default();
        let side = parse_side(&mut cx, "2*pi + 2^0.5").unwrap();
        let value = get_constant(&mut cx, &side).unwrap();
        assert_float_relative_eq!(value, 2.0 * std::f64::consts::PI + 2f64.sqrt());
        let side = parse_side(&mut cx, "x + 1").unwrap();
        assert_eq!(get_constant(&mut cx, &side), None);
    }
}
