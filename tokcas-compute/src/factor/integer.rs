//! Factoring of floating-point integers, and extraction of common numeric coefficients.

use crate::{
    consts::MAX_K_INTEGER,
    ctxt::Ctxt,
    error::Error,
    numeric::gcd_verified,
    token::{Op, Token, TokenKind},
};

/// Steps that skip multiples of 2, 3, 5, and 7. They add up to `2*3*5*7 = 210`.
const SKIP_MULTIPLES: [f64; 48] = [
    10.0, 2.0, 4.0, 2.0, 4.0, 6.0, 2.0, 6.0,
    4.0, 2.0, 4.0, 6.0, 6.0, 2.0, 6.0, 4.0,
    2.0, 6.0, 4.0, 6.0, 8.0, 4.0, 2.0, 4.0,
    2.0, 4.0, 8.0, 6.0, 4.0, 6.0, 2.0, 4.0,
    6.0, 2.0, 6.0, 6.0, 4.0, 2.0, 4.0, 6.0,
    2.0, 6.0, 4.0, 2.0, 4.0, 2.0, 10.0, 2.0,
];

/// The prime factorization of an integer, as `(factor, multiplicity)` pairs in increasing order of
/// factor. A negative integer has the factor `-1`; the factorization of `1` is `1^1`.
///
/// Multiplicities are stored as floats so they can be decremented in place by callers that move
/// factors somewhere else.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PrimeFactors {
    factors: Vec<(f64, f64)>,
}

impl PrimeFactors {
    /// Returns the number of distinct factors.
    pub fn len(&self) -> usize {
        self.factors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(f64, f64)> {
        self.factors.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut (f64, f64)> {
        self.factors.iter_mut()
    }

    /// Returns true if the factored integer was prime.
    pub fn is_prime(&self) -> bool {
        self.multiply_out() >= 2.0 && self.factors.len() == 1 && self.factors[0].1 == 1.0
    }

    /// Multiplies the factors back together.
    pub fn multiply_out(&self) -> f64 {
        let mut d = 1.0;
        for &(factor, count) in &self.factors {
            let mut j = 0.0;
            while j < count {
                d *= factor;
                j += 1.0;
            }
        }
        d
    }
}

/// State of one factorization.
struct Factorizer {
    factors: Vec<(f64, f64)>,
    remaining: f64,
    sqrt_value: f64,
}

impl Factorizer {
    /// Divides `arg` out of the remaining value as many times as it goes.
    fn try_factor(&mut self, arg: f64) {
        while self.remaining % arg == 0.0 {
            match self.factors.last_mut() {
                Some((factor, count)) if *count > 0.0 && *factor == arg => *count += 1.0,
                _ => {
                    while self.factors.last().map_or(false, |&(_, count)| count <= 0.0) {
                        self.factors.pop();
                    }
                    self.factors.push((arg, 1.0));
                },
            }
            self.remaining /= arg;
            self.sqrt_value = 1.0 + self.remaining.abs().sqrt();
            if self.remaining.abs() <= 1.5 || arg.abs() <= 1.5 {
                break;
            }
        }
    }
}

/// Factors the integer `value` into primes.
///
/// Returns `None` if `value` is zero, not finite, not an integer, or too large to factor exactly.
/// Fails with [`Error::Bug`] if the floating-point arithmetic turns out to be inconsistent.
pub fn factor_one(value: f64) -> Result<Option<PrimeFactors>, Error> {
    if value == 0.0 || !value.is_finite() || value.abs() >= MAX_K_INTEGER || value % 1.0 != 0.0 {
        return Ok(None);
    }

    let mut f = Factorizer {
        factors: Vec::new(),
        remaining: value,
        sqrt_value: 1.0 + value.abs().sqrt(),
    };
    for prime in [2.0, 3.0, 5.0, 7.0] {
        f.try_factor(prime);
    }
    let mut d = 1.0;
    while d <= f.sqrt_value {
        for step in SKIP_MULTIPLES {
            d += step;
            f.try_factor(d);
        }
    }
    if f.remaining != 1.0 {
        if f.remaining < 0.0 && f.remaining != -1.0 {
            f.try_factor(f.remaining.abs());
        }
        f.try_factor(f.remaining);
    }
    if f.factors.is_empty() {
        f.try_factor(1.0);
    }

    if f.remaining != 1.0 {
        return Err(Error::Bug("integer factorization did not divide out completely"));
    }
    let factors = PrimeFactors { factors: f.factors };
    if factors.multiply_out() != value {
        return Err(Error::Bug("integer factorization does not multiply back to its input"));
    }
    Ok(Some(factors))
}

/// Replaces every composite integer constant in a side with its prime factorization, as a product
/// of powers. Returns true if the side changed.
pub fn factor_int(cx: &Ctxt, side: &mut Vec<Token>) -> Result<bool, Error> {
    let mut modified = false;
    let mut i = 0;
    while i < side.len() {
        let TokenKind::Constant(value) = side[i].kind else {
            i += 2;
            continue;
        };
        let Some(factors) = factor_one(value)? else {
            i += 2;
            continue;
        };
        if factors.len() == 1 && factors.iter().all(|&(_, count)| count <= 1.0) {
            i += 2;
            continue;
        }

        let mut level = side[i].level;
        if factors.len() > 1 && side.len() > 1 {
            level += 1;
        }
        let mut tokens = Vec::new();
        for (j, &(factor, count)) in factors.iter().enumerate() {
            if j > 0 {
                tokens.push(Token::operator(level, Op::Times));
            }
            if count > 1.0 {
                tokens.extend([
                    Token::constant(level + 1, factor),
                    Token::operator(level + 1, Op::Power),
                    Token::constant(level + 1, count),
                ]);
            } else {
                tokens.push(Token::constant(level, factor));
            }
        }
        let n = tokens.len();
        crate::token::side::replace(cx, side, i..i + 1, &tokens)?;
        modified = true;
        i += n + 1;
    }
    Ok(modified)
}

/// Factors a common numeric coefficient out of every sum in a side, such as
/// `2*x + 4*y + 6 -> (x + 2*y + 3)*2`.
///
/// The low two bits of `level_code` choose the policy:
///
/// - 0: normalize every sum so that its smallest coefficient is 1, factoring out `-1` as well if
///   every term is negative
/// - 1: make top-level sums readable, normalize deeper ones
/// - 2: only factor where it makes the sum more readable
/// - 3: do nothing
///
/// Adding 4 always factors out the GCD of the rational coefficients, leaving reduced integers.
///
/// Comparing expressions only recognizes a common factor of `-1`, so this normalization is what
/// lets algebraic fractions cancel.
pub fn factor_constants(cx: &mut Ctxt, side: &mut Vec<Token>, level_code: u8) -> Result<bool, Error> {
    if level_code == 3 {
        return Ok(false);
    }
    fc_recurse(cx, side, 0, 1, level_code)
}

/// Running minimum and GCD of the coefficient magnitudes of one sum.
struct Coefficients {
    minimum: f64,
    cogcd: f64,
    first: bool,
    gcd_flag: bool,
}

impl Coefficients {
    fn add(&mut self, d: f64) {
        if self.first {
            self.minimum = d;
            self.cogcd = d;
            self.first = false;
        } else {
            if self.minimum > d {
                self.minimum = d;
            }
            if self.gcd_flag && self.cogcd != 0.0 {
                self.cogcd = gcd_verified(d, self.cogcd);
            }
        }
    }
}

fn fc_recurse(
    cx: &mut Ctxt,
    side: &mut Vec<Token>,
    loc: usize,
    level: i32,
    level_code: u8,
) -> Result<bool, Error> {
    let mut modified = false;
    let mut i = loc;
    while i < side.len() && side[i].level >= level {
        if side[i].level > level {
            modified |= fc_recurse(cx, side, i, level + 1, level_code)?;
            i += 1;
            while i < side.len() && side[i].level > level {
                i += 2;
            }
            continue;
        }
        i += 1;
    }
    if modified {
        return Ok(true);
    }

    let improve_readability = level_code & 3 > 1 || (level_code & 3 != 0 && level == 1);
    let mut coefficients = Coefficients {
        minimum: 1.0,
        cogcd: 1.0,
        first: true,
        gcd_flag: (improve_readability && cx.config.factor_out_all_numeric_gcds) || level_code & 4 != 0,
    };
    let mut neg_flag = true;
    let mut op_count = 0;
    let mut const_count = 0;

    let mut i = loc;
    while i < side.len() && side[i].level >= level {
        if side[i].level == level {
            let d = match side[i].kind {
                TokenKind::Constant(d) => {
                    const_count += 1;
                    d
                },
                TokenKind::Operator(Op::Plus) => {
                    neg_flag = false;
                    op_count += 1;
                    i += 1;
                    continue;
                },
                TokenKind::Operator(Op::Minus) => {
                    op_count += 1;
                    i += 1;
                    continue;
                },
                TokenKind::Operator(_) => return Ok(false),
                TokenKind::Variable(_) => 1.0,
            };
            if i == loc && d > 0.0 {
                neg_flag = false;
            }
            coefficients.add(d.abs());
            i += 1;
            continue;
        }

        // a deeper term: look for a single leading constant coefficient
        let mut op = None;
        let mut j = i + 1;
        while j < side.len() && side[j].level > level {
            if side[j].level == level + 1 {
                op = side[j].op();
            }
            j += 2;
        }
        if matches!(op, Some(Op::Times | Op::Divide)) {
            let mut found = false;
            for k in i..j {
                if side[k].level != level + 1 {
                    continue;
                }
                let Some(d) = side[k].as_constant() else {
                    continue;
                };
                if found {
                    // more than one constant
                    return Ok(false);
                }
                if k > i && !side[k - 1].is_op(Op::Times) {
                    return Ok(false);
                }
                if i == loc && d > 0.0 {
                    neg_flag = false;
                }
                coefficients.add(d.abs());
                found = true;
            }
            if found {
                i = j;
                continue;
            }
        }
        if i == loc {
            neg_flag = false;
        }
        coefficients.add(1.0);
        i = j;
    }
    let eloc = i;

    let Coefficients { mut minimum, cogcd, first, gcd_flag } = coefficients;
    if gcd_flag && cogcd != 0.0 {
        minimum = cogcd;
    }
    if first || op_count == 0 || const_count > 1 || (!neg_flag && minimum == 1.0) {
        return Ok(false);
    }
    if minimum == 0.0 || !minimum.is_finite() {
        return Ok(false);
    }

    if improve_readability {
        let mut i = loc;
        while i < eloc {
            let mut d = 1.0;
            if let Some(k) = side[i].as_constant() {
                if side[i].level == level
                    || (i + 1 < eloc
                        && side[i].level == level + 1
                        && side[i + 1].level == level + 1
                        && side[i + 1].op().map_or(false, Op::is_multiplicative))
                {
                    d = k;
                }
            }
            if minimum < 1.0 && d % 1.0 == 0.0 {
                minimum = 1.0;
                break;
            }
            // dividing by the factor must leave an integer
            if d % minimum != 0.0 {
                minimum = 1.0;
                break;
            }
            i += 1;
            while i < side.len() && side[i].level > level {
                i += 2;
            }
            if i >= side.len() || side[i].level < level {
                break;
            }
            i += 1;
        }
    }
    if neg_flag {
        minimum = -minimum;
    }
    if minimum == 1.0 {
        return Ok(false);
    }

    cx.check_len(side.len() + (op_count + 2) * 2)?;
    let mut i = loc;
    while i < side.len() && side[i].level >= level {
        if side[i].op().is_none() {
            let mut j = i;
            loop {
                side[j].level += 1;
                j += 1;
                if j >= side.len() || side[j].level <= level {
                    break;
                }
            }
            side.splice(j..j, [
                Token::operator(level + 1, Op::Divide),
                Token::constant(level + 1, minimum),
            ]);
            i = j + 1;
        }
        i += 1;
    }
    let mut i = loc;
    while i < side.len() && side[i].level >= level {
        side[i].level += 1;
        i += 1;
    }
    side.splice(i..i, [Token::operator(level, Op::Times), Token::constant(level, minimum)]);
    log::trace!("factored out numeric coefficient {}", minimum);
    Ok(true)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use crate::{
        simplify::elim_loop,
        token::{fmt::display, from_ast::parse_side, side::is_well_formed},
    };
    use super::*;

    fn factors(value: f64) -> Vec<(f64, f64)> {
        factor_one(value).unwrap().unwrap().iter().copied().collect()
    }

    #[test]
    fn factors_integers() {
        assert_eq!(factors(360.0), vec![(2.0, 3.0), (3.0, 2.0), (5.0, 1.0)]);
        assert_eq!(factors(-6.0), vec![(2.0, 1.0), (3.0, 1.0), (-1.0, 1.0)]);
        assert_eq!(factors(1.0), vec![(1.0, 1.0)]);
        assert_eq!(factors(1_000_003.0), vec![(1_000_003.0, 1.0)]);
        assert_eq!(factors(221.0), vec![(13.0, 1.0), (17.0, 1.0)]);
    }

    #[test]
    fn rejects_non_integers() {
        assert_eq!(factor_one(0.0), Ok(None));
        assert_eq!(factor_one(2.5), Ok(None));
        assert_eq!(factor_one(f64::INFINITY), Ok(None));
        assert_eq!(factor_one(1e16), Ok(None));
    }

    #[test]
    fn primality() {
        assert!(factor_one(97.0).unwrap().unwrap().is_prime());
        assert!(!factor_one(91.0).unwrap().unwrap().is_prime());
        assert!(!factor_one(1.0).unwrap().unwrap().is_prime());
    }

    #[test]
    fn factors_constants_in_a_side() {
        let mut cx = Ctxt::default();
        let mut side = parse_side(&mut cx, "12*x").unwrap();
        assert!(factor_int(&cx, &mut side).unwrap());
        assert!(is_well_formed(&side));
        assert_eq!(display(&cx, &side), "2^2*3*x");

        let mut side = parse_side(&mut cx, "7 + x").unwrap();
        assert!(!factor_int(&cx, &mut side).unwrap());
    }

    fn run(src: &str, level_code: u8) -> (bool, String) {
        let mut cx = Ctxt::default();
        let mut side = parse_side(&mut cx, src).unwrap();
        let changed = factor_constants(&mut cx, &mut side, level_code).unwrap();
        assert!(is_well_formed(&side));
        elim_loop(&mut cx, &mut side).unwrap();
        (changed, display(&cx, &side))
    }

    #[test]
    fn factors_out_the_gcd() {
        assert_eq!(run("2*x + 4", 4), (true, "2*(x + 2)".to_string()));
        assert_eq!(run("6*x + 9*y", 4), (true, "3*(2*x + 3*y)".to_string()));
    }

    #[test]
    fn normalizes_to_unit_coefficient() {
        assert_eq!(run("2*x + 3", 0), (true, "2*(x + 1.5)".to_string()));
        assert_eq!(run("-2*x - 4", 0).1, "-2*(x + 2)");
    }

    #[test]
    fn readability_requires_integral_results() {
        assert_eq!(run("2*x + 3", 2).0, false);
        assert_eq!(run("2*x + 4", 2), (true, "2*(x + 2)".to_string()));
    }

    #[test]
    fn leaves_single_terms_alone() {
        assert_eq!(run("2*x", 4).0, false);
        assert_eq!(run("x + y", 4).0, false);
        assert_eq!(factor_constants(&mut Ctxt::default(), &mut vec![Token::constant(1, 2.0)], 3), Ok(false));
    }
}
