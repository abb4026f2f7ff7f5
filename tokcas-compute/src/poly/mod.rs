//! Polynomial division, GCD, and factoring.
//!
//! A polynomial here is any sum whose terms are `c*v^d` for a base variable `v`, where the
//! coefficient `c` and the exponent `d` are arbitrary expressions that don't contain `v`. Division
//! is long division on the term with the greatest power of `v`; it works with any number of
//! variables, so the same routines divide `x^2 - 1` by `x - 1` and `a*x + a*b` by `x + b`.

pub mod div;
pub mod factor;
pub mod gcd;
pub mod modulus;

pub use div::{div_remainder, poly_div, smart_div, DivStatus, Division};
pub use factor::{poly_factor, poly_factor_no_squares};
pub use gcd::{poly2_gcd, poly_gcd, poly_gcd_simp, GcdSearch};
pub use modulus::mod_simp;

use crate::token::{side::min_level, Op, Token, TokenKind, Var};
use std::{collections::BTreeMap, ops::Range};

/// Returns true if the side is the constant zero.
pub(crate) fn is_zero(p: &[Token]) -> bool {
    matches!(p, [t] if t.as_constant() == Some(0.0))
}

/// Returns true if the operator at `i` is a `+` or `-` at level 1.
fn is_term_boundary(p: &[Token], i: usize) -> bool {
    p[i].level == 1 && p[i].op().map_or(false, Op::is_additive)
}

/// Splits a side into its level 1 additive terms. The operator before each term, if any, is at the
/// index just before its start.
pub(crate) fn terms(p: &[Token]) -> Vec<Range<usize>> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut i = 1;
    loop {
        if i >= p.len() || is_term_boundary(p, i) {
            out.push(start..i.min(p.len()));
            if i >= p.len() {
                return out;
            }
            start = i + 1;
        }
        i += 2;
    }
}

/// Counts the occurrences of each variable, in variable order, keeping at most `limit` variables.
pub(crate) fn var_counts(p: &[Token], limit: usize) -> Vec<(Var, usize)> {
    let mut counts = BTreeMap::new();
    for v in p.iter().filter_map(Token::as_var) {
        *counts.entry(v).or_insert(0) += 1;
    }
    counts.into_iter().take(limit).collect()
}

/// Returns true if the expression is a single polynomial term in `v`: `c*v^d` where `c` and `d`
/// don't contain `v`. With `allow_divides`, `c/v^d` is also a term.
fn poly_in_v_sub(p: &[Token], v: Var, allow_divides: bool) -> bool {
    let level = min_level(p);
    let mut count = 0;
    for i in (0..p.len()).step_by(2) {
        if !p[i].is_var_eq(v) {
            continue;
        }
        count += 1;
        if count > 1 {
            return false;
        }
        let vlevel = p[i].level;
        if vlevel != level && vlevel != level + 1 {
            return false;
        }
        for k in (1..p.len()).step_by(2).filter(|&k| p[k].level == level) {
            match p[k].op() {
                Some(Op::Divide) if !allow_divides && k + 1 == i => return false,
                Some(Op::Divide | Op::Times) => {},
                Some(Op::Power) if k == i + 1 => {},
                _ => return false,
            }
        }
        if vlevel == level + 1 && !(i + 1 < p.len() && p[i + 1].level == vlevel && p[i + 1].is_op(Op::Power)) {
            return false;
        }
    }
    true
}

/// Returns true if the side is a polynomial in `v`. The coefficients and exponents may be anything
/// that doesn't contain `v`.
///
/// With `allow_divides`, `v` may also be a divisor, which is a negative exponent. The side should
/// be fully expanded for an accurate answer.
pub fn poly_in_v(p: &[Token], v: Var, allow_divides: bool) -> bool {
    terms(p).into_iter().all(|t| poly_in_v_sub(&p[t], v, allow_divides))
}

/// Returns the size of an expression, not counting constant factors. A lone constant has size `-1`.
pub fn basic_size(p: &[Token]) -> isize {
    let level = min_level(p);
    let mut rv = p.len() as isize;
    let mut j = -1isize;
    let mut constant_factor = true;
    for (i, t) in p.iter().enumerate() {
        match t.kind {
            TokenKind::Operator(op) => {
                if t.level == level && op.is_multiplicative() {
                    if constant_factor {
                        rv -= i as isize - j;
                    }
                    j = i as isize;
                    constant_factor = true;
                }
            },
            TokenKind::Variable(_) => constant_factor = false,
            TokenKind::Constant(_) => {},
        }
    }
    if constant_factor {
        rv -= p.len() as isize - j;
    }
    rv
}

/// Where [`find_greatest_power`] looks for terms: `x^5` is in the numerator, `1/x^5` in the
/// denominator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermPlace {
    Numerator,
    Denominator,

    /// Search everywhere, then narrow to where the greatest power was found.
    Detect,

    /// Search everywhere.
    Anywhere,
}

impl TermPlace {
    fn code(self) -> u8 {
        match self {
            TermPlace::Numerator => 0,
            TermPlace::Denominator => 1,
            TermPlace::Detect => 2,
            TermPlace::Anywhere => 3,
        }
    }

    fn from_code(code: u8) -> Self {
        match code {
            0 => TermPlace::Numerator,
            1 => TermPlace::Denominator,
            _ => TermPlace::Detect,
        }
    }

    /// Returns the other place to look: the denominator for the numerator, and the numerator for
    /// everything else.
    pub fn flipped(self) -> Self {
        match self {
            TermPlace::Numerator => TermPlace::Denominator,
            _ => TermPlace::Numerator,
        }
    }

    /// Returns true if this place rules out a term whose division status is `divided`.
    fn excludes(self, divided: bool) -> bool {
        self.code() <= 1 && self.code() != divided as u8
    }
}

/// The result of [`find_greatest_power`].
#[derive(Debug, Clone, PartialEq)]
pub struct GreatestPower {
    /// The number of terms raised to the greatest power.
    pub count: usize,

    /// The greatest power found, or `0`.
    pub power: f64,

    /// The first term with the greatest power, among equals the one with the smallest
    /// [`term_value`].
    pub term: Option<Range<usize>>,
}

/// Tracks whether the tokens being scanned are in a denominator.
#[derive(Default)]
struct DivideTracker {
    divided: bool,
    level: i32,
}

impl DivideTracker {
    fn visit(&mut self, op: Op, level: i32) {
        if op == Op::Divide {
            if self.divided && level >= self.level {
                return;
            }
            self.level = level;
            self.divided = true;
        } else if self.divided && level <= self.level {
            self.divided = false;
        }
    }
}

const VALUE_COUNT: usize = 3;

/// Weighs the term starting at `loc` by the variables it contains, so that terms with equal powers
/// are picked in a stable order: the number of variables, a sum of their weights, and the same sum
/// counting constant powers.
fn term_value(p: &[Token], loc: usize) -> [f64; VALUE_COUNT] {
    let mut dp = [0.0; VALUE_COUNT];
    let mut tracker = DivideTracker::default();
    let mut end = p.len();
    for (i, t) in p.iter().enumerate().skip(loc) {
        match t.kind {
            TokenKind::Variable(v) => {
                let sign = if tracker.divided { -1.0 } else { 1.0 };
                dp[0] += sign;
                dp[1] += sign * v.weight();
                dp[2] += sign * v.weight();
            },
            TokenKind::Operator(op) => {
                if t.level == 1 && op.is_additive() {
                    end = i;
                    break;
                }
                tracker.visit(op, t.level);
            },
            TokenKind::Constant(_) => {},
        }
    }

    tracker.divided = false;
    for j in (loc + 1..end).step_by(2) {
        let level = p[j].level;
        let Some(op) = p[j].op() else {
            continue;
        };
        tracker.visit(op, level);
        if op != Op::Power || p[j + 1].level != level {
            continue;
        }
        let Some(d) = p[j + 1].as_constant().map(|c| c - 1.0) else {
            continue;
        };
        let mut sub_count = 0.0;
        let mut sub_sum = 0.0;
        for t in p[loc..j].iter().rev().take_while(|t| t.level >= level) {
            if let Some(v) = t.as_var() {
                sub_count += 1.0;
                sub_sum += v.weight();
            }
        }
        let sign = if tracker.divided { -1.0 } else { 1.0 };
        dp[0] += sign * d * sub_count;
        dp[2] += sign * d * sub_sum;
    }
    dp
}

/// Returns true if `va` sorts before `last`, comparing element by element.
fn sorts_before(va: &[f64; VALUE_COUNT], last: &[f64; VALUE_COUNT]) -> bool {
    va.iter()
        .zip(last)
        .find(|(a, b)| a != b)
        .map_or(false, |(a, b)| a < b)
}

/// The best term found so far by [`find_greatest_power`].
struct Best {
    power: f64,
    start: Option<usize>,
    divided: u8,
    count: usize,
    value: [f64; VALUE_COUNT],
}

impl Best {
    /// Considers the term at `j`, where `v` is raised to `d`.
    fn consider(&mut self, p: &[Token], d: f64, j: usize, divided: bool) {
        let va = term_value(p, j);
        let mut flag = d == self.power && self.divided > divided as u8;
        if d == self.power && self.divided == divided as u8 {
            if self.start != Some(j) {
                self.count += 1;
            }
            flag = sorts_before(&va, &self.value);
        } else if d > self.power || flag {
            self.count = 1;
        }
        if d > self.power || flag {
            self.value = va;
            self.power = d;
            self.start = Some(j);
            self.divided = divided as u8;
        }
    }

    /// Takes the term at `j` when looking for the variable itself.
    fn take(&mut self, d: f64, j: usize, divided: bool) {
        self.power = d;
        self.start = Some(j);
        self.divided = divided as u8;
    }
}

/// Finds the additive term in which `v` is raised to the greatest constant power.
///
/// If `v` is `None` on entry, it is set to the symbolic variable with the greatest power, and the
/// returned count is zero. `place` restricts the search to numerators or denominators; if it is
/// [`TermPlace::Detect`] on entry, it is narrowed to where the greatest power was found.
pub fn find_greatest_power(p: &[Token], v: &mut Option<Var>, place: &mut TermPlace) -> GreatestPower {
    let dcode = *place;
    let mut best = Best {
        power: 0.0,
        start: None,
        divided: dcode.code(),
        count: 0,
        value: [0.0; VALUE_COUNT],
    };
    let mut found = None;
    let mut was_power = false;
    let mut tracker = DivideTracker::default();

    let mut j = 0;
    let mut i = 1;
    loop {
        if i >= p.len() || is_term_boundary(p, i) {
            // the term `j..i`, when no power of `v` greater than one was seen
            tracker.divided = false;
            if !was_power && best.power <= 1.0 {
                let end = i.min(p.len());
                let mut k = j;
                while k < end {
                    match p[k].kind {
                        TokenKind::Variable(var) if !dcode.excludes(tracker.divided) => match *v {
                            Some(v) if var == v => {
                                best.consider(p, 1.0, j, tracker.divided);
                                break;
                            },
                            None if var.is_symbolic() => {
                                found = Some(var);
                                best.take(1.0, j, tracker.divided);
                                break;
                            },
                            _ => {},
                        },
                        TokenKind::Operator(op) => {
                            tracker.visit(op, p[k].level);
                            if op == Op::Power {
                                // skip the exponent
                                let level = p[k].level;
                                k += 2;
                                while k < end && p[k].level > level {
                                    k += 2;
                                }
                                continue;
                            }
                        },
                        _ => {},
                    }
                    k += 1;
                }
            }
            if i >= p.len() {
                break;
            }
            j = i + 1;
            was_power = false;
            tracker.divided = false;
            i += 2;
            continue;
        }

        let level = p[i].level;
        let Some(op) = p[i].op() else {
            i += 2;
            continue;
        };
        tracker.visit(op, level);
        let exponent = p[i + 1];
        if let (Op::Power, Some(d)) = (op, exponent.as_constant()) {
            if (v.is_some() || exponent.level == level) && !dcode.excludes(tracker.divided) {
                // look for the variable in the base
                let mut k = i;
                loop {
                    if let Some(var) = p[k - 1].as_var() {
                        match *v {
                            Some(v) if var == v => {
                                was_power = true;
                                best.consider(p, d, j, tracker.divided);
                                break;
                            },
                            None if var.is_symbolic() => {
                                was_power = true;
                                if d > best.power {
                                    found = Some(var);
                                    best.take(d, j, tracker.divided);
                                }
                                break;
                            },
                            _ => {},
                        }
                    }
                    if k < j + 3 {
                        break;
                    }
                    k -= 2;
                    if p[k].level <= level {
                        break;
                    }
                }
            }
        }
        i += 2;
    }

    if v.is_none() {
        *v = found;
    }
    let term = best.start.map(|start| {
        let end = (start + 1..p.len())
            .step_by(2)
            .find(|&i| is_term_boundary(p, i))
            .unwrap_or(p.len());
        start..end
    });
    if dcode == TermPlace::Detect {
        *place = TermPlace::from_code(best.divided);
    }
    GreatestPower { count: best.count, power: best.power, term }
}

/// Chooses the best base variable to divide `p1` by `p2` with: the symbolic variable that occurs
/// most often in `p1` and whose greatest power in `p2` divides one in `p1`.
///
/// Returns the number of times the chosen variable occurs in `p1`, or zero if there is none.
pub(crate) fn find_highest_count(p1: &[Token], p2: &[Token], v: &mut Option<Var>, limit: usize) -> usize {
    let mut counts = var_counts(p1, limit);
    counts.sort_by(|(v1, c1), (v2, c2)| c2.cmp(c1).then(v1.cmp(v2)));

    let divides = |var: Var, place: TermPlace| {
        let mut place = place;
        let mut w = Some(var);
        let g1 = find_greatest_power(p1, &mut w, &mut place);
        let g2 = find_greatest_power(p2, &mut w, &mut place);
        (!(g2.power <= 0.0 || g1.power < g2.power || g2.count > g1.count), place)
    };

    for (var, count) in counts.into_iter().filter(|(var, _)| var.is_symbolic()) {
        let (ok, place) = divides(var, TermPlace::Detect);
        if ok || divides(var, place.flipped()).0 {
            *v = Some(var);
            return count;
        }
    }
    0
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use crate::{ctxt::Ctxt, token::from_ast::parse_side};
    use super::*;

    #[test]
    fn polynomial_terms() {
        let mut cx = Ctxt::default();
        let x = cx.vars.intern("x");
        let p = parse_side(&mut cx, "3*x^2 + a*x + b").unwrap();
        assert!(poly_in_v(&p, x, false));

        let p = parse_side(&mut cx, "x^2 + 1/x").unwrap();
        assert!(poly_in_v(&p, x, true));
        assert!(!poly_in_v(&p, x, false));

        let p = parse_side(&mut cx, "x*x + 1").unwrap();
        assert!(!poly_in_v(&p, x, true));

        let p = parse_side(&mut cx, "(x + 1)^2").unwrap();
        assert!(!poly_in_v(&p, x, true));
    }

    #[test]
    fn size_without_constant_factors() {
        let mut cx = Ctxt::default();
        assert_eq!(basic_size(&parse_side(&mut cx, "2*x*3").unwrap()), 1);
        assert_eq!(basic_size(&parse_side(&mut cx, "x + 1").unwrap()), 3);
        assert_eq!(basic_size(&parse_side(&mut cx, "5").unwrap()), -1);
    }

    #[test]
    fn greatest_power() {
        let mut cx = Ctxt::default();
        let x = cx.vars.intern("x");
        let p = parse_side(&mut cx, "2*x^2 + x^3 + 1").unwrap();

        let mut v = Some(x);
        let mut place = TermPlace::Detect;
        let g = find_greatest_power(&p, &mut v, &mut place);
        assert_eq!(g.power, 3.0);
        assert_eq!(g.count, 1);
        assert_eq!(g.term, Some(6..9));
        assert_eq!(place, TermPlace::Numerator);

        // the variable is found when not given
        let mut v = None;
        let mut place = TermPlace::Anywhere;
        let g = find_greatest_power(&p, &mut v, &mut place);
        assert_eq!((v, g.power), (Some(x), 3.0));
    }

    #[test]
    fn greatest_power_in_denominators() {
        let mut cx = Ctxt::default();
        let x = cx.vars.intern("x");
        let p = parse_side(&mut cx, "x^2 + 1/x^5").unwrap();

        let mut place = TermPlace::Detect;
        let g = find_greatest_power(&p, &mut Some(x), &mut place);
        assert_eq!((g.power, place), (5.0, TermPlace::Denominator));

        let mut place = TermPlace::Numerator;
        let g = find_greatest_power(&p, &mut Some(x), &mut place);
        assert_eq!(g.power, 2.0);
    }

    #[test]
    fn counts_terms_with_equal_powers() {
        let mut cx = Ctxt::default();
        let x = cx.vars.intern("x");
        let p = parse_side(&mut cx, "a*x^2 + b*x^2 + x").unwrap();
        let g = find_greatest_power(&p, &mut Some(x), &mut TermPlace::Anywhere);
        assert_eq!((g.power, g.count), (2.0, 2));
    }

    #[test]
    fn chooses_the_most_frequent_variable() {
        let mut cx = Ctxt::default();
        let x = cx.vars.intern("x");
        let p1 = parse_side(&mut cx, "x^2 + a*x + a").unwrap();
        let p2 = parse_side(&mut cx, "x + a").unwrap();
        let mut v = None;
        assert_eq!(find_highest_count(&p1, &p2, &mut v, 100), 2);
        assert_eq!(v, Some(x));
    }
}
