//! Symbolic factoring of sums and products. This is not polynomial factoring, which lives in
//! [`poly`](crate::poly).
//!
//! Every pass here walks the side level by level. At each sum (or product), it tries every pair of
//! operands, and rewrites the first pair it can combine:
//!
//! - [`factor_plus`]: `a*c + b*c -> c*(a + b)`, and Horner factoring `x^2 + x -> x*(x + 1)`
//! - [`factor_divide`]: `a/c + b/c -> (a + b)/c`
//! - [`subtract_itself`]: `2*a + 3*a - a -> 4*a`
//! - [`factor_times`]: `a^b*a^c -> a^(b + c)`
//! - [`factor_power`]: `a^c*b^c -> (a*b)^c`

pub mod integer;
pub mod super_factor;

use crate::{
    compare::se_compare,
    consts::always_positive,
    ctxt::Ctxt,
    error::Error,
    token::{side::{binary_parenthesize, min_level}, Op, Token, Var},
};

/// Two operands of the same sum or product: `side[i1..e1]` and `side[i2..e2]`, with `i1 < i2`.
///
/// `loc` is the start of the sum or product, and `level` is one deeper than its operators.
#[derive(Debug, Clone, Copy)]
struct Pair {
    loc: usize,
    level: i32,
    i1: usize,
    e1: usize,
    i2: usize,
    e2: usize,
}

/// Returns the operator at `i`, which must be one.
fn op_at(side: &[Token], i: usize) -> Result<Op, Error> {
    side[i].op().ok_or(Error::Bug("operator expected while factoring"))
}

/// Returns the end of the operand that starts at `i`, on a level of `level`.
fn term_end(side: &[Token], i: usize, level: i32) -> usize {
    let mut k = i + 1;
    while k < side.len() && side[k].level > level {
        k += 2;
    }
    k
}

/// Returns the end of the factor that starts at `b`, inside the term ending at `end` whose
/// operators are at `level`.
fn factor_end(side: &[Token], b: usize, end: usize, level: i32) -> usize {
    let mut i = b + 1;
    while i < end && !(side[i].level == level && side[i].op().map_or(false, Op::is_multiplicative)) {
        i += 2;
    }
    i
}

fn raise(tokens: &mut [Token], by: i32) {
    for t in tokens {
        t.level += by;
    }
}

/// Tries to combine every pair of operands of each sum or product (selected by `class`) in the
/// side, deepest last.
///
/// After a pair is combined, the search restarts from the first operand of the pair. With
/// `always_descend`, deeper levels are visited even if this level was modified.
fn factor_recurse<F>(
    cx: &mut Ctxt,
    side: &mut Vec<Token>,
    loc: usize,
    level: i32,
    class: fn(Op) -> bool,
    always_descend: bool,
    sub: &mut F,
) -> Result<bool, Error>
where
    F: FnMut(&mut Ctxt, &mut Vec<Token>, Pair) -> Result<bool, Error>,
{
    let op = (loc + 1..side.len())
        .step_by(2)
        .take_while(|&i| side[i].level >= level)
        .find(|&i| side[i].level == level)
        .and_then(|i| side[i].op());

    let mut modified = false;
    if op.map_or(false, class) {
        let mut i = loc;
        loop {
            'again: loop {
                let e1 = term_end(side, i, level);
                let mut j = e1 + 1;
                while j < side.len() && side[j - 1].level >= level {
                    let e2 = term_end(side, j, level);
                    let pair = Pair { loc, level: level + 1, i1: i, e1, i2: j, e2 };
                    if sub(cx, side, pair)? {
                        modified = true;
                        continue 'again;
                    }
                    j = e2 + 1;
                }
                break;
            }
            i = term_end(side, i, level) + 1;
            if i >= side.len() || side[i - 1].level < level {
                break;
            }
        }
    }
    if modified && !always_descend {
        return Ok(true);
    }

    let mut i = loc;
    while i < side.len() && side[i].level >= level {
        if side[i].level > level {
            modified |= factor_recurse(cx, side, i, level + 1, class, always_descend, sub)?;
            i += 1;
            while i < side.len() && side[i].level > level {
                i += 2;
            }
            continue;
        }
        i += 1;
    }
    Ok(modified)
}

/// Factors out common factors of the terms of sums: `a*c + b*c -> c*(a + b)`.
///
/// - With `v` of `None` and `d` of `0`, anything is factored, including identical bases raised to
///   powers (Horner factoring): `x^2 + x -> x*(x + 1)`.
/// - With `d` of `1`, only bases raised to constant powers are Horner factored.
/// - With `v` of some variable, or [`Var::MATCH_ANY`], only factors containing that variable, or
///   any variable, are factored, without Horner factoring.
/// - With `v` not [`Var::MATCH_ANY`] and `d` neither `0` nor `1`, only factors containing `v`
///   raised to the power `d` are factored.
pub fn factor_plus(cx: &mut Ctxt, side: &mut Vec<Token>, v: Option<Var>, d: f64) -> Result<bool, Error> {
    factor_recurse(cx, side, 0, 1, Op::is_additive, false, &mut |cx, side, pair| {
        fplus_sub(cx, side, pair, v, d, false, false)
    })
}

/// Factors out common denominators: `a/c + b/c -> (a + b)/c`. `v` and `d` select what to factor,
/// as in [`factor_plus`].
pub fn factor_divide(cx: &mut Ctxt, side: &mut Vec<Token>, v: Option<Var>, d: f64) -> Result<bool, Error> {
    factor_recurse(cx, side, 0, 1, Op::is_additive, false, &mut |cx, side, pair| {
        fplus_sub(cx, side, pair, v, d, false, true)
    })
}

/// Combines terms that are the same expression times a constant: `2*a + 3*a - a -> 4*a`.
pub fn subtract_itself(cx: &mut Ctxt, side: &mut Vec<Token>) -> Result<bool, Error> {
    factor_recurse(cx, side, 0, 1, Op::is_additive, false, &mut |cx, side, pair| {
        fplus_sub(cx, side, pair, None, 0.0, true, false)
    })
}

/// Returns true if `side[b..end]` is the constant `1` or `-1`.
fn is_unit_factor(side: &[Token], b: usize, end: usize) -> bool {
    end - b == 1 && side[b].as_constant().map_or(false, |c| c.abs() == 1.0)
}

/// Returns true if the factor `side[b..end]` contains a `^ d`, with the base containing `v` unless
/// `v` is `None`.
fn has_power_of(side: &[Token], b: usize, end: usize, v: Option<Var>, d: f64) -> bool {
    (b + 1..end).step_by(2).any(|k| {
        side[k].is_op(Op::Power)
            && side[k].level == side[k + 1].level
            && side[k + 1].is_constant_eq(d)
            && v.map_or(true, |v| {
                (0..k).rev()
                    .take_while(|&l| side[l].level >= side[k].level)
                    .any(|l| side[l].is_var_eq(v))
            })
    })
}

/// Looks for a `^` on `level` in the factor `side[b..end]`. Returns its index and the constant
/// exponent, `-1` for a non-constant exponent, or `None` if a constant exponent is not positive.
/// A factor with no power has index `end` and exponent `1`.
fn find_power(side: &[Token], b: usize, end: usize, level: i32) -> Option<(usize, f64)> {
    let Some(l) = (b + 1..end).step_by(2).find(|&l| side[l].level == level && side[l].is_op(Op::Power)) else {
        return Some((end, 1.0));
    };
    if side[l + 1].level == level {
        if let Some(d) = side[l + 1].as_constant() {
            return (d > 0.0).then_some((l, d));
        }
    }
    Some((l, -1.0))
}

/// One term of a sum being factored: `side[start..end]` with the factor `side[base..factor_end]`,
/// whose power operator is at `pow` (or `factor_end` if there is none).
#[derive(Debug, Clone, Copy)]
struct Term {
    start: usize,
    base: usize,
    pow: usize,
    factor_end: usize,
    end: usize,
    op: Op,
}

impl Term {
    fn is_whole_factor(&self) -> bool {
        self.base == self.start && self.factor_end == self.end
    }
}

/// Appends `base^(exp - power)` for the factor of `t`. With `raise_all`, the copied factor is
/// parenthesized first.
fn push_reduced_power(s: &mut Vec<Token>, side: &[Token], t: &Term, power: f64, raise_all: bool) {
    let l = s.len();
    let m = l + t.pow - t.base;
    s.extend_from_slice(&side[t.base..t.factor_end]);
    if raise_all {
        raise(&mut s[l..], 1);
    }
    raise(&mut s[m + 1..], 1);
    let level = s[m].level + 1;
    s.extend([Token::operator(level, Op::Minus), Token::constant(level, power)]);
}

/// Builds `base^power*(rest1 + rest2)` for two terms sharing `base`, where each rest is its term
/// with the factor divided by `base^power`.
fn horner(side: &[Token], level: i32, sop1: Op, mut diff_sign: bool, power: f64, t1: Term, t2: Term) -> Vec<Token> {
    let mut s = Vec::new();
    if sop1 == Op::Divide {
        s.extend([Token::constant(level, 1.0), Token::operator(level, Op::Divide)]);
    }
    let k = s.len();
    s.extend_from_slice(&side[t1.base..t1.pow]);
    if power != 1.0 {
        raise(&mut s[k..], 2);
        s.extend([Token::operator(level + 1, Op::Power), Token::constant(level + 1, power)]);
        if always_positive(power) {
            diff_sign = false;
        }
    } else if t1.base == t1.start && t1.pow == t1.end {
        raise(&mut s[k..], 1);
    }
    s.push(Token::operator(level, Op::Times));

    let k = s.len();
    s.extend_from_slice(&side[t1.start..t1.base]);
    if t1.pow != t1.factor_end {
        push_reduced_power(&mut s, side, &t1, power, t1.is_whole_factor());
        s.push(Token::operator(level, Op::Times));
    }
    s.push(Token::constant(level, if t1.op == Op::Minus { -1.0 } else { 1.0 }));
    s.extend_from_slice(&side[t1.factor_end..t1.end]);
    raise(&mut s[k..], 2);

    diff_sign ^= t2.op == Op::Minus;
    s.push(Token::operator(level + 1, if diff_sign { Op::Minus } else { Op::Plus }));
    let k = s.len();
    s.extend_from_slice(&side[t2.start..t2.base]);
    if t2.pow != t2.factor_end {
        push_reduced_power(&mut s, side, &t2, power, false);
    } else {
        s.push(Token::constant(level, 1.0));
    }
    s.extend_from_slice(&side[t2.factor_end..t2.end]);
    raise(&mut s[k..], 2);
    s
}

/// Builds the factored form of two terms sharing a base raised to different non-constant powers:
/// `a^x + a^y -> a^x*(1 + a^(y - x))`.
fn big_fplus(side: &[Token], level: i32, diff_sign: bool, sop1: Op, t1: Term, t2: Term) -> Vec<Token> {
    let mut s = Vec::new();
    if sop1 == Op::Divide {
        s.extend([Token::constant(level, 1.0), Token::operator(level, Op::Divide)]);
    }
    let k = s.len();
    let exponent1 = k + t1.pow - t1.base;
    s.extend_from_slice(&side[t1.base..t1.factor_end]);
    if t1.is_whole_factor() {
        raise(&mut s[k..], 1);
    }
    s.push(Token::operator(level, Op::Times));

    let k = s.len();
    s.extend_from_slice(&side[t1.start..t1.base]);
    s.push(Token::constant(level, if t1.op == Op::Minus { -1.0 } else { 1.0 }));
    s.extend_from_slice(&side[t1.factor_end..t1.end]);
    raise(&mut s[k..], 2);
    s.push(Token::operator(level + 1, t2.op));

    let k = s.len();
    s.extend_from_slice(&side[t2.start..t2.base]);
    let n = s.len();
    let m = n + t2.pow - t2.base;
    s.extend_from_slice(&side[t2.base..t2.factor_end]);
    raise(&mut s[m + 1..], 1);
    if diff_sign && t2.is_whole_factor() {
        raise(&mut s[n..], 1);
    }
    let sub_level = s[m].level + 1;
    s.push(Token::operator(sub_level, Op::Minus));
    let e = s.len();
    let exponent = &side[t1.pow + 1..t1.factor_end];
    s.extend_from_slice(exponent);
    let by = s[m].level + 2 - min_level(exponent);
    raise(&mut s[e..], by);

    if diff_sign {
        s.push(Token::operator(level, if sop1 == Op::Divide { Op::Times } else { Op::Divide }));
        s.push(Token::constant(level + 1, -1.0));
        let copied = s[exponent1..exponent1 + (t1.factor_end - t1.pow)].to_vec();
        s.extend(copied);
    }
    s.extend_from_slice(&side[t2.factor_end..t2.end]);
    raise(&mut s[k..], 2);
    s
}

/// Replaces the first term of the pair with `tokens` and deletes the second.
fn replace_pair(cx: &Ctxt, side: &mut Vec<Token>, pair: Pair, op1: Op, tokens: Vec<Token>) -> Result<bool, Error> {
    let Pair { i1, e1, i2, e2, .. } = pair;
    cx.check_len(side.len() + tokens.len() - (e1 - i1) - (e2 - i2 + 1))?;
    if op1 == Op::Minus {
        side[i1 - 1].set_op(Op::Plus);
    }
    side.drain(i2 - 1..e2);
    side.splice(i1..e1, tokens);
    Ok(true)
}

/// Factors one pair of terms of a sum.
///
/// - `whole_flag`: only combine whole terms that differ by a constant coefficient
/// - `div_only`: only factor denominators
fn fplus_sub(
    cx: &mut Ctxt,
    side: &mut Vec<Token>,
    pair: Pair,
    v: Option<Var>,
    d: f64,
    whole_flag: bool,
    div_only: bool,
) -> Result<bool, Error> {
    let Pair { loc, level, i1, e1, i2, e2 } = pair;
    let op2 = op_at(side, i2 - 1)?;
    let op1 = if i1 <= loc { Op::Plus } else { op_at(side, i1 - 1)? };

    // skips a leading constant coefficient of a whole term
    let coefficient = |side: &[Token], b: usize, end: usize| {
        end - b > 1
            && side[b].is_constant()
            && side[b + 1].level == level
            && side[b + 1].op().map_or(false, Op::is_multiplicative)
    };

    let mut next_b1 = i1;
    'outer: loop {
        let mut b1 = next_b1;
        if b1 >= e1 {
            return Ok(false);
        }
        let i = if whole_flag {
            if coefficient(side, b1, e1) {
                b1 += 2;
            }
            e1
        } else {
            factor_end(side, b1, e1, level)
        };
        next_b1 = i + 1;
        let sop1 = if b1 <= i1 { Op::Times } else { op_at(side, b1 - 1)? };
        if (div_only && sop1 != Op::Divide) || is_unit_factor(side, b1, i) {
            continue;
        }
        if !whole_flag && v != Some(Var::MATCH_ANY) {
            if d == 0.0 || d == 1.0 {
                if let Some(v) = v {
                    if !(b1..i).step_by(2).any(|k| side[k].is_var_eq(v)) {
                        continue;
                    }
                }
            } else if !has_power_of(side, b1, i, v, d) {
                continue;
            }
        }

        let mut next_b2 = i2;
        loop {
            let mut b2 = next_b2;
            if b2 >= e2 {
                continue 'outer;
            }
            let j = if whole_flag {
                if coefficient(side, b2, e2) {
                    b2 += 2;
                }
                e2
            } else {
                factor_end(side, b2, e2, level)
            };
            next_b2 = j + 1;
            if !whole_flag {
                let matching_op = if b2 <= i2 {
                    sop1 != Op::Divide
                } else {
                    side[b2 - 1].is_op(sop1)
                };
                if !matching_op {
                    continue;
                }
            }
            if is_unit_factor(side, b2, j) {
                continue;
            }

            // whole terms are compared with their coefficients set to 1
            let start1 = if whole_flag && b1 > i1 { i1 } else { b1 };
            let start2 = if whole_flag && b2 > i2 { i2 } else { b2 };
            let (saved1, saved2) = (side[i1], side[i2]);
            if start1 != b1 {
                side[i1].set_constant(1.0);
            }
            if start2 != b2 {
                side[i2].set_constant(1.0);
            }
            let cmp = se_compare(cx, &side[start1..i], &side[start2..j]);
            side[i1] = saved1;
            side[i2] = saved2;

            let t1 = Term { start: i1, base: b1, pow: i, factor_end: i, end: e1, op: op1 };
            let t2 = Term { start: i2, base: b2, pow: j, factor_end: j, end: e2, op: op2 };
            if cmp.is_match() {
                let tokens = horner(side, level, sop1, cmp.is_opposite(), 1.0, t1, t2);
                return replace_pair(cx, side, pair, op1, tokens);
            }
            if whole_flag {
                return Ok(false);
            }
            if v.is_some() || div_only {
                continue;
            }

            // Horner factoring: the factors might be the same base raised to different powers
            let level_of = |t: &Term| if t.is_whole_factor() { level } else { level + 1 };
            let Some((ai, save_d1)) = find_power(side, b1, i, level_of(&t1)) else {
                continue;
            };
            let Some((aj, save_d2)) = find_power(side, b2, j, level_of(&t2)) else {
                continue;
            };
            if ai == i && aj == j {
                continue;
            }
            if ai - b1 == 1 && side[b1].is_constant() {
                continue;
            }
            if d == 1.0 && (save_d1 < 0.0 || save_d2 < 0.0) {
                continue;
            }
            let cmp = se_compare(cx, &side[b1..ai], &side[b2..aj]);
            if !cmp.is_match() {
                continue;
            }
            let diff_sign = cmp.is_opposite();
            let t1 = Term { pow: ai, ..t1 };
            let t2 = Term { pow: aj, ..t2 };

            if save_d1 > 0.0 || save_d2 > 0.0 {
                let power = if save_d1 < 0.0 {
                    save_d2
                } else if save_d2 < 0.0 {
                    save_d1
                } else {
                    let min = save_d1.min(save_d2);
                    if !diff_sign && min % 1.0 != 0.0 && (save_d1.max(save_d2) - min) % 1.0 == 0.0 {
                        let tokens = horner(side, level, sop1, diff_sign, min, t1, t2);
                        return replace_pair(cx, side, pair, op1, tokens);
                    }
                    min
                };
                if power < 1.0 {
                    continue;
                }
                let tokens = horner(side, level, sop1, diff_sign, power.trunc(), t1, t2);
                return replace_pair(cx, side, pair, op1, tokens);
            }

            // both exponents are expressions; factor out the one that looks smaller
            let (mut d1, mut d2) = ((i - ai) as f64, (j - aj) as f64);
            if d1 == d2 {
                let leading_coefficient = |a: usize, end: usize| {
                    if a + 2 >= end {
                        return 1.0;
                    }
                    let k = side[a].level;
                    if side[a + 1].level == k + 1
                        && side[a + 2].level == k + 1
                        && side[a + 2].op().map_or(false, Op::is_multiplicative)
                    {
                        side[a + 1].as_constant().map_or(1.0, f64::abs)
                    } else {
                        1.0
                    }
                };
                d1 = leading_coefficient(ai, i);
                d2 = leading_coefficient(aj, j);
            }
            let tokens = if d1 <= d2 {
                big_fplus(side, level, diff_sign, sop1, t1, t2)
            } else {
                big_fplus(side, level, diff_sign, sop1, t2, t1)
            };
            return replace_pair(cx, side, pair, op1, tokens);
        }
    }
}

/// Merges factors with a common base: `a^b*a^c -> a^(b + c)`, `a*a -> a^2`, `a/a^b -> a^(1 - b)`.
pub fn factor_times(cx: &mut Ctxt, side: &mut Vec<Token>) -> Result<bool, Error> {
    factor_recurse(cx, side, 0, 1, Op::is_multiplicative, false, &mut ftimes_sub)
}

/// Returns the index of the first `^` on `level` in `side[start..end]`, or `end`.
fn first_power(side: &[Token], start: usize, end: usize, level: i32) -> usize {
    (start + 1..end)
        .step_by(2)
        .find(|&i| side[i].level == level && side[i].is_op(Op::Power))
        .unwrap_or(end)
}

fn ftimes_sub(cx: &mut Ctxt, side: &mut Vec<Token>, pair: Pair) -> Result<bool, Error> {
    let Pair { loc, level, i1, e1, i2, e2 } = pair;
    let op2 = op_at(side, i2 - 1)?;
    let op1 = if i1 <= loc { Op::Times } else { op_at(side, i1 - 1)? };
    if e1 - i1 == 1 && side[i1].is_constant() && e2 - i2 == 1 && side[i2].is_constant() {
        return Ok(false);
    }
    let both_divide = op1 == Op::Divide && op2 == Op::Divide;

    // find the common bases; `i` and `j` end up at the power operators, or the term ends
    let whole = se_compare(cx, &side[i1..e1], &side[i2..e2]);
    let (i, j, cmp) = if whole.is_match() {
        (e1, e2, whole)
    } else {
        let i = first_power(side, i1, e1, level);
        let j = first_power(side, i2, e2, level);
        if i >= e1 && j >= e2 {
            return Ok(false);
        }
        let bases = se_compare(cx, &side[i1..i], &side[i2..j]);
        if bases.is_match() {
            (i, j, bases)
        } else if i < e1 && j < e2 {
            let cmp = se_compare(cx, &side[i1..e1], &side[i2..j]);
            if cmp.is_match() {
                (e1, j, cmp)
            } else {
                let cmp = se_compare(cx, &side[i1..i], &side[i2..e2]);
                if !cmp.is_match() {
                    return Ok(false);
                }
                (i, e2, cmp)
            }
        } else {
            return Ok(false);
        }
    };

    if j - i2 == 1 && side[i2].is_constant_eq(-1.0) {
        return Ok(false);
    }
    if cmp.is_opposite() && j - i2 == 1 && side[i2].is_constant() {
        return Ok(false);
    }

    // the exponents of both terms; a term without one is raised to 1
    let exponent = |p: usize, end: usize| {
        if p == end {
            vec![Token::constant(level, 1.0)]
        } else {
            side[p + 1..end].to_vec()
        }
    };

    let mut term = side[i1..i].to_vec();
    if i == e1 {
        raise(&mut term, 1);
    }
    term.push(Token::operator(level, Op::Power));
    let mut sum = Vec::new();
    if op1 == Op::Divide && !both_divide {
        sum.extend([Token::constant(level, -1.0), Token::operator(level, Op::Times)]);
        sum.extend(exponent(i, e1));
        binary_parenthesize(&mut sum, 1);
    } else {
        sum.extend(exponent(i, e1));
    }
    let k = sum.len();
    let combine = if op2 == Op::Divide && !both_divide { Op::Minus } else { Op::Plus };
    sum.push(Token::operator(level, combine));
    sum.extend(exponent(j, e2));
    binary_parenthesize(&mut sum, k);
    term.extend(sum);

    // `a^b*(-a)^c -> a^(b + c)*(-1)^c`
    let mut rest = Vec::new();
    if cmp.is_opposite() {
        rest.extend([Token::operator(level - 1, op2), Token::constant(level, -1.0)]);
        rest.extend_from_slice(&side[j..e2]);
    }
    cx.check_len(side.len() + term.len() + rest.len() - (e1 - i1) - (e2 - i2 + 1))?;

    side.splice(i2 - 1..e2, rest);
    if op1 == Op::Divide && !both_divide {
        side[i1 - 1].set_op(Op::Times);
    }
    side.splice(i1..e1, term);
    Ok(true)
}

/// Merges factors raised to a common exponent, or a common factor of their exponents:
/// `a^c*b^c -> (a*b)^c`, `a^(2*c)/b^c -> (a^2/b)^c`.
pub fn factor_power(cx: &mut Ctxt, side: &mut Vec<Token>) -> Result<bool, Error> {
    factor_recurse(cx, side, 0, 1, Op::is_multiplicative, true, &mut fpower_sub)
}

fn fpower_sub(cx: &mut Ctxt, side: &mut Vec<Token>, pair: Pair) -> Result<bool, Error> {
    let Pair { loc, level, i1, e1, i2, e2 } = pair;
    let op2 = op_at(side, i2 - 1)?;
    let op1 = if i1 <= loc { Op::Times } else { op_at(side, i1 - 1)? };
    let one = [Token::constant(1, 1.0)];

    let mut i = first_power(side, i1, e1, level);
    let start2 = first_power(side, i2, e2, level);
    if i >= e1 || start2 >= e2 {
        return Ok(false);
    }
    if se_compare(cx, &side[i + 1..e1], &one).is_match() {
        return Ok(false);
    }

    // the whole exponents, then each factor of the exponents
    let factor_level = level + 1;
    let found = 'search: {
        let cmp = se_compare(cx, &side[i + 1..e1], &side[start2 + 1..e2]);
        if cmp.is_match() {
            break 'search Some((Op::Times, i + 1, e1, start2 + 1, e2, cmp));
        }
        loop {
            let pop1 = match op_at(side, i)? {
                Op::Power => Op::Times,
                op => op,
            };
            let b1 = i + 1;
            if b1 >= e1 {
                break 'search None;
            }
            i = factor_end(side, b1, e1, factor_level);
            if se_compare(cx, &side[b1..i], &one).is_match() {
                continue;
            }
            let mut j = start2;
            loop {
                let b2 = j + 1;
                if b2 >= e2 {
                    break;
                }
                j = factor_end(side, b2, e2, factor_level);
                let op = op_at(side, b2 - 1)?;
                let same_op = if op == Op::Power { pop1 == Op::Times } else { op == pop1 };
                if !same_op {
                    continue;
                }
                let cmp = se_compare(cx, &side[b1..i], &side[b2..j]);
                if cmp.is_match() {
                    break 'search Some((pop1, b1, i, b2, j, cmp));
                }
            }
        }
    };
    let Some((pop1, b1, i, b2, j, cmp)) = found else {
        return Ok(false);
    };

    let diff_sign = cmp.is_opposite() ^ (op2 == Op::Divide);
    let all_divide = op1 == Op::Divide && diff_sign;

    // (base1^rest1 * base2^rest2)^common
    let mut s = side[i1..b1].to_vec();
    s.push(Token::constant(level + 1, if !all_divide && op1 == Op::Divide { -1.0 } else { 1.0 }));
    s.extend_from_slice(&side[i..e1]);
    raise(&mut s, 2);
    s.push(Token::operator(level + 1, Op::Times));
    let k = s.len();
    s.extend_from_slice(&side[i2..b2]);
    s.push(Token::constant(level + 1, if !all_divide && diff_sign { -1.0 } else { 1.0 }));
    s.extend_from_slice(&side[j..e2]);
    raise(&mut s[k..], 2);
    s.push(Token::operator(level, Op::Power));
    if pop1 == Op::Divide {
        s.extend([Token::constant(level + 1, 1.0), Token::operator(level + 1, Op::Divide)]);
    }
    let k = s.len();
    s.extend_from_slice(&side[b1..i]);
    raise(&mut s[k..], 1);

    cx.check_len(side.len() + s.len() - (e1 - i1) - (e2 - i2 + 1))?;
    if !all_divide && op1 == Op::Divide {
        side[i1 - 1].set_op(Op::Times);
    }
    side.drain(i2 - 1..e2);
    side.splice(i1..e1, s);
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

    fn run(
        src: &str,
        pass: impl Fn(&mut Ctxt, &mut Vec<Token>) -> Result<bool, Error>,
    ) -> (bool, String) {
        let mut cx = Ctxt::default();
        let mut side = parse_side(&mut cx, src).unwrap();
        let changed = pass(&mut cx, &mut side).unwrap();
        assert!(is_well_formed(&side), "{:?}", side);
        elim_loop(&mut cx, &mut side).unwrap();
        (changed, display(&cx, &side))
    }

    fn plus(src: &str) -> (bool, String) {
        run(src, |cx, side| factor_plus(cx, side, None, 0.0))
    }

    #[test]
    fn common_factors() {
        assert_eq!(plus("a*c + b*c"), (true, "c*(a + b)".to_string()));
        assert_eq!(plus("a*c - b*c"), (true, "c*(a - b)".to_string()));
        assert_eq!(plus("a + b"), (false, "a + b".to_string()));
    }

    #[test]
    fn horner_factoring() {
        assert_eq!(plus("x^2 + x"), (true, "x*(x + 1)".to_string()));
        assert_eq!(plus("x^3 + x^2"), (true, "x^2*(x + 1)".to_string()));
    }

    #[test]
    fn variable_selection() {
        let x_only = |src: &str| {
            run(src, |cx, side| {
                let x = cx.vars.intern("x");
                factor_plus(cx, side, Some(x), 0.0)
            })
        };
        assert_eq!(x_only("a*x + b*x"), (true, "x*(a + b)".to_string()));
        assert_eq!(x_only("a*y + b*y").0, false);
        // no Horner factoring when a variable is given
        assert_eq!(x_only("x^2 + x").0, false);
    }

    #[test]
    fn common_denominators() {
        let divide = |src: &str| run(src, |cx, side| factor_divide(cx, side, None, 0.0));
        assert_eq!(divide("a/c + b/c"), (true, "(a + b)/c".to_string()));
        assert_eq!(divide("a*c + b*c").0, false);
    }

    #[test]
    fn like_terms() {
        assert_eq!(run("2*a + 3*a", subtract_itself), (true, "5*a".to_string()));
        assert_eq!(run("x - x", subtract_itself), (true, "0".to_string()));
        assert_eq!(run("a + b", subtract_itself).0, false);
    }

    #[test]
    fn common_bases() {
        assert_eq!(run("x*x", factor_times), (true, "x^2".to_string()));
        assert_eq!(run("a^2*a^3", factor_times), (true, "a^5".to_string()));
        assert_eq!(run("a*b", factor_times).0, false);
        assert_eq!(run("2*3", factor_times).0, false);
    }

    #[test]
    fn common_exponents() {
        assert_eq!(run("a^2*b^2", factor_power), (true, "(a*b)^2".to_string()));
        assert_eq!(run("a^x*b^x", factor_power), (true, "(a*b)^x".to_string()));
        assert_eq!(run("a^2*b^3", factor_power).0, false);
    }
}
