//! Algebraic expansion: the inverse of factoring.
//!
//! Every expansion is done by [`sub_ufactor`], which rewrites the operand around each operator of
//! a kind selected by an [`Expansion`] mode. The public passes combine it with [`organize`] and the
//! quick simplifiers.

use crate::{
    ctxt::Ctxt,
    error::Error,
    fractions::group_proc,
    simplify::{order::reorder, organize::organize, simp_loop},
    token::{Op, Token},
};

/// What [`sub_ufactor`] expands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expansion {
    /// Both power expansions: [`Expansion::PowerOfProduct`] and [`Expansion::PowerOfSum`].
    AllPowers,

    /// Products and quotients of sums: `(a + b)*c -> a*c + b*c`.
    Times,

    /// Powers of products: `(a*b)^c -> a^c*b^c`.
    PowerOfProduct,

    /// Powers with additive exponents: `a^(b + c) -> a^b*a^c`.
    PowerOfSum,

    /// Constant powers, when it helps expansion: `(a + 1)^2 -> (a + 1)*(a + 1)`.
    Repeat,

    /// Every constant power greater than one: `a^2 -> a*a`.
    RepeatAlways,
}

impl Expansion {
    fn expands(self, op: Op) -> bool {
        match op {
            Op::Times | Op::Divide => self == Expansion::Times,
            Op::Power => self != Expansion::Times,
            _ => false,
        }
    }

    fn power_of_product(self) -> bool {
        matches!(self, Expansion::AllPowers | Expansion::PowerOfProduct)
    }

    fn power_of_sum(self) -> bool {
        matches!(self, Expansion::AllPowers | Expansion::PowerOfSum)
    }
}

/// Expands products of sums only, then simplifies with [`simp_loop`] until nothing more expands.
/// Returns true if anything was expanded.
pub fn uf_tsimp(cx: &mut Ctxt, side: &mut Vec<Token>) -> Result<bool, Error> {
    let mut rv = uf_times(cx, side)?;
    simp_loop(cx, side)?;
    while uf_times(cx, side)? {
        rv = true;
        simp_loop(cx, side)?;
    }
    Ok(rv)
}

/// Runs one expansion pass of the given mode, then organizes.
fn expand_once(cx: &mut Ctxt, side: &mut Vec<Token>, mode: Expansion) -> Result<bool, Error> {
    organize(side)?;
    let rv = sub_ufactor(cx, side, mode)?;
    if rv {
        organize(side)?;
    }
    Ok(rv)
}

/// Expands powers of products: `(a*b)^c -> a^c*b^c`.
pub fn uf_power(cx: &mut Ctxt, side: &mut Vec<Token>) -> Result<bool, Error> {
    expand_once(cx, side, Expansion::PowerOfProduct)
}

/// Expands powers with additive exponents: `a^(b + c) -> a^b*a^c`.
pub fn uf_pplus(cx: &mut Ctxt, side: &mut Vec<Token>) -> Result<bool, Error> {
    expand_once(cx, side, Expansion::PowerOfSum)
}

/// Expands every power operator, like [`uf_power`] and [`uf_pplus`] together, until nothing
/// changes.
pub fn uf_allpower(cx: &mut Ctxt, side: &mut Vec<Token>) -> Result<(), Error> {
    loop {
        organize(side)?;
        if !sub_ufactor(cx, side, Expansion::AllPowers)? {
            return Ok(());
        }
    }
}

/// Expands constant powers of sums into repeated products when it helps expansion and the
/// exponent is at most 100, then simplifies division by irrational constants with
/// [`patch_root_div`].
///
/// [`uf_times`] usually follows to finish the expansion.
pub fn uf_repeat(cx: &mut Ctxt, side: &mut Vec<Token>) -> Result<bool, Error> {
    let rv = expand_once(cx, side, Expansion::Repeat)?;
    patch_root_div(cx, side)?;
    Ok(rv)
}

/// Expands every constant power greater than one into a repeated product: `a^2 -> a*a`.
pub fn uf_repeat_always(cx: &mut Ctxt, side: &mut Vec<Token>) -> Result<bool, Error> {
    expand_once(cx, side, Expansion::RepeatAlways)
}

/// Expands a side completely and simplifies it.
pub fn uf_simp(cx: &mut Ctxt, side: &mut Vec<Token>) -> Result<(), Error> {
    uf_tsimp(cx, side)?;
    uf_power(cx, side)?;
    uf_repeat(cx, side)?;
    uf_tsimp(cx, side)?;
    Ok(())
}

/// Like [`uf_simp`], without expanding powers of sums.
pub fn uf_simp_no_repeat(cx: &mut Ctxt, side: &mut Vec<Token>) -> Result<(), Error> {
    uf_power(cx, side)?;
    uf_tsimp(cx, side)?;
    Ok(())
}

/// Expands a side completely, without simplifying. Returns true if a product of sums was expanded.
pub fn ufactor(cx: &mut Ctxt, side: &mut Vec<Token>) -> Result<bool, Error> {
    uf_repeat(cx, side)?;
    let rv = uf_times(cx, side)?;
    uf_allpower(cx, side)?;
    Ok(rv)
}

/// Raises the numerator of every division by two levels, so that it is not distributed over.
fn no_divide(side: &mut [Token]) {
    for i in (1..side.len()).step_by(2) {
        if side[i].is_op(Op::Divide) {
            let level = side[i].level;
            for t in side[..i].iter_mut().rev() {
                if t.level < level {
                    break;
                }
                t.level += 2;
            }
        }
    }
}

/// Expands products and quotients of sums: `(a + b)*c -> a*c + b*c`.
///
/// With the `partial` option, sums are not distributed over division: `(a + b)/c` stays as it is.
pub fn uf_times(cx: &mut Ctxt, side: &mut Vec<Token>) -> Result<bool, Error> {
    let mut rv = false;
    loop {
        organize(side)?;
        if reorder(side)? {
            organize(side)?;
        }
        group_proc(side);
        if cx.config.partial {
            no_divide(side);
        }
        if !sub_ufactor(cx, side, Expansion::Times)? {
            break;
        }
        rv = true;
    }
    organize(side)?;
    Ok(rv)
}

/// The general expansion routine: expands the operand of every operator selected by `mode`.
/// Returns true if anything was expanded.
pub fn sub_ufactor(cx: &mut Ctxt, side: &mut Vec<Token>, mode: Expansion) -> Result<bool, Error> {
    let mut modified = false;
    let mut i = 1;
    while i < side.len() {
        if !side[i].op().map_or(false, |op| mode.expands(op)) {
            i += 2;
            continue;
        }
        let level = side[i].level;
        let mut b1 = i - 1;
        while b1 >= 2 && side[b1 - 1].level >= level {
            b1 -= 2;
        }
        let mut e1 = i + 2;
        while e1 < side.len() && side[e1].level >= level {
            e1 += 2;
        }
        if unf_sub(cx, side, b1, i, e1, level, mode)? {
            modified = true;
            i = b1 + 1;
            continue;
        }
        i += 2;
    }
    Ok(modified)
}

/// Returns the index of the next operator at `level` in `start..end`, or `end`.
fn next_op_at(side: &[Token], start: usize, end: usize, level: i32) -> usize {
    (start..end).step_by(2).find(|&k| side[k].level == level).unwrap_or(end)
}

/// Copies `tokens` into `out`, raising their levels by `by`.
fn extend_raised(out: &mut Vec<Token>, tokens: &[Token], by: i32) {
    out.extend(tokens.iter().map(|t| Token { level: t.level + by, ..*t }));
}

/// Expands the operand `b1..e1` around the operator at `loc`.
fn unf_sub(
    cx: &mut Ctxt,
    side: &mut Vec<Token>,
    b1: usize,
    loc: usize,
    e1: usize,
    level: i32,
    mode: Expansion,
) -> Result<bool, Error> {
    let Some(op) = side[loc].op() else {
        return Err(Error::Bug("operator expected while expanding"));
    };
    match op {
        Op::Times | Op::Divide => {
            let mut i = b1 + 1;
            while i < e1 {
                if side[i].level != level + 1 || !side[i].op().map_or(false, Op::is_additive) {
                    i += 2;
                    continue;
                }
                // the sum around `i` spans `b2..be1`
                let mut b2 = b1;
                let mut j = i;
                while j >= b1 + 2 {
                    j -= 2;
                    if side[j].level <= level {
                        b2 = j + 1;
                        break;
                    }
                }
                let eb1 = b2;
                let be1 = (i + 2..e1).step_by(2).find(|&k| side[k].level <= level).unwrap_or(e1);
                if eb1 > b1 && side[eb1 - 1].is_op(Op::Divide) {
                    i = be1;
                    continue;
                }

                // one copy of the whole product for each term of the sum
                let mut out = Vec::new();
                let mut b2 = b2;
                loop {
                    cx.check_len(out.len() + (eb1 - b1) + (i - b2) + (e1 - be1) + 1)?;
                    extend_raised(&mut out, &side[b1..eb1], 1);
                    out.extend_from_slice(&side[b2..i]);
                    extend_raised(&mut out, &side[be1..e1], 1);
                    if i >= be1 {
                        break;
                    }
                    out.push(Token { level: side[i].level - 1, ..side[i] });
                    b2 = i + 1;
                    i = next_op_at(side, i + 2, be1, level + 1);
                }
                cx.check_len(side.len() - (e1 - b1) + out.len())?;
                side.splice(b1..e1, out);
                return Ok(true);
            }
            Ok(false)
        },
        Op::Power => {
            if is_absolute_value(side, loc, level) {
                return Ok(false);
            }
            if mode.power_of_product() {
                let first = next_op_at(side, b1 + 1, loc, level + 1);
                if first < loc && side[first].op().map_or(false, Op::is_multiplicative) {
                    // each factor of the base gets its own copy of the exponent
                    let mut out = Vec::new();
                    let mut b2 = b1;
                    let mut i = first;
                    loop {
                        cx.check_len(out.len() + (i - b2) + (e1 - loc) + 1)?;
                        out.extend_from_slice(&side[b2..i]);
                        extend_raised(&mut out, &side[loc..e1], 1);
                        if i >= loc {
                            break;
                        }
                        out.push(Token { level: side[i].level - 1, ..side[i] });
                        b2 = i + 1;
                        i = next_op_at(side, i + 2, loc, level + 1);
                    }
                    cx.check_len(side.len() - (e1 - b1) + out.len())?;
                    side.splice(b1..e1, out);
                    return Ok(true);
                }
            }
            if mode.power_of_sum() {
                let first = next_op_at(side, loc + 2, e1, level + 1);
                if first < e1 && side[first].op().map_or(false, Op::is_additive) {
                    // the base is raised to each term of the exponent
                    let mut out = Vec::new();
                    let mut b2 = loc + 1;
                    let mut i = first;
                    loop {
                        cx.check_len(out.len() + (loc - b1) + (i - b2) + 2)?;
                        extend_raised(&mut out, &side[b1..=loc], 1);
                        out.extend_from_slice(&side[b2..i]);
                        if i >= e1 {
                            break;
                        }
                        let op = if side[i].is_op(Op::Plus) { Op::Times } else { Op::Divide };
                        out.push(Token::operator(level, op));
                        b2 = i + 1;
                        i = next_op_at(side, i + 2, e1, level + 1);
                    }
                    cx.check_len(side.len() - (e1 - b1) + out.len())?;
                    side.splice(b1..e1, out);
                    return Ok(true);
                }
            }
            if !matches!(mode, Expansion::Repeat | Expansion::RepeatAlways) {
                return Ok(false);
            }
            expand_repeat(cx, side, b1, loc, e1, level, mode == Expansion::RepeatAlways)
        },
        _ => Ok(false),
    }
}

/// Returns true if the power at `loc` is the inner power of an absolute value, `(x^k1)^k2`, which
/// must not be expanded.
fn is_absolute_value(side: &[Token], loc: usize, level: i32) -> bool {
    let at = |k: usize| side.get(k);
    let const_at = |k: usize, l: i32| at(k).map_or(false, |t| t.level == l && t.is_constant());
    if loc + 3 >= side.len() || !const_at(loc + 1, level) {
        return false;
    }
    if !(side[loc + 2].level == level - 1 && side[loc + 2].is_op(Op::Power) && side[loc + 3].is_constant()) {
        return false;
    }
    if side[loc + 3].level == level - 1 {
        return true;
    }
    side[loc + 3].level == level
        && loc + 5 < side.len()
        && side[loc + 4].level == level
        && side[loc + 4].is_op(Op::Divide)
        && const_at(loc + 5, level)
        && (loc + 6 >= side.len() || side[loc + 6].level < level)
}

/// Expands a constant power into a repeated product: `(a + 1)^3 -> (a + 1)*(a + 1)*(a + 1)`.
///
/// Unless `always`, only expansions that help are done: the exponent is at most 100, a lone base
/// must be a constant, and fractional exponents above 2 are left alone. An expansion that would
/// come close to the capacity of the side is skipped.
fn expand_repeat(
    cx: &mut Ctxt,
    side: &mut Vec<Token>,
    b1: usize,
    loc: usize,
    e1: usize,
    level: i32,
    always: bool,
) -> Result<bool, Error> {
    let exponent = side[loc + 1];
    let Some(d1) = exponent.as_constant().filter(|_| exponent.level == level) else {
        return Ok(false);
    };
    if !d1.is_finite() || d1 <= 1.0 {
        return Ok(false);
    }
    let base_len = loc - b1;
    if !always {
        if d1 > 100.0
            || (base_len == 1 && !side[b1].is_constant())
            || (base_len > 1 && d1 > 2.0 && d1 % 1.0 != 0.0)
        {
            return Ok(false);
        }
    }
    let copies = d1.ceil() - 1.0;
    let grow = copies * (base_len as f64 + 1.0);
    if side.len() as f64 + grow > cx.n_tokens() as f64 - 10.0 {
        log::debug!("power too big to expand");
        return Ok(false);
    }

    let base = side[b1..loc].to_vec();
    let mut tail = Vec::with_capacity(grow as usize);
    for _ in 0..copies as usize {
        tail.push(Token::operator(level, Op::Times));
        tail.extend_from_slice(&base);
    }
    side.splice(e1..e1, tail);
    let remaining = d1 - copies;
    side[loc + 1].set_constant(remaining);
    if remaining == 1.0 {
        side.drain(loc..e1);
    } else {
        for t in &mut side[b1..e1] {
            t.level += 1;
        }
    }
    Ok(true)
}

/// Turns the division `a/x^y` into `a*x^(-1*y)`, for the power at `i`.
fn usp_sub(cx: &mut Ctxt, side: &mut Vec<Token>, i: usize) -> Result<bool, Error> {
    let level = side[i].level;
    let mut j = i;
    loop {
        if j < 3 {
            return Ok(false);
        }
        j -= 2;
        if side[j].level < level {
            if side[j].level == level - 1 && side[j].is_op(Op::Divide) {
                break;
            }
            return Ok(false);
        }
    }
    cx.check_len(side.len() + 2)?;
    side[j].set_op(Op::Times);
    for t in side[i + 1..].iter_mut() {
        if t.level < level {
            break;
        }
        t.level += 1;
    }
    side.splice(i + 1..i + 1, [
        Token::constant(level + 1, -1.0),
        Token::operator(level + 1, Op::Times),
    ]);
    Ok(true)
}

/// Converts `a/x^y` to `a*x^(-1*y)`, unless `y` is a constant.
pub fn unsimp_power(cx: &mut Ctxt, side: &mut Vec<Token>) -> Result<bool, Error> {
    let mut modified = false;
    let mut i = 1;
    while i < side.len() {
        if side[i].is_op(Op::Power) && !(side[i + 1].level == side[i].level && side[i + 1].is_constant()) {
            modified |= usp_sub(cx, side, i)?;
        }
        i += 2;
    }
    Ok(modified)
}

/// Rewrites every product with a negative constant as a positive constant divided by `-1`:
/// `-2*x -> 2/-1*x`.
///
/// A following [`uf_times`] then tries to negate the additive denominators, which can remove
/// unneeded factors of `-1`.
pub fn uf_neg_help(cx: &mut Ctxt, side: &mut Vec<Token>) -> Result<(), Error> {
    let mut i = 0;
    while i + 1 < side.len() {
        if let Some(d) = side[i].as_constant().filter(|&d| d < 0.0) {
            let level = side[i].level;
            if side[i + 1].level == level && side[i + 1].op().map_or(false, Op::is_multiplicative) {
                cx.check_len(side.len() + 2)?;
                side[i].set_constant(-d);
                side.splice(i + 1..i + 1, [
                    Token::operator(level, Op::Divide),
                    Token::constant(level, -1.0),
                ]);
                i += 2;
            }
        }
        i += 2;
    }
    Ok(())
}

/// Simplifies division by irrational constants: `1/k1^k2` becomes `1/k1/k1^(k2 - 1)` if `k1` is an
/// integer, otherwise `1*(1/k1)^k2`.
///
/// The integer case is only done when rationalizing denominators and `0 < k2 < 1`.
pub fn patch_root_div(cx: &mut Ctxt, side: &mut Vec<Token>) -> Result<bool, Error> {
    let mut modified = false;
    let mut i = 1;
    while i + 2 < side.len() {
        if !side[i].is_op(Op::Divide) {
            i += 2;
            continue;
        }
        let level = side[i].level + 1;
        let (base, exponent) = (side[i + 1], side[i + 3]);
        let (Some(k1), Some(k2)) = (base.as_constant(), exponent.as_constant()) else {
            i += 2;
            continue;
        };
        if !(side[i + 2].is_op(Op::Power) && side[i + 2].level == level && exponent.level == level) {
            i += 2;
            continue;
        }
        if k1 % 1.0 == 0.0 {
            if !cx.config.rationalize_denominators || !k2.is_finite() || k2 <= 0.0 || k2 >= 1.0 {
                i += 2;
                continue;
            }
            cx.check_len(side.len() + 2)?;
            side[i + 3].set_constant(k2 - 1.0);
            side.splice(i..i, [
                Token::operator(level - 1, Op::Divide),
                Token::constant(level - 1, k1),
            ]);
            i += 2;
        } else {
            side[i].set_op(Op::Times);
            side[i + 1].set_constant(1.0 / k1);
        }
        modified = true;
        i += 2;
    }
    Ok(modified)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use crate::token::{fmt::display, from_ast::parse_side, side::is_well_formed};
    use super::*;

    fn expand(src: &str, pass: impl Fn(&mut Ctxt, &mut Vec<Token>) -> Result<bool, Error>) -> String {
        let mut cx = Ctxt::default();
        let mut side = parse_side(&mut cx, src).unwrap();
        pass(&mut cx, &mut side).unwrap();
        assert!(is_well_formed(&side), "{:?}", side);
        organize(&mut side).unwrap();
        display(&cx, &side)
    }

    #[test]
    fn products_of_sums() {
        let mut cx = Ctxt::default();
        let mut side = parse_side(&mut cx, "(a + b)*c").unwrap();
        assert!(sub_ufactor(&mut cx, &mut side, Expansion::Times).unwrap());
        organize(&mut side).unwrap();
        assert_eq!(display(&cx, &side), "a*c + b*c");

        assert_eq!(expand("(a - b)*(c + d)", uf_times), "a*c + a*d - b*c - b*d");
    }

    #[test]
    fn partial_expansion_keeps_fractions() {
        let mut cx = Ctxt::default();
        let mut side = parse_side(&mut cx, "(a + b)/c").unwrap();
        assert!(!uf_times(&mut cx, &mut side).unwrap());

        cx.config.partial = false;
        assert!(uf_times(&mut cx, &mut side).unwrap());
        assert_eq!(display(&cx, &side), "a/c + b/c");
    }

    #[test]
    fn powers_of_products() {
        assert_eq!(expand("(a*b)^c", uf_power), "a^c*b^c");
        assert_eq!(expand("(a/b)^2", uf_power), "a^2/b^2");
        assert_eq!(expand("a^(b + c)", uf_pplus), "a^b*a^c");
        assert_eq!(expand("a^(b - c)", uf_pplus), "a^b/a^c");
    }

    #[test]
    fn repeated_products() {
        assert_eq!(expand("(a + 1)^3", uf_repeat), "(a + 1)*(a + 1)*(a + 1)");
        assert_eq!(expand("x^3", uf_repeat), "x^3");
        assert_eq!(expand("x^3", uf_repeat_always), "x*x*x");
        assert_eq!(expand("(a + 1)^2.5", uf_repeat), "(a + 1)^2.5");
    }

    #[test]
    fn absolute_values_are_not_expanded() {
        assert_eq!(expand("((a*b)^2)^0.5", uf_power), "((a*b)^2)^0.5");
    }

    #[test]
    fn huge_powers_are_left_alone() {
        let mut cx = Ctxt::with_capacity(100);
        let mut side = parse_side(&mut cx, "(a + b + c + d + e + f)^50").unwrap();
        let before = side.clone();
        assert!(!uf_repeat_always(&mut cx, &mut side).unwrap());
        assert_eq!(side, before);
    }

    #[test]
    fn full_expansion_overflows() {
        let mut cx = Ctxt::with_capacity(200);
        let mut side = parse_side(&mut cx, "(a + b + c + d + e + f + g + h)^6").unwrap();
        assert_eq!(uf_simp(&mut cx, &mut side), Err(Error::TooLarge));
    }

    #[test]
    fn negative_powers() {
        assert_eq!(expand("a/x^y", unsimp_power), "a*x^(-1*y)");
        assert_eq!(expand("a/x^2", unsimp_power), "a/x^2");
    }

    #[test]
    fn negative_constants_move_to_denominators() {
        let mut cx = Ctxt::default();
        let mut side = parse_side(&mut cx, "-2*x").unwrap();
        uf_neg_help(&mut cx, &mut side).unwrap();
        assert_eq!(display(&cx, &side), "2/-1*x");
    }

    #[test]
    fn division_by_roots() {
        assert_eq!(expand("1/2^0.5", patch_root_div), "1/2/2^-0.5");
        assert_eq!(expand("1/0.5^0.5", patch_root_div), "1*2^0.5");
    }

    #[test]
    fn expansion_simplifies() {
        let mut cx = Ctxt::default();
        let mut side = parse_side(&mut cx, "(x + 1)^2").unwrap();
        uf_simp(&mut cx, &mut side).unwrap();
        assert_eq!(display(&cx, &side), "x^2 + 2*x + 1");
    }
}
