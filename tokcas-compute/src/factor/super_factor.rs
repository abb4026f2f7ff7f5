//! Combining algebraic fractions over a common denominator: `a/b + c/d + f` becomes
//! `(a*d + c*b + b*d*f)/(b*d)`. The result is always equivalent to the input.

use crate::{
    ctxt::Ctxt,
    error::Error,
    fractions::group_proc,
    poly::{div::raised, gcd::cancel_gcd},
    simplify::organize::organize,
    token::{side::exp_is_absolute, Op, Token},
};

/// Puts added fractions over a common denominator. `start_flag` selects how eagerly:
///
/// - `0`: only fractions nested inside other fractions are combined, so complex fractions become
///   simple ones. Fractions added at the top level stay as they are.
/// - `1`: every sum of fractions is combined, no matter the denominators. This always gives a
///   single simple fraction, though it can be large.
/// - `2`: like `1`, but the polynomial GCD of the two denominators is found and cancelled first.
///   Denominators with absolute values are left alone.
/// - `3`: like `2`, but denominators with absolute values are combined too.
///
/// Returns true if the side was modified.
pub fn super_factor(cx: &mut Ctxt, side: &mut Vec<Token>, start_flag: u8) -> Result<bool, Error> {
    group_proc(side);
    let modified = sf_recurse(cx, side, 0, 1, start_flag)?;
    organize(side)?;
    Ok(modified)
}

/// Returns the end of the operand starting at `start`, whose operators are all deeper than
/// `level`.
fn operand_end(side: &[Token], start: usize, level: i32) -> usize {
    let mut k = start + 1;
    while k < side.len() && side[k].level > level {
        k += 2;
    }
    k.min(side.len())
}

fn sf_recurse(cx: &mut Ctxt, side: &mut Vec<Token>, loc: usize, level: i32, start_flag: u8) -> Result<bool, Error> {
    let mut start_flag = start_flag;
    if start_flag == 0 {
        let mut i = loc + 1;
        while i < side.len() && side[i].level >= level {
            if side[i].level == level && side[i].is_op(Op::Divide) {
                start_flag = 1;
                break;
            }
            i += 2;
        }
    }

    let mut modified = false;
    let mut op = None;
    let mut i = loc;
    while i < side.len() && side[i].level >= level {
        if side[i].level > level {
            modified |= sf_recurse(cx, side, i, level + 1, start_flag)?;
            i += 1;
            while i < side.len() && side[i].level > level {
                i += 2;
            }
            continue;
        }
        if let Some(o) = side[i].op() {
            op = Some(o);
        }
        i += 1;
    }
    if modified || start_flag == 0 || !op.map_or(false, Op::is_additive) {
        return Ok(modified);
    }

    // combine the first term with each later one, starting over after every success
    'again: loop {
        let e1 = operand_end(side, loc, level);
        let mut j = e1 + 1;
        while j < side.len() && side[j - 1].level >= level {
            let e2 = operand_end(side, j, level);
            if sf_sub(cx, side, loc, loc..e1, j..e2, level + 1, start_flag)? {
                modified = true;
                continue 'again;
            }
            j = e2 + 1;
        }
        return Ok(modified);
    }
}

/// A term of a sum, split around its division operator, if any.
struct Term {
    /// The tokens before the `/`.
    numerator: std::ops::Range<usize>,

    /// The denominator operand, empty if there is no `/`.
    denominator: std::ops::Range<usize>,

    /// The factors following the denominator.
    rest: std::ops::Range<usize>,
}

impl Term {
    fn split(side: &[Token], range: std::ops::Range<usize>, level: i32) -> Self {
        let mut i = range.start + 1;
        while i < range.end && !(side[i].level == level && side[i].is_op(Op::Divide)) {
            i += 2;
        }
        if i >= range.end {
            return Term { numerator: range.clone(), denominator: range.end..range.end, rest: range.end..range.end };
        }
        let mut k = i + 2;
        while k < range.end && side[k].level > level {
            k += 2;
        }
        let k = k.min(range.end);
        Term { numerator: range.start..i, denominator: i + 1..k, rest: k..range.end }
    }

    fn is_fraction(&self) -> bool {
        !self.denominator.is_empty()
    }
}

/// Appends `tokens` raised by `by`.
fn push_raised(out: &mut Vec<Token>, tokens: &[Token], by: i32) {
    out.extend(raised(tokens, by));
}

/// Builds one side of the new numerator: the term without its denominator, times `other`, which
/// is the other term's denominator (or what's left of it after cancelling the GCD).
fn cross_multiply(
    out: &mut Vec<Token>,
    side: &[Token],
    term: &Term,
    negate: bool,
    other: Option<&[Token]>,
    level: i32,
) {
    let start = out.len();
    if term.is_fraction() {
        out.extend_from_slice(&side[term.numerator.clone()]);
    } else {
        // the whole term becomes one factor
        push_raised(out, &side[term.numerator.clone()], 1);
    }
    if negate {
        out.push(Token::operator(level, Op::Times));
        out.push(Token::constant(level, -1.0));
    }
    out.extend_from_slice(&side[term.rest.clone()]);
    if let Some(other) = other {
        out.push(Token::operator(level, Op::Times));
        out.extend_from_slice(other);
    }
    for t in &mut out[start..] {
        t.level += 2;
    }
}

/// Adds the sum terms `side[t1]` and `side[t2]`, where `level` is one deeper than the sum's
/// operators, if either is a fraction. The result replaces the first term.
fn sf_sub(
    cx: &mut Ctxt,
    side: &mut Vec<Token>,
    loc: usize,
    t1: std::ops::Range<usize>,
    t2: std::ops::Range<usize>,
    level: i32,
    start_flag: u8,
) -> Result<bool, Error> {
    let op1 = if t1.start <= loc {
        Op::Plus
    } else {
        side[t1.start - 1].op().ok_or(Error::Bug("operator expected before a term"))?
    };
    let op2 = side[t2.start - 1].op().ok_or(Error::Bug("operator expected before a term"))?;

    let a = Term::split(side, t1.clone(), level);
    let b = Term::split(side, t2.clone(), level);
    if !a.is_fraction() && !b.is_fraction() {
        return Ok(false);
    }
    if start_flag == 2
        && [&a, &b].iter().any(|t| t.is_fraction() && exp_is_absolute(&side[t.denominator.clone()]))
    {
        return Ok(false);
    }

    let d1 = side[a.denominator.clone()].to_vec();
    let d2 = side[b.denominator.clone()].to_vec();

    // the denominators divided by their GCD, based at `level + 1`
    let mut reduced = None;
    if start_flag >= 2 && a.is_fraction() && b.is_fraction() {
        log::trace!("looking for a polynomial gcd between 2 denominators");
        if let Some((p1, p2)) = cancel_gcd(cx, &d1, &d2)? {
            log::debug!("found a polynomial gcd between 2 denominators");
            let p1 = raised(&p1, level).collect::<Vec<_>>();
            let p2 = raised(&p2, level).collect::<Vec<_>>();
            reduced = Some((p1, p2));
        }
    }

    let mut tokens = Vec::new();
    match &reduced {
        Some((p1, p2)) => {
            cross_multiply(&mut tokens, side, &a, op1 == Op::Minus, Some(p2), level);
            tokens.push(Token::operator(level + 1, op2));
            cross_multiply(&mut tokens, side, &b, false, Some(p1), level);
        },
        None => {
            cx.check_len(t1.len() + t2.len() + d1.len() + d2.len() + 8)?;
            cross_multiply(&mut tokens, side, &a, op1 == Op::Minus, b.is_fraction().then_some(&d2[..]), level);
            tokens.push(Token::operator(level + 1, op2));
            cross_multiply(&mut tokens, side, &b, false, a.is_fraction().then_some(&d1[..]), level);
        },
    }

    tokens.push(Token::operator(level, Op::Divide));
    let start = tokens.len();
    match &reduced {
        Some((_, p2)) => {
            tokens.extend_from_slice(&d1);
            tokens.push(Token::operator(level, Op::Times));
            tokens.extend_from_slice(p2);
        },
        None => {
            tokens.extend_from_slice(&d1);
            if a.is_fraction() && b.is_fraction() {
                tokens.push(Token::operator(level, Op::Times));
            }
            tokens.extend_from_slice(&d2);
        },
    }
    for t in &mut tokens[start..] {
        t.level += 1;
    }

    cx.check_len(side.len() + tokens.len() - t1.len() - (t2.len() + 1))?;
    if op1 == Op::Minus {
        side[t1.start - 1].set_op(Op::Plus);
    }
    side.drain(t2.start - 1..t2.end);
    side.splice(t1, tokens);
    Ok(true)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use crate::token::{fmt::display, from_ast::parse_side, side::is_well_formed};
    use super::*;

    fn combined(src: &str, start_flag: u8) -> (bool, String) {
        let mut cx = Ctxt::default();
        let mut side = parse_side(&mut cx, src).unwrap();
        let modified = super_factor(&mut cx, &mut side, start_flag).unwrap();
        assert!(is_well_formed(&side), "{:?}", side);
        (modified, display(&cx, &side))
    }

    #[test]
    fn common_denominator() {
        let (modified, shown) = combined("a/b + c/d", 1);
        assert!(modified);
        assert_eq!(shown, "(a*d + c*b)/(b*d)");
    }

    #[test]
    fn term_without_denominator() {
        let (modified, shown) = combined("a/b + c", 1);
        assert!(modified);
        assert_eq!(shown, "(a + c*b)/b");
    }

    #[test]
    fn subtracted_term() {
        assert_eq!(combined("x - a/b", 1), (true, "(x*b - a)/b".to_string()));
    }

    #[test]
    fn top_level_sums_need_a_start_flag() {
        assert_eq!(combined("a/b + c/d", 0).0, false);

        // nested in a fraction, they are combined anyway
        let (modified, shown) = combined("1/(a/b + c)", 0);
        assert!(modified);
        assert_eq!(shown.matches('/').count(), 2);
    }

    #[test]
    fn no_fractions() {
        assert_eq!(combined("a + b*c", 3), (false, "a + b*c".to_string()));
    }

    #[test]
    fn common_factor_is_cancelled() {
        let mut cx = Ctxt::default();
        let mut side = parse_side(&mut cx, "1/(x^2 - 1) + 1/(x + 1)").unwrap();
        assert!(super_factor(&mut cx, &mut side, 2).unwrap());
        assert!(is_well_formed(&side));

        // the denominator is (x^2 - 1)*1, not (x^2 - 1)*(x + 1)
        let shown = display(&cx, &side);
        assert!(!shown.contains("(x + 1)"), "{}", shown);
    }
}
