//! Polynomial factoring.
//!
//! Two methods are tried on every sum with at least two additive operators. Repeated factors are
//! found with the GCD of the polynomial and its derivative times the base variable, and symbolic
//! factors are found by grouping the terms with the greatest power of each variable. A factoring
//! is kept only if it does not make the expression much larger.
//!
//! A sum of two terms has no repeated or grouped factors, but may be a difference of squares,
//! `a^2 - b^2 -> (a - b)*(a + b)`.

use crate::{
    calculus::differentiate,
    ctxt::Ctxt,
    error::Error,
    factor::factor_plus,
    simplify::simp_loop,
    numeric::f_to_fraction,
    token::{fmt::display, side::{level1_plus_count, min_level}, Op, Token, Var},
    unfactor::{uf_simp, uf_simp_no_repeat},
};
use super::{div::raised, find_greatest_power, poly_gcd, poly_in_v, var_counts, TermPlace};

/// Factors the polynomials in a side, including differences of squares. With `do_repeat`,
/// repeated factors are factored too.
///
/// Returns true if the side was modified.
pub fn poly_factor(cx: &mut Ctxt, side: &mut Vec<Token>, do_repeat: bool) -> Result<bool, Error> {
    pf_recurse(cx, side, 0, 1, do_repeat, true)
}

/// Like [`poly_factor`], but leaves sums of two terms alone, so that `x^2 - 1` stays expanded.
/// This is the factoring the simplifiers use.
pub fn poly_factor_no_squares(cx: &mut Ctxt, side: &mut Vec<Token>, do_repeat: bool) -> Result<bool, Error> {
    pf_recurse(cx, side, 0, 1, do_repeat, false)
}

fn pf_recurse(
    cx: &mut Ctxt,
    side: &mut Vec<Token>,
    loc: usize,
    level: i32,
    do_repeat: bool,
    squares: bool,
) -> Result<bool, Error> {
    let mut count = 0;
    let mut level_count = 0;
    let mut i = loc + 1;
    while i < side.len() && side[i].level >= level {
        if side[i].op().map_or(false, Op::is_additive) {
            count += 1;
            if side[i].level == level {
                level_count += 1;
            }
        }
        i += 2;
    }

    let mut modified = false;
    if level_count > 0 && count > 1 {
        modified = pf_sub(cx, side, loc, i.min(side.len()) - loc, level, do_repeat)?;
    } else if squares && level_count == 1 && count == 1 {
        modified = factor_squares(cx, side, loc, i.min(side.len()) - loc, level)?;
    }

    let mut i = loc;
    while i < side.len() && side[i].level >= level {
        if side[i].level > level {
            modified |= pf_recurse(cx, side, i, level + 1, do_repeat, squares)?;
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

/// Returns the square root of a term that is a perfect square: a positive rational constant whose
/// numerator and denominator are squares, a power with an even exponent, or a product or quotient
/// of those. The root keeps the levels of the term.
fn square_root(term: &[Token]) -> Option<Vec<Token>> {
    if term.len() == 1 {
        let d = term[0].as_constant().filter(|&d| d > 0.0)?;
        let (numerator, denominator) = f_to_fraction(d)?;
        let (n, m) = (numerator.sqrt(), denominator.sqrt());
        if n.fract() != 0.0 || m.fract() != 0.0 {
            return None;
        }
        return Some(vec![Token::constant(term[0].level, n / m)]);
    }

    let level = min_level(term);
    let ops = (1..term.len()).step_by(2).filter(|&i| term[i].level == level).collect::<Vec<_>>();
    match term[*ops.first()?].op()? {
        Op::Power => {
            let &[p] = ops.as_slice() else {
                return None;
            };
            if p + 2 != term.len() {
                return None;
            }
            let k = term[p + 1].as_constant().filter(|&k| k > 0.0 && k % 2.0 == 0.0)?;
            let mut root = term[..p].to_vec();
            if k != 2.0 {
                root.push(Token::operator(level, Op::Power));
                root.push(Token::constant(level, k / 2.0));
            }
            Some(root)
        },
        Op::Times | Op::Divide => {
            let mut root = Vec::with_capacity(term.len());
            let mut start = 0;
            for i in ops.iter().copied().chain(std::iter::once(term.len())) {
                root.extend(square_root(&term[start..i])?);
                if let Some(&op) = term.get(i) {
                    if !op.is_op(Op::Times) && !op.is_op(Op::Divide) {
                        return None;
                    }
                    root.push(op);
                }
                start = i + 1;
            }
            Some(root)
        },
        _ => None,
    }
}

/// Factors the sum of two terms `side[loc..loc + len]` if it is a difference of squares.
fn factor_squares(cx: &Ctxt, side: &mut Vec<Token>, loc: usize, len: usize, level: i32) -> Result<bool, Error> {
    let end = loc + len;
    let Some(op) = (loc + 1..end).step_by(2).find(|&i| side[i].level == level) else {
        return Ok(false);
    };
    let (first, second) = (&side[loc..op], &side[op + 1..end]);
    let negative = |p: &[Token]| p.len() == 1 && p[0].as_constant().map_or(false, |d| d < 0.0);
    let negated = |p: &[Token]| [Token::constant(p[0].level, -p[0].as_constant().unwrap_or_default())];

    // -1 + x^2 is x^2 - 1
    let roots = match side[op].op() {
        Some(Op::Minus) => square_root(first).zip(square_root(second)),
        Some(Op::Plus) if negative(second) => square_root(first).zip(square_root(&negated(second))),
        Some(Op::Plus) if negative(first) => square_root(second).zip(square_root(&negated(first))),
        _ => None,
    };
    let Some((a, b)) = roots else {
        return Ok(false);
    };

    // each root becomes a term of a sum one level down
    let term = |root: Vec<Token>| {
        let target = if root.len() == 1 { level + 1 } else { level + 2 };
        raised(&root, target - min_level(&root)).collect::<Vec<_>>()
    };
    let (a, b) = (term(a), term(b));
    let n = 2 * (a.len() + b.len()) + 3;
    if side.len() - len + n > cx.n_tokens() {
        return Ok(false);
    }
    let mut tokens = Vec::with_capacity(n);
    for op in [Op::Minus, Op::Plus] {
        if !tokens.is_empty() {
            tokens.push(Token::operator(level, Op::Times));
        }
        tokens.extend_from_slice(&a);
        tokens.push(Token::operator(level + 1, op));
        tokens.extend_from_slice(&b);
    }
    side.splice(loc..end, tokens);
    log::debug!("difference of squares factored");
    Ok(true)
}

/// Where the factors found so far are.
#[derive(Debug, Default)]
struct Factoring {
    /// The start and length of the part still being factored.
    loc1: usize,
    len: usize,

    /// The length of the first factor found.
    len_first: usize,

    /// The start and length of the second factor found.
    loc2: usize,
    len2: usize,

    v: Option<Var>,
    modified: bool,
    symbolic_modified: bool,
}

/// Replaces `side[loc..loc + len]` with `quotient*gcd`, unless that would be too large.
fn save_factors(
    cx: &Ctxt,
    side: &mut Vec<Token>,
    loc: usize,
    len: usize,
    level: i32,
    quotient: &[Token],
    gcd: &[Token],
) -> bool {
    let n = quotient.len() + 1 + gcd.len();
    if n > len * 3 || side.len() + n - len > cx.n_tokens() {
        log::debug!("polynomial factor rejected because too large");
        return false;
    }
    let mut tokens: Vec<Token> = raised(quotient, level).collect();
    tokens.push(Token::operator(level, Op::Times));
    tokens.extend(raised(gcd, level));
    side.splice(loc..loc + len, tokens);
    true
}

/// Tries to factor the polynomial `side[loc..loc + len]`, whose additive operators are at `level`.
fn pf_sub(
    cx: &mut Ctxt,
    side: &mut Vec<Token>,
    loc: usize,
    len: usize,
    level: i32,
    do_repeat: bool,
) -> Result<bool, Error> {
    let mut v = None;
    find_greatest_power(&side[loc..loc + len], &mut v, &mut TermPlace::Anywhere);
    if v.is_none() {
        return Ok(false);
    }

    let mut f = Factoring { loc1: loc, loc2: loc, len, v, ..Default::default() };
    let searched = cx.trap(|cx| {
        if do_repeat && !factor_repeated(cx, side, level, &mut f)? {
            return Ok(());
        }
        if !f.modified {
            factor_symbolic(cx, side, level, &mut f)?;
        }
        Ok(())
    })?;
    if searched.is_none() {
        return Ok(f.modified || f.symbolic_modified);
    }

    if f.modified {
        // factor out more of the repeated factor
        let (loct, lent) = if f.len2 != 0 { (f.loc2, f.len2) } else { (loc, f.len_first) };
        if let Some((q, g)) = poly_gcd(cx, &side[f.loc1..f.loc1 + f.len], &side[loct..loct + lent], f.v)? {
            if save_factors(cx, side, f.loc1, f.len, level, &q, &g) {
                f.loc1 += q.len() + 1;
                f.len = g.len();
            }
        }
        if f.len2 != 0 {
            f.loc1 = f.loc2;
            f.len = f.len2;
        }
        if let Some((q, g)) = poly_gcd(cx, &side[loc..loc + f.len_first], &side[f.loc1..f.loc1 + f.len], None)? {
            save_factors(cx, side, loc, f.len_first, level, &q, &g);
        }
    }

    if f.modified || f.symbolic_modified {
        let end = side[loc..]
            .iter()
            .position(|t| t.level < level)
            .map_or(side.len(), |n| loc + n);
        if (end - loc) % 2 != 1 {
            return Err(Error::Bug("polynomial factoring left a malformed expression"));
        }
        log::debug!("resulting factors: {}", display(cx, &side[loc..end]));
    }
    Ok(f.modified || f.symbolic_modified)
}

/// Factors out repeated factors with `gcd(p, v*p')`. Returns false if the polynomial can't have
/// any factors, in which case grouping is not tried either.
fn factor_repeated(cx: &mut Ctxt, side: &mut Vec<Token>, level: i32, f: &mut Factoring) -> Result<bool, Error> {
    for count in 1.. {
        let mut trhs = side[f.loc1..f.loc1 + f.len].to_vec();
        cx.scoped(|c| c.partial = false, |cx| uf_simp(cx, &mut trhs))?;
        if level1_plus_count(&trhs) < 2 {
            return Ok(false);
        }

        // every symbolic variable must occur twice or more, and one must be a base variable
        let counts = var_counts(&trhs, cx.max_vars());
        if let Some(v) = f.v {
            if counts.len() > 1 && !poly_in_v(&trhs, v, true) {
                f.v = None;
            }
        }
        let mut fewest = None;
        for &(var, n) in counts.iter().filter(|(var, _)| var.is_symbolic()) {
            if f.v.is_none() && poly_in_v(&trhs, var, true) {
                f.v = Some(var);
            }
            fewest = Some(fewest.map_or(n, |m: usize| m.min(n)));
        }
        if fewest.map_or(true, |n| n <= 1) {
            return Ok(false);
        }
        let Some(v) = f.v else {
            return Ok(false);
        };

        let mut derivative = trhs.clone();
        if !differentiate(cx, &mut derivative, v)? {
            break;
        }
        log::trace!("differentiated with respect to {}", cx.vars.name(v));
        simp_loop(cx, &mut derivative)?;
        if derivative.len() + 2 > cx.divisor_size().min(cx.n_tokens()) {
            break;
        }
        let mut tlhs: Vec<Token> = raised(&derivative, 1).collect();
        tlhs.push(Token::operator(1, Op::Times));
        tlhs.push(Token::variable(1, v));
        uf_simp(cx, &mut tlhs)?;

        let Some((quotient, gcd)) = poly_gcd(cx, &side[f.loc1..f.loc1 + f.len], &tlhs, Some(v))? else {
            break;
        };
        if level1_plus_count(&quotient) == 0 || !save_factors(cx, side, f.loc1, f.len, level, &quotient, &gcd) {
            break;
        }
        f.loc1 += quotient.len() + 1;
        f.len = gcd.len();
        match count {
            1 => {
                log::debug!("polynomial with repeated factor factored");
                f.len_first = quotient.len();
                f.loc2 = f.loc1;
            },
            2 => f.len2 = quotient.len(),
            _ => {},
        }
        f.modified = true;
    }
    Ok(true)
}

/// Factors by grouping: for each variable raised to its greatest power in more than one term,
/// the group of those terms is tried as a factor.
fn factor_symbolic(cx: &mut Ctxt, side: &mut Vec<Token>, level: i32, f: &mut Factoring) -> Result<(), Error> {
    let mut last_v: Option<Var> = None;
    'next_v: loop {
        let p1 = side[f.loc1..f.loc1 + f.len].to_vec();
        let mut trhs = p1.clone();
        uf_simp_no_repeat(cx, &mut trhs)?;
        if level1_plus_count(&trhs) < 2 {
            return Ok(());
        }

        loop {
            let next = p1
                .iter()
                .filter_map(Token::as_var)
                .filter(|&w| last_v.map_or(true, |last| w > last))
                .min();
            let Some(v) = next else {
                return Ok(());
            };
            last_v = Some(v);

            let mut w = Some(v);
            if find_greatest_power(&trhs, &mut w, &mut TermPlace::Anywhere).count <= 1 {
                continue;
            }
            let mut grouped = trhs.clone();
            while factor_plus(cx, &mut grouped, Some(v), 0.0)? {
                simp_loop(cx, &mut grouped)?;
            }
            let g = find_greatest_power(&grouped, &mut w, &mut TermPlace::Anywhere);
            let (1, Some(term)) = (g.count, g.term) else {
                continue;
            };
            let group = grouped[term].to_vec();
            log::trace!("trying factor {}", display(cx, &group));

            let Some((quotient, gcd)) = poly_gcd(cx, &side[f.loc1..f.loc1 + f.len], &group, None)? else {
                continue 'next_v;
            };
            if level1_plus_count(&quotient) == 0 {
                continue 'next_v;
            }
            if f.symbolic_modified {
                log::debug!("found another symbolic factor");
            } else {
                log::debug!("symbolic polynomial factored");
            }
            if !save_factors(cx, side, f.loc1, f.len, level, &quotient, &gcd) {
                return Ok(());
            }
            f.len = quotient.len();
            f.symbolic_modified = true;
            last_v = None;
            continue 'next_v;
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use crate::{
        compare::{se_compare, Comparison},
        simplify::organize::organize,
        token::{from_ast::parse_side, side::is_well_formed},
    };
    use super::*;

    /// Factors `src` and compares the result with `expected`.
    fn factors_to(src: &str, expected: &str) -> bool {
        let mut cx = Ctxt::default();
        let mut side = parse_side(&mut cx, src).unwrap();
        let mut expected = parse_side(&mut cx, expected).unwrap();
        assert!(poly_factor(&mut cx, &mut side, true).unwrap(), "{} was not factored", src);
        assert!(is_well_formed(&side), "{:?}", side);
        organize(&mut side).unwrap();
        organize(&mut expected).unwrap();
        se_compare(&cx, &side, &expected) == Comparison::Equal
    }

    #[test]
    fn repeated_factor() {
        let mut cx = Ctxt::default();
        let mut side = parse_side(&mut cx, "x^2 + 2*x + 1").unwrap();
        assert!(poly_factor(&mut cx, &mut side, true).unwrap());
        assert!(is_well_formed(&side));
        simp_loop(&mut cx, &mut side).unwrap();
        assert_eq!(display(&cx, &side), "(x + 1)^2");
    }

    #[test]
    fn repeated_factors_need_the_flag() {
        let mut cx = Ctxt::default();
        let mut side = parse_side(&mut cx, "x^2 + 2*x + 1").unwrap();
        assert!(!poly_factor(&mut cx, &mut side, false).unwrap());
    }

    #[test]
    fn grouping() {
        let mut cx = Ctxt::default();
        let mut side = parse_side(&mut cx, "a*x + a*y + b*x + b*y").unwrap();
        assert!(poly_factor(&mut cx, &mut side, true).unwrap());
        assert!(is_well_formed(&side));
        let shown = display(&cx, &side);
        assert!(
            shown == "(a + b)*(x + y)" || shown == "(x + y)*(a + b)",
            "unexpected factors: {}",
            shown,
        );
    }

    #[test]
    fn differences_of_squares() {
        assert!(factors_to("x^2 - 1", "(x - 1)*(x + 1)"));
        assert!(factors_to("-1 + x^2", "(x - 1)*(x + 1)"));
        assert!(factors_to("4*x^2 - 9", "(2*x - 3)*(2*x + 3)"));
        assert!(factors_to("x^2/4 - y^2", "(x/2 - y)*(x/2 + y)"));
        assert!(factors_to("x^4 - 1", "(x - 1)*(x + 1)*(x^2 + 1)"));
    }

    #[test]
    fn sums_of_squares_are_not_factored() {
        for src in ["x^2 + 1", "x^2 - 2", "x^3 - 1", "x - 1"] {
            let mut cx = Ctxt::default();
            let mut side = parse_side(&mut cx, src).unwrap();
            let before = side.clone();
            assert!(!poly_factor(&mut cx, &mut side, true).unwrap(), "{}", src);
            assert_eq!(side, before);
        }
    }

    #[test]
    fn simplifier_factoring_keeps_binomials() {
        let mut cx = Ctxt::default();
        let mut side = parse_side(&mut cx, "x^2 - 1").unwrap();
        let before = side.clone();
        assert!(!poly_factor_no_squares(&mut cx, &mut side, true).unwrap());
        assert_eq!(side, before);
    }

    #[test]
    fn nested_polynomials_are_factored() {
        let mut cx = Ctxt::default();
        let mut side = parse_side(&mut cx, "y/(x^2 + 2*x + 1)").unwrap();
        assert!(poly_factor(&mut cx, &mut side, true).unwrap());
        assert!(is_well_formed(&side));
    }
}
