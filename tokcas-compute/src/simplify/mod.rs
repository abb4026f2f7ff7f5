//! The simplification orchestrator.
//!
//! Every entry point here combines the rewrite passes of this crate as nested loops that run until
//! nothing changes. The tiers, from cheapest to most thorough:
//!
//! - [`elim_loop`]: constant folding and identity elimination only
//! - [`simp_loop`]: adds negative exponents, `a^b*a^c` merging, sign removal, and cancellation
//! - [`simp_ssub`]: adds factoring of sums and fractions; configurable
//! - [`simpb_side`]: factors variables in order of frequency for a pleasing display
//! - [`simpa_side`]: the full simplifier, with expansion, rationalization, modulus simplification,
//!   and polynomial GCD, factoring, and division
//!
//! Each pass takes the [`Ctxt`] and edits a side in place. Passes report whether they changed
//! anything; the orchestrator loops on that.

pub mod constant;
pub mod denominator;
pub mod identity;
pub mod order;
pub mod organize;

use crate::{
    complex::approximate_complex_roots,
    ctxt::Ctxt,
    error::Error,
    factor::{
        factor_divide,
        factor_plus,
        factor_power,
        factor_times,
        integer::factor_constants,
        subtract_itself,
        super_factor::super_factor,
    },
    fractions::{fractions_and_group, make_simple_fractions},
    poly::{div_remainder, mod_simp, poly_factor_no_squares, poly_gcd_simp},
    token::{fmt::display, Op, Token, TokenKind, Var},
    unfactor::{
        uf_allpower,
        uf_neg_help,
        uf_power,
        uf_pplus,
        uf_repeat,
        uf_simp,
        uf_times,
        uf_tsimp,
        ufactor,
        unsimp_power,
    },
};
use constant::combine_constants;
use denominator::{div_imaginary, rationalize};
use identity::{elim_k, elim_sign, integer_root_simp, simp2_power, simp_constant_power, simp_pp};
use order::reorder;
use organize::organize;

/// Replaces the constant variables `e` and `pi` with their numeric values. Returns true if
/// anything was substituted.
pub fn subst_constants(side: &mut [Token]) -> bool {
    let mut modified = false;
    for t in side.iter_mut().step_by(2) {
        if let Some(d) = t.as_var().and_then(|v| v.const_value()) {
            t.kind = TokenKind::Constant(d);
            modified = true;
        }
    }
    modified
}

/// The quickest, most basic simplification: constant folding, identities, and nested powers.
///
/// This is where an interrupt raised by another thread is noticed.
pub fn elim_loop(cx: &mut Ctxt, side: &mut Vec<Token>) -> Result<(), Error> {
    cx.check_interrupt()?;
    loop {
        loop {
            loop {
                organize(side)?;
                if !combine_constants(cx, side, true)? {
                    break;
                }
            }
            if !elim_k(cx, side)? {
                break;
            }
        }
        if !simp_pp(cx, side) {
            break;
        }
    }
    if reorder(side)? {
        loop {
            organize(side)?;
            if !elim_k(cx, side)? {
                break;
            }
        }
    }
    log::trace!("elim_loop: {}", display(cx, side));
    Ok(())
}

/// Commonly used quick simplification that does not factor sums. Returns true if
/// [`factor_times`] did something.
pub fn simp_loop(cx: &mut Ctxt, side: &mut Vec<Token>) -> Result<bool, Error> {
    let mut rv = false;
    loop {
        loop {
            loop {
                loop {
                    elim_loop(cx, side)?;
                    if !simp2_power(cx, side)? {
                        break;
                    }
                }
                if !factor_times(cx, side)? {
                    break;
                }
                rv = true;
            }
            if !elim_sign(cx, side)? {
                break;
            }
        }
        if !subtract_itself(cx, side)? {
            break;
        }
    }
    Ok(rv)
}

/// The configurable simplifier.
///
/// - `v`: the variable to factor, `None` for none in particular, or [`Var::MATCH_ANY`] for all
/// - `d`: also factor expressions raised to this power
/// - `power_flag`: run [`factor_power`]
/// - `times_flag`: run [`factor_times`]
/// - `fc_level`: the policy code passed to [`factor_constants`]
pub fn simp_ssub(
    cx: &mut Ctxt,
    side: &mut Vec<Token>,
    v: Option<Var>,
    d: f64,
    power_flag: bool,
    times_flag: bool,
    fc_level: u8,
) -> Result<(), Error> {
    loop {
        loop {
            loop {
                loop {
                    loop {
                        loop {
                            loop {
                                loop {
                                    elim_loop(cx, side)?;
                                    if !simp2_power(cx, side)? {
                                        break;
                                    }
                                }
                                if !(times_flag && factor_times(cx, side)?) {
                                    break;
                                }
                            }
                            if !elim_sign(cx, side)? {
                                break;
                            }
                        }
                        if !subtract_itself(cx, side)? {
                            break;
                        }
                    }
                    if !factor_constants(cx, side, fc_level)? {
                        break;
                    }
                }
                if !factor_divide(cx, side, v, d)? {
                    break;
                }
            }
            if !factor_plus(cx, side, v, d)? {
                break;
            }
        }
        if !(power_flag && factor_power(cx, side)?) {
            break;
        }
    }
    Ok(())
}

/// Quick mid-range simplification with trivial factoring.
pub fn mid_simp_side(cx: &mut Ctxt, side: &mut Vec<Token>) -> Result<(), Error> {
    simp_ssub(cx, side, None, 1.0, true, true, 6)
}

/// The mid-range simplifier for solving. With `zsolve`, the side is being solved for zero, so
/// powers are not factored.
pub fn simps_side(cx: &mut Ctxt, side: &mut Vec<Token>, zsolve: bool) -> Result<(), Error> {
    elim_loop(cx, side)?;
    simp_constant_power(cx, side)?;
    loop {
        simp_ssub(cx, side, None, 0.0, !zsolve, true, 6)?;
        if !super_factor(cx, side, 0)? {
            break;
        }
    }
    Ok(())
}

/// Simplifies while factoring out the variable `v`, or every variable if `v` is `None`.
pub fn simpv_side(cx: &mut Ctxt, side: &mut Vec<Token>, v: Option<Var>) -> Result<(), Error> {
    simp_ssub(cx, side, v, 0.0, v.is_none(), true, 6)
}

/// Factors out only the variable `v` and simplifies a little. Does not approximate.
///
/// When `v` is the imaginary unit, division by imaginary numbers is also removed.
pub fn factorv(cx: &mut Ctxt, side: &mut Vec<Token>, v: Var) -> Result<(), Error> {
    loop {
        loop {
            simp_loop(cx, side)?;
            if !factor_plus(cx, side, Some(v), 0.0)? {
                break;
            }
        }
        if !(v == Var::IMAGINARY && div_imaginary(cx, side)?) {
            break;
        }
    }
    Ok(())
}

/// Approximates roots of complex numbers and factors out the imaginary unit. Returns true if
/// anything was approximated.
pub fn factor_imaginary(cx: &mut Ctxt, side: &mut Vec<Token>) -> Result<bool, Error> {
    let rv = approximate_complex_roots(cx, side)?;
    factorv(cx, side, Var::IMAGINARY)?;
    Ok(rv)
}

/// Simplifies and approximates, including complex numbers. Used to compare results numerically.
pub fn calc_simp(cx: &mut Ctxt, side: &mut Vec<Token>) -> Result<(), Error> {
    cx.scoped(
        |config| config.approximate_roots = true,
        |cx| {
            subst_constants(side);
            mid_simp_side(cx, side)?;
            factor_imaginary(cx, side)?;
            ufactor(cx, side)?;
            factor_imaginary(cx, side)?;
            uf_simp(cx, side)?;
            factor_imaginary(cx, side)?;
            mid_simp_side(cx, side)?;
            make_simple_fractions(cx, side)?;
            uf_tsimp(cx, side)?;
            Ok(())
        },
    )
}

/// Approximates a side numerically. With the repeat flag of the context, does more work through
/// [`calc_simp`].
pub fn approximate(cx: &mut Ctxt, side: &mut Vec<Token>) -> Result<(), Error> {
    if cx.repeat {
        return calc_simp(cx, side);
    }
    subst_constants(side);
    cx.scoped(
        |config| config.approximate_roots = true,
        |cx| {
            simp_loop(cx, side)?;
            factor_imaginary(cx, side)?;
            Ok(())
        },
    )
}

/// Tries to remove imaginary units by rewriting them as `(-1)^0.5`, so that expressions like
/// `i*b^0.5` become `(-1*b)^0.5`. Returns true if any imaginary unit was substituted.
pub fn simp_i(cx: &mut Ctxt, side: &mut Vec<Token>) -> Result<bool, Error> {
    simp_loop(cx, side)?;

    let mut rv = false;
    let mut i = 0;
    while i < side.len() {
        if side[i].is_var_eq(Var::IMAGINARY) {
            let level = side[i].level + 1;
            crate::token::side::replace(cx, side, i..i + 1, &[
                Token::constant(level, -1.0),
                Token::operator(level, Op::Power),
                Token::constant(level, 0.5),
            ])?;
            rv = true;
            i += 2;
        }
        i += 2;
    }

    loop {
        loop {
            loop {
                loop {
                    loop {
                        organize(side)?;
                        if !combine_constants(cx, side, false)? {
                            break;
                        }
                    }
                    if !elim_k(cx, side)? {
                        break;
                    }
                }
                if !simp_pp(cx, side) {
                    break;
                }
            }
            // this can mess up absolute values and complex numbers
            if !factor_power(cx, side)? {
                break;
            }
        }
        if !factor_times(cx, side)? {
            break;
        }
    }
    simp_loop(cx, side)?;
    Ok(rv)
}

/// Combines all like denominators.
pub fn simp_divide(cx: &mut Ctxt, side: &mut Vec<Token>) -> Result<(), Error> {
    loop {
        loop {
            simp_loop(cx, side)?;
            if !factor_constants(cx, side, 1)? {
                break;
            }
        }
        if !factor_divide(cx, side, None, 0.0)? {
            break;
        }
    }
    Ok(())
}

/// Combines all like denominators that contain `v`, without [`factor_times`].
pub fn simp2_divide(cx: &mut Ctxt, side: &mut Vec<Token>, v: Option<Var>, fc_level: u8) -> Result<(), Error> {
    loop {
        loop {
            loop {
                loop {
                    loop {
                        elim_loop(cx, side)?;
                        if !simp2_power(cx, side)? {
                            break;
                        }
                    }
                    if !elim_sign(cx, side)? {
                        break;
                    }
                }
                if !subtract_itself(cx, side)? {
                    break;
                }
            }
            if !factor_constants(cx, side, fc_level)? {
                break;
            }
        }
        if !factor_divide(cx, side, v, 0.0)? {
            break;
        }
    }
    Ok(())
}

/// Counts the symbolic and sign variables of a side, ordered for [`simpb_side`]: sign variables
/// first, then by decreasing number of occurrences, then by variable.
fn variables_by_frequency(cx: &Ctxt, side: &[Token]) -> Vec<(Var, usize)> {
    let mut counts: Vec<(Var, usize)> = Vec::new();
    for v in side.iter().step_by(2).filter_map(Token::as_var) {
        if v <= Var::IMAGINARY {
            continue;
        }
        match counts.iter_mut().find(|(var, _)| *var == v) {
            Some((_, count)) => *count += 1,
            None => counts.push((v, 1)),
        }
    }
    counts.sort_by(|(v1, c1), (v2, c2)| {
        v2.is_sign()
            .cmp(&v1.is_sign())
            .then(c2.cmp(c1))
            .then(v1.cmp(v2))
    });
    counts.truncate(cx.max_vars());
    counts
}

/// The beauty simplifier: factors variables in order, sign variables first and then by frequency,
/// to make a pleasing display.
///
/// - `uf_power_flag`: expand every power of a product first, with [`uf_allpower`]
/// - `power_flag`: run [`factor_power`]
/// - `fc_level`: the policy code passed to [`factor_constants`]
pub fn simpb_side(
    cx: &mut Ctxt,
    side: &mut Vec<Token>,
    uf_power_flag: bool,
    power_flag: bool,
    fc_level: u8,
) -> Result<(), Error> {
    elim_loop(cx, side)?;
    if uf_power_flag {
        uf_allpower(cx, side)?;
    }

    let vars = variables_by_frequency(cx, side);
    if let Some(&(first, _)) = vars.first() {
        // factor division by the most frequent variables first
        simp2_divide(cx, side, Some(first), fc_level)?;
        for &(v, _) in &vars[1..] {
            if factor_divide(cx, side, Some(v), 0.0)? {
                simp2_divide(cx, side, Some(v), fc_level)?;
            }
        }
        simp2_divide(cx, side, None, fc_level)?;
        for &(v, _) in &vars {
            while factor_plus(cx, side, Some(v), 0.0)? {
                simp2_divide(cx, side, None, fc_level)?;
            }
        }
    }

    // make sure the side is completely factored
    while factor_divide(cx, side, Some(Var::MATCH_ANY), 0.0)? {
        simp2_divide(cx, side, Some(Var::MATCH_ANY), fc_level)?;
    }
    while factor_plus(cx, side, Some(Var::MATCH_ANY), 0.0)? {
        simp2_divide(cx, side, None, fc_level)?;
    }
    simp_ssub(cx, side, Some(Var::MATCH_ANY), 0.0, power_flag, true, fc_level)
}

/// Converts a side with algebraic fractions into a single simple fraction.
pub fn simple_frac_side(cx: &mut Ctxt, side: &mut Vec<Token>) -> Result<(), Error> {
    if side.len() == 1 {
        make_simple_fractions(cx, side)?;
        fractions_and_group(cx, side)?;
        return Ok(());
    }
    simp_loop(cx, side)?;
    poly_factor_no_squares(cx, side, true)?;
    loop {
        loop {
            loop {
                simp_ssub(cx, side, None, 0.0, false, true, 5)?;
                if !poly_gcd_simp(cx, side)? {
                    break;
                }
            }
            if !uf_power(cx, side)? {
                break;
            }
        }
        if !super_factor(cx, side, 3)? {
            break;
        }
    }
    log::debug!("simple fraction: {}", display(cx, side));

    make_simple_fractions(cx, side)?;
    uf_tsimp(cx, side)?;
    poly_factor_no_squares(cx, side, true)?;
    simpb_side(cx, side, true, false, 2)?;
    // again, making sure every power of a product is expanded
    simpb_side(cx, side, true, false, 2)?;
    fractions_and_group(cx, side)?;
    Ok(())
}

/// Expands powers as far as possible, which can overflow the side. In that case the side is
/// restored and expanded less.
fn expand_fully(cx: &mut Ctxt, side: &mut Vec<Token>, quick_flag: bool, frac_flag: bool) -> Result<(), Error> {
    let saved = side.clone();
    let expanded = cx.trap(|cx| {
        cx.config.partial = frac_flag;
        if quick_flag {
            uf_tsimp(cx, side)?;
        } else {
            // expands powers of 2 and higher, which might overflow
            loop {
                uf_power(cx, side)?;
                uf_repeat(cx, side)?;
                if !uf_tsimp(cx, side)? {
                    break;
                }
            }
        }
        Ok(())
    })?;
    if expanded.is_none() {
        *side = saved;
        log::debug!("simplify not expanding fully, due to an oversized expression or error");
        uf_tsimp(cx, side)?;
    }
    Ok(())
}

/// The slow and thorough simplifier. Applies many equivalent transformations and their inverses,
/// such as expanding and factoring, then polynomial GCD, factoring, and division.
///
/// - `quick_flag`: simpler results, without expanding `(x + 1)^2`
/// - `frac_flag`: simplify to a ratio of two polynomials
pub fn simpa_side(cx: &mut Ctxt, side: &mut Vec<Token>, quick_flag: bool, frac_flag: bool) -> Result<(), Error> {
    if side.len() == 1 {
        make_simple_fractions(cx, side)?;
        simpb_side(cx, side, true, !frac_flag, 2)?;
        return Ok(());
    }
    log::debug!("simplify input: {}", display(cx, side));

    simp_loop(cx, side)?;
    loop {
        simp_ssub(cx, side, None, 1.0, false, true, 5)?;
        if !uf_power(cx, side)? {
            break;
        }
    }
    while factor_power(cx, side)? {
        simp_loop(cx, side)?;
    }
    if cx.config.rationalize_denominators {
        rationalize(cx, side)?;
    }
    unsimp_power(cx, side)?;
    uf_tsimp(cx, side)?;

    // the only place where modulus is completely simplified
    uf_pplus(cx, side)?;
    uf_repeat(cx, side)?;
    loop {
        elim_loop(cx, side)?;
        if !mod_simp(cx, side)? {
            break;
        }
    }

    // remove unnecessary negative constants and imaginary numbers
    simp_i(cx, side)?;
    unsimp_power(cx, side)?;
    uf_times(cx, side)?;
    simp_ssub(cx, side, None, 1.0, true, true, 5)?;
    unsimp_power(cx, side)?;
    uf_neg_help(cx, side)?;
    uf_tsimp(cx, side)?;
    loop {
        loop {
            simp_ssub(cx, side, None, 1.0, false, true, 6)?;
            if !uf_power(cx, side)? {
                break;
            }
        }
        if quick_flag || !super_factor(cx, side, 2)? {
            break;
        }
    }
    if poly_gcd_simp(cx, side)? {
        simp_ssub(cx, side, None, 1.0, false, true, 6)?;
    }
    log::debug!("simplify, before complex cleanup: {}", display(cx, side));
    unsimp_power(cx, side)?;
    uf_times(cx, side)?;
    factorv(cx, side, Var::IMAGINARY)?;
    uf_pplus(cx, side)?;
    simp_ssub(cx, side, None, 1.0, true, false, 5)?;
    if poly_gcd_simp(cx, side)? {
        factorv(cx, side, Var::IMAGINARY)?;
        uf_pplus(cx, side)?;
        simp_ssub(cx, side, None, 1.0, true, false, 5)?;
    }
    uf_times(cx, side)?;
    uf_pplus(cx, side)?;
    factor_imaginary(cx, side)?;
    uf_power(cx, side)?;
    loop {
        loop {
            simp_ssub(cx, side, None, 1.0, false, true, 6)?;
            if !uf_power(cx, side)? {
                break;
            }
        }
        if quick_flag || !super_factor(cx, side, 2)? {
            break;
        }
    }

    // the greatest expansion; if it fails, expand less
    expand_fully(cx, side, quick_flag, frac_flag)?;

    simpb_side(cx, side, true, true, 2)?;
    log::debug!("simplify, before polynomial operations: {}", display(cx, side));
    let mut factored = false;
    loop {
        // divide the top and bottom of fractions by any polynomial GCD found
        if poly_gcd_simp(cx, side)? {
            factored = false;
            simpb_side(cx, side, false, true, 3)?;
        }
        if !factored && poly_factor_no_squares(cx, side, true)? {
            factored = true;
            simpb_side(cx, side, false, true, 3)?;
            continue;
        }
        // simplify algebraic fractions with polynomial and smart division
        if !frac_flag && div_remainder(cx, side, true, quick_flag)? {
            factored = false;
            simpb_side(cx, side, false, true, 3)?;
            continue;
        }
        break;
    }
    log::debug!("simplify, after polynomial operations: {}", display(cx, side));

    simp_constant_power(cx, side)?;
    simp_ssub(cx, side, None, 1.0, true, true, 5)?;
    unsimp_power(cx, side)?;
    make_simple_fractions(cx, side)?;
    factor_power(cx, side)?;
    uf_tsimp(cx, side)?;
    make_simple_fractions(cx, side)?;
    uf_power(cx, side)?;
    integer_root_simp(cx, side)?;
    simpb_side(cx, side, true, true, 3)?;
    poly_factor_no_squares(cx, side, true)?;
    simpb_side(cx, side, true, !frac_flag, 2)?;
    log::debug!("simplify result: {}", display(cx, side));
    Ok(())
}

/// Runs `simplify` repeatedly while the side keeps shrinking, if the context's repeat flag is set,
/// keeping the smallest result.
fn repeat_while_shrinking(
    cx: &mut Ctxt,
    side: &mut Vec<Token>,
    mut simplify: impl FnMut(&mut Ctxt, &mut Vec<Token>) -> Result<(), Error>,
) -> Result<(), Error> {
    if side.is_empty() {
        return Ok(());
    }
    simplify(cx, side)?;
    if cx.repeat && side.len() > 1 {
        loop {
            let snapshot = side.clone();
            simplify(cx, side)?;
            if side.len() >= snapshot.len() {
                if side.len() != snapshot.len() {
                    *side = snapshot;
                }
                break;
            }
        }
    }
    Ok(())
}

/// The most thorough simplifier. With the repeat flag of the context, [`simpa_side`] is repeated
/// until the result stops shrinking.
pub fn simpa_repeat_side(cx: &mut Ctxt, side: &mut Vec<Token>, quick_flag: bool, frac_flag: bool) -> Result<(), Error> {
    repeat_while_shrinking(cx, side, |cx, side| simpa_side(cx, side, quick_flag, frac_flag))
}

/// Like [`simple_frac_side`], repeated while the result shrinks if the repeat flag is set.
pub fn simple_frac_repeat_side(cx: &mut Ctxt, side: &mut Vec<Token>) -> Result<(), Error> {
    repeat_while_shrinking(cx, side, simple_frac_side)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use crate::{
        compare::{se_compare, Comparison},
        token::{from_ast::parse_side, side::is_well_formed},
        warning::Warning,
    };
    use super::*;

    fn simplify(src: &str) -> String {
        let mut cx = Ctxt::default();
        let mut side = parse_side(&mut cx, src).unwrap();
        simpa_side(&mut cx, &mut side, false, false).unwrap();
        assert!(is_well_formed(&side), "{:?}", side);
        display(&cx, &side)
    }

    /// Returns true if both expressions simplify to the same thing.
    fn same(a: &str, b: &str) -> bool {
        let mut cx = Ctxt::default();
        let mut a = parse_side(&mut cx, a).unwrap();
        let mut b = parse_side(&mut cx, b).unwrap();
        simpa_side(&mut cx, &mut a, false, false).unwrap();
        simpa_side(&mut cx, &mut b, false, false).unwrap();
        se_compare(&cx, &a, &b) == Comparison::Equal
    }

    #[test]
    fn constants_fold_to_one_token() {
        let mut cx = Ctxt::default();
        let mut side = parse_side(&mut cx, "2 + 3*4").unwrap();
        simp_loop(&mut cx, &mut side).unwrap();
        assert_eq!(side, vec![Token::constant(1, 14.0)]);
    }

    #[test]
    fn zero_to_the_zero_warns() {
        let mut cx = Ctxt::default();
        let mut side = parse_side(&mut cx, "0^0").unwrap();
        elim_loop(&mut cx, &mut side).unwrap();
        assert_eq!(side, vec![Token::constant(1, 1.0)]);
        assert_eq!(cx.take_warnings(), vec![Warning::ZeroPowerZero]);
    }

    #[test]
    fn sums_of_fractions() {
        assert_eq!(simplify("1/2 + 1/3"), "5/6");
    }

    #[test]
    fn like_terms_combine() {
        assert_eq!(simplify("x + x"), "2*x");
        assert_eq!(simplify("x*x"), "x^2");
        assert_eq!(simplify("x - x"), "0");
        assert_eq!(simplify("(x + 1) - (x - 1)"), "2");
    }

    #[test]
    fn squares_of_sums_refactor() {
        assert_eq!(simplify("(a + b)*(a + b)"), "(a + b)^2");
    }

    #[test]
    fn differences_of_squares_factor() {
        assert!(same("x^2 - 1", "(x + 1)*(x - 1)"));
        assert!(same("(x^2 - 1)/(x - 1)", "x + 1"));
    }

    #[test]
    fn reorders_negative_leading_terms() {
        let mut cx = Ctxt::default();
        let mut side = parse_side(&mut cx, "-3 + x").unwrap();
        elim_loop(&mut cx, &mut side).unwrap();
        assert_eq!(display(&cx, &side), "x - 3");
    }

    #[test]
    fn imaginary_units_leave_denominators() {
        let mut cx = Ctxt::default();
        let mut side = parse_side(&mut cx, "1/i").unwrap();
        factorv(&mut cx, &mut side, Var::IMAGINARY).unwrap();
        assert_eq!(display(&cx, &side), "-1*i");
    }

    #[test]
    fn approximates_constants() {
        let mut cx = Ctxt::default();
        let mut side = parse_side(&mut cx, "2*pi").unwrap();
        approximate(&mut cx, &mut side).unwrap();
        assert_eq!(side.len(), 1);
        assert!((side[0].as_constant().unwrap() - std::f64::consts::TAU).abs() < 1e-12);
    }

    #[test]
    fn interrupts_abort_simplification() {
        let mut cx = Ctxt::default();
        let mut side = parse_side(&mut cx, "x + 1").unwrap();
        cx.interrupt_handle().store(true, std::sync::atomic::Ordering::Relaxed);
        assert_eq!(simpa_side(&mut cx, &mut side, false, false), Err(Error::Interrupted));
    }

    #[test]
    fn repeat_keeps_the_smallest_result() {
        let mut cx = Ctxt::default();
        cx.repeat = true;
        let mut side = parse_side(&mut cx, "(x + 1)^2 - x^2 - 2*x").unwrap();
        simpa_repeat_side(&mut cx, &mut side, false, false).unwrap();
        assert_eq!(display(&cx, &side), "1");
    }
}
