//! Polynomial long division, and smart division, its heuristic cousin.

use crate::{
    ctxt::Ctxt,
    error::Error,
    fractions::group_proc,
    simplify::{organize::organize, simp_loop, simpb_side},
    token::{fmt::display, side::var_count, Op, Token, Var},
    unfactor::{uf_repeat, uf_simp, uf_simp_no_repeat, uf_tsimp},
};
use std::ops::Range;
use super::{basic_size, find_greatest_power, find_highest_count, is_zero, terms, TermPlace};

/// The most terms with the greatest power that long division handles. Dividing more than this
/// needs factoring first.
const MAX_GREATEST_POWER_TERMS: usize = 50;

/// The most dividend terms that smart division skips before giving up.
const MAX_SKIPPED_TERMS: usize = 100;

/// How a division turned out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DivStatus {
    /// The divisor divides the dividend.
    RemainderZero,

    /// The quotient and remainder are smaller than the dividend.
    Smaller,

    /// The quotient and remainder are larger than the dividend.
    Larger,

    /// The remainder alone is larger than the dividend and the divisor.
    MuchLarger,
}

impl DivStatus {
    /// Returns true if writing the dividend as `quotient + remainder/divisor` simplifies it.
    pub fn is_useful(self) -> bool {
        matches!(self, DivStatus::RemainderZero | DivStatus::Smaller)
    }
}

/// The result of a division.
#[derive(Debug, Clone, PartialEq)]
pub struct Division {
    pub quotient: Vec<Token>,
    pub remainder: Vec<Token>,
    pub status: DivStatus,
}

impl Division {
    fn smaller(quotient: Vec<Token>, remainder: Vec<Token>) -> Self {
        let status = if is_zero(&remainder) {
            DivStatus::RemainderZero
        } else {
            DivStatus::Smaller
        };
        Self { quotient, remainder, status }
    }

    /// Returns true if the remainder is zero.
    pub fn is_exact(&self) -> bool {
        self.status == DivStatus::RemainderZero
    }
}

/// Returns a copy of the tokens with their levels raised.
pub(crate) fn raised(p: &[Token], by: i32) -> impl Iterator<Item = Token> + '_ {
    p.iter().map(move |t| Token { level: t.level + by, ..*t })
}

/// The operator joining the next quotient term: `-` if exactly one of the two terms is subtracted.
fn quotient_sign(dividend: &[Token], t1: usize, divisor: &[Token], t2: usize) -> Op {
    let negative = |p: &[Token], t: usize| t > 0 && p[t - 1].is_op(Op::Minus);
    if negative(dividend, t1) != negative(divisor, t2) {
        Op::Minus
    } else {
        Op::Plus
    }
}

/// Divides one term by another and simplifies the result. Also returns whether anything cancelled.
fn divide_term(cx: &mut Ctxt, num: &[Token], den: &[Token]) -> Result<Option<(Vec<Token>, bool)>, Error> {
    if num.len() + den.len() + 1 > cx.n_tokens() {
        return Ok(None);
    }
    let mut q: Vec<Token> = raised(num, 1).collect();
    q.push(Token::operator(1, Op::Divide));
    q.extend(raised(den, 1));
    let cancelled = simp_loop(cx, &mut q)?;
    Ok(Some((q, cancelled)))
}

/// Returns `rem - term*divisor`, given that `term` times the divisor term at `t2` cancels the
/// remainder term at `t1`. Both cancelled terms are written as zero; the caller simplifies.
///
/// `term` is based at level 2.
fn subtract_product(
    cx: &Ctxt,
    rem: &[Token],
    t1: Range<usize>,
    sign: Op,
    term: &[Token],
    divisor: &[Token],
    t2: Range<usize>,
) -> Option<Vec<Token>> {
    if rem.len() + term.len() + divisor.len() + 2 > cx.n_tokens() {
        return None;
    }
    let mut out = Vec::with_capacity(rem.len() + term.len() + divisor.len() + 2);
    out.extend(raised(&rem[..t1.start], 1));
    out.push(Token::constant(2, 0.0));
    out.extend(raised(&rem[t1.end..], 1));
    out.push(Token::operator(1, if sign == Op::Plus { Op::Minus } else { Op::Plus }));
    out.extend(raised(term, 1));
    out.push(Token::operator(2, Op::Times));
    out.extend(raised(&divisor[..t2.start], 2));
    out.push(Token::constant(3, 0.0));
    out.extend(raised(&divisor[t2.end..], 2));
    Some(out)
}

/// Divides `dividend` by `divisor` with generalized polynomial long division in the base variable
/// `v`. Works with any number of variables.
///
/// If `v` is `None`, the best base variable is chosen and stored in `v`. The operands are fully
/// expanded first. Returns `None` if the expressions can't be divided, including when an error
/// other than a critical one stops the division.
pub fn poly_div(
    cx: &mut Ctxt,
    dividend: &[Token],
    divisor: &[Token],
    v: &mut Option<Var>,
) -> Result<Option<Division>, Error> {
    let result = cx.trap(|cx| {
        cx.config.partial = false;
        poly_div_sub(cx, dividend, divisor, v)
    })?;
    Ok(result.flatten())
}

fn poly_div_sub(
    cx: &mut Ctxt,
    dividend: &[Token],
    divisor: &[Token],
    v: &mut Option<Var>,
) -> Result<Option<Division>, Error> {
    if dividend.len() > cx.n_tokens() || divisor.len() > cx.n_tokens() {
        return Ok(None);
    }
    let mut rem = dividend.to_vec();
    let mut div = divisor.to_vec();
    uf_simp(cx, &mut rem)?;
    uf_simp(cx, &mut div)?;
    if v.is_none() && find_highest_count(&rem, &div, v, cx.max_vars()) == 0 {
        return Ok(None);
    }
    if let Some(var) = *v {
        log::trace!(
            "polynomial division of {} by {} in {}",
            display(cx, &rem),
            display(cx, &div),
            cx.vars.name(var),
        );
    }

    let mut place = TermPlace::Detect;
    let mut last = find_greatest_power(&rem, v, &mut place);
    let mut by = find_greatest_power(&div, v, &mut place);
    if by.power <= 0.0 || last.power < by.power {
        place = place.flipped();
        last = find_greatest_power(&rem, v, &mut place);
        by = find_greatest_power(&div, v, &mut place);
        if by.power <= 0.0 || last.power < by.power {
            return Ok(None);
        }
    }
    if by.count > 1 || last.count > MAX_GREATEST_POWER_TERMS || div.len() > cx.divisor_size() {
        return Ok(None);
    }
    let (Some(mut t1), Some(t2)) = (last.term, by.term) else {
        return Ok(None);
    };

    let mut quotient = vec![Token::constant(1, 0.0)];
    let sum_size = rem.len() + quotient.len();
    let mut last_power = last.power;
    let mut last_count = last.count;
    loop {
        let sign = quotient_sign(&rem, t1.start, &div, t2.start);
        let Some((term, true)) = divide_term(cx, &rem[t1.clone()], &div[t2.clone()])? else {
            return Ok(None);
        };
        if quotient.len() + 1 + term.len() > cx.divisor_size().min(cx.n_tokens()) {
            return Ok(None);
        }
        let term: Vec<Token> = raised(&term, 1).collect();
        quotient.push(Token::operator(1, sign));
        quotient.extend_from_slice(&term);

        let Some(next) = subtract_product(cx, &rem, t1, sign, &term, &div, t2.clone()) else {
            return Ok(None);
        };
        rem = next;
        uf_repeat(cx, &mut rem)?;
        uf_tsimp(cx, &mut rem)?;

        let g = find_greatest_power(&rem, v, &mut place);
        if g.power < by.power {
            log::trace!("quotient {}, remainder {}", display(cx, &quotient), display(cx, &rem));
            let status = if is_zero(&rem) {
                DivStatus::RemainderZero
            } else if rem.len() + quotient.len() >= sum_size {
                if rem.len() + 1 > sum_size && rem.len() > div.len() {
                    DivStatus::MuchLarger
                } else {
                    DivStatus::Larger
                }
            } else {
                DivStatus::Smaller
            };
            return Ok(Some(Division { quotient, remainder: rem, status }));
        }

        if g.power < last_power {
            last_power = g.power;
            last_count = g.count;
            if last_count > MAX_GREATEST_POWER_TERMS {
                return Ok(None);
            }
        } else if g.power > last_power || g.count >= last_count {
            return Ok(None);
        } else {
            last_count = g.count;
        }
        let Some(next_t1) = g.term else {
            return Ok(None);
        };
        t1 = next_t1;
    }
}

/// Ends a smart division; with `limit`, the result must be smaller than `limit` tokens.
fn end_smart_div(quotient: Vec<Token>, remainder: Vec<Token>, limit: Option<usize>) -> Option<Division> {
    match limit {
        Some(limit) if quotient.len() + remainder.len() >= limit => None,
        _ => Some(Division::smaller(quotient, remainder)),
    }
}

/// Divides heuristically. Instead of following the greatest powers of a base variable, every
/// dividend term is tried against one divisor term, and a step is kept if it makes the expression
/// smaller.
///
/// The divisor term is the one with the fewest variables, ignoring terms without any. If that
/// fails, the whole divisor is tried as one term.
pub fn smart_div(cx: &mut Ctxt, dividend: &[Token], divisor: &[Token]) -> Result<Option<Division>, Error> {
    let mut rem = dividend.to_vec();
    let mut div = divisor.to_vec();
    uf_simp_no_repeat(cx, &mut rem)?;
    uf_simp_no_repeat(cx, &mut div)?;
    log::trace!("smart division of {} by {}", display(cx, &rem), display(cx, &div));

    let div_terms = terms(&div);
    let mut dcount = div_terms.len();
    let mut t2: Option<Range<usize>> = None;
    let mut fewest = 0;
    for t in div_terms {
        let has_vars = div[t.clone()]
            .iter()
            .any(|tok| tok.as_var().map_or(false, |v| v != Var::IMAGINARY));
        if !has_vars {
            continue;
        }
        let n = var_count(&div[t.clone()]);
        if t2.is_none() || n < fewest {
            fewest = n;
            t2 = Some(t);
        }
    }
    let Some(mut t2) = t2 else {
        return Ok(None);
    };
    if div.len() > cx.divisor_size() {
        return Ok(None);
    }

    let mut quotient = vec![Token::constant(1, 0.0)];
    'try_one: loop {
        let rem_size = rem.len();
        let limit = (dcount > 1).then_some(rem_size + 1);
        let mut skip: Vec<usize> = Vec::new();
        let mut count = 0;
        loop {
            let sum_size = rem.len() + quotient.len();

            // the first dividend term that divides into something no larger
            let mut chosen = None;
            for t1 in terms(&rem) {
                if skip.contains(&t1.start) {
                    continue;
                }
                let Some((term, cancelled)) = divide_term(cx, &rem[t1.clone()], &div[t2.clone()])? else {
                    return Ok(None);
                };
                if cancelled && basic_size(&term) <= basic_size(&rem[t1.clone()]) {
                    chosen = Some((t1, term));
                    break;
                }
            }
            let Some((t1, term)) = chosen else {
                if count > 0 {
                    return Ok(end_smart_div(quotient, rem, limit));
                }
                if dcount > 1 {
                    dcount = 1;
                    t2 = 0..div.len();
                    continue 'try_one;
                }
                return Ok(None);
            };

            let sign = quotient_sign(&rem, t1.start, &div, t2.start);
            if quotient.len() + 1 + term.len() > cx.divisor_size().min(cx.n_tokens()) {
                return Ok(None);
            }
            let term: Vec<Token> = raised(&term, 1).collect();
            let old_len = quotient.len();
            quotient.push(Token::operator(1, sign));
            quotient.extend_from_slice(&term);

            let Some(mut next) = subtract_product(cx, &rem, t1.clone(), sign, &term, &div, t2.clone()) else {
                return Ok(None);
            };
            uf_tsimp(cx, &mut next)?;
            if is_zero(&next) {
                return Ok(Some(Division::smaller(quotient, next)));
            }
            if dcount > 1 && next.len() + quotient.len() >= sum_size {
                quotient.truncate(old_len);
                if skip.len() >= MAX_SKIPPED_TERMS {
                    if count == 0 {
                        return Ok(None);
                    }
                    return Ok(end_smart_div(quotient, rem, limit));
                }
                log::trace!("skipping a division step that made the expression larger");
                skip.push(t1.start);
                continue;
            }
            rem = next;
            if rem.len() == 1 && rem[0].is_constant() {
                return Ok(end_smart_div(quotient, rem, limit));
            }
            skip.clear();
            count += 1;
        }
    }
}

/// Rewrites `a/b` as `q + r/b` wherever dividing the polynomial `a` by `b` gives a quotient `q`
/// and a remainder `r` that are simpler. Also cancels a factor of `b` out of a divisor `b^n`.
///
/// With `poly_flag`, polynomial division is tried before smart division. With `quick_flag`, the
/// denominators are grouped first, which keeps algebraic fractions simpler. Returns true if the
/// side was modified.
pub fn div_remainder(cx: &mut Ctxt, side: &mut Vec<Token>, poly_flag: bool, quick_flag: bool) -> Result<bool, Error> {
    if quick_flag {
        group_proc(side);
    }
    let rv = pdiv_recurse(cx, side, 0, 1, poly_flag)?;
    if quick_flag {
        organize(side)?;
    }
    Ok(rv)
}

/// Returns the index just past the operand that starts at `start`, at a depth below `level`.
fn operand_end(side: &[Token], start: usize, level: i32) -> usize {
    let mut k = start + 1;
    while k < side.len() && side[k].level > level {
        k += 2;
    }
    k.min(side.len())
}

fn pdiv_recurse(cx: &mut Ctxt, side: &mut Vec<Token>, loc: usize, level: i32, code: bool) -> Result<bool, Error> {
    let mut i = loc + 1;
    while i < side.len() && side[i].level >= level {
        if !(side[i].level == level && side[i].is_op(Op::Divide)) {
            i += 2;
            continue;
        }
        let real_len1 = operand_end(side, i + 1, level) - (i + 1);

        let mut last_op2 = None;
        let mut j = loc;
        while j < side.len() && side[j].level >= level {
            if side[j].level == level && side[j].op().is_some() {
                last_op2 = side[j].op();
                j += 1;
                continue;
            }
            if last_op2 == Some(Op::Divide) {
                j += 1;
                continue;
            }
            last_op2 = Some(Op::Divide);

            // numerator factors that are sums
            let end = operand_end(side, j, level);
            let op = (j + 1..end)
                .step_by(2)
                .filter(|&k| side[k].level == level + 1)
                .last()
                .and_then(|k| side[k].op());
            if !op.map_or(false, Op::is_additive) {
                j += 1;
                continue;
            }
            let len2 = end - j;

            // a divisor of the form `(sum)^n`
            let mut power_len = None;
            let mut inner = None;
            let mut deepest_additive = false;
            let mut k = i + 2;
            while k < side.len() && side[k].level > level {
                if side[k].level == level + 3 {
                    deepest_additive |= side[k].op().map_or(false, Op::is_additive);
                } else if side[k].level == level + 2 {
                    inner = side[k].op();
                } else if side[k].level == level + 1 {
                    let sum_base = inner.map_or(false, Op::is_additive)
                        || (inner == Some(Op::Times) && deepest_additive);
                    if side[k].is_op(Op::Power) && sum_base {
                        power_len = Some(k - (i + 1));
                    }
                    break;
                }
                k += 2;
            }

            let mut flag = code;
            loop {
                let power_flag = power_len.is_some();
                let len1 = power_len.unwrap_or(real_len1);
                let division = if flag || power_flag {
                    poly_div(cx, &side[j..j + len2], &side[i + 1..i + 1 + len1], &mut None)?
                } else {
                    smart_div(cx, &side[j..j + len2], &side[i + 1..i + 1 + len1])?
                };
                let division = division
                    .filter(|d| d.status.is_useful())
                    .filter(|d| !power_flag || d.is_exact());

                if let Some(Division { quotient, remainder, .. }) = division {
                    cx.check_len(quotient.len() + 2 + remainder.len() + len1)?;
                    let mut t: Vec<Token> = raised(&quotient, 1).collect();
                    t.push(Token::operator(1, Op::Plus));
                    t.extend(raised(&remainder, 2));
                    t.push(Token::operator(2, Op::Divide));
                    t.extend(raised(&side[i + 1..i + 1 + len1], 2));
                    simpb_side(cx, &mut t, false, true, 3)?;

                    let accept = if power_flag {
                        var_count(&t) <= var_count(&side[j..j + len2])
                    } else {
                        var_count(&t) + (t.len() >= len1 + 1 + len2) as usize
                            <= var_count(&side[j..j + len2]) + var_count(&side[i + 1..i + 1 + len1])
                    };
                    if accept {
                        let t: Vec<Token> = raised(&t, level).collect();
                        let mut j = j;
                        if power_flag {
                            // the divisor `(b)^n` becomes `(b)^(n - 1)`
                            cx.check_len(side.len() - len2 + t.len() + 2)?;
                            let exp_end = i + 1 + real_len1;
                            for tok in &mut side[i + 2 + len1..exp_end] {
                                tok.level += 1;
                            }
                            side.splice(
                                exp_end..exp_end,
                                [Token::operator(level + 2, Op::Minus), Token::constant(level + 2, 1.0)],
                            );
                            if i < j {
                                j += 2;
                            }
                        } else {
                            cx.check_len(side.len() - (len1 + 1 + len2) + t.len())?;
                            side.drain(i..i + 1 + len1);
                            if i < j {
                                j -= len1 + 1;
                            }
                        }
                        side.splice(j..j + len2, t);
                        if flag || power_flag {
                            log::debug!("polynomial division successful");
                        } else {
                            log::debug!("smart division successful");
                        }
                        return Ok(true);
                    }
                }

                if power_flag {
                    power_len = None;
                    continue;
                }
                if flag == code {
                    flag = !flag;
                    continue;
                }
                break;
            }
            j += 1;
        }
        i += 2;
    }

    let mut modified = false;
    let mut i = loc;
    while i < side.len() && side[i].level >= level {
        if side[i].level > level {
            modified |= pdiv_recurse(cx, side, i, level + 1, code)?;
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

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use crate::{simplify::simpa_side, token::from_ast::parse_side};
    use super::*;

    /// Divides and simplifies the quotient.
    fn divide(src: &str, by: &str) -> Option<(String, String, DivStatus)> {
        let mut cx = Ctxt::default();
        let dividend = parse_side(&mut cx, src).unwrap();
        let divisor = parse_side(&mut cx, by).unwrap();
        let mut d = poly_div(&mut cx, &dividend, &divisor, &mut None).unwrap()?;
        simpa_side(&mut cx, &mut d.quotient, false, false).unwrap();
        simpa_side(&mut cx, &mut d.remainder, false, false).unwrap();
        Some((display(&cx, &d.quotient), display(&cx, &d.remainder), d.status))
    }

    #[test]
    fn exact_division() {
        assert_eq!(
            divide("x^2 - 1", "x - 1"),
            Some(("x + 1".to_string(), "0".to_string(), DivStatus::RemainderZero)),
        );
    }

    #[test]
    fn division_with_remainder() {
        let (quotient, remainder, status) = divide("x^2 + 1", "x - 1").unwrap();
        assert_eq!((quotient.as_str(), remainder.as_str()), ("x + 1", "2"));
        assert_ne!(status, DivStatus::RemainderZero);
    }

    #[test]
    fn divisor_of_higher_degree() {
        assert_eq!(divide("x + 1", "x^2 + 1"), None);
    }

    #[test]
    fn chosen_variable_is_reported() {
        let mut cx = Ctxt::default();
        let dividend = parse_side(&mut cx, "y^2 - 4").unwrap();
        let divisor = parse_side(&mut cx, "y + 2").unwrap();
        let mut v = None;
        let d = poly_div(&mut cx, &dividend, &divisor, &mut v).unwrap().unwrap();
        assert_eq!(v, cx.vars.get("y"));
        assert!(d.is_exact());
    }

    #[test]
    fn constants_cannot_be_divided() {
        let mut cx = Ctxt::default();
        let dividend = parse_side(&mut cx, "4").unwrap();
        let divisor = parse_side(&mut cx, "2").unwrap();
        assert_eq!(poly_div(&mut cx, &dividend, &divisor, &mut None).unwrap(), None);
    }

    #[test]
    fn smart_division() {
        let mut cx = Ctxt::default();
        let dividend = parse_side(&mut cx, "a*b + a*c").unwrap();
        let divisor = parse_side(&mut cx, "b + c").unwrap();
        let d = smart_div(&mut cx, &dividend, &divisor).unwrap().unwrap();
        assert!(d.is_exact());
        let mut q = d.quotient;
        simpa_side(&mut cx, &mut q, false, false).unwrap();
        assert_eq!(display(&cx, &q), "a");
    }

    #[test]
    fn fractions_are_divided_out() {
        let mut cx = Ctxt::default();
        let mut side = parse_side(&mut cx, "(x^2 - 1)/(x - 1)").unwrap();
        assert!(div_remainder(&mut cx, &mut side, true, false).unwrap());
        simpa_side(&mut cx, &mut side, false, false).unwrap();
        assert_eq!(display(&cx, &side), "x + 1");
    }

    #[test]
    fn nothing_to_divide() {
        let mut cx = Ctxt::default();
        let mut side = parse_side(&mut cx, "x/(x + 1)").unwrap();
        assert!(!div_remainder(&mut cx, &mut side, true, false).unwrap());
    }
}
