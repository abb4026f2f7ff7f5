//! Passes that clean up denominators: imaginary units and square roots.

use crate::{
    ctxt::Ctxt,
    error::Error,
    token::{Op, Token, Var},
};

/// Removes the imaginary unit from denominators.
///
/// `x/i` becomes `x*-1*i`. A denominator that is a sum with a single `i` term, `x/(a + b*i)`, is
/// multiplied through by its conjugate: `x/(a^2 + b^2)*(a - b*i)`. This often makes expressions
/// larger, so it is only run where complex results are being cleaned up.
pub fn div_imaginary(cx: &mut Ctxt, side: &mut Vec<Token>) -> Result<bool, Error> {
    let mut modified = false;
    let mut i = 1;
    while i < side.len() {
        if side[i].op().is_none() {
            return Err(Error::Bug("operator expected while removing imaginary denominators"));
        }
        if !side[i].is_op(Op::Divide) {
            i += 2;
            continue;
        }
        let level = side[i].level;

        if side[i + 1].level == level && side[i + 1].is_var_eq(Var::IMAGINARY) {
            cx.check_len(side.len() + 2)?;
            side[i].set_op(Op::Times);
            side.splice(i..i, [
                Token::operator(level, Op::Times),
                Token::constant(level, -1.0),
            ]);
            modified = true;
            i += 4;
            continue;
        }

        // find the single `i` in the denominator, and the term that contains it
        let mut op = None;
        let mut iloc = None;
        let mut biloc = 0;
        let mut eiloc = None;
        let mut k = i;
        let mut j = i + 1;
        while j < side.len() && side[j].level > level {
            if side[j].level == level + 1 && side[j].op().is_some() {
                op = side[j].op();
                k = j;
                if iloc.is_some() && eiloc.is_none() {
                    eiloc = Some(j);
                }
            } else if side[j].is_var_eq(Var::IMAGINARY) {
                if iloc.is_some() {
                    op = None;
                    break;
                }
                iloc = Some(j);
                biloc = k + 1;
            }
            j += 1;
        }
        let eloc = j;
        let (Some(iloc), Some(Op::Plus | Op::Minus)) = (iloc, op) else {
            i += 2;
            continue;
        };
        let eiloc = eiloc.unwrap_or(eloc);
        let ilevel = side[iloc].level;
        if ilevel != level + 1 {
            if ilevel != level + 2 {
                i += 2;
                continue;
            }
            if iloc > biloc && !side[iloc - 1].is_op(Op::Times) {
                i += 2;
                continue;
            }
            if iloc + 1 < eiloc && !side[iloc + 1].op().map_or(false, Op::is_multiplicative) {
                i += 2;
                continue;
            }
        }
        cx.check_len(side.len() + (eloc - (i + 1)) + 5 + (eiloc - biloc) + 2)?;

        // re^2 + im^2, where re is the denominator with `i` set to 0 and im is the coefficient of `i`
        let mut magnitude = side[i + 1..eloc].to_vec();
        magnitude[iloc - (i + 1)] = Token::constant(ilevel, 0.0);
        for t in &mut magnitude {
            t.level += 2;
        }
        magnitude.extend([
            Token::operator(level + 2, Op::Power),
            Token::constant(level + 2, 2.0),
            Token::operator(level + 1, Op::Plus),
        ]);
        let im_start = magnitude.len();
        magnitude.extend(side[biloc..eiloc].iter().map(|t| Token { level: t.level + 2, ..*t }));
        magnitude[im_start + (iloc - biloc)] = Token::constant(ilevel + 2, 1.0);
        magnitude.extend([
            Token::operator(level + 2, Op::Power),
            Token::constant(level + 2, 2.0),
        ]);

        // conjugate the denominator in place
        side[iloc].level = ilevel + 1;
        side.splice(iloc..iloc, [
            Token::constant(ilevel + 1, -1.0),
            Token::operator(ilevel + 1, Op::Times),
        ]);

        let n = magnitude.len();
        let mut tokens = vec![Token::operator(level, Op::Divide)];
        tokens.extend(magnitude);
        tokens.push(Token::operator(level, Op::Times));
        side.splice(i..i + 1, tokens);
        log::trace!("imaginary unit removed from a denominator");
        modified = true;
        i += n + 3;
    }
    Ok(modified)
}

/// Returns true if `k` is a `^` whose exponent is a constant with a fractional part of one half.
fn is_half_power(side: &[Token], k: usize) -> bool {
    side[k].is_op(Op::Power)
        && side[k].level == side[k + 1].level
        && side[k + 1].as_constant().map_or(false, |d| d % 1.0 == 0.5)
}

/// Rationalizes denominators that are sums containing a square root, by multiplying the numerator
/// and denominator by the conjugate: `x/(a + b^0.5) -> x/(a + b^0.5)*(a - b^0.5)/(a - b^0.5)`.
///
/// Returns true if anything was done; the side must be expanded right away to finish the job.
pub fn rationalize(cx: &mut Ctxt, side: &mut Vec<Token>) -> Result<bool, Error> {
    let mut modified = false;
    let mut i = 1;
    'next_divide: while i < side.len() {
        if side[i].op().is_none() {
            return Err(Error::Bug("operator expected while rationalizing denominators"));
        }
        if !side[i].is_op(Op::Divide) {
            i += 2;
            continue;
        }
        let div_level = side[i].level;
        let mut count = 0;
        let mut first_op = None;
        let mut end_loc = i + 2;
        while end_loc < side.len() && side[end_loc].level > div_level {
            if side[end_loc].level == div_level + 1 {
                count += 1;
                first_op.get_or_insert(end_loc);
            }
            end_loc += 2;
        }
        let Some(mut j) = first_op.filter(|&j| side[j].op().map_or(false, Op::is_additive)) else {
            i += 2;
            continue;
        };

        // walk the terms of the denominator, looking for one with a square root
        let mut i1 = i;
        loop {
            let flag = (i1 + 2..j)
                .step_by(2)
                .rev()
                .find(|&k| side[k].level == div_level + 2)
                .and_then(|k| match side[k].op() {
                    Some(Op::Times | Op::Divide) => Some(1),
                    Some(Op::Power) => Some(2),
                    _ => None,
                });

            if let Some(flag) = flag {
                let root = (i1 + 2..j).step_by(2).rev().find(|&k| {
                    (side[k].level == div_level + 2 || (side[k].level == div_level + 3 && flag == 1))
                        && is_half_power(side, k)
                });
                if let Some(k) = root {
                    for k1 in (i + 2..end_loc).step_by(2) {
                        if !is_half_power(side, k1) {
                            continue;
                        }
                        // every root must be eliminated from the denominator
                        if k != k1 && !(side[k1].level == div_level + 2 && count == 1) {
                            i += 2;
                            continue 'next_divide;
                        }
                        // leave absolute values alone
                        if side[k1 - 1].level == side[k1].level + 1
                            && side[k1 - 2].level == side[k1 - 1].level
                            && side[k1 - 1].is_constant()
                            && side[k1 - 2].is_op(Op::Power)
                        {
                            i += 2;
                            continue 'next_divide;
                        }
                    }

                    // the conjugate: the denominator with this term negated
                    let neg_one_loc = i1 + 1;
                    let mut conjugate = side[i + 1..neg_one_loc].to_vec();
                    conjugate.extend([
                        Token::constant(div_level + 2, -1.0),
                        Token::operator(div_level + 2, Op::Times),
                    ]);
                    conjugate.extend(side[neg_one_loc..end_loc].iter().enumerate().map(|(n, t)| {
                        if n < j - neg_one_loc {
                            Token { level: t.level + 1, ..*t }
                        } else {
                            *t
                        }
                    }));
                    let k = conjugate.len();
                    cx.check_len(side.len() + 2 * (k + 1))?;

                    let mut tokens = Vec::with_capacity(2 * (k + 1));
                    tokens.push(Token::operator(div_level, Op::Times));
                    tokens.extend_from_slice(&conjugate);
                    tokens.push(Token::operator(div_level, Op::Divide));
                    tokens.extend_from_slice(&conjugate);
                    side.splice(end_loc..end_loc, tokens);
                    log::debug!("square roots in denominator rationalized");
                    modified = true;
                    i = end_loc + 2 * (k + 1);
                    continue 'next_divide;
                }
            }

            if j >= end_loc {
                break;
            }
            i1 = j;
            j += 2;
            while j < end_loc && side[j].level != div_level + 1 {
                j += 2;
            }
        }
        i += 2;
    }
    Ok(modified)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use crate::{
        simplify::organize::organize,
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
        organize(&mut side).unwrap();
        (changed, display(&cx, &side))
    }

    #[test]
    fn divides_by_the_imaginary_unit() {
        assert_eq!(run("x/i", div_imaginary), (true, "x*-1*i".to_string()));
    }

    #[test]
    fn multiplies_by_the_conjugate() {
        assert_eq!(
            run("1/(2 + 3*i)", div_imaginary),
            (true, "1/((2 + 3*0)^2 + (3*1)^2)*(2 + 3*-1*i)".to_string()),
        );
        assert_eq!(
            run("1/(x - i)", div_imaginary),
            (true, "1/((x - 0)^2 + 1^2)*(x - -1*i)".to_string()),
        );
    }

    #[test]
    fn leaves_real_denominators_alone() {
        assert_eq!(run("1/(x + 2)", div_imaginary).0, false);
        assert_eq!(run("1/(i + i*x)", div_imaginary).0, false);
    }

    #[test]
    fn rationalizes_square_roots() {
        assert_eq!(
            run("1/(1 + x^0.5)", rationalize),
            (true, "1/(1 + x^0.5)*(1 + -1*x^0.5)/(1 + -1*x^0.5)".to_string()),
        );
        assert_eq!(
            run("1/(2*x^0.5 - 1)", rationalize),
            (true, "1/(2*x^0.5 - 1)*(-1*2*x^0.5 - 1)/(-1*2*x^0.5 - 1)".to_string()),
        );
    }

    #[test]
    fn skips_denominators_without_roots() {
        assert_eq!(run("1/(1 + x^2)", rationalize).0, false);
        assert_eq!(run("1/x^0.5", rationalize).0, false);
    }
}
