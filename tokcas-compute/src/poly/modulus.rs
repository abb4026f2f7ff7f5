//! Simplification of the modulus operator `%`. Variables named `integer...` allow more of it.

use crate::{
    compare::se_compare,
    ctxt::Ctxt,
    error::Error,
    token::{side::is_integer_expr, Op, Token},
    unfactor::uf_pplus,
};
use super::{div::raised, is_zero, poly_div};

/// Simplifies the modulus operators in a side:
///
/// - `(x%n)%n` becomes `x%n`
/// - `(i%n*j)%n` becomes `(i*j)%n` for integer `j`
/// - `(i%n + j)%n` becomes `(i + j)%n`, and `((i%n)*j + k)%n` becomes `(i*j + k)%n` for integer `j`
/// - integer multiples of `n` are removed from `x` in `x%n`, by polynomial division
///
/// Returns true if the side was modified.
pub fn mod_simp(cx: &mut Ctxt, side: &mut Vec<Token>) -> Result<bool, Error> {
    mod_recurse(cx, side, 0, 1)
}

/// Removes `side[range]`, which is a `%` operator and its modulus, if the modulus is `n`.
fn remove_same_modulus(cx: &Ctxt, side: &mut Vec<Token>, op: usize, end: usize, n: &[Token]) -> bool {
    if se_compare(cx, n, &side[op + 1..end]).is_match() {
        side.drain(op..end);
        true
    } else {
        false
    }
}

fn mod_recurse(cx: &mut Ctxt, side: &mut Vec<Token>, loc: usize, level: i32) -> Result<bool, Error> {
    let mut modified = false;
    let mut i = loc;
    while i < side.len() && side[i].level >= level {
        if side[i].level > level {
            modified |= mod_recurse(cx, side, i, level + 1)?;
            i += 1;
            while i < side.len() && side[i].level > level {
                i += 2;
            }
            continue;
        }
        i += 1;
    }
    // the deepest levels are finished first
    if modified {
        return Ok(true);
    }

    let mut i = loc + 1;
    while i < side.len() && side[i].level >= level {
        if !(side[i].level == level && side[i].is_op(Op::Modulus)) {
            i += 2;
            continue;
        }
        let mut k = i + 2;
        while k < side.len() && side[k].level > level {
            k += 2;
        }
        let modulus = side[i + 1..k.min(side.len())].to_vec();

        let mut last_op2 = None;
        let mut j = loc;
        while j < side.len() && side[j].level >= level {
            if side[j].level == level && side[j].op().is_some() {
                last_op2 = side[j].op();
                j += 1;
                continue;
            }
            if last_op2 == Some(Op::Modulus) {
                j += 1;
                continue;
            }
            last_op2 = Some(Op::Modulus);

            // the operand `j..k`, and its last operator one level down at `i1`
            let mut op = None;
            let mut i1 = j + 1;
            let mut k = j + 1;
            while k < side.len() && side[k].level > level {
                if side[k].level == level + 1 {
                    op = side[k].op();
                    i1 = k;
                }
                k += 2;
            }
            let k = k.min(side.len());
            let len2 = k - j;

            match op {
                Some(Op::Modulus) => {
                    if remove_same_modulus(cx, side, i1, k, &modulus) {
                        return Ok(true);
                    }
                },
                Some(Op::Times) if is_integer_expr(&cx.vars, &side[j..k]) => {
                    let mut i2 = j + 1;
                    let mut i1 = j + 1;
                    loop {
                        if i1 >= k || side[i1].level == level + 1 {
                            while i2 < i1 {
                                if side[i2].level == level + 2
                                    && side[i2].is_op(Op::Modulus)
                                    && remove_same_modulus(cx, side, i2, i1, &modulus)
                                {
                                    return Ok(true);
                                }
                                i2 += 2;
                            }
                        }
                        if i1 >= k {
                            break;
                        }
                        i1 += 2;
                    }
                },
                Some(Op::Plus | Op::Minus) => {
                    let mut i2 = j + 1;
                    let mut i1 = j + 1;
                    let mut term_start = j;
                    loop {
                        if i1 >= k || side[i1].level == level + 1 {
                            while i2 < i1 {
                                if side[i2].level == level + 2 {
                                    match side[i2].op() {
                                        Some(Op::Modulus) => {
                                            if remove_same_modulus(cx, side, i2, i1, &modulus) {
                                                return Ok(true);
                                            }
                                        },
                                        Some(Op::Times) => {
                                            i2 = i1 - 2;
                                            if is_integer_expr(&cx.vars, &side[term_start..i1]) {
                                                let mut i4 = term_start + 1;
                                                while i4 < i1 {
                                                    if side[i4].level == level + 3 && side[i4].is_op(Op::Modulus) {
                                                        let mut i5 = i4 + 2;
                                                        while i5 < i1 && side[i5].level > level + 3 {
                                                            i5 += 2;
                                                        }
                                                        if remove_same_modulus(cx, side, i4, i5, &modulus) {
                                                            return Ok(true);
                                                        }
                                                    }
                                                    i4 += 2;
                                                }
                                            }
                                        },
                                        _ => {},
                                    }
                                }
                                i2 += 2;
                            }
                            term_start = i1 + 1;
                        }
                        if i1 >= k {
                            break;
                        }
                        i1 += 2;
                    }
                },
                _ => {},
            }

            // remove integer multiples of the modulus: `x%n` becomes `remainder(x/n)%n`
            if let Some(d) = poly_div(cx, &side[j..k], &modulus, &mut None)? {
                let mut quotient = d.quotient;
                // so `integer%(integer^integer)` isn't simplified to 0
                uf_pplus(cx, &mut quotient)?;
                if is_integer_expr(&cx.vars, &quotient) && (d.remainder.len() < len2 || is_zero(&d.remainder)) {
                    cx.check_len(side.len() + d.remainder.len() - len2)?;
                    side.splice(j..k, raised(&d.remainder, level).collect::<Vec<_>>());
                    log::debug!("polynomial division successful in modulus simplification");
                    return Ok(true);
                }
            }
            j += 1;
        }
        i += 2;
    }
    Ok(modified)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use crate::token::{fmt::display, from_ast::parse_side, side::is_well_formed};
    use super::*;

    fn simplified(src: &str) -> (bool, String) {
        let mut cx = Ctxt::default();
        let mut side = parse_side(&mut cx, src).unwrap();
        let modified = mod_simp(&mut cx, &mut side).unwrap();
        assert!(is_well_formed(&side), "{:?}", side);
        (modified, display(&cx, &side))
    }

    #[test]
    fn repeated_modulus() {
        assert_eq!(simplified("(x%n)%n"), (true, "x%n".to_string()));
    }

    #[test]
    fn different_moduli_stay() {
        assert!(!simplified("(x%n)%m").0);
    }

    #[test]
    fn modulus_in_a_sum() {
        let (modified, shown) = simplified("(x%n + y)%n");
        assert!(modified);
        assert_eq!(shown.matches('%').count(), 1);
    }

    #[test]
    fn modulus_of_integer_products() {
        let (modified, shown) = simplified("((integer_a%integer_n)*integer_b)%integer_n");
        assert!(modified);
        assert_eq!(shown.matches('%').count(), 1);

        // not known to be an integer
        let (modified, _) = simplified("((integer_a%integer_n)*b)%integer_n");
        assert!(!modified);
    }

    #[test]
    fn multiples_are_removed() {
        assert_eq!(simplified("(integer_k*n + 1)%n"), (true, "1%n".to_string()));

        // the quotient must be an integer
        assert!(!simplified("(k*n + 1)%n").0);
    }
}
