//! Validation and canonical term order.

use crate::{error::Error, token::{Op, Token}};

/// Checks that a side is a well-formed token array and puts terms in a more readable order:
///
/// - a sum that starts with a negative constant term starts with its first added term instead, so
///   `-1*b + y` becomes `y + -1*b` (and then `y - b` after [`elim_k`])
/// - in a product, multiplied factors move in front of the first divided one, so `1/m*y` becomes
///   `1*y/m`
///
/// Returns true if the side changed; [`elim_k`] should be run afterwards. Fails with [`Error::Bug`]
/// if the levels or operators of the side are inconsistent.
///
/// [`elim_k`]: crate::simplify::identity::elim_k
pub fn reorder(side: &mut [Token]) -> Result<bool, Error> {
    order_recurse(side, 0, 1)
}

/// Swaps the operands starting at `i1` and `i2` (both at `level`), leaving what is between them in
/// place.
fn swap(side: &mut [Token], level: i32, i1: usize, i2: usize) {
    let operand_end = |start: usize| {
        let mut e = start + 1;
        while e < side.len() && side[e].level > level {
            e += 2;
        }
        e
    };
    let e1 = operand_end(i1);
    let e2 = operand_end(i2);

    let mut swapped = side[i2..e2].to_vec();
    swapped.extend_from_slice(&side[e1..i2]);
    swapped.extend_from_slice(&side[i1..e1]);
    side[i1..e2].copy_from_slice(&swapped);
}

fn order_recurse(side: &mut [Token], loc: usize, level: i32) -> Result<bool, Error> {
    const CORRUPT: Error = Error::Bug("internal representation of expression is corrupt");

    if loc % 2 != 0 {
        return Err(CORRUPT);
    }

    let mut modified = false;
    let mut op: Option<Op> = None;
    let mut i = loc;
    while i < side.len() {
        let t = side[i];
        if t.level < level {
            if t.op().is_none() || t.level < 1 {
                return Err(CORRUPT);
            }
            break;
        }
        if t.level > level {
            modified |= order_recurse(side, i, level + 1)?;
            i += 1;
            while i < side.len() && side[i].level > level {
                i += 1;
            }
            continue;
        }

        match t.op() {
            Some(_) if i % 2 == 0 => return Err(CORRUPT),
            Some(Op::Negate) => return Err(CORRUPT),
            Some(this) => match op {
                None => op = Some(this),
                Some(first) if first.is_additive() && this.is_additive() => {},
                Some(first) if first.is_multiplicative() && this.is_multiplicative() => {},
                Some(_) => return Err(CORRUPT),
            },
            None if i % 2 != 0 => return Err(CORRUPT),
            None => {},
        }
        i += 1;
    }
    // `i` is at the operator that ends this sub-expression, or at the end of the side
    if i % 2 == 0 {
        return Err(CORRUPT);
    }

    match op {
        Some(Op::Plus | Op::Minus) => {
            let leads_negative = side[loc].as_constant().map_or(false, |d| d < 0.0)
                && (side[loc].level == level
                    || (side[loc + 1].level == level + 1
                        && side[loc + 1].op().map_or(false, Op::is_multiplicative)));
            if leads_negative {
                let plus = (loc + 1..i)
                    .step_by(2)
                    .find(|&j| side[j].level == level && side[j].is_op(Op::Plus));
                if let Some(j) = plus {
                    swap(side, level, loc, j + 1);
                    modified = true;
                }
            }
        },
        Some(Op::Times | Op::Divide) => {
            let Some(mut j) = (loc + 1..i)
                .step_by(2)
                .find(|&j| side[j].level == level && side[j].is_op(Op::Divide))
            else {
                return Ok(modified);
            };
            let mut k = j + 2;
            while k < i {
                if side[k].level == level && side[k].is_op(Op::Times) {
                    let mut n = k + 2;
                    while n < i && side[n].level > level {
                        n += 2;
                    }
                    let n = n - k;
                    side[j..k + n].rotate_right(n);
                    j += n;
                    k += n;
                    modified = true;
                    continue;
                }
                k += 2;
            }
        },
        _ => {},
    }
    Ok(modified)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use crate::{
        ctxt::Ctxt,
        token::{fmt::display, from_ast::parse_side},
    };
    use super::*;

    fn run(src: &str) -> (bool, String) {
        let mut cx = Ctxt::default();
        let mut side = parse_side(&mut cx, src).unwrap();
        let changed = reorder(&mut side).unwrap();
        (changed, display(&cx, &side))
    }

    #[test]
    fn negative_constant_moves_behind_first_added_term() {
        assert_eq!(run("-3 + x"), (true, "x + -3".to_string()));
        assert_eq!(run("-2*y + x - z"), (true, "x + -2*y - z".to_string()));
        assert_eq!(run("-3 - x"), (false, "-3 - x".to_string()));
    }

    #[test]
    fn multiplied_factors_move_before_divided_ones() {
        assert_eq!(run("a/b*c"), (true, "a*c/b".to_string()));
        assert_eq!(run("1/m*(y + z)"), (true, "1*(y + z)/m".to_string()));
        assert_eq!(run("a*c/b"), (false, "a*c/b".to_string()));
    }

    #[test]
    fn reorders_nested_expressions() {
        assert_eq!(run("(a/b*c)^2"), (true, "(a*c/b)^2".to_string()));
    }

    #[test]
    fn detects_corruption() {
        let mut side = vec![
            Token::variable(1, crate::token::Var::E),
            Token::operator(1, Op::Plus),
            Token::variable(1, crate::token::Var::PI),
            Token::operator(1, Op::Times),
            Token::variable(1, crate::token::Var::E),
        ];
        assert!(matches!(reorder(&mut side), Err(Error::Bug(_))));

        let mut side = vec![Token::operator(1, Op::Plus)];
        assert!(reorder(&mut side).is_err());
    }
}
