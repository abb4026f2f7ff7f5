//! Conversion of decimal constants to fractions, and grouping of denominators, for display.

use crate::{
    config::FractionsDisplay,
    ctxt::Ctxt,
    error::Error,
    numeric::f_to_fraction,
    simplify::{elim_loop, organize::organize},
    token::{Op, Token},
};

/// Converts every non-integer constant that is exactly a simple fraction into `numerator/denominator`.
///
/// A constant that multiplies a product puts its denominator into the product: `0.5*x*y/z` becomes
/// `x*y/2/z`. Constants that are already divisors are left alone. Returns true if any fraction was
/// created.
pub fn make_simple_fractions(cx: &mut Ctxt, side: &mut Vec<Token>) -> Result<bool, Error> {
    make_fractions_with(cx, side, false)
}

/// Like [`make_simple_fractions`], but a fraction greater than 1 in magnitude becomes a mixed
/// fraction: `2.25 -> 2 + 1/4`.
pub fn make_mixed_fractions(cx: &mut Ctxt, side: &mut Vec<Token>) -> Result<bool, Error> {
    let modified = make_fractions_with(cx, side, true)?;
    if modified {
        organize(side)?;
    }
    Ok(modified)
}

/// Converts constants to fractions in the style selected by the configuration.
pub fn make_fractions(cx: &mut Ctxt, side: &mut Vec<Token>) -> Result<bool, Error> {
    match cx.config.fractions_display {
        FractionsDisplay::Mixed => make_mixed_fractions(cx, side),
        _ => make_simple_fractions(cx, side),
    }
}

fn make_fractions_with(cx: &mut Ctxt, side: &mut Vec<Token>, mixed: bool) -> Result<bool, Error> {
    let mut modified = false;
    let mut i = 0;
    while i < side.len() {
        let Some(d) = side[i].as_constant() else {
            i += 2;
            continue;
        };
        let level = side[i].level;
        if i > 0 && side[i - 1].level == level && side[i - 1].is_op(Op::Divide) {
            i += 2;
            continue;
        }
        let Some((numerator, denominator)) = f_to_fraction(d) else {
            i += 2;
            continue;
        };
        if denominator == 1.0 {
            side[i].set_constant(numerator);
            i += 2;
            continue;
        }
        modified = true;

        if mixed && numerator.abs() > denominator {
            let whole = (numerator.abs() / denominator).trunc();
            let remainder = crate::numeric::my_round((numerator.abs() / denominator).fract() * denominator);
            let tokens = if numerator < 0.0 {
                vec![
                    Token::constant(level + 1, -1.0),
                    Token::operator(level + 1, Op::Times),
                    Token::constant(level + 2, whole),
                    Token::operator(level + 2, Op::Plus),
                    Token::constant(level + 3, remainder),
                    Token::operator(level + 3, Op::Divide),
                    Token::constant(level + 3, denominator),
                ]
            } else {
                vec![
                    Token::constant(level + 1, whole),
                    Token::operator(level + 1, Op::Plus),
                    Token::constant(level + 2, remainder),
                    Token::operator(level + 2, Op::Divide),
                    Token::constant(level + 2, denominator),
                ]
            };
            let n = tokens.len();
            crate::token::side::replace(cx, side, i..i + 1, &tokens)?;
            i += n + 1;
            continue;
        }

        cx.check_len(side.len() + 2)?;
        let divisor = [Token::operator(level, Op::Divide), Token::constant(level, denominator)];
        let mut inc_level = side.len() > 1;
        if i + 1 < side.len() && side[i + 1].level == level {
            match side[i + 1].op() {
                Some(Op::Times) => {
                    // the denominator goes before the first divisor of the product
                    let mut j = i + 3;
                    while j < side.len() && side[j].level >= level {
                        if side[j].level == level && side[j].is_op(Op::Divide) {
                            break;
                        }
                        j += 2;
                    }
                    if numerator == 1.0 {
                        side.drain(i..i + 2);
                        side.splice(j - 2..j - 2, divisor);
                        // look at what moved into place
                        continue;
                    }
                    side[i].set_constant(numerator);
                    side.splice(j..j, divisor);
                    i += 2;
                    continue;
                },
                Some(Op::Divide) => inc_level = false,
                _ => {},
            }
        }
        side[i].set_constant(numerator);
        side.splice(i + 1..i + 1, divisor);
        if inc_level {
            for t in &mut side[i..i + 3] {
                t.level += 1;
            }
        }
        i += 4;
    }
    Ok(modified)
}

/// Groups the denominators of each product together: `a/b/c*d` becomes `a/(b*c)*d`.
///
/// The grouped denominators are not necessarily last; [`reorder`] puts them there.
///
/// [`reorder`]: crate::simplify::order::reorder
pub fn group_proc(side: &mut [Token]) {
    group_recurse(side, 0, 1);
}

fn group_recurse(side: &mut [Token], loc: usize, level: i32) {
    let mut i = loc;
    while i < side.len() && side[i].level >= level {
        if side[i].level > level {
            group_recurse(side, i, level + 1);
            i += 1;
            while i < side.len() && side[i].level > level {
                i += 2;
            }
            continue;
        }
        i += 1;
    }
    let e1 = i;

    // move every run of divisors next to the first one
    let mut first_divide = None;
    let mut edi = e1;
    let mut group = false;
    let mut i = loc + 1;
    while i < e1 {
        if side[i].level == level {
            if side[i].is_op(Op::Divide) {
                let Some(di) = first_divide else {
                    first_divide = Some(i);
                    i += 2;
                    continue;
                };
                group = true;
                let mut end = i + 2;
                while end < e1 && !(side[end].level == level && !side[end].is_op(Op::Divide)) {
                    end += 2;
                }
                let len = end - i;
                if edi == e1 {
                    edi = end;
                    i = end + 2;
                    continue;
                }
                side[di..end].rotate_right(len);
                edi += len;
                i = end;
                continue;
            } else if first_divide.is_some() && edi == e1 {
                edi = i;
            }
        }
        i += 2;
    }

    if let (true, Some(di)) = (group, first_divide) {
        for t in &mut side[di + 1..edi] {
            if t.level == level && t.op().is_some() {
                t.set_op(Op::Times);
            }
            t.level += 1;
        }
    }
}

/// Makes a side ready for display: folds constants, converts them to fractions if configured, and
/// groups denominators. Returns true if any fraction was created.
pub fn fractions_and_group(cx: &mut Ctxt, side: &mut Vec<Token>) -> Result<bool, Error> {
    elim_loop(cx, side)?;
    let rv = match cx.config.fractions_display {
        FractionsDisplay::None => false,
        _ => make_fractions(cx, side)?,
    };
    group_proc(side);
    Ok(rv)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use crate::token::{fmt::display, from_ast::parse_side, side::is_well_formed};
    use super::*;

    fn run(src: &str, pass: fn(&mut Ctxt, &mut Vec<Token>) -> Result<bool, Error>) -> String {
        let mut cx = Ctxt::default();
        let mut side = parse_side(&mut cx, src).unwrap();
        pass(&mut cx, &mut side).unwrap();
        assert!(is_well_formed(&side), "{:?}", side);
        display(&cx, &side)
    }

    #[test]
    fn decimals_become_fractions() {
        assert_eq!(run("0.75", make_simple_fractions), "3/4");
        assert_eq!(run("0.5*x", make_simple_fractions), "x/2");
        assert_eq!(run("1.5*x/y", make_simple_fractions), "3*x/2/y");
        assert_eq!(run("x + 0.25", make_simple_fractions), "x + 1/4");
        assert_eq!(run("x/0.5", make_simple_fractions), "x/0.5");
    }

    #[test]
    fn irrational_constants_stay_decimal() {
        let mut cx = Ctxt::default();
        let mut side = vec![Token::constant(1, std::f64::consts::SQRT_2)];
        assert!(!make_simple_fractions(&mut cx, &mut side).unwrap());
    }

    #[test]
    fn mixed_fractions() {
        assert_eq!(run("2.25", make_mixed_fractions), "2 + 1/4");
        assert_eq!(run("-2.25", make_mixed_fractions), "-1*(2 + 1/4)");
        assert_eq!(run("0.25", make_mixed_fractions), "1/4");
    }

    #[test]
    fn denominators_are_grouped() {
        let mut cx = Ctxt::default();
        let mut side = parse_side(&mut cx, "a/b/c*d").unwrap();
        group_proc(&mut side);
        assert!(is_well_formed(&side));
        assert_eq!(display(&cx, &side), "a/(b*c)*d");

        let mut side = parse_side(&mut cx, "a/b*d/c").unwrap();
        group_proc(&mut side);
        assert_eq!(display(&cx, &side), "a/(c*b)*d");
    }

    #[test]
    fn display_preparation() {
        let mut cx = Ctxt::default();
        let mut side = parse_side(&mut cx, "0.5 + 0.25").unwrap();
        assert!(fractions_and_group(&mut cx, &mut side).unwrap());
        assert_eq!(display(&cx, &side), "3/4");

        cx.config.fractions_display = FractionsDisplay::None;
        let mut side = parse_side(&mut cx, "0.5 + 0.25").unwrap();
        assert!(!fractions_and_group(&mut cx, &mut side).unwrap());
        assert_eq!(display(&cx, &side), "0.75");
    }
}
