//! Rule-based symbolic differentiation.

use crate::{
    complex::parse_complex,
    ctxt::Ctxt,
    error::Error,
    poly::div::raised,
    simplify::{elim_loop, organize::organize, simpa_repeat_side},
    token::{side::binary_parenthesize, Op, Token, Var},
};

/// Returns true if the token is the variable being differentiated by. [`Var::MATCH_ANY`]
/// differentiates by every named variable at once.
fn is_diff_var(t: &Token, v: Var) -> bool {
    t.as_var().map_or(false, |w| if v == Var::MATCH_ANY { w.is_symbolic() } else { w == v })
}

/// Replaces the side with its derivative with respect to `v`, by applying the sum, product,
/// quotient, and power rules recursively.
///
/// Returns false if the side can't be differentiated. The result is not simplified.
pub fn differentiate(cx: &mut Ctxt, side: &mut Vec<Token>, v: Var) -> Result<bool, Error> {
    organize(side)?;

    // every product and quotient gets a level of its own
    for i in (1..side.len()).step_by(2) {
        if side[i].is_op(Op::Times) || side[i].is_op(Op::Divide) {
            binary_parenthesize(side, i);
        }
    }
    d_recurse(cx, side, 0, 1, v)
}

fn d_recurse(cx: &mut Ctxt, side: &mut Vec<Token>, loc: usize, level: i32, v: Var) -> Result<bool, Error> {
    if side[loc].level < level {
        let d = if is_diff_var(&side[loc], v) { 1.0 } else { 0.0 };
        side[loc] = Token::constant(side[loc].level, d);
        return Ok(true);
    }

    let mut op = None;
    let mut oploc = loc + 1;
    let mut endloc = loc + 1;
    while endloc < side.len() && side[endloc].level >= level {
        if side[endloc].level == level {
            if op.map_or(false, |o: Op| !o.is_additive()) {
                return Err(Error::Bug("differentiating with unparenthesized operators"));
            }
            op = side[endloc].op();
            oploc = endloc;
        }
        endloc += 2;
    }
    let endloc = endloc.min(side.len());

    match op {
        None | Some(Op::Plus | Op::Minus) => {
            let mut i = loc;
            while i < side.len() && side[i].level >= level {
                if side[i].op().is_some() {
                    i += 1;
                    continue;
                }
                if !d_recurse(cx, side, i, level + 1, v)? {
                    return Ok(false);
                }
                i += 1;
                while i < side.len() && side[i].level > level {
                    i += 2;
                }
            }
            Ok(true)
        },
        Some(Op::Times) => {
            // d(u*v) = d(u)*v + u*d(v)
            cx.check_len(side.len() + 1 + (endloc - loc))?;
            let product = raised(&side[loc..endloc], 1).collect::<Vec<_>>();
            let mut tokens = product.clone();
            tokens.push(Token::operator(level, Op::Plus));
            tokens.extend_from_slice(&product);
            side.splice(loc..endloc, tokens);

            if !d_recurse(cx, side, endloc + (oploc - loc) + 2, level + 2, v)? {
                return Ok(false);
            }
            d_recurse(cx, side, loc, level + 2, v)
        },
        Some(Op::Divide) => {
            // d(u/v) = (d(u)*v - u*d(v))/v^2
            cx.check_len(side.len() + 3 + (endloc - loc) + (endloc - oploc))?;
            let mut product = raised(&side[loc..endloc], 2).collect::<Vec<_>>();
            product[oploc - loc].set_op(Op::Times);
            let denominator = raised(&side[oploc + 1..endloc], 2).collect::<Vec<_>>();

            let mut tokens = product.clone();
            tokens.push(Token::operator(level + 1, Op::Minus));
            tokens.extend_from_slice(&product);
            tokens.push(Token::operator(level, Op::Divide));
            tokens.extend(denominator);
            tokens.push(Token::operator(level + 1, Op::Power));
            tokens.push(Token::constant(level + 1, 2.0));
            side.splice(loc..endloc, tokens);

            if !d_recurse(cx, side, endloc + (oploc - loc) + 2, level + 3, v)? {
                return Ok(false);
            }
            d_recurse(cx, side, loc, level + 3, v)
        },
        Some(Op::Power) => d_power(cx, side, loc, oploc, endloc, level, v),
        Some(_) => {
            // other operators can only be differentiated if they are constant
            if side[loc..endloc].iter().any(|t| is_diff_var(t, v)) {
                return Ok(false);
            }
            side.splice(loc..endloc, [Token::constant(level, 0.0)]);
            Ok(true)
        },
    }
}

fn d_power(
    cx: &mut Ctxt,
    side: &mut Vec<Token>,
    loc: usize,
    oploc: usize,
    endloc: usize,
    level: i32,
    v: Var,
) -> Result<bool, Error> {
    if side[oploc..endloc].iter().any(|t| is_diff_var(t, v)) {
        // d(c^u) = c^u*ln(c)*d(u), only for a constant base
        let Some(c) = parse_complex(cx, &side[loc..oploc]) else {
            return Ok(false);
        };
        let ln = c.ln();
        cx.check_len(side.len() + (endloc - oploc) + 6)?;
        let mut tokens = vec![
            Token::operator(level, Op::Times),
            Token::constant(level + 1, ln.re),
            Token::operator(level + 1, Op::Plus),
            Token::constant(level + 2, ln.im),
            Token::operator(level + 2, Op::Times),
            Token::variable(level + 2, Var::IMAGINARY),
            Token::operator(level, Op::Times),
        ];
        let exponent = endloc + tokens.len();
        tokens.extend_from_slice(&side[oploc + 1..endloc]);
        side.splice(endloc..endloc, tokens);
        for t in &mut side[loc..endloc] {
            t.level += 1;
        }
        return d_recurse(cx, side, exponent, level + 1, v);
    }

    // d(u^n) = n*u^(n - 1)*d(u)
    let exponent = &side[oploc + 1..endloc];
    let mut tokens = exponent.to_vec();
    tokens.push(Token::operator(level, Op::Times));
    tokens.extend(raised(&side[loc..=oploc], 1));
    tokens.extend(raised(exponent, 2));
    tokens.push(Token::operator(level + 2, Op::Minus));
    tokens.push(Token::constant(level + 2, 1.0));
    tokens.push(Token::operator(level, Op::Times));
    let base = tokens.len();
    tokens.extend_from_slice(&side[loc..oploc]);
    cx.check_len(side.len() - (endloc - loc) + tokens.len())?;
    side.splice(loc..endloc, tokens);
    d_recurse(cx, side, loc + base, level + 1, v)
}

/// Takes the derivative of `side` with respect to `v`, `order` times, simplifying after each.
/// With `simplify` false, only constants are folded.
///
/// Returns `None` if differentiation fails. Stops early once the derivative is zero.
pub fn derivative(
    cx: &mut Ctxt,
    side: &[Token],
    v: Var,
    order: u32,
    simplify: bool,
) -> Result<Option<Vec<Token>>, Error> {
    let mut result = side.to_vec();
    for n in 0..order {
        if result.len() == 1 && result[0].is_constant_eq(0.0) {
            log::info!("0 reached after {} derivatives taken", n);
            break;
        }
        if !differentiate(cx, &mut result, v)? {
            log::debug!("differentiation failed");
            return Ok(None);
        }
        if simplify {
            simpa_repeat_side(cx, &mut result, true, false)?;
        } else {
            elim_loop(cx, &mut result)?;
        }
    }
    Ok(Some(result))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use crate::token::{fmt::display, from_ast::parse_side, side::is_well_formed};
    use super::*;

    fn derived(src: &str, var: &str) -> String {
        let mut cx = Ctxt::default();
        let side = parse_side(&mut cx, src).unwrap();
        let v = cx.vars.intern(var);
        let result = derivative(&mut cx, &side, v, 1, true).unwrap().unwrap();
        assert!(is_well_formed(&result), "{:?}", result);
        display(&cx, &result)
    }

    #[test]
    fn constants_and_variables() {
        assert_eq!(derived("5", "x"), "0");
        assert_eq!(derived("x", "x"), "1");
        assert_eq!(derived("y", "x"), "0");
    }

    #[test]
    fn power_rule() {
        assert_eq!(derived("x^3", "x"), "3*x^2");
    }

    #[test]
    fn sum_rule() {
        assert_eq!(derived("x^2 + 3*x + 7", "x"), "2*x + 3");
    }

    #[test]
    fn product_rule() {
        assert_eq!(derived("x*y", "x"), "y");
        assert_eq!(derived("x*x", "x"), "2*x");
    }

    #[test]
    fn unsimplified_result_is_well_formed() {
        let mut cx = Ctxt::default();
        let mut side = parse_side(&mut cx, "(x + 1)/(x - 1)").unwrap();
        let x = cx.vars.intern("x");
        assert!(differentiate(&mut cx, &mut side, x).unwrap());
        assert!(is_well_formed(&side), "{:?}", side);
        assert!(side.iter().any(|t| t.is_op(Op::Divide)));
    }

    #[test]
    fn constant_base_with_variable_exponent() {
        let mut cx = Ctxt::default();
        let mut side = parse_side(&mut cx, "e^x").unwrap();
        let x = cx.vars.intern("x");
        assert!(differentiate(&mut cx, &mut side, x).unwrap());
        assert!(is_well_formed(&side));

        // ln(e) = 1, so only e^x remains
        simpa_repeat_side(&mut cx, &mut side, true, false).unwrap();
        assert_eq!(display(&cx, &side), "e^x");
    }

    #[test]
    fn variable_base_and_exponent_fails() {
        let mut cx = Ctxt::default();
        let side = parse_side(&mut cx, "x^x").unwrap();
        let x = cx.vars.intern("x");
        assert_eq!(derivative(&mut cx, &side, x, 1, true).unwrap(), None);
    }

    #[test]
    fn higher_orders_stop_at_zero() {
        let mut cx = Ctxt::default();
        let side = parse_side(&mut cx, "x^2").unwrap();
        let x = cx.vars.intern("x");
        let result = derivative(&mut cx, &side, x, 5, true).unwrap().unwrap();
        assert_eq!(display(&cx, &result), "0");
    }

    #[test]
    fn modulus_without_the_variable() {
        let mut cx = Ctxt::default();
        let x = cx.vars.intern("x");
        let mut side = parse_side(&mut cx, "x + y%3").unwrap();
        assert!(differentiate(&mut cx, &mut side, x).unwrap());
        elim_loop(&mut cx, &mut side).unwrap();
        assert_eq!(display(&cx, &side), "1");

        let mut side = parse_side(&mut cx, "x%3").unwrap();
        assert!(!differentiate(&mut cx, &mut side, x).unwrap());
    }
}
