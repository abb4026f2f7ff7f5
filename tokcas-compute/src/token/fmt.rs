//! Single-line display of expression sides.

use crate::{ctxt::Ctxt, token::{side::min_level, Op, Token, TokenKind, VarTable}};
use std::fmt;

/// Formats a constant with up to 14 significant digits.
pub fn fmt_constant(d: f64) -> String {
    if d.is_nan() {
        return "nan".to_string();
    }
    if d.is_infinite() {
        return if d < 0.0 { "-inf" } else { "inf" }.to_string();
    }
    if d == 0.0 {
        return "0".to_string();
    }
    if d % 1.0 == 0.0 && d.abs() < 1e15 {
        return format!("{:.0}", d);
    }

    let magnitude = d.abs().log10().floor() as i32;
    if !(-5..15).contains(&magnitude) {
        return format!("{:.13e}", d)
            .split_once('e')
            .map(|(mantissa, exp)| {
                let mantissa = mantissa.trim_end_matches('0').trim_end_matches('.');
                format!("{}e{}", mantissa, exp)
            })
            .unwrap_or_default();
    }

    let decimals = (13 - magnitude).max(0) as usize;
    let s = format!("{:.*}", decimals, d);
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        s
    }
}

/// Binding strength of an operator when displayed.
fn precedence(op: Op) -> u8 {
    match op {
        Op::Plus | Op::Minus | Op::Negate => 1,
        Op::Times | Op::Divide | Op::Modulus | Op::IDivide => 2,
        Op::Power => 3,
        Op::Factorial => 4,
    }
}

/// Returns true if a sub-expression whose top operator is `child` needs parentheses between the
/// operators `prev` and `next`.
fn needs_parens(child: Op, prev: Option<Op>, next: Option<Op>) -> bool {
    let c = precedence(child);
    let left_of_next = next.map_or(false, |n| c < precedence(n) || (c == precedence(n) && n == Op::Power));
    let right_of_prev = prev.map_or(false, |p| {
        c < precedence(p)
            || (c == precedence(p)
                && !((p == Op::Plus && child.is_additive())
                    || (p == Op::Times && child.is_multiplicative())))
    });
    left_of_next || right_of_prev
}

/// Displays a side on one line, with only the parentheses that the levels make necessary. Created
/// by [`DisplaySide::display`].
pub struct SideDisplay<'a> {
    side: &'a [Token],
    vars: &'a VarTable,
}

impl SideDisplay<'_> {
    /// Writes the operands and operators of `p` that live on `level`.
    fn fmt_level(&self, f: &mut fmt::Formatter, p: &[Token], level: i32) -> fmt::Result {
        let mut start = 0;
        let mut dummy = false;
        while start < p.len() {
            let mut end = start + 1;
            while end < p.len() && p[end].level > level {
                end += 2;
            }
            let prev = start.checked_sub(1).and_then(|i| p[i].op());
            let next = p.get(end).and_then(Token::op);
            if !dummy {
                self.fmt_operand(f, &p[start..end], prev, next)?;
            }

            let Some(op) = next else {
                break;
            };
            // the right operand of a factorial is a placeholder
            dummy = op == Op::Factorial;
            if op.is_additive() {
                write!(f, " {} ", op.symbol())?;
            } else {
                write!(f, "{}", op.symbol())?;
            }
            start = end + 1;
        }
        Ok(())
    }

    fn fmt_operand(
        &self,
        f: &mut fmt::Formatter,
        p: &[Token],
        prev: Option<Op>,
        next: Option<Op>,
    ) -> fmt::Result {
        if let [token] = p {
            return match token.kind {
                TokenKind::Constant(d) if d < 0.0 && matches!(next, Some(Op::Power | Op::Factorial)) => {
                    write!(f, "({})", fmt_constant(d))
                },
                TokenKind::Constant(d) => write!(f, "{}", fmt_constant(d)),
                TokenKind::Variable(v) => write!(f, "{}", self.vars.name(v)),
                TokenKind::Operator(op) => write!(f, "{}", op.symbol()),
            };
        }

        let level = min_level(p);
        let child = p.iter().skip(1).step_by(2).find(|t| t.level == level).and_then(Token::op);
        let parens = child.map_or(false, |c| needs_parens(c, prev, next));
        if parens {
            write!(f, "(")?;
        }
        self.fmt_level(f, p, level)?;
        if parens {
            write!(f, ")")?;
        }
        Ok(())
    }
}

impl fmt::Display for SideDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.side.is_empty() {
            return Ok(());
        }
        self.fmt_level(f, self.side, min_level(self.side))
    }
}

/// Adds a `display` method to token slices.
pub trait DisplaySide {
    /// Returns a value that displays the side using the names in `vars`.
    fn display<'a>(&'a self, vars: &'a VarTable) -> SideDisplay<'a>;
}

impl DisplaySide for [Token] {
    fn display<'a>(&'a self, vars: &'a VarTable) -> SideDisplay<'a> {
        SideDisplay { side: self, vars }
    }
}

/// Formats a side using the variable names of the context.
pub fn display(cx: &Ctxt, side: &[Token]) -> String {
    side.display(&cx.vars).to_string()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use super::*;

    #[test]
    fn constants() {
        assert_eq!(fmt_constant(14.0), "14");
        assert_eq!(fmt_constant(-0.5), "-0.5");
        assert_eq!(fmt_constant(0.1 + 0.2), "0.3");
        assert_eq!(fmt_constant(f64::INFINITY), "inf");
        assert_eq!(fmt_constant(1.5e20), "1.5e20");
    }

    #[test]
    fn parentheses_follow_levels() {
        let mut vars = VarTable::default();
        let a = vars.intern("a");
        let b = vars.intern("b");
        // (a + b)*2
        let side = [
            Token::variable(2, a),
            Token::operator(2, Op::Plus),
            Token::variable(2, b),
            Token::operator(1, Op::Times),
            Token::constant(1, 2.0),
        ];
        assert_eq!(side.display(&vars).to_string(), "(a + b)*2");
    }

    #[test]
    fn factorial_hides_dummy_operand() {
        let mut vars = VarTable::default();
        let n = vars.intern("n");
        let side = [Token::variable(1, n), Token::operator(1, Op::Factorial), Token::constant(1, 1.0)];
        assert_eq!(side.display(&vars).to_string(), "n!");
    }

    #[test]
    fn parentheses_only_where_needed() {
        let mut vars = VarTable::default();
        let x = vars.intern("x");
        // 1 + 2*x^3
        let side = [
            Token::constant(1, 1.0),
            Token::operator(1, Op::Plus),
            Token::constant(2, 2.0),
            Token::operator(2, Op::Times),
            Token::variable(3, x),
            Token::operator(3, Op::Power),
            Token::constant(3, 3.0),
        ];
        assert_eq!(side.display(&vars).to_string(), "1 + 2*x^3");

        // x - (1 + x), (x^2)^3, (-4)^0.5
        let side = [
            Token::variable(1, x),
            Token::operator(1, Op::Minus),
            Token::constant(2, 1.0),
            Token::operator(2, Op::Plus),
            Token::variable(2, x),
        ];
        assert_eq!(side.display(&vars).to_string(), "x - (1 + x)");
        let side = [
            Token::variable(2, x),
            Token::operator(2, Op::Power),
            Token::constant(2, 2.0),
            Token::operator(1, Op::Power),
            Token::constant(1, 3.0),
        ];
        assert_eq!(side.display(&vars).to_string(), "(x^2)^3");
        let side = [Token::constant(1, -4.0), Token::operator(1, Op::Power), Token::constant(1, 0.5)];
        assert_eq!(side.display(&vars).to_string(), "(-4)^0.5");
    }
}
