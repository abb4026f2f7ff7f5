//! Canonicalization of parenthesization levels.

use crate::{error::Error, token::{Op, Token}};

/// Fixes up the levels of a side in place: removes redundant parentheses, closes gaps between
/// levels, and merges nested runs of `+`/`-` (or `*`/`/`) into the enclosing run, inverting
/// operators that were absorbed through a `-` or `/`.
///
/// Every other pass calls this after editing a side, so it is kept to a single recursive walk.
pub fn organize(side: &mut [Token]) -> Result<(), Error> {
    if side.is_empty() || side.len() % 2 == 0 {
        return Err(Error::Bug("organize() called with bad expression size"));
    }
    org_recurse(side, 0, 1);
    Ok(())
}

/// Lowers the levels of `p` by one, inverting the operators that end up on `level` if `invert`.
fn org_up_level(p: &mut [Token], level: i32, invert: bool) {
    for t in p {
        t.level -= 1;
        if invert && t.level == level {
            if let Some(op) = t.op() {
                t.set_op(op.inverse());
            }
        }
    }
}

/// Organizes the sub-expression starting at `loc`, moving it up to `level`. Returns the operator of
/// the sub-expression and the index of its last token.
fn org_recurse(p: &mut [Token], loc: usize, level: i32) -> (Option<Op>, usize) {
    let mut min1 = p[loc].level;
    let mut i = loc + 1;
    while i < p.len() {
        if p[i].level < min1 {
            if p[i].level < level {
                break;
            }
            min1 = p[i].level;
        }
        i += 2;
    }
    let eloc = i - 1;
    if eloc == loc {
        p[loc].level = (level - 1).max(1);
        return (None, eloc);
    }
    if min1 > level {
        for t in &mut p[loc..=eloc] {
            t.level -= min1 - level;
        }
    }

    let op = p[loc + 1..eloc]
        .iter()
        .step_by(2)
        .find(|t| t.level == level)
        .and_then(Token::op);

    let mut i = loc;
    while i <= eloc {
        if p[i].level > level {
            let (sub_op, sub_eloc) = org_recurse(p, i, level + 1);
            let merge = match (sub_op, op) {
                (Some(sub), Some(op)) if sub.is_additive() && op.is_additive() => Some(Op::Minus),
                (Some(sub), Some(op)) if sub.is_multiplicative() && op.is_multiplicative() => Some(Op::Divide),
                _ => None,
            };
            if let Some(inverting_op) = merge {
                let invert = i > loc && p[i - 1].is_op(inverting_op);
                org_up_level(&mut p[i..=sub_eloc], level, invert);
            }
            i = sub_eloc;
        }
        i += 2;
    }
    (op, eloc)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rand::{rngs::StdRng, Rng, SeedableRng};
    use crate::{ctxt::Ctxt, token::{fmt::display, from_ast::parse_side, side::is_well_formed}};
    use super::*;

    fn organized(cx: &mut Ctxt, src: &str) -> String {
        let mut side = parse_side(cx, src).unwrap();
        organize(&mut side).unwrap();
        display(cx, &side)
    }

    #[test]
    fn flattens_sums() {
        let mut cx = Ctxt::default();
        assert_eq!(organized(&mut cx, "a + (b + c)"), "a + b + c");
        assert_eq!(organized(&mut cx, "a - (b - c)"), "a - b + c");
        assert_eq!(organized(&mut cx, "((a))"), "a");
    }

    #[test]
    fn flattens_products() {
        let mut cx = Ctxt::default();
        assert_eq!(organized(&mut cx, "a / (b / c)"), "a/b*c");
        assert_eq!(organized(&mut cx, "a * (b * c)"), "a*b*c");
        assert_eq!(organized(&mut cx, "a * (b + c)"), "a*(b + c)");
    }

    #[test]
    fn keeps_powers_apart() {
        let mut cx = Ctxt::default();
        assert_eq!(organized(&mut cx, "(a^b)^c"), "(a^b)^c");
        assert_eq!(organized(&mut cx, "a^(b^c)"), "a^(b^c)");
    }

    /// Builds a random expression over `a`, `b`, and small integers.
    fn random_expr(rng: &mut StdRng, depth: u32) -> String {
        if depth == 0 || rng.gen_bool(0.3) {
            return match rng.gen_range(0..3) {
                0 => "a".to_string(),
                1 => "b".to_string(),
                _ => rng.gen_range(1..9).to_string(),
            };
        }
        let op = ["+", "-", "*", "/", "^"][rng.gen_range(0..5)];
        format!("({} {} {})", random_expr(rng, depth - 1), op, random_expr(rng, depth - 1))
    }

    #[test]
    fn idempotent_on_random_sides() {
        let mut cx = Ctxt::default();
        let mut rng = StdRng::seed_from_u64(0x5eed);
        for _ in 0..200 {
            let src = random_expr(&mut rng, 4);
            let mut side = parse_side(&mut cx, &src).unwrap();
            // add redundant parentheses around random operators
            for _ in 0..3 {
                if side.len() > 1 {
                    let i = rng.gen_range(0..side.len() / 2) * 2 + 1;
                    crate::token::side::binary_parenthesize(&mut side, i);
                }
            }
            organize(&mut side).unwrap();
            let once = side.clone();
            organize(&mut side).unwrap();
            assert_eq!(side, once, "{}", src);
            assert!(is_well_formed(&side), "{}", src);
        }
    }

    #[test]
    fn rejects_even_length() {
        let mut side = vec![Token::constant(1, 1.0), Token::operator(1, Op::Plus)];
        assert!(organize(&mut side).is_err());
        let mut cx = Ctxt::default();
        let side = parse_side(&mut cx, "x + 1").unwrap();
        assert!(is_well_formed(&side));
    }
}
