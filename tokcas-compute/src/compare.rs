//! Structural comparison of sub-expressions.
//!
//! The comparator never simplifies. It decides whether two sub-expressions are the same up to the
//! order of operands in sums and products, and up to an overall factor of `-1`. Every factoring
//! pass leans on it to find common sub-expressions.

use crate::{
    consts::EPSILON,
    ctxt::Ctxt,
    token::{side::min_level, Op, Token, TokenKind},
};

/// The result of [`se_compare`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    /// The expressions are not known to be equal.
    Different,

    /// The expressions are equal.
    Equal,

    /// The first expression is equal to the second times `-1`.
    Opposite,
}

impl Comparison {
    /// Returns true if the expressions are equal, with or without a sign difference.
    pub fn is_match(self) -> bool {
        self != Comparison::Different
    }

    /// Returns true if the expressions are equal but have opposite signs.
    pub fn is_opposite(self) -> bool {
        self == Comparison::Opposite
    }

    fn from_sign(diff_sign: Option<bool>) -> Self {
        match diff_sign {
            None => Comparison::Different,
            Some(false) => Comparison::Equal,
            Some(true) => Comparison::Opposite,
        }
    }
}

/// Compares two sub-expressions for equality, without simplifying or modifying them.
///
/// Expressions whose sizes differ by more than a factor of three are declared different without
/// looking further.
pub fn se_compare(cx: &Ctxt, p1: &[Token], p2: &[Token]) -> Comparison {
    let (n1, n2) = (p1.len(), p2.len());
    let ratio = if n1 > n2 { (n1 + 1) / (n2 + 1) } else { (n2 + 1) / (n1 + 1) };
    if ratio > 3 {
        return Comparison::Different;
    }
    Comparison::from_sign(compare_recurse(cx, p1, min_level(p1), p2, min_level(p2)))
}

/// Returns true if `t` is the constant `1` or `-1`, within tolerance.
fn is_unit(t: &Token) -> bool {
    t.as_constant().map_or(false, |d| (d.abs() - 1.0).abs() <= EPSILON)
}

fn is_negative(t: &Token) -> bool {
    t.as_constant().map_or(false, |d| d < 0.0)
}

fn compare_operands(cx: &Ctxt, t1: &Token, t2: &Token) -> Option<bool> {
    match (t1.kind, t2.kind) {
        (TokenKind::Variable(v1), TokenKind::Variable(v2)) => {
            let same = if cx.config.sign_cmp && v1.is_sign() {
                v2.is_sign()
            } else {
                v1 == v2
            };
            same.then_some(false)
        },
        (TokenKind::Constant(c1), TokenKind::Constant(c2)) => {
            if c1 == c2 {
                return Some(false);
            }
            if c1 == -c2 {
                return Some(true);
            }
            let tolerance = c1.abs() * EPSILON;
            if (c1 - c2).abs() < tolerance {
                Some(false)
            } else if (c1 + c2).abs() < tolerance {
                Some(true)
            } else {
                None
            }
        },
        _ => None,
    }
}

/// Returns the operator at the ground level of a sub-expression.
fn ground_op(p: &[Token], level: i32) -> Option<Op> {
    p.iter().skip(1).step_by(2).find(|t| t.level == level).and_then(Token::op)
}

/// Returns the ground level to compare a term with, given the ground level of its parent.
fn term_level(term: &[Token], level: i32) -> i32 {
    if term[0].level <= level {
        level
    } else {
        level + 1
    }
}

/// Compares each parenthesized sub-expression recursively. Returns `None` if the expressions
/// differ, or whether they differ in sign.
fn compare_recurse(cx: &Ctxt, p1: &[Token], l1: i32, p2: &[Token], l2: i32) -> Option<bool> {
    if p1.len() == 1 && p2.len() == 1 {
        return compare_operands(cx, &p1[0], &p2[0]);
    }

    let op1 = ground_op(p1, l1);
    let op2 = ground_op(p2, l2);
    if let Some(op2) = op2 {
        let diff_op = match op1 {
            Some(Op::Plus | Op::Minus) => !op2.is_additive(),
            Some(Op::Times | Op::Divide) => !op2.is_multiplicative(),
            None if !op2.is_multiplicative() => return None,
            None => false,
            Some(op1) => op1 != op2,
        };
        if diff_op {
            // `1*x` or `-1*x` compares with `x`
            if op1 == Some(Op::Times) && p1[0].level == l1 && is_unit(&p1[0]) {
                let rest = &p1[2..];
                let diff = compare_recurse(cx, rest, min_level(rest), p2, l2)?;
                return Some(diff ^ is_negative(&p1[0]));
            }
            if op2 == Op::Times && p2[0].level == l2 && is_unit(&p2[0]) {
                let rest = &p2[2..];
                let diff = compare_recurse(cx, p1, l1, rest, min_level(rest))?;
                return Some(diff ^ is_negative(&p2[0]));
            }
            return None;
        }
    } else if !matches!(op1, Some(Op::Times | Op::Divide)) {
        return None;
    }

    // split the second expression into its ground level operands
    let mut starts = vec![0];
    for k in (1..p2.len()).step_by(2) {
        if p2[k].level == l2 {
            starts.push(k + 1);
            if starts.len() >= cx.max_compare_terms() {
                log::debug!("expression too big to compare, too many terms on one level");
                return None;
            }
        }
    }
    let terms2 = starts.len();
    let term2 = |i: usize| {
        let end = starts.get(i + 1).map_or(p2.len(), |&s| s - 1);
        &p2[starts[i]..end]
    };
    let op_before2 = |i: usize| if i == 0 { None } else { p2[starts[i] - 1].op() };

    let mut used = vec![false; terms2];
    let mut diff_sign = false;
    let mut first = true;
    let mut last_op1: Option<Op> = None;
    let mut s = 0;
    loop {
        let mut len = 1;
        while s + len < p1.len() && p1[s + len].level > l1 {
            len += 2;
        }
        let term1 = &p1[s..s + len];

        let mut matched = false;
        for i in 0..terms2 {
            if used[i] {
                continue;
            }
            match op1 {
                Some(Op::Plus | Op::Minus) => {},
                None | Some(Op::Times | Op::Divide) => {
                    if (last_op1 == Some(Op::Divide)) != (op_before2(i) == Some(Op::Divide)) {
                        continue;
                    }
                },
                Some(_) => {
                    // operands of non-commutative operators must line up
                    if last_op1.is_none() != (i == 0) {
                        return None;
                    }
                },
            }

            let other = term2(i);
            let Some(mut j) = compare_recurse(cx, term1, term_level(term1, l1), other, term_level(other, l2)) else {
                continue;
            };
            match op1 {
                None | Some(Op::Times | Op::Divide) => diff_sign ^= j,
                Some(Op::Plus | Op::Minus) => {
                    if last_op1 == Some(Op::Minus) {
                        j = !j;
                    }
                    if op_before2(i) == Some(Op::Minus) {
                        j = !j;
                    }
                    if first {
                        diff_sign = j;
                        first = false;
                    } else if diff_sign != j {
                        continue;
                    }
                },
                Some(_) => {
                    // TODO: `(x-y)^6` should compare equal to `(y-x)^6`
                    if j {
                        continue;
                    }
                },
            }
            used[i] = true;
            matched = true;
            break;
        }

        if !matched {
            // a factor of 1 or -1 needs no counterpart
            if matches!(op1, Some(Op::Times | Op::Divide)) && term1[0].level == l1 && is_unit(&term1[0]) {
                diff_sign ^= is_negative(&term1[0]);
            } else {
                return None;
            }
        }

        s += len;
        if s >= p1.len() {
            break;
        }
        last_op1 = p1[s].op();
        s += 1;
    }

    for i in (0..terms2).filter(|&i| !used[i]) {
        let t = &p2[starts[i]];
        if matches!(op2, Some(Op::Times | Op::Divide)) && t.level == l2 && is_unit(t) {
            diff_sign ^= is_negative(t);
        } else {
            return None;
        }
    }
    Some(diff_sign)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};
    use crate::token::{from_ast::parse_side, Var};
    use super::*;

    fn compare(a: &str, b: &str) -> Comparison {
        let mut cx = Ctxt::default();
        let a = parse_side(&mut cx, a).unwrap();
        let b = parse_side(&mut cx, b).unwrap();
        se_compare(&cx, &a, &b)
    }

    #[test]
    fn operands() {
        assert_eq!(compare("x", "x"), Comparison::Equal);
        assert_eq!(compare("x", "y"), Comparison::Different);
        assert_eq!(compare("2", "-2"), Comparison::Opposite);
        assert_eq!(compare("2", "2.0000000000001"), Comparison::Equal);
        assert_eq!(compare("2", "x"), Comparison::Different);
    }

    #[test]
    fn commutative_reordering() {
        assert_eq!(compare("a + b", "b + a"), Comparison::Equal);
        assert_eq!(compare("a*b*c", "c*a*b"), Comparison::Equal);
        assert_eq!(compare("a/b*c", "c/b*a"), Comparison::Equal);
        assert_eq!(compare("a/b", "b/a"), Comparison::Different);
        assert_eq!(compare("a^b", "b^a"), Comparison::Different);
    }

    #[test]
    fn sign_differences() {
        assert_eq!(compare("a - b", "b - a"), Comparison::Opposite);
        assert_eq!(compare("a - b", "a + b"), Comparison::Different);
        assert_eq!(compare("-1*x", "x"), Comparison::Opposite);
        assert_eq!(compare("x", "1*x"), Comparison::Equal);
        assert_eq!(compare("-1*a*b", "b*a"), Comparison::Opposite);
        assert_eq!(compare("(a - b)^2", "(b - a)^2"), Comparison::Different);
    }

    #[test]
    fn sizes_far_apart_are_different() {
        assert_eq!(compare("x", "x + 1 + 2 + 3"), Comparison::Different);
    }

    #[test]
    fn sign_variables_compare_equal_when_asked() {
        let mut cx = Ctxt::default();
        let a = [Token::variable(1, Var::sign(1))];
        let b = [Token::variable(1, Var::sign(2))];
        assert_eq!(se_compare(&cx, &a, &b), Comparison::Different);
        cx.config.sign_cmp = true;
        assert_eq!(se_compare(&cx, &a, &b), Comparison::Equal);
    }

    /// Builds a random sum of products of the given atoms.
    fn random_terms(rng: &mut StdRng) -> Vec<String> {
        const ATOMS: [&str; 6] = ["a", "b", "c", "2", "(a + c)", "b^2"];
        (0..rng.gen_range(1..5))
            .map(|_| {
                (0..rng.gen_range(1..4))
                    .map(|_| *ATOMS.choose(rng).unwrap())
                    .collect::<Vec<_>>()
                    .join("*")
            })
            .collect()
    }

    #[test]
    fn symmetric_and_sign_dual() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        for _ in 0..300 {
            let terms_a = random_terms(&mut rng);
            let mut terms_b = if rng.gen_bool(0.5) { terms_a.clone() } else { random_terms(&mut rng) };
            terms_b.shuffle(&mut rng);
            let a = terms_a.join(" + ");
            let b = terms_b.join(" + ");

            let forward = compare(&a, &b);
            assert_eq!(forward, compare(&b, &a), "{} vs {}", a, b);

            if forward == Comparison::Equal {
                assert_eq!(compare(&a, &format!("-1*({})", b)), Comparison::Opposite, "{} vs -({})", a, b);
            }
        }
    }
}
