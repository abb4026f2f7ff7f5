//! Symbolic equation solving.
//!
//! Solving applies the same operation to both sides of an equation until the target stands alone
//! on the left. Everything containing the solve variable is moved to the left-hand side, then
//! everything else is moved to the right by applying inverse operations ([`g_of_f`]). When that
//! stalls, the solver expands, takes reciprocals, divides out zero solutions, raises both sides to
//! powers to clear roots, and finally solves for zero and tries the quadratic formula.
//!
//! Solving for the constant `0` moves everything to the right-hand side instead, and simplifies
//! the result until it has no denominators.

use std::fmt;
use crate::{
    compare::{se_compare, Comparison},
    complex::parse_complex,
    consts::{always_positive, MAX_RAISE_POWER},
    ctxt::Ctxt,
    equation::Equations,
    error::Error,
    factor::{factor_plus, super_factor::super_factor},
    numeric::f_to_fraction,
    simplify::{calc_simp, constant::get_constant, factorv, mid_simp_side, simp_loop, simp_ssub, simps_side},
    token::{fmt::display, side::{found_var, min_level}, var::INTEGER_PREFIX, Op, Token, TokenKind, Var},
    unfactor::{uf_power, uf_simp, uf_tsimp, ufactor},
};

/// Why the solver gave up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    /// The space holds an expression, not an equation.
    NotAnEquation,

    /// Only a variable or `0` can be solved for, possibly raised to a constant power.
    BadTarget,

    /// The solve variable is in neither side.
    VarNotFound,

    /// An operation moved the solve variable back to the right-hand side.
    VarInRhs,

    /// The same operation kept being applied without progress.
    LoopAborted,

    /// An operation with no inverse was met.
    NotInvertible,

    /// `x % n = c` with `|c| >= |n|`.
    NoSolutions,

    /// The root raised to a power could not be isolated.
    RootNotIsolated,

    /// Every trick was tried.
    Exhausted,
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Failure::NotAnEquation => write!(f, "Solving requires an equation."),
            Failure::BadTarget => {
                write!(f, "Can only solve for a single variable or for 0, possibly raised to a power.")
            },
            Failure::VarNotFound => write!(f, "Solve variable not found."),
            Failure::VarInRhs => write!(f, "Solve variable moved back to RHS."),
            Failure::LoopAborted => write!(f, "Infinite loop aborted in solve routine."),
            Failure::NotInvertible => write!(f, "Unable to apply the inverse operation."),
            Failure::NoSolutions => write!(f, "There are no possible solutions."),
            Failure::RootNotIsolated => write!(f, "Unable to isolate root."),
            Failure::Exhausted => write!(f, "Solve failed."),
        }
    }
}

/// How a solve attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The target stands alone on the left-hand side.
    Solved,

    /// Solved, but a solution `v = 0` was divided out along the way and is not in the result.
    SolvedRemovingZero,

    /// Both sides are identical, so every value is a solution.
    Identity,

    /// The solve variable cancelled out, leaving an equation in other variables.
    Independent,

    /// The solve variable cancelled out, leaving a false numeric equation.
    NoValues,

    Failed(Failure),
}

impl Outcome {
    /// Returns true if the equation was rewritten into its solved form.
    pub fn is_solved(self) -> bool {
        matches!(self, Outcome::Solved | Outcome::SolvedRemovingZero)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Outcome::Solved => write!(f, "Solve completed."),
            Outcome::SolvedRemovingZero => write!(f, "Solve completed, a zero solution was removed."),
            Outcome::Identity => write!(f, "This equation is an identity."),
            Outcome::Independent => write!(f, "This equation is independent of the solve variable."),
            Outcome::NoValues => write!(f, "There are no possible values for the solve variable."),
            Outcome::Failed(failure) => failure.fmt(f),
        }
    }
}

/// Stops the solver early, with an outcome or an engine error.
#[derive(Debug)]
enum Halt {
    Stop(Outcome),
    Engine(Error),
}

impl From<Error> for Halt {
    fn from(err: Error) -> Self {
        Halt::Engine(err)
    }
}

type Step<T> = Result<T, Halt>;

fn fail<T>(failure: Failure) -> Step<T> {
    Err(Halt::Stop(Outcome::Failed(failure)))
}

/// Where the solver resumes after a rewrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Resume {
    /// Simplify both sides, then move terms from the right-hand side.
    Simplify,

    /// Move terms from the right-hand side without simplifying first.
    MoveFromRhs,

    /// Start a fresh round of work on the left-hand side.
    Restart,

    /// Check for a solution, then work on the left-hand side.
    Check,

    Done,
}

/// Which side an operand is taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Lhs,
    Rhs,
}

/// Aborts when [`g_of_f`] keeps being called on sides of the same sizes.
#[derive(Debug, Default)]
struct RepeatGuard {
    prev: (usize, usize),
    count: u32,
}

impl RepeatGuard {
    fn check(&mut self, n1: usize, n2: usize) -> Step<()> {
        if self.prev == (n1, n2) {
            self.count += 1;
            if self.count >= 4 {
                log::debug!("infinite loop aborted in solve routine");
                return fail(Failure::LoopAborted);
            }
        } else {
            self.prev = (n1, n2);
            self.count = 0;
        }
        Ok(())
    }
}

/// Folds the operator that follows an operand into the operation that moves it: `*` and `/` move
/// by division, `+` and `-` by subtraction. The last operand of a side moves by subtraction.
fn classify(t: Option<&Token>) -> Op {
    match t.and_then(Token::op) {
        None | Some(Op::Plus | Op::Minus) => Op::Plus,
        Some(Op::Times | Op::Divide) => Op::Times,
        Some(op) => op,
    }
}

/// Returns the first operator at level 1 at or after `from`.
fn next_level1_op(side: &[Token], from: usize) -> Option<&Token> {
    side.iter().skip(from).find(|t| t.level == 1 && t.op().is_some())
}

fn raise_all(side: &mut [Token]) {
    for t in side {
        t.level += 1;
    }
}

/// Factors out `v`, or everything when solving for zero.
fn factor_var(cx: &mut Ctxt, side: &mut Vec<Token>, v: Option<Var>) -> Result<(), Error> {
    match v {
        Some(v) => factorv(cx, side, v),
        None => loop {
            simp_loop(cx, side)?;
            if !factor_plus(cx, side, None, 0.0)? {
                return Ok(());
            }
        },
    }
}

/// Returns an integer variable `integer_any`, `integer_any1`, ... that occurs in neither side.
fn integer_any(cx: &mut Ctxt, side1: &[Token], side2: &[Token]) -> Var {
    let mut n = 0;
    loop {
        let name = match n {
            0 => format!("{}_any", INTEGER_PREFIX),
            n => format!("{}_any{}", INTEGER_PREFIX, n),
        };
        let var = cx.vars.intern(&name);
        if found_var(side1, var) == 0 && found_var(side2, var) == 0 {
            return var;
        }
        n += 1;
    }
}

/// Applies the inverse of `op` followed by the operand at `operand` in `side1` to both sides of
/// the equation `side1 = side2`.
///
/// The operand runs to the next level 1 operator. `x^k = c` becomes `x = c^(1/k)`, times a sign
/// variable when `k` has an even numerator; `b^x = c` becomes `x = ln(c)/ln(b)` when both are
/// numbers; and `x % n = c` becomes `x = c + integer_any*n`.
fn g_of_f(
    cx: &mut Ctxt,
    guard: &mut RepeatGuard,
    mut op: Op,
    mut operand: usize,
    side1: &mut Vec<Token>,
    side2: &mut Vec<Token>,
) -> Step<()> {
    if operand >= side1.len() {
        return Err(Error::Bug("inverting an operand outside of its side").into());
    }
    guard.check(side1.len(), side2.len())?;
    if !matches!(op, Op::Plus | Op::Minus | Op::Times | Op::Divide | Op::Power | Op::Modulus) {
        return fail(Failure::NotInvertible);
    }

    let mut end = operand + 1;
    while end < side1.len() {
        if side1[end].level == 1 {
            match side1[end].op() {
                Some(Op::Factorial) => op = Op::Plus,
                Some(Op::Modulus) => operand = end + 1,
                _ => break,
            }
        }
        end += 2;
    }
    let end = end.min(side1.len());
    let operand_len = end - operand;

    if op == Op::Power && operand == 0 {
        if end >= side1.len() {
            return fail(Failure::NotInvertible);
        }
        let (Some(c1), Some(c2)) = (parse_complex(cx, side2), parse_complex(cx, &side1[..end])) else {
            return fail(Failure::NotInvertible);
        };
        log::debug!("taking the logarithm of both equation sides");
        let c = c1.ln() / c2.ln();
        if !c.is_finite() {
            return Err(Error::Domain("Logarithm of zero.".into()).into());
        }
        *side2 = vec![
            Token::constant(1, c.re),
            Token::operator(1, Op::Plus),
            Token::constant(2, c.im),
            Token::operator(2, Op::Times),
            Token::variable(2, Var::IMAGINARY),
        ];
        side1.drain(..=end);
        return Ok(());
    }
    if op == Op::Modulus {
        if operand == 0 {
            return fail(Failure::NotInvertible);
        }
        if let (Some(d1), Some(d2)) = (get_constant(cx, side2), get_constant(cx, &side1[operand..end])) {
            if d1.abs() >= d2.abs() {
                return fail(Failure::NoSolutions);
            }
        }
    }
    log::debug!("applying the inverse of {} {} to both sides", op.symbol(), display(cx, &side1[operand..end]));

    cx.check_len(side1.len() + operand_len + 3)?;
    cx.check_len(side2.len() + operand_len + 5)?;
    if min_level(side1) <= 1 {
        raise_all(side1);
    }
    if min_level(side2) <= 1 {
        raise_all(side2);
    }

    let mut tail = match op {
        Op::Modulus => {
            let any = integer_any(cx, side1, side2);
            vec![Token::operator(1, Op::Plus), Token::variable(2, any), Token::operator(2, Op::Times)]
        },
        Op::Power => vec![Token::operator(1, Op::Power), Token::constant(2, 1.0), Token::operator(2, Op::Divide)],
        op => vec![Token::operator(1, op.inverse())],
    };
    tail.extend_from_slice(&side1[operand..end]);
    side1.extend_from_slice(&tail);
    side2.extend(tail);

    // x^2 = c has two roots
    let even_root = op == Op::Power
        && operand_len == 1
        && side1[operand].as_constant().and_then(f_to_fraction).map_or(false, |(num, _)| always_positive(num));
    if even_root {
        cx.check_len(side2.len() + 2)?;
        let sign = cx.next_sign(&[side1.as_slice(), side2.as_slice()]);
        raise_all(side2);
        side2.extend([Token::operator(1, Op::Times), Token::variable(1, sign)]);
    }
    if matches!(op, Op::Power | Op::Modulus) {
        side1.truncate(operand - 1);
    }
    Ok(())
}

/// Takes the reciprocal of both sides of an equation.
fn flip(cx: &Ctxt, side1: &mut Vec<Token>, side2: &mut Vec<Token>) -> Result<(), Error> {
    log::debug!("taking the reciprocal of both sides of the equation");
    cx.check_len(side1.len() + 2)?;
    cx.check_len(side2.len() + 2)?;
    for side in [side1, side2] {
        raise_all(side);
        side.splice(0..0, [Token::constant(1, 1.0), Token::operator(1, Op::Divide)]);
    }
    Ok(())
}

/// The working state of one solve.
struct Solver<'a> {
    want: &'a [Token],

    /// The solve variable, `None` when solving for zero.
    v: Option<Var>,
    zsolve: bool,
    tlhs: Vec<Token>,
    trhs: Vec<Token>,
    guard: RepeatGuard,

    /// The left-hand side was just expanded.
    uf_flag: bool,
    worked: bool,
    qtries: u32,
    raises: u32,
    zero_solved: bool,
    outcome: Outcome,
}

impl<'a> Solver<'a> {
    fn new(want: &'a [Token], v: Option<Var>, lhs: Vec<Token>, rhs: Vec<Token>) -> Self {
        Self {
            want,
            v,
            zsolve: v.is_none(),
            tlhs: lhs,
            trhs: rhs,
            guard: RepeatGuard::default(),
            uf_flag: false,
            worked: true,
            qtries: 0,
            raises: 0,
            zero_solved: false,
            outcome: Outcome::Solved,
        }
    }

    fn is_v(&self, t: &Token) -> bool {
        self.v.map_or(false, |v| t.is_var_eq(v))
    }

    fn has_v(&self, side: &[Token]) -> bool {
        self.v.map_or(false, |v| found_var(side, v) > 0)
    }

    /// Returns true if the token at `i` is `v` as a factor at level 1, or `v^k` with `k > 0`.
    fn is_power_of_v(&self, i: usize) -> bool {
        let side = &self.tlhs;
        let Some(t) = side.get(i).filter(|t| self.is_v(t)) else {
            return false;
        };
        t.level == 1
            || (t.level == 2
                && side.get(i + 1).map_or(false, |t| t.is_op(Op::Power))
                && side.get(i + 2).map_or(false, |t| t.level == 2 && t.as_constant().map_or(false, |k| k > 0.0)))
    }

    /// Applies [`g_of_f`] with the operand taken from `side`.
    fn apply(&mut self, cx: &mut Ctxt, op: Op, operand: usize, side: Side) -> Step<()> {
        let (side1, side2) = match side {
            Side::Lhs => (&mut self.tlhs, &mut self.trhs),
            Side::Rhs => (&mut self.trhs, &mut self.tlhs),
        };
        g_of_f(cx, &mut self.guard, op, operand, side1, side2)
    }

    fn run(&mut self, cx: &mut Ctxt) -> Step<Outcome> {
        uf_power(cx, &mut self.tlhs)?;
        uf_power(cx, &mut self.trhs)?;
        let mut at = Resume::Simplify;
        loop {
            cx.check_interrupt()?;
            at = match at {
                Resume::Simplify => {
                    self.simplify(cx)?;
                    Resume::MoveFromRhs
                },
                Resume::MoveFromRhs => self.move_from_rhs(cx)?,
                Resume::Restart => {
                    self.worked = true;
                    self.uf_flag = false;
                    Resume::Check
                },
                Resume::Check => self.check(cx)?,
                Resume::Done => return Ok(self.outcome),
            };
        }
    }

    fn simplify(&mut self, cx: &mut Ctxt) -> Result<(), Error> {
        simps_side(cx, &mut self.tlhs, self.zsolve)?;
        if self.uf_flag {
            simp_loop(cx, &mut self.trhs)?;
            uf_simp(cx, &mut self.trhs)?;
            factor_var(cx, &mut self.trhs, self.v)
        } else {
            simps_side(cx, &mut self.trhs, self.zsolve)
        }
    }

    /// Moves the operands containing the solve variable to the left-hand side. When solving for
    /// zero, moves denominators instead.
    fn move_from_rhs(&mut self, cx: &mut Ctxt) -> Step<Resume> {
        if self.zsolve {
            let divide = (1..self.trhs.len())
                .step_by(2)
                .find(|&i| self.trhs[i].level == 1 && self.trhs[i].is_op(Op::Divide));
            if let Some(i) = divide {
                self.apply(cx, Op::Divide, i + 1, Side::Rhs)?;
                return Ok(Resume::Simplify);
            }
        } else {
            let mut op = None;
            let mut operand = 0;
            for i in 0..self.trhs.len() {
                let t = self.trhs[i];
                if self.is_v(&t) {
                    let op = op.unwrap_or_else(|| classify(next_level1_op(&self.trhs, i + 1)));
                    let (op, operand) = match op {
                        Op::Times | Op::Divide | Op::Power => {
                            raise_all(&mut self.trhs);
                            (Op::Plus, 0)
                        },
                        op => (op, operand),
                    };
                    self.apply(cx, op, operand, Side::Rhs)?;
                    return Ok(Resume::Simplify);
                }
                if t.level == 1 {
                    if let Some(o) = t.op() {
                        op = Some(o);
                        operand = i + 1;
                    }
                }
            }
        }
        if self.uf_flag {
            simps_side(cx, &mut self.trhs, self.zsolve)?;
        }
        Ok(Resume::Restart)
    }

    /// Finishes if the left-hand side is the target, otherwise works on the left-hand side.
    fn check(&mut self, cx: &mut Ctxt) -> Step<Resume> {
        if self.has_v(&self.trhs) {
            log::debug!("solve variable moved back to RHS, quitting solve routine");
            return fail(Failure::VarInRhs);
        }
        if se_compare(cx, self.want, &self.tlhs) == Comparison::Equal {
            if self.zsolve {
                if let Some(at) = self.zero_simp(cx)? {
                    return Ok(at);
                }
                log::debug!("solve for zero completed");
            } else {
                log::debug!("solve completed");
            }
            return Ok(Resume::Done);
        }
        self.move_from_lhs(cx)
    }

    /// Simplifies the right-hand side of `0 = rhs` until it has no denominators, and drops
    /// constant factors and positive powers, which don't change its zeros.
    fn zero_simp(&mut self, cx: &mut Ctxt) -> Step<Option<Resume>> {
        'simp: loop {
            uf_power(cx, &mut self.trhs)?;
            loop {
                loop {
                    simp_ssub(cx, &mut self.trhs, None, 0.0, false, true, 4)?;
                    if !uf_power(cx, &mut self.trhs)? {
                        break;
                    }
                }
                if !super_factor(cx, &mut self.trhs, 1)? {
                    break;
                }
            }

            let rhs = &mut self.trhs;
            let n = rhs.len();
            let mut top = None;
            for i in (1..n).step_by(2).filter(|&i| rhs[i].level == 1) {
                let op = rhs[i].op();
                if op == Some(Op::Divide) {
                    return Ok(Some(Resume::MoveFromRhs));
                }
                top = Some(i);
                if op != Some(Op::Times) {
                    break;
                }
            }
            let Some(top) = top else {
                break;
            };

            match rhs[top].op() {
                Some(Op::Times) => {
                    let mut start = 0;
                    while start < n {
                        let end = (start + 1..n).step_by(2).find(|&i| rhs[i].level == 1).unwrap_or(n);
                        let numeric = rhs[start..end].iter().all(|t| match t.kind {
                            TokenKind::Variable(v) => !v.is_symbolic(),
                            _ => true,
                        });
                        let is_one = end == start + 1 && rhs[start].is_constant_eq(1.0);
                        if numeric && !is_one {
                            rhs.splice(start..end, [Token::constant(1, 1.0)]);
                            continue 'simp;
                        }
                        let positive_power = end > start + 2
                            && rhs[end - 2].is_op(Op::Power)
                            && rhs[end - 2].level == 2
                            && rhs[end - 1].level == 2
                            && rhs[end - 1].as_constant().map_or(false, |k| k > 0.0 && k != 1.0);
                        if positive_power {
                            rhs[end - 1].set_constant(1.0);
                            continue 'simp;
                        }
                        start = end + 1;
                    }
                },
                Some(Op::Power) => {
                    let positive = top + 2 == n
                        && rhs[top + 1].level == 1
                        && rhs[top + 1].as_constant().map_or(false, |k| k > 0.0);
                    if positive {
                        rhs.truncate(top);
                        continue 'simp;
                    }
                },
                _ => {},
            }
            break;
        }
        Ok(None)
    }

    /// Moves an operand without the solve variable from the left-hand side to the right.
    fn move_from_lhs(&mut self, cx: &mut Ctxt) -> Step<Resume> {
        let mut found_count = 0;
        let mut need_flip = 0;
        let mut found = 0;
        let mut op: Option<Op> = None;
        let mut operand = 0;
        let mut i = 0;
        loop {
            let n = self.tlhs.len();
            let boundary = i >= n || (self.tlhs[i].level == 1 && self.tlhs[i].op().is_some());
            if !boundary {
                if self.is_v(&self.tlhs[i]) {
                    found_count += 1;
                    found += 1;
                }
                i += 1;
                continue;
            }

            if found == 0 {
                // a lone constant, or the 1 of 1/x, stays
                let movable = (i < n || found_count > 0 || self.zsolve || n > 1 || !self.tlhs[0].is_constant())
                    && !(i - operand == 1
                        && self.tlhs[operand].is_constant_eq(1.0)
                        && i < n
                        && self.tlhs[i].is_op(Op::Divide));
                if movable {
                    let mut mop = op.unwrap_or_else(|| classify(self.tlhs.get(i)));
                    let mut from = operand;
                    let mut skip = false;
                    if self.zsolve {
                        if i < n {
                            skip = !matches!(mop, Op::Plus | Op::Minus | Op::Divide);
                        } else if mop != Op::Divide {
                            raise_all(&mut self.tlhs);
                            from = 0;
                            mop = Op::Plus;
                        }
                    }
                    if !skip {
                        self.apply(cx, mop, from, Side::Lhs)?;
                        if self.uf_flag {
                            simp_loop(cx, &mut self.tlhs)?;
                        } else {
                            simps_side(cx, &mut self.tlhs, self.zsolve)?;
                        }
                        simps_side(cx, &mut self.trhs, self.zsolve)?;
                        return Ok(Resume::Check);
                    }
                }
            } else if op == Some(Op::Divide) {
                need_flip += found;
            }
            if i >= n {
                return self.stalled(cx, found_count, need_flip);
            }
            found = 0;
            op = self.tlhs[i].op();
            operand = i + 1;
            i += 1;
        }
    }

    /// Every operand left on the left-hand side contains the solve variable.
    fn stalled(&mut self, cx: &mut Ctxt, found_count: usize, need_flip: usize) -> Step<Resume> {
        if found_count == 0 {
            if self.has_v(&self.trhs) {
                return fail(Failure::VarInRhs);
            }
            calc_simp(cx, &mut self.tlhs)?;
            calc_simp(cx, &mut self.trhs)?;
            if se_compare(cx, &self.tlhs, &self.trhs) == Comparison::Equal {
                return Err(Halt::Stop(Outcome::Identity));
            }
            let other_vars = self
                .tlhs
                .iter()
                .chain(&self.trhs)
                .filter_map(Token::as_var)
                .any(|v| v > Var::IMAGINARY);
            return Err(Halt::Stop(if other_vars { Outcome::Independent } else { Outcome::NoValues }));
        }

        let zflag = self.trhs.len() == 1 && self.trhs[0].is_constant_eq(0.0);
        if zflag {
            // -0
            self.trhs[0].set_constant(0.0);
        }
        if need_flip >= found_count {
            flip(cx, &mut self.tlhs, &mut self.trhs)?;
            simps_side(cx, &mut self.tlhs, self.zsolve)?;
            simps_side(cx, &mut self.trhs, self.zsolve)?;
            return Ok(Resume::Restart);
        }
        if self.worked && !self.uf_flag {
            log::debug!("unfactoring");
            self.worked = false;
            cx.scoped(|c| c.partial = false, |cx| uf_simp(cx, &mut self.tlhs))?;
            factor_var(cx, &mut self.tlhs, self.v)?;
            self.uf_flag = true;
            return Ok(Resume::Check);
        }
        if self.uf_flag {
            simps_side(cx, &mut self.tlhs, self.zsolve)?;
            self.uf_flag = false;
            return Ok(Resume::Check);
        }

        let (op, operand) = self.pick_divisor(zflag);
        let removes_zero = zflag && self.zero_solved && op == Some(Op::Times) && self.is_power_of_v(operand);
        if removes_zero || op == Some(Op::Divide) {
            if op == Some(Op::Times) {
                self.qtries = 0;
                self.outcome = Outcome::SolvedRemovingZero;
                log::info!("removing possible solution: \"{} = 0\"", display(cx, &self.tlhs[operand..=operand]));
            } else {
                log::debug!("juggling");
                self.uf_flag = true;
            }
            if let Some(op) = op {
                self.apply(cx, op, operand, Side::Lhs)?;
            }
            return Ok(Resume::Simplify);
        }

        if let Some(d) = self.root_power().filter(|_| self.zero_solved) {
            self.raises += 1;
            if self.raises > MAX_RAISE_POWER {
                return fail(Failure::Exhausted);
            }
            self.zero_solved = false;
            self.qtries = 0;
            self.increase(cx, d)?;
            self.uf_flag = true;
            return Ok(Resume::Simplify);
        }
        if self.qtries > 0 {
            return fail(Failure::Exhausted);
        }

        let zero = [Token::constant(1, 0.0)];
        let outcome = solve_sub(cx, &zero, &mut self.tlhs, &mut self.trhs)?;
        if !outcome.is_solved() {
            return Err(Halt::Stop(outcome));
        }
        if self.zero_solved {
            self.qtries += 1;
        }
        self.zero_solved = true;
        Ok(if self.poly_solve(cx)? { Resume::Restart } else { Resume::Simplify })
    }

    /// Finds a factor at level 1 to divide both sides by: a denominator containing a sum, or, when
    /// the right-hand side is zero, the solve variable itself.
    fn pick_divisor(&self, zflag: bool) -> (Option<Op>, usize) {
        let lhs = &self.tlhs;
        let n = lhs.len();
        let mut op = None;
        let mut operand = 0;
        for i in (1..n).step_by(2).filter(|&i| lhs[i].level == 1) {
            let Some(op_kind) = lhs[i].op() else {
                continue;
            };
            if op_kind.is_multiplicative() {
                op.get_or_insert(Op::Times);
            } else {
                op = Some(op_kind);
                break;
            }
            if zflag {
                if op_kind == Op::Divide || self.is_power_of_v(i + 1) {
                    op = Some(op_kind);
                    operand = i + 1;
                    if op_kind == Op::Divide {
                        break;
                    }
                }
            } else if op_kind == Op::Divide {
                let first = (i + 2..n).step_by(2).take_while(|&j| lhs[j].level > 1).find(|&j| lhs[j].level == 2);
                if first.map_or(false, |j| lhs[j].op().map_or(false, Op::is_additive)) {
                    op = Some(Op::Divide);
                    operand = i + 1;
                }
            }
        }
        (op, operand)
    }

    /// Returns the largest root `1/k` that the solve variable is raised to.
    fn root_power(&self) -> Option<f64> {
        let lhs = &self.tlhs;
        let mut root: Option<f64> = None;
        for i in (1..lhs.len()).step_by(2) {
            if !lhs[i].is_op(Op::Power) || lhs[i + 1].level != lhs[i].level {
                continue;
            }
            let Some(d) = lhs[i + 1].as_constant().filter(|d| d.abs() < 1.0) else {
                continue;
            };
            if !f_to_fraction(d).map_or(false, |(num, den)| num.abs() == 1.0 && den >= 2.0) {
                continue;
            }
            let level = lhs[i].level;
            let in_base = (0..i).rev().take_while(|&j| lhs[j].level >= level).any(|j| self.is_v(&lhs[j]));
            if in_base && root.map_or(true, |r| r.abs() < d.abs()) {
                root = Some(d);
            }
        }
        root
    }

    /// Returns the length of the base of the power at `i` if it is raised to `d` and contains the
    /// solve variable.
    fn power_base_len(&self, i: usize, d: f64) -> Option<usize> {
        let lhs = &self.tlhs;
        let level = lhs[i].level;
        if !lhs[i].is_op(Op::Power) || lhs[i + 1].level != level || !lhs[i + 1].is_constant_eq(d) {
            return None;
        }
        let start = (0..i).rev().take_while(|&j| lhs[j].level >= level).last().unwrap_or(i);
        let contains_v = self.v.is_none() || (start..i).any(|j| self.is_v(&lhs[j]));
        contains_v.then_some(i - start)
    }

    /// Isolates the expression raised to the power `d` that contains the solve variable, then
    /// raises both sides to the power `1/d`.
    ///
    /// Returns false if no such power was found at level 1.
    fn increase(&mut self, cx: &mut Ctxt, d: f64) -> Step<bool> {
        log::info!("raising both equation sides to the power of {} and expanding", 1.0 / d);
        cx.scoped(|c| c.partial = false, |cx| ufactor(cx, &mut self.tlhs))?;
        simp_ssub(cx, &mut self.tlhs, self.v, d, true, false, 2)?;
        simp_ssub(cx, &mut self.tlhs, None, 1.0, true, true, 2)?;

        loop {
            cx.check_interrupt()?;
            let n = self.tlhs.len();
            let Some(p1) = (1..n).step_by(2).find(|&i| self.tlhs[i].level == 1) else {
                return Ok(false);
            };
            let len1 = (1..p1).step_by(2).filter_map(|i| self.power_base_len(i, d)).max();
            let len2 = (p1 + 2..n).step_by(2).filter_map(|i| self.power_base_len(i, d)).max();
            let in_first = match (len1, len2) {
                (Some(l1), Some(l2)) => l2 <= l1,
                (found, _) => found.is_some(),
            };

            let mut operand = p1 + 1;
            let mut op = self.tlhs[p1].op().unwrap_or(Op::Plus);
            if op == Op::Power && self.tlhs[operand].level == 1 && self.tlhs[operand].is_constant_eq(d) {
                self.apply(cx, Op::Power, operand, Side::Lhs)?;
                return Ok(true);
            }
            if !in_first {
                operand = 0;
                if p1 == 1 && op == Op::Divide && self.tlhs[0].is_constant_eq(1.0) {
                    flip(cx, &mut self.tlhs, &mut self.trhs)?;
                    simp_loop(cx, &mut self.tlhs)?;
                    simp_loop(cx, &mut self.trhs)?;
                    continue;
                }
                op = classify(self.tlhs.get(p1));
            }
            self.apply(cx, op, operand, Side::Lhs)?;
            simp_loop(cx, &mut self.tlhs)?;
            simp_loop(cx, &mut self.trhs)?;
        }
    }

    /// Solves `0 = a*x^(2n) + b*x^n + c` for `x^n` with the quadratic formula. `x` is any
    /// expression containing the solve variable, and the sign variable selects the root.
    ///
    /// The equation must already be solved for zero. Returns false if it is not of that form.
    fn poly_solve(&mut self, cx: &mut Ctxt) -> Step<bool> {
        let Some(v) = self.v else {
            return Ok(false);
        };
        log::debug!("checking if equation is a polynomial equation");
        uf_simp(cx, &mut self.trhs)?;
        while factor_plus(cx, &mut self.trhs, Some(v), 0.0)? {
            simp_loop(cx, &mut self.trhs)?;
        }

        let rhs = &self.trhs;
        let n = rhs.len();

        // the term with the highest power of x: a1 * x^k * a2
        let mut high_power = 0.0;
        let (mut x1p, mut a1p, mut a2p, mut a2ep) = (0, 0, 0, 0);
        let mut found = false;
        let mut op: Option<Op> = None;
        let mut term = 0;
        let mut i = 0;
        loop {
            if i >= n || (rhs[i].level == 1 && rhs[i].op().is_some()) {
                if i < n && !rhs[i].op().map_or(false, Op::is_additive) {
                    return Ok(false);
                }
                if matches!(op, Some(Op::Times | Op::Divide)) {
                    found = false;
                    let mut factor_op = None;
                    let term_start = term;
                    for j in term_start..i {
                        let t = rhs[j];
                        if t.level == 2 {
                            if let Some(o) = t.op() {
                                term = j + 1;
                                factor_op = Some(o);
                                found = false;
                            }
                        } else if let Some(o) = t.op() {
                            let candidate = t.level == 3
                                && o == Op::Power
                                && found
                                && matches!(factor_op, None | Some(Op::Times))
                                && rhs[j + 1].level == 3;
                            if let Some(k) = rhs[j + 1].as_constant().filter(|&k| candidate && k > high_power) {
                                high_power = k;
                                x1p = term;
                                a1p = term_start;
                                a2p = j + 2;
                                a2ep = i;
                            }
                        } else if t.is_var_eq(v) {
                            found = true;
                        }
                    }
                } else if op == Some(Op::Power) && found && rhs[i - 1].level == 2 {
                    if let Some(k) = rhs[i - 1].as_constant().filter(|&k| k > high_power) {
                        high_power = k;
                        x1p = term;
                        a1p = term;
                        a2p = i;
                        a2ep = i;
                    }
                }
                if i >= n {
                    break;
                }
            }
            let t = rhs[i];
            if t.level == 1 {
                if t.op().is_some() {
                    op = None;
                    term = i + 1;
                    found = false;
                }
            } else if let Some(o) = t.op() {
                if t.level == 2 {
                    op = Some(o);
                }
            } else if op.is_none() && t.is_var_eq(v) {
                found = true;
            }
            i += 1;
        }
        if high_power == 0.0 {
            return Ok(false);
        }
        log::info!("equation is a degree {} polynomial equation in {}", high_power, cx.vars.name(v));

        let a_negative = a1p > 0 && rhs[a1p - 1].is_op(Op::Minus);
        let mut x1 = if high_power == 2.0 {
            rhs[x1p..a2p - 2].to_vec()
        } else {
            let mut x1 = rhs[x1p..a2p].to_vec();
            if let Some(k) = x1.last_mut() {
                let half = k.as_constant().unwrap_or_default() / 2.0;
                k.set_constant(half);
            }
            x1
        };

        // the term linear in x1: b1 * x1 * b2
        let mut sign_op = None;
        let mut op = None;
        let mut x2p = 0;
        let mut i = 0;
        let (b1p, x2p, b2p, b2ep, opposite) = 'search: loop {
            if i >= n || (rhs[i].level == 1 && rhs[i].op().is_some()) {
                if x2p < i {
                    let cmp = se_compare(cx, &x1, &rhs[x2p..i]);
                    if cmp.is_match() {
                        break 'search (x2p, x2p, i, i, cmp.is_opposite());
                    }
                }
                if matches!(op, Some(Op::Times | Op::Divide)) {
                    let term_start = x2p;
                    let mut factor_op = None;
                    let mut j = x2p;
                    loop {
                        if j >= i || (rhs[j].level == 2 && rhs[j].op().is_some()) {
                            if matches!(factor_op, None | Some(Op::Times)) && x2p < j {
                                let cmp = se_compare(cx, &x1, &rhs[x2p..j]);
                                if cmp.is_match() {
                                    break 'search (term_start, x2p, j, i, cmp.is_opposite());
                                }
                            }
                            if j >= i {
                                break;
                            }
                        }
                        if rhs[j].level == 2 {
                            if let Some(o) = rhs[j].op() {
                                x2p = j + 1;
                                factor_op = Some(o);
                            }
                        }
                        j += 1;
                    }
                }
                if i >= n {
                    return Ok(false);
                }
            }
            let t = rhs[i];
            if t.level == 1 {
                if let Some(o) = t.op() {
                    op = None;
                    sign_op = Some(o);
                    x2p = i + 1;
                }
            } else if t.level == 2 {
                if let Some(o) = t.op() {
                    op = Some(o);
                }
            }
            i += 1;
        };
        let b_negative = match sign_op {
            None | Some(Op::Plus) => opposite,
            Some(Op::Minus) => !opposite,
            _ => return Ok(false),
        };

        let coefficient = |before: &[Token], negative: bool, after: &[Token]| {
            let mut c = before.to_vec();
            c.push(Token::constant(7, if negative { -1.0 } else { 1.0 }));
            c.extend_from_slice(after);
            let by = 7 - min_level(&c);
            for t in &mut c {
                t.level += by;
            }
            c
        };
        let b = coefficient(&rhs[b1p..x2p], b_negative, &rhs[b2p..b2ep]);
        let a = coefficient(&rhs[a1p..x1p], a_negative, &rhs[a2p..a2ep]);

        // every other term is part of c
        let mut c = vec![Token::constant(7, 0.0)];
        let mut start = 0;
        for end in (1..n).step_by(2).filter(|&j| rhs[j].level == 1).chain(std::iter::once(n)) {
            let holds = |p: usize| start <= p && end > p;
            if !holds(x1p) && !holds(x2p) {
                if start == 0 {
                    c.push(Token::operator(7, Op::Plus));
                }
                c.extend(rhs[start..end].iter().map(|t| Token { level: t.level + 6, ..*t }));
            }
            start = end;
        }

        // ((b^2 - 4*a*c)^0.5*sign - b)/(2*a)
        let sign = cx.next_sign(&[self.tlhs.as_slice(), rhs.as_slice()]);
        let mut formula = b.clone();
        formula.extend([
            Token::operator(6, Op::Power),
            Token::constant(6, 2.0),
            Token::operator(5, Op::Minus),
            Token::constant(6, 4.0),
            Token::operator(6, Op::Times),
        ]);
        formula.extend_from_slice(&a);
        formula.push(Token::operator(6, Op::Times));
        formula.extend(c);
        formula.extend([
            Token::operator(4, Op::Power),
            Token::constant(4, 0.5),
            Token::operator(3, Op::Times),
            Token::variable(3, sign),
            Token::operator(2, Op::Minus),
        ]);
        formula.extend(b);
        formula.extend([Token::operator(1, Op::Divide), Token::constant(2, 2.0), Token::operator(2, Op::Times)]);
        formula.extend(a);
        cx.check_len(formula.len())?;
        if found_var(&formula, v) > 0 {
            return Ok(false);
        }

        let by = min_level(&x1) - 1;
        for t in &mut x1 {
            t.level -= by;
        }
        self.tlhs = x1;
        simp_loop(cx, &mut self.tlhs)?;
        self.trhs = formula;
        simp_loop(cx, &mut self.trhs)?;
        uf_tsimp(cx, &mut self.trhs)?;
        simps_side(cx, &mut self.trhs, false)?;
        log::info!("equation was solved with the quadratic formula");
        Ok(true)
    }
}

/// Returns the constant `k` if `want` is `x^k` or `0^k` with `k` positive and not 1.
fn power_target(want: &[Token]) -> Option<f64> {
    match want {
        [base, op, k] if op.is_op(Op::Power) && (base.is_var() || base.is_constant_eq(0.0)) => {
            k.as_constant().filter(|&k| k > 0.0 && k != 1.0)
        },
        _ => None,
    }
}

/// Solves `x^k` or `0^k`: solves for zero with the sides swapped, isolates the `k`th root that
/// contains `x`, or any `k`th root for `0^k`, and raises both sides to the power `k`.
fn solve_power(cx: &mut Ctxt, want: &[Token], k: f64, lhs: &mut Vec<Token>, rhs: &mut Vec<Token>) -> Result<Outcome, Error> {
    let zero = [Token::constant(1, 0.0)];
    let outcome = solve_sub(cx, &zero, rhs, lhs)?;
    if !outcome.is_solved() {
        return Ok(outcome);
    }

    let mut solver = Solver::new(want, want[0].as_var(), lhs.clone(), rhs.clone());
    uf_simp(cx, &mut solver.tlhs)?;
    match solver.increase(cx, 1.0 / k) {
        Ok(true) => {},
        Ok(false) | Err(Halt::Stop(_)) => return Ok(Outcome::Failed(Failure::RootNotIsolated)),
        Err(Halt::Engine(err)) => return Err(err),
    }
    mid_simp_side(cx, &mut solver.tlhs)?;
    simp_loop(cx, &mut solver.trhs)?;
    uf_simp(cx, &mut solver.trhs)?;
    *lhs = solver.tlhs;
    *rhs = solver.trhs;
    Ok(Outcome::Solved)
}

/// Solves the equation `lhs = rhs` for `want`, which is a variable, the constant `0`, or either of
/// those raised to a positive constant power.
///
/// On success the solved equation replaces `lhs` and `rhs`. Otherwise they are left as they were.
pub fn solve_sub(cx: &mut Ctxt, want: &[Token], lhs: &mut Vec<Token>, rhs: &mut Vec<Token>) -> Result<Outcome, Error> {
    if lhs.is_empty() || rhs.is_empty() {
        return Ok(Outcome::Failed(Failure::NotAnEquation));
    }
    if want.len() != 1 {
        return match power_target(want) {
            Some(k) => solve_power(cx, want, k, lhs, rhs),
            None => Ok(Outcome::Failed(Failure::BadTarget)),
        };
    }
    let v = match want[0].kind {
        TokenKind::Variable(v) => {
            if found_var(lhs, v) == 0 && found_var(rhs, v) == 0 {
                return Ok(Outcome::Failed(Failure::VarNotFound));
            }
            Some(v)
        },
        TokenKind::Constant(d) if d == 0.0 => {
            log::debug!("solving for zero");
            None
        },
        _ => return Ok(Outcome::Failed(Failure::BadTarget)),
    };

    let mut solver = Solver::new(want, v, lhs.clone(), rhs.clone());
    match solver.run(cx) {
        Ok(outcome) => {
            *lhs = solver.tlhs;
            *rhs = solver.trhs;
            Ok(outcome)
        },
        Err(Halt::Stop(outcome)) => Ok(outcome),
        Err(Halt::Engine(err)) if err.is_critical() => Err(err),
        Err(Halt::Engine(err)) => {
            log::info!("solve failed: {}", err);
            Ok(Outcome::Failed(Failure::Exhausted))
        },
    }
}

/// Solves equation space `n` for `want`, storing the solved equation back into the space.
pub fn solve_espace(cx: &mut Ctxt, eqs: &mut Equations, want: &[Token], n: usize) -> Result<Outcome, Error> {
    let Some(space) = eqs.get(n).filter(|space| space.is_equation()) else {
        return Ok(Outcome::Failed(Failure::NotAnEquation));
    };
    let (mut lhs, mut rhs) = (space.lhs.clone(), space.rhs.clone());
    let outcome = solve_sub(cx, want, &mut lhs, &mut rhs)?;
    if outcome.is_solved() {
        eqs.store(cx, n, lhs, rhs)?;
        log::debug!("solve successful");
    } else {
        log::info!("solve failed for equation space #{}: {}", n + 1, outcome);
    }
    Ok(outcome)
}

/// Solves equation space `n` for the variable `v`.
pub fn solve_for(cx: &mut Ctxt, eqs: &mut Equations, v: Var, n: usize) -> Result<Outcome, Error> {
    solve_espace(cx, eqs, &[Token::variable(1, v)], n)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use crate::{
        simplify::simpa_side,
        token::{from_ast::{parse_equation, parse_side}, side::subst_var_with_exp},
    };
    use super::*;

    fn solve(src: &str, var: &str) -> (Ctxt, Outcome, Vec<Token>, Vec<Token>) {
        let mut cx = Ctxt::default();
        let (mut lhs, mut rhs) = parse_equation(&mut cx, src).unwrap();
        let v = cx.vars.intern(var);
        let outcome = solve_sub(&mut cx, &[Token::variable(1, v)], &mut lhs, &mut rhs).unwrap();
        (cx, outcome, lhs, rhs)
    }

    fn sign_var(side: &[Token]) -> Option<Var> {
        side.iter().filter_map(Token::as_var).find(Var::is_sign)
    }

    /// Evaluates a solved side with its sign variable set to `sign`.
    fn with_sign(cx: &mut Ctxt, side: &[Token], sign: f64) -> f64 {
        let mut side = side.to_vec();
        if let Some(s) = sign_var(&side) {
            subst_var_with_exp(cx, &mut side, &[Token::constant(0, sign)], s).unwrap();
        }
        simpa_side(cx, &mut side, false, false).unwrap();
        get_constant(cx, &side).unwrap()
    }

    #[test]
    fn linear() {
        let (cx, outcome, lhs, rhs) = solve("2*x + 3 = 7", "x");
        assert_eq!(outcome, Outcome::Solved);
        assert_eq!(display(&cx, &lhs), "x");
        assert_eq!(display(&cx, &rhs), "2");
    }

    #[test]
    fn variable_on_both_sides() {
        let (mut cx, outcome, lhs, rhs) = solve("3*x - 1 = x + 5", "x");
        assert_eq!(outcome, Outcome::Solved);
        assert_eq!(display(&cx, &lhs), "x");
        assert_eq!(with_sign(&mut cx, &rhs, 1.0), 3.0);
    }

    #[test]
    fn symbolic_coefficients() {
        let (mut cx, outcome, lhs, mut rhs) = solve("y = a*x + b", "x");
        assert_eq!(outcome, Outcome::Solved);
        assert_eq!(display(&cx, &lhs), "x");

        let mut expected = parse_side(&mut cx, "(y - b)/a").unwrap();
        simpa_side(&mut cx, &mut rhs, false, false).unwrap();
        simpa_side(&mut cx, &mut expected, false, false).unwrap();
        assert!(se_compare(&cx, &rhs, &expected).is_match(), "got {}", display(&cx, &rhs));
    }

    #[test]
    fn reciprocals_are_flipped() {
        let (mut cx, outcome, lhs, rhs) = solve("1/x = 4", "x");
        assert_eq!(outcome, Outcome::Solved);
        assert_eq!(display(&cx, &lhs), "x");
        assert_eq!(with_sign(&mut cx, &rhs, 1.0), 0.25);
    }

    #[test]
    fn even_powers_get_a_sign() {
        let (mut cx, outcome, lhs, rhs) = solve("x^2 = 9", "x");
        assert_eq!(outcome, Outcome::Solved);
        assert_eq!(display(&cx, &lhs), "x");
        assert!(sign_var(&rhs).is_some(), "got {}", display(&cx, &rhs));
        assert_eq!(with_sign(&mut cx, &rhs, 1.0), 3.0);
        assert_eq!(with_sign(&mut cx, &rhs, -1.0), -3.0);
    }

    #[test]
    fn odd_powers_have_one_root() {
        let (mut cx, outcome, _, rhs) = solve("x^3 = 8", "x");
        assert_eq!(outcome, Outcome::Solved);
        assert_eq!(sign_var(&rhs), None);
        assert!((with_sign(&mut cx, &rhs, 1.0) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn exponentials_take_logarithms() {
        let (mut cx, outcome, lhs, rhs) = solve("2^x = 8", "x");
        assert_eq!(outcome, Outcome::Solved);
        assert_eq!(display(&cx, &lhs), "x");
        assert!((with_sign(&mut cx, &rhs, 1.0) - 3.0).abs() < 1e-12);
    }

    #[test]
    fn quadratic_formula() {
        let (mut cx, outcome, lhs, rhs) = solve("x^2 + x = 6", "x");
        assert!(outcome.is_solved(), "{:?}", outcome);
        assert_eq!(display(&cx, &lhs), "x");
        assert!(sign_var(&rhs).is_some(), "got {}", display(&cx, &rhs));

        let mut roots = [with_sign(&mut cx, &rhs, 1.0), with_sign(&mut cx, &rhs, -1.0)];
        roots.sort_by(f64::total_cmp);
        assert!((roots[0] + 3.0).abs() < 1e-12 && (roots[1] - 2.0).abs() < 1e-12, "{:?}", roots);
    }

    #[test]
    fn modulus_introduces_an_integer() {
        let (cx, outcome, lhs, rhs) = solve("x % 5 = 2", "x");
        assert_eq!(outcome, Outcome::Solved);
        assert_eq!(display(&cx, &lhs), "x");
        let any = rhs.iter().filter_map(Token::as_var).find(|&v| cx.vars.is_integer(v));
        assert!(any.is_some(), "got {}", display(&cx, &rhs));

        let (_, outcome, _, _) = solve("x % 5 = 7", "x");
        assert_eq!(outcome, Outcome::Failed(Failure::NoSolutions));
    }

    #[test]
    fn degenerate_equations() {
        assert_eq!(solve("x + 1 = 1 + x", "x").1, Outcome::Identity);
        assert_eq!(solve("x + y = x + 2", "x").1, Outcome::Independent);
        assert_eq!(solve("x = x + 1", "x").1, Outcome::NoValues);
        assert_eq!(solve("y = 2", "x").1, Outcome::Failed(Failure::VarNotFound));
    }

    #[test]
    fn failures_leave_the_equation_alone() {
        let mut cx = Ctxt::default();
        let (mut lhs, mut rhs) = parse_equation(&mut cx, "y = 2").unwrap();
        let before = (lhs.clone(), rhs.clone());
        let x = cx.vars.intern("x");
        let outcome = solve_sub(&mut cx, &[Token::variable(1, x)], &mut lhs, &mut rhs).unwrap();
        assert!(!outcome.is_solved());
        assert_eq!((lhs, rhs), before);

        let bad = [Token::constant(1, 3.0)];
        let (mut lhs, mut rhs) = parse_equation(&mut cx, "x = 2").unwrap();
        assert_eq!(solve_sub(&mut cx, &bad, &mut lhs, &mut rhs).unwrap(), Outcome::Failed(Failure::BadTarget));
    }

    #[test]
    fn solving_for_zero() {
        let mut cx = Ctxt::default();
        let (mut lhs, mut rhs) = parse_equation(&mut cx, "y = x/2 + 1").unwrap();
        let zero = [Token::constant(1, 0.0)];
        let outcome = solve_sub(&mut cx, &zero, &mut lhs, &mut rhs).unwrap();
        assert_eq!(outcome, Outcome::Solved);
        assert_eq!(display(&cx, &lhs), "0");
        let x = cx.vars.get("x").unwrap();
        let y = cx.vars.get("y").unwrap();
        assert!(found_var(&rhs, x) > 0 && found_var(&rhs, y) > 0);
    }

    #[test]
    fn solving_spaces() {
        let mut cx = Ctxt::default();
        let mut eqs = Equations::new();
        let (lhs, rhs) = parse_equation(&mut cx, "y = 3*x").unwrap();
        let n = eqs.next_espace(&cx).unwrap();
        eqs.store(&cx, n, lhs, rhs).unwrap();

        let x = cx.vars.get("x").unwrap();
        assert_eq!(solve_for(&mut cx, &mut eqs, x, n).unwrap(), Outcome::Solved);
        assert!(eqs.is_solved(n));
        assert_eq!(eqs.get(n).unwrap().lhs, vec![Token::variable(1, x)]);

        let expression = eqs.next_espace(&cx).unwrap();
        let side = parse_side(&mut cx, "x + 1").unwrap();
        eqs.store(&cx, expression, side, Vec::new()).unwrap();
        assert_eq!(
            solve_for(&mut cx, &mut eqs, x, expression).unwrap(),
            Outcome::Failed(Failure::NotAnEquation),
        );
    }
}
