//! The pool of equation spaces.
//!
//! An equation space holds an equation `lhs = rhs`, or a bare expression when the right-hand side
//! is empty. Spaces are allocated on demand up to [`N_EQUATIONS`], and reused once emptied.
//! Numbering here is 0-origin; [`Equations::display`] shows the 1-origin number users see.

use std::fmt::Write;
use crate::{
    consts::N_EQUATIONS,
    ctxt::Ctxt,
    error::Error,
    fractions::fractions_and_group,
    simplify::{mid_simp_side, simp_loop, simpa_repeat_side},
    token::{fmt::display, side::found_var, Token, Var},
};

/// The name of the variable that numeric calculations are stored under. Spaces holding only such
/// a calculation are deleted when the pool runs out.
pub const ANSWER_VAR: &str = "answer";

/// One equation or expression.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EquationSpace {
    pub lhs: Vec<Token>,

    /// Empty for a bare expression.
    pub rhs: Vec<Token>,
}

impl EquationSpace {
    /// Returns true if the space holds nothing.
    pub fn is_empty(&self) -> bool {
        self.lhs.is_empty()
    }

    /// Returns true if the space holds an equation rather than an expression.
    pub fn is_equation(&self) -> bool {
        !self.lhs.is_empty() && !self.rhs.is_empty()
    }

    /// Returns true if the space is an equation solved for a variable: the left-hand side is a
    /// named variable that does not appear on the right-hand side.
    pub fn is_solved(&self) -> bool {
        if !self.is_equation() || self.lhs.len() != 1 {
            return false;
        }
        match self.lhs[0].as_var() {
            Some(v) if v.is_symbolic() && v != Var::MATCH_ANY => found_var(&self.rhs, v) == 0,
            _ => false,
        }
    }

    /// Returns true if `v` occurs on either side.
    pub fn contains_var(&self, v: Var) -> bool {
        !self.is_empty() && (found_var(&self.lhs, v) > 0 || found_var(&self.rhs, v) > 0)
    }

    fn clear(&mut self) {
        self.lhs.clear();
        self.rhs.clear();
    }

    /// Applies a simplification to both sides.
    fn simplify_with(
        &mut self,
        cx: &mut Ctxt,
        mut f: impl FnMut(&mut Ctxt, &mut Vec<Token>) -> Result<(), Error>,
    ) -> Result<(), Error> {
        if self.is_empty() {
            return Ok(());
        }
        f(cx, &mut self.lhs)?;
        if !self.rhs.is_empty() {
            f(cx, &mut self.rhs)?;
        }
        Ok(())
    }
}

/// The equation spaces, and which of them is current.
#[derive(Debug, Clone, Default)]
pub struct Equations {
    /// The spaces allocated so far. Never longer than [`N_EQUATIONS`].
    spaces: Vec<EquationSpace>,

    /// The current space.
    current: usize,
}

impl Equations {
    /// Creates an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of spaces allocated so far.
    pub fn allocated(&self) -> usize {
        self.spaces.len()
    }

    /// Returns the current space number.
    pub fn current(&self) -> usize {
        self.current
    }

    /// Makes space `n` current. Returns false if it is not allocated.
    pub fn set_current(&mut self, n: usize) -> bool {
        let valid = n < self.spaces.len();
        if valid {
            self.current = n;
        }
        valid
    }

    pub fn get(&self, n: usize) -> Option<&EquationSpace> {
        self.spaces.get(n)
    }

    pub fn get_mut(&mut self, n: usize) -> Option<&mut EquationSpace> {
        self.spaces.get_mut(n)
    }

    /// Stores an equation in space `n`, which must be allocated. Pass an empty `rhs` for an
    /// expression.
    pub fn store(&mut self, cx: &Ctxt, n: usize, lhs: Vec<Token>, rhs: Vec<Token>) -> Result<(), Error> {
        cx.check_len(lhs.len())?;
        cx.check_len(rhs.len())?;
        let space = self.spaces.get_mut(n).ok_or(Error::Bug("storing into an unallocated equation space"))?;
        *space = EquationSpace { lhs, rhs };
        Ok(())
    }

    /// Makes space `n` available and empty. Returns false if `n` is out of range.
    pub fn alloc_espace(&mut self, n: usize) -> bool {
        if !self.alloc_to_espace(n) {
            return false;
        }
        self.spaces[n].clear();
        true
    }

    /// Allocates every space up to and including `n`, leaving the existing ones alone. Returns
    /// false if `n` is out of range.
    pub fn alloc_to_espace(&mut self, n: usize) -> bool {
        if n >= N_EQUATIONS {
            return false;
        }
        if n >= self.spaces.len() {
            self.spaces.resize_with(n + 1, EquationSpace::default);
        }
        true
    }

    /// Finds an empty space, searching circularly from the current one, or allocates a new one.
    pub fn alloc_next_espace(&mut self) -> Option<usize> {
        let mut n = self.current;
        for _ in 0..N_EQUATIONS {
            if n >= self.spaces.len() {
                let n = self.spaces.len();
                if !self.alloc_espace(n) {
                    break;
                }
                return Some(n);
            }
            if self.spaces[n].is_empty() {
                self.spaces[n].rhs.clear();
                return Some(n);
            }
            n = (n + 1) % N_EQUATIONS;
        }
        None
    }

    /// Like [`Equations::alloc_next_espace`], but when the pool is full, the stored numeric
    /// calculations are deleted to make room first.
    pub fn next_espace(&mut self, cx: &Ctxt) -> Result<usize, Error> {
        if let Some(n) = self.alloc_next_espace() {
            return Ok(n);
        }
        if let Some(answer) = cx.vars.get(ANSWER_VAR) {
            log::info!("deleting old numeric calculations to free up equation spaces");
            for space in &mut self.spaces {
                if space.lhs.len() == 1 && space.lhs[0].is_var_eq(answer) {
                    space.clear();
                }
            }
        }
        self.alloc_next_espace().ok_or(Error::OutOfSpaces)
    }

    /// Overwrites space `dest` with a copy of space `src`.
    pub fn copy_espace(&mut self, src: usize, dest: usize) -> Result<(), Error> {
        if src == dest {
            log::debug!("copying equation space {} onto itself", src + 1);
            return Ok(());
        }
        let copy = self.spaces.get(src).ok_or(Error::Bug("copying an unallocated equation space"))?.clone();
        *self.spaces.get_mut(dest).ok_or(Error::Bug("copying into an unallocated equation space"))? = copy;
        Ok(())
    }

    /// Returns true if space `n` is not allocated or holds nothing.
    pub fn is_empty(&self, n: usize) -> bool {
        self.spaces.get(n).map_or(true, EquationSpace::is_empty)
    }

    /// Returns true if space `n` holds an equation solved for a variable.
    pub fn is_solved(&self, n: usize) -> bool {
        self.spaces.get(n).map_or(false, EquationSpace::is_solved)
    }

    /// Empties every space and forgets every variable. The first space becomes current.
    pub fn clear_all(&mut self, cx: &mut Ctxt) {
        self.current = 0;
        for space in &mut self.spaces {
            space.clear();
        }
        cx.clear();
    }

    /// Returns true if `v` occurs in space `n`.
    pub fn var_in_equation(&self, n: usize, v: Var) -> bool {
        self.spaces.get(n).map_or(false, |space| space.contains_var(v))
    }

    /// Searches every space for `v`, starting after the current space, or before it if `forward`
    /// is false. The space found becomes current.
    pub fn search_all_for_var(&mut self, v: Var, forward: bool) -> bool {
        let count = self.spaces.len();
        if count == 0 {
            return false;
        }
        let mut n = self.current.min(count - 1);
        for _ in 0..count {
            n = if forward { (n + 1) % count } else { (n + count - 1) % count };
            if self.var_in_equation(n, v) {
                self.current = n;
                return true;
            }
        }
        false
    }

    /// Replaces every `from` with `to` in space `n`.
    pub fn rename_var_in_es(&mut self, n: usize, from: Var, to: Var) {
        let Some(space) = self.spaces.get_mut(n).filter(|space| !space.is_empty()) else {
            log::debug!("renaming a variable in empty equation space {}", n + 1);
            return;
        };
        for t in space.lhs.iter_mut().chain(space.rhs.iter_mut()) {
            if t.is_var_eq(from) {
                *t = Token::variable(t.level, to);
            }
        }
    }

    fn space_mut(&mut self, n: usize) -> Result<&mut EquationSpace, Error> {
        self.spaces.get_mut(n).ok_or(Error::Bug("simplifying an unallocated equation space"))
    }

    /// Simplifies both sides of space `n` quickly, without factoring.
    pub fn simp_equation(&mut self, cx: &mut Ctxt, n: usize) -> Result<(), Error> {
        self.space_mut(n)?.simplify_with(cx, |cx, side| simp_loop(cx, side).map(drop))
    }

    /// Simplifies both sides of space `n` with trivial factoring.
    pub fn mid_simp_equation(&mut self, cx: &mut Ctxt, n: usize) -> Result<(), Error> {
        self.space_mut(n)?.simplify_with(cx, mid_simp_side)
    }

    /// Fully simplifies both sides of space `n`.
    pub fn simplify_equation(&mut self, cx: &mut Ctxt, n: usize) -> Result<(), Error> {
        self.space_mut(n)?.simplify_with(cx, |cx, side| simpa_repeat_side(cx, side, false, false))
    }

    /// Makes space `n` ready for display, converting constants to fractions and grouping
    /// denominators. Returns true if any fraction was created.
    pub fn make_fractions_and_group(&mut self, cx: &mut Ctxt, n: usize) -> Result<bool, Error> {
        let mut created = false;
        self.space_mut(n)?.simplify_with(cx, |cx, side| {
            created |= fractions_and_group(cx, side)?;
            Ok(())
        })?;
        Ok(created)
    }

    /// Formats space `n` with its 1-origin number, or returns `None` if it is empty.
    pub fn display(&self, cx: &Ctxt, n: usize) -> Option<String> {
        let space = self.spaces.get(n).filter(|space| !space.is_empty())?;
        let mut out = format!("#{}: {}", n + 1, display(cx, &space.lhs));
        if !space.rhs.is_empty() {
            let _ = write!(out, " = {}", display(cx, &space.rhs));
        }
        Some(out)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use crate::token::from_ast::parse_equation;
    use super::*;

    fn load(cx: &mut Ctxt, eqs: &mut Equations, src: &str) -> usize {
        let (lhs, rhs) = parse_equation(cx, src).unwrap();
        let n = eqs.next_espace(cx).unwrap();
        eqs.store(cx, n, lhs, rhs).unwrap();
        n
    }

    #[test]
    fn spaces_are_allocated_in_order() {
        let mut cx = Ctxt::default();
        let mut eqs = Equations::new();
        assert_eq!(load(&mut cx, &mut eqs, "y = x + 1"), 0);
        assert_eq!(load(&mut cx, &mut eqs, "x^2"), 1);
        assert_eq!(eqs.allocated(), 2);
        assert_eq!(eqs.display(&cx, 0).as_deref(), Some("#1: y = x + 1"));
        assert_eq!(eqs.display(&cx, 1).as_deref(), Some("#2: x^2"));
        assert_eq!(eqs.display(&cx, 2), None);
    }

    #[test]
    fn empty_spaces_are_reused() {
        let mut cx = Ctxt::default();
        let mut eqs = Equations::new();
        load(&mut cx, &mut eqs, "a");
        load(&mut cx, &mut eqs, "b");
        assert!(eqs.alloc_espace(0));
        assert!(eqs.is_empty(0));
        assert_eq!(eqs.alloc_next_espace(), Some(0));
    }

    #[test]
    fn pool_is_bounded() {
        let mut cx = Ctxt::default();
        let mut eqs = Equations::new();
        for _ in 0..N_EQUATIONS {
            load(&mut cx, &mut eqs, "x");
        }
        assert!(!eqs.alloc_espace(N_EQUATIONS));
        assert_eq!(eqs.next_espace(&cx), Err(Error::OutOfSpaces));
    }

    #[test]
    fn numeric_answers_are_deleted_when_full() {
        let mut cx = Ctxt::default();
        let mut eqs = Equations::new();
        for _ in 0..N_EQUATIONS - 1 {
            load(&mut cx, &mut eqs, "x");
        }
        let answer = load(&mut cx, &mut eqs, "answer = 42");
        assert_eq!(eqs.next_espace(&cx), Ok(answer));
    }

    #[test]
    fn solved_equations() {
        let mut cx = Ctxt::default();
        let mut eqs = Equations::new();
        let solved = load(&mut cx, &mut eqs, "y = x + 1");
        let unsolved = load(&mut cx, &mut eqs, "y = y*x + 1");
        let constant = load(&mut cx, &mut eqs, "pi = 3");
        let expression = load(&mut cx, &mut eqs, "y");
        assert!(eqs.is_solved(solved));
        assert!(!eqs.is_solved(unsolved));
        assert!(!eqs.is_solved(constant));
        assert!(!eqs.is_solved(expression));
    }

    #[test]
    fn copying_and_renaming() {
        let mut cx = Ctxt::default();
        let mut eqs = Equations::new();
        let src = load(&mut cx, &mut eqs, "y = x + 1");
        let dest = eqs.next_espace(&cx).unwrap();
        eqs.copy_espace(src, dest).unwrap();

        let x = cx.vars.get("x").unwrap();
        let z = cx.vars.intern("z");
        eqs.rename_var_in_es(dest, x, z);
        assert_eq!(eqs.display(&cx, src).as_deref(), Some("#1: y = x + 1"));
        assert_eq!(eqs.display(&cx, dest).as_deref(), Some("#2: y = z + 1"));
        assert!(eqs.var_in_equation(dest, z));
        assert!(!eqs.var_in_equation(dest, x));
    }

    #[test]
    fn search_wraps_around() {
        let mut cx = Ctxt::default();
        let mut eqs = Equations::new();
        load(&mut cx, &mut eqs, "a = 1");
        load(&mut cx, &mut eqs, "b = 2");
        load(&mut cx, &mut eqs, "c = 3");
        let a = cx.vars.get("a").unwrap();
        let c = cx.vars.get("c").unwrap();

        assert!(eqs.set_current(1));
        assert!(eqs.search_all_for_var(a, true));
        assert_eq!(eqs.current(), 0);
        assert!(eqs.search_all_for_var(c, false));
        assert_eq!(eqs.current(), 2);

        let missing = cx.vars.intern("missing");
        assert!(!eqs.search_all_for_var(missing, true));
        assert_eq!(eqs.current(), 2);
    }

    #[test]
    fn simplifying_both_sides() {
        let mut cx = Ctxt::default();
        let mut eqs = Equations::new();
        let n = load(&mut cx, &mut eqs, "y = x + x + 2*3");
        eqs.simplify_equation(&mut cx, n).unwrap();
        assert_eq!(eqs.display(&cx, n).as_deref(), Some("#1: y = 2*x + 6"));
    }

    #[test]
    fn clearing_everything() {
        let mut cx = Ctxt::default();
        let mut eqs = Equations::new();
        load(&mut cx, &mut eqs, "a = 1");
        load(&mut cx, &mut eqs, "b = 2");
        eqs.set_current(1);
        eqs.clear_all(&mut cx);
        assert_eq!(eqs.current(), 0);
        assert!(eqs.is_empty(0) && eqs.is_empty(1));
        assert_eq!(cx.vars.get("a"), None);
    }
}
