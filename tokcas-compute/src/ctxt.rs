use crate::{
    config::Config,
    consts::{DEFAULT_N_TOKENS, MAX_SUBSCRIPT},
    error::Error,
    token::{Token, Var, VarTable},
    warning::Warning,
};
use std::sync::{atomic::{AtomicBool, Ordering}, Arc};

/// The state shared by every rewrite: options, capacity limits, the variable table, and the
/// warning log.
///
/// A `Ctxt` is owned by one thread. Another thread can cancel a running simplification through the
/// flag returned by [`Ctxt::interrupt_handle`].
#[derive(Debug, Clone)]
pub struct Ctxt {
    /// The simplification options.
    pub config: Config,

    /// Names of the variables used in expressions.
    pub vars: VarTable,

    /// Keep simplifying until the result stops shrinking.
    pub repeat: bool,

    /// The maximum number of tokens in a side.
    n_tokens: usize,

    /// Warnings raised since the last call to [`Ctxt::take_warnings`].
    warnings: Vec<Warning>,

    /// The most recent warning, used to avoid reporting the same warning twice in a row.
    last_warning: Option<Warning>,

    /// Set by another thread to abort the current simplification.
    interrupt: Arc<AtomicBool>,

    /// Sign variable subscripts in use.
    signs: [bool; MAX_SUBSCRIPT + 2],
}

impl Default for Ctxt {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_N_TOKENS)
    }
}

impl Ctxt {
    /// Creates a context whose sides hold at most `n_tokens` tokens.
    pub fn with_capacity(n_tokens: usize) -> Self {
        Self {
            config: Config::default(),
            vars: VarTable::default(),
            repeat: false,
            n_tokens: n_tokens.max(100),
            warnings: Vec::new(),
            last_warning: None,
            interrupt: Arc::new(AtomicBool::new(false)),
            signs: [false; MAX_SUBSCRIPT + 2],
        }
    }

    /// Returns the capacity of a side, in tokens.
    pub fn n_tokens(&self) -> usize {
        self.n_tokens
    }

    /// A comfortable maximum size for a divisor.
    pub fn divisor_size(&self) -> usize {
        (self.n_tokens / 2).min(15000)
    }

    /// The maximum number of distinct variables handled in one side.
    pub fn max_vars(&self) -> usize {
        (self.n_tokens / 4).min(1000)
    }

    /// The maximum number of terms on one level that the comparator will try to match.
    pub fn max_compare_terms(&self) -> usize {
        self.n_tokens / 6
    }

    /// Returns an error if a side of `len` tokens would not fit.
    pub fn check_len(&self, len: usize) -> Result<(), Error> {
        if len > self.n_tokens {
            Err(Error::TooLarge)
        } else {
            Ok(())
        }
    }

    /// Records a warning, unless it repeats the previous one.
    pub fn warn(&mut self, warning: Warning) {
        if self.last_warning == Some(warning) {
            return;
        }
        self.last_warning = Some(warning);
        log::warn!("{}", warning);
        self.warnings.push(warning);
    }

    /// Returns the warnings recorded so far, clearing the log.
    pub fn take_warnings(&mut self) -> Vec<Warning> {
        self.last_warning = None;
        std::mem::take(&mut self.warnings)
    }

    /// Returns a handle that can be used to interrupt a running simplification from another thread.
    pub fn interrupt_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.interrupt)
    }

    /// Returns [`Error::Interrupted`] if the interrupt flag was raised, clearing it.
    pub fn check_interrupt(&self) -> Result<(), Error> {
        if self.interrupt.swap(false, Ordering::Relaxed) {
            Err(Error::Interrupted)
        } else {
            Ok(())
        }
    }

    /// Runs `f` with a modified copy of the configuration, then restores the previous
    /// configuration whatever `f` returns.
    pub fn scoped<T>(&mut self, set: impl FnOnce(&mut Config), f: impl FnOnce(&mut Ctxt) -> T) -> T {
        let saved = self.config;
        set(&mut self.config);
        let result = f(self);
        self.config = saved;
        result
    }

    /// Runs a fallible attempt, restoring the configuration afterwards. Recoverable errors become
    /// `None`; critical errors propagate.
    pub fn trap<T>(&mut self, f: impl FnOnce(&mut Ctxt) -> Result<T, Error>) -> Result<Option<T>, Error> {
        let saved = self.config;
        let result = f(self);
        self.config = saved;
        crate::error::trap(result)
    }

    /// Returns a sign variable that is not used in any of the given sides, and marks it used.
    ///
    /// When every subscript is taken, the plain `sign` variable is returned.
    pub fn next_sign(&mut self, sides: &[&[Token]]) -> Var {
        for side in sides {
            for var in side.iter().filter_map(Token::as_var).filter(Var::is_sign) {
                if let Some(used) = self.signs.get_mut(var.subscript as usize) {
                    *used = true;
                }
            }
        }

        match self.signs.iter().position(|used| !used) {
            Some(subscript) => {
                self.signs[subscript] = true;
                Var::sign(subscript as u32)
            },
            None => Var::SIGN,
        }
    }

    /// Forgets every variable name and sign variable.
    pub fn clear(&mut self) {
        self.vars.clear();
        self.signs = [false; MAX_SUBSCRIPT + 2];
        self.warnings.clear();
        self.last_warning = None;
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use super::*;

    #[test]
    fn warnings_are_deduplicated() {
        let mut cx = Ctxt::default();
        cx.warn(Warning::DivideByZero);
        cx.warn(Warning::DivideByZero);
        cx.warn(Warning::ModuloZero);
        cx.warn(Warning::DivideByZero);
        assert_eq!(cx.take_warnings(), vec![
            Warning::DivideByZero,
            Warning::ModuloZero,
            Warning::DivideByZero,
        ]);
        assert!(cx.take_warnings().is_empty());
    }

    #[test]
    fn scoped_restores_config() {
        let mut cx = Ctxt::default();
        let partial = cx.scoped(|config| config.partial = false, |cx| cx.config.partial);
        assert!(!partial);
        assert!(cx.config.partial);
    }

    #[test]
    fn trap_restores_config() {
        let mut cx = Ctxt::default();
        let result = cx.trap(|cx| -> Result<(), Error> {
            cx.config.symbolic = true;
            Err(Error::TooLarge)
        });
        assert_eq!(result, Ok(None));
        assert!(!cx.config.symbolic);
    }

    #[test]
    fn interrupt_is_observed_once() {
        let cx = Ctxt::default();
        cx.interrupt_handle().store(true, Ordering::Relaxed);
        assert_eq!(cx.check_interrupt(), Err(Error::Interrupted));
        assert_eq!(cx.check_interrupt(), Ok(()));
    }

    #[test]
    fn sign_variables_are_unique() {
        let mut cx = Ctxt::default();
        let used = [Token::variable(1, Var::sign(0))];
        let first = cx.next_sign(&[&used]);
        let second = cx.next_sign(&[]);
        assert_eq!(first, Var::sign(1));
        assert_eq!(second, Var::sign(2));
    }
}
