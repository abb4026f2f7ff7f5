//! Simplification options.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// How `%` chooses the sign of its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ModulusMode {
    /// Same sign as the dividend, like C's `fmod`.
    Dividend,

    /// Same sign as the divisor.
    Divisor,

    /// Always non-negative.
    #[default]
    NonNegative,
}

/// How constants are turned into fractions for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FractionsDisplay {
    /// Leave decimals alone.
    None,

    /// `7/2`
    #[default]
    Simple,

    /// `3 + 1/2`
    Mixed,
}

/// The simplification flags. Passes read these from the [`Ctxt`](crate::ctxt::Ctxt); the
/// orchestrator overrides some of them temporarily with [`Ctxt::scoped`](crate::ctxt::Ctxt::scoped).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Config {
    /// Do not distribute division over sums when expanding.
    pub partial: bool,

    /// Allow power merges that are not valid for every real value, such as `(x^2)^(1/2) -> x`.
    pub symbolic: bool,

    /// All sign variables compare equal to each other.
    pub sign_cmp: bool,

    /// Fold irrational powers numerically instead of keeping them as surds.
    pub approximate_roots: bool,

    /// Keep roots like `2^(1/2)` unevaluated.
    pub preserve_surds: bool,

    /// Move roots out of denominators.
    pub rationalize_denominators: bool,

    /// Sign convention of `%`.
    pub modulus_mode: ModulusMode,

    /// Factor out the GCD of all rational coefficients, not just the smallest one.
    pub factor_out_all_numeric_gcds: bool,

    /// Parse `a^b^c` as `a^(b^c)`.
    pub right_associative_power: bool,

    /// Fraction style of [`make_fractions`](crate::fractions::make_fractions).
    pub fractions_display: FractionsDisplay,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            partial: true,
            symbolic: false,
            sign_cmp: false,
            approximate_roots: false,
            preserve_surds: true,
            rationalize_denominators: true,
            modulus_mode: ModulusMode::NonNegative,
            factor_out_all_numeric_gcds: false,
            right_associative_power: false,
            fractions_display: FractionsDisplay::Simple,
        }
    }
}
