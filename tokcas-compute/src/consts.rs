//! Numeric limits and tolerances shared by the rewriting passes.

/// Tolerance for ignoring larger, accumulated round-off errors when comparing constants.
pub const EPSILON: f64 = 5e-14;

/// Tolerance for ignoring small floating-point round-off errors.
pub const SMALL_EPSILON: f64 = 5e-15;

/// The largest floating-point integer that is safely exact (15 digits).
pub const MAX_K_INTEGER: f64 = 1.0e15;

/// Default capacity of an expression side, in tokens.
pub const DEFAULT_N_TOKENS: usize = 60000;

/// Number of equation spaces in the pool.
pub const N_EQUATIONS: usize = 200;

/// Iteration limit of the numeric and polynomial Euclidean algorithms.
pub const GCD_ITERATIONS: usize = 50;

/// The largest subscript a sign variable can have.
pub const MAX_SUBSCRIPT: usize = 62;

/// How many times the solver may raise both sides of an equation to a power to clear roots.
pub const MAX_RAISE_POWER: u32 = 20;

/// Returns true if every real number raised to `power` is non-negative.
pub fn always_positive(power: f64) -> bool {
    power % 2.0 == 0.0
}
