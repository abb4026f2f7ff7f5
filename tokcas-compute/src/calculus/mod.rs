//! Calculus on token sides: differentiation by the usual rules, and integration and Laplace
//! transforms of polynomials.
//!
//! None of them needs a simplified input, and all leave their output to the simplifiers.

pub mod derivative;
pub mod integrate;
pub mod laplace;

pub use derivative::{derivative, differentiate};
pub use integrate::{int_dispatch, integrate, integrate_definite, integrate_term, make_powers};
pub use laplace::{inverse_laplace_term, laplace, laplace_term};
