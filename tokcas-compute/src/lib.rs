//! A symbolic rewriting engine for algebraic expressions.
//!
//! Expressions are flat arrays of [`Token`](token::Token)s tagged with their parenthesization
//! level (see [`token`]). Every algorithm in this crate is a rewrite pass over such an array:
//! constant folding, expansion ([`unfactor`]), factoring ([`factor`] and [`poly`]), polynomial
//! division and GCDs, and the orchestrators in [`simplify`] that combine them. Differentiation and
//! polynomial integration and Laplace transforms live in [`calculus`], and [`solve`] isolates a
//! variable in an equation stored in the [`equation`] pool.
//!
//! All passes share a [`Ctxt`](ctxt::Ctxt), which holds the options, capacity limits, variable
//! names, and warnings of a session.

pub mod calculus;
pub mod compare;
pub mod complex;
pub mod config;
pub mod consts;
pub mod ctxt;
pub mod equation;
pub mod error;
pub mod factor;
pub mod fractions;
pub mod numeric;
pub mod poly;
pub mod simplify;
pub mod solve;
pub mod token;
pub mod unfactor;
pub mod warning;

pub use ctxt::Ctxt;
pub use error::Error;
