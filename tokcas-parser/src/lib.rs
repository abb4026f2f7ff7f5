//! Text front end for tokcas: turns source text such as `x^2 - 1 = 0` into an abstract syntax tree
//! that the compute crate converts into its token representation.

pub mod parser;
pub mod tokenizer;
