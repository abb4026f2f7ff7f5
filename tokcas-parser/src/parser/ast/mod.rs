pub mod binary;
pub mod equation;
pub mod expr;
pub mod literal;
pub mod paren;
pub mod unary;

pub use binary::Binary;
pub use equation::Equation;
pub use expr::Expr;
pub use literal::{Literal, LitNum, LitSym};
pub use paren::Paren;
pub use unary::Unary;
