//! The token array representation of expressions.
//!
//! An expression is stored as a flat sequence of [`Token`]s of odd length that alternates between
//! operands and operators: `operand, operator, operand, ..., operand`. Instead of explicit
//! parentheses, every token carries a **level**, its parenthesization depth (origin 1). The
//! expression `(a + b) * c` is stored as:
//!
//! ```text
//! a   +   b   *   c
//! 2   2   2   1   1
//! ```
//!
//! Operators bind the operands at their own level; any run of tokens at a deeper level is one
//! operand. Every rewrite in this crate edits the array in place and then restores the canonical
//! level structure with [`organize`](crate::simplify::organize::organize).

pub mod fmt;
pub mod from_ast;
pub mod side;
pub mod var;

pub use var::{Special, Var, VarBase, VarTable};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// An operator, in precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Op {
    /// `a + b`
    Plus,

    /// `a - b`
    Minus,

    /// Unary negation. Only exists while converting from a syntax tree; never stored in a side.
    Negate,

    /// `a * b`
    Times,

    /// `a / b`
    Divide,

    /// `a % b`
    Modulus,

    /// `a // b`
    IDivide,

    /// `a ^ b`
    Power,

    /// `a!`, stored with a dummy right operand.
    Factorial,
}

impl Op {
    /// Returns the symbol used to display the operator.
    pub fn symbol(self) -> &'static str {
        match self {
            Op::Plus => "+",
            Op::Minus | Op::Negate => "-",
            Op::Times => "*",
            Op::Divide => "/",
            Op::Modulus => "%",
            Op::IDivide => "//",
            Op::Power => "^",
            Op::Factorial => "!",
        }
    }

    /// Returns true for `+` and `-`.
    pub fn is_additive(self) -> bool {
        matches!(self, Op::Plus | Op::Minus)
    }

    /// Returns true for `*` and `/`.
    pub fn is_multiplicative(self) -> bool {
        matches!(self, Op::Times | Op::Divide)
    }

    /// Swaps `+` with `-` and `*` with `/`. Other operators are returned unchanged.
    pub fn inverse(self) -> Op {
        match self {
            Op::Plus => Op::Minus,
            Op::Minus => Op::Plus,
            Op::Times => Op::Divide,
            Op::Divide => Op::Times,
            op => op,
        }
    }
}

/// The payload of a token.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum TokenKind {
    Constant(f64),
    Variable(Var),
    Operator(Op),
}

/// One element of an expression side.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Token {
    /// Parenthesization depth, origin 1.
    pub level: i32,

    /// What the token is.
    pub kind: TokenKind,
}

impl Token {
    /// Creates a constant token.
    pub fn constant(level: i32, value: f64) -> Self {
        Self { level, kind: TokenKind::Constant(value) }
    }

    /// Creates a variable token.
    pub fn variable(level: i32, var: Var) -> Self {
        Self { level, kind: TokenKind::Variable(var) }
    }

    /// Creates an operator token.
    pub fn operator(level: i32, op: Op) -> Self {
        Self { level, kind: TokenKind::Operator(op) }
    }

    /// Returns the operator if this is an operator token.
    pub fn op(&self) -> Option<Op> {
        match self.kind {
            TokenKind::Operator(op) => Some(op),
            _ => None,
        }
    }

    /// Returns true if this is the given operator.
    pub fn is_op(&self, op: Op) -> bool {
        self.op() == Some(op)
    }

    /// Returns the value if this is a constant token.
    pub fn as_constant(&self) -> Option<f64> {
        match self.kind {
            TokenKind::Constant(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the variable if this is a variable token.
    pub fn as_var(&self) -> Option<Var> {
        match self.kind {
            TokenKind::Variable(var) => Some(var),
            _ => None,
        }
    }

    /// Returns true if this is a constant token.
    pub fn is_constant(&self) -> bool {
        matches!(self.kind, TokenKind::Constant(_))
    }

    /// Returns true if this is a variable token.
    pub fn is_var(&self) -> bool {
        matches!(self.kind, TokenKind::Variable(_))
    }

    /// Returns true if this token is the given variable.
    pub fn is_var_eq(&self, var: Var) -> bool {
        self.as_var() == Some(var)
    }

    /// Returns true if this token is exactly the constant `value`.
    pub fn is_constant_eq(&self, value: f64) -> bool {
        self.as_constant() == Some(value)
    }

    /// Replaces the constant value of this token. Does nothing to other kinds.
    pub fn set_constant(&mut self, value: f64) {
        if let TokenKind::Constant(old) = &mut self.kind {
            *old = value;
        }
    }

    /// Replaces the operator of this token. Does nothing to other kinds.
    pub fn set_op(&mut self, op: Op) {
        if let TokenKind::Operator(old) = &mut self.kind {
            *old = op;
        }
    }
}
