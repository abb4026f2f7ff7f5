//! Variables and the table that names them.
//!
//! A [`Var`] is a small `Copy` identifier. Its name lives in the [`VarTable`] owned by the
//! [`Ctxt`](crate::ctxt::Ctxt); the rewriting passes never look at names, with one exception:
//! variables whose name starts with `integer` are known to only hold integer values.

use std::collections::HashMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The prefix that marks a variable as integer-valued.
pub const INTEGER_PREFIX: &str = "integer";

/// The predefined variables. These sort before every named variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Special {
    /// Euler's number.
    E,

    /// The ratio of a circle's circumference to its diameter.
    Pi,

    /// The imaginary unit.
    Imaginary,

    /// A two-valued variable, `+1` or `-1`.
    Sign,

    /// Wild card that matches any variable when factoring.
    MatchAny,
}

/// What a [`Var`] refers to: a predefined variable, or an index into the [`VarTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum VarBase {
    Special(Special),
    Named(u32),
}

/// A variable identifier.
///
/// The subscript is only used by sign variables, to tell `sign`, `sign1`, `sign2`, ... apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Var {
    pub base: VarBase,
    pub subscript: u32,
}

impl Var {
    pub const E: Var = Var::special(Special::E);
    pub const PI: Var = Var::special(Special::Pi);
    pub const IMAGINARY: Var = Var::special(Special::Imaginary);
    pub const SIGN: Var = Var::special(Special::Sign);
    pub const MATCH_ANY: Var = Var::special(Special::MatchAny);

    /// Creates a predefined variable with no subscript.
    pub const fn special(special: Special) -> Self {
        Self { base: VarBase::Special(special), subscript: 0 }
    }

    /// Creates a sign variable with the given subscript.
    pub const fn sign(subscript: u32) -> Self {
        Self { base: VarBase::Special(Special::Sign), subscript }
    }

    /// Returns true if this is a sign variable, regardless of its subscript.
    pub fn is_sign(&self) -> bool {
        self.base == VarBase::Special(Special::Sign)
    }

    /// Returns true if this variable is `e`, `pi`, or `i`: a constant with a symbolic name.
    pub fn is_constant(&self) -> bool {
        matches!(
            self.base,
            VarBase::Special(Special::E | Special::Pi | Special::Imaginary)
        )
    }

    /// Returns true if this variable stands for an unknown quantity rather than a number. Sign
    /// variables are numeric (`+1` or `-1`), so they are not symbolic.
    pub fn is_symbolic(&self) -> bool {
        matches!(self.base, VarBase::Named(_) | VarBase::Special(Special::MatchAny))
    }

    /// Returns a number that orders variables the same way as [`Ord`], for weighing terms by the
    /// variables they contain.
    pub fn weight(&self) -> f64 {
        let base = match self.base {
            VarBase::Special(special) => special as u32 as f64,
            VarBase::Named(index) => 8.0 + index as f64,
        };
        base * 64.0 + self.subscript as f64
    }

    /// Returns the numeric value of `e` and `pi`.
    pub fn const_value(&self) -> Option<f64> {
        match self.base {
            VarBase::Special(Special::E) => Some(std::f64::consts::E),
            VarBase::Special(Special::Pi) => Some(std::f64::consts::PI),
            _ => None,
        }
    }
}

/// Interns variable names.
#[derive(Debug, Clone, Default)]
pub struct VarTable {
    names: Vec<String>,
    lookup: HashMap<String, u32>,
}

impl VarTable {
    /// Returns the variable with the given name, creating it if it does not exist yet.
    ///
    /// The names `e`, `pi`, `i`, and `sign` (optionally followed by digits) are reserved for the
    /// predefined variables.
    pub fn intern(&mut self, name: &str) -> Var {
        if let Some(var) = Self::reserved(name) {
            return var;
        }
        if let Some(&index) = self.lookup.get(name) {
            return Var { base: VarBase::Named(index), subscript: 0 };
        }

        let index = self.names.len() as u32;
        self.names.push(name.to_string());
        self.lookup.insert(name.to_string(), index);
        Var { base: VarBase::Named(index), subscript: 0 }
    }

    /// Returns the variable with the given name, if it exists.
    pub fn get(&self, name: &str) -> Option<Var> {
        Self::reserved(name).or_else(|| {
            self.lookup
                .get(name)
                .map(|&index| Var { base: VarBase::Named(index), subscript: 0 })
        })
    }

    fn reserved(name: &str) -> Option<Var> {
        match name {
            "e" => Some(Var::E),
            "pi" => Some(Var::PI),
            "i" => Some(Var::IMAGINARY),
            "sign" => Some(Var::SIGN),
            _ => {
                let digits = name.strip_prefix("sign")?;
                if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                    return None;
                }
                digits.parse().ok().map(Var::sign)
            },
        }
    }

    /// Returns the display name of a variable.
    pub fn name(&self, var: Var) -> String {
        match var.base {
            VarBase::Special(Special::E) => "e".to_string(),
            VarBase::Special(Special::Pi) => "pi".to_string(),
            VarBase::Special(Special::Imaginary) => "i".to_string(),
            VarBase::Special(Special::Sign) if var.subscript == 0 => "sign".to_string(),
            VarBase::Special(Special::Sign) => format!("sign{}", var.subscript),
            VarBase::Special(Special::MatchAny) => "all".to_string(),
            VarBase::Named(index) => self.names
                .get(index as usize)
                .cloned()
                .unwrap_or_else(|| format!("v{}", index)),
        }
    }

    /// Returns true if the variable only holds integer values.
    pub fn is_integer(&self, var: Var) -> bool {
        match var.base {
            VarBase::Named(index) => self.names
                .get(index as usize)
                .map_or(false, |name| name.starts_with(INTEGER_PREFIX)),
            _ => false,
        }
    }

    /// Forgets every name.
    pub fn clear(&mut self) {
        self.names.clear();
        self.lookup.clear();
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use super::*;

    #[test]
    fn interning_is_stable() {
        let mut vars = VarTable::default();
        let x = vars.intern("x");
        let y = vars.intern("y");
        assert_eq!(vars.intern("x"), x);
        assert!(x < y);
        assert_eq!(vars.name(y), "y");
    }

    #[test]
    fn reserved_names() {
        let mut vars = VarTable::default();
        assert_eq!(vars.intern("pi"), Var::PI);
        assert_eq!(vars.intern("i"), Var::IMAGINARY);
        assert_eq!(vars.intern("sign3"), Var::sign(3));
        assert_eq!(vars.name(Var::sign(3)), "sign3");
        assert!(vars.intern("signal").is_symbolic());
    }

    #[test]
    fn specials_sort_first() {
        let mut vars = VarTable::default();
        let a = vars.intern("a");
        assert!(Var::E < Var::PI);
        assert!(Var::IMAGINARY < Var::SIGN);
        assert!(Var::sign(5) < Var::MATCH_ANY);
        assert!(Var::MATCH_ANY < a);

        let b = vars.intern("b");
        let mut all = [b, Var::sign(2), a, Var::E, Var::SIGN, Var::IMAGINARY];
        all.sort();
        assert!(all.windows(2).all(|w| w[0].weight() < w[1].weight()));
    }

    #[test]
    fn integer_variables() {
        let mut vars = VarTable::default();
        let n = vars.intern("integer_n");
        let x = vars.intern("x");
        assert!(vars.is_integer(n));
        assert!(!vars.is_integer(x));
    }
}
