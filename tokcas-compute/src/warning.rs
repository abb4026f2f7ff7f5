use std::fmt;

/// A non-fatal condition noticed while folding constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Warning {
    /// A constant was divided by zero. The result is infinite.
    DivideByZero,

    /// `x % 0` was evaluated.
    ModuloZero,

    /// `0^0` was evaluated as 1.
    ZeroPowerZero,

    /// `0` was raised to a negative power. The result is infinite.
    ZeroToNegativePower,

    /// Folding produced an infinite constant.
    InfinityProduced,

    /// Folding an irrational power of a negative number produced an imaginary constant.
    ImaginaryConstant,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Warning::DivideByZero => write!(f, "Division by zero."),
            Warning::ModuloZero => write!(f, "Modulo 0 encountered."),
            Warning::ZeroPowerZero => write!(f, "0^0 encountered, might be considered indeterminate."),
            Warning::ZeroToNegativePower => write!(f, "Divide by zero (0 raised to negative power)."),
            Warning::InfinityProduced => write!(f, "Infinity or NaN produced."),
            Warning::ImaginaryConstant => write!(f, "Imaginary number produced by a real power."),
        }
    }
}
