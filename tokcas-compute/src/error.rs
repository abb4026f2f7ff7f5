//! Errors raised by the rewriting engine.

use std::fmt;

/// An error that aborts a rewrite.
///
/// Most rewrites cannot fail; a pass that finds nothing to do simply returns `false`. The variants
/// here are the conditions that unwind out of a pass. Factoring, GCD search, and power expansion
/// recover from the non-critical ones with [`trap`], leaving the expression as it was before the
/// attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// The expression would grow beyond the token capacity of a side.
    TooLarge,

    /// A numeric domain or range fault while folding constants.
    Domain(String),

    /// A structural invariant of the token array was violated. This is a bug in the engine.
    Bug(&'static str),

    /// The interrupt flag was raised by another thread.
    Interrupted,

    /// Every equation space is in use.
    OutOfSpaces,
}

impl Error {
    /// Returns true if no trap site may swallow this error.
    pub fn is_critical(&self) -> bool {
        matches!(self, Error::Bug(_) | Error::Interrupted)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::TooLarge => write!(f, "Expression too large."),
            Error::Domain(msg) => write!(f, "{}", msg),
            Error::Bug(msg) => write!(f, "Internal error: {}", msg),
            Error::Interrupted => write!(f, "Operation aborted."),
            Error::OutOfSpaces => write!(f, "Out of free equation spaces."),
        }
    }
}

impl std::error::Error for Error {}

/// Converts a recoverable failure into `None`. Critical errors are returned as-is.
pub fn trap<T>(result: Result<T, Error>) -> Result<Option<T>, Error> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(err) if err.is_critical() => Err(err),
        Err(err) => {
            log::debug!("trapped: {}", err);
            Ok(None)
        },
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use super::*;

    #[test]
    fn trap_swallows_recoverable() {
        assert_eq!(trap::<()>(Err(Error::TooLarge)), Ok(None));
        assert_eq!(trap::<()>(Err(Error::Domain("x".into()))), Ok(None));
        assert_eq!(trap(Ok(3)), Ok(Some(3)));
    }

    #[test]
    fn trap_propagates_critical() {
        assert_eq!(trap::<()>(Err(Error::Interrupted)), Err(Error::Interrupted));
        assert!(trap::<()>(Err(Error::Bug("bad"))).is_err());
    }
}
