//! Error taxonomy for the test battery.

use serde::Serialize;

/// Error returned by configuration, individual tests and numerical primitives.
///
/// Every variant is deterministic: re-running the same computation with the
/// same inputs produces the same error, so callers should never retry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Error {
    /// Invalid significance level or malformed sequence content handed to
    /// [`Battery::configure`](crate::Battery::configure).
    Configuration(String),

    /// A test-specific parameter or length requirement is violated, e.g. the
    /// block size does not divide the sequence length.
    InvalidInput(String),

    /// A test's own gating condition failed at runtime (the Runs test's
    /// frequency prerequisite, a random walk without any cycle).
    PreconditionNotMet(String),

    /// The incomplete gamma prefactor `a·ln(x) − x − lnΓ(a)` fell below
    /// `-MAXLOG`, so the result would underflow.
    Underflow {
        /// Which primitive failed (`"igamc"` or `"igam"`).
        function: &'static str,
        /// Shape parameter.
        a: f64,
        /// Evaluation point.
        x: f64,
    },
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Configuration(msg) => write!(f, "configuration error: {msg}"),
            Self::InvalidInput(msg) => write!(f, "invalid input: {msg}"),
            Self::PreconditionNotMet(msg) => write!(f, "test not applicable: {msg}"),
            Self::Underflow { function, a, x } => {
                write!(f, "{function}({a}, {x}) underflows")
            }
        }
    }
}

impl std::error::Error for Error {}

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_category() {
        let e = Error::InvalidInput("block size 0".into());
        assert_eq!(e.to_string(), "invalid input: block size 0");

        let e = Error::PreconditionNotMet("no cycles".into());
        assert!(e.to_string().starts_with("test not applicable"));

        let e = Error::Underflow {
            function: "igamc",
            a: 1.0,
            x: 1e6,
        };
        assert!(e.to_string().contains("igamc"));
    }
}
