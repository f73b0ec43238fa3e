//! Error types for the `tsspline` workspace.
//!
//! Per the design, mutations rejected for programmer error (a coding
//! error) and conditions a caller may need to branch on (recoverable
//! errors) are both represented as `Error` variants rather than as
//! panics — the core never panics on data, only on internal logic bugs.

use thiserror::Error;

/// The error type used throughout the `tsspline` workspace.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// A mutation was rejected because it violates an invariant of the
    /// value type or knot (setting tangents on an untangentable type,
    /// dual-valuing a non-interpolatable type, a NaN/Inf tangent length,
    /// and so on). The caller's mutation did not happen.
    #[error("coding error: {0}")]
    CodingError(String),

    /// A constructor argument failed a precondition.
    #[error("invalid argument: {0}")]
    Invalid(String),

    /// An index was out of range for a container of the given size.
    #[error("index ({index}) out of range [0, {size})")]
    IndexOutOfRange {
        /// The index that was out of range.
        index: usize,
        /// The size of the container.
        size: usize,
    },

    /// A query was made against a spline with no knots.
    #[error("spline has no knots")]
    EmptySpline,

    /// A lookup found no knot at the requested time.
    #[error("no knot at the requested time")]
    NotFound,

    /// Breakdown requires exactly three knots in strictly increasing time
    /// order.
    #[error("breakdown requires 3 knots in strictly increasing time order, got {0}")]
    WrongKnotCount(usize),

    /// The operation is not meaningful for the value type involved (e.g.
    /// breakdown on a value type that does not support tangents).
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),
}

/// Shorthand `Result` type used throughout the `tsspline` workspace.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Returns `Err(Error::Invalid(...))` if `$cond` is false.
///
/// # Example
/// ```
/// use ts_core::{ensure, Error};
/// fn positive(x: f64) -> ts_core::Result<f64> {
///     ensure!(x > 0.0, "x must be positive, got {x}");
///     Ok(x)
/// }
/// assert!(positive(1.0).is_ok());
/// assert!(positive(-1.0).is_err());
/// ```
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $($msg:tt)*) => {
        if !$cond {
            return Err($crate::errors::Error::Invalid(
                format!($($msg)*)
            ));
        }
    };
}

/// Returns `Err(Error::CodingError(...))` if `$cond` is false.
///
/// Used for invariants that should only ever be violated by a
/// programming mistake at the call site, as opposed to bad input data.
#[macro_export]
macro_rules! ensure_valid_mutation {
    ($cond:expr, $($msg:tt)*) => {
        if !$cond {
            return Err($crate::errors::Error::CodingError(
                format!($($msg)*)
            ));
        }
    };
}

/// Returns `Err(Error::CodingError(...))` immediately.
#[macro_export]
macro_rules! fail {
    ($($msg:tt)*) => {
        return Err($crate::errors::Error::CodingError(format!($($msg)*)))
    };
}
