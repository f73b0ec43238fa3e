//! A distinguished "unset" sentinel for otherwise-valid numeric types.
//!
//! Animation authoring tools need a way to say "this time has not been
//! given a concrete value yet" without paying for an `Option<Time>` at
//! every call site in the evaluator's hot path. The convention used here
//! is the same one used for null rates and discount factors in numerical
//! finance code: the sentinel is the type's maximum representable value,
//! which can never arise from real authored data.

/// A type that has a distinguished "null" sentinel value.
///
/// Implementors provide a `null()` associated function returning the
/// sentinel. By convention the sentinel is the **maximum** value of the
/// type, so that ordinary comparisons (`t < other.null()`) behave sanely
/// even before an explicit `is_null` check.
pub trait Null: Sized + PartialEq + Copy {
    /// The null / unset sentinel value for this type.
    fn null() -> Self;

    /// Return `true` if `self` equals the null sentinel.
    fn is_null(&self) -> bool {
        *self == Self::null()
    }
}

impl Null for f64 {
    fn null() -> Self {
        f64::MAX
    }
}

impl Null for f32 {
    fn null() -> Self {
        f32::MAX
    }
}

impl Null for usize {
    fn null() -> Self {
        usize::MAX
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_time_code_is_distinguishable_from_any_real_time() {
        let default_time_code = f64::null();
        for t in [0.0, -1e6, 1e6, f64::MIN, f64::MAX - 1.0] {
            assert_ne!(t, default_time_code);
        }
        assert!(default_time_code.is_null());
        assert!(!0.0_f64.is_null());
    }
}
