//! Knot records (§3.3): the per-time authored control point of a spline.

use ts_core::{ensure_valid_mutation, Error, Result, Time};

use crate::value::Value;

/// How a knot's segment is interpolated, per §3.3/§6.
///
/// Byte values are frozen per §6's persistence layout reference: new
/// values are appended, existing values are never reassigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum KnotType {
    /// Segment holds the left knot's value flat until the next knot.
    Held = 1,
    /// Segment is a straight line in (time, value).
    Linear = 2,
    /// Segment is a cubic Bezier driven by this knot's tangent fields.
    Bezier = 3,
}

/// A single authored control point of a spline, per §3.3.
#[derive(Debug, Clone, PartialEq)]
pub struct Knot {
    time: Time,
    knot_type: KnotType,
    is_dual: bool,
    left_value: Value,
    right_value: Value,
    left_tangent_slope: Value,
    right_tangent_slope: Value,
    left_tangent_length: f64,
    right_tangent_length: f64,
    tangent_symmetry_broken: bool,
}

/// Tangent lengths within this distance of zero silently snap to zero
/// (§3.3, §7 "silent normalization").
const TANGENT_LENGTH_SNAP_EPSILON: f64 = 1e-6;

/// Left/right slope differences at or above this are considered a broken
/// symmetry (§3.3).
const SYMMETRY_BREAK_EPSILON: f64 = 1e-4;

impl Knot {
    /// Build a single-valued (non-dual) knot: `left_value == right_value`.
    pub fn single(time: Time, knot_type: KnotType, value: Value) -> Result<Knot> {
        Self::new(time, knot_type, false, value.clone(), value)
    }

    /// Build a dual-valued knot with independent left/right values.
    pub fn dual(time: Time, knot_type: KnotType, left_value: Value, right_value: Value) -> Result<Knot> {
        Self::new(time, knot_type, true, left_value, right_value)
    }

    fn new(
        time: Time,
        mut knot_type: KnotType,
        is_dual: bool,
        left_value: Value,
        right_value: Value,
    ) -> Result<Knot> {
        let zero = right_value.zero();

        // A held-only or non-interpolatable right value forces Held.
        if !right_value.interpolatable() {
            knot_type = KnotType::Held;
        }
        if !right_value.supports_tangents() && knot_type == KnotType::Bezier {
            knot_type = KnotType::Linear;
        }
        if !right_value.interpolatable() && is_dual {
            return Err(Error::CodingError(
                "dual-valued knots require an interpolatable value type".into(),
            ));
        }

        Ok(Knot {
            time,
            knot_type,
            is_dual,
            left_value,
            right_value,
            left_tangent_slope: zero.clone(),
            right_tangent_slope: zero,
            left_tangent_length: 0.0,
            right_tangent_length: 0.0,
            tangent_symmetry_broken: false,
        })
    }

    /// This knot's time.
    pub fn time(&self) -> Time {
        self.time
    }

    /// This knot's interpolation type.
    pub fn knot_type(&self) -> KnotType {
        self.knot_type
    }

    /// `true` if this knot has an independent left value.
    pub fn is_dual(&self) -> bool {
        self.is_dual
    }

    /// The value approached from below.
    pub fn left_value(&self) -> &Value {
        &self.left_value
    }

    /// The value approached from above (and the value at the knot for
    /// single-valued knots).
    pub fn right_value(&self) -> &Value {
        &self.right_value
    }

    /// The left tangent's slope (ignored if the value type has no
    /// tangents; still stored).
    pub fn left_tangent_slope(&self) -> &Value {
        &self.left_tangent_slope
    }

    /// The right tangent's slope.
    pub fn right_tangent_slope(&self) -> &Value {
        &self.right_tangent_slope
    }

    /// The left tangent's length, in time units, non-negative.
    pub fn left_tangent_length(&self) -> f64 {
        self.left_tangent_length
    }

    /// The right tangent's length, in time units, non-negative.
    pub fn right_tangent_length(&self) -> f64 {
        self.right_tangent_length
    }

    /// `true` if the left/right tangent slopes are independently set.
    pub fn tangent_symmetry_broken(&self) -> bool {
        self.tangent_symmetry_broken
    }

    /// Set this knot's interpolation type.
    ///
    /// Rejected (coding error, mutation ignored) if the value type cannot
    /// support the requested type.
    pub fn set_knot_type(&mut self, knot_type: KnotType) -> Result<()> {
        ensure_valid_mutation!(
            self.right_value.interpolatable() || knot_type == KnotType::Held,
            "held-only value types must use KnotType::Held"
        );
        ensure_valid_mutation!(
            self.right_value.supports_tangents() || knot_type != KnotType::Bezier,
            "value type does not support tangents, cannot use KnotType::Bezier"
        );
        self.knot_type = knot_type;
        Ok(())
    }

    /// Set the left value of a dual-valued knot (or the sole value of a
    /// single-valued one, together with [`Self::set_right_value`]).
    pub fn set_left_value(&mut self, value: Value) -> Result<()> {
        ensure_valid_mutation!(
            self.is_dual || value == self.right_value,
            "non-dual knots require left_value == right_value; call set_is_dual(true) first"
        );
        self.left_value = value;
        Ok(())
    }

    /// Set the right value. Forces `Held` if the new value is not
    /// interpolatable (e.g. NaN/Inf for `f32`/`f64`).
    pub fn set_right_value(&mut self, value: Value) -> Result<()> {
        if !self.is_dual {
            self.left_value = value.clone();
        }
        if !value.interpolatable() {
            self.knot_type = KnotType::Held;
        }
        self.right_value = value;
        Ok(())
    }

    /// Toggle whether this knot is dual-valued. Rejected for
    /// non-interpolatable value types.
    pub fn set_is_dual(&mut self, is_dual: bool) -> Result<()> {
        ensure_valid_mutation!(
            !is_dual || self.right_value.interpolatable(),
            "dual-valued knots require an interpolatable value type"
        );
        if !is_dual {
            self.left_value = self.right_value.clone();
        }
        self.is_dual = is_dual;
        Ok(())
    }

    /// Set the right tangent slope. If symmetry is unbroken, mirrors to
    /// the left slope as well (§3.3).
    pub fn set_right_tangent_slope(&mut self, slope: Value) -> Result<()> {
        ensure_valid_mutation!(
            self.right_value.supports_tangents(),
            "value type does not support tangents"
        );
        self.right_tangent_slope = slope.clone();
        if !self.tangent_symmetry_broken {
            self.left_tangent_slope = slope;
        } else {
            self.recheck_symmetry();
        }
        Ok(())
    }

    /// Set the left tangent slope independently, marking symmetry broken
    /// if it now differs from the right slope by at least `1e-4`.
    pub fn set_left_tangent_slope(&mut self, slope: Value) -> Result<()> {
        ensure_valid_mutation!(
            self.right_value.supports_tangents(),
            "value type does not support tangents"
        );
        self.left_tangent_slope = slope;
        self.recheck_symmetry();
        Ok(())
    }

    fn recheck_symmetry(&mut self) {
        let (Some(l), Some(r)) = (
            self.left_tangent_slope.to_components(),
            self.right_tangent_slope.to_components(),
        ) else {
            return;
        };
        let mut max_diff: f64 = 0.0;
        for i in 0..l.len().max(r.len()) {
            max_diff = max_diff.max((l.get(i) - r.get(i)).abs());
        }
        self.tangent_symmetry_broken = max_diff >= SYMMETRY_BREAK_EPSILON;
    }

    /// Set the left tangent length. Small negatives within `1e-6` of zero
    /// snap to zero; other negatives, NaN, or infinite values are
    /// rejected.
    pub fn set_left_tangent_length(&mut self, length: f64) -> Result<()> {
        self.left_tangent_length = Self::normalize_length(length)?;
        Ok(())
    }

    /// Set the right tangent length, with the same normalization as
    /// [`Self::set_left_tangent_length`].
    pub fn set_right_tangent_length(&mut self, length: f64) -> Result<()> {
        self.right_tangent_length = Self::normalize_length(length)?;
        Ok(())
    }

    fn normalize_length(length: f64) -> Result<f64> {
        ensure_valid_mutation!(
            length.is_finite(),
            "tangent length must be finite, got {length}"
        );
        if length < 0.0 {
            ensure_valid_mutation!(
                length.abs() <= TANGENT_LENGTH_SNAP_EPSILON,
                "tangent length must be non-negative, got {length}"
            );
            return Ok(0.0);
        }
        Ok(length)
    }

    /// `true` if this knot is side-equivalent to `other` on `side`: same
    /// time, same value on that side, same knot type, same dual flag, and
    /// (if Bezier) same tangent slope and length on that side. Used by
    /// diffing (§4.7.1).
    pub fn equivalent_at_side(&self, other: &Knot, side: Side) -> bool {
        if self.time != other.time
            || self.knot_type != other.knot_type
            || self.is_dual != other.is_dual
        {
            return false;
        }
        let (a_val, b_val) = match side {
            Side::Left => (&self.left_value, &other.left_value),
            Side::Right => (&self.right_value, &other.right_value),
        };
        if a_val != b_val {
            return false;
        }
        if self.knot_type != KnotType::Bezier {
            return true;
        }
        let (a_slope, b_slope, a_len, b_len) = match side {
            Side::Left => (
                &self.left_tangent_slope,
                &other.left_tangent_slope,
                self.left_tangent_length,
                other.left_tangent_length,
            ),
            Side::Right => (
                &self.right_tangent_slope,
                &other.right_tangent_slope,
                self.right_tangent_length,
                other.right_tangent_length,
            ),
        };
        a_slope == b_slope && a_len == b_len
    }
}

/// Which side of a knot (or time) is being queried or approached, per
/// §4.4.4.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// Approached from below; the knot's left value.
    Left,
    /// Approached from above; the knot's right value.
    Right,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_valued_knot_has_equal_left_and_right() {
        let k = Knot::single(1.0, KnotType::Linear, Value::Double(2.0)).unwrap();
        assert_eq!(k.left_value(), k.right_value());
        assert!(!k.is_dual());
    }

    #[test]
    fn nan_value_forces_held() {
        let k = Knot::single(1.0, KnotType::Bezier, Value::Double(f64::NAN)).unwrap();
        assert_eq!(k.knot_type(), KnotType::Held);
    }

    #[test]
    fn bool_value_rejects_dual() {
        let err = Knot::dual(0.0, KnotType::Held, Value::Bool(true), Value::Bool(false));
        assert!(err.is_err());
    }

    #[test]
    fn bool_value_rejects_bezier_type() {
        let mut k = Knot::single(0.0, KnotType::Held, Value::Bool(true)).unwrap();
        assert!(k.set_knot_type(KnotType::Bezier).is_err());
    }

    #[test]
    fn right_slope_mirrors_to_left_until_symmetry_broken() {
        let mut k = Knot::single(0.0, KnotType::Bezier, Value::Double(1.0)).unwrap();
        k.set_right_tangent_slope(Value::Double(2.0)).unwrap();
        assert_eq!(k.left_tangent_slope(), &Value::Double(2.0));
        assert!(!k.tangent_symmetry_broken());

        k.set_left_tangent_slope(Value::Double(5.0)).unwrap();
        assert!(k.tangent_symmetry_broken());
        assert_eq!(k.right_tangent_slope(), &Value::Double(2.0));
    }

    #[test]
    fn tiny_negative_tangent_length_snaps_to_zero() {
        let mut k = Knot::single(0.0, KnotType::Bezier, Value::Double(1.0)).unwrap();
        k.set_left_tangent_length(-1e-9).unwrap();
        assert_eq!(k.left_tangent_length(), 0.0);
    }

    #[test]
    fn real_negative_tangent_length_rejected() {
        let mut k = Knot::single(0.0, KnotType::Bezier, Value::Double(1.0)).unwrap();
        assert!(k.set_left_tangent_length(-1.0).is_err());
    }

    #[test]
    fn equivalent_at_side_requires_matching_tangents_for_bezier() {
        let mut a = Knot::single(0.0, KnotType::Bezier, Value::Double(1.0)).unwrap();
        let mut b = a.clone();
        assert!(a.equivalent_at_side(&b, Side::Right));

        a.set_right_tangent_length(1.0).unwrap();
        b.set_right_tangent_length(2.0).unwrap();
        assert!(!a.equivalent_at_side(&b, Side::Right));
    }
}
