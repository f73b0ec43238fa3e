//! Redundant-knot detection (§4.8): does a knot contribute nothing beyond
//! what its neighbors already describe?

use crate::container::KnotContainer;
use crate::knot::{Knot, KnotType};
use crate::value::Value;

/// `true` if the segment between adjacent knots `k1` and `k2` is flat:
/// `A.value(t)` is constant on `[k1.time, k2.time)` (SUPPLEMENTED
/// FEATURES #2, shared by diffing §4.7.2 and redundancy §4.8).
///
/// A `Held`-typed left knot is flat regardless of the right knot's left
/// value. Otherwise both endpoints must have equal value on their
/// comparison sides, and zero tangent slope if tangented. Array-valued
/// (vector) knots short-circuit as *not* flat.
pub fn segment_is_flat(k1: &Knot, k2: &Knot) -> bool {
    if k1.knot_type() == KnotType::Held {
        return true;
    }
    if matches!(k1.right_value(), Value::Vec2(_) | Value::Vec3(_) | Value::Vec4(_)) {
        return false;
    }

    let k2_left_side_value = k2.left_value();
    if !k1.right_value().close_enough(k2_left_side_value) {
        return false;
    }

    if k1.knot_type() == KnotType::Bezier {
        let zero = k1.right_value().zero();
        if !k1.right_tangent_slope().close_enough(&zero) {
            return false;
        }
        if k2.knot_type() == KnotType::Bezier && !k2.left_tangent_slope().close_enough(&zero) {
            return false;
        }
    }
    true
}

/// Parameters for an inner-loop prototype interval, mirroring
/// [`crate::spline::InnerLoopParams`], used only to exempt the
/// prototype's first/last knot from redundancy (§4.8).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoopBounds {
    /// Start of the authored prototype interval.
    pub proto_start: f64,
    /// End of the authored prototype interval.
    pub proto_end: f64,
}

/// `true` if `k` is redundant: removing it would not change the
/// spline's evaluated value anywhere, per §4.8.
pub fn is_knot_redundant(
    knots: &KnotContainer,
    k: &Knot,
    loop_bounds: Option<LoopBounds>,
    default_value: Option<&Value>,
) -> bool {
    if k.is_dual() && k.left_value() != k.right_value() {
        return false;
    }
    if let Some(bounds) = loop_bounds {
        if k.time() == bounds.proto_start || k.time() == bounds.proto_end {
            return false;
        }
    }

    let (predecessor, successor) = knots.strict_neighbors(k.time());

    match (predecessor, successor) {
        (Some(p), Some(n)) => {
            if p.knot_type() == KnotType::Held
                && k.knot_type() == KnotType::Held
                && p.right_value().close_enough(k.right_value())
            {
                return true;
            }
            segment_is_flat(p, k) && segment_is_flat(k, n)
        }
        (None, Some(n)) => segment_is_flat(k, n),
        (Some(p), None) => segment_is_flat(p, k),
        (None, None) => match default_value {
            Some(default) => k.right_value().close_enough(default),
            None => false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knot::Knot;

    fn held(t: f64, v: f64) -> Knot {
        Knot::single(t, KnotType::Held, Value::Double(v)).unwrap()
    }

    fn linear(t: f64, v: f64) -> Knot {
        Knot::single(t, KnotType::Linear, Value::Double(v)).unwrap()
    }

    #[test]
    fn held_segment_is_always_flat() {
        assert!(segment_is_flat(&held(0.0, 1.0), &linear(1.0, 99.0)));
    }

    #[test]
    fn linear_segment_with_equal_endpoints_is_flat() {
        assert!(segment_is_flat(&linear(0.0, 5.0), &linear(1.0, 5.0)));
        assert!(!segment_is_flat(&linear(0.0, 5.0), &linear(1.0, 6.0)));
    }

    #[test]
    fn middle_knot_between_two_flat_segments_is_redundant() {
        let mut c = KnotContainer::new();
        c.insert(held(0.0, 5.0));
        c.insert(held(1.0, 5.0));
        c.insert(held(2.0, 5.0));
        let middle = c.find(1.0).unwrap().clone();
        assert!(is_knot_redundant(&c, &middle, None, None));
    }

    #[test]
    fn dual_valued_knot_with_differing_sides_is_never_redundant() {
        let k = Knot::dual(1.0, KnotType::Held, Value::Double(1.0), Value::Double(2.0)).unwrap();
        let c = KnotContainer::new();
        assert!(!is_knot_redundant(&c, &k, None, None));
    }

    #[test]
    fn lone_knot_redundant_only_against_default_value() {
        let mut c = KnotContainer::new();
        let k = linear(0.0, 5.0);
        c.insert(k.clone());
        assert!(!is_knot_redundant(&c, &k, None, None));
        assert!(is_knot_redundant(&c, &k, None, Some(&Value::Double(5.0))));
        assert!(!is_knot_redundant(&c, &k, None, Some(&Value::Double(6.0))));
    }
}
