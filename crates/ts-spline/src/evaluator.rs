//! Single-time value and derivative evaluation, and extrapolation
//! (§4.4).

use ts_core::Time;

use crate::container::KnotContainer;
use crate::extrapolation::ExtrapMode;
use crate::knot::{KnotType, Side};
use crate::segment::SegmentCache;
use crate::value::Value;

/// Evaluate a spline's value at `t`, approached from `side`, per §4.4.1.
pub fn eval_value(
    knots: &KnotContainer,
    extrap_left: ExtrapMode,
    extrap_right: ExtrapMode,
    t: Time,
    side: Side,
) -> Option<Value> {
    if knots.is_empty() {
        return None;
    }

    let first = knots.get(0).unwrap();
    let last = knots.get(knots.len() - 1).unwrap();

    // i = upper_bound(t): the first knot strictly after t.
    let i_idx = knots.upper_bound_index(t);

    if i_idx == 0 {
        // Before the first knot.
        return Some(extrapolate(knots, first, extrap_left, t, Side::Left));
    }

    let is_last = i_idx == knots.len();
    let current = knots.get(i_idx - 1).unwrap();

    if current.time() == t && side == Side::Left {
        // Exact on-knot, left side: predecessor's right value if Held,
        // else this knot's own left value.
        if i_idx >= 2 {
            let predecessor = knots.get(i_idx - 2).unwrap();
            if predecessor.knot_type() == KnotType::Held {
                return Some(predecessor.right_value().clone());
            }
        }
        return Some(current.left_value().clone());
    }

    if is_last {
        return Some(extrapolate(knots, last, extrap_right, t, Side::Right));
    }

    if current.time() == t {
        return Some(current.right_value().clone());
    }

    let next = knots.get(i_idx).unwrap();
    let seg = SegmentCache::build(current, next);
    Some(seg.eval_value(t))
}

/// Evaluate a spline's derivative at `t`, approached from `side`, per
/// §4.4.2.
pub fn eval_derivative(
    knots: &KnotContainer,
    extrap_left: ExtrapMode,
    extrap_right: ExtrapMode,
    t: Time,
    side: Side,
) -> Option<Value> {
    if knots.is_empty() {
        return None;
    }

    let first = knots.get(0).unwrap();
    let last = knots.get(knots.len() - 1).unwrap();
    let i_idx = knots.upper_bound_index(t);

    if i_idx == 0 {
        return Some(extrapolate_derivative(knots, first, extrap_left, Side::Left));
    }

    let is_last = i_idx == knots.len();
    let current = knots.get(i_idx - 1).unwrap();

    if !current.right_value().interpolatable() || matches!(current.right_value(), crate::value::Value::Quat(_))
    {
        return Some(current.right_value().zero());
    }

    if current.time() == t && side == Side::Left {
        if current.knot_type() == KnotType::Linear {
            let chosen_side = if i_idx >= 2 {
                Side::Left
            } else {
                Side::Right
            };
            return Some(segment_slope(knots, i_idx - 1, chosen_side));
        }
        return Some(current.right_value().zero());
    }

    if is_last {
        return Some(extrapolate_derivative(knots, last, extrap_right, Side::Right));
    }

    if current.time() == t {
        if current.knot_type() == KnotType::Linear {
            return Some(segment_slope(knots, i_idx - 1, Side::Right));
        }
        return Some(current.right_value().zero());
    }

    let next = knots.get(i_idx).unwrap();
    let seg = SegmentCache::build(current, next);
    Some(seg.eval_derivative(t))
}

/// The slope of the segment touching knot index `at`, on `side`
/// (left = segment ending at `at`, right = segment starting at `at`).
/// Falls back to the only existing side at the first/last knot.
fn segment_slope(knots: &KnotContainer, at: usize, side: Side) -> Value {
    let n = knots.len();
    let side = if side == Side::Left && at == 0 {
        Side::Right
    } else if side == Side::Right && at + 1 == n {
        Side::Left
    } else {
        side
    };
    match side {
        Side::Right => {
            let k1 = knots.get(at).unwrap();
            let k2 = knots.get(at + 1).unwrap();
            SegmentCache::build(k1, k2).eval_derivative(k1.time())
        }
        Side::Left => {
            let k1 = knots.get(at - 1).unwrap();
            let k2 = knots.get(at).unwrap();
            SegmentCache::build(k1, k2).eval_derivative(k2.time())
        }
    }
}

/// Extrapolate a value beyond the edge knot, per §4.4.3.
pub fn extrapolate(
    knots: &KnotContainer,
    edge: &crate::knot::Knot,
    mode: ExtrapMode,
    t: Time,
    side: Side,
) -> Value {
    let effective = effective_mode(edge, mode, side);
    let edge_value = match side {
        Side::Left => edge.left_value().clone(),
        Side::Right => edge.right_value().clone(),
    };
    match effective {
        ExtrapMode::Linear if edge_value.supports_tangents() => {
            let slope = edge_slope(knots, edge, side);
            let dt = t - edge.time();
            let slope_c = slope.to_components().unwrap_or_else(|| edge_value.zero().to_components().unwrap());
            let edge_c = edge_value.to_components().unwrap();
            edge_value.from_components(edge_c + slope_c * dt)
        }
        _ => edge_value,
    }
}

fn extrapolate_derivative(
    knots: &KnotContainer,
    edge: &crate::knot::Knot,
    mode: ExtrapMode,
    side: Side,
) -> Value {
    let effective = effective_mode(edge, mode, side);
    let edge_value = match side {
        Side::Left => edge.left_value().clone(),
        Side::Right => edge.right_value().clone(),
    };
    if effective == ExtrapMode::Linear && edge_value.supports_tangents() {
        edge_slope(knots, edge, side)
    } else {
        edge_value.zero()
    }
}

/// The slope `Linear` extrapolation continues beyond `edge`, per §4.4.3.
/// Only a `Bezier` edge knot carries an authored tangent (`hasTangents`);
/// any other edge knot type falls back to the slope of the adjacent
/// segment, the one segment actually touching the edge.
fn edge_slope(knots: &KnotContainer, edge: &crate::knot::Knot, side: Side) -> Value {
    if edge.knot_type() == KnotType::Bezier {
        return match side {
            Side::Left => edge.left_tangent_slope().clone(),
            Side::Right => edge.right_tangent_slope().clone(),
        };
    }
    if knots.len() < 2 {
        let edge_value = match side {
            Side::Left => edge.left_value().clone(),
            Side::Right => edge.right_value().clone(),
        };
        return edge_value.zero();
    }
    match side {
        Side::Left => segment_slope(knots, 0, Side::Right),
        Side::Right => segment_slope(knots, knots.len() - 1, Side::Left),
    }
}

/// Degrade a declared extrapolation mode to `Held`, per §3.5, when the
/// edge knot can't support anything else.
fn effective_mode(edge: &crate::knot::Knot, mode: ExtrapMode, side: Side) -> ExtrapMode {
    if !mode.is_implemented() {
        return ExtrapMode::Held;
    }
    if mode == ExtrapMode::Held {
        return ExtrapMode::Held;
    }
    if edge.knot_type() == KnotType::Held {
        return ExtrapMode::Held;
    }
    if edge.is_dual() && edge.left_value() != edge.right_value() && !edge.right_value().supports_tangents() {
        return ExtrapMode::Held;
    }
    let _ = side;
    ExtrapMode::Linear
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knot::Knot;
    use crate::value::Value;

    fn ramp() -> KnotContainer {
        let mut c = KnotContainer::new();
        c.insert(Knot::single(0.0, KnotType::Linear, Value::Double(0.0)).unwrap());
        c.insert(Knot::single(10.0, KnotType::Linear, Value::Double(100.0)).unwrap());
        c
    }

    #[test]
    fn empty_spline_evaluates_to_none() {
        let c = KnotContainer::new();
        assert!(eval_value(&c, ExtrapMode::Held, ExtrapMode::Held, 0.0, Side::Right).is_none());
    }

    #[test]
    fn before_first_knot_extrapolates_held_by_default() {
        let c = ramp();
        let v = eval_value(&c, ExtrapMode::Held, ExtrapMode::Held, -5.0, Side::Right).unwrap();
        assert_eq!(v, Value::Double(0.0));
    }

    #[test]
    fn linear_extrapolation_continues_the_edge_slope() {
        let c = ramp();
        let v = eval_value(&c, ExtrapMode::Held, ExtrapMode::Linear, 20.0, Side::Right).unwrap();
        match v {
            Value::Double(x) => assert!((x - 200.0).abs() < 1e-2, "got {x}"),
            _ => panic!(),
        }
    }

    #[test]
    fn mid_segment_evaluates_linear_ramp() {
        let c = ramp();
        let v = eval_value(&c, ExtrapMode::Held, ExtrapMode::Held, 5.0, Side::Right).unwrap();
        match v {
            Value::Double(x) => assert!((x - 50.0).abs() < 1e-2, "got {x}"),
            _ => panic!(),
        }
    }

    #[test]
    fn held_exact_on_knot_returns_predecessor_right_value_on_left_side() {
        let mut c = KnotContainer::new();
        c.insert(Knot::single(0.0, KnotType::Held, Value::Double(1.0)).unwrap());
        c.insert(Knot::single(10.0, KnotType::Held, Value::Double(2.0)).unwrap());
        let v = eval_value(&c, ExtrapMode::Held, ExtrapMode::Held, 10.0, Side::Left).unwrap();
        assert_eq!(v, Value::Double(1.0));
    }
}
