//! Value-range computation over a time span (§4.6).

use ts_core::Time;
use ts_math::{eval_cubic, solve_cubic, solve_quadratic};

use crate::container::KnotContainer;
use crate::knot::Knot;
use crate::segment::{eval_component_cubic, SegmentCache};
use crate::value::{Components, Value};

/// The `[min, max]` value range of one segment over `[start, end]`
/// (clamped to the segment's own span), per §4.6.
fn segment_range(kf1: &Knot, kf2: &Knot, start: Time, end: Time) -> Option<(Value, Value)> {
    let seg = SegmentCache::build(kf1, kf2);
    let (Some(time_coeff), Some(value_coeff), Some(shape)) =
        (seg.time_coeff(), seg.value_coeff(), seg.shape())
    else {
        // Held/quaternion: the value is constant (or slerped but
        // monotone-ish); sample both ends.
        let a = seg.eval_value(start);
        let b = seg.eval_value(end);
        return Some((a, b));
    };

    let mut u_min = solve_cubic(time_coeff, start).clamp(0.0, 1.0);
    let mut u_max = solve_cubic(time_coeff, end).clamp(0.0, 1.0);
    if u_min > u_max {
        std::mem::swap(&mut u_min, &mut u_max);
    }

    // Only a single scalar component range is tracked here, per-component,
    // then recombined; since every component shares the same `u` domain
    // this is equivalent to component-wise min/max.
    let n = value_coeff[0].len().max(1);
    let mut min_c = [f64::INFINITY; 4];
    let mut max_c = [f64::NEG_INFINITY; 4];

    let seed_a = eval_component_cubic(&value_coeff, u_min);
    let seed_b = eval_component_cubic(&value_coeff, u_max);
    for i in 0..n {
        min_c[i] = seed_a.get(i).min(seed_b.get(i));
        max_c[i] = seed_a.get(i).max(seed_b.get(i));
    }

    for i in 0..n {
        // c1 + 2*c2*u + 3*c3*u^2 = 0 -> quadratic in u with
        // a = 3*c3, b = 2*c2, c = c1.
        let c0 = value_coeff[0].get(i);
        let c1 = value_coeff[1].get(i);
        let c2 = value_coeff[2].get(i);
        let c3 = value_coeff[3].get(i);
        if let Some((r0, r1)) = solve_quadratic([c1, 2.0 * c2, 3.0 * c3]) {
            for r in [r0, r1] {
                if r > u_min && r < u_max {
                    let v = eval_cubic([c0, c1, c2, c3], r);
                    min_c[i] = min_c[i].min(v);
                    max_c[i] = max_c[i].max(v);
                }
            }
        }
    }

    let min_components = Components::new(&min_c[..n]);
    let max_components = Components::new(&max_c[..n]);
    Some((shape.from_components(min_components), shape.from_components(max_components)))
}

/// The `[min, max]` value range of one segment's `[u_lo, u_hi]` sub-span,
/// directly in the segment's own parameter space. Used by the sampler's
/// blur-out path (§4.5), which already has `u` bounds in hand and has no
/// need to invert them back through `solve_cubic`.
pub(crate) fn segment_cache_range(
    seg: &SegmentCache,
    u_lo: f64,
    u_hi: f64,
) -> Option<(Value, Value)> {
    let (Some(value_coeff), Some(shape)) = (seg.value_coeff(), seg.shape()) else {
        return None;
    };
    let (u_min, u_max) = if u_lo <= u_hi { (u_lo, u_hi) } else { (u_hi, u_lo) };

    let n = value_coeff[0].len().max(1);
    let mut min_c = [f64::INFINITY; 4];
    let mut max_c = [f64::NEG_INFINITY; 4];

    let seed_a = eval_component_cubic(&value_coeff, u_min);
    let seed_b = eval_component_cubic(&value_coeff, u_max);
    for i in 0..n {
        min_c[i] = seed_a.get(i).min(seed_b.get(i));
        max_c[i] = seed_a.get(i).max(seed_b.get(i));
    }

    for i in 0..n {
        let c0 = value_coeff[0].get(i);
        let c1 = value_coeff[1].get(i);
        let c2 = value_coeff[2].get(i);
        let c3 = value_coeff[3].get(i);
        if let Some((r0, r1)) = solve_quadratic([c1, 2.0 * c2, 3.0 * c3]) {
            for r in [r0, r1] {
                if r > u_min && r < u_max {
                    let v = eval_cubic([c0, c1, c2, c3], r);
                    min_c[i] = min_c[i].min(v);
                    max_c[i] = max_c[i].max(v);
                }
            }
        }
    }

    let min_components = Components::new(&min_c[..n]);
    let max_components = Components::new(&max_c[..n]);
    Some((shape.from_components(min_components), shape.from_components(max_components)))
}

/// The value range of the whole spline over `[start, end]`, per §4.6.
///
/// Integrates per-segment ranges plus endpoint-side values at the
/// interval boundaries: a discontinuous right boundary (a dual-valued
/// knot whose predecessor is held) must include the right side of the
/// boundary knot even at the range's right edge.
pub fn range(knots: &KnotContainer, start: Time, end: Time) -> Option<(Value, Value)> {
    if knots.is_empty() {
        return None;
    }
    let (start, end) = if start <= end { (start, end) } else { (end, start) };

    let mut combined: Option<(Value, Value)> = None;
    let mut merge = |pair: (Value, Value)| {
        combined = Some(match combined.take() {
            None => pair,
            Some(existing) => merge_pairs(existing, pair),
        });
    };

    let first = knots.get(0).unwrap();
    let last = knots.get(knots.len() - 1).unwrap();

    if start <= first.time() {
        merge((first.left_value().clone(), first.left_value().clone()));
    }
    if end >= last.time() {
        merge((last.right_value().clone(), last.right_value().clone()));
    }

    for i in 0..knots.len().saturating_sub(1) {
        let kf1 = knots.get(i).unwrap();
        let kf2 = knots.get(i + 1).unwrap();
        if kf2.time() < start || kf1.time() > end {
            continue;
        }
        let seg_start = start.max(kf1.time());
        let seg_end = end.min(kf2.time());
        if let Some(pair) = segment_range(kf1, kf2, seg_start, seg_end) {
            merge(pair);
        }
        if kf1.time() >= start && kf1.time() <= end {
            merge((kf1.right_value().clone(), kf1.right_value().clone()));
        }
        if kf2.time() >= start && kf2.time() <= end {
            // Per §4.6: a discontinuous right boundary (a dual-valued
            // knot whose predecessor is held) must still count the
            // knot's right-side value, even at the range's right edge.
            let right_boundary_value = kf2.right_value().clone();
            merge((right_boundary_value.clone(), right_boundary_value));
        }
    }

    combined
}

fn merge_pairs(a: (Value, Value), b: (Value, Value)) -> (Value, Value) {
    let lo = value_min(&a.0, &b.0);
    let hi = value_max(&a.1, &b.1);
    (lo, hi)
}

fn value_min(a: &Value, b: &Value) -> Value {
    match (a.to_components(), b.to_components()) {
        (Some(ca), Some(cb)) => {
            let n = ca.len().max(cb.len());
            let mut out = [0.0; 4];
            for i in 0..n {
                out[i] = ca.get(i).min(cb.get(i));
            }
            a.from_components(Components::new(&out[..n]))
        }
        _ => a.clone(),
    }
}

fn value_max(a: &Value, b: &Value) -> Value {
    match (a.to_components(), b.to_components()) {
        (Some(ca), Some(cb)) => {
            let n = ca.len().max(cb.len());
            let mut out = [0.0; 4];
            for i in 0..n {
                out[i] = ca.get(i).max(cb.get(i));
            }
            a.from_components(Components::new(&out[..n]))
        }
        _ => a.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knot::{Knot, KnotType};

    #[test]
    fn range_of_linear_ramp_is_its_endpoints() {
        let mut c = KnotContainer::new();
        c.insert(Knot::single(0.0, KnotType::Linear, Value::Double(0.0)).unwrap());
        c.insert(Knot::single(10.0, KnotType::Linear, Value::Double(100.0)).unwrap());
        let (lo, hi) = range(&c, 0.0, 10.0).unwrap();
        assert_eq!(lo, Value::Double(0.0));
        assert_eq!(hi, Value::Double(100.0));
    }

    #[test]
    fn range_catches_bezier_overshoot_between_knots() {
        let mut k1 = Knot::single(0.0, KnotType::Bezier, Value::Double(0.0)).unwrap();
        k1.set_right_tangent_length(5.0).unwrap();
        k1.set_right_tangent_slope(Value::Double(20.0)).unwrap();
        let mut k2 = Knot::single(10.0, KnotType::Bezier, Value::Double(0.0)).unwrap();
        k2.set_left_tangent_length(5.0).unwrap();
        k2.set_left_tangent_slope(Value::Double(-20.0)).unwrap();

        let mut c = KnotContainer::new();
        c.insert(k1);
        c.insert(k2);
        let (_lo, hi) = range(&c, 0.0, 10.0).unwrap();
        match hi {
            Value::Double(v) => assert!(v > 0.0, "expected overshoot above 0, got {v}"),
            _ => panic!(),
        }
    }

    #[test]
    fn empty_spline_has_no_range() {
        let c = KnotContainer::new();
        assert!(range(&c, 0.0, 1.0).is_none());
    }
}
