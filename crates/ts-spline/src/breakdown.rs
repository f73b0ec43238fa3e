//! Breakdown (§4.9): insert a knot into an existing Bezier span while
//! preserving its shape, by de-Casteljau-subdividing the implied curve.

use ts_core::{ensure, Error, Result};
use ts_math::solve_cubic;

use crate::knot::Knot;
use crate::segment::bernstein_to_power_scalar;
use crate::value::Components;

/// Insert `k2`'s value into the span `[k1, k3]`, adjusting all three
/// knots' tangent fields so the resulting two-segment spline traces the
/// same curve the single segment `(k1, k3)` would have, per §4.9.
///
/// Rejects (coding error) non-strictly-increasing times or an
/// untangentable value type; the three knots are left unmodified on
/// failure.
pub fn breakdown(knots: &mut [Knot; 3]) -> Result<()> {
    let (k1_time, k2_time, k3_time) = (knots[0].time(), knots[1].time(), knots[2].time());
    ensure!(
        k1_time < k2_time && k2_time < k3_time,
        "breakdown requires strictly increasing knot times, got {k1_time}, {k2_time}, {k3_time}"
    );
    if !knots[0].right_value().supports_tangents() {
        return Err(Error::UnsupportedOperation(
            "breakdown requires a value type that supports tangents".into(),
        ));
    }

    // Build the implied Bezier from k1 to k3, ignoring k2, the same way
    // the segment cache would (§4.3), to get its four control points in
    // both channels.
    let p0_t = knots[0].time();
    let p3_t = knots[2].time();
    let p1_t = if knots[0].knot_type() == crate::knot::KnotType::Bezier {
        knots[0].time() + knots[0].right_tangent_length()
    } else {
        (2.0 * p0_t + p3_t) / 3.0
    };
    let p2_t = if knots[2].knot_type() == crate::knot::KnotType::Bezier {
        knots[2].time() - knots[2].left_tangent_length()
    } else {
        (p0_t + 2.0 * p3_t) / 3.0
    };

    let p0_v = knots[0].right_value().to_components().unwrap();
    let p3_v = knots[2].left_value().to_components().unwrap();
    let p1_v = if knots[0].knot_type() == crate::knot::KnotType::Bezier {
        let slope = knots[0].right_tangent_slope().to_components().unwrap();
        p0_v + slope * knots[0].right_tangent_length()
    } else {
        (p0_v * 2.0 + p3_v) * (1.0 / 3.0)
    };
    let p2_v = if knots[2].knot_type() == crate::knot::KnotType::Bezier {
        let slope = knots[2].left_tangent_slope().to_components().unwrap();
        p3_v - slope * knots[2].left_tangent_length()
    } else {
        (p0_v + p3_v * 2.0) * (1.0 / 3.0)
    };

    let time_coeff = bernstein_to_power_scalar([p0_t, p1_t, p2_t, p3_t]);
    let u = solve_cubic(time_coeff, k2_time).clamp(0.0, 1.0);

    let (lt, rt) = de_casteljau_scalar([p0_t, p1_t, p2_t, p3_t], u);
    let (lv, rv) = de_casteljau_components([p0_v, p1_v, p2_v, p3_v], u);

    // lv/rv/lt/rt are each [P0..P3] of the subdivided left/right curves.
    let left_tangent_slope = (lv[3] - lv[2]) * (1.0 / (lt[3] - lt[2]).max(f64::EPSILON));
    let right_tangent_slope = (rv[1] - rv[0]) * (1.0 / (rt[1] - rt[0]).max(f64::EPSILON));

    knots[1].set_left_tangent_slope(knots[1].right_value().from_components(left_tangent_slope))?;
    knots[1].set_right_tangent_slope(knots[1].right_value().from_components(right_tangent_slope))?;

    knots[0].set_right_tangent_length(lt[1] - lt[0])?;
    knots[1].set_left_tangent_length(lt[3] - lt[2])?;
    knots[1].set_right_tangent_length(rt[1] - rt[0])?;
    knots[2].set_left_tangent_length(rt[3] - rt[2])?;

    Ok(())
}

/// Split a scalar cubic Bezier's four control points at parameter `u`
/// via de Casteljau's algorithm, returning the left and right halves'
/// own four control points each.
fn de_casteljau_scalar(p: [f64; 4], u: f64) -> ([f64; 4], [f64; 4]) {
    let ab = lerp(p[0], p[1], u);
    let bc = lerp(p[1], p[2], u);
    let cd = lerp(p[2], p[3], u);
    let abbc = lerp(ab, bc, u);
    let bccd = lerp(bc, cd, u);
    let mid = lerp(abbc, bccd, u);
    ([p[0], ab, abbc, mid], [mid, bccd, cd, p[3]])
}

fn de_casteljau_components(p: [Components; 4], u: f64) -> ([Components; 4], [Components; 4]) {
    let ab = lerp_c(p[0], p[1], u);
    let bc = lerp_c(p[1], p[2], u);
    let cd = lerp_c(p[2], p[3], u);
    let abbc = lerp_c(ab, bc, u);
    let bccd = lerp_c(bc, cd, u);
    let mid = lerp_c(abbc, bccd, u);
    ([p[0], ab, abbc, mid], [mid, bccd, cd, p[3]])
}

fn lerp(a: f64, b: f64, u: f64) -> f64 {
    a + (b - a) * u
}

fn lerp_c(a: Components, b: Components, u: f64) -> Components {
    a + (b - a) * u
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knot::KnotType;
    use crate::value::Value;

    #[test]
    fn breakdown_rejects_unordered_times() {
        let mut k1 = Knot::single(0.0, KnotType::Bezier, Value::Double(0.0)).unwrap();
        k1.set_right_tangent_length(1.0).unwrap();
        let mut knots = [
            k1.clone(),
            Knot::single(0.0, KnotType::Bezier, Value::Double(5.0)).unwrap(),
            Knot::single(10.0, KnotType::Bezier, Value::Double(10.0)).unwrap(),
        ];
        assert!(breakdown(&mut knots).is_err());
    }

    #[test]
    fn breakdown_rejects_untangentable_value_type() {
        let mut knots = [
            Knot::single(0.0, KnotType::Held, Value::Bool(true)).unwrap(),
            Knot::single(1.0, KnotType::Held, Value::Bool(true)).unwrap(),
            Knot::single(2.0, KnotType::Held, Value::Bool(false)).unwrap(),
        ];
        assert!(breakdown(&mut knots).is_err());
    }

    #[test]
    fn breakdown_sets_tangent_lengths_nonnegative() {
        let mut k1 = Knot::single(0.0, KnotType::Bezier, Value::Double(0.0)).unwrap();
        k1.set_right_tangent_length(3.0).unwrap();
        k1.set_right_tangent_slope(Value::Double(1.0)).unwrap();
        let k2 = Knot::single(5.0, KnotType::Bezier, Value::Double(5.0)).unwrap();
        let mut k3 = Knot::single(10.0, KnotType::Bezier, Value::Double(10.0)).unwrap();
        k3.set_left_tangent_length(3.0).unwrap();
        k3.set_left_tangent_slope(Value::Double(1.0)).unwrap();

        let mut knots = [k1, k2, k3];
        breakdown(&mut knots).unwrap();
        assert!(knots[0].right_tangent_length() >= 0.0);
        assert!(knots[1].left_tangent_length() >= 0.0);
        assert!(knots[1].right_tangent_length() >= 0.0);
        assert!(knots[2].left_tangent_length() >= 0.0);
    }

    proptest::proptest! {
        /// Breaking a span down into two segments at an interior time must
        /// preserve the curve the single implied span traced, on both
        /// sides of the inserted knot.
        #[test]
        fn breakdown_preserves_the_original_curve_shape(
            t1 in 0.0f64..5.0,
            span2 in 0.5f64..10.0,
            span3 in 0.5f64..10.0,
            v1 in -5.0f64..5.0,
            v3 in -5.0f64..5.0,
        ) {
            let t2 = t1 + span2;
            let t3 = t2 + span3;

            let k1_orig = Knot::single(t1, KnotType::Linear, Value::Double(v1)).unwrap();
            let k3_orig = Knot::single(t3, KnotType::Linear, Value::Double(v3)).unwrap();
            let original_seg = crate::segment::SegmentCache::build(&k1_orig, &k3_orig);

            let inserted_value = match original_seg.eval_value(t2) {
                Value::Double(x) => x,
                _ => unreachable!(),
            };

            let mut knots = [
                Knot::single(t1, KnotType::Linear, Value::Double(v1)).unwrap(),
                Knot::single(t2, KnotType::Linear, Value::Double(inserted_value)).unwrap(),
                Knot::single(t3, KnotType::Linear, Value::Double(v3)).unwrap(),
            ];
            breakdown(&mut knots).unwrap();

            let seg_left = crate::segment::SegmentCache::build(&knots[0], &knots[1]);
            let seg_right = crate::segment::SegmentCache::build(&knots[1], &knots[2]);

            for frac in [0.1, 0.5, 0.9] {
                let t_left = t1 + (t2 - t1) * frac;
                let t_right = t2 + (t3 - t2) * frac;

                if let (Value::Double(expected), Value::Double(got)) =
                    (original_seg.eval_value(t_left), seg_left.eval_value(t_left))
                {
                    prop_assert!((expected - got).abs() < 1e-6, "left: expected {expected}, got {got}");
                }
                if let (Value::Double(expected), Value::Double(got)) =
                    (original_seg.eval_value(t_right), seg_right.eval_value(t_right))
                {
                    prop_assert!((expected - got).abs() < 1e-6, "right: expected {expected}, got {got}");
                }
            }
        }
    }
}
