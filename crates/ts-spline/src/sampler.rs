//! Adaptive piecewise-linear sampling (§4.5).

use ts_core::Time;
use ts_math::{eval_cubic, eval_cubic_derivative, solve_quadratic};

use crate::container::KnotContainer;
use crate::extrapolation::ExtrapMode;
use crate::knot::{Knot, Side};
use crate::range;
use crate::segment::{eval_component_cubic, SegmentCache};
use crate::value::{Components, Value};

/// One linear segment of a sampled approximation: `(t0, v0)` to
/// `(t1, v1)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// Start time.
    pub t0: Time,
    /// Start value.
    pub v0: Value,
    /// End time.
    pub t1: Time,
    /// End value.
    pub v1: Value,
    /// `true` if this sample is a "blur": the segment's time extent
    /// collapsed below tolerance while its value still varied, so `v0`
    /// and `v1` hold the min/max found over the span rather than its
    /// true endpoint values (§4.5).
    pub blur: bool,
}

/// How far beyond the knotted range an extrapolated sample reaches
/// (§4.5), unless the query end is farther still.
const EXTRAPOLATION_SAMPLE_REACH: f64 = 100.0;

/// Monotonicity-test tolerance for the time-channel derivative roots
/// (§4.5).
const MONOTONICITY_EPSILON: f64 = 1e-10;

/// Maximum recursion depth for de Casteljau subdivision, a backstop
/// against pathological tolerances that would otherwise recurse forever.
const MAX_SUBDIVISION_DEPTH: u32 = 24;

/// Produce linear samples approximating the spline over `[start, end]`
/// within tolerance `tol`, after scaling time by `time_scale` and value
/// by `value_scale` for the flatness test, per §4.5.
pub fn sample(
    knots: &KnotContainer,
    extrap_left: ExtrapMode,
    extrap_right: ExtrapMode,
    start: Time,
    end: Time,
    time_scale: f64,
    value_scale: f64,
    tol: f64,
) -> Vec<Sample> {
    if knots.is_empty() {
        return Vec::new();
    }
    let (start, end) = if start <= end { (start, end) } else { (end, start) };

    let mut out = Vec::new();
    let first = knots.get(0).unwrap();
    let last = knots.get(knots.len() - 1).unwrap();

    if start < first.time() {
        let reach_end = first.time().min(end).max(start);
        let extrap_reach = (first.time() - EXTRAPOLATION_SAMPLE_REACH).max(start);
        let t0 = extrap_reach.min(reach_end);
        let v0 = crate::evaluator::extrapolate(knots, first, extrap_left, t0, Side::Left);
        let v1 = first.left_value().clone();
        out.push(Sample {
            t0,
            v0,
            t1: reach_end,
            v1,
            blur: false,
        });
    }

    for i in 0..knots.len().saturating_sub(1) {
        let k1 = knots.get(i).unwrap();
        let k2 = knots.get(i + 1).unwrap();
        if k2.time() < start || k1.time() > end {
            continue;
        }
        sample_segment(k1, k2, start, end, time_scale, value_scale, tol, &mut out);
    }

    if end > last.time() {
        let reach_start = last.time().max(start).min(end);
        let extrap_reach = (last.time() + EXTRAPOLATION_SAMPLE_REACH).min(end);
        let t1 = extrap_reach.max(reach_start);
        let v0 = last.right_value().clone();
        let v1 = crate::evaluator::extrapolate(knots, last, extrap_right, t1, Side::Right);
        out.push(Sample {
            t0: reach_start,
            v0,
            t1,
            v1,
            blur: false,
        });
    }

    out
}

fn sample_segment(
    k1: &Knot,
    k2: &Knot,
    start: Time,
    end: Time,
    time_scale: f64,
    value_scale: f64,
    tol: f64,
    out: &mut Vec<Sample>,
) {
    let seg = SegmentCache::build(k1, k2);

    let Some(time_coeff) = seg.time_coeff() else {
        // Held, quaternion, or non-interpolatable: endpoint-to-endpoint.
        let lo = start.max(k1.time());
        let hi = end.min(k2.time());
        if lo < hi {
            out.push(Sample {
                t0: lo,
                v0: seg.eval_value(lo),
                t1: hi,
                v1: seg.eval_value(hi),
                blur: false,
            });
        }
        return;
    };
    let value_coeff = seg.value_coeff().unwrap();
    let shape = seg.shape().unwrap().clone();

    // Time-Bezier monotonicity test: roots of the time channel's
    // derivative, `c1 + 2 c2 u + 3 c3 u^2 = 0`.
    let deriv_roots = solve_quadratic([time_coeff[1], 2.0 * time_coeff[2], 3.0 * time_coeff[3]]);
    let both_in_unit = matches!(
        deriv_roots,
        Some((r0, r1)) if r0 > MONOTONICITY_EPSILON && r0 < 1.0 - MONOTONICITY_EPSILON
            && r1 > MONOTONICITY_EPSILON && r1 < 1.0 - MONOTONICITY_EPSILON
    );

    if both_in_unit {
        let (r0, r1) = deriv_roots.unwrap();
        let p0_t = time_coeff[0];
        let p3_t = time_coeff[0] + time_coeff[1] + time_coeff[2] + time_coeff[3];
        let c_r0 = eval_cubic(time_coeff, r0).clamp(p0_t.min(p3_t), p0_t.max(p3_t));
        let c_r1 = eval_cubic(time_coeff, r1).clamp(p0_t.min(p3_t), p0_t.max(p3_t));
        let fold_time = 0.5 * (c_r0 + c_r1);

        sample_monotone_piece(&seg, time_coeff, value_coeff, &shape, 0.0, r0, start, end, time_scale, value_scale, tol, out);

        // Gap-closing sample bridging the discontinuity at the fold.
        let offset = 0.001_f64.min(0.001 * (c_r1 - c_r0).abs().max(0.0));
        let bridge_lo = (fold_time - offset).max(start).min(end);
        let bridge_hi = (fold_time + offset).max(start).min(end);
        if bridge_lo < bridge_hi {
            out.push(Sample {
                t0: bridge_lo,
                v0: seg.eval_value(bridge_lo),
                t1: bridge_hi,
                v1: seg.eval_value(bridge_hi),
                blur: false,
            });
        }

        sample_monotone_piece(&seg, time_coeff, value_coeff, &shape, r1, 1.0, start, end, time_scale, value_scale, tol, out);
        return;
    }

    subdivide(&seg, 0.0, 1.0, start, end, time_scale, value_scale, tol, out, 0);
}

#[allow(clippy::too_many_arguments)]
fn sample_monotone_piece(
    seg: &SegmentCache,
    time_coeff: [f64; 4],
    _value_coeff: [Components; 4],
    _shape: &Value,
    u_lo: f64,
    u_hi: f64,
    start: Time,
    end: Time,
    time_scale: f64,
    value_scale: f64,
    tol: f64,
    out: &mut Vec<Sample>,
) {
    let t_lo = eval_cubic(time_coeff, u_lo);
    let t_hi = eval_cubic(time_coeff, u_hi);
    let (lo, hi) = if t_lo <= t_hi { (t_lo, t_hi) } else { (t_hi, t_lo) };
    if hi < start || lo > end {
        return;
    }
    subdivide(seg, u_lo, u_hi, start, end, time_scale, value_scale, tol, out, 0);
}

#[allow(clippy::too_many_arguments)]
fn subdivide(
    seg: &SegmentCache,
    u_lo: f64,
    u_hi: f64,
    start: Time,
    end: Time,
    time_scale: f64,
    value_scale: f64,
    tol: f64,
    out: &mut Vec<Sample>,
    depth: u32,
) {
    let t0 = time_at(seg, u_lo);
    let t1 = time_at(seg, u_hi);
    let (clip_lo, clip_hi) = (t0.min(t1), t0.max(t1));
    if clip_hi < start || clip_lo > end {
        return;
    }

    let v0 = seg.eval_value(t0);
    let v1 = seg.eval_value(t1);

    if depth >= MAX_SUBDIVISION_DEPTH || flatness(seg, u_lo, u_hi, time_scale, value_scale) <= tol {
        push_clipped(out, t0, v0, t1, v1, start, end, false);
        return;
    }

    // Blur-out (§4.5 point 4): the time-scaled span alone is within
    // tolerance, but the flatness test above still failed, so the value
    // is varying enough over that collapsed time extent to matter. Emit
    // one sample spanning the segment's true min/max over this sub-span
    // rather than its (nearly coincident) endpoint values.
    let time_len = ((t1 - t0) * time_scale).abs();
    if time_len <= tol {
        let (lo_v, hi_v) = range::segment_cache_range(seg, u_lo, u_hi).unwrap_or((v0, v1));
        push_clipped(out, t0, lo_v, t1, hi_v, start, end, true);
        return;
    }

    let u_mid = 0.5 * (u_lo + u_hi);
    subdivide(seg, u_lo, u_mid, start, end, time_scale, value_scale, tol, out, depth + 1);
    subdivide(seg, u_mid, u_hi, start, end, time_scale, value_scale, tol, out, depth + 1);
}

#[allow(clippy::too_many_arguments)]
fn push_clipped(
    out: &mut Vec<Sample>,
    t0: Time,
    v0: Value,
    t1: Time,
    v1: Value,
    start: Time,
    end: Time,
    blur: bool,
) {
    let (t0, t1, swapped) = if t0 <= t1 { (t0, t1, false) } else { (t1, t0, true) };
    let (v0, v1) = if swapped { (v1, v0) } else { (v0, v1) };
    let lo = t0.max(start);
    let hi = t1.min(end);
    if lo < hi {
        out.push(Sample { t0: lo, v0, t1: hi, v1, blur });
    }
}

fn time_at(seg: &SegmentCache, u: f64) -> Time {
    match seg.time_coeff() {
        Some(c) => eval_cubic(c, u),
        None => u, // unreachable for non-cubic segments in this module's call sites
    }
}

/// Max perpendicular distance of the interior control points from the
/// chord `P0->P3`, in scaled (time, value) space — the flatness test
/// (§4.5). Approximated here against the scalar (first) value component,
/// which is exact for `f32`/`f64` and a reasonable proxy for vectors.
fn flatness(seg: &SegmentCache, u_lo: f64, u_hi: f64, time_scale: f64, value_scale: f64) -> f64 {
    let Some(time_coeff) = seg.time_coeff() else {
        return 0.0;
    };
    let Some(value_coeff) = seg.value_coeff() else {
        return 0.0;
    };

    // Re-derive the four control points of the sub-span [u_lo, u_hi],
    // then measure the interior two against the chord P0->P3.
    let t_pts = split_scalar(time_coeff, u_lo, u_hi);
    let v_pts = split_components(value_coeff, u_lo, u_hi);

    let p0 = (t_pts[0] * time_scale, v_pts[0].get(0) * value_scale);
    let p3 = (t_pts[3] * time_scale, v_pts[3].get(0) * value_scale);
    let dx = p3.0 - p0.0;
    let dy = p3.1 - p0.1;
    let chord_len = dx.hypot(dy);

    let mut max_dist: f64 = 0.0;
    for i in [1, 2] {
        let p = (t_pts[i] * time_scale, v_pts[i].get(0) * value_scale);
        let dist = if chord_len < f64::EPSILON {
            (p.0 - p0.0).hypot(p.1 - p0.1)
        } else {
            ((p.0 - p0.0) * dy - (p.1 - p0.1) * dx).abs() / chord_len
        };
        max_dist = max_dist.max(dist);
    }
    max_dist
}

/// Reconstruct the Bernstein control points of the sub-span `[u_lo,
/// u_hi]` of a scalar power-basis cubic, by evaluating position and
/// scaled derivative at the span endpoints. Returns `[P0, P1, P2, P3]`.
fn split_scalar(c: [f64; 4], u_lo: f64, u_hi: f64) -> [f64; 4] {
    let deriv_scale = (u_hi - u_lo).max(f64::EPSILON);
    let p0 = eval_cubic(c, u_lo);
    let p3 = eval_cubic(c, u_hi);
    let p1 = p0 + eval_cubic_derivative(c, u_lo) * deriv_scale / 3.0;
    let p2 = p3 - eval_cubic_derivative(c, u_hi) * deriv_scale / 3.0;
    [p0, p1, p2, p3]
}

fn split_components(c: [Components; 4], u_lo: f64, u_hi: f64) -> [Components; 4] {
    let deriv_scale = (u_hi - u_lo).max(f64::EPSILON);
    let deriv_at = |u: f64| crate::segment::eval_component_cubic_derivative(&c, u);
    let p0 = eval_component_cubic(&c, u_lo);
    let p3 = eval_component_cubic(&c, u_hi);
    let p1 = p0 + deriv_at(u_lo) * (deriv_scale / 3.0);
    let p2 = p3 - deriv_at(u_hi) * (deriv_scale / 3.0);
    [p0, p1, p2, p3]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knot::{Knot, KnotType};

    #[test]
    fn linear_ramp_samples_to_a_single_segment() {
        let mut c = KnotContainer::new();
        c.insert(Knot::single(0.0, KnotType::Linear, Value::Double(0.0)).unwrap());
        c.insert(Knot::single(10.0, KnotType::Linear, Value::Double(100.0)).unwrap());
        let samples = sample(&c, ExtrapMode::Held, ExtrapMode::Held, 0.0, 10.0, 1.0, 1.0, 0.1);
        assert!(!samples.is_empty());
        assert_eq!(samples.first().unwrap().t0, 0.0);
        assert_eq!(samples.last().unwrap().t1, 10.0);
    }

    #[test]
    fn empty_spline_samples_to_nothing() {
        let c = KnotContainer::new();
        let samples = sample(&c, ExtrapMode::Held, ExtrapMode::Held, 0.0, 10.0, 1.0, 1.0, 0.1);
        assert!(samples.is_empty());
    }

    #[test]
    fn bezier_segment_with_tight_tolerance_produces_multiple_samples() {
        let mut k1 = Knot::single(0.0, KnotType::Bezier, Value::Double(0.0)).unwrap();
        k1.set_right_tangent_length(5.0).unwrap();
        k1.set_right_tangent_slope(Value::Double(10.0)).unwrap();
        let mut k2 = Knot::single(10.0, KnotType::Bezier, Value::Double(10.0)).unwrap();
        k2.set_left_tangent_length(5.0).unwrap();
        k2.set_left_tangent_slope(Value::Double(-10.0)).unwrap();
        let mut c = KnotContainer::new();
        c.insert(k1);
        c.insert(k2);
        let samples = sample(&c, ExtrapMode::Held, ExtrapMode::Held, 0.0, 10.0, 1.0, 1.0, 1e-4);
        assert!(samples.len() > 1);
    }

    #[test]
    fn a_tall_narrow_hump_produces_a_blur_sample() {
        // Endpoints coincide in both time (nearly) and value, but the
        // tangents drive a large excursion in between: the time-scaled
        // span collapses below tolerance while the value still swings.
        let mut k1 = Knot::single(0.0, KnotType::Bezier, Value::Double(0.0)).unwrap();
        k1.set_right_tangent_length(1e-6).unwrap();
        k1.set_right_tangent_slope(Value::Double(1e7)).unwrap();
        let mut k2 = Knot::single(1e-5, KnotType::Bezier, Value::Double(0.0)).unwrap();
        k2.set_left_tangent_length(1e-6).unwrap();
        k2.set_left_tangent_slope(Value::Double(-1e7)).unwrap();
        let mut c = KnotContainer::new();
        c.insert(k1);
        c.insert(k2);

        let samples = sample(&c, ExtrapMode::Held, ExtrapMode::Held, 0.0, 1e-5, 1.0, 1.0, 1e-2);
        let blur = samples.iter().find(|s| s.blur).expect("expected a blur sample");
        match (&blur.v0, &blur.v1) {
            (Value::Double(lo), Value::Double(hi)) => {
                assert!(*hi - *lo > 1.0, "expected the blur bounds to capture the hump, got [{lo}, {hi}]");
            }
            _ => panic!(),
        }
    }
}
