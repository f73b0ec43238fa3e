//! Changed-interval diffing between two splines (§4.7).

use ts_core::Time;

use crate::extrapolation::ExtrapMode;
use crate::interval::Interval;
use crate::knot::{Knot, KnotType, Side};
use crate::redundancy::segment_is_flat;
use crate::spline::Spline;

/// `true` if segment `(a1, a2)` of spline `A` is equivalent to segment
/// `(b1, b2)` of spline `B`, per §4.7.1: both left endpoints are
/// side-equivalent on `Left`... actually both endpoints side-equivalent
/// on the side facing into the segment (left endpoint on `Right`, right
/// endpoint on `Left`), and both endpoints share the same knot type.
fn segments_equivalent(a1: &Knot, a2: &Knot, b1: &Knot, b2: &Knot) -> bool {
    a1.equivalent_at_side(b1, Side::Right)
        && a2.equivalent_at_side(b2, Side::Left)
        && a1.knot_type() == b1.knot_type()
        && a2.knot_type() == b2.knot_type()
}

/// Find the changed interval between splines `a` and `b`: outside it,
/// the two splines evaluate identically and contain identical knots.
pub fn find_changed_interval(a: &Spline, b: &Spline) -> Interval {
    if a.is_empty() && b.is_empty() {
        return Interval::empty();
    }

    let left = tighten_left(a, b);
    let right = tighten_right(a, b);

    match (left, right) {
        (None, None) => Interval::empty(),
        (Some((lo, lo_open)), None) => Interval::Bounded {
            min: Some(lo),
            min_open: lo_open,
            max: None,
            max_open: false,
        },
        (None, Some((hi, hi_open))) => Interval::Bounded {
            min: None,
            min_open: false,
            max: Some(hi),
            max_open: hi_open,
        },
        (Some((lo, lo_open)), Some((hi, hi_open))) => {
            if lo > hi {
                Interval::empty()
            } else {
                Interval::new(lo, lo_open, hi, hi_open)
            }
        }
    }
}

/// Tighten the left boundary of the changed interval, per §4.7.3.
/// Returns `None` if the two splines already agree all the way to
/// negative infinity.
fn tighten_left(a: &Spline, b: &Spline) -> Option<(Time, bool)> {
    if effective_left_extrapolations_differ(a, b) {
        return None;
    }

    let (Some(a0), Some(b0)) = (a.knots().get(0), b.knots().get(0)) else {
        // One is empty, the other isn't: differ everywhere.
        return None;
    };

    if a0.time() != b0.time() {
        return None;
    }
    if !a0.left_value().close_enough(b0.left_value()) {
        return Some((a0.time(), false));
    }

    let mut ia = 0usize;
    let mut ib = 0usize;
    loop {
        let Some(ka) = a.knots().get(ia) else {
            return Some((0.0, false));
        };
        let Some(kb) = b.knots().get(ib) else {
            return Some((0.0, false));
        };

        if !ka.right_value().close_enough(kb.right_value()) || ka.is_dual() != kb.is_dual() {
            return Some((ka.time().max(kb.time()), false));
        }
        let value = ka.right_value().clone();

        let next_a = a.knots().get(ia + 1);
        let next_b = b.knots().get(ib + 1);

        match (next_a, next_b) {
            (None, None) => return None,
            (Some(na), Some(nb)) if na.time() == nb.time() => {
                // Knots realign: either they're the same knot outright,
                // or both sides reach the same value through independent
                // flat runs (§4.7.3) — either way it's safe to continue.
                if segments_equivalent(ka, na, kb, nb)
                    || (segment_is_flat(ka, na)
                        && segment_is_flat(kb, nb)
                        && na.right_value().close_enough(nb.right_value())
                        && na.is_dual() == nb.is_dual())
                {
                    ia += 1;
                    ib += 1;
                    continue;
                }
                return Some((ka.time(), false));
            }
            (Some(na), Some(nb)) => {
                // Knot counts/times diverge. Coalesce past it only if
                // the side with the earlier next knot is flat at the
                // value both sides currently agree on — its segment
                // alone covers the gap left by the other side's knot
                // that hasn't been reached yet.
                if na.time() < nb.time() {
                    if segment_is_flat(ka, na) && na.right_value().close_enough(&value) {
                        ia += 1;
                        continue;
                    }
                    return Some((ka.time(), false));
                }
                if segment_is_flat(kb, nb) && nb.right_value().close_enough(&value) {
                    ib += 1;
                    continue;
                }
                return Some((ka.time(), false));
            }
            (Some(na), None) => {
                if segment_is_flat(ka, na) && na.right_value().close_enough(&value) {
                    ia += 1;
                    continue;
                }
                return Some((ka.time(), false));
            }
            (None, Some(nb)) => {
                if segment_is_flat(kb, nb) && nb.right_value().close_enough(&value) {
                    ib += 1;
                    continue;
                }
                return Some((ka.time(), false));
            }
        }
    }
}

/// Mirror of [`tighten_left`], from the end inward (§4.7.4).
fn tighten_right(a: &Spline, b: &Spline) -> Option<(Time, bool)> {
    if effective_right_extrapolations_differ(a, b) {
        return None;
    }

    let (Some(a_last), Some(b_last)) = (
        a.knots().get(a.knots().len().wrapping_sub(1)),
        b.knots().get(b.knots().len().wrapping_sub(1)),
    ) else {
        return None;
    };

    if a_last.time() != b_last.time() {
        return None;
    }
    if !a_last.right_value().close_enough(b_last.right_value()) {
        return Some((a_last.time(), false));
    }

    let mut ia = a.knots().len() as isize - 1;
    let mut ib = b.knots().len() as isize - 1;
    loop {
        let (Some(ka), Some(kb)) = (
            if ia >= 0 { a.knots().get(ia as usize) } else { None },
            if ib >= 0 { b.knots().get(ib as usize) } else { None },
        ) else {
            return Some((0.0, false));
        };

        if !ka.left_value().close_enough(kb.left_value()) || ka.is_dual() != kb.is_dual() {
            return Some((ka.time().min(kb.time()), false));
        }
        let value = ka.left_value().clone();

        let prev_a = if ia > 0 { a.knots().get((ia - 1) as usize) } else { None };
        let prev_b = if ib > 0 { b.knots().get((ib - 1) as usize) } else { None };

        match (prev_a, prev_b) {
            (None, None) => return None,
            (Some(pa), Some(pb)) if pa.time() == pb.time() => {
                if segments_equivalent(pa, ka, pb, kb)
                    || (segment_is_flat(pa, ka)
                        && segment_is_flat(pb, kb)
                        && pa.left_value().close_enough(pb.left_value())
                        && pa.is_dual() == pb.is_dual())
                {
                    ia -= 1;
                    ib -= 1;
                    continue;
                }
                return Some((ka.time(), false));
            }
            (Some(pa), Some(pb)) => {
                // Mirror of tighten_left's diverge branch: walk back
                // through whichever side's preceding knot is later
                // (closer to the current position), as long as its
                // segment up to here is flat at the agreed value.
                if pa.time() > pb.time() {
                    if segment_is_flat(pa, ka) && pa.left_value().close_enough(&value) {
                        ia -= 1;
                        continue;
                    }
                    return Some((ka.time(), false));
                }
                if segment_is_flat(pb, kb) && pb.left_value().close_enough(&value) {
                    ib -= 1;
                    continue;
                }
                return Some((ka.time(), false));
            }
            (Some(pa), None) => {
                if segment_is_flat(pa, ka) && pa.left_value().close_enough(&value) {
                    ia -= 1;
                    continue;
                }
                return Some((ka.time(), false));
            }
            (None, Some(pb)) => {
                if segment_is_flat(pb, kb) && pb.left_value().close_enough(&value) {
                    ib -= 1;
                    continue;
                }
                return Some((ka.time(), false));
            }
        }
    }
}

fn effective_left_extrapolations_differ(a: &Spline, b: &Spline) -> bool {
    let a_mode = a.effective_extrapolation(Side::Left);
    let b_mode = b.effective_extrapolation(Side::Left);
    if a_mode != b_mode {
        return true;
    }
    if a_mode == ExtrapMode::Linear {
        // Differing edge slope means differing extrapolated values.
        let a0 = a.knots().get(0);
        let b0 = b.knots().get(0);
        if let (Some(a0), Some(b0)) = (a0, b0) {
            return !a0.left_tangent_slope().close_enough(b0.left_tangent_slope());
        }
    }
    false
}

fn effective_right_extrapolations_differ(a: &Spline, b: &Spline) -> bool {
    let a_mode = a.effective_extrapolation(Side::Right);
    let b_mode = b.effective_extrapolation(Side::Right);
    if a_mode != b_mode {
        return true;
    }
    if a_mode == ExtrapMode::Linear {
        let a_last = a.knots().get(a.knots().len().wrapping_sub(1));
        let b_last = b.knots().get(b.knots().len().wrapping_sub(1));
        if let (Some(a_last), Some(b_last)) = (a_last, b_last) {
            return !a_last
                .right_tangent_slope()
                .close_enough(b_last.right_tangent_slope());
        }
    }
    false
}

// `segment_is_flat` is re-exported at the crate level (SUPPLEMENTED
// FEATURES #2) for callers that only need the standalone flatness test
// without running a full diff.
pub use segment_is_flat as flat_segment_test;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knot::Knot;
    use crate::value::Value;

    fn ramp_spline(offset: f64) -> Spline {
        let mut s = Spline::new(Value::Double(0.0));
        s.insert_knot(Knot::single(0.0, KnotType::Linear, Value::Double(0.0 + offset)).unwrap())
            .unwrap();
        s.insert_knot(Knot::single(10.0, KnotType::Linear, Value::Double(100.0)).unwrap())
            .unwrap();
        s
    }

    #[test]
    fn identical_splines_have_empty_changed_interval() {
        let a = ramp_spline(0.0);
        let b = ramp_spline(0.0);
        assert!(find_changed_interval(&a, &b).is_empty());
    }

    #[test]
    fn differing_splines_have_nonempty_changed_interval() {
        let a = ramp_spline(0.0);
        let b = ramp_spline(5.0);
        let interval = find_changed_interval(&a, &b);
        assert!(!interval.is_empty());
        assert!(interval.contains(0.0));
    }

    #[test]
    fn diff_is_symmetric() {
        let a = ramp_spline(0.0);
        let b = ramp_spline(5.0);
        let forward = find_changed_interval(&a, &b);
        let backward = find_changed_interval(&b, &a);
        assert_eq!(forward, backward);
    }

    #[test]
    fn flat_splines_with_different_knot_counts_have_no_changed_interval() {
        let mut a = Spline::new(Value::Double(0.0));
        a.insert_knot(Knot::single(0.0, KnotType::Held, Value::Double(5.0)).unwrap()).unwrap();
        a.insert_knot(Knot::single(10.0, KnotType::Held, Value::Double(5.0)).unwrap()).unwrap();
        a.insert_knot(Knot::single(20.0, KnotType::Held, Value::Double(5.0)).unwrap()).unwrap();

        let mut b = Spline::new(Value::Double(0.0));
        b.insert_knot(Knot::single(0.0, KnotType::Held, Value::Double(5.0)).unwrap()).unwrap();
        b.insert_knot(Knot::single(30.0, KnotType::Held, Value::Double(5.0)).unwrap()).unwrap();

        assert!(find_changed_interval(&a, &b).is_empty());
        assert!(find_changed_interval(&b, &a).is_empty());
    }
}
