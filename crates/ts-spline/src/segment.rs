//! The segment cache: builds and evaluates the cubic Bezier between two
//! adjacent knots (§4.3).

use ts_core::Time;
use ts_math::{eval_cubic_derivative, solve_cubic};

use crate::knot::{Knot, KnotType};
use crate::value::{Components, Value};

/// The evaluable representation of one spline segment, built from a pair
/// of adjacent knots.
///
/// Held-only and quaternion value types degenerate to a lightweight
/// representation instead of going through the generic cubic machinery
/// (§4.3, final paragraph).
#[derive(Debug, Clone)]
pub enum SegmentCache {
    /// A full cubic Bezier in (time, value), power-basis coefficients.
    Cubic {
        /// Power-basis coefficients of the time channel.
        time_coeff: [f64; 4],
        /// Power-basis coefficients of the value channel: `[c0, c1, c2,
        /// c3]`, each holding one scalar per value component.
        value_coeff: [Components; 4],
        /// The value's variant, used to reconstruct a `Value` from
        /// [`Components`] after evaluation.
        shape: Value,
    },
    /// A quaternion segment: slerp between two endpoint orientations,
    /// held if `knot_type` is `Held`.
    Quaternion {
        /// Left endpoint time.
        t0: Time,
        /// Right endpoint time.
        t1: Time,
        /// Left endpoint orientation (`kf1.right_value`).
        q0: Value,
        /// Right endpoint orientation (`kf2.left_value` if dual, else
        /// `kf2.right_value`).
        q1: Value,
        /// `Held` or not; Bezier/Linear quaternions both slerp.
        knot_type: KnotType,
    },
    /// A held-only segment: the single stored value for the whole span.
    Held {
        /// Left endpoint time.
        t0: Time,
        /// Right endpoint time.
        t1: Time,
        /// The constant value across the segment.
        value: Value,
    },
}

impl SegmentCache {
    /// Build the segment cache between adjacent knots `kf1` and `kf2`
    /// (`kf1.time() < kf2.time()`), per §4.3.
    pub fn build(kf1: &Knot, kf2: &Knot) -> SegmentCache {
        if !kf1.right_value().interpolatable() {
            return SegmentCache::Held {
                t0: kf1.time(),
                t1: kf2.time(),
                value: kf1.right_value().clone(),
            };
        }
        if matches!(kf1.right_value(), Value::Quat(_)) {
            let q1 = if kf2.is_dual() {
                kf2.left_value().clone()
            } else {
                kf2.right_value().clone()
            };
            return SegmentCache::Quaternion {
                t0: kf1.time(),
                t1: kf2.time(),
                q0: kf1.right_value().clone(),
                q1,
                knot_type: kf1.knot_type(),
            };
        }

        let p0_value = kf1.right_value().to_components().unwrap();
        let p3_value_raw = if kf2.is_dual() {
            kf2.left_value().to_components().unwrap()
        } else {
            kf2.right_value().to_components().unwrap()
        };

        let p1_time = if kf1.knot_type() == KnotType::Bezier {
            kf1.time() + kf1.right_tangent_length()
        } else {
            (2.0 * kf1.time() + kf2.time()) / 3.0
        };

        let p1_value = if kf1.knot_type() == KnotType::Held {
            p0_value
        } else if kf1.knot_type() == KnotType::Linear {
            (p0_value * 2.0 + p3_value_raw) * (1.0 / 3.0)
        } else {
            let slope = kf1.right_tangent_slope().to_components().unwrap();
            p0_value + slope * kf1.right_tangent_length()
        };

        let synthesized_right_type = if kf1.knot_type() == KnotType::Held {
            KnotType::Held
        } else {
            kf2.knot_type()
        };

        let p2_time = match synthesized_right_type {
            KnotType::Held | KnotType::Linear => (kf1.time() + 2.0 * kf2.time()) / 3.0,
            KnotType::Bezier => kf2.time() - kf2.left_tangent_length(),
        };

        let p2_value = if kf1.knot_type() == KnotType::Held {
            p0_value
        } else if kf2.knot_type() == KnotType::Held && kf1.knot_type() != KnotType::Linear {
            p3_value_raw
        } else if kf1.knot_type() == KnotType::Linear {
            (p0_value + p3_value_raw * 2.0) * (1.0 / 3.0)
        } else {
            let slope = kf2.left_tangent_slope().to_components().unwrap();
            p3_value_raw - slope * kf2.left_tangent_length()
        };

        // P3 override: a Held left knot holds its value flat to kf2.time.
        let p3_value = if kf1.knot_type() == KnotType::Held {
            p0_value
        } else {
            p3_value_raw
        };

        let time_coeff = bernstein_to_power_scalar([kf1.time(), p1_time, p2_time, kf2.time()]);
        let value_coeff = bernstein_to_power_components([p0_value, p1_value, p2_value, p3_value]);

        SegmentCache::Cubic {
            time_coeff,
            value_coeff,
            shape: kf1.right_value().clone(),
        }
    }

    /// Evaluate this segment's value at time `t`.
    pub fn eval_value(&self, t: Time) -> Value {
        match self {
            SegmentCache::Held { value, .. } => value.clone(),
            SegmentCache::Quaternion { t0, t1, q0, q1, .. } => {
                let span = t1 - t0;
                let frac = if span == 0.0 { 0.0 } else { (t - t0) / span };
                q0.slerp(q1, frac.clamp(0.0, 1.0))
            }
            SegmentCache::Cubic {
                time_coeff,
                value_coeff,
                shape,
            } => {
                let u = solve_cubic(*time_coeff, t).clamp(0.0, 1.0);
                let c = eval_component_cubic(value_coeff, u);
                shape.from_components(c)
            }
        }
    }

    /// Evaluate this segment's derivative at time `t`. Zero for held and
    /// quaternion segments (§4.4.2).
    pub fn eval_derivative(&self, t: Time) -> Value {
        match self {
            SegmentCache::Held { value, .. } => value.zero(),
            SegmentCache::Quaternion { q0, .. } => q0.zero(),
            SegmentCache::Cubic {
                time_coeff,
                value_coeff,
                shape,
            } => {
                let u = solve_cubic(*time_coeff, t).clamp(0.0, 1.0);
                let dt = eval_cubic_derivative(*time_coeff, u);
                if dt == 0.0 {
                    return shape.zero();
                }
                let dv = eval_component_cubic_derivative(value_coeff, u);
                shape.from_components(dv * (1.0 / dt))
            }
        }
    }

    /// The power-basis coefficients of the time channel, for callers
    /// (the sampler, range computation) that need to test monotonicity
    /// or invert time directly. `None` for non-cubic segments.
    pub fn time_coeff(&self) -> Option<[f64; 4]> {
        match self {
            SegmentCache::Cubic { time_coeff, .. } => Some(*time_coeff),
            _ => None,
        }
    }

    /// The power-basis coefficients of the value channel. `None` for
    /// non-cubic segments.
    pub fn value_coeff(&self) -> Option<[Components; 4]> {
        match self {
            SegmentCache::Cubic { value_coeff, .. } => Some(*value_coeff),
            _ => None,
        }
    }

    /// The shape (variant) of value this segment produces, for rebuilding
    /// a `Value` from raw `Components`.
    pub fn shape(&self) -> Option<&Value> {
        match self {
            SegmentCache::Cubic { shape, .. } => Some(shape),
            _ => None,
        }
    }
}

/// Bernstein control points to power-basis coefficients, for a scalar
/// channel (used for the time channel, which is always a plain `f64`).
pub(crate) fn bernstein_to_power_scalar(p: [f64; 4]) -> [f64; 4] {
    [
        p[0],
        -3.0 * p[0] + 3.0 * p[1],
        3.0 * p[0] - 6.0 * p[1] + 3.0 * p[2],
        -p[0] + 3.0 * p[1] - 3.0 * p[2] + p[3],
    ]
}

/// Bernstein control points to power-basis coefficients, for a value
/// channel whose points are [`Components`] (one scalar per component).
pub(crate) fn bernstein_to_power_components(p: [Components; 4]) -> [Components; 4] {
    [
        p[0],
        p[1] * 3.0 - p[0] * 3.0,
        p[0] * 3.0 - p[1] * 6.0 + p[2] * 3.0,
        p[3] - p[0] + (p[1] - p[2]) * 3.0,
    ]
}

/// Horner's-form evaluation of a component-wise cubic at `u`.
pub(crate) fn eval_component_cubic(c: &[Components; 4], u: f64) -> Components {
    ((c[3] * u + c[2]) * u + c[1]) * u + c[0]
}

/// Horner's-form evaluation of a component-wise cubic's derivative at
/// `u`.
pub(crate) fn eval_component_cubic_derivative(c: &[Components; 4], u: f64) -> Components {
    (c[3] * 3.0 * u + c[2] * 2.0) * u + c[1]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linear_knot(t: f64, v: f64) -> Knot {
        Knot::single(t, KnotType::Linear, Value::Double(v)).unwrap()
    }

    fn held_knot(t: f64, v: f64) -> Knot {
        Knot::single(t, KnotType::Held, Value::Double(v)).unwrap()
    }

    #[test]
    fn linear_segment_interpolates_straight_line() {
        let k1 = linear_knot(0.0, 0.0);
        let k2 = linear_knot(10.0, 100.0);
        let seg = SegmentCache::build(&k1, &k2);
        match seg.eval_value(5.0) {
            Value::Double(v) => assert!((v - 50.0).abs() < 1e-3, "got {v}"),
            _ => panic!("expected Double"),
        }
    }

    #[test]
    fn held_segment_holds_left_value_flat() {
        let k1 = held_knot(0.0, 3.0);
        let k2 = linear_knot(10.0, 100.0);
        let seg = SegmentCache::build(&k1, &k2);
        for t in [0.0, 3.0, 9.999] {
            match seg.eval_value(t) {
                Value::Double(v) => assert_eq!(v, 3.0),
                _ => panic!("expected Double"),
            }
        }
    }

    #[test]
    fn bezier_segment_hits_endpoints_exactly() {
        let mut k1 = Knot::single(0.0, KnotType::Bezier, Value::Double(0.0)).unwrap();
        k1.set_right_tangent_length(1.0).unwrap();
        k1.set_right_tangent_slope(Value::Double(1.0)).unwrap();
        let mut k2 = Knot::single(10.0, KnotType::Bezier, Value::Double(10.0)).unwrap();
        k2.set_left_tangent_length(1.0).unwrap();
        k2.set_left_tangent_slope(Value::Double(1.0)).unwrap();

        let seg = SegmentCache::build(&k1, &k2);
        match seg.eval_value(0.0) {
            Value::Double(v) => assert!((v - 0.0).abs() < 1e-6),
            _ => panic!(),
        }
        match seg.eval_value(10.0) {
            Value::Double(v) => assert!((v - 10.0).abs() < 1e-3),
            _ => panic!(),
        }
    }

    #[test]
    fn dual_valued_right_knot_uses_left_value_as_p3() {
        let k1 = linear_knot(0.0, 0.0);
        let k2 = Knot::dual(10.0, KnotType::Linear, Value::Double(50.0), Value::Double(999.0)).unwrap();
        let seg = SegmentCache::build(&k1, &k2);
        match seg.eval_value(10.0) {
            Value::Double(v) => assert!((v - 50.0).abs() < 1e-2, "got {v}"),
            _ => panic!(),
        }
    }
}
