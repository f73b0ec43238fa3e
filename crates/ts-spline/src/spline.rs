//! The top-level spline container (§3.4), tying together the knot
//! container, extrapolation configuration, and optional inner-loop
//! parameters, and exposing the full public surface (§6).

use ts_core::{ensure, Result, Time};

use crate::container::KnotContainer;
use crate::evaluator;
use crate::extrapolation::ExtrapMode;
use crate::knot::{Knot, KnotType, Side};
use crate::range;
use crate::redundancy::{self, LoopBounds};
use crate::sampler::{self, Sample};
use crate::value::Value;

/// Parameters describing an authored inner-loop prototype interval
/// (§3.4). Valid only when `proto_end > proto_start`; looping itself is
/// an echo-knot synthesis pre-pass out of scope for this core (§4.4.3),
/// so these fields are carried for persistence/authoring fidelity and to
/// exempt the prototype's boundary knots from redundancy (§4.8).
#[derive(Debug, Clone, PartialEq)]
pub struct InnerLoopParams {
    /// Start of the authored prototype interval.
    pub proto_start: Time,
    /// End of the authored prototype interval.
    pub proto_end: Time,
    /// Number of loop repetitions synthesized before the prototype.
    pub num_pre_loops: u32,
    /// Number of loop repetitions synthesized after the prototype.
    pub num_post_loops: u32,
    /// Per-repetition value offset (`LoopRepeat`'s accumulating shift).
    pub value_offset: Value,
}

/// A time-varying scalar (or vector/quaternion/held) value, built from an
/// ordered set of [`Knot`]s plus left/right extrapolation behavior
/// (§3.4).
#[derive(Debug, Clone, PartialEq)]
pub struct Spline {
    value_kind: Value,
    knots: KnotContainer,
    extrap_left: ExtrapMode,
    extrap_right: ExtrapMode,
    extrap_left_slope: Option<Value>,
    extrap_right_slope: Option<Value>,
    inner_loop: Option<InnerLoopParams>,
}

impl Spline {
    /// An empty spline carrying values of the same variant as
    /// `value_kind` (only its type tag matters; the stored value itself
    /// is ignored).
    pub fn new(value_kind: Value) -> Spline {
        Spline {
            value_kind,
            knots: KnotContainer::new(),
            extrap_left: ExtrapMode::Held,
            extrap_right: ExtrapMode::Held,
            extrap_left_slope: None,
            extrap_right_slope: None,
            inner_loop: None,
        }
    }

    /// The value variant this spline carries.
    pub fn value_kind(&self) -> &Value {
        &self.value_kind
    }

    /// Set the declared left/right extrapolation modes, with optional
    /// explicit slopes (consumed only by `Sloped` mode, which this core
    /// does not evaluate — see [`ExtrapMode::is_implemented`]; stored for
    /// persistence fidelity).
    pub fn set_extrapolation(
        &mut self,
        left: ExtrapMode,
        right: ExtrapMode,
        slope_left: Option<Value>,
        slope_right: Option<Value>,
    ) {
        self.extrap_left = left;
        self.extrap_right = right;
        self.extrap_left_slope = slope_left;
        self.extrap_right_slope = slope_right;
    }

    /// The declared left extrapolation mode.
    pub fn extrapolation_left(&self) -> ExtrapMode {
        self.extrap_left
    }

    /// The declared right extrapolation mode.
    pub fn extrapolation_right(&self) -> ExtrapMode {
        self.extrap_right
    }

    /// Set the inner-loop prototype parameters. Rejected if
    /// `proto_end <= proto_start`.
    pub fn set_inner_loop(&mut self, params: InnerLoopParams) -> Result<()> {
        ensure!(
            params.proto_end > params.proto_start,
            "inner loop proto_end ({}) must be greater than proto_start ({})",
            params.proto_end,
            params.proto_start
        );
        self.inner_loop = Some(params);
        Ok(())
    }

    /// Clear any inner-loop prototype parameters.
    pub fn clear_inner_loop(&mut self) {
        self.inner_loop = None;
    }

    /// The current inner-loop parameters, if any.
    pub fn inner_loop(&self) -> Option<&InnerLoopParams> {
        self.inner_loop.as_ref()
    }

    /// Insert (or replace, at an existing time) a knot.
    pub fn insert_knot(&mut self, knot: Knot) -> Result<()> {
        self.knots.insert(knot);
        Ok(())
    }

    /// Remove the knot at `t`. No-op if absent.
    pub fn remove_knot_at(&mut self, t: Time) {
        self.knots.erase(t);
    }

    /// The knot exactly at `t`, if any.
    pub fn knot_at(&self, t: Time) -> Option<&Knot> {
        self.knots.find(t)
    }

    /// This spline's knot container, for callers (diffing, range,
    /// direct inspection) that need the full ordered set.
    pub fn knots(&self) -> &KnotContainer {
        &self.knots
    }

    /// `true` if this spline has no knots.
    pub fn is_empty(&self) -> bool {
        self.knots.is_empty()
    }

    /// Number of knots.
    pub fn len(&self) -> usize {
        self.knots.len()
    }

    /// Ascending-time iteration over this spline's knots.
    pub fn iter(&self) -> std::slice::Iter<'_, Knot> {
        self.knots.iter()
    }

    /// Evaluate this spline's value at `t`, approached from `side`
    /// (§4.4.1). `None` if the spline has no knots.
    pub fn eval_value(&self, t: Time, side: Side) -> Option<Value> {
        evaluator::eval_value(&self.knots, self.extrap_left, self.extrap_right, t, side)
    }

    /// Evaluate this spline's derivative at `t`, approached from `side`
    /// (§4.4.2). `None` if the spline has no knots.
    pub fn eval_derivative(&self, t: Time, side: Side) -> Option<Value> {
        evaluator::eval_derivative(&self.knots, self.extrap_left, self.extrap_right, t, side)
    }

    /// Produce linear samples approximating this spline over `[start,
    /// end]` within tolerance `tol` (§4.5).
    pub fn sample(
        &self,
        start: Time,
        end: Time,
        time_scale: f64,
        value_scale: f64,
        tol: f64,
    ) -> Vec<Sample> {
        sampler::sample(
            &self.knots,
            self.extrap_left,
            self.extrap_right,
            start,
            end,
            time_scale,
            value_scale,
            tol,
        )
    }

    /// The `(min, max)` value this spline attains over `[start, end]`
    /// (§4.6). `None` if the spline has no knots.
    pub fn range(&self, start: Time, end: Time) -> Option<(Value, Value)> {
        range::range(&self.knots, start, end)
    }

    /// The effective extrapolation mode on `side`, degrading to `Held`
    /// per §3.5 when the edge knot (or the whole spline) can't support
    /// anything else.
    pub fn effective_extrapolation(&self, side: Side) -> ExtrapMode {
        let declared = match side {
            Side::Left => self.extrap_left,
            Side::Right => self.extrap_right,
        };
        if declared == ExtrapMode::Held || !declared.is_implemented() {
            return ExtrapMode::Held;
        }

        let edge = match side {
            Side::Left => self.knots.get(0),
            Side::Right => self.knots.get(self.knots.len().wrapping_sub(1)),
        };
        let Some(edge) = edge else {
            return declared;
        };

        if edge.knot_type() == KnotType::Held {
            return ExtrapMode::Held;
        }
        if edge.is_dual() && edge.left_value() != edge.right_value() && !edge.right_value().supports_tangents()
        {
            return ExtrapMode::Held;
        }
        if self.knots.len() == 1 && !edge.right_value().supports_tangents() {
            return ExtrapMode::Held;
        }
        declared
    }

    /// `true` if removing `k` would not change this spline's evaluated
    /// value anywhere (§4.8). `k` need not currently be present in the
    /// container (callers typically test a candidate before removing
    /// it).
    pub fn is_knot_redundant(&self, k: &Knot, default_value: Option<&Value>) -> bool {
        let bounds = self.inner_loop.as_ref().map(|p| LoopBounds {
            proto_start: p.proto_start,
            proto_end: p.proto_end,
        });
        redundancy::is_knot_redundant(&self.knots, k, bounds, default_value)
    }
}

impl<'a> IntoIterator for &'a Spline {
    type Item = &'a Knot;
    type IntoIter = std::slice::Iter<'a, Knot>;
    fn into_iter(self) -> Self::IntoIter {
        self.knots.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knot::KnotType;

    fn ramp() -> Spline {
        let mut s = Spline::new(Value::Double(0.0));
        s.insert_knot(Knot::single(0.0, KnotType::Linear, Value::Double(0.0)).unwrap())
            .unwrap();
        s.insert_knot(Knot::single(10.0, KnotType::Linear, Value::Double(100.0)).unwrap())
            .unwrap();
        s
    }

    #[test]
    fn new_spline_is_empty() {
        let s = Spline::new(Value::Double(0.0));
        assert!(s.is_empty());
        assert_eq!(s.len(), 0);
        assert!(s.eval_value(0.0, Side::Right).is_none());
    }

    #[test]
    fn insert_and_evaluate_a_ramp() {
        let s = ramp();
        assert_eq!(s.len(), 2);
        match s.eval_value(5.0, Side::Right).unwrap() {
            Value::Double(v) => assert!((v - 50.0).abs() < 1e-2, "got {v}"),
            _ => panic!(),
        }
    }

    #[test]
    fn remove_knot_at_shrinks_the_spline() {
        let mut s = ramp();
        s.remove_knot_at(0.0);
        assert_eq!(s.len(), 1);
        assert!(s.knot_at(0.0).is_none());
    }

    #[test]
    fn default_extrapolation_is_held() {
        let s = ramp();
        assert_eq!(s.effective_extrapolation(Side::Left), ExtrapMode::Held);
        assert_eq!(s.effective_extrapolation(Side::Right), ExtrapMode::Held);
    }

    #[test]
    fn linear_extrapolation_degrades_to_held_for_held_edge_knot() {
        let mut s = Spline::new(Value::Double(0.0));
        s.insert_knot(Knot::single(0.0, KnotType::Held, Value::Double(1.0)).unwrap())
            .unwrap();
        s.insert_knot(Knot::single(10.0, KnotType::Linear, Value::Double(2.0)).unwrap())
            .unwrap();
        s.set_extrapolation(ExtrapMode::Linear, ExtrapMode::Linear, None, None);
        assert_eq!(s.effective_extrapolation(Side::Left), ExtrapMode::Held);
    }

    #[test]
    fn set_inner_loop_rejects_empty_prototype_interval() {
        let mut s = ramp();
        let params = InnerLoopParams {
            proto_start: 5.0,
            proto_end: 5.0,
            num_pre_loops: 1,
            num_post_loops: 1,
            value_offset: Value::Double(0.0),
        };
        assert!(s.set_inner_loop(params).is_err());
    }
}
