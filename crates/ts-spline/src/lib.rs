//! # ts-spline
//!
//! A time-varying scalar (and vector/quaternion/held) animation spline:
//! ordered knots, cubic-Bezier segment evaluation, extrapolation,
//! adaptive sampling, value-range queries, changed-interval diffing,
//! redundant-knot detection, and knot breakdown.
//!
//! The top-level type is [`Spline`]; [`Knot`] is its authored control
//! point, [`Value`] the closed set of value types it may carry.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod breakdown;
mod container;
mod diff;
mod evaluator;
mod extrapolation;
mod interval;
mod knot;
mod range;
mod redundancy;
mod sampler;
mod segment;
mod spline;
mod value;

pub use breakdown::breakdown;
pub use container::KnotContainer;
pub use diff::{find_changed_interval, flat_segment_test};
pub use extrapolation::{AntiRegressionMode, CurveType, ExtrapMode};
pub use interval::Interval;
pub use knot::{Knot, KnotType, Side};
pub use redundancy::{is_knot_redundant, segment_is_flat, LoopBounds};
pub use sampler::Sample;
pub use spline::{InnerLoopParams, Spline};
pub use value::{Components, Value, ValueClass};
