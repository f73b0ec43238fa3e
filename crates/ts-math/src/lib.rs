//! # ts-math
//!
//! The numeric kernel shared by the knot/spline model: power-basis cubic
//! and quadratic evaluation, quadratic root solving, and the cubic
//! segment-inversion routine used to go from a spline time to a Bezier
//! segment parameter.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod comparison;
pub mod kernel;

pub use kernel::{
    cubic_derivative, eval_cubic, eval_cubic_derivative, eval_quadratic, solve_cubic,
    solve_cubic_in_interval, solve_quadratic,
};
