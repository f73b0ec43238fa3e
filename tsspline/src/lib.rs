//! # tsspline
//!
//! A time-varying scalar animation spline library.
//!
//! This crate is a **façade** that re-exports all public items from the
//! underlying workspace crates. Application code should depend on this
//! crate rather than the individual `ts-*` crates directly.
//!
//! ## Quick start
//!
//! ```toml
//! [dependencies]
//! tsspline = "0.1"
//! ```
//!
//! ```rust
//! use tsspline::spline::{Knot, KnotType, Side, Spline, Value};
//!
//! let mut s = Spline::new(Value::Double(0.0));
//! s.insert_knot(Knot::single(0.0, KnotType::Linear, Value::Double(0.0)).unwrap()).unwrap();
//! s.insert_knot(Knot::single(10.0, KnotType::Linear, Value::Double(100.0)).unwrap()).unwrap();
//! match s.eval_value(5.0, Side::Right).unwrap() {
//!     Value::Double(v) => assert!((v - 50.0).abs() < 1e-6),
//!     _ => unreachable!(),
//! }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

/// Core types, aliases, and error definitions.
pub use ts_core as core;

/// Cubic polynomial evaluation and root-finding kernel.
pub use ts_math as math;

/// Knots, segments, the evaluator, sampler, and the `Spline` type.
pub use ts_spline as spline;
