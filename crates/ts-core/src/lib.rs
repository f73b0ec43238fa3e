//! # ts-core
//!
//! Core types and error definitions shared across the `tsspline` workspace.
//!
//! This crate provides the foundational building blocks used by both
//! `ts-math` (the numeric kernel) and `ts-spline` (the knot/spline model):
//! the time/value type aliases, the error hierarchy, and the `Null`
//! sentinel trait used for the distinguished default time code.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod errors;
pub mod utilities;

/// Floating-point type used for values throughout the library.
pub type Real = f64;

/// A time measurement, in the spline's own time units.
pub type Time = Real;

/// Index into a knot container.
pub type Size = usize;

pub use errors::{Error, Result};
pub use utilities::null::Null;
