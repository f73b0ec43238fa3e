//! Cubic and quadratic polynomial evaluation, and root-finding for the
//! segment-inversion problem (given a cubic Bezier in time/value, find the
//! parameter `u` at which the time coordinate equals a target time).
//!
//! The coefficient convention throughout is power-basis, `c[0]` the
//! constant term: `f(u) = c0 + c1*u + c2*u^2 + c3*u^3`. Callers convert
//! Bernstein (Bezier control-point) coefficients to this basis before
//! calling in here; see `ts-spline`'s segment cache.

use ts_core::Real;

/// Evaluate a cubic `c0 + c1*u + c2*u^2 + c3*u^3` via Horner's method.
#[inline]
pub fn eval_cubic(c: [Real; 4], u: Real) -> Real {
    ((c[3] * u + c[2]) * u + c[1]) * u + c[0]
}

/// Evaluate a quadratic `c0 + c1*u + c2*u^2` via Horner's method.
#[inline]
pub fn eval_quadratic(c: [Real; 3], u: Real) -> Real {
    (c[2] * u + c[1]) * u + c[0]
}

/// Evaluate the derivative of the cubic described by `c` at `u`.
#[inline]
pub fn eval_cubic_derivative(c: [Real; 4], u: Real) -> Real {
    (3.0 * c[3] * u + 2.0 * c[2]) * u + c[1]
}

/// Coefficients of the derivative of the cubic described by `c`.
#[inline]
pub fn cubic_derivative(c: [Real; 4]) -> [Real; 3] {
    [c[1], 2.0 * c[2], 3.0 * c[3]]
}

/// Solve `p0 + p1*u + p2*u^2 = 0` for real roots, `root0 <= root1`.
///
/// Handles the degenerate linear case (`p2 == 0`) and the no-solution case
/// (`p2 == p1 == 0`, or a negative discriminant).
pub fn solve_quadratic(p: [Real; 3]) -> Option<(Real, Real)> {
    let (a, b, c) = (p[2], p[1], p[0]);

    if a == 0.0 {
        if b == 0.0 {
            return None;
        }
        let root = -c / b;
        return Some((root, root));
    }

    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 {
        return None;
    }

    // Numerically stable form (Numerical Recipes §5.6): avoids
    // cancellation when b and sqrt(discriminant) are close in magnitude.
    let sqrt_disc = discriminant.sqrt();
    let q = if b >= 0.0 {
        -0.5 * (b + sqrt_disc)
    } else {
        -0.5 * (b - sqrt_disc)
    };

    let (r0, r1) = if q == 0.0 {
        (-b / (2.0 * a), -b / (2.0 * a))
    } else {
        let root_a = q / a;
        let root_b = c / q;
        if root_a <= root_b {
            (root_a, root_b)
        } else {
            (root_b, root_a)
        }
    };

    Some((r0, r1))
}

const REGULA_FALSI_MAX_ITERATIONS: u32 = 20;
const REGULA_FALSI_EPSILON: Real = 1e-6;
const NEWTON_EPSILON: Real = 1e-5;

/// Invert the monotone cubic `c(u) = y` for `u` in `[lo, hi]`.
///
/// Newton's method from the midpoint of the bracket; if a step would
/// escape `[lo, hi]`, falls back to regula falsi. Returns `-1.0` if `y`
/// is not bracketed by `c(lo)` and `c(hi)` (both residuals share sign),
/// which callers treat as "no solution" and clamp to the nearest end.
pub fn solve_cubic_in_interval(c: [Real; 4], c_deriv: [Real; 3], y: Real, lo: Real, hi: Real) -> Real {
    let f = |u: Real| eval_cubic(c, u) - y;

    let f_lo = f(lo);
    let f_hi = f(hi);
    if f_lo == 0.0 {
        return lo;
    }
    if f_hi == 0.0 {
        return hi;
    }
    if f_lo.signum() == f_hi.signum() {
        return -1.0;
    }

    let mut u = 0.5 * (lo + hi);
    let mut fu = f(u);
    if fu.abs() < NEWTON_EPSILON {
        return u;
    }

    let dfu = eval_quadratic(c_deriv, u);
    if dfu != 0.0 {
        let step = u - fu / dfu;
        if step > lo && step < hi {
            u = step;
            fu = f(u);
            if fu.abs() < NEWTON_EPSILON {
                return u;
            }
        }
    }

    regula_falsi(f, lo, f_lo, hi, f_hi)
}

fn regula_falsi<F>(f: F, mut lo: Real, mut f_lo: Real, mut hi: Real, mut f_hi: Real) -> Real
where
    F: Fn(Real) -> Real,
{
    for _ in 0..REGULA_FALSI_MAX_ITERATIONS {
        let u = lo - f_lo * (hi - lo) / (f_hi - f_lo);
        let fu = f(u);

        if fu.abs() < REGULA_FALSI_EPSILON {
            return u;
        }

        if fu.signum() == f_lo.signum() {
            lo = u;
            f_lo = fu;
        } else {
            hi = u;
            f_hi = fu;
        }
    }
    0.5 * (lo + hi)
}

/// Invert the monotone cubic `c(u) = y` on `u in [0, 1]`.
///
/// `c` need not be monotonic globally: if its derivative has two real
/// roots inside `(0, 1)`, the curve doubles back on itself and the
/// correct bracketing sub-interval is chosen by comparing `y` against
/// the midpoint of the clamped endpoint values.
pub fn solve_cubic(c: [Real; 4], y: Real) -> Real {
    let c_deriv = cubic_derivative(c);
    let c0 = eval_cubic(c, 0.0);
    let c1 = eval_cubic(c, 1.0);

    let roots = solve_quadratic([c_deriv[0], c_deriv[1], c_deriv[2]]);

    let in_open_unit = |r: Real| r > 0.0 && r < 1.0;

    match roots {
        Some((r0, r1)) if in_open_unit(r0) && in_open_unit(r1) && r0 != r1 => {
            let c_r0 = eval_cubic(c, r0).clamp(c0.min(c1), c0.max(c1));
            let c_r1 = eval_cubic(c, r1).clamp(c0.min(c1), c0.max(c1));
            let tmid = 0.5 * (c_r0 + c_r1);

            if c_r0 >= c_r1 {
                solve_cubic_in_interval(c, c_deriv, y, r0, r1)
            } else if tmid > y {
                // At the exact tie `tmid == y` this falls through to the
                // `[r1, 1]` bracket, matching the original implementation.
                solve_cubic_in_interval(c, c_deriv, y, 0.0, r0)
            } else {
                solve_cubic_in_interval(c, c_deriv, y, r1, 1.0)
            }
        }
        _ => solve_cubic_in_interval(c, c_deriv, y, 0.0, 1.0),
    }
}
