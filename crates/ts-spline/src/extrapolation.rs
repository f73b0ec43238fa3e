//! Extrapolation modes (§3.4) and the frozen enum byte values referenced
//! by the persistence layout (§6).

/// How a spline's value behaves before its first knot or after its last.
///
/// Byte values are frozen per §6: new values are appended, existing
/// values are never reassigned. Only `Held` and `Linear` are implemented
/// by the evaluator (§4.4.3); the loop modes are accepted as a stored
/// setting but degrade to `Held` at evaluation time — see
/// [`ExtrapMode::is_implemented`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExtrapMode {
    /// No extrapolation; value block (held at nothing, caller-defined).
    ValueBlock = 0,
    /// Hold the edge knot's value.
    Held = 1,
    /// Extrapolate along the edge knot's (or segment's) tangent slope.
    Linear = 2,
    /// Extrapolate along a caller-specified slope.
    Sloped = 3,
    /// Repeat the authored range's knots periodically.
    LoopRepeat = 4,
    /// Repeat the authored range, resetting to the first value each loop.
    LoopReset = 5,
    /// Repeat the authored range, reflecting direction each loop.
    LoopOscillate = 6,
}

impl ExtrapMode {
    /// `true` for the modes the evaluator implements directly (§4.4.3);
    /// everything else (loop modes, value-block) degrades to `Held`.
    pub fn is_implemented(self) -> bool {
        matches!(self, ExtrapMode::Held | ExtrapMode::Linear)
    }
}

/// Curve type for a Bezier-typed knot's stored tangent shape, per the
/// persistence layout reference (§6). Not otherwise used by this core;
/// all Bezier segments built here are cubic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CurveType {
    /// Cubic Bezier.
    Bezier = 0,
    /// Cubic Hermite.
    Hermite = 1,
}

/// Anti-regression clamping mode referenced by the persistence layout
/// (§6). Not implemented by this core's evaluation path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AntiRegressionMode {
    /// No anti-regression clamping.
    None,
    /// Contain overshoot within the segment's value range.
    Contain,
    /// Preserve the ratio of tangent lengths while containing overshoot.
    KeepRatio,
    /// Clamp overshoot to the starting value.
    KeepStart,
}
