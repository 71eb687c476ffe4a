//! Segment geometry and the [`Pose`] output type.

use glam::Vec3;

/// Closest point on segment `a`-`b` to `p`, plus the clamped parameter
/// `t` in `[0, 1]` (`0` = at `a`, `1` = at `b`).
///
/// A degenerate (zero-length) segment resolves to `a` with `t = 0`.
pub fn closest_point_on_segment(p: Vec3, a: Vec3, b: Vec3) -> (Vec3, f32) {
    let ab = b - a;
    let ab_len_sq = ab.length_squared();
    if ab_len_sq < f32::EPSILON {
        return (a, 0.0);
    }
    let t = ((p - a).dot(ab) / ab_len_sq).clamp(0.0, 1.0);
    (a + ab * t, t)
}

/// Distance from `p` to the segment `a`-`b`.
#[inline]
pub fn distance_point_segment(p: Vec3, a: Vec3, b: Vec3) -> f32 {
    let (q, _) = closest_point_on_segment(p, a, b);
    (p - q).length()
}

// ---------------------------------------------------------------------------
// Pose
// ---------------------------------------------------------------------------

/// An interpolated position and orientation along a path.
///
/// Caller-owned output of anchor extrapolation; `forward` and `up` are unit
/// vectors. Y is up.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Pose {
    pub position: Vec3,
    pub forward: Vec3,
    pub up: Vec3,
}

impl Default for Pose {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            forward: Vec3::Z,
            up: Vec3::Y,
        }
    }
}

impl Pose {
    /// Heading about the Y axis in radians, derived from `forward`.
    #[inline]
    pub fn rotation_angle(&self) -> f32 {
        self.forward.x.atan2(self.forward.z)
    }
}
