//! [`PathAnchor`] — a stateful cursor advancing by distance along a path.
//!
//! Anchors extrapolate an agent's pose between route computations: the host
//! advances the anchor a fixed distance per tick and reads the interpolated
//! pose, without re-running search. The anchor walks precomputed geometry
//! only; the caller is responsible for disabling collision detection while
//! extrapolating.

use waynet_core::geom::Pose;

use crate::path::{Direction, Path};

/// Per-traversal cursor over one path. Created per active traversal and
/// discarded when the traversal ends.
#[derive(Clone, Debug, Default)]
pub struct PathAnchor {
    direction: Direction,
    /// Distance traveled from the traversal start in `direction`.
    distance: f32,
    /// Covering segment in forward point order.
    segment: usize,
    fraction: f32,
    pose: Pose,
    resolved: bool,
}

impl PathAnchor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Distance traveled so far, in the current traversal direction.
    #[inline]
    pub fn distance(&self) -> f32 {
        self.distance
    }

    #[inline]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Place the anchor `distance` along `path` in `direction`, measured
    /// from the traversal start. Fails (returning `false`, state unchanged)
    /// when `distance` is negative or exceeds the total path length.
    pub fn calculate_at_distance(
        &mut self,
        path: &mut Path,
        distance: f32,
        direction: Direction,
    ) -> bool {
        let total = path.length();
        if !(0.0..=total).contains(&distance) {
            return false;
        }
        let along = match direction {
            Direction::Forward => distance,
            Direction::Reverse => total - distance,
        };
        let (segment, fraction) = Self::locate(path, along);
        self.direction = direction;
        self.distance = distance;
        self.segment = segment;
        self.fraction = fraction;
        self.resolve_pose(path);
        self.resolved = true;
        true
    }

    /// Advance the cached distance by `delta` and write the interpolated
    /// pose into `pose`. Clamps at either end of the path, in which case
    /// the terminal pose is written and `false` is returned (traversal
    /// complete). Panics if the anchor was never resolved.
    pub fn extrapolate(
        &mut self,
        path: &mut Path,
        delta: f32,
        direction: Direction,
        pose: &mut Pose,
    ) -> bool {
        assert!(
            self.resolved,
            "anchor must be placed with calculate_at_distance before extrapolating"
        );
        let total = path.length();
        if direction != self.direction {
            // Turning around: traveled distance is re-measured from the
            // other end.
            self.distance = total - self.distance;
            self.direction = direction;
        }
        let advanced = self.distance + delta;
        let clamped = advanced.clamp(0.0, total);
        self.distance = clamped;

        let along = match self.direction {
            Direction::Forward => clamped,
            Direction::Reverse => total - clamped,
        };
        let (segment, fraction) = Self::locate(path, along);
        self.segment = segment;
        self.fraction = fraction;
        self.resolve_pose(path);
        *pose = self.pose;
        advanced == clamped
    }

    /// Last-resolved position. Panics before the first successful
    /// [`PathAnchor::calculate_at_distance`].
    #[inline]
    pub fn position(&self) -> glam::Vec3 {
        self.assert_resolved();
        self.pose.position
    }

    /// Last-resolved up vector. Panics if unresolved.
    #[inline]
    pub fn up(&self) -> glam::Vec3 {
        self.assert_resolved();
        self.pose.up
    }

    /// Last-resolved forward vector, pointing along the traversal
    /// direction. Panics if unresolved.
    #[inline]
    pub fn forward(&self) -> glam::Vec3 {
        self.assert_resolved();
        self.pose.forward
    }

    /// Last-resolved pose. Panics if unresolved.
    #[inline]
    pub fn pose(&self) -> Pose {
        self.assert_resolved();
        self.pose
    }

    #[inline]
    fn assert_resolved(&self) {
        assert!(self.resolved, "anchor read before calculate_at_distance");
    }

    /// Covering segment and fraction for a forward-parameter distance.
    fn locate(path: &mut Path, along: f32) -> (usize, f32) {
        path.precalculate(false);
        let points = path.points();
        let mut segment = points.len() - 2;
        for i in 0..points.len() - 1 {
            if along <= points[i + 1].start_distance(Direction::Forward) {
                segment = i;
                break;
            }
        }
        let start = points[segment].start_distance(Direction::Forward);
        let len = path.segment_length(segment);
        let fraction = if len > 0.0 {
            ((along - start) / len).clamp(0.0, 1.0)
        } else {
            0.0
        };
        (segment, fraction)
    }

    fn resolve_pose(&mut self, path: &mut Path) {
        let mut forward = path.forward(self.segment, self.fraction);
        if self.direction == Direction::Reverse {
            forward = -forward;
        }
        self.pose = Pose {
            position: path.position(self.segment, self.fraction),
            forward,
            up: path.up(self.segment, self.fraction),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::{PathFlags, PathId};
    use crate::waypoint::WaypointId;
    use glam::Vec3;
    use waynet_core::ZoneRef;

    /// Straight two-segment path along +X, 20 units long.
    fn path() -> Path {
        let zone = || ZoneRef::new("plains");
        let mut path = Path::between(
            PathId(1),
            "road",
            PathFlags::NONE,
            (WaypointId(1), Vec3::ZERO, zone(), 1.0),
            (WaypointId(2), Vec3::new(20.0, 0.0, 0.0), zone(), 1.0),
        );
        path.add_point(3, Vec3::new(10.0, 0.0, 0.0), zone());
        path
    }

    #[test]
    fn calculate_locates_segment_and_fraction() {
        let mut path = path();
        let mut anchor = PathAnchor::new();
        assert!(anchor.calculate_at_distance(&mut path, 15.0, Direction::Forward));
        assert_eq!(anchor.position(), Vec3::new(15.0, 0.0, 0.0));
        assert_eq!(anchor.forward(), Vec3::X);
        assert_eq!(anchor.up(), Vec3::Y);
    }

    #[test]
    fn calculate_beyond_length_fails() {
        let mut path = path();
        let mut anchor = PathAnchor::new();
        assert!(!anchor.calculate_at_distance(&mut path, 25.0, Direction::Forward));
        assert!(!anchor.calculate_at_distance(&mut path, -1.0, Direction::Forward));
    }

    #[test]
    fn reverse_measures_from_far_end() {
        let mut path = path();
        let mut anchor = PathAnchor::new();
        assert!(anchor.calculate_at_distance(&mut path, 5.0, Direction::Reverse));
        assert_eq!(anchor.position(), Vec3::new(15.0, 0.0, 0.0));
        assert_eq!(anchor.forward(), -Vec3::X);
    }

    #[test]
    fn extrapolate_advances_and_clamps() {
        let mut path = path();
        let mut anchor = PathAnchor::new();
        let mut pose = Pose::default();
        assert!(anchor.calculate_at_distance(&mut path, 0.0, Direction::Forward));
        assert!(anchor.extrapolate(&mut path, 12.0, Direction::Forward, &mut pose));
        assert_eq!(pose.position, Vec3::new(12.0, 0.0, 0.0));
        assert!((anchor.distance() - 12.0).abs() < 1e-5);
        // Overshooting the end clamps to the terminal pose.
        assert!(!anchor.extrapolate(&mut path, 100.0, Direction::Forward, &mut pose));
        assert_eq!(pose.position, Vec3::new(20.0, 0.0, 0.0));
        assert!((anchor.distance() - 20.0).abs() < 1e-5);
    }

    #[test]
    #[should_panic(expected = "anchor read before calculate_at_distance")]
    fn read_before_resolve_panics() {
        let anchor = PathAnchor::new();
        let _ = anchor.position();
    }
}
