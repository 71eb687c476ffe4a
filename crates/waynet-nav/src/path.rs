//! Walkable geometry between two waypoints: [`Path`], [`PathPoint`] and the
//! [`Interpolate`] strategy.
//!
//! A path is an ordered polyline whose first and last points anchor its two
//! endpoint waypoints. Distance and interpolation queries require
//! precalculated data (segment lengths, per-direction cumulative distances,
//! interpolator deltas); precalculation is lazy and is invalidated whenever
//! points are added, removed or moved, so stale cached distances are never
//! served.

use glam::Vec3;

use waynet_core::geom::closest_point_on_segment;
use waynet_core::zone::{World, ZoneId, ZoneRef};

use crate::waypoint::WaypointId;

/// Stable path identity, assigned on creation.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PathId(pub u32);

/// Traversal direction over a path's point sequence.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Direction {
    #[default]
    Forward,
    Reverse,
}

impl Direction {
    #[inline]
    pub fn reversed(self) -> Self {
        match self {
            Direction::Forward => Direction::Reverse,
            Direction::Reverse => Direction::Forward,
        }
    }

    #[inline]
    pub(crate) fn index(self) -> usize {
        match self {
            Direction::Forward => 0,
            Direction::Reverse => 1,
        }
    }
}

// ---------------------------------------------------------------------------
// PathFlags
// ---------------------------------------------------------------------------

/// Path tag set, stored as a bitmask.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PathFlags(pub u32);

impl PathFlags {
    pub const NONE: Self = Self(0);
    /// No reverse edge is created for this path.
    pub const ONE_WAY: Self = Self(1 << 0);
    /// Excluded from idle random wandering.
    pub const NO_WANDER: Self = Self(1 << 1);
    /// Traversal is an instantaneous jump, not a walk.
    pub const TELEPORT: Self = Self(1 << 2);

    #[inline]
    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Parse the comma-separated persistence form, e.g. `"ONEWAY, TELEPORT"`.
    /// Case-insensitive; `None` on an unknown token.
    pub fn parse(s: &str) -> Option<Self> {
        let mut flags = Self::NONE;
        for token in s.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            flags = flags
                | match token.to_ascii_uppercase().as_str() {
                    "ONEWAY" => Self::ONE_WAY,
                    "NOWANDER" => Self::NO_WANDER,
                    "TELEPORT" => Self::TELEPORT,
                    _ => return None,
                };
        }
        Some(flags)
    }
}

impl std::ops::BitOr for PathFlags {
    type Output = Self;
    #[inline]
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl std::fmt::Display for PathFlags {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for (flag, name) in [
            (Self::ONE_WAY, "ONEWAY"),
            (Self::NO_WANDER, "NOWANDER"),
            (Self::TELEPORT, "TELEPORT"),
        ] {
            if self.contains(flag) {
                if !first {
                    f.write_str(", ")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// PathPoint
// ---------------------------------------------------------------------------

/// One vertex of a path.
///
/// `radius` and `start_dist` are derived during precalculation: the radius
/// is lerped between the two endpoint waypoint radii by cumulative distance,
/// and `start_dist[direction]` caches how far along the path the point lies
/// when traversing in that direction.
#[derive(Clone, Debug)]
pub struct PathPoint {
    pub id: u32,
    pos: Vec3,
    pub zone: ZoneRef,
    radius: f32,
    /// Set when this point coincides with a waypoint (endpoints, and
    /// pass-through junctions).
    pub waypoint: Option<WaypointId>,
    start_dist: [f32; 2],
}

impl PathPoint {
    pub fn new(id: u32, pos: Vec3, zone: ZoneRef) -> Self {
        Self {
            id,
            pos,
            zone,
            radius: 0.0,
            waypoint: None,
            start_dist: [0.0; 2],
        }
    }

    #[inline]
    pub fn pos(&self) -> Vec3 {
        self.pos
    }

    /// Arrival tolerance at this point, interpolated from the endpoint
    /// waypoint radii. Valid after precalculation.
    #[inline]
    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Cumulative distance from the path's start in `direction`.
    /// Valid after precalculation.
    #[inline]
    pub fn start_distance(&self, direction: Direction) -> f32 {
        self.start_dist[direction.index()]
    }
}

// ---------------------------------------------------------------------------
// Interpolation strategies
// ---------------------------------------------------------------------------

/// Strategy for resolving a pose at `(segment, fraction)` on a point
/// sequence. `precalculate` is invoked by the owning path whenever the
/// sequence changes; the three readers must be pure.
pub trait Interpolate {
    fn precalculate(&mut self, points: &[PathPoint]);
    fn position(&self, points: &[PathPoint], segment: usize, fraction: f32) -> Vec3;
    fn up(&self, points: &[PathPoint], segment: usize, fraction: f32) -> Vec3;
    fn forward(&self, points: &[PathPoint], segment: usize, fraction: f32) -> Vec3;
}

/// Straight-line interpolation with per-segment precalculated deltas.
#[derive(Default)]
pub struct Linear {
    deltas: Vec<Vec3>,
    dirs: Vec<Vec3>,
}

impl Interpolate for Linear {
    fn precalculate(&mut self, points: &[PathPoint]) {
        self.deltas.clear();
        self.dirs.clear();
        for w in points.windows(2) {
            let delta = w[1].pos - w[0].pos;
            self.deltas.push(delta);
            self.dirs.push(delta.normalize_or(Vec3::Z));
        }
    }

    fn position(&self, points: &[PathPoint], segment: usize, fraction: f32) -> Vec3 {
        points[segment].pos + self.deltas[segment] * fraction
    }

    fn up(&self, _points: &[PathPoint], _segment: usize, _fraction: f32) -> Vec3 {
        Vec3::Y
    }

    fn forward(&self, _points: &[PathPoint], segment: usize, _fraction: f32) -> Vec3 {
        self.dirs[segment]
    }
}

// ---------------------------------------------------------------------------
// Path
// ---------------------------------------------------------------------------

/// An ordered, directionally traversable polyline between exactly two
/// waypoints. The endpoints' anchor points sit at positions `0` and `N-1`.
pub struct Path {
    pub id: PathId,
    pub name: String,
    pub flags: PathFlags,
    start_wp: WaypointId,
    end_wp: WaypointId,
    start_radius: f32,
    end_radius: f32,
    points: Vec<PathPoint>,
    total_dist: f32,
    precalc_valid: bool,
    interp: Box<dyn Interpolate>,
}

impl Path {
    /// Build a path between two endpoint anchors, with linear interpolation.
    pub fn between(
        id: PathId,
        name: impl Into<String>,
        flags: PathFlags,
        start: (WaypointId, Vec3, ZoneRef, f32),
        end: (WaypointId, Vec3, ZoneRef, f32),
    ) -> Self {
        Self::with_interpolator(id, name, flags, start, end, Box::new(Linear::default()))
    }

    /// As [`Path::between`], with an explicit interpolation strategy.
    pub fn with_interpolator(
        id: PathId,
        name: impl Into<String>,
        flags: PathFlags,
        start: (WaypointId, Vec3, ZoneRef, f32),
        end: (WaypointId, Vec3, ZoneRef, f32),
        interp: Box<dyn Interpolate>,
    ) -> Self {
        let mut first = PathPoint::new(0, start.1, start.2);
        first.waypoint = Some(start.0);
        let mut last = PathPoint::new(0, end.1, end.2);
        last.waypoint = Some(end.0);
        Self {
            id,
            name: name.into(),
            flags,
            start_wp: start.0,
            end_wp: end.0,
            start_radius: start.3,
            end_radius: end.3,
            points: vec![first, last],
            total_dist: 0.0,
            precalc_valid: false,
            interp,
        }
    }

    #[inline]
    pub fn start_waypoint(&self) -> WaypointId {
        self.start_wp
    }

    #[inline]
    pub fn end_waypoint(&self) -> WaypointId {
        self.end_wp
    }

    /// The endpoint waypoint from which traversal in `direction` begins.
    #[inline]
    pub fn waypoint_at(&self, direction: Direction) -> WaypointId {
        match direction {
            Direction::Forward => self.start_wp,
            Direction::Reverse => self.end_wp,
        }
    }

    #[inline]
    pub fn points(&self) -> &[PathPoint] {
        &self.points
    }

    #[inline]
    pub fn one_way(&self) -> bool {
        self.flags.contains(PathFlags::ONE_WAY)
    }

    #[inline]
    pub fn no_wander(&self) -> bool {
        self.flags.contains(PathFlags::NO_WANDER)
    }

    #[inline]
    pub fn teleport(&self) -> bool {
        self.flags.contains(PathFlags::TELEPORT)
    }

    // -----------------------------------------------------------------------
    // Point mutation
    // -----------------------------------------------------------------------

    /// Append a point just before the end anchor.
    pub fn add_point(&mut self, id: u32, pos: Vec3, zone: ZoneRef) {
        let index = self.points.len() - 1;
        self.insert_point(index, id, pos, zone);
    }

    /// Insert a point at `index` (between the two endpoint anchors).
    /// Returns `false` when `index` would displace an endpoint.
    pub fn insert_point(&mut self, index: usize, id: u32, pos: Vec3, zone: ZoneRef) -> bool {
        if index == 0 || index >= self.points.len() {
            return false;
        }
        self.points.insert(index, PathPoint::new(id, pos, zone));
        self.precalc_valid = false;
        true
    }

    /// Remove the interior point at `index`. Endpoint anchors cannot be
    /// removed; `None` for those or out-of-range indexes.
    pub fn remove_point(&mut self, index: usize) -> Option<PathPoint> {
        if index == 0 || index >= self.points.len() - 1 {
            return None;
        }
        let removed = self.points.remove(index);
        self.precalc_valid = false;
        Some(removed)
    }

    /// Move the point at `index`. Returns `false` out of range.
    pub fn move_point(&mut self, index: usize, pos: Vec3) -> bool {
        let Some(point) = self.points.get_mut(index) else {
            return false;
        };
        point.pos = pos;
        self.precalc_valid = false;
        true
    }

    /// Mark this point as coinciding with a waypoint (pass-through
    /// junction). Returns `false` out of range.
    pub fn set_point_waypoint(&mut self, index: usize, waypoint: WaypointId) -> bool {
        let Some(point) = self.points.get_mut(index) else {
            return false;
        };
        point.waypoint = Some(waypoint);
        true
    }

    // -----------------------------------------------------------------------
    // Precalculation
    // -----------------------------------------------------------------------

    /// Recompute segment lengths, per-direction cumulative distances,
    /// per-point radii and interpolator data. No-op while valid unless
    /// `force` is set. Queries call this lazily.
    pub fn precalculate(&mut self, force: bool) {
        if self.precalc_valid && !force {
            return;
        }
        assert!(
            self.points.len() >= 2,
            "path '{}' must keep both endpoint anchors",
            self.name
        );

        let forward = Direction::Forward.index();
        let reverse = Direction::Reverse.index();

        let mut total = 0.0;
        self.points[0].start_dist[forward] = 0.0;
        for i in 1..self.points.len() {
            total += self.points[i].pos.distance(self.points[i - 1].pos);
            self.points[i].start_dist[forward] = total;
        }
        self.total_dist = total;

        for point in &mut self.points {
            let along = point.start_dist[forward];
            point.start_dist[reverse] = total - along;
            let t = if total > 0.0 { along / total } else { 0.0 };
            point.radius = self.start_radius + (self.end_radius - self.start_radius) * t;
        }

        self.interp.precalculate(&self.points);
        self.precalc_valid = true;
    }

    #[inline]
    fn ensure_precalculated(&mut self) {
        self.precalculate(false);
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Total path length.
    pub fn length(&mut self) -> f32 {
        self.ensure_precalculated();
        self.total_dist
    }

    /// Length of segment `index` (from point `index` to `index + 1`).
    pub fn segment_length(&mut self, index: usize) -> f32 {
        self.ensure_precalculated();
        let forward = Direction::Forward.index();
        self.points[index + 1].start_dist[forward] - self.points[index].start_dist[forward]
    }

    /// Perpendicular distance from `pos` to the path as a whole.
    ///
    /// Returns `(distance, segment index, fraction in [0, 1])` for the
    /// closest segment whose endpoints both resolve to `zone`, or `None`
    /// when no segment is eligible.
    pub fn distance(
        &mut self,
        world: &impl World,
        pos: Vec3,
        zone: ZoneId,
    ) -> Option<(f32, usize, f32)> {
        self.ensure_precalculated();
        let mut best: Option<(f32, usize, f32)> = None;
        for i in 0..self.points.len() - 1 {
            let (a, b) = (&self.points[i], &self.points[i + 1]);
            if !a.zone.matches(world, zone) || !b.zone.matches(world, zone) {
                continue;
            }
            let (closest, t) = closest_point_on_segment(pos, a.pos, b.pos);
            let d = pos.distance(closest);
            if best.is_none_or(|(bd, _, _)| d < bd) {
                best = Some((d, i, t));
            }
        }
        best
    }

    /// Nearest-vertex distance from `pos` to the path's points.
    ///
    /// `include_ends` controls whether the two endpoint anchors are
    /// eligible. Returns `(distance, point index)`.
    pub fn distance_point(
        &mut self,
        world: &impl World,
        pos: Vec3,
        zone: ZoneId,
        include_ends: bool,
    ) -> Option<(f32, usize)> {
        self.ensure_precalculated();
        let range = if include_ends {
            0..self.points.len()
        } else {
            1..self.points.len() - 1
        };
        let mut best: Option<(f32, usize)> = None;
        for i in range {
            let point = &self.points[i];
            if !point.zone.matches(world, zone) {
                continue;
            }
            let d = pos.distance(point.pos);
            if best.is_none_or(|(bd, _)| d < bd) {
                best = Some((d, i));
            }
        }
        best
    }

    /// Interpolated position at `(segment, fraction)`.
    pub fn position(&mut self, segment: usize, fraction: f32) -> Vec3 {
        self.ensure_precalculated();
        assert!(segment < self.points.len() - 1, "segment out of range");
        self.interp.position(&self.points, segment, fraction)
    }

    /// Interpolated up vector at `(segment, fraction)`.
    pub fn up(&mut self, segment: usize, fraction: f32) -> Vec3 {
        self.ensure_precalculated();
        assert!(segment < self.points.len() - 1, "segment out of range");
        self.interp.up(&self.points, segment, fraction)
    }

    /// Interpolated forward vector at `(segment, fraction)`, in forward
    /// traversal order.
    pub fn forward(&mut self, segment: usize, fraction: f32) -> Vec3 {
        self.ensure_precalculated();
        assert!(segment < self.points.len() - 1, "segment out of range");
        self.interp.forward(&self.points, segment, fraction)
    }
}
