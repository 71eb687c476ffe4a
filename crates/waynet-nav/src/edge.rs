//! Directed traversal units: [`Edge`] and its point cursor [`EdgeIter`].
//!
//! An edge is a thin directed view over one path: forward reads the points
//! front-to-back, reverse back-to-front. A bidirectional connection between
//! two waypoints is two edges over the same path, one in each endpoint's
//! link list.

use crate::path::{Direction, Path, PathId, PathPoint};
use crate::waypoint::WaypointId;

/// Stable edge identity, assigned on creation.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EdgeId(pub u32);

/// A directed waypoint-to-waypoint traversal unit backed by one path.
#[derive(Copy, Clone, Debug)]
pub struct Edge {
    pub id: EdgeId,
    pub path: PathId,
    pub direction: Direction,
}

impl Edge {
    pub fn new(id: EdgeId, path: PathId, direction: Direction) -> Self {
        Self {
            id,
            path,
            direction,
        }
    }

    /// The waypoint this edge departs from.
    pub fn start_waypoint(&self, path: &Path) -> WaypointId {
        debug_assert_eq!(path.id, self.path);
        path.waypoint_at(self.direction)
    }

    /// The waypoint this edge arrives at.
    pub fn end_waypoint(&self, path: &Path) -> WaypointId {
        debug_assert_eq!(path.id, self.path);
        path.waypoint_at(self.direction.reversed())
    }

    /// The path point this edge departs from.
    pub fn start_point<'a>(&self, path: &'a Path) -> &'a PathPoint {
        debug_assert_eq!(path.id, self.path);
        match self.direction {
            Direction::Forward => &path.points()[0],
            Direction::Reverse => path.points().last().expect("path keeps both endpoints"),
        }
    }

    /// The path point this edge arrives at.
    pub fn end_point<'a>(&self, path: &'a Path) -> &'a PathPoint {
        debug_assert_eq!(path.id, self.path);
        match self.direction {
            Direction::Forward => path.points().last().expect("path keeps both endpoints"),
            Direction::Reverse => &path.points()[0],
        }
    }

    #[inline]
    pub fn teleport(&self, path: &Path) -> bool {
        path.teleport()
    }

    #[inline]
    pub fn no_wander(&self, path: &Path) -> bool {
        path.no_wander()
    }

    /// Forward-only cursor over the path's points in this edge's direction.
    pub fn iter<'a>(&self, path: &'a Path) -> EdgeIter<'a> {
        debug_assert_eq!(path.id, self.path);
        match self.direction {
            Direction::Forward => EdgeIter::Forward(path.points().iter()),
            Direction::Reverse => EdgeIter::Reverse(path.points().iter().rev()),
        }
    }
}

/// Iterator over a path's points in edge order.
pub enum EdgeIter<'a> {
    Forward(std::slice::Iter<'a, PathPoint>),
    Reverse(std::iter::Rev<std::slice::Iter<'a, PathPoint>>),
}

impl<'a> Iterator for EdgeIter<'a> {
    type Item = &'a PathPoint;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        match self {
            EdgeIter::Forward(it) => it.next(),
            EdgeIter::Reverse(it) => it.next(),
        }
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        match self {
            EdgeIter::Forward(it) => it.size_hint(),
            EdgeIter::Reverse(it) => it.size_hint(),
        }
    }
}

impl ExactSizeIterator for EdgeIter<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::PathFlags;
    use glam::Vec3;
    use waynet_core::ZoneRef;

    fn path() -> Path {
        let zone = || ZoneRef::new("plains");
        let mut path = Path::between(
            PathId(1),
            "road",
            PathFlags::TELEPORT,
            (WaypointId(1), Vec3::ZERO, zone(), 1.0),
            (WaypointId(2), Vec3::new(20.0, 0.0, 0.0), zone(), 1.0),
        );
        path.add_point(3, Vec3::new(10.0, 0.0, 0.0), zone());
        path
    }

    #[test]
    fn endpoints_resolve_by_direction() {
        let path = path();
        let fwd = Edge::new(EdgeId(1), PathId(1), Direction::Forward);
        let rev = Edge::new(EdgeId(2), PathId(1), Direction::Reverse);
        assert_eq!(fwd.start_waypoint(&path), WaypointId(1));
        assert_eq!(fwd.end_waypoint(&path), WaypointId(2));
        assert_eq!(rev.start_waypoint(&path), WaypointId(2));
        assert_eq!(rev.end_waypoint(&path), WaypointId(1));
        assert_eq!(fwd.start_point(&path).pos(), rev.end_point(&path).pos());
    }

    #[test]
    fn iter_order_follows_direction() {
        let path = path();
        let fwd = Edge::new(EdgeId(1), PathId(1), Direction::Forward);
        let rev = Edge::new(EdgeId(2), PathId(1), Direction::Reverse);
        let forward: Vec<f32> = fwd.iter(&path).map(|p| p.pos().x).collect();
        let reverse: Vec<f32> = rev.iter(&path).map(|p| p.pos().x).collect();
        assert_eq!(forward, vec![0.0, 10.0, 20.0]);
        assert_eq!(reverse, vec![20.0, 10.0, 0.0]);
        assert_eq!(fwd.iter(&path).len(), 3);
    }

    #[test]
    fn flag_delegation() {
        let path = path();
        let edge = Edge::new(EdgeId(1), PathId(1), Direction::Forward);
        assert!(edge.teleport(&path));
        assert!(!edge.no_wander(&path));
    }
}
