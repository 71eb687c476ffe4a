//! Waypoint navigation graph and pathfinding.
//!
//! This crate models a named navigation graph over a 3D world and answers
//! "where can I go, and what is the shortest valid route":
//!
//! - **Waypoints** ([`Waypoint`]) — named, radius-bounded graph nodes with
//!   tag flags, aliases and outgoing link records.
//! - **Paths** ([`Path`]) — directionally traversable polylines between two
//!   waypoints, with lazy precalculation and O(1) pose interpolation.
//! - **Edges** ([`Edge`]) — directed views over a path, the router's
//!   traversal unit.
//! - **Anchors** ([`PathAnchor`]) — distance-based cursors extrapolating an
//!   agent's pose along a path between route computations.
//! - **Locations** ([`LocationManager`]) — named circles and polygonal
//!   regions for scripted point/region queries, independent of the graph.
//! - **The network** ([`PathNetwork`]) — the aggregate: indexes, groups,
//!   nearest/random spatial queries and Dijkstra routing with injectable
//!   [`RouteFilter`]s.
//!
//! The subsystem is synchronous and single-threaded by contract: routing
//! and mutation take `&mut PathNetwork`, so route computations cannot
//! interleave with each other or with graph edits on the same instance.
//! Hosts needing concurrent routing run one network per worker.
//!
//! Persistence and world geometry are external collaborators: rows and the
//! [`Store`] trait in [`store`], zones and distances behind
//! [`waynet_core::World`].

pub mod anchor;
pub mod edge;
pub mod location;
pub mod network;
pub mod path;
pub mod route;
pub mod store;
pub mod waypoint;

pub use anchor::PathAnchor;
pub use edge::{Edge, EdgeId, EdgeIter};
pub use location::{Location, LocationId, LocationManager, LocationType, LocationTypeId};
pub use network::{NearestPath, NearestPoint, PathNetwork};
pub use path::{Direction, Interpolate, Linear, Path, PathFlags, PathId, PathPoint};
pub use route::{ExcludeFlags, NoFilter, RouteFilter};
pub use store::{
    LocationRow, LocationTypeRow, MemoryStore, PathPointRow, PathRow, Store, WaypointAliasRow,
    WaypointRow,
};
pub use waypoint::{Alias, Link, Waypoint, WaypointFlags, WaypointId};
