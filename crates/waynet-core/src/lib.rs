//! **waynet-core** — world geometry and zone types for the *waynet*
//! navigation toolkit.
//!
//! This crate provides the foundational types consumed by `waynet-nav`:
//! segment geometry and interpolated poses, polygonal areas with cached
//! bounds, and the weak zone identities through which the host engine's
//! spatial containers are referenced.

pub mod geom;
pub mod polygon;
pub mod zone;

pub use geom::{Pose, closest_point_on_segment, distance_point_segment};
pub use polygon::{Aabb, Polygon};
pub use zone::{FlatWorld, World, ZoneId, ZoneRef};
