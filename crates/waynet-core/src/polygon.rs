//! Polygonal areas: [`Polygon`] and its cached [`Aabb`].
//!
//! Regions are horizontal: containment and bounding work on the XZ plane
//! (Y is up). A `Polygon` is an ordered ring of at least three vertices,
//! closed implicitly from the last vertex back to the first.

use glam::{Vec2, Vec3};
use rand::Rng;
use rand::RngExt;

/// Sampling attempts before [`Polygon::random_point`] falls back to the
/// centroid. Bounds the rejection loop for near-zero-area rings.
const MAX_SAMPLE_ATTEMPTS: u32 = 64;

// ---------------------------------------------------------------------------
// Aabb
// ---------------------------------------------------------------------------

/// Axis-aligned bounding box on the XZ plane (`min.y`/`max.y` hold Z).
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    /// Whether the XZ projection of `pos` lies inside the box.
    #[inline]
    pub fn contains(&self, pos: Vec3) -> bool {
        pos.x >= self.min.x && pos.x <= self.max.x && pos.z >= self.min.y && pos.z <= self.max.y
    }
}

// ---------------------------------------------------------------------------
// Polygon
// ---------------------------------------------------------------------------

/// A closed polygonal ring with a cached bounding box.
#[derive(Clone, Debug)]
pub struct Polygon {
    points: Vec<Vec3>,
    bounds: Aabb,
}

impl Polygon {
    /// Build a polygon from an ordered ring of vertices.
    ///
    /// Returns `None` for fewer than three vertices.
    pub fn new(points: Vec<Vec3>) -> Option<Self> {
        if points.len() < 3 {
            return None;
        }
        let bounds = Self::compute_bounds(&points);
        Some(Self { points, bounds })
    }

    fn compute_bounds(points: &[Vec3]) -> Aabb {
        let mut min = Vec2::new(f32::INFINITY, f32::INFINITY);
        let mut max = Vec2::new(f32::NEG_INFINITY, f32::NEG_INFINITY);
        for p in points {
            min = min.min(Vec2::new(p.x, p.z));
            max = max.max(Vec2::new(p.x, p.z));
        }
        Aabb { min, max }
    }

    /// The ring vertices, in order.
    #[inline]
    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    /// The cached XZ bounding box.
    #[inline]
    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    /// Even-odd ray-cast containment test on the XZ plane, short-circuited
    /// by the bounding box.
    pub fn contains(&self, pos: Vec3) -> bool {
        if !self.bounds.contains(pos) {
            return false;
        }
        let mut inside = false;
        let mut j = self.points.len() - 1;
        for i in 0..self.points.len() {
            let (xi, zi) = (self.points[i].x, self.points[i].z);
            let (xj, zj) = (self.points[j].x, self.points[j].z);
            if (zi > pos.z) != (zj > pos.z)
                && pos.x < (xj - xi) * (pos.z - zi) / (zj - zi) + xi
            {
                inside = !inside;
            }
            j = i;
        }
        inside
    }

    /// Vertex average. Lies inside any convex ring.
    pub fn centroid(&self) -> Vec3 {
        let sum: Vec3 = self.points.iter().copied().sum();
        sum / self.points.len() as f32
    }

    /// A uniformly distributed point inside the ring.
    ///
    /// Rejection-samples the bounding box; after [`MAX_SAMPLE_ATTEMPTS`]
    /// misses the centroid is returned so degenerate rings still terminate.
    /// Y is taken from the centroid.
    pub fn random_point(&self, rng: &mut impl Rng) -> Vec3 {
        let centroid = self.centroid();
        for _ in 0..MAX_SAMPLE_ATTEMPTS {
            let x = rng.random_range(self.bounds.min.x..=self.bounds.max.x);
            let z = rng.random_range(self.bounds.min.y..=self.bounds.max.y);
            let candidate = Vec3::new(x, centroid.y, z);
            if self.contains(candidate) {
                return candidate;
            }
        }
        centroid
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Polygon {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.points.serialize(serializer)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Polygon {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let points = Vec::<Vec3>::deserialize(deserializer)?;
        Polygon::new(points)
            .ok_or_else(|| serde::de::Error::custom("polygon needs at least three vertices"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Polygon {
        Polygon::new(vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(10.0, 0.0, 0.0),
            Vec3::new(10.0, 0.0, 10.0),
            Vec3::new(0.0, 0.0, 10.0),
        ])
        .unwrap()
    }

    #[test]
    fn too_few_vertices_rejected() {
        assert!(Polygon::new(vec![Vec3::ZERO, Vec3::X]).is_none());
    }

    #[test]
    fn centroid_of_convex_ring_is_inside() {
        let poly = square();
        assert!(poly.contains(poly.centroid()));
    }

    #[test]
    fn far_outside_bounds_is_outside() {
        let poly = square();
        assert!(!poly.contains(Vec3::new(100.0, 0.0, 100.0)));
        assert!(!poly.contains(Vec3::new(-1.0, 0.0, 5.0)));
    }

    #[test]
    fn containment_ignores_height() {
        let poly = square();
        assert!(poly.contains(Vec3::new(5.0, 42.0, 5.0)));
    }

    #[test]
    fn concave_ring_notch_is_outside() {
        // U shape: the notch between the prongs is outside.
        let poly = Polygon::new(vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(10.0, 0.0, 0.0),
            Vec3::new(10.0, 0.0, 10.0),
            Vec3::new(6.0, 0.0, 10.0),
            Vec3::new(6.0, 0.0, 4.0),
            Vec3::new(4.0, 0.0, 4.0),
            Vec3::new(4.0, 0.0, 10.0),
            Vec3::new(0.0, 0.0, 10.0),
        ])
        .unwrap();
        assert!(!poly.contains(Vec3::new(5.0, 0.0, 8.0)));
        assert!(poly.contains(Vec3::new(2.0, 0.0, 8.0)));
    }

    #[test]
    fn random_points_land_inside() {
        let poly = square();
        let mut rng = rand::rng();
        for _ in 0..32 {
            let p = poly.random_point(&mut rng);
            assert!(poly.contains(p));
        }
    }

    #[test]
    fn degenerate_ring_falls_back_to_centroid() {
        // Collinear ring has zero area; sampling must still terminate.
        let poly = Polygon::new(vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(5.0, 0.0, 0.0),
            Vec3::new(10.0, 0.0, 0.0),
        ])
        .unwrap();
        let mut rng = rand::rng();
        let p = poly.random_point(&mut rng);
        assert_eq!(p, poly.centroid());
    }
}

#[cfg(all(test, feature = "serde"))]
mod serde_tests {
    use super::*;

    #[test]
    fn polygon_round_trip_recomputes_bounds() {
        let poly = Polygon::new(vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(10.0, 0.0, 0.0),
            Vec3::new(10.0, 0.0, 10.0),
        ])
        .unwrap();
        let json = serde_json::to_string(&poly).unwrap();
        let back: Polygon = serde_json::from_str(&json).unwrap();
        assert_eq!(back.points(), poly.points());
        assert_eq!(back.bounds(), poly.bounds());
        assert!(back.contains(Vec3::new(8.0, 0.0, 2.0)));
    }

    #[test]
    fn short_ring_rejected() {
        let json = "[[0.0,0.0,0.0],[1.0,0.0,0.0]]";
        assert!(serde_json::from_str::<Polygon>(json).is_err());
    }
}
