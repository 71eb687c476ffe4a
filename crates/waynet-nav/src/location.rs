//! Named areas independent of the routing graph: [`Location`],
//! [`LocationType`] and the owning [`LocationManager`].
//!
//! A location is either a circle (a point with a radius, used for distance
//! queries and random spots) or a region (a polygonal boundary, used for
//! containment). Regions arrive from persistence as chains of vertex rows;
//! malformed chains are rejected at load, never at query time.

use std::collections::{HashMap, HashSet};

use glam::Vec3;
use rand::Rng;
use rand::RngExt;

use waynet_core::polygon::Polygon;
use waynet_core::zone::{World, ZoneId, ZoneRef};

use crate::store::{LocationRow, LocationTypeRow, Store};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LocationId(pub u32);

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LocationTypeId(pub u32);

// ---------------------------------------------------------------------------
// Location
// ---------------------------------------------------------------------------

/// A named circular or polygonal area.
#[derive(Clone, Debug)]
pub struct Location {
    pub id: LocationId,
    pub type_id: LocationTypeId,
    pub name: String,
    /// Circle center, or region centroid.
    pub pos: Vec3,
    pub rotation_angle: f32,
    pub radius: f32,
    pub zone: ZoneRef,
    /// Set for regions; `None` for plain circles.
    pub boundary: Option<Polygon>,
}

impl Location {
    #[inline]
    pub fn is_region(&self) -> bool {
        self.boundary.is_some()
    }

    /// Containment test. Circles are not used for containment (only for
    /// distance), so this is always `false` for them; regions run the
    /// polygon test after a zone match.
    pub fn check_within_bounds(&self, world: &impl World, pos: Vec3, zone: ZoneId) -> bool {
        let Some(boundary) = &self.boundary else {
            return false;
        };
        self.zone.matches(world, zone) && boundary.contains(pos)
    }

    /// A uniformly distributed position inside this location: within the
    /// radius for circles, inside the boundary for regions.
    pub fn random_position(&self, rng: &mut impl Rng) -> Vec3 {
        match &self.boundary {
            Some(boundary) => boundary.random_point(rng),
            None => {
                // Uniform over the disc: radius scales with sqrt.
                let r = self.radius * rng.random_range(0.0..=1.0f32).sqrt();
                let theta = rng.random_range(0.0..std::f32::consts::TAU);
                self.pos + Vec3::new(r * theta.cos(), 0.0, r * theta.sin())
            }
        }
    }

    /// Distance from a zone-qualified position to this location, through
    /// the world collaborator. `None` when unreachable (stale zone, or the
    /// world reports no crossing).
    pub fn distance_to(&self, world: &impl World, pos: Vec3, zone: ZoneId) -> Option<f32> {
        let my_zone = self.zone.resolve(world)?;
        world.distance(self.pos, my_zone, pos, zone)
    }
}

/// A named category of locations.
#[derive(Clone, Debug)]
pub struct LocationType {
    pub id: LocationTypeId,
    pub name: String,
    pub locations: Vec<LocationId>,
}

// ---------------------------------------------------------------------------
// LocationManager
// ---------------------------------------------------------------------------

/// Owner and index of all locations and location types.
#[derive(Default)]
pub struct LocationManager {
    locations: Vec<Location>,
    types: Vec<LocationType>,
    loc_by_id: HashMap<LocationId, usize>,
    loc_by_name: HashMap<String, usize>,
    type_by_id: HashMap<LocationTypeId, usize>,
    type_by_name: HashMap<String, usize>,
    next_loc_id: u32,
    next_type_id: u32,
}

impl LocationManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bulk-load from persistence rows.
    ///
    /// Structural errors are recovered locally: rows referencing an unknown
    /// type, duplicate ids/names, and malformed region chains (fewer than
    /// three vertices, broken or unclosed predecessor links, mixed types)
    /// are logged and dropped; everything else still loads.
    pub fn load(type_rows: &[LocationTypeRow], loc_rows: &[LocationRow]) -> Self {
        let mut mgr = Self::new();

        for row in type_rows {
            let id = LocationTypeId(row.id);
            if mgr.type_by_id.contains_key(&id) || mgr.type_by_name.contains_key(&row.name) {
                log::warn!("duplicate location type {} '{}', dropped", row.id, row.name);
                continue;
            }
            mgr.push_type(LocationType {
                id,
                name: row.name.clone(),
                locations: Vec::new(),
            });
        }

        let (plain, members): (Vec<&LocationRow>, Vec<&LocationRow>) =
            loc_rows.iter().partition(|r| r.prev_in_region.is_none());

        for row in plain {
            match mgr.location_from_row(row, None) {
                Some(loc) => mgr.push_location(loc),
                None => continue,
            }
        }

        mgr.load_regions(&members);
        mgr.next_loc_id = mgr.locations.iter().map(|l| l.id.0 + 1).max().unwrap_or(1);
        mgr.next_type_id = mgr.types.iter().map(|t| t.id.0 + 1).max().unwrap_or(1);
        mgr
    }

    /// Reassemble region vertex chains into polygonal locations.
    fn load_regions(&mut self, members: &[&LocationRow]) {
        let by_id: HashMap<u32, &LocationRow> = members.iter().map(|r| (r.id, *r)).collect();
        let mut consumed: HashSet<u32> = HashSet::new();

        for row in members {
            if consumed.contains(&row.id) {
                continue;
            }
            // Walk the predecessor chain until it closes on the start row.
            let mut ring = vec![*row];
            let mut broken = false;
            let mut cur = row.prev_in_region;
            loop {
                let Some(prev_id) = cur else {
                    broken = true;
                    break;
                };
                if prev_id == row.id {
                    break;
                }
                match by_id.get(&prev_id) {
                    Some(&prev) if !consumed.contains(&prev_id) && ring.len() <= members.len() => {
                        ring.push(prev);
                        cur = prev.prev_in_region;
                    }
                    _ => {
                        broken = true;
                        break;
                    }
                }
            }
            for r in &ring {
                consumed.insert(r.id);
            }
            if broken || ring.len() < 3 {
                log::warn!(
                    "region '{}' has a malformed vertex chain ({} rows), dropped",
                    row.name,
                    ring.len()
                );
                continue;
            }
            if ring.iter().any(|r| r.type_id != row.type_id || r.zone != row.zone) {
                log::warn!("region '{}' mixes types or zones, dropped", row.name);
                continue;
            }
            // Predecessor walking visits the ring backwards.
            ring.reverse();
            let polygon = Polygon::new(ring.iter().map(|r| r.pos()).collect())
                .expect("ring length checked above");
            let head = ring
                .iter()
                .copied()
                .min_by_key(|r| r.id)
                .expect("ring is non-empty");
            if let Some(mut loc) = self.location_from_row(head, Some(polygon)) {
                loc.pos = loc.boundary.as_ref().expect("region has a boundary").centroid();
                self.push_location(loc);
            }
        }
    }

    /// Validate one row against the type and name indexes.
    fn location_from_row(&self, row: &LocationRow, boundary: Option<Polygon>) -> Option<Location> {
        let type_id = LocationTypeId(row.type_id);
        if !self.type_by_id.contains_key(&type_id) {
            log::warn!(
                "location {} '{}' references unknown type {}, dropped",
                row.id,
                row.name,
                row.type_id
            );
            return None;
        }
        let id = LocationId(row.id);
        if self.loc_by_id.contains_key(&id) || self.loc_by_name.contains_key(&row.name) {
            log::warn!("duplicate location {} '{}', dropped", row.id, row.name);
            return None;
        }
        Some(Location {
            id,
            type_id,
            name: row.name.clone(),
            pos: row.pos(),
            rotation_angle: row.rotation_angle,
            radius: row.radius,
            zone: ZoneRef::new(row.zone.clone()),
            boundary,
        })
    }

    fn push_type(&mut self, ty: LocationType) {
        self.type_by_id.insert(ty.id, self.types.len());
        self.type_by_name.insert(ty.name.clone(), self.types.len());
        self.types.push(ty);
    }

    fn push_location(&mut self, loc: Location) {
        let index = self.locations.len();
        self.loc_by_id.insert(loc.id, index);
        self.loc_by_name.insert(loc.name.clone(), index);
        if let Some(&ti) = self.type_by_id.get(&loc.type_id) {
            self.types[ti].locations.push(loc.id);
        }
        self.locations.push(loc);
    }

    fn rebuild_indexes(&mut self) {
        self.loc_by_id.clear();
        self.loc_by_name.clear();
        for (i, loc) in self.locations.iter().enumerate() {
            self.loc_by_id.insert(loc.id, i);
            self.loc_by_name.insert(loc.name.clone(), i);
        }
        self.type_by_id.clear();
        self.type_by_name.clear();
        for (i, ty) in self.types.iter().enumerate() {
            self.type_by_id.insert(ty.id, i);
            self.type_by_name.insert(ty.name.clone(), i);
        }
    }

    // -----------------------------------------------------------------------
    // Lookup
    // -----------------------------------------------------------------------

    pub fn location(&self, id: LocationId) -> Option<&Location> {
        self.loc_by_id.get(&id).map(|&i| &self.locations[i])
    }

    pub fn find_location(&self, name: &str) -> Option<&Location> {
        self.loc_by_name.get(name).map(|&i| &self.locations[i])
    }

    pub fn location_type(&self, name: &str) -> Option<&LocationType> {
        self.type_by_name.get(name).map(|&i| &self.types[i])
    }

    pub fn locations(&self) -> impl Iterator<Item = &Location> {
        self.locations.iter()
    }

    /// Members of the named type, in registration order.
    pub fn locations_of_type<'a>(
        &'a self,
        type_name: &str,
    ) -> impl Iterator<Item = &'a Location> {
        let members: &[LocationId] = self
            .location_type(type_name)
            .map(|t| t.locations.as_slice())
            .unwrap_or(&[]);
        members.iter().filter_map(|id| self.location(*id))
    }

    /// All locations whose zone currently resolves to `zone`.
    pub fn locations_in_zone<'a>(
        &'a self,
        world: &'a impl World,
        zone: ZoneId,
    ) -> impl Iterator<Item = &'a Location> {
        self.locations
            .iter()
            .filter(move |l| l.zone.matches(world, zone))
    }

    // -----------------------------------------------------------------------
    // Spatial queries
    // -----------------------------------------------------------------------

    /// Nearest location by raw distance. `range` of `None` is unbounded.
    pub fn nearest_location(
        &self,
        world: &impl World,
        pos: Vec3,
        zone: ZoneId,
        range: Option<f32>,
    ) -> Option<(&Location, f32)> {
        Self::nearest_of(self.locations.iter(), world, pos, zone, range)
    }

    /// Nearest location of the named type.
    pub fn nearest_of_type(
        &self,
        world: &impl World,
        type_name: &str,
        pos: Vec3,
        zone: ZoneId,
        range: Option<f32>,
    ) -> Option<(&Location, f32)> {
        Self::nearest_of(self.locations_of_type(type_name), world, pos, zone, range)
    }

    fn nearest_of<'a>(
        candidates: impl Iterator<Item = &'a Location>,
        world: &impl World,
        pos: Vec3,
        zone: ZoneId,
        range: Option<f32>,
    ) -> Option<(&'a Location, f32)> {
        let mut best: Option<(&Location, f32)> = None;
        for loc in candidates {
            let Some(d) = loc.distance_to(world, pos, zone) else {
                continue;
            };
            if range.is_some_and(|r| d > r) {
                continue;
            }
            if best.is_none_or(|(_, bd)| d < bd) {
                best = Some((loc, d));
            }
        }
        best
    }

    /// Uniformly chosen location of the named type within `range` — every
    /// candidate inside the range is equally likely, not distance-weighted.
    pub fn random_of_type_within_range(
        &self,
        world: &impl World,
        rng: &mut impl Rng,
        type_name: &str,
        pos: Vec3,
        zone: ZoneId,
        range: Option<f32>,
    ) -> Option<&Location> {
        let candidates: Vec<&Location> = self
            .locations_of_type(type_name)
            .filter(|loc| {
                loc.distance_to(world, pos, zone)
                    .is_some_and(|d| range.is_none_or(|r| d <= r))
            })
            .collect();
        if candidates.is_empty() {
            return None;
        }
        Some(candidates[rng.random_range(0..candidates.len())])
    }

    // -----------------------------------------------------------------------
    // Mutation
    // -----------------------------------------------------------------------

    /// Register a new location type in memory. `None` if the name is taken.
    pub fn create_location_type(&mut self, name: impl Into<String>) -> Option<LocationTypeId> {
        let name = name.into();
        if self.type_by_name.contains_key(&name) {
            return None;
        }
        let id = LocationTypeId(self.next_type_id);
        self.next_type_id += 1;
        self.push_type(LocationType {
            id,
            name,
            locations: Vec::new(),
        });
        Some(id)
    }

    /// As [`Self::create_location_type`], persisting through `store` first.
    pub fn create_location_type_in<S: Store>(
        &mut self,
        store: &mut S,
        name: &str,
    ) -> Result<Option<LocationTypeId>, S::Error> {
        if self.type_by_name.contains_key(name) {
            return Ok(None);
        }
        let id = LocationTypeId(self.next_type_id);
        store.save_location_type(&LocationTypeRow {
            id: id.0,
            name: name.to_string(),
        })?;
        Ok(self.create_location_type(name))
    }

    /// Register a new circle location in memory. `None` when the type is
    /// unknown or the name is taken.
    pub fn create_location(
        &mut self,
        type_name: &str,
        name: impl Into<String>,
        pos: Vec3,
        zone: impl Into<String>,
        radius: f32,
        rotation_angle: f32,
    ) -> Option<LocationId> {
        let name = name.into();
        let type_id = self.location_type(type_name)?.id;
        if self.loc_by_name.contains_key(&name) {
            return None;
        }
        let id = LocationId(self.next_loc_id);
        self.next_loc_id += 1;
        self.push_location(Location {
            id,
            type_id,
            name,
            pos,
            rotation_angle,
            radius,
            zone: ZoneRef::new(zone.into()),
            boundary: None,
        });
        Some(id)
    }

    /// As [`Self::create_location`], persisting through `store` first.
    #[allow(clippy::too_many_arguments)]
    pub fn create_location_in<S: Store>(
        &mut self,
        store: &mut S,
        type_name: &str,
        name: &str,
        pos: Vec3,
        zone: &str,
        radius: f32,
        rotation_angle: f32,
    ) -> Result<Option<LocationId>, S::Error> {
        let Some(ty) = self.location_type(type_name) else {
            return Ok(None);
        };
        if self.loc_by_name.contains_key(name) {
            return Ok(None);
        }
        store.save_location(&LocationRow {
            id: self.next_loc_id,
            type_id: ty.id.0,
            name: name.to_string(),
            x: pos.x,
            y: pos.y,
            z: pos.z,
            rotation_angle,
            radius,
            zone: zone.to_string(),
            prev_in_region: None,
        })?;
        Ok(self.create_location(type_name, name, pos, zone, radius, rotation_angle))
    }

    /// Register a new polygonal region in memory. `None` when the type is
    /// unknown, the name is taken, or `points` has fewer than three
    /// vertices.
    pub fn create_region(
        &mut self,
        type_name: &str,
        name: impl Into<String>,
        points: Vec<Vec3>,
        zone: impl Into<String>,
    ) -> Option<LocationId> {
        let name = name.into();
        let type_id = self.location_type(type_name)?.id;
        if self.loc_by_name.contains_key(&name) {
            return None;
        }
        let polygon = Polygon::new(points)?;
        let id = LocationId(self.next_loc_id);
        self.next_loc_id += 1;
        self.push_location(Location {
            id,
            type_id,
            name,
            pos: polygon.centroid(),
            rotation_angle: 0.0,
            radius: 0.0,
            zone: ZoneRef::new(zone.into()),
            boundary: Some(polygon),
        });
        Some(id)
    }

    /// Remove the named type and every location of that type. Returns
    /// `false` when no such type exists.
    pub fn delete_location_type(&mut self, name: &str) -> bool {
        let Some(&index) = self.type_by_name.get(name) else {
            return false;
        };
        let type_id = self.types[index].id;
        self.types.remove(index);
        self.locations.retain(|l| l.type_id != type_id);
        self.rebuild_indexes();
        true
    }

    /// As [`Self::delete_location_type`], persisting through `store` first.
    pub fn delete_location_type_in<S: Store>(
        &mut self,
        store: &mut S,
        name: &str,
    ) -> Result<bool, S::Error> {
        let Some(ty) = self.location_type(name) else {
            return Ok(false);
        };
        store.delete_location_type(ty.id.0)?;
        Ok(self.delete_location_type(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use waynet_core::FlatWorld;

    fn type_rows() -> Vec<LocationTypeRow> {
        vec![
            LocationTypeRow {
                id: 1,
                name: "camp".into(),
            },
            LocationTypeRow {
                id: 2,
                name: "field".into(),
            },
        ]
    }

    fn circle_row(id: u32, name: &str, x: f32, z: f32) -> LocationRow {
        LocationRow {
            id,
            type_id: 1,
            name: name.into(),
            x,
            y: 0.0,
            z,
            rotation_angle: 0.0,
            radius: 5.0,
            zone: "plains".into(),
            prev_in_region: None,
        }
    }

    fn region_vertex(id: u32, prev: u32, x: f32, z: f32) -> LocationRow {
        LocationRow {
            id,
            type_id: 2,
            name: "meadow".into(),
            x,
            y: 0.0,
            z,
            rotation_angle: 0.0,
            radius: 0.0,
            zone: "plains".into(),
            prev_in_region: Some(prev),
        }
    }

    /// Square region from rows 10..=13, chained 10 <- 11 <- 12 <- 13 <- 10.
    fn square_rows() -> Vec<LocationRow> {
        vec![
            region_vertex(10, 13, 0.0, 0.0),
            region_vertex(11, 10, 10.0, 0.0),
            region_vertex(12, 11, 10.0, 10.0),
            region_vertex(13, 12, 0.0, 10.0),
        ]
    }

    #[test]
    fn loads_region_from_closed_chain() {
        let mgr = LocationManager::load(&type_rows(), &square_rows());
        let region = mgr.find_location("meadow").unwrap();
        assert!(region.is_region());
        assert_eq!(region.id, LocationId(10));
        let mut world = FlatWorld::new();
        let zone = world.add_zone("plains");
        assert!(region.check_within_bounds(&world, Vec3::new(5.0, 0.0, 5.0), zone));
        assert!(!region.check_within_bounds(&world, Vec3::new(50.0, 0.0, 5.0), zone));
    }

    #[test]
    fn malformed_region_dropped_rest_loads() {
        // Chain that never closes: 20 <- 21 <- missing row 99.
        let mut rows = vec![
            region_vertex(20, 99, 0.0, 0.0),
            region_vertex(21, 20, 5.0, 0.0),
            circle_row(1, "north camp", 0.0, 0.0),
        ];
        rows[1].name = "meadow2".into();
        let mgr = LocationManager::load(&type_rows(), &rows);
        assert!(mgr.find_location("meadow").is_none());
        assert!(mgr.find_location("north camp").is_some());
        assert_eq!(mgr.locations().count(), 1);
    }

    #[test]
    fn two_vertex_region_rejected() {
        let rows = vec![region_vertex(30, 31, 0.0, 0.0), region_vertex(31, 30, 5.0, 0.0)];
        let mgr = LocationManager::load(&type_rows(), &rows);
        assert_eq!(mgr.locations().count(), 0);
    }

    #[test]
    fn unknown_type_dropped() {
        let mut row = circle_row(1, "lost", 0.0, 0.0);
        row.type_id = 42;
        let mgr = LocationManager::load(&type_rows(), &[row]);
        assert_eq!(mgr.locations().count(), 0);
    }

    #[test]
    fn circle_is_not_used_for_containment() {
        let mgr = LocationManager::load(&type_rows(), &[circle_row(1, "north camp", 0.0, 0.0)]);
        let mut world = FlatWorld::new();
        let zone = world.add_zone("plains");
        let camp = mgr.find_location("north camp").unwrap();
        assert!(!camp.check_within_bounds(&world, Vec3::ZERO, zone));
    }

    #[test]
    fn circle_random_position_stays_in_radius() {
        let mgr = LocationManager::load(&type_rows(), &[circle_row(1, "north camp", 3.0, 4.0)]);
        let camp = mgr.find_location("north camp").unwrap();
        let mut rng = rand::rng();
        for _ in 0..32 {
            let p = camp.random_position(&mut rng);
            assert!(camp.pos.distance(p) <= camp.radius + 1e-4);
        }
    }

    #[test]
    fn nearest_respects_range_and_type() {
        let rows = vec![
            circle_row(1, "near camp", 0.0, 0.0),
            circle_row(2, "far camp", 100.0, 0.0),
        ];
        let mgr = LocationManager::load(&type_rows(), &rows);
        let mut world = FlatWorld::new();
        let zone = world.add_zone("plains");
        let probe = Vec3::new(10.0, 0.0, 0.0);

        let (loc, d) = mgr.nearest_location(&world, probe, zone, None).unwrap();
        assert_eq!(loc.name, "near camp");
        assert!((d - 10.0).abs() < 1e-4);

        // Range excludes everything.
        assert!(mgr.nearest_location(&world, probe, zone, Some(5.0)).is_none());

        let (loc, _) = mgr
            .nearest_of_type(&world, "camp", probe, zone, Some(200.0))
            .unwrap();
        assert_eq!(loc.name, "near camp");
        assert!(mgr.nearest_of_type(&world, "field", probe, zone, None).is_none());
    }

    #[test]
    fn random_within_range_only_picks_candidates() {
        let rows = vec![
            circle_row(1, "near camp", 0.0, 0.0),
            circle_row(2, "far camp", 100.0, 0.0),
        ];
        let mgr = LocationManager::load(&type_rows(), &rows);
        let mut world = FlatWorld::new();
        let zone = world.add_zone("plains");
        let mut rng = rand::rng();
        for _ in 0..16 {
            let loc = mgr
                .random_of_type_within_range(
                    &world,
                    &mut rng,
                    "camp",
                    Vec3::ZERO,
                    zone,
                    Some(50.0),
                )
                .unwrap();
            assert_eq!(loc.name, "near camp");
        }
    }

    #[test]
    fn create_and_delete_type_cascade() {
        let mut mgr = LocationManager::new();
        mgr.create_location_type("camp").unwrap();
        assert!(mgr.create_location_type("camp").is_none());
        let id = mgr
            .create_location("camp", "north camp", Vec3::ZERO, "plains", 4.0, 0.0)
            .unwrap();
        assert_eq!(mgr.location(id).unwrap().name, "north camp");
        let rid = mgr
            .create_region(
                "camp",
                "drill ground",
                vec![
                    Vec3::new(0.0, 0.0, 0.0),
                    Vec3::new(4.0, 0.0, 0.0),
                    Vec3::new(4.0, 0.0, 4.0),
                ],
                "plains",
            )
            .unwrap();
        assert!(mgr.location(rid).unwrap().is_region());
        assert!(mgr.delete_location_type("camp"));
        assert!(mgr.find_location("north camp").is_none());
        assert!(mgr.find_location("drill ground").is_none());
        assert!(!mgr.delete_location_type("camp"));
    }

    #[test]
    fn persisting_variants_write_rows() {
        use crate::store::MemoryStore;
        let mut mgr = LocationManager::new();
        let mut store = MemoryStore::new();
        mgr.create_location_type_in(&mut store, "camp").unwrap().unwrap();
        mgr.create_location_in(&mut store, "camp", "north camp", Vec3::ZERO, "plains", 4.0, 0.0)
            .unwrap()
            .unwrap();
        assert_eq!(store.location_types.len(), 1);
        assert_eq!(store.locations.len(), 1);
        mgr.delete_location_type_in(&mut store, "camp").unwrap();
        assert!(store.location_types.is_empty());
        assert!(store.locations.is_empty());
    }
}
