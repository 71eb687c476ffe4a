//! The persistence seam: row types and the [`Store`] collaborator.
//!
//! Persistence itself (the relational store) lives outside this crate. The
//! row structs here are the only place field layout is assumed, and so
//! define the implicit schema. Bulk loading consumes rows
//! ([`PathNetwork::load`](crate::network::PathNetwork::load),
//! [`LocationManager::load`](crate::location::LocationManager::load));
//! the `create_*_in` mutation variants write through a [`Store`] before
//! touching memory, while the plain `create_*` variants are pure in-memory.

use glam::Vec3;

/// Waypoint row: `(id, name, x, y, z, radius, flags, zone, group)`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WaypointRow {
    pub id: u32,
    pub name: String,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub radius: f32,
    /// Comma-separated tag names.
    pub flags: String,
    pub zone: String,
    pub group: Option<String>,
}

impl WaypointRow {
    #[inline]
    pub fn pos(&self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }
}

/// Waypoint alias row: `(waypoint_id, alias, rotation_angle)`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WaypointAliasRow {
    pub waypoint_id: u32,
    pub alias: String,
    pub rotation_angle: f32,
}

/// Path row: `(id, name, flags, start_waypoint, end_waypoint)`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PathRow {
    pub id: u32,
    pub name: String,
    /// Comma-separated tag names.
    pub flags: String,
    pub start_waypoint: u32,
    pub end_waypoint: u32,
}

/// Path point row: `(id, path_id, prev_point, x, y, z, zone)`.
///
/// `prev_point` chains the interior points of one path in order;
/// `None` marks the first interior point.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PathPointRow {
    pub id: u32,
    pub path_id: u32,
    pub prev_point: Option<u32>,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub zone: String,
}

impl PathPointRow {
    #[inline]
    pub fn pos(&self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }
}

/// Location type row: `(id, name)`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LocationTypeRow {
    pub id: u32,
    pub name: String,
}

/// Location row: `(id, type_id, name, x, y, z, rotation_angle, radius,
/// zone, prev_in_region)`.
///
/// Rows with `prev_in_region` set are region vertices: they chain into a
/// closed ring (each row names its predecessor, the first row names the
/// last), which the loader reassembles into one polygonal location.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LocationRow {
    pub id: u32,
    pub type_id: u32,
    pub name: String,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub rotation_angle: f32,
    pub radius: f32,
    pub zone: String,
    pub prev_in_region: Option<u32>,
}

impl LocationRow {
    #[inline]
    pub fn pos(&self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// The external persistence collaborator. Implementations map these calls
/// onto whatever relational store the host uses; saves are upserts.
pub trait Store {
    type Error;

    fn save_waypoint(&mut self, row: &WaypointRow) -> Result<(), Self::Error>;
    fn delete_waypoint(&mut self, id: u32) -> Result<(), Self::Error>;
    fn save_waypoint_alias(&mut self, row: &WaypointAliasRow) -> Result<(), Self::Error>;
    fn delete_waypoint_alias(&mut self, waypoint_id: u32, alias: &str)
    -> Result<(), Self::Error>;
    fn save_path(&mut self, row: &PathRow, points: &[PathPointRow]) -> Result<(), Self::Error>;
    fn delete_path(&mut self, id: u32) -> Result<(), Self::Error>;
    fn save_location_type(&mut self, row: &LocationTypeRow) -> Result<(), Self::Error>;
    fn delete_location_type(&mut self, id: u32) -> Result<(), Self::Error>;
    fn save_location(&mut self, row: &LocationRow) -> Result<(), Self::Error>;
}

/// In-memory [`Store`] keeping rows in plain vectors. A test double, and a
/// usable backing for hosts that persist by snapshotting.
#[derive(Default)]
pub struct MemoryStore {
    pub waypoints: Vec<WaypointRow>,
    pub aliases: Vec<WaypointAliasRow>,
    pub paths: Vec<(PathRow, Vec<PathPointRow>)>,
    pub location_types: Vec<LocationTypeRow>,
    pub locations: Vec<LocationRow>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for MemoryStore {
    type Error = std::convert::Infallible;

    fn save_waypoint(&mut self, row: &WaypointRow) -> Result<(), Self::Error> {
        match self.waypoints.iter_mut().find(|r| r.id == row.id) {
            Some(existing) => *existing = row.clone(),
            None => self.waypoints.push(row.clone()),
        }
        Ok(())
    }

    fn delete_waypoint(&mut self, id: u32) -> Result<(), Self::Error> {
        self.waypoints.retain(|r| r.id != id);
        self.aliases.retain(|r| r.waypoint_id != id);
        Ok(())
    }

    fn save_waypoint_alias(&mut self, row: &WaypointAliasRow) -> Result<(), Self::Error> {
        let found = self
            .aliases
            .iter_mut()
            .find(|r| r.waypoint_id == row.waypoint_id && r.alias == row.alias);
        match found {
            Some(existing) => *existing = row.clone(),
            None => self.aliases.push(row.clone()),
        }
        Ok(())
    }

    fn delete_waypoint_alias(
        &mut self,
        waypoint_id: u32,
        alias: &str,
    ) -> Result<(), Self::Error> {
        self.aliases
            .retain(|r| !(r.waypoint_id == waypoint_id && r.alias == alias));
        Ok(())
    }

    fn save_path(&mut self, row: &PathRow, points: &[PathPointRow]) -> Result<(), Self::Error> {
        let entry = (row.clone(), points.to_vec());
        match self.paths.iter_mut().find(|(r, _)| r.id == row.id) {
            Some(existing) => *existing = entry,
            None => self.paths.push(entry),
        }
        Ok(())
    }

    fn delete_path(&mut self, id: u32) -> Result<(), Self::Error> {
        self.paths.retain(|(r, _)| r.id != id);
        Ok(())
    }

    fn save_location_type(&mut self, row: &LocationTypeRow) -> Result<(), Self::Error> {
        match self.location_types.iter_mut().find(|r| r.id == row.id) {
            Some(existing) => *existing = row.clone(),
            None => self.location_types.push(row.clone()),
        }
        Ok(())
    }

    fn delete_location_type(&mut self, id: u32) -> Result<(), Self::Error> {
        self.location_types.retain(|r| r.id != id);
        self.locations.retain(|r| r.type_id != id);
        Ok(())
    }

    fn save_location(&mut self, row: &LocationRow) -> Result<(), Self::Error> {
        match self.locations.iter_mut().find(|r| r.id == row.id) {
            Some(existing) => *existing = row.clone(),
            None => self.locations.push(row.clone()),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_upserts_by_id() {
        let mut store = MemoryStore::new();
        let mut row = WaypointRow {
            id: 1,
            name: "gate".into(),
            x: 0.0,
            y: 0.0,
            z: 0.0,
            radius: 2.0,
            flags: String::new(),
            zone: "plains".into(),
            group: None,
        };
        store.save_waypoint(&row).unwrap();
        row.radius = 5.0;
        store.save_waypoint(&row).unwrap();
        assert_eq!(store.waypoints.len(), 1);
        assert_eq!(store.waypoints[0].radius, 5.0);
        store.delete_waypoint(1).unwrap();
        assert!(store.waypoints.is_empty());
    }

    #[test]
    fn deleting_type_drops_member_locations() {
        let mut store = MemoryStore::new();
        store
            .save_location_type(&LocationTypeRow {
                id: 7,
                name: "camp".into(),
            })
            .unwrap();
        store
            .save_location(&LocationRow {
                id: 1,
                type_id: 7,
                name: "north camp".into(),
                x: 0.0,
                y: 0.0,
                z: 0.0,
                rotation_angle: 0.0,
                radius: 4.0,
                zone: "plains".into(),
                prev_in_region: None,
            })
            .unwrap();
        store.delete_location_type(7).unwrap();
        assert!(store.location_types.is_empty());
        assert!(store.locations.is_empty());
    }
}
