//! Zone identities and the world-geometry collaborator.
//!
//! Zones (spatial containers such as sectors or map instances) are owned
//! entirely by the host engine. This crate only carries a [`ZoneRef`]: the
//! zone's name plus a cached [`ZoneId`] that is revalidated against the
//! [`World`] on every resolve, since a zone may unload at any time. An
//! unresolvable zone makes the owning entity unreachable for spatial
//! comparisons; it never aborts a query.

use std::cell::Cell;
use std::fmt;

use glam::Vec3;

/// Opaque host-assigned zone identity, valid only while the zone is loaded.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ZoneId(pub u32);

/// The world-geometry collaborator: zone resolution and the black-box
/// distance between two zone-qualified positions.
pub trait World {
    /// Current id of the zone named `name`, if loaded.
    fn zone_id(&self, name: &str) -> Option<ZoneId>;

    /// Whether `id` still refers to a loaded zone.
    fn zone_valid(&self, id: ZoneId) -> bool;

    /// Distance between two zone-qualified positions, possibly crossing
    /// zone boundaries. `None` means unreachable.
    fn distance(&self, a: Vec3, az: ZoneId, b: Vec3, bz: ZoneId) -> Option<f32>;
}

// ---------------------------------------------------------------------------
// ZoneRef
// ---------------------------------------------------------------------------

/// A weak zone reference: name plus lazily cached id.
#[derive(Clone, Debug)]
pub struct ZoneRef {
    name: String,
    cached: Cell<Option<ZoneId>>,
}

impl ZoneRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cached: Cell::new(None),
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current id of the referenced zone, re-resolving by name when the
    /// cached id has gone stale. `None` if the zone is not loaded.
    pub fn resolve(&self, world: &impl World) -> Option<ZoneId> {
        if let Some(id) = self.cached.get() {
            if world.zone_valid(id) {
                return Some(id);
            }
        }
        let id = world.zone_id(&self.name);
        self.cached.set(id);
        id
    }

    /// Whether this reference currently resolves to `zone`.
    #[inline]
    pub fn matches(&self, world: &impl World, zone: ZoneId) -> bool {
        self.resolve(world) == Some(zone)
    }
}

impl PartialEq for ZoneRef {
    /// Zone references compare by name; the cache is incidental.
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for ZoneRef {}

impl fmt::Display for ZoneRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for ZoneRef {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.name)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for ZoneRef {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(ZoneRef::new(name))
    }
}

// ---------------------------------------------------------------------------
// FlatWorld
// ---------------------------------------------------------------------------

/// Minimal [`World`]: zones registered by name, same-zone distance is
/// Euclidean, cross-zone positions are unreachable.
///
/// Suitable for hosts without zone topology, and for tests.
#[derive(Default)]
pub struct FlatWorld {
    zones: Vec<String>,
}

impl FlatWorld {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a zone, returning its id. Re-registering a name returns
    /// the existing id.
    pub fn add_zone(&mut self, name: impl Into<String>) -> ZoneId {
        let name = name.into();
        if let Some(i) = self.zones.iter().position(|z| *z == name) {
            return ZoneId(i as u32);
        }
        self.zones.push(name);
        ZoneId(self.zones.len() as u32 - 1)
    }
}

impl World for FlatWorld {
    fn zone_id(&self, name: &str) -> Option<ZoneId> {
        self.zones
            .iter()
            .position(|z| z == name)
            .map(|i| ZoneId(i as u32))
    }

    fn zone_valid(&self, id: ZoneId) -> bool {
        (id.0 as usize) < self.zones.len()
    }

    fn distance(&self, a: Vec3, az: ZoneId, b: Vec3, bz: ZoneId) -> Option<f32> {
        if az == bz {
            Some(a.distance(b))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_caches_and_revalidates() {
        let mut world = FlatWorld::new();
        let id = world.add_zone("plains");
        let zone = ZoneRef::new("plains");
        assert_eq!(zone.resolve(&world), Some(id));
        // Second resolve hits the cache and still agrees.
        assert_eq!(zone.resolve(&world), Some(id));
    }

    #[test]
    fn unknown_zone_is_unresolvable() {
        let world = FlatWorld::new();
        let zone = ZoneRef::new("nowhere");
        assert_eq!(zone.resolve(&world), None);
        assert!(!zone.matches(&world, ZoneId(0)));
    }

    #[test]
    fn cross_zone_distance_is_unreachable() {
        let mut world = FlatWorld::new();
        let a = world.add_zone("plains");
        let b = world.add_zone("caves");
        assert_eq!(world.distance(Vec3::ZERO, a, Vec3::X, b), None);
        assert_eq!(world.distance(Vec3::ZERO, a, Vec3::new(3.0, 4.0, 0.0), a), Some(5.0));
    }
}
