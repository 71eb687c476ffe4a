//! Graph nodes: [`Waypoint`], its tag [`WaypointFlags`], [`Alias`] names and
//! outgoing [`Link`] records.

use glam::Vec3;
use rand::Rng;
use rand::RngExt;

use waynet_core::zone::{World, ZoneId, ZoneRef};

use crate::edge::EdgeId;
use crate::path::PathId;

/// Stable waypoint identity, assigned on creation.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WaypointId(pub u32);

// ---------------------------------------------------------------------------
// WaypointFlags
// ---------------------------------------------------------------------------

/// Waypoint tag set, stored as a bitmask. Tags are filtering hints, not
/// mutually exclusive.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WaypointFlags(pub u32);

impl WaypointFlags {
    pub const NONE: Self = Self(0);
    pub const UNDERGROUND: Self = Self(1 << 0);
    pub const UNDERWATER: Self = Self(1 << 1);
    pub const PRIVATE: Self = Self(1 << 2);
    pub const PUBLIC: Self = Self(1 << 3);
    pub const CITY: Self = Self(1 << 4);
    pub const INDOOR: Self = Self(1 << 5);
    pub const PATH: Self = Self(1 << 6);
    pub const ROAD: Self = Self(1 << 7);
    pub const GROUND: Self = Self(1 << 8);

    const NAMES: [(Self, &'static str); 9] = [
        (Self::UNDERGROUND, "UNDERGROUND"),
        (Self::UNDERWATER, "UNDERWATER"),
        (Self::PRIVATE, "PRIVATE"),
        (Self::PUBLIC, "PUBLIC"),
        (Self::CITY, "CITY"),
        (Self::INDOOR, "INDOOR"),
        (Self::PATH, "PATH"),
        (Self::ROAD, "ROAD"),
        (Self::GROUND, "GROUND"),
    ];

    #[inline]
    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Whether any tag in `other` is set.
    #[inline]
    pub fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// Parse the comma-separated persistence form, e.g.
    /// `"CITY, PUBLIC, GROUND"`. Case-insensitive; `None` on an unknown
    /// token.
    pub fn parse(s: &str) -> Option<Self> {
        let mut flags = Self::NONE;
        'tokens: for token in s.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            let upper = token.to_ascii_uppercase();
            for (flag, name) in Self::NAMES {
                if upper == name {
                    flags = flags | flag;
                    continue 'tokens;
                }
            }
            return None;
        }
        Some(flags)
    }
}

impl std::ops::BitOr for WaypointFlags {
    type Output = Self;
    #[inline]
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl std::ops::BitAnd for WaypointFlags {
    type Output = Self;
    #[inline]
    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl std::fmt::Display for WaypointFlags {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for (flag, name) in Self::NAMES {
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
// Alias / Link
// ---------------------------------------------------------------------------

/// Alternate waypoint name with a facing angle (radians about Y) for agents
/// that should face a specific direction on arrival.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Alias {
    pub name: String,
    pub rotation_angle: f32,
}

/// One outgoing connection. A single record keeps target, cached traversal
/// distance and the owning edge and path in lock-step.
#[derive(Copy, Clone, Debug)]
pub struct Link {
    pub target: WaypointId,
    pub distance: f32,
    pub edge: EdgeId,
    pub path: PathId,
}

// ---------------------------------------------------------------------------
// Waypoint
// ---------------------------------------------------------------------------

/// A named, radius-bounded graph node at a 3D position.
#[derive(Clone, Debug)]
pub struct Waypoint {
    pub id: WaypointId,
    pub name: String,
    pub pos: Vec3,
    pub zone: ZoneRef,
    /// Arrival tolerance.
    pub radius: f32,
    pub flags: WaypointFlags,
    pub group: Option<String>,
    aliases: Vec<Alias>,
    links: Vec<Link>,
}

impl Waypoint {
    pub fn new(
        id: WaypointId,
        name: impl Into<String>,
        pos: Vec3,
        zone: ZoneRef,
        radius: f32,
        flags: WaypointFlags,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            pos,
            zone,
            radius,
            flags,
            group: None,
            aliases: Vec::new(),
            links: Vec::new(),
        }
    }

    /// Outgoing links, in registration order.
    #[inline]
    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn add_link(&mut self, link: Link) {
        self.links.push(link);
    }

    /// Remove the link that traverses `path`, if any.
    pub fn remove_link(&mut self, path: PathId) -> Option<Link> {
        let index = self.links.iter().position(|l| l.path == path)?;
        Some(self.links.remove(index))
    }

    /// First-registered link to `target`.
    pub fn link_to(&self, target: WaypointId) -> Option<&Link> {
        self.links.iter().find(|l| l.target == target)
    }

    /// Uniformly chosen link among those whose target passes `keep`.
    pub fn random_link(
        &self,
        rng: &mut impl Rng,
        keep: impl Fn(&Link) -> bool,
    ) -> Option<&Link> {
        let eligible: Vec<&Link> = self.links.iter().filter(|l| keep(l)).collect();
        if eligible.is_empty() {
            return None;
        }
        Some(eligible[rng.random_range(0..eligible.len())])
    }

    /// Whether `pos` lies within this waypoint's radius and `zone` matches.
    /// An unresolvable zone never matches.
    pub fn check_within(&self, world: &impl World, pos: Vec3, zone: ZoneId) -> bool {
        self.zone.matches(world, zone) && self.pos.distance(pos) <= self.radius
    }

    // -----------------------------------------------------------------------
    // Aliases
    // -----------------------------------------------------------------------

    #[inline]
    pub fn aliases(&self) -> &[Alias] {
        &self.aliases
    }

    /// Register an alias. Returns `false` if the name is already taken.
    pub fn add_alias(&mut self, name: impl Into<String>, rotation_angle: f32) -> bool {
        let name = name.into();
        if self.find_alias(&name).is_some() {
            return false;
        }
        self.aliases.push(Alias {
            name,
            rotation_angle,
        });
        true
    }

    pub fn remove_alias(&mut self, name: &str) -> Option<Alias> {
        let index = self.aliases.iter().position(|a| a.name == name)?;
        Some(self.aliases.remove(index))
    }

    /// Case-sensitive exact alias lookup.
    pub fn find_alias(&self, name: &str) -> Option<&Alias> {
        self.aliases.iter().find(|a| a.name == name)
    }

    /// Set the facing angle of the alias `name`. Returns `false` when
    /// no such alias exists.
    pub fn set_rotation_angle(&mut self, name: &str, angle: f32) -> bool {
        match self.aliases.iter_mut().find(|a| a.name == name) {
            Some(alias) => {
                alias.rotation_angle = angle;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use waynet_core::FlatWorld;

    fn waypoint(id: u32) -> Waypoint {
        Waypoint::new(
            WaypointId(id),
            format!("wp{id}"),
            Vec3::ZERO,
            ZoneRef::new("plains"),
            3.0,
            WaypointFlags::NONE,
        )
    }

    fn link(target: u32, ord: u32) -> Link {
        Link {
            target: WaypointId(target),
            distance: 1.0,
            edge: EdgeId(ord),
            path: PathId(ord),
        }
    }

    #[test]
    fn flags_parse_round_trip() {
        let flags = WaypointFlags::parse("city, PUBLIC, Ground").unwrap();
        assert!(flags.contains(WaypointFlags::CITY));
        assert!(flags.contains(WaypointFlags::PUBLIC));
        assert!(flags.contains(WaypointFlags::GROUND));
        assert!(!flags.contains(WaypointFlags::UNDERWATER));
        assert_eq!(WaypointFlags::parse(&flags.to_string()).unwrap(), flags);
        assert!(WaypointFlags::parse("FLYING").is_none());
    }

    #[test]
    fn flags_intersects() {
        let flags = WaypointFlags::CITY | WaypointFlags::ROAD;
        assert!(flags.intersects(WaypointFlags::ROAD | WaypointFlags::UNDERWATER));
        assert!(!flags.intersects(WaypointFlags::UNDERWATER));
    }

    #[test]
    fn remove_link_by_path() {
        let mut wp = waypoint(1);
        wp.add_link(link(2, 10));
        wp.add_link(link(3, 11));
        let removed = wp.remove_link(PathId(10)).unwrap();
        assert_eq!(removed.target, WaypointId(2));
        assert_eq!(wp.links().len(), 1);
        assert!(wp.remove_link(PathId(10)).is_none());
    }

    #[test]
    fn link_to_prefers_first_registered() {
        let mut wp = waypoint(1);
        wp.add_link(link(2, 10));
        wp.add_link(link(2, 11));
        assert_eq!(wp.link_to(WaypointId(2)).unwrap().path, PathId(10));
    }

    #[test]
    fn random_link_honors_filter() {
        let mut wp = waypoint(1);
        wp.add_link(link(2, 10));
        wp.add_link(link(3, 11));
        let mut rng = rand::rng();
        for _ in 0..16 {
            let l = wp
                .random_link(&mut rng, |l| l.target == WaypointId(3))
                .unwrap();
            assert_eq!(l.target, WaypointId(3));
        }
        assert!(wp.random_link(&mut rng, |_| false).is_none());
    }

    #[test]
    fn check_within_radius_and_zone() {
        let mut world = FlatWorld::new();
        let plains = world.add_zone("plains");
        let caves = world.add_zone("caves");
        let wp = waypoint(1);
        assert!(wp.check_within(&world, Vec3::new(0.0, 0.0, 2.0), plains));
        assert!(!wp.check_within(&world, Vec3::new(0.0, 0.0, 4.0), plains));
        assert!(!wp.check_within(&world, Vec3::ZERO, caves));
    }

    #[test]
    fn alias_lookup_is_case_sensitive() {
        let mut wp = waypoint(1);
        assert!(wp.add_alias("Crossroads", 0.0));
        assert!(!wp.add_alias("Crossroads", 1.0));
        assert!(wp.find_alias("Crossroads").is_some());
        assert!(wp.find_alias("crossroads").is_none());
        assert!(wp.set_rotation_angle("Crossroads", 1.5));
        assert!((wp.find_alias("Crossroads").unwrap().rotation_angle - 1.5).abs() < 1e-6);
        assert!(wp.remove_alias("Crossroads").is_some());
        assert!(wp.find_alias("Crossroads").is_none());
    }
}
