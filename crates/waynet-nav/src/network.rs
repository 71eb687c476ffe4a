//! [`PathNetwork`] — the aggregate navigation graph.
//!
//! Owns all waypoints, paths and edges, maintains the id/name/group
//! indexes, loads from persistence rows (dropping and logging structurally
//! broken rows), and answers lookup, spatial and routing queries. The
//! network is an explicit object: construct one and pass it by reference to
//! whatever needs routing.
//!
//! All operations are synchronous and run to completion; routing and
//! mutation take `&mut self`, so a route computation can never interleave
//! with another route or with a graph mutation on the same network.

use std::collections::HashMap;

use glam::Vec3;
use rand::Rng;
use rand::RngExt;

use waynet_core::zone::{World, ZoneId, ZoneRef};

use crate::edge::{Edge, EdgeId};
use crate::path::{Direction, Path, PathFlags, PathId};
use crate::route::{RouteFilter, Router};
use crate::store::{PathPointRow, PathRow, Store, WaypointAliasRow, WaypointRow};
use crate::waypoint::{Link, Waypoint, WaypointFlags, WaypointId};

/// Result of a nearest-path (segment projection) query.
#[derive(Copy, Clone, Debug)]
pub struct NearestPath {
    pub path: PathId,
    pub distance: f32,
    pub segment: usize,
    pub fraction: f32,
}

/// Result of a nearest-path-point (vertex) query.
#[derive(Copy, Clone, Debug)]
pub struct NearestPoint {
    pub path: PathId,
    pub distance: f32,
    pub index: usize,
}

/// The navigation graph: waypoints, paths, edges and their indexes.
#[derive(Default)]
pub struct PathNetwork {
    waypoints: Vec<Waypoint>,
    paths: Vec<Path>,
    edges: HashMap<EdgeId, Edge>,
    wp_index: HashMap<WaypointId, usize>,
    wp_by_name: HashMap<String, usize>,
    alias_index: HashMap<String, WaypointId>,
    path_index: HashMap<PathId, usize>,
    path_by_name: HashMap<String, usize>,
    groups: HashMap<String, Vec<WaypointId>>,
    router: Router,
    next_wp_id: u32,
    next_path_id: u32,
    next_edge_id: u32,
    next_point_id: u32,
}

impl PathNetwork {
    pub fn new() -> Self {
        Self {
            router: Router::new(),
            next_wp_id: 1,
            next_path_id: 1,
            next_edge_id: 1,
            next_point_id: 1,
            ..Self::default()
        }
    }

    // -----------------------------------------------------------------------
    // Loading
    // -----------------------------------------------------------------------

    /// Bulk-load the network from persistence rows.
    ///
    /// Structural errors are recovered locally: duplicate names/ids,
    /// unparsable flags, aliases of unknown waypoints, paths with dangling
    /// endpoints and point chains that do not resolve are logged and
    /// dropped; the rest of the network still loads.
    pub fn load(
        waypoint_rows: &[WaypointRow],
        alias_rows: &[WaypointAliasRow],
        path_rows: &[PathRow],
        point_rows: &[PathPointRow],
    ) -> Self {
        let mut net = Self::new();

        for row in waypoint_rows {
            let id = WaypointId(row.id);
            if net.wp_index.contains_key(&id) || net.wp_by_name.contains_key(&row.name) {
                log::warn!("duplicate waypoint {} '{}', dropped", row.id, row.name);
                continue;
            }
            let flags = match WaypointFlags::parse(&row.flags) {
                Some(flags) => flags,
                None => {
                    log::warn!(
                        "waypoint '{}' has unknown flags '{}', cleared",
                        row.name,
                        row.flags
                    );
                    WaypointFlags::NONE
                }
            };
            let mut wp = Waypoint::new(
                id,
                row.name.clone(),
                row.pos(),
                ZoneRef::new(row.zone.clone()),
                row.radius,
                flags,
            );
            wp.group = row.group.clone();
            net.push_waypoint(wp);
        }

        for row in alias_rows {
            let id = WaypointId(row.waypoint_id);
            if !net.wp_index.contains_key(&id) {
                log::warn!("alias '{}' references unknown waypoint {}", row.alias, row.waypoint_id);
                continue;
            }
            if !net.add_alias(id, &row.alias, row.rotation_angle) {
                log::warn!("alias '{}' collides with an existing name, dropped", row.alias);
            }
        }

        for row in path_rows {
            net.load_path(row, point_rows);
        }

        net
    }

    fn load_path(&mut self, row: &PathRow, point_rows: &[PathPointRow]) {
        let id = PathId(row.id);
        if self.path_index.contains_key(&id) || self.path_by_name.contains_key(&row.name) {
            log::warn!("duplicate path {} '{}', dropped", row.id, row.name);
            return;
        }
        let flags = match PathFlags::parse(&row.flags) {
            Some(flags) => flags,
            None => {
                log::warn!("path '{}' has unknown flags '{}', cleared", row.name, row.flags);
                PathFlags::NONE
            }
        };
        let (Some(start), Some(end)) = (
            self.waypoint(WaypointId(row.start_waypoint)),
            self.waypoint(WaypointId(row.end_waypoint)),
        ) else {
            log::warn!("path '{}' references a missing endpoint waypoint, dropped", row.name);
            return;
        };

        let members: Vec<&PathPointRow> =
            point_rows.iter().filter(|p| p.path_id == row.id).collect();
        let Some(ordered) = Self::order_points(&members) else {
            log::warn!("path '{}' has a broken point chain, dropped", row.name);
            return;
        };

        let mut path = Path::between(
            id,
            row.name.clone(),
            flags,
            (start.id, start.pos, start.zone.clone(), start.radius),
            (end.id, end.pos, end.zone.clone(), end.radius),
        );
        for point in ordered {
            self.next_point_id = self.next_point_id.max(point.id + 1);
            path.add_point(point.id, point.pos(), ZoneRef::new(point.zone.clone()));
        }
        self.install_path(path);
    }

    /// Order one path's interior point rows along their predecessor chain.
    /// `None` when the chain does not resolve to every row exactly once.
    fn order_points<'a>(rows: &[&'a PathPointRow]) -> Option<Vec<&'a PathPointRow>> {
        if rows.is_empty() {
            return Some(Vec::new());
        }
        let mut heads = rows.iter().filter(|r| r.prev_point.is_none());
        let head = *heads.next()?;
        if heads.next().is_some() {
            return None;
        }
        let by_prev: HashMap<u32, &PathPointRow> = rows
            .iter()
            .filter_map(|r| r.prev_point.map(|p| (p, *r)))
            .collect();
        let mut ordered = vec![head];
        while let Some(&next) = by_prev.get(&ordered.last().expect("non-empty").id) {
            ordered.push(next);
            if ordered.len() > rows.len() {
                return None;
            }
        }
        (ordered.len() == rows.len()).then_some(ordered)
    }

    fn push_waypoint(&mut self, wp: Waypoint) {
        self.next_wp_id = self.next_wp_id.max(wp.id.0 + 1);
        let index = self.waypoints.len();
        self.wp_index.insert(wp.id, index);
        self.wp_by_name.insert(wp.name.clone(), index);
        if let Some(group) = &wp.group {
            self.groups.entry(group.clone()).or_default().push(wp.id);
        }
        self.waypoints.push(wp);
    }

    /// Register a fully built path: create its forward edge (and reverse
    /// edge unless one-way) and link both endpoint waypoints.
    fn install_path(&mut self, mut path: Path) -> PathId {
        let id = path.id;
        self.next_path_id = self.next_path_id.max(id.0 + 1);
        let distance = path.length();
        let start = path.start_waypoint();
        let end = path.end_waypoint();

        let forward = self.new_edge(id, Direction::Forward);
        self.waypoint_mut(start).add_link(Link {
            target: end,
            distance,
            edge: forward,
            path: id,
        });
        if !path.one_way() {
            let reverse = self.new_edge(id, Direction::Reverse);
            self.waypoint_mut(end).add_link(Link {
                target: start,
                distance,
                edge: reverse,
                path: id,
            });
        }

        self.path_index.insert(id, self.paths.len());
        self.path_by_name.insert(path.name.clone(), self.paths.len());
        self.paths.push(path);
        id
    }

    fn new_edge(&mut self, path: PathId, direction: Direction) -> EdgeId {
        let id = EdgeId(self.next_edge_id);
        self.next_edge_id += 1;
        self.edges.insert(id, Edge::new(id, path, direction));
        id
    }

    fn waypoint_mut(&mut self, id: WaypointId) -> &mut Waypoint {
        let index = self.wp_index[&id];
        &mut self.waypoints[index]
    }

    fn rebuild_waypoint_indexes(&mut self) {
        self.wp_index.clear();
        self.wp_by_name.clear();
        for (i, wp) in self.waypoints.iter().enumerate() {
            self.wp_index.insert(wp.id, i);
            self.wp_by_name.insert(wp.name.clone(), i);
        }
    }

    fn rebuild_path_indexes(&mut self) {
        self.path_index.clear();
        self.path_by_name.clear();
        for (i, path) in self.paths.iter().enumerate() {
            self.path_index.insert(path.id, i);
            self.path_by_name.insert(path.name.clone(), i);
        }
    }

    // -----------------------------------------------------------------------
    // Lookup
    // -----------------------------------------------------------------------

    pub fn waypoint(&self, id: WaypointId) -> Option<&Waypoint> {
        self.wp_index.get(&id).map(|&i| &self.waypoints[i])
    }

    /// Find a waypoint by name, resolving aliases.
    pub fn find_waypoint(&self, name: &str) -> Option<&Waypoint> {
        if let Some(&i) = self.wp_by_name.get(name) {
            return Some(&self.waypoints[i]);
        }
        self.alias_index.get(name).and_then(|&id| self.waypoint(id))
    }

    pub fn path(&self, id: PathId) -> Option<&Path> {
        self.path_index.get(&id).map(|&i| &self.paths[i])
    }

    /// Mutable path access, e.g. for driving a
    /// [`PathAnchor`](crate::anchor::PathAnchor) or point editing.
    /// Point edits invalidate the path's precalculation automatically, but
    /// do not re-derive the cached link distances; re-create the path to
    /// re-weight routing.
    pub fn path_mut(&mut self, id: PathId) -> Option<&mut Path> {
        self.path_index.get(&id).map(|&i| &mut self.paths[i])
    }

    pub fn find_path(&self, name: &str) -> Option<&Path> {
        self.path_by_name.get(name).map(|&i| &self.paths[i])
    }

    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(&id)
    }

    pub fn waypoints(&self) -> impl Iterator<Item = &Waypoint> {
        self.waypoints.iter()
    }

    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.paths.iter()
    }

    /// Members of a named group. Groups are partitions used to narrow
    /// nearest/random queries, never routing weight.
    pub fn group(&self, name: &str) -> Option<&[WaypointId]> {
        self.groups.get(name).map(|v| v.as_slice())
    }

    pub fn group_names(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(|s| s.as_str())
    }

    // -----------------------------------------------------------------------
    // Spatial queries
    // -----------------------------------------------------------------------

    fn scoped<'a>(&'a self, group: Option<&str>) -> Vec<&'a Waypoint> {
        match group {
            None => self.waypoints.iter().collect(),
            Some(name) => self
                .group(name)
                .unwrap_or(&[])
                .iter()
                .filter_map(|&id| self.waypoint(id))
                .collect(),
        }
    }

    /// Nearest waypoint to a zone-qualified position, optionally bounded by
    /// `range` and scoped to a named group. Waypoints whose zone does not
    /// resolve are unreachable and skipped.
    pub fn nearest_waypoint(
        &self,
        world: &impl World,
        pos: Vec3,
        zone: ZoneId,
        range: Option<f32>,
        group: Option<&str>,
    ) -> Option<(&Waypoint, f32)> {
        let mut best: Option<(&Waypoint, f32)> = None;
        for wp in self.scoped(group) {
            let Some(wp_zone) = wp.zone.resolve(world) else {
                continue;
            };
            let Some(d) = world.distance(pos, zone, wp.pos, wp_zone) else {
                continue;
            };
            if range.is_some_and(|r| d > r) {
                continue;
            }
            if best.is_none_or(|(_, bd)| d < bd) {
                best = Some((wp, d));
            }
        }
        best
    }

    /// Uniformly chosen waypoint within `range` — each candidate inside the
    /// range is equally likely.
    pub fn random_waypoint(
        &self,
        world: &impl World,
        rng: &mut impl Rng,
        pos: Vec3,
        zone: ZoneId,
        range: Option<f32>,
        group: Option<&str>,
    ) -> Option<&Waypoint> {
        let candidates: Vec<&Waypoint> = self
            .scoped(group)
            .into_iter()
            .filter(|wp| {
                wp.zone
                    .resolve(world)
                    .and_then(|wz| world.distance(pos, zone, wp.pos, wz))
                    .is_some_and(|d| range.is_none_or(|r| d <= r))
            })
            .collect();
        if candidates.is_empty() {
            return None;
        }
        Some(candidates[rng.random_range(0..candidates.len())])
    }

    /// Nearest path by perpendicular segment distance.
    pub fn nearest_path(
        &mut self,
        world: &impl World,
        pos: Vec3,
        zone: ZoneId,
        range: Option<f32>,
    ) -> Option<NearestPath> {
        let mut best: Option<NearestPath> = None;
        for path in &mut self.paths {
            let Some((distance, segment, fraction)) = path.distance(world, pos, zone) else {
                continue;
            };
            if range.is_some_and(|r| distance > r) {
                continue;
            }
            if best.is_none_or(|b| distance < b.distance) {
                best = Some(NearestPath {
                    path: path.id,
                    distance,
                    segment,
                    fraction,
                });
            }
        }
        best
    }

    /// Nearest path vertex. `include_ends` controls whether endpoint
    /// anchors are eligible.
    pub fn nearest_path_point(
        &mut self,
        world: &impl World,
        pos: Vec3,
        zone: ZoneId,
        range: Option<f32>,
        include_ends: bool,
    ) -> Option<NearestPoint> {
        let mut best: Option<NearestPoint> = None;
        for path in &mut self.paths {
            let Some((distance, index)) = path.distance_point(world, pos, zone, include_ends)
            else {
                continue;
            };
            if range.is_some_and(|r| distance > r) {
                continue;
            }
            if best.is_none_or(|b| distance < b.distance) {
                best = Some(NearestPoint {
                    path: path.id,
                    distance,
                    index,
                });
            }
        }
        best
    }

    /// Uniformly chosen outgoing edge of `from` whose target waypoint
    /// passes `filter`.
    pub fn random_edge(
        &self,
        rng: &mut impl Rng,
        from: WaypointId,
        filter: &impl RouteFilter,
    ) -> Option<EdgeId> {
        let wp = self.waypoint(from)?;
        let link = wp.random_link(rng, |l| {
            self.waypoint(l.target).is_some_and(|t| !filter.excluded(t))
        })?;
        Some(link.edge)
    }

    // -----------------------------------------------------------------------
    // Routing
    // -----------------------------------------------------------------------

    /// Shortest waypoint route from `start` to `end` under `filter`.
    ///
    /// Empty when no route exists, when either terminus is unknown or
    /// excluded; a single waypoint for `start == end`.
    pub fn find_waypoint_route(
        &mut self,
        start: WaypointId,
        end: WaypointId,
        filter: &impl RouteFilter,
    ) -> Vec<WaypointId> {
        let (Some(&s), Some(&e)) = (self.wp_index.get(&start), self.wp_index.get(&end)) else {
            return Vec::new();
        };
        self.router
            .shortest(&self.waypoints, &self.wp_index, s, e, filter)
            .iter()
            .map(|step| self.waypoints[step.waypoint].id)
            .collect()
    }

    /// Shortest route as the sequence of edges traversed. Empty for
    /// no-route and for `start == end` (no edge is crossed). For each
    /// consecutive waypoint pair the edge actually relaxed is returned;
    /// ties go to the first-registered outgoing link.
    pub fn find_edge_route(
        &mut self,
        start: WaypointId,
        end: WaypointId,
        filter: &impl RouteFilter,
    ) -> Vec<EdgeId> {
        let (Some(&s), Some(&e)) = (self.wp_index.get(&start), self.wp_index.get(&end)) else {
            return Vec::new();
        };
        self.router
            .shortest(&self.waypoints, &self.wp_index, s, e, filter)
            .iter()
            .filter_map(|step| step.via)
            .collect()
    }

    // -----------------------------------------------------------------------
    // Mutation
    // -----------------------------------------------------------------------

    /// Register a new waypoint in memory. `None` when the name is taken.
    pub fn create_waypoint(
        &mut self,
        name: impl Into<String>,
        pos: Vec3,
        zone: impl Into<String>,
        radius: f32,
        flags: WaypointFlags,
    ) -> Option<WaypointId> {
        let name = name.into();
        if self.wp_by_name.contains_key(&name) || self.alias_index.contains_key(&name) {
            return None;
        }
        let id = WaypointId(self.next_wp_id);
        self.next_wp_id += 1;
        self.push_waypoint(Waypoint::new(
            id,
            name,
            pos,
            ZoneRef::new(zone.into()),
            radius,
            flags,
        ));
        Some(id)
    }

    /// As [`Self::create_waypoint`], persisting through `store` first.
    pub fn create_waypoint_in<S: Store>(
        &mut self,
        store: &mut S,
        name: &str,
        pos: Vec3,
        zone: &str,
        radius: f32,
        flags: WaypointFlags,
    ) -> Result<Option<WaypointId>, S::Error> {
        if self.wp_by_name.contains_key(name) || self.alias_index.contains_key(name) {
            return Ok(None);
        }
        store.save_waypoint(&WaypointRow {
            id: self.next_wp_id,
            name: name.to_string(),
            x: pos.x,
            y: pos.y,
            z: pos.z,
            radius,
            flags: flags.to_string(),
            zone: zone.to_string(),
            group: None,
        })?;
        Ok(self.create_waypoint(name, pos, zone, radius, flags))
    }

    /// Remove a waypoint that nothing references. Refused (`false`) while
    /// it still has links or an existing path uses it as an endpoint;
    /// delete the owning paths first.
    pub fn delete_waypoint(&mut self, id: WaypointId) -> bool {
        let Some(&index) = self.wp_index.get(&id) else {
            return false;
        };
        if !self.waypoints[index].links().is_empty() {
            return false;
        }
        if self
            .paths
            .iter()
            .any(|p| p.start_waypoint() == id || p.end_waypoint() == id)
        {
            return false;
        }
        let wp = self.waypoints.remove(index);
        for alias in wp.aliases() {
            self.alias_index.remove(&alias.name);
        }
        if let Some(group) = &wp.group {
            if let Some(members) = self.groups.get_mut(group) {
                members.retain(|&m| m != id);
            }
        }
        self.rebuild_waypoint_indexes();
        true
    }

    /// As [`Self::delete_waypoint`], persisting through `store` first.
    pub fn delete_waypoint_in<S: Store>(
        &mut self,
        store: &mut S,
        id: WaypointId,
    ) -> Result<bool, S::Error> {
        store.delete_waypoint(id.0)?;
        Ok(self.delete_waypoint(id))
    }

    /// Create a path between two existing waypoints, with the given
    /// interior points in order. Builds the forward edge, and the reverse
    /// edge unless `flags` carries `ONE_WAY`; the cached link distance on
    /// both endpoints is the polyline length. `None` when an endpoint is
    /// unknown or the name is taken.
    pub fn create_path(
        &mut self,
        name: impl Into<String>,
        flags: PathFlags,
        start: WaypointId,
        end: WaypointId,
        points: &[(Vec3, &str)],
    ) -> Option<PathId> {
        let name = name.into();
        if self.path_by_name.contains_key(&name) {
            return None;
        }
        let (sid, spos, szone, srad) = {
            let s = self.waypoint(start)?;
            (s.id, s.pos, s.zone.clone(), s.radius)
        };
        let (eid, epos, ezone, erad) = {
            let e = self.waypoint(end)?;
            (e.id, e.pos, e.zone.clone(), e.radius)
        };
        let id = PathId(self.next_path_id);
        self.next_path_id += 1;
        let mut path = Path::between(
            id,
            name,
            flags,
            (sid, spos, szone, srad),
            (eid, epos, ezone, erad),
        );
        for (pos, zone) in points {
            let point_id = self.next_point_id;
            self.next_point_id += 1;
            path.add_point(point_id, *pos, ZoneRef::new(*zone));
        }
        Some(self.install_path(path))
    }

    /// As [`Self::create_path`], persisting through `store` first.
    pub fn create_path_in<S: Store>(
        &mut self,
        store: &mut S,
        name: &str,
        flags: PathFlags,
        start: WaypointId,
        end: WaypointId,
        points: &[(Vec3, &str)],
    ) -> Result<Option<PathId>, S::Error> {
        if self.path_by_name.contains_key(name)
            || self.waypoint(start).is_none()
            || self.waypoint(end).is_none()
        {
            return Ok(None);
        }
        let row = PathRow {
            id: self.next_path_id,
            name: name.to_string(),
            flags: flags.to_string(),
            start_waypoint: start.0,
            end_waypoint: end.0,
        };
        let mut prev = None;
        let mut point_rows = Vec::with_capacity(points.len());
        for (i, (pos, zone)) in points.iter().enumerate() {
            let point_id = self.next_point_id + i as u32;
            point_rows.push(PathPointRow {
                id: point_id,
                path_id: row.id,
                prev_point: prev,
                x: pos.x,
                y: pos.y,
                z: pos.z,
                zone: zone.to_string(),
            });
            prev = Some(point_id);
        }
        store.save_path(&row, &point_rows)?;
        Ok(self.create_path(name, flags, start, end, points))
    }

    /// Remove a path, unlinking both endpoint waypoints and dropping its
    /// edges. Returns `false` for an unknown id.
    pub fn delete_path(&mut self, id: PathId) -> bool {
        let Some(&index) = self.path_index.get(&id) else {
            return false;
        };
        let start = self.paths[index].start_waypoint();
        let end = self.paths[index].end_waypoint();
        for wp in [start, end] {
            if let Some(link) = self.waypoint_mut(wp).remove_link(id) {
                self.edges.remove(&link.edge);
            }
        }
        self.paths.remove(index);
        self.rebuild_path_indexes();
        true
    }

    /// As [`Self::delete_path`], persisting through `store` first.
    pub fn delete_path_in<S: Store>(
        &mut self,
        store: &mut S,
        id: PathId,
    ) -> Result<bool, S::Error> {
        store.delete_path(id.0)?;
        Ok(self.delete_path(id))
    }

    /// Move a waypoint into a group (or out of any, with `None`).
    pub fn set_waypoint_group(&mut self, id: WaypointId, group: Option<&str>) -> bool {
        let Some(&index) = self.wp_index.get(&id) else {
            return false;
        };
        if let Some(old) = self.waypoints[index].group.take() {
            if let Some(members) = self.groups.get_mut(&old) {
                members.retain(|&m| m != id);
            }
        }
        if let Some(name) = group {
            self.waypoints[index].group = Some(name.to_string());
            self.groups.entry(name.to_string()).or_default().push(id);
        }
        true
    }

    /// Replace a waypoint's tag set.
    pub fn set_waypoint_flags(&mut self, id: WaypointId, flags: WaypointFlags) -> bool {
        match self.wp_index.get(&id) {
            Some(&index) => {
                self.waypoints[index].flags = flags;
                true
            }
            None => false,
        }
    }

    /// As [`Self::set_waypoint_flags`], persisting through `store` first.
    pub fn set_waypoint_flags_in<S: Store>(
        &mut self,
        store: &mut S,
        id: WaypointId,
        flags: WaypointFlags,
    ) -> Result<bool, S::Error> {
        let Some(&index) = self.wp_index.get(&id) else {
            return Ok(false);
        };
        let wp = &self.waypoints[index];
        store.save_waypoint(&WaypointRow {
            id: wp.id.0,
            name: wp.name.clone(),
            x: wp.pos.x,
            y: wp.pos.y,
            z: wp.pos.z,
            radius: wp.radius,
            flags: flags.to_string(),
            zone: wp.zone.name().to_string(),
            group: wp.group.clone(),
        })?;
        Ok(self.set_waypoint_flags(id, flags))
    }

    /// Register an alias for a waypoint. `false` when the waypoint is
    /// unknown or the name collides with any waypoint or alias.
    pub fn add_alias(&mut self, id: WaypointId, name: &str, rotation_angle: f32) -> bool {
        if self.wp_by_name.contains_key(name) || self.alias_index.contains_key(name) {
            return false;
        }
        let Some(&index) = self.wp_index.get(&id) else {
            return false;
        };
        if self.waypoints[index].add_alias(name, rotation_angle) {
            self.alias_index.insert(name.to_string(), id);
            true
        } else {
            false
        }
    }

    /// As [`Self::add_alias`], persisting through `store` first.
    pub fn add_alias_in<S: Store>(
        &mut self,
        store: &mut S,
        id: WaypointId,
        name: &str,
        rotation_angle: f32,
    ) -> Result<bool, S::Error> {
        if self.wp_by_name.contains_key(name)
            || self.alias_index.contains_key(name)
            || !self.wp_index.contains_key(&id)
        {
            return Ok(false);
        }
        store.save_waypoint_alias(&WaypointAliasRow {
            waypoint_id: id.0,
            alias: name.to_string(),
            rotation_angle,
        })?;
        Ok(self.add_alias(id, name, rotation_angle))
    }

    pub fn remove_alias(&mut self, id: WaypointId, name: &str) -> bool {
        let Some(&index) = self.wp_index.get(&id) else {
            return false;
        };
        if self.waypoints[index].remove_alias(name).is_some() {
            self.alias_index.remove(name);
            true
        } else {
            false
        }
    }

    /// As [`Self::remove_alias`], persisting through `store` first.
    pub fn remove_alias_in<S: Store>(
        &mut self,
        store: &mut S,
        id: WaypointId,
        name: &str,
    ) -> Result<bool, S::Error> {
        store.delete_waypoint_alias(id.0, name)?;
        Ok(self.remove_alias(id, name))
    }

    /// Set the facing angle of an existing alias.
    pub fn set_alias_rotation(&mut self, id: WaypointId, name: &str, angle: f32) -> bool {
        match self.wp_index.get(&id) {
            Some(&index) => self.waypoints[index].set_rotation_angle(name, angle),
            None => false,
        }
    }
}
