//! Dijkstra routing over the waypoint graph.
//!
//! All routing scratch state (tentative cost, predecessor, entry edge,
//! exclusion) lives in the [`Router`], not on the waypoints: the router
//! owns a dense node array that is lazily invalidated by a generation
//! counter, so repeated route queries incur no allocations after warm-up
//! and no query can observe another query's leftover state.

use std::collections::{BinaryHeap, HashMap};

use crate::edge::EdgeId;
use crate::waypoint::{Waypoint, WaypointFlags, WaypointId};

// ---------------------------------------------------------------------------
// RouteFilter
// ---------------------------------------------------------------------------

/// Predicate excluding waypoints from a route computation. `true` means
/// "exclude". Callers supply concrete filters; the router knows nothing of
/// the tag taxonomy.
pub trait RouteFilter {
    fn excluded(&self, wp: &Waypoint) -> bool;
}

impl<F: Fn(&Waypoint) -> bool> RouteFilter for F {
    fn excluded(&self, wp: &Waypoint) -> bool {
        self(wp)
    }
}

/// Accepts every waypoint.
pub struct NoFilter;

impl RouteFilter for NoFilter {
    fn excluded(&self, _wp: &Waypoint) -> bool {
        false
    }
}

/// Excludes waypoints carrying any of the given tags.
pub struct ExcludeFlags(pub WaypointFlags);

impl RouteFilter for ExcludeFlags {
    fn excluded(&self, wp: &Waypoint) -> bool {
        wp.flags.intersects(self.0)
    }
}

// ---------------------------------------------------------------------------
// Router internals
// ---------------------------------------------------------------------------

#[derive(Clone)]
struct Node {
    g: f32,
    parent: usize,
    via: EdgeId,
    generation: u32,
    open: bool,
    excluded: bool,
}

impl Default for Node {
    fn default() -> Self {
        Self {
            g: f32::INFINITY,
            parent: usize::MAX,
            via: EdgeId(u32::MAX),
            generation: 0,
            open: false,
            excluded: false,
        }
    }
}

/// Reference into the node array, ordered by `g` for use in `BinaryHeap`.
#[derive(Copy, Clone)]
struct NodeRef {
    idx: usize,
    g: f32,
}

impl PartialEq for NodeRef {
    fn eq(&self, other: &Self) -> bool {
        self.idx == other.idx && self.g.total_cmp(&other.g).is_eq()
    }
}

impl Eq for NodeRef {}

impl Ord for NodeRef {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Reverse so BinaryHeap (max-heap) pops smallest g first.
        other.g.total_cmp(&self.g)
    }
}

impl PartialOrd for NodeRef {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// One hop of a computed route: the waypoint index, plus the edge taken
/// into it (`None` for the starting waypoint).
pub(crate) struct RouteStep {
    pub waypoint: usize,
    pub via: Option<EdgeId>,
}

/// Reusable Dijkstra scratch. Owned by the network; `&mut self` on the
/// entry point enforces the non-reentrant single-writer contract at
/// compile time.
#[derive(Default)]
pub(crate) struct Router {
    nodes: Vec<Node>,
    generation: u32,
}

impl Router {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Shortest route from `start` to `goal` (indexes into `waypoints`),
    /// weighted by cached link distances. Empty when no route exists or
    /// either terminus is excluded; a single step for `start == goal`.
    pub(crate) fn shortest(
        &mut self,
        waypoints: &[Waypoint],
        index_of: &HashMap<WaypointId, usize>,
        start: usize,
        goal: usize,
        filter: &dyn RouteFilter,
    ) -> Vec<RouteStep> {
        if filter.excluded(&waypoints[start]) || filter.excluded(&waypoints[goal]) {
            return Vec::new();
        }
        if start == goal {
            return vec![RouteStep {
                waypoint: start,
                via: None,
            }];
        }

        if self.nodes.len() < waypoints.len() {
            self.nodes.resize(waypoints.len(), Node::default());
        }
        self.generation = self.generation.wrapping_add(1);
        let cur_gen = self.generation;

        {
            let node = &mut self.nodes[start];
            node.g = 0.0;
            node.parent = usize::MAX;
            node.via = EdgeId(u32::MAX);
            node.generation = cur_gen;
            node.open = true;
            node.excluded = false;
        }

        let mut open: BinaryHeap<NodeRef> = BinaryHeap::new();
        open.push(NodeRef { idx: start, g: 0.0 });

        let found = loop {
            let Some(current) = open.pop() else {
                break false;
            };
            let ci = current.idx;

            // Skip stale entries.
            if self.nodes[ci].generation != cur_gen || !self.nodes[ci].open {
                continue;
            }
            if ci == goal {
                break true;
            }
            self.nodes[ci].open = false;
            let current_g = self.nodes[ci].g;

            for link in waypoints[ci].links() {
                let Some(&ni) = index_of.get(&link.target) else {
                    continue;
                };
                let n = &mut self.nodes[ni];
                if n.generation != cur_gen {
                    n.generation = cur_gen;
                    n.g = f32::INFINITY;
                    n.open = false;
                    n.excluded = filter.excluded(&waypoints[ni]);
                }
                if n.excluded {
                    continue;
                }
                let tentative = current_g + link.distance;
                // Strict improvement keeps the first-registered link on ties.
                if tentative >= n.g {
                    continue;
                }
                n.g = tentative;
                n.parent = ci;
                n.via = link.edge;
                n.open = true;
                open.push(NodeRef {
                    idx: ni,
                    g: tentative,
                });
            }
        };

        if !found {
            return Vec::new();
        }

        // Reconstruct by walking predecessors back from the goal.
        let mut steps = Vec::new();
        let mut ci = goal;
        loop {
            let node = &self.nodes[ci];
            let via = (node.parent != usize::MAX).then_some(node.via);
            steps.push(RouteStep { waypoint: ci, via });
            if node.parent == usize::MAX {
                break;
            }
            ci = node.parent;
        }
        steps.reverse();
        steps
    }
}
