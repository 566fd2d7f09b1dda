//! Contraction hierarchies: a precomputed shortcut overlay answering
//! node-to-node queries with a bidirectional upward search.
//!
//! The hierarchy is built offline for one fixed profile and trades
//! preprocessing time and memory for fast, low-RAM queries; it yields the
//! same routes as the standard A* planner. Custom profiles require
//! rebuilding.

use crate::assemble::plan_with_search;
use crate::costing::{Costing, ProfileCosting};
use crate::graph::RoadGraph;
use crate::{PlanError, Router};
use geo::Coord;
use std::cmp::Reverse;
use std::collections::hash_map::Entry;
use std::collections::{BinaryHeap, HashMap};
use tracing::{debug, trace};
use wayfinder_route::{Route, RouteProfile};

/// Shared with the A* planners so weights are comparable.
const WEIGHT_SCALE: f64 = 1000.0;

/// Witness searches settle at most this many nodes before giving up and
/// adding the shortcut. Extra shortcuts never change the shortest path.
const WITNESS_SETTLE_LIMIT: usize = 64;

#[derive(Debug, Clone)]
enum ChEdgeKind {
    /// An original arc of the road graph.
    Arc(usize),
    /// A shortcut standing for two chained hierarchy edges.
    Shortcut(usize, usize),
}

#[derive(Debug, Clone)]
struct ChEdge {
    from: usize,
    to: usize,
    weight: u64,
    kind: ChEdgeKind,
}

/// Precomputed contraction data for one profile. Nodes are contracted in id
/// order, so the node id doubles as the hierarchy rank.
#[derive(Debug, Clone)]
pub struct ContractionHierarchy {
    profile: RouteProfile,
    edges: Vec<ChEdge>,
    outbound: Vec<Vec<usize>>,
    inbound: Vec<Vec<usize>>,
}

impl ContractionHierarchy {
    /// The profile the hierarchy was built for.
    pub fn profile(&self) -> &RouteProfile {
        &self.profile
    }

    /// Builds the hierarchy for a graph under a fixed profile.
    pub fn build(graph: &RoadGraph, profile: RouteProfile) -> Self {
        let costing = ProfileCosting::new(&profile);
        let nodes = graph.node_count();
        let mut ch = Self {
            profile: profile.clone(),
            edges: Vec::new(),
            outbound: vec![Vec::new(); nodes],
            inbound: vec![Vec::new(); nodes],
        };
        for id in 0..graph.arc_count() {
            let arc = graph.arc(id);
            if let Some(cost) = costing.arc_cost(arc, false) {
                ch.push_edge(ChEdge {
                    from: arc.from,
                    to: arc.to,
                    weight: (cost.weight * WEIGHT_SCALE).round() as u64,
                    kind: ChEdgeKind::Arc(id),
                });
            }
        }

        let mut contracted = vec![false; nodes];
        let mut shortcuts = 0usize;
        for v in 0..nodes {
            let inbound: Vec<usize> = ch.inbound[v]
                .iter()
                .copied()
                .filter(|&e| !contracted[ch.edges[e].from] && ch.edges[e].from != v)
                .collect();
            let outbound: Vec<usize> = ch.outbound[v]
                .iter()
                .copied()
                .filter(|&e| !contracted[ch.edges[e].to] && ch.edges[e].to != v)
                .collect();
            for &e1 in &inbound {
                for &e2 in &outbound {
                    let u = ch.edges[e1].from;
                    let w = ch.edges[e2].to;
                    if u == w {
                        continue;
                    }
                    let via_weight = ch.edges[e1].weight + ch.edges[e2].weight;
                    if ch.witness_distance(u, w, v, via_weight, &contracted) <= via_weight {
                        continue;
                    }
                    ch.push_edge(ChEdge {
                        from: u,
                        to: w,
                        weight: via_weight,
                        kind: ChEdgeKind::Shortcut(e1, e2),
                    });
                    shortcuts += 1;
                }
            }
            contracted[v] = true;
        }
        debug!(nodes, shortcuts, "contraction hierarchy built");
        ch
    }

    fn push_edge(&mut self, edge: ChEdge) {
        let id = self.edges.len();
        self.outbound[edge.from].push(id);
        self.inbound[edge.to].push(id);
        self.edges.push(edge);
    }

    /// The shortest distance from `u` to `w` avoiding `v` over nodes not
    /// yet contracted, or `u64::MAX` when the bounded search finds none no
    /// better than `bound`.
    fn witness_distance(
        &self,
        u: usize,
        w: usize,
        v: usize,
        bound: u64,
        contracted: &[bool],
    ) -> u64 {
        let mut dist: HashMap<usize, u64> = HashMap::new();
        let mut heap = BinaryHeap::new();
        dist.insert(u, 0);
        heap.push(Reverse((0u64, u)));
        let mut settled = 0;
        while let Some(Reverse((d, node))) = heap.pop() {
            if d > bound || settled >= WITNESS_SETTLE_LIMIT {
                break;
            }
            if node == w {
                return d;
            }
            if dist.get(&node).copied().unwrap_or(u64::MAX) < d {
                continue;
            }
            settled += 1;
            for &e in &self.outbound[node] {
                let edge = &self.edges[e];
                if edge.to == v || contracted[edge.to] {
                    continue;
                }
                let next = d + edge.weight;
                if next < dist.get(&edge.to).copied().unwrap_or(u64::MAX) {
                    dist.insert(edge.to, next);
                    heap.push(Reverse((next, edge.to)));
                }
            }
        }
        u64::MAX
    }

    /// Answers a node-to-node query, returning the original arc ids of the
    /// shortest path.
    pub fn search(&self, start: usize, goal: usize) -> Option<Vec<usize>> {
        if start == goal {
            return Some(Vec::new());
        }
        let forward = self.settle(start, Direction::Forward);
        let backward = self.settle(goal, Direction::Backward);

        let mut best: Option<(u64, usize)> = None;
        for (&node, &(df, _)) in &forward {
            if let Some(&(db, _)) = backward.get(&node) {
                let total = df.saturating_add(db);
                if best.is_none_or(|(b, _)| total < b) {
                    best = Some((total, node));
                }
            }
        }
        let (weight, meet) = best?;
        trace!(start, goal, weight, meet, "hierarchy query met");

        let mut edge_ids = Vec::new();
        let mut node = meet;
        while let Some(&(_, Some(edge))) = forward.get(&node) {
            edge_ids.push(edge);
            node = self.edges[edge].from;
        }
        edge_ids.reverse();
        node = meet;
        while let Some(&(_, Some(edge))) = backward.get(&node) {
            edge_ids.push(edge);
            node = self.edges[edge].to;
        }

        let mut arcs = Vec::new();
        for edge in edge_ids {
            self.unpack(edge, &mut arcs);
        }
        Some(arcs)
    }

    fn unpack(&self, edge: usize, arcs: &mut Vec<usize>) {
        match self.edges[edge].kind {
            ChEdgeKind::Arc(arc) => arcs.push(arc),
            ChEdgeKind::Shortcut(first, second) => {
                self.unpack(first, arcs);
                self.unpack(second, arcs);
            }
        }
    }

    /// Dijkstra over the upward half of the hierarchy, keeping the parent
    /// edge of each settled node.
    fn settle(&self, origin: usize, direction: Direction) -> HashMap<usize, (u64, Option<usize>)> {
        let mut dist: HashMap<usize, (u64, Option<usize>)> = HashMap::new();
        let mut heap = BinaryHeap::new();
        dist.insert(origin, (0, None));
        heap.push(Reverse((0u64, origin)));
        while let Some(Reverse((d, node))) = heap.pop() {
            if dist.get(&node).map_or(u64::MAX, |&(best, _)| best) < d {
                continue;
            }
            let edges: &[usize] = match direction {
                Direction::Forward => &self.outbound[node],
                Direction::Backward => &self.inbound[node],
            };
            for &e in edges {
                let edge = &self.edges[e];
                // Only climb the hierarchy; the two searches meet on top.
                let next_node = match direction {
                    Direction::Forward if edge.to > node => edge.to,
                    Direction::Backward if edge.from > node => edge.from,
                    _ => continue,
                };
                let next = d + edge.weight;
                match dist.entry(next_node) {
                    Entry::Occupied(mut entry) => {
                        if next < entry.get().0 {
                            entry.insert((next, Some(e)));
                            heap.push(Reverse((next, next_node)));
                        }
                    }
                    Entry::Vacant(entry) => {
                        entry.insert((next, Some(e)));
                        heap.push(Reverse((next, next_node)));
                    }
                }
            }
        }
        dist
    }
}

#[derive(Clone, Copy)]
enum Direction {
    Forward,
    Backward,
}

/// The contraction hierarchy planner. Queries the precomputed data attached
/// to the graph; the route profile must match the one the hierarchy was
/// built with.
#[derive(Debug, Default, Clone, Copy)]
pub struct ContractionHierarchyRouter;

impl Router for ContractionHierarchyRouter {
    fn plan(
        &self,
        graph: &RoadGraph,
        waypoints: &[Coord<f64>],
        profile: &RouteProfile,
    ) -> Result<Route, PlanError> {
        let hierarchy = graph.contraction().ok_or(PlanError::NoContractionData)?;
        if hierarchy.profile() != profile {
            return Err(PlanError::ProfileMismatch);
        }
        let costing = ProfileCosting::new(profile);
        plan_with_search(graph, waypoints, profile, &costing, |from, to| {
            hierarchy.search(graph.arc(from.arc).to, graph.arc(to.arc).from)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::astar::StandardAStarRouter;
    use geo::coord;
    use proptest::prelude::*;
    use wayfinder_road::{RoadType, RoadTypeFlags};
    use wayfinder_route::ProfileType;

    /// A 4x4 grid with one fast diagonal-ish shortcut street.
    fn grid() -> RoadGraph {
        let mut graph = RoadGraph::new(1.0);
        for y in 0..4 {
            for x in 0..4 {
                graph.add_node(coord! {x: f64::from(x) * 100.0, y: f64::from(y) * 100.0});
            }
        }
        let road = RoadTypeFlags::new().with_road_type(RoadType::Residential);
        for y in 0..4i32 {
            for x in 0..4i32 {
                let here = usize::try_from(y * 4 + x).unwrap();
                if x < 3 {
                    graph.add_road(
                        here,
                        here + 1,
                        road,
                        vec![graph.node(here).position, graph.node(here + 1).position],
                        &format!("Row {y}"),
                        "",
                        0.0,
                    );
                }
                if y < 3 {
                    graph.add_road(
                        here,
                        here + 4,
                        road,
                        vec![graph.node(here).position, graph.node(here + 4).position],
                        &format!("Column {x}"),
                        "",
                        0.0,
                    );
                }
            }
        }
        // A faster secondary road cutting across the middle.
        let secondary = RoadTypeFlags::new().with_road_type(RoadType::Secondary);
        graph.add_road(
            5,
            10,
            secondary,
            vec![graph.node(5).position, graph.node(10).position],
            "Cross Route",
            "",
            0.0,
        );
        graph
    }

    /// Traversal seconds without junction times; equal-weight paths agree
    /// on this even when they differ in turn count.
    fn traversal_secs(route: &Route) -> f64 {
        route.time - route.segments.iter().map(|s| s.turn_time).sum::<f64>()
    }

    #[test]
    fn queries_match_the_standard_planner() {
        let mut graph = grid();
        let profile = wayfinder_route::RouteProfile::new(ProfileType::Car);
        let hierarchy = ContractionHierarchy::build(&graph, profile.clone());
        graph.set_contraction(hierarchy);

        let waypoints = [coord! {x: 10.0, y: 0.0}, coord! {x: 290.0, y: 300.0}];
        let expected = StandardAStarRouter
            .plan(&graph, &waypoints, &profile)
            .unwrap();
        let actual = ContractionHierarchyRouter
            .plan(&graph, &waypoints, &profile)
            .unwrap();
        assert!((traversal_secs(&expected) - traversal_secs(&actual)).abs() < 0.05);
    }

    #[test]
    fn profile_mismatch_is_rejected() {
        let mut graph = grid();
        let car = wayfinder_route::RouteProfile::new(ProfileType::Car);
        graph.set_contraction(ContractionHierarchy::build(&graph, car));

        let walk = wayfinder_route::RouteProfile::new(ProfileType::Walk);
        let err = ContractionHierarchyRouter
            .plan(
                &graph,
                &[coord! {x: 10.0, y: 0.0}, coord! {x: 290.0, y: 300.0}],
                &walk,
            )
            .unwrap_err();
        assert!(matches!(err, PlanError::ProfileMismatch), "{err}");
    }

    #[test]
    fn missing_data_is_reported() {
        let graph = grid();
        let profile = wayfinder_route::RouteProfile::new(ProfileType::Car);
        let err = ContractionHierarchyRouter
            .plan(
                &graph,
                &[coord! {x: 10.0, y: 0.0}, coord! {x: 290.0, y: 300.0}],
                &profile,
            )
            .unwrap_err();
        assert!(matches!(err, PlanError::NoContractionData), "{err}");
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]
        #[test]
        fn random_queries_match_the_standard_planner(
            sx in 0.0f64..300.0, sy in 0.0f64..300.0,
            tx in 0.0f64..300.0, ty in 0.0f64..300.0,
        ) {
            let mut graph = grid();
            let profile = wayfinder_route::RouteProfile::new(ProfileType::Car);
            graph.set_contraction(ContractionHierarchy::build(&graph, profile.clone()));

            let waypoints = [coord! {x: sx, y: sy}, coord! {x: tx, y: ty}];
            let expected = StandardAStarRouter.plan(&graph, &waypoints, &profile);
            let actual = ContractionHierarchyRouter.plan(&graph, &waypoints, &profile);
            match (expected, actual) {
                (Ok(e), Ok(a)) => {
                    let (e, a) = (traversal_secs(&e), traversal_secs(&a));
                    prop_assert!((e - a).abs() < 0.05, "expected {e} got {a}");
                }
                (e, a) => prop_assert!(false, "planner disagreement: {e:?} vs {a:?}"),
            }
        }
    }
}
