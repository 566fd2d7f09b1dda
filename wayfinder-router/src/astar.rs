//! A*-family planners.
//!
//! The standard planner searches over nodes and is fast, but it cannot
//! produce a route that passes twice through the same junction and it
//! ignores junction transition costs. The turn-expanded planner searches
//! over arcs, charging transition costs between consecutive arcs, which
//! also lets a route revisit a junction.

use crate::assemble::plan_with_search;
use crate::costing::{Costing, ProfileCosting};
use crate::graph::{ArcSnap, RoadGraph};
use crate::{PlanError, Router};
use geo::Coord;
use pathfinding::prelude::astar;
use tracing::trace;
use wayfinder_route::{Route, RouteProfile};

/// Search weights are scaled to integer milliseconds (or millimeters for
/// shortest routes) for the priority queue.
const WEIGHT_SCALE: f64 = 1000.0;

fn scale_weight(weight: f64) -> u64 {
    (weight * WEIGHT_SCALE).round() as u64
}

/// An admissible lower bound on the remaining weight between two nodes.
fn remaining_weight(
    graph: &RoadGraph,
    costing: &ProfileCosting,
    shortest: bool,
    from: usize,
    to: usize,
) -> u64 {
    let meters = graph.node_distance(from, to);
    let weight = if shortest {
        meters
    } else {
        meters / (costing.speed_bound() / 3.6)
    };
    scale_weight(weight)
}

/// Finds the arcs of the cheapest node-to-node path, or `None` if the goal
/// is unreachable.
fn node_search(
    graph: &RoadGraph,
    costing: &ProfileCosting,
    shortest: bool,
    start: usize,
    goal: usize,
) -> Option<Vec<usize>> {
    let (nodes, weight) = astar(
        &start,
        |&node| {
            graph
                .out_arcs(node)
                .iter()
                .filter_map(|&id| {
                    let arc = graph.arc(id);
                    costing
                        .arc_cost(arc, false)
                        .map(|cost| (arc.to, scale_weight(cost.weight)))
                })
                .collect::<Vec<_>>()
        },
        |&node| remaining_weight(graph, costing, shortest, node, goal),
        |&node| node == goal,
    )?;
    trace!(start, goal, weight, "node search settled");

    let mut arcs = Vec::with_capacity(nodes.len().saturating_sub(1));
    for pair in nodes.windows(2) {
        let arc = cheapest_arc_between(graph, costing, pair[0], pair[1])?;
        arcs.push(arc);
    }
    Some(arcs)
}

/// The cheapest allowed arc from `from` to `to`.
fn cheapest_arc_between(
    graph: &RoadGraph,
    costing: &ProfileCosting,
    from: usize,
    to: usize,
) -> Option<usize> {
    graph
        .out_arcs(from)
        .iter()
        .copied()
        .filter(|&id| graph.arc(id).to == to)
        .filter_map(|id| {
            costing
                .arc_cost(graph.arc(id), false)
                .map(|cost| (id, scale_weight(cost.weight)))
        })
        .min_by_key(|&(_, weight)| weight)
        .map(|(id, _)| id)
}

/// Finds the arcs strictly between two snapped arcs by searching over arcs
/// with junction transition costs.
fn arc_search(
    graph: &RoadGraph,
    costing: &ProfileCosting,
    shortest: bool,
    from: &ArcSnap,
    to: &ArcSnap,
) -> Option<Vec<usize>> {
    if from.arc == to.arc {
        // Doubling back along the starting road reduces to a node search
        // around the block.
        return node_search(
            graph,
            costing,
            shortest,
            graph.arc(from.arc).to,
            graph.arc(from.arc).from,
        );
    }
    let goal_node = graph.arc(to.arc).from;
    let (arcs, weight) = astar(
        &from.arc,
        |&id| {
            let arc = graph.arc(id);
            let node = graph.node(arc.to);
            graph
                .out_arcs(arc.to)
                .iter()
                .filter_map(|&next_id| {
                    let next = graph.arc(next_id);
                    // The goal arc is an endpoint of the route.
                    let cost = costing.arc_cost(next, next_id == to.arc)?;
                    let transition = costing.transition_cost(arc, next, node);
                    Some((next_id, scale_weight(cost.weight + transition.weight)))
                })
                .collect::<Vec<_>>()
        },
        |&id| remaining_weight(graph, costing, shortest, graph.arc(id).to, goal_node),
        |&id| id == to.arc,
    )?;
    trace!(from = from.arc, to = to.arc, weight, "arc search settled");

    // Strip the endpoint arcs; the caller re-attaches them.
    Some(arcs[1..arcs.len() - 1].to_vec())
}

/// The standard A* planner.
#[derive(Debug, Default, Clone, Copy)]
pub struct StandardAStarRouter;

impl Router for StandardAStarRouter {
    fn plan(
        &self,
        graph: &RoadGraph,
        waypoints: &[Coord<f64>],
        profile: &RouteProfile,
    ) -> Result<Route, PlanError> {
        let costing = ProfileCosting::new(profile);
        plan_with_search(graph, waypoints, profile, &costing, |from, to| {
            node_search(
                graph,
                &costing,
                profile.shortest,
                graph.arc(from.arc).to,
                graph.arc(to.arc).from,
            )
        })
    }
}

/// The turn-expanded A* planner: slower and hungrier than the standard
/// planner, but aware of junction costs and able to pass through the same
/// junction twice.
#[derive(Debug, Default, Clone, Copy)]
pub struct TurnExpandedAStarRouter;

impl Router for TurnExpandedAStarRouter {
    fn plan(
        &self,
        graph: &RoadGraph,
        waypoints: &[Coord<f64>],
        profile: &RouteProfile,
    ) -> Result<Route, PlanError> {
        let costing = ProfileCosting::new(profile);
        plan_with_search(graph, waypoints, profile, &costing, |from, to| {
            arc_search(graph, &costing, profile.shortest, from, to)
        })
    }
}
