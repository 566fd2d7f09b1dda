//! # Route planners
//!
//! Pluggable shortest-path strategies over an in-memory road graph, all
//! planning against the same profile-driven cost model and producing the
//! same [`Route`] data model.
//!
//! Strategy selection is by [`RouterType`]; [`RouterType::Default`] picks
//! the contraction hierarchy when precomputed data is attached to the
//! graph, and standard A* otherwise.

mod assemble;
mod astar;
mod ch;
mod costing;
mod graph;

use geo::Coord;
use thiserror::Error;
use wayfinder_route::{Route, RouteProfile};

pub use astar::{StandardAStarRouter, TurnExpandedAStarRouter};
pub use ch::{ContractionHierarchy, ContractionHierarchyRouter};
pub use costing::{normalize_degrees, turn_angle, Cost, Costing, ProfileCosting};
pub use graph::{ArcSnap, RoadArc, RoadGraph, RoadNode};

/// Errors arising while planning a route.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("at least two waypoints are needed")]
    NotEnoughWaypoints,
    #[error("no routable road near waypoint {index}")]
    NoNearbyRoad { index: usize },
    #[error("no route satisfying the profile exists between waypoints {from} and {to}")]
    Unreachable { from: usize, to: usize },
    #[error("no precomputed contraction data is attached to the graph")]
    NoContractionData,
    #[error("the contraction hierarchy was built for a different profile")]
    ProfileMismatch,
}

/// A route planner: one strategy for finding the cheapest path through a
/// road graph under a profile.
pub trait Router {
    /// Plans a route visiting the waypoints (map units) in order.
    ///
    /// The result honors the profile's legality rules, with restriction and
    /// zero-bonus relaxation at the two route endpoints only. Waypoint legs
    /// become route sections numbered from zero.
    ///
    /// # Errors
    ///
    /// Returns a [`PlanError`] when waypoints cannot be snapped to the
    /// graph, no legal path exists, or the strategy's precomputed data is
    /// missing or stale. No partial route is ever returned.
    fn plan(
        &self,
        graph: &RoadGraph,
        waypoints: &[Coord<f64>],
        profile: &RouteProfile,
    ) -> Result<Route, PlanError>;
}

/// Router strategy selection.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouterType {
    /// The router for which precomputed data is available in the map,
    /// falling back to [`RouterType::StandardAStar`].
    #[default]
    Default,
    /// Fast node-based A*; plenty of memory, no revisited junctions.
    StandardAStar,
    /// A* over arcs with junction costs; slower, but can pass through the
    /// same junction twice for more flexible routing.
    TurnExpandedAStar,
    /// The contraction hierarchy: for use where less RAM is available. The
    /// route profile is fixed when the hierarchy is built.
    StandardContractionHierarchy,
}

/// Resolves a router type against a graph.
pub fn router_for(router_type: RouterType, graph: &RoadGraph) -> Box<dyn Router> {
    match router_type {
        RouterType::Default => {
            if graph.contraction().is_some() {
                Box::new(ContractionHierarchyRouter)
            } else {
                Box::new(StandardAStarRouter)
            }
        }
        RouterType::StandardAStar => Box::new(StandardAStarRouter),
        RouterType::TurnExpandedAStar => Box::new(TurnExpandedAStarRouter),
        RouterType::StandardContractionHierarchy => Box::new(ContractionHierarchyRouter),
    }
}

/// Plans a route with the selected strategy.
///
/// # Errors
///
/// See [`Router::plan`].
pub fn plan_route(
    graph: &RoadGraph,
    waypoints: &[Coord<f64>],
    profile: &RouteProfile,
    router_type: RouterType,
) -> Result<Route, PlanError> {
    router_for(router_type, graph).plan(graph, waypoints, profile)
}
