//! Route assembly: turns a planned arc sequence into a [`Route`] with
//! classified turns, junction topology, roundabout exit numbers, and the
//! path-to-junction records at both ends.

use crate::costing::{turn_angle, Costing};
use crate::graph::{path_length, ArcSnap, RoadGraph};
use crate::PlanError;
use geo::{Coord, LineString};
use tracing::debug;
use wayfinder_road::ArcRoadType;
use wayfinder_route::{JunctionInfo, PathToJunction, RoundaboutState, Route, RouteProfile};

/// Angle either side of the incoming tangent within which two choices make
/// a junction a fork.
const FORK_ANGLE_DEGREES: f64 = 22.5;

/// Hop limit when walking out to the non-trivial junctions beyond the ends
/// of a route.
const JUNCTION_WALK_LIMIT: usize = 16;

/// One leg of a plan: the arcs between two consecutive waypoints, with the
/// entry fraction of the first arc and the exit fraction of the last.
pub(crate) struct LegPlan {
    pub arcs: Vec<usize>,
    pub start_fraction: f64,
    pub end_fraction: f64,
}

/// Plans a route using `search` to find the arc sequence of each leg
/// between two snapped endpoints, then assembles the route.
///
/// `search(from, to)` returns the arcs strictly between the two snapped
/// arcs, or `None` when no legal path exists.
pub(crate) fn plan_with_search<F>(
    graph: &RoadGraph,
    waypoints: &[Coord<f64>],
    profile: &RouteProfile,
    costing: &dyn Costing,
    mut search: F,
) -> Result<Route, PlanError>
where
    F: FnMut(&ArcSnap, &ArcSnap) -> Option<Vec<usize>>,
{
    if waypoints.len() < 2 {
        return Err(PlanError::NotEnoughWaypoints);
    }
    let snaps: Vec<ArcSnap> = waypoints
        .iter()
        .enumerate()
        .map(|(index, &point)| {
            graph
                .snap(point, costing)
                .ok_or(PlanError::NoNearbyRoad { index })
        })
        .collect::<Result<_, _>>()?;

    let mut legs = Vec::new();
    for (index, pair) in snaps.windows(2).enumerate() {
        let (from, to) = (pair[0], pair[1]);
        if from.arc == to.arc && to.fraction >= from.fraction {
            legs.push(LegPlan {
                arcs: vec![from.arc],
                start_fraction: from.fraction,
                end_fraction: to.fraction,
            });
            continue;
        }
        let between = search(&from, &to).ok_or(PlanError::Unreachable {
            from: index,
            to: index + 1,
        })?;
        let mut arcs = Vec::with_capacity(between.len() + 2);
        arcs.push(from.arc);
        arcs.extend(between);
        arcs.push(to.arc);
        legs.push(LegPlan {
            arcs,
            start_fraction: from.fraction,
            end_fraction: to.fraction,
        });
    }

    Ok(build_route(graph, costing, profile, &legs))
}

/// Assembles a [`Route`] from planned legs.
pub(crate) fn build_route(
    graph: &RoadGraph,
    costing: &dyn Costing,
    profile: &RouteProfile,
    legs: &[LegPlan],
) -> Route {
    let mut route = Route::new(profile.clone(), graph.point_scale());
    let mut previous_arc: Option<usize> = None;
    let arc_total: usize = legs.iter().map(|l| l.arcs.len()).sum();

    for (section, leg) in legs.iter().enumerate() {
        let section_number = u32::try_from(section).unwrap_or(u32::MAX);
        for (index, &arc_id) in leg.arcs.iter().enumerate() {
            let arc = graph.arc(arc_id);
            let is_route_start = section == 0 && index == 0;
            let is_route_end = section == legs.len() - 1 && index == leg.arcs.len() - 1;
            let endpoint = is_route_start || is_route_end;

            let start_fraction = if index == 0 { leg.start_fraction } else { 0.0 };
            let end_fraction = if index == leg.arcs.len() - 1 {
                leg.end_fraction
            } else {
                1.0
            };
            let span = (end_fraction - start_fraction).max(0.0);
            let contour = slice_path(&arc.path, start_fraction, end_fraction);
            let distance = arc.length * span;
            let secs = costing
                .arc_cost(arc, endpoint)
                .map_or(0.0, |cost| cost.secs)
                * span;

            let junction = match previous_arc {
                Some(prev_id) if prev_id != arc_id => {
                    junction_info(graph, costing, prev_id, arc_id)
                }
                _ => JunctionInfo::default(),
            };

            route.append_segment(
                &junction,
                &contour,
                &arc.name,
                &arc.reference,
                arc.attributes.road_type(),
                arc.max_speed,
                distance,
                secs,
                section_number,
                costing.arc_restricted(arc),
            );
            previous_arc = Some(arc_id);
        }
    }

    backfill_roundabout_entries(&mut route);
    attach_junction_paths(graph, costing, &mut route, legs);
    debug!(
        arcs = arc_total,
        segments = route.segments.len(),
        distance = route.distance,
        time = route.time,
        "assembled route"
    );
    route
}

/// Computes the junction topology between two consecutive route arcs.
fn junction_info(
    graph: &RoadGraph,
    costing: &dyn Costing,
    prev_id: usize,
    next_id: usize,
) -> JunctionInfo {
    let prev = graph.arc(prev_id);
    let next = graph.arc(next_id);
    let node_id = next.from;
    let node = graph.node(node_id);

    let taken_angle = turn_angle(prev, next);
    let mut choices = 0;
    let mut left_alternatives = 0;
    let mut right_alternatives = 0;
    let mut fork_partner_within_angle = false;
    for &out_id in graph.out_arcs(node_id) {
        if prev.opposing == Some(out_id) {
            continue;
        }
        let out = graph.arc(out_id);
        if out_id != next_id && !costing.arc_allowed(out, false) {
            continue;
        }
        choices += 1;
        if out_id == next_id {
            continue;
        }
        let angle = turn_angle(prev, out);
        if angle < taken_angle {
            left_alternatives += 1;
        } else {
            right_alternatives += 1;
        }
        if angle.abs() <= FORK_ANGLE_DEGREES {
            fork_partner_within_angle = true;
        }
    }
    let is_fork =
        choices == 2 && taken_angle.abs() <= FORK_ANGLE_DEGREES && fork_partner_within_angle;
    let is_turn_off =
        next.attributes.road_type().hierarchy() > prev.attributes.road_type().hierarchy();

    let roundabout = match (prev.attributes.roundabout(), next.attributes.roundabout()) {
        (false, true) => RoundaboutState::Enter,
        (true, true) => RoundaboutState::Continue,
        (true, false) => RoundaboutState::Exit,
        (false, false) => RoundaboutState::None,
    };

    JunctionInfo {
        turn_angle: taken_angle,
        choices,
        left_alternatives,
        right_alternatives,
        is_fork,
        is_turn_off,
        roundabout,
        exit_number: 0,
        signalized: node.signalized,
        turn_time: costing.transition_cost(prev, next, node).secs,
        junction_name: node.junction_name.clone(),
        junction_ref: node.junction_ref.clone(),
    }
}

/// Copies each roundabout exit number back onto the matching entry turn so
/// that the instruction at the entry can say which exit to take.
fn backfill_roundabout_entries(route: &mut Route) {
    let mut exits_seen = 0;
    let mut pending_enter: Option<usize> = None;
    for index in 0..route.segments.len() {
        match route.segments[index].turn.roundabout {
            RoundaboutState::Enter => {
                pending_enter = Some(index);
                exits_seen = 0;
            }
            RoundaboutState::Continue => exits_seen += 1,
            RoundaboutState::Exit => {
                exits_seen += 1;
                route.segments[index].turn.exit_number = exits_seen;
                if let Some(enter) = pending_enter.take() {
                    route.segments[enter].turn.exit_number = exits_seen;
                }
            }
            RoundaboutState::None => {}
        }
    }
}

/// Fills in the paths from the route ends to the nearest non-trivial
/// junctions.
fn attach_junction_paths(
    graph: &RoadGraph,
    costing: &dyn Costing,
    route: &mut Route,
    legs: &[LegPlan],
) {
    let (Some(first_leg), Some(last_leg)) = (legs.first(), legs.last()) else {
        return;
    };
    let (Some(&first_arc), Some(&last_arc)) = (first_leg.arcs.first(), last_leg.arcs.last()) else {
        return;
    };

    // Before: from the route start backwards to the previous junction.
    {
        let arc = graph.arc(first_arc);
        let mut points = slice_path(&arc.path, 0.0, first_leg.start_fraction);
        points.reverse();
        let start_road_type = arc.attributes.road_type();
        let mut end_road_type = start_road_type;
        walk_to_junction(
            graph,
            costing,
            arc.opposing,
            arc.from,
            &mut points,
            &mut end_road_type,
        );
        route.to_junction_before = PathToJunction {
            distance: path_length(&points) * graph.point_scale(),
            path: LineString::new(points),
            start_road_type,
            end_road_type,
        };
    }

    // After: from the route end forwards to the next junction.
    {
        let arc = graph.arc(last_arc);
        let mut points = slice_path(&arc.path, last_leg.end_fraction, 1.0);
        let start_road_type = arc.attributes.road_type();
        let mut end_road_type = start_road_type;
        walk_to_junction(
            graph,
            costing,
            Some(last_arc),
            arc.to,
            &mut points,
            &mut end_road_type,
        );
        route.to_junction_after = PathToJunction {
            distance: path_length(&points) * graph.point_scale(),
            path: LineString::new(points),
            start_road_type,
            end_road_type,
        };
    }
}

/// Walks forward from `node`, entered via `came_by`, while junctions stay
/// trivial (a single onward choice), appending geometry and updating the
/// road type at the far end.
fn walk_to_junction(
    graph: &RoadGraph,
    costing: &dyn Costing,
    mut came_by: Option<usize>,
    mut node: usize,
    points: &mut Vec<Coord<f64>>,
    end_road_type: &mut ArcRoadType,
) {
    for _ in 0..JUNCTION_WALK_LIMIT {
        let opposing = came_by.and_then(|id| graph.arc(id).opposing);
        let onward: Vec<usize> = graph
            .out_arcs(node)
            .iter()
            .copied()
            .filter(|&id| Some(id) != opposing && costing.arc_allowed(graph.arc(id), false))
            .collect();
        // A non-trivial junction offers more or less than one way on.
        if onward.len() != 1 {
            return;
        }
        let next = onward[0];
        let arc = graph.arc(next);
        extend(points, &arc.path);
        *end_road_type = arc.attributes.road_type();
        came_by = Some(next);
        node = arc.to;
    }
}

fn extend(points: &mut Vec<Coord<f64>>, more: &[Coord<f64>]) {
    let mut more = more;
    if let (Some(last), Some(first)) = (points.last(), more.first()) {
        if last == first {
            more = &more[1..];
        }
    }
    points.extend_from_slice(more);
}

/// Cuts a path to the part between two length fractions, interpolating the
/// cut points.
pub(crate) fn slice_path(path: &[Coord<f64>], from: f64, to: f64) -> Vec<Coord<f64>> {
    let total = path_length(path);
    if path.len() < 2 || total <= 0.0 {
        return path.to_vec();
    }
    let from_len = total * from.clamp(0.0, 1.0);
    let to_len = total * to.clamp(0.0, 1.0);
    if to_len < from_len {
        return Vec::new();
    }

    let mut out = Vec::new();
    let mut walked = 0.0;
    for pair in path.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let len = (b.x - a.x).hypot(b.y - a.y);
        let end = walked + len;
        if end >= from_len && walked <= to_len && len > 0.0 {
            let t0 = ((from_len - walked) / len).clamp(0.0, 1.0);
            let t1 = ((to_len - walked) / len).clamp(0.0, 1.0);
            let p0 = Coord {
                x: a.x + (b.x - a.x) * t0,
                y: a.y + (b.y - a.y) * t0,
            };
            let p1 = Coord {
                x: a.x + (b.x - a.x) * t1,
                y: a.y + (b.y - a.y) * t1,
            };
            if out.is_empty() {
                out.push(p0);
            }
            if p1 != *out.last().expect("just pushed") {
                out.push(p1);
            }
        }
        walked = end;
    }
    if out.is_empty() {
        out.push(path[0]);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::coord;

    #[test]
    fn slice_path_interpolates_cut_points() {
        let path = [
            coord! {x: 0.0, y: 0.0},
            coord! {x: 100.0, y: 0.0},
            coord! {x: 100.0, y: 100.0},
        ];
        let middle = slice_path(&path, 0.25, 0.75);
        assert_eq!(middle.first(), Some(&coord! {x: 50.0, y: 0.0}));
        assert_eq!(middle.last(), Some(&coord! {x: 100.0, y: 50.0}));
        assert!(middle.contains(&coord! {x: 100.0, y: 0.0}));

        let whole = slice_path(&path, 0.0, 1.0);
        assert_eq!(whole, path.to_vec());
    }

    #[test]
    fn slice_path_handles_degenerate_ranges() {
        let path = [coord! {x: 0.0, y: 0.0}, coord! {x: 10.0, y: 0.0}];
        let empty = slice_path(&path, 0.8, 0.2);
        assert!(empty.is_empty());
        let point = slice_path(&path, 0.5, 0.5);
        assert_eq!(point, vec![coord! {x: 5.0, y: 0.0}]);
    }
}
