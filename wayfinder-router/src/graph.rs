//! The in-memory routing graph: nodes with forward-star arc lists, directed
//! arcs carrying the packed attribute word, and endpoint snapping.
//!
//! How the graph is populated is up to the caller (map parsing is an
//! external concern); [`RoadGraph::add_road`] derives per-direction arcs
//! from a road object's packed type word.

use crate::costing::Costing;
use geo::Coord;
use wayfinder_road::{ArcAttributes, RoadDirection, RoadTypeFlags, VehicleAccess};

/// A junction or end of road in the routing graph.
#[derive(Debug, Clone)]
pub struct RoadNode {
    /// Position in map units.
    pub position: Coord<f64>,
    /// True if the junction is controlled by traffic lights.
    pub signalized: bool,
    /// The name of the junction, if any.
    pub junction_name: String,
    /// The reference code of the junction, if any.
    pub junction_ref: String,
    arcs: Vec<usize>,
}

/// A directed arc of the routing graph.
#[derive(Debug, Clone)]
pub struct RoadArc {
    /// The node this arc leaves.
    pub from: usize,
    /// The node this arc enters.
    pub to: usize,
    /// The packed attribute word.
    pub attributes: ArcAttributes,
    /// Geometry in map units, from `from` to `to` inclusive.
    pub path: Vec<Coord<f64>>,
    /// The name of the road object.
    pub name: String,
    /// The reference code of the road object.
    pub reference: String,
    /// Maximum legal speed in kph; zero means unknown.
    pub max_speed: f64,
    /// Length in meters.
    pub length: f64,
    /// The arc for the same road in the opposite direction, if any.
    pub opposing: Option<usize>,
}

impl RoadArc {
    /// The heading in degrees of the first line of the arc, counterclockwise
    /// from the positive x axis.
    pub fn entry_heading(&self) -> f64 {
        heading_of(&self.path, false)
    }

    /// The heading in degrees of the last line of the arc.
    pub fn exit_heading(&self) -> f64 {
        heading_of(&self.path, true)
    }
}

fn heading_of(path: &[Coord<f64>], last: bool) -> f64 {
    let (a, b) = if path.len() < 2 {
        return 0.0;
    } else if last {
        (path[path.len() - 2], path[path.len() - 1])
    } else {
        (path[0], path[1])
    };
    (b.y - a.y).atan2(b.x - a.x).to_degrees()
}

/// The result of snapping a point onto the graph: an arc, the fraction along
/// it, and the nearest point on its geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArcSnap {
    /// The snapped arc.
    pub arc: usize,
    /// The fraction of the arc's length at the snap point, 0..1.
    pub fraction: f64,
    /// The nearest point on the arc in map units.
    pub point: Coord<f64>,
    /// The distance from the query point to `point` in meters.
    pub distance: f64,
}

/// An in-memory road graph.
#[derive(Debug, Clone, Default)]
pub struct RoadGraph {
    nodes: Vec<RoadNode>,
    arcs: Vec<RoadArc>,
    point_scale: f64,
    contraction: Option<crate::ch::ContractionHierarchy>,
}

impl RoadGraph {
    /// Creates an empty graph whose map units convert to meters by
    /// `point_scale`.
    pub fn new(point_scale: f64) -> Self {
        Self {
            nodes: Vec::new(),
            arcs: Vec::new(),
            point_scale,
            contraction: None,
        }
    }

    /// The scale converting map units to meters.
    #[inline]
    pub fn point_scale(&self) -> f64 {
        self.point_scale
    }

    /// Adds a node at the given map position and returns its id.
    pub fn add_node(&mut self, position: Coord<f64>) -> usize {
        self.nodes.push(RoadNode {
            position,
            signalized: false,
            junction_name: String::new(),
            junction_ref: String::new(),
            arcs: Vec::new(),
        });
        self.nodes.len() - 1
    }

    /// Marks a node as controlled by traffic lights.
    pub fn set_signalized(&mut self, node: usize, signalized: bool) {
        self.nodes[node].signalized = signalized;
    }

    /// Names a junction node.
    pub fn set_junction_name(&mut self, node: usize, name: &str, reference: &str) {
        self.nodes[node].junction_name = name.to_string();
        self.nodes[node].junction_ref = reference.to_string();
    }

    /// Adds one directed arc and returns its id. The path must run from
    /// `from` to `to`; the length is derived from it.
    #[allow(clippy::too_many_arguments)]
    pub fn add_arc(
        &mut self,
        from: usize,
        to: usize,
        attributes: ArcAttributes,
        path: Vec<Coord<f64>>,
        name: &str,
        reference: &str,
        max_speed: f64,
    ) -> usize {
        let length = path_length(&path) * self.point_scale;
        let id = self.arcs.len();
        self.arcs.push(RoadArc {
            from,
            to,
            attributes,
            path,
            name: name.to_string(),
            reference: reference.to_string(),
            max_speed,
            length,
            opposing: None,
        });
        self.nodes[from].arcs.push(id);
        id
    }

    /// Adds the arcs for one road object between two nodes, deriving arc
    /// attributes from the road's packed type word.
    ///
    /// Both directions always get an arc; the arc against a one-way road
    /// carries the wrong-way restriction so that pedestrians and emergency
    /// vehicles can still use it. Returns the forward arc id.
    #[allow(clippy::too_many_arguments)]
    pub fn add_road(
        &mut self,
        from: usize,
        to: usize,
        road: RoadTypeFlags,
        path: Vec<Coord<f64>>,
        name: &str,
        reference: &str,
        max_speed: f64,
    ) -> usize {
        let mut forward_attr = road.to_arc_attributes();
        let mut backward_attr = forward_attr;
        match forward_attr.direction() {
            RoadDirection::OneWayForward => {
                backward_attr.set_access(backward_attr.access() | VehicleAccess::WrongWay);
                backward_attr.set_direction(RoadDirection::OneWayBackward);
            }
            RoadDirection::OneWayBackward => {
                forward_attr.set_access(forward_attr.access() | VehicleAccess::WrongWay);
                backward_attr.set_direction(RoadDirection::OneWayForward);
                forward_attr.set_direction(RoadDirection::OneWayBackward);
            }
            RoadDirection::DriveOnRight | RoadDirection::DriveOnLeft => {}
        }
        if max_speed > 0.0 && max_speed <= 255.0 {
            let limit = max_speed.round();
            let limit = u8::try_from(limit as i64).unwrap_or(u8::MAX);
            forward_attr.set_speed_limit(limit);
            backward_attr.set_speed_limit(limit);
        }

        let mut reversed = path.clone();
        reversed.reverse();
        let forward = self.add_arc(from, to, forward_attr, path, name, reference, max_speed);
        let backward = self.add_arc(to, from, backward_attr, reversed, name, reference, max_speed);
        self.arcs[forward].opposing = Some(backward);
        self.arcs[backward].opposing = Some(forward);
        forward
    }

    #[inline]
    pub fn node(&self, id: usize) -> &RoadNode {
        &self.nodes[id]
    }

    #[inline]
    pub fn arc(&self, id: usize) -> &RoadArc {
        &self.arcs[id]
    }

    #[inline]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn arc_count(&self) -> usize {
        self.arcs.len()
    }

    /// The ids of the arcs leaving a node.
    #[inline]
    pub fn out_arcs(&self, node: usize) -> &[usize] {
        &self.nodes[node].arcs
    }

    /// Attaches precomputed contraction data for the hierarchy planner.
    ///
    /// The data is tied to the arcs present when it was built; attach it
    /// after the graph is fully populated.
    pub fn set_contraction(&mut self, contraction: crate::ch::ContractionHierarchy) {
        self.contraction = Some(contraction);
    }

    /// The precomputed contraction data, if any.
    #[inline]
    pub fn contraction(&self) -> Option<&crate::ch::ContractionHierarchy> {
        self.contraction.as_ref()
    }

    /// The straight-line distance between two nodes in meters.
    pub fn node_distance(&self, a: usize, b: usize) -> f64 {
        let pa = self.nodes[a].position;
        let pb = self.nodes[b].position;
        (pb.x - pa.x).hypot(pb.y - pa.y) * self.point_scale
    }

    /// Snaps a map point to the nearest arc the costing will allow as a
    /// route endpoint.
    pub fn snap(&self, point: Coord<f64>, costing: &dyn Costing) -> Option<ArcSnap> {
        let mut best: Option<ArcSnap> = None;
        for (id, arc) in self.arcs.iter().enumerate() {
            if !costing.arc_allowed(arc, true) {
                continue;
            }
            let mut along = 0.0;
            let total = path_length(&arc.path);
            for pair in arc.path.windows(2) {
                let (a, b) = (pair[0], pair[1]);
                let line = ((b.x - a.x), (b.y - a.y));
                let len_sq = line.0 * line.0 + line.1 * line.1;
                let t = if len_sq > 0.0 {
                    (((point.x - a.x) * line.0 + (point.y - a.y) * line.1) / len_sq).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                let nearest = Coord {
                    x: a.x + line.0 * t,
                    y: a.y + line.1 * t,
                };
                let distance = (point.x - nearest.x).hypot(point.y - nearest.y) * self.point_scale;
                if best.as_ref().is_none_or(|b| distance < b.distance) {
                    let line_len = len_sq.sqrt();
                    let fraction = if total > 0.0 {
                        (along + line_len * t) / total
                    } else {
                        0.0
                    };
                    best = Some(ArcSnap {
                        arc: id,
                        fraction,
                        point: nearest,
                        distance,
                    });
                }
                along += len_sq.sqrt();
            }
        }
        best
    }
}

pub(crate) fn path_length(path: &[Coord<f64>]) -> f64 {
    path.windows(2)
        .map(|p| (p[1].x - p[0].x).hypot(p[1].y - p[0].y))
        .sum()
}
