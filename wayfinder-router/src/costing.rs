//! The cost model: maps arc attributes and junction geometry to traversal
//! costs and legality under a routing profile.

use crate::graph::{RoadArc, RoadNode};
use wayfinder_route::{RouteProfile, Usability, U_TURN_WINDOW_DEGREES};

/// An accumulated cost: the weight minimized by the search, plus the real
/// time estimate carried along for segment times and ETA.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Cost {
    /// The quantity the router minimizes: seconds for fastest routes,
    /// meters for shortest routes, with penalties applied.
    pub weight: f64,
    /// The estimated traversal time in seconds.
    pub secs: f64,
}

impl std::ops::Add for Cost {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            weight: self.weight + other.weight,
            secs: self.secs + other.secs,
        }
    }
}

/// The capability routers plan against. Implementations decide which arcs
/// are legal and what they cost; routers stay ignorant of profiles.
pub trait Costing {
    /// May the arc be traversed? Endpoint arcs (the first or last arc of a
    /// route) relax restriction and zero-bonus rules.
    fn arc_allowed(&self, arc: &RoadArc, endpoint: bool) -> bool;

    /// The cost of traversing the whole arc, or `None` if it is impassable
    /// at this position of the route.
    fn arc_cost(&self, arc: &RoadArc, endpoint: bool) -> Option<Cost>;

    /// The cost of the junction transition from `prev` onto `next` at
    /// `node`.
    fn transition_cost(&self, prev: &RoadArc, next: &RoadArc, node: &RoadNode) -> Cost;

    /// Is the arc restricted for this vehicle, admitted only under endpoint
    /// relaxation?
    fn arc_restricted(&self, arc: &RoadArc) -> bool;

    /// An upper bound on achievable speed in kph; used for admissible
    /// search heuristics.
    fn speed_bound(&self) -> f64;
}

/// Straight-ahead turns up to this angle carry no turn time when the road
/// hierarchy is preserved.
const AHEAD_ANGLE_DEGREES: f64 = 15.0;

/// Profile-driven costing.
pub struct ProfileCosting<'a> {
    profile: &'a RouteProfile,
    speed_bound: f64,
}

impl<'a> ProfileCosting<'a> {
    pub fn new(profile: &'a RouteProfile) -> Self {
        let best_gradient = profile
            .gradient_speed
            .iter()
            .zip(&profile.gradient_bonus)
            .map(|(s, b)| s + b)
            .fold(0.0f64, f64::max);
        let speed_bound = profile
            .speed
            .iter()
            .zip(&profile.bonus)
            .map(|(s, b)| s + b + best_gradient)
            .fold(1.0f64, f64::max);
        Self {
            profile,
            speed_bound,
        }
    }

    pub fn profile(&self) -> &RouteProfile {
        self.profile
    }
}

/// The signed turn angle in degrees from `prev` onto `next`: positive is a
/// right turn.
pub fn turn_angle(prev: &RoadArc, next: &RoadArc) -> f64 {
    normalize_degrees(prev.exit_heading() - next.entry_heading())
}

impl Costing for ProfileCosting<'_> {
    fn arc_allowed(&self, arc: &RoadArc, endpoint: bool) -> bool {
        if !self.profile.restrictions_against(arc.attributes).is_empty() && !endpoint {
            return false;
        }
        if arc.attributes.toll() && self.profile.toll_penalty_clamped() >= 1.0 {
            return false;
        }
        match self.profile.usability(arc.attributes.road_type()) {
            Usability::Normal => true,
            Usability::EndpointOnly => endpoint,
            Usability::Unusable => false,
        }
    }

    fn arc_cost(&self, arc: &RoadArc, endpoint: bool) -> Option<Cost> {
        if !self.arc_allowed(arc, endpoint) {
            return None;
        }
        let rt = arc.attributes.road_type();
        let mut speed = self.profile.effective_speed(arc.attributes);
        if speed <= 0.0 {
            // Endpoint relaxation: fall back to the base speed so that
            // zero-bonus road types still get a finite time.
            if endpoint && self.profile.speed[rt.index()] > 0.0 {
                speed = self.profile.speed[rt.index()];
            } else {
                return None;
            }
        }
        let limit = f64::from(arc.attributes.speed_limit());
        if limit > 0.0 {
            speed = speed.min(limit);
        }
        let secs = arc.length / (speed / 3.6);

        let mut weight = if self.profile.shortest {
            arc.length
        } else {
            secs
        };
        if arc.attributes.toll() {
            let penalty = self.profile.toll_penalty_clamped().min(0.999_999);
            weight /= 1.0 - penalty;
        }
        Some(Cost { weight, secs })
    }

    fn transition_cost(&self, prev: &RoadArc, next: &RoadArc, node: &RoadNode) -> Cost {
        if self.profile.shortest {
            return Cost::default();
        }
        let angle = turn_angle(prev, next);
        let from_rank = prev.attributes.road_type().hierarchy();
        let to_rank = next.attributes.road_type().hierarchy();

        // A turn toward the oncoming side crosses traffic: left when
        // driving on the right, right when driving on the left.
        let crosses = if prev.attributes.direction().drive_on_left() {
            angle > AHEAD_ANGLE_DEGREES
        } else {
            angle < -AHEAD_ANGLE_DEGREES
        };

        let mut secs = if angle.abs() >= 180.0 - U_TURN_WINDOW_DEGREES {
            f64::from(self.profile.u_turn_time)
        } else if crosses && to_rank > from_rank {
            f64::from(self.profile.cross_traffic_turn_time)
        } else if crosses && to_rank < from_rank {
            f64::from(self.profile.cross_traffic_turn_time) * 2.0
        } else if angle.abs() > AHEAD_ANGLE_DEGREES || to_rank != from_rank {
            f64::from(self.profile.turn_time)
        } else {
            0.0
        };
        if node.signalized {
            secs += f64::from(self.profile.traffic_light_time);
        }
        Cost {
            weight: secs,
            secs,
        }
    }

    fn arc_restricted(&self, arc: &RoadArc) -> bool {
        !self.profile.restrictions_against(arc.attributes).is_empty()
    }

    fn speed_bound(&self) -> f64 {
        self.speed_bound
    }
}

/// Normalizes an angle in degrees to the half-open range (-180, 180].
pub fn normalize_degrees(angle: f64) -> f64 {
    let mut a = angle % 360.0;
    if a > 180.0 {
        a -= 360.0;
    } else if a <= -180.0 {
        a += 360.0;
    }
    a
}
