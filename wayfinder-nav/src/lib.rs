//! # Turn-by-turn navigation
//!
//! A [`Navigator`] owns a frozen [`Route`](wayfinder_route::Route), consumes
//! positional fixes from a location device, and tells registered observers
//! about upcoming turns, wrong-way driving, going off route, and re-routes.
//!
//! The core is single threaded: all observer callbacks run synchronously
//! inside [`Navigator::on_navigation_data`], on the thread delivering the
//! fix. Within one fix, state-transition events (position known/unknown,
//! new route, turn round) are delivered before informational events (turn,
//! nearby object), and consecutive identical turn events are coalesced.

mod navigator;
mod nearby;

use enumset::{EnumSet, EnumSetType};
use geo::{Coord, LineString, Point};
use wayfinder_road::ArcRoadType;
use wayfinder_route::{Route, Turn, TurnType};

pub use navigator::Navigator;
pub use nearby::{NearbyObject, NearbyObjectWarning};

/// Validity flags for the fields of a [`NavigationData`] fix.
///
/// The bit values (time 1, position 2, speed 4, course 8, height 16) are
/// part of the external contract.
#[derive(Debug, EnumSetType)]
#[enumset(repr = "u8")]
pub enum FixValidity {
    Time,
    Position,
    Speed,
    Course,
    Height,
}

/// Basic data received from a navigation device such as a GNSS receiver.
///
/// Fields whose validity flag is absent must be ignored.
#[derive(Debug, Clone, PartialEq)]
pub struct NavigationData {
    /// Which fields carry usable data.
    pub validity: EnumSet<FixValidity>,
    /// The time in seconds. Any consistent representation works; only
    /// differences are used.
    pub time: f64,
    /// Position in degrees: x = longitude, y = latitude.
    pub position: Point<f64>,
    /// Speed in kph.
    pub speed: f64,
    /// True course in degrees, clockwise from north.
    pub course: f64,
    /// Height above sea level in meters.
    pub height: f64,
}

impl Default for NavigationData {
    fn default() -> Self {
        Self {
            validity: EnumSet::empty(),
            time: 0.0,
            position: Point::new(0.0, 0.0),
            speed: 0.0,
            course: 0.0,
            height: 0.0,
        }
    }
}

/// Parameters governing navigation behaviour.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigatorParam {
    /// Minimum distance between fixes in meters that counts as an actual
    /// move; anything closer is treated as stationary.
    pub minimum_fix_distance: i32,
    /// Maximum perpendicular distance from the route in meters before the
    /// vehicle is deemed off route.
    pub route_distance_tolerance: i32,
    /// Maximum time off route in seconds before a new route is needed.
    pub route_time_tolerance: i32,
    /// Recalculate the route automatically when the vehicle goes off
    /// route. When false the navigator enters
    /// [`NavigatorState::ReRouteNeeded`] instead, giving the application
    /// time to warn about a slow routing algorithm.
    pub auto_re_route: bool,
    /// When false, position and speed keep being tracked but no turn
    /// information is produced, as if there were no route.
    pub navigation_enabled: bool,
}

impl Default for NavigatorParam {
    fn default() -> Self {
        Self {
            minimum_fix_distance: 5,
            route_distance_tolerance: 20,
            route_time_tolerance: 30,
            auto_re_route: true,
            navigation_enabled: true,
        }
    }
}

/// Possible states of the navigator.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NavigatorState {
    /// No route has been created, or navigation is disabled.
    #[default]
    None,
    /// There is a route but no position has been supplied.
    NoPosition,
    /// The latest position is on the route.
    OnRoute,
    /// The latest position is off the route but on a road.
    OffRoute,
    /// The latest position is not on a road.
    OffRoad,
    /// Re-routing is needed; entered only when automatic re-routing is
    /// turned off or unavailable.
    ReRouteNeeded,
    /// Re-routing has just been done.
    ReRouteDone,
}

/// Turn information for navigation: the turn descriptor plus distances and
/// the roads on either side of the junction.
#[derive(Debug, Clone, PartialEq)]
pub struct NavigatorTurn {
    /// The turn at the junction.
    pub turn: Turn,
    /// Meters from the reference point to the turn. For the first turn of
    /// an event the reference is the current position; for the second it
    /// is the first turn.
    pub distance: f64,
    /// Estimated seconds from the reference point to the turn.
    pub time: f64,
    /// The name of the road before the turn.
    pub from_name: String,
    /// The reference code of the road before the turn.
    pub from_ref: String,
    /// The type of the road before the turn.
    pub from_road_type: ArcRoadType,
    /// The name of the road after the turn.
    pub to_name: String,
    /// The reference code of the road after the turn.
    pub to_ref: String,
    /// The type of the road after the turn.
    pub to_road_type: ArcRoadType,
    /// The position of the turn in map coordinates.
    pub position: Coord<f64>,
    /// An English instruction for the turn.
    pub instruction: String,
}

impl NavigatorTurn {
    /// An arrival pseudo-turn at the end of the route.
    fn arrival(route: &Route, distance: f64, time: f64) -> Self {
        let last = route.segments.last();
        let turn = Turn::default();
        let instruction = turn.instruction("");
        Self {
            turn,
            distance,
            time,
            from_name: last.map(|s| s.name.clone()).unwrap_or_default(),
            from_ref: last.map(|s| s.reference.clone()).unwrap_or_default(),
            from_road_type: last.map_or(ArcRoadType::Unknown, |s| s.road_type),
            to_name: String::new(),
            to_ref: String::new(),
            to_road_type: ArcRoadType::Unknown,
            position: route.path.0.last().copied().unwrap_or(Coord { x: 0.0, y: 0.0 }),
            instruction,
        }
    }

    /// The turn at the entry of `route.segments[index]`.
    fn at_segment(route: &Route, index: usize, distance: f64, time: f64) -> Self {
        let current = &route.segments[index];
        let previous = &route.segments[index - 1];
        let instruction = current.turn.instruction(&current.name);
        Self {
            turn: current.turn.clone(),
            distance,
            time,
            from_name: previous.name.clone(),
            from_ref: previous.reference.clone(),
            from_road_type: previous.road_type,
            to_name: current.name.clone(),
            to_ref: current.reference.clone(),
            to_road_type: current.road_type,
            position: previous
                .path
                .0
                .last()
                .copied()
                .unwrap_or(Coord { x: 0.0, y: 0.0 }),
            instruction,
        }
    }

    /// Is this a continuation needing no notification?
    fn is_continuation(&self) -> bool {
        self.turn.turn_type == TurnType::Ahead && self.turn.continues
    }
}

/// Information about the nearest routable road to a point, supplied by a
/// [`RoadLookup`].
#[derive(Debug, Clone, PartialEq)]
pub struct NearestRoadInfo {
    /// The road type.
    pub road_type: ArcRoadType,
    /// The maximum legal speed in kph; zero means no known limit.
    pub max_speed: f64,
    /// The standard name of the road.
    pub name: String,
    /// The road reference code.
    pub reference: String,
    /// The nearest point on the road in map coordinates.
    pub nearest_point: Coord<f64>,
    /// The distance from the queried point to `nearest_point` in meters.
    pub distance: f64,
    /// The heading of the nearest line in degrees, counterclockwise from
    /// the positive x axis.
    pub heading: f64,
    /// The road geometry, traversable in path order.
    pub path: LineString<f64>,
    /// True if the road is one way.
    pub one_way: bool,
}

/// Access to the road network around a point, used to distinguish off-route
/// from off-road. Without one, the navigator never reports
/// [`NavigatorState::OffRoad`].
pub trait RoadLookup {
    /// The nearest routable road to a map point, if any is within the
    /// implementation's search radius.
    fn nearest_road(&self, point: Coord<f64>) -> Option<NearestRoadInfo>;
}

/// Replans the route when the vehicle has strayed from it, used for
/// automatic re-routing. The navigator passes the current position and the
/// route being abandoned.
pub trait Rerouter {
    /// A new route from `position` to the old route's destination, or
    /// `None` when planning fails (the navigator then asks the application
    /// to re-route instead).
    fn reroute(&mut self, position: Coord<f64>, route: &Route) -> Option<Route>;
}

/// Observer of navigation events.
///
/// Implementations must not panic; callbacks run inline with fix delivery.
/// Multiple observers may be registered and are called in registration
/// order.
pub trait NavigatorObserver {
    /// Up to three turns.
    ///
    /// `first` is the first significant turn after the current position,
    /// ignoring ahead and continue turns; if its type is
    /// [`TurnType::None`], no significant turns remain and the distance
    /// runs to the arrival point. `second` is given when another
    /// significant turn follows within 100 m of the first; its distance is
    /// measured from the first turn. `continuation` is given when an ahead
    /// or continue turn precedes `first`, so no turn is needed at the next
    /// junction; its distance is measured from the current position.
    fn on_turn(
        &mut self,
        first: &NavigatorTurn,
        second: Option<&NavigatorTurn>,
        continuation: Option<&NavigatorTurn>,
    );

    /// The vehicle is on the route but going the wrong way; turn round at
    /// a legal and safe place.
    fn on_turn_round(&mut self);

    /// The vehicle went off route and a new route has been calculated.
    fn on_new_route(&mut self);

    /// The position has become known.
    fn on_position_known(&mut self);

    /// The position has become unknown.
    fn on_position_unknown(&mut self);

    /// An object of interest has come into range of the route ahead.
    fn on_add_nearby_object(
        &mut self,
        _object: &NearbyObject,
        _distance_to_route: f64,
        _distance_along_route: f64,
    ) {
    }

    /// The distances to an in-range object of interest have changed.
    fn on_update_nearby_object(
        &mut self,
        _object: &NearbyObject,
        _distance_to_route: f64,
        _distance_along_route: f64,
    ) {
    }

    /// An object of interest is no longer in range.
    fn on_remove_nearby_object(&mut self, _object: &NearbyObject) {}
}
