use crate::nearby::{NearbyEvent, NearbyObjectWarning, NearbyRegistry};
use crate::{
    FixValidity, NavigationData, NavigatorObserver, NavigatorParam, NavigatorState, NavigatorTurn,
    Rerouter, RoadLookup,
};
use geo::Coord;
use tracing::debug;
use wayfinder_route::{NearestSegmentInfo, Projection, Route, TurnType};

/// A second significant turn is reported when it follows the first within
/// this distance.
const SECOND_TURN_DISTANCE: f64 = 100.0;

/// Fix courses differing from the route tangent by more than this are
/// driving against the route.
const REVERSE_COURSE_DEGREES: f64 = 135.0;

/// Consecutive reversed fixes needed before telling the driver to turn
/// round.
const REVERSE_FIX_COUNT: u32 = 2;

/// Width of the distance buckets used to coalesce turn events.
const TURN_DISTANCE_BUCKET: f64 = 10.0;

struct Fix {
    map: Coord<f64>,
    time: Option<f64>,
}

/// Events are gathered per fix and delivered afterwards, preserving the
/// required ordering: state transitions first, then turn and nearby-object
/// information.
enum NavEvent {
    PositionKnown,
    PositionUnknown,
    NewRoute,
    TurnRound,
    Turn(
        NavigatorTurn,
        Option<NavigatorTurn>,
        Option<NavigatorTurn>,
    ),
    Nearby(NearbyEvent),
}

/// The navigator: consumes positional fixes against a frozen route and
/// drives observer callbacks.
///
/// The projection converts fix positions (degrees) into the map units of
/// the route; its y axis must point north so that compass courses can be
/// compared with map headings.
pub struct Navigator {
    route: Option<Route>,
    state: NavigatorState,
    param: NavigatorParam,
    projection: Box<dyn Projection>,
    observers: Vec<Box<dyn NavigatorObserver>>,
    rerouter: Option<Box<dyn Rerouter>>,
    road_lookup: Option<Box<dyn RoadLookup>>,
    nearby: NearbyRegistry,
    last_fix: Option<Fix>,
    previous_distance: Option<f64>,
    off_route_since: Option<f64>,
    reversed_fixes: u32,
    turn_round_reported: bool,
    last_turn_key: Option<(Option<usize>, Option<usize>, i64)>,
}

impl Navigator {
    /// Creates a navigator with no route.
    pub fn new(projection: Box<dyn Projection>) -> Self {
        Self {
            route: None,
            state: NavigatorState::None,
            param: NavigatorParam::default(),
            projection,
            observers: Vec::new(),
            rerouter: None,
            road_lookup: None,
            nearby: NearbyRegistry::default(),
            last_fix: None,
            previous_distance: None,
            off_route_since: None,
            reversed_fixes: 0,
            turn_round_reported: false,
            last_turn_key: None,
        }
    }

    /// The current state.
    #[inline]
    pub fn state(&self) -> NavigatorState {
        self.state
    }

    /// The route being navigated, if any.
    #[inline]
    pub fn route(&self) -> Option<&Route> {
        self.route.as_ref()
    }

    /// The navigation parameters.
    #[inline]
    pub fn param(&self) -> &NavigatorParam {
        &self.param
    }

    /// Replaces the navigation parameters.
    pub fn set_param(&mut self, param: NavigatorParam) {
        self.param = param;
    }

    /// Registers an observer; observers are called in registration order.
    pub fn add_observer(&mut self, observer: Box<dyn NavigatorObserver>) {
        self.observers.push(observer);
    }

    /// Installs the re-planning capability used for automatic re-routing.
    pub fn set_rerouter(&mut self, rerouter: Box<dyn Rerouter>) {
        self.rerouter = Some(rerouter);
    }

    /// Installs the road lookup used to tell off-road from off-route.
    pub fn set_road_lookup(&mut self, road_lookup: Box<dyn RoadLookup>) {
        self.road_lookup = Some(road_lookup);
    }

    /// Registers a nearby-object warning; replaces any warning with the
    /// same object id.
    pub fn add_nearby_object_warning(&mut self, warning: NearbyObjectWarning) {
        self.nearby.add(warning);
    }

    /// Removes the nearby-object warning with the given id.
    pub fn remove_nearby_object_warning(&mut self, id: u64) {
        self.nearby.remove(id);
    }

    /// Sets or clears the route and resets positional tracking. No events
    /// are emitted; use [`Navigator::replace_route`] for an
    /// application-driven re-route.
    pub fn set_route(&mut self, route: Option<Route>) {
        self.route = route;
        self.reset_tracking();
        self.state = if self.route.is_some() && self.param.navigation_enabled {
            NavigatorState::NoPosition
        } else {
            NavigatorState::None
        };
        debug!(state = ?self.state, "route set");
    }

    /// Replaces the route after the application performed its own
    /// re-routing, announcing the new route to observers.
    pub fn replace_route(&mut self, route: Route) {
        self.route = Some(route);
        self.reset_tracking();
        self.state = NavigatorState::ReRouteDone;
        debug!("route replaced by application");
        self.dispatch(vec![NavEvent::NewRoute]);
    }

    fn reset_tracking(&mut self) {
        self.previous_distance = None;
        self.off_route_since = None;
        self.reversed_fixes = 0;
        self.turn_round_reported = false;
        self.last_turn_key = None;
        self.nearby.reset();
    }

    /// Consumes one positional fix. All resulting observer callbacks run
    /// synchronously before this method returns.
    pub fn on_navigation_data(&mut self, data: &NavigationData) {
        let mut events = Vec::new();

        if !data.validity.contains(FixValidity::Position) {
            if self.last_fix.take().is_some() {
                events.push(NavEvent::PositionUnknown);
            }
            self.state = if self.route.is_some() && self.param.navigation_enabled {
                NavigatorState::NoPosition
            } else {
                NavigatorState::None
            };
            self.previous_distance = None;
            self.reversed_fixes = 0;
            debug!(state = ?self.state, "fix without a valid position");
            self.dispatch(events);
            return;
        }

        let map = self.projection.to_map(data.position);
        let time = data
            .validity
            .contains(FixValidity::Time)
            .then_some(data.time);
        let scale = self.route.as_ref().map_or(1.0, |r| r.point_scale);

        if let Some(prev) = &self.last_fix {
            let moved = (map.x - prev.map.x).hypot(map.y - prev.map.y) * scale;
            if moved < f64::from(self.param.minimum_fix_distance) {
                return;
            }
        }

        let became_known = self.last_fix.is_none();
        self.last_fix = Some(Fix { map, time });
        if became_known {
            events.push(NavEvent::PositionKnown);
        }

        let navigating =
            self.param.navigation_enabled && self.route.as_ref().is_some_and(|r| !r.is_empty());
        if !navigating {
            self.state = NavigatorState::None;
            self.dispatch(events);
            return;
        }

        let info = self
            .route
            .as_ref()
            .expect("navigating implies a route")
            .nearest_segment(map, None, self.previous_distance);
        let Some(info) = info else {
            self.dispatch(events);
            return;
        };

        if info.distance_to_route <= f64::from(self.param.route_distance_tolerance) {
            self.fix_on_route(data, &info, &mut events);
        } else {
            self.fix_off_route(map, time, &mut events);
        }
        self.dispatch(events);
    }

    fn fix_on_route(
        &mut self,
        data: &NavigationData,
        info: &NearestSegmentInfo,
        events: &mut Vec<NavEvent>,
    ) {
        if self.state != NavigatorState::OnRoute {
            debug!(from = ?self.state, "on route");
        }
        self.state = NavigatorState::OnRoute;
        self.off_route_since = None;

        if data.validity.contains(FixValidity::Course) {
            // Compass course (clockwise from north) to map heading
            // (counterclockwise from east).
            let course_heading = 90.0 - data.course;
            if angle_difference(course_heading, info.heading).abs() > REVERSE_COURSE_DEGREES {
                self.reversed_fixes += 1;
                if self.reversed_fixes >= REVERSE_FIX_COUNT && !self.turn_round_reported {
                    self.turn_round_reported = true;
                    events.push(NavEvent::TurnRound);
                }
            } else {
                self.reversed_fixes = 0;
                self.turn_round_reported = false;
            }
        }

        self.previous_distance = Some(info.distance_along_route);
        self.push_turn_event(info, events);
        let route = self.route.as_ref().expect("on route implies a route");
        events.extend(
            self.nearby
                .update(route, info.distance_along_route)
                .into_iter()
                .map(NavEvent::Nearby),
        );
    }

    fn fix_off_route(&mut self, map: Coord<f64>, time: Option<f64>, events: &mut Vec<NavEvent>) {
        let on_road = match &self.road_lookup {
            Some(lookup) => lookup.nearest_road(map).is_some(),
            None => true,
        };
        if !on_road {
            if self.state != NavigatorState::OffRoad {
                debug!(from = ?self.state, "off road");
            }
            self.state = NavigatorState::OffRoad;
            self.off_route_since = None;
            return;
        }

        match self.state {
            NavigatorState::OffRoute => {
                let elapsed = match (time, self.off_route_since) {
                    (Some(now), Some(since)) => now - since,
                    _ => 0.0,
                };
                if elapsed >= f64::from(self.param.route_time_tolerance) {
                    self.re_route(map, events);
                }
            }
            NavigatorState::ReRouteNeeded => {}
            _ => {
                debug!(from = ?self.state, "off route");
                self.state = NavigatorState::OffRoute;
                self.off_route_since = time;
            }
        }
    }

    fn re_route(&mut self, map: Coord<f64>, events: &mut Vec<NavEvent>) {
        if self.param.auto_re_route {
            if let Some(rerouter) = self.rerouter.as_mut() {
                let route = self.route.as_ref().expect("re-routing needs a route");
                if let Some(new_route) = rerouter.reroute(map, route) {
                    debug!("automatic re-route succeeded");
                    self.route = Some(new_route);
                    self.reset_tracking();
                    self.state = NavigatorState::ReRouteDone;
                    events.push(NavEvent::NewRoute);

                    // Announce the next turn of the new route right away.
                    let info = self
                        .route
                        .as_ref()
                        .expect("just set")
                        .nearest_segment(map, None, None);
                    if let Some(info) = info {
                        if info.distance_to_route
                            <= f64::from(self.param.route_distance_tolerance)
                        {
                            self.previous_distance = Some(info.distance_along_route);
                            self.push_turn_event(&info, events);
                        }
                    }
                    return;
                }
            }
        }
        debug!("re-route needed");
        self.state = NavigatorState::ReRouteNeeded;
    }

    /// Builds the turn event for the current on-route position, suppressing
    /// repeats of the previous event.
    fn push_turn_event(&mut self, info: &NearestSegmentInfo, events: &mut Vec<NavEvent>) {
        let route = self.route.as_ref().expect("turn events need a route");
        let segments = &route.segments;

        let mut distance_starts = Vec::with_capacity(segments.len());
        let mut time_starts = Vec::with_capacity(segments.len());
        let mut distance = 0.0;
        let mut time = 0.0;
        for segment in segments {
            distance_starts.push(distance);
            time_starts.push(time);
            distance += segment.distance;
            time += segment.time;
        }

        let significant = |index: usize| {
            let turn = &segments[index].turn;
            !(turn.turn_type == TurnType::Ahead && turn.continues)
        };

        let mut first_index = None;
        let mut continuation_index = None;
        for index in (info.segment_index + 1)..segments.len() {
            if significant(index) {
                first_index = Some(index);
                break;
            }
            if continuation_index.is_none() {
                continuation_index = Some(index);
            }
        }

        let first = match first_index {
            Some(index) => NavigatorTurn::at_segment(
                route,
                index,
                (distance_starts[index] - info.distance_along_route).max(0.0),
                (time_starts[index] - info.time_along_route).max(0.0),
            ),
            None => NavigatorTurn::arrival(
                route,
                (route.distance - info.distance_along_route).max(0.0),
                (route.time - info.time_along_route).max(0.0),
            ),
        };

        let second_index = first_index.and_then(|index| {
            ((index + 1)..segments.len())
                .find(|&j| significant(j))
                .filter(|&j| distance_starts[j] - distance_starts[index] <= SECOND_TURN_DISTANCE)
        });
        let second = second_index.map(|j| {
            let index = first_index.expect("second implies first");
            NavigatorTurn::at_segment(
                route,
                j,
                distance_starts[j] - distance_starts[index],
                time_starts[j] - time_starts[index],
            )
        });

        let continuation = continuation_index.map(|index| {
            NavigatorTurn::at_segment(
                route,
                index,
                (distance_starts[index] - info.distance_along_route).max(0.0),
                (time_starts[index] - info.time_along_route).max(0.0),
            )
        });
        debug_assert!(continuation.as_ref().is_none_or(NavigatorTurn::is_continuation));

        let bucket = (first.distance / TURN_DISTANCE_BUCKET).floor() as i64;
        let key = (first_index, second_index, bucket);
        if self.last_turn_key == Some(key) {
            return;
        }
        self.last_turn_key = Some(key);
        events.push(NavEvent::Turn(first, second, continuation));
    }

    fn dispatch(&mut self, events: Vec<NavEvent>) {
        for event in &events {
            for observer in &mut self.observers {
                match event {
                    NavEvent::PositionKnown => observer.on_position_known(),
                    NavEvent::PositionUnknown => observer.on_position_unknown(),
                    NavEvent::NewRoute => observer.on_new_route(),
                    NavEvent::TurnRound => observer.on_turn_round(),
                    NavEvent::Turn(first, second, continuation) => {
                        observer.on_turn(first, second.as_ref(), continuation.as_ref());
                    }
                    NavEvent::Nearby(NearbyEvent::Add(object, to_route, along)) => {
                        observer.on_add_nearby_object(object, *to_route, *along);
                    }
                    NavEvent::Nearby(NearbyEvent::Update(object, to_route, along)) => {
                        observer.on_update_nearby_object(object, *to_route, *along);
                    }
                    NavEvent::Nearby(NearbyEvent::Remove(object)) => {
                        observer.on_remove_nearby_object(object);
                    }
                }
            }
        }
    }
}

/// The difference between two angles in degrees, in (-180, 180].
fn angle_difference(a: f64, b: f64) -> f64 {
    let mut d = (a - b) % 360.0;
    if d > 180.0 {
        d -= 360.0;
    } else if d <= -180.0 {
        d += 360.0;
    }
    d
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{NearbyObject, NearbyObjectWarning};
    use enumset::EnumSet;
    use geo::{coord, Point};
    use std::cell::RefCell;
    use std::rc::Rc;
    use wayfinder_road::ArcRoadType;
    use wayfinder_route::{
        JunctionInfo, LocalProjection, ProfileType, RouteProfile, RoundaboutState,
    };

    /// East 200 m on East Street, then right (south) 200 m on South Street.
    fn test_route() -> Route {
        let mut route = Route::new(RouteProfile::new(ProfileType::Car), 1.0);
        route.append_segment(
            &JunctionInfo::default(),
            &[coord! {x: 0.0, y: 0.0}, coord! {x: 200.0, y: 0.0}],
            "East Street",
            "",
            ArcRoadType::Residential,
            0.0,
            200.0,
            24.0,
            0,
            false,
        );
        route.append_segment(
            &JunctionInfo {
                turn_angle: 90.0,
                choices: 3,
                left_alternatives: 1,
                right_alternatives: 1,
                turn_time: 4.0,
                ..JunctionInfo::default()
            },
            &[coord! {x: 200.0, y: 0.0}, coord! {x: 200.0, y: -200.0}],
            "South Street",
            "",
            ArcRoadType::Residential,
            0.0,
            200.0,
            24.0,
            0,
            false,
        );
        route
    }

    #[derive(Default)]
    struct Log {
        events: Rc<RefCell<Vec<String>>>,
    }

    impl NavigatorObserver for Log {
        fn on_turn(
            &mut self,
            first: &NavigatorTurn,
            second: Option<&NavigatorTurn>,
            continuation: Option<&NavigatorTurn>,
        ) {
            self.events.borrow_mut().push(format!(
                "turn:{}@{:.0}{}{}",
                first.turn.turn_type.name(),
                first.distance,
                if second.is_some() { "+second" } else { "" },
                if continuation.is_some() {
                    "+continuation"
                } else {
                    ""
                },
            ));
        }
        fn on_turn_round(&mut self) {
            self.events.borrow_mut().push("turn_round".to_string());
        }
        fn on_new_route(&mut self) {
            self.events.borrow_mut().push("new_route".to_string());
        }
        fn on_position_known(&mut self) {
            self.events.borrow_mut().push("position_known".to_string());
        }
        fn on_position_unknown(&mut self) {
            self.events
                .borrow_mut()
                .push("position_unknown".to_string());
        }
        fn on_add_nearby_object(&mut self, object: &NearbyObject, _d: f64, _a: f64) {
            self.events
                .borrow_mut()
                .push(format!("nearby_add:{}", object.name));
        }
        fn on_update_nearby_object(&mut self, object: &NearbyObject, _d: f64, _a: f64) {
            self.events
                .borrow_mut()
                .push(format!("nearby_update:{}", object.name));
        }
        fn on_remove_nearby_object(&mut self, object: &NearbyObject) {
            self.events
                .borrow_mut()
                .push(format!("nearby_remove:{}", object.name));
        }
    }

    fn navigator_with_log() -> (Navigator, Rc<RefCell<Vec<String>>>) {
        let mut navigator = Navigator::new(Box::new(LocalProjection::new(Point::new(0.0, 0.0))));
        let events = Rc::new(RefCell::new(Vec::new()));
        navigator.add_observer(Box::new(Log {
            events: Rc::clone(&events),
        }));
        (navigator, events)
    }

    fn fix_at(map: Coord<f64>, time: f64) -> NavigationData {
        let projection = LocalProjection::new(Point::new(0.0, 0.0));
        NavigationData {
            validity: FixValidity::Position | FixValidity::Time,
            time,
            position: projection.to_geographic(map),
            ..NavigationData::default()
        }
    }

    fn fix_with_course(map: Coord<f64>, time: f64, course: f64) -> NavigationData {
        let mut data = fix_at(map, time);
        data.validity |= FixValidity::Course;
        data.course = course;
        data
    }

    #[test]
    fn route_set_moves_to_no_position() {
        let (mut navigator, _) = navigator_with_log();
        assert_eq!(navigator.state(), NavigatorState::None);
        navigator.set_route(Some(test_route()));
        assert_eq!(navigator.state(), NavigatorState::NoPosition);
    }

    #[test]
    fn first_on_route_fix_reports_position_and_turn() {
        let (mut navigator, events) = navigator_with_log();
        navigator.set_route(Some(test_route()));
        navigator.on_navigation_data(&fix_at(coord! {x: 50.0, y: 5.0}, 0.0));

        assert_eq!(navigator.state(), NavigatorState::OnRoute);
        let events = events.borrow();
        assert_eq!(events[0], "position_known");
        // The right turn is 150 m ahead of the projected position.
        assert_eq!(events[1], "turn:right@150");
    }

    #[test]
    fn identical_turn_events_are_coalesced() {
        let (mut navigator, events) = navigator_with_log();
        let mut param = NavigatorParam::default();
        param.minimum_fix_distance = 1;
        navigator.set_param(param);
        navigator.set_route(Some(test_route()));
        navigator.on_navigation_data(&fix_at(coord! {x: 42.0, y: 2.0}, 0.0));
        navigator.on_navigation_data(&fix_at(coord! {x: 44.0, y: 2.0}, 1.0));
        navigator.on_navigation_data(&fix_at(coord! {x: 58.0, y: 2.0}, 2.0));

        let turns: Vec<_> = events
            .borrow()
            .iter()
            .filter(|e| e.starts_with("turn:"))
            .cloned()
            .collect();
        // 158 m and 156 m share a bucket; 142 m does not.
        assert_eq!(turns, vec!["turn:right@158", "turn:right@142"]);
    }

    #[test]
    fn arrival_reports_a_none_turn() {
        let (mut navigator, events) = navigator_with_log();
        navigator.set_route(Some(test_route()));
        navigator.on_navigation_data(&fix_at(coord! {x: 200.0, y: -195.0}, 0.0));

        let events = events.borrow();
        assert_eq!(events[1], "turn:none@5");
    }

    #[test]
    fn invalid_fix_reports_position_unknown() {
        let (mut navigator, events) = navigator_with_log();
        navigator.set_route(Some(test_route()));
        navigator.on_navigation_data(&fix_at(coord! {x: 50.0, y: 5.0}, 0.0));
        navigator.on_navigation_data(&NavigationData {
            validity: EnumSet::empty(),
            ..NavigationData::default()
        });

        assert_eq!(navigator.state(), NavigatorState::NoPosition);
        assert_eq!(events.borrow().last().unwrap(), "position_unknown");
    }

    #[test]
    fn stationary_fixes_are_ignored() {
        let (mut navigator, events) = navigator_with_log();
        navigator.set_route(Some(test_route()));
        navigator.on_navigation_data(&fix_at(coord! {x: 50.0, y: 0.0}, 0.0));
        let count = events.borrow().len();
        // 2 m is below the minimum fix distance.
        navigator.on_navigation_data(&fix_at(coord! {x: 52.0, y: 0.0}, 1.0));
        assert_eq!(events.borrow().len(), count);
    }

    #[test]
    fn turn_round_is_emitted_once_for_reversed_courses() {
        let (mut navigator, events) = navigator_with_log();
        navigator.set_route(Some(test_route()));
        // Driving west along an eastbound route.
        navigator.on_navigation_data(&fix_with_course(
            coord! {x: 60.0, y: 0.0},
            0.0,
            270.0,
        ));
        navigator.on_navigation_data(&fix_with_course(
            coord! {x: 54.0, y: 0.0},
            2.0,
            272.0,
        ));
        navigator.on_navigation_data(&fix_with_course(
            coord! {x: 48.0, y: 0.0},
            4.0,
            268.0,
        ));

        let count = events
            .borrow()
            .iter()
            .filter(|e| *e == "turn_round")
            .count();
        assert_eq!(count, 1);
    }

    struct StubRerouter {
        calls: Rc<RefCell<u32>>,
    }

    impl Rerouter for StubRerouter {
        fn reroute(&mut self, _position: Coord<f64>, _route: &Route) -> Option<Route> {
            *self.calls.borrow_mut() += 1;
            // A replacement route running along the drift.
            let mut route = Route::new(RouteProfile::new(ProfileType::Car), 1.0);
            route.append_segment(
                &JunctionInfo::default(),
                &[coord! {x: 0.0, y: 25.0}, coord! {x: 400.0, y: 25.0}],
                "Bypass",
                "",
                ArcRoadType::Residential,
                0.0,
                400.0,
                48.0,
                0,
                false,
            );
            Some(route)
        }
    }

    #[test]
    fn off_route_triggers_automatic_reroute_after_the_tolerance() {
        let (mut navigator, events) = navigator_with_log();
        let calls = Rc::new(RefCell::new(0));
        navigator.set_rerouter(Box::new(StubRerouter {
            calls: Rc::clone(&calls),
        }));
        navigator.set_route(Some(test_route()));

        navigator.on_navigation_data(&fix_at(coord! {x: 50.0, y: 0.0}, 0.0));
        assert_eq!(navigator.state(), NavigatorState::OnRoute);

        // 25 m perpendicular drift, fixes every 10 s.
        for (i, t) in [10.0, 20.0, 30.0, 40.0].iter().enumerate() {
            let x = 60.0 + 10.0 * i as f64;
            navigator.on_navigation_data(&fix_at(coord! {x: x, y: 25.0}, *t));
        }

        assert_eq!(*calls.borrow(), 1);
        assert_eq!(navigator.state(), NavigatorState::ReRouteDone);
        let events = events.borrow();
        assert!(events.contains(&"new_route".to_string()), "{events:?}");
        // The new-route announcement precedes the turn on the new route.
        let new_route_at = events.iter().position(|e| e == "new_route").unwrap();
        assert!(events[new_route_at + 1..].iter().any(|e| e.starts_with("turn:")));
    }

    #[test]
    fn off_route_without_auto_reroute_needs_the_application() {
        let (mut navigator, events) = navigator_with_log();
        let mut param = NavigatorParam::default();
        param.auto_re_route = false;
        navigator.set_param(param);
        navigator.set_route(Some(test_route()));

        navigator.on_navigation_data(&fix_at(coord! {x: 50.0, y: 0.0}, 0.0));
        for (i, t) in [10.0, 20.0, 30.0, 40.0].iter().enumerate() {
            let x = 60.0 + 10.0 * i as f64;
            navigator.on_navigation_data(&fix_at(coord! {x: x, y: 25.0}, *t));
        }

        assert_eq!(navigator.state(), NavigatorState::ReRouteNeeded);
        assert!(!events.borrow().contains(&"new_route".to_string()));

        // The application replans and hands over the new route.
        navigator.replace_route(test_route());
        assert_eq!(navigator.state(), NavigatorState::ReRouteDone);
        assert!(events.borrow().contains(&"new_route".to_string()));
    }

    #[test]
    fn returning_to_the_route_recovers() {
        let (mut navigator, _) = navigator_with_log();
        navigator.set_route(Some(test_route()));
        navigator.on_navigation_data(&fix_at(coord! {x: 50.0, y: 0.0}, 0.0));
        navigator.on_navigation_data(&fix_at(coord! {x: 60.0, y: 25.0}, 10.0));
        assert_eq!(navigator.state(), NavigatorState::OffRoute);
        navigator.on_navigation_data(&fix_at(coord! {x: 70.0, y: 5.0}, 20.0));
        assert_eq!(navigator.state(), NavigatorState::OnRoute);
    }

    struct NoRoads;

    impl RoadLookup for NoRoads {
        fn nearest_road(&self, _point: Coord<f64>) -> Option<crate::NearestRoadInfo> {
            None
        }
    }

    #[test]
    fn off_road_is_distinguished_with_a_road_lookup() {
        let (mut navigator, _) = navigator_with_log();
        navigator.set_road_lookup(Box::new(NoRoads));
        navigator.set_route(Some(test_route()));
        navigator.on_navigation_data(&fix_at(coord! {x: 50.0, y: 500.0}, 0.0));
        assert_eq!(navigator.state(), NavigatorState::OffRoad);
    }

    #[test]
    fn disabled_navigation_tracks_position_without_turns() {
        let (mut navigator, events) = navigator_with_log();
        let mut param = NavigatorParam::default();
        param.navigation_enabled = false;
        navigator.set_param(param);
        navigator.set_route(Some(test_route()));
        assert_eq!(navigator.state(), NavigatorState::None);

        navigator.on_navigation_data(&fix_at(coord! {x: 50.0, y: 0.0}, 0.0));
        let events = events.borrow();
        assert_eq!(*events, vec!["position_known".to_string()]);
    }

    #[test]
    fn nearby_objects_are_added_updated_and_removed() {
        let (mut navigator, events) = navigator_with_log();
        navigator.set_route(Some(test_route()));
        navigator.add_nearby_object_warning(NearbyObjectWarning {
            object: NearbyObject {
                id: 7,
                name: "Fuel".to_string(),
                position: coord! {x: 150.0, y: 8.0},
            },
            max_distance_to_route: 20.0,
            max_distance_along_route: 200.0,
        });

        navigator.on_navigation_data(&fix_at(coord! {x: 20.0, y: 0.0}, 0.0));
        navigator.on_navigation_data(&fix_at(coord! {x: 40.0, y: 0.0}, 5.0));
        navigator.on_navigation_data(&fix_at(coord! {x: 160.0, y: 0.0}, 10.0));

        let nearby: Vec<_> = events
            .borrow()
            .iter()
            .filter(|e| e.starts_with("nearby"))
            .cloned()
            .collect();
        assert_eq!(
            nearby,
            vec!["nearby_add:Fuel", "nearby_update:Fuel", "nearby_remove:Fuel"]
        );
    }

    #[test]
    fn continuation_turns_are_reported_before_the_first_turn() {
        // Straight on through a junction onto a differently named road,
        // then a right turn.
        let mut route = Route::new(RouteProfile::new(ProfileType::Car), 1.0);
        route.append_segment(
            &JunctionInfo::default(),
            &[coord! {x: 0.0, y: 0.0}, coord! {x: 100.0, y: 0.0}],
            "First Street",
            "",
            ArcRoadType::Residential,
            0.0,
            100.0,
            12.0,
            0,
            false,
        );
        route.append_segment(
            &JunctionInfo {
                turn_angle: 2.0,
                choices: 2,
                right_alternatives: 1,
                ..JunctionInfo::default()
            },
            &[coord! {x: 100.0, y: 0.0}, coord! {x: 200.0, y: 0.0}],
            "Second Street",
            "",
            ArcRoadType::Residential,
            0.0,
            100.0,
            12.0,
            0,
            false,
        );
        route.append_segment(
            &JunctionInfo {
                turn_angle: 90.0,
                choices: 3,
                turn_time: 4.0,
                ..JunctionInfo::default()
            },
            &[coord! {x: 200.0, y: 0.0}, coord! {x: 200.0, y: -100.0}],
            "Third Street",
            "",
            ArcRoadType::Residential,
            0.0,
            100.0,
            12.0,
            0,
            false,
        );

        let (mut navigator, events) = navigator_with_log();
        navigator.set_route(Some(route));
        navigator.on_navigation_data(&fix_at(coord! {x: 10.0, y: 0.0}, 0.0));

        let events = events.borrow();
        assert_eq!(events[1], "turn:right@190+continuation");
    }

    #[test]
    fn roundabout_turns_are_never_continuations() {
        let junction = JunctionInfo {
            turn_angle: 3.0,
            roundabout: RoundaboutState::Enter,
            ..JunctionInfo::default()
        };
        let turn = wayfinder_route::Turn::from_junction(&junction);
        assert!(!turn.continues);
    }
}
