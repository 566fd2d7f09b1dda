//! Proximity tracking for points of interest along the route.

use geo::Coord;
use wayfinder_route::Route;

/// An object of interest for nearby warnings. What qualifies is decided by
/// the application; the navigator only needs an identity and a position.
#[derive(Debug, Clone, PartialEq)]
pub struct NearbyObject {
    /// Application-assigned identity.
    pub id: u64,
    /// Display name.
    pub name: String,
    /// Position in map coordinates.
    pub position: Coord<f64>,
}

/// Criteria for warning about one object.
#[derive(Debug, Clone, PartialEq)]
pub struct NearbyObjectWarning {
    /// The object to watch.
    pub object: NearbyObject,
    /// Maximum distance from the object to the route in meters.
    pub max_distance_to_route: f64,
    /// Maximum distance along the route, from the current position to the
    /// object's on-route projection, in meters. Objects behind the current
    /// position are out of range.
    pub max_distance_along_route: f64,
}

/// A membership change or in-range refresh, in route order of emission.
pub(crate) enum NearbyEvent {
    Add(NearbyObject, f64, f64),
    Update(NearbyObject, f64, f64),
    Remove(NearbyObject),
}

#[derive(Default)]
pub(crate) struct NearbyRegistry {
    watched: Vec<(NearbyObjectWarning, bool)>,
}

impl NearbyRegistry {
    pub fn add(&mut self, warning: NearbyObjectWarning) {
        self.remove(warning.object.id);
        self.watched.push((warning, false));
    }

    pub fn remove(&mut self, id: u64) {
        self.watched.retain(|(w, _)| w.object.id != id);
    }

    /// Forget membership without emitting events, for route replacement.
    pub fn reset(&mut self) {
        for (_, in_range) in &mut self.watched {
            *in_range = false;
        }
    }

    /// Recomputes membership against the current on-route position and
    /// returns the events to deliver.
    pub fn update(&mut self, route: &Route, distance_along_route: f64) -> Vec<NearbyEvent> {
        let mut events = Vec::new();
        for (warning, in_range) in &mut self.watched {
            let nearest = route.nearest_segment(warning.object.position, None, None);
            let now_in_range = nearest.as_ref().is_some_and(|info| {
                let ahead = info.distance_along_route - distance_along_route;
                info.distance_to_route <= warning.max_distance_to_route
                    && ahead >= 0.0
                    && ahead <= warning.max_distance_along_route
            });
            match (*in_range, now_in_range) {
                (false, true) => {
                    let info = nearest.expect("in range implies a projection");
                    events.push(NearbyEvent::Add(
                        warning.object.clone(),
                        info.distance_to_route,
                        info.distance_along_route - distance_along_route,
                    ));
                }
                (true, true) => {
                    let info = nearest.expect("in range implies a projection");
                    events.push(NearbyEvent::Update(
                        warning.object.clone(),
                        info.distance_to_route,
                        info.distance_along_route - distance_along_route,
                    ));
                }
                (true, false) => events.push(NearbyEvent::Remove(warning.object.clone())),
                (false, false) => {}
            }
            *in_range = now_in_range;
        }
        events
    }
}
