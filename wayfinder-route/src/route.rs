use crate::profile::RouteProfile;
use crate::segment::{PathToJunction, RouteSegment};
use crate::turn::{JunctionInfo, Turn};
use geo::{Coord, LineString};
use wayfinder_road::ArcRoadType;

/// An entire route: an ordered sequence of segments with totals, the
/// concatenated geometry, and the profile used to plan it.
///
/// A route is built by a router and then frozen; the navigator never
/// mutates the route it observes.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    /// The route segments in traversal order.
    pub segments: Vec<RouteSegment>,
    /// The distance of the route in meters.
    pub distance: f64,
    /// The estimated time taken to traverse the route in seconds.
    pub time: f64,
    /// The path along the entire route in map units; always the head-to-tail
    /// concatenation of the segment paths.
    pub path: LineString<f64>,
    /// The scale converting map units to meters. For example, if the map
    /// unit is 32nds of meters this is 1/32.
    pub point_scale: f64,
    /// The path to the first non-trivial junction before the route.
    pub to_junction_before: PathToJunction,
    /// The path to the first non-trivial junction after the route.
    pub to_junction_after: PathToJunction,
    /// The profile used to create the route.
    pub profile: RouteProfile,
}

impl Route {
    /// Creates an empty route for the given profile and point scale.
    pub fn new(profile: RouteProfile, point_scale: f64) -> Self {
        Self {
            segments: Vec::new(),
            distance: 0.0,
            time: 0.0,
            path: LineString::new(Vec::new()),
            point_scale,
            to_junction_before: PathToJunction::default(),
            to_junction_after: PathToJunction::default(),
            profile,
        }
    }

    /// True if the route has no segments.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// The number of sections: one more than the highest section number.
    pub fn section_count(&self) -> u32 {
        self.segments.last().map_or(0, |s| s.section + 1)
    }

    /// Appends the traversal of one road object.
    ///
    /// The entry turn is classified from `junction`; the first segment of a
    /// route gets no turn. A traversal that merely continues the previous
    /// segment's road (same name, reference, type, section, and restriction
    /// state, with a continuation turn) is merged into it, keeping segments
    /// maximal. `time` excludes the junction time, which is taken from
    /// `junction` and included in the stored segment time.
    #[allow(clippy::too_many_arguments)]
    pub fn append_segment(
        &mut self,
        junction: &JunctionInfo,
        contour: &[Coord<f64>],
        name: &str,
        reference: &str,
        road_type: ArcRoadType,
        max_speed: f64,
        distance: f64,
        time: f64,
        section: u32,
        restricted: bool,
    ) {
        debug_assert!(
            self.segments.last().is_none_or(|s| s.section <= section),
            "sections must be non-decreasing"
        );

        if self.segments.is_empty() {
            let segment = RouteSegment {
                road_type,
                max_speed,
                name: name.to_string(),
                reference: reference.to_string(),
                distance,
                time,
                turn_time: 0.0,
                path: LineString::new(contour.to_vec()),
                section,
                turn: Turn::default(),
                restricted,
            };
            self.distance += distance;
            self.time += time;
            extend_path(&mut self.path, contour);
            self.segments.push(segment);
            return;
        }

        let turn = Turn::from_junction(junction);
        let total_time = time + junction.turn_time;

        let mergeable = {
            let last = self.segments.last().expect("checked non-empty");
            turn.continues
                && last.section == section
                && last.restricted == restricted
                && last.road_type == road_type
                && last.name == name
                && last.reference == reference
        };

        if mergeable {
            let last = self.segments.last_mut().expect("checked non-empty");
            last.distance += distance;
            last.time += total_time;
            extend_path(&mut last.path, contour);
        } else {
            self.segments.push(RouteSegment {
                road_type,
                max_speed,
                name: name.to_string(),
                reference: reference.to_string(),
                distance,
                time: total_time,
                turn_time: junction.turn_time,
                path: LineString::new(contour.to_vec()),
                section,
                turn,
                restricted,
            });
        }
        self.distance += distance;
        self.time += total_time;
        extend_path(&mut self.path, contour);
    }

    /// Concatenates a continuation route, for example the remainder planned
    /// after passing a waypoint.
    pub fn append(&mut self, other: &Route) {
        for segment in &other.segments {
            self.distance += segment.distance;
            self.time += segment.time;
            extend_path(&mut self.path, &segment.path.0);
            self.segments.push(segment.clone());
        }
        self.to_junction_after = other.to_junction_after.clone();
    }

    /// A copy of this route without segments flagged as restricted; section
    /// numbering is preserved.
    pub fn without_restricted_segments(&self) -> Route {
        let mut out = Route::new(self.profile.clone(), self.point_scale);
        out.to_junction_before = self.to_junction_before.clone();
        out.to_junction_after = self.to_junction_after.clone();
        for segment in self.segments.iter().filter(|s| !s.restricted) {
            out.distance += segment.distance;
            out.time += segment.time;
            extend_path(&mut out.path, &segment.path.0);
            out.segments.push(segment.clone());
        }
        out
    }
}

/// Appends points, skipping the leading point when it repeats the current
/// tail so segment paths concatenate head-to-tail exactly.
pub(crate) fn extend_path(path: &mut LineString<f64>, points: &[Coord<f64>]) {
    let mut points = points;
    if let (Some(last), Some(first)) = (path.0.last(), points.first()) {
        if last == first {
            points = &points[1..];
        }
    }
    path.0.extend_from_slice(points);
}
