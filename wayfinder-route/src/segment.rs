use crate::turn::Turn;
use geo::LineString;
use wayfinder_road::ArcRoadType;

/// One continuous piece of a built route: the traversal of a single named
/// road object.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteSegment {
    /// The road type of the object this segment is part of.
    pub road_type: ArcRoadType,
    /// The maximum legal speed in kph. Zero means no known limit, or the
    /// standard limit for the road class.
    pub max_speed: f64,
    /// The standard name of the road object.
    pub name: String,
    /// The road reference code of the object, e.g. "A40".
    pub reference: String,
    /// The distance in meters.
    pub distance: f64,
    /// The estimated traversal time in seconds, including `turn_time`.
    pub time: f64,
    /// The estimated seconds needed to navigate the junction at the start
    /// of the segment.
    pub turn_time: f64,
    /// The geometry of the segment in map units.
    pub path: LineString<f64>,
    /// The section number. Routes are divided into sections between
    /// waypoints, numbered from zero.
    pub section: u32,
    /// How to navigate the junction at the start of this segment.
    pub turn: Turn,
    /// True if this segment is restricted, for example a private access
    /// road, and was admitted only as a route endpoint.
    pub restricted: bool,
}

impl Default for RouteSegment {
    fn default() -> Self {
        Self {
            road_type: ArcRoadType::Unknown,
            max_speed: 0.0,
            name: String::new(),
            reference: String::new(),
            distance: 0.0,
            time: 0.0,
            turn_time: 0.0,
            path: LineString::new(Vec::new()),
            section: 0,
            turn: Turn::default(),
            restricted: false,
        }
    }
}

/// The path from the start or end of a route to the nearest non-trivial
/// junction, kept for exporting traffic information and location
/// references.
#[derive(Debug, Clone, PartialEq)]
pub struct PathToJunction {
    /// The path between the junction and the start or end of the route, in
    /// map units.
    pub path: LineString<f64>,
    /// The road type at the start of the path.
    pub start_road_type: ArcRoadType,
    /// The road type at the end of the path.
    pub end_road_type: ArcRoadType,
    /// The length of the path in meters.
    pub distance: f64,
}

impl Default for PathToJunction {
    fn default() -> Self {
        Self {
            path: LineString::new(Vec::new()),
            start_road_type: ArcRoadType::Unknown,
            end_road_type: ArcRoadType::Unknown,
            distance: 0.0,
        }
    }
}

impl PathToJunction {
    /// Resets to the empty state.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Reverses the path and swaps the end road types.
    pub fn reverse(&mut self) {
        self.path.0.reverse();
        std::mem::swap(&mut self.start_road_type, &mut self.end_road_type);
    }
}
