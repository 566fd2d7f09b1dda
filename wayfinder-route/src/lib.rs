//! # Route representation and profiles
//!
//! The data model shared by the routers and the navigator: routing profiles
//! and their cost parameters, built routes with their segments and turn
//! descriptors, geometric queries over a route, and the XML/GPX
//! serialization contract.
//!
//! Geometry is stored in projected map units; a [`Route::point_scale`]
//! converts map units to meters. Geographic positions only appear at the
//! boundaries, converted through an injected [`Projection`].

mod gpx;
mod index;
mod profile;
mod route;
mod segment;
mod traffic;
mod turn;
mod xml;

use geo::{Coord, Point};

pub use self::gpx::{write_route_gpx, GpxExportError};
pub use index::NearestSegmentInfo;
pub use profile::{ProfileType, RouteProfile, Usability, VehicleType, DEFAULT_GRADIENT_FLAGS};
pub use route::Route;
pub use segment::{PathToJunction, RouteSegment};
pub use traffic::{
    LocationRef, LocationRefType, RoadOrientation, SideOfRoad, TrafficInfo, NO_SPEED_LIMIT,
};
pub use turn::{
    classify_turn, JunctionInfo, RoundaboutState, Turn, TurnType, U_TURN_WINDOW_DEGREES,
};
pub use xml::{
    read_profile_xml, read_route_xml, write_profile_xml, write_route_xml, write_turn_xml,
    RouteXmlError,
};

/// Conversion between geographic positions and projected map coordinates.
///
/// The map projection itself is an external collaborator; routes only need
/// the two mappings. Geographic points use `x` for longitude and `y` for
/// latitude, in degrees.
pub trait Projection {
    /// Projects a geographic position to map coordinates.
    fn to_map(&self, position: Point<f64>) -> Coord<f64>;

    /// Inverse projection from map coordinates to a geographic position.
    fn to_geographic(&self, map: Coord<f64>) -> Point<f64>;
}

const METERS_PER_DEGREE_LAT: f64 = 111_132.954;

/// An equirectangular projection centered on an origin, with map units of
/// one meter.
///
/// Accurate over the extents a single route covers (up to a few tens of
/// kilometers); accuracy decreases at polar latitudes and it does not
/// account for the antimeridian.
#[derive(Debug, Clone)]
pub struct LocalProjection {
    origin: Point<f64>,
    meters_per_lon_degree: f64,
}

impl LocalProjection {
    /// Creates a projection centered on the given geographic origin.
    pub fn new(origin: Point<f64>) -> Self {
        Self {
            origin,
            meters_per_lon_degree: origin.y().to_radians().cos() * METERS_PER_DEGREE_LAT,
        }
    }
}

impl Projection for LocalProjection {
    fn to_map(&self, position: Point<f64>) -> Coord<f64> {
        Coord {
            x: (position.x() - self.origin.x()) * self.meters_per_lon_degree,
            y: (position.y() - self.origin.y()) * METERS_PER_DEGREE_LAT,
        }
    }

    fn to_geographic(&self, map: Coord<f64>) -> Point<f64> {
        Point::new(
            self.origin.x() + map.x / self.meters_per_lon_degree,
            self.origin.y() + map.y / METERS_PER_DEGREE_LAT,
        )
    }
}
