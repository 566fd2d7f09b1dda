//! Traffic information and location references.
//!
//! Traffic messages describe conditions on part of the road network and are
//! normally paired with a location reference describing where they apply;
//! the route's path-to-junction records supply the geometry for references
//! derived from a route.

use crate::xml::RouteXmlError;
use enumset::EnumSet;
use geo::Point;
use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::Writer;
use std::io::Write;
use wayfinder_road::{VehicleAccess, ALL_VEHICLES};

/// Speeds of this value or greater mean there is no speed limit.
pub const NO_SPEED_LIMIT: f64 = 255.0;

/// Traffic information applying to part of the road network.
#[derive(Debug, Clone, PartialEq)]
pub struct TrafficInfo {
    /// Vehicle classes affected by this information.
    pub vehicle_types: EnumSet<VehicleAccess>,
    /// Permitted or expected speed in kph. [`NO_SPEED_LIMIT`] or greater
    /// means no limit; zero or less means the road is closed.
    pub speed: f64,
    /// The information applies to vehicles of at least this weight in
    /// metric tons.
    pub weight: f64,
    /// True if there are road works.
    pub works: bool,
    /// True if a toll applies.
    pub toll: bool,
    /// The number of lanes open, if greater than zero.
    pub lanes: i32,
}

impl Default for TrafficInfo {
    fn default() -> Self {
        Self {
            vehicle_types: ALL_VEHICLES,
            speed: NO_SPEED_LIMIT,
            weight: 0.0,
            works: false,
            toll: false,
            lanes: 0,
        }
    }
}

impl TrafficInfo {
    /// Writes the information as a `<trafficInfo>` element.
    pub fn write_xml<W: Write>(&self, writer: W) -> Result<(), RouteXmlError> {
        let mut w = Writer::new(writer);
        let mut el = BytesStart::new("trafficInfo");
        el.push_attribute((
            "vehicleTypes",
            format!("{:#x}", self.vehicle_types.as_repr()).as_str(),
        ));
        el.push_attribute(("speed", self.speed.to_string().as_str()));
        el.push_attribute(("weight", self.weight.to_string().as_str()));
        el.push_attribute(("works", if self.works { "true" } else { "false" }));
        el.push_attribute(("toll", if self.toll { "true" } else { "false" }));
        el.push_attribute(("lanes", self.lanes.to_string().as_str()));
        w.write_event(Event::Empty(el))?;
        Ok(())
    }
}

/// The side of the road to which traffic information applies.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum SideOfRoad {
    #[default]
    None,
    Right,
    Left,
    Both,
}

impl SideOfRoad {
    fn name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Right => "right",
            Self::Left => "left",
            Self::Both => "both",
        }
    }
}

/// The orientation of a path along a road.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum RoadOrientation {
    #[default]
    None,
    Forwards,
    Backwards,
    Both,
}

impl RoadOrientation {
    fn name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Forwards => "forwards",
            Self::Backwards => "backwards",
            Self::Both => "both",
        }
    }
}

/// The type of a location reference used for traffic information.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationRefType {
    /// A line in the route network.
    Line,
    /// A point on the earth's surface.
    GeoCoordinate,
    /// A point on a line in the route network.
    PointAlongLine,
    /// A point on the network giving access to a nearby point of interest:
    /// the first point is on the line, the second is the POI.
    PointWithAccessPoint,
    /// A circle defined by a point and a radius.
    Circle,
    /// A rectangle aligned to the latitude/longitude grid, defined by two
    /// opposite corners.
    Rectangle,
    /// A polygon defined by a set of points.
    Polygon,
    /// A closed line in the route network.
    ClosedLine,
}

impl LocationRefType {
    fn name(self) -> &'static str {
        match self {
            Self::Line => "line",
            Self::GeoCoordinate => "geo_coordinate",
            Self::PointAlongLine => "point_along_line",
            Self::PointWithAccessPoint => "point_with_access_point",
            Self::Circle => "circle",
            Self::Rectangle => "rectangle",
            Self::Polygon => "polygon",
            Self::ClosedLine => "closed_line",
        }
    }
}

/// A location reference for traffic information.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationRef {
    /// The type of this reference.
    pub ref_type: LocationRefType,
    /// An arbitrary identifier.
    pub id: String,
    /// The point or points in geographic coordinates (x = longitude,
    /// y = latitude).
    pub geometry: Vec<Point<f64>>,
    /// The radius in meters, if this is a circle.
    pub radius: f64,
    /// The side of the road, where relevant.
    pub side_of_road: SideOfRoad,
    /// The road orientation, where relevant.
    pub road_orientation: RoadOrientation,
}

impl LocationRef {
    /// Creates an empty reference of the given type.
    pub fn new(ref_type: LocationRefType) -> Self {
        Self {
            ref_type,
            id: String::new(),
            geometry: Vec::new(),
            radius: 0.0,
            side_of_road: SideOfRoad::None,
            road_orientation: RoadOrientation::None,
        }
    }

    /// Writes the reference as a `<locationRef>` element.
    pub fn write_xml<W: Write>(&self, writer: W) -> Result<(), RouteXmlError> {
        let mut w = Writer::new(writer);
        let mut el = BytesStart::new("locationRef");
        el.push_attribute(("type", self.ref_type.name()));
        if !self.id.is_empty() {
            el.push_attribute(("id", self.id.as_str()));
        }
        el.push_attribute(("radius", self.radius.to_string().as_str()));
        el.push_attribute(("sideOfRoad", self.side_of_road.name()));
        el.push_attribute(("roadOrientation", self.road_orientation.name()));
        if self.geometry.is_empty() {
            w.write_event(Event::Empty(el))?;
            return Ok(());
        }
        w.write_event(Event::Start(el))?;
        for point in &self.geometry {
            let mut p = BytesStart::new("point");
            p.push_attribute(("lat", point.y().to_string().as_str()));
            p.push_attribute(("lon", point.x().to_string().as_str()));
            w.write_event(Event::Empty(p))?;
        }
        w.write_event(Event::End(BytesEnd::new("locationRef")))?;
        Ok(())
    }
}
