//! XML serialization of routes, profiles, and turns.
//!
//! The element vocabulary uses the stable road-type, gradient, turn-type,
//! and roundabout-state name tables; renumbering or renaming any of them
//! breaks previously written documents.

use crate::profile::{RouteProfile, VehicleType};
use crate::route::{extend_path, Route};
use crate::segment::{PathToJunction, RouteSegment};
use crate::turn::{RoundaboutState, Turn, TurnType};
use crate::Projection;
use geo::{Coord, LineString};
use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};
use std::io::{BufRead, Write};
use thiserror::Error;
use wayfinder_road::{ArcRoadType, Gradient, VehicleAccess, ARC_ROAD_TYPE_COUNT, GRADIENT_COUNT};

/// Errors arising while reading or writing route documents.
#[derive(Debug, Error)]
pub enum RouteXmlError {
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed <{element}> element: {message}")]
    Malformed {
        element: &'static str,
        message: String,
    },
    #[error("unexpected end of document")]
    UnexpectedEof,
}

fn malformed(element: &'static str, message: impl Into<String>) -> RouteXmlError {
    RouteXmlError::Malformed {
        element,
        message: message.into(),
    }
}

// ---------------------------------------------------------------------------
// Writing

/// Writes a route as XML. Contour points carry both map-unit coordinates and
/// geographic coordinates obtained through `projection`.
pub fn write_route_xml<W: Write>(
    route: &Route,
    writer: W,
    projection: &dyn Projection,
) -> Result<(), RouteXmlError> {
    let mut w = Writer::new_with_indent(writer, b' ', 2);

    let mut el = BytesStart::new("route");
    push_f64(&mut el, "distance", route.distance);
    push_f64(&mut el, "time", route.time);
    push_f64(&mut el, "pointScale", route.point_scale);
    w.write_event(Event::Start(el))?;

    write_profile_into(&mut w, &route.profile)?;
    write_path_to_junction(&mut w, &route.to_junction_before, "before", projection)?;
    write_path_to_junction(&mut w, &route.to_junction_after, "after", projection)?;
    for segment in &route.segments {
        write_segment(&mut w, segment, projection)?;
    }

    w.write_event(Event::End(BytesEnd::new("route")))?;
    Ok(())
}

/// Writes a route profile as a standalone XML document.
pub fn write_profile_xml<W: Write>(
    profile: &RouteProfile,
    writer: W,
) -> Result<(), RouteXmlError> {
    let mut w = Writer::new_with_indent(writer, b' ', 2);
    write_profile_into(&mut w, profile)?;
    Ok(())
}

/// Writes a single turn descriptor as a `<turn>` element.
pub fn write_turn_xml<W: Write>(turn: &Turn, writer: W) -> Result<(), RouteXmlError> {
    let mut w = Writer::new(writer);
    write_turn_into(&mut w, turn)?;
    Ok(())
}

fn push_f64(el: &mut BytesStart, name: &str, value: f64) {
    el.push_attribute((name, value.to_string().as_str()));
}

fn push_i32(el: &mut BytesStart, name: &str, value: i32) {
    el.push_attribute((name, value.to_string().as_str()));
}

fn push_bool(el: &mut BytesStart, name: &str, value: bool) {
    el.push_attribute((name, if value { "true" } else { "false" }));
}

fn push_hex(el: &mut BytesStart, name: &str, value: u32) {
    el.push_attribute((name, format!("{value:#x}").as_str()));
}

fn write_profile_into<W: Write>(
    w: &mut Writer<W>,
    profile: &RouteProfile,
) -> Result<(), RouteXmlError> {
    let mut el = BytesStart::new("routeProfile");
    push_bool(&mut el, "shortest", profile.shortest);
    push_f64(&mut el, "tollPenalty", profile.toll_penalty_clamped());
    push_i32(&mut el, "turnTime", profile.turn_time);
    push_i32(&mut el, "uTurnTime", profile.u_turn_time);
    push_i32(&mut el, "crossTrafficTurnTime", profile.cross_traffic_turn_time);
    push_i32(&mut el, "trafficLightTime", profile.traffic_light_time);
    push_hex(&mut el, "gradientFlags", profile.gradient_flags);
    w.write_event(Event::Start(el))?;

    let mut vehicle = BytesStart::new("vehicleType");
    push_hex(&mut vehicle, "accessFlags", u32::from(profile.vehicle.access.as_repr()));
    push_f64(&mut vehicle, "weight", profile.vehicle.weight);
    push_f64(&mut vehicle, "axleLoad", profile.vehicle.axle_load);
    push_f64(&mut vehicle, "doubleAxleLoad", profile.vehicle.double_axle_load);
    push_f64(&mut vehicle, "tripleAxleLoad", profile.vehicle.triple_axle_load);
    push_f64(&mut vehicle, "height", profile.vehicle.height);
    push_f64(&mut vehicle, "width", profile.vehicle.width);
    push_f64(&mut vehicle, "length", profile.vehicle.length);
    push_bool(&mut vehicle, "hazmat", profile.vehicle.hazmat);
    w.write_event(Event::Empty(vehicle))?;

    for i in 0..ARC_ROAD_TYPE_COUNT {
        let road_type = ArcRoadType::from_index(i);
        if profile.speed[i] != 0.0 {
            let mut speed = BytesStart::new("speed");
            speed.push_attribute(("type", road_type.name()));
            push_f64(&mut speed, "kph", profile.speed[i]);
            w.write_event(Event::Empty(speed))?;
        }
        if profile.bonus[i] != 0.0 {
            let mut bonus = BytesStart::new("bonus");
            bonus.push_attribute(("type", road_type.name()));
            push_f64(&mut bonus, "kph", profile.bonus[i]);
            w.write_event(Event::Empty(bonus))?;
        }
        if !profile.restriction_override[i].is_empty() {
            let mut over = BytesStart::new("restrictionOverride");
            over.push_attribute(("type", road_type.name()));
            push_hex(&mut over, "flags", u32::from(profile.restriction_override[i].as_repr()));
            w.write_event(Event::Empty(over))?;
        }
    }

    for i in 0..GRADIENT_COUNT {
        let gradient = Gradient::from_index(i);
        if profile.gradient_speed[i] != 0.0 {
            let mut speed = BytesStart::new("gradientSpeed");
            speed.push_attribute(("type", gradient.name()));
            push_f64(&mut speed, "kph", profile.gradient_speed[i]);
            w.write_event(Event::Empty(speed))?;
        }
        if profile.gradient_bonus[i] != 0.0 {
            let mut bonus = BytesStart::new("gradientBonus");
            bonus.push_attribute(("type", gradient.name()));
            push_f64(&mut bonus, "kph", profile.gradient_bonus[i]);
            w.write_event(Event::Empty(bonus))?;
        }
    }

    w.write_event(Event::End(BytesEnd::new("routeProfile")))?;
    Ok(())
}

fn write_turn_into<W: Write>(w: &mut Writer<W>, turn: &Turn) -> Result<(), RouteXmlError> {
    let mut el = BytesStart::new("turn");
    el.push_attribute(("type", turn.turn_type.name()));
    el.push_attribute(("roundabout", turn.roundabout.name()));
    push_f64(&mut el, "angle", turn.angle);
    push_i32(&mut el, "exit-number", turn.exit_number);
    push_i32(&mut el, "choices", turn.choices);
    push_i32(&mut el, "left-alternatives", turn.left_alternatives);
    push_i32(&mut el, "right-alternatives", turn.right_alternatives);
    push_bool(&mut el, "is-fork", turn.is_fork);
    push_bool(&mut el, "turn-off", turn.is_turn_off);
    if !turn.junction_name.is_empty() {
        el.push_attribute(("name", turn.junction_name.as_str()));
    }
    if !turn.junction_ref.is_empty() {
        el.push_attribute(("ref", turn.junction_ref.as_str()));
    }
    w.write_event(Event::Empty(el))?;
    Ok(())
}

fn write_point<W: Write>(
    w: &mut Writer<W>,
    point: Coord<f64>,
    projection: &dyn Projection,
) -> Result<(), RouteXmlError> {
    let geographic = projection.to_geographic(point);
    let mut el = BytesStart::new("point");
    push_f64(&mut el, "x", point.x);
    push_f64(&mut el, "y", point.y);
    push_f64(&mut el, "lat", geographic.y());
    push_f64(&mut el, "lon", geographic.x());
    w.write_event(Event::Empty(el))?;
    Ok(())
}

fn write_path_to_junction<W: Write>(
    w: &mut Writer<W>,
    path: &PathToJunction,
    position: &str,
    projection: &dyn Projection,
) -> Result<(), RouteXmlError> {
    let mut el = BytesStart::new("pathToJunction");
    el.push_attribute(("position", position));
    el.push_attribute(("startRoadType", path.start_road_type.name()));
    el.push_attribute(("endRoadType", path.end_road_type.name()));
    push_f64(&mut el, "distance", path.distance);
    if path.path.0.is_empty() {
        w.write_event(Event::Empty(el))?;
    } else {
        w.write_event(Event::Start(el))?;
        for point in &path.path.0 {
            write_point(w, *point, projection)?;
        }
        w.write_event(Event::End(BytesEnd::new("pathToJunction")))?;
    }
    Ok(())
}

fn write_segment<W: Write>(
    w: &mut Writer<W>,
    segment: &RouteSegment,
    projection: &dyn Projection,
) -> Result<(), RouteXmlError> {
    let mut el = BytesStart::new("segment");
    el.push_attribute(("roadType", segment.road_type.name()));
    push_f64(&mut el, "maxSpeed", segment.max_speed);
    el.push_attribute(("name", segment.name.as_str()));
    el.push_attribute(("ref", segment.reference.as_str()));
    push_f64(&mut el, "distance", segment.distance);
    push_f64(&mut el, "time", segment.time);
    push_f64(&mut el, "turnTime", segment.turn_time);
    el.push_attribute(("section", segment.section.to_string().as_str()));
    push_bool(&mut el, "restricted", segment.restricted);
    w.write_event(Event::Start(el))?;

    write_turn_into(w, &segment.turn)?;
    for point in &segment.path.0 {
        write_point(w, *point, projection)?;
    }

    w.write_event(Event::End(BytesEnd::new("segment")))?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Reading

struct Attrs {
    pairs: Vec<(String, String)>,
}

impl Attrs {
    fn parse(element: &'static str, start: &BytesStart) -> Result<Self, RouteXmlError> {
        let mut pairs = Vec::new();
        for attr in start.attributes() {
            let attr: Attribute =
                attr.map_err(|e| malformed(element, format!("bad attribute: {e}")))?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr
                .unescape_value()
                .map_err(|e| malformed(element, format!("bad attribute value: {e}")))?
                .into_owned();
            pairs.push((key, value));
        }
        Ok(Self { pairs })
    }

    fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn f64(&self, element: &'static str, key: &str) -> Result<f64, RouteXmlError> {
        let raw = self
            .get(key)
            .ok_or_else(|| malformed(element, format!("missing attribute {key}")))?;
        raw.parse()
            .map_err(|_| malformed(element, format!("attribute {key} is not a number: {raw}")))
    }

    fn f64_or(&self, element: &'static str, key: &str, default: f64) -> Result<f64, RouteXmlError> {
        match self.get(key) {
            Some(_) => self.f64(element, key),
            None => Ok(default),
        }
    }

    fn i32(&self, element: &'static str, key: &str) -> Result<i32, RouteXmlError> {
        let raw = self
            .get(key)
            .ok_or_else(|| malformed(element, format!("missing attribute {key}")))?;
        raw.parse()
            .map_err(|_| malformed(element, format!("attribute {key} is not an integer: {raw}")))
    }

    fn bool(&self, element: &'static str, key: &str) -> Result<bool, RouteXmlError> {
        match self.get(key) {
            Some("true") | Some("1") => Ok(true),
            Some("false") | Some("0") | None => Ok(false),
            Some(other) => Err(malformed(
                element,
                format!("attribute {key} is not a boolean: {other}"),
            )),
        }
    }

    fn hex(&self, element: &'static str, key: &str) -> Result<u32, RouteXmlError> {
        let raw = self
            .get(key)
            .ok_or_else(|| malformed(element, format!("missing attribute {key}")))?;
        let digits = raw.strip_prefix("0x").unwrap_or(raw);
        u32::from_str_radix(digits, 16)
            .map_err(|_| malformed(element, format!("attribute {key} is not hex: {raw}")))
    }

    fn road_type(&self, element: &'static str, key: &str) -> Result<ArcRoadType, RouteXmlError> {
        let raw = self
            .get(key)
            .ok_or_else(|| malformed(element, format!("missing attribute {key}")))?;
        ArcRoadType::from_name(raw)
            .ok_or_else(|| malformed(element, format!("unknown road type: {raw}")))
    }
}

/// Reads a route written by [`write_route_xml`]. Map-unit coordinates are
/// authoritative; geographic attributes are ignored.
pub fn read_route_xml<R: BufRead>(reader: R) -> Result<Route, RouteXmlError> {
    let mut xml = Reader::from_reader(reader);
    let mut buf = Vec::new();
    let mut route: Option<Route> = None;

    loop {
        match xml.read_event_into(&mut buf)? {
            Event::Start(start) => match start.name().as_ref() {
                b"route" => {
                    let attrs = Attrs::parse("route", &start)?;
                    let mut r = Route::new(RouteProfile::empty(), attrs.f64("route", "pointScale")?);
                    r.distance = attrs.f64("route", "distance")?;
                    r.time = attrs.f64("route", "time")?;
                    route = Some(r);
                }
                b"routeProfile" => {
                    let route = route
                        .as_mut()
                        .ok_or_else(|| malformed("routeProfile", "outside <route>"))?;
                    let attrs = Attrs::parse("routeProfile", &start)?;
                    route.profile = read_profile_body(&mut xml, &attrs)?;
                }
                b"pathToJunction" => {
                    let attrs = Attrs::parse("pathToJunction", &start)?;
                    let parsed = read_path_to_junction(&mut xml, &attrs)?;
                    store_path_to_junction(route.as_mut(), &attrs, parsed)?;
                }
                b"segment" => {
                    let route = route
                        .as_mut()
                        .ok_or_else(|| malformed("segment", "outside <route>"))?;
                    let segment = read_segment(&mut xml, &start)?;
                    extend_path(&mut route.path, &segment.path.0);
                    route.segments.push(segment);
                }
                other => {
                    return Err(malformed(
                        "route",
                        format!("unexpected element <{}>", String::from_utf8_lossy(other)),
                    ));
                }
            },
            Event::Empty(start) => {
                if start.name().as_ref() == b"pathToJunction" {
                    let attrs = Attrs::parse("pathToJunction", &start)?;
                    let mut parsed = PathToJunction::default();
                    parsed.start_road_type = attrs.road_type("pathToJunction", "startRoadType")?;
                    parsed.end_road_type = attrs.road_type("pathToJunction", "endRoadType")?;
                    parsed.distance = attrs.f64("pathToJunction", "distance")?;
                    store_path_to_junction(route.as_mut(), &attrs, parsed)?;
                }
            }
            Event::End(end) if end.name().as_ref() == b"route" => {
                return route.ok_or(RouteXmlError::UnexpectedEof);
            }
            Event::Eof => {
                return Err(RouteXmlError::UnexpectedEof);
            }
            _ => {}
        }
        buf.clear();
    }
}

/// Reads a standalone profile document written by [`write_profile_xml`].
pub fn read_profile_xml<R: BufRead>(reader: R) -> Result<RouteProfile, RouteXmlError> {
    let mut xml = Reader::from_reader(reader);
    let mut buf = Vec::new();
    loop {
        match xml.read_event_into(&mut buf)? {
            Event::Start(start) if start.name().as_ref() == b"routeProfile" => {
                let attrs = Attrs::parse("routeProfile", &start)?;
                return read_profile_body(&mut xml, &attrs);
            }
            Event::Eof => return Err(RouteXmlError::UnexpectedEof),
            _ => {}
        }
        buf.clear();
    }
}

fn store_path_to_junction(
    route: Option<&mut Route>,
    attrs: &Attrs,
    parsed: PathToJunction,
) -> Result<(), RouteXmlError> {
    let route = route.ok_or_else(|| malformed("pathToJunction", "outside <route>"))?;
    match attrs.get("position") {
        Some("before") => route.to_junction_before = parsed,
        Some("after") => route.to_junction_after = parsed,
        other => {
            return Err(malformed(
                "pathToJunction",
                format!("bad position attribute: {other:?}"),
            ));
        }
    }
    Ok(())
}

fn read_profile_body<R: BufRead>(
    xml: &mut Reader<R>,
    attrs: &Attrs,
) -> Result<RouteProfile, RouteXmlError> {
    let mut profile = RouteProfile::empty();
    profile.shortest = attrs.bool("routeProfile", "shortest")?;
    profile.toll_penalty = attrs
        .f64("routeProfile", "tollPenalty")?
        .clamp(0.0, 1.0);
    profile.turn_time = attrs.i32("routeProfile", "turnTime")?;
    profile.u_turn_time = attrs.i32("routeProfile", "uTurnTime")?;
    profile.cross_traffic_turn_time = attrs.i32("routeProfile", "crossTrafficTurnTime")?;
    profile.traffic_light_time = attrs.i32("routeProfile", "trafficLightTime")?;
    profile.gradient_flags = attrs.hex("routeProfile", "gradientFlags")?;

    let mut buf = Vec::new();
    loop {
        match xml.read_event_into(&mut buf)? {
            Event::Empty(start) => {
                let name = start.name().as_ref().to_vec();
                match name.as_slice() {
                    b"vehicleType" => {
                        let attrs = Attrs::parse("vehicleType", &start)?;
                        profile.vehicle = read_vehicle(&attrs)?;
                    }
                    b"speed" | b"bonus" => {
                        let is_speed = name.as_slice() == b"speed";
                        let element = if is_speed { "speed" } else { "bonus" };
                        let attrs = Attrs::parse(element, &start)?;
                        let road_type = attrs.road_type(element, "type")?;
                        let kph = attrs.f64(element, "kph")?;
                        if is_speed {
                            // Negative base speeds are clamped, not reported.
                            profile.speed[road_type.index()] = kph.max(0.0);
                        } else {
                            profile.bonus[road_type.index()] = kph;
                        }
                    }
                    b"restrictionOverride" => {
                        let attrs = Attrs::parse("restrictionOverride", &start)?;
                        let road_type = attrs.road_type("restrictionOverride", "type")?;
                        let bits = attrs.hex("restrictionOverride", "flags")?;
                        let repr = u16::try_from(bits & 0x0FFF)
                            .expect("masked to 12 bits");
                        profile.restriction_override[road_type.index()] =
                            enumset::EnumSet::<VehicleAccess>::from_repr(repr);
                    }
                    b"gradientSpeed" | b"gradientBonus" => {
                        let is_speed = name.as_slice() == b"gradientSpeed";
                        let element = if is_speed { "gradientSpeed" } else { "gradientBonus" };
                        let attrs = Attrs::parse(element, &start)?;
                        let raw = attrs
                            .get("type")
                            .ok_or_else(|| malformed(element, "missing attribute type"))?;
                        let gradient = Gradient::from_name(raw)
                            .ok_or_else(|| malformed(element, format!("unknown gradient: {raw}")))?;
                        let kph = attrs.f64(element, "kph")?;
                        if is_speed {
                            profile.gradient_speed[gradient.index()] = kph;
                        } else {
                            profile.gradient_bonus[gradient.index()] = kph;
                        }
                    }
                    other => {
                        return Err(malformed(
                            "routeProfile",
                            format!("unexpected element <{}>", String::from_utf8_lossy(other)),
                        ));
                    }
                }
            }
            Event::End(end) if end.name().as_ref() == b"routeProfile" => return Ok(profile),
            Event::Eof => return Err(RouteXmlError::UnexpectedEof),
            _ => {}
        }
        buf.clear();
    }
}

fn read_vehicle(attrs: &Attrs) -> Result<VehicleType, RouteXmlError> {
    let bits = attrs.hex("vehicleType", "accessFlags")?;
    let repr = u16::try_from(bits & 0x0FFF).expect("masked to 12 bits");
    let mut vehicle = VehicleType {
        access: enumset::EnumSet::<VehicleAccess>::from_repr(repr),
        weight: attrs.f64_or("vehicleType", "weight", 0.0)?,
        axle_load: attrs.f64_or("vehicleType", "axleLoad", 0.0)?,
        double_axle_load: attrs.f64_or("vehicleType", "doubleAxleLoad", 0.0)?,
        triple_axle_load: attrs.f64_or("vehicleType", "tripleAxleLoad", 0.0)?,
        height: attrs.f64_or("vehicleType", "height", 0.0)?,
        width: attrs.f64_or("vehicleType", "width", 0.0)?,
        length: attrs.f64_or("vehicleType", "length", 0.0)?,
        hazmat: attrs.bool("vehicleType", "hazmat")?,
    };
    vehicle.normalize();
    Ok(vehicle)
}

fn read_point(start: &BytesStart) -> Result<Coord<f64>, RouteXmlError> {
    let attrs = Attrs::parse("point", start)?;
    Ok(Coord {
        x: attrs.f64("point", "x")?,
        y: attrs.f64("point", "y")?,
    })
}

fn read_path_to_junction<R: BufRead>(
    xml: &mut Reader<R>,
    attrs: &Attrs,
) -> Result<PathToJunction, RouteXmlError> {
    let mut parsed = PathToJunction {
        start_road_type: attrs.road_type("pathToJunction", "startRoadType")?,
        end_road_type: attrs.road_type("pathToJunction", "endRoadType")?,
        distance: attrs.f64("pathToJunction", "distance")?,
        ..PathToJunction::default()
    };
    let mut buf = Vec::new();
    loop {
        match xml.read_event_into(&mut buf)? {
            Event::Empty(start) if start.name().as_ref() == b"point" => {
                parsed.path.0.push(read_point(&start)?);
            }
            Event::End(end) if end.name().as_ref() == b"pathToJunction" => return Ok(parsed),
            Event::Eof => return Err(RouteXmlError::UnexpectedEof),
            _ => {}
        }
        buf.clear();
    }
}

fn read_turn(start: &BytesStart) -> Result<Turn, RouteXmlError> {
    let attrs = Attrs::parse("turn", start)?;
    let type_name = attrs
        .get("type")
        .ok_or_else(|| malformed("turn", "missing attribute type"))?;
    let turn_type = TurnType::from_name(type_name)
        .ok_or_else(|| malformed("turn", format!("unknown turn type: {type_name}")))?;
    let roundabout_name = attrs.get("roundabout").unwrap_or("none");
    let roundabout = RoundaboutState::from_name(roundabout_name).ok_or_else(|| {
        malformed("turn", format!("unknown roundabout state: {roundabout_name}"))
    })?;
    let is_fork = attrs.bool("turn", "is-fork")?;
    let is_turn_off = attrs.bool("turn", "turn-off")?;
    Ok(Turn {
        turn_type,
        continues: matches!(turn_type, TurnType::None | TurnType::Ahead)
            && roundabout == RoundaboutState::None
            && !is_fork
            && !is_turn_off,
        roundabout,
        angle: attrs.f64("turn", "angle")?,
        exit_number: attrs.i32("turn", "exit-number")?,
        choices: attrs.i32("turn", "choices")?,
        left_alternatives: attrs.i32("turn", "left-alternatives")?,
        right_alternatives: attrs.i32("turn", "right-alternatives")?,
        is_fork,
        is_turn_off,
        junction_name: attrs.get("name").unwrap_or("").to_string(),
        junction_ref: attrs.get("ref").unwrap_or("").to_string(),
    })
}

fn read_segment<R: BufRead>(
    xml: &mut Reader<R>,
    start: &BytesStart,
) -> Result<RouteSegment, RouteXmlError> {
    let attrs = Attrs::parse("segment", start)?;
    let mut segment = RouteSegment {
        road_type: attrs.road_type("segment", "roadType")?,
        max_speed: attrs.f64("segment", "maxSpeed")?,
        name: attrs.get("name").unwrap_or("").to_string(),
        reference: attrs.get("ref").unwrap_or("").to_string(),
        distance: attrs.f64("segment", "distance")?,
        time: attrs.f64("segment", "time")?,
        turn_time: attrs.f64("segment", "turnTime")?,
        path: LineString::new(Vec::new()),
        section: u32::try_from(attrs.i32("segment", "section")?)
            .map_err(|_| malformed("segment", "negative section"))?,
        turn: Turn::default(),
        restricted: attrs.bool("segment", "restricted")?,
    };
    let mut buf = Vec::new();
    loop {
        match xml.read_event_into(&mut buf)? {
            Event::Empty(inner) => match inner.name().as_ref() {
                b"turn" => segment.turn = read_turn(&inner)?,
                b"point" => segment.path.0.push(read_point(&inner)?),
                other => {
                    return Err(malformed(
                        "segment",
                        format!("unexpected element <{}>", String::from_utf8_lossy(other)),
                    ));
                }
            },
            Event::End(end) if end.name().as_ref() == b"segment" => return Ok(segment),
            Event::Eof => return Err(RouteXmlError::UnexpectedEof),
            _ => {}
        }
        buf.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::ProfileType;
    use crate::turn::JunctionInfo;
    use crate::LocalProjection;
    use geo::{coord, Point};
    use wayfinder_road::VehicleAccess;

    fn sample_route() -> Route {
        let mut route = Route::new(RouteProfile::new(ProfileType::Car), 1.0);
        route.append_segment(
            &JunctionInfo::default(),
            &[coord! {x: 0.0, y: 0.0}, coord! {x: 100.0, y: 0.0}],
            "East & West Street",
            "B123",
            ArcRoadType::Secondary,
            50.0,
            100.0,
            9.0,
            0,
            false,
        );
        route.append_segment(
            &JunctionInfo {
                turn_angle: -60.0,
                choices: 3,
                left_alternatives: 0,
                right_alternatives: 2,
                turn_time: 4.0,
                junction_name: "Mill Corner".to_string(),
                ..JunctionInfo::default()
            },
            &[coord! {x: 100.0, y: 0.0}, coord! {x: 100.0, y: 250.0}],
            "North Road",
            "",
            ArcRoadType::Residential,
            0.0,
            250.0,
            30.0,
            0,
            false,
        );
        route.to_junction_before = PathToJunction {
            path: LineString::new(vec![coord! {x: -20.0, y: 0.0}, coord! {x: 0.0, y: 0.0}]),
            start_road_type: ArcRoadType::Secondary,
            end_road_type: ArcRoadType::Secondary,
            distance: 20.0,
        };
        route
    }

    fn projection() -> LocalProjection {
        LocalProjection::new(Point::new(-0.5, 51.2))
    }

    #[test]
    fn route_round_trips_through_xml() {
        let route = sample_route();
        let mut out = Vec::new();
        write_route_xml(&route, &mut out, &projection()).unwrap();

        let parsed = read_route_xml(out.as_slice()).unwrap();
        assert_eq!(parsed.distance, route.distance);
        assert_eq!(parsed.time, route.time);
        assert_eq!(parsed.point_scale, route.point_scale);
        assert_eq!(parsed.segments, route.segments);
        assert_eq!(parsed.path, route.path);
        assert_eq!(parsed.to_junction_before, route.to_junction_before);
        assert_eq!(parsed.to_junction_after, route.to_junction_after);
    }

    #[test]
    fn profile_round_trips_exactly() {
        for kind in [
            ProfileType::Car,
            ProfileType::Walk,
            ProfileType::Cycle,
            ProfileType::Hike,
        ] {
            let mut profile = RouteProfile::new(kind);
            profile.restriction_override[ArcRoadType::Track.index()] =
                enumset::EnumSet::only(VehicleAccess::HeavyGoods);
            profile.toll_penalty = 0.25;
            let mut out = Vec::new();
            write_profile_xml(&profile, &mut out).unwrap();
            let parsed = read_profile_xml(out.as_slice()).unwrap();
            assert_eq!(parsed, profile, "{kind:?}");
        }
    }

    #[test]
    fn vehicle_details_round_trip() {
        let mut profile = RouteProfile::new(ProfileType::Car);
        profile.vehicle.weight = 3.5;
        profile.vehicle.height = 2.1;
        profile.vehicle.hazmat = true;
        profile.vehicle.normalize();

        let mut out = Vec::new();
        write_profile_xml(&profile, &mut out).unwrap();
        let parsed = read_profile_xml(out.as_slice()).unwrap();
        assert_eq!(parsed.vehicle, profile.vehicle);
        assert!(parsed.vehicle.access.contains(VehicleAccess::Other));
    }

    #[test]
    fn out_of_range_toll_penalty_is_clamped_on_read() {
        let xml = r#"<routeProfile shortest="false" tollPenalty="7.5" turnTime="4"
            uTurnTime="300" crossTrafficTurnTime="8" trafficLightTime="10"
            gradientFlags="0xffffffff"></routeProfile>"#;
        let parsed = read_profile_xml(xml.as_bytes()).unwrap();
        assert_eq!(parsed.toll_penalty, 1.0);
    }

    #[test]
    fn malformed_documents_are_rejected() {
        let err = read_route_xml(&b"<route distance=\"nope\" time=\"0\" pointScale=\"1\"/>"[..])
            .unwrap_err();
        assert!(matches!(err, RouteXmlError::Malformed { .. }), "{err}");

        let err = read_route_xml(&b"<route distance=\"1\" time=\"0\" pointScale=\"1\">"[..])
            .unwrap_err();
        assert!(matches!(err, RouteXmlError::UnexpectedEof), "{err}");
    }

    #[test]
    fn turn_xml_uses_the_stable_vocabulary() {
        let mut turn = Turn::default();
        turn.set_turn(20.0, 2, 1, 0, true, false);
        turn.roundabout = RoundaboutState::Exit;
        turn.exit_number = 2;
        let mut out = Vec::new();
        write_turn_xml(&turn, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("type=\"bear_right\""), "{text}");
        assert!(text.contains("roundabout=\"exit\""), "{text}");
        assert!(text.contains("exit-number=\"2\""), "{text}");
    }
}
