//! GPX export of routes.
//!
//! A route becomes a single GPX track with one track segment per route
//! section. Track points are placed at the start of each segment plus the
//! end of the section, projected to geographic coordinates; points at
//! significant turns carry the turn instruction in their description.

use crate::route::Route;
use crate::turn::{RoundaboutState, TurnType};
use crate::Projection;
use thiserror::Error;

/// Errors arising while exporting GPX documents.
#[derive(Debug, Error)]
pub enum GpxExportError {
    #[error("GPX error: {0}")]
    Gpx(#[from] gpx::errors::GpxError),
}

/// Writes a route as a GPX 1.1 track.
pub fn write_route_gpx<W: std::io::Write>(
    route: &Route,
    writer: W,
    projection: &dyn Projection,
) -> Result<(), GpxExportError> {
    let mut track = gpx::Track {
        name: Some("route".to_string()),
        ..gpx::Track::default()
    };

    let mut segment = gpx::TrackSegment::new();
    let mut section = route.segments.first().map_or(0, |s| s.section);
    for (index, route_segment) in route.segments.iter().enumerate() {
        if route_segment.section != section {
            // Close the finished section with the previous segment's end.
            if let Some(prev) = route.segments.get(index.wrapping_sub(1)) {
                if let Some(end) = prev.path.0.last() {
                    segment.points.push(waypoint(*end, None, projection));
                }
            }
            track.segments.push(std::mem::take(&mut segment));
            section = route_segment.section;
        }
        if let Some(start) = route_segment.path.0.first() {
            let turn = &route_segment.turn;
            let significant = turn.turn_type != TurnType::None
                && !(turn.turn_type == TurnType::Ahead && turn.continues)
                || turn.roundabout != RoundaboutState::None;
            let description =
                significant.then(|| turn.instruction(&route_segment.name));
            segment.points.push(waypoint(*start, description, projection));
        }
    }
    if let Some(end) = route.path.0.last() {
        segment.points.push(waypoint(*end, None, projection));
    }
    if !segment.points.is_empty() {
        track.segments.push(segment);
    }

    let mut document = gpx::Gpx {
        version: gpx::GpxVersion::Gpx11,
        creator: Some("wayfinder".to_string()),
        ..gpx::Gpx::default()
    };
    document.tracks.push(track);
    gpx::write(&document, writer)?;
    Ok(())
}

fn waypoint(
    map: geo::Coord<f64>,
    description: Option<String>,
    projection: &dyn Projection,
) -> gpx::Waypoint {
    let geographic = projection.to_geographic(map);
    let mut point = gpx::Waypoint::new(geo_types::Point::new(geographic.x(), geographic.y()));
    point.description = description;
    point
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{ProfileType, RouteProfile};
    use crate::turn::JunctionInfo;
    use crate::LocalProjection;
    use geo::{coord, Point};
    use wayfinder_road::ArcRoadType;

    fn two_section_route() -> Route {
        let mut route = Route::new(RouteProfile::new(ProfileType::Car), 1.0);
        route.append_segment(
            &JunctionInfo::default(),
            &[coord! {x: 0.0, y: 0.0}, coord! {x: 100.0, y: 0.0}],
            "East Street",
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
                turn_angle: -90.0,
                choices: 3,
                turn_time: 4.0,
                ..JunctionInfo::default()
            },
            &[coord! {x: 100.0, y: 0.0}, coord! {x: 100.0, y: 150.0}],
            "North Street",
            "",
            ArcRoadType::Residential,
            0.0,
            150.0,
            18.0,
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
            &[coord! {x: 100.0, y: 150.0}, coord! {x: 180.0, y: 150.0}],
            "Station Road",
            "A1",
            ArcRoadType::Secondary,
            0.0,
            80.0,
            6.0,
            1,
            false,
        );
        route
    }

    #[test]
    fn track_has_one_segment_per_section_with_counted_points() {
        let route = two_section_route();
        let projection = LocalProjection::new(Point::new(11.4, 48.1));
        let mut out = Vec::new();
        write_route_gpx(&route, &mut out, &projection).unwrap();

        let parsed = gpx::read(out.as_slice()).unwrap();
        assert_eq!(parsed.tracks.len(), 1);
        let track = &parsed.tracks[0];
        assert_eq!(track.segments.len(), 2);
        // Section 0 has two route segments, section 1 has one; each gets one
        // extra closing point.
        assert_eq!(track.segments[0].points.len(), 3);
        assert_eq!(track.segments[1].points.len(), 2);
    }

    #[test]
    fn turn_points_carry_instructions() {
        let route = two_section_route();
        let projection = LocalProjection::new(Point::new(11.4, 48.1));
        let mut out = Vec::new();
        write_route_gpx(&route, &mut out, &projection).unwrap();

        let parsed = gpx::read(out.as_slice()).unwrap();
        let descriptions: Vec<_> = parsed.tracks[0]
            .segments
            .iter()
            .flat_map(|s| &s.points)
            .filter_map(|p| p.description.clone())
            .collect();
        assert!(descriptions.contains(&"Turn left onto North Street".to_string()));
        assert!(descriptions.contains(&"Turn right onto Station Road".to_string()));
    }
}
