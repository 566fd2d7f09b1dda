//! Geometric queries over a completed route: nearest-segment lookup for the
//! navigator, and point-at-distance / point-at-time interpolation for ETA
//! display.

use crate::route::Route;
use geo::Coord;

/// Information about the point on a route nearest to some other point, or
/// about an interpolated point along the route.
#[derive(Debug, Clone, PartialEq)]
pub struct NearestSegmentInfo {
    /// The index of the segment in the route.
    pub segment_index: usize,
    /// The index of the line within the segment's path: line N goes from
    /// point N to point N + 1.
    pub line_index: usize,
    /// The point on the segment's path nearest to the query point, in map
    /// coordinates.
    pub nearest_point: Coord<f64>,
    /// The distance from the query point to `nearest_point` in meters.
    pub distance_to_route: f64,
    /// The distance of the nearest point along the route in meters.
    pub distance_along_route: f64,
    /// The distance within the segment in meters.
    pub distance_along_segment: f64,
    /// The estimated time of the nearest point along the route in seconds.
    pub time_along_route: f64,
    /// The estimated time within the segment in seconds.
    pub time_along_segment: f64,
    /// The heading of the nearest line in degrees, as a map angle measured
    /// counterclockwise from the positive x axis.
    pub heading: f64,
}

/// Candidates whose perpendicular distance is within 10 percent plus one
/// meter of the best are close enough to be re-ranked by a position hint.
fn within_hint_tolerance(distance: f64, best: f64) -> bool {
    distance <= best.mul_add(1.1, 1.0)
}

impl Route {
    /// Finds the point on the route nearest to `point` (map units).
    ///
    /// `section` restricts the search to one section. When
    /// `previous_distance_along_route` is given, near-tied candidates are
    /// re-ranked by closeness to that distance, which disambiguates
    /// self-crossing routes for a vehicle whose progress is roughly known.
    ///
    /// Returns `None` for an empty route.
    pub fn nearest_segment(
        &self,
        point: Coord<f64>,
        section: Option<u32>,
        previous_distance_along_route: Option<f64>,
    ) -> Option<NearestSegmentInfo> {
        let mut candidates: Vec<NearestSegmentInfo> = Vec::new();
        let mut distance_before = 0.0;
        let mut time_before = 0.0;

        for (segment_index, segment) in self.segments.iter().enumerate() {
            if section.is_some_and(|s| s != segment.section) {
                distance_before += segment.distance;
                time_before += segment.time;
                continue;
            }
            let path_len = path_length(&segment.path.0);
            let mut line_start = 0.0;
            let mut best: Option<NearestSegmentInfo> = None;
            for (line_index, pair) in segment.path.0.windows(2).enumerate() {
                let (a, b) = (pair[0], pair[1]);
                let line_len = distance(a, b);
                let t = project_fraction(point, a, b);
                let nearest = Coord {
                    x: a.x + (b.x - a.x) * t,
                    y: a.y + (b.y - a.y) * t,
                };
                let perp = distance(point, nearest) * self.point_scale;
                let along_map = line_start + line_len * t;
                let fraction = if path_len > 0.0 { along_map / path_len } else { 0.0 };
                let distance_along_segment = fraction * segment.distance;
                let travel_time = segment.time - segment.turn_time;
                let candidate = NearestSegmentInfo {
                    segment_index,
                    line_index,
                    nearest_point: nearest,
                    distance_to_route: perp,
                    distance_along_route: distance_before + distance_along_segment,
                    distance_along_segment,
                    time_along_route: time_before + segment.turn_time + fraction * travel_time,
                    time_along_segment: segment.turn_time + fraction * travel_time,
                    heading: heading_degrees(a, b),
                };
                if best
                    .as_ref()
                    .is_none_or(|b| candidate.distance_to_route < b.distance_to_route)
                {
                    best = Some(candidate);
                }
                line_start += line_len;
            }
            // Keep one candidate per segment; enough granularity for hints.
            candidates.extend(best);
            distance_before += segment.distance;
            time_before += segment.time;
        }

        let best_distance = candidates
            .iter()
            .map(|c| c.distance_to_route)
            .fold(f64::INFINITY, f64::min);
        if best_distance.is_infinite() {
            return None;
        }

        match previous_distance_along_route {
            Some(hint) => candidates
                .into_iter()
                .filter(|c| within_hint_tolerance(c.distance_to_route, best_distance))
                .min_by(|a, b| {
                    let da = (a.distance_along_route - hint).abs();
                    let db = (b.distance_along_route - hint).abs();
                    da.total_cmp(&db)
                }),
            None => candidates
                .into_iter()
                .min_by(|a, b| a.distance_to_route.total_cmp(&b.distance_to_route)),
        }
    }

    /// The point a given number of meters along the route; clamped to the
    /// route's ends. Returns `None` for an empty route.
    pub fn point_at_distance(&self, meters: f64) -> Option<NearestSegmentInfo> {
        if self.is_empty() {
            return None;
        }
        let target = meters.clamp(0.0, self.distance);
        let mut distance_before = 0.0;
        let mut time_before = 0.0;
        let last = self.segments.len() - 1;
        for (segment_index, segment) in self.segments.iter().enumerate() {
            let end = distance_before + segment.distance;
            if target <= end || segment_index == last {
                let fraction = if segment.distance > 0.0 {
                    ((target - distance_before) / segment.distance).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                return Some(self.locate(segment_index, fraction, distance_before, time_before));
            }
            distance_before = end;
            time_before += segment.time;
        }
        None
    }

    /// The point reached after a given number of seconds along the route;
    /// clamped to the route's ends. Returns `None` for an empty route.
    ///
    /// Segment time includes the time spent at the entry junction, so the
    /// mapping jumps at each junction; the jump lands on the junction point
    /// itself.
    pub fn point_at_time(&self, seconds: f64) -> Option<NearestSegmentInfo> {
        if self.is_empty() {
            return None;
        }
        let target = seconds.clamp(0.0, self.time);
        let mut distance_before = 0.0;
        let mut time_before = 0.0;
        let last = self.segments.len() - 1;
        for (segment_index, segment) in self.segments.iter().enumerate() {
            let end = time_before + segment.time;
            if target <= end || segment_index == last {
                let in_segment = (target - time_before).max(0.0);
                let travel_time = segment.time - segment.turn_time;
                let fraction = if in_segment <= segment.turn_time || travel_time <= 0.0 {
                    0.0
                } else {
                    ((in_segment - segment.turn_time) / travel_time).clamp(0.0, 1.0)
                };
                return Some(self.locate(segment_index, fraction, distance_before, time_before));
            }
            distance_before += segment.distance;
            time_before = end;
        }
        None
    }

    /// Builds the info record for a fractional position along a segment's
    /// path length.
    fn locate(
        &self,
        segment_index: usize,
        fraction: f64,
        distance_before: f64,
        time_before: f64,
    ) -> NearestSegmentInfo {
        let segment = &self.segments[segment_index];
        let points = &segment.path.0;
        let path_len = path_length(points);
        let target_map = path_len * fraction;
        let travel_time = segment.time - segment.turn_time;

        let mut line_start = 0.0;
        let mut line_index = 0;
        let mut nearest = points.first().copied().unwrap_or(Coord { x: 0.0, y: 0.0 });
        let mut heading = 0.0;
        for (i, pair) in points.windows(2).enumerate() {
            let (a, b) = (pair[0], pair[1]);
            let line_len = distance(a, b);
            heading = heading_degrees(a, b);
            line_index = i;
            if line_start + line_len >= target_map || i == points.len().saturating_sub(2) {
                let t = if line_len > 0.0 {
                    ((target_map - line_start) / line_len).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                nearest = Coord {
                    x: a.x + (b.x - a.x) * t,
                    y: a.y + (b.y - a.y) * t,
                };
                break;
            }
            line_start += line_len;
        }

        NearestSegmentInfo {
            segment_index,
            line_index,
            nearest_point: nearest,
            distance_to_route: 0.0,
            distance_along_route: distance_before + fraction * segment.distance,
            distance_along_segment: fraction * segment.distance,
            time_along_route: time_before + segment.turn_time + fraction * travel_time,
            time_along_segment: segment.turn_time + fraction * travel_time,
            heading,
        }
    }
}

fn distance(a: Coord<f64>, b: Coord<f64>) -> f64 {
    (b.x - a.x).hypot(b.y - a.y)
}

fn path_length(points: &[Coord<f64>]) -> f64 {
    points.windows(2).map(|p| distance(p[0], p[1])).sum()
}

/// The clamped fraction along the line a..b of the perpendicular foot of p.
fn project_fraction(p: Coord<f64>, a: Coord<f64>, b: Coord<f64>) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len_sq = dx * dx + dy * dy;
    if len_sq == 0.0 {
        return 0.0;
    }
    (((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0)
}

fn heading_degrees(a: Coord<f64>, b: Coord<f64>) -> f64 {
    (b.y - a.y).atan2(b.x - a.x).to_degrees()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{ProfileType, RouteProfile};
    use crate::turn::JunctionInfo;
    use geo::coord;
    use proptest::prelude::*;
    use wayfinder_road::ArcRoadType;

    /// 100 m east, then 200 m north; 12 s + (4 s turn + 24 s).
    fn l_route() -> Route {
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
            &[coord! {x: 100.0, y: 0.0}, coord! {x: 100.0, y: 200.0}],
            "North Street",
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

    #[test]
    fn nearest_segment_projects_perpendicularly() {
        let route = l_route();
        let info = route
            .nearest_segment(coord! {x: 40.0, y: 7.0}, None, None)
            .unwrap();
        assert_eq!(info.segment_index, 0);
        assert_eq!(info.line_index, 0);
        assert_eq!(info.nearest_point, coord! {x: 40.0, y: 0.0});
        assert_eq!(info.distance_to_route, 7.0);
        assert_eq!(info.distance_along_route, 40.0);
        assert_eq!(info.distance_along_segment, 40.0);
        assert_eq!(info.heading, 0.0);
    }

    #[test]
    fn nearest_segment_reports_time_with_turn_jump() {
        let route = l_route();
        let info = route
            .nearest_segment(coord! {x: 102.0, y: 100.0}, None, None)
            .unwrap();
        assert_eq!(info.segment_index, 1);
        assert_eq!(info.distance_to_route, 2.0);
        assert_eq!(info.distance_along_route, 200.0);
        // 12 s first segment + 4 s turn + half of 24 s.
        assert_eq!(info.time_along_route, 28.0);
        assert_eq!(info.heading, 90.0);
    }

    #[test]
    fn nearest_segment_respects_section_filter() {
        let mut route = l_route();
        route.segments[1].section = 1;
        let info = route
            .nearest_segment(coord! {x: 100.0, y: 100.0}, Some(0), None)
            .unwrap();
        assert_eq!(info.segment_index, 0);
    }

    #[test]
    fn hint_disambiguates_self_crossing_routes() {
        // Out along y = 0, back along y = 10: the point (50, 5) is an exact
        // tie without a hint.
        let mut route = Route::new(RouteProfile::new(ProfileType::Car), 1.0);
        route.append_segment(
            &JunctionInfo::default(),
            &[coord! {x: 0.0, y: 0.0}, coord! {x: 100.0, y: 0.0}],
            "Loop Road",
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
                turn_angle: 178.0,
                turn_time: 30.0,
                ..JunctionInfo::default()
            },
            &[
                coord! {x: 100.0, y: 0.0},
                coord! {x: 100.0, y: 10.0},
                coord! {x: 0.0, y: 10.0},
            ],
            "Loop Road Back",
            "",
            ArcRoadType::Residential,
            0.0,
            110.0,
            13.0,
            0,
            false,
        );

        let outward = route
            .nearest_segment(coord! {x: 50.0, y: 5.0}, None, Some(30.0))
            .unwrap();
        assert_eq!(outward.segment_index, 0);

        let back = route
            .nearest_segment(coord! {x: 50.0, y: 5.0}, None, Some(160.0))
            .unwrap();
        assert_eq!(back.segment_index, 1);
    }

    #[test]
    fn point_at_distance_walks_the_path() {
        let route = l_route();
        let info = route.point_at_distance(150.0).unwrap();
        assert_eq!(info.segment_index, 1);
        assert_eq!(info.nearest_point, coord! {x: 100.0, y: 50.0});
        assert_eq!(info.distance_along_segment, 50.0);

        let end = route.point_at_distance(1e9).unwrap();
        assert_eq!(end.nearest_point, coord! {x: 100.0, y: 200.0});
    }

    #[test]
    fn point_at_time_jumps_at_junctions() {
        let route = l_route();
        // 14 s: inside the second segment's turn time, still at the corner.
        let info = route.point_at_time(14.0).unwrap();
        assert_eq!(info.segment_index, 1);
        assert_eq!(info.nearest_point, coord! {x: 100.0, y: 0.0});
        // 28 s: 12 s travel into the second segment.
        let info = route.point_at_time(28.0).unwrap();
        assert_eq!(info.nearest_point, coord! {x: 100.0, y: 100.0});
    }

    proptest! {
        #[test]
        fn point_at_distance_is_consistent(d in 0.0f64..300.0) {
            let route = l_route();
            let info = route.point_at_distance(d).unwrap();
            prop_assert!((info.distance_along_route - d).abs() < 1e-9);
            let back = route
                .nearest_segment(info.nearest_point, None, Some(d))
                .unwrap();
            prop_assert!(back.distance_to_route < 1e-9);
            prop_assert!((back.distance_along_route - d).abs() < 1e-6);
        }
    }
}
