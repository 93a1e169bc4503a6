//! Thin adapters from [`Coord`] onto `geo`'s metric spaces.
//!
//! Coordinates follow the `geo` convention used across the crate:
//! `x = longitude`, `y = latitude`, both in degrees.

use geo::{Bearing, Coord, Distance, Euclidean, Haversine, Line, LineString, Point};

/// Approximate metres per degree, used for buffer checks in degree space.
pub const METRES_PER_DEGREE: f64 = 111_000.0;

/// Great-circle distance in metres between two coordinates.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use ecoroute_core::geodesy::haversine_m;
///
/// let d = haversine_m(Coord { x: 30.52, y: 50.45 }, Coord { x: 30.52, y: 50.46 });
/// assert!((d - 1112.0).abs() < 2.0);
/// ```
#[must_use]
pub fn haversine_m(a: Coord<f64>, b: Coord<f64>) -> f64 {
    Haversine.distance(Point::from(a), Point::from(b))
}

/// Euclidean distance in raw coordinate (degree) space.
#[must_use]
pub fn planar_distance(a: Coord<f64>, b: Coord<f64>) -> f64 {
    Euclidean.distance(Point::from(a), Point::from(b))
}

/// Distance in degree space from `point` to the segment `start..end`.
#[must_use]
pub fn planar_segment_distance(point: Coord<f64>, start: Coord<f64>, end: Coord<f64>) -> f64 {
    Euclidean.distance(&Point::from(point), &Line::new(start, end))
}

/// Distance in degree space from `point` to the closest part of `line`.
///
/// Returns `None` for an empty line.
#[must_use]
pub fn planar_line_distance(point: Coord<f64>, line: &LineString<f64>) -> Option<f64> {
    match line.0.as_slice() {
        [] => None,
        [only] => Some(planar_distance(point, *only)),
        _ => Some(Euclidean.distance(&Point::from(point), line)),
    }
}

/// Initial great-circle bearing from `a` to `b`, in degrees within `0..360`.
#[must_use]
pub fn initial_bearing(a: Coord<f64>, b: Coord<f64>) -> f64 {
    Haversine
        .bearing(Point::from(a), Point::from(b))
        .rem_euclid(360.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn haversine_is_zero_for_identical_points() {
        let c = Coord { x: 30.5, y: 50.4 };
        assert_eq!(haversine_m(c, c), 0.0);
    }

    #[rstest]
    fn one_hundredth_of_a_degree_on_the_equator() {
        let d = haversine_m(Coord { x: 0.0, y: 0.0 }, Coord { x: 0.01, y: 0.0 });
        assert!((d - 1111.95).abs() < 0.01, "got {d}");
    }

    #[rstest]
    fn segment_distance_clamps_to_endpoints() {
        let start = Coord { x: 0.0, y: 0.0 };
        let end = Coord { x: 1.0, y: 0.0 };
        let beyond = Coord { x: 2.0, y: 0.0 };
        assert!((planar_segment_distance(beyond, start, end) - 1.0).abs() < 1e-12);
        let above = Coord { x: 0.5, y: 0.25 };
        assert!((planar_segment_distance(above, start, end) - 0.25).abs() < 1e-12);
    }

    #[rstest]
    fn degenerate_segment_measures_to_its_point() {
        let at = Coord { x: 1.0, y: 1.0 };
        let d = planar_segment_distance(Coord { x: 4.0, y: 5.0 }, at, at);
        assert!((d - 5.0).abs() < 1e-12);
    }

    #[rstest]
    fn line_distance_takes_the_closest_segment() {
        let line = LineString::from(vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0)]);
        let d = planar_line_distance(Coord { x: 1.5, y: 0.5 }, &line).expect("distance");
        assert!((d - 0.5).abs() < 1e-12);
        let empty = LineString::<f64>::new(Vec::new());
        assert_eq!(planar_line_distance(Coord { x: 0.0, y: 0.0 }, &empty), None);
        let single = LineString::from(vec![(3.0, 4.0)]);
        let d = planar_line_distance(Coord { x: 0.0, y: 0.0 }, &single).expect("distance");
        assert!((d - 5.0).abs() < 1e-12);
    }

    #[rstest]
    #[case(Coord { x: 0.0, y: 1.0 }, 0.0)]
    #[case(Coord { x: 1.0, y: 0.0 }, 90.0)]
    #[case(Coord { x: 0.0, y: -1.0 }, 180.0)]
    #[case(Coord { x: -1.0, y: 0.0 }, 270.0)]
    fn bearing_matches_cardinal_directions(#[case] to: Coord<f64>, #[case] expected: f64) {
        let bearing = initial_bearing(Coord { x: 0.0, y: 0.0 }, to);
        assert!((bearing - expected).abs() < 1e-9, "got {bearing}");
    }
}
