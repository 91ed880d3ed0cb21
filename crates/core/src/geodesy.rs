//! Geometry kernel for geographic shapes
//!
//! Pure functions that turn sequences of lat/lng points (degrees) into
//! distances, lengths and areas in meters and square meters.
//!
//! Areas are computed by projecting to Web-Mercator and applying the planar
//! shoelace formula. This is accurate enough for field-sized polygons but the
//! error grows with latitude span, near the poles and across the antimeridian.
//! Latitudes beyond the Web-Mercator limit of ±85.05112878° are clamped to it
//! before projecting, so polar rings get a finite (if distorted) area.

use measure_model::GeoPoint;
use std::f64::consts::FRAC_PI_4;

/// Mean earth radius used for great-circle distances (meters)
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Sphere radius of the Web-Mercator projection (meters)
pub const WEB_MERCATOR_RADIUS_M: f64 = 6_378_137.0;

/// Largest latitude representable in Web-Mercator (degrees)
pub const WEB_MERCATOR_MAX_LAT: f64 = 85.051_128_78;

/// Planar Web-Mercator coordinate in meters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MercatorPoint {
    pub x: f64,
    pub y: f64,
}

/// Project a geographic point to Web-Mercator meters
pub fn project_web_mercator(point: &GeoPoint) -> MercatorPoint {
    let x = point.lng.to_radians() * WEB_MERCATOR_RADIUS_M;
    let lat = point.lat.clamp(-WEB_MERCATOR_MAX_LAT, WEB_MERCATOR_MAX_LAT);
    let y = (FRAC_PI_4 + lat.to_radians() / 2.0).tan().ln() * WEB_MERCATOR_RADIUS_M;
    MercatorPoint { x, y }
}

/// Great-circle distance between two points (haversine)
///
/// Symmetric, and zero for identical points.
pub fn distance(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let d_lat = (b.lat - a.lat).abs().to_radians();
    let d_lng = (b.lng - a.lng).abs().to_radians();
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();

    let sin_d_lat = (d_lat / 2.0).sin();
    let sin_d_lng = (d_lng / 2.0).sin();

    let h = sin_d_lat * sin_d_lat + lat1.cos() * lat2.cos() * sin_d_lng * sin_d_lng;
    2.0 * EARTH_RADIUS_M * h.clamp(0.0, 1.0).sqrt().asin()
}

/// Length of an open path, 0 for fewer than 2 points
pub fn polyline_length(points: &[GeoPoint]) -> f64 {
    points.windows(2).map(|w| distance(&w[0], &w[1])).sum()
}

/// Perimeter of a closed ring, including the edge from the last point back to
/// the first. 0 for fewer than 2 points.
pub fn polygon_perimeter(points: &[GeoPoint]) -> f64 {
    let n = points.len();
    if n < 2 {
        return 0.0;
    }
    (0..n).map(|i| distance(&points[i], &points[(i + 1) % n])).sum()
}

/// Area of a closed ring in square meters, 0 for fewer than 3 points
///
/// Vertex winding order does not affect the result.
pub fn polygon_area(points: &[GeoPoint]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }

    // Shift to the first vertex so the cross products stay small; the shoelace
    // sum is translation invariant.
    let origin = project_web_mercator(&points[0]);
    let projected: Vec<MercatorPoint> = points
        .iter()
        .map(|p| {
            let m = project_web_mercator(p);
            MercatorPoint { x: m.x - origin.x, y: m.y - origin.y }
        })
        .collect();

    let mut area = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        area += projected[i].x * projected[j].y;
        area -= projected[j].x * projected[i].y;
    }
    (area / 2.0).abs()
}

/// Coordinate midpoint of an edge, used to anchor edge labels
pub fn midpoint(a: &GeoPoint, b: &GeoPoint) -> GeoPoint {
    GeoPoint::new((a.lat + b.lat) / 2.0, (a.lng + b.lng) / 2.0)
}

/// Arithmetic mean of the vertices, `None` for an empty slice
pub fn centroid(points: &[GeoPoint]) -> Option<GeoPoint> {
    if points.is_empty() {
        return None;
    }
    let n = points.len() as f64;
    let lat: f64 = points.iter().map(|p| p.lat).sum();
    let lng: f64 = points.iter().map(|p| p.lng).sum();
    Some(GeoPoint::new(lat / n, lng / n))
}

/// Axis-aligned lat/lng bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoBounds {
    pub south_west: GeoPoint,
    pub north_east: GeoPoint,
}

impl GeoBounds {
    /// Bounding box of the points, `None` for an empty slice
    pub fn from_points(points: &[GeoPoint]) -> Option<Self> {
        let (first, rest) = points.split_first()?;

        let mut south = first.lat;
        let mut north = first.lat;
        let mut west = first.lng;
        let mut east = first.lng;
        for point in rest {
            south = south.min(point.lat);
            north = north.max(point.lat);
            west = west.min(point.lng);
            east = east.max(point.lng);
        }

        Some(Self {
            south_west: GeoPoint::new(south, west),
            north_east: GeoPoint::new(north, east),
        })
    }

    pub fn center(&self) -> GeoPoint {
        midpoint(&self.south_west, &self.north_east)
    }

    /// True when the box has no extent (a single point or identical points)
    pub fn is_degenerate(&self) -> bool {
        self.south_west == self.north_east
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    fn square() -> Vec<GeoPoint> {
        vec![
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(0.0, 0.001),
            GeoPoint::new(0.001, 0.001),
            GeoPoint::new(0.001, 0.0),
        ]
    }

    fn field() -> Vec<GeoPoint> {
        vec![
            GeoPoint::new(14.5995, 120.9842),
            GeoPoint::new(14.6010, 120.9851),
            GeoPoint::new(14.6004, 120.9873),
            GeoPoint::new(14.5987, 120.9866),
            GeoPoint::new(14.5983, 120.9850),
        ]
    }

    #[test]
    fn distance_to_self_is_zero() {
        for p in field() {
            assert_eq!(distance(&p, &p), 0.0);
        }
    }

    #[test]
    fn distance_is_symmetric() {
        let points = field();
        for a in &points {
            for b in &points {
                assert_eq!(distance(a, b), distance(b, a));
            }
        }
    }

    #[test]
    fn hundredth_degree_of_latitude_at_equator() {
        let d = distance(&GeoPoint::new(0.0, 0.0), &GeoPoint::new(0.01, 0.0));
        // 0.01 deg on a 6,371 km sphere
        assert_relative_eq!(d, 1111.95, epsilon = 0.01);
        assert!((d - 1113.0).abs() < 2.0);
    }

    #[test]
    fn short_inputs_measure_zero() {
        let p = GeoPoint::new(1.0, 1.0);
        let q = GeoPoint::new(1.0, 1.001);
        assert_eq!(polygon_area(&[]), 0.0);
        assert_eq!(polygon_area(&[p, q]), 0.0);
        assert_eq!(polyline_length(&[p]), 0.0);
        assert_eq!(polyline_length(&[]), 0.0);
        assert_eq!(polygon_perimeter(&[p]), 0.0);
    }

    #[test]
    fn perimeter_includes_closing_edge() {
        let points = square();
        let open = polyline_length(&points);
        let closed = polygon_perimeter(&points);
        assert_relative_eq!(closed - open, distance(&points[3], &points[0]), epsilon = 1e-9);
    }

    #[test]
    fn two_point_perimeter_counts_the_edge_twice() {
        let a = GeoPoint::new(0.0, 0.0);
        let b = GeoPoint::new(0.0, 0.002);
        assert_relative_eq!(polygon_perimeter(&[a, b]), 2.0 * distance(&a, &b));
    }

    #[test]
    fn equatorial_square() {
        let points = square();

        // ~111.3 m per side in Web-Mercator meters
        let area = polygon_area(&points);
        assert_relative_eq!(area, 12_392.0, max_relative = 0.02);

        let perimeter = polygon_perimeter(&points);
        assert_relative_eq!(perimeter, 444.0, max_relative = 0.02);
    }

    #[test]
    fn area_ignores_winding_order() {
        let points = field();
        let mut reversed = points.clone();
        reversed.reverse();
        assert_relative_eq!(polygon_area(&points), polygon_area(&reversed), max_relative = 1e-9);
    }

    #[test]
    fn area_ignores_start_vertex() {
        let points = field();
        let expected = polygon_area(&points);
        for shift in 1..points.len() {
            let mut rotated = points.clone();
            rotated.rotate_left(shift);
            assert_relative_eq!(polygon_area(&rotated), expected, max_relative = 1e-9);
        }
    }

    #[test]
    fn collapsed_vertex_degrades_gracefully() {
        let mut points = square();
        points[2] = points[1];

        let area = polygon_area(&points);
        let perimeter = polygon_perimeter(&points);
        assert!(area.is_finite() && area >= 0.0);
        assert!(area < polygon_area(&square()));
        assert!(perimeter.is_finite());
        // Triangle: half of the square
        assert_relative_eq!(area, polygon_area(&square()) / 2.0, max_relative = 0.01);
    }

    #[test]
    fn mercator_origin_is_zero() {
        let projected = project_web_mercator(&GeoPoint::new(0.0, 0.0));
        assert_eq!(projected.x, 0.0);
        assert!(projected.y.abs() < 1e-6);
    }

    #[test]
    fn bounds_cover_all_points() {
        let bounds = GeoBounds::from_points(&field()).expect("non-empty input");
        assert_eq!(bounds.south_west, GeoPoint::new(14.5983, 120.9842));
        assert_eq!(bounds.north_east, GeoPoint::new(14.6010, 120.9873));
        assert!(!bounds.is_degenerate());
        assert!(GeoBounds::from_points(&[]).is_none());
    }

    #[test]
    fn single_point_bounds_are_degenerate() {
        let p = GeoPoint::new(3.0, 4.0);
        let bounds = GeoBounds::from_points(&[p]).expect("non-empty input");
        assert!(bounds.is_degenerate());
        assert_eq!(bounds.center(), p);
    }

    #[test]
    fn centroid_of_square() {
        let c = centroid(&square()).expect("non-empty input");
        assert_relative_eq!(c.lat, 0.0005);
        assert_relative_eq!(c.lng, 0.0005);
        assert!(centroid(&[]).is_none());
    }

    #[test]
    fn polar_ring_area_is_finite() {
        let at_pole = [
            GeoPoint::new(-90.0, 0.0),
            GeoPoint::new(-89.999, 0.0),
            GeoPoint::new(-89.999, 0.001),
        ];
        assert!(polygon_area(&at_pole).is_finite());

        let spanning = [
            GeoPoint::new(90.0, 0.0),
            GeoPoint::new(80.0, 0.0),
            GeoPoint::new(80.0, 10.0),
        ];
        let area = polygon_area(&spanning);
        assert!(area.is_finite() && area > 0.0);
    }

    #[test]
    fn projection_clamps_latitude() {
        let south = project_web_mercator(&GeoPoint::new(-90.0, 0.0));
        let limit = project_web_mercator(&GeoPoint::new(-WEB_MERCATOR_MAX_LAT, 0.0));
        assert_eq!(south, limit);
        // The Web-Mercator square is as tall as it is wide
        assert_relative_eq!(limit.y, -PI * WEB_MERCATOR_RADIUS_M, max_relative = 1e-9);
    }
}
