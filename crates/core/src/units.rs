//! Unit conversion and display formatting for measurements

use measure_model::{Measure, MeasureGeometry, ShapeKind};

/// Square meters in one hectare
pub const SQ_METERS_PER_HECTARE: f64 = 10_000.0;

/// Square meters in one international acre
pub const SQ_METERS_PER_ACRE: f64 = 4_046.856_422_4;

/// Placeholder shown for a measurement that is not set
pub const UNSET: &str = "-";

pub fn meters_to_km(meters: f64) -> f64 {
    meters / 1000.0
}

pub fn sq_meters_to_hectares(sq_meters: f64) -> f64 {
    sq_meters / SQ_METERS_PER_HECTARE
}

pub fn sq_meters_to_acres(sq_meters: f64) -> f64 {
    sq_meters / SQ_METERS_PER_ACRE
}

/// Edge label text: meters below one kilometer, kilometers above
pub fn format_distance(meters: f64) -> String {
    if meters < 1000.0 {
        format!("{meters:.1} m")
    } else {
        format!("{:.3} km", meters_to_km(meters))
    }
}

pub fn format_km(meters: f64) -> String {
    format!("{:.3} km", meters_to_km(meters))
}

pub fn format_hectares(sq_meters: f64) -> String {
    format!("{:.3} ha", sq_meters_to_hectares(sq_meters))
}

pub fn format_acres(sq_meters: f64) -> String {
    format!("{:.3} ac", sq_meters_to_acres(sq_meters))
}

/// Format an optional value, falling back to [`UNSET`]
pub fn or_unset(value: Option<f64>, format: impl Fn(f64) -> String) -> String {
    value.map(format).unwrap_or_else(|| UNSET.to_owned())
}

/// One-line summary of a stored measure as shown in measure lists.
///
/// AREA: `"1.234 ha, 0.456 km"`, DISTANCE: `"0.456 km"`, POI: `"lat, lng"`.
pub fn measure_summary(measure: &Measure) -> String {
    let values = &measure.measurements;
    match (measure.kind, &measure.geometry) {
        (ShapeKind::Area, _) => format!(
            "{}, {}",
            or_unset(values.area_sq_meters, format_hectares),
            or_unset(values.perimeter_meters, format_km)
        ),
        (ShapeKind::Distance, _) => or_unset(values.distance_meters, format_km),
        (ShapeKind::Poi, MeasureGeometry::Point(point)) => point.to_string(),
        (ShapeKind::Poi, MeasureGeometry::Path(points)) => {
            points.first().map(ToString::to_string).unwrap_or_else(|| UNSET.to_owned())
        }
    }
}
