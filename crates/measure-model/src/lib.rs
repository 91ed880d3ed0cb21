use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Placeholder stored when a measure is saved with a blank name.
pub const UNTITLED_NAME: &str = "Untitled";

/// Bucket name reported for measures without a group.
pub const UNGROUPED_NAME: &str = "Ungrouped";

pub type MeasureId = uuid::Uuid;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    #[error("latitude {0} is outside [-90, 90]")]
    LatitudeOutOfRange(f64),
    #[error("longitude {0} is outside [-180, 180]")]
    LongitudeOutOfRange(f64),
    #[error("unknown shape kind '{0}' (expected AREA, DISTANCE or POI)")]
    UnknownKind(String),
}

/// Geographic coordinate in degrees.
///
/// Equality is exact coordinate equality, no tolerance is applied.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Build a point from user input, rejecting non-finite or out-of-range values.
    pub fn try_new(lat: f64, lng: f64) -> Result<Self, ModelError> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(ModelError::LatitudeOutOfRange(lat));
        }
        if !lng.is_finite() || !(-180.0..=180.0).contains(&lng) {
            return Err(ModelError::LongitudeOutOfRange(lng));
        }
        Ok(Self { lat, lng })
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.5}, {:.5}", self.lat, self.lng)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ShapeKind {
    /// Closed polygon.
    Area,
    /// Open polyline.
    Distance,
    /// Single point of interest.
    Poi,
}

impl ShapeKind {
    /// Number of points a draft of this kind needs before it can be saved.
    pub const fn min_points(self) -> usize {
        match self {
            Self::Area => 3,
            Self::Distance => 2,
            Self::Poi => 1,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Area => "AREA",
            Self::Distance => "DISTANCE",
            Self::Poi => "POI",
        }
    }
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ShapeKind {
    type Err = ModelError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "AREA" => Ok(Self::Area),
            "DISTANCE" => Ok(Self::Distance),
            "POI" => Ok(Self::Poi),
            _ => Err(ModelError::UnknownKind(value.to_owned())),
        }
    }
}

/// Derived measurements of a shape, in meters and square meters.
///
/// A field is `None` when it does not apply to the shape kind or the shape does
/// not have enough points yet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Measurements {
    pub area_sq_meters: Option<f64>,
    pub perimeter_meters: Option<f64>,
    pub distance_meters: Option<f64>,
}

impl Measurements {
    pub fn is_unset(&self) -> bool {
        self.area_sq_meters.is_none()
            && self.perimeter_meters.is_none()
            && self.distance_meters.is_none()
    }
}

/// Stored geometry: a vertex path for AREA/DISTANCE, a single point for POI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeasureGeometry {
    Path(Vec<GeoPoint>),
    Point(GeoPoint),
}

impl MeasureGeometry {
    pub fn points(&self) -> &[GeoPoint] {
        match self {
            Self::Path(points) => points,
            Self::Point(point) => std::slice::from_ref(point),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Measure {
    pub id: MeasureId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub group: String,
    pub kind: ShapeKind,
    #[serde(flatten)]
    pub geometry: MeasureGeometry,
    #[serde(flatten)]
    pub measurements: Measurements,
    pub created_at: DateTime<Utc>,
}

impl Measure {
    pub fn points(&self) -> &[GeoPoint] {
        self.geometry.points()
    }

    /// Group name used for bucketing, with blank groups reported as [`UNGROUPED_NAME`].
    pub fn group_label(&self) -> &str {
        if self.group.trim().is_empty() {
            UNGROUPED_NAME
        } else {
            &self.group
        }
    }
}

/// Geometry as the activity endpoint expects it: a bare path array or `{ "point": .. }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ActivityGeometry {
    Path(Vec<GeoPoint>),
    Point { point: GeoPoint },
}

/// Record sent to the activity log after a successful save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub name: String,
    pub description: String,
    pub group: String,
    #[serde(rename = "type")]
    pub kind: ShapeKind,
    pub area_m2: Option<f64>,
    pub perimeter_m: Option<f64>,
    pub distance_m: Option<f64>,
    pub geometry: ActivityGeometry,
}

impl From<&Measure> for ActivityRecord {
    fn from(measure: &Measure) -> Self {
        let geometry = match &measure.geometry {
            MeasureGeometry::Path(points) => ActivityGeometry::Path(points.clone()),
            MeasureGeometry::Point(point) => ActivityGeometry::Point { point: *point },
        };

        Self {
            name: measure.name.clone(),
            description: measure.description.clone(),
            group: measure.group.clone(),
            kind: measure.kind,
            area_m2: measure.measurements.area_sq_meters,
            perimeter_m: measure.measurements.perimeter_meters,
            distance_m: measure.measurements.distance_meters,
            geometry,
        }
    }
}

/// Shareable snapshot of an unsaved draft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SharePayload {
    pub name: String,
    pub description: String,
    pub group: String,
    #[serde(rename = "type")]
    pub kind: ShapeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<GeoPoint>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub point: Option<GeoPoint>,
}
