//! Minimal GeoJSON encoding for measures and map overlays
//!
//! Coordinates are written `(lng, lat)` as GeoJSON requires.

use measure_model::{GeoPoint, Measure, MeasureGeometry, ShapeKind};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub type Position = (f64, f64);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Point { coordinates: Position },
    LineString { coordinates: Vec<Position> },
    Polygon { coordinates: Vec<Vec<Position>> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Entity {
    Feature { properties: Map<String, Value>, geometry: Geometry },
    FeatureCollection { features: Vec<Entity> },
}

impl Entity {
    pub fn feature(geometry: Geometry, properties: Map<String, Value>) -> Self {
        Self::Feature { properties, geometry }
    }

    pub fn collection(features: Vec<Entity>) -> Self {
        Self::FeatureCollection { features }
    }
}

pub fn position(point: &GeoPoint) -> Position {
    (point.lng, point.lat)
}

pub fn point(point: &GeoPoint) -> Geometry {
    Geometry::Point { coordinates: position(point) }
}

pub fn line_string(points: &[GeoPoint]) -> Geometry {
    Geometry::LineString { coordinates: points.iter().map(position).collect() }
}

/// Polygon with a single ring, closed by repeating the first vertex
pub fn polygon(points: &[GeoPoint]) -> Geometry {
    let mut ring: Vec<Position> = points.iter().map(position).collect();
    if let Some(first) = ring.first().copied() {
        if ring.last() != Some(&first) {
            ring.push(first);
        }
    }
    Geometry::Polygon { coordinates: vec![ring] }
}

/// Feature for a stored measure, with its cached measurements as properties
pub fn measure_feature(measure: &Measure) -> Entity {
    let geometry = match (&measure.geometry, measure.kind) {
        (MeasureGeometry::Point(p), _) => point(p),
        (MeasureGeometry::Path(points), ShapeKind::Area) => polygon(points),
        (MeasureGeometry::Path(points), _) => line_string(points),
    };

    let mut properties = Map::new();
    properties.insert("id".to_owned(), Value::String(measure.id.to_string()));
    properties.insert("name".to_owned(), Value::String(measure.name.clone()));
    properties.insert("description".to_owned(), Value::String(measure.description.clone()));
    properties.insert("group".to_owned(), Value::String(measure.group_label().to_owned()));
    properties.insert("kind".to_owned(), Value::String(measure.kind.as_str().to_owned()));
    properties.insert("createdAt".to_owned(), Value::String(measure.created_at.to_rfc3339()));

    let values = &measure.measurements;
    for (key, value) in [
        ("areaSqMeters", values.area_sq_meters),
        ("perimeterMeters", values.perimeter_meters),
        ("distanceMeters", values.distance_meters),
    ] {
        if let Some(value) = value {
            properties.insert(key.to_owned(), Value::from(value));
        }
    }

    Entity::feature(geometry, properties)
}

pub fn measures_to_collection(measures: &[Measure]) -> Entity {
    Entity::collection(measures.iter().map(measure_feature).collect())
}
