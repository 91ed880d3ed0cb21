use super::{MapWidget, OverlayId};
use crate::geodesy::GeoBounds;
use crate::geojson::{self, Entity};
use measure_model::GeoPoint;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Overlay retained by a [`SceneWidget`]
#[derive(Debug, Clone, PartialEq)]
pub enum SceneOverlay {
    Polygon(Vec<GeoPoint>),
    Polyline(Vec<GeoPoint>),
    Marker(GeoPoint),
    Label { anchor: GeoPoint, text: String },
    Handle { index: usize, position: GeoPoint },
}

/// Last viewport request
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Viewport {
    Bounds(GeoBounds),
    Center(GeoPoint),
}

/// In-memory map widget that keeps its live overlays.
///
/// Web map front ends receive the scene as a GeoJSON feature collection.
#[derive(Debug, Default, Clone)]
pub struct SceneWidget {
    next_id: u64,
    overlays: BTreeMap<OverlayId, SceneOverlay>,
    viewport: Option<Viewport>,
}

impl SceneWidget {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.overlays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.overlays.is_empty()
    }

    /// Live overlays in creation order
    pub fn overlays(&self) -> impl Iterator<Item = (OverlayId, &SceneOverlay)> {
        self.overlays.iter().map(|(id, overlay)| (*id, overlay))
    }

    pub fn count(&self, predicate: impl Fn(&SceneOverlay) -> bool) -> usize {
        self.overlays.values().filter(|overlay| predicate(overlay)).count()
    }

    /// Text of every label, in creation order
    pub fn label_texts(&self) -> Vec<&str> {
        self.overlays
            .values()
            .filter_map(|overlay| match overlay {
                SceneOverlay::Label { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn viewport(&self) -> Option<Viewport> {
        self.viewport
    }

    fn insert(&mut self, overlay: SceneOverlay) -> OverlayId {
        self.next_id += 1;
        let id = OverlayId(self.next_id);
        self.overlays.insert(id, overlay);
        id
    }

    /// Scene as a GeoJSON `FeatureCollection`, one feature per overlay.
    ///
    /// Every feature carries a `role` property; labels add `text`, handles add
    /// `index`.
    pub fn to_geojson(&self) -> Entity {
        let features = self
            .overlays
            .iter()
            .map(|(id, overlay)| {
                let mut properties = Map::new();
                properties.insert("overlay".to_owned(), Value::from(id.0));
                let (role, geometry) = match overlay {
                    SceneOverlay::Polygon(points) => ("polygon", geojson::polygon(points)),
                    SceneOverlay::Polyline(points) => ("polyline", geojson::line_string(points)),
                    SceneOverlay::Marker(point) => ("marker", geojson::point(point)),
                    SceneOverlay::Label { anchor, text } => {
                        properties.insert("text".to_owned(), Value::String(text.clone()));
                        ("label", geojson::point(anchor))
                    }
                    SceneOverlay::Handle { index, position } => {
                        properties.insert("index".to_owned(), Value::from(*index));
                        ("handle", geojson::point(position))
                    }
                };
                properties.insert("role".to_owned(), Value::String(role.to_owned()));
                Entity::feature(geometry, properties)
            })
            .collect();

        Entity::collection(features)
    }
}

impl MapWidget for SceneWidget {
    fn add_polygon(&mut self, points: &[GeoPoint]) -> OverlayId {
        self.insert(SceneOverlay::Polygon(points.to_vec()))
    }

    fn add_polyline(&mut self, points: &[GeoPoint]) -> OverlayId {
        self.insert(SceneOverlay::Polyline(points.to_vec()))
    }

    fn add_marker(&mut self, point: GeoPoint) -> OverlayId {
        self.insert(SceneOverlay::Marker(point))
    }

    fn add_label(&mut self, anchor: GeoPoint, text: &str) -> OverlayId {
        self.insert(SceneOverlay::Label { anchor, text: text.to_owned() })
    }

    fn add_draggable_handle(&mut self, index: usize, point: GeoPoint) -> OverlayId {
        self.insert(SceneOverlay::Handle { index, position: point })
    }

    fn remove(&mut self, overlay: OverlayId) {
        self.overlays.remove(&overlay);
    }

    fn fit_bounds(&mut self, bounds: GeoBounds) {
        self.viewport = Some(Viewport::Bounds(bounds));
    }

    fn center_on(&mut self, point: GeoPoint) {
        self.viewport = Some(Viewport::Center(point));
    }
}
