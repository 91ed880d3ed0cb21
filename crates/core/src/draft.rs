//! In-progress shape with live measurements
//!
//! A [`ShapeDraft`] holds the vertices of the shape being drawn or re-edited.
//! Every mutation recomputes the derived measurements, so they always describe
//! the current points.

use crate::error::{SurveyError, SurveyResult};
use crate::geodesy;
use crate::units::format_distance;
use measure_model::{GeoPoint, Measure, MeasureGeometry, Measurements, SharePayload, ShapeKind};

/// Distance annotation anchored at the middle of one edge
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeLabel {
    /// Index of the edge's first vertex; the edge runs to `index + 1`, or back
    /// to vertex 0 for the closing edge of an AREA.
    pub index: usize,
    pub anchor: GeoPoint,
    pub length_meters: f64,
    pub text: String,
}

/// Draggable vertex marker
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VertexHandle {
    pub index: usize,
    pub position: GeoPoint,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShapeDraft {
    kind: ShapeKind,
    points: Vec<GeoPoint>,
    measurements: Measurements,
}

impl ShapeDraft {
    pub fn new(kind: ShapeKind) -> Self {
        Self { kind, points: Vec::new(), measurements: Measurements::default() }
    }

    /// Fresh editable draft holding a stored measure's geometry.
    ///
    /// Measurements are recomputed from the points, cached values on the
    /// measure are ignored.
    pub fn from_measure(measure: &Measure) -> Self {
        let mut draft = Self::new(measure.kind);
        draft.points = match (&measure.geometry, measure.kind) {
            (MeasureGeometry::Point(point), _) => vec![*point],
            (MeasureGeometry::Path(points), ShapeKind::Poi) => {
                points.iter().take(1).copied().collect()
            }
            (MeasureGeometry::Path(points), _) => points.clone(),
        };
        draft.recompute();
        draft
    }

    pub fn kind(&self) -> ShapeKind {
        self.kind
    }

    pub fn points(&self) -> &[GeoPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn measurements(&self) -> Measurements {
        self.measurements
    }

    /// True once the draft has enough points to be saved
    pub fn is_complete(&self) -> bool {
        match self.kind {
            ShapeKind::Poi => self.points.len() == 1,
            kind => self.points.len() >= kind.min_points(),
        }
    }

    /// Add a clicked point. POI drafts replace their single point.
    pub fn add_point(&mut self, point: GeoPoint) {
        match self.kind {
            ShapeKind::Poi => {
                self.points.clear();
                self.points.push(point);
            }
            ShapeKind::Area | ShapeKind::Distance => self.points.push(point),
        }
        self.recompute();
    }

    /// Move one vertex in place, leaving the draft untouched when `index` is out of range
    pub fn move_vertex(&mut self, index: usize, point: GeoPoint) -> SurveyResult<()> {
        let len = self.points.len();
        let vertex =
            self.points.get_mut(index).ok_or(SurveyError::VertexOutOfRange { index, len })?;
        *vertex = point;
        self.recompute();
        Ok(())
    }

    /// Delete one vertex and return it
    pub fn remove_vertex(&mut self, index: usize) -> SurveyResult<GeoPoint> {
        let len = self.points.len();
        if index >= len {
            return Err(SurveyError::VertexOutOfRange { index, len });
        }
        let removed = self.points.remove(index);
        self.recompute();
        Ok(removed)
    }

    pub fn clear(&mut self) {
        self.points.clear();
        self.recompute();
    }

    fn recompute(&mut self) {
        self.measurements = compute_measurements(self.kind, &self.points);
    }

    /// Distance labels for every edge of the outline.
    ///
    /// Empty until the draft is complete; then `n - 1` labels for DISTANCE and
    /// `n` for AREA, the last one on the closing edge.
    pub fn edge_labels(&self) -> Vec<EdgeLabel> {
        if self.kind == ShapeKind::Poi || !self.is_complete() {
            return Vec::new();
        }

        let n = self.points.len();
        let edge_count = if self.kind == ShapeKind::Area { n } else { n - 1 };
        (0..edge_count)
            .map(|index| {
                let a = &self.points[index];
                let b = &self.points[(index + 1) % n];
                let length_meters = geodesy::distance(a, b);
                EdgeLabel {
                    index,
                    anchor: geodesy::midpoint(a, b),
                    length_meters,
                    text: format_distance(length_meters),
                }
            })
            .collect()
    }

    /// One handle per vertex, including vertices of an incomplete outline
    pub fn vertex_handles(&self) -> Vec<VertexHandle> {
        self.points
            .iter()
            .enumerate()
            .map(|(index, position)| VertexHandle { index, position: *position })
            .collect()
    }

    /// Geometry to store for this draft
    pub fn to_geometry(&self) -> MeasureGeometry {
        match (self.kind, self.points.first()) {
            (ShapeKind::Poi, Some(point)) => MeasureGeometry::Point(*point),
            _ => MeasureGeometry::Path(self.points.clone()),
        }
    }

    /// Shareable snapshot of the current, possibly unsaved, draft
    pub fn share_payload(&self, name: &str, description: &str, group: &str) -> SharePayload {
        let (path, point) = match self.to_geometry() {
            MeasureGeometry::Path(points) => (Some(points), None),
            MeasureGeometry::Point(point) => (None, Some(point)),
        };

        SharePayload {
            name: name.to_owned(),
            description: description.to_owned(),
            group: group.to_owned(),
            kind: self.kind,
            path,
            point,
        }
    }
}

/// Measurements for a shape of `kind` through `points`.
///
/// Fields that do not apply to the kind, or that need more points than given,
/// are `None`.
pub fn compute_measurements(kind: ShapeKind, points: &[GeoPoint]) -> Measurements {
    if points.len() < kind.min_points() {
        return Measurements::default();
    }

    match kind {
        ShapeKind::Area => Measurements {
            area_sq_meters: Some(geodesy::polygon_area(points)),
            perimeter_meters: Some(geodesy::polygon_perimeter(points)),
            distance_meters: None,
        },
        ShapeKind::Distance => Measurements {
            distance_meters: Some(geodesy::polyline_length(points)),
            ..Measurements::default()
        },
        ShapeKind::Poi => Measurements::default(),
    }
}
