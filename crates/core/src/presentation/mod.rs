//! Map presentation of drafts
//!
//! [`MapWidget`] is the capability set of the host map component.
//! [`ShapePresenter`] turns draft state into overlays on such a widget. Two
//! presenters implement it: [`LayerGroupPresenter`] keeps overlays in layers
//! that are replaced wholesale, [`OverlayPresenter`] tracks and removes every
//! overlay handle individually.

mod layer_group;
mod overlay;
mod scene;

pub use layer_group::LayerGroupPresenter;
pub use overlay::OverlayPresenter;
pub use scene::{SceneOverlay, SceneWidget, Viewport};

use crate::draft::{EdgeLabel, ShapeDraft, VertexHandle};
use crate::geodesy::GeoBounds;
use measure_model::{GeoPoint, ShapeKind};
use std::fmt;

/// Opaque handle to one overlay on a map widget
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OverlayId(pub u64);

impl fmt::Display for OverlayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "overlay#{}", self.0)
    }
}

/// Drawing primitives offered by the host map component
pub trait MapWidget {
    fn add_polygon(&mut self, points: &[GeoPoint]) -> OverlayId;
    fn add_polyline(&mut self, points: &[GeoPoint]) -> OverlayId;
    fn add_marker(&mut self, point: GeoPoint) -> OverlayId;
    fn add_label(&mut self, anchor: GeoPoint, text: &str) -> OverlayId;
    /// Handle the user can drag; `index` is the vertex it stands for.
    fn add_draggable_handle(&mut self, index: usize, point: GeoPoint) -> OverlayId;
    /// Remove an overlay. Unknown ids are ignored.
    fn remove(&mut self, overlay: OverlayId);
    fn fit_bounds(&mut self, bounds: GeoBounds);
    fn center_on(&mut self, point: GeoPoint);
}

/// Renders draft state onto a map widget
pub trait ShapePresenter {
    /// Draw the outline: polygon for AREA, polyline for DISTANCE, marker for POI.
    /// Replaces any previously drawn outline.
    fn render_shape(&mut self, kind: ShapeKind, points: &[GeoPoint]);

    /// Replace all edge labels
    fn render_edge_labels(&mut self, labels: &[EdgeLabel]);

    /// Replace all vertex handles
    fn render_vertex_handles(&mut self, handles: &[VertexHandle]);

    /// Remove every overlay this presenter created
    fn clear_overlay(&mut self);

    /// Move the viewport to show `points`; a single point is centred on
    fn fit_bounds(&mut self, points: &[GeoPoint]);

    /// Vertex index behind a drag handle, `None` for overlays that are not handles
    fn handle_index(&self, overlay: OverlayId) -> Option<usize>;

    /// Rebuild the whole overlay from a draft.
    ///
    /// The outline and labels appear once the draft is complete. POI drafts are
    /// shown by their draggable handle alone.
    fn present(&mut self, draft: &ShapeDraft) {
        self.clear_overlay();
        if draft.kind() != ShapeKind::Poi && draft.is_complete() {
            self.render_shape(draft.kind(), draft.points());
            self.render_edge_labels(&draft.edge_labels());
        }
        self.render_vertex_handles(&draft.vertex_handles());
    }
}

/// Fit or centre a widget on `points`, doing nothing for an empty slice
pub(crate) fn fit_widget<W: MapWidget>(widget: &mut W, points: &[GeoPoint]) {
    let Some(bounds) = GeoBounds::from_points(points) else {
        return;
    };
    if bounds.is_degenerate() {
        widget.center_on(bounds.center());
    } else {
        widget.fit_bounds(bounds);
    }
}

/// Add the outline primitive matching `kind`
pub(crate) fn add_outline<W: MapWidget>(
    widget: &mut W,
    kind: ShapeKind,
    points: &[GeoPoint],
) -> Option<OverlayId> {
    match (kind, points.first()) {
        (_, None) => None,
        (ShapeKind::Area, _) => Some(widget.add_polygon(points)),
        (ShapeKind::Distance, _) => Some(widget.add_polyline(points)),
        (ShapeKind::Poi, Some(point)) => Some(widget.add_marker(*point)),
    }
}
