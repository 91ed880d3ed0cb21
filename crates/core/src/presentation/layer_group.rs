use super::{add_outline, fit_widget, MapWidget, OverlayId, ShapePresenter};
use crate::draft::{EdgeLabel, VertexHandle};
use measure_model::{GeoPoint, ShapeKind};

/// Overlays added together and removed together
#[derive(Debug, Default)]
struct LayerGroup {
    members: Vec<OverlayId>,
}

impl LayerGroup {
    fn clear<W: MapWidget>(&mut self, widget: &mut W) {
        for overlay in self.members.drain(..) {
            widget.remove(overlay);
        }
    }

    fn push(&mut self, overlay: OverlayId) {
        self.members.push(overlay);
    }
}

/// Presenter that keeps the outline, labels and handles in three layer groups
/// and replaces each group wholesale.
#[derive(Debug)]
pub struct LayerGroupPresenter<W: MapWidget> {
    widget: W,
    shape_layer: LayerGroup,
    label_layer: LayerGroup,
    handle_layer: LayerGroup,
    handle_indices: Vec<(OverlayId, usize)>,
}

impl<W: MapWidget> LayerGroupPresenter<W> {
    pub fn new(widget: W) -> Self {
        Self {
            widget,
            shape_layer: LayerGroup::default(),
            label_layer: LayerGroup::default(),
            handle_layer: LayerGroup::default(),
            handle_indices: Vec::new(),
        }
    }

    pub fn widget(&self) -> &W {
        &self.widget
    }
}

impl<W: MapWidget> ShapePresenter for LayerGroupPresenter<W> {
    fn render_shape(&mut self, kind: ShapeKind, points: &[GeoPoint]) {
        self.shape_layer.clear(&mut self.widget);
        if let Some(overlay) = add_outline(&mut self.widget, kind, points) {
            self.shape_layer.push(overlay);
        }
    }

    fn render_edge_labels(&mut self, labels: &[EdgeLabel]) {
        self.label_layer.clear(&mut self.widget);
        for label in labels {
            let overlay = self.widget.add_label(label.anchor, &label.text);
            self.label_layer.push(overlay);
        }
    }

    fn render_vertex_handles(&mut self, handles: &[VertexHandle]) {
        self.handle_layer.clear(&mut self.widget);
        self.handle_indices.clear();
        for handle in handles {
            let overlay = self.widget.add_draggable_handle(handle.index, handle.position);
            self.handle_layer.push(overlay);
            self.handle_indices.push((overlay, handle.index));
        }
    }

    fn clear_overlay(&mut self) {
        self.shape_layer.clear(&mut self.widget);
        self.label_layer.clear(&mut self.widget);
        self.handle_layer.clear(&mut self.widget);
        self.handle_indices.clear();
    }

    fn fit_bounds(&mut self, points: &[GeoPoint]) {
        fit_widget(&mut self.widget, points);
    }

    fn handle_index(&self, overlay: OverlayId) -> Option<usize> {
        self.handle_indices.iter().find(|(id, _)| *id == overlay).map(|(_, index)| *index)
    }
}
