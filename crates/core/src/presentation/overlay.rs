use super::{add_outline, fit_widget, MapWidget, OverlayId, ShapePresenter};
use crate::draft::{EdgeLabel, VertexHandle};
use measure_model::{GeoPoint, ShapeKind};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OverlayRole {
    Outline,
    Label,
    Handle(usize),
}

/// Presenter that registers every overlay handle it creates and removes them
/// one at a time.
#[derive(Debug)]
pub struct OverlayPresenter<W: MapWidget> {
    widget: W,
    registry: HashMap<OverlayId, OverlayRole>,
}

impl<W: MapWidget> OverlayPresenter<W> {
    pub fn new(widget: W) -> Self {
        Self { widget, registry: HashMap::new() }
    }

    pub fn widget(&self) -> &W {
        &self.widget
    }

    /// Number of overlays currently tracked
    pub fn overlay_count(&self) -> usize {
        self.registry.len()
    }

    fn remove_where(&mut self, matches: impl Fn(OverlayRole) -> bool) {
        let doomed: Vec<OverlayId> =
            self.registry.iter().filter(|(_, role)| matches(**role)).map(|(id, _)| *id).collect();
        for overlay in doomed {
            self.widget.remove(overlay);
            self.registry.remove(&overlay);
        }
    }
}

impl<W: MapWidget> ShapePresenter for OverlayPresenter<W> {
    fn render_shape(&mut self, kind: ShapeKind, points: &[GeoPoint]) {
        self.remove_where(|role| role == OverlayRole::Outline);
        if let Some(overlay) = add_outline(&mut self.widget, kind, points) {
            self.registry.insert(overlay, OverlayRole::Outline);
        }
    }

    fn render_edge_labels(&mut self, labels: &[EdgeLabel]) {
        self.remove_where(|role| role == OverlayRole::Label);
        for label in labels {
            let overlay = self.widget.add_label(label.anchor, &label.text);
            self.registry.insert(overlay, OverlayRole::Label);
        }
    }

    fn render_vertex_handles(&mut self, handles: &[VertexHandle]) {
        self.remove_where(|role| matches!(role, OverlayRole::Handle(_)));
        for handle in handles {
            let overlay = self.widget.add_draggable_handle(handle.index, handle.position);
            self.registry.insert(overlay, OverlayRole::Handle(handle.index));
        }
    }

    fn clear_overlay(&mut self) {
        for (overlay, _) in self.registry.drain() {
            self.widget.remove(overlay);
        }
    }

    fn fit_bounds(&mut self, points: &[GeoPoint]) {
        fit_widget(&mut self.widget, points);
    }

    fn handle_index(&self, overlay: OverlayId) -> Option<usize> {
        match self.registry.get(&overlay) {
            Some(OverlayRole::Handle(index)) => Some(*index),
            _ => None,
        }
    }
}
