//! Drawing state machine
//!
//! A [`SurveySession`] routes map input to the current draft, keeps the map
//! overlay in sync with it, and coordinates with the [`MeasureStore`] for saving,
//! viewing and deleting measures.

use crate::draft::ShapeDraft;
use crate::error::{SurveyError, SurveyResult};
use crate::presentation::{OverlayId, ShapePresenter};
use crate::store::MeasureStore;
use measure_model::{GeoPoint, Measure, MeasureId, SharePayload, ShapeKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DrawState {
    #[default]
    Idle,
    /// Clicks add points to a new shape of this kind
    Drawing(ShapeKind),
    /// A stored measure is loaded into an editable draft
    Viewing(MeasureId),
}

/// User input the session understands
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SurveyAction {
    Start(ShapeKind),
    Click(GeoPoint),
    Drag { index: usize, point: GeoPoint },
    RemoveVertex(usize),
    View(MeasureId),
    Cancel,
    DeleteSelected,
}

#[derive(Debug)]
pub struct SurveySession<P: ShapePresenter> {
    state: DrawState,
    draft: Option<ShapeDraft>,
    store: MeasureStore,
    presenter: P,
}

impl<P: ShapePresenter> SurveySession<P> {
    pub fn new(store: MeasureStore, presenter: P) -> Self {
        Self { state: DrawState::Idle, draft: None, store, presenter }
    }

    pub fn state(&self) -> DrawState {
        self.state
    }

    pub fn draft(&self) -> Option<&ShapeDraft> {
        self.draft.as_ref()
    }

    pub fn store(&self) -> &MeasureStore {
        &self.store
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    /// Begin a new shape, discarding any draft and selection
    pub fn start(&mut self, kind: ShapeKind) {
        self.draft = Some(ShapeDraft::new(kind));
        self.presenter.clear_overlay();
        self.store.clear_selection();
        self.transition(DrawState::Drawing(kind));
    }

    /// Add a clicked point to the shape being drawn.
    ///
    /// Returns `false` when no shape is being drawn; the click is ignored.
    pub fn click(&mut self, point: GeoPoint) -> bool {
        let DrawState::Drawing(_) = self.state else {
            log::debug!("ignoring map click at {point} in state {:?}", self.state);
            return false;
        };
        let Some(draft) = self.draft.as_mut() else {
            return false;
        };

        draft.add_point(point);
        self.presenter.present(draft);
        true
    }

    /// Move vertex `index` of the current draft
    pub fn drag(&mut self, index: usize, point: GeoPoint) -> SurveyResult<()> {
        let draft = self.draft.as_mut().ok_or(SurveyError::NoDraft)?;
        draft.move_vertex(index, point)?;
        self.presenter.present(draft);
        Ok(())
    }

    /// Drag reported against a widget overlay.
    ///
    /// Returns `Ok(false)` if the overlay is not one of the draft's vertex handles.
    pub fn drag_overlay(&mut self, overlay: OverlayId, point: GeoPoint) -> SurveyResult<bool> {
        let Some(index) = self.presenter.handle_index(overlay) else {
            return Ok(false);
        };
        self.drag(index, point)?;
        Ok(true)
    }

    /// Delete vertex `index` of the current draft
    pub fn remove_vertex(&mut self, index: usize) -> SurveyResult<GeoPoint> {
        let draft = self.draft.as_mut().ok_or(SurveyError::NoDraft)?;
        let removed = draft.remove_vertex(index)?;
        self.presenter.present(draft);
        Ok(removed)
    }

    /// Load a stored measure into a fresh editable draft and frame it on the map
    pub fn view(&mut self, id: MeasureId) -> SurveyResult<&ShapeDraft> {
        let draft = ShapeDraft::from_measure(self.store.select(id)?);

        self.presenter.present(&draft);
        self.presenter.fit_bounds(draft.points());
        self.transition(DrawState::Viewing(id));
        let draft: &ShapeDraft = self.draft.insert(draft);
        Ok(draft)
    }

    /// Discard the draft and overlay and return to idle
    pub fn cancel(&mut self) {
        self.reset();
        self.store.clear_selection();
    }

    /// Save the current draft as a new measure; the state is left unchanged
    pub fn save(&mut self, name: &str, description: &str, group: &str) -> SurveyResult<Measure> {
        let draft = self.draft.as_ref().ok_or(SurveyError::NoDraft)?;
        self.store.save(draft, name, description, group)
    }

    /// Save and return to idle, keeping the new measure selected
    pub fn finish_save(
        &mut self,
        name: &str,
        description: &str,
        group: &str,
    ) -> SurveyResult<Measure> {
        let measure = self.save(name, description, group)?;
        self.reset();
        Ok(measure)
    }

    /// Delete the selected measure, if any, and return to idle
    pub fn delete_selected(&mut self) -> SurveyResult<Option<Measure>> {
        let deleted = match self.store.selected().cloned() {
            Some(measure) => {
                self.store.delete(measure.id)?;
                Some(measure)
            }
            None => None,
        };
        self.reset();
        Ok(deleted)
    }

    /// Shareable snapshot of the current draft
    pub fn share_payload(
        &self,
        name: &str,
        description: &str,
        group: &str,
    ) -> Option<SharePayload> {
        self.draft.as_ref().map(|draft| draft.share_payload(name, description, group))
    }

    pub fn apply(&mut self, action: SurveyAction) -> SurveyResult<()> {
        match action {
            SurveyAction::Start(kind) => self.start(kind),
            SurveyAction::Click(point) => {
                self.click(point);
            }
            SurveyAction::Drag { index, point } => self.drag(index, point)?,
            SurveyAction::RemoveVertex(index) => {
                self.remove_vertex(index)?;
            }
            SurveyAction::View(id) => {
                self.view(id)?;
            }
            SurveyAction::Cancel => self.cancel(),
            SurveyAction::DeleteSelected => {
                self.delete_selected()?;
            }
        }
        Ok(())
    }

    fn reset(&mut self) {
        self.draft = None;
        self.presenter.clear_overlay();
        self.transition(DrawState::Idle);
    }

    fn transition(&mut self, next: DrawState) {
        if self.state != next {
            log::debug!("survey state {:?} -> {next:?}", self.state);
        }
        self.state = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presentation::{LayerGroupPresenter, SceneOverlay, SceneWidget, Viewport};

    type Session = SurveySession<LayerGroupPresenter<SceneWidget>>;

    fn session() -> Session {
        SurveySession::new(MeasureStore::in_memory(), LayerGroupPresenter::new(SceneWidget::new()))
    }

    fn scene(session: &Session) -> &SceneWidget {
        session.presenter().widget()
    }

    fn square() -> [GeoPoint; 4] {
        [
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(0.0, 0.001),
            GeoPoint::new(0.001, 0.001),
            GeoPoint::new(0.001, 0.0),
        ]
    }

    #[test]
    fn clicks_are_ignored_when_idle() {
        let mut session = session();
        assert!(!session.click(GeoPoint::new(1.0, 1.0)));
        assert!(session.draft().is_none());
        assert!(scene(&session).is_empty());
        assert_eq!(session.state(), DrawState::Idle);
    }

    #[test]
    fn drawing_area_builds_overlay() {
        let mut session = session();
        session.start(ShapeKind::Area);
        assert_eq!(session.state(), DrawState::Drawing(ShapeKind::Area));

        for point in square() {
            assert!(session.click(point));
        }

        let scene = scene(&session);
        assert_eq!(scene.count(|o| matches!(o, SceneOverlay::Polygon(_))), 1);
        assert_eq!(scene.label_texts().len(), 4);
        assert_eq!(scene.count(|o| matches!(o, SceneOverlay::Handle { .. })), 4);
    }

    #[test]
    fn start_discards_previous_draft() {
        let mut session = session();
        session.start(ShapeKind::Distance);
        session.click(GeoPoint::new(0.0, 0.0));
        session.click(GeoPoint::new(0.0, 1.0));

        session.start(ShapeKind::Poi);
        let draft = session.draft().expect("draft exists");
        assert!(draft.is_empty());
        assert!(draft.measurements().is_unset());
        assert!(scene(&session).is_empty());
    }

    #[test]
    fn drag_through_handle_overlay() {
        let mut session = session();
        session.start(ShapeKind::Distance);
        session.click(GeoPoint::new(0.0, 0.0));
        session.click(GeoPoint::new(0.0, 0.001));

        let handle = scene(&session)
            .overlays()
            .find_map(|(id, o)| matches!(o, SceneOverlay::Handle { index: 1, .. }).then_some(id))
            .expect("handle for vertex 1");
        let before = session.draft().and_then(|d| d.measurements().distance_meters);

        assert!(session.drag_overlay(handle, GeoPoint::new(0.0, 0.002)).expect("drag succeeds"));
        let after = session.draft().and_then(|d| d.measurements().distance_meters);
        assert!(after > before);

        let label = scene(&session).label_texts();
        assert_eq!(label.len(), 1);
    }

    #[test]
    fn drag_without_draft_is_an_error() {
        let mut session = session();
        assert!(matches!(session.drag(0, GeoPoint::new(0.0, 0.0)), Err(SurveyError::NoDraft)));
    }

    #[test]
    fn view_recomputes_and_frames_shape() {
        let mut session = session();
        session.start(ShapeKind::Area);
        for point in square() {
            session.click(point);
        }
        let saved = session.finish_save("Plot", "", "").expect("save succeeds");
        assert_eq!(session.state(), DrawState::Idle);
        assert!(scene(&session).is_empty());

        let draft = session.view(saved.id).expect("measure exists");
        assert_eq!(draft.points(), saved.points());
        assert_eq!(draft.measurements(), saved.measurements);
        assert_eq!(session.state(), DrawState::Viewing(saved.id));
        assert!(matches!(scene(&session).viewport(), Some(Viewport::Bounds(_))));

        // Clicks do not extend a viewed shape
        assert!(!session.click(GeoPoint::new(1.0, 1.0)));
    }

    #[test]
    fn viewing_poi_centres_map() {
        let mut session = session();
        session.start(ShapeKind::Poi);
        session.click(GeoPoint::new(5.0, 6.0));
        let saved = session.save("Well", "", "").expect("save succeeds");
        assert_eq!(session.state(), DrawState::Drawing(ShapeKind::Poi));

        session.view(saved.id).expect("measure exists");
        assert_eq!(scene(&session).viewport(), Some(Viewport::Center(GeoPoint::new(5.0, 6.0))));
    }

    #[test]
    fn delete_selected_returns_to_idle() {
        let mut session = session();
        session.start(ShapeKind::Poi);
        session.click(GeoPoint::new(5.0, 6.0));
        let saved = session.save("Well", "", "").expect("save succeeds");
        session.view(saved.id).expect("measure exists");

        let deleted = session.delete_selected().expect("delete succeeds");
        assert_eq!(deleted.map(|m| m.id), Some(saved.id));
        assert!(session.store().is_empty());
        assert_eq!(session.state(), DrawState::Idle);
        assert!(scene(&session).is_empty());

        assert_eq!(session.delete_selected().expect("nothing to delete"), None);
    }

    #[test]
    fn remove_vertex_updates_overlay() {
        let mut session = session();
        session.start(ShapeKind::Area);
        for point in &square()[..3] {
            session.click(*point);
        }
        assert_eq!(scene(&session).label_texts().len(), 3);

        session.remove_vertex(1).expect("vertex exists");
        assert!(scene(&session).label_texts().is_empty());
        assert_eq!(scene(&session).count(|o| matches!(o, SceneOverlay::Handle { .. })), 2);
    }

    #[test]
    fn apply_dispatches_actions() {
        let mut session = session();
        session.apply(SurveyAction::Start(ShapeKind::Distance)).expect("start");
        session.apply(SurveyAction::Click(GeoPoint::new(0.0, 0.0))).expect("click");
        session.apply(SurveyAction::Click(GeoPoint::new(0.01, 0.0))).expect("click");
        session
            .apply(SurveyAction::Drag { index: 1, point: GeoPoint::new(0.02, 0.0) })
            .expect("drag");
        assert_eq!(session.draft().map(|d| d.points()[1]), Some(GeoPoint::new(0.02, 0.0)));

        let result = session.apply(SurveyAction::RemoveVertex(9));
        assert!(matches!(result, Err(SurveyError::VertexOutOfRange { index: 9, len: 2 })));

        session.apply(SurveyAction::Cancel).expect("cancel");
        assert_eq!(session.state(), DrawState::Idle);
        assert!(session.draft().is_none());
    }
}
