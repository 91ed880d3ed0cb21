use approx::assert_relative_eq;
use fieldmeasure_core::{
    DrawState, GeoPoint, LayerGroupPresenter, MeasureId, MeasureStore, MemoryActivityLog,
    MemoryPersistence, NamespacedStorage, NoopActivityLog, OverlayPresenter, SceneOverlay,
    SceneWidget, ShapeDraft, ShapeKind, ShapePresenter, SurveyError, SurveySession,
};
use measure_storage::{Storage, DEFAULT_NAMESPACE};
use std::fs;

fn field() -> Vec<GeoPoint> {
    vec![
        GeoPoint::new(14.5995, 120.9842),
        GeoPoint::new(14.6010, 120.9851),
        GeoPoint::new(14.6004, 120.9873),
        GeoPoint::new(14.5987, 120.9866),
    ]
}

fn disk_store(root: &std::path::Path) -> MeasureStore {
    MeasureStore::open(
        NamespacedStorage::new(Storage::with_root(root), DEFAULT_NAMESPACE),
        NoopActivityLog,
    )
}

#[test]
fn saved_area_reloads_into_equal_draft() {
    let temp = tempfile::tempdir().expect("temp dir should be created");

    let mut session =
        SurveySession::new(disk_store(temp.path()), LayerGroupPresenter::new(SceneWidget::new()));
    session.start(ShapeKind::Area);
    for point in field() {
        session.click(point);
    }
    let saved = session.finish_save("North paddock", "rice", "Block A").expect("save succeeds");

    // Fresh process: reopen from disk and view
    let mut session =
        SurveySession::new(disk_store(temp.path()), OverlayPresenter::new(SceneWidget::new()));
    assert_eq!(session.store().len(), 1);

    let draft = session.view(saved.id).expect("measure should be stored").clone();
    assert_eq!(draft.points(), field().as_slice());

    let cached = saved.measurements;
    let recomputed = draft.measurements();
    assert_relative_eq!(
        recomputed.area_sq_meters.expect("area"),
        cached.area_sq_meters.expect("area"),
        max_relative = 1e-9
    );
    assert_relative_eq!(
        recomputed.perimeter_meters.expect("perimeter"),
        cached.perimeter_meters.expect("perimeter"),
        max_relative = 1e-9
    );
    assert_eq!(session.state(), DrawState::Viewing(saved.id));
}

#[test]
fn empty_poi_save_is_rejected_without_side_effects() {
    let activity = MemoryActivityLog::new();
    let store = MeasureStore::open(MemoryPersistence::new(), activity.clone());
    let mut session = SurveySession::new(store, LayerGroupPresenter::new(SceneWidget::new()));

    session.start(ShapeKind::Poi);
    let result = session.save("Well", "", "");

    assert!(matches!(result, Err(SurveyError::Validation { required: 1, actual: 0, .. })));
    assert_eq!(session.store().len(), 0);
    assert!(activity.records().is_empty());
    assert_eq!(session.state(), DrawState::Drawing(ShapeKind::Poi));
    assert!(session.draft().is_some());
}

#[test]
fn area_measurements_appear_with_third_point() {
    let mut session =
        SurveySession::new(MeasureStore::in_memory(), OverlayPresenter::new(SceneWidget::new()));
    session.start(ShapeKind::Area);

    let points = field();
    session.click(points[0]);
    session.click(points[1]);
    let draft = session.draft().expect("drawing");
    assert!(draft.measurements().area_sq_meters.is_none());
    assert_eq!(session.presenter().widget().count(|o| matches!(o, SceneOverlay::Polygon(_))), 0);

    session.click(points[2]);
    let area = session.draft().and_then(|d| d.measurements().area_sq_meters);
    assert!(area.is_some_and(|a| a >= 0.0));
    assert_eq!(session.presenter().widget().label_texts().len(), 3);
}

#[test]
fn distance_of_a_hundredth_degree() {
    let mut session =
        SurveySession::new(MeasureStore::in_memory(), LayerGroupPresenter::new(SceneWidget::new()));
    session.start(ShapeKind::Distance);
    session.click(GeoPoint::new(0.0, 0.0));
    session.click(GeoPoint::new(0.01, 0.0));

    let values = session.draft().expect("drawing").measurements();
    assert!((values.distance_meters.expect("distance") - 1113.0).abs() < 2.0);
    assert!(values.area_sq_meters.is_none());
    assert_eq!(session.presenter().widget().label_texts(), vec!["1.112 km"]);
}

#[test]
fn deleting_unknown_id_is_a_noop() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let mut store = disk_store(temp.path());

    let mut draft = ShapeDraft::new(ShapeKind::Poi);
    draft.add_point(GeoPoint::new(1.0, 1.0));
    store.save(&draft, "gate", "", "").expect("save succeeds");

    assert!(!store.delete(MeasureId::new_v4()).expect("no error"));
    assert_eq!(store.len(), 1);
}

#[test]
fn failed_persistence_keeps_previous_collection() {
    let persistence = MemoryPersistence::new();
    let mut session = SurveySession::new(
        MeasureStore::open(persistence.clone(), NoopActivityLog),
        LayerGroupPresenter::new(SceneWidget::new()),
    );

    session.start(ShapeKind::Distance);
    session.click(GeoPoint::new(0.0, 0.0));
    session.click(GeoPoint::new(0.0, 0.01));
    session.save("fence", "", "").expect("first save succeeds");

    persistence.set_fail_writes(true);
    let result = session.save("fence again", "", "");
    assert!(matches!(result, Err(SurveyError::Persistence(_))));
    assert_eq!(session.store().len(), 1);
    assert_eq!(persistence.snapshot().len(), 1);
    // Draft survives for a retry
    assert_eq!(session.draft().map(|d| d.len()), Some(2));
}

#[test]
fn corrupt_storage_opens_empty_and_recovers() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let storage = Storage::with_root(temp.path());
    let path = storage.namespace_path(DEFAULT_NAMESPACE).expect("valid namespace");
    fs::write(&path, "[{ half a measure").expect("fixture written");

    let mut store = disk_store(temp.path());
    assert!(store.is_empty());

    let mut draft = ShapeDraft::new(ShapeKind::Poi);
    draft.add_point(GeoPoint::new(2.0, 2.0));
    store.save(&draft, "silo", "", "").expect("save overwrites corrupt file");
    assert_eq!(disk_store(temp.path()).len(), 1);
}

fn assert_clears<P: ShapePresenter>(presenter: P, scene: impl Fn(&P) -> &SceneWidget) {
    let mut session = SurveySession::new(MeasureStore::in_memory(), presenter);
    session.start(ShapeKind::Area);
    for point in field() {
        session.click(point);
    }
    assert!(!scene(session.presenter()).is_empty());

    session.cancel();
    assert!(scene(session.presenter()).is_empty());
    assert_eq!(session.state(), DrawState::Idle);
}

#[test]
fn cancel_leaves_no_overlays_for_either_presenter() {
    assert_clears(LayerGroupPresenter::new(SceneWidget::new()), |p| p.widget());
    assert_clears(OverlayPresenter::new(SceneWidget::new()), |p| p.widget());
}

#[test]
fn label_regeneration_is_idempotent() {
    let mut session =
        SurveySession::new(MeasureStore::in_memory(), OverlayPresenter::new(SceneWidget::new()));
    session.start(ShapeKind::Area);
    for point in field() {
        session.click(point);
    }
    let first = session.presenter().widget().label_texts().join("|");

    // Dragging a vertex onto itself rebuilds everything
    let points = field();
    session.drag(2, points[2]).expect("vertex exists");
    let second = session.presenter().widget().label_texts().join("|");

    assert_eq!(first, second);
    assert_eq!(session.presenter().overlay_count(), 1 + 4 + 4);
}
