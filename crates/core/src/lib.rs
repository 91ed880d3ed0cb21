//! Field Measure Core Library
//!
//! Geometry kernel, drawing state machine and measure store for surveying
//! areas, distances and points of interest on a map.

pub mod activity;
pub mod config;
pub mod draft;
pub mod error;
pub mod geodesy;
pub mod geojson;
pub mod presentation;
pub mod session;
pub mod store;
pub mod units;

pub use activity::{
    ActivityError, ActivityLog, HttpActivityLog, MemoryActivityLog, NoopActivityLog,
};
pub use config::{ConfigError, SurveyConfig};
pub use draft::{compute_measurements, EdgeLabel, ShapeDraft, VertexHandle};
pub use error::{SurveyError, SurveyResult};
pub use geodesy::{
    centroid, distance, midpoint, polygon_area, polygon_perimeter, polyline_length, GeoBounds,
};
pub use presentation::{
    LayerGroupPresenter, MapWidget, OverlayId, OverlayPresenter, SceneOverlay, SceneWidget,
    ShapePresenter, Viewport,
};
pub use session::{DrawState, SurveyAction, SurveySession};
pub use store::{MeasurePersistence, MeasureStore, MemoryPersistence, NamespacedStorage};

pub use measure_model::{
    ActivityRecord, GeoPoint, Measure, MeasureGeometry, MeasureId, Measurements, SharePayload,
    ShapeKind,
};
