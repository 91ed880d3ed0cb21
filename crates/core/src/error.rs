//! Error types for drawing, editing and persisting measures

use measure_model::{MeasureId, ShapeKind};
use measure_storage::StorageError;

/// Errors surfaced by the survey core.
///
/// A draft that is too short to measure is not an error: its measurements are
/// simply unset.
#[derive(Debug, thiserror::Error)]
pub enum SurveyError {
    /// The draft does not have enough points to be saved as its kind.
    #[error("{kind} measure needs at least {required} point(s), the draft has {actual}")]
    Validation { kind: ShapeKind, required: usize, actual: usize },

    /// Durable storage rejected the write; the in-memory collection was rolled back.
    #[error("failed to persist measures: {0}")]
    Persistence(#[from] StorageError),

    /// A vertex edit referred to an index outside the draft.
    #[error("vertex {index} is out of range for a shape with {len} point(s)")]
    VertexOutOfRange { index: usize, len: usize },

    /// A vertex edit arrived while nothing was being drawn or edited.
    #[error("no shape is being drawn or edited")]
    NoDraft,

    /// A measure was requested that the store does not hold.
    #[error("measure {0} does not exist")]
    UnknownMeasure(MeasureId),
}

/// Result type for survey operations
pub type SurveyResult<T> = Result<T, SurveyError>;
