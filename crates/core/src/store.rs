//! Persisted measure collection
//!
//! The store keeps saved measures most-recent-first, writes the full
//! collection through a [`MeasurePersistence`] after every change and tracks
//! which measure is selected.

use crate::activity::{ActivityLog, NoopActivityLog};
use crate::draft::ShapeDraft;
use crate::error::{SurveyError, SurveyResult};
use chrono::Utc;
use indexmap::IndexMap;
use measure_model::{ActivityRecord, Measure, MeasureId, UNTITLED_NAME};
use measure_storage::{Storage, StorageError};
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Durable home of the measure collection
pub trait MeasurePersistence: Send {
    fn load(&self) -> Result<Vec<Measure>, StorageError>;
    /// Replace the stored collection with `measures`
    fn store(&mut self, measures: &[Measure]) -> Result<(), StorageError>;
}

/// One namespace file inside a [`Storage`] root
#[derive(Debug, Clone)]
pub struct NamespacedStorage {
    storage: Storage,
    namespace: String,
}

impl NamespacedStorage {
    pub fn new(storage: Storage, namespace: impl Into<String>) -> Self {
        Self { storage, namespace: namespace.into() }
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }
}

impl MeasurePersistence for NamespacedStorage {
    fn load(&self) -> Result<Vec<Measure>, StorageError> {
        self.storage.load_measures(&self.namespace)
    }

    fn store(&mut self, measures: &[Measure]) -> Result<(), StorageError> {
        self.storage.save_measures(&self.namespace, measures)
    }
}

/// Volatile persistence; clones share state so tests can inspect writes and
/// make them fail.
#[derive(Debug, Default, Clone)]
pub struct MemoryPersistence {
    measures: Arc<Mutex<Vec<Measure>>>,
    fail_writes: Arc<AtomicBool>,
}

impl MemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_measures(measures: Vec<Measure>) -> Self {
        Self { measures: Arc::new(Mutex::new(measures)), ..Self::default() }
    }

    /// Make subsequent writes fail with an I/O error
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Collection as last written
    pub fn snapshot(&self) -> Vec<Measure> {
        match self.measures.lock() {
            Ok(measures) => measures.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl MeasurePersistence for MemoryPersistence {
    fn load(&self) -> Result<Vec<Measure>, StorageError> {
        Ok(self.snapshot())
    }

    fn store(&mut self, measures: &[Measure]) -> Result<(), StorageError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Io(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "writes are disabled",
            )));
        }
        match self.measures.lock() {
            Ok(mut stored) => *stored = measures.to_vec(),
            Err(poisoned) => *poisoned.into_inner() = measures.to_vec(),
        }
        Ok(())
    }
}

pub struct MeasureStore {
    measures: Vec<Measure>,
    selected: Option<MeasureId>,
    persistence: Box<dyn MeasurePersistence>,
    activity: Box<dyn ActivityLog>,
}

impl std::fmt::Debug for MeasureStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MeasureStore")
            .field("measures", &self.measures.len())
            .field("selected", &self.selected)
            .finish_non_exhaustive()
    }
}

impl MeasureStore {
    /// Load the stored collection.
    ///
    /// Unreadable or corrupt data opens as an empty collection; the next
    /// successful save overwrites it.
    pub fn open(
        persistence: impl MeasurePersistence + 'static,
        activity: impl ActivityLog + 'static,
    ) -> Self {
        let measures = match persistence.load() {
            Ok(measures) => measures,
            Err(e) => {
                log::warn!("could not load saved measures, starting empty: {e}");
                Vec::new()
            }
        };
        log::debug!("opened measure store with {} measures", measures.len());

        Self {
            measures,
            selected: None,
            persistence: Box::new(persistence),
            activity: Box::new(activity),
        }
    }

    /// Empty store without durable storage or activity logging
    pub fn in_memory() -> Self {
        Self::open(MemoryPersistence::new(), NoopActivityLog)
    }

    /// Save a complete draft as a new measure and select it.
    ///
    /// A blank name becomes "Untitled". If the collection cannot be written the
    /// in-memory collection is restored and the error returned; the draft is
    /// never modified.
    pub fn save(
        &mut self,
        draft: &ShapeDraft,
        name: &str,
        description: &str,
        group: &str,
    ) -> SurveyResult<Measure> {
        if !draft.is_complete() {
            return Err(SurveyError::Validation {
                kind: draft.kind(),
                required: draft.kind().min_points(),
                actual: draft.len(),
            });
        }

        let name = name.trim();
        let measure = Measure {
            id: MeasureId::new_v4(),
            name: if name.is_empty() { UNTITLED_NAME.to_owned() } else { name.to_owned() },
            description: description.trim().to_owned(),
            group: group.trim().to_owned(),
            kind: draft.kind(),
            geometry: draft.to_geometry(),
            measurements: draft.measurements(),
            created_at: Utc::now(),
        };

        self.measures.insert(0, measure.clone());
        if let Err(e) = self.persistence.store(&self.measures) {
            self.measures.remove(0);
            log::warn!("save of '{}' rolled back: {e}", measure.name);
            return Err(SurveyError::Persistence(e));
        }

        self.selected = Some(measure.id);
        log::info!("saved {} measure '{}' ({})", measure.kind, measure.name, measure.id);
        self.activity.record(ActivityRecord::from(&measure));

        Ok(measure)
    }

    /// Delete a measure. Unknown ids are a no-op returning `Ok(false)`.
    pub fn delete(&mut self, id: MeasureId) -> SurveyResult<bool> {
        let Some(position) = self.measures.iter().position(|m| m.id == id) else {
            log::debug!("delete of unknown measure {id} ignored");
            return Ok(false);
        };

        let removed = self.measures.remove(position);
        if let Err(e) = self.persistence.store(&self.measures) {
            self.measures.insert(position, removed);
            return Err(SurveyError::Persistence(e));
        }

        if self.selected == Some(id) {
            self.selected = None;
        }
        log::info!("deleted measure '{}' ({id})", removed.name);
        Ok(true)
    }

    /// Measures, most recently saved first
    pub fn list(&self) -> &[Measure] {
        &self.measures
    }

    pub fn get(&self, id: MeasureId) -> Option<&Measure> {
        self.measures.iter().find(|m| m.id == id)
    }

    pub fn len(&self) -> usize {
        self.measures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.measures.is_empty()
    }

    pub fn selected(&self) -> Option<&Measure> {
        self.selected.and_then(|id| self.get(id))
    }

    pub fn select(&mut self, id: MeasureId) -> SurveyResult<&Measure> {
        let position =
            self.measures.iter().position(|m| m.id == id).ok_or(SurveyError::UnknownMeasure(id))?;
        self.selected = Some(id);
        Ok(&self.measures[position])
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    /// Block until activity records from earlier saves are delivered or time out
    pub fn flush_activity(&self) {
        self.activity.flush();
    }

    /// Measure count per group in order of first appearance in [`Self::list`],
    /// blank groups counted as "Ungrouped".
    pub fn group_summary(&self) -> IndexMap<String, usize> {
        let mut summary = IndexMap::new();
        for measure in &self.measures {
            *summary.entry(measure.group_label().to_owned()).or_insert(0) += 1;
        }
        summary
    }
}
