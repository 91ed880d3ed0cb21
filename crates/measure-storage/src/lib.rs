use directories::ProjectDirs;
use measure_model::Measure;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const MEASURES_SCHEMA_VERSION: u32 = 1;

/// Namespace used when none is configured.
pub const DEFAULT_NAMESPACE: &str = "field_measures";

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("unable to resolve local data directory")]
    NoDataDirectory,
    #[error("invalid storage namespace '{0}'")]
    InvalidNamespace(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Namespaces become file names, so only ASCII letters, digits, `_` and `-` are allowed.
pub fn is_valid_namespace(namespace: &str) -> bool {
    !namespace.is_empty()
        && namespace.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

#[derive(Debug, Clone)]
pub struct Storage {
    root: PathBuf,
}

#[derive(Debug, Serialize)]
struct MeasuresEnvelopeRef<'a> {
    version: u32,
    measures: &'a [Measure],
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StoredMeasures {
    Envelope { version: u32, measures: Vec<Measure> },
    Bare(Vec<Measure>),
}

impl Storage {
    pub fn from_default_project() -> Result<Self, StorageError> {
        let dirs = ProjectDirs::from("dev", "FieldMeasure", "FieldMeasure")
            .ok_or(StorageError::NoDataDirectory)?;

        Ok(Self { root: dirs.data_local_dir().to_path_buf() })
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Read the measure collection stored under `namespace`.
    ///
    /// A missing file is an empty collection. Unreadable or corrupt data is
    /// returned as an error so the caller can decide how to recover.
    pub fn load_measures(&self, namespace: &str) -> Result<Vec<Measure>, StorageError> {
        let path = self.namespace_path(namespace)?;
        if !path.exists() {
            return Ok(Vec::new());
        }

        let bytes = fs::read(&path)?;
        let measures = match serde_json::from_slice::<StoredMeasures>(&bytes)? {
            StoredMeasures::Envelope { version, measures } => {
                if version != MEASURES_SCHEMA_VERSION {
                    log::warn!(
                        "measure file {} has schema version {version}, expected {MEASURES_SCHEMA_VERSION}",
                        path.display()
                    );
                }
                measures
            }
            StoredMeasures::Bare(measures) => measures,
        };

        Ok(measures)
    }

    /// Replace the collection stored under `namespace`.
    ///
    /// Writes go to a temporary file that is renamed over the target, so readers
    /// never observe a partially written collection.
    pub fn save_measures(&self, namespace: &str, measures: &[Measure]) -> Result<(), StorageError> {
        let path = self.namespace_path(namespace)?;
        fs::create_dir_all(&self.root)?;

        let envelope = MeasuresEnvelopeRef { version: MEASURES_SCHEMA_VERSION, measures };
        let bytes = serde_json::to_vec_pretty(&envelope)?;

        let temp_path = path.with_extension("json.tmp");
        fs::write(&temp_path, bytes)?;
        fs::rename(&temp_path, &path)?;

        log::debug!("wrote {} measures to {}", measures.len(), path.display());
        Ok(())
    }

    pub fn namespace_path(&self, namespace: &str) -> Result<PathBuf, StorageError> {
        if !is_valid_namespace(namespace) {
            return Err(StorageError::InvalidNamespace(namespace.to_owned()));
        }

        Ok(self.root.join(format!("{namespace}.json")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use measure_model::{GeoPoint, MeasureGeometry, MeasureId, Measurements, ShapeKind};

    fn poi(name: &str) -> Measure {
        Measure {
            id: MeasureId::new_v4(),
            name: name.to_owned(),
            description: String::new(),
            group: "Wells".to_owned(),
            kind: ShapeKind::Poi,
            geometry: MeasureGeometry::Point(GeoPoint::new(14.6, 120.98)),
            measurements: Measurements::default(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn measures_round_trip() {
        let temp = tempfile::tempdir().expect("temp dir should be created");
        let store = Storage::with_root(temp.path());

        let measures = vec![poi("pump"), poi("gate")];
        store.save_measures(DEFAULT_NAMESPACE, &measures).expect("save should succeed");
        let loaded = store.load_measures(DEFAULT_NAMESPACE).expect("load should succeed");

        assert_eq!(loaded, measures);
    }

    #[test]
    fn load_empty_when_file_absent() {
        let temp = tempfile::tempdir().expect("temp dir should be created");
        let store = Storage::with_root(temp.path().join("not-created-yet"));

        let loaded = store.load_measures(DEFAULT_NAMESPACE).expect("load should succeed");
        assert!(loaded.is_empty());
    }

    #[test]
    fn namespaces_are_isolated() {
        let temp = tempfile::tempdir().expect("temp dir should be created");
        let store = Storage::with_root(temp.path());

        store.save_measures("farm_a", &[poi("barn")]).expect("save should succeed");

        assert_eq!(store.load_measures("farm_a").expect("load should succeed").len(), 1);
        assert!(store.load_measures("farm_b").expect("load should succeed").is_empty());
    }

    #[test]
    fn corrupt_file_is_reported() {
        let temp = tempfile::tempdir().expect("temp dir should be created");
        let store = Storage::with_root(temp.path());
        let path = store.namespace_path(DEFAULT_NAMESPACE).expect("namespace should be valid");
        fs::write(&path, b"{ not json").expect("fixture should be written");

        let result = store.load_measures(DEFAULT_NAMESPACE);
        assert!(matches!(result, Err(StorageError::Serde(_))));
    }

    #[test]
    fn bare_array_is_accepted() {
        let temp = tempfile::tempdir().expect("temp dir should be created");
        let store = Storage::with_root(temp.path());
        let path = store.namespace_path(DEFAULT_NAMESPACE).expect("namespace should be valid");

        let measures = vec![poi("silo")];
        fs::write(&path, serde_json::to_vec(&measures).expect("fixture should serialize"))
            .expect("fixture should be written");

        let loaded = store.load_measures(DEFAULT_NAMESPACE).expect("load should succeed");
        assert_eq!(loaded, measures);
    }

    #[test]
    fn rejects_path_like_namespaces() {
        let store = Storage::with_root("/tmp");
        assert!(matches!(
            store.namespace_path("../escape"),
            Err(StorageError::InvalidNamespace(_))
        ));
        assert!(store.namespace_path("").is_err());
    }

    #[test]
    fn save_leaves_no_temp_file_behind() {
        let temp = tempfile::tempdir().expect("temp dir should be created");
        let store = Storage::with_root(temp.path());

        store.save_measures(DEFAULT_NAMESPACE, &[poi("tank")]).expect("save should succeed");

        let entries: Vec<_> = fs::read_dir(temp.path())
            .expect("dir should be readable")
            .filter_map(Result::ok)
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(entries, vec![format!("{DEFAULT_NAMESPACE}.json")]);
    }
}
