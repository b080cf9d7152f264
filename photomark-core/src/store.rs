//! Project persistence.
//!
//! [`ProjectStore`] is the seam between the editing model and wherever
//! projects live. Two implementations ship here: an in-memory map for tests and
//! embedding, and a directory of JSON files.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use crate::project::ProjectDocument;

/// Errors that can occur during store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// An I/O error occurred during persistence.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// A serialization or deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// The project id cannot be used as a storage key.
    #[error("Invalid project id: {0:?}")]
    InvalidId(String),
}

/// Load/save access to project documents.
pub trait ProjectStore: Send + Sync {
    /// Load a project, `Ok(None)` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backing storage fails or holds a corrupt
    /// document.
    fn load(&self, id: &str) -> Result<Option<ProjectDocument>, StoreError>;

    /// Insert or replace a project.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backing storage fails.
    fn save(&self, document: &ProjectDocument) -> Result<(), StoreError>;

    /// Ids of all stored projects, sorted.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backing storage cannot be listed.
    fn list(&self) -> Result<Vec<String>, StoreError>;

    /// Remove a project. Returns whether it existed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backing storage fails.
    fn delete(&self, id: &str) -> Result<bool, StoreError>;
}

/// Thread-safe in-memory store.
#[derive(Debug, Default)]
pub struct MemoryProjectStore {
    projects: RwLock<HashMap<String, ProjectDocument>>,
}

impl MemoryProjectStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProjectStore for MemoryProjectStore {
    fn load(&self, id: &str) -> Result<Option<ProjectDocument>, StoreError> {
        let projects = self
            .projects
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(projects.get(id).cloned())
    }

    fn save(&self, document: &ProjectDocument) -> Result<(), StoreError> {
        let mut projects = self
            .projects
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        projects.insert(document.id.clone(), document.clone());
        Ok(())
    }

    fn list(&self) -> Result<Vec<String>, StoreError> {
        let projects = self
            .projects
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut ids: Vec<String> = projects.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }

    fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let mut projects = self
            .projects
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(projects.remove(id).is_some())
    }
}

/// One pretty-printed JSON file per project under a data directory.
#[derive(Debug, Clone)]
pub struct JsonFileProjectStore {
    data_dir: PathBuf,
}

impl JsonFileProjectStore {
    /// Open (and create if needed) a store rooted at `data_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the directory cannot be created.
    pub fn new(data_dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let data_dir = data_dir.into();
        std::fs::create_dir_all(&data_dir)?;
        Ok(Self { data_dir })
    }

    /// The directory projects are stored in.
    #[must_use]
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn path_for(&self, id: &str) -> Result<PathBuf, StoreError> {
        if id.trim().is_empty() {
            return Err(StoreError::InvalidId(id.to_string()));
        }
        Ok(self
            .data_dir
            .join(format!("{}.json", sanitize_filename(id))))
    }
}

impl ProjectStore for JsonFileProjectStore {
    fn load(&self, id: &str) -> Result<Option<ProjectDocument>, StoreError> {
        let path = self.path_for(id)?;
        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let document: ProjectDocument = serde_json::from_str(&contents)
            .map_err(|e| StoreError::Serialization(format!("{}: {e}", path.display())))?;
        Ok(Some(document))
    }

    fn save(&self, document: &ProjectDocument) -> Result<(), StoreError> {
        let path = self.path_for(&document.id)?;
        let json = serde_json::to_string_pretty(document)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        std::fs::write(&path, json)?;
        tracing::debug!("Saved project {} to {}", document.id, path.display());
        Ok(())
    }

    fn list(&self) -> Result<Vec<String>, StoreError> {
        let mut ids = Vec::new();
        for entry in std::fs::read_dir(&self.data_dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    ids.push(stem.to_string());
                }
            }
        }
        ids.sort();
        Ok(ids)
    }

    fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let path = self.path_for(id)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

/// Replace any character that is not alphanumeric, `-`, or `_` with `_`.
fn sanitize_filename(id: &str) -> String {
    id.chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{CanvasElement, PixelSize};

    fn sample(id: &str) -> ProjectDocument {
        ProjectDocument::new(id, "/photos/a.jpg", PixelSize::new(800, 600))
            .with_elements(vec![CanvasElement::stamp("bundle://ok.png", 32.0, 32.0)])
    }

    #[test]
    fn test_memory_store_crud() {
        let store = MemoryProjectStore::new();
        assert!(store.load("p1").expect("load").is_none());

        let doc = sample("p1");
        store.save(&doc).expect("save");
        store.save(&sample("p0")).expect("save");
        assert_eq!(store.list().expect("list"), vec!["p0", "p1"]);
        assert_eq!(store.load("p1").expect("load"), Some(doc));

        assert!(store.delete("p1").expect("delete"));
        assert!(!store.delete("p1").expect("delete"));
    }

    #[test]
    fn test_json_store_persists_to_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonFileProjectStore::new(dir.path()).expect("store");
        let doc = sample("trip-2024");
        store.save(&doc).expect("save");

        assert!(dir.path().join("trip-2024.json").exists());

        let reopened = JsonFileProjectStore::new(dir.path()).expect("store");
        let loaded = reopened.load("trip-2024").expect("load").expect("present");
        assert_eq!(loaded, doc);
        assert_eq!(reopened.list().expect("list"), vec!["trip-2024"]);
    }

    #[test]
    fn test_json_store_missing_and_corrupt() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonFileProjectStore::new(dir.path()).expect("store");
        assert!(store.load("nope").expect("load").is_none());
        assert!(!store.delete("nope").expect("delete"));

        std::fs::write(dir.path().join("bad.json"), "{not json").expect("write");
        assert!(matches!(
            store.load("bad"),
            Err(StoreError::Serialization(_))
        ));
    }

    #[test]
    fn test_json_store_rejects_empty_id() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonFileProjectStore::new(dir.path()).expect("store");
        assert!(matches!(store.load("  "), Err(StoreError::InvalidId(_))));
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("../etc/passwd"), "___etc_passwd");
        assert_eq!(sanitize_filename("trip_2024-a"), "trip_2024-a");
    }
}
