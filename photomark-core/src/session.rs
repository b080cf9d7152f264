//! An open project bound to its store.

use std::sync::Arc;

use crate::element::{CanvasElement, PixelSize, Size};
use crate::project::ProjectDocument;
use crate::scene::SceneEngine;
use crate::store::ProjectStore;
use crate::{CoreError, CoreResult};

/// A project being edited.
///
/// Holds the document metadata, a [`SceneEngine`] seeded from the stored
/// elements, and the store it was opened from.
pub struct EditorSession {
    store: Arc<dyn ProjectStore>,
    document: ProjectDocument,
    engine: SceneEngine,
}

impl std::fmt::Debug for EditorSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorSession")
            .field("project", &self.document.id)
            .field("elements", &self.engine.len())
            .finish_non_exhaustive()
    }
}

impl EditorSession {
    /// Load a project and start editing with an empty undo log.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ProjectNotFound`] if the store has no such project,
    /// or [`CoreError::Store`] if loading fails.
    pub fn open(store: Arc<dyn ProjectStore>, id: &str) -> CoreResult<Self> {
        let document = store
            .load(id)?
            .ok_or_else(|| CoreError::ProjectNotFound(id.to_string()))?;
        let mut engine = SceneEngine::new();
        engine.load(document.elements.iter().cloned());
        tracing::debug!("Opened project {id} with {} elements", engine.len());
        Ok(Self {
            store,
            document,
            engine,
        })
    }

    /// Start a new project and persist it immediately.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Store`] if the initial save fails.
    pub fn create(store: Arc<dyn ProjectStore>, document: ProjectDocument) -> CoreResult<Self> {
        store.save(&document)?;
        let mut engine = SceneEngine::new();
        engine.load(document.elements.iter().cloned());
        Ok(Self {
            store,
            document,
            engine,
        })
    }

    /// Write the current element list back to the store.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Store`] if saving fails.
    pub fn save(&mut self) -> CoreResult<()> {
        self.document.elements = self.engine.snapshot();
        self.document.touch();
        self.store.save(&self.document)?;
        Ok(())
    }

    /// The engine, for mutations.
    pub fn engine_mut(&mut self) -> &mut SceneEngine {
        &mut self.engine
    }

    /// The engine, read-only.
    #[must_use]
    pub fn engine(&self) -> &SceneEngine {
        &self.engine
    }

    /// Project id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.document.id
    }

    /// Source photo reference.
    #[must_use]
    pub fn source_image_path(&self) -> &str {
        &self.document.source_image_path
    }

    /// Source photo size.
    #[must_use]
    pub fn source_dimensions(&self) -> PixelSize {
        self.document.source_dimensions
    }

    /// Editing canvas size, if recorded.
    #[must_use]
    pub fn canvas_size(&self) -> Option<Size> {
        self.document.canvas_size
    }

    /// Record the editing canvas size (e.g. after layout).
    pub fn set_canvas_size(&mut self, size: Size) {
        self.document.canvas_size = Some(size);
    }

    /// Document reflecting the current, unsaved engine state.
    #[must_use]
    pub fn document(&self) -> ProjectDocument {
        let mut document = self.document.clone();
        document.elements = self.engine.snapshot();
        document
    }

    /// Elements in z-order.
    #[must_use]
    pub fn elements(&self) -> Vec<CanvasElement> {
        self.engine.snapshot()
    }
}
