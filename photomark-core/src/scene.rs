//! Scene/history engine: the ordered layer list, selection, and undo log.
//!
//! Every mutation goes through [`SceneEngine`]. List order is z-order (later
//! elements paint on top). Mutations against unknown ids are no-ops so that
//! racing UI events cannot put the engine into an error state.

use std::collections::HashMap;
use std::sync::Arc;

use crate::element::{CanvasElement, ElementId};
use crate::history::{History, HistoryEntry};
use crate::patch::ElementPatch;

/// The editable layer graph with full undo/redo.
#[derive(Debug, Clone)]
pub struct SceneEngine {
    elements: Vec<Arc<CanvasElement>>,
    selected: Option<ElementId>,
    history: History,
    /// Pre-drag state of elements with an open gesture.
    gestures: HashMap<ElementId, Arc<CanvasElement>>,
}

impl Default for SceneEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneEngine {
    /// Create an empty engine with an unbounded undo log.
    #[must_use]
    pub fn new() -> Self {
        Self::with_history(History::new())
    }

    /// Create an empty engine whose log keeps at most `limit` entries.
    #[must_use]
    pub fn with_history_limit(limit: usize) -> Self {
        Self::with_history(History::with_limit(limit))
    }

    fn with_history(history: History) -> Self {
        Self {
            elements: Vec::new(),
            selected: None,
            history,
            gestures: HashMap::new(),
        }
    }

    /// Replace the element list, e.g. when a project is opened.
    ///
    /// History, selection, and open gestures are reset. Elements with a
    /// duplicate id are dropped.
    pub fn load(&mut self, elements: impl IntoIterator<Item = CanvasElement>) {
        self.elements.clear();
        for element in elements {
            if self.index_of(element.id).is_some() {
                tracing::warn!("Dropping element with duplicate id {}", element.id);
                continue;
            }
            if !valid_scale(element.scale) {
                tracing::warn!(
                    "Dropping element {} with invalid scale {}",
                    element.id,
                    element.scale
                );
                continue;
            }
            self.elements.push(Arc::new(element));
        }
        self.selected = None;
        self.history.clear();
        self.gestures.clear();
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    /// Append an element, select it, and record an `add` entry.
    ///
    /// Returns `None` (and changes nothing) if the id is already present or
    /// the scale is not a positive finite number.
    pub fn add(&mut self, element: CanvasElement) -> Option<ElementId> {
        let id = element.id;
        if self.index_of(id).is_some() {
            tracing::debug!("Ignoring add of duplicate element {id}");
            return None;
        }
        if !valid_scale(element.scale) {
            tracing::debug!("Ignoring add of element {id} with scale {}", element.scale);
            return None;
        }
        let element = Arc::new(element);
        self.elements.push(Arc::clone(&element));
        self.selected = Some(id);
        self.history.record(HistoryEntry::Add { element });
        Some(id)
    }

    /// Merge a partial update into an element and record it.
    ///
    /// Only the touched fields are snapshotted. An update whose values match
    /// the current state records nothing. An open gesture on the element is
    /// closed first, so its preview becomes its own entry. Returns whether an
    /// entry was recorded.
    pub fn update(&mut self, id: ElementId, patch: ElementPatch) -> bool {
        let Some(index) = self.index_of(id) else {
            tracing::debug!("Ignoring update of unknown element {id}");
            return false;
        };
        if self.gestures.contains_key(&id) {
            tracing::debug!("Closing open gesture on {id} before update");
            self.end_gesture(id);
        }
        let current = &self.elements[index];
        let after = current.sanitize_patch(patch);
        let before = current.capture(&after);
        if before == after {
            return false;
        }
        Arc::make_mut(&mut self.elements[index]).apply_patch(&after);
        self.history.record(HistoryEntry::Update { id, before, after });
        true
    }

    /// Apply a partial update without touching history.
    ///
    /// Used for drag previews; pair with [`Self::begin_gesture`] and
    /// [`Self::end_gesture`] so the whole drag becomes one undo step.
    pub fn update_without_history(&mut self, id: ElementId, patch: ElementPatch) -> bool {
        let Some(index) = self.index_of(id) else {
            tracing::debug!("Ignoring preview update of unknown element {id}");
            return false;
        };
        let patch = self.elements[index].sanitize_patch(patch);
        if patch.is_empty() {
            return false;
        }
        Arc::make_mut(&mut self.elements[index]).apply_patch(&patch);
        true
    }

    /// Remember the current state of an element before a continuous edit.
    ///
    /// A second call while a gesture is open keeps the first baseline.
    pub fn begin_gesture(&mut self, id: ElementId) -> bool {
        let Some(index) = self.index_of(id) else {
            tracing::debug!("Ignoring gesture start on unknown element {id}");
            return false;
        };
        self.gestures
            .entry(id)
            .or_insert_with(|| Arc::clone(&self.elements[index]));
        true
    }

    /// Close a gesture, recording one consolidated `update` from the
    /// baseline to the current state. Nothing is recorded when the net change
    /// is empty. Returns whether an entry was recorded.
    pub fn end_gesture(&mut self, id: ElementId) -> bool {
        let Some(baseline) = self.gestures.remove(&id) else {
            tracing::debug!("Ignoring gesture end without a start for {id}");
            return false;
        };
        let Some(index) = self.index_of(id) else {
            return false;
        };
        let (before, after) = ElementPatch::between(&baseline, &self.elements[index]);
        if after.is_empty() {
            return false;
        }
        self.history.record(HistoryEntry::Update { id, before, after });
        true
    }

    /// Apply several updates, one consolidated entry per changed element.
    ///
    /// Returns the number of entries recorded.
    pub fn update_many(
        &mut self,
        updates: impl IntoIterator<Item = (ElementId, ElementPatch)>,
    ) -> usize {
        let mut merged: Vec<(ElementId, ElementPatch)> = Vec::new();
        for (id, patch) in updates {
            match merged.iter_mut().find(|(existing, _)| *existing == id) {
                Some((_, pending)) => merge_into(pending, patch),
                None => merged.push((id, patch)),
            }
        }
        merged
            .into_iter()
            .filter(|(id, patch)| self.update(*id, patch.clone()))
            .count()
    }

    /// Remove an element and record it for restoration.
    ///
    /// Returns the removed element.
    pub fn delete(&mut self, id: ElementId) -> Option<Arc<CanvasElement>> {
        let Some(index) = self.index_of(id) else {
            tracing::debug!("Ignoring delete of unknown element {id}");
            return None;
        };
        let element = self.elements.remove(index);
        if self.selected == Some(id) {
            self.selected = None;
        }
        self.gestures.remove(&id);
        self.history.record(HistoryEntry::Delete {
            element: Arc::clone(&element),
        });
        Some(element)
    }

    /// Change the selection. Not recorded in history.
    ///
    /// Selecting an unknown id is a no-op.
    pub fn select(&mut self, id: Option<ElementId>) {
        match id {
            Some(id) if self.index_of(id).is_none() => {
                tracing::debug!("Ignoring selection of unknown element {id}");
            }
            _ => self.selected = id,
        }
    }

    /// Invert the entry at the cursor. Returns whether anything happened.
    pub fn undo(&mut self) -> bool {
        let Some(entry) = self.history.step_back() else {
            return false;
        };
        match entry {
            HistoryEntry::Add { element } => {
                self.remove_silently(element.id);
            }
            // Reinserted on top; the original z-position is not restored.
            HistoryEntry::Delete { element } => {
                self.elements.push(element);
            }
            HistoryEntry::Update { id, before, .. } => {
                self.patch_silently(id, &before);
            }
        }
        true
    }

    /// Replay the entry after the cursor. Returns whether anything happened.
    pub fn redo(&mut self) -> bool {
        let Some(entry) = self.history.step_forward() else {
            return false;
        };
        match entry {
            HistoryEntry::Add { element } => {
                self.elements.push(element);
            }
            HistoryEntry::Delete { element } => {
                self.remove_silently(element.id);
            }
            HistoryEntry::Update { id, after, .. } => {
                self.patch_silently(id, &after);
            }
        }
        true
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// All elements in z-order.
    #[must_use]
    pub fn elements(&self) -> &[Arc<CanvasElement>] {
        &self.elements
    }

    /// Owned copy of the element list, e.g. for export or persistence.
    #[must_use]
    pub fn snapshot(&self) -> Vec<CanvasElement> {
        self.elements.iter().map(|e| e.as_ref().clone()).collect()
    }

    /// Get an element by id.
    #[must_use]
    pub fn get(&self, id: ElementId) -> Option<&CanvasElement> {
        self.index_of(id).map(|i| self.elements[i].as_ref())
    }

    /// The selected element id.
    #[must_use]
    pub fn selected(&self) -> Option<ElementId> {
        self.selected
    }

    /// The selected element.
    #[must_use]
    pub fn selected_element(&self) -> Option<&CanvasElement> {
        self.selected.and_then(|id| self.get(id))
    }

    /// Number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether there are no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Whether [`Self::undo`] would do something.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    /// Whether [`Self::redo`] would do something.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Total number of history entries, including the redo tail.
    #[must_use]
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Index of the last applied entry (`None` is the "-1" position).
    #[must_use]
    pub fn history_index(&self) -> Option<usize> {
        self.history.index()
    }

    /// The underlying log.
    #[must_use]
    pub fn history(&self) -> &History {
        &self.history
    }

    fn index_of(&self, id: ElementId) -> Option<usize> {
        self.elements.iter().position(|e| e.id == id)
    }

    fn remove_silently(&mut self, id: ElementId) {
        if let Some(index) = self.index_of(id) {
            self.elements.remove(index);
            if self.selected == Some(id) {
                self.selected = None;
            }
        }
    }

    fn patch_silently(&mut self, id: ElementId, patch: &ElementPatch) {
        if let Some(index) = self.index_of(id) {
            Arc::make_mut(&mut self.elements[index]).apply_patch(patch);
        }
    }
}

fn valid_scale(scale: f32) -> bool {
    scale.is_finite() && scale > 0.0
}

/// Later fields win.
fn merge_into(target: &mut ElementPatch, patch: ElementPatch) {
    macro_rules! take {
        ($($field:ident),*) => {
            $(if patch.$field.is_some() { target.$field = patch.$field; })*
        };
    }
    take!(
        position,
        scale,
        rotation,
        width,
        height,
        opacity,
        text_content,
        font_family,
        font_size,
        color,
        effect,
        background,
        asset
    );
}
