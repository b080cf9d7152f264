//! Linear undo/redo log.
//!
//! ```text
//!  entries:  [add A] [update A] [add B] [delete A]
//!                                  ^ cursor (history_index = 2)
//!  undo  -> invert entry at cursor, cursor - 1
//!  redo  -> replay entry after cursor, cursor + 1
//!  record -> drop everything after cursor, append
//! ```

use std::sync::Arc;

use crate::element::{CanvasElement, ElementId};
use crate::patch::ElementPatch;

/// One reversible action.
///
/// Whole elements are held behind [`Arc`] so the log and the live list share
/// the same allocation until one of them is mutated.
#[derive(Debug, Clone, PartialEq)]
pub enum HistoryEntry {
    /// An element was appended.
    Add {
        /// The added element.
        element: Arc<CanvasElement>,
    },
    /// An element was removed.
    Delete {
        /// The removed element, kept for restoration.
        element: Arc<CanvasElement>,
    },
    /// Some fields of an element changed.
    Update {
        /// The element that changed.
        id: ElementId,
        /// Values of the touched fields before the change.
        before: ElementPatch,
        /// Values of the touched fields after the change.
        after: ElementPatch,
    },
}

impl HistoryEntry {
    /// The element this entry concerns.
    #[must_use]
    pub fn element_id(&self) -> ElementId {
        match self {
            Self::Add { element } | Self::Delete { element } => element.id,
            Self::Update { id, .. } => *id,
        }
    }
}

/// A single linear log with a cursor.
#[derive(Debug, Clone)]
pub struct History {
    entries: Vec<HistoryEntry>,
    /// Number of entries currently applied.
    applied: usize,
    /// Oldest entries are dropped beyond this; unbounded when `None`.
    limit: Option<usize>,
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

impl History {
    /// Create an empty, unbounded log.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            applied: 0,
            limit: None,
        }
    }

    /// Create an empty log keeping at most `limit` entries (minimum 1).
    ///
    /// Undo cannot reach past the oldest kept entry.
    #[must_use]
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit: Some(limit.max(1)),
            ..Self::new()
        }
    }

    /// The entry cap, if any.
    #[must_use]
    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// Append an entry at the cursor, discarding the redo tail.
    pub fn record(&mut self, entry: HistoryEntry) {
        self.entries.truncate(self.applied);
        self.entries.push(entry);
        if let Some(limit) = self.limit {
            if self.entries.len() > limit {
                let overflow = self.entries.len() - limit;
                self.entries.drain(..overflow);
            }
        }
        self.applied = self.entries.len();
    }

    /// Move the cursor back and return the entry to invert.
    pub fn step_back(&mut self) -> Option<HistoryEntry> {
        if self.applied == 0 {
            return None;
        }
        self.applied -= 1;
        self.entries.get(self.applied).cloned()
    }

    /// Move the cursor forward and return the entry to replay.
    pub fn step_forward(&mut self) -> Option<HistoryEntry> {
        let entry = self.entries.get(self.applied).cloned()?;
        self.applied += 1;
        Some(entry)
    }

    /// Index of the last applied entry, `None` when nothing is applied.
    #[must_use]
    pub fn index(&self) -> Option<usize> {
        self.applied.checked_sub(1)
    }

    /// Total number of entries, including the redo tail.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the log is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether [`Self::step_back`] would return an entry.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.applied > 0
    }

    /// Whether [`Self::step_forward`] would return an entry.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.applied < self.entries.len()
    }

    /// All entries, oldest first.
    #[must_use]
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.applied = 0;
    }
}
