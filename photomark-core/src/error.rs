//! Error types for editing-model operations.

use thiserror::Error;

use crate::store::StoreError;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in core operations.
///
/// Engine mutations never fail: unknown ids and out-of-range undo/redo are
/// no-ops. These errors cover parsing and the persistence boundary.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A color string was not a valid `#RRGGBB` / `#RRGGBBAA` hex value.
    #[error("Invalid color: {0}")]
    InvalidColor(String),

    /// The requested project does not exist in the store.
    #[error("Project not found: {0}")]
    ProjectNotFound(String),

    /// The project store failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Project serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
