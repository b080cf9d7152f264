//! Renderer error types.

use thiserror::Error;

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors that can occur while rasterizing or exporting.
///
/// Overlay problems (unresolvable stickers, undecodable watermarks) never
/// surface here; they are logged and the layer is skipped.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The source photo could not be resolved, read, or decoded.
    #[error("Failed to load source image: {0}")]
    SourceLoad(String),

    /// The drawing surface could not be allocated.
    #[error("Surface error: {0}")]
    Surface(String),

    /// The composited image could not be encoded.
    #[error("Encoding failed: {0}")]
    Encode(String),

    /// Writing the output file failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A text layer could not be rasterized.
    #[error("Text rasterization failed: {0}")]
    TextRaster(String),

    /// An image resource could not be decoded.
    #[error("Failed to load resource: {0}")]
    Resource(String),

    /// A blocking render task panicked or was cancelled.
    #[error("Render task failed: {0}")]
    Task(String),
}

impl RenderError {
    /// Whether this error aborts an export.
    ///
    /// Every variant returned from the export entry point does; this lets
    /// callers show one "export failed" message regardless of the cause.
    #[must_use]
    pub fn is_export_failure(&self) -> bool {
        matches!(
            self,
            Self::SourceLoad(_) | Self::Surface(_) | Self::Encode(_) | Self::Io(_) | Self::Task(_)
        )
    }
}

impl From<tokio::task::JoinError> for RenderError {
    fn from(e: tokio::task::JoinError) -> Self {
        Self::Task(e.to_string())
    }
}
