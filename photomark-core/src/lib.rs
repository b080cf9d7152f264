//! # Photomark Core
//!
//! Editing model for photo annotation: layers, undo/redo, color filters, and
//! the boundaries the renderer and hosts plug into.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │               photomark-core                │
//! ├─────────────────────────────────────────────┤
//! │  Scene Engine    │  Color Matrix            │
//! │  - Elements      │  - Filter table          │
//! │  - Selection     │  - Intensity blend       │
//! │  - Undo / redo   │                          │
//! ├─────────────────────────────────────────────┤
//! │  Projects        │  Assets                  │
//! │  - Documents     │  - Reference parsing     │
//! │  - Stores        │  - Resolver trait        │
//! │  - Sessions      │                          │
//! └─────────────────────────────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod asset;
pub mod color_matrix;
pub mod element;
pub mod error;
pub mod history;
pub mod patch;
pub mod project;
pub mod scene;
pub mod session;
pub mod store;

pub use asset::{AssetHint, AssetReference, AssetResolver};
pub use color_matrix::{available_filters, color_matrix, ColorMatrix, FilterDescriptor, NO_FILTER};
pub use element::{
    clamp_interactive_scale, CanvasElement, Color, ElementId, ElementKind, PixelSize, Point, Size,
    TextEffect, TextStyle, WatermarkSource, MAX_INTERACTIVE_SCALE, MIN_INTERACTIVE_SCALE,
};
pub use error::{CoreError, CoreResult};
pub use history::{History, HistoryEntry};
pub use patch::ElementPatch;
pub use project::ProjectDocument;
pub use scene::SceneEngine;
pub use session::EditorSession;
pub use store::{JsonFileProjectStore, MemoryProjectStore, ProjectStore, StoreError};

/// Photomark core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
