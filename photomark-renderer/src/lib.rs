//! # Photomark Renderer
//!
//! Text rasterization and full-resolution flattening export on tiny-skia.
//!
//! ## Export Pipeline
//!
//! ```text
//! ┌──────────────┐   resolve    ┌──────────────┐
//! │ ExportRequest│─────────────▶│AssetResolver │  (async, concurrent)
//! └──────┬───────┘              └──────┬───────┘
//!        │                             │ bytes
//!        ▼                             ▼
//! ┌─────────────────────────────────────────────┐
//! │        spawn_blocking: compose              │
//! │  source + color matrix → surface            │
//! │  text → TextRasterizer → layer              │
//! │  images → decode → layer                    │
//! │  draw in list order, encode (JPEG → PNG)    │
//! └──────────────────────┬──────────────────────┘
//!                        ▼
//!               output_dir/photomark-export-<uuid>.<ext>
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod composite;
pub mod error;
pub mod export;
pub mod image;
pub mod resolver;
pub mod text;

pub use composite::{radians_to_degrees, CanvasScale, Layer};
pub use error::{RenderError, RenderResult};
pub use export::{
    ExportFormat, ExportOptions, ExportRequest, ExportResult, PhotoExporter, ATTRIBUTION_INSET,
    ATTRIBUTION_TEXT,
};
pub use image::{decode_image, DecodedImage, ImageFormat};
pub use resolver::{DefaultAssetResolver, ResolverConfig};
pub use text::{RasterizedText, RasterizerConfig, TextMetrics, TextRasterizer};

/// Renderer crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
