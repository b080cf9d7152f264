//! Full-resolution flattening export.
//!
//! [`PhotoExporter`] turns a source photo plus a list of canvas elements into
//! one encoded file. Element geometry is relative to the editing canvas; the
//! output is always the source's native pixel size.
//!
//! I/O (asset resolution, file reads, the final write) is async. Decoding,
//! rasterizing, compositing and encoding run on the blocking pool.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use futures::future::join_all;
use photomark_core::{
    AssetHint, AssetResolver, CanvasElement, Color, ColorMatrix, ElementId, FilterDescriptor,
    PixelSize, Point, ProjectDocument, Size, TextEffect, TextStyle, NO_FILTER,
};
use serde::{Deserialize, Serialize};
use tiny_skia::Pixmap;

use crate::composite::{draw_layers, source_surface, CanvasScale, Layer};
use crate::error::{RenderError, RenderResult};
use crate::image::{decode_image, decoded_to_pixmap, encode_jpeg, encode_png};
use crate::text::TextRasterizer;

/// Attribution drawn when [`ExportOptions::include_watermark`] is set.
pub const ATTRIBUTION_TEXT: &str = "Made with Photomark";

/// Distance in output pixels between the attribution and the image edges.
pub const ATTRIBUTION_INSET: f32 = 24.0;

const ATTRIBUTION_MIN_FONT: f32 = 14.0;
const ATTRIBUTION_FONT_RATIO: f32 = 0.03;

/// Output encoding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Lossless PNG.
    #[default]
    Png,
    /// Lossy JPEG.
    Jpeg,
}

impl ExportFormat {
    /// MIME type of the encoded file.
    #[must_use]
    pub const fn mime_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
        }
    }

    /// File extension without the dot.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
        }
    }

    /// Whether the encoding discards information.
    #[must_use]
    pub const fn is_lossy(self) -> bool {
        matches!(self, Self::Jpeg)
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Png => "png",
            Self::Jpeg => "jpeg",
        })
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "png" | "lossless" => Ok(Self::Png),
            "jpeg" | "jpg" | "lossy" => Ok(Self::Jpeg),
            other => Err(format!("unknown export format '{other}' (expected png or jpeg)")),
        }
    }
}

/// Export configuration.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Requested encoding.
    pub format: ExportFormat,
    /// JPEG quality, 1-100. Ignored for PNG.
    pub quality: u8,
    /// Append the built-in attribution text.
    pub include_watermark: bool,
    /// Editing canvas size the element geometry refers to.
    pub canvas_size: Option<Size>,
    /// Directory the output file is written to.
    pub output_dir: PathBuf,
    /// Flattening color for lossy output.
    pub background: Color,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            format: ExportFormat::Png,
            quality: 90,
            include_watermark: false,
            canvas_size: None,
            output_dir: std::env::temp_dir(),
            background: Color::WHITE,
        }
    }
}

/// Everything one export needs.
#[derive(Debug, Clone)]
pub struct ExportRequest {
    /// Source photo reference, resolved with [`AssetHint::Source`].
    pub source: String,
    /// Native size of the source; also the output size.
    pub source_dimensions: PixelSize,
    /// Layers in z-order, bottom first.
    pub elements: Vec<CanvasElement>,
    /// Encoding and placement options.
    pub options: ExportOptions,
    /// Optional color filter for the source photo.
    pub filter: Option<FilterDescriptor>,
}

impl ExportRequest {
    /// Build a request from a stored project.
    ///
    /// The project's canvas size is used unless `options` already has one.
    #[must_use]
    pub fn from_project(
        document: &ProjectDocument,
        mut options: ExportOptions,
        filter: Option<FilterDescriptor>,
    ) -> Self {
        if options.canvas_size.is_none() {
            options.canvas_size = document.canvas_size;
        }
        Self {
            source: document.source_image_path.clone(),
            source_dimensions: document.source_dimensions,
            elements: document.elements.clone(),
            options,
            filter,
        }
    }
}

/// A written export.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportResult {
    /// Path of the fresh output file.
    pub file_path: PathBuf,
    /// Encoding actually used.
    pub format: ExportFormat,
    /// MIME type of `format`.
    pub mime_type: String,
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Layers that could not be drawn.
    pub skipped: usize,
}

/// An overlay after the async fetch phase.
enum Overlay {
    Text(CanvasElement),
    Asset(CanvasElement, Vec<u8>),
    Missing(ElementId),
}

struct Composed {
    bytes: Vec<u8>,
    format: ExportFormat,
    skipped: usize,
}

/// Flattens projects into image files.
pub struct PhotoExporter {
    resolver: Arc<dyn AssetResolver>,
    rasterizer: Arc<TextRasterizer>,
}

impl fmt::Debug for PhotoExporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PhotoExporter")
            .field("rasterizer", &self.rasterizer)
            .finish_non_exhaustive()
    }
}

impl PhotoExporter {
    /// Create an exporter.
    #[must_use]
    pub fn new(resolver: Arc<dyn AssetResolver>, rasterizer: Arc<TextRasterizer>) -> Self {
        Self {
            resolver,
            rasterizer,
        }
    }

    /// Flatten `request` into a new file under its output directory.
    ///
    /// Overlays that cannot be resolved, decoded or rasterized are skipped
    /// and counted in [`ExportResult::skipped`].
    ///
    /// # Errors
    ///
    /// - [`RenderError::SourceLoad`] if the source cannot be resolved, read
    ///   or decoded.
    /// - [`RenderError::Surface`] if the output surface cannot be allocated.
    /// - [`RenderError::Encode`] if encoding fails with no fallback.
    /// - [`RenderError::Io`] if the file cannot be written.
    #[tracing::instrument(
        skip(self, request),
        fields(source = %request.source, elements = request.elements.len())
    )]
    pub async fn export(&self, request: &ExportRequest) -> RenderResult<ExportResult> {
        let dims = request.source_dimensions;
        if dims.width == 0 || dims.height == 0 {
            return Err(RenderError::Surface(format!(
                "Source dimensions {}x{} are empty",
                dims.width, dims.height
            )));
        }

        let source_path = self
            .resolver
            .resolve(&request.source, AssetHint::Source)
            .await
            .ok_or_else(|| {
                RenderError::SourceLoad(format!("Cannot resolve '{}'", request.source))
            })?;
        let source_bytes = tokio::fs::read(&source_path)
            .await
            .map_err(|e| RenderError::SourceLoad(format!("{}: {e}", source_path.display())))?;
        tracing::info!(
            "Loaded source {} ({} bytes)",
            source_path.display(),
            source_bytes.len()
        );

        let overlays = join_all(request.elements.iter().map(|e| self.fetch_overlay(e))).await;
        let matrix = active_matrix(request.filter.as_ref());
        let scale = CanvasScale::between(dims, request.options.canvas_size);
        let options = request.options.clone();
        let rasterizer = Arc::clone(&self.rasterizer);

        let composed = tokio::task::spawn_blocking(move || {
            compose(
                &rasterizer,
                &source_bytes,
                dims,
                matrix.as_ref(),
                overlays,
                scale,
                &options,
            )
        })
        .await??;
        tracing::info!(
            "Composited {}x{} {} ({} skipped)",
            dims.width,
            dims.height,
            composed.format,
            composed.skipped
        );

        let output_dir = &request.options.output_dir;
        tokio::fs::create_dir_all(output_dir).await?;
        let file_path = output_dir.join(format!(
            "photomark-export-{}.{}",
            uuid::Uuid::new_v4(),
            composed.format.extension()
        ));
        tokio::fs::write(&file_path, &composed.bytes).await?;
        tracing::info!("Wrote {}", file_path.display());

        Ok(ExportResult {
            file_path,
            format: composed.format,
            mime_type: composed.format.mime_type().to_string(),
            width: dims.width,
            height: dims.height,
            skipped: composed.skipped,
        })
    }

    async fn fetch_overlay(&self, element: &CanvasElement) -> Overlay {
        if element.is_text_bearing() {
            return Overlay::Text(element.clone());
        }
        let Some(asset) = element.asset() else {
            return Overlay::Missing(element.id);
        };
        let Some(path) = self.resolver.resolve(asset, AssetHint::Overlay).await else {
            tracing::warn!(
                "Skipping {} {}: unresolved asset",
                element.kind.type_name(),
                element.id
            );
            return Overlay::Missing(element.id);
        };
        match tokio::fs::read(&path).await {
            Ok(bytes) => Overlay::Asset(element.clone(), bytes),
            Err(e) => {
                tracing::warn!("Skipping {}: cannot read {}: {e}", element.id, path.display());
                Overlay::Missing(element.id)
            }
        }
    }
}

fn active_matrix(filter: Option<&FilterDescriptor>) -> Option<ColorMatrix> {
    let filter = filter?;
    let matrix = filter.matrix();
    if matrix.is_none() && filter.id != NO_FILTER {
        tracing::warn!("Unknown filter '{}'; exporting unfiltered", filter.id);
    }
    matrix
}

fn compose(
    rasterizer: &TextRasterizer,
    source_bytes: &[u8],
    dims: PixelSize,
    matrix: Option<&ColorMatrix>,
    overlays: Vec<Overlay>,
    scale: CanvasScale,
    options: &ExportOptions,
) -> RenderResult<Composed> {
    let source = decode_image(source_bytes).map_err(|e| RenderError::SourceLoad(e.to_string()))?;
    let mut surface = source_surface(source, dims, matrix)?;

    let mut skipped = 0;
    let mut layers = Vec::with_capacity(overlays.len() + 1);
    for overlay in overlays {
        let layer = match overlay {
            Overlay::Text(element) => text_layer(rasterizer, &element, scale).map_err(|e| {
                tracing::warn!("Skipping text {}: {e}", element.id);
            }),
            Overlay::Asset(element, bytes) => decode_image(&bytes)
                .and_then(decoded_to_pixmap)
                .map(|pixmap| Layer::from_element(&element, pixmap))
                .map_err(|e| {
                    tracing::warn!("Skipping {}: {e}", element.id);
                }),
            Overlay::Missing(id) => {
                tracing::debug!("No drawable content for {id}");
                Err(())
            }
        };
        match layer {
            Ok(layer) => layers.push(layer),
            Err(()) => skipped += 1,
        }
    }

    if options.include_watermark {
        match attribution_layer(rasterizer, dims, scale) {
            Ok(layer) => layers.push(layer),
            Err(e) => {
                tracing::warn!("Attribution not drawn: {e}");
                skipped += 1;
            }
        }
    }

    draw_layers(&mut surface, &layers, scale);
    let (bytes, format) = encode(&surface, options)?;
    Ok(Composed {
        bytes,
        format,
        skipped,
    })
}

/// Rasterize at output resolution so text stays sharp on large photos.
fn text_layer(
    rasterizer: &TextRasterizer,
    element: &CanvasElement,
    scale: CanvasScale,
) -> RenderResult<Layer> {
    let resolution = scale.x.max(scale.y);
    let tile = rasterizer.rasterize_element(element, resolution)?;
    #[allow(clippy::cast_precision_loss)]
    let (tw, th) = (tile.width() as f32, tile.height() as f32);
    Ok(Layer {
        image: tile.into_pixmap(),
        position: element.position,
        width: tw / resolution,
        height: th / resolution,
        scale: 1.0,
        rotation: element.rotation,
        opacity: element.opacity,
    })
}

/// Bottom-right attribution, sized from the output surface.
fn attribution_layer(
    rasterizer: &TextRasterizer,
    dims: PixelSize,
    scale: CanvasScale,
) -> RenderResult<Layer> {
    #[allow(clippy::cast_precision_loss)]
    let (w, h) = (dims.width as f32, dims.height as f32);
    let font_size = (w.min(h) * ATTRIBUTION_FONT_RATIO).max(ATTRIBUTION_MIN_FONT);
    let style = TextStyle::new(ATTRIBUTION_TEXT, font_size)
        .with_color(Color::WHITE)
        .with_effect(TextEffect::Shadow);
    let tile = rasterizer.rasterize(&style, 1.0)?;

    #[allow(clippy::cast_precision_loss)]
    let (tw, th) = (tile.width() as f32, tile.height() as f32);
    Ok(Layer {
        image: tile.into_pixmap(),
        position: Point::new(
            (w - tw - ATTRIBUTION_INSET) / scale.x,
            (h - th - ATTRIBUTION_INSET) / scale.y,
        ),
        width: tw / scale.x,
        height: th / scale.y,
        scale: 1.0,
        rotation: 0.0,
        opacity: 1.0,
    })
}

/// Encode, falling back to PNG when lossy encoding fails.
fn encode(surface: &Pixmap, options: &ExportOptions) -> RenderResult<(Vec<u8>, ExportFormat)> {
    match options.format {
        ExportFormat::Png => Ok((encode_png(surface)?, ExportFormat::Png)),
        ExportFormat::Jpeg => match encode_jpeg(surface, options.quality, options.background) {
            Ok(bytes) => Ok((bytes, ExportFormat::Jpeg)),
            Err(e) => {
                tracing::warn!("{e}; falling back to PNG");
                Ok((encode_png(surface)?, ExportFormat::Png))
            }
        },
    }
}
