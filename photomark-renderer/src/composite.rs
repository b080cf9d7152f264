//! Flattening layers onto the source photo.
//!
//! Element geometry lives in editing-canvas pixels. The output surface is the
//! source photo at native resolution, so every position and size is multiplied
//! by the per-axis canvas→source scale before drawing.

use photomark_core::{CanvasElement, ColorMatrix, PixelSize, Point, Size};
use tiny_skia::{FilterQuality, Pixmap, PixmapPaint, Transform};

use crate::error::{RenderError, RenderResult};
use crate::image::{rgba_to_pixmap, DecodedImage};

/// Per-axis factor from editing-canvas pixels to source pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasScale {
    /// Horizontal factor.
    pub x: f32,
    /// Vertical factor.
    pub y: f32,
}

impl CanvasScale {
    /// Identity mapping.
    pub const ONE: Self = Self { x: 1.0, y: 1.0 };

    /// `source / canvas` per axis.
    ///
    /// A missing or degenerate canvas size falls back to 1:1 with a warning.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn between(source: PixelSize, canvas: Option<Size>) -> Self {
        match canvas {
            Some(canvas) if canvas.is_usable() => Self {
                x: source.width as f32 / canvas.width,
                y: source.height as f32 / canvas.height,
            },
            Some(canvas) => {
                tracing::warn!(
                    "Unusable canvas size {}x{}; exporting at 1:1",
                    canvas.width,
                    canvas.height
                );
                Self::ONE
            }
            None => {
                tracing::warn!("No canvas size recorded; exporting at 1:1");
                Self::ONE
            }
        }
    }
}

/// An image-backed layer ready to draw.
#[derive(Debug, Clone)]
pub struct Layer {
    /// Premultiplied pixels.
    pub image: Pixmap,
    /// Top-left in canvas pixels.
    pub position: Point,
    /// Intrinsic size in canvas pixels.
    pub width: f32,
    /// Intrinsic size in canvas pixels.
    pub height: f32,
    /// Uniform scale.
    pub scale: f32,
    /// Clockwise rotation in radians.
    pub rotation: f32,
    /// Uniform alpha.
    pub opacity: f32,
}

impl Layer {
    /// Pair an element's geometry with its decoded pixels.
    ///
    /// A non-positive intrinsic size falls back to the image's pixel size.
    #[must_use]
    pub fn from_element(element: &CanvasElement, image: Pixmap) -> Self {
        #[allow(clippy::cast_precision_loss)]
        let (iw, ih) = (image.width() as f32, image.height() as f32);
        let (width, height) = if element.width > 0.0 && element.height > 0.0 {
            (element.width, element.height)
        } else {
            (iw, ih)
        };
        Self {
            image,
            position: element.position,
            width,
            height,
            scale: element.scale,
            rotation: element.rotation,
            opacity: element.opacity,
        }
    }

    /// Device transform for this layer.
    ///
    /// Rotation pivots around the center of the scaled box; the image is
    /// stretched to fill that box.
    #[must_use]
    pub fn transform(&self, scale: CanvasScale) -> Transform {
        let dw = self.width * self.scale * scale.x;
        let dh = self.height * self.scale * scale.y;
        let left = self.position.x * scale.x;
        let top = self.position.y * scale.y;

        #[allow(clippy::cast_precision_loss)]
        let (iw, ih) = (self.image.width() as f32, self.image.height() as f32);

        Transform::from_translate(left + dw / 2.0, top + dh / 2.0)
            .pre_concat(Transform::from_rotate(radians_to_degrees(self.rotation)))
            .pre_translate(-dw / 2.0, -dh / 2.0)
            .pre_scale(dw / iw, dh / ih)
    }
}

/// Convert radians to the degrees tiny-skia rotates by.
#[must_use]
pub fn radians_to_degrees(radians: f32) -> f32 {
    radians.to_degrees()
}

/// Build the output surface: the source stretched to `size`, color-filtered
/// if a matrix is given.
///
/// # Errors
///
/// Returns [`RenderError::Surface`] if the surface cannot be allocated and
/// [`RenderError::SourceLoad`] if the decoded source is empty.
pub fn source_surface(
    mut source: DecodedImage,
    size: PixelSize,
    matrix: Option<&ColorMatrix>,
) -> RenderResult<Pixmap> {
    let mut surface = Pixmap::new(size.width, size.height).ok_or_else(|| {
        RenderError::Surface(format!(
            "Cannot allocate {}x{} surface",
            size.width, size.height
        ))
    })?;

    if let Some(matrix) = matrix {
        matrix.apply_rgba8(&mut source.data);
    }
    let (sw, sh) = (source.width, source.height);
    let source = rgba_to_pixmap(sw, sh, source.data)
        .map_err(|e| RenderError::SourceLoad(e.to_string()))?;

    #[allow(clippy::cast_precision_loss)]
    let stretch = Transform::from_scale(
        size.width as f32 / sw as f32,
        size.height as f32 / sh as f32,
    );
    surface.draw_pixmap(0, 0, source.as_ref(), &bilinear(1.0), stretch, None);
    Ok(surface)
}

/// Draw layers in order; later layers land on top.
pub fn draw_layers<'a>(
    surface: &mut Pixmap,
    layers: impl IntoIterator<Item = &'a Layer>,
    scale: CanvasScale,
) {
    for layer in layers {
        draw_layer(surface, layer, scale);
    }
}

/// Draw one layer.
pub fn draw_layer(surface: &mut Pixmap, layer: &Layer, scale: CanvasScale) {
    let opacity = layer.opacity.clamp(0.0, 1.0);
    if opacity <= 0.0 || layer.width <= 0.0 || layer.height <= 0.0 || layer.scale <= 0.0 {
        return;
    }
    surface.draw_pixmap(
        0,
        0,
        layer.image.as_ref(),
        &bilinear(opacity),
        layer.transform(scale),
        None,
    );
}

fn bilinear(opacity: f32) -> PixmapPaint {
    PixmapPaint {
        opacity,
        blend_mode: tiny_skia::BlendMode::SourceOver,
        quality: FilterQuality::Bilinear,
    }
}
