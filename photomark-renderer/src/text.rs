//! Text layer rasterization.
//!
//! A text layer is laid out as an SVG `<text>` node with usvg, measured from
//! the resulting layout, and rendered with resvg into a transparent tile that
//! is exactly as large as the text plus padding. Effects are SVG filters drawn
//! underneath the crisp fill.
//!
//! ```text
//! ┌──────────── tile ────────────┐
//! │  pad_x                       │ pad_y
//! │      ┌── measured ink ──┐    │
//! │      │ baseline @ ascent│    │
//! │      └──────────────────┘    │
//! └──────────────────────────────┘
//! ```

use std::fmt::Write;
use std::path::Path;
use std::sync::Arc;

use photomark_core::{CanvasElement, Color, TextEffect, TextStyle};
use tiny_skia::Pixmap;
use usvg::fontdb;

use crate::error::{RenderError, RenderResult};
use crate::image::{encode_png, pixmap_to_rgba};

/// Horizontal padding as a fraction of the font size.
const PAD_X_RATIO: f32 = 0.25;
/// Minimum horizontal padding in pixels.
const PAD_X_MIN: f32 = 8.0;
/// Vertical padding as a fraction of the font size.
const PAD_Y_RATIO: f32 = 0.2;
/// Minimum vertical padding in pixels.
const PAD_Y_MIN: f32 = 6.0;
/// Background corner radius as a fraction of the font size.
const CORNER_RATIO: f32 = 0.25;

/// Rasterizer configuration.
#[derive(Debug, Clone)]
pub struct RasterizerConfig {
    /// Load fonts installed on the system.
    pub load_system_fonts: bool,
    /// Extra directories to load fonts from.
    pub font_dirs: Vec<std::path::PathBuf>,
}

impl Default for RasterizerConfig {
    fn default() -> Self {
        Self {
            load_system_fonts: true,
            font_dirs: Vec::new(),
        }
    }
}

/// Measured text extent in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextMetrics {
    /// Ink width.
    pub width: f32,
    /// Ink height.
    pub height: f32,
    /// Distance from the top of the ink box to the baseline.
    pub ascent: f32,
    /// Horizontal offset of the ink box from the pen origin.
    pub left_bearing: f32,
    /// Whether a real font produced the measurement.
    pub shaped: bool,
}

/// A rendered text tile.
#[derive(Debug, Clone)]
pub struct RasterizedText {
    pixmap: Pixmap,
    metrics: TextMetrics,
}

impl RasterizedText {
    /// Tile width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    /// Tile height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    /// Measurements the tile was sized from.
    #[must_use]
    pub fn metrics(&self) -> TextMetrics {
        self.metrics
    }

    /// The premultiplied surface.
    #[must_use]
    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    /// Consume into the premultiplied surface.
    #[must_use]
    pub fn into_pixmap(self) -> Pixmap {
        self.pixmap
    }

    /// Straight-alpha RGBA copy of the tile.
    #[must_use]
    pub fn to_rgba(&self) -> Vec<u8> {
        pixmap_to_rgba(&self.pixmap)
    }

    /// Encode the tile as PNG.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Encode`] if encoding fails.
    pub fn encode_png(&self) -> RenderResult<Vec<u8>> {
        encode_png(&self.pixmap)
    }
}

/// Renders text layers into standalone tiles.
///
/// The font database is loaded once and shared; cloning the rasterizer is
/// cheap.
#[derive(Clone)]
pub struct TextRasterizer {
    fontdb: Arc<fontdb::Database>,
}

impl std::fmt::Debug for TextRasterizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextRasterizer")
            .field("faces", &self.fontdb.len())
            .finish()
    }
}

impl Default for TextRasterizer {
    fn default() -> Self {
        Self::new(&RasterizerConfig::default())
    }
}

impl TextRasterizer {
    /// Build a rasterizer, loading fonts as configured.
    #[must_use]
    pub fn new(config: &RasterizerConfig) -> Self {
        let mut db = fontdb::Database::new();
        if config.load_system_fonts {
            db.load_system_fonts();
        }
        for dir in &config.font_dirs {
            db.load_fonts_dir(dir);
        }
        bind_generic_families(&mut db);
        tracing::debug!("Text rasterizer loaded {} font faces", db.len());
        Self::with_database(Arc::new(db))
    }

    /// Build a rasterizer over an existing font database.
    #[must_use]
    pub fn with_database(fontdb: Arc<fontdb::Database>) -> Self {
        Self { fontdb }
    }

    /// Number of loaded font faces.
    #[must_use]
    pub fn font_count(&self) -> usize {
        self.fontdb.len()
    }

    /// Measure `style` without rendering.
    ///
    /// Falls back to a width estimate of `0.6·size` per character and a line
    /// height of `1.2·size` when no font can shape the text.
    #[must_use]
    pub fn measure(&self, style: &TextStyle) -> TextMetrics {
        let size = style.font_size;
        let svg = format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"1\" height=\"1\">{}</svg>",
            text_node(style, 0.0, 0.0, &svg_paint("fill", style.color))
        );
        let measured = usvg::Tree::from_str(&svg, &self.options())
            .ok()
            .and_then(|tree| first_text_bbox(tree.root()))
            .filter(|r| r.width() > 0.0 && r.height() > 0.0);

        match measured {
            Some(rect) => TextMetrics {
                width: rect.width(),
                height: rect.height(),
                ascent: -rect.y(),
                left_bearing: rect.x(),
                shaped: true,
            },
            None => {
                if !style.content.trim().is_empty() {
                    tracing::warn!(
                        "No font could shape text in family '{}'; using estimated metrics",
                        style.font_family
                    );
                }
                #[allow(clippy::cast_precision_loss)]
                let chars = style.content.chars().count() as f32;
                TextMetrics {
                    width: (chars * 0.6 * size).max(1.0),
                    height: 1.2 * size,
                    ascent: 0.8 * size,
                    left_bearing: 0.0,
                    shaped: false,
                }
            }
        }
    }

    /// Render `style` into a tile, multiplying the whole tile by `opacity`.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::TextRaster`] if the font size is not positive
    /// or the tile cannot be allocated.
    pub fn rasterize(&self, style: &TextStyle, opacity: f32) -> RenderResult<RasterizedText> {
        let size = style.font_size;
        if !(size.is_finite() && size > 0.0) {
            return Err(RenderError::TextRaster(format!("Invalid font size {size}")));
        }
        let metrics = self.measure(style);
        let (pad_x, pad_y) = padding(size);
        let tile_w = (metrics.width + 2.0 * pad_x).ceil();
        let tile_h = (metrics.height + 2.0 * pad_y).ceil();

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let (px_w, px_h) = (tile_w as u32, tile_h as u32);
        let mut pixmap = Pixmap::new(px_w.max(1), px_h.max(1)).ok_or_else(|| {
            RenderError::TextRaster(format!("Cannot allocate {px_w}x{px_h} text tile"))
        })?;

        let svg = tile_svg(style, &metrics, tile_w, tile_h, opacity);
        let tree = usvg::Tree::from_str(&svg, &self.options())
            .map_err(|e| RenderError::TextRaster(format!("SVG parsing failed: {e}")))?;
        resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());

        Ok(RasterizedText { pixmap, metrics })
    }

    /// Render a text-bearing element at `resolution` pixels per canvas pixel.
    ///
    /// The element's own scale is folded into the font size. Opacity is left
    /// to the compositor.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::TextRaster`] if the element carries no text or
    /// rendering fails.
    pub fn rasterize_element(
        &self,
        element: &CanvasElement,
        resolution: f32,
    ) -> RenderResult<RasterizedText> {
        let style = element.text_style().ok_or_else(|| {
            RenderError::TextRaster(format!("Element {} has no text", element.id))
        })?;
        let mut scaled = style.clone();
        scaled.font_size = style.font_size * element.scale * resolution;
        self.rasterize(&scaled, 1.0)
    }

    /// Convert a text-bearing element into an image-backed one.
    ///
    /// The tile is written as PNG into `dir`. The returned element keeps the
    /// id, position, rotation and opacity, takes the tile's pixel size, and
    /// has scale 1.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::TextRaster`] for elements without text and
    /// [`RenderError::Io`] if the tile cannot be written.
    pub fn rasterize_element_to_file(
        &self,
        element: &CanvasElement,
        dir: &Path,
    ) -> RenderResult<CanvasElement> {
        let tile = self.rasterize_element(element, 1.0)?;
        std::fs::create_dir_all(dir)?;
        let path = dir.join(format!("photomark-text-{}.png", uuid::Uuid::new_v4()));
        std::fs::write(&path, tile.encode_png()?)?;

        #[allow(clippy::cast_precision_loss)]
        let (width, height) = (tile.width() as f32, tile.height() as f32);
        Ok(
            CanvasElement::image_watermark(path.to_string_lossy(), width, height)
                .with_id(element.id)
                .with_position(element.position.x, element.position.y)
                .with_rotation(element.rotation)
                .with_opacity(element.opacity),
        )
    }

    fn options(&self) -> usvg::Options<'static> {
        usvg::Options {
            fontdb: Arc::clone(&self.fontdb),
            font_resolver: font_resolver(),
            ..usvg::Options::default()
        }
    }
}

/// Preferred faces for the generic families, common Linux faces first.
const SANS_SERIF_FACES: &[&str] = &[
    "DejaVu Sans",
    "Liberation Sans",
    "Noto Sans",
    "Arial",
    "Helvetica",
];
const SERIF_FACES: &[&str] = &[
    "DejaVu Serif",
    "Liberation Serif",
    "Noto Serif",
    "Times New Roman",
    "Times",
];
const MONOSPACE_FACES: &[&str] = &[
    "DejaVu Sans Mono",
    "Liberation Mono",
    "Noto Sans Mono",
    "Courier New",
    "Courier",
];

/// Point `sans-serif`, `serif` and `monospace` at faces that are actually
/// loaded. fontdb defaults them to Arial/Times/Courier whether or not those
/// exist.
fn bind_generic_families(db: &mut fontdb::Database) {
    let loaded: Vec<String> = db
        .faces()
        .filter_map(|face| face.families.first().map(|(name, _)| name.clone()))
        .collect();
    let Some(first) = loaded.first().cloned() else {
        return;
    };
    let pick = |preferred: &[&str]| {
        preferred
            .iter()
            .find(|name| loaded.iter().any(|l| l == *name))
            .map_or_else(|| first.clone(), |name| (*name).to_string())
    };

    let sans = pick(SANS_SERIF_FACES);
    let serif = pick(SERIF_FACES);
    let mono = pick(MONOSPACE_FACES);
    tracing::debug!("Generic families: sans-serif={sans}, serif={serif}, monospace={mono}");
    db.set_sans_serif_family(sans);
    db.set_serif_family(serif);
    db.set_monospace_family(mono);
}

/// Font selection that falls back to the generic families and then to any
/// loaded face, so unknown family names still draw glyphs.
fn font_resolver() -> usvg::FontResolver<'static> {
    usvg::FontResolver {
        select_font: Box::new(|font, fontdb| {
            let mut families: Vec<fontdb::Family<'_>> = font
                .families()
                .iter()
                .map(|family| match family {
                    usvg::FontFamily::Serif => fontdb::Family::Serif,
                    usvg::FontFamily::SansSerif => fontdb::Family::SansSerif,
                    usvg::FontFamily::Cursive => fontdb::Family::Cursive,
                    usvg::FontFamily::Fantasy => fontdb::Family::Fantasy,
                    usvg::FontFamily::Monospace => fontdb::Family::Monospace,
                    usvg::FontFamily::Named(name) => fontdb::Family::Name(name),
                })
                .collect();
            families.extend([
                fontdb::Family::SansSerif,
                fontdb::Family::Serif,
                fontdb::Family::Monospace,
            ]);

            let stretch = match font.stretch() {
                usvg::FontStretch::UltraCondensed => fontdb::Stretch::UltraCondensed,
                usvg::FontStretch::ExtraCondensed => fontdb::Stretch::ExtraCondensed,
                usvg::FontStretch::Condensed => fontdb::Stretch::Condensed,
                usvg::FontStretch::SemiCondensed => fontdb::Stretch::SemiCondensed,
                usvg::FontStretch::Normal => fontdb::Stretch::Normal,
                usvg::FontStretch::SemiExpanded => fontdb::Stretch::SemiExpanded,
                usvg::FontStretch::Expanded => fontdb::Stretch::Expanded,
                usvg::FontStretch::ExtraExpanded => fontdb::Stretch::ExtraExpanded,
                usvg::FontStretch::UltraExpanded => fontdb::Stretch::UltraExpanded,
            };
            let style = match font.style() {
                usvg::FontStyle::Normal => fontdb::Style::Normal,
                usvg::FontStyle::Italic => fontdb::Style::Italic,
                usvg::FontStyle::Oblique => fontdb::Style::Oblique,
            };
            let query = fontdb::Query {
                families: &families,
                weight: fontdb::Weight(font.weight()),
                stretch,
                style,
            };

            fontdb
                .query(&query)
                .or_else(|| fontdb.faces().next().map(|face| face.id))
        }),
        select_fallback: usvg::FontResolver::default_fallback_selector(),
    }
}

/// Tile padding `(horizontal, vertical)` for a font size.
#[must_use]
pub fn padding(font_size: f32) -> (f32, f32) {
    (
        (PAD_X_RATIO * font_size).max(PAD_X_MIN),
        (PAD_Y_RATIO * font_size).max(PAD_Y_MIN),
    )
}

fn first_text_bbox(group: &usvg::Group) -> Option<usvg::Rect> {
    group.children().iter().find_map(|node| match node {
        usvg::Node::Text(text) => Some(text.abs_bounding_box()),
        usvg::Node::Group(inner) => first_text_bbox(inner),
        _ => None,
    })
}

fn tile_svg(style: &TextStyle, metrics: &TextMetrics, w: f32, h: f32, opacity: f32) -> String {
    let size = style.font_size;
    let (pad_x, pad_y) = padding(size);
    let x = pad_x - metrics.left_bearing;
    let y = pad_y + metrics.ascent;
    let fill = svg_paint("fill", style.color);

    let mut svg = String::with_capacity(1024);
    let _ = write!(
        svg,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">",
    );
    svg.push_str(&effect_filters(style.effect, size));
    let _ = write!(svg, "<g opacity=\"{}\">", opacity.clamp(0.0, 1.0));

    if let Some(bg) = style.background {
        let radius = CORNER_RATIO * size;
        let _ = write!(
            svg,
            "<rect width=\"{w}\" height=\"{h}\" rx=\"{radius}\" ry=\"{radius}\" {}/>",
            svg_paint("fill", bg)
        );
    }

    match style.effect {
        TextEffect::None => {}
        TextEffect::Shadow => {
            let offset = 0.06 * size;
            svg.push_str(&text_node(
                style,
                x + offset,
                y + offset,
                "fill=\"#000000\" fill-opacity=\"0.6\" filter=\"url(#pm-shadow)\"",
            ));
        }
        TextEffect::Glow => {
            svg.push_str(&text_node(
                style,
                x,
                y,
                &format!("{fill} filter=\"url(#pm-glow)\""),
            ));
        }
        TextEffect::Neon => {
            svg.push_str(&text_node(
                style,
                x,
                y,
                &format!("{fill} filter=\"url(#pm-neon-wide)\""),
            ));
            svg.push_str(&text_node(
                style,
                x,
                y,
                &format!("{fill} filter=\"url(#pm-neon-tight)\""),
            ));
        }
        TextEffect::Outline => {
            // Half of the stroke is covered by the fill pass.
            let width = (0.08 * size).max(1.0);
            let contrast = contrasting(style.color);
            svg.push_str(&text_node(
                style,
                x,
                y,
                &format!(
                    "fill=\"none\" {} stroke-width=\"{}\" stroke-linejoin=\"round\"",
                    svg_paint("stroke", contrast),
                    width * 2.0
                ),
            ));
        }
    }

    svg.push_str(&text_node(style, x, y, &svg_paint("fill", style.color)));
    svg.push_str("</g></svg>");
    svg
}

fn effect_filters(effect: TextEffect, size: f32) -> String {
    let blur = |id: &str, std_dev: f32| {
        format!(
            "<filter id=\"{id}\" x=\"-100%\" y=\"-100%\" width=\"300%\" height=\"300%\"><feGaussianBlur stdDeviation=\"{std_dev}\"/></filter>"
        )
    };
    let filters = match effect {
        TextEffect::None | TextEffect::Outline => return String::new(),
        TextEffect::Shadow => blur("pm-shadow", 0.08 * size),
        TextEffect::Glow => blur("pm-glow", 0.15 * size),
        TextEffect::Neon => blur("pm-neon-wide", 0.3 * size) + &blur("pm-neon-tight", 0.12 * size),
    };
    format!("<defs>{filters}</defs>")
}

fn text_node(style: &TextStyle, x: f32, y: f32, paint: &str) -> String {
    format!(
        "<text x=\"{x}\" y=\"{y}\" font-family=\"{}\" font-size=\"{}\" xml:space=\"preserve\" {paint}>{}</text>",
        escape_xml(&style.font_family),
        style.font_size,
        escape_xml(&style.content),
    )
}

fn svg_paint(attr: &str, color: Color) -> String {
    format!(
        "{attr}=\"#{:02X}{:02X}{:02X}\" {attr}-opacity=\"{}\"",
        color.r,
        color.g,
        color.b,
        color.alpha_fraction()
    )
}

/// Black for light colors, white for dark ones.
fn contrasting(color: Color) -> Color {
    if color.luminance() > 0.5 {
        Color::BLACK
    } else {
        Color::WHITE
    }
}

/// Escape special XML characters.
fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_rasterizer() -> TextRasterizer {
        TextRasterizer::with_database(Arc::new(fontdb::Database::new()))
    }

    #[test]
    fn test_padding_minimums() {
        assert_eq!(padding(10.0), (8.0, 6.0));
        assert_eq!(padding(100.0), (25.0, 20.0));
    }

    #[test]
    fn test_fallback_metrics_without_fonts() {
        let metrics = empty_rasterizer().measure(&TextStyle::new("Hello", 20.0));
        assert!(!metrics.shaped);
        assert!((metrics.width - 60.0).abs() < 1e-3);
        assert!((metrics.height - 24.0).abs() < 1e-3);
    }

    #[test]
    fn test_tile_is_measured_size_plus_padding() {
        let rasterizer = empty_rasterizer();
        let style = TextStyle::new("Hi", 40.0);
        let tile = rasterizer.rasterize(&style, 1.0).expect("rasterize");
        let m = tile.metrics();
        let (pad_x, pad_y) = padding(40.0);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let expected = (
            (m.width + 2.0 * pad_x).ceil() as u32,
            (m.height + 2.0 * pad_y).ceil() as u32,
        );
        assert_eq!((tile.width(), tile.height()), expected);
    }

    #[test]
    fn test_background_fills_tile_center() {
        let style = TextStyle::new("  ", 30.0).with_background(Some(Color::rgb(0, 0, 255)));
        let tile = empty_rasterizer().rasterize(&style, 1.0).expect("rasterize");
        let rgba = tile.to_rgba();
        let (w, h) = (tile.width() as usize, tile.height() as usize);
        let center = ((h / 2) * w + w / 2) * 4;
        assert_eq!(&rgba[center..center + 4], &[0, 0, 255, 255]);
        // Rounded corner stays transparent.
        assert_eq!(rgba[3], 0);
    }

    #[test]
    fn test_opacity_scales_tile_alpha() {
        let style = TextStyle::new(" ", 30.0).with_background(Some(Color::WHITE));
        let tile = empty_rasterizer().rasterize(&style, 0.5).expect("rasterize");
        let rgba = tile.to_rgba();
        let (w, h) = (tile.width() as usize, tile.height() as usize);
        let center = ((h / 2) * w + w / 2) * 4;
        assert!(rgba[center + 3].abs_diff(128) <= 2);
    }

    #[test]
    fn test_invalid_font_size() {
        let style = TextStyle::new("x", 0.0);
        assert!(matches!(
            empty_rasterizer().rasterize(&style, 1.0),
            Err(RenderError::TextRaster(_))
        ));
    }

    #[test]
    fn test_effects_produce_valid_svg() {
        let rasterizer = empty_rasterizer();
        for effect in [
            TextEffect::None,
            TextEffect::Shadow,
            TextEffect::Glow,
            TextEffect::Neon,
            TextEffect::Outline,
        ] {
            let style = TextStyle::new("A <&> B", 24.0).with_effect(effect);
            assert!(rasterizer.rasterize(&style, 1.0).is_ok(), "{effect:?}");
        }
    }

    #[test]
    fn test_element_to_file_resets_scale() {
        let dir = tempfile::tempdir().expect("tempdir");
        let element = CanvasElement::text(TextStyle::new("Hi", 20.0))
            .with_position(12.0, 34.0)
            .with_scale(2.0)
            .with_rotation(0.3)
            .with_opacity(0.7);

        let converted = empty_rasterizer()
            .rasterize_element_to_file(&element, dir.path())
            .expect("rasterize");

        assert_eq!(converted.id, element.id);
        assert!((converted.scale - 1.0).abs() < f32::EPSILON);
        assert!((converted.position.x - 12.0).abs() < f32::EPSILON);
        assert!((converted.rotation - 0.3).abs() < f32::EPSILON);
        assert!((converted.opacity - 0.7).abs() < f32::EPSILON);
        // Font size doubled by the element scale: 2 chars * 0.6 * 40 + 2 * 10.
        assert!((converted.width - 68.0).abs() < f32::EPSILON);
        let asset = converted.asset().expect("image-backed");
        assert!(Path::new(asset).exists());
    }

    /// Rasterizer over the host's fonts, or `None` on a fontless machine.
    fn system_rasterizer() -> Option<TextRasterizer> {
        let rasterizer = TextRasterizer::default();
        if rasterizer.font_count() == 0 {
            eprintln!("No system fonts installed; skipping glyph checks");
            return None;
        }
        Some(rasterizer)
    }

    fn ink(tile: &RasterizedText, min_alpha: u8) -> usize {
        tile.to_rgba()
            .chunks_exact(4)
            .filter(|px| px[3] >= min_alpha)
            .count()
    }

    #[test]
    fn test_default_family_draws_glyphs() {
        let Some(rasterizer) = system_rasterizer() else {
            return;
        };
        let tile = rasterizer
            .rasterize(&TextStyle::new("Hi", 48.0), 1.0)
            .expect("rasterize");
        assert!(tile.metrics().shaped);
        assert!(ink(&tile, 128) > 100, "ink = {}", ink(&tile, 128));
    }

    #[test]
    fn test_generic_and_unknown_families_resolve_to_loaded_faces() {
        let Some(rasterizer) = system_rasterizer() else {
            return;
        };
        for family in ["serif", "monospace", "No Such Family 9000"] {
            let style = TextStyle::new("Hi", 48.0).with_family(family);
            let tile = rasterizer.rasterize(&style, 1.0).expect("rasterize");
            assert!(tile.metrics().shaped, "{family}");
            assert!(ink(&tile, 128) > 100, "{family}");
        }
    }

    #[test]
    fn test_effects_draw_beyond_crisp_fill() {
        let Some(rasterizer) = system_rasterizer() else {
            return;
        };
        let plain = rasterizer
            .rasterize(&TextStyle::new("Hi", 48.0), 1.0)
            .expect("rasterize");
        let plain_ink = ink(&plain, 1);
        for effect in [
            TextEffect::Shadow,
            TextEffect::Glow,
            TextEffect::Neon,
            TextEffect::Outline,
        ] {
            let style = TextStyle::new("Hi", 48.0).with_effect(effect);
            let tile = rasterizer.rasterize(&style, 1.0).expect("rasterize");
            assert_eq!((tile.width(), tile.height()), (plain.width(), plain.height()));
            assert!(ink(&tile, 1) > plain_ink, "{effect:?}");
        }
    }

    #[test]
    fn test_generic_binding_prefers_known_faces() {
        let mut db = fontdb::Database::new();
        // Nothing loaded: bindings stay at fontdb defaults.
        bind_generic_families(&mut db);
        assert_eq!(db.family_name(&fontdb::Family::SansSerif), "Arial");
    }

    #[test]
    fn test_xml_escaping() {
        assert_eq!(escape_xml("A < B & C"), "A &lt; B &amp; C");
    }
}
