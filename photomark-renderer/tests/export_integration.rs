//! Integration tests for full-resolution export.
//!
//! Drives [`PhotoExporter`] end to end against real files on disk:
//! - canvas→source scaling of overlay geometry
//! - z-order and skipped-asset accounting
//! - text layers, filters, watermark and encoding fallbacks
//! - fatal source failures

use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::{Rgba, RgbaImage};
use photomark_core::{CanvasElement, Color, FilterDescriptor, PixelSize, Size, TextStyle};
use photomark_renderer::{
    DefaultAssetResolver, ExportFormat, ExportOptions, ExportRequest, ExportResult, PhotoExporter,
    RenderError, ResolverConfig, TextRasterizer,
};
use tempfile::TempDir;

const BLUE: [u8; 4] = [20, 40, 200, 255];
const RED: [u8; 4] = [230, 10, 10, 255];
const GREEN: [u8; 4] = [10, 230, 10, 255];
const YELLOW: [u8; 4] = [240, 240, 0, 255];

fn write_png(dir: &Path, name: &str, w: u32, h: u32, rgba: [u8; 4]) -> PathBuf {
    let path = dir.join(name);
    RgbaImage::from_pixel(w, h, Rgba(rgba))
        .save(&path)
        .expect("write png");
    path
}

fn exporter(cache: &Path) -> PhotoExporter {
    let resolver = DefaultAssetResolver::new(ResolverConfig {
        cache_dir: cache.to_path_buf(),
        ..ResolverConfig::default()
    })
    .expect("resolver");
    PhotoExporter::new(Arc::new(resolver), Arc::new(TextRasterizer::default()))
}

fn request(
    dir: &TempDir,
    source: &Path,
    dims: PixelSize,
    canvas: Size,
    elements: Vec<CanvasElement>,
) -> ExportRequest {
    ExportRequest {
        source: source.to_string_lossy().into_owned(),
        source_dimensions: dims,
        elements,
        options: ExportOptions {
            canvas_size: Some(canvas),
            output_dir: dir.path().join("out"),
            ..ExportOptions::default()
        },
        filter: None,
    }
}

fn pixel(result: &ExportResult, x: u32, y: u32) -> [u8; 4] {
    image::open(&result.file_path)
        .expect("open output")
        .to_rgba8()
        .get_pixel(x, y)
        .0
}

fn close(a: [u8; 4], b: [u8; 4]) -> bool {
    a.iter().zip(b.iter()).all(|(x, y)| x.abs_diff(*y) <= 3)
}

fn is_white(px: [u8; 4]) -> bool {
    px[..3].iter().all(|c| *c >= 200)
}

/// Count pixels in a region of the output matching `pred`.
fn count_where(
    result: &ExportResult,
    xs: Range<u32>,
    ys: Range<u32>,
    pred: impl Fn([u8; 4]) -> bool,
) -> usize {
    let img = image::open(&result.file_path).expect("open output").to_rgba8();
    ys.flat_map(|y| xs.clone().map(move |x| (x, y)))
        .filter(|&(x, y)| pred(img.get_pixel(x, y).0))
        .count()
}

fn fonts_available() -> bool {
    if TextRasterizer::default().font_count() == 0 {
        eprintln!("No system fonts installed; skipping glyph checks");
        return false;
    }
    true
}

// ==========================================================================
// Geometry
// ==========================================================================

#[tokio::test]
async fn test_overlay_scales_from_canvas_to_source() {
    let dir = tempfile::tempdir().expect("tempdir");
    let source = write_png(dir.path(), "source.png", 2000, 2000, BLUE);
    let sticker = write_png(dir.path(), "sticker.png", 10, 10, RED);

    let element = CanvasElement::sticker(sticker.to_string_lossy(), 50.0, 50.0)
        .with_position(100.0, 100.0);
    let req = request(
        &dir,
        &source,
        PixelSize::new(2000, 2000),
        Size::new(500.0, 500.0),
        vec![element],
    );

    let result = exporter(dir.path()).export(&req).await.expect("export");
    assert_eq!((result.width, result.height), (2000, 2000));
    assert_eq!(result.skipped, 0);

    // Box spans 400..600 on both axes.
    assert!(close(pixel(&result, 410, 410), RED));
    assert!(close(pixel(&result, 590, 590), RED));
    assert!(close(pixel(&result, 390, 390), BLUE));
    assert!(close(pixel(&result, 610, 610), BLUE));
}

#[tokio::test]
async fn test_layers_draw_in_list_order() {
    let dir = tempfile::tempdir().expect("tempdir");
    let source = write_png(dir.path(), "source.png", 100, 100, BLUE);
    let elements = [("a.png", RED), ("b.png", GREEN), ("c.png", YELLOW)]
        .into_iter()
        .enumerate()
        .map(|(i, (name, color))| {
            let path = write_png(dir.path(), name, 4, 4, color);
            #[allow(clippy::cast_precision_loss)]
            let offset = i as f32 * 10.0;
            CanvasElement::sticker(path.to_string_lossy(), 40.0, 40.0)
                .with_position(20.0 + offset, 20.0 + offset)
        })
        .collect();
    let req = request(
        &dir,
        &source,
        PixelSize::new(100, 100),
        Size::new(100.0, 100.0),
        elements,
    );

    let result = exporter(dir.path()).export(&req).await.expect("export");
    assert!(close(pixel(&result, 50, 50), YELLOW));
    assert!(close(pixel(&result, 25, 25), RED));
    assert!(close(pixel(&result, 35, 35), GREEN));
}

#[tokio::test]
async fn test_missing_canvas_size_exports_one_to_one() {
    let dir = tempfile::tempdir().expect("tempdir");
    let source = write_png(dir.path(), "source.png", 200, 200, BLUE);
    let sticker = write_png(dir.path(), "sticker.png", 4, 4, RED);
    let mut req = request(
        &dir,
        &source,
        PixelSize::new(200, 200),
        Size::new(0.0, 0.0),
        vec![
            CanvasElement::sticker(sticker.to_string_lossy(), 20.0, 20.0)
                .with_position(10.0, 10.0),
        ],
    );
    req.options.canvas_size = None;

    let result = exporter(dir.path()).export(&req).await.expect("export");
    assert!(close(pixel(&result, 15, 15), RED));
    assert!(close(pixel(&result, 35, 35), BLUE));
}

// ==========================================================================
// Degraded overlays
// ==========================================================================

#[tokio::test]
async fn test_unresolvable_asset_is_skipped() {
    let dir = tempfile::tempdir().expect("tempdir");
    let source = write_png(dir.path(), "source.png", 100, 100, BLUE);
    let red = write_png(dir.path(), "red.png", 4, 4, RED);
    let green = write_png(dir.path(), "green.png", 4, 4, GREEN);
    let missing = dir.path().join("missing.png");

    let req = request(
        &dir,
        &source,
        PixelSize::new(100, 100),
        Size::new(100.0, 100.0),
        vec![
            CanvasElement::sticker(red.to_string_lossy(), 20.0, 20.0).with_position(0.0, 0.0),
            CanvasElement::stamp(missing.to_string_lossy(), 20.0, 20.0).with_position(40.0, 0.0),
            CanvasElement::sticker(green.to_string_lossy(), 20.0, 20.0).with_position(70.0, 0.0),
        ],
    );

    let result = exporter(dir.path()).export(&req).await.expect("export");
    assert_eq!(result.skipped, 1);
    assert!(close(pixel(&result, 10, 10), RED));
    assert!(close(pixel(&result, 50, 10), BLUE));
    assert!(close(pixel(&result, 80, 10), GREEN));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_shared_data_uri_stickers_all_draw() {
    use base64::Engine;

    let dir = tempfile::tempdir().expect("tempdir");
    let source = write_png(dir.path(), "source.png", 200, 200, BLUE);
    let mut png = Vec::new();
    RgbaImage::from_pixel(300, 300, Rgba(RED))
        .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
        .expect("encode");
    let uri = format!(
        "data:image/png;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(&png)
    );
    let stickers: Vec<CanvasElement> = (0..16u8)
        .map(|i| {
            CanvasElement::sticker(uri.clone(), 10.0, 10.0)
                .with_position(f32::from(i % 4) * 40.0, f32::from(i / 4) * 40.0)
        })
        .collect();
    let req = request(
        &dir,
        &source,
        PixelSize::new(200, 200),
        Size::new(200.0, 200.0),
        stickers,
    );

    let exporter = exporter(dir.path());
    for _ in 0..5 {
        let result = exporter.export(&req).await.expect("export");
        assert_eq!(result.skipped, 0);
        assert!(close(pixel(&result, 125, 125), RED));
    }
}

#[tokio::test]
async fn test_undecodable_asset_is_skipped() {
    let dir = tempfile::tempdir().expect("tempdir");
    let source = write_png(dir.path(), "source.png", 50, 50, BLUE);
    let garbage = dir.path().join("garbage.png");
    std::fs::write(&garbage, b"not an image").expect("write");

    let req = request(
        &dir,
        &source,
        PixelSize::new(50, 50),
        Size::new(50.0, 50.0),
        vec![CanvasElement::image_watermark(garbage.to_string_lossy(), 10.0, 10.0)],
    );

    let result = exporter(dir.path()).export(&req).await.expect("export");
    assert_eq!(result.skipped, 1);
    assert!(result.file_path.exists());
}

// ==========================================================================
// Text, filters, encoding
// ==========================================================================

#[tokio::test]
async fn test_text_layer_renders_at_output_resolution() {
    let dir = tempfile::tempdir().expect("tempdir");
    let source = write_png(dir.path(), "source.png", 1000, 1000, BLUE);
    let style = TextStyle::new("Hi", 24.0)
        .with_color(Color::WHITE)
        .with_background(Some(Color::rgb(230, 10, 10)));
    let req = request(
        &dir,
        &source,
        PixelSize::new(1000, 1000),
        Size::new(500.0, 500.0),
        vec![CanvasElement::text(style).with_position(50.0, 50.0)],
    );

    let result = exporter(dir.path()).export(&req).await.expect("export");
    assert_eq!(result.format, ExportFormat::Png);
    assert_eq!(result.mime_type, "image/png");
    assert!(result.file_path.exists());
    assert_eq!(
        result.file_path.extension().and_then(|e| e.to_str()),
        Some("png")
    );

    // The tile's top-left lands at (100, 100) and is drawn at 2x.
    assert!(close(pixel(&result, 95, 95), BLUE));
    assert!(close(pixel(&result, 130, 145), RED));
}

#[tokio::test]
async fn test_text_glyphs_land_at_scaled_anchor() {
    if !fonts_available() {
        return;
    }
    let dir = tempfile::tempdir().expect("tempdir");
    let source = write_png(dir.path(), "source.png", 1000, 1000, BLUE);
    let style = TextStyle::new("Hi", 24.0).with_color(Color::WHITE);
    let req = request(
        &dir,
        &source,
        PixelSize::new(1000, 1000),
        Size::new(500.0, 500.0),
        vec![CanvasElement::text(style).with_position(50.0, 50.0)],
    );

    let result = exporter(dir.path()).export(&req).await.expect("export");
    // 48px glyphs just inside the tile that starts at (100, 100).
    assert!(count_where(&result, 100..260, 100..200, is_white) > 100);
    assert_eq!(count_where(&result, 0..100, 0..100, is_white), 0);
    assert_eq!(count_where(&result, 300..1000, 300..1000, is_white), 0);
}

#[tokio::test]
async fn test_filter_applies_to_source_only() {
    let dir = tempfile::tempdir().expect("tempdir");
    let source = write_png(dir.path(), "source.png", 60, 60, [200, 60, 30, 255]);
    let sticker = write_png(dir.path(), "sticker.png", 4, 4, RED);
    let mut req = request(
        &dir,
        &source,
        PixelSize::new(60, 60),
        Size::new(60.0, 60.0),
        vec![CanvasElement::sticker(sticker.to_string_lossy(), 20.0, 20.0)],
    );
    req.filter = Some(FilterDescriptor::new("grayscale", 1.0));

    let result = exporter(dir.path()).export(&req).await.expect("export");
    let gray = pixel(&result, 40, 40);
    assert!(gray[0].abs_diff(gray[1]) <= 1 && gray[1].abs_diff(gray[2]) <= 1);
    assert!(close(pixel(&result, 10, 10), RED));
}

#[tokio::test]
async fn test_lossy_export_writes_jpeg() {
    let dir = tempfile::tempdir().expect("tempdir");
    let source = write_png(dir.path(), "source.png", 64, 64, BLUE);
    let mut req = request(
        &dir,
        &source,
        PixelSize::new(64, 64),
        Size::new(64.0, 64.0),
        Vec::new(),
    );
    req.options.format = ExportFormat::Jpeg;
    req.options.quality = 80;

    let result = exporter(dir.path()).export(&req).await.expect("export");
    assert_eq!(result.format, ExportFormat::Jpeg);
    assert_eq!(result.mime_type, "image/jpeg");
    let bytes = std::fs::read(&result.file_path).expect("read");
    assert_eq!(&bytes[0..2], &[0xFF, 0xD8]);
}

#[tokio::test]
async fn test_lossy_export_beyond_jpeg_limits_reports_png() {
    let dir = tempfile::tempdir().expect("tempdir");
    let source = write_png(dir.path(), "source.png", 2, 1, BLUE);
    let mut req = request(
        &dir,
        &source,
        PixelSize::new(70_000, 1),
        Size::new(70_000.0, 1.0),
        Vec::new(),
    );
    req.options.format = ExportFormat::Jpeg;

    let result = exporter(dir.path()).export(&req).await.expect("export");
    assert_eq!(result.format, ExportFormat::Png);
    assert_eq!(result.mime_type, "image/png");
    let bytes = std::fs::read(&result.file_path).expect("read");
    assert_eq!(&bytes[0..4], &[137, 80, 78, 71]);
}

#[tokio::test]
async fn test_watermark_does_not_fail_export() {
    let dir = tempfile::tempdir().expect("tempdir");
    let source = write_png(dir.path(), "source.png", 400, 300, BLUE);
    let mut req = request(
        &dir,
        &source,
        PixelSize::new(400, 300),
        Size::new(200.0, 150.0),
        Vec::new(),
    );
    req.options.include_watermark = true;

    let result = exporter(dir.path()).export(&req).await.expect("export");
    assert_eq!(result.skipped, 0);
    assert!(close(pixel(&result, 10, 10), BLUE));
    if fonts_available() {
        assert!(count_where(&result, 150..400, 220..300, is_white) > 10);
        assert_eq!(count_where(&result, 0..200, 0..150, is_white), 0);
    }
}

#[tokio::test]
async fn test_every_export_gets_a_fresh_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let source = write_png(dir.path(), "source.png", 16, 16, BLUE);
    let req = request(
        &dir,
        &source,
        PixelSize::new(16, 16),
        Size::new(16.0, 16.0),
        Vec::new(),
    );
    let exporter = exporter(dir.path());

    let first = exporter.export(&req).await.expect("first");
    let second = exporter.export(&req).await.expect("second");
    assert_ne!(first.file_path, second.file_path);
    assert!(first.file_path.exists() && second.file_path.exists());
}

// ==========================================================================
// Fatal failures
// ==========================================================================

#[tokio::test]
async fn test_missing_source_fails() {
    let dir = tempfile::tempdir().expect("tempdir");
    let req = request(
        &dir,
        &dir.path().join("nope.png"),
        PixelSize::new(100, 100),
        Size::new(100.0, 100.0),
        Vec::new(),
    );

    let err = exporter(dir.path()).export(&req).await.expect_err("must fail");
    assert!(matches!(err, RenderError::SourceLoad(_)));
    assert!(err.is_export_failure());
    assert!(!dir.path().join("out").exists());
}

#[tokio::test]
async fn test_undecodable_source_fails() {
    let dir = tempfile::tempdir().expect("tempdir");
    let source = dir.path().join("source.png");
    std::fs::write(&source, b"garbage").expect("write");
    let req = request(
        &dir,
        &source,
        PixelSize::new(10, 10),
        Size::new(10.0, 10.0),
        Vec::new(),
    );

    let err = exporter(dir.path()).export(&req).await.expect_err("must fail");
    assert!(matches!(err, RenderError::SourceLoad(_)));
}

#[tokio::test]
async fn test_empty_dimensions_fail() {
    let dir = tempfile::tempdir().expect("tempdir");
    let source = write_png(dir.path(), "source.png", 4, 4, BLUE);
    let req = request(
        &dir,
        &source,
        PixelSize::new(0, 10),
        Size::new(10.0, 10.0),
        Vec::new(),
    );

    let err = exporter(dir.path()).export(&req).await.expect_err("must fail");
    assert!(matches!(err, RenderError::Surface(_)));
}
