//! Integration tests for the photomark command line.
//!
//! Covers argument parsing and the export, projects and rasterize commands
//! against temporary data directories.

use std::path::Path;

use clap::Parser;
use image::{Rgba, RgbaImage};
use photomark_cli::{list_projects, run_export, run_rasterize, Cli, Command};
use photomark_core::{
    CanvasElement, Color, JsonFileProjectStore, PixelSize, ProjectDocument, ProjectStore,
    TextEffect,
};
use photomark_renderer::ExportFormat;

fn parse(args: &[&str]) -> Command {
    Cli::try_parse_from(args).expect("parse").command
}

fn seed_project(data_dir: &Path, assets: &Path) -> ProjectDocument {
    let source = assets.join("source.png");
    RgbaImage::from_pixel(400, 200, Rgba([30, 60, 90, 255]))
        .save(&source)
        .expect("write source");
    let sticker = assets.join("sticker.png");
    RgbaImage::from_pixel(8, 8, Rgba([250, 0, 0, 255]))
        .save(&sticker)
        .expect("write sticker");

    let doc = ProjectDocument::new("trip", source.to_string_lossy(), PixelSize::new(400, 200))
        .with_canvas_size(200.0, 100.0)
        .with_elements(vec![
            CanvasElement::sticker(sticker.to_string_lossy(), 20.0, 20.0).with_position(10.0, 10.0),
            CanvasElement::stamp(assets.join("gone.png").to_string_lossy(), 20.0, 20.0),
        ]);
    JsonFileProjectStore::new(data_dir)
        .expect("store")
        .save(&doc)
        .expect("save");
    doc
}

// ==========================================================================
// Parsing
// ==========================================================================

#[test]
fn test_export_defaults() {
    let Command::Export(args) = parse(&["photomark", "export", "trip"]) else {
        panic!("expected export");
    };
    assert_eq!(args.project_id, "trip");
    assert_eq!(args.format, ExportFormat::Png);
    assert_eq!(args.quality, 90);
    assert!(!args.watermark);
    assert!(args.filter.is_none());
}

#[test]
fn test_export_flags() {
    let Command::Export(args) = parse(&[
        "photomark",
        "export",
        "trip",
        "--format",
        "jpeg",
        "--quality",
        "70",
        "--watermark",
        "--filter",
        "sepia",
        "--intensity",
        "0.5",
    ]) else {
        panic!("expected export");
    };
    assert_eq!(args.format, ExportFormat::Jpeg);
    assert_eq!(args.quality, 70);
    assert!(args.watermark);
    assert_eq!(args.filter.as_deref(), Some("sepia"));
    assert!((args.intensity - 0.5).abs() < f32::EPSILON);
}

#[test]
fn test_invalid_values_are_rejected() {
    assert!(Cli::try_parse_from(["photomark", "export", "trip", "--quality", "0"]).is_err());
    assert!(Cli::try_parse_from(["photomark", "export", "trip", "--format", "tiff"]).is_err());
    assert!(
        Cli::try_parse_from(["photomark", "rasterize", "hi", "--out", "x.png", "--color", "red"])
            .is_err()
    );
    assert!(Cli::try_parse_from([
        "photomark",
        "rasterize",
        "hi",
        "--out",
        "x.png",
        "--effect",
        "sparkle"
    ])
    .is_err());
}

#[test]
fn test_rasterize_flags() {
    let Command::Rasterize(args) = parse(&[
        "photomark",
        "rasterize",
        "Hello",
        "--font-size",
        "48",
        "--color",
        "#FF0000",
        "--effect",
        "neon",
        "--background",
        "#000000",
        "--out",
        "hello.png",
    ]) else {
        panic!("expected rasterize");
    };
    assert_eq!(args.text, "Hello");
    assert_eq!(args.color, Color::rgb(255, 0, 0));
    assert_eq!(args.effect, TextEffect::Neon);
    assert_eq!(args.background, Some(Color::BLACK));
}

#[test]
fn test_filters_subcommand() {
    assert!(matches!(parse(&["photomark", "filters"]), Command::Filters));
}

// ==========================================================================
// Commands
// ==========================================================================

#[tokio::test]
async fn test_export_stored_project() {
    let dir = tempfile::tempdir().expect("tempdir");
    let data_dir = dir.path().join("data");
    let out_dir = dir.path().join("out");
    seed_project(&data_dir, dir.path());

    let Command::Export(args) = parse(&[
        "photomark",
        "export",
        "trip",
        "--data-dir",
        &data_dir.to_string_lossy(),
        "--out",
        &out_dir.to_string_lossy(),
        "--cache-dir",
        &dir.path().join("cache").to_string_lossy(),
        "--format",
        "jpeg",
        "--filter",
        "noir",
    ]) else {
        panic!("expected export");
    };

    let result = run_export(&args).await.expect("export");
    assert_eq!(result.format, ExportFormat::Jpeg);
    assert_eq!((result.width, result.height), (400, 200));
    assert_eq!(result.skipped, 1);
    assert!(result.file_path.starts_with(&out_dir));

    let decoded = image::open(&result.file_path).expect("decode").to_rgba8();
    assert_eq!(decoded.dimensions(), (400, 200));
}

#[tokio::test]
async fn test_export_unknown_project_fails() {
    let dir = tempfile::tempdir().expect("tempdir");
    let Command::Export(args) = parse(&[
        "photomark",
        "export",
        "missing",
        "--data-dir",
        &dir.path().to_string_lossy(),
    ]) else {
        panic!("expected export");
    };

    let err = run_export(&args).await.expect_err("must fail");
    assert!(err.to_string().contains("missing"));
}

#[test]
fn test_projects_lists_saved_ids() {
    let dir = tempfile::tempdir().expect("tempdir");
    let data_dir = dir.path().join("data");
    seed_project(&data_dir, dir.path());

    let Command::Projects(args) = parse(&[
        "photomark",
        "projects",
        "--data-dir",
        &data_dir.to_string_lossy(),
    ]) else {
        panic!("expected projects");
    };
    assert_eq!(list_projects(&args).expect("list"), vec!["trip".to_string()]);
}

#[test]
fn test_rasterize_writes_png() {
    let dir = tempfile::tempdir().expect("tempdir");
    let out = dir.path().join("tiles").join("hi.png");
    let Command::Rasterize(args) = parse(&[
        "photomark",
        "rasterize",
        "Hi",
        "--font-size",
        "40",
        "--background",
        "#202020",
        "--out",
        &out.to_string_lossy(),
    ]) else {
        panic!("expected rasterize");
    };

    let outcome = run_rasterize(&args).expect("rasterize");
    assert_eq!(outcome.path, out);
    let decoded = image::open(&out).expect("decode").to_rgba8();
    assert_eq!(decoded.dimensions(), (outcome.width, outcome.height));
    // Padding alone is 2 * 10 wide and 2 * 8 tall at 40px.
    assert!(outcome.width > 20 && outcome.height > 16);
}
