//! # Photomark CLI
//!
//! Command-line front end over the Photomark engine.
//!
//! ## Usage
//!
//! ```bash
//! photomark export holiday-01 --data-dir ./projects --format jpeg --watermark
//! photomark filters
//! photomark rasterize "Hello" --font-size 48 --effect neon --out hello.png
//! ```
//!
//! Every flag also reads a `PHOTOMARK_*` environment variable.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use photomark_core::{
    available_filters, Color, EditorSession, FilterDescriptor, JsonFileProjectStore, ProjectStore,
    TextEffect, TextStyle,
};
use photomark_renderer::{
    DefaultAssetResolver, ExportFormat, ExportOptions, ExportRequest, ExportResult, PhotoExporter,
    RasterizerConfig, ResolverConfig, TextRasterizer,
};

/// Command-line arguments for photomark.
#[derive(Debug, Clone, Parser)]
#[command(name = "photomark")]
#[command(about = "Flatten annotated photos and preview text layers")]
#[command(version)]
pub struct Cli {
    /// What to do.
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Flatten a stored project into an image file.
    Export(ExportArgs),
    /// List stored project ids.
    Projects(ProjectsArgs),
    /// List the available color filters.
    Filters,
    /// Render a single text layer to PNG.
    Rasterize(RasterizeArgs),
}

/// Arguments for `photomark export`.
#[derive(Debug, Clone, Args)]
pub struct ExportArgs {
    /// Project to export.
    pub project_id: String,

    /// Directory holding project JSON files
    #[arg(long, env = "PHOTOMARK_DATA_DIR", default_value = "photomark-data")]
    pub data_dir: PathBuf,

    /// Output directory (default: system temp dir)
    #[arg(long, env = "PHOTOMARK_OUT_DIR")]
    pub out: Option<PathBuf>,

    /// Output format: png or jpeg
    #[arg(long, env = "PHOTOMARK_FORMAT", default_value = "png")]
    pub format: ExportFormat,

    /// JPEG quality (1-100)
    #[arg(
        long,
        env = "PHOTOMARK_QUALITY",
        default_value_t = 90,
        value_parser = clap::value_parser!(u8).range(1..=100)
    )]
    pub quality: u8,

    /// Append the "Made with Photomark" attribution
    #[arg(long, env = "PHOTOMARK_WATERMARK")]
    pub watermark: bool,

    /// Color filter applied to the source photo
    #[arg(long, env = "PHOTOMARK_FILTER")]
    pub filter: Option<String>,

    /// Filter strength (0.0-1.0)
    #[arg(long, env = "PHOTOMARK_FILTER_INTENSITY", default_value_t = 1.0)]
    pub intensity: f32,

    /// Root for bundle:// assets
    #[arg(long, env = "PHOTOMARK_BUNDLE_DIR")]
    pub bundle_dir: Option<PathBuf>,

    /// Root for ph:// and assets-library:// assets
    #[arg(long, env = "PHOTOMARK_LIBRARY_DIR")]
    pub library_dir: Option<PathBuf>,

    /// Where downloaded and data: assets are cached
    #[arg(long, env = "PHOTOMARK_CACHE_DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Extra font directories
    #[arg(long = "font-dir", env = "PHOTOMARK_FONT_DIRS", value_delimiter = ',')]
    pub font_dirs: Vec<PathBuf>,
}

/// Arguments for `photomark projects`.
#[derive(Debug, Clone, Args)]
pub struct ProjectsArgs {
    /// Directory holding project JSON files
    #[arg(long, env = "PHOTOMARK_DATA_DIR", default_value = "photomark-data")]
    pub data_dir: PathBuf,
}

/// Arguments for `photomark rasterize`.
#[derive(Debug, Clone, Args)]
pub struct RasterizeArgs {
    /// Text to draw.
    pub text: String,

    /// Font size in pixels
    #[arg(long, default_value_t = 32.0)]
    pub font_size: f32,

    /// Font family
    #[arg(long, default_value = "sans-serif")]
    pub family: String,

    /// Fill color (#RGB, #RRGGBB or #RRGGBBAA)
    #[arg(long, default_value = "#FFFFFF", value_parser = parse_color)]
    pub color: Color,

    /// Effect: none, neon, glow, shadow, outline
    #[arg(long, default_value = "none", value_parser = parse_effect)]
    pub effect: TextEffect,

    /// Rounded background color
    #[arg(long, value_parser = parse_color)]
    pub background: Option<Color>,

    /// Tile opacity (0.0-1.0)
    #[arg(long, default_value_t = 1.0)]
    pub opacity: f32,

    /// Output PNG path
    #[arg(long)]
    pub out: PathBuf,

    /// Extra font directories
    #[arg(long = "font-dir", env = "PHOTOMARK_FONT_DIRS", value_delimiter = ',')]
    pub font_dirs: Vec<PathBuf>,
}

/// Outcome of `photomark rasterize`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterizeOutcome {
    /// Written file.
    pub path: PathBuf,
    /// Tile width in pixels.
    pub width: u32,
    /// Tile height in pixels.
    pub height: u32,
}

fn parse_color(value: &str) -> Result<Color, String> {
    Color::from_hex(value).map_err(|e| e.to_string())
}

fn parse_effect(value: &str) -> Result<TextEffect, String> {
    TextEffect::from_name(value)
        .ok_or_else(|| format!("unknown effect '{value}' (none, neon, glow, shadow, outline)"))
}

/// Run a parsed command, printing its result to stdout.
///
/// # Errors
///
/// Returns an error if the command fails.
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Export(args) => {
            let result = run_export(&args).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Command::Projects(args) => {
            for id in list_projects(&args)? {
                println!("{id}");
            }
        }
        Command::Filters => {
            for id in available_filters() {
                println!("{id}");
            }
        }
        Command::Rasterize(args) => {
            let outcome = run_rasterize(&args)?;
            println!(
                "{} ({}x{})",
                outcome.path.display(),
                outcome.width,
                outcome.height
            );
        }
    }
    Ok(())
}

/// Export a stored project.
///
/// # Errors
///
/// Returns an error if the project cannot be opened or the export fails.
pub async fn run_export(args: &ExportArgs) -> anyhow::Result<ExportResult> {
    let store = JsonFileProjectStore::new(&args.data_dir)
        .with_context(|| format!("Failed to open data dir {}", args.data_dir.display()))?;
    let session = EditorSession::open(Arc::new(store), &args.project_id)
        .with_context(|| format!("Failed to open project '{}'", args.project_id))?;
    tracing::info!(
        "Opened project {} with {} elements",
        session.id(),
        session.engine().len()
    );

    let mut resolver_config = ResolverConfig {
        bundle_dir: args.bundle_dir.clone(),
        photo_library_dir: args.library_dir.clone(),
        ..ResolverConfig::default()
    };
    if let Some(cache_dir) = &args.cache_dir {
        resolver_config.cache_dir.clone_from(cache_dir);
    }
    let resolver = DefaultAssetResolver::new(resolver_config)?;
    let rasterizer = TextRasterizer::new(&RasterizerConfig {
        font_dirs: args.font_dirs.clone(),
        ..RasterizerConfig::default()
    });

    let mut options = ExportOptions {
        format: args.format,
        quality: args.quality,
        include_watermark: args.watermark,
        ..ExportOptions::default()
    };
    if let Some(out) = &args.out {
        options.output_dir.clone_from(out);
    }
    let filter = args
        .filter
        .as_ref()
        .map(|id| FilterDescriptor::new(id.clone(), args.intensity));
    let request = ExportRequest::from_project(&session.document(), options, filter);

    let exporter = PhotoExporter::new(Arc::new(resolver), Arc::new(rasterizer));
    exporter
        .export(&request)
        .await
        .with_context(|| format!("Export of '{}' failed", args.project_id))
}

/// Ids of every stored project.
///
/// # Errors
///
/// Returns an error if the data directory cannot be read.
pub fn list_projects(args: &ProjectsArgs) -> anyhow::Result<Vec<String>> {
    let store = JsonFileProjectStore::new(&args.data_dir)
        .with_context(|| format!("Failed to open data dir {}", args.data_dir.display()))?;
    Ok(store.list()?)
}

/// Render a text tile to PNG.
///
/// # Errors
///
/// Returns an error if rendering or writing fails.
pub fn run_rasterize(args: &RasterizeArgs) -> anyhow::Result<RasterizeOutcome> {
    let rasterizer = TextRasterizer::new(&RasterizerConfig {
        font_dirs: args.font_dirs.clone(),
        ..RasterizerConfig::default()
    });
    let style = TextStyle::new(args.text.clone(), args.font_size)
        .with_family(args.family.clone())
        .with_color(args.color)
        .with_effect(args.effect)
        .with_background(args.background);
    tracing::debug!("Rasterizing {:?} at {}px", args.text, args.font_size);

    let tile = rasterizer.rasterize(&style, args.opacity.clamp(0.0, 1.0))?;
    if let Some(parent) = args.out.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(&args.out, tile.encode_png()?)
        .with_context(|| format!("Failed to write {}", args.out.display()))?;

    Ok(RasterizeOutcome {
        path: args.out.clone(),
        width: tile.width(),
        height: tile.height(),
    })
}
