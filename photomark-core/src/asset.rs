//! Asset references and the resolver boundary.
//!
//! Elements carry logical references (local paths, URLs, library handles,
//! bundled names, inline data). The export pipeline turns each into a local
//! readable file through an [`AssetResolver`] supplied by the host.

use std::path::PathBuf;

use async_trait::async_trait;
use url::Url;

/// What the resolved file will be used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetHint {
    /// The photo being annotated. Failure to resolve aborts the export.
    Source,
    /// A sticker, stamp or watermark image. Failure skips the layer.
    Overlay,
}

/// Maps a logical reference to a local, readable file.
///
/// Implementations must not panic; any failure is reported as `None`.
#[async_trait]
pub trait AssetResolver: Send + Sync {
    /// Resolve `reference` to a local path.
    async fn resolve(&self, reference: &str, hint: AssetHint) -> Option<PathBuf>;
}

/// Classification of a reference string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetReference {
    /// A plain filesystem path.
    LocalPath(PathBuf),
    /// A `file://` URL, already converted to a path.
    FileUrl(PathBuf),
    /// An `http://` or `https://` URL.
    Remote(Url),
    /// A platform photo-library handle (`ph://`, `assets-library://`).
    PhotoLibrary(String),
    /// An asset shipped with the application (`bundle://name`).
    Bundled(String),
    /// An inline `data:` URI.
    DataUri(String),
    /// Anything with a scheme we do not handle.
    Unsupported(String),
}

impl AssetReference {
    /// Classify a reference string.
    #[must_use]
    pub fn parse(reference: &str) -> Self {
        let trimmed = reference.trim();
        if trimmed.starts_with("data:") {
            return Self::DataUri(trimmed.to_string());
        }
        if let Some(name) = trimmed.strip_prefix("bundle://") {
            return Self::Bundled(name.to_string());
        }
        if let Some(handle) = trimmed.strip_prefix("ph://") {
            return Self::PhotoLibrary(handle.to_string());
        }
        if trimmed.starts_with("assets-library://") {
            return Self::PhotoLibrary(library_handle(trimmed));
        }
        if !has_scheme(trimmed) {
            return Self::LocalPath(PathBuf::from(trimmed));
        }
        match Url::parse(trimmed) {
            Ok(url) if url.scheme() == "file" => match url.to_file_path() {
                Ok(path) => Self::FileUrl(path),
                Err(()) => Self::Unsupported(trimmed.to_string()),
            },
            Ok(url) if matches!(url.scheme(), "http" | "https") => Self::Remote(url),
            _ => Self::Unsupported(trimmed.to_string()),
        }
    }

    /// Whether resolving requires network access.
    #[must_use]
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote(_))
    }
}

/// `scheme:` prefix with at least two characters, so `C:\photo.jpg` stays a
/// path.
fn has_scheme(reference: &str) -> bool {
    let Some((scheme, _)) = reference.split_once(':') else {
        return false;
    };
    scheme.len() > 1
        && scheme.starts_with(|c: char| c.is_ascii_alphabetic())
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// `assets-library://asset/asset.JPG?id=ABC&ext=JPG` → `ABC`.
fn library_handle(reference: &str) -> String {
    Url::parse(reference)
        .ok()
        .and_then(|url| {
            url.query_pairs()
                .find(|(key, _)| key == "id")
                .map(|(_, value)| value.into_owned())
        })
        .unwrap_or_else(|| {
            reference
                .trim_start_matches("assets-library://")
                .to_string()
        })
}
