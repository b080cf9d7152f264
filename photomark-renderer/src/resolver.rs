//! Filesystem/HTTP implementation of [`AssetResolver`].

use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use photomark_core::{AssetHint, AssetReference, AssetResolver};
use reqwest::Client;
use url::Url;
use xxhash_rust::xxh3::xxh3_64;

use crate::error::{RenderError, RenderResult};
use crate::image::{decode_data_uri, ImageFormat};

/// Extensions tried when looking up a photo-library handle.
const LIBRARY_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "heic", "webp", "gif"];

/// Where the default resolver looks for and stores assets.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Downloaded and decoded assets are written here.
    pub cache_dir: PathBuf,
    /// Root for `bundle://` references.
    pub bundle_dir: Option<PathBuf>,
    /// Root for `ph://` / `assets-library://` references.
    pub photo_library_dir: Option<PathBuf>,
    /// Per-request timeout for remote assets.
    pub http_timeout: Duration,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            cache_dir: std::env::temp_dir().join("photomark-assets"),
            bundle_dir: None,
            photo_library_dir: None,
            http_timeout: Duration::from_secs(15),
        }
    }
}

/// Resolves local paths, `file://`, `http(s)://`, `data:`, bundled and
/// photo-library references. No retries; every failure is `None`.
#[derive(Debug, Clone)]
pub struct DefaultAssetResolver {
    config: ResolverConfig,
    http: Client,
}

impl DefaultAssetResolver {
    /// Build a resolver.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Resource`] if the HTTP client cannot be built.
    pub fn new(config: ResolverConfig) -> RenderResult<Self> {
        let http = Client::builder()
            .user_agent(concat!("photomark/", env!("CARGO_PKG_VERSION")))
            .timeout(config.http_timeout)
            .build()
            .map_err(|e| RenderError::Resource(format!("HTTP client: {e}")))?;
        Ok(Self { config, http })
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    async fn resolve_reference(&self, reference: AssetReference) -> Result<PathBuf, String> {
        match reference {
            AssetReference::LocalPath(path) | AssetReference::FileUrl(path) => {
                existing_file(path).await
            }
            AssetReference::Bundled(name) => {
                let root = self
                    .config
                    .bundle_dir
                    .as_ref()
                    .ok_or("no bundle directory configured")?;
                existing_file(contained_join(root, &name)?).await
            }
            AssetReference::PhotoLibrary(handle) => {
                let root = self
                    .config
                    .photo_library_dir
                    .as_ref()
                    .ok_or("no photo library directory configured")?;
                find_library_asset(root, &handle).await
            }
            AssetReference::DataUri(uri) => {
                let bytes = decode_data_uri(&uri).map_err(|e| e.to_string())?;
                let ext = ImageFormat::from_magic_bytes(&bytes).extension();
                let path = self
                    .config
                    .cache_dir
                    .join(format!("data-{:016x}.{ext}", xxh3_64(uri.as_bytes())));
                self.write_cache(&path, &bytes).await?;
                Ok(path)
            }
            AssetReference::Remote(url) => self.download(&url).await,
            AssetReference::Unsupported(reference) => {
                Err(format!("unsupported reference scheme: {reference}"))
            }
        }
    }

    async fn download(&self, url: &Url) -> Result<PathBuf, String> {
        let ext = Path::new(url.path())
            .extension()
            .and_then(|e| e.to_str())
            .map(ImageFormat::from_extension)
            .filter(|f| *f != ImageFormat::Unknown)
            .map_or("img", ImageFormat::extension);
        let path = self
            .config
            .cache_dir
            .join(format!("remote-{:016x}.{ext}", xxh3_64(url.as_str().as_bytes())));
        if tokio::fs::metadata(&path).await.is_ok_and(|m| m.is_file()) {
            tracing::debug!("Using cached download for {url}");
            return Ok(path);
        }

        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| format!("download failed: {e}"))?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| format!("download failed: {e}"))?;
        self.write_cache(&path, &bytes).await?;
        tracing::debug!("Downloaded {url} ({} bytes)", bytes.len());
        Ok(path)
    }

    /// Cache entries only ever appear complete: bytes go to a private staging
    /// file that is then renamed over `path`. Existing entries are kept.
    async fn write_cache(&self, path: &Path, bytes: &[u8]) -> Result<(), String> {
        if tokio::fs::metadata(path).await.is_ok_and(|m| m.is_file()) {
            return Ok(());
        }
        tokio::fs::create_dir_all(&self.config.cache_dir)
            .await
            .map_err(|e| format!("cache dir: {e}"))?;

        let staging = self
            .config
            .cache_dir
            .join(format!(".partial-{}", uuid::Uuid::new_v4()));
        tokio::fs::write(&staging, bytes)
            .await
            .map_err(|e| format!("cache write {}: {e}", staging.display()))?;
        if let Err(e) = tokio::fs::rename(&staging, path).await {
            let _ = tokio::fs::remove_file(&staging).await;
            return Err(format!("cache write {}: {e}", path.display()));
        }
        Ok(())
    }
}

#[async_trait]
impl AssetResolver for DefaultAssetResolver {
    async fn resolve(&self, reference: &str, hint: AssetHint) -> Option<PathBuf> {
        match self.resolve_reference(AssetReference::parse(reference)).await {
            Ok(path) => Some(path),
            Err(e) => {
                tracing::warn!("Could not resolve {hint:?} asset '{reference}': {e}");
                None
            }
        }
    }
}

async fn existing_file(path: PathBuf) -> Result<PathBuf, String> {
    match tokio::fs::metadata(&path).await {
        Ok(meta) if meta.is_file() => Ok(path),
        Ok(_) => Err(format!("{} is not a file", path.display())),
        Err(e) => Err(format!("{}: {e}", path.display())),
    }
}

/// Join a relative name under `root`, refusing to escape it.
fn contained_join(root: &Path, name: &str) -> Result<PathBuf, String> {
    let relative = Path::new(name);
    if relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
    {
        return Err(format!("bundled name escapes bundle directory: {name}"));
    }
    Ok(root.join(relative))
}

/// Library handles look like `ABC-123/L0/001`; files are named by the first
/// segment with any image extension.
async fn find_library_asset(root: &Path, handle: &str) -> Result<PathBuf, String> {
    let stem = handle.split('/').next().unwrap_or(handle);
    if stem.is_empty() || stem.contains(['\\', '.']) {
        return Err(format!("invalid library handle: {handle}"));
    }
    for ext in LIBRARY_EXTENSIONS {
        let candidate = root.join(format!("{stem}.{ext}"));
        if tokio::fs::metadata(&candidate).await.is_ok_and(|m| m.is_file()) {
            return Ok(candidate);
        }
    }
    let mut entries = tokio::fs::read_dir(root)
        .await
        .map_err(|e| format!("{}: {e}", root.display()))?;
    while let Ok(Some(entry)) = entries.next_entry().await {
        let path = entry.path();
        if path.file_stem().and_then(|s| s.to_str()) == Some(stem) && path.is_file() {
            return Ok(path);
        }
    }
    Err(format!("no library asset named {stem}"))
}
