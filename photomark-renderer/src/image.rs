//! Image decoding, pixel-format conversion and encoding.
//!
//! Decoded images are straight-alpha RGBA8; tiny-skia surfaces are
//! premultiplied. Conversions between the two live here.

use image::ImageEncoder;
use photomark_core::Color;
use tiny_skia::{ColorU8, IntSize, Pixmap};

use crate::error::{RenderError, RenderResult};

/// A decoded image with straight (non-premultiplied) alpha.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// RGBA pixel data (4 bytes per pixel).
    pub data: Vec<u8>,
    /// Container format the bytes were in.
    pub format: ImageFormat,
}

/// Recognized image container formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// PNG with alpha support.
    Png,
    /// JPEG (no alpha).
    Jpeg,
    /// WebP (alpha support).
    WebP,
    /// GIF (first frame only).
    Gif,
    /// Unknown/other format.
    Unknown,
}

impl ImageFormat {
    /// Detect format from file extension.
    #[must_use]
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "png" => Self::Png,
            "jpg" | "jpeg" => Self::Jpeg,
            "webp" => Self::WebP,
            "gif" => Self::Gif,
            _ => Self::Unknown,
        }
    }

    /// Detect format from magic bytes.
    #[must_use]
    pub fn from_magic_bytes(data: &[u8]) -> Self {
        if data.len() < 4 {
            return Self::Unknown;
        }
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
            return Self::Png;
        }
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Self::Jpeg;
        }
        if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
            return Self::WebP;
        }
        if data.starts_with(b"GIF8") {
            return Self::Gif;
        }
        Self::Unknown
    }

    /// Conventional file extension, used when caching downloaded assets.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::WebP => "webp",
            Self::Gif => "gif",
            Self::Unknown => "bin",
        }
    }
}

/// Decode an image from raw bytes.
///
/// # Errors
///
/// Returns [`RenderError::Resource`] if the image cannot be decoded.
pub fn decode_image(data: &[u8]) -> RenderResult<DecodedImage> {
    let format = ImageFormat::from_magic_bytes(data);

    let img = image::load_from_memory(data)
        .map_err(|e| RenderError::Resource(format!("Failed to decode image: {e}")))?;

    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();

    Ok(DecodedImage {
        width,
        height,
        data: rgba.into_raw(),
        format,
    })
}

/// Decode the payload of a `data:` URI.
///
/// Supports `data:image/png;base64,iVBOR...` and percent-encoded payloads.
///
/// # Errors
///
/// Returns [`RenderError::Resource`] if the URI is malformed.
pub fn decode_data_uri(uri: &str) -> RenderResult<Vec<u8>> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| RenderError::Resource("Not a data URI".to_string()))?;

    let (metadata, payload) = rest
        .split_once(',')
        .ok_or_else(|| RenderError::Resource("Invalid data URI: missing comma".to_string()))?;

    if metadata.split(';').any(|part| part == "base64") {
        use base64::Engine;
        base64::engine::general_purpose::STANDARD
            .decode(payload.trim())
            .map_err(|e| RenderError::Resource(format!("Failed to decode base64: {e}")))
    } else {
        percent_decode(payload)
    }
}

fn percent_decode(input: &str) -> RenderResult<Vec<u8>> {
    let bytes = input.as_bytes();
    let mut result = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let byte = bytes
                .get(i + 1..i + 3)
                .and_then(|hex| std::str::from_utf8(hex).ok())
                .and_then(|hex| u8::from_str_radix(hex, 16).ok())
                .ok_or_else(|| RenderError::Resource("Invalid URL encoding".to_string()))?;
            result.push(byte);
            i += 3;
        } else {
            result.push(bytes[i]);
            i += 1;
        }
    }
    Ok(result)
}

/// Wrap straight-alpha RGBA into a premultiplied surface.
///
/// # Errors
///
/// Returns [`RenderError::Surface`] if the size is zero or does not match the
/// buffer length.
pub fn rgba_to_pixmap(width: u32, height: u32, mut data: Vec<u8>) -> RenderResult<Pixmap> {
    for px in data.chunks_exact_mut(4) {
        let c = ColorU8::from_rgba(px[0], px[1], px[2], px[3]).premultiply();
        px.copy_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }
    let size = IntSize::from_wh(width, height)
        .ok_or_else(|| RenderError::Surface(format!("Invalid size {width}x{height}")))?;
    Pixmap::from_vec(data, size)
        .ok_or_else(|| RenderError::Surface(format!("Buffer does not match {width}x{height}")))
}

/// Convert a decoded image into a premultiplied surface.
///
/// # Errors
///
/// Returns [`RenderError::Surface`] for empty images.
pub fn decoded_to_pixmap(image: DecodedImage) -> RenderResult<Pixmap> {
    rgba_to_pixmap(image.width, image.height, image.data)
}

/// Straight-alpha RGBA copy of a surface.
#[must_use]
pub fn pixmap_to_rgba(pixmap: &Pixmap) -> Vec<u8> {
    let mut out = Vec::with_capacity(pixmap.data().len());
    for px in pixmap.pixels() {
        let c = px.demultiply();
        out.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }
    out
}

/// Encode a surface as PNG.
///
/// # Errors
///
/// Returns [`RenderError::Encode`] if encoding fails.
pub fn encode_png(pixmap: &Pixmap) -> RenderResult<Vec<u8>> {
    pixmap
        .encode_png()
        .map_err(|e| RenderError::Encode(format!("PNG encoding failed: {e}")))
}

/// Encode a surface as JPEG, flattening alpha against `background`.
///
/// # Errors
///
/// Returns [`RenderError::Encode`] if encoding fails (e.g. dimensions beyond
/// the JPEG limit).
pub fn encode_jpeg(pixmap: &Pixmap, quality: u8, background: Color) -> RenderResult<Vec<u8>> {
    let (width, height) = (pixmap.width(), pixmap.height());
    let bg = [background.r, background.g, background.b];
    let mut rgb_data = Vec::with_capacity(pixmap.data().len() / 4 * 3);
    for pixel in pixmap.data().chunks_exact(4) {
        // Premultiplied source over opaque background.
        let inv = 255 - u16::from(pixel[3]);
        for channel in 0..3 {
            let value = u16::from(pixel[channel]) + (u16::from(bg[channel]) * inv + 127) / 255;
            rgb_data.push(u8::try_from(value.min(255)).unwrap_or(u8::MAX));
        }
    }

    let mut buf = std::io::Cursor::new(Vec::new());
    let encoder =
        image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100));
    encoder
        .write_image(&rgb_data, width, height, image::ExtendedColorType::Rgb8)
        .map_err(|e| RenderError::Encode(format!("JPEG encoding failed: {e}")))?;

    Ok(buf.into_inner())
}
