//! Canvas elements - the layers stacked on top of the source photo.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{CoreError, CoreResult};

/// Smallest scale reachable through an interactive pinch.
pub const MIN_INTERACTIVE_SCALE: f32 = 0.1;

/// Largest scale reachable through an interactive pinch.
pub const MAX_INTERACTIVE_SCALE: f32 = 5.0;

/// Clamp a gesture-produced scale into the interactive range.
///
/// Programmatic updates are not clamped; they only have to stay positive.
#[must_use]
pub fn clamp_interactive_scale(scale: f32) -> f32 {
    if scale.is_nan() {
        return MIN_INTERACTIVE_SCALE;
    }
    scale.clamp(MIN_INTERACTIVE_SCALE, MAX_INTERACTIVE_SCALE)
}

/// Unique identifier for an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementId(Uuid);

impl ElementId {
    /// Create a new unique element ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create from an existing UUID.
    #[must_use]
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Parse an ID from its string form.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not a valid UUID.
    pub fn parse(value: &str) -> Result<Self, uuid::Error> {
        Uuid::parse_str(value).map(Self)
    }
}

impl Default for ElementId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A point in editing-canvas pixels, origin top-left.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal offset.
    pub x: f32,
    /// Vertical offset.
    pub y: f32,
}

impl Point {
    /// Create a point.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// A size in editing-canvas pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    /// Width.
    pub width: f32,
    /// Height.
    pub height: f32,
}

impl Size {
    /// Create a size.
    #[must_use]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Whether both axes are finite and strictly positive.
    #[must_use]
    pub fn is_usable(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

/// Raster dimensions of a source photo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelSize {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl PixelSize {
    /// Create pixel dimensions.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// An RGBA8 color, serialized as `#RRGGBB` or `#RRGGBBAA`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel (255 = opaque).
    pub a: u8,
}

impl Color {
    /// Opaque white.
    pub const WHITE: Self = Self::rgb(255, 255, 255);
    /// Opaque black.
    pub const BLACK: Self = Self::rgb(0, 0, 0);

    /// Create an opaque color.
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Create a color with alpha.
    #[must_use]
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Parse a `#RRGGBB`, `#RRGGBBAA` or `#RGB` hex string.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidColor`] if the string is not valid hex.
    pub fn from_hex(value: &str) -> CoreResult<Self> {
        let digits = value.trim().trim_start_matches('#');
        let invalid = || CoreError::InvalidColor(value.to_string());
        let channel = |s: &str| u8::from_str_radix(s, 16).map_err(|_| invalid());

        if !digits.is_ascii() {
            return Err(invalid());
        }
        match digits.len() {
            3 => {
                let expand = |i: usize| channel(&digits[i..=i].repeat(2));
                Ok(Self::rgb(expand(0)?, expand(1)?, expand(2)?))
            }
            6 => Ok(Self::rgb(
                channel(&digits[0..2])?,
                channel(&digits[2..4])?,
                channel(&digits[4..6])?,
            )),
            8 => Ok(Self::rgba(
                channel(&digits[0..2])?,
                channel(&digits[2..4])?,
                channel(&digits[4..6])?,
                channel(&digits[6..8])?,
            )),
            _ => Err(invalid()),
        }
    }

    /// Format as lowercase hex, omitting alpha when opaque.
    #[must_use]
    pub fn to_hex(&self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }

    /// Relative luminance in `0.0..=1.0` (Rec. 709 weights, no gamma).
    #[must_use]
    pub fn luminance(&self) -> f32 {
        (0.2126 * f32::from(self.r) + 0.7152 * f32::from(self.g) + 0.0722 * f32::from(self.b))
            / 255.0
    }

    /// Alpha as a fraction.
    #[must_use]
    pub fn alpha_fraction(&self) -> f32 {
        f32::from(self.a) / 255.0
    }
}

impl TryFrom<String> for Color {
    type Error = CoreError;

    fn try_from(value: String) -> CoreResult<Self> {
        Self::from_hex(&value)
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_hex()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Visual effect painted underneath a text run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextEffect {
    /// Plain fill.
    #[default]
    None,
    /// Two stacked colored halos, wide then tight.
    Neon,
    /// One soft same-color halo.
    Glow,
    /// Offset blurred dark copy.
    Shadow,
    /// Contrasting stroke around the glyphs.
    Outline,
}

impl TextEffect {
    /// Parse an effect name, case-insensitively.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "none" => Some(Self::None),
            "neon" => Some(Self::Neon),
            "glow" => Some(Self::Glow),
            "shadow" => Some(Self::Shadow),
            "outline" => Some(Self::Outline),
            _ => None,
        }
    }
}

/// Everything needed to rasterize a text run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextStyle {
    /// The text to draw.
    pub content: String,
    /// Font family name.
    #[serde(default = "TextStyle::default_family")]
    pub font_family: String,
    /// Font size in canvas pixels.
    pub font_size: f32,
    /// Fill color.
    pub color: Color,
    /// Effect painted before the fill.
    #[serde(default)]
    pub effect: TextEffect,
    /// Optional rounded-rect background.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<Color>,
}

impl TextStyle {
    /// Create a plain white style.
    #[must_use]
    pub fn new(content: impl Into<String>, font_size: f32) -> Self {
        Self {
            content: content.into(),
            font_family: Self::default_family(),
            font_size,
            color: Color::WHITE,
            effect: TextEffect::None,
            background: None,
        }
    }

    /// Set the fill color.
    #[must_use]
    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    /// Set the font family.
    #[must_use]
    pub fn with_family(mut self, family: impl Into<String>) -> Self {
        self.font_family = family.into();
        self
    }

    /// Set the effect.
    #[must_use]
    pub fn with_effect(mut self, effect: TextEffect) -> Self {
        self.effect = effect;
        self
    }

    /// Set the background color.
    #[must_use]
    pub fn with_background(mut self, background: Option<Color>) -> Self {
        self.background = background;
        self
    }

    fn default_family() -> String {
        "sans-serif".to_string()
    }
}

/// What a watermark draws.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WatermarkSource {
    /// Text that is rasterized before flattening.
    Text(TextStyle),
    /// A resolved or resolvable image reference.
    Image {
        /// Asset reference (local path, URL, library handle, bundled name).
        asset: String,
    },
}

/// The type of content an element contains.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ElementKind {
    /// A free text layer.
    Text(TextStyle),
    /// A decorative image.
    Sticker {
        /// Asset reference.
        asset: String,
    },
    /// A watermark, either text or image.
    Watermark {
        /// Watermark content.
        source: WatermarkSource,
    },
    /// A stamp image.
    Stamp {
        /// Asset reference.
        asset: String,
    },
}

impl ElementKind {
    /// Short lowercase name of the variant.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Sticker { .. } => "sticker",
            Self::Watermark { .. } => "watermark",
            Self::Stamp { .. } => "stamp",
        }
    }
}

/// A layer on the canvas with content and transform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanvasElement {
    /// Unique identifier.
    pub id: ElementId,
    /// Element content.
    #[serde(flatten)]
    pub kind: ElementKind,
    /// Top-left position in editing-canvas pixels.
    pub position: Point,
    /// Uniform scale factor, always > 0.
    #[serde(default = "CanvasElement::default_scale")]
    pub scale: f32,
    /// Rotation in radians, clockwise.
    #[serde(default)]
    pub rotation: f32,
    /// Intrinsic (unscaled) width.
    #[serde(default)]
    pub width: f32,
    /// Intrinsic (unscaled) height.
    #[serde(default)]
    pub height: f32,
    /// Opacity in `0.0..=1.0`.
    #[serde(default = "CanvasElement::default_opacity")]
    pub opacity: f32,
}

impl CanvasElement {
    /// Create an element of the given kind at the origin.
    #[must_use]
    pub fn new(kind: ElementKind) -> Self {
        Self {
            id: ElementId::new(),
            kind,
            position: Point::default(),
            scale: 1.0,
            rotation: 0.0,
            width: 0.0,
            height: 0.0,
            opacity: 1.0,
        }
    }

    /// Create a text layer.
    #[must_use]
    pub fn text(style: TextStyle) -> Self {
        Self::new(ElementKind::Text(style))
    }

    /// Create a sticker with its intrinsic size.
    #[must_use]
    pub fn sticker(asset: impl Into<String>, width: f32, height: f32) -> Self {
        Self::new(ElementKind::Sticker {
            asset: asset.into(),
        })
        .with_size(width, height)
    }

    /// Create a stamp with its intrinsic size.
    #[must_use]
    pub fn stamp(asset: impl Into<String>, width: f32, height: f32) -> Self {
        Self::new(ElementKind::Stamp {
            asset: asset.into(),
        })
        .with_size(width, height)
    }

    /// Create an image watermark with its intrinsic size.
    #[must_use]
    pub fn image_watermark(asset: impl Into<String>, width: f32, height: f32) -> Self {
        Self::new(ElementKind::Watermark {
            source: WatermarkSource::Image {
                asset: asset.into(),
            },
        })
        .with_size(width, height)
    }

    /// Create a text watermark.
    #[must_use]
    pub fn text_watermark(style: TextStyle) -> Self {
        Self::new(ElementKind::Watermark {
            source: WatermarkSource::Text(style),
        })
    }

    /// Set the ID.
    #[must_use]
    pub fn with_id(mut self, id: ElementId) -> Self {
        self.id = id;
        self
    }

    /// Set the position.
    #[must_use]
    pub fn with_position(mut self, x: f32, y: f32) -> Self {
        self.position = Point::new(x, y);
        self
    }

    /// Set the intrinsic size.
    #[must_use]
    pub fn with_size(mut self, width: f32, height: f32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Set the scale.
    #[must_use]
    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    /// Set the rotation in radians.
    #[must_use]
    pub fn with_rotation(mut self, radians: f32) -> Self {
        self.rotation = radians;
        self
    }

    /// Set the opacity.
    #[must_use]
    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity;
        self
    }

    /// The text style, for text layers and text watermarks.
    #[must_use]
    pub fn text_style(&self) -> Option<&TextStyle> {
        match &self.kind {
            ElementKind::Text(style)
            | ElementKind::Watermark {
                source: WatermarkSource::Text(style),
            } => Some(style),
            _ => None,
        }
    }

    /// Mutable access to the text style.
    pub fn text_style_mut(&mut self) -> Option<&mut TextStyle> {
        match &mut self.kind {
            ElementKind::Text(style)
            | ElementKind::Watermark {
                source: WatermarkSource::Text(style),
            } => Some(style),
            _ => None,
        }
    }

    /// The asset reference, for image-backed layers.
    #[must_use]
    pub fn asset(&self) -> Option<&str> {
        match &self.kind {
            ElementKind::Sticker { asset }
            | ElementKind::Stamp { asset }
            | ElementKind::Watermark {
                source: WatermarkSource::Image { asset },
            } => Some(asset),
            _ => None,
        }
    }

    /// Mutable access to the asset reference.
    pub fn asset_mut(&mut self) -> Option<&mut String> {
        match &mut self.kind {
            ElementKind::Sticker { asset }
            | ElementKind::Stamp { asset }
            | ElementKind::Watermark {
                source: WatermarkSource::Image { asset },
            } => Some(asset),
            _ => None,
        }
    }

    /// Whether this element must be rasterized before flattening.
    #[must_use]
    pub fn is_text_bearing(&self) -> bool {
        self.text_style().is_some()
    }

    /// Width after applying the element's own scale.
    #[must_use]
    pub fn scaled_width(&self) -> f32 {
        self.width * self.scale
    }

    /// Height after applying the element's own scale.
    #[must_use]
    pub fn scaled_height(&self) -> f32 {
        self.height * self.scale
    }

    const fn default_scale() -> f32 {
        1.0
    }

    const fn default_opacity() -> f32 {
        1.0
    }
}
