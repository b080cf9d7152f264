//! Partial element state used by `update` and recorded in history.

use serde::{Deserialize, Serialize};

use crate::element::{CanvasElement, Color, Point, TextEffect};

/// A partial update to a [`CanvasElement`].
///
/// Text fields only apply to text-bearing elements and `asset` only to
/// image-backed ones; inapplicable fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElementPatch {
    /// New position.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<Point>,
    /// New scale (must be > 0).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale: Option<f32>,
    /// New rotation in radians.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f32>,
    /// New intrinsic width.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f32>,
    /// New intrinsic height.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f32>,
    /// New opacity.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f32>,
    /// New text content.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_content: Option<String>,
    /// New font family.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    /// New font size.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f32>,
    /// New fill color.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
    /// New text effect.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effect: Option<TextEffect>,
    /// New background; `Some(None)` removes it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background: Option<Option<Color>>,
    /// New asset reference.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset: Option<String>,
}

impl ElementPatch {
    /// An empty patch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the position.
    #[must_use]
    pub fn with_position(mut self, x: f32, y: f32) -> Self {
        self.position = Some(Point::new(x, y));
        self
    }

    /// Set the scale.
    #[must_use]
    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = Some(scale);
        self
    }

    /// Set the rotation in radians.
    #[must_use]
    pub fn with_rotation(mut self, radians: f32) -> Self {
        self.rotation = Some(radians);
        self
    }

    /// Set the intrinsic size.
    #[must_use]
    pub fn with_size(mut self, width: f32, height: f32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    /// Set the opacity.
    #[must_use]
    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = Some(opacity);
        self
    }

    /// Set the text content.
    #[must_use]
    pub fn with_text(mut self, content: impl Into<String>) -> Self {
        self.text_content = Some(content.into());
        self
    }

    /// Set the font size.
    #[must_use]
    pub fn with_font_size(mut self, size: f32) -> Self {
        self.font_size = Some(size);
        self
    }

    /// Set the fill color.
    #[must_use]
    pub fn with_color(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }

    /// Set the text effect.
    #[must_use]
    pub fn with_effect(mut self, effect: TextEffect) -> Self {
        self.effect = Some(effect);
        self
    }

    /// Set or clear the background.
    #[must_use]
    pub fn with_background(mut self, background: Option<Color>) -> Self {
        self.background = Some(background);
        self
    }

    /// Set the asset reference.
    #[must_use]
    pub fn with_asset(mut self, asset: impl Into<String>) -> Self {
        self.asset = Some(asset.into());
        self
    }

    /// Whether no field is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Compute the minimal `(before, after)` pair that turns `before` into
    /// `after`. Both sides are empty when nothing differs.
    #[must_use]
    pub fn between(before: &CanvasElement, after: &CanvasElement) -> (Self, Self) {
        let full = after.capture(&Self::everything());
        let mut forward = Self::default();
        let mut backward = Self::default();

        macro_rules! diff_field {
            ($field:ident, $current:expr) => {
                if let Some(new) = full.$field.clone() {
                    let prev = $current;
                    if prev.as_ref() != Some(&new) {
                        forward.$field = Some(new);
                        backward.$field = prev;
                    }
                }
            };
        }

        let old = before.capture(&Self::everything());
        diff_field!(position, old.position);
        diff_field!(scale, old.scale);
        diff_field!(rotation, old.rotation);
        diff_field!(width, old.width);
        diff_field!(height, old.height);
        diff_field!(opacity, old.opacity);
        diff_field!(text_content, old.text_content.clone());
        diff_field!(font_family, old.font_family.clone());
        diff_field!(font_size, old.font_size);
        diff_field!(color, old.color);
        diff_field!(effect, old.effect);
        diff_field!(background, old.background);
        diff_field!(asset, old.asset.clone());

        (backward, forward)
    }

    /// A mask selecting every field, used to capture a full state.
    fn everything() -> Self {
        Self {
            position: Some(Point::default()),
            scale: Some(1.0),
            rotation: Some(0.0),
            width: Some(0.0),
            height: Some(0.0),
            opacity: Some(1.0),
            text_content: Some(String::new()),
            font_family: Some(String::new()),
            font_size: Some(0.0),
            color: Some(Color::WHITE),
            effect: Some(TextEffect::None),
            background: Some(None),
            asset: Some(String::new()),
        }
    }
}

impl CanvasElement {
    /// Read the current value of every field set in `fields` that applies to
    /// this element.
    #[must_use]
    pub fn capture(&self, fields: &ElementPatch) -> ElementPatch {
        let style = self.text_style();
        ElementPatch {
            position: fields.position.map(|_| self.position),
            scale: fields.scale.map(|_| self.scale),
            rotation: fields.rotation.map(|_| self.rotation),
            width: fields.width.map(|_| self.width),
            height: fields.height.map(|_| self.height),
            opacity: fields.opacity.map(|_| self.opacity),
            text_content: fields
                .text_content
                .as_ref()
                .and(style)
                .map(|s| s.content.clone()),
            font_family: fields
                .font_family
                .as_ref()
                .and(style)
                .map(|s| s.font_family.clone()),
            font_size: fields.font_size.and(style).map(|s| s.font_size),
            color: fields.color.and(style).map(|s| s.color),
            effect: fields.effect.and(style).map(|s| s.effect),
            background: fields.background.and(style).map(|s| s.background),
            asset: fields
                .asset
                .as_ref()
                .and(self.asset())
                .map(ToString::to_string),
        }
    }

    /// Reduce a caller patch to the fields that apply to this element and
    /// hold valid values.
    ///
    /// Non-positive or non-finite scales are dropped, opacity is clamped into
    /// `0.0..=1.0`, and non-finite geometry is dropped.
    #[must_use]
    pub fn sanitize_patch(&self, mut patch: ElementPatch) -> ElementPatch {
        if let Some(scale) = patch.scale {
            if !(scale.is_finite() && scale > 0.0) {
                tracing::warn!("Rejecting non-positive scale {scale} for element {}", self.id);
                patch.scale = None;
            }
        }
        if let Some(opacity) = patch.opacity {
            patch.opacity = opacity.is_finite().then(|| opacity.clamp(0.0, 1.0));
        }
        if patch
            .position
            .is_some_and(|p| !(p.x.is_finite() && p.y.is_finite()))
        {
            patch.position = None;
        }
        patch.rotation = patch.rotation.filter(|r| r.is_finite());
        patch.width = patch.width.filter(|w| w.is_finite() && *w >= 0.0);
        patch.height = patch.height.filter(|h| h.is_finite() && *h >= 0.0);
        patch.font_size = patch.font_size.filter(|s| s.is_finite() && *s > 0.0);

        if !self.is_text_bearing() {
            patch.text_content = None;
            patch.font_family = None;
            patch.font_size = None;
            patch.color = None;
            patch.effect = None;
            patch.background = None;
        }
        if self.asset().is_none() {
            patch.asset = None;
        }
        patch
    }

    /// Merge a patch into this element. Inapplicable fields are ignored.
    pub fn apply_patch(&mut self, patch: &ElementPatch) {
        if let Some(position) = patch.position {
            self.position = position;
        }
        if let Some(scale) = patch.scale {
            self.scale = scale;
        }
        if let Some(rotation) = patch.rotation {
            self.rotation = rotation;
        }
        if let Some(width) = patch.width {
            self.width = width;
        }
        if let Some(height) = patch.height {
            self.height = height;
        }
        if let Some(opacity) = patch.opacity {
            self.opacity = opacity;
        }
        if let Some(style) = self.text_style_mut() {
            if let Some(content) = &patch.text_content {
                style.content.clone_from(content);
            }
            if let Some(family) = &patch.font_family {
                style.font_family.clone_from(family);
            }
            if let Some(size) = patch.font_size {
                style.font_size = size;
            }
            if let Some(color) = patch.color {
                style.color = color;
            }
            if let Some(effect) = patch.effect {
                style.effect = effect;
            }
            if let Some(background) = patch.background {
                style.background = background;
            }
        }
        if let (Some(asset), Some(current)) = (&patch.asset, self.asset_mut()) {
            current.clone_from(asset);
        }
    }
}
