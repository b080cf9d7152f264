//! Affine color filters.
//!
//! A filter is a 4×5 row-major matrix applied to straight (non-premultiplied)
//! RGBA in `0.0..=1.0`:
//!
//! ```text
//! | r' |   | m0  m1  m2  m3  m4  |   | r |
//! | g' |   | m5  m6  m7  m8  m9  |   | g |
//! | b' | = | m10 m11 m12 m13 m14 | · | b |
//! | a' |   | m15 m16 m17 m18 m19 |   | a |
//!                                     | 1 |
//! ```
//!
//! Intensity blends linearly from identity toward the full-strength matrix.

use serde::{Deserialize, Serialize};

/// Filter id meaning "no color transform".
pub const NO_FILTER: &str = "none";

/// A 4×5 affine color transform. Bias terms are in `0.0..=1.0` units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorMatrix(pub [f32; 20]);

impl ColorMatrix {
    /// The identity transform.
    pub const IDENTITY: Self = Self([
        1.0, 0.0, 0.0, 0.0, 0.0, //
        0.0, 1.0, 0.0, 0.0, 0.0, //
        0.0, 0.0, 1.0, 0.0, 0.0, //
        0.0, 0.0, 0.0, 1.0, 0.0,
    ]);

    /// The identity transform.
    #[must_use]
    pub const fn identity() -> Self {
        Self::IDENTITY
    }

    /// Raw coefficients, row-major.
    #[must_use]
    pub const fn values(&self) -> &[f32; 20] {
        &self.0
    }

    /// Elementwise `I + t·(self − I)`.
    #[must_use]
    pub fn blend_from_identity(&self, t: f32) -> Self {
        let identity = Self::IDENTITY.0;
        let mut out = [0.0; 20];
        for (i, value) in out.iter_mut().enumerate() {
            *value = identity[i] + t * (self.0[i] - identity[i]);
        }
        Self(out)
    }

    /// Transform one straight-alpha pixel, clamping the result.
    #[must_use]
    pub fn apply_pixel(&self, rgba: [f32; 4]) -> [f32; 4] {
        let m = &self.0;
        let [r, g, b, a] = rgba;
        let mut out = [0.0; 4];
        for (row, channel) in out.iter_mut().enumerate() {
            let k = row * 5;
            let value = m[k] * r + m[k + 1] * g + m[k + 2] * b + m[k + 3] * a + m[k + 4];
            *channel = value.clamp(0.0, 1.0);
        }
        out
    }

    /// Transform a straight-alpha RGBA8 buffer in place.
    ///
    /// Trailing bytes that do not form a whole pixel are left untouched.
    pub fn apply_rgba8(&self, pixels: &mut [u8]) {
        for px in pixels.chunks_exact_mut(4) {
            let input = [
                f32::from(px[0]) / 255.0,
                f32::from(px[1]) / 255.0,
                f32::from(px[2]) / 255.0,
                f32::from(px[3]) / 255.0,
            ];
            let output = self.apply_pixel(input);
            for (byte, value) in px.iter_mut().zip(output) {
                *byte = to_u8(value);
            }
        }
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // clamped to 0..=255
fn to_u8(value: f32) -> u8 {
    (value * 255.0).round().clamp(0.0, 255.0) as u8
}

/// A named filter plus intensity, as chosen in the editor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterDescriptor {
    /// Filter id, e.g. `"sepia"`.
    pub id: String,
    /// Strength in `0.0..=1.0`.
    #[serde(default = "FilterDescriptor::default_intensity")]
    pub intensity: f32,
}

impl FilterDescriptor {
    /// Create a descriptor.
    #[must_use]
    pub fn new(id: impl Into<String>, intensity: f32) -> Self {
        Self {
            id: id.into(),
            intensity,
        }
    }

    /// The matrix to apply, or `None` when no transform should run.
    #[must_use]
    pub fn matrix(&self) -> Option<ColorMatrix> {
        color_matrix(&self.id, self.intensity)
    }

    fn default_intensity() -> f32 {
        1.0
    }
}

/// Ids of every filter with a defined matrix.
#[must_use]
pub fn available_filters() -> &'static [&'static str] {
    &[
        "grayscale",
        "sepia",
        "vintage",
        "polaroid",
        "kodachrome",
        "technicolor",
        "brownie",
        "warm",
        "cool",
        "invert",
        "noir",
    ]
}

/// Compute the matrix for `filter` at `intensity`.
///
/// Returns `None` for [`NO_FILTER`] and unknown ids; callers skip the color
/// step entirely in that case. Intensity is clamped into `0.0..=1.0` and a
/// non-finite intensity is treated as 0.
#[must_use]
pub fn color_matrix(filter: &str, intensity: f32) -> Option<ColorMatrix> {
    let full = full_strength(filter)?;
    let t = if intensity.is_finite() {
        intensity.clamp(0.0, 1.0)
    } else {
        0.0
    };
    Some(full.blend_from_identity(t))
}

#[allow(clippy::excessive_precision, clippy::too_many_lines)]
fn full_strength(filter: &str) -> Option<ColorMatrix> {
    let m = match filter {
        "grayscale" => [
            0.2126, 0.7152, 0.0722, 0.0, 0.0, //
            0.2126, 0.7152, 0.0722, 0.0, 0.0, //
            0.2126, 0.7152, 0.0722, 0.0, 0.0, //
            0.0, 0.0, 0.0, 1.0, 0.0,
        ],
        "sepia" => [
            0.393, 0.769, 0.189, 0.0, 0.0, //
            0.349, 0.686, 0.168, 0.0, 0.0, //
            0.272, 0.534, 0.131, 0.0, 0.0, //
            0.0, 0.0, 0.0, 1.0, 0.0,
        ],
        "vintage" => [
            0.627_934_6, 0.320_218_3, -0.039_654_08, 0.0, 9.651_286 / 255.0, //
            0.025_783_98, 0.644_118_9, 0.032_591_28, 0.0, 7.462_829 / 255.0, //
            0.046_605_56, -0.085_123_3, 0.524_164_8, 0.0, 5.159_191 / 255.0, //
            0.0, 0.0, 0.0, 1.0, 0.0,
        ],
        "polaroid" => [
            1.438, -0.062, -0.062, 0.0, 0.0, //
            -0.122, 1.378, -0.122, 0.0, 0.0, //
            -0.016, -0.016, 1.483, 0.0, 0.0, //
            0.0, 0.0, 0.0, 1.0, 0.0,
        ],
        "kodachrome" => [
            1.128_558, -0.396_738_2, -0.039_925_59, 0.0, 63.729_59 / 255.0, //
            -0.164_043_4, 1.083_525, -0.054_988_05, 0.0, 24.732_41 / 255.0, //
            -0.167_860_1, -0.560_341_6, 1.601_485, 0.0, 35.629_83 / 255.0, //
            0.0, 0.0, 0.0, 1.0, 0.0,
        ],
        "technicolor" => [
            1.912_528, -0.854_534_5, -0.091_555_08, 0.0, 11.793_6 / 255.0, //
            -0.308_783_3, 1.765_891, -0.106_017_4, 0.0, -70.352_05 / 255.0, //
            -0.231_103_4, -0.750_189_9, 1.847_598, 0.0, 30.950_94 / 255.0, //
            0.0, 0.0, 0.0, 1.0, 0.0,
        ],
        "brownie" => [
            0.599_702_3, 0.345_532_4, -0.270_829_9, 0.0, 47.431_93 / 255.0, //
            -0.037_703_25, 0.860_957_8, 0.150_595_5, 0.0, -36.968_41 / 255.0, //
            0.241_136_4, -0.074_410_38, 0.449_721_8, 0.0, -7.562_075 / 255.0, //
            0.0, 0.0, 0.0, 1.0, 0.0,
        ],
        "warm" => [
            1.06, 0.0, 0.0, 0.0, 0.02, //
            0.0, 1.01, 0.0, 0.0, 0.0, //
            0.0, 0.0, 0.93, 0.0, 0.0, //
            0.0, 0.0, 0.0, 1.0, 0.0,
        ],
        "cool" => [
            0.93, 0.0, 0.0, 0.0, 0.0, //
            0.0, 1.01, 0.0, 0.0, 0.0, //
            0.0, 0.0, 1.08, 0.0, 0.02, //
            0.0, 0.0, 0.0, 1.0, 0.0,
        ],
        "invert" => [
            -1.0, 0.0, 0.0, 0.0, 1.0, //
            0.0, -1.0, 0.0, 0.0, 1.0, //
            0.0, 0.0, -1.0, 0.0, 1.0, //
            0.0, 0.0, 0.0, 1.0, 0.0,
        ],
        "noir" => [
            0.45, 0.9, 0.15, 0.0, -0.25, //
            0.45, 0.9, 0.15, 0.0, -0.25, //
            0.45, 0.9, 0.15, 0.0, -0.25, //
            0.0, 0.0, 0.0, 1.0, 0.0,
        ],
        _ => return None,
    };
    Some(ColorMatrix(m))
}
