//! Terrain field parameters and vertex color handling.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ConfigError;

/// Largest accepted segment count (vertices per side = segments + 1)
pub const MAX_SEGMENTS: usize = 1024;

/// Linear RGB color with channels in 0.0..=1.0
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Parse a `#rrggbb` (or `rrggbb`) hex string
    pub fn from_hex(hex: &str) -> Result<Self, ConfigError> {
        let digits = hex.trim().trim_start_matches('#');
        if digits.len() != 6 || !digits.is_ascii() {
            return Err(ConfigError::Invalid(format!(
                "color must be #rrggbb, got '{}'",
                hex
            )));
        }

        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&digits[range], 16)
                .map(|v| v as f32 / 255.0)
                .map_err(|_| ConfigError::Invalid(format!("invalid hex color '{}'", hex)))
        };

        Ok(Self {
            r: channel(0..2)?,
            g: channel(2..4)?,
            b: channel(4..6)?,
        })
    }

    /// Per-channel linear interpolation (`t` = 0 yields `self`, 1 yields `other`)
    pub fn lerp(self, other: Color, t: f32) -> Color {
        // Weighted form so both endpoints are reproduced exactly
        let s = 1.0 - t;
        Color {
            r: self.r * s + other.r * t,
            g: self.g * s + other.g * t,
            b: self.b * s + other.b * t,
        }
    }

    pub fn to_array(self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }

    /// Quantize to 8-bit channels (for image output)
    pub fn to_rgb8(self) -> [u8; 3] {
        let q = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        [q(self.r), q(self.g), q(self.b)]
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b] = self.to_rgb8();
        write!(f, "#{:02x}{:02x}{:02x}", r, g, b)
    }
}

impl TryFrom<String> for Color {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Color::from_hex(&value)
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

/// Terrain field parameters, mutated live by whatever drives the visualizer
///
/// The field generator re-reads these every frame. Changing `width`, `depth`
/// or `segments` causes the grid to be rebuilt on the next update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainParams {
    /// Scroll rate of the noise field (scaled by 10 per second of frame time)
    pub speed: f32,

    /// Noise amplitude: heights span -height_scale/2 ..= +height_scale/2
    pub height_scale: f32,

    /// Spatial frequency of noise sampling (noise units per grid step)
    pub noise_scale: f32,

    /// Height added per unit of normalized audio energy
    pub audio_strength: f32,

    /// Render as lines rather than a shaded surface
    pub wireframe: bool,

    /// Color at the top of the height ramp
    pub color_high: Color,

    /// Color at the bottom of the height ramp
    pub color_low: Color,

    /// Grid extent along X (world units)
    pub width: f32,

    /// Grid extent along Z (world units)
    pub depth: f32,

    /// Grid subdivisions per side
    pub segments: usize,
}

impl Default for TerrainParams {
    fn default() -> Self {
        Self {
            speed: 0.05,
            height_scale: 40.0,
            noise_scale: 0.5,
            audio_strength: 60.0,
            wireframe: true,
            color_high: Color::new(1.0, 0.0, 0.8), // #ff00cc
            color_low: Color::new(0.0, 0.8, 1.0),  // #00ccff
            width: 300.0,
            depth: 300.0,
            segments: 24,
        }
    }
}

impl TerrainParams {
    /// Vertices per grid side
    pub fn vertices_per_side(&self) -> usize {
        self.segments + 1
    }

    /// Validate parameter ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.segments == 0 || self.segments > MAX_SEGMENTS {
            return Err(ConfigError::Invalid(format!(
                "segments must be in 1..={}, got {}",
                MAX_SEGMENTS, self.segments
            )));
        }
        if !(self.width.is_finite() && self.width > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "width must be positive, got {}",
                self.width
            )));
        }
        if !(self.depth.is_finite() && self.depth > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "depth must be positive, got {}",
                self.depth
            )));
        }
        if !(self.height_scale.is_finite() && self.height_scale >= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "height_scale must be >= 0, got {}",
                self.height_scale
            )));
        }
        for (name, value) in [
            ("speed", self.speed),
            ("noise_scale", self.noise_scale),
            ("audio_strength", self.audio_strength),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::Invalid(format!(
                    "{} must be finite, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}
