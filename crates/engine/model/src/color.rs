//! Packed ARGB colors
//!
//! Colors travel through the pipeline as a single `u32` laid out `0xAARRGGBB`,
//! the same packing the persisted palette table uses for its keys.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Luma weights used when comparing colors (R, G, B)
pub const LUMA_WEIGHTS: [f32; 3] = [0.30, 0.59, 0.11];

/// A color packed as `0xAARRGGBB`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Argb(pub u32);

impl Argb {
    /// Fully opaque mid-gray, used when a material has neither texture nor color
    pub const DEFAULT_GRAY: Argb = Argb::new(255, 128, 128, 128);

    pub const fn new(a: u8, r: u8, g: u8, b: u8) -> Self {
        Self(((a as u32) << 24) | ((r as u32) << 16) | ((g as u32) << 8) | b as u32)
    }

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self::new(255, r, g, b)
    }

    /// Build from a diffuse float triplet in `0..=1`, scaling to `0..=255`
    /// (truncating) with full opacity
    pub fn from_unit_rgb(r: f32, g: f32, b: f32) -> Self {
        let channel = |v: f32| (v * 255.0).clamp(0.0, 255.0) as u8;
        Self::opaque(channel(r), channel(g), channel(b))
    }

    #[inline]
    pub const fn a(self) -> u8 {
        (self.0 >> 24) as u8
    }

    #[inline]
    pub const fn r(self) -> u8 {
        (self.0 >> 16) as u8
    }

    #[inline]
    pub const fn g(self) -> u8 {
        (self.0 >> 8) as u8
    }

    #[inline]
    pub const fn b(self) -> u8 {
        self.0 as u8
    }

    #[inline]
    pub const fn is_opaque(self) -> bool {
        self.a() == 255
    }

    /// Luma-weighted squared distance over the RGB channels (alpha ignored)
    pub fn weighted_distance(self, other: Argb) -> f32 {
        let dr = self.r() as f32 - other.r() as f32;
        let dg = self.g() as f32 - other.g() as f32;
        let db = self.b() as f32 - other.b() as f32;
        dr * dr * LUMA_WEIGHTS[0] + dg * dg * LUMA_WEIGHTS[1] + db * db * LUMA_WEIGHTS[2]
    }
}

impl From<image::Rgba<u8>> for Argb {
    fn from(pixel: image::Rgba<u8>) -> Self {
        let [r, g, b, a] = pixel.0;
        Argb::new(a, r, g, b)
    }
}

impl fmt::Display for Argb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "argb({}, {}, {}, {})",
            self.a(),
            self.r(),
            self.g(),
            self.b()
        )
    }
}
