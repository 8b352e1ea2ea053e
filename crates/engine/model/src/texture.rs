//! Material textures

use crate::color::Argb;
use glam::Vec2;
use image::RgbaImage;
use std::path::Path;

/// A decoded RGBA texture
#[derive(Debug, Clone)]
pub struct Texture {
    image: RgbaImage,
}

impl Texture {
    pub fn open(path: &Path) -> Result<Self, image::ImageError> {
        Ok(Self::from_image(image::open(path)?.to_rgba8()))
    }

    pub fn from_image(image: RgbaImage) -> Self {
        Self { image }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Color at texture coordinate `uv`
    ///
    /// The V axis is flipped (OBJ puts `v = 0` at the bottom of the image) and
    /// both axes wrap, so coordinates outside `0..1` tile the texture.
    pub fn sample(&self, uv: Vec2) -> Argb {
        let (width, height) = (self.width(), self.height());
        if width == 0 || height == 0 {
            return Argb::DEFAULT_GRAY;
        }
        let x = wrap_texel(uv.x, width);
        let y = wrap_texel(1.0 - uv.y, height);
        Argb::from(*self.image.get_pixel(x, y))
    }

    /// Per-channel integer mean over every pixel, alpha included
    pub fn average_color(&self) -> Option<Argb> {
        let count = self.width() as u64 * self.height() as u64;
        if count == 0 {
            return None;
        }
        let mut sum = [0u64; 4];
        for pixel in self.image.pixels() {
            for (total, channel) in sum.iter_mut().zip(pixel.0) {
                *total += channel as u64;
            }
        }
        let [r, g, b, a] = sum.map(|total| (total / count) as u8);
        Some(Argb::new(a, r, g, b))
    }
}

/// Pixel index for a texture coordinate scaled by `size`, minus one, wrapped
/// into `0..size`
///
/// Works in `i64` so far out-of-range coordinates saturate instead of
/// overflowing.
fn wrap_texel(coordinate: f32, size: u32) -> u32 {
    let texel = ((coordinate * size as f32) as i64).saturating_sub(1);
    texel.rem_euclid(i64::from(size)) as u32
}
