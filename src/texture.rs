//! Base-color sources sampled by the shading routine.

use glam::{Vec2, Vec3};
use thiserror::Error;

/// Anything that yields a linear-space base color for a UV coordinate.
pub trait BaseColorSource {
    fn sample(&self, uv: Vec2) -> Vec3;
}

/// Uniform base color.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolidColor(pub Vec3);

impl BaseColorSource for SolidColor {
    fn sample(&self, _uv: Vec2) -> Vec3 {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TextureError {
    #[error("texture has zero area ({width}x{height})")]
    Empty { width: u32, height: u32 },
    #[error("expected {expected} bytes of texel data, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },
}

/// Decoded texture with repeat addressing and nearest filtering.
///
/// Row 0 is `v = 0`; texels are stored as linear RGB.
#[derive(Debug, Clone, PartialEq)]
pub struct Texture {
    width: u32,
    height: u32,
    texels: Vec<Vec3>,
}

impl Texture {
    pub fn from_texels(width: u32, height: u32, texels: Vec<Vec3>) -> Result<Self, TextureError> {
        if width == 0 || height == 0 {
            return Err(TextureError::Empty { width, height });
        }
        let expected = width as usize * height as usize;
        if texels.len() != expected {
            return Err(TextureError::SizeMismatch {
                expected,
                actual: texels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            texels,
        })
    }

    /// Builds a texture from tightly packed RGBA8 data. Bytes are treated as
    /// linear values; alpha is ignored.
    pub fn from_rgba8(width: u32, height: u32, data: &[u8]) -> Result<Self, TextureError> {
        let expected = width as usize * height as usize * 4;
        if data.len() != expected {
            return Err(TextureError::SizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        let texels = data
            .chunks_exact(4)
            .map(|px| Vec3::new(px[0] as f32, px[1] as f32, px[2] as f32) / 255.0)
            .collect();
        Self::from_texels(width, height, texels)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Packs the texels back into RGBA8 with opaque alpha, row-major.
    pub fn to_rgba8(&self) -> Vec<u8> {
        self.texels
            .iter()
            .flat_map(|texel| {
                let [r, g, b] = (texel.clamp(Vec3::ZERO, Vec3::ONE) * 255.0).round().to_array();
                [r as u8, g as u8, b as u8, u8::MAX]
            })
            .collect()
    }

    fn texel(&self, x: u32, y: u32) -> Vec3 {
        self.texels[y as usize * self.width as usize + x as usize]
    }
}

impl BaseColorSource for Texture {
    fn sample(&self, uv: Vec2) -> Vec3 {
        let x = wrap(uv.x, self.width);
        let y = wrap(uv.y, self.height);
        self.texel(x, y)
    }
}

fn wrap(coord: f32, extent: u32) -> u32 {
    if !coord.is_finite() {
        return 0;
    }
    let scaled = (coord.rem_euclid(1.0) * extent as f32).floor() as u32;
    scaled.min(extent - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker() -> Texture {
        // 2x1: black then white
        Texture::from_rgba8(2, 1, &[0, 0, 0, 255, 255, 255, 255, 255]).unwrap()
    }

    #[test]
    fn samples_nearest_texel() {
        let texture = checker();
        assert_eq!(texture.sample(Vec2::new(0.25, 0.5)), Vec3::ZERO);
        assert_eq!(texture.sample(Vec2::new(0.75, 0.5)), Vec3::ONE);
    }

    #[test]
    fn repeats_outside_unit_square() {
        let texture = checker();
        assert_eq!(texture.sample(Vec2::new(1.25, 0.0)), Vec3::ZERO);
        assert_eq!(texture.sample(Vec2::new(-0.25, 0.0)), Vec3::ONE);
        assert_eq!(texture.sample(Vec2::new(3.75, 7.0)), Vec3::ONE);
    }

    #[test]
    fn rejects_mismatched_data() {
        assert_eq!(
            Texture::from_rgba8(2, 2, &[0; 4]),
            Err(TextureError::SizeMismatch {
                expected: 16,
                actual: 4
            })
        );
        assert_eq!(
            Texture::from_texels(0, 4, Vec::new()),
            Err(TextureError::Empty {
                width: 0,
                height: 4
            })
        );
    }

    #[test]
    fn packs_back_to_rgba8() {
        let texture = Texture::from_texels(1, 2, vec![Vec3::new(1.0, 0.5, 2.0), Vec3::ZERO]).unwrap();
        assert_eq!(texture.to_rgba8(), vec![255, 128, 255, 255, 0, 0, 0, 255]);
    }

    #[test]
    fn solid_color_ignores_uv() {
        let solid = SolidColor(Vec3::new(0.2, 0.4, 0.6));
        assert_eq!(solid.sample(Vec2::new(9.0, -3.0)), solid.0);
    }
}
