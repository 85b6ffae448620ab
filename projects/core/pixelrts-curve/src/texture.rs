//! Lookup tables packed into an RGBA texture.
//!
//! Texel `i` (row-major) holds the coordinate of curve index `i`: `x` as a little-endian `u16` in
//! the R and G channels and `y` as a little-endian `u16` in B and A. Shaders can then resolve a curve
//! index with a single texture fetch.

use crate::hilbert::Coord;
use crate::lut::HilbertLut;
use pixelrts_common::color_8888::{pixels_to_bytes, Rgba8888};

/// A lookup table encoded as a `grid_size x grid_size` RGBA8888 texture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LutTexture {
    grid_size: u32,
    texels: Vec<Rgba8888>,
}

impl LutTexture {
    /// Packs a lookup table into a texture.
    pub fn from_lut(lut: &HilbertLut) -> Self {
        let texels = lut.coords().iter().map(|&coord| pack(coord)).collect();
        Self {
            grid_size: lut.grid_size(),
            texels,
        }
    }

    /// Texture width and height.
    #[inline]
    pub fn grid_size(&self) -> u32 {
        self.grid_size
    }

    /// Texels in row-major order.
    #[inline]
    pub fn texels(&self) -> &[Rgba8888] {
        &self.texels
    }

    /// Texels flattened into an upload-ready RGBA byte buffer.
    pub fn to_bytes(&self) -> Vec<u8> {
        pixels_to_bytes(&self.texels)
    }

    /// Reads the coordinate stored for curve index `index`.
    #[inline]
    pub fn lookup(&self, index: usize) -> Option<Coord> {
        self.texels.get(index).map(|&texel| unpack(texel))
    }
}

#[inline]
fn pack(coord: Coord) -> Rgba8888 {
    let [x_lo, x_hi] = (coord.x as u16).to_le_bytes();
    let [y_lo, y_hi] = (coord.y as u16).to_le_bytes();
    Rgba8888::new(x_lo, x_hi, y_lo, y_hi)
}

#[inline]
fn unpack(texel: Rgba8888) -> Coord {
    let x = u16::from_le_bytes([texel.r, texel.g]);
    let y = u16::from_le_bytes([texel.b, texel.a]);
    Coord::new(u32::from(x), u32::from(y))
}
