//! RGBA8888 pixels, the unit every PixelRTS container image is made of.

use alloc::vec::Vec;
use thiserror::Error;

/// Number of bytes in one [`Rgba8888`] pixel.
pub const BYTES_PER_PIXEL: usize = 4;

/// Errors raised when reinterpreting raw byte buffers as pixels.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PixelBufferError {
    /// The buffer length is not a multiple of [`BYTES_PER_PIXEL`].
    #[error("Pixel buffer length {len} is not a multiple of 4")]
    UnalignedLength {
        /// Length of the rejected buffer.
        len: usize,
    },
}

/// Represents a single RGBA8888 pixel of a container image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(C)]
pub struct Rgba8888 {
    /// Red component (0-255)
    pub r: u8,
    /// Green component (0-255)
    pub g: u8,
    /// Blue component (0-255)
    pub b: u8,
    /// Alpha component (0-255)
    pub a: u8,
}

impl Rgba8888 {
    /// Fully transparent black, the value of every pixel not covered by a payload.
    pub const TRANSPARENT: Self = Self::new(0, 0, 0, 0);

    /// Constructs a new [`Rgba8888`] from the specified red, green, blue, and alpha components.
    ///
    /// # Examples
    ///
    /// ```
    /// use pixelrts_common::color_8888::Rgba8888;
    ///
    /// let pixel = Rgba8888::new(255, 0, 0, 255);
    /// assert_eq!(pixel.r, 255);
    /// assert_eq!(pixel.a, 255);
    /// ```
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Builds a pixel from up to 4 bytes in channel order, zero-filling missing channels.
    #[inline]
    pub fn from_partial(bytes: &[u8]) -> Self {
        let mut raw = [0u8; BYTES_PER_PIXEL];
        let len = bytes.len().min(BYTES_PER_PIXEL);
        raw[..len].copy_from_slice(&bytes[..len]);
        Self::from_bytes(raw)
    }

    /// Builds a pixel from 4 bytes in R, G, B, A order.
    #[inline]
    pub const fn from_bytes(bytes: [u8; BYTES_PER_PIXEL]) -> Self {
        Self::new(bytes[0], bytes[1], bytes[2], bytes[3])
    }

    /// Returns the channels in R, G, B, A order.
    #[inline]
    pub const fn to_bytes(self) -> [u8; BYTES_PER_PIXEL] {
        [self.r, self.g, self.b, self.a]
    }
}

/// Flattens a pixel slice into a tightly packed RGBA byte buffer.
pub fn pixels_to_bytes(pixels: &[Rgba8888]) -> Vec<u8> {
    let mut out = Vec::with_capacity(pixels.len() * BYTES_PER_PIXEL);
    for pixel in pixels {
        out.extend_from_slice(&pixel.to_bytes());
    }
    out
}

/// Reinterprets a tightly packed RGBA byte buffer as pixels.
///
/// # Errors
///
/// Returns [`PixelBufferError::UnalignedLength`] if `bytes.len()` is not a multiple of 4.
pub fn bytes_to_pixels(bytes: &[u8]) -> Result<Vec<Rgba8888>, PixelBufferError> {
    if bytes.len() % BYTES_PER_PIXEL != 0 {
        return Err(PixelBufferError::UnalignedLength { len: bytes.len() });
    }

    Ok(bytes
        .chunks_exact(BYTES_PER_PIXEL)
        .map(|chunk| Rgba8888::new(chunk[0], chunk[1], chunk[2], chunk[3]))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use rstest::rstest;

    #[rstest]
    #[case(&[], Rgba8888::TRANSPARENT)]
    #[case(&[1], Rgba8888::new(1, 0, 0, 0))]
    #[case(&[1, 2, 3], Rgba8888::new(1, 2, 3, 0))]
    #[case(&[1, 2, 3, 4, 5], Rgba8888::new(1, 2, 3, 4))]
    fn from_partial_zero_fills(#[case] bytes: &[u8], #[case] expected: Rgba8888) {
        assert_eq!(Rgba8888::from_partial(bytes), expected);
    }

    #[test]
    fn pixel_buffer_conversion_preserves_channel_order() {
        let pixels = vec![Rgba8888::new(1, 2, 3, 4), Rgba8888::new(5, 6, 7, 8)];
        let bytes = pixels_to_bytes(&pixels);
        assert_eq!(bytes, vec![1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(bytes_to_pixels(&bytes).unwrap(), pixels);
    }

    #[test]
    fn unaligned_buffer_is_rejected() {
        assert_eq!(
            bytes_to_pixels(&[0; 7]),
            Err(PixelBufferError::UnalignedLength { len: 7 })
        );
    }
}
