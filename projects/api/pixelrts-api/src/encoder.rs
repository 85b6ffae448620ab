//! Payload to container encoding.

use crate::container::Container;
use crate::error::{FormatError, PixelRtsError, PixelRtsResult};
use crate::metadata::{
    CompressionInfo, EncodingInfo, EncodingMode, Metadata, UserMetadata, FORMAT_ID,
    FORMAT_VERSION,
};
use crate::segments::{build_segment_table, concat_segments};
use core::ops::Range;
use log::debug;
use pixelrts_common::color_8888::{Rgba8888, BYTES_PER_PIXEL};
use pixelrts_common::hash::sha256_hex;
use pixelrts_compression::{AdaptiveCompressor, CompressionLevel, ContentType};
use pixelrts_curve::{CurveError, HilbertCurve, LutGenerator};
use pixelrts_wasm::{SemanticVisualizer, DEFAULT_SMOOTHING_WINDOW};
use std::borrow::Cow;

/// Turns payloads into [`Container`]s.
///
/// An encoder holds configuration only; every call returns its own container and metadata,
/// so one encoder can be shared between threads.
///
/// # Examples
///
/// ```
/// use pixelrts_api::{Encoder, EncodingMode, UserMetadata};
///
/// let container = Encoder::builder()
///     .mode(EncodingMode::Standard)
///     .build()
///     .encode(b"hello", &UserMetadata::default())
///     .unwrap();
/// assert_eq!(container.grid_size(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Encoder {
    mode: EncodingMode,
    grid_size: Option<u32>,
    compress: bool,
    compression_level: CompressionLevel,
    content_type: Option<ContentType>,
    smoothing_window: usize,
    embed_verbatim_copy: bool,
}

impl Default for Encoder {
    fn default() -> Self {
        Self {
            mode: EncodingMode::Standard,
            grid_size: None,
            compress: false,
            compression_level: CompressionLevel::Auto,
            content_type: None,
            smoothing_window: DEFAULT_SMOOTHING_WINDOW,
            embed_verbatim_copy: true,
        }
    }
}

/// Configures an [`Encoder`].
#[derive(Debug, Clone, Default)]
pub struct EncoderBuilder {
    encoder: Encoder,
}

impl EncoderBuilder {
    /// Packing mode. Defaults to [`EncodingMode::Standard`].
    pub fn mode(mut self, mode: EncodingMode) -> Self {
        self.encoder.mode = mode;
        self
    }

    /// Fixes the grid side instead of picking the smallest that fits.
    pub fn grid_size(mut self, grid_size: u32) -> Self {
        self.encoder.grid_size = Some(grid_size);
        self
    }

    /// Compresses the payload before packing it. Off by default.
    pub fn compress(mut self, compress: bool) -> Self {
        self.encoder.compress = compress;
        self
    }

    /// Compression level for data and unknown content; code, text and assets pick their own.
    pub fn compression_level(mut self, level: CompressionLevel) -> Self {
        self.encoder.compression_level = level;
        self
    }

    /// Skips content detection and compresses as `content_type`.
    pub fn content_type(mut self, content_type: ContentType) -> Self {
        self.encoder.content_type = Some(content_type);
        self
    }

    /// Smoothing window of the code-mode R channel.
    pub fn smoothing_window(mut self, window: usize) -> Self {
        self.encoder.smoothing_window = window;
        self
    }

    /// Whether code mode embeds a base64 copy of the pixel stream. On by default.
    ///
    /// Without the copy a code-mode container is still decodable from its G and B channels.
    pub fn embed_verbatim_copy(mut self, embed: bool) -> Self {
        self.encoder.embed_verbatim_copy = embed;
        self
    }

    /// Finishes configuration.
    pub fn build(self) -> Encoder {
        self.encoder
    }
}

impl Encoder {
    /// Encoder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts configuring an encoder.
    pub fn builder() -> EncoderBuilder {
        EncoderBuilder::default()
    }

    /// Configured packing mode.
    #[inline]
    pub fn mode(&self) -> EncodingMode {
        self.mode
    }

    /// Encodes `data` into a container.
    ///
    /// # Errors
    ///
    /// - [`FormatError::NotWasm`] in code mode when `data` is not a WASM module.
    /// - [`FormatError::Grid`] for a grid that is not a supported power of two.
    /// - [`PixelRtsError::Capacity`] when the stream does not fit the configured grid or any
    ///   supported grid.
    /// - [`PixelRtsError::Compression`] if compression fails.
    pub fn encode(&self, data: &[u8], user: &UserMetadata) -> PixelRtsResult<Container> {
        self.encode_with_segments(data, &[], user)
    }

    /// Encodes `data`, recording the named `ranges` in the segment table.
    pub fn encode_with_segments(
        &self,
        data: &[u8],
        ranges: &[(&str, Range<usize>)],
        user: &UserMetadata,
    ) -> PixelRtsResult<Container> {
        if self.mode == EncodingMode::Code && !SemanticVisualizer::is_target(data) {
            return Err(FormatError::NotWasm.into());
        }
        let segments = build_segment_table(data, ranges)?;

        let (stream, compression) = self.compress_stream(data)?;
        let curve = self.resolve_curve(stream.len())?;
        debug!(
            "Encoding {} byte stream ({:?} mode) into a {}x{} grid",
            stream.len(),
            self.mode,
            curve.grid_size(),
            curve.grid_size()
        );

        let pixels = self.stream_pixels(&stream);
        let lut = LutGenerator::new().generate(curve.order())?.lut;
        let mut container = Container::blank(curve.grid_size());
        for (&coord, pixel) in lut.coords().iter().zip(pixels) {
            container.set_pixel(coord, pixel);
        }

        let mut metadata = Metadata {
            format: FORMAT_ID.to_string(),
            format_version: FORMAT_VERSION,
            grid_size: curve.grid_size(),
            encoding: EncodingInfo::for_mode(self.mode),
            mode: self.mode,
            segments,
            compression,
            data_hash: sha256_hex(data),
            data_size: data.len() as u64,
            original_data_b64: None,
            user: user.normalized(),
        };
        if self.mode == EncodingMode::Code && self.embed_verbatim_copy {
            metadata.set_verbatim_copy(&stream);
        }
        container.set_metadata(metadata);
        Ok(container)
    }

    /// Concatenates `parts` into one payload and encodes it with a segment per part.
    pub fn encode_segments(
        &self,
        parts: &[(&str, &[u8])],
        user: &UserMetadata,
    ) -> PixelRtsResult<Container> {
        let (data, ranges) = concat_segments(parts);
        self.encode_with_segments(&data, &ranges, user)
    }

    fn compress_stream<'a>(
        &self,
        data: &'a [u8],
    ) -> PixelRtsResult<(Cow<'a, [u8]>, Option<CompressionInfo>)> {
        if !self.compress {
            return Ok((Cow::Borrowed(data), None));
        }

        let outcome = AdaptiveCompressor::new(self.compression_level).compress(data, self.content_type)?;
        debug!(
            "Compressed {} -> {} bytes with {:?} ({:?}, {:?})",
            outcome.original_size,
            outcome.compressed_size,
            outcome.algorithm,
            outcome.level,
            outcome.content_type
        );
        let info = CompressionInfo {
            algorithm: outcome.algorithm,
            level: outcome.level,
            original_size: outcome.original_size as u64,
            compressed_size: outcome.compressed_size as u64,
            content_type: Some(outcome.content_type),
        };
        Ok((Cow::Owned(outcome.data), Some(info)))
    }

    fn resolve_curve(&self, stream_len: usize) -> PixelRtsResult<HilbertCurve> {
        let bytes_per_pixel = self.mode.bytes_per_pixel();
        let minimum = match HilbertCurve::for_data_len(stream_len, bytes_per_pixel) {
            Ok(curve) => curve,
            Err(CurveError::OrderTooLarge { max, .. }) => {
                return Err(PixelRtsError::Capacity {
                    data_len: stream_len,
                    grid_size: self.grid_size.unwrap_or(1 << max),
                    minimum_grid_size: required_grid_size(stream_len, bytes_per_pixel),
                });
            }
            Err(error) => return Err(error.into()),
        };
        let Some(grid_size) = self.grid_size else {
            return Ok(minimum);
        };

        let curve = HilbertCurve::from_grid_size(grid_size)?;
        if curve.len() * bytes_per_pixel < stream_len {
            return Err(PixelRtsError::Capacity {
                data_len: stream_len,
                grid_size,
                minimum_grid_size: minimum.grid_size(),
            });
        }
        Ok(curve)
    }

    fn stream_pixels(&self, stream: &[u8]) -> Vec<Rgba8888> {
        match self.mode {
            EncodingMode::Standard => stream
                .chunks(BYTES_PER_PIXEL)
                .map(Rgba8888::from_partial)
                .collect(),
            EncodingMode::Code => SemanticVisualizer::builder()
                .smoothing_window(self.smoothing_window)
                .build()
                .visualize_unchecked(stream),
        }
    }
}

/// Smallest power-of-two side whose square holds `data_len` bytes, even past the largest curve.
fn required_grid_size(data_len: usize, bytes_per_pixel: usize) -> u32 {
    let pixels = data_len.div_ceil(bytes_per_pixel.max(1)) as u64;
    let mut side = 1u64;
    while side * side < pixels {
        side <<= 1;
    }
    u32::try_from(side).unwrap_or(u32::MAX)
}
