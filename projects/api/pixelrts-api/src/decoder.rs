//! Container to payload decoding.

use crate::container::{read_annotation, Container};
use crate::error::{FormatError, PixelRtsError, PixelRtsResult};
use crate::metadata::{EncodingMode, Metadata};
use crate::sidecar::read_sidecar;
use log::debug;
use pixelrts_common::color_8888::{pixels_to_bytes, Rgba8888, BYTES_PER_PIXEL};
use pixelrts_common::hash::{sha256_hex, verify_sha256_hex};
use pixelrts_compression::decompress_as;
use pixelrts_curve::{HilbertCurve, LutGenerator};
use pixelrts_wasm::{SemanticVisualizer, VisualizerError};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Recovers payloads from [`Container`]s.
///
/// Like the [`Encoder`](crate::Encoder), a decoder only holds configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decoder {
    verify_hash: bool,
    expected_size: Option<usize>,
}

impl Default for Decoder {
    fn default() -> Self {
        Self {
            verify_hash: true,
            expected_size: None,
        }
    }
}

/// Configures a [`Decoder`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DecoderBuilder {
    decoder: Decoder,
}

impl DecoderBuilder {
    /// Check the payload against the recorded SHA-256. On by default.
    pub fn verify_hash(mut self, verify: bool) -> Self {
        self.decoder.verify_hash = verify;
        self
    }

    /// Payload length to use for images that carry no metadata.
    ///
    /// Without it every pixel is returned. When metadata is present its recorded size wins.
    pub fn expected_size(mut self, size: usize) -> Self {
        self.decoder.expected_size = Some(size);
        self
    }

    /// Finishes configuration.
    pub fn build(self) -> Decoder {
        self.decoder
    }
}

impl Decoder {
    /// Decoder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts configuring a decoder.
    pub fn builder() -> DecoderBuilder {
        DecoderBuilder::default()
    }

    /// Recovers the payload of `container`.
    ///
    /// The embedded verbatim copy is used when present; otherwise pixels are read in curve
    /// order. A recorded compression descriptor is then inverted and the result checked.
    ///
    /// # Errors
    ///
    /// - [`FormatError::StreamExceedsImage`] if the metadata describes more bytes than the image holds.
    /// - [`PixelRtsError::Decode`] if a code-mode payload does not rebuild a WASM module.
    /// - [`PixelRtsError::Compression`] if decompression fails or yields the wrong size.
    /// - [`PixelRtsError::Integrity`] if hash verification is on and fails.
    pub fn decode(&self, container: &Container) -> PixelRtsResult<Vec<u8>> {
        let Some(metadata) = container.metadata() else {
            return self.decode_bare(container);
        };

        let stream_len = metadata.stream_len();
        let stream = match metadata.verbatim_copy()? {
            Some(stream) => {
                debug!("Using embedded copy of the {} byte stream", stream.len());
                stream
            }
            None => walk_stream(container, metadata, stream_len)?,
        };

        let payload = match &metadata.compression {
            Some(compression) => decompress_as(
                compression.algorithm,
                &stream,
                usize::try_from(metadata.data_size).ok(),
            )?,
            None => stream,
        };
        if payload.len() as u64 != metadata.data_size {
            return Err(FormatError::PayloadSizeMismatch {
                expected: metadata.data_size,
                actual: payload.len(),
            }
            .into());
        }
        if metadata.mode == EncodingMode::Code && !SemanticVisualizer::is_target(&payload) {
            return Err(VisualizerError::MagicMismatch.into());
        }

        if self.verify_hash
            && !metadata.data_hash.is_empty()
            && !verify_sha256_hex(&payload, &metadata.data_hash)
        {
            return Err(PixelRtsError::Integrity {
                subject: "payload".to_string(),
                expected: metadata.data_hash.clone(),
                actual: sha256_hex(&payload),
            });
        }
        Ok(payload)
    }

    /// Decodes an in-memory PNG, using only its embedded metadata.
    pub fn decode_png(&self, png: &[u8]) -> PixelRtsResult<Vec<u8>> {
        self.decode(&Container::from_png_bytes(png)?)
    }

    /// Loads and decodes the container at `path`, consulting its sidecar.
    pub fn load(&self, path: impl AsRef<Path>) -> PixelRtsResult<Vec<u8>> {
        self.decode(&Container::load(path)?)
    }

    /// Reads the merged metadata of the container at `path` without decoding its pixels.
    pub fn info(path: impl AsRef<Path>) -> PixelRtsResult<Option<Metadata>> {
        let path = path.as_ref();
        let (grid_size, annotation) = read_annotation(BufReader::new(File::open(path)?))?;
        let metadata = Metadata::merge(annotation, read_sidecar(path)?)?;
        if let Some(metadata) = &metadata {
            if metadata.grid_size != grid_size {
                return Err(FormatError::GridMismatch {
                    expected: metadata.grid_size,
                    actual: grid_size,
                }
                .into());
            }
        }
        Ok(metadata)
    }

    /// Reads every pixel of a metadata-less image as raw RGBA in curve order.
    fn decode_bare(&self, container: &Container) -> PixelRtsResult<Vec<u8>> {
        let capacity = container.pixels().len() * BYTES_PER_PIXEL;
        let len = self.expected_size.unwrap_or(capacity);
        if len > capacity {
            return Err(FormatError::StreamExceedsImage {
                stream_len: len,
                capacity,
            }
            .into());
        }
        debug!("No metadata; reading {len} raw bytes");
        let pixels = curve_pixels(container, len.div_ceil(BYTES_PER_PIXEL))?;
        let mut data = pixels_to_bytes(&pixels);
        data.truncate(len);
        Ok(data)
    }
}

/// Extracts the stored byte stream of `container` by walking its curve.
fn walk_stream(
    container: &Container,
    metadata: &Metadata,
    stream_len: u64,
) -> PixelRtsResult<Vec<u8>> {
    let bytes_per_pixel = metadata.mode.bytes_per_pixel();
    let capacity = container.pixels().len() * bytes_per_pixel;
    let stream_len = match usize::try_from(stream_len) {
        Ok(len) if len <= capacity => len,
        _ => {
            return Err(FormatError::StreamExceedsImage {
                stream_len: usize::try_from(stream_len).unwrap_or(usize::MAX),
                capacity,
            }
            .into())
        }
    };

    let pixels = curve_pixels(container, stream_len.div_ceil(bytes_per_pixel))?;
    let stream = match metadata.mode {
        EncodingMode::Standard => {
            let mut stream = pixels_to_bytes(&pixels);
            stream.truncate(stream_len);
            stream
        }
        // A compressed module no longer starts with the magic; it is checked after decompression.
        EncodingMode::Code if metadata.compression.is_some() => {
            SemanticVisualizer::decode_unchecked(&pixels, stream_len)?
        }
        EncodingMode::Code => SemanticVisualizer::decode(&pixels, stream_len)?,
    };
    Ok(stream)
}

/// The first `count` pixels of `container` in curve order.
fn curve_pixels(container: &Container, count: usize) -> PixelRtsResult<Vec<Rgba8888>> {
    let curve = HilbertCurve::from_grid_size(container.grid_size())?;
    let lut = LutGenerator::new().generate(curve.order())?.lut;
    Ok(lut
        .coords()
        .iter()
        .take(count)
        .filter_map(|&coord| container.pixel(coord))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::UserMetadata;
    use crate::Encoder;
    use pixelrts_wasm::{minimal_module, sample_module};
    use rstest::rstest;

    #[rstest]
    #[case(0)]
    #[case(1)]
    #[case(3)]
    #[case(4)]
    #[case(5)]
    #[case(4095)]
    #[case(4096)]
    #[case(65536)]
    fn standard_round_trip(#[case] len: usize) {
        let data: Vec<u8> = (0..len).map(|i| (i * 31 % 251) as u8).collect();
        let container = Encoder::new().encode(&data, &UserMetadata::default()).unwrap();
        assert_eq!(Decoder::new().decode(&container).unwrap(), data);
    }

    #[rstest]
    #[case(minimal_module())]
    #[case(sample_module())]
    fn code_round_trip_with_and_without_copy(#[case] module: Vec<u8>) {
        for embed in [true, false] {
            let container = Encoder::builder()
                .mode(EncodingMode::Code)
                .embed_verbatim_copy(embed)
                .build()
                .encode(&module, &UserMetadata::default())
                .unwrap();
            assert_eq!(Decoder::new().decode(&container).unwrap(), module);
        }
    }

    #[test]
    fn compressed_round_trip() {
        let mut data = b"PixelRTS compressed payload ".repeat(200);
        data.extend_from_slice(&[0u8; 4096]);
        for mode_module in [false, true] {
            let (mode, payload) = if mode_module {
                let mut module = minimal_module();
                module.extend_from_slice(&data);
                (EncodingMode::Code, module)
            } else {
                (EncodingMode::Standard, data.clone())
            };
            let container = Encoder::builder()
                .mode(mode)
                .compress(true)
                .embed_verbatim_copy(false)
                .build()
                .encode(&payload, &UserMetadata::default())
                .unwrap();
            assert_eq!(Decoder::new().decode(&container).unwrap(), payload);
        }
    }

    #[test]
    fn bare_image_returns_all_pixels_or_expected_size() {
        let data = [1u8, 2, 3, 4, 5, 6];
        let container = Encoder::new().encode(&data, &UserMetadata::default()).unwrap();
        let (pixels, _) = container.into_parts();
        let bare = Container::new(2, pixels, None).unwrap();

        let all = Decoder::new().decode(&bare).unwrap();
        assert_eq!(all.len(), 16);
        assert_eq!(&all[..6], &data);

        let trimmed = Decoder::builder().expected_size(6).build().decode(&bare).unwrap();
        assert_eq!(trimmed, data);

        assert!(matches!(
            Decoder::builder().expected_size(17).build().decode(&bare),
            Err(PixelRtsError::Format(FormatError::StreamExceedsImage { .. }))
        ));
    }

    #[test]
    fn tampered_pixels_fail_integrity() {
        let data = vec![7u8; 64];
        let container = Encoder::new().encode(&data, &UserMetadata::default()).unwrap();
        let (mut pixels, metadata) = container.into_parts();
        pixels[0].r ^= 0xFF;
        let tampered = Container::new(4, pixels, metadata).unwrap();

        assert!(matches!(
            Decoder::new().decode(&tampered),
            Err(PixelRtsError::Integrity { .. })
        ));
        let unchecked = Decoder::builder().verify_hash(false).build().decode(&tampered).unwrap();
        assert_ne!(unchecked, data);
    }

    #[test]
    fn code_pixels_without_magic_fail_to_decode() {
        let container = Encoder::builder()
            .mode(EncodingMode::Code)
            .embed_verbatim_copy(false)
            .build()
            .encode(&minimal_module(), &UserMetadata::default())
            .unwrap();
        let (mut pixels, metadata) = container.into_parts();
        pixels[0].b = b'X';
        let broken = Container::new(2, pixels, metadata).unwrap();

        assert!(matches!(
            Decoder::new().decode(&broken),
            Err(PixelRtsError::Decode(VisualizerError::MagicMismatch))
        ));
    }
}
