//! Content-aware compression with a runtime-selected backend.

use crate::content::{detect_content_type, ContentType};
use crate::error::{CompressResult, CompressionError};
use crate::level::{CompressionAlgorithm, CompressionLevel};
use crate::sparse;
use crate::zlib;

const ZSTD_MAGIC: [u8; 4] = [0x28, 0xB5, 0x2F, 0xFD];

/// Oldest ZStandard release exposing the advanced compression API used here (1.4.0).
#[cfg(feature = "zstd")]
const MIN_ZSTD_VERSION: u32 = 10400;

/// General-purpose compressor backing [`AdaptiveCompressor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompressorBackend {
    /// ZStandard (preferred).
    Zstd,
    /// zlib (baseline, always available).
    Zlib,
}

impl CompressorBackend {
    /// Picks the preferred backend available in this build.
    pub fn detect() -> Self {
        if Self::Zstd.is_available() {
            Self::Zstd
        } else {
            Self::Zlib
        }
    }

    /// Checks whether the backend is compiled in and usable.
    pub fn is_available(self) -> bool {
        match self {
            #[cfg(feature = "zstd")]
            Self::Zstd => pixelrts_zstd::version_number() >= MIN_ZSTD_VERSION,
            #[cfg(not(feature = "zstd"))]
            Self::Zstd => false,
            Self::Zlib => true,
        }
    }
}

/// The output of compressing one buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressionOutcome {
    /// Compressed bytes.
    pub data: Vec<u8>,
    /// Algorithm that produced [`Self::data`].
    pub algorithm: CompressionAlgorithm,
    /// Effective level after resolving [`CompressionLevel::Auto`].
    pub level: CompressionLevel,
    /// Content type the level was chosen for.
    pub content_type: ContentType,
    /// Size of the input.
    pub original_size: usize,
    /// Size of [`Self::data`].
    pub compressed_size: usize,
}

impl CompressionOutcome {
    pub(crate) fn new(
        data: Vec<u8>,
        algorithm: CompressionAlgorithm,
        level: CompressionLevel,
        content_type: ContentType,
        original_size: usize,
    ) -> Self {
        let compressed_size = data.len();
        Self {
            data,
            algorithm,
            level,
            content_type,
            original_size,
            compressed_size,
        }
    }

    /// `compressed_size / original_size`; `0.0` for empty input.
    pub fn ratio(&self) -> f64 {
        if self.original_size == 0 {
            return 0.0;
        }
        self.compressed_size as f64 / self.original_size as f64
    }

    /// Space saved, in percent of the original size.
    pub fn savings_percent(&self) -> f64 {
        if self.original_size == 0 {
            return 0.0;
        }
        (1.0 - self.ratio()) * 100.0
    }
}

/// Compresses buffers with a level chosen from their content type.
///
/// # Examples
///
/// ```
/// use pixelrts_compression::{decompress, AdaptiveCompressor, CompressionLevel};
///
/// let compressor = AdaptiveCompressor::new(CompressionLevel::Auto);
/// let data = vec![0u8; 8192];
/// let outcome = compressor.compress(&data, None).unwrap();
/// assert!(outcome.compressed_size < outcome.original_size);
/// assert_eq!(decompress(&outcome.data, Some(data.len())).unwrap(), data);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdaptiveCompressor {
    default_level: CompressionLevel,
    backend: CompressorBackend,
}

impl Default for AdaptiveCompressor {
    fn default() -> Self {
        Self::new(CompressionLevel::Auto)
    }
}

impl AdaptiveCompressor {
    /// Creates a compressor on the preferred available backend.
    pub fn new(default_level: CompressionLevel) -> Self {
        Self::with_backend(default_level, CompressorBackend::detect())
    }

    /// Creates a compressor on a specific backend. Unavailable backends degrade to zlib.
    pub fn with_backend(default_level: CompressionLevel, backend: CompressorBackend) -> Self {
        let backend = if backend.is_available() {
            backend
        } else {
            log::warn!("{backend:?} compression unavailable, using zlib");
            CompressorBackend::Zlib
        };
        Self {
            default_level,
            backend,
        }
    }

    /// Backend in use.
    pub fn backend(&self) -> CompressorBackend {
        self.backend
    }

    /// Level used by [`Self::compress`] for data and unknown content.
    pub fn default_level(&self) -> CompressionLevel {
        self.default_level
    }

    /// Compresses `data` at the level its content type calls for.
    ///
    /// Code, text and assets always get their own level (see [`CompressionLevel::select`]);
    /// the configured default only applies to data and unknown content.
    /// `content_type` overrides detection when supplied.
    pub fn compress(
        &self,
        data: &[u8],
        content_type: Option<ContentType>,
    ) -> CompressResult<CompressionOutcome> {
        let content_type = content_type.unwrap_or_else(|| detect_content_type(data));
        let level = CompressionLevel::select(content_type, self.default_level);
        self.compress_with_level(data, level, Some(content_type))
    }

    /// Compresses `data` at `level`, resolving [`CompressionLevel::Auto`] from the content type.
    ///
    /// Empty input yields an empty [`CompressionAlgorithm::None`] outcome.
    pub fn compress_with_level(
        &self,
        data: &[u8],
        level: CompressionLevel,
        content_type: Option<ContentType>,
    ) -> CompressResult<CompressionOutcome> {
        let content_type = content_type.unwrap_or_else(|| detect_content_type(data));
        if data.is_empty() {
            return Ok(CompressionOutcome::new(
                Vec::new(),
                CompressionAlgorithm::None,
                CompressionLevel::None,
                content_type,
                0,
            ));
        }

        let level = level.resolve(content_type);
        log::debug!(
            "Compressing {} bytes of {content_type:?} content at {level:?} with {:?}",
            data.len(),
            self.backend
        );

        let (algorithm, compressed) = match (level, self.backend) {
            (CompressionLevel::None, _) => (CompressionAlgorithm::None, data.to_vec()),
            (_, CompressorBackend::Zstd) => self.compress_zstd(data, level)?,
            (_, CompressorBackend::Zlib) => (
                CompressionAlgorithm::Zlib,
                zlib::compress(data, level.zlib_level())?,
            ),
        };

        Ok(CompressionOutcome::new(
            compressed,
            algorithm,
            level,
            content_type,
            data.len(),
        ))
    }

    #[cfg(feature = "zstd")]
    fn compress_zstd(
        &self,
        data: &[u8],
        level: CompressionLevel,
    ) -> CompressResult<(CompressionAlgorithm, Vec<u8>)> {
        use pixelrts_zstd::ZStandardCompressor;

        let Some((zstd_level, window_log)) = level.zstd_parameters() else {
            return Ok((CompressionAlgorithm::None, data.to_vec()));
        };
        let result = ZStandardCompressor::new(zstd_level)
            .and_then(|compressor| compressor.with_window_log(window_log))
            .and_then(|compressor| compressor.compress(data));

        match result {
            Ok(compressed) => Ok((CompressionAlgorithm::Zstd, compressed)),
            Err(error) => {
                log::warn!("ZStandard compression failed ({error}), falling back to zlib");
                Ok((
                    CompressionAlgorithm::Zlib,
                    zlib::compress(data, level.zlib_level())?,
                ))
            }
        }
    }

    #[cfg(not(feature = "zstd"))]
    fn compress_zstd(
        &self,
        data: &[u8],
        level: CompressionLevel,
    ) -> CompressResult<(CompressionAlgorithm, Vec<u8>)> {
        Ok((
            CompressionAlgorithm::Zlib,
            zlib::compress(data, level.zlib_level())?,
        ))
    }
}

/// Identifies the algorithm of a stream from its header, if it carries one.
///
/// Verbatim ([`CompressionAlgorithm::None`]) and dictionary streams cannot be told apart from
/// arbitrary bytes or plain ZStandard frames, so they are never returned.
pub fn detect_algorithm(data: &[u8]) -> Option<CompressionAlgorithm> {
    if data.starts_with(&ZSTD_MAGIC) {
        Some(CompressionAlgorithm::Zstd)
    } else if data.starts_with(&sparse::SPARSE_MAGIC) {
        Some(CompressionAlgorithm::Sparse)
    } else if zlib::is_zlib_stream(data) {
        Some(CompressionAlgorithm::Zlib)
    } else {
        None
    }
}

/// Checks whether `data` carries the header of a stream this crate can decompress.
pub fn is_compressed(data: &[u8]) -> bool {
    detect_algorithm(data).is_some()
}

/// Decompresses a stream, recognizing its algorithm from the header.
///
/// # Errors
///
/// - [`CompressionError::UnknownSignature`] if no known header is present.
/// - [`CompressionError::SizeMismatch`] if `expected_size` is given and differs from the output.
pub fn decompress(data: &[u8], expected_size: Option<usize>) -> CompressResult<Vec<u8>> {
    if data.is_empty() {
        return check_size(Vec::new(), expected_size);
    }
    let algorithm = detect_algorithm(data).ok_or(CompressionError::UnknownSignature)?;
    decompress_as(algorithm, data, expected_size)
}

/// Decompresses a stream produced by a known algorithm.
///
/// The stream header is still checked against `algorithm`.
pub fn decompress_as(
    algorithm: CompressionAlgorithm,
    data: &[u8],
    expected_size: Option<usize>,
) -> CompressResult<Vec<u8>> {
    let out = match algorithm {
        CompressionAlgorithm::None => data.to_vec(),
        CompressionAlgorithm::ZstdDictionary => return Err(CompressionError::DictionaryRequired),
        _ if detect_algorithm(data) != Some(algorithm) => {
            return Err(CompressionError::SignatureMismatch(algorithm))
        }
        CompressionAlgorithm::Zstd => decompress_zstd(data, expected_size)?,
        CompressionAlgorithm::Zlib => zlib::decompress(data, expected_size)?,
        CompressionAlgorithm::Sparse => sparse::SparseCompressor::decompress(data)?,
    };
    check_size(out, expected_size)
}

#[cfg(feature = "zstd")]
fn decompress_zstd(data: &[u8], expected_size: Option<usize>) -> CompressResult<Vec<u8>> {
    use pixelrts_zstd::ZStandardError;

    pixelrts_zstd::decompress(data, expected_size).map_err(|error| match error {
        ZStandardError::SizeMismatch { expected, actual } => {
            CompressionError::SizeMismatch { expected, actual }
        }
        other => other.into(),
    })
}

#[cfg(not(feature = "zstd"))]
fn decompress_zstd(_data: &[u8], _expected_size: Option<usize>) -> CompressResult<Vec<u8>> {
    Err(CompressionError::UnsupportedAlgorithm(
        CompressionAlgorithm::Zstd,
    ))
}

fn check_size(data: Vec<u8>, expected_size: Option<usize>) -> CompressResult<Vec<u8>> {
    match expected_size {
        Some(expected) if expected != data.len() => Err(CompressionError::SizeMismatch {
            expected,
            actual: data.len(),
        }),
        _ => Ok(data),
    }
}
