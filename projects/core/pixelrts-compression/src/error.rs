//! Error types for compression and decompression.

use crate::level::CompressionAlgorithm;
use thiserror::Error;

/// Result alias used throughout this crate.
pub type CompressResult<T> = Result<T, CompressionError>;

/// Errors raised while compressing or decompressing payloads.
///
/// Decompression never returns partial output; any failure discards what was produced.
#[derive(Debug, Error)]
pub enum CompressionError {
    /// The stream header matches no known algorithm.
    #[error("Unknown compression signature")]
    UnknownSignature,

    /// The stream was produced by an algorithm this build cannot decode.
    #[error("Compression algorithm `{0}` is not supported by this build")]
    UnsupportedAlgorithm(CompressionAlgorithm),

    /// The stream header does not match the algorithm it was declared with.
    #[error("Stream does not carry a `{0}` signature")]
    SignatureMismatch(CompressionAlgorithm),

    /// The decompressed size differs from the declared size.
    #[error("Decompressed size mismatch: expected {expected} bytes, got {actual}")]
    SizeMismatch {
        /// Declared size.
        expected: usize,
        /// Size actually produced.
        actual: usize,
    },

    /// The stream ended in the middle of a token.
    #[error("Compressed stream truncated at offset {offset}")]
    Truncated {
        /// Offset of the incomplete token.
        offset: usize,
    },

    /// The input is too large for the stream format.
    #[error("Input of {len} bytes exceeds the format limit of {max} bytes")]
    InputTooLarge {
        /// Length of the rejected input.
        len: usize,
        /// Largest supported input.
        max: usize,
    },

    /// Dictionary-compressed data was supplied without its dictionary.
    #[error("Stream requires a dictionary but none is loaded")]
    DictionaryRequired,

    /// ZStandard failure.
    #[cfg(feature = "zstd")]
    #[error(transparent)]
    ZStandard(#[from] pixelrts_zstd::ZStandardError),

    /// zlib failure.
    #[error("zlib stream error: {0}")]
    Zlib(#[source] std::io::Error),

    /// Section table serialization failure.
    #[error("Invalid section table JSON: {0}")]
    Json(#[from] serde_json::Error),
}
