//! Error types for encoding and decoding containers.

use pixelrts_common::color_8888::PixelBufferError;
use pixelrts_compression::CompressionError;
use pixelrts_curve::CurveError;
use pixelrts_layout::{AllocationError, LayoutError};
use pixelrts_wasm::VisualizerError;
use thiserror::Error;

/// Result alias used throughout this crate.
pub type PixelRtsResult<T> = Result<T, PixelRtsError>;

/// Every error the codec can raise.
///
/// None of these are retried internally.
#[derive(Debug, Error)]
pub enum PixelRtsError {
    /// Malformed input: bad magic, bad grid or bad metadata.
    #[error(transparent)]
    Format(#[from] FormatError),

    /// The payload does not fit the requested grid.
    #[error("{data_len} bytes do not fit a {grid_size}x{grid_size} grid; the smallest grid that fits is {minimum_grid_size}")]
    Capacity {
        /// Length of the (possibly compressed) byte stream.
        data_len: usize,
        /// Grid size that was requested, or the largest supported grid when none was.
        grid_size: u32,
        /// Smallest power-of-two grid that holds the stream.
        minimum_grid_size: u32,
    },

    /// Code-mode pixels did not rebuild a WASM module.
    #[error("Code-mode decode failed: {0}")]
    Decode(#[from] VisualizerError),

    /// Compression or decompression failed.
    #[error(transparent)]
    Compression(#[from] CompressionError),

    /// A hash did not match the decoded bytes.
    #[error("Hash mismatch for {subject}: expected {expected}, got {actual}")]
    Integrity {
        /// What was hashed (`payload` or `segment <name>`).
        subject: String,
        /// Hash recorded in the metadata.
        expected: String,
        /// Hash of the decoded bytes.
        actual: String,
    },

    /// The layout optimizer rejected its configuration.
    #[error(transparent)]
    Layout(#[from] LayoutError),

    /// A layout request could only be partly placed.
    #[error(transparent)]
    Allocation(#[from] AllocationError),

    /// I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The PNG writer failed.
    #[error("Failed to write PNG: {0}")]
    Png(#[from] png::EncodingError),

    /// Memory-mapping a container failed.
    #[cfg(feature = "file-io")]
    #[error(transparent)]
    FileIo(#[from] crate::file_io::LightweightMmapError),
}

/// Malformed containers, grids and metadata.
#[derive(Debug, Error)]
pub enum FormatError {
    /// The grid side is not a supported power of two.
    #[error("Invalid grid: {0}")]
    Grid(#[from] CurveError),

    /// The image is not square.
    #[error("Container image must be square, got {width}x{height}")]
    NotSquare {
        /// Image width.
        width: u32,
        /// Image height.
        height: u32,
    },

    /// A pixel buffer does not cover its grid.
    #[error("A {grid_size}x{grid_size} grid needs {expected} pixels, got {actual}")]
    PixelCountMismatch {
        /// Grid side length.
        grid_size: u32,
        /// Pixels the grid holds.
        expected: usize,
        /// Pixels supplied.
        actual: usize,
    },

    /// Decoded image data does not split into whole pixels.
    #[error(transparent)]
    PixelBuffer(#[from] PixelBufferError),

    /// The image is not 8-bit RGBA.
    #[error("Container image must be 8-bit RGBA, got {color_type} at {bit_depth} bits")]
    UnsupportedPixelFormat {
        /// Colour type of the image.
        color_type: String,
        /// Bits per channel.
        bit_depth: u8,
    },

    /// The PNG could not be parsed.
    #[error("Failed to read PNG: {0}")]
    Png(#[from] png::DecodingError),

    /// The annotation does not start with the `PixelRTS` magic.
    #[error("Annotation is not PixelRTS metadata")]
    MissingMagic,

    /// Metadata JSON could not be parsed or written.
    #[error("Malformed metadata: {0}")]
    Metadata(#[from] serde_json::Error),

    /// Metadata lists a format version this build does not read.
    #[error("Unsupported container format version {0}")]
    UnsupportedVersion(u32),

    /// The image size disagrees with the metadata.
    #[error("Metadata describes a {expected}x{expected} grid but the image is {actual}x{actual}")]
    GridMismatch {
        /// Grid size in metadata.
        expected: u32,
        /// Grid size of the image.
        actual: u32,
    },

    /// The metadata describes more bytes than the image holds.
    #[error("Metadata describes {stream_len} bytes but the image holds only {capacity}")]
    StreamExceedsImage {
        /// Declared stream length.
        stream_len: usize,
        /// Bytes the image can hold in its mode.
        capacity: usize,
    },

    /// The decoded payload length disagrees with the metadata.
    #[error("Decoded {actual} bytes but the metadata records {expected}")]
    PayloadSizeMismatch {
        /// Length recorded in the metadata.
        expected: u64,
        /// Length actually decoded.
        actual: usize,
    },

    /// The embedded verbatim copy is not valid base64.
    #[error("Embedded payload copy is not valid base64: {0}")]
    VerbatimCopy(#[from] base64::DecodeError),

    /// Code mode requires a WASM payload.
    #[error("Code mode requires a WASM module (missing \\0asm magic)")]
    NotWasm,

    /// A segment range falls outside the payload.
    #[error("Segment `{name}` ({offset}+{size}) lies outside the {data_len}-byte payload")]
    SegmentOutOfRange {
        /// Segment name.
        name: String,
        /// Segment start.
        offset: u64,
        /// Segment length.
        size: u64,
        /// Payload length.
        data_len: usize,
    },

    /// Two segments share a name.
    #[error("Duplicate segment name `{0}`")]
    DuplicateSegment(String),

    /// The requested segment is not in the metadata.
    #[error("No segment named `{0}`")]
    UnknownSegment(String),
}

impl From<CurveError> for PixelRtsError {
    fn from(error: CurveError) -> Self {
        Self::Format(FormatError::Grid(error))
    }
}

impl From<png::DecodingError> for PixelRtsError {
    fn from(error: png::DecodingError) -> Self {
        Self::Format(FormatError::Png(error))
    }
}

impl From<serde_json::Error> for PixelRtsError {
    fn from(error: serde_json::Error) -> Self {
        Self::Format(FormatError::Metadata(error))
    }
}

impl From<base64::DecodeError> for PixelRtsError {
    fn from(error: base64::DecodeError) -> Self {
        Self::Format(FormatError::VerbatimCopy(error))
    }
}
