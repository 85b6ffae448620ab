#![doc = include_str!(concat!("../", core::env!("CARGO_PKG_README")))]
#![warn(missing_docs)]

pub mod adaptive;
pub mod content;
pub mod error;
pub mod level;
pub mod sections;
pub mod solid;
pub mod sparse;
mod zlib;

pub use adaptive::{
    decompress, decompress_as, detect_algorithm, is_compressed, AdaptiveCompressor,
    CompressionOutcome, CompressorBackend,
};
pub use content::{detect_content_type, detection_confidence, ContentType};
pub use error::{CompressResult, CompressionError};
pub use level::{CompressionAlgorithm, CompressionLevel};
pub use sections::{CompressedSection, SectionSummary, SectionTable};
pub use solid::SolidCompressor;
pub use sparse::SparseCompressor;
