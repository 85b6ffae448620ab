#![doc = include_str!(concat!("../", core::env!("CARGO_PKG_README")))]
#![warn(missing_docs)]

pub mod container;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod metadata;
pub mod segments;
pub mod sidecar;

#[cfg(feature = "file-io")]
pub mod file_io;

pub use container::Container;
pub use decoder::{Decoder, DecoderBuilder};
pub use encoder::{Encoder, EncoderBuilder};
pub use error::{FormatError, PixelRtsError, PixelRtsResult};
pub use metadata::{
    CompressionInfo, EncodingInfo, EncodingMode, EncodingType, Metadata, Segment, UserMetadata,
    FORMAT_ID, FORMAT_VERSION,
};
pub use segments::{build_segment_table, concat_segments, extract_segment, plan_segments};

// Re-exported so callers can configure compression and read layouts without extra dependencies.
pub use pixelrts_compression::{CompressionAlgorithm, CompressionLevel, ContentType};
pub use pixelrts_layout::LayoutSnapshot;
