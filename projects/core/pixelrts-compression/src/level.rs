//! Compression levels, algorithm tags and the tables mapping between them.

use crate::content::ContentType;
use core::fmt;
use derive_enum_all_values::AllValues;
use serde::{Deserialize, Serialize};

/// Requested compression effort.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, AllValues,
)]
#[serde(rename_all = "lowercase")]
pub enum CompressionLevel {
    /// Let the content type decide.
    #[default]
    Auto,
    /// Store verbatim.
    None,
    /// Fast, favouring decompression speed.
    Low,
    /// Balanced.
    Medium,
    /// Smallest output.
    High,
}

impl CompressionLevel {
    /// Level chosen for `content_type` when the caller asked for [`CompressionLevel::Auto`].
    pub fn for_content(content_type: ContentType) -> Self {
        match content_type {
            ContentType::Code => Self::Low,
            ContentType::Text => Self::Medium,
            ContentType::Assets => Self::High,
            ContentType::Data | ContentType::Unknown => Self::Auto,
        }
    }

    /// Level [`crate::AdaptiveCompressor::compress`] uses for `content_type`.
    ///
    /// Code, text and assets have a fixed level. Data and unknown content use `default_level`.
    pub fn select(content_type: ContentType, default_level: Self) -> Self {
        match Self::for_content(content_type) {
            Self::Auto => default_level,
            level => level,
        }
    }

    /// Resolves [`CompressionLevel::Auto`] against a content type; other levels pass through.
    pub fn resolve(self, content_type: ContentType) -> Self {
        match self {
            Self::Auto => Self::for_content(content_type),
            level => level,
        }
    }

    /// ZStandard level and window log, or `None` for [`CompressionLevel::None`].
    pub fn zstd_parameters(self) -> Option<(i32, u32)> {
        match self {
            Self::None => None,
            Self::Low => Some((3, 16)),
            Self::Medium => Some((9, 20)),
            Self::High => Some((19, 23)),
            Self::Auto => Some((3, 23)),
        }
    }

    /// zlib level (0-9).
    pub fn zlib_level(self) -> u32 {
        match self {
            Self::None => 0,
            Self::Low => 3,
            Self::Medium | Self::Auto => 6,
            Self::High => 9,
        }
    }
}

/// Algorithm that produced a compressed stream, as recorded in container metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AllValues)]
pub enum CompressionAlgorithm {
    /// Bytes stored verbatim.
    #[serde(rename = "none")]
    None,
    /// Standard ZStandard frame.
    #[serde(rename = "zstd-h5")]
    Zstd,
    /// ZStandard frame that needs the shared dictionary of a [`crate::SolidCompressor`].
    #[serde(rename = "zstd-dict")]
    ZstdDictionary,
    /// zlib stream (RFC 1950).
    #[serde(rename = "zlib")]
    Zlib,
    /// Zero-run stream from [`crate::SparseCompressor`].
    #[serde(rename = "sparse")]
    Sparse,
}

impl CompressionAlgorithm {
    /// Tag stored in metadata.
    pub fn tag(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Zstd => "zstd-h5",
            Self::ZstdDictionary => "zstd-dict",
            Self::Zlib => "zlib",
            Self::Sparse => "sparse",
        }
    }
}

impl fmt::Display for CompressionAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ContentType::Code, CompressionLevel::Low)]
    #[case(ContentType::Text, CompressionLevel::Medium)]
    #[case(ContentType::Assets, CompressionLevel::High)]
    #[case(ContentType::Data, CompressionLevel::Auto)]
    #[case(ContentType::Unknown, CompressionLevel::Auto)]
    fn auto_level_follows_content(#[case] content: ContentType, #[case] level: CompressionLevel) {
        assert_eq!(CompressionLevel::Auto.resolve(content), level);
        assert_eq!(CompressionLevel::High.resolve(content), CompressionLevel::High);
    }

    #[rstest]
    #[case(ContentType::Code, CompressionLevel::High, CompressionLevel::Low)]
    #[case(ContentType::Code, CompressionLevel::None, CompressionLevel::Low)]
    #[case(ContentType::Text, CompressionLevel::Low, CompressionLevel::Medium)]
    #[case(ContentType::Assets, CompressionLevel::None, CompressionLevel::High)]
    #[case(ContentType::Data, CompressionLevel::High, CompressionLevel::High)]
    #[case(ContentType::Unknown, CompressionLevel::None, CompressionLevel::None)]
    #[case(ContentType::Data, CompressionLevel::Auto, CompressionLevel::Auto)]
    fn content_type_fixes_level_before_default(
        #[case] content: ContentType,
        #[case] default_level: CompressionLevel,
        #[case] expected: CompressionLevel,
    ) {
        assert_eq!(CompressionLevel::select(content, default_level), expected);
    }

    #[test]
    fn tags_match_serde_names() {
        for algorithm in CompressionAlgorithm::all_values() {
            let json = serde_json::to_string(algorithm).unwrap();
            assert_eq!(json, format!("\"{}\"", algorithm.tag()));
        }
    }

    #[test]
    fn only_none_skips_zstd() {
        for level in CompressionLevel::all_values() {
            assert_eq!(
                level.zstd_parameters().is_none(),
                *level == CompressionLevel::None
            );
        }
    }
}
