//! Coarse content classification used to pick compression parameters.
//!
//! Checks run in a fixed order: executable magics, then asset container magics, then the
//! printable-ASCII ratio of a prefix, then the null-byte ratio of the whole buffer. A magic match
//! always wins over the ratio heuristics.

use derive_enum_all_values::AllValues;
use serde::{Deserialize, Serialize};

/// Number of leading bytes sampled for the printable-ASCII heuristic.
pub const TEXT_SAMPLE_LEN: usize = 256;

/// Buffers shorter than this are too small for the ratio heuristics to mean anything.
pub const MIN_HEURISTIC_LEN: usize = 16;

const TEXT_THRESHOLD: f32 = 0.8;
const NULL_THRESHOLD: f32 = 0.5;

const CODE_MAGICS: [&[u8]; 3] = [b"\0asm", b"\x7fELF", b"MZ"];
const ASSET_MAGICS: [&[u8]; 3] = [b"\x89PNG", b"RIFF", b"OggS"];
const MP4_BRAND_OFFSET: usize = 4;

/// Coarse classification of a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AllValues)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    /// Executables and bytecode (WASM, ELF, PE).
    Code,
    /// Mostly printable ASCII.
    Text,
    /// Already-encoded media containers (PNG, RIFF, OGG, MP4).
    Assets,
    /// Mostly zero bytes.
    Data,
    /// Nothing matched.
    Unknown,
}

/// Classifies `data`.
///
/// # Examples
///
/// ```
/// use pixelrts_compression::{detect_content_type, ContentType};
///
/// assert_eq!(detect_content_type(b"\0asm\x01\0\0\0"), ContentType::Code);
/// assert_eq!(detect_content_type(&[0u8; 64]), ContentType::Data);
/// ```
pub fn detect_content_type(data: &[u8]) -> ContentType {
    classify(data).0
}

/// Confidence in [`detect_content_type`]'s answer, between 0 and 1.
///
/// Magic matches score 1. Heuristic matches score the ratio that crossed the threshold.
/// [`ContentType::Unknown`] scores 0.
pub fn detection_confidence(data: &[u8]) -> f32 {
    classify(data).1
}

fn classify(data: &[u8]) -> (ContentType, f32) {
    if CODE_MAGICS.iter().any(|magic| data.starts_with(magic)) {
        return (ContentType::Code, 1.0);
    }

    if ASSET_MAGICS.iter().any(|magic| data.starts_with(magic)) || is_mp4(data) {
        return (ContentType::Assets, 1.0);
    }

    if data.len() < MIN_HEURISTIC_LEN {
        return (ContentType::Unknown, 0.0);
    }

    let sample = &data[..data.len().min(TEXT_SAMPLE_LEN)];
    let printable = sample.iter().filter(|&&b| is_text_byte(b)).count();
    let text_ratio = printable as f32 / sample.len() as f32;
    if text_ratio > TEXT_THRESHOLD {
        return (ContentType::Text, text_ratio);
    }

    let nulls = data.iter().filter(|&&b| b == 0).count();
    let null_ratio = nulls as f32 / data.len() as f32;
    if null_ratio > NULL_THRESHOLD {
        return (ContentType::Data, null_ratio);
    }

    (ContentType::Unknown, 0.0)
}

#[inline]
fn is_mp4(data: &[u8]) -> bool {
    data.get(MP4_BRAND_OFFSET..MP4_BRAND_OFFSET + 4) == Some(&b"ftyp"[..])
}

#[inline]
fn is_text_byte(byte: u8) -> bool {
    matches!(byte, 32..=126 | b'\t' | b'\n' | b'\r')
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(b"\0asm\x01\0\0\0".to_vec(), ContentType::Code)]
    #[case(b"\x7fELF\x02\x01\x01".to_vec(), ContentType::Code)]
    #[case(b"MZ\x90\0".to_vec(), ContentType::Code)]
    #[case(b"\x89PNG\r\n\x1a\n".to_vec(), ContentType::Assets)]
    #[case(b"RIFF\0\0\0\0WAVE".to_vec(), ContentType::Assets)]
    #[case(b"OggS\0\x02".to_vec(), ContentType::Assets)]
    #[case(b"\0\0\0\x18ftypmp42".to_vec(), ContentType::Assets)]
    #[case(b"The quick brown fox jumps over the lazy dog.\n".to_vec(), ContentType::Text)]
    #[case(vec![0u8; 1024], ContentType::Data)]
    #[case(vec![0xFFu8; 1024], ContentType::Unknown)]
    #[case(b"short".to_vec(), ContentType::Unknown)]
    #[case(Vec::new(), ContentType::Unknown)]
    fn detects_content(#[case] data: Vec<u8>, #[case] expected: ContentType) {
        assert_eq!(detect_content_type(&data), expected);
    }

    #[test]
    fn wasm_magic_outranks_null_ratio() {
        let mut module = b"\0asm\x01\0\0\0".to_vec();
        module.extend(core::iter::repeat(0u8).take(4096));
        assert_eq!(detect_content_type(&module), ContentType::Code);
        assert_eq!(detection_confidence(&module), 1.0);
    }

    #[test]
    fn heuristic_confidence_is_the_winning_ratio() {
        let mut data = vec![0u8; 75];
        data.extend([1u8; 25]);
        assert_eq!(detect_content_type(&data), ContentType::Data);
        assert!((detection_confidence(&data) - 0.75).abs() < f32::EPSILON);
        assert_eq!(detection_confidence(&[0xFF; 32]), 0.0);
    }

    #[test]
    fn text_sampling_only_looks_at_prefix() {
        let mut data = b"a".repeat(TEXT_SAMPLE_LEN);
        data.extend([0xFFu8; 4096]);
        assert_eq!(detect_content_type(&data), ContentType::Text);
    }

    #[test]
    fn every_type_round_trips_through_json() {
        for content_type in ContentType::all_values() {
            let json = serde_json::to_string(content_type).unwrap();
            assert_eq!(&serde_json::from_str::<ContentType>(&json).unwrap(), content_type);
        }
    }
}
