//! Dictionary ("solid") compression for many small, similar buffers.
//!
//! A shared dictionary is assembled from the most frequent 4-byte n-grams of a sample set and used
//! as ZStandard history for every buffer. Decompression needs the same dictionary.

use crate::adaptive::{decompress_as, AdaptiveCompressor, CompressionOutcome};
use crate::content::{detect_content_type, ContentType};
use crate::error::{CompressResult, CompressionError};
use crate::level::{CompressionAlgorithm, CompressionLevel};
use std::collections::HashMap;

/// Largest dictionary built by [`SolidCompressor::build_dictionary`].
pub const MAX_DICTIONARY_SIZE: usize = 32 * 1024;

/// Length of the n-grams counted when building a dictionary.
pub const NGRAM_LEN: usize = 4;

/// Level used with a dictionary, recorded in the outcome.
#[cfg(feature = "zstd")]
const DICTIONARY_LEVEL: CompressionLevel = CompressionLevel::High;

/// Compresses buffers against a shared n-gram dictionary.
#[derive(Debug, Clone, Default)]
pub struct SolidCompressor {
    dictionary: Option<Vec<u8>>,
    fallback: AdaptiveCompressor,
}

impl SolidCompressor {
    /// Creates a compressor without a dictionary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a compressor around an existing dictionary, truncated to [`MAX_DICTIONARY_SIZE`].
    pub fn with_dictionary(mut dictionary: Vec<u8>) -> Self {
        dictionary.truncate(MAX_DICTIONARY_SIZE);
        Self {
            dictionary: (!dictionary.is_empty()).then_some(dictionary),
            fallback: AdaptiveCompressor::default(),
        }
    }

    /// The loaded dictionary, if any.
    pub fn dictionary(&self) -> Option<&[u8]> {
        self.dictionary.as_deref()
    }

    /// Builds the dictionary from `samples`, replacing any previous one.
    ///
    /// N-grams are ranked by frequency (ties by byte value) and concatenated until the dictionary
    /// would exceed [`MAX_DICTIONARY_SIZE`]. Returns the new dictionary, or `None` if the samples
    /// contain no complete n-gram.
    pub fn build_dictionary<S: AsRef<[u8]>>(&mut self, samples: &[S]) -> Option<&[u8]> {
        let mut counts: HashMap<[u8; NGRAM_LEN], u32> = HashMap::new();
        for sample in samples {
            for window in sample.as_ref().windows(NGRAM_LEN) {
                let mut gram = [0u8; NGRAM_LEN];
                gram.copy_from_slice(window);
                *counts.entry(gram).or_default() += 1;
            }
        }

        let mut ranked: Vec<_> = counts.into_iter().collect();
        ranked.sort_unstable_by(|(a_gram, a_count), (b_gram, b_count)| {
            b_count.cmp(a_count).then_with(|| a_gram.cmp(b_gram))
        });

        let dictionary: Vec<u8> = ranked
            .into_iter()
            .take(MAX_DICTIONARY_SIZE / NGRAM_LEN)
            .flat_map(|(gram, _)| gram)
            .collect();

        log::debug!(
            "Built {} byte dictionary from {} samples",
            dictionary.len(),
            samples.len()
        );
        self.dictionary = (!dictionary.is_empty()).then_some(dictionary);
        self.dictionary()
    }

    /// Compresses `data` against the dictionary.
    ///
    /// Falls back to dictionary-less compression at [`CompressionLevel::Medium`] when no
    /// dictionary is loaded or dictionary compression fails. The outcome's algorithm tells which
    /// path was taken.
    pub fn compress(&self, data: &[u8]) -> CompressResult<CompressionOutcome> {
        let content_type = detect_content_type(data);
        if let Some(outcome) = self.compress_with_dictionary(data, content_type) {
            return Ok(outcome);
        }
        self.fallback
            .compress_with_level(data, CompressionLevel::Medium, Some(content_type))
    }

    #[cfg(feature = "zstd")]
    fn compress_with_dictionary(
        &self,
        data: &[u8],
        content_type: ContentType,
    ) -> Option<CompressionOutcome> {
        use pixelrts_zstd::ZStandardCompressor;

        let dictionary = self.dictionary.as_deref()?;
        if data.is_empty() {
            return None;
        }
        let (zstd_level, _) = DICTIONARY_LEVEL.zstd_parameters()?;
        let result = ZStandardCompressor::new(zstd_level)
            .and_then(|compressor| compressor.compress_with_dictionary(data, dictionary));
        match result {
            Ok(compressed) => Some(CompressionOutcome::new(
                compressed,
                CompressionAlgorithm::ZstdDictionary,
                DICTIONARY_LEVEL,
                content_type,
                data.len(),
            )),
            Err(error) => {
                log::warn!("Dictionary compression failed ({error}), using no dictionary");
                None
            }
        }
    }

    #[cfg(not(feature = "zstd"))]
    fn compress_with_dictionary(
        &self,
        _data: &[u8],
        _content_type: ContentType,
    ) -> Option<CompressionOutcome> {
        if self.dictionary.is_some() {
            log::warn!("Dictionary compression needs ZStandard, compressing without dictionary");
        }
        None
    }

    /// Decompresses the output of [`Self::compress`].
    ///
    /// # Errors
    ///
    /// - [`CompressionError::DictionaryRequired`] if `algorithm` is
    ///   [`CompressionAlgorithm::ZstdDictionary`] and no dictionary is loaded.
    /// - Any error of [`crate::decompress_as`].
    pub fn decompress(
        &self,
        data: &[u8],
        algorithm: CompressionAlgorithm,
        expected_size: Option<usize>,
    ) -> CompressResult<Vec<u8>> {
        if algorithm != CompressionAlgorithm::ZstdDictionary {
            return decompress_as(algorithm, data, expected_size);
        }
        let dictionary = self
            .dictionary
            .as_deref()
            .ok_or(CompressionError::DictionaryRequired)?;
        decompress_with_dictionary(data, dictionary, expected_size)
    }
}

#[cfg(feature = "zstd")]
fn decompress_with_dictionary(
    data: &[u8],
    dictionary: &[u8],
    expected_size: Option<usize>,
) -> CompressResult<Vec<u8>> {
    use pixelrts_zstd::ZStandardError;

    pixelrts_zstd::decompress_with_dictionary(data, dictionary, expected_size).map_err(|error| {
        match error {
            ZStandardError::SizeMismatch { expected, actual } => {
                CompressionError::SizeMismatch { expected, actual }
            }
            other => other.into(),
        }
    })
}

#[cfg(not(feature = "zstd"))]
fn decompress_with_dictionary(
    _data: &[u8],
    _dictionary: &[u8],
    _expected_size: Option<usize>,
) -> CompressResult<Vec<u8>> {
    Err(CompressionError::UnsupportedAlgorithm(
        CompressionAlgorithm::ZstdDictionary,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_samples() -> Vec<Vec<u8>> {
        (0..32)
            .map(|i| {
                let port = 8000 + i;
                format!("[service-{i}]\nenabled = true\nrestart = always\nport = {port}\n")
                    .into_bytes()
            })
            .collect()
    }

    #[test]
    fn dictionary_is_bounded_and_ranked() {
        let mut compressor = SolidCompressor::new();
        let samples = vec![vec![0xAB; 100_000], (0..=255u8).cycle().take(100_000).collect()];
        let dictionary = compressor.build_dictionary(&samples).unwrap().to_vec();

        assert!(dictionary.len() <= MAX_DICTIONARY_SIZE);
        assert_eq!(dictionary.len() % NGRAM_LEN, 0);
        assert_eq!(&dictionary[..NGRAM_LEN], &[0xAB; NGRAM_LEN]);
    }

    #[test]
    fn no_complete_ngram_means_no_dictionary() {
        let mut compressor = SolidCompressor::new();
        assert!(compressor.build_dictionary(&[b"abc"]).is_none());
        assert!(compressor.dictionary().is_none());
    }

    #[test]
    fn round_trip_with_dictionary() {
        let samples = config_samples();
        let mut compressor = SolidCompressor::new();
        compressor.build_dictionary(&samples);

        for sample in &samples {
            let outcome = compressor.compress(sample).unwrap();
            let restored = compressor
                .decompress(&outcome.data, outcome.algorithm, Some(sample.len()))
                .unwrap();
            assert_eq!(&restored, sample);
        }
    }

    #[cfg(feature = "zstd")]
    #[test]
    fn dictionary_outcome_records_level_used() {
        let samples = config_samples();
        let mut compressor = SolidCompressor::new();
        compressor.build_dictionary(&samples);

        let outcome = compressor.compress(&samples[0]).unwrap();
        assert_eq!(outcome.algorithm, CompressionAlgorithm::ZstdDictionary);
        assert_eq!(outcome.level, CompressionLevel::High);
        assert_eq!(outcome.level, DICTIONARY_LEVEL);
    }

    #[test]
    fn falls_back_without_dictionary() {
        let sample = config_samples().remove(0);
        let compressor = SolidCompressor::new();
        let outcome = compressor.compress(&sample).unwrap();

        assert_ne!(outcome.algorithm, CompressionAlgorithm::ZstdDictionary);
        assert_eq!(outcome.level, CompressionLevel::Medium);
        assert_eq!(
            compressor
                .decompress(&outcome.data, outcome.algorithm, Some(sample.len()))
                .unwrap(),
            sample
        );
    }

    #[test]
    fn dictionary_stream_needs_dictionary() {
        assert!(matches!(
            SolidCompressor::new().decompress(
                &[0x28, 0xB5, 0x2F, 0xFD],
                CompressionAlgorithm::ZstdDictionary,
                None
            ),
            Err(CompressionError::DictionaryRequired)
        ));
    }
}
