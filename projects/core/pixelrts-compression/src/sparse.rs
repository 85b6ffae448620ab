//! Zero-run codec for sparse payloads such as disk images.
//!
//! Stream layout:
//!
//! ```text
//! "SPAR" | original length (u32 LE) | body
//! ```
//!
//! The body copies bytes through unchanged, except:
//!
//! - A zero run of at least `min_run` bytes becomes one or more `Z lo hi` tokens, where `lo hi` is
//!   the run length as a little-endian `u16` in `1..=MAX_RUN_PER_TOKEN`. Longer runs chain tokens.
//! - A literal `Z` (`0x5A`) byte becomes the token `Z 00 00`.
//!
//! Zero runs shorter than `min_run` are copied as plain zero bytes.

use crate::error::{CompressResult, CompressionError};

/// Magic starting every sparse stream.
pub const SPARSE_MAGIC: [u8; 4] = *b"SPAR";

/// Byte introducing a token in the body.
pub const RUN_MARKER: u8 = b'Z';

/// Longest zero run a single token can describe.
pub const MAX_RUN_PER_TOKEN: usize = u16::MAX as usize;

/// Default minimum zero-run length worth replacing with a token.
pub const DEFAULT_MIN_RUN: usize = 64;

const HEADER_LEN: usize = SPARSE_MAGIC.len() + 4;
const TOKEN_LEN: usize = 3;

/// Replaces long zero runs with run-length tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SparseCompressor {
    min_run: usize,
}

impl Default for SparseCompressor {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_RUN)
    }
}

impl SparseCompressor {
    /// Creates a compressor replacing zero runs of at least `min_run` bytes (minimum 1).
    pub fn new(min_run: usize) -> Self {
        Self {
            min_run: min_run.max(1),
        }
    }

    /// Minimum zero-run length replaced by a token.
    pub fn min_run(&self) -> usize {
        self.min_run
    }

    /// Compresses `data`.
    ///
    /// # Errors
    ///
    /// Returns [`CompressionError::InputTooLarge`] for inputs over 4 GiB.
    pub fn compress(&self, data: &[u8]) -> CompressResult<Vec<u8>> {
        let original_len = u32::try_from(data.len()).map_err(|_| CompressionError::InputTooLarge {
            len: data.len(),
            max: u32::MAX as usize,
        })?;

        let mut out = Vec::with_capacity(HEADER_LEN + data.len() / 2);
        out.extend_from_slice(&SPARSE_MAGIC);
        out.extend_from_slice(&original_len.to_le_bytes());

        let mut pos = 0;
        while pos < data.len() {
            match data[pos] {
                0 => {
                    let run = data[pos..].iter().take_while(|&&b| b == 0).count();
                    if run >= self.min_run {
                        push_run_tokens(&mut out, run);
                    } else {
                        out.resize(out.len() + run, 0);
                    }
                    pos += run;
                }
                RUN_MARKER => {
                    out.extend_from_slice(&[RUN_MARKER, 0, 0]);
                    pos += 1;
                }
                byte => {
                    out.push(byte);
                    pos += 1;
                }
            }
        }

        Ok(out)
    }

    /// Decompresses a stream produced by [`Self::compress`].
    ///
    /// The minimum run length is not needed; any compressor's output decodes here.
    ///
    /// # Errors
    ///
    /// - [`CompressionError::UnknownSignature`] if the magic is missing.
    /// - [`CompressionError::Truncated`] if the header or a token is cut short.
    /// - [`CompressionError::SizeMismatch`] if the body disagrees with the recorded length.
    pub fn decompress(data: &[u8]) -> CompressResult<Vec<u8>> {
        if !data.starts_with(&SPARSE_MAGIC) {
            return Err(CompressionError::UnknownSignature);
        }
        let Some(len_bytes) = data.get(SPARSE_MAGIC.len()..HEADER_LEN) else {
            return Err(CompressionError::Truncated {
                offset: SPARSE_MAGIC.len(),
            });
        };
        let mut raw_len = [0u8; 4];
        raw_len.copy_from_slice(len_bytes);
        let expected = u32::from_le_bytes(raw_len) as usize;

        let body = &data[HEADER_LEN..];
        // The header length is untrusted; never reserve more than the body could expand to.
        let bound = body.len().saturating_mul(MAX_RUN_PER_TOKEN / TOKEN_LEN + 1);
        let mut out = Vec::with_capacity(expected.min(bound));

        let mut pos = 0;
        while pos < body.len() {
            if body[pos] != RUN_MARKER {
                out.push(body[pos]);
                pos += 1;
                continue;
            }

            let (Some(&lo), Some(&hi)) = (body.get(pos + 1), body.get(pos + 2)) else {
                return Err(CompressionError::Truncated {
                    offset: HEADER_LEN + pos,
                });
            };
            match u16::from_le_bytes([lo, hi]) {
                0 => out.push(RUN_MARKER),
                run => out.resize(out.len() + run as usize, 0),
            }
            if out.len() > expected {
                break;
            }
            pos += TOKEN_LEN;
        }

        if out.len() != expected {
            return Err(CompressionError::SizeMismatch {
                expected,
                actual: out.len(),
            });
        }
        Ok(out)
    }
}

fn push_run_tokens(out: &mut Vec<u8>, mut run: usize) {
    while run > 0 {
        let chunk = run.min(MAX_RUN_PER_TOKEN);
        out.push(RUN_MARKER);
        out.extend_from_slice(&(chunk as u16).to_le_bytes());
        run -= chunk;
    }
}
