#![doc = include_str!(concat!("../", core::env!("CARGO_PKG_README")))]
#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

extern crate alloc;

use alloc::vec::Vec;
use core::ffi::c_void;
use thiserror::Error;
use zstd_sys::ZSTD_cParameter::*;
use zstd_sys::*;

/// Magic bytes starting every standard ZStandard frame.
pub const ZSTD_MAGIC: [u8; 4] = [0x28, 0xB5, 0x2F, 0xFD];

/// Largest declared content size decompressed without a caller-supplied size hint.
pub const MAX_UNHINTED_CONTENT_SIZE: usize = 256 * 1024 * 1024;

const CONTENTSIZE_UNKNOWN: u64 = u64::MAX;
const CONTENTSIZE_ERROR: u64 = u64::MAX - 1;

/// Errors that can occur while compressing or decompressing with ZStandard.
#[derive(Debug, Error)]
pub enum ZStandardError {
    /// Invalid compression level
    #[error("Invalid compression level: {0}")]
    InvalidLevel(i32),

    /// Invalid window log
    #[error("Invalid window log: {0}")]
    InvalidWindowLog(u32),

    /// A compression or decompression context could not be created
    #[error("Failed to create ZStandard context")]
    ContextCreationFailed,

    /// The frame header does not declare its decompressed size and no size hint was given
    #[error("Frame does not declare its content size")]
    UnknownContentSize,

    /// The frame declares more than [`MAX_UNHINTED_CONTENT_SIZE`] bytes and no size hint was given
    #[error("Frame declares {declared} bytes, above the {limit} byte limit for unhinted frames")]
    ContentSizeLimit {
        /// Size declared by the frame header
        declared: usize,
        /// Largest size accepted without a hint
        limit: usize,
    },

    /// The input is not a valid ZStandard frame
    #[error("Input is not a valid ZStandard frame")]
    InvalidFrame,

    /// The decompressed size differs from the declared size
    #[error("Decompressed {actual} bytes, expected {expected}")]
    SizeMismatch {
        /// Size declared by the frame header or the caller
        expected: usize,
        /// Size actually produced
        actual: usize,
    },

    /// ZStandard internal error
    #[error("ZStandard internal error: {0:?}")]
    ZStandardInternal(ZSTD_ErrorCode),
}

/// Compresses data into standard ZStandard frames.
///
/// The compression level and window are configured when creating the compressor instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZStandardCompressor {
    compression_level: i32,
    window_log: Option<u32>,
}

impl ZStandardCompressor {
    /// Creates a new compressor with the specified compression level.
    ///
    /// # Parameters
    /// * `compression_level` - Compression level (1-22, where 1 is fastest and 22 is best compression)
    pub fn new(compression_level: i32) -> Result<Self, ZStandardError> {
        if !(1..=22).contains(&compression_level) {
            return Err(ZStandardError::InvalidLevel(compression_level));
        }

        Ok(Self {
            compression_level,
            window_log: None,
        })
    }

    /// Creates a new compressor with compression level 1 (fastest).
    pub fn new_fast() -> Self {
        Self {
            compression_level: 1,
            window_log: None,
        }
    }

    /// Creates a new compressor with compression level 3 (default).
    pub fn new_default() -> Self {
        Self {
            compression_level: 3,
            window_log: None,
        }
    }

    /// Creates a new compressor with compression level 22 (best compression).
    pub fn new_best() -> Self {
        Self {
            compression_level: 22,
            window_log: None,
        }
    }

    /// Overrides the maximum back-reference distance as a power of two (10-30).
    pub fn with_window_log(mut self, window_log: u32) -> Result<Self, ZStandardError> {
        if !(10..=30).contains(&window_log) {
            return Err(ZStandardError::InvalidWindowLog(window_log));
        }
        self.window_log = Some(window_log);
        Ok(self)
    }

    /// Compression level used by this compressor.
    pub fn level(&self) -> i32 {
        self.compression_level
    }

    /// Compresses `source` into a single frame.
    pub fn compress(&self, source: &[u8]) -> Result<Vec<u8>, ZStandardError> {
        self.compress_impl(source, None)
    }

    /// Compresses `source` into a single frame using `dictionary` as shared history.
    ///
    /// Dictionaries not in the trained ZStandard format are used as raw content. The same
    /// dictionary must be passed to [`decompress_with_dictionary`].
    pub fn compress_with_dictionary(
        &self,
        source: &[u8],
        dictionary: &[u8],
    ) -> Result<Vec<u8>, ZStandardError> {
        self.compress_impl(source, Some(dictionary))
    }

    fn compress_impl(
        &self,
        source: &[u8],
        dictionary: Option<&[u8]>,
    ) -> Result<Vec<u8>, ZStandardError> {
        let context = CompressionContext::new()?;
        context.set_parameter(ZSTD_c_compressionLevel, self.compression_level)?;
        if let Some(window_log) = self.window_log {
            context.set_parameter(ZSTD_c_windowLog, window_log as i32)?;
        }
        context.set_parameter(ZSTD_c_contentSizeFlag, 1)?;
        context.set_parameter(ZSTD_c_checksumFlag, 1)?;

        if let Some(dictionary) = dictionary {
            let result = unsafe {
                ZSTD_CCtx_loadDictionary(
                    context.0,
                    dictionary.as_ptr() as *const c_void,
                    dictionary.len(),
                )
            };
            check(result)?;
        }

        let mut destination = Vec::with_capacity(max_compressed_size(source.len()));
        let written = unsafe {
            ZSTD_compress2(
                context.0,
                destination.as_mut_ptr() as *mut c_void,
                destination.capacity(),
                source.as_ptr() as *const c_void,
                source.len(),
            )
        };
        let written = check(written)?;

        // SAFETY: ZSTD_compress2 initialized the first `written` bytes.
        unsafe { destination.set_len(written) };
        Ok(destination)
    }
}

impl Default for ZStandardCompressor {
    fn default() -> Self {
        Self::new_default()
    }
}

/// Decompresses a single ZStandard frame.
///
/// # Parameters
///
/// * `source`: A complete frame.
/// * `size_hint`: Expected decompressed size. Required if the frame does not declare its size,
///   or declares more than [`MAX_UNHINTED_CONTENT_SIZE`]; checked against the declared size
///   otherwise.
pub fn decompress(source: &[u8], size_hint: Option<usize>) -> Result<Vec<u8>, ZStandardError> {
    decompress_impl(source, None, size_hint)
}

/// Decompresses a frame produced by [`ZStandardCompressor::compress_with_dictionary`].
pub fn decompress_with_dictionary(
    source: &[u8],
    dictionary: &[u8],
    size_hint: Option<usize>,
) -> Result<Vec<u8>, ZStandardError> {
    decompress_impl(source, Some(dictionary), size_hint)
}

fn decompress_impl(
    source: &[u8],
    dictionary: Option<&[u8]>,
    size_hint: Option<usize>,
) -> Result<Vec<u8>, ZStandardError> {
    let capacity = match (frame_content_size(source)?, size_hint) {
        (Some(declared), Some(expected)) if declared != expected => {
            return Err(ZStandardError::SizeMismatch {
                expected,
                actual: declared,
            })
        }
        (Some(declared), None) if declared > MAX_UNHINTED_CONTENT_SIZE => {
            return Err(ZStandardError::ContentSizeLimit {
                declared,
                limit: MAX_UNHINTED_CONTENT_SIZE,
            })
        }
        (Some(declared), _) => declared,
        (None, Some(expected)) => expected,
        (None, None) => return Err(ZStandardError::UnknownContentSize),
    };

    let context = DecompressionContext::new()?;
    let mut destination = Vec::with_capacity(capacity);
    let (dict_ptr, dict_len) = match dictionary {
        Some(dictionary) => (dictionary.as_ptr() as *const c_void, dictionary.len()),
        None => (core::ptr::null(), 0),
    };
    let written = unsafe {
        ZSTD_decompress_usingDict(
            context.0,
            destination.as_mut_ptr() as *mut c_void,
            destination.capacity(),
            source.as_ptr() as *const c_void,
            source.len(),
            dict_ptr,
            dict_len,
        )
    };
    let written = check(written)?;
    if written != capacity {
        return Err(ZStandardError::SizeMismatch {
            expected: capacity,
            actual: written,
        });
    }

    // SAFETY: ZSTD_decompress_usingDict initialized the first `written` bytes.
    unsafe { destination.set_len(written) };
    Ok(destination)
}

/// Reads the decompressed size declared in a frame header.
///
/// Returns `Ok(None)` if the frame does not declare it.
pub fn frame_content_size(source: &[u8]) -> Result<Option<usize>, ZStandardError> {
    let size = unsafe { ZSTD_getFrameContentSize(source.as_ptr() as *const c_void, source.len()) };
    match size {
        CONTENTSIZE_ERROR => Err(ZStandardError::InvalidFrame),
        CONTENTSIZE_UNKNOWN => Ok(None),
        size => usize::try_from(size)
            .map(Some)
            .map_err(|_| ZStandardError::InvalidFrame),
    }
}

/// Checks whether `data` starts with the ZStandard frame magic.
#[inline]
pub fn is_zstd_frame(data: &[u8]) -> bool {
    data.starts_with(&ZSTD_MAGIC)
}

/// Worst-case compressed size for `len_bytes` of input.
#[inline]
pub fn max_compressed_size(len_bytes: usize) -> usize {
    unsafe { ZSTD_compressBound(len_bytes) }
}

/// Version of the linked ZStandard library, as `major * 10000 + minor * 100 + patch`.
#[inline]
pub fn version_number() -> u32 {
    unsafe { ZSTD_versionNumber() }
}

struct CompressionContext(*mut ZSTD_CCtx);

impl CompressionContext {
    fn new() -> Result<Self, ZStandardError> {
        let cctx = unsafe { ZSTD_createCCtx() };
        if cctx.is_null() {
            return Err(ZStandardError::ContextCreationFailed);
        }
        Ok(Self(cctx))
    }

    fn set_parameter(&self, parameter: ZSTD_cParameter, value: i32) -> Result<(), ZStandardError> {
        check(unsafe { ZSTD_CCtx_setParameter(self.0, parameter, value) }).map(|_| ())
    }
}

impl Drop for CompressionContext {
    fn drop(&mut self) {
        unsafe {
            ZSTD_freeCCtx(self.0);
        }
    }
}

struct DecompressionContext(*mut ZSTD_DCtx);

impl DecompressionContext {
    fn new() -> Result<Self, ZStandardError> {
        let dctx = unsafe { ZSTD_createDCtx() };
        if dctx.is_null() {
            return Err(ZStandardError::ContextCreationFailed);
        }
        Ok(Self(dctx))
    }
}

impl Drop for DecompressionContext {
    fn drop(&mut self) {
        unsafe {
            ZSTD_freeDCtx(self.0);
        }
    }
}

#[inline]
fn check(code: usize) -> Result<usize, ZStandardError> {
    if unsafe { ZSTD_isError(code) } == 0 {
        return Ok(code);
    }

    Err(ZStandardError::ZStandardInternal(unsafe {
        ZSTD_getErrorCode(code)
    }))
}
