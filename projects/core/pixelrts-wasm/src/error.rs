//! Error types for the semantic visualizer.

use thiserror::Error;

/// Errors raised while visualizing or decoding WASM modules.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum VisualizerError {
    /// The input does not start with the WASM magic.
    #[error("Input is not a WASM module (missing \\0asm magic)")]
    NotWasm,

    /// Decoded bytes do not start with the WASM magic.
    ///
    /// The pixels were not produced by the visualizer; a verbatim copy of the payload is needed.
    #[error("Decoded bytes do not start with the WASM magic")]
    MagicMismatch,

    /// Fewer pixels were supplied than `expected_size` requires.
    #[error("Need {required} pixels to decode {expected_size} bytes, got {available}")]
    InsufficientPixels {
        /// Requested output length.
        expected_size: usize,
        /// Pixels needed for that length.
        required: usize,
        /// Pixels supplied.
        available: usize,
    },
}
