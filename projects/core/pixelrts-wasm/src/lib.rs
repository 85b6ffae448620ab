#![doc = include_str!(concat!("../", core::env!("CARGO_PKG_README")))]
#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

extern crate alloc;

pub mod analysis;
pub mod error;
pub mod opcodes;
pub mod visualizer;

pub use analysis::{analyze_complexity, ComplexityReport};
pub use error::VisualizerError;
pub use opcodes::{category, complexity_score, is_recognized, opcode_name, OpcodeCategory};
pub use visualizer::{
    color_opcode, minimal_module, sample_module, SemanticVisualizer, SemanticVisualizerBuilder,
    BYTES_PER_PIXEL, DEFAULT_SMOOTHING_WINDOW, WASM_MAGIC,
};
