//! Pixel transform between WASM modules and "code" mode pixels.

use crate::error::VisualizerError;
use crate::opcodes::{complexity_score, is_recognized};
use alloc::vec::Vec;
use pixelrts_common::color_8888::Rgba8888;

/// Magic every WASM module starts with.
pub const WASM_MAGIC: [u8; 4] = *b"\0asm";

/// Number of payload bytes stored per pixel (G and B channels).
pub const BYTES_PER_PIXEL: usize = 2;

/// Default box filter width applied to the complexity (R) channel.
pub const DEFAULT_SMOOTHING_WINDOW: usize = 256;

/// Smallest valid module: magic + version 1.
const MINIMAL_MODULE: [u8; 8] = [0x00, 0x61, 0x73, 0x6D, 0x01, 0x00, 0x00, 0x00];

/// Returns the 8-byte minimal WASM module (magic followed by version 1).
pub fn minimal_module() -> Vec<u8> {
    MINIMAL_MODULE.to_vec()
}

/// Returns a small valid module exporting an empty `main` function.
pub fn sample_module() -> Vec<u8> {
    let mut module = minimal_module();
    module.extend_from_slice(&[
        0x01, 0x04, 0x01, 0x60, 0x00, 0x00, // type: () -> ()
        0x03, 0x02, 0x01, 0x00, // function: type 0
        0x07, 0x08, 0x01, 0x04, b'm', b'a', b'i', b'n', 0x00, 0x00, // export "main"
        0x0A, 0x04, 0x01, 0x02, 0x00, 0x0B, // code: empty body
    ]);
    module
}

/// Maps WASM bytes to pixels whose colour reflects the opcode under each byte pair.
///
/// Only the G and B channels carry data; R and A exist purely for viewing and are never
/// read back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SemanticVisualizer {
    smoothing_window: usize,
}

impl Default for SemanticVisualizer {
    fn default() -> Self {
        Self {
            smoothing_window: DEFAULT_SMOOTHING_WINDOW,
        }
    }
}

/// Builder for [`SemanticVisualizer`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SemanticVisualizerBuilder {
    visualizer: SemanticVisualizer,
}

impl SemanticVisualizerBuilder {
    /// Sets the width of the box filter over the complexity channel. `0` or `1` disables smoothing.
    pub fn smoothing_window(mut self, window: usize) -> Self {
        self.visualizer.smoothing_window = window;
        self
    }

    /// Finalizes the visualizer.
    pub fn build(self) -> SemanticVisualizer {
        self.visualizer
    }
}

impl SemanticVisualizer {
    /// Creates a visualizer with [`DEFAULT_SMOOTHING_WINDOW`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts building a visualizer with custom settings.
    pub fn builder() -> SemanticVisualizerBuilder {
        SemanticVisualizerBuilder::default()
    }

    /// Width of the complexity box filter.
    pub fn smoothing_window(&self) -> usize {
        self.smoothing_window
    }

    /// Whether `data` starts with [`WASM_MAGIC`].
    pub fn is_target(data: &[u8]) -> bool {
        data.starts_with(&WASM_MAGIC)
    }

    /// Transforms a WASM module into pixels, one per byte pair.
    ///
    /// # Errors
    ///
    /// Returns [`VisualizerError::NotWasm`] if `data` lacks the WASM magic.
    pub fn visualize(&self, data: &[u8]) -> Result<Vec<Rgba8888>, VisualizerError> {
        if !Self::is_target(data) {
            return Err(VisualizerError::NotWasm);
        }
        Ok(self.visualize_unchecked(data))
    }

    /// Transforms arbitrary bytes into pixels without checking the magic.
    ///
    /// Used for compressed module streams, where the magic is no longer at the front.
    pub fn visualize_unchecked(&self, data: &[u8]) -> Vec<Rgba8888> {
        let complexity = self.complexity_channel(data);
        data.chunks(BYTES_PER_PIXEL)
            .zip(complexity)
            .map(|(pair, red)| {
                let operand = pair.get(1).copied().unwrap_or(0);
                color_opcode(pair[0], operand, Some(red))
            })
            .collect()
    }

    /// Computes the R channel for every pixel `data` would produce.
    ///
    /// Each byte is scored, the scores are box-filtered across the whole byte stream and the
    /// value at every even position is kept.
    pub fn complexity_channel(&self, data: &[u8]) -> Vec<u8> {
        let scores: Vec<u8> = data.iter().map(|&byte| complexity_score(byte)).collect();
        if self.smoothing_window <= 1 || scores.is_empty() {
            return scores.iter().step_by(BYTES_PER_PIXEL).copied().collect();
        }

        let mut prefix = Vec::with_capacity(scores.len() + 1);
        prefix.push(0u64);
        let mut total = 0u64;
        for &score in &scores {
            total += u64::from(score);
            prefix.push(total);
        }

        let half = self.smoothing_window / 2;
        (0..scores.len())
            .step_by(BYTES_PER_PIXEL)
            .map(|index| {
                let start = index.saturating_sub(half);
                let end = (index + half + 1).min(scores.len());
                let sum = prefix[end] - prefix[start];
                (sum / (end - start) as u64) as u8
            })
            .collect()
    }

    /// Rebuilds module bytes from (G, B) channel pairs and checks the WASM magic.
    ///
    /// # Errors
    ///
    /// - [`VisualizerError::InsufficientPixels`] if `pixels` holds fewer than `expected_size` bytes
    /// - [`VisualizerError::MagicMismatch`] if the result does not start with [`WASM_MAGIC`]
    pub fn decode(pixels: &[Rgba8888], expected_size: usize) -> Result<Vec<u8>, VisualizerError> {
        let data = Self::decode_unchecked(pixels, expected_size)?;
        if !Self::is_target(&data) {
            return Err(VisualizerError::MagicMismatch);
        }
        Ok(data)
    }

    /// Rebuilds bytes from (G, B) channel pairs without checking the magic.
    ///
    /// # Errors
    ///
    /// Returns [`VisualizerError::InsufficientPixels`] if `pixels` holds fewer than
    /// `expected_size` bytes.
    pub fn decode_unchecked(
        pixels: &[Rgba8888],
        expected_size: usize,
    ) -> Result<Vec<u8>, VisualizerError> {
        let required = expected_size.div_ceil(BYTES_PER_PIXEL);
        if pixels.len() < required {
            return Err(VisualizerError::InsufficientPixels {
                expected_size,
                required,
                available: pixels.len(),
            });
        }

        let mut data = Vec::with_capacity(required * BYTES_PER_PIXEL);
        for pixel in &pixels[..required] {
            data.push(pixel.g);
            data.push(pixel.b);
        }
        data.truncate(expected_size);
        Ok(data)
    }
}

/// Colours a single byte pair.
///
/// `complexity` overrides the R channel; when `None` the raw score of `opcode` is used.
#[inline]
pub fn color_opcode(opcode: u8, operand: u8, complexity: Option<u8>) -> Rgba8888 {
    let red = complexity.unwrap_or_else(|| complexity_score(opcode));
    let alpha = if is_recognized(opcode) { 255 } else { 0 };
    Rgba8888::new(red, opcode, operand, alpha)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use rstest::rstest;

    fn unsmoothed() -> SemanticVisualizer {
        SemanticVisualizer::builder().smoothing_window(1).build()
    }

    #[test]
    fn sample_module_round_trips() {
        let module = sample_module();
        let pixels = SemanticVisualizer::new().visualize(&module).unwrap();
        assert_eq!(pixels.len(), module.len().div_ceil(2));
        assert_eq!(SemanticVisualizer::decode(&pixels, module.len()).unwrap(), module);
    }

    #[test]
    fn odd_length_is_padded_and_truncated() {
        let mut module = minimal_module();
        module.push(0x0B);
        let pixels = unsmoothed().visualize(&module).unwrap();
        assert_eq!(pixels.len(), 5);
        assert_eq!(pixels[4].g, 0x0B);
        assert_eq!(pixels[4].b, 0);
        assert_eq!(SemanticVisualizer::decode(&pixels, module.len()).unwrap(), module);
    }

    #[test]
    fn channels_follow_even_byte() {
        // 0x00 unreachable (known), 0x06 unknown
        let data = [0x00, 0x61, 0x73, 0x6D, 0x06, 0x10];
        let pixels = unsmoothed().visualize(&data).unwrap();
        assert_eq!(pixels[0], Rgba8888::new(255, 0x00, 0x61, 255));
        assert_eq!(pixels[1], Rgba8888::new(80, 0x73, 0x6D, 255));
        assert_eq!(pixels[2], Rgba8888::new(0, 0x06, 0x10, 0));
    }

    #[test]
    fn red_channel_is_not_read_back() {
        let module = sample_module();
        let mut pixels = unsmoothed().visualize(&module).unwrap();
        for pixel in &mut pixels {
            pixel.r = 7;
            pixel.a = 0;
        }
        assert_eq!(SemanticVisualizer::decode(&pixels, module.len()).unwrap(), module);
    }

    #[test]
    fn rejects_non_wasm_input() {
        assert_eq!(
            SemanticVisualizer::new().visualize(b"ELF binary"),
            Err(VisualizerError::NotWasm)
        );
    }

    #[test]
    fn decode_rejects_foreign_pixels() {
        let pixels = unsmoothed().visualize_unchecked(b"not a module");
        assert_eq!(
            SemanticVisualizer::decode(&pixels, 12),
            Err(VisualizerError::MagicMismatch)
        );
        assert_eq!(
            SemanticVisualizer::decode_unchecked(&pixels, 12).unwrap(),
            b"not a module"
        );
    }

    #[test]
    fn decode_reports_missing_pixels() {
        let pixels = vec![Rgba8888::TRANSPARENT; 3];
        assert_eq!(
            SemanticVisualizer::decode(&pixels, 8),
            Err(VisualizerError::InsufficientPixels {
                expected_size: 8,
                required: 4,
                available: 3
            })
        );
    }

    #[rstest]
    #[case(0)]
    #[case(1)]
    #[case(4)]
    #[case(256)]
    fn uniform_scores_survive_smoothing(#[case] window: usize) {
        // i32.add throughout: every score is 80
        let data = vec![0x6A; 64];
        let visualizer = SemanticVisualizer::builder().smoothing_window(window).build();
        let channel = visualizer.complexity_channel(&data);
        assert_eq!(channel.len(), 32);
        assert!(channel.iter().all(|&red| red == 80));
    }

    #[test]
    fn smoothing_spreads_spikes() {
        // One `unreachable` among nops.
        let mut data = vec![0x01; 16];
        data[8] = 0x00;
        let raw = unsmoothed().complexity_channel(&data);
        assert_eq!(raw[4], 255);
        assert_eq!(raw[3], 0);

        let smoothed = SemanticVisualizer::builder()
            .smoothing_window(4)
            .build()
            .complexity_channel(&data);
        // window [6, 11) around index 8 holds one spike over 5 bytes
        assert_eq!(smoothed[4], 51);
        // window [4, 9) around index 6 reaches the spike too
        assert_eq!(smoothed[3], 51);
        assert_eq!(smoothed[0], 0);
    }

    #[test]
    fn empty_input_yields_no_pixels() {
        assert!(SemanticVisualizer::new().visualize_unchecked(&[]).is_empty());
        assert!(SemanticVisualizer::decode_unchecked(&[], 0).unwrap().is_empty());
    }

    #[test]
    fn color_opcode_defaults_to_raw_score() {
        assert_eq!(color_opcode(0x02, 0x40, None), Rgba8888::new(200, 0x02, 0x40, 255));
        assert_eq!(color_opcode(0x02, 0x40, Some(9)), Rgba8888::new(9, 0x02, 0x40, 255));
    }
}
