use pixelrts_common::color_8888::Rgba8888;
use pixelrts_wasm::{
    analyze_complexity, is_recognized, sample_module, SemanticVisualizer, VisualizerError,
};

/// Builds a module with a long body of mixed instructions.
fn large_module() -> Vec<u8> {
    let mut module = sample_module();
    for i in 0..2_000u32 {
        module.extend_from_slice(&[0x20, (i % 8) as u8, 0x41, (i % 100) as u8, 0x6A, 0x0D, 0x00]);
    }
    module
}

#[test]
fn large_module_round_trips_with_default_smoothing() {
    let module = large_module();
    let pixels = SemanticVisualizer::new().visualize(&module).unwrap();
    assert_eq!(SemanticVisualizer::decode(&pixels, module.len()).unwrap(), module);
}

#[test]
fn alpha_marks_recognized_even_bytes() {
    let module = large_module();
    let pixels = SemanticVisualizer::new().visualize(&module).unwrap();
    for (pair, pixel) in module.chunks(2).zip(&pixels) {
        assert_eq!(pixel.a == 255, is_recognized(pair[0]));
    }
}

#[test]
fn compressed_streams_round_trip_unchecked() {
    let stream: Vec<u8> = (0..=255u8).rev().collect();
    let pixels: Vec<Rgba8888> = SemanticVisualizer::new().visualize_unchecked(&stream);
    assert_eq!(
        SemanticVisualizer::decode(&pixels, stream.len()),
        Err(VisualizerError::MagicMismatch)
    );
    assert_eq!(SemanticVisualizer::decode_unchecked(&pixels, stream.len()).unwrap(), stream);
}

#[test]
fn analysis_reports_mixed_body() {
    let report = analyze_complexity(&large_module());
    assert!(report.complexity_score() > 0.0);
    assert!(report.complexity_score() <= 100.0);
}
