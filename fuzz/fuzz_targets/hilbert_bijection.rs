#![no_main]

// Checks that index -> coordinate -> index is the identity and that neighbours stay adjacent.

use libfuzzer_sys::{arbitrary, fuzz_target};
use pixelrts_curve::HilbertCurve;

#[derive(Clone, Debug, arbitrary::Arbitrary)]
pub struct CurveInput {
    pub order: u8,
    pub index: u32,
}

fuzz_target!(|input: CurveInput| {
    let Ok(curve) = HilbertCurve::new(u32::from(input.order % 16)) else {
        return;
    };
    let index = input.index as usize % curve.len();

    let coord = curve.index_to_coord(index).unwrap();
    assert!(coord.x < curve.grid_size() && coord.y < curve.grid_size());
    assert_eq!(curve.coord_to_index(coord).unwrap(), index);

    if index + 1 < curve.len() {
        let next = curve.index_to_coord(index + 1).unwrap();
        assert!(coord.is_adjacent_to(next), "{coord:?} -> {next:?} is not a step");
    }
});
