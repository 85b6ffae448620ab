#![no_main]

// Sparse streams must decode to exactly what was compressed, whatever the run threshold.

use libfuzzer_sys::{arbitrary, fuzz_target};
use pixelrts_compression::SparseCompressor;

#[derive(Clone, Debug, arbitrary::Arbitrary)]
pub struct SparseInput {
    pub min_run: u8,
    pub zero_run: u16,
    pub data: Vec<u8>,
}

fuzz_target!(|input: SparseInput| {
    // Splice a long zero run into the middle so tokens actually get emitted.
    let mut data = input.data;
    let middle = data.len() / 2;
    data.splice(middle..middle, core::iter::repeat(0).take(usize::from(input.zero_run)));

    let compressor = SparseCompressor::new(usize::from(input.min_run));
    let compressed = compressor.compress(&data).unwrap();
    assert_eq!(SparseCompressor::decompress(&compressed).unwrap(), data);
});
