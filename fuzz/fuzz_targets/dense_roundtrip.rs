#![no_main]

// Encodes arbitrary bytes into a PNG container and checks the decode is exact.

use libfuzzer_sys::fuzz_target;
use pixelrts_api::{Decoder, Encoder, UserMetadata};

fuzz_target!(|data: &[u8]| {
    let compress = data.first().is_some_and(|byte| byte & 1 == 1);
    let container = Encoder::builder()
        .compress(compress)
        .build()
        .encode(data, &UserMetadata::default())
        .unwrap();
    let png = container.to_png_bytes().unwrap();
    assert_eq!(Decoder::new().decode_png(&png).unwrap(), data);
});
