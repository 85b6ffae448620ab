//! zlib baseline codec, available in every build.

use crate::error::{CompressResult, CompressionError};
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::io::{Read, Write};

pub(crate) fn compress(data: &[u8], level: u32) -> CompressResult<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::with_capacity(data.len() / 2), Compression::new(level));
    encoder.write_all(data).map_err(CompressionError::Zlib)?;
    encoder.finish().map_err(CompressionError::Zlib)
}

pub(crate) fn decompress(data: &[u8], size_hint: Option<usize>) -> CompressResult<Vec<u8>> {
    let mut out = Vec::with_capacity(size_hint.unwrap_or(data.len() * 2));
    ZlibDecoder::new(data)
        .read_to_end(&mut out)
        .map_err(CompressionError::Zlib)?;
    Ok(out)
}

/// Checks for a valid RFC 1950 header: deflate method and a CMF/FLG pair divisible by 31.
pub(crate) fn is_zlib_stream(data: &[u8]) -> bool {
    match data {
        [cmf, flg, ..] => cmf & 0x0F == 8 && (u16::from(*cmf) << 8 | u16::from(*flg)) % 31 == 0,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(&[0x78, 0x9C], true)]
    #[case(&[0x78, 0xDA], true)]
    #[case(&[0x78, 0x01], true)]
    #[case(&[0x78, 0x00], false)]
    #[case(&[0x28, 0xB5], false)]
    #[case(&[0x78], false)]
    fn header_detection(#[case] header: &[u8], #[case] expected: bool) {
        assert_eq!(is_zlib_stream(header), expected);
    }

    #[test]
    fn round_trip() {
        let data = b"zlib zlib zlib zlib zlib".repeat(10);
        let compressed = compress(&data, 9).unwrap();
        assert!(is_zlib_stream(&compressed));
        assert_eq!(decompress(&compressed, None).unwrap(), data);
    }
}
