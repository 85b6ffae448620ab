//! Segment tables for multi-payload containers.
//!
//! A segment names a byte range of the decoded payload (for example `kernel` and `initrd`)
//! and records its SHA-256 so it can be pulled out and checked on its own.

use crate::error::{FormatError, PixelRtsError, PixelRtsResult};
use crate::metadata::{Metadata, Segment};
use core::ops::Range;
use pixelrts_common::hash::{sha256_hex, verify_sha256_hex};
use pixelrts_layout::{FileSpec, LayoutOptimizer, LayoutSnapshot};
use std::collections::BTreeMap;

/// Builds the segment table for `data` from named ranges.
///
/// # Errors
///
/// - [`FormatError::SegmentOutOfRange`] if a range is reversed or extends past `data`.
/// - [`FormatError::DuplicateSegment`] if two ranges share a name.
pub fn build_segment_table(
    data: &[u8],
    ranges: &[(&str, Range<usize>)],
) -> PixelRtsResult<BTreeMap<String, Segment>> {
    let mut table = BTreeMap::new();
    for (name, range) in ranges {
        let bytes = data.get(range.clone()).ok_or_else(|| FormatError::SegmentOutOfRange {
            name: (*name).to_string(),
            offset: range.start as u64,
            size: range.end.saturating_sub(range.start) as u64,
            data_len: data.len(),
        })?;
        let segment = Segment {
            offset: range.start as u64,
            size: bytes.len() as u64,
            sha256: sha256_hex(bytes),
        };
        if table.insert((*name).to_string(), segment).is_some() {
            return Err(FormatError::DuplicateSegment((*name).to_string()).into());
        }
    }
    Ok(table)
}

/// Concatenates `parts` and returns the joined payload with one range per part.
pub fn concat_segments<'a>(parts: &[(&'a str, &[u8])]) -> (Vec<u8>, Vec<(&'a str, Range<usize>)>) {
    let total = parts.iter().map(|(_, bytes)| bytes.len()).sum();
    let mut data = Vec::with_capacity(total);
    let mut ranges = Vec::with_capacity(parts.len());
    for (name, bytes) in parts {
        let start = data.len();
        data.extend_from_slice(bytes);
        ranges.push((*name, start..data.len()));
    }
    (data, ranges)
}

/// Returns the bytes of segment `name` from a decoded payload, after checking its hash.
///
/// # Errors
///
/// - [`FormatError::UnknownSegment`] if the metadata has no such segment.
/// - [`FormatError::SegmentOutOfRange`] if the recorded range does not fit `data`.
/// - [`PixelRtsError::Integrity`] if the bytes do not hash to the recorded value.
pub fn extract_segment<'a>(
    data: &'a [u8],
    metadata: &Metadata,
    name: &str,
) -> PixelRtsResult<&'a [u8]> {
    let segment = metadata
        .segments
        .get(name)
        .ok_or_else(|| FormatError::UnknownSegment(name.to_string()))?;
    let out_of_range = || FormatError::SegmentOutOfRange {
        name: name.to_string(),
        offset: segment.offset,
        size: segment.size,
        data_len: data.len(),
    };
    let start = usize::try_from(segment.offset).map_err(|_| out_of_range())?;
    let size = usize::try_from(segment.size).map_err(|_| out_of_range())?;
    let bytes = start
        .checked_add(size)
        .and_then(|end| data.get(start..end))
        .ok_or_else(out_of_range)?;

    if !verify_sha256_hex(bytes, &segment.sha256) {
        return Err(PixelRtsError::Integrity {
            subject: format!("segment {name}"),
            expected: segment.sha256.clone(),
            actual: sha256_hex(bytes),
        });
    }
    Ok(bytes)
}

/// Plans where each segment would live in a zoned layout of side `grid_size`.
///
/// Segment names drive zone classification, so a `vmlinuz` lands near the centre and an
/// archive near the edge. The plan is defragmented before it is returned.
///
/// # Errors
///
/// - [`PixelRtsError::Layout`] if `grid_size` is not a valid grid.
/// - [`PixelRtsError::Allocation`] for the first segment that could not be placed in full.
pub fn plan_segments(metadata: &Metadata, grid_size: u32) -> PixelRtsResult<LayoutSnapshot> {
    let mut optimizer = LayoutOptimizer::new(grid_size)?;
    for (name, segment) in &metadata.segments {
        optimizer.add_file(FileSpec::new(name.as_str(), segment.size));
    }
    if let Some(entry) = optimizer.incomplete_files().next() {
        entry.check_complete()?;
    }
    optimizer.defragment();
    Ok(optimizer.snapshot())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{EncodingInfo, EncodingMode, UserMetadata, FORMAT_ID, FORMAT_VERSION};
    use pixelrts_layout::Zone;

    fn metadata_with(segments: BTreeMap<String, Segment>, data: &[u8]) -> Metadata {
        Metadata {
            format: FORMAT_ID.to_string(),
            format_version: FORMAT_VERSION,
            grid_size: 1,
            encoding: EncodingInfo::for_mode(EncodingMode::Standard),
            mode: EncodingMode::Standard,
            segments,
            compression: None,
            data_hash: sha256_hex(data),
            data_size: data.len() as u64,
            original_data_b64: None,
            user: UserMetadata::default(),
        }
    }

    #[test]
    fn concat_and_extract() {
        let (data, ranges) = concat_segments(&[("kernel", &b"KERNEL"[..]), ("initrd", &b"init-ramdisk"[..])]);
        assert_eq!(ranges, vec![("kernel", 0..6), ("initrd", 6..18)]);

        let table = build_segment_table(&data, &ranges).unwrap();
        assert_eq!(table["initrd"].offset, 6);
        assert_eq!(table["initrd"].size, 12);

        let metadata = metadata_with(table, &data);
        assert_eq!(extract_segment(&data, &metadata, "kernel").unwrap(), b"KERNEL");
        assert_eq!(extract_segment(&data, &metadata, "initrd").unwrap(), b"init-ramdisk");
    }

    #[test]
    fn rejects_out_of_range_and_duplicates() {
        let data = [0u8; 8];
        assert!(matches!(
            build_segment_table(&data, &[("tail", 4..12)]),
            Err(PixelRtsError::Format(FormatError::SegmentOutOfRange { .. }))
        ));
        assert!(matches!(
            build_segment_table(&data, &[("a", 0..2), ("a", 2..4)]),
            Err(PixelRtsError::Format(FormatError::DuplicateSegment(name))) if name == "a"
        ));
    }

    #[test]
    fn extract_detects_tampering() {
        let data = b"abcdefgh".to_vec();
        let table = build_segment_table(&data, &[("head", 0..4)]).unwrap();
        let metadata = metadata_with(table, &data);

        let mut tampered = data.clone();
        tampered[1] = b'X';
        assert!(matches!(
            extract_segment(&tampered, &metadata, "head"),
            Err(PixelRtsError::Integrity { .. })
        ));
        assert!(matches!(
            extract_segment(&data, &metadata, "missing"),
            Err(PixelRtsError::Format(FormatError::UnknownSegment(_)))
        ));
        assert!(matches!(
            extract_segment(&data[..2], &metadata, "head"),
            Err(PixelRtsError::Format(FormatError::SegmentOutOfRange { .. }))
        ));
    }

    #[test]
    fn plan_places_kernel_hot() {
        let kernel = vec![1u8; 4096];
        let archive = vec![2u8; 4096];
        let (data, ranges) =
            concat_segments(&[("vmlinuz", kernel.as_slice()), ("backup.tar", archive.as_slice())]);
        let metadata = metadata_with(build_segment_table(&data, &ranges).unwrap(), &data);

        let plan = plan_segments(&metadata, 2048).unwrap();
        let zone_of = |name: &str| {
            plan.files
                .values()
                .find(|entry| entry.name == name)
                .map(|entry| entry.zone)
                .unwrap()
        };
        assert_eq!(zone_of("vmlinuz"), Zone::Hot);
        assert_eq!(zone_of("backup.tar"), Zone::Cold);
    }

    #[test]
    fn plan_surfaces_shortfall() {
        let (data, ranges) = concat_segments(&[("vmlinuz", &b""[..])]);
        let mut table = build_segment_table(&data, &ranges).unwrap();
        table.get_mut("vmlinuz").unwrap().size = 1 << 30;
        let metadata = metadata_with(table, &data);

        assert!(matches!(
            plan_segments(&metadata, 2048),
            Err(PixelRtsError::Allocation(_))
        ));
    }
}
