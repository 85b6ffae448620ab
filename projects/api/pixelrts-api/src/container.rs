//! The PNG container: a square RGBA image plus its metadata annotation.

use crate::error::{FormatError, PixelRtsResult};
use crate::metadata::{Metadata, ANNOTATION_KEYWORD};
use crate::sidecar::{read_sidecar, write_sidecar};
use log::{debug, info};
use pixelrts_common::color_8888::{bytes_to_pixels, pixels_to_bytes, Rgba8888};
use pixelrts_curve::{Coord, HilbertCurve};
use serde_json::Value;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

/// A decoded container image.
///
/// Pixels are stored row-major; the pixel at `(x, y)` lives at `y * grid_size + x`.
#[derive(Debug, Clone, PartialEq)]
pub struct Container {
    grid_size: u32,
    pixels: Vec<Rgba8888>,
    metadata: Option<Metadata>,
}

/// Image contents read from a PNG before any sidecar is consulted.
pub(crate) struct RawContainer {
    pub grid_size: u32,
    pub pixels: Vec<Rgba8888>,
    pub annotation: Option<Value>,
}

impl Container {
    /// Wraps a pixel buffer.
    ///
    /// # Errors
    ///
    /// - [`FormatError::Grid`] if `grid_size` is not a supported power of two.
    /// - [`FormatError::PixelCountMismatch`] if `pixels` does not cover the grid exactly.
    /// - [`FormatError::GridMismatch`] if the metadata describes another grid.
    pub fn new(
        grid_size: u32,
        pixels: Vec<Rgba8888>,
        metadata: Option<Metadata>,
    ) -> PixelRtsResult<Self> {
        let curve = HilbertCurve::from_grid_size(grid_size)?;
        if pixels.len() != curve.len() {
            return Err(FormatError::PixelCountMismatch {
                grid_size,
                expected: curve.len(),
                actual: pixels.len(),
            }
            .into());
        }
        check_grid(grid_size, metadata.as_ref())?;
        Ok(Self {
            grid_size,
            pixels,
            metadata,
        })
    }

    /// A fully transparent container of side `grid_size`.
    pub(crate) fn blank(grid_size: u32) -> Self {
        let len = grid_size as usize * grid_size as usize;
        Self {
            grid_size,
            pixels: vec![Rgba8888::TRANSPARENT; len],
            metadata: None,
        }
    }

    /// Side length of the image.
    #[inline]
    pub fn grid_size(&self) -> u32 {
        self.grid_size
    }

    /// Row-major pixel buffer.
    #[inline]
    pub fn pixels(&self) -> &[Rgba8888] {
        &self.pixels
    }

    /// Pixel at `coord`, if it lies inside the image.
    pub fn pixel(&self, coord: Coord) -> Option<Rgba8888> {
        if coord.x >= self.grid_size || coord.y >= self.grid_size {
            return None;
        }
        self.pixels.get(self.offset(coord)).copied()
    }

    pub(crate) fn set_pixel(&mut self, coord: Coord, pixel: Rgba8888) {
        let offset = self.offset(coord);
        self.pixels[offset] = pixel;
    }

    #[inline]
    fn offset(&self, coord: Coord) -> usize {
        coord.y as usize * self.grid_size as usize + coord.x as usize
    }

    /// Metadata attached to the image.
    #[inline]
    pub fn metadata(&self) -> Option<&Metadata> {
        self.metadata.as_ref()
    }

    pub(crate) fn set_metadata(&mut self, metadata: Metadata) {
        self.metadata = Some(metadata);
    }

    /// Splits the container into its pixels and metadata.
    pub fn into_parts(self) -> (Vec<Rgba8888>, Option<Metadata>) {
        (self.pixels, self.metadata)
    }

    /// Encodes the image as an 8-bit RGBA PNG with the metadata annotation.
    ///
    /// The annotation is a `tEXt` chunk, or an `iTXt` chunk when the JSON is not ASCII.
    pub fn write_png<W: Write>(&self, writer: W) -> PixelRtsResult<()> {
        let mut encoder = png::Encoder::new(writer, self.grid_size, self.grid_size);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        if let Some(metadata) = &self.metadata {
            let annotation = metadata.to_annotation()?;
            if annotation.is_ascii() {
                encoder.add_text_chunk(ANNOTATION_KEYWORD.to_string(), annotation)?;
            } else {
                encoder.add_itxt_chunk(ANNOTATION_KEYWORD.to_string(), annotation)?;
            }
        }

        let mut writer = encoder.write_header()?;
        writer.write_image_data(&pixels_to_bytes(&self.pixels))?;
        writer.finish()?;
        Ok(())
    }

    /// Encodes the image into an in-memory PNG.
    pub fn to_png_bytes(&self) -> PixelRtsResult<Vec<u8>> {
        let mut out = Vec::new();
        self.write_png(&mut out)?;
        Ok(out)
    }

    /// Reads a container from a PNG stream using only the embedded annotation.
    ///
    /// # Errors
    ///
    /// Any [`FormatError`] describing why the image is not a container.
    pub fn read_png<R: Read>(reader: R) -> PixelRtsResult<Self> {
        let raw = read_raw(reader)?;
        let metadata = Metadata::merge(raw.annotation, None)?;
        Self::new(raw.grid_size, raw.pixels, metadata)
    }

    /// Reads a container from an in-memory PNG.
    pub fn from_png_bytes(bytes: &[u8]) -> PixelRtsResult<Self> {
        Self::read_png(bytes)
    }

    /// Writes the PNG to `path`, and the sidecar next to it when `sidecar` is set.
    pub fn save(&self, path: impl AsRef<Path>, sidecar: bool) -> PixelRtsResult<()> {
        let path = path.as_ref();
        let mut writer = BufWriter::new(File::create(path)?);
        self.write_png(&mut writer)?;
        writer.flush()?;
        info!(
            "Saved {0}x{0} container to {1}",
            self.grid_size,
            path.display()
        );

        if sidecar {
            if let Some(metadata) = &self.metadata {
                write_sidecar(path, metadata)?;
            }
        }
        Ok(())
    }

    /// Reads the PNG at `path`, merging its annotation with any sidecar.
    pub fn load(path: impl AsRef<Path>) -> PixelRtsResult<Self> {
        let path = path.as_ref();
        let raw = read_raw(BufReader::new(File::open(path)?))?;
        let container = Self::from_raw(raw, read_sidecar(path)?)?;
        info!(
            "Loaded {0}x{0} container from {1}",
            container.grid_size,
            path.display()
        );
        Ok(container)
    }

    pub(crate) fn from_raw(raw: RawContainer, sidecar: Option<Value>) -> PixelRtsResult<Self> {
        let metadata = Metadata::merge(raw.annotation, sidecar)?;
        Self::new(raw.grid_size, raw.pixels, metadata)
    }
}

fn check_grid(grid_size: u32, metadata: Option<&Metadata>) -> PixelRtsResult<()> {
    match metadata {
        Some(metadata) if metadata.grid_size != grid_size => Err(FormatError::GridMismatch {
            expected: metadata.grid_size,
            actual: grid_size,
        }
        .into()),
        _ => Ok(()),
    }
}

/// Reads the PNG header and the annotation preceding the image data.
///
/// Returns the grid side and the raw annotation document.
pub(crate) fn read_annotation<R: Read>(reader: R) -> PixelRtsResult<(u32, Option<Value>)> {
    let reader = png::Decoder::new(reader).read_info()?;
    let grid_size = check_dimensions(reader.info())?;
    Ok((grid_size, find_annotation(reader.info())?))
}

fn check_dimensions(info: &png::Info) -> PixelRtsResult<u32> {
    let (width, height) = (info.width, info.height);
    if width != height {
        return Err(FormatError::NotSquare { width, height }.into());
    }
    HilbertCurve::from_grid_size(width)?;
    Ok(width)
}

/// Decodes a PNG into pixels and the raw annotation document.
pub(crate) fn read_raw<R: Read>(reader: R) -> PixelRtsResult<RawContainer> {
    let mut reader = png::Decoder::new(reader).read_info()?;
    let width = check_dimensions(reader.info())?;
    let annotation = find_annotation(reader.info())?;

    let mut buffer = vec![0; reader.output_buffer_size()];
    let frame = reader.next_frame(&mut buffer)?;
    if frame.color_type != png::ColorType::Rgba || frame.bit_depth != png::BitDepth::Eight {
        return Err(FormatError::UnsupportedPixelFormat {
            color_type: format!("{:?}", frame.color_type),
            bit_depth: frame.bit_depth as u8,
        }
        .into());
    }
    buffer.truncate(frame.buffer_size());
    let pixels = bytes_to_pixels(&buffer).map_err(FormatError::from)?;

    debug!(
        "Read {width}x{width} PNG ({} annotation)",
        if annotation.is_some() { "with" } else { "no" }
    );
    Ok(RawContainer {
        grid_size: width,
        pixels,
        annotation,
    })
}

fn find_annotation(info: &png::Info) -> PixelRtsResult<Option<Value>> {
    if let Some(chunk) = info
        .uncompressed_latin1_text
        .iter()
        .find(|chunk| chunk.keyword == ANNOTATION_KEYWORD)
    {
        return Metadata::parse_annotation(&chunk.text).map(Some);
    }
    if let Some(chunk) = info
        .utf8_text
        .iter()
        .find(|chunk| chunk.keyword == ANNOTATION_KEYWORD)
    {
        return Metadata::parse_annotation(&chunk.get_text()?).map(Some);
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{EncodingInfo, EncodingMode, UserMetadata, FORMAT_ID, FORMAT_VERSION};
    use std::collections::BTreeMap;

    fn metadata(grid_size: u32, user: UserMetadata) -> Metadata {
        Metadata {
            format: FORMAT_ID.to_string(),
            format_version: FORMAT_VERSION,
            grid_size,
            encoding: EncodingInfo::for_mode(EncodingMode::Standard),
            mode: EncodingMode::Standard,
            segments: BTreeMap::new(),
            compression: None,
            data_hash: String::new(),
            data_size: 0,
            original_data_b64: None,
            user,
        }
    }

    fn sample(grid_size: u32) -> Container {
        let pixels = (0..grid_size * grid_size)
            .map(|i| Rgba8888::new(i as u8, (i >> 8) as u8, 7, 0))
            .collect();
        Container::new(grid_size, pixels, Some(metadata(grid_size, UserMetadata::default())))
            .unwrap()
    }

    #[test]
    fn png_round_trip_keeps_transparent_channels() {
        let container = sample(8);
        let png = container.to_png_bytes().unwrap();
        assert_eq!(Container::from_png_bytes(&png).unwrap(), container);
    }

    #[test]
    fn image_data_is_packed_rgba() {
        let container = sample(4);
        let png = container.to_png_bytes().unwrap();
        let mut reader = png::Decoder::new(png.as_slice()).read_info().unwrap();
        let mut buffer = vec![0; reader.output_buffer_size()];
        let frame = reader.next_frame(&mut buffer).unwrap();
        buffer.truncate(frame.buffer_size());

        assert_eq!(buffer, pixels_to_bytes(container.pixels()));
        assert_eq!(bytes_to_pixels(&buffer).unwrap(), container.pixels());
        assert!(matches!(
            FormatError::from(bytes_to_pixels(&buffer[1..]).unwrap_err()),
            FormatError::PixelBuffer(_)
        ));
    }

    #[test]
    fn non_ascii_metadata_uses_itxt() {
        let user = UserMetadata::default().description("Übersicht");
        let container = Container::new(2, vec![Rgba8888::TRANSPARENT; 4], Some(metadata(2, user)))
            .unwrap();
        let png = container.to_png_bytes().unwrap();
        let read = Container::from_png_bytes(&png).unwrap();
        assert_eq!(
            read.metadata().unwrap().user.description.as_deref(),
            Some("Übersicht")
        );
    }

    #[test]
    fn image_without_annotation_has_no_metadata() {
        let container = Container::new(4, vec![Rgba8888::TRANSPARENT; 16], None).unwrap();
        let read = Container::from_png_bytes(&container.to_png_bytes().unwrap()).unwrap();
        assert!(read.metadata().is_none());
    }

    #[test]
    fn rejects_non_square_images() {
        let mut png = Vec::new();
        let mut encoder = png::Encoder::new(&mut png, 4, 2);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header().unwrap();
        writer.write_image_data(&[0; 32]).unwrap();
        writer.finish().unwrap();

        assert!(matches!(
            Container::from_png_bytes(&png),
            Err(crate::PixelRtsError::Format(FormatError::NotSquare {
                width: 4,
                height: 2
            }))
        ));
    }

    #[test]
    fn rejects_rgb_images() {
        let mut png = Vec::new();
        let mut encoder = png::Encoder::new(&mut png, 2, 2);
        encoder.set_color(png::ColorType::Rgb);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header().unwrap();
        writer.write_image_data(&[0; 12]).unwrap();
        writer.finish().unwrap();

        assert!(matches!(
            Container::from_png_bytes(&png),
            Err(crate::PixelRtsError::Format(
                FormatError::UnsupportedPixelFormat { .. }
            ))
        ));
    }

    #[test]
    fn rejects_metadata_for_another_grid() {
        let result = Container::new(
            4,
            vec![Rgba8888::TRANSPARENT; 16],
            Some(metadata(8, UserMetadata::default())),
        );
        assert!(matches!(
            result,
            Err(crate::PixelRtsError::Format(FormatError::GridMismatch {
                expected: 8,
                actual: 4
            }))
        ));
    }

    #[test]
    fn save_and_load_with_sidecar() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.rts.png");
        let container = sample(4);
        container.save(&path, true).unwrap();
        assert!(crate::sidecar::sidecar_path(&path).exists());
        assert_eq!(Container::load(&path).unwrap(), container);
    }

    #[test]
    fn pixel_lookup_is_row_major() {
        let container = sample(4);
        assert_eq!(container.pixel(Coord { x: 1, y: 2 }), Some(container.pixels()[9]));
        assert_eq!(container.pixel(Coord { x: 4, y: 0 }), None);
    }
}
