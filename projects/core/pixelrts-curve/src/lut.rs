//! Precomputed index <-> coordinate tables.

use crate::backend::LutBackend;
use crate::hilbert::{Coord, HilbertCurve};

/// A fully materialized Hilbert curve, giving `O(1)` mapping in both directions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HilbertLut {
    curve: HilbertCurve,
    /// Coordinate of every curve index.
    coords: Vec<Coord>,
    /// Curve index of every pixel, in row-major order.
    indices: Vec<u32>,
}

impl HilbertLut {
    /// Builds the table for `curve` on the given backend.
    ///
    /// Unavailable backends degrade to [`LutBackend::Scalar`]; the output is identical either way.
    pub fn build(curve: HilbertCurve, backend: LutBackend) -> Self {
        match backend.resolve() {
            LutBackend::Scalar => Self::build_scalar(curve),
            LutBackend::Parallel => Self::build_parallel(curve),
        }
    }

    fn build_scalar(curve: HilbertCurve) -> Self {
        let grid_size = curve.grid_size();
        let coords = curve.coords().collect();
        let indices = (0..curve.len())
            .map(|pixel| raster_index(curve, grid_size, pixel))
            .collect();
        Self {
            curve,
            coords,
            indices,
        }
    }

    #[cfg(feature = "parallel")]
    fn build_parallel(curve: HilbertCurve) -> Self {
        use rayon::prelude::*;

        let grid_size = curve.grid_size();
        let mut coords = Vec::with_capacity(curve.len());
        (0..curve.len())
            .into_par_iter()
            .map(|index| curve.coord_unchecked(index))
            .collect_into_vec(&mut coords);

        let mut indices = Vec::with_capacity(curve.len());
        (0..curve.len())
            .into_par_iter()
            .map(|pixel| raster_index(curve, grid_size, pixel))
            .collect_into_vec(&mut indices);

        Self {
            curve,
            coords,
            indices,
        }
    }

    #[cfg(not(feature = "parallel"))]
    fn build_parallel(curve: HilbertCurve) -> Self {
        Self::build_scalar(curve)
    }

    /// The curve this table materializes.
    #[inline]
    pub fn curve(&self) -> HilbertCurve {
        self.curve
    }

    /// Grid side length.
    #[inline]
    pub fn grid_size(&self) -> u32 {
        self.curve.grid_size()
    }

    /// Number of entries, `4^order`.
    #[inline]
    pub fn len(&self) -> usize {
        self.coords.len()
    }

    /// Always `false`; see [`HilbertCurve::is_empty`].
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    /// All coordinates in curve order.
    #[inline]
    pub fn coords(&self) -> &[Coord] {
        &self.coords
    }

    /// Coordinate of curve index `index`, or `None` if out of range.
    #[inline]
    pub fn index_to_coord(&self, index: usize) -> Option<Coord> {
        self.coords.get(index).copied()
    }

    /// Curve index of a coordinate, or `None` if it lies outside the grid.
    #[inline]
    pub fn coord_to_index(&self, coord: Coord) -> Option<usize> {
        let grid_size = self.grid_size();
        if coord.x >= grid_size || coord.y >= grid_size {
            return None;
        }
        let pixel = coord.y as usize * grid_size as usize + coord.x as usize;
        Some(self.indices[pixel] as usize)
    }

    /// Row-major pixel offset of curve index `index`, or `None` if out of range.
    #[inline]
    pub fn pixel_offset(&self, index: usize) -> Option<usize> {
        let coord = self.index_to_coord(index)?;
        Some(coord.y as usize * self.grid_size() as usize + coord.x as usize)
    }
}

#[inline]
fn raster_index(curve: HilbertCurve, grid_size: u32, pixel: usize) -> u32 {
    let grid_size = grid_size as usize;
    let coord = Coord::new((pixel % grid_size) as u32, (pixel / grid_size) as u32);
    curve.index_unchecked(coord) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0)]
    #[case(3)]
    #[case(6)]
    fn backends_agree(#[case] order: u32) {
        let curve = HilbertCurve::new(order).unwrap();
        let scalar = HilbertLut::build(curve, LutBackend::Scalar);
        let parallel = HilbertLut::build(curve, LutBackend::Parallel);
        assert_eq!(scalar, parallel);
    }

    #[test]
    fn table_matches_direct_mapping() {
        let curve = HilbertCurve::new(4).unwrap();
        let lut = HilbertLut::build(curve, LutBackend::Scalar);
        for index in 0..curve.len() {
            let coord = curve.index_to_coord(index).unwrap();
            assert_eq!(lut.index_to_coord(index), Some(coord));
            assert_eq!(lut.coord_to_index(coord), Some(index));
        }
        assert_eq!(lut.index_to_coord(curve.len()), None);
        assert_eq!(lut.coord_to_index(Coord::new(16, 0)), None);
    }

    #[test]
    fn pixel_offset_is_row_major() {
        let curve = HilbertCurve::new(1).unwrap();
        let lut = HilbertLut::build(curve, LutBackend::Scalar);
        // (0,0) (1,0) (1,1) (0,1)
        let offsets: Vec<_> = (0..4).map(|i| lut.pixel_offset(i).unwrap()).collect();
        assert_eq!(offsets, vec![0, 1, 3, 2]);
    }
}
