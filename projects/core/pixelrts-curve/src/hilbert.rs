//! Direct (uncached) Hilbert curve mapping.
//!
//! Every operation here runs in `O(order)` using the classic rotate/flip walk over the index bits.
//! Use [`HilbertLut`](crate::HilbertLut) for amortized `O(1)` lookups.
//!
//! Coordinates are transposed relative to the textbook `d2xy` walk, so index 1 lands on `(1, 0)`.
//! This keeps pixel placement identical to containers written by earlier PixelRTS tooling.

use crate::error::{CurveError, CurveResult};

/// A pixel coordinate on the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Coord {
    /// Column.
    pub x: u32,
    /// Row.
    pub y: u32,
}

impl Coord {
    /// Creates a new coordinate.
    #[inline]
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Checks whether two coordinates differ by at most one unit on each axis.
    #[inline]
    pub fn is_adjacent_to(self, other: Coord) -> bool {
        self.x.abs_diff(other.x) <= 1 && self.y.abs_diff(other.y) <= 1
    }
}

/// A Hilbert curve over a square grid of side `2^order`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HilbertCurve {
    order: u32,
}

impl HilbertCurve {
    /// Largest supported order. Indices of an order-15 curve still fit in a `u32`.
    pub const MAX_ORDER: u32 = 15;

    /// Creates a curve of the given order.
    ///
    /// # Errors
    ///
    /// Returns [`CurveError::OrderTooLarge`] if `order` exceeds [`Self::MAX_ORDER`].
    pub fn new(order: u32) -> CurveResult<Self> {
        if order > Self::MAX_ORDER {
            return Err(CurveError::OrderTooLarge {
                order,
                max: Self::MAX_ORDER,
            });
        }
        Ok(Self { order })
    }

    /// Creates the curve covering a grid of side `grid_size`.
    ///
    /// # Errors
    ///
    /// - [`CurveError::GridNotPowerOfTwo`] if `grid_size` is zero or not a power of two.
    /// - [`CurveError::OrderTooLarge`] if the grid is too large.
    pub fn from_grid_size(grid_size: u32) -> CurveResult<Self> {
        if !grid_size.is_power_of_two() {
            return Err(CurveError::GridNotPowerOfTwo { grid_size });
        }
        Self::new(grid_size.trailing_zeros())
    }

    /// Creates the smallest curve whose grid can hold `data_len` bytes at `bytes_per_pixel`.
    ///
    /// A zero-length payload yields the order-0 (1x1) curve.
    ///
    /// # Errors
    ///
    /// Returns [`CurveError::OrderTooLarge`] if even the largest grid cannot hold the payload.
    pub fn for_data_len(data_len: usize, bytes_per_pixel: usize) -> CurveResult<Self> {
        let pixels = data_len.div_ceil(bytes_per_pixel.max(1));
        match order_for_pixels(pixels) {
            Some(order) => Self::new(order),
            None => Err(CurveError::OrderTooLarge {
                order: Self::MAX_ORDER + 1,
                max: Self::MAX_ORDER,
            }),
        }
    }

    /// Order of the curve.
    #[inline]
    pub fn order(&self) -> u32 {
        self.order
    }

    /// Side length of the grid, always `2^order`.
    #[inline]
    pub fn grid_size(&self) -> u32 {
        1 << self.order
    }

    /// Number of cells covered by the curve, `grid_size²`.
    #[inline]
    pub fn len(&self) -> usize {
        1usize << (2 * self.order)
    }

    /// Always `false`; even an order-0 curve covers one cell.
    #[inline]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Maps a curve index to its grid coordinate.
    ///
    /// # Errors
    ///
    /// Returns [`CurveError::IndexOutOfRange`] if `index >= self.len()`.
    pub fn index_to_coord(&self, index: usize) -> CurveResult<Coord> {
        if index >= self.len() {
            return Err(CurveError::IndexOutOfRange {
                index,
                len: self.len(),
            });
        }
        Ok(self.coord_unchecked(index))
    }

    /// Maps a grid coordinate back to its curve index.
    ///
    /// # Errors
    ///
    /// Returns [`CurveError::CoordinateOutOfRange`] if the coordinate lies outside the grid.
    pub fn coord_to_index(&self, coord: Coord) -> CurveResult<usize> {
        let grid_size = self.grid_size();
        if coord.x >= grid_size || coord.y >= grid_size {
            return Err(CurveError::CoordinateOutOfRange {
                x: coord.x,
                y: coord.y,
                grid_size,
            });
        }
        Ok(self.index_unchecked(coord))
    }

    /// Iterates every coordinate of the grid in curve order.
    pub fn coords(&self) -> impl ExactSizeIterator<Item = Coord> + '_ {
        (0..self.len()).map(move |index| self.coord_unchecked(index))
    }

    /// [`Self::index_to_coord`] without the bounds check.
    #[inline]
    pub(crate) fn coord_unchecked(&self, index: usize) -> Coord {
        let (x, y) = d2xy(self.grid_size(), index as u64);
        Coord::new(y, x)
    }

    /// [`Self::coord_to_index`] without the bounds check.
    #[inline]
    pub(crate) fn index_unchecked(&self, coord: Coord) -> usize {
        xy2d(self.grid_size(), coord.y, coord.x) as usize
    }
}

/// Smallest order whose grid holds at least `pixels` cells.
/// Returns `None` if no supported order is large enough.
pub fn order_for_pixels(pixels: usize) -> Option<u32> {
    (0..=HilbertCurve::MAX_ORDER).find(|&order| (1usize << (2 * order)) >= pixels)
}

#[inline(always)]
fn rotate(side: u32, x: &mut u32, y: &mut u32, rx: u32, ry: u32) {
    if ry == 0 {
        if rx == 1 {
            *x = side - 1 - *x;
            *y = side - 1 - *y;
        }
        core::mem::swap(x, y);
    }
}

fn d2xy(grid_size: u32, index: u64) -> (u32, u32) {
    let (mut x, mut y) = (0u32, 0u32);
    let mut t = index;
    let mut s = 1u32;
    while s < grid_size {
        let rx = (1 & (t / 2)) as u32;
        let ry = (1 & (t ^ rx as u64)) as u32;
        rotate(s, &mut x, &mut y, rx, ry);
        x += s * rx;
        y += s * ry;
        t /= 4;
        s *= 2;
    }
    (x, y)
}

fn xy2d(grid_size: u32, mut x: u32, mut y: u32) -> u64 {
    let mut index = 0u64;
    let mut s = grid_size / 2;
    while s > 0 {
        let rx = u32::from(x & s > 0);
        let ry = u32::from(y & s > 0);
        index += u64::from(s) * u64::from(s) * u64::from((3 * rx) ^ ry);
        rotate(grid_size, &mut x, &mut y, rx, ry);
        s /= 2;
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::collections::HashSet;

    #[test]
    fn order_one_walk() {
        let curve = HilbertCurve::new(1).unwrap();
        let walk: Vec<_> = curve.coords().collect();
        assert_eq!(
            walk,
            vec![
                Coord::new(0, 0),
                Coord::new(1, 0),
                Coord::new(1, 1),
                Coord::new(0, 1)
            ]
        );
    }

    #[rstest]
    #[case(0)]
    #[case(1)]
    #[case(2)]
    #[case(5)]
    #[case(8)]
    fn direct_mapping_is_bijective(#[case] order: u32) {
        let curve = HilbertCurve::new(order).unwrap();
        let mut seen = HashSet::with_capacity(curve.len());
        for index in 0..curve.len() {
            let coord = curve.index_to_coord(index).unwrap();
            assert!(coord.x < curve.grid_size() && coord.y < curve.grid_size());
            assert!(seen.insert(coord), "duplicate coordinate {coord:?}");
            assert_eq!(curve.coord_to_index(coord).unwrap(), index);
        }
        assert_eq!(seen.len(), curve.len());
    }

    #[rstest]
    #[case(1)]
    #[case(3)]
    #[case(7)]
    fn consecutive_indices_are_adjacent(#[case] order: u32) {
        let curve = HilbertCurve::new(order).unwrap();
        let coords: Vec<_> = curve.coords().collect();
        for pair in coords.windows(2) {
            assert!(pair[0].is_adjacent_to(pair[1]), "{:?}", pair);
        }
    }

    #[rstest]
    #[case(0, 4, 0)]
    #[case(1, 4, 0)]
    #[case(4, 4, 0)]
    #[case(5, 4, 1)]
    #[case(16, 4, 1)]
    #[case(17, 4, 2)]
    #[case(4096, 4, 5)]
    #[case(4097, 4, 6)]
    #[case(65536, 4, 7)]
    #[case(9, 2, 2)]
    fn grid_sizing(#[case] len: usize, #[case] bytes_per_pixel: usize, #[case] order: u32) {
        let curve = HilbertCurve::for_data_len(len, bytes_per_pixel).unwrap();
        assert_eq!(curve.order(), order);
        let capacity = curve.len() * bytes_per_pixel;
        assert!(capacity >= len);
        if order > 0 {
            let smaller = 1usize << (2 * (order - 1));
            assert!(smaller * bytes_per_pixel < len);
        }
    }

    #[test]
    fn rejects_bad_inputs() {
        assert_eq!(
            HilbertCurve::new(16),
            Err(CurveError::OrderTooLarge { order: 16, max: 15 })
        );
        assert_eq!(
            HilbertCurve::from_grid_size(12),
            Err(CurveError::GridNotPowerOfTwo { grid_size: 12 })
        );
        assert_eq!(
            HilbertCurve::from_grid_size(0),
            Err(CurveError::GridNotPowerOfTwo { grid_size: 0 })
        );

        let curve = HilbertCurve::new(2).unwrap();
        assert!(matches!(
            curve.index_to_coord(16),
            Err(CurveError::IndexOutOfRange { index: 16, len: 16 })
        ));
        assert!(matches!(
            curve.coord_to_index(Coord::new(4, 0)),
            Err(CurveError::CoordinateOutOfRange { .. })
        ));
    }
}
