//! Error types for curve mapping and lookup table generation.

use thiserror::Error;

/// Result alias used throughout this crate.
pub type CurveResult<T> = Result<T, CurveError>;

/// Errors raised by the curve mapper.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CurveError {
    /// The requested curve order is larger than the supported maximum.
    #[error("Curve order {order} exceeds the maximum of {max}")]
    OrderTooLarge {
        /// Requested order.
        order: u32,
        /// Largest supported order.
        max: u32,
    },

    /// A grid side length that is not a power of two was supplied.
    #[error("Grid size {grid_size} is not a power of two")]
    GridNotPowerOfTwo {
        /// Rejected grid side length.
        grid_size: u32,
    },

    /// A curve index outside `[0, grid_size²)` was supplied.
    #[error("Index {index} is outside the curve (length {len})")]
    IndexOutOfRange {
        /// Rejected index.
        index: usize,
        /// Number of cells on the curve.
        len: usize,
    },

    /// A coordinate outside the grid was supplied.
    #[error("Coordinate ({x}, {y}) is outside a {grid_size}x{grid_size} grid")]
    CoordinateOutOfRange {
        /// X coordinate.
        x: u32,
        /// Y coordinate.
        y: u32,
        /// Grid side length.
        grid_size: u32,
    },

    /// The background worker building a lookup table went away before delivering it.
    #[error("Lookup table worker disconnected before completing")]
    WorkerDisconnected,
}
