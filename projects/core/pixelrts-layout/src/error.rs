//! Error types for layout construction and allocation.

use crate::zone::Zone;
use pixelrts_curve::CurveError;
use thiserror::Error;

/// Result alias used throughout this crate.
pub type LayoutResult<T> = Result<T, LayoutError>;

/// Errors raised while building or exporting a layout.
#[derive(Debug, Error)]
pub enum LayoutError {
    /// The grid size is not a supported power of two.
    #[error(transparent)]
    Grid(#[from] CurveError),

    /// The layout could not be serialized.
    #[error("Failed to serialize layout: {0}")]
    Json(#[from] serde_json::Error),
}

/// A request that could only be partly satisfied.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Allocated {allocated_bytes} of {requested_bytes} bytes in zone {zone:?}")]
pub struct AllocationError {
    /// Zone the request targeted.
    pub zone: Zone,
    /// Bytes requested.
    pub requested_bytes: u64,
    /// Bytes actually placed.
    pub allocated_bytes: u64,
}

impl AllocationError {
    /// Bytes that did not fit.
    pub fn shortfall_bytes(&self) -> u64 {
        self.requested_bytes - self.allocated_bytes
    }
}
