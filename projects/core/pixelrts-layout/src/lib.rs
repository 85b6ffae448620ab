#![doc = include_str!(concat!("../", core::env!("CARGO_PKG_README")))]
#![warn(missing_docs)]

pub mod allocator;
pub mod block;
pub mod classify;
pub mod error;
pub mod optimizer;
pub mod zone;

pub use allocator::{AllocationOutcome, BlockAllocation, BlockAllocator};
pub use block::{AccessFrequency, BlockGroup, BlockSize, GROUP_SPAN_BYTES, GROUP_SPAN_PIXELS};
pub use classify::classify_file;
pub use error::{AllocationError, LayoutError, LayoutResult};
pub use optimizer::{
    create_optimized_layout, DefragmentReport, FileEntry, FileFragment, FileSpec, GroupSnapshot,
    LayoutOptimizer, LayoutSnapshot,
};
pub use zone::{Zone, ZoneManager};
