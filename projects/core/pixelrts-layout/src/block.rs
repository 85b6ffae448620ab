//! Block sizes, access frequencies and the block groups that hand out blocks.

use crate::zone::Zone;
use derive_enum_all_values::AllValues;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Bytes covered by every block group, independent of its block size.
pub const GROUP_SPAN_BYTES: u64 = 64 * 1024;

/// Pixels covered by every block group (4 bytes per pixel).
pub const GROUP_SPAN_PIXELS: u64 = GROUP_SPAN_BYTES / 4;

/// Allocation unit size.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, AllValues,
)]
#[serde(into = "u64", try_from = "u64")]
pub enum BlockSize {
    /// 1 KiB
    Size1K,
    /// 2 KiB
    Size2K,
    /// 4 KiB
    Size4K,
    /// 8 KiB
    Size8K,
    /// 16 KiB
    Size16K,
    /// 32 KiB
    Size32K,
    /// 64 KiB
    Size64K,
}

impl BlockSize {
    /// Size of one block in bytes.
    #[inline]
    pub const fn bytes(self) -> u64 {
        1024 << (self as u32)
    }

    /// Number of blocks one group of this size holds.
    #[inline]
    pub const fn blocks_per_group(self) -> u32 {
        (GROUP_SPAN_BYTES / self.bytes()) as u32
    }

    /// Looks up the size whose block is exactly `bytes` long.
    pub fn from_bytes(bytes: u64) -> Option<Self> {
        Self::all_values()
            .iter()
            .copied()
            .find(|size| size.bytes() == bytes)
    }
}

impl From<BlockSize> for u64 {
    fn from(size: BlockSize) -> Self {
        size.bytes()
    }
}

impl TryFrom<u64> for BlockSize {
    type Error = String;

    fn try_from(bytes: u64) -> Result<Self, Self::Error> {
        BlockSize::from_bytes(bytes).ok_or_else(|| format!("{bytes} is not a valid block size"))
    }
}

/// How often a file is expected to be read.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, AllValues,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum AccessFrequency {
    /// Kernel and core runtime.
    Critical,
    /// Read on most boots.
    High,
    /// Regular use.
    Medium,
    /// Occasional use.
    Low,
    /// Archives and backups.
    Rare,
}

impl AccessFrequency {
    /// Block size preferred for this frequency.
    pub const fn preferred_block_size(self) -> BlockSize {
        match self {
            AccessFrequency::Critical => BlockSize::Size64K,
            AccessFrequency::High => BlockSize::Size16K,
            AccessFrequency::Medium => BlockSize::Size4K,
            AccessFrequency::Low => BlockSize::Size2K,
            AccessFrequency::Rare => BlockSize::Size1K,
        }
    }
}

/// A 64 KiB run of pixels in one zone, split into equally sized blocks.
///
/// Blocks are handed out first-in first-out and returned to the back of the free list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockGroup {
    id: u32,
    zone: Zone,
    block_size: BlockSize,
    start_pixel: u64,
    free: VecDeque<u32>,
}

impl BlockGroup {
    /// Creates a fully free group whose first pixel is `start_pixel` within its zone.
    pub fn new(id: u32, zone: Zone, block_size: BlockSize, start_pixel: u64) -> Self {
        Self {
            id,
            zone,
            block_size,
            start_pixel,
            free: (0..block_size.blocks_per_group()).collect(),
        }
    }

    /// Group identifier.
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Zone the group lives in.
    pub fn zone(&self) -> Zone {
        self.zone
    }

    /// Size of each block.
    pub fn block_size(&self) -> BlockSize {
        self.block_size
    }

    /// First pixel of the group, counted along the curve within its zone.
    pub fn start_pixel(&self) -> u64 {
        self.start_pixel
    }

    /// Zone-relative pixel index where `block_id` begins.
    pub fn block_start_pixel(&self, block_id: u32) -> u64 {
        self.start_pixel + u64::from(block_id) * (self.block_size.bytes() / 4)
    }

    /// Total number of blocks.
    pub fn block_count(&self) -> u32 {
        self.block_size.blocks_per_group()
    }

    /// Number of free blocks.
    pub fn free_count(&self) -> u32 {
        self.free.len() as u32
    }

    /// Number of blocks in use.
    pub fn used_count(&self) -> u32 {
        self.block_count() - self.free_count()
    }

    /// Whether at least one block is free.
    pub fn has_free(&self) -> bool {
        !self.free.is_empty()
    }

    /// Takes the oldest free block.
    pub fn allocate(&mut self) -> Option<u32> {
        self.free.pop_front()
    }

    /// Returns a block to the free list. Unknown or already free blocks are ignored.
    pub fn free(&mut self, block_id: u32) -> bool {
        if block_id >= self.block_count() || self.free.contains(&block_id) {
            return false;
        }
        self.free.push_back(block_id);
        true
    }

    /// Marks every block free again, in ascending order.
    pub fn reset(&mut self) {
        self.free = (0..self.block_count()).collect();
    }

    /// Fraction of blocks in use.
    pub fn utilization(&self) -> f64 {
        f64::from(self.used_count()) / f64::from(self.block_count())
    }

    /// Whether the group mixes free and used blocks.
    pub fn is_fragmented(&self) -> bool {
        self.has_free() && self.used_count() > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(BlockSize::Size1K, 1024, 64)]
    #[case(BlockSize::Size2K, 2048, 32)]
    #[case(BlockSize::Size4K, 4096, 16)]
    #[case(BlockSize::Size8K, 8192, 8)]
    #[case(BlockSize::Size16K, 16384, 4)]
    #[case(BlockSize::Size32K, 32768, 2)]
    #[case(BlockSize::Size64K, 65536, 1)]
    fn sizes_and_counts(#[case] size: BlockSize, #[case] bytes: u64, #[case] blocks: u32) {
        assert_eq!(size.bytes(), bytes);
        assert_eq!(size.blocks_per_group(), blocks);
        assert_eq!(BlockSize::from_bytes(bytes), Some(size));
    }

    #[test]
    fn block_size_serializes_as_bytes() {
        assert_eq!(serde_json::to_string(&BlockSize::Size4K).unwrap(), "4096");
        assert_eq!(
            serde_json::from_str::<BlockSize>("16384").unwrap(),
            BlockSize::Size16K
        );
        assert!(serde_json::from_str::<BlockSize>("3000").is_err());
    }

    #[test]
    fn free_list_is_fifo() {
        let mut group = BlockGroup::new(0, Zone::Warm, BlockSize::Size16K, 0);
        assert_eq!(group.allocate(), Some(0));
        assert_eq!(group.allocate(), Some(1));
        assert!(group.free(0));
        assert_eq!(group.allocate(), Some(2));
        assert_eq!(group.allocate(), Some(3));
        assert_eq!(group.allocate(), Some(0));
        assert_eq!(group.allocate(), None);
    }

    #[test]
    fn free_rejects_invalid_blocks() {
        let mut group = BlockGroup::new(0, Zone::Cold, BlockSize::Size32K, 0);
        assert!(!group.free(0));
        assert!(!group.free(2));
        group.allocate();
        assert!(group.free(0));
        assert!(!group.free(0));
    }

    #[test]
    fn fragmentation_needs_both_free_and_used() {
        let mut group = BlockGroup::new(0, Zone::Hot, BlockSize::Size32K, 0);
        assert!(!group.is_fragmented());
        group.allocate();
        assert!(group.is_fragmented());
        assert_eq!(group.utilization(), 0.5);
        group.allocate();
        assert!(!group.is_fragmented());
        group.reset();
        assert_eq!(group.used_count(), 0);
    }

    #[test]
    fn block_pixels_follow_block_size() {
        let group = BlockGroup::new(3, Zone::Cool, BlockSize::Size4K, 16384);
        assert_eq!(group.block_start_pixel(0), 16384);
        assert_eq!(group.block_start_pixel(2), 16384 + 2048);
    }
}
