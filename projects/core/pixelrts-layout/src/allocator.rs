//! Block allocation across the zones of one grid.

use crate::block::{AccessFrequency, BlockGroup, BlockSize, GROUP_SPAN_PIXELS};
use crate::error::AllocationError;
use crate::zone::{Zone, ZoneManager};
use log::{debug, warn};
use serde::Serialize;

/// One block handed out by [`BlockAllocator::allocate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BlockAllocation {
    /// Group the block belongs to.
    pub group_id: u32,
    /// Block within the group.
    pub block_id: u32,
    /// Bytes of the request stored in this block.
    pub size: u64,
}

/// Result of an allocation request, including any shortfall.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocationOutcome {
    /// Zone the request targeted.
    pub zone: Zone,
    /// Blocks handed out, in file offset order.
    pub allocations: Vec<BlockAllocation>,
    /// Bytes requested.
    pub requested_bytes: u64,
    /// Bytes covered by `allocations`.
    pub allocated_bytes: u64,
}

impl AllocationOutcome {
    /// Whether every requested byte was placed.
    pub fn is_complete(&self) -> bool {
        self.allocated_bytes == self.requested_bytes
    }

    /// Bytes that did not fit.
    pub fn shortfall_bytes(&self) -> u64 {
        self.requested_bytes - self.allocated_bytes
    }

    /// Converts a partial allocation into an [`AllocationError`].
    ///
    /// The blocks of a partial allocation stay reserved; release them with
    /// [`BlockAllocator::release`] if the caller gives up on the request.
    pub fn into_result(self) -> Result<Vec<BlockAllocation>, AllocationError> {
        if self.is_complete() {
            Ok(self.allocations)
        } else {
            Err(AllocationError {
                zone: self.zone,
                requested_bytes: self.requested_bytes,
                allocated_bytes: self.allocated_bytes,
            })
        }
    }
}

/// Owns the block groups of every zone.
#[derive(Debug, Clone)]
pub struct BlockAllocator {
    zones: ZoneManager,
    groups: Vec<BlockGroup>,
}

impl BlockAllocator {
    /// Creates the block groups for a `grid_size × grid_size` grid.
    ///
    /// Each zone receives `max(1, pixels / (16384 × sizes))` rounds with one group per block size
    /// of the zone, where `pixels` is the zone's exact pixel count.
    pub fn new(grid_size: u32) -> Self {
        let zones = ZoneManager::new(grid_size);
        let pixel_counts = zones.pixel_counts();
        let mut groups = Vec::new();

        for zone in Zone::all_values() {
            let sizes = Self::zone_block_sizes(*zone);
            let per_round = GROUP_SPAN_PIXELS * sizes.len() as u64;
            let rounds = (pixel_counts[zone.rank()] / per_round).max(1);
            let mut start_pixel = 0;
            for _ in 0..rounds {
                for size in sizes {
                    groups.push(BlockGroup::new(groups.len() as u32, *zone, *size, start_pixel));
                    start_pixel += GROUP_SPAN_PIXELS;
                }
            }
            debug!(
                "Zone {zone:?}: {} pixels, {rounds} rounds of {sizes:?}",
                pixel_counts[zone.rank()]
            );
        }

        Self { zones, groups }
    }

    /// Block sizes provisioned in `zone`, largest first.
    pub fn zone_block_sizes(zone: Zone) -> &'static [BlockSize] {
        match zone {
            Zone::Hot => &[BlockSize::Size64K, BlockSize::Size16K, BlockSize::Size4K],
            Zone::Warm => &[BlockSize::Size16K, BlockSize::Size4K, BlockSize::Size2K],
            Zone::Temperate | Zone::Cool => {
                &[BlockSize::Size4K, BlockSize::Size2K, BlockSize::Size1K]
            }
            Zone::Cold => &[BlockSize::Size2K, BlockSize::Size1K],
        }
    }

    /// Zone map of the grid.
    pub fn zones(&self) -> &ZoneManager {
        &self.zones
    }

    /// Every block group, indexed by group id.
    pub fn groups(&self) -> &[BlockGroup] {
        &self.groups
    }

    /// Looks up a group by id.
    pub fn group(&self, group_id: u32) -> Option<&BlockGroup> {
        self.groups.get(group_id as usize)
    }

    pub(crate) fn group_mut(&mut self, group_id: u32) -> Option<&mut BlockGroup> {
        self.groups.get_mut(group_id as usize)
    }

    /// Recommends a block size for a file.
    ///
    /// Critical and high-frequency files use their preferred (large) size, but at least 4 KiB for
    /// files under 4 KiB. Everything else scales with the file size.
    pub fn recommend_block_size(size: u64, frequency: AccessFrequency) -> BlockSize {
        match frequency {
            AccessFrequency::Critical | AccessFrequency::High => {
                let preferred = frequency.preferred_block_size();
                if size < 4096 {
                    preferred.max(BlockSize::Size4K)
                } else {
                    preferred
                }
            }
            _ => match size {
                0..=1023 => BlockSize::Size1K,
                1024..=4095 => BlockSize::Size2K,
                4096..=16383 => BlockSize::Size4K,
                16384..=65535 => BlockSize::Size16K,
                _ => BlockSize::Size64K,
            },
        }
    }

    /// Reserves blocks for `size` bytes in `zone`.
    ///
    /// Groups of the recommended size are tried first, least utilized first. Other groups of the
    /// zone follow, largest block size first and then by utilization. Blocks are consumed until
    /// the request is covered or the zone runs out. A shortfall is reported in the outcome, not
    /// dropped.
    pub fn allocate(
        &mut self,
        size: u64,
        zone: Zone,
        frequency: AccessFrequency,
    ) -> AllocationOutcome {
        let recommended = Self::recommend_block_size(size, frequency);
        let mut exact = Vec::new();
        let mut fallback = Vec::new();
        for group in self.groups.iter().filter(|g| g.zone() == zone && g.has_free()) {
            if group.block_size() == recommended {
                exact.push(group);
            } else {
                fallback.push(group);
            }
        }
        exact.sort_by(|a, b| a.utilization().total_cmp(&b.utilization()));
        fallback.sort_by(|a, b| {
            b.block_size()
                .cmp(&a.block_size())
                .then(a.utilization().total_cmp(&b.utilization()))
        });
        let candidates: Vec<u32> = exact.iter().chain(&fallback).map(|g| g.id()).collect();

        let mut allocations = Vec::new();
        let mut remaining = size;
        for group_id in candidates {
            if remaining == 0 {
                break;
            }
            let group = &mut self.groups[group_id as usize];
            let block_bytes = group.block_size().bytes();
            while remaining > 0 {
                let Some(block_id) = group.allocate() else {
                    break;
                };
                let stored = remaining.min(block_bytes);
                allocations.push(BlockAllocation {
                    group_id,
                    block_id,
                    size: stored,
                });
                remaining -= stored;
            }
        }

        let outcome = AllocationOutcome {
            zone,
            allocations,
            requested_bytes: size,
            allocated_bytes: size - remaining,
        };
        if !outcome.is_complete() {
            warn!(
                "Zone {zone:?} is out of blocks: placed {} of {size} bytes",
                outcome.allocated_bytes
            );
        }
        outcome
    }

    /// Returns previously allocated blocks to their groups.
    pub fn release(&mut self, allocations: &[BlockAllocation]) {
        for allocation in allocations {
            if let Some(group) = self.group_mut(allocation.group_id) {
                group.free(allocation.block_id);
            }
        }
    }

    /// Frees every block in every group.
    pub fn reset(&mut self) {
        self.groups.iter_mut().for_each(BlockGroup::reset);
    }

    /// Fraction of groups that mix free and used blocks, `0.0` when there are no groups.
    pub fn fragmentation_score(&self) -> f64 {
        if self.groups.is_empty() {
            return 0.0;
        }
        let fragmented = self.groups.iter().filter(|g| g.is_fragmented()).count();
        fragmented as f64 / self.groups.len() as f64
    }

    /// Total free bytes in `zone`.
    pub fn free_bytes(&self, zone: Zone) -> u64 {
        self.groups
            .iter()
            .filter(|g| g.zone() == zone)
            .map(|g| u64::from(g.free_count()) * g.block_size().bytes())
            .sum()
    }
}
